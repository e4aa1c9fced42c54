//! File system operators: copying, deleting, directories, assigns,
//! protection bits, startup-sequence edits, text files, and icons.
//!
//! All of them share the same gating logic: an optional `(confirm [TH])`
//! dialog against the user level, the `@pretend` dry-run switch
//! (defeated by `(safe)`), and the `(optional ...)` failure-policy flags
//! with `(delopts ...)` cancellation.

use tracing::warn;

use crate::ast::{NodeId, NodeKind, OptTag};
use crate::dialog::{CopyItem, CopyStart};
use crate::error::ErrorCode;
use crate::eval::{Evaluator, Value};
use crate::host::{PathKind, Pattern};
use crate::ops::strings::{h_fileonly, h_tackon};
use crate::ops::{
    Gate, confirm_dialog, confirm_gate, gated_flag, get_opt, pretend_skips, required_text,
};

/// Failure-policy and copy-detail flags shared by the copy operators.
#[derive(Debug, Clone, Copy, Default)]
struct CopyMode {
    infos: bool,
    nogauge: bool,
    nofail: bool,
    oknodelete: bool,
    force: bool,
    askuser: bool,
    noposition: bool,
    /// No per-file gauge traffic; used by `(copylib)`.
    silent: bool,
}

impl CopyMode {
    fn from_options(ev: &mut Evaluator, n: NodeId) -> CopyMode {
        CopyMode {
            infos: get_opt(ev, n, OptTag::Infos).is_some(),
            nogauge: get_opt(ev, n, OptTag::NoGauge).is_some(),
            noposition: get_opt(ev, n, OptTag::NoPosition).is_some(),
            nofail: gated_flag(ev, n, OptTag::NoFail),
            oknodelete: gated_flag(ev, n, OptTag::OkNoDelete),
            force: gated_flag(ev, n, OptTag::Force),
            askuser: gated_flag(ev, n, OptTag::AskUser),
            silent: false,
        }
    }
}

/// One row of a copy plan.
#[derive(Debug, Clone)]
struct PlanEntry {
    dir: bool,
    src: String,
    dst: String,
}

// ============================================================================
// COPY HELPERS
// ============================================================================

/// Check the fail/nofail/oknodelete exclusivity shared by the copy
/// operators.
fn check_fail_mutex(ev: &mut Evaluator, n: NodeId, mode: CopyMode) -> bool {
    let set = [mode.nofail, mode.oknodelete, gated_flag(ev, n, OptTag::Fail)];
    if set.iter().filter(|b| **b).count() > 1 {
        ev.raise(n, ErrorCode::OptionMutex, "fail/nofail/oknodelete");
        return false;
    }
    true
}

/// Copy a single file, honoring the overwrite matrix and the `.info`
/// sidecar handling. Returns 1 on success (including tolerated
/// failures), 0 on real failure or user abort.
fn h_copyfile(ev: &mut Evaluator, n: NodeId, src: &str, dst: &str, mode: CopyMode) -> i32 {
    if !mode.silent && !ev.dialog().copyfiles_progress(src, mode.nogauge) {
        ev.halt();
        ev.log(n, &format!("Abort copy '{src}' to '{dst}'."));
        return 0;
    }

    if ev.host().exists(src) != PathKind::File {
        if mode.nofail {
            warn!(src, "source unreadable, tolerated by (nofail)");
            ev.log(n, &format!("Could not copy '{src}' to '{dst}'."));
            return 1;
        }
        ev.raise(n, ErrorCode::ReadFile, src);
        return 0;
    }

    // Write-protected destination: the FORCE/ASKUSER matrix.
    if ev.host().exists(dst) != PathKind::None && !ev.host().is_writable(dst) {
        if mode.force && !mode.askuser {
            let _ = ev.host().make_writable(dst);
        } else if mode.askuser && (mode.force || ev.get_numvar("@user-level") != 0) {
            let msg = format!("Overwrite write protected file '{dst}'?");
            if confirm_dialog(ev, &msg, "") {
                let _ = ev.host().make_writable(dst);
            } else {
                // Skip counts as success; abort does not.
                return ev.faulted() as i32 ^ 1;
            }
        }
    }

    if let Err(err) = ev.host().copy_file(src, dst) {
        if mode.nofail || mode.oknodelete {
            warn!(src, dst, %err, "copy failed, tolerated by options");
            ev.log(n, &format!("Could not copy '{src}' to '{dst}'."));
            return 1;
        }
        ev.raise(n, ErrorCode::WriteFile, dst);
        return 0;
    }
    ev.log(n, &format!("Copied '{src}' to '{dst}'."));

    // Icon sidecar, only when one exists next to the source.
    if mode.infos {
        let src_info = format!("{src}.info");
        if ev.host().exists(&src_info) == PathKind::File {
            let dst_info = format!("{dst}.info");
            let sub = CopyMode {
                infos: false,
                ..mode
            };
            if h_copyfile(ev, n, &src_info, &dst_info, sub) == 1 && mode.noposition {
                if let Ok(mut meta) = ev.host().icon_read(dst) {
                    meta.position = None;
                    if ev.host().icon_write(dst, &meta).is_err() {
                        ev.raise(n, ErrorCode::WriteFile, dst_info);
                    }
                }
            }
        }
    }

    // Preserve protection bits.
    match ev.host().get_perm(src) {
        Ok(mask) => {
            if ev.host().set_perm(dst, mask).is_err() {
                ev.raise(n, ErrorCode::SetPerm, dst);
            }
        }
        Err(_) => ev.raise(n, ErrorCode::GetPerm, src),
    }
    if ev.faulted() {
        if mode.nofail {
            ev.clear_fault();
            return 1;
        }
        return 0;
    }
    1
}

/// Create a directory tree, outermost first. Existing directories are
/// not an error.
fn h_makedir(ev: &mut Evaluator, n: NodeId, dst: &str) -> i32 {
    if ev.host().exists(dst) == PathKind::Dir {
        ev.log(n, &format!("Directory '{dst}' exists already."));
        return 1;
    }

    let mut prefix = String::new();
    for (i, part) in dst.split('/').enumerate() {
        if i > 0 {
            prefix.push('/');
        }
        prefix.push_str(part);
        if part.is_empty() || ev.host().exists(&prefix) == PathKind::Dir {
            continue;
        }
        if ev.host().make_dir(&prefix).is_err() {
            ev.raise(n, ErrorCode::WriteDir, dst);
            return 0;
        }
    }
    ev.log(n, &format!("Created '{dst}'."));
    1
}

/// Build the copy plan: walk the source and pair every entry with its
/// destination path, filtering by `(choices)`, `(pattern)`, `(files)`
/// and `(fonts)`.
#[allow(clippy::too_many_arguments)]
fn h_filetree(
    ev: &mut Evaluator,
    n: NodeId,
    src: &str,
    dst: &str,
    files: bool,
    fonts: bool,
    choices: Option<&[String]>,
    pattern: Option<&Pattern>,
) -> Option<Vec<PlanEntry>> {
    match ev.host().exists(src) {
        PathKind::Dir => {
            // Each choice must exist before anything is copied.
            if let Some(names) = choices {
                for name in names {
                    let path = h_tackon(src, name);
                    if ev.host().exists(&path) == PathKind::None {
                        ev.raise(n, ErrorCode::NoSuchFileOrDir, path);
                        return None;
                    }
                }
            }

            let entries = match ev.host().read_dir(src) {
                Ok(entries) => entries,
                Err(_) => {
                    ev.raise(n, ErrorCode::ReadDir, src);
                    return None;
                }
            };

            let mut plan = vec![PlanEntry {
                dir: true,
                src: src.to_string(),
                dst: dst.to_string(),
            }];

            for name in entries {
                let n_src = h_tackon(src, &name);
                let n_dst = h_tackon(dst, &name);

                let kind = if let Some(names) = choices {
                    if names.iter().any(|c| c.eq_ignore_ascii_case(&name)) {
                        ev.host().exists(&n_src)
                    } else {
                        PathKind::None
                    }
                } else if let Some(pat) = pattern {
                    if pat.matches(&name) {
                        ev.host().exists(&n_src)
                    } else {
                        PathKind::None
                    }
                } else {
                    ev.host().exists(&n_src)
                };

                // The (fonts) option excludes `.font` sidecar files.
                let kind = if fonts && name.to_ascii_lowercase().ends_with(".font") {
                    PathKind::None
                } else {
                    kind
                };

                match kind {
                    PathKind::None => continue,
                    PathKind::Dir => {
                        if !files {
                            // Choices never recurse; a chosen directory
                            // would otherwise be treated as a file.
                            let sub =
                                h_filetree(ev, n, &n_src, &n_dst, files, fonts, None, pattern)?;
                            plan.extend(sub);
                        }
                    }
                    PathKind::File => plan.push(PlanEntry {
                        dir: false,
                        src: n_src,
                        dst: n_dst,
                    }),
                }
            }
            Some(plan)
        }
        PathKind::File => {
            let file_dst = match h_fileonly(src) {
                Some(name) => h_tackon(dst, name),
                None => {
                    ev.raise(n, ErrorCode::NotAFile, src);
                    return None;
                }
            };
            Some(vec![
                PlanEntry {
                    dir: true,
                    src: src.to_string(),
                    dst: dst.to_string(),
                },
                PlanEntry {
                    dir: false,
                    src: src.to_string(),
                    dst: file_dst,
                },
            ])
        }
        PathKind::None => {
            ev.raise(n, ErrorCode::NoSuchFileOrDir, src);
            None
        }
    }
}

// ============================================================================
// (copyfiles)
// ============================================================================

/// `(copyfiles (source..) (dest..) (all | choices.. | pattern..)
/// (files) (infos) (fonts) (newname..) (confirm..) (safe) (nogauge)
/// (noposition) (optional ..) (delopts ..))`
pub(crate) fn copyfiles(ev: &mut Evaluator, n: NodeId) -> Value {
    let mode = CopyMode::from_options(ev, n);
    if !check_fail_mutex(ev, n, mode) {
        return Value::Number(0);
    }

    let all = get_opt(ev, n, OptTag::All);
    let choices_opt = if all.is_some() {
        None
    } else {
        get_opt(ev, n, OptTag::Choices)
    };
    let pattern_opt = get_opt(ev, n, OptTag::Pattern);
    let exclusive = [
        all.is_some(),
        choices_opt.is_some(),
        pattern_opt.is_some(),
    ];
    if exclusive.iter().filter(|b| **b).count() > 1 {
        ev.raise(n, ErrorCode::OptionMutex, "pattern/choices/all");
        return Value::Number(0);
    }

    let (Some(source), Some(dest)) = (get_opt(ev, n, OptTag::Source), get_opt(ev, n, OptTag::Dest))
    else {
        let missing = if get_opt(ev, n, OptTag::Source).is_none() {
            "source"
        } else {
            "dest"
        };
        ev.raise(n, ErrorCode::MissingOption, missing);
        return Value::Number(0);
    };
    let src = ev.resolve(source).as_text();
    let dst = ev.resolve(dest).as_text();

    // A directory source needs a selection option.
    if ev.host().exists(&src) == PathKind::Dir && !exclusive.iter().any(|b| *b) {
        ev.raise(n, ErrorCode::MissingOption, "all/choices/pattern");
        return Value::Number(0);
    }

    if pretend_skips(ev, n) {
        return Value::Number(1);
    }

    // Overwriting an existing destination directory (not a volume root)
    // needs a nod from the user.
    if ev.host().exists(&dst) == PathKind::Dir && !dst.is_empty() && !dst.ends_with(':') {
        let msg = format!("Overwrite existing directory '{dst}'?");
        if !confirm_dialog(ev, &msg, "") {
            ev.log(n, &format!("Abort copy '{src}' to '{dst}'."));
            return Value::Number(0);
        }
        let _ = ev.host().make_writable(&dst);
    }

    let files = all.is_none() && get_opt(ev, n, OptTag::Files).is_some();
    let fonts = get_opt(ev, n, OptTag::Fonts).is_some();

    let choice_names: Option<Vec<String>> = choices_opt.map(|c| {
        let count = ev.tree().children(c).len();
        let mut names = Vec::with_capacity(count);
        for i in 0..count {
            let child = ev.tree().children(c)[i];
            names.push(ev.text(child));
        }
        names
    });

    let pattern = match pattern_opt {
        Some(p) => {
            let text = ev.resolve(p).as_text();
            match Pattern::compile(&text) {
                Ok(pat) => Some(pat),
                Err(_) => {
                    ev.raise(n, ErrorCode::Overflow, text);
                    return Value::Number(0);
                }
            }
        }
        None => None,
    };

    let Some(mut plan) = h_filetree(
        ev,
        n,
        &src,
        &dst,
        files,
        fonts,
        choice_names.as_deref(),
        pattern.as_ref(),
    ) else {
        return Value::Number(0);
    };

    // (newname) renames a single-file copy at the destination.
    if let Some(newname) = get_opt(ev, n, OptTag::NewName) {
        if plan.len() == 2 && plan[0].dir && !plan[1].dir {
            let name = ev.resolve(newname).as_text();
            plan[1].dst = h_tackon(&dst, &name);
        }
    }

    // Confirmation rides on the copy plan dialog rather than a separate
    // requester; here we only decide whether it is armed.
    let confirm = match get_opt(ev, n, OptTag::Confirm) {
        Some(confirm) => {
            let mut threshold = 2;
            if let Some(first) = ev.tree().children(confirm).first().copied() {
                threshold = ev.num(first);
            }
            let armed =
                ev.get_numvar("@user-level") >= threshold && ev.get_numvar("@yes") == 0;
            if armed {
                // An armed confirmation needs its prompt and help.
                if required_text(ev, n, OptTag::Prompt).is_none()
                    || required_text(ev, n, OptTag::Help).is_none()
                {
                    return Value::Number(0);
                }
            }
            armed
        }
        None => false,
    };
    if ev.faulted() {
        return Value::Number(0);
    }

    let items: Vec<CopyItem> = plan
        .iter()
        .map(|e| CopyItem {
            dir: e.dir,
            source: e.src.clone(),
            dest: e.dst.clone(),
        })
        .collect();
    match ev.dialog().copyfiles_begin(&items, confirm) {
        CopyStart::Go => {}
        CopyStart::Skip => return Value::Number(0),
        CopyStart::Abort => {
            ev.halt();
            return Value::Number(0);
        }
    }

    let mut result = 1;
    for entry in &plan {
        if result == 0 {
            break;
        }
        result = if entry.dir {
            let made = h_makedir(ev, n, &entry.dst);
            if made == 1 {
                match ev.host().get_perm(&entry.src) {
                    Ok(mask) => {
                        let _ = ev.host().set_perm(&entry.dst, mask);
                    }
                    Err(_) => {
                        ev.raise(n, ErrorCode::GetPerm, entry.src.clone());
                    }
                }
            }
            if ev.faulted() { 0 } else { made }
        } else {
            h_copyfile(ev, n, &entry.src, &entry.dst, mode)
        };
    }
    ev.dialog().copyfiles_end();

    Value::Number(result)
}

// ============================================================================
// (copylib)
// ============================================================================

/// `(copylib ...)`: like a single-file `(copyfiles)`, but the copy only
/// happens when the source version beats the installed one, or the user
/// confirms otherwise.
pub(crate) fn copylib(ev: &mut Evaluator, n: NodeId) -> Value {
    let mode = CopyMode {
        silent: true,
        ..CopyMode::from_options(ev, n)
    };
    if !check_fail_mutex(ev, n, mode) {
        return Value::Number(0);
    }

    let (Some(source), Some(dest)) = (get_opt(ev, n, OptTag::Source), get_opt(ev, n, OptTag::Dest))
    else {
        let missing = if get_opt(ev, n, OptTag::Source).is_none() {
            "source"
        } else {
            "dest"
        };
        ev.raise(n, ErrorCode::MissingOption, missing);
        return Value::Number(0);
    };
    let Some(prompt) = required_text(ev, n, OptTag::Prompt) else {
        return Value::Number(0);
    };
    let Some(_help) = required_text(ev, n, OptTag::Help) else {
        return Value::Number(0);
    };

    let src = ev.resolve(source).as_text();
    let dst = ev.resolve(dest).as_text();

    if ev.host().exists(&src) != PathKind::File {
        ev.raise(n, ErrorCode::NotAFile, src);
        return Value::Number(0);
    }

    if pretend_skips(ev, n) {
        return Value::Number(1);
    }

    // The source must carry a version.
    let Some(src_version) = ev.host().read_version_from_file(&src).ok().flatten() else {
        ev.raise(n, ErrorCode::NoVersion, src);
        return Value::Number(0);
    };

    match ev.host().exists(&dst) {
        PathKind::File => {
            ev.raise(n, ErrorCode::NotADir, dst);
            return Value::Number(0);
        }
        PathKind::None => {
            // One level only; deeper trees are a script bug.
            if ev.host().make_dir(&dst).is_err() {
                ev.raise(n, ErrorCode::WriteDir, dst);
                return Value::Number(0);
            }
            ev.log(n, &format!("Created '{dst}'."));
        }
        PathKind::Dir => {}
    }

    let target = match get_opt(ev, n, OptTag::NewName) {
        Some(newname) => {
            let name = ev.resolve(newname).as_text();
            h_tackon(&dst, &name)
        }
        None => match h_fileonly(&src) {
            Some(name) => h_tackon(&dst, name),
            None => {
                ev.raise(n, ErrorCode::NotAFile, src);
                return Value::Number(0);
            }
        },
    };

    // Resolve the confirm threshold the same way the other operators
    // do, but fold the version numbers into the message.
    let confirm_active = match get_opt(ev, n, OptTag::Confirm) {
        Some(confirm) => {
            let mut threshold = 2;
            if let Some(first) = ev.tree().children(confirm).first().copied() {
                threshold = ev.num(first);
            }
            ev.get_numvar("@user-level") >= threshold && ev.get_numvar("@yes") == 0
        }
        None => false,
    };

    let (s_maj, s_rev) = crate::host::unpack(src_version);
    let level = ev.get_numvar("@user-level");
    let mut result = 0;

    match ev.host().exists(&target) {
        PathKind::None => {
            let go = if confirm_active {
                let msg = format!(
                    "{prompt}\n\nVersion to install: {s_maj}.{s_rev}\n\
                     There is no currently installed version\n\n\
                     Destination drawer: {dst}"
                );
                confirm_dialog(ev, &msg, "")
            } else {
                true
            };
            if go {
                result = h_copyfile(ev, n, &src, &target, mode);
            }
        }
        PathKind::File => {
            let installed = ev.host().read_version_from_file(&target).ok().flatten();
            match installed {
                // No version in the destination file: overwrite.
                None => {
                    result = h_copyfile(ev, n, &src, &target, mode);
                }
                Some(dst_version) if dst_version == src_version => {}
                Some(dst_version) => {
                    let (d_maj, d_rev) = crate::host::unpack(dst_version);
                    let msg = format!(
                        "{prompt}\n\nVersion to install: {s_maj}.{s_rev}\n\
                         Version currently installed: {d_maj}.{d_rev}\n\n\
                         Destination drawer: {dst}"
                    );
                    if confirm_active {
                        if confirm_dialog(ev, &msg, "") {
                            result = h_copyfile(ev, n, &src, &target, mode);
                        }
                    } else if dst_version < src_version {
                        result = h_copyfile(ev, n, &src, &target, mode);
                    } else if level == 2 && confirm_dialog(ev, &msg, "") {
                        // Downgrades need an expert's nod.
                        result = h_copyfile(ev, n, &src, &target, mode);
                    }
                }
            }
        }
        PathKind::Dir => {
            ev.raise(n, ErrorCode::NotAFile, target);
        }
    }
    Value::Number(result)
}

// ============================================================================
// (delete)
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct DeleteOpts {
    infos: bool,
    all: bool,
    force: bool,
    askuser: bool,
}

fn h_delete_file(ev: &mut Evaluator, n: NodeId, file: &str, opts: DeleteOpts) -> i32 {
    if opts.force {
        let _ = ev.host().make_writable(file);
    } else if !ev.host().is_writable(file) {
        if !opts.askuser {
            // Write protected and nobody to ask: fail silently.
            return 0;
        }
        let msg = format!("Delete write protected file '{file}'?");
        if ev.get_numvar("@user-level") == 0 || !confirm_dialog(ev, &msg, "") {
            return 0;
        }
        let _ = ev.host().make_writable(file);
    }

    if ev.host().remove_file(file).is_err() {
        ev.raise(n, ErrorCode::DeleteFile, file);
        return 0;
    }
    ev.log(n, &format!("Deleted '{file}'."));

    if opts.infos {
        let info = format!("{file}.info");
        if ev.host().exists(&info) == PathKind::File {
            let _ = ev.host().make_writable(&info);
            if ev.host().remove_file(&info).is_err() {
                ev.raise(n, ErrorCode::DeleteFile, info);
                return 0;
            }
            ev.log(n, &format!("Deleted '{info}'."));
        }
    }
    1
}

fn h_delete_dir(ev: &mut Evaluator, n: NodeId, dir: &str, opts: DeleteOpts) -> i32 {
    if !opts.force && !ev.host().is_writable(dir) {
        if !opts.askuser {
            return 0;
        }
        let msg = format!("Delete write protected directory '{dir}'?");
        if ev.get_numvar("@user-level") == 0 || !confirm_dialog(ev, &msg, "") {
            return 0;
        }
    }
    let _ = ev.host().make_writable(dir);

    if ev.host().remove_dir(dir).is_err() {
        if !opts.all {
            return 0;
        }
        // Not empty: clear the contents first, files then subdirs.
        let Ok(entries) = ev.host().read_dir(dir) else {
            return 0;
        };
        for name in &entries {
            let path = h_tackon(dir, name);
            if ev.host().exists(&path) == PathKind::File {
                h_delete_file(ev, n, &path, opts);
            }
        }
        for name in &entries {
            let path = h_tackon(dir, name);
            if ev.host().exists(&path) == PathKind::Dir {
                h_delete_dir(ev, n, &path, opts);
            }
        }
        if ev.host().remove_dir(dir).is_err() {
            return 0;
        }
    }
    ev.log(n, &format!("Deleted '{dir}'."));

    if opts.infos {
        let info = format!("{dir}.info");
        if ev.host().exists(&info) == PathKind::File {
            let _ = ev.host().make_writable(&info);
            if ev.host().remove_file(&info).is_err() {
                return 0;
            }
            ev.log(n, &format!("Deleted '{info}'."));
        }
    }
    1
}

/// Delete everything matching a wildcard pattern. The wildcards may
/// only appear in the final path component.
fn h_delete_pattern(ev: &mut Evaluator, n: NodeId, raw: &str, opts: DeleteOpts) -> i32 {
    let (dir, leaf) = match raw.rfind(['/', ':']) {
        Some(i) if raw.as_bytes()[i] == b':' => (&raw[..=i], &raw[i + 1..]),
        Some(i) => (&raw[..i], &raw[i + 1..]),
        None => ("", raw),
    };
    let pattern = match Pattern::compile(leaf) {
        Ok(p) => p,
        Err(_) => {
            ev.raise(n, ErrorCode::Overflow, raw);
            return 0;
        }
    };

    let list_dir = if dir.is_empty() { "." } else { dir };
    let Ok(entries) = ev.host().read_dir(list_dir) else {
        ev.raise(n, ErrorCode::DeleteFile, raw);
        return 0;
    };

    let mut result = 1;
    for name in entries {
        if !pattern.matches(&name) {
            continue;
        }
        let path = h_tackon(dir, &name);
        let ok = match ev.host().exists(&path) {
            PathKind::File => h_delete_file(ev, n, &path, opts),
            PathKind::Dir => h_delete_dir(ev, n, &path, opts),
            PathKind::None => 1,
        };
        if ok == 0 || ev.faulted() {
            result = 0;
            break;
        }
    }
    result
}

/// `(delete file (infos) (all) (optional ..) (delopts ..) (confirm..)
/// (safe))`: delete a file, a directory (recursively with `(all)`), or
/// everything matching an Amiga glob.
pub(crate) fn delete(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(arg) = ev.tree().arg(n, 1) else {
        return Value::Number(0);
    };
    let target = ev.text(arg);

    match confirm_gate(ev, n) {
        Gate::Proceed => {}
        Gate::Skip | Gate::Errored => return Value::Number(0),
    }

    if pretend_skips(ev, n) {
        return Value::Number(1);
    }

    let opts = DeleteOpts {
        infos: get_opt(ev, n, OptTag::Infos).is_some(),
        all: get_opt(ev, n, OptTag::All).is_some(),
        force: gated_flag(ev, n, OptTag::Force),
        askuser: gated_flag(ev, n, OptTag::AskUser),
    };

    let has_wildcards = match Pattern::compile(&target) {
        Ok(p) => !p.is_literal(),
        Err(_) => {
            ev.raise(n, ErrorCode::Overflow, target);
            return Value::Number(0);
        }
    };

    let result = if has_wildcards {
        h_delete_pattern(ev, n, &target, opts)
    } else {
        match ev.host().exists(&target) {
            PathKind::Dir => h_delete_dir(ev, n, &target, opts),
            PathKind::File => h_delete_file(ev, n, &target, opts),
            PathKind::None => {
                ev.log(n, &format!("No such file '{target}'."));
                ev.raise(n, ErrorCode::NoSuchFileOrDir, target);
                0
            }
        }
    };
    Value::Number(result)
}

// ============================================================================
// (rename) / (makedir) / (makeassign)
// ============================================================================

/// `(rename old new [(disk)] [(confirm..)] [(safe)])`: file rename, or
/// volume relabel with `(disk)`. Success reads as -1, a quirk scripts
/// have always depended on.
pub(crate) fn rename(ev: &mut Evaluator, n: NodeId) -> Value {
    let (Some(from_node), Some(to_node)) = (ev.tree().arg(n, 1), ev.tree().arg(n, 2)) else {
        return Value::Number(0);
    };
    let from = ev.text(from_node);
    let to = ev.text(to_node);

    match confirm_gate(ev, n) {
        Gate::Proceed => {}
        Gate::Skip | Gate::Errored => return Value::Number(0),
    }
    if pretend_skips(ev, n) {
        return Value::Number(-1);
    }

    if get_opt(ev, n, OptTag::Disk).is_some() {
        if !ev.host().relabel_volume(&from, &to) {
            return Value::Number(0);
        }
        ev.log(n, &format!("Renamed '{from}' to '{to}'."));
        return Value::Number(-1);
    }

    // Fail if the target exists.
    if ev.host().exists(&to) != PathKind::None || ev.host().rename(&from, &to).is_err() {
        ev.raise(n, ErrorCode::RenameFile, from);
        return Value::Number(0);
    }
    ev.log(n, &format!("Renamed '{from}' to '{to}'."));
    Value::Number(-1)
}

/// `(makedir name [(infos)] [(confirm..)] [(safe)])`
pub(crate) fn makedir(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(arg) = ev.tree().arg(n, 1) else {
        return Value::Number(0);
    };
    let name = ev.text(arg);

    match confirm_gate(ev, n) {
        Gate::Proceed => {}
        Gate::Skip | Gate::Errored => return Value::Number(0),
    }
    if pretend_skips(ev, n) {
        return Value::Number(1);
    }

    let mut result = h_makedir(ev, n, &name);
    if result == 1 && get_opt(ev, n, OptTag::Infos).is_some() {
        let meta = ev.host().icon_default(crate::host::IconKind::Drawer);
        if ev.host().icon_write(&name, &meta).is_err() {
            result = 0;
        }
    }
    Value::Number(result)
}

/// `(makeassign name [target] [(safe)])`: create or remove a logical
/// assign.
pub(crate) fn makeassign(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(name_node) = ev.tree().arg(n, 1) else {
        return Value::Number(0);
    };
    let name = ev.text(name_node);

    if pretend_skips(ev, n) {
        return Value::Number(1);
    }

    // A second positional argument means "create"; its absence means
    // "remove".
    let target = ev.tree().arg(n, 2).map(|t| ev.text(t));
    let ok = match &target {
        Some(dst) => {
            let ok = ev.host().make_assign(&name, Some(dst));
            ev.log(
                n,
                &if ok {
                    format!("Assign '{name}' to '{dst}'")
                } else {
                    format!("Could not assign '{name}' to '{dst}'")
                },
            );
            ok
        }
        None => {
            let ok = ev.host().make_assign(&name, None);
            ev.log(
                n,
                &if ok {
                    format!("Remove assign '{name}'")
                } else {
                    format!("Could not remove assign '{name}'")
                },
            );
            ok
        }
    };

    if !ok {
        ev.raise(n, ErrorCode::Assign, name);
        return Value::Number(0);
    }
    Value::Number(1)
}

// ============================================================================
// (protect)
// ============================================================================

fn h_protect_get(ev: &mut Evaluator, n: NodeId, file: &str) -> Option<i32> {
    match ev.host().get_perm(file) {
        Ok(mask) => {
            let mask = mask as i32;
            ev.log(n, &format!("Get mask '{file}' {mask}"));
            Some(mask)
        }
        Err(_) => {
            ev.raise(n, ErrorCode::GetPerm, file);
            None
        }
    }
}

fn h_protect_set(ev: &mut Evaluator, n: NodeId, file: &str, mask: i32) -> i32 {
    if ev.host().set_perm(file, mask as u32).is_err() {
        ev.raise(n, ErrorCode::SetPerm, file);
        return 0;
    }
    ev.log(n, &format!("Protect '{file}' {mask}"));
    1
}

/// Apply a `hsparwed` flag string to a mask. The low four bits are
/// stored inverted on disk, so they are flipped around the edit.
fn apply_protect_flags(mut mask: i32, flags: &str) -> i32 {
    mask ^= 0x0f;
    // 0 = replace, 1 = add, 2 = clear
    let mut mode = 0;
    for c in flags.chars() {
        let bit = match c.to_ascii_lowercase() {
            '+' => {
                mode = 1;
                continue;
            }
            '-' => {
                mode = 2;
                continue;
            }
            'h' => 1 << 7,
            's' => 1 << 6,
            'p' => 1 << 5,
            'a' => 1 << 4,
            'r' => 1 << 3,
            'w' => 1 << 2,
            'e' => 1 << 1,
            'd' => 1 << 0,
            _ => continue,
        };
        match mode {
            0 => {
                mask = bit;
                mode = 1;
            }
            1 => mask |= bit,
            _ => mask &= !bit,
        }
    }
    mask ^ 0x0f
}

/// `(protect file [flags|mask] [(override m)] [(safe)])`: read or
/// write Amiga protection bits.
pub(crate) fn protect(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(file_node) = ev.tree().arg(n, 1) else {
        return Value::Number(0);
    };
    let file = ev.text(file_node);
    let override_opt = get_opt(ev, n, OptTag::Override);

    let Some(flags_node) = ev.tree().arg(n, 2) else {
        // Get: from the file, or from the script with (override m).
        return match override_opt {
            Some(o) => Value::Number(ev.resolve(o).as_num()),
            None => match h_protect_get(ev, n, &file) {
                Some(mask) => Value::Number(mask),
                None => Value::Number(-1),
            },
        };
    };

    // Set: a pure-digit string is an absolute mask, otherwise the
    // `hsparwed` flag algebra applies on top of the current bits.
    let flags = ev.text(flags_node);
    let is_absolute = flags.chars().any(|c| c.is_ascii_digit());

    let mask = if is_absolute {
        ev.num(flags_node)
    } else {
        let base = match override_opt {
            Some(o) => ev.resolve(o).as_num(),
            None => match h_protect_get(ev, n, &file) {
                Some(mask) => mask,
                None => return Value::Number(-1),
            },
        };
        apply_protect_flags(base, &flags)
    };

    if override_opt.is_some() {
        // With (override m) nothing touches the file system.
        return Value::Number(mask);
    }
    if pretend_skips(ev, n) {
        return Value::Number(1);
    }
    Value::Number(h_protect_set(ev, n, &file, mask))
}

// ============================================================================
// (startup)
// ============================================================================

/// `(startup app (command..) (prompt..) (help..))`: idempotently
/// maintain a `;BEGIN app` / `;END app` block in the user-startup file.
/// The write goes through a sibling temp file and a rename.
pub(crate) fn startup(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(app_node) = ev.tree().arg(n, 1) else {
        return Value::Number(0);
    };
    let app = ev.text(app_node);

    let Some(command) = get_opt(ev, n, OptTag::Command) else {
        ev.raise(n, ErrorCode::MissingOption, "command");
        return Value::Number(0);
    };
    let Some(prompt) = required_text(ev, n, OptTag::Prompt) else {
        return Value::Number(0);
    };
    let Some(help) = required_text(ev, n, OptTag::Help) else {
        return Value::Number(0);
    };

    if app.is_empty() {
        ev.raise(n, ErrorCode::InvalidApp, app);
        return Value::Number(0);
    }

    // Asking is the default here: skipping a startup edit must be easy.
    if get_opt(ev, n, OptTag::Confirm).is_some() || ev.get_numvar("@user-level") > 0 {
        if !confirm_dialog(ev, &prompt, &help) {
            return Value::Number(0);
        }
    }
    if ev.get_numvar("@pretend") != 0 {
        return Value::Number(1);
    }

    let cmd = ev.resolve(command).as_text();
    let path = ev.get_strvar("@user-startup");

    let mut content = match ev.host().read_file(&path) {
        Ok(data) => String::from_utf8_lossy(&data).into_owned(),
        Err(_) => String::new(),
    };

    let begin_marker = format!(";BEGIN {app}");
    let end_marker = format!(";END {app}");
    let block = format!("{begin_marker}\n{cmd}\n");

    match (content.find(&begin_marker), content.find(&end_marker)) {
        (Some(b), Some(e)) if b < e => {
            // Replace the existing block in place; the end marker and
            // everything after it survive.
            content.replace_range(b..e, &block);
        }
        _ => {
            if !content.is_empty() && !content.ends_with('\n') {
                content.push('\n');
            }
            content.push_str(&block);
            content.push_str(&end_marker);
            content.push('\n');
        }
    }

    let tmp = format!("{path}.{}", std::process::id());
    if ev.host().write_file(&tmp, content.as_bytes()).is_err() {
        ev.raise(n, ErrorCode::WriteFile, tmp);
        return Value::Number(0);
    }
    if ev.host().rename(&tmp, &path).is_err() {
        let _ = ev.host().remove_file(&tmp);
        ev.raise(n, ErrorCode::WriteFile, path);
        return Value::Number(0);
    }
    Value::Number(1)
}

// ============================================================================
// (textfile)
// ============================================================================

/// `(textfile (dest..) (append s)* (include f)* [(confirm..)]
/// [(safe)])`: assemble a file from strings and included files, in
/// option order.
pub(crate) fn textfile(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(dest) = get_opt(ev, n, OptTag::Dest) else {
        ev.raise(n, ErrorCode::MissingOption, "dest");
        return Value::Number(0);
    };

    match confirm_gate(ev, n) {
        Gate::Proceed => {}
        Gate::Skip | Gate::Errored => return Value::Number(0),
    }
    if pretend_skips(ev, n) {
        return Value::Number(1);
    }

    let path = ev.resolve(dest).as_text();
    let mut out: Vec<u8> = Vec::new();
    let mut assembled = false;

    for i in 0..ev.tree().children(n).len() {
        let child = ev.tree().children(n)[i];
        match ev.tree().kind(child) {
            NodeKind::Option(OptTag::Append) => {
                let text = ev.resolve(child).as_text();
                ev.log(n, &format!("Append '{text}' to '{path}'"));
                out.extend_from_slice(text.as_bytes());
                assembled = true;
            }
            NodeKind::Option(OptTag::Include) => {
                let file = ev.resolve(child).as_text();
                match ev.host().read_file(&file) {
                    Ok(data) => {
                        ev.log(n, &format!("Include '{file}' in '{path}'"));
                        out.extend_from_slice(&data);
                        assembled = true;
                    }
                    Err(_) => {
                        ev.raise(n, ErrorCode::ReadFile, file);
                        return Value::Number(0);
                    }
                }
            }
            _ => {}
        }
    }

    if !assembled {
        ev.raise(n, ErrorCode::NothingToDo, "textfile");
        return Value::Number(0);
    }
    if ev.host().write_file(&path, &out).is_err() {
        ev.raise(n, ErrorCode::WriteFile, path);
        return Value::Number(0);
    }
    Value::Number(1)
}

// ============================================================================
// (tooltype)
// ============================================================================

/// `(tooltype (dest..) (settooltype k [v]) (setdefaulttool..)
/// (setstack n) (setposition x y)|(noposition) [(confirm..)] [(safe)])`
pub(crate) fn tooltype(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(dest) = get_opt(ev, n, OptTag::Dest) else {
        ev.raise(n, ErrorCode::MissingOption, "dest");
        return Value::Number(0);
    };

    let noposition = get_opt(ev, n, OptTag::NoPosition);
    let setposition = get_opt(ev, n, OptTag::SetPosition);
    if noposition.is_some() && setposition.is_some() {
        ev.raise(n, ErrorCode::OptionMutex, "noposition/setposition");
        return Value::Number(0);
    }

    match confirm_gate(ev, n) {
        Gate::Proceed => {}
        Gate::Skip | Gate::Errored => return Value::Number(0),
    }
    if pretend_skips(ev, n) {
        return Value::Number(1);
    }

    let file = ev.resolve(dest).as_text();
    let mut meta = match ev.host().icon_read(&file) {
        Ok(meta) => meta,
        Err(_) => {
            ev.raise(n, ErrorCode::ReadFile, file);
            return Value::Number(0);
        }
    };

    if let Some(opt) = get_opt(ev, n, OptTag::SetToolType) {
        let kids = ev.tree().children(opt);
        let key_node = kids.first().copied();
        let value_node = kids.get(1).copied();
        if let Some(key_node) = key_node {
            let key = ev.text(key_node);
            match value_node {
                Some(value_node) => {
                    let value = ev.text(value_node);
                    meta.set_tooltype(&key, &value);
                }
                // No value at all deletes the tooltype.
                None => meta.delete_tooltype(&key),
            }
        }
    }

    if let Some(opt) = get_opt(ev, n, OptTag::SetDefaultTool) {
        meta.default_tool = Some(ev.resolve(opt).as_text());
    }
    if let Some(opt) = get_opt(ev, n, OptTag::SetStack) {
        meta.stack = ev.resolve(opt).as_num();
    }
    if noposition.is_some() {
        meta.position = None;
    }
    if let Some(opt) = setposition {
        let kids = ev.tree().children(opt);
        if kids.len() >= 2 {
            let x_node = kids[0];
            let y_node = kids[1];
            let x = ev.num(x_node);
            let y = ev.num(y_node);
            meta.position = Some((x, y));
        }
    }

    if ev.host().icon_write(&file, &meta).is_err() {
        ev.raise(n, ErrorCode::WriteFile, file);
        return Value::Number(0);
    }
    Value::Number(1)
}

// ============================================================================
// (foreach)
// ============================================================================

/// `(foreach dir pattern stmts...)`: for each directory entry matching
/// the pattern, bind `@each-name` / `@each-type` and run the body.
pub(crate) fn foreach(ev: &mut Evaluator, n: NodeId) -> Value {
    let (Some(dir_node), Some(pat_node)) = (ev.tree().arg(n, 1), ev.tree().arg(n, 2)) else {
        return Value::Number(0);
    };
    let dir = ev.text(dir_node);
    let pat = ev.text(pat_node);

    let pattern = match Pattern::compile(&pat) {
        Ok(p) => p,
        Err(_) => {
            ev.raise(n, ErrorCode::Overflow, pat);
            return Value::Number(0);
        }
    };
    let entries = match ev.host().read_dir(&dir) {
        Ok(entries) => entries,
        Err(_) => {
            ev.raise(n, ErrorCode::ReadDir, dir);
            return Value::Number(0);
        }
    };

    let body_start = 2;
    for name in entries {
        if ev.faulted() {
            break;
        }
        let path = h_tackon(&dir, &name);
        let kind = ev.host().exists(&path);

        // Name and type are exported for every entry; the body only
        // runs on a match.
        ev.set_numvar("@each-type", kind.as_num());
        ev.set_strvar("@each-name", name.clone());

        if !pattern.matches(&name) {
            continue;
        }
        let count = ev.tree().arg_count(n);
        for i in (body_start + 1)..=count {
            if ev.faulted() {
                break;
            }
            if let Some(stmt) = ev.tree().arg(n, i) {
                ev.invoke(stmt);
            }
        }
    }
    Value::Number(if ev.faulted() { 0 } else { 1 })
}
