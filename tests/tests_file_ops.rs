//! File-system operators exercised against real temp directories.

mod helpers;

use amiscript::{Config, Outcome, Value};
use helpers::{path_in, sandbox, with_script, with_script_cfg};
use std::fs;

fn run(source: &str) -> Outcome {
    with_script(source, |ev, root| ev.run(root))
}

// ============================================================================
// (copyfiles)
// ============================================================================

#[test]
fn test_copyfiles_all_copies_tree() {
    let dir = sandbox();
    let src = path_in(&dir, "src");
    let dst = path_in(&dir, "dst");
    fs::create_dir(&src).unwrap();
    fs::create_dir(&dst).unwrap();
    fs::write(format!("{src}/a.txt"), "A").unwrap();
    let log = path_in(&dir, "log");

    let script = format!(
        "(set @log 1) (set @log-file \"{log}\") \
         (set r (copyfiles (source \"{src}\") (dest \"{dst}\") (all)))"
    );
    with_script(&script, |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert_eq!(ev.lookup("r"), Some(&Value::Number(1)));
    });

    assert_eq!(fs::read_to_string(format!("{dst}/a.txt")).unwrap(), "A");
    let logged = fs::read_to_string(&log).unwrap();
    assert!(logged.contains("copyfiles"), "log prefix missing: {logged}");
    assert!(
        logged.contains(&format!("Copied '{src}/a.txt' to '{dst}/a.txt'")),
        "copy not logged: {logged}"
    );
}

#[test]
fn test_copyfiles_recurses_into_subdirectories() {
    let dir = sandbox();
    let src = path_in(&dir, "src");
    let dst = path_in(&dir, "dst");
    fs::create_dir_all(format!("{src}/sub")).unwrap();
    fs::write(format!("{src}/top.txt"), "t").unwrap();
    fs::write(format!("{src}/sub/deep.txt"), "d").unwrap();

    let script = format!("(copyfiles (source \"{src}\") (dest \"{dst}\") (all))");
    assert_eq!(run(&script), Outcome::Complete);
    assert_eq!(fs::read_to_string(format!("{dst}/top.txt")).unwrap(), "t");
    assert_eq!(fs::read_to_string(format!("{dst}/sub/deep.txt")).unwrap(), "d");
}

#[test]
fn test_copyfiles_files_option_skips_subdirectories() {
    let dir = sandbox();
    let src = path_in(&dir, "src");
    let dst = path_in(&dir, "dst");
    fs::create_dir_all(format!("{src}/sub")).unwrap();
    fs::write(format!("{src}/top.txt"), "t").unwrap();
    fs::write(format!("{src}/sub/deep.txt"), "d").unwrap();

    let script = format!("(copyfiles (source \"{src}\") (dest \"{dst}\") (all) (files))");
    assert_eq!(run(&script), Outcome::Complete);
    assert!(fs::metadata(format!("{dst}/top.txt")).is_ok());
    assert!(fs::metadata(format!("{dst}/sub")).is_err());
}

#[test]
fn test_copyfiles_pattern_filters() {
    let dir = sandbox();
    let src = path_in(&dir, "src");
    let dst = path_in(&dir, "dst");
    fs::create_dir(&src).unwrap();
    fs::write(format!("{src}/keep.library"), "k").unwrap();
    fs::write(format!("{src}/drop.txt"), "x").unwrap();

    let script =
        format!("(copyfiles (source \"{src}\") (dest \"{dst}\") (pattern \"#?.library\"))");
    assert_eq!(run(&script), Outcome::Complete);
    assert!(fs::metadata(format!("{dst}/keep.library")).is_ok());
    assert!(fs::metadata(format!("{dst}/drop.txt")).is_err());
}

#[test]
fn test_copyfiles_choices_must_exist() {
    let dir = sandbox();
    let src = path_in(&dir, "src");
    let dst = path_in(&dir, "dst");
    fs::create_dir(&src).unwrap();
    fs::write(format!("{src}/real.txt"), "r").unwrap();

    let script = format!(
        "(onerror (set handled 1)) \
         (copyfiles (source \"{src}\") (dest \"{dst}\") (choices \"ghost.txt\"))"
    );
    with_script(&script, |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert_eq!(ev.lookup("handled"), Some(&Value::Number(1)));
    });
    assert!(fs::metadata(&dst).is_err());
}

#[test]
fn test_copyfiles_single_file_with_newname() {
    let dir = sandbox();
    let src = path_in(&dir, "one.txt");
    let dst = path_in(&dir, "out");
    fs::write(&src, "1").unwrap();

    let script =
        format!("(copyfiles (source \"{src}\") (dest \"{dst}\") (newname \"renamed.txt\"))");
    assert_eq!(run(&script), Outcome::Complete);
    assert_eq!(fs::read_to_string(format!("{dst}/renamed.txt")).unwrap(), "1");
}

#[test]
fn test_copyfiles_mutex_options_fail() {
    let dir = sandbox();
    let src = path_in(&dir, "src");
    fs::create_dir(&src).unwrap();

    let script = format!(
        "(onerror (set handled 1)) \
         (copyfiles (source \"{src}\") (dest \"{src}2\") (all) (pattern \"#?\"))"
    );
    with_script(&script, |ev, root| {
        ev.run(root);
        assert_eq!(ev.lookup("handled"), Some(&Value::Number(1)));
    });
}

#[test]
fn test_pretend_skips_copy_but_reports_success() {
    let dir = sandbox();
    let src = path_in(&dir, "src");
    let dst = path_in(&dir, "dst");
    fs::create_dir(&src).unwrap();
    fs::write(format!("{src}/a.txt"), "A").unwrap();

    let script = format!(
        "(set @pretend 1) \
         (set r (copyfiles (source \"{src}\") (dest \"{dst}\") (all)))"
    );
    with_script(&script, |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert_eq!(ev.lookup("r"), Some(&Value::Number(1)));
    });
    assert!(fs::metadata(&dst).is_err(), "pretend must not write");
}

// ============================================================================
// (copylib)
// ============================================================================

#[test]
fn test_copylib_installs_when_newer() {
    let dir = sandbox();
    let src = path_in(&dir, "asl.library");
    let dst = path_in(&dir, "libs");
    fs::write(&src, "$VER: asl.library 45.3").unwrap();

    let script = format!(
        "(copylib (prompt \"p\") (help \"h\") (source \"{src}\") (dest \"{dst}\"))"
    );
    assert_eq!(run(&script), Outcome::Complete);
    let installed = fs::read_to_string(format!("{dst}/asl.library")).unwrap();
    assert!(installed.contains("45.3"));

    // An older source must not replace it.
    fs::write(&src, "$VER: asl.library 40.1").unwrap();
    assert_eq!(run(&script), Outcome::Complete);
    let kept = fs::read_to_string(format!("{dst}/asl.library")).unwrap();
    assert!(kept.contains("45.3"), "older version overwrote: {kept}");

    // A newer one does.
    fs::write(&src, "$VER: asl.library 47.0").unwrap();
    assert_eq!(run(&script), Outcome::Complete);
    let upgraded = fs::read_to_string(format!("{dst}/asl.library")).unwrap();
    assert!(upgraded.contains("47.0"));
}

#[test]
fn test_copylib_requires_source_version() {
    let dir = sandbox();
    let src = path_in(&dir, "plain.library");
    let dst = path_in(&dir, "libs");
    fs::write(&src, "no version tag here").unwrap();

    let script = format!(
        "(onerror (set handled 1)) \
         (copylib (prompt \"p\") (help \"h\") (source \"{src}\") (dest \"{dst}\"))"
    );
    with_script(&script, |ev, root| {
        ev.run(root);
        assert_eq!(ev.lookup("handled"), Some(&Value::Number(1)));
    });
}

#[test]
fn test_copylib_overwrites_versionless_destination() {
    let dir = sandbox();
    let src = path_in(&dir, "asl.library");
    let dst = path_in(&dir, "libs");
    fs::create_dir(&dst).unwrap();
    fs::write(&src, "$VER: asl.library 45.3").unwrap();
    fs::write(format!("{dst}/asl.library"), "ancient, untagged").unwrap();

    let script = format!(
        "(copylib (prompt \"p\") (help \"h\") (source \"{src}\") (dest \"{dst}\"))"
    );
    assert_eq!(run(&script), Outcome::Complete);
    let replaced = fs::read_to_string(format!("{dst}/asl.library")).unwrap();
    assert!(replaced.contains("45.3"));
}

// ============================================================================
// (delete)
// ============================================================================

#[test]
fn test_delete_file_and_info_sidecar() {
    let dir = sandbox();
    let file = path_in(&dir, "gone.txt");
    fs::write(&file, "x").unwrap();
    fs::write(format!("{file}.info"), "icon").unwrap();

    let script = format!("(delete \"{file}\" (infos))");
    assert_eq!(run(&script), Outcome::Complete);
    assert!(fs::metadata(&file).is_err());
    assert!(fs::metadata(format!("{file}.info")).is_err());
}

#[test]
fn test_delete_pattern() {
    let dir = sandbox();
    let base = path_in(&dir, "work");
    fs::create_dir(&base).unwrap();
    fs::write(format!("{base}/a.txt"), "a").unwrap();
    fs::write(format!("{base}/b.txt"), "b").unwrap();
    fs::write(format!("{base}/c.dat"), "c").unwrap();

    let script = format!("(delete \"{base}/#?.txt\")");
    assert_eq!(run(&script), Outcome::Complete);
    assert!(fs::metadata(format!("{base}/a.txt")).is_err());
    assert!(fs::metadata(format!("{base}/b.txt")).is_err());
    assert!(fs::metadata(format!("{base}/c.dat")).is_ok());
}

#[test]
fn test_delete_all_recurses() {
    let dir = sandbox();
    let base = path_in(&dir, "tree");
    fs::create_dir_all(format!("{base}/sub")).unwrap();
    fs::write(format!("{base}/f"), "f").unwrap();
    fs::write(format!("{base}/sub/g"), "g").unwrap();

    let script = format!("(delete \"{base}\" (all))");
    assert_eq!(run(&script), Outcome::Complete);
    assert!(fs::metadata(&base).is_err());
}

#[test]
fn test_delete_pretend_touches_nothing() {
    let dir = sandbox();
    let file = path_in(&dir, "keep.txt");
    fs::write(&file, "k").unwrap();

    let script = format!("(set @pretend 1) (set r (delete \"{file}\"))");
    with_script(&script, |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert_eq!(ev.lookup("r"), Some(&Value::Number(1)));
    });
    assert!(fs::metadata(&file).is_ok());
}

// ============================================================================
// (makedir) / (rename) / (makeassign)
// ============================================================================

#[test]
fn test_makedir_creates_tree() {
    let dir = sandbox();
    let deep = path_in(&dir, "a/b/c");
    let script = format!("(makedir \"{deep}\")");
    assert_eq!(run(&script), Outcome::Complete);
    assert!(fs::metadata(&deep).map(|m| m.is_dir()).unwrap_or(false));
}

#[test]
fn test_makedir_with_infos_drops_icon() {
    let dir = sandbox();
    let drawer = path_in(&dir, "drawer");
    let script = format!("(makedir \"{drawer}\" (infos))");
    assert_eq!(run(&script), Outcome::Complete);
    assert!(fs::metadata(format!("{drawer}.info")).is_ok());
}

#[test]
fn test_rename_moves_file() {
    let dir = sandbox();
    let old = path_in(&dir, "old.txt");
    let new = path_in(&dir, "new.txt");
    fs::write(&old, "data").unwrap();

    let script = format!("(set r (rename \"{old}\" \"{new}\"))");
    with_script(&script, |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert_eq!(ev.lookup("r"), Some(&Value::Number(-1)));
    });
    assert!(fs::metadata(&old).is_err());
    assert_eq!(fs::read_to_string(&new).unwrap(), "data");
}

#[test]
fn test_rename_refuses_existing_target() {
    let dir = sandbox();
    let old = path_in(&dir, "old.txt");
    let new = path_in(&dir, "new.txt");
    fs::write(&old, "o").unwrap();
    fs::write(&new, "n").unwrap();

    let script = format!("(onerror (set handled 1)) (rename \"{old}\" \"{new}\")");
    with_script(&script, |ev, root| {
        ev.run(root);
        assert_eq!(ev.lookup("handled"), Some(&Value::Number(1)));
    });
    assert_eq!(fs::read_to_string(&new).unwrap(), "n");
}

#[test]
fn test_makeassign_and_getassign() {
    let script = "(makeassign \"MYA\" \"Work:Tools\") \
                  (set p (getassign \"mya\")) \
                  (makeassign \"MYA\") \
                  (set gone (getassign \"mya\"))";
    with_script(script, |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert_eq!(ev.lookup("p"), Some(&Value::Text("Work:Tools".into())));
        assert_eq!(ev.lookup("gone"), Some(&Value::Text("".into())));
    });
}

// ============================================================================
// (protect)
// ============================================================================

#[test]
fn test_protect_override_flag_algebra() {
    // With (override m) nothing touches the file system; the result is
    // the computed mask. A bare flag string replaces: "h" sets the hide
    // bit and leaves rwed denied (low four set, inverted encoding).
    let script = "(protect \"x\" \"h\" (override 0))";
    with_script(script, |ev, root| {
        let stmt = ev.tree().children(root)[0];
        assert_eq!(ev.invoke(stmt), Value::Number(0x8f));
    });
}

#[test]
fn test_protect_override_add_and_clear() {
    with_script("(protect \"x\" \"-d\" (override 0))", |ev, root| {
        let stmt = ev.tree().children(root)[0];
        // Clearing 'd' denies delete: bit 0 set after re-inversion.
        assert_eq!(ev.invoke(stmt), Value::Number(0x01));
    });
    with_script("(protect \"x\" \"+w\" (override 1))", |ev, root| {
        let stmt = ev.tree().children(root)[0];
        // Granting 'w' on a delete-denied mask keeps the denial.
        assert_eq!(ev.invoke(stmt), Value::Number(0x01));
    });
}

#[test]
fn test_protect_set_and_get_round_trip() {
    let dir = sandbox();
    let file = path_in(&dir, "f.txt");
    fs::write(&file, "x").unwrap();

    // Deny write+delete, read the coarse mask back, then restore.
    let script = format!(
        "(protect \"{file}\" \"5\") (set m (protect \"{file}\")) (protect \"{file}\" \"0\")"
    );
    with_script(&script, |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert_eq!(ev.lookup("m"), Some(&Value::Number(5)));
    });
}

// ============================================================================
// (startup)
// ============================================================================

fn startup_config(user_startup: &str) -> Config {
    Config {
        user_startup: user_startup.to_string(),
        ..Config::default()
    }
}

#[test]
fn test_startup_creates_block_and_is_idempotent() {
    let dir = sandbox();
    let file = path_in(&dir, "user-startup");
    fs::write(&file, "").unwrap();

    let script = "(startup \"MyApp\" (prompt \"p\") (help \"h\") \
                  (command \"assign MYA: Work:\"))";
    let expected = ";BEGIN MyApp\nassign MYA: Work:\n;END MyApp\n";

    for _ in 0..2 {
        with_script_cfg(script, startup_config(&file), |ev, root| {
            assert_eq!(ev.run(root), Outcome::Complete);
        });
        assert_eq!(fs::read_to_string(&file).unwrap(), expected);
    }
}

#[test]
fn test_startup_replaces_existing_block_in_place() {
    let dir = sandbox();
    let file = path_in(&dir, "user-startup");
    fs::write(
        &file,
        "path ram: add\n;BEGIN MyApp\nold command\n;END MyApp\necho done\n",
    )
    .unwrap();

    let script = "(startup \"MyApp\" (prompt \"p\") (help \"h\") (command \"new command\"))";
    with_script_cfg(script, startup_config(&file), |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
    });
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "path ram: add\n;BEGIN MyApp\nnew command\n;END MyApp\necho done\n"
    );
}

#[test]
fn test_startup_rejects_empty_app_name() {
    let dir = sandbox();
    let file = path_in(&dir, "user-startup");

    let script = "(onerror (set handled 1)) \
                  (startup \"\" (prompt \"p\") (help \"h\") (command \"c\"))";
    with_script_cfg(script, startup_config(&file), |ev, root| {
        ev.run(root);
        assert_eq!(ev.lookup("handled"), Some(&Value::Number(1)));
    });
}

// ============================================================================
// (textfile)
// ============================================================================

#[test]
fn test_textfile_assembles_in_option_order() {
    let dir = sandbox();
    let dest = path_in(&dir, "out.txt");
    let include = path_in(&dir, "part.txt");
    fs::write(&include, "MIDDLE\n").unwrap();

    let script = format!(
        "(textfile (dest \"{dest}\") (append \"first\n\") \
         (include \"{include}\") (append \"last\n\"))"
    );
    assert_eq!(run(&script), Outcome::Complete);
    assert_eq!(
        fs::read_to_string(&dest).unwrap(),
        "first\nMIDDLE\nlast\n"
    );
}

#[test]
fn test_textfile_with_nothing_to_do_is_an_error() {
    let dir = sandbox();
    let dest = path_in(&dir, "out.txt");

    let script = format!("(onerror (set handled 1)) (textfile (dest \"{dest}\"))");
    with_script(&script, |ev, root| {
        ev.run(root);
        assert_eq!(ev.lookup("handled"), Some(&Value::Number(1)));
    });
}

// ============================================================================
// (tooltype) / (iconinfo)
// ============================================================================

#[test]
fn test_tooltype_and_iconinfo_round_trip() {
    let dir = sandbox();
    let drawer = path_in(&dir, "App");

    let script = format!(
        "(makedir \"{drawer}\" (infos)) \
         (tooltype (dest \"{drawer}\") (settooltype \"FILETYPE\" \"text\") \
                   (setdefaulttool \"SYS:Utilities/MultiView\") \
                   (setstack 16384) (setposition 10 20)) \
         (iconinfo (dest \"{drawer}\") \
                   (gettooltype \"FILETYPE\" \"tt\") \
                   (getdefaulttool \"tool\") \
                   (getstack \"stack\") \
                   (getposition \"px\" \"py\"))"
    );
    with_script(&script, |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert_eq!(ev.lookup("tt"), Some(&Value::Text("text".into())));
        assert_eq!(
            ev.lookup("tool"),
            Some(&Value::Text("SYS:Utilities/MultiView".into()))
        );
        assert_eq!(ev.lookup("stack"), Some(&Value::Text("16384".into())));
        assert_eq!(ev.lookup("px"), Some(&Value::Text("10".into())));
        assert_eq!(ev.lookup("py"), Some(&Value::Text("20".into())));
    });
}

#[test]
fn test_tooltype_deletes_key_without_value() {
    let dir = sandbox();
    let drawer = path_in(&dir, "App");

    let script = format!(
        "(makedir \"{drawer}\" (infos)) \
         (tooltype (dest \"{drawer}\") (settooltype \"DONOTWAIT\" \"\")) \
         (tooltype (dest \"{drawer}\") (settooltype \"DONOTWAIT\")) \
         (iconinfo (dest \"{drawer}\") (gettooltype \"DONOTWAIT\" \"tt\"))"
    );
    with_script(&script, |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert_eq!(ev.lookup("tt"), Some(&Value::Text("".into())));
    });
}

#[test]
fn test_tooltype_position_mutex() {
    let dir = sandbox();
    let drawer = path_in(&dir, "App");

    let script = format!(
        "(makedir \"{drawer}\" (infos)) \
         (onerror (set handled 1)) \
         (tooltype (dest \"{drawer}\") (noposition) (setposition 1 2))"
    );
    with_script(&script, |ev, root| {
        ev.run(root);
        assert_eq!(ev.lookup("handled"), Some(&Value::Number(1)));
    });
}

// ============================================================================
// (foreach) and probes
// ============================================================================

#[test]
fn test_foreach_enumerates_each_entry_once() {
    let dir = sandbox();
    let base = path_in(&dir, "d");
    fs::create_dir(&base).unwrap();
    for name in ["a", "b", "c"] {
        fs::write(format!("{base}/{name}"), name).unwrap();
    }

    let script = format!(
        "(set n 0) (set seen \"\") \
         (foreach \"{base}\" \"#?\" \
            (set n (+ n 1)) \
            (set seen (cat seen @each-name \";\")))"
    );
    with_script(&script, |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert_eq!(ev.lookup("n"), Some(&Value::Number(3)));
        let seen = ev.lookup("seen").cloned().expect("seen bound").as_text();
        for name in ["a;", "b;", "c;"] {
            assert_eq!(seen.matches(name).count(), 1, "{seen}");
        }
    });
}

#[test]
fn test_foreach_pattern_and_each_type() {
    let dir = sandbox();
    let base = path_in(&dir, "d");
    fs::create_dir_all(format!("{base}/sub.dir")).unwrap();
    fs::write(format!("{base}/file.txt"), "f").unwrap();
    fs::write(format!("{base}/other.dat"), "o").unwrap();

    let script = format!(
        "(set types 0) \
         (foreach \"{base}\" \"#?.dir\" (set types @each-type))"
    );
    with_script(&script, |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert_eq!(ev.lookup("types"), Some(&Value::Number(2)));
    });
}

#[test]
fn test_exists_getsize_getsum() {
    let dir = sandbox();
    let file = path_in(&dir, "data.bin");
    fs::write(&file, "Wikipedia").unwrap();

    let script = format!(
        "(set e (exists \"{file}\")) \
         (set d (exists \"{dir}\")) \
         (set s (getsize \"{file}\")) \
         (set sum (getsum \"{file}\"))",
        dir = path_in(&dir, ""),
        file = file,
    );
    with_script(&script, |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert_eq!(ev.lookup("e"), Some(&Value::Number(1)));
        assert_eq!(ev.lookup("d"), Some(&Value::Number(2)));
        assert_eq!(ev.lookup("s"), Some(&Value::Number(9)));
        // Adler-32 of "Wikipedia".
        assert_eq!(ev.lookup("sum"), Some(&Value::Number(0x11E60398)));
    });
}

#[test]
fn test_getversion_scans_file_tag() {
    let dir = sandbox();
    let file = path_in(&dir, "tool");
    fs::write(&file, "binary junk $VER: tool 40.68 (01.01.99) more").unwrap();

    let script = format!("(getversion \"{file}\")");
    with_script(&script, |ev, root| {
        let stmt = ev.tree().children(root)[0];
        assert_eq!(ev.invoke(stmt), Value::Number((40 << 16) | 68));
    });
}

#[test]
fn test_earlier() {
    let dir = sandbox();
    let a = path_in(&dir, "a");
    let b = path_in(&dir, "b");
    fs::write(&a, "a").unwrap();
    fs::write(&b, "b").unwrap();
    // Force a visible mtime gap without sleeping.
    let old = filetime_set(&a, 1_000_000);
    let new = filetime_set(&b, 2_000_000);
    assert!(old && new);

    let script = format!("(set r (earlier \"{a}\" \"{b}\"))");
    with_script(&script, |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert_eq!(ev.lookup("r"), Some(&Value::Number(1)));
    });
}

/// Set a file's mtime in seconds since the epoch.
fn filetime_set(path: &str, secs: u64) -> bool {
    let file = fs::File::options().write(true).open(path);
    match file {
        Ok(f) => f
            .set_modified(std::time::UNIX_EPOCH + std::time::Duration::from_secs(secs))
            .is_ok(),
        Err(_) => false,
    }
}

// ============================================================================
// pretend safety across the mutating operators
// ============================================================================

#[test]
fn test_pretend_blocks_all_mutating_operators() {
    let dir = sandbox();
    let target = path_in(&dir, "never");
    let victim = path_in(&dir, "victim.txt");
    fs::write(&victim, "v").unwrap();

    let script = format!(
        "(set @pretend 1) \
         (makedir \"{target}\") \
         (delete \"{victim}\") \
         (textfile (dest \"{target}.txt\") (append \"x\")) \
         (rename \"{victim}\" \"{target}.ren\")"
    );
    assert_eq!(run(&script), Outcome::Complete);
    assert!(fs::metadata(&target).is_err());
    assert!(fs::metadata(format!("{target}.txt")).is_err());
    assert!(fs::metadata(&victim).is_ok());
}

#[test]
fn test_safe_defeats_pretend() {
    let dir = sandbox();
    let target = path_in(&dir, "made");

    let script = format!("(set @pretend 1) (makedir \"{target}\" (safe))");
    assert_eq!(run(&script), Outcome::Complete);
    assert!(fs::metadata(&target).map(|m| m.is_dir()).unwrap_or(false));
}
