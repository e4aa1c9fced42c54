//! User prompting operators.
//!
//! Every prompt carries `(prompt ...)` and `(help ...)`; in non-strict
//! mode their absence reads as an empty string. When `@user-level` is
//! novice the dialogs are bypassed entirely and the `(default ...)`
//! value is returned, which is what makes unattended novice installs
//! possible.

use crate::ast::{NodeId, OptTag};
use crate::dialog::{PathFlags, Response};
use crate::error::ErrorCode;
use crate::eval::{Evaluator, Value};
use crate::ops::{get_opt, required_text};

/// Escape sequence that historically switched the choice list to
/// proportional rendering; stripped before display.
const PROPORTIONAL_ESC: &str = "\x1b[2p";

fn novice(ev: &Evaluator) -> bool {
    ev.get_numvar("@user-level") == 0
}

/// `(askbool (prompt..) (help..) (default..) (choices..))`: 0 or 1.
pub(crate) fn askbool(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(prompt) = required_text(ev, n, OptTag::Prompt) else {
        return Value::Number(0);
    };
    let Some(help) = required_text(ev, n, OptTag::Help) else {
        return Value::Number(0);
    };

    let mut yes = "Yes".to_string();
    let mut no = "No".to_string();
    if let Some(choices) = get_opt(ev, n, OptTag::Choices) {
        let kids = ev.tree().children(choices);
        if let Some(first) = kids.first().copied() {
            yes = ev.text(first);
        }
        if let Some(second) = ev.tree().children(choices).get(1).copied() {
            no = ev.text(second);
        }
    }

    let mut result = match get_opt(ev, n, OptTag::Default) {
        Some(d) => ev.resolve(d).as_num(),
        None => 0,
    };

    if !novice(ev) && !ev.faulted() {
        match ev.dialog().ask_bool(&prompt, &help, &yes, &no) {
            Response::Answer(b) => result = b as i32,
            Response::Abort => {
                ev.halt();
                return Value::Number(0);
            }
        }
    }
    Value::Number(result)
}

/// Collect the visible choice strings, preserving the full numbering
/// for defaults. Empty strings are invisible but still count.
fn gather_choices(ev: &mut Evaluator, choices: NodeId) -> (Vec<String>, usize) {
    let mut visible = Vec::new();
    let total = ev.tree().children(choices).len();
    for i in 0..total {
        let child = ev.tree().children(choices)[i];
        let mut text = ev.text(child);
        if let Some(stripped) = text.strip_prefix(PROPORTIONAL_ESC) {
            text = stripped.to_string();
        }
        if !text.is_empty() {
            visible.push(text);
        }
    }
    (visible, total)
}

/// `(askchoice (prompt..) (help..) (choices..) (default..))`: a
/// zero-based index, like the 3.9 installer (not the bitmask the guide
/// promises).
pub(crate) fn askchoice(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(prompt) = required_text(ev, n, OptTag::Prompt) else {
        return Value::Number(0);
    };
    let Some(help) = required_text(ev, n, OptTag::Help) else {
        return Value::Number(0);
    };
    let Some(choices) = get_opt(ev, n, OptTag::Choices) else {
        ev.raise(n, ErrorCode::MissingOption, "choices");
        return Value::Number(0);
    };

    let (visible, total) = gather_choices(ev, choices);
    let deflt = get_opt(ev, n, OptTag::Default);

    if visible.is_empty() {
        let d = deflt.map_or(0, |d| ev.resolve(d).as_num());
        return Value::Number(d);
    }

    let mut selected = 0;
    if let Some(d) = deflt {
        let d = ev.resolve(d).as_num();
        if d < 0 || d >= total as i32 {
            let text = d.to_string();
            ev.raise(n, ErrorCode::NoItem, text);
            return Value::Number(0);
        }
        selected = d;
    }

    if !novice(ev) && !ev.faulted() {
        match ev.dialog().ask_choice(&prompt, &help, &visible, selected) {
            Response::Answer(idx) => selected = idx,
            Response::Abort => {
                ev.halt();
                return Value::Number(0);
            }
        }
    }
    Value::Number(selected)
}

/// `(askoptions (prompt..) (help..) (choices..) (default..))`: a 32-bit
/// mask of selected options; the default default is all ones.
pub(crate) fn askoptions(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(prompt) = required_text(ev, n, OptTag::Prompt) else {
        return Value::Number(-1);
    };
    let Some(help) = required_text(ev, n, OptTag::Help) else {
        return Value::Number(-1);
    };
    let Some(choices) = get_opt(ev, n, OptTag::Choices) else {
        ev.raise(n, ErrorCode::MissingOption, "choices");
        return Value::Number(-1);
    };

    let (visible, total) = gather_choices(ev, choices);
    let deflt = get_opt(ev, n, OptTag::Default);

    if visible.is_empty() {
        let d = deflt.map_or(-1, |d| ev.resolve(d).as_num());
        return Value::Number(d);
    }

    let mut mask = -1;
    if let Some(d) = deflt {
        let d = ev.resolve(d).as_num();
        if total < 32 && d >= (1 << total) {
            let text = d.to_string();
            ev.raise(n, ErrorCode::NoItem, text);
            return Value::Number(0);
        }
        mask = d;
    }

    if !novice(ev) && !ev.faulted() {
        match ev.dialog().ask_options(&prompt, &help, &visible, mask) {
            Response::Answer(m) => mask = m,
            Response::Abort => {
                ev.halt();
                return Value::Number(0);
            }
        }
    }
    Value::Number(mask)
}

/// `(asknumber (prompt..) (help..) (range..) (default..))`
pub(crate) fn asknumber(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(prompt) = required_text(ev, n, OptTag::Prompt) else {
        return Value::Number(0);
    };
    let Some(help) = required_text(ev, n, OptTag::Help) else {
        return Value::Number(0);
    };
    let Some(deflt) = get_opt(ev, n, OptTag::Default) else {
        ev.raise(n, ErrorCode::MissingOption, "default");
        return Value::Number(0);
    };

    // The range defaults to 0..100; a nonsensical range is replaced by
    // the default range rather than rejected.
    let (mut min, mut max) = (0, 100);
    if let Some(range) = get_opt(ev, n, OptTag::Range) {
        let kids = ev.tree().children(range);
        if kids.len() >= 2 {
            let lo = kids[0];
            let hi = kids[1];
            min = ev.num(lo);
            max = ev.num(hi);
            if min >= max {
                min = 0;
                max = 100;
            }
        }
    }

    let mut result = ev.resolve(deflt).as_num();
    if !novice(ev) && !ev.faulted() {
        match ev.dialog().ask_number(&prompt, &help, min, max, result) {
            Response::Answer(v) => result = v,
            Response::Abort => {
                ev.halt();
                return Value::Number(0);
            }
        }
    }
    Value::Number(result)
}

/// `(askstring (prompt..) (help..) (default..))`
pub(crate) fn askstring(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(prompt) = required_text(ev, n, OptTag::Prompt) else {
        return Value::text("");
    };
    let Some(help) = required_text(ev, n, OptTag::Help) else {
        return Value::text("");
    };
    let Some(deflt) = get_opt(ev, n, OptTag::Default) else {
        ev.raise(n, ErrorCode::MissingOption, "default");
        return Value::text("");
    };

    let mut result = ev.resolve(deflt).as_text();
    if !novice(ev) && !ev.faulted() {
        match ev.dialog().ask_string(&prompt, &help, &result) {
            Response::Answer(s) => result = s,
            Response::Abort => {
                ev.halt();
                return Value::text("");
            }
        }
    }
    Value::text(result)
}

fn path_flags(ev: &Evaluator, n: NodeId) -> PathFlags {
    PathFlags {
        new_path: get_opt(ev, n, OptTag::NewPath).is_some(),
        disk: get_opt(ev, n, OptTag::Disk).is_some(),
        assigns: get_opt(ev, n, OptTag::Assigns).is_some(),
    }
}

/// `(askdir (prompt..) (help..) (default..) (newpath) (disk) (assigns))`
pub(crate) fn askdir(ev: &mut Evaluator, n: NodeId) -> Value {
    ask_path(ev, n, false)
}

/// `(askfile (prompt..) (help..) (default..) (newpath) (disk))`
pub(crate) fn askfile(ev: &mut Evaluator, n: NodeId) -> Value {
    ask_path(ev, n, true)
}

fn ask_path(ev: &mut Evaluator, n: NodeId, file: bool) -> Value {
    let Some(prompt) = required_text(ev, n, OptTag::Prompt) else {
        return Value::text("");
    };
    let Some(help) = required_text(ev, n, OptTag::Help) else {
        return Value::text("");
    };
    let Some(deflt) = get_opt(ev, n, OptTag::Default) else {
        ev.raise(n, ErrorCode::MissingOption, "default");
        return Value::text("");
    };

    let mut result = ev.resolve(deflt).as_text();
    if !novice(ev) && !ev.faulted() {
        let flags = path_flags(ev, n);
        let response = if file {
            ev.dialog().ask_file(&prompt, &help, flags, &result)
        } else {
            ev.dialog().ask_dir(&prompt, &help, flags, &result)
        };
        match response {
            Response::Answer(path) => result = path,
            Response::Abort => {
                ev.halt();
                return Value::text("");
            }
        }
    }
    Value::text(result)
}

/// `(askdisk (prompt..) (help..) (dest..) (newname..))`: wait for a
/// volume. Off-Amiga every volume is considered mounted; `(newname)`
/// still creates the alias assign.
pub(crate) fn askdisk(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(_prompt) = required_text(ev, n, OptTag::Prompt) else {
        return Value::Number(0);
    };
    let Some(_help) = required_text(ev, n, OptTag::Help) else {
        return Value::Number(0);
    };
    let Some(dest) = get_opt(ev, n, OptTag::Dest) else {
        ev.raise(n, ErrorCode::MissingOption, "dest");
        return Value::Number(0);
    };

    let volume = ev.resolve(dest).as_text();
    if volume.is_empty() {
        ev.raise(n, ErrorCode::InvalidVolume, ":");
        return Value::Number(0);
    }

    if let Some(newname) = get_opt(ev, n, OptTag::NewName) {
        let alias = ev.resolve(newname).as_text();
        if alias.is_empty() {
            ev.raise(n, ErrorCode::InvalidAssign, alias);
            return Value::Number(0);
        }
        let target = format!("{volume}:");
        if !ev.host().make_assign(&alias, Some(&target)) {
            ev.raise(n, ErrorCode::Assign, alias);
            return Value::Number(0);
        }
    }
    Value::Number(1)
}
