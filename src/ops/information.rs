//! Informational operators: messages, progress, the welcome gate, and
//! debug output.

use crate::ast::{NodeId, NodeKind, OptTag};
use crate::dialog::{MessageChoice, Response, WelcomeLimits, WelcomeSettings};
use crate::eval::{Evaluator, Value};
use crate::ops::{concat_args, get_opt};

/// `(message s... [(all)] [(back ...)])`: show a Proceed/Abort dialog
/// unless the user level is novice (overridable with `(all)`). With a
/// `(back ...)` option, pressing back evaluates that subtree and its
/// value becomes the result.
pub(crate) fn message(ev: &mut Evaluator, n: NodeId) -> Value {
    let all = get_opt(ev, n, OptTag::All);
    let back = get_opt(ev, n, OptTag::Back);
    let level = ev.get_numvar("@user-level");

    if level == 0 && all.is_none() {
        return Value::Number(0);
    }

    let msg = concat_args(ev, n);
    if ev.faulted() {
        return Value::Number(0);
    }

    let mut choice = ev.dialog().message(&msg, back.is_some());
    if back.is_some() && ev.get_numvar("@back") != 0 {
        // Scripted back-button, for test runs.
        choice = MessageChoice::Back;
    }

    match choice {
        MessageChoice::Proceed => Value::Number(1),
        MessageChoice::Back => match back {
            Some(code) => ev.resolve(code),
            None => Value::Number(0),
        },
        MessageChoice::Abort => {
            ev.halt();
            Value::Number(0)
        }
    }
}

/// `(welcome s...)`: the one-time start-of-script gate. Lets the user
/// pick the user level, pretend mode, and logging before anything runs.
pub(crate) fn welcome(ev: &mut Evaluator, n: NodeId) -> Value {
    let msg = if ev.tree().children(n).is_empty() {
        String::new()
    } else {
        concat_args(ev, n)
    };
    if ev.faulted() {
        return Value::Number(0);
    }

    let mut settings = WelcomeSettings {
        level: ev.get_numvar("@user-level"),
        log: ev.get_numvar("@log"),
        pretend: ev.get_numvar("@pretend"),
    };
    let limits = WelcomeLimits {
        user_min: ev.get_numvar("@user-min"),
        no_pretend: ev.get_numvar("@no-pretend") != 0,
        no_log: ev.get_numvar("@no-log") != 0,
    };

    match ev.dialog().welcome(&msg, &mut settings, limits) {
        Response::Answer(()) => {
            ev.set_numvar("@user-level", settings.level.max(limits.user_min));
            ev.set_numvar("@pretend", settings.pretend);
            ev.set_numvar("@log", settings.log);
            Value::Number(1)
        }
        Response::Abort => {
            ev.halt();
            Value::Number(0)
        }
    }
}

/// `(working s...)`: tell the user we are busy; returns immediately.
pub(crate) fn working(ev: &mut Evaluator, n: NodeId) -> Value {
    let msg = concat_args(ev, n);
    if ev.faulted() {
        return Value::Number(0);
    }
    let text = format!("Working on installation...\n\n{msg}");
    ev.dialog().working(&text);
    Value::Number(1)
}

/// `(complete n)`: progress bar position, 0–100.
pub(crate) fn complete(ev: &mut Evaluator, n: NodeId) -> Value {
    let percent = ev.tree().arg(n, 1).map_or(0, |a| ev.num(a));
    ev.dialog().complete(percent);
    Value::Number(percent)
}

/// `(user level)`: override `@user-level`, returning the previous
/// value. Debugging aid.
pub(crate) fn user(ev: &mut Evaluator, n: NodeId) -> Value {
    let old = ev.get_numvar("@user-level");
    let new = ev.tree().arg(n, 1).map_or(0, |a| ev.num(a));
    ev.set_numvar("@user-level", new);
    Value::Number(old)
}

/// `(debug any...)`: print to stdout. Unbound variables print as
/// `<NIL>` instead of erroring, whatever the strictness.
pub(crate) fn debug(ev: &mut Evaluator, n: NodeId) -> Value {
    let mut parts = Vec::new();
    for i in 0..ev.tree().children(n).len() {
        let child = ev.tree().children(n)[i];
        let text = match ev.tree().kind(child) {
            NodeKind::SymRef(name) if !ev.is_bound(name) => "<NIL>".to_string(),
            _ => ev.text(child),
        };
        parts.push(text);
    }
    println!("{}", parts.join(" "));
    Value::Number(1)
}

/// `(transcript s...)`: append the concatenation to the install log.
pub(crate) fn transcript(ev: &mut Evaluator, n: NodeId) -> Value {
    let msg = concat_args(ev, n);
    if ev.faulted() {
        return Value::Number(0);
    }
    Value::Number(ev.log(n, &msg) as i32)
}
