//! Control flow operators.
//!
//! These are the operators that drive iteration and branching by
//! selectively invoking their children instead of resolving everything
//! up front.

use crate::ast::{NodeId, OptTag};
use crate::error::Fault;
use crate::eval::{Evaluator, Value};
use crate::ops::{concat_args, get_opt};

/// `(if P THEN [ELSE])`: returns the chosen branch's value.
pub(crate) fn if_else(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(cond) = ev.tree().arg(n, 1) else {
        return Value::Dangle;
    };
    let branch = if ev.tru(cond) {
        ev.tree().arg(n, 2)
    } else {
        ev.tree().arg(n, 3)
    };
    match branch {
        Some(b) => ev.invoke(b),
        None => Value::Dangle,
    }
}

/// `(while P BODY...)`: pre-test loop.
pub(crate) fn while_loop(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(cond) = ev.tree().arg(n, 1) else {
        return Value::Number(0);
    };
    let mut last = Value::Number(0);
    while !ev.faulted() && ev.tru(cond) {
        last = run_body(ev, n);
        if ev.faulted() {
            break;
        }
    }
    last
}

/// `(until P BODY...)`: post-test loop: the body always runs once.
pub(crate) fn until_loop(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(cond) = ev.tree().arg(n, 1) else {
        return Value::Number(0);
    };
    let mut last = Value::Number(0);
    loop {
        last = run_body(ev, n);
        if ev.faulted() || ev.tru(cond) {
            break;
        }
    }
    last
}

/// Invoke positional arguments 2.. as loop body statements.
fn run_body(ev: &mut Evaluator, n: NodeId) -> Value {
    let mut last = Value::Number(0);
    let count = ev.tree().arg_count(n);
    for i in 2..=count {
        if ev.faulted() {
            break;
        }
        if let Some(stmt) = ev.tree().arg(n, i) {
            last = ev.invoke(stmt);
        }
    }
    last
}

/// `(select N v0 v1 ...)`: the Nth following child; out of range is 0.
pub(crate) fn select(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(index_node) = ev.tree().arg(n, 1) else {
        return Value::Number(0);
    };
    let index = ev.num(index_node);
    if index < 0 {
        return Value::Number(0);
    }
    match ev.tree().arg(n, index as usize + 2) {
        Some(value) => ev.resolve(value),
        None => Value::Number(0),
    }
}

/// `(procedure NAME args... BODY)`: registers the Custom; no effect at
/// the definition site.
pub(crate) fn procedure(ev: &mut Evaluator, n: NodeId) -> Value {
    if let Some(custom) = ev.tree().children(n).first().copied() {
        ev.register_custom(custom);
    }
    Value::Number(0)
}

/// `(onerror BODY)`: installs BODY as the `@onerror` handler.
pub(crate) fn onerror(ev: &mut Evaluator, n: NodeId) -> Value {
    procedure(ev, n)
}

/// `(trap MASK BODY)`: evaluate BODY with the error mask active.
/// Errors whose code bit appears in MASK are downgraded to a numeric
/// return value of MASK and the fault slot is cleared.
pub(crate) fn trap(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(mask_node) = ev.tree().arg(n, 1) else {
        return Value::Number(0);
    };
    let mask = ev.num(mask_node) as u32;
    let last = run_body(ev, n);

    let caught = matches!(
        ev.fault(),
        Some(Fault::Err(err)) if err.code.bit() & mask != 0
    );
    if caught {
        ev.clear_fault();
        return Value::Number(mask as i32);
    }
    last
}

/// `(exit [s...] [(quiet)])`: end the run, optionally with a closing
/// message.
pub(crate) fn exit(ev: &mut Evaluator, n: NodeId) -> Value {
    let quiet = get_opt(ev, n, OptTag::Quiet).is_some();
    if !quiet {
        let msg = concat_args(ev, n);
        let text = if msg.is_empty() {
            "Installation complete".to_string()
        } else {
            format!("{msg}\n\nInstallation complete")
        };
        ev.dialog().message(&text, false);
    }
    ev.finish();
    Value::Number(1)
}

/// `(abort [s...])`: unwind with a user message.
pub(crate) fn abort(ev: &mut Evaluator, n: NodeId) -> Value {
    let msg = concat_args(ev, n);
    ev.abort(msg);
    Value::Number(0)
}

/// `(reboot)`: a no-op on hosts that cannot.
pub(crate) fn reboot(ev: &mut Evaluator, _n: NodeId) -> Value {
    ev.host().reboot();
    Value::Number(1)
}

/// `(trace)` / `(retrace)`: debugger hooks in the classic installer;
/// accepted for compatibility, nothing to do here.
pub(crate) fn trace(_ev: &mut Evaluator, _n: NodeId) -> Value {
    Value::Number(1)
}
