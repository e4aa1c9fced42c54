//! Program execution and Workbench object operators.

use crate::ast::{NodeId, OptTag};
use crate::error::ErrorCode;
use crate::eval::{Evaluator, Value};
use crate::ops::{Gate, concat_args, confirm_dialog, confirm_gate, get_opt, pretend_skips};

/// `(execute file [(confirm..)] [(safe)])`: run a shell script,
/// returning its exit code.
pub(crate) fn execute(ev: &mut Evaluator, n: NodeId) -> Value {
    run_command(ev, n)
}

/// `(run prog args... [(confirm..)] [(safe)])`: run a program.
pub(crate) fn run_cmd(ev: &mut Evaluator, n: NodeId) -> Value {
    run_command(ev, n)
}

fn run_command(ev: &mut Evaluator, n: NodeId) -> Value {
    let command = concat_args(ev, n);
    if command.is_empty() {
        ev.raise(n, ErrorCode::NothingToDo, "execute");
        return Value::Number(0);
    }

    match confirm_gate(ev, n) {
        Gate::Proceed => {}
        Gate::Skip | Gate::Errored => return Value::Number(0),
    }
    if pretend_skips(ev, n) {
        return Value::Number(0);
    }

    match ev.host().execute(&command) {
        Ok(code) => {
            ev.log(n, &format!("Executed '{command}'."));
            Value::Number(code)
        }
        Err(_) => {
            ev.raise(n, ErrorCode::NoSuchFileOrDir, command);
            Value::Number(-1)
        }
    }
}

/// `(rexx script)`: ARexx has no counterpart here; scripts get -1 and
/// keep going.
pub(crate) fn rexx(ev: &mut Evaluator, n: NodeId) -> Value {
    let _ = concat_args(ev, n);
    Value::Number(-1)
}

/// `(openwbobject name [(confirm..)] [(safe)])`: open a Workbench
/// object. Unsupported backends report -1, per the V44 contract.
pub(crate) fn openwbobject(ev: &mut Evaluator, n: NodeId) -> Value {
    if pretend_skips(ev, n) {
        return Value::Number(1);
    }
    if get_opt(ev, n, OptTag::Confirm).is_some() {
        let prompt = get_opt(ev, n, OptTag::Prompt)
            .map(|p| ev.resolve(p).as_text())
            .unwrap_or_default();
        let help = get_opt(ev, n, OptTag::Help)
            .map(|h| ev.resolve(h).as_text())
            .unwrap_or_default();
        if !confirm_dialog(ev, &prompt, &help) {
            return Value::Number(0);
        }
    }
    Value::Number(-1)
}

/// `(showwbobject name)`: scroll a drawer until the icon is visible.
pub(crate) fn showwbobject(ev: &mut Evaluator, n: NodeId) -> Value {
    let _ = concat_args(ev, n);
    Value::Number(-1)
}

/// `(closewbobject name)`: close a disk, drawer, or trashcan view.
pub(crate) fn closewbobject(ev: &mut Evaluator, n: NodeId) -> Value {
    let _ = concat_args(ev, n);
    Value::Number(-1)
}
