//! Variable binding operators.
//!
//! `(set ...)` installs bindings in the global root unless the name is a
//! formal of the active procedure, in which case the local is mutated in
//! place; that is what gives procedures their argument shadowing.

use crate::ast::NodeId;
use crate::error::ErrorCode;
use crate::eval::{Evaluator, Value};

/// Non-strict resolution can leave a Dangle on the right hand side;
/// bindings store it as an empty string so later reads stay typed.
fn settle(value: Value) -> Value {
    match value {
        Value::Dangle => Value::text(""),
        other => other,
    }
}

/// `(set name value [name value ...])`: paired assignment. Returns the
/// last value assigned.
pub(crate) fn set(ev: &mut Evaluator, n: NodeId) -> Value {
    let pairs = ev
        .tree()
        .symbols(n)
        .len()
        .min(ev.tree().children(n).len());
    let mut last = Value::Dangle;

    for i in 0..pairs {
        let sym = ev.tree().symbols(n)[i];
        let value_node = ev.tree().children(n)[i];

        let value = settle(ev.resolve(value_node));
        if ev.faulted() {
            // Ignore the rest of the tuples.
            break;
        }
        if let Some(name) = ev.tree().name(sym) {
            ev.bind(name, value.clone());
            last = value;
        }
    }
    last
}

/// `(symbolset nameexpr value [nameexpr value ...])`: like `(set ...)`
/// with computed names.
pub(crate) fn symbolset(ev: &mut Evaluator, n: NodeId) -> Value {
    let mut last = Value::Dangle;
    let count = ev.tree().children(n).len();
    let mut i = 0;
    while i + 1 < count {
        let name_node = ev.tree().children(n)[i];
        let value_node = ev.tree().children(n)[i + 1];
        i += 2;

        let name = ev.text(name_node);
        let value = settle(ev.resolve(value_node));
        if ev.faulted() {
            break;
        }
        ev.bind(&name, value.clone());
        last = value;
    }
    last
}

/// `(symbolval nameexpr)`: the value of the symbol named by a computed
/// string. An unknown name yields 0; strict mode also reports it.
pub(crate) fn symbolval(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(name_node) = ev.tree().arg(n, 1) else {
        return Value::Number(0);
    };
    let name = ev.text(name_node);
    match ev.lookup(&name).cloned() {
        Some(value) => value,
        None => {
            if ev.get_numvar("@strict") != 0 {
                ev.raise(n, ErrorCode::UndefinedVariable, name);
            }
            Value::Number(0)
        }
    }
}
