//! Arithmetic, logical, and bitwise operators.
//!
//! Integer semantics with two's-complement wraparound. The logical
//! operators resolve every argument: `(AND 0 X)` still evaluates `X`,
//! which scripts rely on for side effects.

use crate::ast::NodeId;
use crate::error::ErrorCode;
use crate::eval::{Evaluator, Value};

/// Resolve every positional argument to a number.
fn num_args(ev: &mut Evaluator, n: NodeId) -> Vec<i32> {
    let count = ev.tree().arg_count(n);
    let mut out = Vec::with_capacity(count);
    for i in 1..=count {
        if let Some(arg) = ev.tree().arg(n, i) {
            out.push(ev.num(arg));
        }
    }
    out
}

/// `(+ e1 e2 ...)`
pub(crate) fn add(ev: &mut Evaluator, n: NodeId) -> Value {
    let sum = num_args(ev, n).into_iter().fold(0i32, i32::wrapping_add);
    Value::Number(sum)
}

/// `(- e1 e2 ...)`: first minus the rest.
pub(crate) fn sub(ev: &mut Evaluator, n: NodeId) -> Value {
    let args = num_args(ev, n);
    let Some((first, rest)) = args.split_first() else {
        return Value::Number(0);
    };
    Value::Number(rest.iter().fold(*first, |acc, v| acc.wrapping_sub(*v)))
}

/// `(* e1 e2 ...)`
pub(crate) fn mul(ev: &mut Evaluator, n: NodeId) -> Value {
    let product = num_args(ev, n).into_iter().fold(1i32, i32::wrapping_mul);
    Value::Number(product)
}

/// `(/ e1 e2 ...)`: first divided by the rest; division by zero fails.
pub(crate) fn div(ev: &mut Evaluator, n: NodeId) -> Value {
    let args = num_args(ev, n);
    let Some((first, rest)) = args.split_first() else {
        return Value::Number(0);
    };
    let mut acc = *first;
    for v in rest {
        if *v == 0 {
            ev.raise(n, ErrorCode::DivisionByZero, acc.to_string());
            return Value::Number(0);
        }
        acc = acc.wrapping_div(*v);
    }
    Value::Number(acc)
}

/// `(AND e1 e2 ...)`: logical; all arguments are resolved.
pub(crate) fn and(ev: &mut Evaluator, n: NodeId) -> Value {
    let args = num_args(ev, n);
    Value::Number((!args.is_empty() && args.iter().all(|v| *v != 0)) as i32)
}

/// `(OR e1 e2 ...)`: logical; all arguments are resolved.
pub(crate) fn or(ev: &mut Evaluator, n: NodeId) -> Value {
    let args = num_args(ev, n);
    Value::Number(args.iter().any(|v| *v != 0) as i32)
}

/// `(XOR e1 e2)`
pub(crate) fn xor(ev: &mut Evaluator, n: NodeId) -> Value {
    let args = num_args(ev, n);
    let a = args.first().map_or(false, |v| *v != 0);
    let b = args.get(1).map_or(false, |v| *v != 0);
    Value::Number((a != b) as i32)
}

/// `(NOT e)`
pub(crate) fn not(ev: &mut Evaluator, n: NodeId) -> Value {
    let args = num_args(ev, n);
    Value::Number(args.first().map_or(1, |v| (*v == 0) as i32))
}

/// `(BITAND e1 e2 ...)`
pub(crate) fn bit_and(ev: &mut Evaluator, n: NodeId) -> Value {
    let args = num_args(ev, n);
    let Some((first, rest)) = args.split_first() else {
        return Value::Number(0);
    };
    Value::Number(rest.iter().fold(*first, |acc, v| acc & v))
}

/// `(BITOR e1 e2 ...)`
pub(crate) fn bit_or(ev: &mut Evaluator, n: NodeId) -> Value {
    Value::Number(num_args(ev, n).into_iter().fold(0, |acc, v| acc | v))
}

/// `(BITXOR e1 e2 ...)`
pub(crate) fn bit_xor(ev: &mut Evaluator, n: NodeId) -> Value {
    Value::Number(num_args(ev, n).into_iter().fold(0, |acc, v| acc ^ v))
}

/// `(BITNOT e)`
pub(crate) fn bit_not(ev: &mut Evaluator, n: NodeId) -> Value {
    let args = num_args(ev, n);
    Value::Number(args.first().map_or(-1, |v| !v))
}

/// `(shiftleft e count)`
pub(crate) fn shift_left(ev: &mut Evaluator, n: NodeId) -> Value {
    let args = num_args(ev, n);
    let value = args.first().copied().unwrap_or(0);
    let count = args.get(1).copied().unwrap_or(0);
    if !(0..32).contains(&count) {
        return Value::Number(0);
    }
    Value::Number(value.wrapping_shl(count as u32))
}

/// `(shiftright e count)`: arithmetic shift, like the C original.
pub(crate) fn shift_right(ev: &mut Evaluator, n: NodeId) -> Value {
    let args = num_args(ev, n);
    let value = args.first().copied().unwrap_or(0);
    let count = args.get(1).copied().unwrap_or(0);
    if !(0..32).contains(&count) {
        return Value::Number(if value < 0 { -1 } else { 0 });
    }
    Value::Number(value.wrapping_shr(count as u32))
}

/// `(IN e bit1 bit2 ...)`: gather bits of `e`: result bit k holds bit
/// `bitk` of the first argument. Indices outside 0–31 read as zero.
pub(crate) fn bit_in(ev: &mut Evaluator, n: NodeId) -> Value {
    let args = num_args(ev, n);
    let Some((value, bits)) = args.split_first() else {
        return Value::Number(0);
    };
    let mut out = 0i32;
    for (k, bit) in bits.iter().enumerate() {
        if (0..32).contains(bit) && (value >> bit) & 1 != 0 {
            out |= 1 << k;
        }
    }
    Value::Number(out)
}
