//! Comparison operators.
//!
//! When both operands resolve to strings the comparison is
//! lexicographic; otherwise both are coerced to integers and
//! subtracted.

use std::cmp::Ordering;

use crate::ast::NodeId;
use crate::eval::{Evaluator, Value};

fn cmp(ev: &mut Evaluator, n: NodeId) -> Ordering {
    let lhs = ev
        .tree()
        .arg(n, 1)
        .map(|a| ev.resolve(a))
        .unwrap_or(Value::Dangle);
    let rhs = ev
        .tree()
        .arg(n, 2)
        .map(|a| ev.resolve(a))
        .unwrap_or(Value::Dangle);

    if let (Value::Text(a), Value::Text(b)) = (&lhs, &rhs) {
        a.cmp(b)
    } else {
        lhs.as_num().cmp(&rhs.as_num())
    }
}

/// `(= a b)`: equality test, 0 or 1.
pub(crate) fn eq(ev: &mut Evaluator, n: NodeId) -> Value {
    Value::Number((cmp(ev, n) == Ordering::Equal) as i32)
}

/// `(<> a b)`
pub(crate) fn neq(ev: &mut Evaluator, n: NodeId) -> Value {
    Value::Number((cmp(ev, n) != Ordering::Equal) as i32)
}

/// `(> a b)`
pub(crate) fn gt(ev: &mut Evaluator, n: NodeId) -> Value {
    Value::Number((cmp(ev, n) == Ordering::Greater) as i32)
}

/// `(>= a b)`
pub(crate) fn gte(ev: &mut Evaluator, n: NodeId) -> Value {
    Value::Number((cmp(ev, n) != Ordering::Less) as i32)
}

/// `(< a b)`
pub(crate) fn lt(ev: &mut Evaluator, n: NodeId) -> Value {
    Value::Number((cmp(ev, n) == Ordering::Less) as i32)
}

/// `(<= a b)`
pub(crate) fn lte(ev: &mut Evaluator, n: NodeId) -> Value {
    Value::Number((cmp(ev, n) != Ordering::Greater) as i32)
}

#[cfg(test)]
mod tests {
    use crate::ast::{OpCode, Tree};
    use crate::dialog::AutoDialog;
    use crate::eval::{Config, Evaluator, Value};
    use crate::host::FsHost;
    use rstest::rstest;

    enum Lit {
        N(i32),
        S(&'static str),
    }

    fn eval_cmp(op: OpCode, a: Lit, b: Lit) -> i32 {
        let mut tree = Tree::new();
        let node = tree.native(op, 1);
        for lit in [a, b] {
            let id = match lit {
                Lit::N(v) => tree.number(v, 1),
                Lit::S(s) => tree.string(s, 1),
            };
            tree.push(node, id);
        }
        let mut ev = Evaluator::new(
            &tree,
            Box::new(FsHost::new()),
            Box::new(AutoDialog::new()),
            Config::default(),
        );
        match ev.resolve(node) {
            Value::Number(v) => v,
            other => panic!("comparison produced {other:?}"),
        }
    }

    #[rstest]
    #[case(OpCode::Eq, 2, 2, 1)]
    #[case(OpCode::Eq, 2, 3, 0)]
    #[case(OpCode::Neq, 2, 3, 1)]
    #[case(OpCode::Lt, 2, 3, 1)]
    #[case(OpCode::Lte, 3, 3, 1)]
    #[case(OpCode::Gt, 3, 2, 1)]
    #[case(OpCode::Gte, 2, 3, 0)]
    fn test_numeric(#[case] op: OpCode, #[case] a: i32, #[case] b: i32, #[case] expected: i32) {
        assert_eq!(eval_cmp(op, Lit::N(a), Lit::N(b)), expected);
    }

    #[test]
    fn test_string_comparison_is_lexicographic() {
        assert_eq!(eval_cmp(OpCode::Lt, Lit::S("abc"), Lit::S("abd")), 1);
        assert_eq!(eval_cmp(OpCode::Eq, Lit::S("x"), Lit::S("x")), 1);
        // "10" < "9" lexicographically even though 10 > 9 numerically
        assert_eq!(eval_cmp(OpCode::Lt, Lit::S("10"), Lit::S("9")), 1);
    }

    #[test]
    fn test_mixed_operands_compare_numerically() {
        assert_eq!(eval_cmp(OpCode::Eq, Lit::S("5"), Lit::N(5)), 1);
        assert_eq!(eval_cmp(OpCode::Gt, Lit::S("10"), Lit::N(9)), 1);
    }
}
