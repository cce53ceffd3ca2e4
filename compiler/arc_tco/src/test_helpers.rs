//! Shared test utilities for classification tests.
//!
//! Builds the linked-list `length` shapes most tests start from. Only
//! compiled in test builds.

use crate::ir::{Argument, CallNode, StmtId, ValueId};
use crate::{ArcClass, NodeBuilder};

/// Shorthand for `ValueId::new(n)`.
pub(crate) fn v(n: u32) -> ValueId {
    ValueId::new(n)
}

/// Shorthand for `StmtId::new(n)`.
pub(crate) fn s(n: u32) -> StmtId {
    StmtId::new(n)
}

/// `if (!node) return count; else return length(<next>, count + 1);`
///
/// Values: `v0` node, `v1` count, `v2` `!node`, `v3` call result.
/// Statements: `s0` `!node`, `s1` if, `s2` return count, `s3` call,
/// `s4` return.
pub(crate) fn accumulating_length(next: impl FnOnce(ValueId) -> Argument) -> CallNode {
    let mut b = NodeBuilder::new("length");
    let node = b.param("node", ArcClass::DefiniteRef);
    let count = b.param("count", ArcClass::Scalar);
    let is_nil = b.other("!node", &[node]);
    b.conditional(
        is_nil,
        |b| {
            b.ret(count);
        },
        |b| {
            let r = b.call(vec![
                next(node),
                Argument::scalar_expr("count + 1", vec![count]),
            ]);
            b.ret(r);
        },
    );
    b.finish()
}

/// `if (!node) return 0; else return 1 + length(<next>);`
///
/// Values: `v0` node, `v1` `!node`, `v2` `0`, `v3` call result, `v4` sum.
/// Statements: `s0` `!node`, `s1` if, `s2` `0`, `s3` return 0, `s4` call,
/// `s5` `1 + …`, `s6` return.
pub(crate) fn naive_length(next: impl FnOnce(ValueId) -> Argument) -> CallNode {
    let mut b = NodeBuilder::new("length");
    let node = b.param("node", ArcClass::DefiniteRef);
    let is_nil = b.other("!node", &[node]);
    b.conditional(
        is_nil,
        |b| {
            let zero = b.literal(&crate::LitValue::Int(0));
            b.ret(zero);
        },
        |b| {
            let r = b.call(vec![next(node)]);
            let sum = b.other("1 + length(…)", &[r]);
            b.ret(sum);
        },
    );
    b.finish()
}

/// Straight-line `return f(args)` over one borrowed object parameter `p`.
pub(crate) fn single_call(args: impl FnOnce(ValueId) -> Vec<Argument>) -> CallNode {
    let mut b = NodeBuilder::new("f");
    let p = b.param("p", ArcClass::DefiniteRef);
    let r = b.call(args(p));
    b.ret(r);
    b.finish()
}
