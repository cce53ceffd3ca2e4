//! Builder for [`CallNode`]s.
//!
//! Front ends and tests describe a function body statement by statement;
//! the builder allocates [`ValueId`]s and [`StmtId`]s sequentially and
//! keeps the nesting of conditional branches.
//!
//! ```
//! use arc_tco::{ArcClass, Argument, NodeBuilder};
//!
//! // if (!node) return count; else return length(node->next, count + 1);
//! let mut b = NodeBuilder::new("length");
//! let node = b.param("node", ArcClass::DefiniteRef);
//! let count = b.param("count", ArcClass::Scalar);
//! let is_nil = b.other("!node", &[node]);
//! b.conditional(
//!     is_nil,
//!     |b| {
//!         b.ret(count);
//!     },
//!     |b| {
//!         let r = b.call(vec![
//!             Argument::field(node, "next"),
//!             Argument::scalar_expr("count + 1", vec![count]),
//!         ]);
//!         b.ret(r);
//!     },
//! );
//! let func = b.finish();
//! assert_eq!(func.params.len(), 2);
//! ```

use crate::ir::{
    Argument, CallNode, LitValue, OpTarget, OwnershipOp, OwnershipOpKind, Param, Statement,
    StmtId, StmtKind, ValueId,
};
use crate::{ArcClass, Ownership};

/// Builder for an in-progress [`CallNode`].
///
/// Consumed by [`finish`](NodeBuilder::finish).
pub struct NodeBuilder {
    name: String,
    params: Vec<Param>,
    value_names: Vec<String>,
    next_stmt: u32,
    /// Open statement sequences; the innermost branch is last.
    frames: Vec<Vec<Statement>>,
    implicit_return: bool,
}

impl NodeBuilder {
    /// Start building the body of function `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            value_names: Vec::new(),
            next_stmt: 0,
            frames: vec![Vec::new()],
            implicit_return: false,
        }
    }

    // Allocation

    #[expect(
        clippy::cast_possible_truncation,
        reason = "value counts never exceed u32"
    )]
    fn fresh_value(&mut self, name: impl Into<String>) -> ValueId {
        let id = ValueId::new(self.value_names.len() as u32);
        self.value_names.push(name.into());
        id
    }

    fn fresh_stmt(&mut self) -> StmtId {
        let id = StmtId::new(self.next_stmt);
        self.next_stmt += 1;
        id
    }

    fn push(&mut self, kind: StmtKind) -> StmtId {
        let id = self.fresh_stmt();
        self.push_with_id(id, kind);
        id
    }

    fn push_with_id(&mut self, id: StmtId, kind: StmtKind) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(Statement { id, kind });
        }
    }

    // Parameters

    /// Declare a borrowed (`+0`) parameter.
    pub fn param(&mut self, name: impl Into<String>, class: ArcClass) -> ValueId {
        self.param_with(name, class, Ownership::Borrowed)
    }

    /// Declare a parameter the callee consumes.
    pub fn owned_param(&mut self, name: impl Into<String>, class: ArcClass) -> ValueId {
        self.param_with(name, class, Ownership::Owned)
    }

    fn param_with(
        &mut self,
        name: impl Into<String>,
        class: ArcClass,
        ownership: Ownership,
    ) -> ValueId {
        let value = self.fresh_value(name);
        self.params.push(Param {
            value,
            class,
            ownership,
        });
        value
    }

    // Statements

    /// Emit a computation that defines a value, e.g. `1 + r`.
    pub fn other(&mut self, text: impl Into<String>, operands: &[ValueId]) -> ValueId {
        let text = text.into();
        let dst = self.fresh_value(text.clone());
        self.push(StmtKind::Other {
            dst: Some(dst),
            text,
            operands: operands.to_vec(),
        });
        dst
    }

    /// Emit a computation run only for its effect, e.g. a log call.
    pub fn effect(&mut self, text: impl Into<String>, operands: &[ValueId]) -> StmtId {
        self.push(StmtKind::Other {
            dst: None,
            text: text.into(),
            operands: operands.to_vec(),
        })
    }

    /// Materialize a literal as a value, e.g. for `return 0`.
    pub fn literal(&mut self, lit: &LitValue) -> ValueId {
        self.other(lit.to_string(), &[])
    }

    /// Emit a recursive call and return its result value.
    pub fn call(&mut self, args: Vec<Argument>) -> ValueId {
        let name = format!("{}(…)", self.name);
        let dst = self.fresh_value(name);
        self.push(StmtKind::RecursiveCall { dst, args });
        dst
    }

    /// Emit an explicit ownership operation on `value`.
    pub fn ownership_op(
        &mut self,
        kind: OwnershipOpKind,
        value: ValueId,
        reason: impl Into<String>,
    ) -> StmtId {
        self.push(StmtKind::Ownership(OwnershipOp {
            kind,
            target: OpTarget::Value(value),
            reason: reason.into(),
        }))
    }

    /// Emit `retain value`.
    pub fn retain(&mut self, value: ValueId, reason: impl Into<String>) -> StmtId {
        self.ownership_op(OwnershipOpKind::Retain, value, reason)
    }

    /// Emit `release value`.
    pub fn release(&mut self, value: ValueId, reason: impl Into<String>) -> StmtId {
        self.ownership_op(OwnershipOpKind::Release, value, reason)
    }

    /// Emit `return value`.
    pub fn ret(&mut self, value: ValueId) -> StmtId {
        self.push(StmtKind::Return { value: Some(value) })
    }

    /// Emit a void `return`.
    pub fn ret_void(&mut self) -> StmtId {
        self.push(StmtKind::Return { value: None })
    }

    /// Emit a placeholder for a construct the front end could not lower.
    pub fn unmodeled(&mut self, construct: impl Into<String>) -> StmtId {
        self.push(StmtKind::Unmodeled {
            construct: construct.into(),
        })
    }

    /// Emit `if cond { then } else { els }`.
    ///
    /// Each closure emits its branch's statements. Control continues after
    /// the conditional for any branch that does not return.
    pub fn conditional(
        &mut self,
        cond: ValueId,
        then: impl FnOnce(&mut Self),
        els: impl FnOnce(&mut Self),
    ) -> StmtId {
        let id = self.fresh_stmt();

        self.frames.push(Vec::new());
        then(self);
        let then_branch = self.frames.pop().unwrap_or_default();

        self.frames.push(Vec::new());
        els(self);
        let else_branch = self.frames.pop().unwrap_or_default();

        self.push_with_id(
            id,
            StmtKind::Conditional {
                cond,
                then_branch,
                else_branch,
            },
        );
        id
    }

    /// Mark the function as void: running off the end returns implicitly.
    pub fn implicit_void_return(&mut self) -> &mut Self {
        self.implicit_return = true;
        self
    }

    /// Finish building and return the node.
    pub fn finish(mut self) -> CallNode {
        let body = self.frames.pop().unwrap_or_default();
        debug_assert!(self.frames.is_empty(), "unbalanced conditional frames");
        CallNode {
            name: self.name,
            params: self.params,
            body,
            implicit_return: self.implicit_return,
            value_names: self.value_names,
        }
    }
}

#[cfg(test)]
mod tests;
