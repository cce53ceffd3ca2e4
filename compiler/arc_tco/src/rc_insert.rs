//! Caller-side ownership operations around a recursive call.
//!
//! Models what an ARC compiler inserts for each argument of a call to the
//! enclosing function. The operations placed *after* the call are what
//! matter for tail calls: any of them means the caller still has work to do
//! once the callee returns, so its frame cannot be reused.
//!
//! # Rules
//!
//! Per argument, with the matching parameter's [`Ownership`](crate::Ownership):
//!
//! - **Scalar values** never need RC.
//! - **Direct field reads** are borrowed from the receiver, which the caller
//!   already keeps alive. No operations.
//! - **Literals** are immortal constants. No operations.
//! - **Accessor calls and reference-typed expressions** produce a value the
//!   caller must stabilize for the duration of the call:
//!   - `Autoreleased` → `RetainAutoreleasedReturn` before the call,
//!   - `Unretained` → `Retain` before the call,
//!   - `Retained` → already `+1`, nothing before.
//!
//!   The caller then owns a `+1` reference. If the parameter is `Borrowed`
//!   the caller must `Release` it after the call; if `Owned` the reference
//!   is transferred and nothing follows the call.
//!
//! `PossibleRef` arguments are treated as reference counted.

use smallvec::SmallVec;

use crate::ir::{
    ArgKind, Argument, CallNode, OpTarget, OwnershipOp, OwnershipOpKind, ReturnConvention, StmtId,
};
use crate::problem::ClassifyError;

/// Operations the caller places around one recursive call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallRcOps {
    /// Executed after the arguments are evaluated, before the call.
    pub before: SmallVec<[OwnershipOp; 2]>,
    /// Executed after the call returns.
    pub after: SmallVec<[OwnershipOp; 2]>,
}

impl CallRcOps {
    /// Returns `true` if the caller has cleanup to run after the call.
    pub fn needs_cleanup(&self) -> bool {
        !self.after.is_empty()
    }
}

/// Compute the ownership operations for a recursive call.
///
/// `call` is the call statement's ID and `args` its arguments; parameter
/// conventions are read from `node`. Fails on unmodeled arguments instead
/// of assuming they are free.
pub fn call_ownership_ops(
    node: &CallNode,
    call: StmtId,
    args: &[Argument],
) -> Result<CallRcOps, ClassifyError> {
    let mut ops = CallRcOps::default();

    for (index, arg) in args.iter().enumerate() {
        let target = OpTarget::Argument { call, index };

        let (producer, convention) = match &arg.kind {
            ArgKind::DirectFieldAccess { .. } | ArgKind::Literal(_) => continue,
            ArgKind::AccessorCall {
                accessor,
                convention,
                ..
            } => (format!("accessor `{accessor}`"), *convention),
            ArgKind::Expression { text, convention, .. } => {
                (format!("expression `{text}`"), *convention)
            }
            ArgKind::Unmodeled { construct } => {
                return Err(ClassifyError::unsupported(
                    &node.name,
                    call,
                    format!("argument: {construct}"),
                ));
            }
        };

        if !arg.class.needs_rc() {
            continue;
        }

        match convention {
            ReturnConvention::Autoreleased => ops.before.push(OwnershipOp {
                kind: OwnershipOpKind::RetainAutoreleasedReturn,
                target,
                reason: format!(
                    "{producer} returns an autoreleased value that must be stabilized across the call"
                ),
            }),
            ReturnConvention::Unretained => ops.before.push(OwnershipOp {
                kind: OwnershipOpKind::Retain,
                target,
                reason: format!(
                    "{producer} returns an unretained value that must be kept alive across the call"
                ),
            }),
            ReturnConvention::Retained => {}
        }

        let consumed = node.param(index).is_some_and(|p| p.ownership.consumes());
        if consumed {
            tracing::trace!(
                function = %node.name,
                %call,
                index,
                "owned parameter consumes argument, no release after call"
            );
            continue;
        }

        ops.after.push(OwnershipOp {
            kind: OwnershipOpKind::Release,
            target,
            reason: format!(
                "argument {index} (`{}`) comes from {producer}; the caller owns it and must release it after the call returns",
                arg.describe(node)
            ),
        });
    }

    Ok(ops)
}
