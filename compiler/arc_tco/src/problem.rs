//! Errors reported by classification.
//!
//! Classification never guesses: a node that is structurally broken or
//! that contains a construct the ownership rules do not cover is rejected
//! as a whole instead of being partially classified.

use crate::ir::{StmtId, ValueId};

/// Why a node's control flow is malformed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    /// A statement follows a `Return` in the same sequence.
    #[error("statement {unreachable} follows return {ret} and can never run")]
    StatementAfterReturn { ret: StmtId, unreachable: StmtId },

    /// A statement follows a conditional whose branches all return.
    #[error("statement {unreachable} follows {after}, which returns on every branch")]
    Unreachable { after: StmtId, unreachable: StmtId },

    /// A path reaches the end of a non-void body without returning.
    #[error("path {path} runs off the end of the body without a return")]
    MissingReturn { path: usize },

    /// A value is read on a path before anything on that path defines it.
    #[error("{stmt} reads v{} before it is defined on path {path}", .value.raw())]
    UndefinedValue {
        stmt: StmtId,
        value: ValueId,
        path: usize,
    },

    /// A recursive call passes the wrong number of arguments.
    #[error("recursive call {call} passes {found} arguments, function declares {expected}")]
    ArityMismatch {
        call: StmtId,
        expected: usize,
        found: usize,
    },
}

/// Errors reported by [`TailCallClassifier::classify`](crate::TailCallClassifier::classify).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("malformed control flow in `{function}`: {reason}")]
    MalformedControlFlow {
        function: String,
        reason: MalformedReason,
    },

    #[error("unsupported construct in `{function}` at {stmt}: {construct}")]
    UnsupportedConstruct {
        function: String,
        stmt: StmtId,
        construct: String,
    },

    /// Path enumeration exceeded the configured bound.
    #[error("`{function}` has more than {limit} control paths")]
    PathLimitExceeded { function: String, limit: usize },
}

impl ClassifyError {
    pub(crate) fn malformed(function: &str, reason: MalformedReason) -> Self {
        ClassifyError::MalformedControlFlow {
            function: function.to_owned(),
            reason,
        }
    }

    pub(crate) fn unsupported(function: &str, stmt: StmtId, construct: impl Into<String>) -> Self {
        ClassifyError::UnsupportedConstruct {
            function: function.to_owned(),
            stmt,
            construct: construct.into(),
        }
    }
}
