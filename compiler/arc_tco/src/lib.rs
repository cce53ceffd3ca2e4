//! Tail-call eligibility analysis under automatic reference counting.
//!
//! This crate predicts whether a recursive call could be turned into a
//! loop by an optimizing compiler once ARC has inserted its retain/release
//! operations. It provides:
//!
//! - **Call-node IR** ([`CallNode`], [`Statement`], [`Argument`],
//!   [`OwnershipOp`]): a structured function body handed over by a
//!   front end, built with [`NodeBuilder`].
//!
//! - **Ownership-op insertion** ([`call_ownership_ops`]): the caller-side
//!   operations each argument of a recursive call needs.
//!
//! - **Classification** ([`TailCallClassifier`], [`classify`]): walks every
//!   control path and reports a [`Classification`] with per-path
//!   explanations.
//!
//! # Design
//!
//! A call is in tail position only when nothing runs after it on any path,
//! and ARC can silently add something: when an argument comes from a
//! getter, the caller retains the result to keep it alive during the call
//! and releases it afterwards. That trailing release blocks the optimization
//! even though the call is textually last. Reading the field directly
//! avoids the release, but changes meaning when a subtype overrides the
//! getter, which is why the override flag is reported separately.
//!
//! Whether a backend really performs the transformation is out of scope;
//! only eligibility is predicted.

mod builder;
mod classify;
pub mod ir;
pub mod ownership;
pub mod paths;
mod problem;
pub mod rc_insert;
mod report;

#[cfg(test)]
mod test_helpers;

pub use builder::NodeBuilder;
pub use classify::{classify, ClassifyOptions, TailCallClassifier};
pub use ir::{
    ArgKind, Argument, CallNode, LitValue, OpTarget, OwnershipOp, OwnershipOpKind, Param,
    ReturnConvention, Statement, StmtId, StmtKind, ValueId,
};
pub use ownership::Ownership;
pub use paths::{enumerate_paths, validate, BranchChoice, ControlPath};
pub use problem::{ClassifyError, MalformedReason};
pub use rc_insert::{call_ownership_ops, CallRcOps};
pub use report::{Classification, PathExplanation, TailCallReport};

use std::sync::Once;

/// ARC classification of a value.
///
/// Decides whether passing the value around involves reference counting
/// at all. Three-way, so a front end that cannot resolve a generic type
/// can say so instead of guessing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArcClass {
    /// No reference counting: integers, booleans, raw pointers, `nil`.
    Scalar,

    /// Always a reference-counted object.
    DefiniteRef,

    /// Might be a reference-counted object (unresolved generic parameter).
    /// Conservatively treated as needing RC.
    PossibleRef,
}

impl ArcClass {
    /// Returns `true` if values of this class might need reference counting.
    #[inline]
    pub fn needs_rc(self) -> bool {
        self != ArcClass::Scalar
    }
}

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=arc_tco=debug` or `RUST_LOG=arc_tco=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            // Another subscriber may already be installed by the host.
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}

#[cfg(test)]
mod tests;
