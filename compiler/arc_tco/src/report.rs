//! Classification results and per-path explanations.

use std::fmt;

use smallvec::{smallvec, SmallVec};

use crate::ir::StmtId;
use crate::paths::BranchChoice;

/// Verdict on whether a function's recursion can become iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Every recursive call is the last thing its path does.
    TailCallOptimizable,
    /// A call is textually last, but the caller must release an argument
    /// after it returns.
    BlockedByCleanup,
    /// Some path does more work with a call's result before returning.
    BlockedByNonTailPosition,
    /// Informational: an argument's value depends on an accessor a subtype
    /// could override, so reading storage directly instead would change
    /// behavior. Reported alongside the primary classification.
    BlockedByPotentialOverride,
}

impl Classification {
    /// Returns `true` for [`TailCallOptimizable`](Classification::TailCallOptimizable).
    pub fn is_optimizable(self) -> bool {
        self == Classification::TailCallOptimizable
    }

    /// Short human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            Classification::TailCallOptimizable => "tail call optimizable",
            Classification::BlockedByCleanup => "blocked by cleanup after the call",
            Classification::BlockedByNonTailPosition => "call not in tail position",
            Classification::BlockedByPotentialOverride => "accessor may be overridden",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Why one path (or one argument on it) blocks optimization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathExplanation {
    /// Index of the path in enumeration order.
    pub path: usize,
    /// Branch decisions that select the path.
    pub branches: SmallVec<[(StmtId, BranchChoice); 4]>,
    /// The statement responsible.
    pub statement: StmtId,
    pub verdict: Classification,
    pub reason: String,
}

impl fmt::Display for PathExplanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "path {}", self.path)?;
        if !self.branches.is_empty() {
            f.write_str(" [")?;
            for (i, (stmt, choice)) in self.branches.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                let arm = match choice {
                    BranchChoice::Then => "then",
                    BranchChoice::Else => "else",
                };
                write!(f, "{stmt}:{arm}")?;
            }
            f.write_str("]")?;
        }
        write!(f, ": {} at {}: {}", self.verdict, self.statement, self.reason)
    }
}

/// Result of classifying one [`CallNode`](crate::CallNode).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TailCallReport {
    pub function: String,
    pub classification: Classification,
    /// Set when some recursive-call argument depends on an overridable
    /// accessor. See [`Classification::BlockedByPotentialOverride`].
    pub potential_override: bool,
    /// Number of paths that contain a recursive call.
    pub recursive_paths: usize,
    /// Blocked paths and override notes, in path order. Empty when
    /// explanations are disabled.
    pub explanations: Vec<PathExplanation>,
}

impl TailCallReport {
    /// Returns `true` if the recursion can become iteration.
    pub fn is_optimizable(&self) -> bool {
        self.classification.is_optimizable()
    }

    /// The primary classification followed by any informational flag.
    pub fn verdicts(&self) -> SmallVec<[Classification; 2]> {
        let mut verdicts = smallvec![self.classification];
        if self.potential_override {
            verdicts.push(Classification::BlockedByPotentialOverride);
        }
        verdicts
    }

    /// Explanations carrying the given verdict.
    pub fn explanations_for(
        &self,
        verdict: Classification,
    ) -> impl Iterator<Item = &PathExplanation> + '_ {
        self.explanations
            .iter()
            .filter(move |e| e.verdict == verdict)
    }
}

impl fmt::Display for TailCallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.function, self.classification)?;
        if self.potential_override {
            write!(f, " ({})", Classification::BlockedByPotentialOverride)?;
        }
        for explanation in &self.explanations {
            write!(f, "\n  {explanation}")?;
        }
        Ok(())
    }
}
