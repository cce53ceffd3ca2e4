//! Tail-call classification.
//!
//! # Algorithm
//!
//! 1. **Validate** the node's structure ([`validate`]).
//! 2. **Enumerate** every entry-to-return path ([`enumerate_paths`]) and
//!    check that each value is defined before it is read on every path.
//! 3. **Per path**, find the last recursive call. Paths without one are
//!    base cases. Otherwise the path is:
//!    - *non-tail* if an earlier recursive call's result is consumed, if any
//!      non-ownership statement runs after the last call, or if the return
//!      yields something other than the call's result;
//!    - *cleanup-blocked* if the call needs a caller-side release afterwards
//!      ([`call_ownership_ops`]) or an explicit ownership operation follows
//!      it;
//!    - *tail* otherwise.
//! 4. **Combine**: any non-tail path makes the node
//!    `BlockedByNonTailPosition`; otherwise any cleanup-blocked path makes
//!    it `BlockedByCleanup`; otherwise `TailCallOptimizable`.
//! 5. **Override flag**: set when any recursive-call argument depends on an
//!    overridable accessor.
//!
//! Classification is a pure function of the node: same node, same report.

use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::ir::{Argument, CallNode, Statement, StmtId, StmtKind, ValueId};
use crate::paths::{enumerate_paths, validate, ControlPath, PathExit, PathStep};
use crate::problem::ClassifyError;
use crate::rc_insert::call_ownership_ops;
use crate::report::{Classification, PathExplanation, TailCallReport};

/// Classifier configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Record a [`PathExplanation`] for each blocked path and override note.
    pub collect_explanations: bool,
    /// Upper bound on enumerated paths. Paths double with every sequential
    /// conditional, so this caps pathological inputs.
    pub max_paths: usize,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            collect_explanations: true,
            max_paths: 4096,
        }
    }
}

/// Classifies recursive functions by tail-call eligibility.
///
/// Holds only configuration; one classifier can be shared across threads.
#[derive(Clone, Debug, Default)]
pub struct TailCallClassifier {
    options: ClassifyOptions,
}

/// Classify `node` with default options.
pub fn classify(node: &CallNode) -> Result<TailCallReport, ClassifyError> {
    TailCallClassifier::new().classify(node)
}

/// Outcome of one path.
enum PathVerdict {
    /// No recursive call on this path.
    Base,
    Tail,
    NonTail { at: StmtId, reason: String },
    Cleanup { at: StmtId, reason: String },
}

impl TailCallClassifier {
    /// Create a classifier with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with explicit options.
    pub fn with_options(options: ClassifyOptions) -> Self {
        Self { options }
    }

    /// The active configuration.
    pub fn options(&self) -> ClassifyOptions {
        self.options
    }

    /// Classify one function body.
    pub fn classify(&self, node: &CallNode) -> Result<TailCallReport, ClassifyError> {
        tracing::debug!(function = %node.name, "classifying tail calls");

        validate(node)?;
        let paths = enumerate_paths(node, self.options.max_paths)?;

        let mut any_non_tail = false;
        let mut any_cleanup = false;
        let mut recursive_paths = 0;
        let mut potential_override = false;
        let mut explanations = Vec::new();
        // Override notes are per argument, not per path.
        let mut noted_overrides: FxHashSet<(StmtId, usize)> = FxHashSet::default();

        for (index, path) in paths.iter().enumerate() {
            path.check_definitions(node, index)
                .map_err(|reason| ClassifyError::malformed(&node.name, reason))?;

            let blocked = match analyze_path(node, path)? {
                PathVerdict::Base => continue,
                PathVerdict::Tail => None,
                PathVerdict::NonTail { at, reason } => {
                    any_non_tail = true;
                    Some((Classification::BlockedByNonTailPosition, at, reason))
                }
                PathVerdict::Cleanup { at, reason } => {
                    any_cleanup = true;
                    Some((Classification::BlockedByCleanup, at, reason))
                }
            };
            recursive_paths += 1;

            tracing::trace!(
                function = %node.name,
                path = index,
                verdict = blocked.as_ref().map_or("tail", |(v, ..)| v.description()),
                "classified path"
            );

            if self.options.collect_explanations {
                if let Some((verdict, statement, reason)) = blocked {
                    explanations.push(PathExplanation {
                        path: index,
                        branches: path.branches(),
                        statement,
                        verdict,
                        reason,
                    });
                }
            }

            for (call, args) in recursive_calls(path) {
                for (arg_index, arg) in args.iter().enumerate() {
                    if !arg.is_potential_override() {
                        continue;
                    }
                    potential_override = true;
                    if self.options.collect_explanations
                        && noted_overrides.insert((call.id, arg_index))
                    {
                        explanations.push(PathExplanation {
                            path: index,
                            branches: path.branches(),
                            statement: call.id,
                            verdict: Classification::BlockedByPotentialOverride,
                            reason: override_reason(node, arg_index, arg),
                        });
                    }
                }
            }
        }

        let classification = if any_non_tail {
            Classification::BlockedByNonTailPosition
        } else if any_cleanup {
            Classification::BlockedByCleanup
        } else {
            Classification::TailCallOptimizable
        };

        tracing::debug!(
            function = %node.name,
            classification = classification.description(),
            potential_override,
            paths = paths.len(),
            recursive_paths,
            "classified"
        );

        Ok(TailCallReport {
            function: node.name.clone(),
            classification,
            potential_override,
            recursive_paths,
            explanations,
        })
    }

    /// Classify many function bodies in parallel.
    ///
    /// Results are returned in input order. Each node is classified
    /// independently; one failure does not affect the others.
    pub fn classify_all(&self, nodes: &[CallNode]) -> Vec<Result<TailCallReport, ClassifyError>> {
        nodes.par_iter().map(|node| self.classify(node)).collect()
    }
}

/// The recursive calls on a path, with their arguments.
fn recursive_calls<'a, 'p>(
    path: &'p ControlPath<'a>,
) -> impl Iterator<Item = (&'a Statement, &'a [Argument])> + 'p {
    path.steps.iter().filter_map(|step| match *step {
        PathStep::Stmt(stmt) => match &stmt.kind {
            StmtKind::RecursiveCall { args, .. } => Some((stmt, args.as_slice())),
            _ => None,
        },
        PathStep::Branch { .. } => None,
    })
}

fn override_reason(node: &CallNode, index: usize, arg: &Argument) -> String {
    format!(
        "argument {index} (`{}`) depends on an accessor a subtype may override; \
         reading storage directly would bypass the override",
        arg.describe(node)
    )
}

/// Decide tail position for one path.
fn analyze_path(node: &CallNode, path: &ControlPath<'_>) -> Result<PathVerdict, ClassifyError> {
    let call_positions: Vec<usize> = path
        .steps
        .iter()
        .enumerate()
        .filter(|(_, step)| {
            matches!(
                step,
                PathStep::Stmt(Statement {
                    kind: StmtKind::RecursiveCall { .. },
                    ..
                })
            )
        })
        .map(|(i, _)| i)
        .collect();

    let Some(&last) = call_positions.last() else {
        return Ok(PathVerdict::Base);
    };

    // An earlier call's result feeds later work on the same path.
    if call_positions.len() > 1 {
        let first = path.steps[call_positions[0]].statement();
        return Ok(PathVerdict::NonTail {
            at: first.id,
            reason: format!(
                "result of `{}` is used by later statements before returning",
                first.describe(node)
            ),
        });
    }

    let call = path.steps[last].statement();
    let StmtKind::RecursiveCall { dst, args } = &call.kind else {
        return Ok(PathVerdict::Base);
    };

    // Statements between the call and the exit.
    let mut explicit_cleanup: Option<&Statement> = None;
    for step in &path.steps[last + 1..] {
        match *step {
            PathStep::Stmt(stmt) if matches!(stmt.kind, StmtKind::Ownership(_)) => {
                if explicit_cleanup.is_none() {
                    explicit_cleanup = Some(stmt);
                }
            }
            PathStep::Stmt(stmt) | PathStep::Branch { stmt, .. } => {
                return Ok(PathVerdict::NonTail {
                    at: stmt.id,
                    reason: format!(
                        "{} `{}` runs after the recursive call",
                        stmt.kind_name(),
                        stmt.describe(node)
                    ),
                });
            }
        }
    }

    if let PathExit::Return(ret) = path.exit {
        if let Some(returned) = returned_value(ret) {
            if returned != *dst {
                return Ok(PathVerdict::NonTail {
                    at: ret.id,
                    reason: format!(
                        "returns `{}` instead of the recursive call's result",
                        node.value_name(returned)
                    ),
                });
            }
        }
    }

    let ops = call_ownership_ops(node, call.id, args)?;
    if let Some(op) = ops.after.first() {
        return Ok(PathVerdict::Cleanup {
            at: call.id,
            reason: format!("{} after the call: {}", op.kind, op.reason),
        });
    }

    if let Some(stmt) = explicit_cleanup {
        return Ok(PathVerdict::Cleanup {
            at: stmt.id,
            reason: format!("`{}` runs after the recursive call", stmt.describe(node)),
        });
    }

    Ok(PathVerdict::Tail)
}

fn returned_value(ret: &Statement) -> Option<ValueId> {
    match ret.kind {
        StmtKind::Return { value } => value,
        _ => None,
    }
}
