//! Structural validation and control-path enumeration.
//!
//! A *path* is the sequence of statements executed from function entry to
//! a return, choosing one branch at every [`Conditional`](StmtKind::Conditional).
//! Tail position is decided per path, so the classifier needs every path
//! explicitly.
//!
//! Both walks use an explicit stack instead of recursion, so deeply nested
//! conditionals cannot exhaust the native stack.

use rustc_hash::FxHashSet;
use smallvec::{smallvec, SmallVec};

use crate::ir::{ArgKind, CallNode, Statement, StmtId, StmtKind};
use crate::problem::{ClassifyError, MalformedReason};

/// Which arm of a conditional a path took.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BranchChoice {
    Then,
    Else,
}

/// One step of a [`ControlPath`].
#[derive(Clone, Copy, Debug)]
pub enum PathStep<'a> {
    /// A straight-line statement.
    Stmt(&'a Statement),
    /// A conditional, and the arm taken.
    Branch {
        stmt: &'a Statement,
        choice: BranchChoice,
    },
}

impl<'a> PathStep<'a> {
    /// The statement this step executes.
    pub fn statement(&self) -> &'a Statement {
        match *self {
            PathStep::Stmt(stmt) | PathStep::Branch { stmt, .. } => stmt,
        }
    }
}

/// How a path leaves the function.
#[derive(Clone, Copy, Debug)]
pub enum PathExit<'a> {
    /// An explicit `Return` statement.
    Return(&'a Statement),
    /// Ran off the end of a void body.
    Fallthrough,
}

/// One entry-to-return path through a [`CallNode`].
#[derive(Clone, Debug)]
pub struct ControlPath<'a> {
    /// Statements executed before the exit, in order. Conditionals appear
    /// as [`PathStep::Branch`].
    pub steps: Vec<PathStep<'a>>,
    pub exit: PathExit<'a>,
}

impl ControlPath<'_> {
    /// Branch decisions along this path, in order.
    pub fn branches(&self) -> SmallVec<[(StmtId, BranchChoice); 4]> {
        self.steps
            .iter()
            .filter_map(|step| match *step {
                PathStep::Branch { stmt, choice } => Some((stmt.id, choice)),
                PathStep::Stmt(_) => None,
            })
            .collect()
    }

    /// Check that every value read on this path is defined earlier on it.
    ///
    /// Parameters are defined on entry.
    pub fn check_definitions(&self, node: &CallNode, path: usize) -> Result<(), MalformedReason> {
        let mut defined: FxHashSet<_> = node.params.iter().map(|p| p.value).collect();

        let exit_stmt = match self.exit {
            PathExit::Return(stmt) => Some(stmt),
            PathExit::Fallthrough => None,
        };
        let executed = self.steps.iter().map(PathStep::statement).chain(exit_stmt);

        for stmt in executed {
            if let Some(&value) = stmt.used_values().iter().find(|v| !defined.contains(*v)) {
                return Err(MalformedReason::UndefinedValue {
                    stmt: stmt.id,
                    value,
                    path,
                });
            }
            if let Some(dst) = stmt.defined_value() {
                defined.insert(dst);
            }
        }
        Ok(())
    }
}

/// Conditionals whose branches both return on every path.
///
/// Conditionals are collected parent-first, so walking them in reverse
/// settles every nested conditional before the one containing it.
fn returning_conditionals(node: &CallNode) -> FxHashSet<StmtId> {
    let mut conditionals: Vec<(StmtId, &[Statement], &[Statement])> = Vec::new();
    let mut stack: Vec<&[Statement]> = vec![node.body.as_slice()];
    while let Some(seq) = stack.pop() {
        for stmt in seq {
            if let StmtKind::Conditional {
                then_branch,
                else_branch,
                ..
            } = &stmt.kind
            {
                conditionals.push((stmt.id, then_branch.as_slice(), else_branch.as_slice()));
                stack.push(then_branch);
                stack.push(else_branch);
            }
        }
    }

    let mut returning = FxHashSet::default();
    for &(id, then_branch, else_branch) in conditionals.iter().rev() {
        if always_returns(then_branch, &returning) && always_returns(else_branch, &returning) {
            returning.insert(id);
        }
    }
    returning
}

fn always_returns(seq: &[Statement], returning: &FxHashSet<StmtId>) -> bool {
    seq.iter()
        .any(|stmt| matches!(stmt.kind, StmtKind::Return { .. }) || returning.contains(&stmt.id))
}

/// Check the structural invariants of a node that do not depend on paths.
///
/// Rejects statements after a `Return` or after a conditional that returns
/// on both branches, unmodeled statements and arguments, and recursive
/// calls whose arity differs from the node's.
pub fn validate(node: &CallNode) -> Result<(), ClassifyError> {
    let returning = returning_conditionals(node);
    let mut stack: Vec<&[Statement]> = vec![node.body.as_slice()];

    while let Some(seq) = stack.pop() {
        for (i, stmt) in seq.iter().enumerate() {
            match &stmt.kind {
                StmtKind::Return { .. } => {
                    if let Some(next) = seq.get(i + 1) {
                        return Err(ClassifyError::malformed(
                            &node.name,
                            MalformedReason::StatementAfterReturn {
                                ret: stmt.id,
                                unreachable: next.id,
                            },
                        ));
                    }
                }
                StmtKind::Conditional {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    if returning.contains(&stmt.id) {
                        if let Some(next) = seq.get(i + 1) {
                            return Err(ClassifyError::malformed(
                                &node.name,
                                MalformedReason::Unreachable {
                                    after: stmt.id,
                                    unreachable: next.id,
                                },
                            ));
                        }
                    }
                    // Else pushed first so then-branch errors surface first.
                    stack.push(else_branch);
                    stack.push(then_branch);
                }
                StmtKind::RecursiveCall { args, .. } => {
                    if args.len() != node.params.len() {
                        return Err(ClassifyError::malformed(
                            &node.name,
                            MalformedReason::ArityMismatch {
                                call: stmt.id,
                                expected: node.params.len(),
                                found: args.len(),
                            },
                        ));
                    }
                    for arg in args {
                        if let ArgKind::Unmodeled { construct } = &arg.kind {
                            return Err(ClassifyError::unsupported(
                                &node.name,
                                stmt.id,
                                format!("argument: {construct}"),
                            ));
                        }
                    }
                }
                StmtKind::Unmodeled { construct } => {
                    return Err(ClassifyError::unsupported(
                        &node.name,
                        stmt.id,
                        construct.clone(),
                    ));
                }
                StmtKind::Ownership(_) | StmtKind::Other { .. } => {}
            }
        }
    }

    Ok(())
}

/// In-progress path: the statement sequences still to run (innermost last)
/// and the steps taken so far.
struct Cursor<'a> {
    frames: SmallVec<[(&'a [Statement], usize); 4]>,
    steps: Vec<PathStep<'a>>,
}

/// Enumerate every control path of a validated node.
///
/// Paths are produced depth-first, then-branch before else-branch, so the
/// order is stable for a given node. Fails with
/// [`PathLimitExceeded`](ClassifyError::PathLimitExceeded) once more than
/// `max_paths` paths exist, and with
/// [`MissingReturn`](MalformedReason::MissingReturn) when a non-void body
/// can be run off the end.
pub fn enumerate_paths(
    node: &CallNode,
    max_paths: usize,
) -> Result<Vec<ControlPath<'_>>, ClassifyError> {
    let mut paths: Vec<ControlPath<'_>> = Vec::new();
    let mut work: Vec<Cursor<'_>> = vec![Cursor {
        frames: smallvec![(node.body.as_slice(), 0)],
        steps: Vec::new(),
    }];

    while let Some(mut cur) = work.pop() {
        loop {
            let Some(&(seq, idx)) = cur.frames.last() else {
                if !node.implicit_return {
                    return Err(ClassifyError::malformed(
                        &node.name,
                        MalformedReason::MissingReturn { path: paths.len() },
                    ));
                }
                let steps = std::mem::take(&mut cur.steps);
                push_path(node, max_paths, &mut paths, steps, PathExit::Fallthrough)?;
                break;
            };

            let Some(stmt) = seq.get(idx) else {
                cur.frames.pop();
                continue;
            };
            if let Some(top) = cur.frames.last_mut() {
                top.1 += 1;
            }

            match &stmt.kind {
                StmtKind::Return { .. } => {
                    let steps = std::mem::take(&mut cur.steps);
                    push_path(node, max_paths, &mut paths, steps, PathExit::Return(stmt))?;
                    break;
                }
                StmtKind::Conditional {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    if paths.len() + work.len() + 2 > max_paths {
                        return Err(path_limit(node, max_paths));
                    }

                    let mut else_cur = Cursor {
                        frames: cur.frames.clone(),
                        steps: cur.steps.clone(),
                    };
                    else_cur.steps.push(PathStep::Branch {
                        stmt,
                        choice: BranchChoice::Else,
                    });
                    else_cur.frames.push((else_branch.as_slice(), 0));
                    work.push(else_cur);

                    cur.steps.push(PathStep::Branch {
                        stmt,
                        choice: BranchChoice::Then,
                    });
                    cur.frames.push((then_branch.as_slice(), 0));
                }
                StmtKind::RecursiveCall { .. }
                | StmtKind::Ownership(_)
                | StmtKind::Other { .. }
                | StmtKind::Unmodeled { .. } => cur.steps.push(PathStep::Stmt(stmt)),
            }
        }
    }

    tracing::trace!(function = %node.name, paths = paths.len(), "enumerated control paths");
    Ok(paths)
}

/// Record a finished path, failing once the bound would be exceeded.
fn push_path<'a>(
    node: &CallNode,
    max_paths: usize,
    paths: &mut Vec<ControlPath<'a>>,
    steps: Vec<PathStep<'a>>,
    exit: PathExit<'a>,
) -> Result<(), ClassifyError> {
    if paths.len() >= max_paths {
        return Err(path_limit(node, max_paths));
    }
    paths.push(ControlPath { steps, exit });
    Ok(())
}

fn path_limit(node: &CallNode, max_paths: usize) -> ClassifyError {
    ClassifyError::PathLimitExceeded {
        function: node.name.clone(),
        limit: max_paths,
    }
}
