//! Call-node IR: the shape of one recursive function body.
//!
//! A front end lowers each analyzed function into a [`CallNode`]: its
//! parameters, and a body of nested [`Statement`] sequences. Unlike a
//! basic-block IR, control flow is kept structured (a
//! [`Conditional`](StmtKind::Conditional) owns its two branch sequences)
//! because tail position is a property of the path from entry to return,
//! and the classifier enumerates those paths directly.
//!
//! # Architecture
//!
//! - **[`CallNode`]**: a function body: name, parameters, statements
//! - **[`Statement`]**: one step of the body, tagged with a [`StmtId`]
//! - **[`Argument`]**: how each recursive-call argument is evaluated
//! - **[`OwnershipOp`]**: a retain/release written by the front end or
//!   synthesized by [`call_ownership_ops`](crate::rc_insert::call_ownership_ops)
//!
//! Values are named via [`ValueId`] (each defined once). Nodes are built
//! once, usually through [`NodeBuilder`](crate::NodeBuilder), and never
//! mutated by analysis.

use std::fmt;

use smallvec::{smallvec, SmallVec};

use crate::{ArcClass, Ownership};

// ── ID newtypes ─────────────────────────────────────────────────────

/// Value ID within a [`CallNode`].
///
/// Parameters, call results and `Other` results each get a fresh ID.
/// IDs are allocated sequentially starting from 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct ValueId(u32);

impl ValueId {
    /// Create a new value ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Statement ID within a [`CallNode`].
///
/// Every statement, including nested branch statements, has a distinct ID.
/// Explanations point back at statements through these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct StmtId(u32);

impl StmtId {
    /// Create a new statement ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

// ── Literal values ──────────────────────────────────────────────────

/// Literal constant passed as a call argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LitValue {
    Int(i64),
    Bool(bool),
    /// String constants live in static storage and are never released.
    String(String),
    Nil,
}

impl fmt::Display for LitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LitValue::Int(n) => write!(f, "{n}"),
            LitValue::Bool(b) => write!(f, "{b}"),
            LitValue::String(s) => write!(f, "{s:?}"),
            LitValue::Nil => f.write_str("nil"),
        }
    }
}

// ── Return conventions ──────────────────────────────────────────────

/// How a producer (accessor or expression) hands its result to the caller.
///
/// Determines which ownership-stabilizing operation the caller needs
/// before passing the value on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReturnConvention {
    /// +1: the caller owns the result and must eventually release it.
    Retained,
    /// +0, autoreleased: the caller reclaims it with
    /// `RetainAutoreleasedReturn` and then owns it.
    Autoreleased,
    /// +0 with no lifetime guarantee: the caller must retain it to keep it
    /// alive across the call.
    Unretained,
}

// ── Arguments ───────────────────────────────────────────────────────

/// How a recursive-call argument is evaluated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArgKind {
    /// Read a storage slot directly: `base->field`.
    ///
    /// `bypasses_overridable_accessor` is set by the front end when the
    /// field also has an accessor that a subtype of `base`'s declared type
    /// could override.
    DirectFieldAccess {
        base: ValueId,
        field: String,
        bypasses_overridable_accessor: bool,
    },

    /// Invoke a getter: `receiver.accessor`.
    AccessorCall {
        receiver: ValueId,
        accessor: String,
        convention: ReturnConvention,
        overridable: bool,
    },

    /// A constant.
    Literal(LitValue),

    /// Any other computed value, e.g. `count + 1`.
    Expression {
        text: String,
        operands: Vec<ValueId>,
        convention: ReturnConvention,
    },

    /// A construct the front end could not model.
    Unmodeled { construct: String },
}

/// One argument of a [`RecursiveCall`](StmtKind::RecursiveCall).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Argument {
    pub kind: ArgKind,
    /// Whether the argument's value is reference counted.
    pub class: ArcClass,
}

impl Argument {
    /// Direct storage read of an object-typed field.
    pub fn field(base: ValueId, field: impl Into<String>) -> Self {
        Self {
            kind: ArgKind::DirectFieldAccess {
                base,
                field: field.into(),
                bypasses_overridable_accessor: false,
            },
            class: ArcClass::DefiniteRef,
        }
    }

    /// Getter call returning an autoreleased object, the common case for
    /// synthesized property accessors.
    pub fn accessor(receiver: ValueId, accessor: impl Into<String>) -> Self {
        Self {
            kind: ArgKind::AccessorCall {
                receiver,
                accessor: accessor.into(),
                convention: ReturnConvention::Autoreleased,
                overridable: false,
            },
            class: ArcClass::DefiniteRef,
        }
    }

    /// Literal constant. Only string literals are reference typed.
    pub fn literal(lit: LitValue) -> Self {
        let class = match lit {
            LitValue::String(_) => ArcClass::DefiniteRef,
            LitValue::Int(_) | LitValue::Bool(_) | LitValue::Nil => ArcClass::Scalar,
        };
        Self {
            kind: ArgKind::Literal(lit),
            class,
        }
    }

    /// Computed scalar value such as `count + 1`.
    pub fn scalar_expr(text: impl Into<String>, operands: Vec<ValueId>) -> Self {
        Self {
            kind: ArgKind::Expression {
                text: text.into(),
                operands,
                convention: ReturnConvention::Retained,
            },
            class: ArcClass::Scalar,
        }
    }

    /// Computed object value with an explicit return convention.
    pub fn object_expr(
        text: impl Into<String>,
        operands: Vec<ValueId>,
        convention: ReturnConvention,
    ) -> Self {
        Self {
            kind: ArgKind::Expression {
                text: text.into(),
                operands,
                convention,
            },
            class: ArcClass::DefiniteRef,
        }
    }

    /// Placeholder for a construct the front end could not lower.
    pub fn unmodeled(construct: impl Into<String>) -> Self {
        Self {
            kind: ArgKind::Unmodeled {
                construct: construct.into(),
            },
            class: ArcClass::PossibleRef,
        }
    }

    /// Override the ARC class.
    #[must_use]
    pub fn with_class(mut self, class: ArcClass) -> Self {
        self.class = class;
        self
    }

    /// Override the return convention of an accessor or expression.
    /// No effect on other kinds.
    #[must_use]
    pub fn with_convention(mut self, conv: ReturnConvention) -> Self {
        match &mut self.kind {
            ArgKind::AccessorCall { convention, .. } | ArgKind::Expression { convention, .. } => {
                *convention = conv;
            }
            ArgKind::DirectFieldAccess { .. } | ArgKind::Literal(_) | ArgKind::Unmodeled { .. } => {}
        }
        self
    }

    /// Mark the accessor as overridable, or the field read as bypassing an
    /// overridable accessor. No effect on other kinds.
    #[must_use]
    pub fn overridable(mut self) -> Self {
        match &mut self.kind {
            ArgKind::AccessorCall { overridable, .. } => *overridable = true,
            ArgKind::DirectFieldAccess {
                bypasses_overridable_accessor,
                ..
            } => *bypasses_overridable_accessor = true,
            ArgKind::Literal(_) | ArgKind::Expression { .. } | ArgKind::Unmodeled { .. } => {}
        }
        self
    }

    /// Returns `true` if a subtype could change what this argument
    /// evaluates to.
    pub fn is_potential_override(&self) -> bool {
        match &self.kind {
            ArgKind::AccessorCall { overridable, .. } => *overridable,
            ArgKind::DirectFieldAccess {
                bypasses_overridable_accessor,
                ..
            } => *bypasses_overridable_accessor,
            ArgKind::Literal(_) | ArgKind::Expression { .. } | ArgKind::Unmodeled { .. } => false,
        }
    }

    /// Values read while evaluating this argument.
    pub fn used_values(&self) -> SmallVec<[ValueId; 2]> {
        match &self.kind {
            ArgKind::DirectFieldAccess { base, .. } => smallvec![*base],
            ArgKind::AccessorCall { receiver, .. } => smallvec![*receiver],
            ArgKind::Expression { operands, .. } => operands.iter().copied().collect(),
            ArgKind::Literal(_) | ArgKind::Unmodeled { .. } => SmallVec::new(),
        }
    }

    /// Source-like rendering, e.g. `node->next` or `node.next`.
    pub fn describe(&self, node: &CallNode) -> String {
        match &self.kind {
            ArgKind::DirectFieldAccess { base, field, .. } => {
                format!("{}->{field}", node.value_name(*base))
            }
            ArgKind::AccessorCall {
                receiver, accessor, ..
            } => format!("{}.{accessor}", node.value_name(*receiver)),
            ArgKind::Literal(lit) => lit.to_string(),
            ArgKind::Expression { text, .. } => text.clone(),
            ArgKind::Unmodeled { construct } => format!("<{construct}>"),
        }
    }
}

// ── Ownership operations ────────────────────────────────────────────

/// Kind of reference-counting operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OwnershipOpKind {
    Retain,
    Release,
    /// Reclaim an autoreleased return value (`+0` → `+1`).
    RetainAutoreleasedReturn,
}

impl fmt::Display for OwnershipOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OwnershipOpKind::Retain => "retain",
            OwnershipOpKind::Release => "release",
            OwnershipOpKind::RetainAutoreleasedReturn => "retainAutoreleasedReturnValue",
        })
    }
}

/// What an [`OwnershipOp`] applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpTarget {
    /// A named value of the function body.
    Value(ValueId),
    /// The temporary holding argument `index` of call `call`.
    Argument { call: StmtId, index: usize },
}

/// A reference-counting operation, tagged with why it exists.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OwnershipOp {
    pub kind: OwnershipOpKind,
    pub target: OpTarget,
    pub reason: String,
}

// ── Statements ──────────────────────────────────────────────────────

/// Statement payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StmtKind {
    /// Leave the function. `None` is a void return.
    Return { value: Option<ValueId> },

    /// Two-way branch; each branch is a nested statement sequence.
    /// Control continues after the conditional if a branch does not return.
    Conditional {
        cond: ValueId,
        then_branch: Vec<Statement>,
        else_branch: Vec<Statement>,
    },

    /// Call to the enclosing function, defining `dst`.
    RecursiveCall { dst: ValueId, args: Vec<Argument> },

    /// Reference-counting operation written out by the front end.
    Ownership(OwnershipOp),

    /// Any other computation, e.g. `1 + r` or `!node`.
    Other {
        dst: Option<ValueId>,
        text: String,
        operands: Vec<ValueId>,
    },

    /// A statement the front end could not model.
    Unmodeled { construct: String },
}

/// One statement of a [`CallNode`] body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statement {
    pub id: StmtId,
    pub kind: StmtKind,
}

impl Statement {
    /// Returns the value defined by this statement, if any.
    pub fn defined_value(&self) -> Option<ValueId> {
        match &self.kind {
            StmtKind::RecursiveCall { dst, .. } => Some(*dst),
            StmtKind::Other { dst, .. } => *dst,
            StmtKind::Return { .. }
            | StmtKind::Conditional { .. }
            | StmtKind::Ownership(_)
            | StmtKind::Unmodeled { .. } => None,
        }
    }

    /// Returns the values read by this statement.
    ///
    /// For a `Conditional` only the condition is reported; branch bodies
    /// are separate statements.
    pub fn used_values(&self) -> SmallVec<[ValueId; 4]> {
        match &self.kind {
            StmtKind::Return { value } => value.iter().copied().collect(),
            StmtKind::Conditional { cond, .. } => smallvec![*cond],
            StmtKind::RecursiveCall { args, .. } => {
                args.iter().flat_map(Argument::used_values).collect()
            }
            StmtKind::Ownership(op) => match op.target {
                OpTarget::Value(v) => smallvec![v],
                OpTarget::Argument { .. } => SmallVec::new(),
            },
            StmtKind::Other { operands, .. } => operands.iter().copied().collect(),
            StmtKind::Unmodeled { .. } => SmallVec::new(),
        }
    }

    /// Short tag name, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            StmtKind::Return { .. } => "return",
            StmtKind::Conditional { .. } => "conditional",
            StmtKind::RecursiveCall { .. } => "recursive call",
            StmtKind::Ownership(_) => "ownership operation",
            StmtKind::Other { .. } => "statement",
            StmtKind::Unmodeled { .. } => "unmodeled construct",
        }
    }

    /// Source-like one-line rendering.
    pub fn describe(&self, node: &CallNode) -> String {
        match &self.kind {
            StmtKind::Return { value: Some(v) } => format!("return {}", node.value_name(*v)),
            StmtKind::Return { value: None } => "return".to_owned(),
            StmtKind::Conditional { cond, .. } => format!("if {}", node.value_name(*cond)),
            StmtKind::RecursiveCall { args, .. } => {
                let rendered: Vec<String> = args.iter().map(|a| a.describe(node)).collect();
                format!("{}({})", node.name, rendered.join(", "))
            }
            StmtKind::Ownership(op) => format!("{} {}", op.kind, node.target_name(op.target)),
            StmtKind::Other { text, .. } => text.clone(),
            StmtKind::Unmodeled { construct } => format!("<{construct}>"),
        }
    }
}

// ── Parameters ──────────────────────────────────────────────────────

/// A function parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    pub value: ValueId,
    pub class: ArcClass,
    /// Calling convention for this position. `Borrowed` is the ARC default.
    pub ownership: Ownership,
}

// ── Nodes ───────────────────────────────────────────────────────────

/// One analyzed function or method body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallNode {
    /// The function's name, used in explanations and errors.
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Statement>,
    /// `true` for void functions: a path that runs off the end of the body
    /// returns implicitly. Otherwise such a path is malformed.
    pub implicit_return: bool,
    /// Display name of each value, indexed by `ValueId::index()`.
    pub value_names: Vec<String>,
}

impl CallNode {
    /// Display name of a value, or `v<N>` if the node has none recorded.
    pub fn value_name(&self, value: ValueId) -> String {
        match self.value_names.get(value.index()) {
            Some(name) => name.clone(),
            None => format!("v{}", value.raw()),
        }
    }

    /// Display name of an ownership-op target.
    pub fn target_name(&self, target: OpTarget) -> String {
        match target {
            OpTarget::Value(v) => self.value_name(v),
            OpTarget::Argument { call, index } => format!("{call}.arg{index}"),
        }
    }

    /// Parameter declared at `index`, if any.
    pub fn param(&self, index: usize) -> Option<&Param> {
        self.params.get(index)
    }
}
