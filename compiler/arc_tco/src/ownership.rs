//! Parameter ownership conventions.
//!
//! Under ARC every object parameter is either [`Borrowed`](Ownership::Borrowed)
//! (the callee receives `+0` and the caller stays responsible for the
//! reference) or [`Owned`](Ownership::Owned) (the callee consumes a `+1`
//! reference). The distinction decides whether a caller that had to
//! stabilize an argument also has to release it once the call returns.

/// Ownership classification for a function parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ownership {
    /// The callee borrows the value and will not release it.
    /// The caller must release anything it retained for the call.
    #[default]
    Borrowed,

    /// The callee takes ownership. A `+1` argument is transferred and the
    /// caller has nothing left to clean up.
    Owned,
}

impl Ownership {
    /// Returns `true` if the callee consumes the reference.
    #[inline]
    pub fn consumes(self) -> bool {
        self == Ownership::Owned
    }
}

#[cfg(test)]
mod tests;
