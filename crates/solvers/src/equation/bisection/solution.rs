use rate_core::Snapshot;

/// Indicates why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The bracket width or the residual met its tolerance.
    Converged,
    /// The iteration limit was reached first.
    MaxIters,
    /// An observer requested an early stop.
    StoppedByObserver,
}

/// The result of a bisection solve.
#[derive(Debug, Clone)]
pub struct Solution<I, O> {
    /// Final solver status.
    pub status: Status,
    /// Best estimate of the root.
    pub x: f64,
    /// Residual at `x`.
    pub residual: f64,
    /// Model input and output at `x`.
    pub snapshot: Snapshot<I, O>,
    /// Midpoint iterations performed.
    pub iters: usize,
    /// Bracket when the solver stopped.
    pub bracket: [f64; 2],
}

impl<I, O> Solution<I, O> {
    /// Returns the width of the final bracket.
    #[must_use]
    pub fn bracket_width(&self) -> f64 {
        self.bracket[1] - self.bracket[0]
    }
}
