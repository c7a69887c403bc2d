use super::bracket::Sign;

/// What an observer asks of the bisection solver after an event.
///
/// Returning `None` from the observer lets the evaluated residual drive the
/// bracket as usual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Halt and return the best point found so far.
    Stop,

    /// Update the bracket as if the residual had this sign.
    ///
    /// A failed evaluation is stepped over this way. The point is never
    /// reported as the solution, even if its evaluation succeeded.
    Assume(Sign),
}

impl Action {
    /// Steps over the point as if its residual were `residual`.
    ///
    /// Only the sign of `residual` is used; zero counts as positive.
    #[must_use]
    pub fn assume(residual: f64) -> Self {
        Self::Assume(Sign::of(residual))
    }

    /// Returns the sign the observer substituted for the residual, if any.
    #[must_use]
    pub fn assumed_sign(self) -> Option<Sign> {
        match self {
            Self::Assume(sign) => Some(sign),
            Self::Stop => None,
        }
    }
}
