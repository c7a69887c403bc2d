//! Psychological and physical anchors.
//!
//! Each anchor maps a volatility `σ` to a time horizon in years and
//! implements [`Model`](rate_core::Model) with `Input = f64` (the volatility)
//! and an output implementing [`Horizon`], so any of them can be handed to
//! [`find_equilibrium`](crate::equilibrium::find_equilibrium).
//!
//! - [`ExactAnchor`] — the self-consistent ZZ-CAPM horizon, see [`solve`]
//! - [`LinearAnchor`] — the closed-form approximation `1/(r + λσ)`
//! - [`PhysicalAnchor`] — the expected time for growth to reach a multiple

mod implicit;
mod linear;
mod physical;

pub use implicit::{
    ExactAnchor, FixedPointResult, ImplicitError, MAX_EXPANSIONS, N_LO, SelfConsistency, solve,
};
pub use linear::{LinearAnchor, LinearError, solve_linear};
pub use physical::{PhysicalAnchor, PhysicalError, expected_time, sigma_max};

/// A horizon returned by an anchor.
///
/// Closed-form anchors return a plain `f64`, which is always converged.
/// Iteratively solved anchors report whether their solve met its tolerance.
pub trait Horizon {
    /// The horizon in years.
    fn years(&self) -> f64;

    /// Whether the horizon was computed to tolerance.
    fn converged(&self) -> bool {
        true
    }
}

impl Horizon for f64 {
    fn years(&self) -> f64 {
        *self
    }
}
