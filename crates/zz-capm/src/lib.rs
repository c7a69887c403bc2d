//! ZZ-CAPM temporal equilibrium.
//!
//! Investors discount with a horizon `n` that solves the self-consistent
//! equation `n = 1/(r + c(σ, n))`, where `c` is the ZZ-CAPM risk premium.
//! The market is in temporal equilibrium at the volatility `σ*` where this
//! psychological anchor meets the physical anchor `E[T](σ)`, the expected time
//! for value to grow by a multiple `M`.
//!
//! - [`premium`] — the risk premium `c(σ, n)`
//! - [`anchor`] — exact, linear and physical anchors as [`Model`]s
//! - [`equilibrium`] — the crossing search on `(0, σ_max)`
//! - [`comparison`] — linearization bias `Δσ*` for each `λ`
//! - [`curve`] — anchor curves and the Time Paradox Index over a grid
//! - [`config`] — the validated, `serde`-ready run configuration
//!
//! ```
//! use rate_zz_capm::{RunConfig, compare};
//!
//! let comparison = compare(&RunConfig::default())?;
//! let exact = comparison.exact.expect("baseline has an equilibrium");
//! assert!((exact.sigma_star - 0.574).abs() < 0.002);
//! # Ok::<(), rate_zz_capm::comparison::ComparisonError>(())
//! ```
//!
//! [`Model`]: rate_core::Model

pub mod anchor;
pub mod comparison;
pub mod config;
pub mod curve;
pub mod equilibrium;
pub mod premium;

pub use anchor::{expected_time, solve, solve_linear};
pub use comparison::{Comparison, ComparisonRow, compare};
pub use config::{Parameters, RunConfig, SolverSettings};
pub use curve::{SigmaGrid, mispricing_zone, sample_curves};
pub use equilibrium::{EquilibriumPoint, find_equilibrium};
