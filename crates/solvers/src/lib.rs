//! Bracketed root finding used by the RATE models.
//!
//! Solvers work on the [`Model`] and [`EquationProblem`] abstractions from
//! `rate-core` and report progress through an [`Observer`].
//!
//! [`Model`]: rate_core::Model
//! [`EquationProblem`]: rate_core::EquationProblem
//! [`Observer`]: rate_core::Observer

pub mod equation;
