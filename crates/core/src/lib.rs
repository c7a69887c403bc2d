//! Core traits and types shared by the RATE solvers and models.
//!
//! - [`Model`] — a deterministic callable from a typed input to a typed output
//! - [`Snapshot`] — the input/output pair captured from one model call
//! - [`Observer`] — receives solver events and may return a control action
//! - [`EquationProblem`] — adapts solver variables to model inputs and turns
//!   model outputs into residuals

mod model;
mod observer;
mod problems;

pub use observer::Observer;
pub use problems::EquationProblem;
pub use {model::Model, model::Snapshot};
