use std::error::Error as StdError;

use thiserror::Error;

use crate::equation::EvalError;

use super::{bracket::BracketError, config::ConfigError};

/// Errors that can occur during bisection solving.
///
/// Model and problem failures are boxed so the error type does not depend on
/// the model being solved; callers can recover the concrete type with
/// [`downcast`](Box::downcast).
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("invalid bracket: {0}")]
    InvalidBracket(#[from] BracketError),

    #[error("model call failed")]
    Model(#[source] Box<dyn StdError + Send + Sync>),

    #[error("problem error")]
    Problem(#[source] Box<dyn StdError + Send + Sync>),

    #[error("residual {residual} at x = {x} is not finite")]
    NonFiniteResidual { x: f64, residual: f64 },

    /// Every evaluation failed and was skipped by the observer.
    #[error("no successful evaluations")]
    NoSuccessfulEvaluation,
}

impl<ME, PE> From<EvalError<ME, PE>> for Error
where
    ME: StdError + Send + Sync + 'static,
    PE: StdError + Send + Sync + 'static,
{
    fn from(error: EvalError<ME, PE>) -> Self {
        match error {
            EvalError::Model(source) => Self::Model(Box::new(source)),
            EvalError::Problem(source) => Self::Problem(Box::new(source)),
            EvalError::NonFinite {
                x: [x],
                residuals: [residual],
            } => Self::NonFiniteResidual { x, residual },
        }
    }
}
