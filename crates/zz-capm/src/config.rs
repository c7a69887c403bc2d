//! Run configuration.
//!
//! A [`RunConfig`] is built once (from [`Default`] or deserialized with
//! `serde`), validated, and then passed by reference to every operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::anchor::sigma_max;

/// Model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Risk-free rate `r`.
    pub rate: f64,
    /// Nominal growth rate `g`.
    pub growth: f64,
    /// Target multiple `M`.
    pub multiple: f64,
    /// Linear risk coefficients `λ`, compared in this order.
    pub lambdas: Vec<f64>,
}

impl Default for Parameters {
    /// The baseline scenario: `r = 1.8%`, `g = 20%`, value doubling.
    fn default() -> Self {
        Self {
            rate: 0.018,
            growth: 0.20,
            multiple: 2.0,
            lambdas: vec![0.20, 0.25, 0.30],
        }
    }
}

/// Numerical settings shared by the solvers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Absolute tolerance on `n` and on `σ*`.
    pub tol: f64,
    /// Iteration limit for each bisection.
    pub max_iters: usize,
    /// Interior points sampled when bracketing an equilibrium.
    pub samples: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tol: 1e-9,
            max_iters: 100,
            samples: 500,
        }
    }
}

/// Everything a comparison run needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub params: Parameters,
    pub settings: SolverSettings,
}

/// Errors that can occur when validating a [`RunConfig`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("rate must be finite and positive, got {0}")]
    Rate(f64),

    #[error("growth must be finite and positive, got {0}")]
    Growth(f64),

    #[error("multiple must be finite and greater than one, got {0}")]
    Multiple(f64),

    #[error("lambda #{index} must be finite and positive, got {value}")]
    Lambda { index: usize, value: f64 },

    #[error("tol must be finite and positive, got {0}")]
    Tolerance(f64),

    #[error("max_iters must be at least one")]
    MaxIters,

    #[error("samples must be at least two, got {0}")]
    Samples(usize),
}

impl RunConfig {
    /// Checks every parameter and setting.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Parameters {
            rate,
            growth,
            multiple,
            ref lambdas,
        } = self.params;

        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::Rate(rate));
        }
        if !growth.is_finite() || growth <= 0.0 {
            return Err(ConfigError::Growth(growth));
        }
        if !multiple.is_finite() || multiple <= 1.0 {
            return Err(ConfigError::Multiple(multiple));
        }
        if let Some((index, &value)) = lambdas
            .iter()
            .enumerate()
            .find(|(_, lambda)| !lambda.is_finite() || **lambda <= 0.0)
        {
            return Err(ConfigError::Lambda { index, value });
        }

        let settings = &self.settings;
        if !settings.tol.is_finite() || settings.tol <= 0.0 {
            return Err(ConfigError::Tolerance(settings.tol));
        }
        if settings.max_iters == 0 {
            return Err(ConfigError::MaxIters);
        }
        if settings.samples < 2 {
            return Err(ConfigError::Samples(settings.samples));
        }

        Ok(())
    }

    /// Returns the meltdown volatility `√(2g)` for these parameters.
    #[must_use]
    pub fn sigma_max(&self) -> f64 {
        sigma_max(self.params.growth)
    }

    /// Returns a copy with a different risk-free rate.
    #[must_use]
    pub fn with_rate(&self, rate: f64) -> Self {
        let mut config = self.clone();
        config.params.rate = rate;
        config
    }
}
