//! The ZZ-CAPM risk premium.
//!
//! For volatility `σ` and horizon `n` the premium is
//!
//! ```text
//! c(σ, n) = −(1/n) · ln[2 · (1 − Φ(σ·√n / 4))]
//! ```
//!
//! where `Φ` is the standard normal CDF. The tail `1 − Φ(x)` is computed as
//! `erfc(x/√2) / 2` so it does not cancel against one for large `x`. The
//! `erfc` approximation is accurate to about `1e-10` relative error across the
//! range, which bounds the accuracy of [`log_loss`] at about `1e-10` absolute.

use std::f64::consts::SQRT_2;

use statrs::function::erf::erfc;
use thiserror::Error;

use rate_core::Model;

/// The risk premium was evaluated outside its domain.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum DomainError {
    #[error("volatility must be finite and non-negative, got sigma = {sigma}")]
    Volatility { sigma: f64 },

    #[error("horizon must be finite and positive, got n = {horizon}")]
    Horizon { horizon: f64 },

    /// `1 − Φ(x)` is zero in double precision, so the logarithm is undefined.
    #[error("tail probability vanished at sigma = {sigma}, n = {horizon} (x = {argument})")]
    VanishingTail {
        sigma: f64,
        horizon: f64,
        argument: f64,
    },
}

/// Returns the argument `σ·√n / 4` passed to `Φ`.
#[must_use]
pub fn tail_argument(sigma: f64, horizon: f64) -> f64 {
    sigma * horizon.sqrt() / 4.0
}

/// Returns `1 − Φ(x)` for the standard normal distribution.
#[must_use]
pub fn normal_tail(x: f64) -> f64 {
    0.5 * erfc(x / SQRT_2)
}

/// Returns the log-loss term `n · c(σ, n) = −ln[2 · (1 − Φ(σ·√n / 4))]`.
///
/// This is the quantity the anchor solver actually needs; it stays finite as
/// `n → 0` where `c` itself grows like `1/√n`.
///
/// # Errors
///
/// Returns a [`DomainError`] if `σ` or `n` is invalid or the tail underflows.
pub fn log_loss(sigma: f64, horizon: f64) -> Result<f64, DomainError> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(DomainError::Volatility { sigma });
    }
    if !horizon.is_finite() || horizon <= 0.0 {
        return Err(DomainError::Horizon { horizon });
    }

    let argument = tail_argument(sigma, horizon);
    let doubled_tail = 2.0 * normal_tail(argument);
    if doubled_tail <= 0.0 {
        return Err(DomainError::VanishingTail {
            sigma,
            horizon,
            argument,
        });
    }

    Ok(-doubled_tail.ln())
}

/// Evaluates the risk premium `c(σ, n)`.
///
/// # Errors
///
/// Returns a [`DomainError`] if `σ` or `n` is invalid or the tail underflows.
pub fn risk_premium(sigma: f64, horizon: f64) -> Result<f64, DomainError> {
    Ok(log_loss(sigma, horizon)? / horizon)
}

/// A point at which to evaluate the risk premium.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PremiumInput {
    pub sigma: f64,
    pub horizon: f64,
}

/// The risk premium and its log-loss at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Premium {
    /// `c(σ, n)`.
    pub rate: f64,
    /// `n · c(σ, n)`.
    pub log_loss: f64,
}

/// The risk premium as a [`Model`], for use with the equation solvers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskPremium;

impl Model for RiskPremium {
    type Input = PremiumInput;
    type Output = Premium;
    type Error = DomainError;

    fn call(&self, input: &PremiumInput) -> Result<Premium, DomainError> {
        let log_loss = log_loss(input.sigma, input.horizon)?;
        Ok(Premium {
            rate: log_loss / input.horizon,
            log_loss,
        })
    }
}
