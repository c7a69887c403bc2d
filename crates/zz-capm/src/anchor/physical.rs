use thiserror::Error;

use rate_core::Model;

/// Errors from the physical anchor.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum PhysicalError {
    /// At or past the meltdown line the geometric drift `g − σ²/2` is not
    /// positive and the target multiple is not expected to be reached.
    #[error("sigma = {sigma} is outside the physical domain [0, {sigma_max})")]
    OutOfDomain { sigma: f64, sigma_max: f64 },

    #[error("growth must be finite and positive, got {0}")]
    Growth(f64),

    #[error("multiple must be finite and greater than one, got {0}")]
    Multiple(f64),
}

/// Returns the meltdown volatility `σ_max = √(2g)`.
#[must_use]
pub fn sigma_max(growth: f64) -> f64 {
    (2.0 * growth).sqrt()
}

/// Returns the expected time `E[T] = ln(M) / (g − σ²/2)` for a geometric
/// Brownian motion with drift `g` and volatility `σ` to grow by `M`.
///
/// # Errors
///
/// Returns [`PhysicalError::OutOfDomain`] for `σ ≥ √(2g)` or negative `σ`,
/// and a parameter error for invalid `g` or `M`.
pub fn expected_time(sigma: f64, growth: f64, multiple: f64) -> Result<f64, PhysicalError> {
    if !growth.is_finite() || growth <= 0.0 {
        return Err(PhysicalError::Growth(growth));
    }
    if !multiple.is_finite() || multiple <= 1.0 {
        return Err(PhysicalError::Multiple(multiple));
    }

    let sigma_max = sigma_max(growth);
    let drift = growth - 0.5 * sigma * sigma;
    if !sigma.is_finite() || sigma < 0.0 || sigma >= sigma_max || drift <= 0.0 {
        return Err(PhysicalError::OutOfDomain { sigma, sigma_max });
    }

    Ok(multiple.ln() / drift)
}

/// The physical anchor `E[T](σ)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalAnchor {
    pub growth: f64,
    pub multiple: f64,
}

impl Model for PhysicalAnchor {
    type Input = f64;
    type Output = f64;
    type Error = PhysicalError;

    fn call(&self, sigma: &f64) -> Result<f64, PhysicalError> {
        expected_time(*sigma, self.growth, self.multiple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn meltdown_line() {
        assert_relative_eq!(sigma_max(0.20), 0.632_455_532_033_675_9, epsilon = 1e-15);
    }

    #[test]
    fn doubling_time_without_volatility() {
        assert_relative_eq!(
            expected_time(0.0, 0.20, 2.0).unwrap(),
            std::f64::consts::LN_2 / 0.20
        );
    }

    #[test]
    fn increases_with_volatility() {
        let times: Vec<f64> = [0.1, 0.3, 0.5, 0.6, 0.63]
            .iter()
            .map(|&sigma| expected_time(sigma, 0.20, 2.0).unwrap())
            .collect();
        assert!(times.windows(2).all(|pair| pair[1] > pair[0]));
    }

    #[test]
    fn out_of_domain_past_meltdown() {
        let sigma_max = sigma_max(0.20);
        for sigma in [sigma_max, 0.65, 1.0, f64::INFINITY] {
            assert!(matches!(
                expected_time(sigma, 0.20, 2.0),
                Err(PhysicalError::OutOfDomain { .. })
            ));
        }
        assert!(matches!(
            expected_time(-0.1, 0.20, 2.0),
            Err(PhysicalError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn rejects_bad_parameters() {
        assert_eq!(
            expected_time(0.1, 0.0, 2.0),
            Err(PhysicalError::Growth(0.0))
        );
        assert_eq!(
            expected_time(0.1, 0.2, 0.5),
            Err(PhysicalError::Multiple(0.5))
        );
    }
}
