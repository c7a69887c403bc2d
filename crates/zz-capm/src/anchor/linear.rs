use thiserror::Error;

use rate_core::Model;

/// The linear approximation has no finite positive value.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("r + lambda * sigma = {denominator} is not a positive finite number")]
pub struct LinearError {
    pub denominator: f64,
}

/// Returns the linearized horizon `n = 1/(r + λσ)`.
///
/// # Errors
///
/// Returns a [`LinearError`] when `r + λσ` is zero, negative, or not finite.
pub fn solve_linear(sigma: f64, rate: f64, lambda: f64) -> Result<f64, LinearError> {
    let denominator = rate + lambda * sigma;
    if !denominator.is_finite() || denominator <= 0.0 {
        return Err(LinearError { denominator });
    }
    Ok(denominator.recip())
}

/// The linear psychological anchor for one coefficient `λ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearAnchor {
    pub rate: f64,
    pub lambda: f64,
}

impl Model for LinearAnchor {
    type Input = f64;
    type Output = f64;
    type Error = LinearError;

    fn call(&self, sigma: &f64) -> Result<f64, LinearError> {
        solve_linear(*sigma, self.rate, self.lambda)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn matches_closed_form() {
        assert_relative_eq!(solve_linear(0.5, 0.018, 0.2).unwrap(), 1.0 / 0.118);
        assert_relative_eq!(solve_linear(0.0, 0.04, 0.3).unwrap(), 25.0);
    }

    #[test]
    fn strictly_decreasing_in_lambda() {
        for sigma in [0.05, 0.2, 0.45, 0.63] {
            let horizons: Vec<f64> = [0.1, 0.2, 0.25, 0.3, 0.5]
                .iter()
                .map(|&lambda| solve_linear(sigma, 0.018, lambda).unwrap())
                .collect();
            assert!(horizons.windows(2).all(|pair| pair[1] < pair[0]));
        }
    }

    #[test]
    fn guards_the_denominator() {
        assert_eq!(
            solve_linear(0.5, 0.0, 0.0),
            Err(LinearError { denominator: 0.0 })
        );
        assert!(solve_linear(1.0, 0.02, -0.04).is_err());
        assert!(solve_linear(f64::NAN, 0.02, 0.2).is_err());
    }

    #[test]
    fn anchor_uses_its_coefficient() {
        let anchor = LinearAnchor {
            rate: 0.018,
            lambda: 0.25,
        };
        assert_relative_eq!(
            anchor.call(&0.4).unwrap(),
            solve_linear(0.4, 0.018, 0.25).unwrap()
        );
    }
}
