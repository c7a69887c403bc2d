use thiserror::Error;

/// Errors that can occur when creating a [`Bracket`] or validating bounds.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BracketError {
    /// One or both endpoints are non-finite.
    #[error("non-finite endpoint(s)")]
    NonFinite,
    /// Endpoints are equal.
    #[error("zero width")]
    ZeroWidth,
    /// Residual signs at the endpoints are the same.
    #[error("no sign change")]
    NoSignChange,
}

/// The sign of a residual, as used for bracket updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// Residual is positive or zero.
    Positive,
    /// Residual is negative.
    Negative,
}

impl Sign {
    /// Returns the sign of a residual value.
    #[must_use]
    pub fn of(value: f64) -> Self {
        if value >= 0.0 {
            Sign::Positive
        } else {
            Sign::Negative
        }
    }
}

/// A search interval whose endpoint residuals have opposite signs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    left: f64,
    right: f64,
    left_sign: Sign,
}

impl Bracket {
    /// Creates a bracket from validated bounds and the endpoint signs.
    ///
    /// # Errors
    ///
    /// Returns `BracketError::NoSignChange` if the signs are equal.
    pub(super) fn new(
        bounds: Bounds,
        left_sign: Sign,
        right_sign: Sign,
    ) -> Result<Self, BracketError> {
        if left_sign == right_sign {
            return Err(BracketError::NoSignChange);
        }

        Ok(Self {
            left: bounds.left,
            right: bounds.right,
            left_sign,
        })
    }

    /// Returns the bracket bounds as `[left, right]`.
    #[must_use]
    pub fn as_array(&self) -> [f64; 2] {
        [self.left, self.right]
    }

    /// Returns the midpoint of the bracket.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.left + self.right)
    }

    /// Returns the bracket width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Returns true if the width satisfies `x_abs_tol + x_rel_tol * |mid|`.
    #[must_use]
    pub fn is_x_converged(&self, x_abs_tol: f64, x_rel_tol: f64) -> bool {
        self.width() <= x_abs_tol + x_rel_tol * self.midpoint().abs()
    }

    /// Replaces the endpoint that shares `sign` with `x`.
    pub(super) fn shrink(&mut self, x: f64, sign: Sign) {
        if sign == self.left_sign {
            self.left = x;
        } else {
            self.right = x;
        }
    }
}

/// Ordered finite bounds for a bracket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Bounds {
    left: f64,
    right: f64,
}

impl Bounds {
    /// Validates and orders the endpoints.
    ///
    /// # Errors
    ///
    /// Returns `BracketError` if an endpoint is non-finite or the width is zero.
    pub(super) fn new(bracket: [f64; 2]) -> Result<Self, BracketError> {
        let [a, b] = bracket;

        if !a.is_finite() || !b.is_finite() {
            return Err(BracketError::NonFinite);
        }

        #[allow(clippy::float_cmp)]
        if a == b {
            return Err(BracketError::ZeroWidth);
        }

        Ok(Self {
            left: a.min(b),
            right: a.max(b),
        })
    }

    pub(super) fn as_array(&self) -> [f64; 2] {
        [self.left, self.right]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn bounds_are_ordered() {
        let [left, right] = Bounds::new([4.0, -1.0]).expect("valid bounds").as_array();
        assert_relative_eq!(left, -1.0);
        assert_relative_eq!(right, 4.0);
    }

    #[test]
    fn bounds_reject_bad_endpoints() {
        assert_eq!(Bounds::new([0.0, f64::NAN]), Err(BracketError::NonFinite));
        assert_eq!(
            Bounds::new([f64::NEG_INFINITY, 0.0]),
            Err(BracketError::NonFinite)
        );
        assert_eq!(Bounds::new([0.5, 0.5]), Err(BracketError::ZeroWidth));
    }

    #[test]
    fn bracket_requires_sign_change() {
        let bounds = Bounds::new([0.0, 1.0]).expect("valid bounds");
        assert_eq!(
            Bracket::new(bounds, Sign::Negative, Sign::Negative),
            Err(BracketError::NoSignChange)
        );
    }

    #[test]
    fn shrink_keeps_sign_change() {
        let bounds = Bounds::new([0.0, 8.0]).expect("valid bounds");
        let mut bracket = Bracket::new(bounds, Sign::Positive, Sign::Negative).expect("bracket");

        bracket.shrink(4.0, Sign::Negative);
        assert_eq!(bracket.as_array(), [0.0, 4.0]);

        bracket.shrink(2.0, Sign::Positive);
        assert_eq!(bracket.as_array(), [2.0, 4.0]);
        assert_relative_eq!(bracket.midpoint(), 3.0);
        assert_relative_eq!(bracket.width(), 2.0);
    }

    #[test]
    fn x_convergence_uses_both_tolerances() {
        let bounds = Bounds::new([99.0, 101.0]).expect("valid bounds");
        let bracket = Bracket::new(bounds, Sign::Negative, Sign::Positive).expect("bracket");

        assert!(!bracket.is_x_converged(1.0, 0.0));
        assert!(bracket.is_x_converged(1.0, 0.01));
        assert!(bracket.is_x_converged(2.0, 0.0));
    }
}
