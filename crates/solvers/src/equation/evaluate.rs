use thiserror::Error;

use rate_core::{EquationProblem, Model, Snapshot};

/// A successful evaluation of an equation problem.
///
/// Every residual is finite; [`evaluate`] reports anything else as
/// [`EvalError::NonFinite`].
#[derive(Debug, Clone)]
pub struct Evaluation<I, O, const N: usize> {
    pub x: [f64; N],
    pub residuals: [f64; N],
    pub snapshot: Snapshot<I, O>,
}

impl<I, O> Evaluation<I, O, 1> {
    /// Returns the residual of a scalar problem.
    #[must_use]
    pub fn residual(&self) -> f64 {
        self.residuals[0]
    }
}

/// Why an evaluation at `x` produced no usable residuals.
#[derive(Debug, Error)]
pub enum EvalError<ME, PE, const N: usize = 1> {
    #[error("model call failed")]
    Model(#[source] ME),

    #[error("problem mapping failed")]
    Problem(#[source] PE),

    /// The model ran but the residuals contain a NaN or an infinity.
    #[error("non-finite residuals {residuals:?} at x = {x:?}")]
    NonFinite { x: [f64; N], residuals: [f64; N] },
}

/// Type alias for the result of [`evaluate`].
pub type EvaluateResult<M, P, const N: usize> = Result<
    Evaluation<<M as Model>::Input, <M as Model>::Output, N>,
    EvalError<<M as Model>::Error, <P as EquationProblem<N>>::Error, N>,
>;

/// Evaluates `model` at the solver variables `x` of `problem`.
///
/// # Errors
///
/// Fails if the problem cannot map `x`, the model call fails, or any residual
/// is not finite.
pub fn evaluate<M, P, const N: usize>(
    model: &M,
    problem: &P,
    x: [f64; N],
) -> EvaluateResult<M, P, N>
where
    M: Model,
    P: EquationProblem<N, Input = M::Input, Output = M::Output>,
{
    let input = problem.input(&x).map_err(EvalError::Problem)?;
    let output = model.call(&input).map_err(EvalError::Model)?;
    let residuals = problem
        .residuals(&input, &output)
        .map_err(EvalError::Problem)?;

    if residuals.iter().any(|residual| !residual.is_finite()) {
        return Err(EvalError::NonFinite { x, residuals });
    }

    Ok(Evaluation {
        x,
        residuals,
        snapshot: Snapshot::new(input, output),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    /// Reciprocal, failing at zero.
    struct Recip;

    #[derive(Debug, Error)]
    #[error("division by zero")]
    struct DivByZero;

    impl Model for Recip {
        type Input = f64;
        type Output = f64;
        type Error = DivByZero;

        fn call(&self, x: &f64) -> Result<f64, DivByZero> {
            if *x == 0.0 {
                return Err(DivByZero);
            }
            Ok(x.recip())
        }
    }

    /// Residual `scale * output`.
    struct Scaled(f64);

    impl EquationProblem<1> for Scaled {
        type Input = f64;
        type Output = f64;
        type Error = Infallible;

        fn input(&self, x: &[f64; 1]) -> Result<f64, Infallible> {
            Ok(x[0])
        }

        fn residuals(&self, _input: &f64, output: &f64) -> Result<[f64; 1], Infallible> {
            Ok([self.0 * output])
        }
    }

    #[test]
    fn captures_snapshot() {
        let eval = evaluate(&Recip, &Scaled(3.0), [4.0]).unwrap();
        assert_eq!(eval.x, [4.0]);
        assert_eq!(eval.residual(), 0.75);
        assert_eq!(eval.snapshot, Snapshot::new(4.0, 0.25));
    }

    #[test]
    fn model_failure() {
        assert!(matches!(
            evaluate(&Recip, &Scaled(1.0), [0.0]),
            Err(EvalError::Model(DivByZero))
        ));
    }

    #[test]
    fn non_finite_residual() {
        let result = evaluate(&Recip, &Scaled(f64::INFINITY), [2.0]);
        assert!(matches!(
            result,
            Err(EvalError::NonFinite { x, residuals }) if x == [2.0] && residuals[0].is_infinite()
        ));
    }
}
