use crate::equation::Evaluation;

use super::{Error, Solution, Status};

/// Tracks the evaluation with the smallest residual magnitude.
///
/// Empty until the first successful evaluation.
pub(super) struct Best<I, O> {
    eval: Option<Evaluation<I, O, 1>>,
}

impl<I, O> Best<I, O> {
    pub(super) fn empty() -> Self {
        Self { eval: None }
    }

    /// Keeps `eval` if its residual magnitude is strictly smaller.
    pub(super) fn update(&mut self, eval: Evaluation<I, O, 1>) {
        let improves = self
            .eval
            .as_ref()
            .is_none_or(|best| eval.residual().abs() < best.residual().abs());
        if improves {
            self.eval = Some(eval);
        }
    }

    /// Returns true if the best residual meets the tolerance.
    pub(super) fn is_residual_converged(&self, residual_tol: f64) -> bool {
        self.eval
            .as_ref()
            .is_some_and(|eval| eval.residual().abs() <= residual_tol)
    }

    /// Builds the solution from the best evaluation.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoSuccessfulEvaluation` if nothing was ever stored.
    pub(super) fn finish(
        self,
        status: Status,
        iters: usize,
        bracket: [f64; 2],
    ) -> Result<Solution<I, O>, Error> {
        let eval = self.eval.ok_or(Error::NoSuccessfulEvaluation)?;
        Ok(Solution {
            status,
            x: eval.x[0],
            residual: eval.residual(),
            snapshot: eval.snapshot,
            iters,
            bracket,
        })
    }
}
