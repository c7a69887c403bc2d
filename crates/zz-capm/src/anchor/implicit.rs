use std::convert::Infallible;

use log::{debug, trace, warn};
use thiserror::Error;

use rate_core::{EquationProblem, Model};
use rate_solvers::equation::{
    EvalError,
    bisection::{self, Action, Event, Status},
    evaluate,
};

use crate::{
    config::SolverSettings,
    premium::{DomainError, Premium, PremiumInput, RiskPremium},
};

use super::Horizon;

/// Lower end of every horizon bracket, in years.
pub const N_LO: f64 = 1e-8;

/// Number of times the upper end of the horizon bracket may be doubled.
pub const MAX_EXPANSIONS: usize = 64;

/// How much tighter than the configured tolerance [`ExactAnchor`] solves `n`.
const ANCHOR_TOL_RATIO: f64 = 1e-2;

/// The self-consistency residual `f(n) = n·(r + c(σ, n)) − 1`.
///
/// Evaluated as `n·r + n·c`, with `n·c` taken directly from the log-loss so
/// the residual stays well conditioned as `n → 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfConsistency {
    pub sigma: f64,
    pub rate: f64,
}

impl EquationProblem<1> for SelfConsistency {
    type Input = PremiumInput;
    type Output = Premium;
    type Error = Infallible;

    fn input(&self, x: &[f64; 1]) -> Result<PremiumInput, Self::Error> {
        Ok(PremiumInput {
            sigma: self.sigma,
            horizon: x[0],
        })
    }

    fn residuals(&self, input: &PremiumInput, output: &Premium) -> Result<[f64; 1], Self::Error> {
        Ok([input.horizon * self.rate + output.log_loss - 1.0])
    }
}

/// The outcome of solving the self-consistency equation at one volatility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPointResult {
    /// The psychological anchor `n`.
    pub n: f64,
    /// False when the iteration limit was hit before the tolerance.
    pub converged: bool,
    /// Bisection iterations performed.
    pub iterations: usize,
    /// `f(n)` at the reported horizon.
    pub residual: f64,
}

impl Horizon for FixedPointResult {
    fn years(&self) -> f64 {
        self.n
    }

    fn converged(&self) -> bool {
        self.converged
    }
}

/// Errors from the implicit anchor solver.
#[derive(Debug, Error)]
pub enum ImplicitError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("no sign change for n in [{lo}, {hi}] after {expansions} expansions")]
    BracketingFailure { lo: f64, hi: f64, expansions: usize },

    #[error("bisection failed")]
    Solver(#[source] bisection::Error),
}

impl ImplicitError {
    /// Unwraps domain errors the solver boxed as model failures.
    fn from_solver(error: bisection::Error) -> Self {
        match error {
            bisection::Error::Model(source) => match source.downcast::<DomainError>() {
                Ok(domain) => Self::Domain(*domain),
                Err(source) => Self::Solver(bisection::Error::Model(source)),
            },
            other => Self::Solver(other),
        }
    }
}

/// Solves `n = 1/(r + c(σ, n))` for the psychological anchor.
///
/// The fixed point is found as the root of [`SelfConsistency`] by bisection
/// on `[N_LO, n_hi]`. `n_hi` starts at `1/r` (the zero-volatility answer)
/// and doubles until `f(n_hi) ≥ 0`, at most [`MAX_EXPANSIONS`] times.
///
/// `tol` is an absolute tolerance on `n`, measured against the root of the
/// residual as evaluated. The tail probability comes from `statrs`' `erfc`,
/// whose relative error is around `1e-10`, so the computed root can differ
/// from the exact-arithmetic one by a few `1e-9` years whatever `tol` is.
///
/// Reaching `max_iter` first is not an error: the best estimate is returned
/// with `converged = false`.
///
/// # Errors
///
/// - [`ImplicitError::InvalidInput`] for negative `σ`, non-positive `r` or
///   `tol`, or a zero iteration limit.
/// - [`ImplicitError::Domain`] if the risk premium is undefined at a point
///   the solver has to evaluate.
/// - [`ImplicitError::BracketingFailure`] if no sign change is found.
pub fn solve(
    sigma: f64,
    rate: f64,
    tol: f64,
    max_iter: usize,
) -> Result<FixedPointResult, ImplicitError> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(ImplicitError::InvalidInput("sigma must be finite and non-negative"));
    }
    if !rate.is_finite() || rate <= 0.0 {
        return Err(ImplicitError::InvalidInput("rate must be finite and positive"));
    }
    if !tol.is_finite() || tol <= 0.0 {
        return Err(ImplicitError::InvalidInput("tol must be finite and positive"));
    }
    if max_iter == 0 {
        return Err(ImplicitError::InvalidInput("max_iter must be at least one"));
    }

    let problem = SelfConsistency { sigma, rate };
    let bracket = bracket_horizon(&problem)?;

    // f is increasing in n with slope at least r, so |f| <= tol * r puts n
    // within tol of the root of the evaluated f.
    let config = bisection::Config::new(max_iter, tol, 0.0, tol * rate)
        .map_err(|error| ImplicitError::Solver(error.into()))?;

    let observer = |event: &Event<'_, RiskPremium, SelfConsistency>| -> Option<Action> {
        if let (Some(iter), Some(residual)) = (event.iter(), event.residual()) {
            trace!("sigma={sigma} iter={iter} n={} f={residual:e}", event.x());
        }
        None
    };

    let solution = bisection::solve(&RiskPremium, &problem, bracket, &config, observer)
        .map_err(ImplicitError::from_solver)?;

    let converged = solution.status == Status::Converged;
    if !converged {
        warn!(
            "anchor at sigma={sigma} not converged after {} iterations: n={}, f={:e}, width {:e}",
            solution.iters,
            solution.x,
            solution.residual,
            solution.bracket_width()
        );
    }

    Ok(FixedPointResult {
        n: solution.x,
        converged,
        iterations: solution.iters,
        residual: solution.residual,
    })
}

/// Finds `[N_LO, n_hi]` with `f(N_LO) < 0 ≤ f(n_hi)`.
fn bracket_horizon(problem: &SelfConsistency) -> Result<[f64; 2], ImplicitError> {
    let lo = N_LO;
    if residual_at(problem, lo)? >= 0.0 {
        return Err(ImplicitError::BracketingFailure {
            lo,
            hi: lo,
            expansions: 0,
        });
    }

    let mut hi = problem.rate.recip();
    let mut expansions = 0;
    loop {
        if residual_at(problem, hi)? >= 0.0 {
            debug!(
                "bracketed anchor at sigma={} in [{lo}, {hi}] after {expansions} expansions",
                problem.sigma
            );
            return Ok([lo, hi]);
        }
        if expansions == MAX_EXPANSIONS {
            return Err(ImplicitError::BracketingFailure { lo, hi, expansions });
        }
        hi *= 2.0;
        expansions += 1;
    }
}

fn residual_at(problem: &SelfConsistency, horizon: f64) -> Result<f64, ImplicitError> {
    match evaluate(&RiskPremium, problem, [horizon]) {
        Ok(eval) => Ok(eval.residual()),
        Err(EvalError::Model(error)) => Err(error.into()),
        Err(error) => Err(ImplicitError::Solver(error.into())),
    }
}

/// The exact (nonlinear) psychological anchor.
///
/// Its output carries the convergence flag of each solve, so searches built
/// on it can tell when a horizon stopped at the iteration limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExactAnchor {
    pub rate: f64,
    pub tol: f64,
    pub max_iters: usize,
}

impl ExactAnchor {
    /// Creates an anchor for rate `r` using the shared solver settings.
    ///
    /// Horizons are solved to `settings.tol / 100`, which keeps their error
    /// well inside an equilibrium gap tolerance of `settings.tol`.
    #[must_use]
    pub fn new(rate: f64, settings: &SolverSettings) -> Self {
        Self {
            rate,
            tol: settings.tol * ANCHOR_TOL_RATIO,
            max_iters: settings.max_iters,
        }
    }
}

impl Model for ExactAnchor {
    type Input = f64;
    type Output = FixedPointResult;
    type Error = ImplicitError;

    fn call(&self, sigma: &f64) -> Result<FixedPointResult, ImplicitError> {
        solve(*sigma, self.rate, self.tol, self.max_iters)
    }
}
