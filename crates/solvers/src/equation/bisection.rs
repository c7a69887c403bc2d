//! Bisection for scalar equation problems.
//!
//! # Algorithm
//!
//! Bisection repeatedly halves an interval whose endpoint residuals have
//! opposite signs, keeping the half that still brackets a root. It needs no
//! derivative and converges for any continuous residual once a valid bracket
//! is known, which makes it the method of choice near steep or poorly
//! conditioned regions.
//!
//! # Observer Events
//!
//! The solver emits one [`Event`] per evaluation: [`Event::Left`] and
//! [`Event::Right`] for the endpoints, then [`Event::Midpoint`] per iteration.
//! Observers can return [`Action::Stop`] to halt with the best point so far,
//! or [`Action::Assume`] to keep iterating past a failed evaluation.
//!
//! # Convergence
//!
//! The solver returns [`Status::Converged`] when the residual magnitude meets
//! `residual_tol` or the bracket width meets `x_abs_tol + x_rel_tol * |mid|`.
//! If `max_iters` runs out first the best evaluation is returned with
//! [`Status::MaxIters`].

mod action;
mod best;
mod bracket;
mod config;
mod decision;
mod error;
mod event;
mod solution;

pub use action::Action;
pub use bracket::{Bracket, BracketError, Sign};
pub use config::{Config, ConfigError};
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status};

use rate_core::{EquationProblem, Model, Observer};

use crate::equation::{Evaluation, evaluate};

use best::Best;
use bracket::Bounds;
use decision::Decision;

/// Which point of the search is being evaluated.
enum Probe<'b> {
    Left,
    Right,
    Midpoint { iter: usize, bracket: &'b Bracket },
}

/// Finds a root of the equation problem using bisection.
///
/// The observer sees every evaluation; see the [module docs](self).
///
/// # Errors
///
/// Returns an error if the bracket is invalid or does not change sign, or if
/// an evaluation fails (or yields a non-finite residual) and the observer
/// does not recover with [`Action::Assume`].
pub fn solve<M, P, Obs>(
    model: &M,
    problem: &P,
    bracket: [f64; 2],
    config: &Config,
    mut observer: Obs,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model,
    P: EquationProblem<1, Input = M::Input, Output = M::Output>,
    Obs: for<'a> Observer<Event<'a, M, P>, Action>,
{
    let bounds = Bounds::new(bracket)?;
    let [left, right] = bounds.as_array();
    let mut best = Best::empty();

    let mut endpoint_signs = [Sign::Positive; 2];
    for (slot, (x, probe)) in [(left, Probe::Left), (right, Probe::Right)]
        .into_iter()
        .enumerate()
    {
        let (eval, decision) = probe_point(model, problem, &mut observer, x, probe);
        if let Some(eval) = eval {
            best.update(eval);
        }
        match decision {
            Decision::Continue(sign) => endpoint_signs[slot] = sign,
            Decision::StopEarly => {
                return best.finish(Status::StoppedByObserver, 0, bounds.as_array());
            }
            Decision::Error(error) => return Err(error),
        }
        if best.is_residual_converged(config.residual_tol()) {
            return best.finish(Status::Converged, 0, bounds.as_array());
        }
    }

    let [left_sign, right_sign] = endpoint_signs;
    let mut bracket = Bracket::new(bounds, left_sign, right_sign)?;

    for iter in 1..=config.max_iters() {
        let x = bracket.midpoint();
        let (eval, decision) = probe_point(
            model,
            problem,
            &mut observer,
            x,
            Probe::Midpoint {
                iter,
                bracket: &bracket,
            },
        );
        if let Some(eval) = eval {
            best.update(eval);
        }

        match decision {
            Decision::Continue(sign) => bracket.shrink(x, sign),
            Decision::StopEarly => {
                return best.finish(Status::StoppedByObserver, iter, bracket.as_array());
            }
            Decision::Error(error) => return Err(error),
        }

        if best.is_residual_converged(config.residual_tol())
            || bracket.is_x_converged(config.x_abs_tol(), config.x_rel_tol())
        {
            return best.finish(Status::Converged, iter, bracket.as_array());
        }
    }

    best.finish(Status::MaxIters, config.max_iters(), bracket.as_array())
}

/// Runs bisection with a no-op observer.
///
/// # Errors
///
/// See [`solve`].
pub fn solve_unobserved<M, P>(
    model: &M,
    problem: &P,
    bracket: [f64; 2],
    config: &Config,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model,
    P: EquationProblem<1, Input = M::Input, Output = M::Output>,
{
    solve(model, problem, bracket, config, ())
}

/// Evaluates `x`, shows the result to the observer, and decides what to do.
///
/// The evaluation is returned only if it may be reported as the solution.
fn probe_point<M, P, Obs>(
    model: &M,
    problem: &P,
    observer: &mut Obs,
    x: f64,
    probe: Probe<'_>,
) -> (Option<Evaluation<M::Input, M::Output, 1>>, Decision)
where
    M: Model,
    P: EquationProblem<1, Input = M::Input, Output = M::Output>,
    Obs: for<'a> Observer<Event<'a, M, P>, Action>,
{
    let result = evaluate(model, problem, [x]);

    let action = {
        let event = match probe {
            Probe::Left => Event::Left { x, result: &result },
            Probe::Right => Event::Right { x, result: &result },
            Probe::Midpoint { iter, bracket } => Event::Midpoint {
                iter,
                x,
                bracket,
                result: &result,
            },
        };
        observer.observe(&event)
    };

    let (eval, residual) = match result {
        Ok(eval) => {
            let residual = eval.residual();
            (Some(eval), Ok(residual))
        }
        Err(error) => (None, Err(Error::from(error))),
    };

    let substituted = action.and_then(Action::assumed_sign).is_some();
    let decision = Decision::new(action, residual);
    if substituted {
        return (None, decision);
    }
    (eval, decision)
}
