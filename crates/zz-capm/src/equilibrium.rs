//! Equilibrium search between a psychological and a physical anchor.
//!
//! The gap `n(σ) − E[T](σ)` is sampled on a uniform grid strictly inside
//! `(0, σ_max)`. The first sign change found is refined with bisection until
//! `|gap| ≤ tol`.

use std::{convert::Infallible, error::Error as StdError};

use log::{debug, trace, warn};
use serde::Serialize;
use thiserror::Error;

use rate_core::{EquationProblem, Model};
use rate_solvers::equation::{
    bisection::{self, Action, Event, Sign, Status},
    evaluate,
};

use crate::{anchor::Horizon, config::SolverSettings};

/// Settings for [`find_equilibrium`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    samples: usize,
    tol: f64,
    max_iters: usize,
}

/// Errors that can occur when validating a [`SearchConfig`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SearchConfigError {
    #[error("at least two samples are required, got {0}")]
    Samples(usize),

    #[error("tol must be finite and positive, got {0}")]
    Tolerance(f64),
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            samples: 500,
            tol: 1e-9,
            max_iters: 100,
        }
    }
}

impl SearchConfig {
    /// Creates a validated search config.
    ///
    /// # Errors
    ///
    /// Returns an error for fewer than two samples or a non-positive `tol`.
    pub fn new(samples: usize, tol: f64, max_iters: usize) -> Result<Self, SearchConfigError> {
        if samples < 2 {
            return Err(SearchConfigError::Samples(samples));
        }
        if !tol.is_finite() || tol <= 0.0 {
            return Err(SearchConfigError::Tolerance(tol));
        }
        Ok(Self {
            samples,
            tol,
            max_iters,
        })
    }

    /// Builds a search config from the shared solver settings.
    ///
    /// # Errors
    ///
    /// See [`SearchConfig::new`].
    pub fn from_settings(settings: &SolverSettings) -> Result<Self, SearchConfigError> {
        Self::new(settings.samples, settings.tol, settings.max_iters)
    }

    /// Returns the number of interior sample points.
    #[must_use]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Returns the tolerance on the gap `|n(σ*) − E[T](σ*)|`.
    #[must_use]
    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Returns the bisection iteration limit.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }
}

/// The volatility where the two anchors agree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquilibriumPoint {
    /// Equilibrium volatility `σ*`.
    pub sigma_star: f64,
    /// Psychological anchor at `σ*`.
    pub n_star: f64,
    /// Physical anchor at `σ*`.
    pub expected_time: f64,
    /// True only if `|n_star − expected_time| ≤ tol` and every anchor
    /// evaluated during refinement converged.
    pub converged: bool,
}

/// Errors from [`find_equilibrium`].
#[derive(Debug, Error)]
pub enum EquilibriumError {
    #[error("the anchors do not cross in (0, {sigma_max})")]
    NoEquilibriumFound { sigma_max: f64 },

    #[error("search domain (0, {sigma_max}) is empty or unbounded")]
    InvalidDomain { sigma_max: f64 },

    #[error("no anchor evaluation succeeded; first failure at sigma = {sigma}")]
    NoValidSample {
        sigma: f64,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("refinement failed")]
    Refinement(#[source] bisection::Error),
}

/// Both anchors evaluated at one volatility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPair {
    pub psychological: f64,
    pub physical: f64,
    /// Both anchors were computed to tolerance.
    pub converged: bool,
}

/// Failure of one of the two anchors.
#[derive(Debug, Error)]
pub enum PairError<PE, QE> {
    #[error("psychological anchor failed")]
    Psychological(#[source] PE),

    #[error("physical anchor failed")]
    Physical(#[source] QE),
}

/// Evaluates a psychological and a physical anchor side by side.
pub struct Anchors<'a, Psy, Phy> {
    psychological: &'a Psy,
    physical: &'a Phy,
}

impl<Psy, Phy> Model for Anchors<'_, Psy, Phy>
where
    Psy: Model<Input = f64>,
    Psy::Output: Horizon,
    Phy: Model<Input = f64>,
    Phy::Output: Horizon,
{
    type Input = f64;
    type Output = AnchorPair;
    type Error = PairError<Psy::Error, Phy::Error>;

    fn call(&self, sigma: &f64) -> Result<AnchorPair, Self::Error> {
        let psychological = self
            .psychological
            .call(sigma)
            .map_err(PairError::Psychological)?;
        let physical = self.physical.call(sigma).map_err(PairError::Physical)?;
        Ok(AnchorPair {
            psychological: psychological.years(),
            physical: physical.years(),
            converged: psychological.converged() && physical.converged(),
        })
    }
}

/// Residual `n(σ) − E[T](σ)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crossing;

impl EquationProblem<1> for Crossing {
    type Input = f64;
    type Output = AnchorPair;
    type Error = Infallible;

    fn input(&self, x: &[f64; 1]) -> Result<f64, Self::Error> {
        Ok(x[0])
    }

    fn residuals(&self, _sigma: &f64, pair: &AnchorPair) -> Result<[f64; 1], Self::Error> {
        Ok([pair.psychological - pair.physical])
    }
}

/// Finds `σ*` in `(0, σ_max)` where `psychological(σ*) ≈ physical(σ*)`.
///
/// Samples the gap at `config.samples()` evenly spaced interior points and
/// refines the first sign change by bisection. Points where either anchor
/// fails are skipped.
///
/// Refinement stops only on the gap, so a converged point always satisfies
/// `|n_star − expected_time| ≤ config.tol()`. If the iteration limit is hit
/// first, or an anchor reports a non-converged horizon, the best point is
/// still returned with `converged = false`.
///
/// # Errors
///
/// - [`EquilibriumError::NoEquilibriumFound`] if no sign change is sampled.
/// - [`EquilibriumError::NoValidSample`] if every sample failed.
/// - [`EquilibriumError::InvalidDomain`] if `σ_max` is not finite and positive.
/// - [`EquilibriumError::Refinement`] if an anchor fails inside the bracket.
pub fn find_equilibrium<Psy, Phy>(
    psychological: &Psy,
    physical: &Phy,
    sigma_max: f64,
    config: &SearchConfig,
) -> Result<EquilibriumPoint, EquilibriumError>
where
    Psy: Model<Input = f64>,
    Psy::Output: Horizon,
    Phy: Model<Input = f64>,
    Phy::Output: Horizon,
{
    if !sigma_max.is_finite() || sigma_max <= 0.0 {
        return Err(EquilibriumError::InvalidDomain { sigma_max });
    }

    let anchors = Anchors {
        psychological,
        physical,
    };

    let Some(bracket) = bracket_crossing(&anchors, sigma_max, config.samples())? else {
        return Err(EquilibriumError::NoEquilibriumFound { sigma_max });
    };
    debug!("anchors cross in sigma [{}, {}]", bracket[0], bracket[1]);

    let solver = bisection::Config::new(config.max_iters(), 0.0, 0.0, config.tol())
        .map_err(|error| EquilibriumError::Refinement(error.into()))?;

    let mut anchors_converged = true;
    let observer = |event: &Event<'_, Anchors<'_, Psy, Phy>, Crossing>| -> Option<Action> {
        if let Ok(eval) = event.result() {
            anchors_converged &= eval.snapshot.output.converged;
            trace!(
                "equilibrium step sigma={} gap={:e}",
                event.x(),
                eval.residual()
            );
        }
        None
    };

    let solution = bisection::solve(&anchors, &Crossing, bracket, &solver, observer)
        .map_err(EquilibriumError::Refinement)?;

    let pair = solution.snapshot.output;
    let gap = pair.psychological - pair.physical;
    let converged =
        solution.status == Status::Converged && gap.abs() <= config.tol() && anchors_converged;
    if !converged {
        warn!(
            "equilibrium at sigma={} not converged: gap={gap:e}, anchors ok: {anchors_converged}",
            solution.x
        );
    }

    Ok(EquilibriumPoint {
        sigma_star: solution.x,
        n_star: pair.psychological,
        expected_time: pair.physical,
        converged,
    })
}

/// Returns the first sampled interval over which the gap changes sign.
fn bracket_crossing<Psy, Phy>(
    anchors: &Anchors<'_, Psy, Phy>,
    sigma_max: f64,
    samples: usize,
) -> Result<Option<[f64; 2]>, EquilibriumError>
where
    Psy: Model<Input = f64>,
    Psy::Output: Horizon,
    Phy: Model<Input = f64>,
    Phy::Output: Horizon,
{
    #[allow(clippy::cast_precision_loss)]
    let step = sigma_max / (samples + 1) as f64;

    let mut previous: Option<(f64, Sign)> = None;
    let mut first_failure = None;

    for i in 1..=samples {
        #[allow(clippy::cast_precision_loss)]
        let sigma = step * i as f64;

        let gap = match evaluate(anchors, &Crossing, [sigma]) {
            Ok(eval) => eval.residual(),
            Err(error) => {
                trace!("skipping sigma={sigma}: {error}");
                first_failure.get_or_insert((sigma, error));
                continue;
            }
        };

        let sign = Sign::of(gap);
        if let Some((last_sigma, last_sign)) = previous {
            if last_sign != sign {
                return Ok(Some([last_sigma, sigma]));
            }
        }
        previous = Some((sigma, sign));
    }

    match (previous, first_failure) {
        (None, Some((sigma, error))) => Err(EquilibriumError::NoValidSample {
            sigma,
            source: Box::new(error),
        }),
        _ => Ok(None),
    }
}

/// Adapts a closure `σ → Result<f64, E>` into an anchor [`Model`].
///
/// ```
/// use rate_zz_capm::equilibrium::FnAnchor;
/// use rate_core::Model;
///
/// let flat = FnAnchor(|_sigma: f64| Ok::<_, std::convert::Infallible>(4.0));
/// assert_eq!(flat.call(&0.3).unwrap(), 4.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnAnchor<F>(pub F);

impl<F, E> Model for FnAnchor<F>
where
    F: Fn(f64) -> Result<f64, E>,
    E: StdError + Send + Sync + 'static,
{
    type Input = f64;
    type Output = f64;
    type Error = E;

    fn call(&self, sigma: &f64) -> Result<f64, E> {
        (self.0)(*sigma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::anchor::{ExactAnchor, LinearAnchor, PhysicalAnchor, PhysicalError, sigma_max};

    const BASELINE: PhysicalAnchor = PhysicalAnchor {
        growth: 0.20,
        multiple: 2.0,
    };

    #[derive(Debug, Error)]
    #[error("undefined below {0}")]
    struct Undefined(f64);

    fn ok(value: f64) -> Result<f64, Infallible> {
        Ok(value)
    }

    #[test]
    fn finds_crossing_of_straight_lines() {
        // 2 - σ meets σ at σ = 1.
        let falling = FnAnchor(|sigma: f64| ok(2.0 - sigma));
        let rising = FnAnchor(|sigma: f64| ok(sigma));

        let point = find_equilibrium(&falling, &rising, 3.0, &SearchConfig::default())
            .expect("should cross");

        assert!(point.converged);
        assert_relative_eq!(point.sigma_star, 1.0, epsilon = 1e-8);
        assert_relative_eq!(point.n_star, 1.0, epsilon = 1e-8);
        assert_relative_eq!(point.expected_time, 1.0, epsilon = 1e-8);
    }

    #[test]
    fn reports_missing_crossing() {
        let high = FnAnchor(|_sigma: f64| ok(10.0));
        let low = FnAnchor(|sigma: f64| ok(sigma));

        let result = find_equilibrium(&high, &low, 1.0, &SearchConfig::default());
        assert!(matches!(
            result,
            Err(EquilibriumError::NoEquilibriumFound { .. })
        ));
    }

    #[test]
    fn skips_undefined_samples() {
        // Undefined below 0.3; the crossing at 0.5 is still found.
        let partial = FnAnchor(|sigma: f64| {
            if sigma < 0.3 {
                Err(Undefined(0.3))
            } else {
                Ok(1.0 - sigma)
            }
        });
        let rising = FnAnchor(|sigma: f64| ok(sigma));

        let point = find_equilibrium(&partial, &rising, 1.0, &SearchConfig::default())
            .expect("should cross");
        assert_relative_eq!(point.sigma_star, 0.5, epsilon = 1e-8);
    }

    #[test]
    fn reports_when_nothing_evaluates() {
        let broken = FnAnchor(|_sigma: f64| Err::<f64, _>(Undefined(f64::INFINITY)));
        let rising = FnAnchor(|sigma: f64| ok(sigma));

        let result = find_equilibrium(&broken, &rising, 1.0, &SearchConfig::default());
        assert!(matches!(result, Err(EquilibriumError::NoValidSample { .. })));
    }

    #[test]
    fn rejects_bad_domain() {
        let line = FnAnchor(|sigma: f64| ok(sigma));
        for sigma_max in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                find_equilibrium(&line, &line, sigma_max, &SearchConfig::default()),
                Err(EquilibriumError::InvalidDomain { .. })
            ));
        }
    }

    #[test]
    fn linear_equilibrium_stays_below_meltdown() {
        let sigma_max = sigma_max(0.20);
        let physical = PhysicalAnchor {
            growth: 0.20,
            multiple: 2.0,
        };
        let linear = LinearAnchor {
            rate: 0.018,
            lambda: 0.20,
        };

        let point = find_equilibrium(&linear, &physical, sigma_max, &SearchConfig::default())
            .expect("should cross");

        assert!(point.sigma_star > 0.0 && point.sigma_star < sigma_max);
        assert_relative_eq!(point.sigma_star, 0.489_275_669_820_882, epsilon = 1e-6);
    }

    #[test]
    fn converged_linear_points_meet_gap_tolerance() {
        let config = SearchConfig::default();
        for lambda in [0.20, 0.25, 0.30] {
            let linear = LinearAnchor {
                rate: 0.018,
                lambda,
            };
            let point = find_equilibrium(&linear, &BASELINE, sigma_max(0.20), &config).unwrap();

            assert!(point.converged);
            let gap = (point.n_star - point.expected_time).abs();
            assert!(gap <= config.tol(), "lambda={lambda} gap={gap:e}");
        }
    }

    #[test]
    fn converged_exact_point_meets_gap_tolerance() {
        let settings = SolverSettings::default();
        let config = SearchConfig::from_settings(&settings).unwrap();
        for rate in [0.018, 0.04] {
            let exact = ExactAnchor::new(rate, &settings);
            let point = find_equilibrium(&exact, &BASELINE, sigma_max(0.20), &config).unwrap();

            assert!(point.converged);
            let gap = (point.n_star - point.expected_time).abs();
            assert!(gap <= config.tol(), "rate={rate} gap={gap:e}");
        }
    }

    #[test]
    fn iteration_limit_is_not_reported_as_converged() {
        let linear = LinearAnchor {
            rate: 0.018,
            lambda: 0.20,
        };
        let config = SearchConfig::new(500, 1e-9, 5).unwrap();
        let point = find_equilibrium(&linear, &BASELINE, sigma_max(0.20), &config).unwrap();

        assert!(!point.converged);
        assert_relative_eq!(point.sigma_star, 0.489_275_669_820_882, epsilon = 1e-3);
    }

    #[test]
    fn non_converged_anchor_marks_point() {
        let settings = SolverSettings {
            max_iters: 5,
            ..SolverSettings::default()
        };
        let exact = ExactAnchor::new(0.018, &settings);
        let config = SearchConfig::default();
        let point = find_equilibrium(&exact, &BASELINE, sigma_max(0.20), &config)
            .expect("estimate is still returned");

        assert!(!point.converged);
        assert!(point.sigma_star > 0.0 && point.sigma_star < sigma_max(0.20));
    }

    #[test]
    fn physical_anchor_is_never_evaluated_past_meltdown() {
        let sigma_max = sigma_max(0.20);
        let physical = FnAnchor(|sigma: f64| {
            assert!(sigma < sigma_max);
            PhysicalAnchor {
                growth: 0.20,
                multiple: 2.0,
            }
            .call(&sigma)
        });
        let flat = FnAnchor(|_sigma: f64| Ok::<_, PhysicalError>(8.0));

        let point = find_equilibrium(&flat, &physical, sigma_max, &SearchConfig::default())
            .expect("should cross");
        assert_relative_eq!(point.expected_time, 8.0, epsilon = 1e-6);
        assert_relative_eq!(point.sigma_star, 0.476_144_100_940_055, epsilon = 1e-8);
    }

    #[test]
    fn search_config_validation() {
        assert_eq!(SearchConfig::new(1, 1e-9, 10), Err(SearchConfigError::Samples(1)));
        assert_eq!(
            SearchConfig::new(10, 0.0, 10),
            Err(SearchConfigError::Tolerance(0.0))
        );
        let config = SearchConfig::from_settings(&SolverSettings::default()).unwrap();
        assert_eq!(config, SearchConfig::default());
    }
}
