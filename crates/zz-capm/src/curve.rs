//! Anchor curves sampled over a volatility grid.
//!
//! Curves are for plotting and diagnostics. Points where an anchor is
//! undefined are kept as `None` so every curve shares the same grid.

use log::debug;
use rate_core::Model;
use serde::Serialize;
use thiserror::Error;

use crate::{
    anchor::{ExactAnchor, Horizon, LinearAnchor, PhysicalAnchor},
    config::{ConfigError, RunConfig},
};

/// Evenly spaced volatilities from `start` to `end` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SigmaGrid {
    start: f64,
    end: f64,
    points: usize,
}

/// Errors that can occur when building a [`SigmaGrid`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GridError {
    #[error("grid bounds must be finite, non-negative and increasing, got [{start}, {end}]")]
    Bounds { start: f64, end: f64 },

    #[error("a grid needs at least two points, got {0}")]
    Points(usize),
}

impl Default for SigmaGrid {
    fn default() -> Self {
        Self {
            start: 0.10,
            end: 0.65,
            points: 300,
        }
    }
}

impl SigmaGrid {
    /// Creates a grid.
    ///
    /// # Errors
    ///
    /// Returns a [`GridError`] for invalid bounds or fewer than two points.
    pub fn new(start: f64, end: f64, points: usize) -> Result<Self, GridError> {
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
            return Err(GridError::Bounds { start, end });
        }
        if points < 2 {
            return Err(GridError::Points(points));
        }
        Ok(Self { start, end, points })
    }

    /// Returns the number of grid points, always at least two.
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.points
    }

    /// Iterates over the grid volatilities.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        #[allow(clippy::cast_precision_loss)]
        let step = (self.end - self.start) / (self.points - 1) as f64;
        (0..self.points).map(move |i| {
            if i + 1 == self.points {
                self.end
            } else {
                #[allow(clippy::cast_precision_loss)]
                let offset = step * i as f64;
                self.start + offset
            }
        })
    }
}

/// A lazily evaluated `σ → horizon` curve.
#[derive(Debug, Clone, Copy)]
pub struct AnchorCurve<M> {
    anchor: M,
}

impl<M> AnchorCurve<M>
where
    M: Model<Input = f64>,
    M::Output: Horizon,
{
    pub fn new(anchor: M) -> Self {
        Self { anchor }
    }

    /// Evaluates the curve, or `None` where the anchor is undefined.
    pub fn at(&self, sigma: f64) -> Option<f64> {
        self.anchor
            .call(&sigma)
            .ok()
            .map(|horizon| horizon.years())
            .filter(|value| value.is_finite())
    }

    /// Yields `(σ, value)` for each grid point, evaluating on demand.
    pub fn sample<'a>(
        &'a self,
        grid: &'a SigmaGrid,
    ) -> impl Iterator<Item = (f64, Option<f64>)> + 'a {
        grid.iter().map(|sigma| (sigma, self.at(sigma)))
    }
}

/// Every anchor at one grid volatility.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveSample {
    pub sigma: f64,
    /// `E[T]`, absent at or beyond the meltdown volatility.
    pub physical: Option<f64>,
    pub exact: Option<f64>,
    /// One value per configured `λ`.
    pub linear: Vec<Option<f64>>,
    /// Time Paradox Index `E[T] − n`; positive where physical time exceeds
    /// investor patience.
    pub tpi: Option<f64>,
}

/// Samples every anchor of `config` over `grid`.
///
/// # Errors
///
/// Returns an error if `config` fails validation.
pub fn sample_curves(
    config: &RunConfig,
    grid: &SigmaGrid,
) -> Result<Vec<CurveSample>, ConfigError> {
    config.validate()?;
    let params = &config.params;

    let physical = AnchorCurve::new(PhysicalAnchor {
        growth: params.growth,
        multiple: params.multiple,
    });
    let exact = AnchorCurve::new(ExactAnchor::new(params.rate, &config.settings));
    let linear: Vec<_> = params
        .lambdas
        .iter()
        .map(|&lambda| {
            AnchorCurve::new(LinearAnchor {
                rate: params.rate,
                lambda,
            })
        })
        .collect();

    let samples: Vec<CurveSample> = grid
        .iter()
        .map(|sigma| {
            let physical = physical.at(sigma);
            let exact = exact.at(sigma);
            CurveSample {
                sigma,
                physical,
                exact,
                linear: linear.iter().map(|curve| curve.at(sigma)).collect(),
                tpi: physical.zip(exact).map(|(time, n)| time - n),
            }
        })
        .collect();

    debug!(
        "sampled {} curves at {} volatilities",
        linear.len() + 2,
        samples.len()
    );
    Ok(samples)
}

/// Returns the sampled `[σ_first, σ_last]` range where TPI is positive.
///
/// The zone starts at the first sample past the crossing and runs while TPI
/// stays positive, which for the baseline means up to the meltdown line.
#[must_use]
pub fn mispricing_zone(samples: &[CurveSample]) -> Option<(f64, f64)> {
    let positive = |sample: &&CurveSample| sample.tpi.is_some_and(|tpi| tpi > 0.0);

    let start = samples.iter().position(|sample| positive(&sample))?;
    let last = samples[start..]
        .iter()
        .take_while(positive)
        .last()
        .map_or(samples[start].sigma, |sample| sample.sigma);

    Some((samples[start].sigma, last))
}
