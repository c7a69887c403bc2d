//! Linear versus nonlinear equilibrium comparison.

use std::{error::Error as StdError, fmt};

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::{
    anchor::{ExactAnchor, LinearAnchor, PhysicalAnchor},
    config::{ConfigError, RunConfig},
    equilibrium::{EquilibriumPoint, SearchConfig, SearchConfigError, find_equilibrium},
};

/// One row of the comparison, for a single `λ`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub lambda: f64,
    /// `σ*` of the linear anchor `1/(r + λσ)`.
    pub sigma_star_linear: Option<f64>,
    /// `σ*` of the exact anchor, shared by every row.
    pub sigma_star_exact: Option<f64>,
    /// `σ*_linear − σ*_exact` in percentage points.
    pub delta_pp: Option<f64>,
    /// Why the row is incomplete.
    pub failure: Option<String>,
    /// A reported equilibrium was not computed to tolerance.
    pub degraded: bool,
}

impl ComparisonRow {
    /// Returns true if both equilibria were found.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.delta_pp.is_some()
    }
}

/// The result of [`compare`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub rate: f64,
    pub sigma_max: f64,
    /// Equilibrium of the exact anchor, if one was found.
    pub exact: Option<EquilibriumPoint>,
    /// One row per `λ`, in configuration order.
    pub rows: Vec<ComparisonRow>,
}

/// Errors that prevent a comparison from running at all.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ComparisonError {
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("invalid search settings: {0}")]
    InvalidSearch(#[from] SearchConfigError),
}

/// Compares the exact equilibrium against each linear approximation.
///
/// The exact `σ*` is computed once and shared by every row. A `λ` (or the
/// exact anchor) without an equilibrium produces a partial row carrying the
/// reason; the remaining rows are still computed.
///
/// # Errors
///
/// Returns an error only if `config` fails validation.
pub fn compare(config: &RunConfig) -> Result<Comparison, ComparisonError> {
    config.validate()?;
    let search = SearchConfig::from_settings(&config.settings)?;

    let params = &config.params;
    let sigma_max = config.sigma_max();
    let physical = PhysicalAnchor {
        growth: params.growth,
        multiple: params.multiple,
    };

    let exact_anchor = ExactAnchor::new(params.rate, &config.settings);
    let (exact, exact_failure) =
        match find_equilibrium(&exact_anchor, &physical, sigma_max, &search) {
            Ok(point) => {
                info!(
                    "exact equilibrium at r={}: sigma*={:.6}, n*={:.4}",
                    params.rate, point.sigma_star, point.n_star
                );
                (Some(point), None)
            }
            Err(error) => {
                let reason = describe(&error);
                warn!("exact equilibrium at r={} failed: {reason}", params.rate);
                (None, Some(reason))
            }
        };
    let sigma_star_exact = exact.map(|point| point.sigma_star);
    let exact_degraded = exact.is_some_and(|point| !point.converged);

    let rows = params
        .lambdas
        .iter()
        .map(|&lambda| {
            let linear = LinearAnchor {
                rate: params.rate,
                lambda,
            };
            let (linear_point, failure) =
                match find_equilibrium(&linear, &physical, sigma_max, &search) {
                    Ok(point) => (Some(point), exact_failure.clone()),
                    Err(error) => {
                        let reason = describe(&error);
                        warn!("linear equilibrium for lambda={lambda} failed: {reason}");
                        (None, Some(reason))
                    }
                };
            let sigma_star_linear = linear_point.map(|point| point.sigma_star);
            let degraded = exact_degraded || linear_point.is_some_and(|point| !point.converged);
            let delta_pp = sigma_star_linear
                .zip(sigma_star_exact)
                .map(|(linear, exact)| 100.0 * (linear - exact));

            ComparisonRow {
                lambda,
                sigma_star_linear,
                sigma_star_exact,
                delta_pp,
                failure,
                degraded,
            }
        })
        .collect();

    Ok(Comparison {
        rate: params.rate,
        sigma_max,
        exact,
        rows,
    })
}

/// Joins an error and its sources into one line.
fn describe(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn cell(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_owned(), |v| format!("{v:.precision$}"))
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "r = {:.2}%  sigma_max = {:.4}",
            100.0 * self.rate,
            self.sigma_max
        )?;
        writeln!(
            f,
            "{:>6}  {:>10}  {:>13}  {:>9}",
            "lambda", "linear σ*", "nonlinear σ*", "Δσ* (pp)"
        )?;
        for row in &self.rows {
            write!(
                f,
                "{:>6.2}  {:>10}  {:>13}  {:>9}",
                row.lambda,
                cell(row.sigma_star_linear, 4),
                cell(row.sigma_star_exact, 4),
                cell(row.delta_pp, 2),
            )?;
            if row.degraded {
                write!(f, "  (not converged)")?;
            }
            if let Some(reason) = &row.failure {
                write!(f, "  ({reason})")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::config::{Parameters, SolverSettings};

    #[test]
    fn baseline_comparison() {
        let comparison = compare(&RunConfig::default()).expect("valid config");

        let exact = comparison.exact.expect("exact equilibrium");
        assert!((exact.sigma_star - 0.574).abs() <= 0.002);
        assert!(exact.converged);
        assert_relative_eq!(comparison.sigma_max, 0.4_f64.sqrt());

        let linear: Vec<f64> = comparison
            .rows
            .iter()
            .map(|row| row.sigma_star_linear.unwrap())
            .collect();
        for (found, expected) in linear.iter().zip([0.489_276, 0.463_168, 0.438_807]) {
            assert_relative_eq!(*found, expected, epsilon = 1e-5);
        }

        let deltas: Vec<f64> = comparison
            .rows
            .iter()
            .map(|row| row.delta_pp.unwrap())
            .collect();
        for (found, expected) in deltas.iter().zip([-8.48, -11.09, -13.53]) {
            assert_relative_eq!(*found, expected, epsilon = 0.01);
        }
        assert!(deltas.windows(2).all(|pair| pair[1] < pair[0]));
        assert!(comparison.rows.iter().all(|row| row.failure.is_none()));
        assert!(comparison.rows.iter().all(|row| !row.degraded));
    }

    #[test]
    fn rows_follow_lambda_order() {
        let mut config = RunConfig::default();
        config.params.lambdas = vec![0.3, 0.2, 0.25];
        let comparison = compare(&config).unwrap();

        let lambdas: Vec<f64> = comparison.rows.iter().map(|row| row.lambda).collect();
        assert_eq!(lambdas, vec![0.3, 0.2, 0.25]);
    }

    #[test]
    fn higher_rate_scenario() {
        let comparison = compare(&RunConfig::default().with_rate(0.04)).unwrap();
        let exact = comparison.exact.unwrap();
        assert_relative_eq!(exact.sigma_star, 0.542_782, epsilon = 1e-5);
        assert_relative_eq!(comparison.rows[0].delta_pp.unwrap(), -7.83, epsilon = 0.01);
    }

    #[test]
    fn iteration_limit_degrades_rows() {
        let config = RunConfig {
            settings: SolverSettings {
                max_iters: 5,
                ..SolverSettings::default()
            },
            ..RunConfig::default()
        };
        let comparison = compare(&config).unwrap();

        let exact = comparison.exact.expect("estimate is still reported");
        assert!(!exact.converged);
        assert!(comparison.rows.iter().all(|row| row.degraded));
        assert!(comparison.rows.iter().all(ComparisonRow::is_complete));

        let table = comparison.to_string();
        assert_eq!(table.matches("(not converged)").count(), 3);
    }

    #[test]
    fn missing_linear_equilibrium_gives_partial_row() {
        // With λ this large the anchors cross before the first sample.
        let config = RunConfig {
            params: Parameters {
                lambdas: vec![0.2, 1e4],
                ..Parameters::default()
            },
            ..RunConfig::default()
        };
        let comparison = compare(&config).unwrap();

        assert!(comparison.rows[0].is_complete());

        let partial = &comparison.rows[1];
        assert!(!partial.is_complete());
        assert_eq!(partial.sigma_star_linear, None);
        assert!(partial.sigma_star_exact.is_some());
        let reason = partial.failure.as_deref().unwrap();
        assert!(reason.contains("do not cross"), "{reason}");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = RunConfig::default().with_rate(-0.01);
        assert_eq!(
            compare(&config),
            Err(ComparisonError::InvalidConfig(ConfigError::Rate(-0.01)))
        );
    }

    #[test]
    fn table_lists_every_row() {
        let table = compare(&RunConfig::default()).unwrap().to_string();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("r = 1.80%"));
        assert!(lines[2].contains("0.4893"));
        assert!(lines[2].contains("0.5741"));
        assert!(lines[4].contains("-13.53"));
    }
}
