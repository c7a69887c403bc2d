//! Robustness check of the linear approximation across interest-rate
//! scenarios.
//!
//! ```text
//! cargo run -p rate-zz-capm --example robustness [config.toml]
//! RUST_LOG=debug cargo run -p rate-zz-capm --example robustness
//! ```

use std::{error::Error, fs, path::Path};

use serde::Deserialize;

use rate_zz_capm::{
    Parameters, RunConfig, SigmaGrid, SolverSettings, compare, mispricing_zone, sample_curves,
};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DemoConfig {
    params: Parameters,
    settings: SolverSettings,
    /// Risk-free rates to compare; overrides `params.rate`.
    scenario_rates: Vec<f64>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            params: Parameters::default(),
            settings: SolverSettings::default(),
            scenario_rates: vec![0.018, 0.040],
        }
    }
}

impl DemoConfig {
    fn from_toml(path: &Path) -> Result<Self, Box<dyn Error>> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let demo = match std::env::args().nth(1) {
        Some(path) => DemoConfig::from_toml(Path::new(&path))?,
        None => DemoConfig::default(),
    };
    let base = RunConfig {
        params: demo.params,
        settings: demo.settings,
    };
    let grid = SigmaGrid::default();

    for &rate in &demo.scenario_rates {
        let config = base.with_rate(rate);

        let comparison = compare(&config)?;
        println!("{comparison}");

        let curves = sample_curves(&config, &grid)?;
        match mispricing_zone(&curves) {
            Some((start, end)) => {
                println!("mispricing zone (TPI > 0): sigma in [{start:.4}, {end:.4}]\n");
            }
            None => println!("no mispricing zone on the sampled grid\n"),
        }
    }

    Ok(())
}
