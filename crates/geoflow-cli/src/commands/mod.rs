//! Command implementations

mod config;
mod crs;
mod print;
mod profile;
mod scale;
mod transform;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::{bail, Context, Result};
use geoflow_core::config::CliConfigOverrides;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let overrides = CliConfigOverrides {
        poll_interval_ms: cli.poll_interval_ms,
        ..Default::default()
    };

    match cli.command {
        Commands::Profile(args) => profile::execute(args, cli.config.as_deref(), overrides, &output).await,
        Commands::Print(args) => print::execute(args, cli.config.as_deref(), overrides, &output).await,
        Commands::Scale(args) => scale::execute(args, &output),
        Commands::Transform(args) => transform::execute(args, &output),
        Commands::Crs(args) => crs::execute(args, &output),
        Commands::Config => config::execute(cli.config.as_deref(), overrides, &output),
    }
}

/// Parse "x,y" into a point
pub fn parse_point(text: &str) -> Result<[f64; 2]> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    let [x, y] = parts.as_slice() else {
        bail!("Expected a coordinate pair \"x,y\", got \"{}\"", text);
    };
    let x: f64 = x.parse().with_context(|| format!("Invalid x coordinate \"{}\"", x))?;
    let y: f64 = y.parse().with_context(|| format!("Invalid y coordinate \"{}\"", y))?;
    Ok([x, y])
}

/// Parse "x,y;x,y;..." into line vertices
pub fn parse_coords(text: &str) -> Result<Vec<[f64; 2]>> {
    text.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(parse_point)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("262000.5, 6650000").unwrap(), [262000.5, 6650000.0]);
        assert_eq!(parse_point("-10.5,59").unwrap(), [-10.5, 59.0]);
        assert!(parse_point("1,2,3").is_err());
        assert!(parse_point("a,2").is_err());
    }

    #[test]
    fn test_parse_coords() {
        let coords = parse_coords("0,0; 1200,0;1200,800;").unwrap();
        assert_eq!(coords, vec![[0.0, 0.0], [1200.0, 0.0], [1200.0, 800.0]]);
        assert!(parse_coords("0,0;oops").is_err());
    }
}
