//! Config command implementation

use crate::config_loader::{config_path, load_config_with_overrides};
use crate::output::OutputWriter;
use crate::output_types::ConfigRow;
use anyhow::Result;
use geoflow_core::config::CliConfigOverrides;
use std::path::Path;

pub fn execute(
    config_file: Option<&Path>,
    overrides: CliConfigOverrides,
    output: &OutputWriter,
) -> Result<()> {
    let config = load_config_with_overrides(config_file, overrides)?;

    let mut rows: Vec<ConfigRow> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigRow {
            key,
            value,
            source: format!("{:?}", source),
        })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    if !output.is_json() {
        match config_path(config_file) {
            Some(path) => output.info(format!("Config file: {}", path.display())),
            None => output.info("No config file; using defaults and environment"),
        }
    }

    output.table(rows)
}
