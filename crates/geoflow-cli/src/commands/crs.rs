//! Crs command implementation

use crate::cli::CrsArgs;
use crate::output::OutputWriter;
use crate::output_types::CrsRow;
use anyhow::Result;
use geoflow_geo::crs::CrsRegistry;

pub fn execute(args: CrsArgs, output: &OutputWriter) -> Result<()> {
    let registry = CrsRegistry::with_defaults();

    let rows: Vec<CrsRow> = registry
        .definitions()
        .map(|def| CrsRow {
            code: def.code.clone(),
            name: def.name.clone(),
            family: format!("{:?}", def.family),
            units: def
                .units
                .map(|u| format!("{:?}", u).to_lowercase())
                .unwrap_or_else(|| "-".to_string()),
            proj: args.verbose.then(|| def.to_proj_string()),
        })
        .collect();

    if !output.is_json() && args.verbose {
        for row in &rows {
            output.kv(&row.code, row.proj.as_deref().unwrap_or_default());
        }
        return Ok(());
    }

    output.table(rows)
}
