//! Scale command implementation

use crate::cli::ScaleArgs;
use crate::output::OutputWriter;
use crate::output_types::ScaleOutput;
use anyhow::{Context, Result};
use geoflow_geo::crs::CrsRegistry;
use geoflow_geo::scale::{LinearUnit, ScaleConverter, ScaleTable, DEFAULT_DPI};

pub fn execute(args: ScaleArgs, output: &OutputWriter) -> Result<()> {
    let registry = CrsRegistry::with_defaults();
    let def = registry.require(&args.crs)?;
    let converter = ScaleConverter::new(args.dpi.unwrap_or(DEFAULT_DPI))?;
    let table = ScaleTable::default();

    let (resolution, raw_scale) = match (args.resolution, args.scale) {
        (Some(resolution), _) => {
            let unit = def.units.unwrap_or(LinearUnit::Meters);
            (resolution, converter.scale_from_resolution(resolution, unit))
        }
        (None, Some(scale)) => {
            let resolution = converter
                .resolution_from_scale(scale, def.meters_per_unit())
                .with_context(|| format!("Cannot derive a resolution for {}", def.code))?;
            (resolution, scale)
        }
        (None, None) => anyhow::bail!("Either --resolution or --scale is required"),
    };
    let nearest_scale = table.nearest(raw_scale, def.family)?;

    let result = ScaleOutput {
        crs: def.code.clone(),
        family: format!("{:?}", def.family),
        dpi: converter.dpi(),
        resolution,
        raw_scale,
        nearest_scale,
    };

    if output.is_json() {
        output.result(&result)?;
    } else {
        output.section("Scale");
        output.kv("Reference system", format!("{} ({})", def.name, def.code));
        output.kv("Family", &result.family);
        output.kv("DPI", format!("{:.3}", result.dpi));
        output.kv("Resolution", format!("{:.4} units/px", result.resolution));
        output.kv("Scale", format!("1:{:.0}", result.raw_scale));
        output.kv("Nearest standard scale", format!("1:{}", result.nearest_scale));
    }

    Ok(())
}
