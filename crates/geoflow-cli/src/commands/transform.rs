//! Transform command implementation

use crate::cli::TransformArgs;
use crate::output::OutputWriter;
use crate::output_types::TransformOutput;
use anyhow::Result;
use geoflow_geo::crs::CrsRegistry;

pub fn execute(args: TransformArgs, output: &OutputWriter) -> Result<()> {
    let registry = CrsRegistry::with_defaults();
    let input = [args.x, args.y];
    let transformed = registry.transform(&args.from, &args.to, input)?;

    let result = TransformOutput {
        from: registry.require(&args.from)?.code.clone(),
        to: registry.require(&args.to)?.code.clone(),
        input,
        output: transformed,
    };

    if output.is_json() {
        output.result(&result)?;
    } else {
        output.kv(&result.from, format!("{} {}", input[0], input[1]));
        output.kv(&result.to, format!("{} {}", transformed[0], transformed[1]));
    }

    Ok(())
}
