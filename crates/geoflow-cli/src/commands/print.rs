//! Print command implementation

use super::parse_point;
use crate::cli::PrintArgs;
use crate::config_loader::load_config_with_overrides;
use crate::output::OutputWriter;
use crate::output_types::PrintOutput;
use crate::progress;
use anyhow::{bail, Context, Result};
use geoflow_core::config::CliConfigOverrides;
use geoflow_jobs::HttpPrintService;
use geoflow_print::{PayloadBuilder, PrintPipeline, PrintRequest, ScaleSource};
use std::path::Path;

pub async fn execute(
    args: PrintArgs,
    config_path: Option<&Path>,
    mut overrides: CliConfigOverrides,
    output: &OutputWriter,
) -> Result<()> {
    overrides.print_max_attempts = args.max_attempts;
    let config = load_config_with_overrides(config_path, overrides)?;

    let request = PrintRequest {
        center: parse_point(&args.center)?,
        source_crs: args.crs.clone(),
        rotation_rad: args.rotation,
        resolution: args.resolution,
        layout_token: args.layout.clone(),
        background_id: args.background.clone(),
        dpi: args.dpi,
        title: args.title.clone(),
    };

    let builder = PayloadBuilder::from_config(&config);
    let built = builder.build(&request).context("Failed to build print payload")?;

    if built.scale_source == ScaleSource::Default {
        output.warning(format!(
            "Could not derive a scale from the view, printing at 1:{}",
            built.payload.attributes.map.scale
        ));
    }

    let mut result = PrintOutput {
        layout: built.payload.layout.clone(),
        scale: built.payload.attributes.map.scale,
        scale_source: built.scale_source,
        download: None,
        payload: None,
    };

    if args.dry_run {
        result.payload = Some(built.payload);
        if output.is_json() {
            output.result(&result)?;
        } else {
            output.info("Dry run: payload not submitted");
            output.result(&result.payload)?;
        }
        return Ok(());
    }

    let service = HttpPrintService::new(&config.print_service_url.value)?;
    let pipeline = PrintPipeline::from_config(service, &config);

    let spinner = if output.is_json() {
        progress::hidden()
    } else {
        progress::create_spinner("Rendering print...")
    };

    let download = tokio::select! {
        res = pipeline.run(built) => res,
        _ = tokio::signal::ctrl_c() => {
            pipeline.cancel();
            progress::finish_error(&spinner, "Cancelled");
            bail!("Print cancelled");
        }
    };
    let download = match download {
        Ok(d) => {
            progress::finish_success(&spinner, "Print ready");
            d
        }
        Err(e) => {
            progress::finish_error(&spinner, "Print failed");
            return Err(e).context("Print pipeline failed");
        }
    };

    if output.is_json() {
        result.download = Some(download);
        output.result(&result)?;
    } else {
        output.section("Print");
        output.kv("Layout", &result.layout);
        output.kv("Scale", format!("1:{}", result.scale));
        output.kv("Status checks", download.attempts);
        output.success(format!("Download: {}", download.download_url));
    }

    Ok(())
}
