//! Profile command implementation

use super::parse_coords;
use crate::cli::{ProfileArgs, ProfileKind};
use crate::config_loader::load_config_with_overrides;
use crate::output::OutputWriter;
use crate::output_types::ProfileOutput;
use crate::progress;
use anyhow::{anyhow, bail, Context, Result};
use geo::LineString;
use geoflow_core::config::CliConfigOverrides;
use geoflow_core::models::{JobKind, JobStatus};
use geoflow_jobs::{EsriProfileService, ProfileWorkflow, ProfileWorkflowConfig};
use std::path::Path;
use std::sync::Arc;

pub async fn execute(
    args: ProfileArgs,
    config_path: Option<&Path>,
    mut overrides: CliConfigOverrides,
    output: &OutputWriter,
) -> Result<()> {
    let kind = match args.kind {
        ProfileKind::Terrain => {
            overrides.terrain_service_url = args.service_url.clone();
            JobKind::TerrainProfile
        }
        ProfileKind::Elevation => {
            overrides.elevation_service_url = args.service_url.clone();
            JobKind::ElevationProfile
        }
    };
    let config = load_config_with_overrides(config_path, overrides)?;
    let workflow_config = ProfileWorkflowConfig::from_config(kind, &config)?;

    let coords = parse_coords(&args.coords)?;
    let line: LineString<f64> = coords.into_iter().map(|[x, y]| (x, y)).collect::<Vec<_>>().into();

    let service = Arc::new(EsriProfileService::new(workflow_config.service_url.clone()));
    let workflow = ProfileWorkflow::new(service, workflow_config);

    let spinner = if output.is_json() {
        progress::hidden()
    } else {
        progress::create_spinner(&format!("Submitting {} job...", kind))
    };

    let handle = match workflow.start(&line, &args.crs).await {
        Ok(handle) => handle,
        Err(e) => {
            progress::finish_error(&spinner, "Submit failed");
            return Err(e).context("Failed to submit profile job");
        }
    };
    spinner.set_message(format!("Waiting for job {}...", handle.job_id));

    let job = tokio::select! {
        job = workflow.wait(handle.generation) => job,
        _ = tokio::signal::ctrl_c() => {
            workflow.reset();
            progress::finish_error(&spinner, "Cancelled");
            bail!("Profile job {} cancelled", handle.job_id);
        }
    };
    let job = job.ok_or_else(|| anyhow!("Profile job {} was superseded", handle.job_id))?;

    match job.status {
        JobStatus::Succeeded => progress::finish_success(&spinner, "Profile ready"),
        _ => progress::finish_error(&spinner, "Profile job failed"),
    }

    let summary = job.result.as_ref().and_then(|p| p.summary());
    let result = ProfileOutput {
        kind: kind.to_string(),
        job_id: handle.job_id.to_string(),
        status: job.status,
        sample_distance: handle.sample_distance,
        summary,
        messages: job.messages.clone(),
        profile: if args.points { job.result.clone() } else { None },
    };

    if output.is_json() {
        output.result(&result)?;
    } else {
        output.section("Profile");
        output.kv("Job", &result.job_id);
        output.kv("Status", format!("{:?}", result.status));
        output.kv("Sample distance", format!("{} m", result.sample_distance));

        if let Some(s) = summary {
            output.kv("Length", format!("{:.1} m", s.length));
            output.kv("Elevation", format!("{:.1} to {:.1} m", s.min_z, s.max_z));
            output.kv("Ascent", format!("{:.1} m", s.ascent));
            output.kv("Descent", format!("{:.1} m", s.descent));
        }
        for message in &result.messages {
            output.warning(message);
        }
        if let Some(profile) = &result.profile {
            output.section("Samples");
            for p in &profile.points {
                println!("{:>10.1} {:>12.2} {:>12.2} {:>8.1}", p.distance, p.x, p.y, p.z);
            }
        }
    }

    if job.status == JobStatus::Failed {
        bail!("Profile job {} failed", handle.job_id);
    }
    Ok(())
}
