//! Geoflow Jobs - Remote geoprocessing job orchestration
//!
//! This crate defines the ports for remote processing services, the
//! polling disciplines that drive jobs to a terminal state, the job
//! controller that owns each workflow's current job, and HTTP adapters
//! for the profile and print services.

pub mod controller;
pub mod orchestrator;
pub mod ports;
pub mod print;
pub mod profile;
pub mod workflow;

// Re-export main types
pub use controller::{JobController, Ticket};
pub use orchestrator::{poll_bounded, run_until_terminal, JobOutcome, PollPolicy};
pub use ports::{GeoprocessingService, PrintService};
pub use print::HttpPrintService;
pub use profile::EsriProfileService;
pub use workflow::{ProfileHandle, ProfileWorkflow, ProfileWorkflowConfig};
