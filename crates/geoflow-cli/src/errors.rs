use console::style;
use geoflow_core::error::GeoflowError;
use std::fmt;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Error for a service that could not be reached or answered badly
pub fn service_unavailable(detail: &str) -> CliError {
    CliError::new("Remote service unavailable")
        .with_context(format!("The geoprocessing service could not be used.\n\nError: {}", detail))
        .with_suggestion("Check your network connection")
        .with_suggestion("Verify the service URL: geoflow config")
        .with_suggestion("Override it with GEOFLOW_TERRAIN_URL, GEOFLOW_ELEVATION_URL or GEOFLOW_PRINT_URL")
        .with_help("Run: geoflow config")
}

/// Error for a code missing from the registry
pub fn unknown_crs(code: &str) -> CliError {
    CliError::new("Unknown reference system")
        .with_context(format!("No definition is registered for '{}'.", code))
        .with_suggestion("List supported systems: geoflow crs")
        .with_suggestion("Codes may be written as 25833, EPSG:25833 or epsg:25833")
        .with_help("Run: geoflow crs --verbose")
}

/// Error for a print job that never produced a download
pub fn print_timeout(attempts: u32) -> CliError {
    CliError::new("Print job timed out")
        .with_context(format!(
            "The print service did not finish after {} status checks.",
            attempts
        ))
        .with_suggestion("Try again; large layouts can take longer to render")
        .with_suggestion("Allow more checks: geoflow print --max-attempts 30 ...")
        .with_help("Run: geoflow print --help")
}

/// Error for invalid configuration
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check geoflow.toml for syntax errors")
        .with_suggestion("Check GEOFLOW_* environment variables")
        .with_help("Run: geoflow config")
}

/// Map a domain error onto a presentable one
pub fn from_geoflow(error: &GeoflowError) -> CliError {
    match error {
        GeoflowError::Transport { reason, .. } => service_unavailable(reason),
        GeoflowError::RemoteResponse { status, body } => {
            service_unavailable(&format!("HTTP {}: {}", status, body))
        }
        GeoflowError::JobFailed { job_id, messages } => CliError::new(format!("Job {} failed", job_id))
            .with_context(if messages.is_empty() {
                "The service reported a failure without details.".to_string()
            } else {
                messages.join("\n")
            })
            .with_suggestion("Check that the input lies inside the service's coverage"),
        GeoflowError::PrintTimeout { attempts } => print_timeout(*attempts),
        GeoflowError::UnknownReferenceSystem { code } => unknown_crs(code),
        GeoflowError::UnsupportedTransform { from, to, reason } => {
            CliError::new(format!("Cannot transform from {} to {}", from, to))
                .with_context(reason.clone())
                .with_suggestion("Check that the coordinates are inside the source system's area of use")
        }
        GeoflowError::ConfigMissing { key } => invalid_config(key, "value is missing"),
        GeoflowError::ConfigInvalid { key, reason } => invalid_config(key, reason),
        GeoflowError::InvalidInput { .. } => CliError::new(error.to_string())
            .with_help("Run: geoflow --help"),
        other => CliError::new(other.to_string()),
    }
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    if let Some(domain) = error.chain().find_map(|e| e.downcast_ref::<GeoflowError>()) {
        let mapped = from_geoflow(domain);
        // Keep the outermost context the command attached
        let outer = error.to_string();
        return if outer != domain.to_string() && mapped.context.is_none() {
            mapped.with_context(outer)
        } else {
            mapped
        };
    }

    let message = error.to_string();
    if message.contains("No such file or directory") {
        CliError::new("File not found")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check the file path and try again")
    } else {
        CliError::new(format!("{:#}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_maps_domain_errors_through_context() {
        let err: anyhow::Result<()> = Err(GeoflowError::PrintTimeout { attempts: 10 })
            .context("Print pipeline failed");
        let cli = from_anyhow(err.unwrap_err());
        assert_eq!(cli.message, "Print job timed out");
        assert!(!cli.suggestions.is_empty());
    }

    #[test]
    fn test_unknown_crs_suggests_listing() {
        let cli = from_geoflow(&GeoflowError::UnknownReferenceSystem { code: "EPSG:1".to_string() });
        assert!(cli.context.unwrap().contains("EPSG:1"));
        assert_eq!(cli.help_command.as_deref(), Some("Run: geoflow crs --verbose"));
    }

    #[test]
    fn test_plain_errors_keep_message() {
        let cli = from_anyhow(anyhow::anyhow!("bad coordinate pair"));
        assert_eq!(cli.message, "bad coordinate pair");
    }
}
