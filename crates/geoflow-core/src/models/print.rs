//! Print rendering payload and result models.
//!
//! The payload follows the MapFish Print v3 report request layout: a layout
//! name, an output format, and a `map` attribute carrying the view and the
//! background layers.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One level of a tiled-pyramid matrix set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileMatrix {
    pub identifier: String,
    pub scale_denominator: f64,
    pub top_left_corner: [f64; 2],
    pub tile_size: [u32; 2],
    pub matrix_size: [u64; 2],
}

/// Background layer descriptor as understood by the rendering service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WmtsLayer {
    #[serde(rename = "type")]
    pub layer_type: String,

    #[serde(rename = "baseURL")]
    pub base_url: String,

    pub layer: String,
    pub matrix_set: String,
    pub image_format: String,
    pub style: String,
    pub request_encoding: String,
    pub version: String,

    /// Shared pyramid; all layers point at the same allocation
    pub matrices: Arc<[TileMatrix]>,
}

/// View and layers of the printed map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapAttributes {
    pub center: [f64; 2],
    pub projection: String,

    /// Degrees, clockwise as delivered by the view
    pub rotation: f64,

    pub scale: f64,
    pub dpi: u32,
    pub layers: Vec<WmtsLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintAttributes {
    pub map: MapAttributes,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Declarative job description posted to the rendering service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintPayload {
    pub layout: String,
    pub output_format: String,
    pub attributes: PrintAttributes,
}

/// Returned by the rendering service when a print job is accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintTicket {
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "statusURL")]
    pub status_url: String,
}

/// One status check of a print job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintStatusReport {
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub done: Option<bool>,

    #[serde(rename = "downloadURL", default)]
    pub download_url: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

impl PrintStatusReport {
    /// "finished" with a download reference is the only success signal
    pub fn download(&self) -> Option<&str> {
        if self.status == "finished" {
            self.download_url.as_deref().filter(|url| !url.is_empty())
        } else {
            None
        }
    }

    /// Explicit terminal failure reported by the service
    pub fn is_failure(&self) -> bool {
        ["error", "failed", "cancelled"]
            .iter()
            .any(|failure| self.status.eq_ignore_ascii_case(failure))
    }
}

/// Final output of a print job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintDownload {
    pub download_url: String,
    pub status_url: String,

    /// Status checks consumed before the download became available
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_report_success_requires_finished_and_url() {
        let finished: PrintStatusReport = serde_json::from_str(
            r#"{"status": "finished", "done": true, "downloadURL": "/print/report/abc"}"#,
        )
        .unwrap();
        assert_eq!(finished.download(), Some("/print/report/abc"));

        let running: PrintStatusReport =
            serde_json::from_str(r#"{"status": "running", "downloadURL": "/print/report/abc"}"#)
                .unwrap();
        assert_eq!(running.download(), None);

        let no_url: PrintStatusReport = serde_json::from_str(r#"{"status": "finished"}"#).unwrap();
        assert_eq!(no_url.download(), None);
    }

    #[test]
    fn test_failure_status_ignores_case() {
        let report = |status: &str| PrintStatusReport {
            status: status.to_string(),
            done: None,
            download_url: None,
            error: None,
        };

        for status in ["error", "Error", "FAILED", "Cancelled"] {
            assert!(report(status).is_failure(), "{} should be a failure", status);
        }
        for status in ["running", "finished", "Waiting"] {
            assert!(!report(status).is_failure(), "{} should not be a failure", status);
        }
    }

    #[test]
    fn test_ticket_field_names() {
        let ticket: PrintTicket =
            serde_json::from_str(r#"{"ref": "r-1", "statusURL": "/print/status/r-1.json"}"#)
                .unwrap();
        assert_eq!(ticket.reference.as_deref(), Some("r-1"));
        assert_eq!(ticket.status_url, "/print/status/r-1.json");
    }
}
