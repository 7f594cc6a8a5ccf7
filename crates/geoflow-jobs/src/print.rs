//! HTTP adapter for the MapFish-style print service

use crate::ports::PrintService;
use async_trait::async_trait;
use geoflow_core::error::{GeoflowError, Result};
use geoflow_core::models::{PrintPayload, PrintStatusReport, PrintTicket};
use url::Url;

/// Print service reached over HTTP.
///
/// The service may hand back relative status and download URLs; both are
/// resolved against the submit URL so callers always see absolute links.
pub struct HttpPrintService {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpPrintService {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GeoflowError::invalid_input("print_service_url", e.to_string()))?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, link: &str) -> Result<String> {
        self.base_url
            .join(link)
            .map(String::from)
            .map_err(|e| GeoflowError::Serialization(format!("Bad link '{}': {}", link, e)))
    }
}

#[async_trait]
impl PrintService for HttpPrintService {
    async fn submit(&self, payload: &PrintPayload) -> Result<PrintTicket> {
        let response = self
            .client
            .post(self.base_url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| GeoflowError::transport("submitting print job", e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GeoflowError::RemoteResponse { status, body });
        }

        let mut ticket: PrintTicket = response
            .json()
            .await
            .map_err(|e| GeoflowError::Serialization(format!("Failed to parse print ticket: {}", e)))?;
        ticket.status_url = self.resolve(&ticket.status_url)?;

        tracing::info!(
            reference = ?ticket.reference,
            status_url = %ticket.status_url,
            layout = %payload.layout,
            "Submitted print job"
        );
        Ok(ticket)
    }

    async fn poll_status(&self, status_url: &str) -> Result<PrintStatusReport> {
        let url = self.resolve(status_url)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GeoflowError::transport("checking print status", e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GeoflowError::RemoteResponse { status, body });
        }

        let mut report: PrintStatusReport = response
            .json()
            .await
            .map_err(|e| GeoflowError::Serialization(format!("Failed to parse print status: {}", e)))?;

        if let Some(link) = report.download_url.as_deref().filter(|l| !l.is_empty()) {
            report.download_url = Some(self.resolve(link)?);
        }
        Ok(report)
    }
}
