//! The full lookup: negotiate, fetch, extract.

use std::sync::Arc;

use crate::config::EnquiryConfig;
use crate::extractor::{fetch_details, parse_details, post_details};
use crate::http_client::HttpClient;
use crate::layout::{CompiledLayout, PageLayout};
use crate::negotiator::negotiate;
use crate::types::{CheckError, EnquiryResult, SessionTokenSet, Stage, VehicleRecord};

/// Client for the vehicle enquiry service.
///
/// Holds no per-lookup state, so one instance can be cloned and shared
/// between tasks. Each [`check`](Self::check) makes at most two requests, in
/// order, and never retries.
#[derive(Debug, Clone)]
pub struct VehicleEnquiry {
    http: HttpClient,
    config: EnquiryConfig,
    layout: Arc<CompiledLayout>,
}

impl VehicleEnquiry {
    /// Client using the embedded page layout.
    pub fn new(config: EnquiryConfig) -> EnquiryResult<Self> {
        Self::with_compiled_layout(config, CompiledLayout::embedded()?)
    }

    pub fn with_layout(config: EnquiryConfig, layout: &PageLayout) -> EnquiryResult<Self> {
        Self::with_compiled_layout(config, layout.compile()?)
    }

    fn with_compiled_layout(config: EnquiryConfig, layout: CompiledLayout) -> EnquiryResult<Self> {
        Ok(Self {
            http: HttpClient::new(&config)?,
            config,
            layout: Arc::new(layout),
        })
    }

    pub fn config(&self) -> &EnquiryConfig {
        &self.config
    }

    /// Stage 1 on its own.
    pub async fn negotiate(&self, registration_mark: &str) -> EnquiryResult<SessionTokenSet> {
        negotiate(&self.http, &self.config, &self.layout, registration_mark).await
    }

    /// Stage 2 on its own. Consumes the token set.
    pub async fn fetch_details(&self, tokens: SessionTokenSet) -> EnquiryResult<VehicleRecord> {
        fetch_details(&self.http, &self.config, &self.layout, tokens).await
    }

    /// Look up a registration mark.
    ///
    /// The first failure aborts the lookup and is returned with the stage
    /// that produced it. No partial record is ever returned.
    pub async fn check(&self, registration_mark: &str) -> Result<VehicleRecord, CheckError> {
        tracing::info!("checking {registration_mark}: negotiating");
        let tokens = self
            .negotiate(registration_mark)
            .await
            .map_err(|e| CheckError::new(Stage::Negotiation, e))?;

        tracing::info!("checking {registration_mark}: fetching details");
        let page = post_details(&self.http, &self.config, tokens)
            .await
            .map_err(|e| CheckError::new(Stage::Fetch, e))?;

        let record = parse_details(&page.body, &self.layout)
            .map_err(|e| CheckError::new(Stage::Extraction, e))?;

        if record.is_empty() {
            tracing::warn!("details page for {registration_mark} matched no fields");
        }
        tracing::info!("checking {registration_mark}: done");
        Ok(record)
    }
}
