//! Resolution of command-line flags into library configuration.

use std::path::Path;

use anyhow::{Context, Result};
use vehicle_enquiry::{resolve_base_url, EnquiryConfig, PageLayout};

/// Build the client configuration. The base URL comes from the flag, then
/// `VEHICLE_ENQUIRY_URL`, then the public service.
pub fn build_config(base_url: Option<&str>, timeout_ms: u64) -> EnquiryConfig {
    EnquiryConfig {
        base_url: resolve_base_url(base_url),
        timeout_ms,
        ..EnquiryConfig::default()
    }
}

/// Load the page layout: the given file, or the embedded one. The layout is
/// compiled here so a bad selector is reported before any request is made.
pub fn load_layout(path: Option<&Path>) -> Result<PageLayout> {
    let layout = match path {
        Some(path) => PageLayout::from_path(path)?,
        None => PageLayout::embedded()?,
    };
    layout
        .compile()
        .with_context(|| match path {
            Some(path) => format!("layout {} is not usable", path.display()),
            None => "embedded layout is not usable".to_string(),
        })?;
    Ok(layout)
}
