//! Vehicle Enquiry — look up a vehicle's registration details by replaying the
//! enquiry service's two-page form flow and extracting the rendered fields.

pub mod check;
pub mod config;
pub mod extractor;
pub mod http_client;
pub mod layout;
mod markup;
pub mod negotiator;
pub mod types;

pub use check::VehicleEnquiry;
pub use config::{resolve_base_url, EnquiryConfig};
pub use extractor::parse_details;
pub use layout::{CompiledLayout, ExtractionRule, PageLayout, Requirement};
pub use negotiator::parse_continuation;
pub use types::*;
