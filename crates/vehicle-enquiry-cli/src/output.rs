//! JSON rendering of records and layouts for stdout.

use anyhow::{Context, Result};
use vehicle_enquiry::{PageLayout, VehicleRecord};

/// Render a record as a single JSON line, or indented when `pretty`.
pub fn render_record(record: &VehicleRecord, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(record)
    } else {
        serde_json::to_string(record)
    };
    json.context("failed to serialize vehicle record")
}

pub fn render_layout(layout: &PageLayout) -> Result<String> {
    Ok(layout.to_json_pretty()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_record_is_one_line() {
        let record = VehicleRecord {
            registration: "AB12 CDE".to_string(),
            taxed: "Taxed".to_string(),
            ..VehicleRecord::default()
        };
        let line = render_record(&record, false).unwrap();
        assert!(!line.contains('\n'));
        assert!(line.starts_with(r#"{"registration":"AB12 CDE","make":"","taxed":"Taxed""#));
    }

    #[test]
    fn test_pretty_record_is_indented() {
        let out = render_record(&VehicleRecord::default(), true).unwrap();
        assert!(out.contains("\n  \"taxDue\": \"\""));
    }

    #[test]
    fn test_layout_renders_as_json() {
        let layout = PageLayout::embedded().unwrap();
        let out = render_layout(&layout).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["continuation"]["form_action"], "/ViewVehicle");
    }
}
