//! Core data types for a registration lookup: the continuation token set,
//! the vehicle record, and the error taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four values the details form expects back from the
/// confirmation page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSlot {
    StateToken,
    Registration,
    Make,
    Colour,
}

impl TokenSlot {
    /// All slots, in the order they are sent on the wire.
    pub const ALL: [TokenSlot; 4] = [
        TokenSlot::StateToken,
        TokenSlot::Registration,
        TokenSlot::Make,
        TokenSlot::Colour,
    ];

    /// Form parameter name used when echoing this slot.
    pub fn form_name(self) -> &'static str {
        match self {
            TokenSlot::StateToken => "viewstate",
            TokenSlot::Registration => "Vrm",
            TokenSlot::Make => "Make",
            TokenSlot::Colour => "Colour",
        }
    }
}

/// Hidden state recovered from the confirmation page.
///
/// Either all four values are non-empty or the set does not exist. The set is
/// consumed by value when the details request is built, so it cannot be
/// replayed. It does not implement `Clone`:
///
/// ```compile_fail
/// use vehicle_enquiry::SessionTokenSet;
///
/// let tokens = SessionTokenSet::new("tok1", "AB12CDE", "FORD", "BLUE").unwrap();
/// let replay = tokens.clone();
/// tokens.into_form_fields("True");
/// replay.into_form_fields("True");
/// ```
#[derive(PartialEq, Eq)]
pub struct SessionTokenSet {
    state_token: String,
    registration: String,
    make: String,
    colour: String,
}

impl SessionTokenSet {
    /// Build a token set, failing with [`EnquiryError::ContinuationNotFound`]
    /// when any value is empty. Values are kept verbatim.
    pub fn new(
        state_token: impl Into<String>,
        registration: impl Into<String>,
        make: impl Into<String>,
        colour: impl Into<String>,
    ) -> EnquiryResult<Self> {
        let tokens = Self {
            state_token: state_token.into(),
            registration: registration.into(),
            make: make.into(),
            colour: colour.into(),
        };

        let missing: Vec<String> = TokenSlot::ALL
            .iter()
            .filter(|slot| tokens.get(**slot).is_empty())
            .map(|slot| slot.form_name().to_string())
            .collect();

        if missing.is_empty() {
            Ok(tokens)
        } else {
            Err(EnquiryError::ContinuationNotFound { missing })
        }
    }

    pub fn state_token(&self) -> &str {
        &self.state_token
    }

    pub fn registration(&self) -> &str {
        &self.registration
    }

    pub fn make(&self) -> &str {
        &self.make
    }

    pub fn colour(&self) -> &str {
        &self.colour
    }

    /// A constructed set has always been accepted as correct.
    pub fn confirmed(&self) -> bool {
        true
    }

    /// Value held in the given slot.
    pub fn get(&self, slot: TokenSlot) -> &str {
        match slot {
            TokenSlot::StateToken => &self.state_token,
            TokenSlot::Registration => &self.registration,
            TokenSlot::Make => &self.make,
            TokenSlot::Colour => &self.colour,
        }
    }

    /// Consume the set into the ordered `(name, value)` pairs of the details
    /// request, ending with the confirmation flag and the empty submit field.
    pub fn into_form_fields(self, confirmation_flag: &str) -> Vec<(String, String)> {
        let mut fields: Vec<(String, String)> = TokenSlot::ALL
            .iter()
            .map(|slot| (slot.form_name().to_string(), self.get(*slot).to_string()))
            .collect();
        fields.push(("Correct".to_string(), confirmation_flag.to_string()));
        fields.push(("Continue".to_string(), String::new()));
        fields
    }
}

// The state token is a live session credential; keep it out of logs.
impl fmt::Debug for SessionTokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokenSet")
            .field("state_token", &"<redacted>")
            .field("registration", &self.registration)
            .field("make", &self.make)
            .field("colour", &self.colour)
            .finish()
    }
}

/// A field of [`VehicleRecord`] that a layout rule can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Registration,
    Make,
    Taxed,
    TaxDue,
    DateRegistered,
    YearOfManufacture,
    CylinderCapacity,
    Co2Emissions,
    FuelType,
    ExportMarker,
    VehicleStatus,
    Colour,
    Wheelplan,
    Weight,
}

impl RecordField {
    /// All fields in output order.
    pub const ALL: [RecordField; 14] = [
        RecordField::Registration,
        RecordField::Make,
        RecordField::Taxed,
        RecordField::TaxDue,
        RecordField::DateRegistered,
        RecordField::YearOfManufacture,
        RecordField::CylinderCapacity,
        RecordField::Co2Emissions,
        RecordField::FuelType,
        RecordField::ExportMarker,
        RecordField::VehicleStatus,
        RecordField::Colour,
        RecordField::Wheelplan,
        RecordField::Weight,
    ];
}

/// Vehicle details as rendered by the enquiry service.
///
/// Every value is the trimmed text the service printed. A label the page did
/// not render leaves its field as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    /// Registration mark as formatted by the service, e.g. `AB12 CDE`.
    pub registration: String,
    pub make: String,
    /// Tax status headline, e.g. `Taxed` or `Untaxed`.
    pub taxed: String,
    pub tax_due: String,
    pub date_registered: String,
    pub year_of_manufacture: String,
    pub cylinder_capacity: String,
    pub co2_emissions: String,
    pub fuel_type: String,
    pub export_marker: String,
    /// `Vehicle status` item; keyed `taxStatus` in JSON output.
    #[serde(rename = "taxStatus")]
    pub vehicle_status: String,
    pub colour: String,
    pub wheelplan: String,
    /// Revenue weight.
    pub weight: String,
}

impl VehicleRecord {
    /// Value of a single field.
    pub fn get(&self, field: RecordField) -> &str {
        match field {
            RecordField::Registration => &self.registration,
            RecordField::Make => &self.make,
            RecordField::Taxed => &self.taxed,
            RecordField::TaxDue => &self.tax_due,
            RecordField::DateRegistered => &self.date_registered,
            RecordField::YearOfManufacture => &self.year_of_manufacture,
            RecordField::CylinderCapacity => &self.cylinder_capacity,
            RecordField::Co2Emissions => &self.co2_emissions,
            RecordField::FuelType => &self.fuel_type,
            RecordField::ExportMarker => &self.export_marker,
            RecordField::VehicleStatus => &self.vehicle_status,
            RecordField::Colour => &self.colour,
            RecordField::Wheelplan => &self.wheelplan,
            RecordField::Weight => &self.weight,
        }
    }

    pub(crate) fn set(&mut self, field: RecordField, value: String) {
        let slot = match field {
            RecordField::Registration => &mut self.registration,
            RecordField::Make => &mut self.make,
            RecordField::Taxed => &mut self.taxed,
            RecordField::TaxDue => &mut self.tax_due,
            RecordField::DateRegistered => &mut self.date_registered,
            RecordField::YearOfManufacture => &mut self.year_of_manufacture,
            RecordField::CylinderCapacity => &mut self.cylinder_capacity,
            RecordField::Co2Emissions => &mut self.co2_emissions,
            RecordField::FuelType => &mut self.fuel_type,
            RecordField::ExportMarker => &mut self.export_marker,
            RecordField::VehicleStatus => &mut self.vehicle_status,
            RecordField::Colour => &mut self.colour,
            RecordField::Wheelplan => &mut self.wheelplan,
            RecordField::Weight => &mut self.weight,
        };
        *slot = value;
    }

    /// True when no field was populated, i.e. the page layout matched nothing.
    pub fn is_empty(&self) -> bool {
        RecordField::ALL.iter().all(|f| self.get(*f).is_empty())
    }
}

/// Stage of a check, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Submitting the mark and recovering the continuation tokens.
    Negotiation,
    /// Submitting the tokens and receiving the details page.
    Fetch,
    /// Running the page layout over the details page.
    Extraction,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Negotiation => "negotiation",
            Stage::Fetch => "fetch",
            Stage::Extraction => "extraction",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during a lookup.
#[derive(thiserror::Error, Debug)]
pub enum EnquiryError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Required continuation parameters not found: {}", .missing.join(", "))]
    ContinuationNotFound { missing: Vec<String> },

    #[error("Vehicle details not found: nothing matches `{selector}`")]
    DetailsNotFound { selector: String },

    #[error("Unexpected item structure: item {index} has {found} `{selector}` elements, expected 1")]
    MalformedItem {
        index: usize,
        found: usize,
        selector: String,
    },

    #[error("Layout error: {0}")]
    Layout(String),
}

/// Convenience result type.
pub type EnquiryResult<T> = Result<T, EnquiryError>;

/// A failed check: the stage that failed and the underlying cause.
#[derive(thiserror::Error, Debug)]
#[error("{stage} stage failed")]
pub struct CheckError {
    pub stage: Stage,
    #[source]
    pub source: EnquiryError,
}

impl CheckError {
    pub fn new(stage: Stage, source: EnquiryError) -> Self {
        Self { stage, source }
    }

    /// The underlying cause.
    pub fn kind(&self) -> &EnquiryError {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_set_requires_every_value() {
        let err = SessionTokenSet::new("tok1", "", "FORD", "").unwrap_err();
        match err {
            EnquiryError::ContinuationNotFound { missing } => {
                assert_eq!(missing, vec!["Vrm".to_string(), "Colour".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_token_set_form_fields_order() {
        let tokens = SessionTokenSet::new("tok1", "AB12CDE", "FORD", "BLUE").unwrap();
        assert!(tokens.confirmed());
        let fields = tokens.into_form_fields("True");
        let names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            vec!["viewstate", "Vrm", "Make", "Colour", "Correct", "Continue"]
        );
        assert_eq!(fields[0].1, "tok1");
        assert_eq!(fields[4].1, "True");
        assert_eq!(fields[5].1, "");
    }

    #[test]
    fn test_token_set_debug_hides_state_token() {
        let tokens = SessionTokenSet::new("secret-state", "AB12CDE", "FORD", "BLUE").unwrap();
        let printed = format!("{tokens:?}");
        assert!(!printed.contains("secret-state"));
        assert!(printed.contains("FORD"));
    }

    #[test]
    fn test_record_json_keys() {
        let mut record = VehicleRecord::default();
        assert!(record.is_empty());
        record.set(RecordField::TaxDue, "1 March 2025".to_string());
        record.set(RecordField::Co2Emissions, "120 g/km".to_string());
        assert!(!record.is_empty());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["taxDue"], "1 March 2025");
        assert_eq!(json["co2Emissions"], "120 g/km");
        assert_eq!(json["taxStatus"], "");
        assert!(json.get("vehicleStatus").is_none());
        assert_eq!(json.as_object().unwrap().len(), RecordField::ALL.len());
    }

    #[test]
    fn test_check_error_keeps_cause() {
        use std::error::Error;

        let err = CheckError::new(
            Stage::Extraction,
            EnquiryError::DetailsNotFound {
                selector: "div.related-links".to_string(),
            },
        );
        assert_eq!(err.to_string(), "extraction stage failed");
        let cause = err.source().unwrap().to_string();
        assert!(cause.contains("div.related-links"));
        assert!(matches!(err.kind(), EnquiryError::DetailsNotFound { .. }));
    }
}
