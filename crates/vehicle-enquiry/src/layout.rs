//! Declarative description of the service's markup.
//!
//! Everything the two stages look for in the returned pages lives in a
//! [`PageLayout`]: the continuation form and its hidden inputs, the content
//! region of the details page, and the rules mapping selectors and label
//! strings onto [`RecordField`]s. The default layout is embedded at compile
//! time from `layout.json`; a replacement can be loaded from disk when the
//! service's markup drifts.
//!
//! A layout is compiled once into a [`CompiledLayout`] (all selectors parsed)
//! before any request is made, so a bad selector fails early as
//! [`EnquiryError::Layout`].

use std::path::Path;
use std::sync::OnceLock;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::markup::compile_selector;
use crate::types::{EnquiryError, EnquiryResult, RecordField, TokenSlot};

/// Raw JSON of the default layout.
const DEFAULT_LAYOUT_JSON: &str = include_str!("layout.json");

/// Whether a rule that matches nothing aborts the extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// No match fails the extraction with `DetailsNotFound`.
    Required,
    /// No match leaves the rule's fields empty.
    Optional,
}

/// Which of several matching containers supplies the values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    First,
    /// Every match is applied in document order, so the last one wins.
    Last,
}

/// Binds an `<input id>` inside the continuation form to a token slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputBinding {
    pub id: String,
    pub slot: TokenSlot,
}

/// The form on the confirmation page that carries the session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationForm {
    /// Exact `action` attribute of the form to use.
    pub form_action: String,
    pub inputs: Vec<InputBinding>,
}

/// One value pulled out of a marked container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    /// Must match exactly one element inside the container.
    pub selector: String,
    pub field: RecordField,
    /// Label printed before the value, removed after trimming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelBinding {
    /// Substring of the item's text identifying the field.
    pub label: String,
    pub field: RecordField,
}

/// A single extraction rule evaluated against the content region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionRule {
    /// The trimmed text of the element `selector` matches, when it matches
    /// exactly one.
    Unique {
        selector: String,
        field: RecordField,
        requirement: Requirement,
    },
    /// Containers whose text includes `marker` supply `captures`.
    Marked {
        container: String,
        marker: String,
        policy: MatchPolicy,
        requirement: Requirement,
        captures: Vec<Capture>,
    },
    /// A list of items, each holding exactly one `value` element and a label
    /// naming the field it fills. Labels are tried in order, first match wins.
    LabelledList {
        container: String,
        item: String,
        value: String,
        requirement: Requirement,
        labels: Vec<LabelBinding>,
    },
}

impl ExtractionRule {
    pub fn requirement(&self) -> Requirement {
        match self {
            ExtractionRule::Unique { requirement, .. }
            | ExtractionRule::Marked { requirement, .. }
            | ExtractionRule::LabelledList { requirement, .. } => *requirement,
        }
    }
}

/// Full description of the markup both stages depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLayout {
    pub continuation: ContinuationForm,
    /// Selector for the primary content region of the details page.
    pub region: String,
    pub rules: Vec<ExtractionRule>,
}

impl PageLayout {
    /// The layout embedded in the library.
    pub fn embedded() -> EnquiryResult<Self> {
        Self::from_json(DEFAULT_LAYOUT_JSON)
    }

    pub fn from_json(json: &str) -> EnquiryResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| EnquiryError::Layout(format!("invalid layout document: {e}")))
    }

    pub fn from_path(path: &Path) -> EnquiryResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            EnquiryError::Layout(format!("cannot read layout {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> EnquiryResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EnquiryError::Layout(format!("cannot serialize layout: {e}")))
    }

    /// Parse every selector and check the continuation form binds all four
    /// token slots.
    pub fn compile(&self) -> EnquiryResult<CompiledLayout> {
        for slot in TokenSlot::ALL {
            if !self.continuation.inputs.iter().any(|b| b.slot == slot) {
                return Err(EnquiryError::Layout(format!(
                    "continuation form has no input bound to {slot:?}"
                )));
            }
        }

        let continuation = CompiledContinuation {
            form: compile_selector("form")?,
            input: compile_selector("input")?,
            action: self.continuation.form_action.clone(),
            inputs: self
                .continuation
                .inputs
                .iter()
                .map(|b| (b.id.clone(), b.slot))
                .collect(),
        };

        let rules = self
            .rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<EnquiryResult<Vec<_>>>()?;

        Ok(CompiledLayout {
            continuation,
            region: compile_selector(&self.region)?,
            region_source: self.region.clone(),
            rules,
        })
    }
}

/// Embedded layout, parsed once per process.
pub fn embedded_layout() -> EnquiryResult<&'static PageLayout> {
    static LAYOUT: OnceLock<Result<PageLayout, String>> = OnceLock::new();
    LAYOUT
        .get_or_init(|| PageLayout::embedded().map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| EnquiryError::Layout(e.clone()))
}

/// A [`PageLayout`] with all selectors parsed.
#[derive(Debug, Clone)]
pub struct CompiledLayout {
    pub(crate) continuation: CompiledContinuation,
    pub(crate) region: Selector,
    pub(crate) region_source: String,
    pub(crate) rules: Vec<CompiledRule>,
}

impl CompiledLayout {
    /// Compile the embedded layout.
    pub fn embedded() -> EnquiryResult<Self> {
        embedded_layout()?.compile()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledContinuation {
    pub(crate) form: Selector,
    pub(crate) input: Selector,
    pub(crate) action: String,
    pub(crate) inputs: Vec<(String, TokenSlot)>,
}

impl CompiledContinuation {
    pub(crate) fn slot_for(&self, id: &str) -> Option<TokenSlot> {
        self.inputs
            .iter()
            .find(|(bound, _)| bound == id)
            .map(|(_, slot)| *slot)
    }
}

/// A selector kept next to its source text for error messages.
#[derive(Debug, Clone)]
pub(crate) struct NamedSelector {
    pub(crate) selector: Selector,
    pub(crate) source: String,
}

impl NamedSelector {
    fn compile(source: &str) -> EnquiryResult<Self> {
        Ok(Self {
            selector: compile_selector(source)?,
            source: source.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledCapture {
    pub(crate) selector: Selector,
    pub(crate) field: RecordField,
    pub(crate) strip_prefix: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) enum CompiledRule {
    Unique {
        selector: NamedSelector,
        field: RecordField,
        requirement: Requirement,
    },
    Marked {
        container: NamedSelector,
        marker: String,
        policy: MatchPolicy,
        requirement: Requirement,
        captures: Vec<CompiledCapture>,
    },
    LabelledList {
        container: NamedSelector,
        item: Selector,
        value: NamedSelector,
        requirement: Requirement,
        labels: Vec<(String, RecordField)>,
    },
}

impl CompiledRule {
    fn compile(rule: &ExtractionRule) -> EnquiryResult<Self> {
        let compiled = match rule {
            ExtractionRule::Unique {
                selector,
                field,
                requirement,
            } => CompiledRule::Unique {
                selector: NamedSelector::compile(selector)?,
                field: *field,
                requirement: *requirement,
            },
            ExtractionRule::Marked {
                container,
                marker,
                policy,
                requirement,
                captures,
            } => CompiledRule::Marked {
                container: NamedSelector::compile(container)?,
                marker: marker.clone(),
                policy: *policy,
                requirement: *requirement,
                captures: captures
                    .iter()
                    .map(|c| {
                        Ok(CompiledCapture {
                            selector: compile_selector(&c.selector)?,
                            field: c.field,
                            strip_prefix: c.strip_prefix.clone(),
                        })
                    })
                    .collect::<EnquiryResult<Vec<_>>>()?,
            },
            ExtractionRule::LabelledList {
                container,
                item,
                value,
                requirement,
                labels,
            } => CompiledRule::LabelledList {
                container: NamedSelector::compile(container)?,
                item: compile_selector(item)?,
                value: NamedSelector::compile(value)?,
                requirement: *requirement,
                labels: labels
                    .iter()
                    .map(|l| (l.label.clone(), l.field))
                    .collect(),
            },
        };
        Ok(compiled)
    }
}
