//! Stage 2: submit the continuation tokens and extract a [`VehicleRecord`]
//! from the details page.
//!
//! The page is narrowed to the layout's content region and every rule of
//! the layout is evaluated against it in order. Rules tagged `required` fail
//! the extraction when their container is absent; `optional` rules leave
//! their fields empty. A labelled item without exactly one value element is
//! always fatal and stops the remaining items.

use scraper::ElementRef;

use crate::config::{EnquiryConfig, CONFIRMATION_FLAG};
use crate::http_client::{HttpClient, HttpResponse};
use crate::layout::{CompiledCapture, CompiledLayout, CompiledRule, MatchPolicy, Requirement};
use crate::markup::{parse_document, raw_text, trimmed_text};
use crate::types::{EnquiryError, EnquiryResult, RecordField, SessionTokenSet, VehicleRecord};

/// Post the tokens to the details endpoint and return the page unparsed.
pub async fn post_details(
    http: &HttpClient,
    config: &EnquiryConfig,
    tokens: SessionTokenSet,
) -> EnquiryResult<HttpResponse> {
    let form = tokens.into_form_fields(CONFIRMATION_FLAG);
    let page = http.post_form(&config.view_url(), &form).await?;
    tracing::debug!("details page: HTTP {}, {} bytes", page.status, page.body.len());
    Ok(page)
}

/// Post the tokens and extract the record from the resulting page.
pub async fn fetch_details(
    http: &HttpClient,
    config: &EnquiryConfig,
    layout: &CompiledLayout,
    tokens: SessionTokenSet,
) -> EnquiryResult<VehicleRecord> {
    let page = post_details(http, config, tokens).await?;
    parse_details(&page.body, layout)
}

/// Run the layout's rules over a details page.
pub fn parse_details(html: &str, layout: &CompiledLayout) -> EnquiryResult<VehicleRecord> {
    let document = parse_document(html)?;
    let region = document.select(&layout.region).next();
    if region.is_none() {
        tracing::warn!("details page has no `{}` region", layout.region_source);
    }

    let mut record = VehicleRecord::default();
    for rule in &layout.rules {
        apply_rule(rule, region, &mut record)?;
    }
    Ok(record)
}

fn apply_rule(
    rule: &CompiledRule,
    region: Option<ElementRef<'_>>,
    record: &mut VehicleRecord,
) -> EnquiryResult<()> {
    match rule {
        CompiledRule::Unique {
            selector,
            field,
            requirement,
        } => {
            let matches: Vec<ElementRef<'_>> = region
                .map(|r| r.select(&selector.selector).collect())
                .unwrap_or_default();

            match matches.as_slice() {
                [only] => record.set(*field, trimmed_text(only)),
                [] if *requirement == Requirement::Required => {
                    return Err(EnquiryError::DetailsNotFound {
                        selector: selector.source.clone(),
                    });
                }
                many if *requirement == Requirement::Required => {
                    return Err(EnquiryError::MalformedItem {
                        index: 0,
                        found: many.len(),
                        selector: selector.source.clone(),
                    });
                }
                _ => tracing::debug!(
                    "`{}` matched {} elements, {field:?} left empty",
                    selector.source,
                    matches.len()
                ),
            }
        }

        CompiledRule::Marked {
            container,
            marker,
            policy,
            requirement,
            captures,
        } => {
            let mut matched = false;
            if let Some(region) = region {
                for candidate in region.select(&container.selector) {
                    if !raw_text(&candidate).contains(marker.as_str()) {
                        continue;
                    }
                    matched = true;
                    apply_captures(candidate, captures, record);
                    if *policy == MatchPolicy::First {
                        break;
                    }
                }
            }

            if !matched {
                if *requirement == Requirement::Required {
                    return Err(EnquiryError::DetailsNotFound {
                        selector: container.source.clone(),
                    });
                }
                tracing::debug!("no `{}` mentions {marker:?}", container.source);
            }
        }

        CompiledRule::LabelledList {
            container,
            item,
            value,
            requirement,
            labels,
        } => {
            let Some(list) = region.and_then(|r| r.select(&container.selector).next()) else {
                if *requirement == Requirement::Required {
                    return Err(EnquiryError::DetailsNotFound {
                        selector: container.source.clone(),
                    });
                }
                return Ok(());
            };

            let mut populated = 0usize;
            for (index, entry) in list.select(item).enumerate() {
                let values: Vec<ElementRef<'_>> = entry.select(&value.selector).collect();
                let [value_el] = values.as_slice() else {
                    return Err(EnquiryError::MalformedItem {
                        index,
                        found: values.len(),
                        selector: value.source.clone(),
                    });
                };

                let text = raw_text(&entry);
                if let Some(field) = match_label(&text, labels) {
                    record.set(field, trimmed_text(value_el));
                    populated += 1;
                }
            }
            tracing::debug!("populated {populated} of {} labelled fields", labels.len());
        }
    }
    Ok(())
}

/// Values are taken only from captures matching exactly one element, so a
/// later container without a value does not erase an earlier one.
fn apply_captures(container: ElementRef<'_>, captures: &[CompiledCapture], record: &mut VehicleRecord) {
    for capture in captures {
        let found: Vec<ElementRef<'_>> = container.select(&capture.selector).collect();
        let [only] = found.as_slice() else {
            continue;
        };

        let mut text = trimmed_text(only);
        if let Some(prefix) = &capture.strip_prefix {
            if let Some(rest) = text.strip_prefix(prefix.as_str()) {
                text = rest.trim().to_string();
            }
        }
        record.set(capture.field, text);
    }
}

fn match_label(text: &str, labels: &[(String, RecordField)]) -> Option<RecordField> {
    labels
        .iter()
        .find(|(label, _)| text.contains(label.as_str()))
        .map(|(_, field)| *field)
}
