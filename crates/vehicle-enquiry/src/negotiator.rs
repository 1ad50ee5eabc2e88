//! Stage 1: submit the registration mark and recover the continuation tokens
//! from the confirmation page.

use crate::config::EnquiryConfig;
use crate::http_client::HttpClient;
use crate::layout::CompiledLayout;
use crate::markup::parse_document;
use crate::types::{EnquiryResult, SessionTokenSet, TokenSlot};

/// Post the mark to the confirmation endpoint and parse the tokens out of
/// the response. The mark is sent as given; the service validates it.
pub async fn negotiate(
    http: &HttpClient,
    config: &EnquiryConfig,
    layout: &CompiledLayout,
    registration_mark: &str,
) -> EnquiryResult<SessionTokenSet> {
    let form = [
        ("Vrm".to_string(), registration_mark.to_string()),
        ("Continue".to_string(), String::new()),
    ];
    let page = http.post_form(&config.confirm_url(), &form).await?;
    tracing::debug!(
        "confirmation page: HTTP {}, {} bytes",
        page.status,
        page.body.len()
    );
    parse_continuation(&page.body, layout)
}

/// Find the first form whose `action` equals the layout's continuation
/// action and read the bound inputs' `value` attributes verbatim.
pub fn parse_continuation(html: &str, layout: &CompiledLayout) -> EnquiryResult<SessionTokenSet> {
    let document = parse_document(html)?;
    let continuation = &layout.continuation;

    let mut values: [String; 4] = Default::default();

    let form = document
        .select(&continuation.form)
        .find(|form| form.value().attr("action") == Some(continuation.action.as_str()));

    match form {
        Some(form) => {
            for input in form.select(&continuation.input) {
                let Some(slot) = input.value().attr("id").and_then(|id| continuation.slot_for(id)) else {
                    continue;
                };
                values[slot_index(slot)] = input.value().attr("value").unwrap_or("").to_string();
            }
        }
        None => {
            tracing::warn!("no form with action {} on confirmation page", continuation.action);
        }
    }

    let [state_token, registration, make, colour] = values;
    let tokens = SessionTokenSet::new(state_token, registration, make, colour)?;
    tracing::debug!("recovered continuation tokens for {}", tokens.registration());
    Ok(tokens)
}

fn slot_index(slot: TokenSlot) -> usize {
    match slot {
        TokenSlot::StateToken => 0,
        TokenSlot::Registration => 1,
        TokenSlot::Make => 2,
        TokenSlot::Colour => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnquiryError;

    fn layout() -> CompiledLayout {
        CompiledLayout::embedded().unwrap()
    }

    const CONFIRM_PAGE: &str = r#"
    <html><body><main>
        <form action="/Search" method="post">
            <input type="text" id="Vrm" name="Vrm" value="IGNORED" />
        </form>
        <form action="/ViewVehicle" method="post">
            <input type="hidden" id="viewstate" name="viewstate" value="tok1" />
            <input type="hidden" id="Vrm" name="Vrm" value="AB12CDE" />
            <input type="hidden" id="Make" name="Make" value="FORD" />
            <input type="hidden" id="Colour" name="Colour" value="BLUE" />
            <input type="radio" id="Correct_True" name="Correct" value="True" />
            <button type="submit" name="Continue">Continue</button>
        </form>
    </main></body></html>
    "#;

    #[test]
    fn test_parse_continuation_complete_form() {
        let tokens = parse_continuation(CONFIRM_PAGE, &layout()).unwrap();
        assert_eq!(tokens.state_token(), "tok1");
        assert_eq!(tokens.registration(), "AB12CDE");
        assert_eq!(tokens.make(), "FORD");
        assert_eq!(tokens.colour(), "BLUE");
        assert!(tokens.confirmed());
    }

    #[test]
    fn test_values_are_kept_verbatim() {
        let html = r#"
        <form action="/ViewVehicle">
            <input id="viewstate" value=" /wEPDw== " />
            <input id="Vrm" value="ab12 cde" />
            <input id="Make" value="LAND ROVER " />
            <input id="Colour" value="dark  GREY" />
        </form>
        "#;
        let tokens = parse_continuation(html, &layout()).unwrap();
        assert_eq!(tokens.state_token(), " /wEPDw== ");
        assert_eq!(tokens.registration(), "ab12 cde");
        assert_eq!(tokens.make(), "LAND ROVER ");
        assert_eq!(tokens.colour(), "dark  GREY");
    }

    #[test]
    fn test_wrong_action_is_continuation_not_found() {
        let html = r#"
        <form action="/ViewVehicleDetails">
            <input id="viewstate" value="tok1" />
            <input id="Vrm" value="AB12CDE" />
            <input id="Make" value="FORD" />
            <input id="Colour" value="BLUE" />
        </form>
        <form action="/Feedback"><input id="viewstate" value="tok2" /></form>
        "#;
        match parse_continuation(html, &layout()) {
            Err(EnquiryError::ContinuationNotFound { missing }) => {
                assert_eq!(missing, vec!["viewstate", "Vrm", "Make", "Colour"]);
            }
            other => panic!("expected ContinuationNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_only_first_matching_form_is_used() {
        let html = r#"
        <form action="/ViewVehicle">
            <input id="viewstate" value="first" />
            <input id="Vrm" value="AB12CDE" />
            <input id="Make" value="FORD" />
        </form>
        <form action="/ViewVehicle">
            <input id="viewstate" value="second" />
            <input id="Vrm" value="AB12CDE" />
            <input id="Make" value="FORD" />
            <input id="Colour" value="BLUE" />
        </form>
        "#;
        match parse_continuation(html, &layout()) {
            Err(EnquiryError::ContinuationNotFound { missing }) => {
                assert_eq!(missing, vec!["Colour"]);
            }
            other => panic!("expected ContinuationNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_input_without_value_counts_as_missing() {
        let html = r#"
        <form action="/ViewVehicle">
            <input id="viewstate" value="tok1" />
            <input id="Vrm" value="AB12CDE" />
            <input id="Make" />
            <input id="Colour" value="" />
        </form>
        "#;
        match parse_continuation(html, &layout()) {
            Err(EnquiryError::ContinuationNotFound { missing }) => {
                assert_eq!(missing, vec!["Make", "Colour"]);
            }
            other => panic!("expected ContinuationNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_error_page_is_continuation_not_found() {
        let html = "<html><body><h1>Too many requests</h1></body></html>";
        assert!(matches!(
            parse_continuation(html, &layout()),
            Err(EnquiryError::ContinuationNotFound { .. })
        ));
    }

    #[test]
    fn test_empty_body_is_parse_error() {
        assert!(matches!(
            parse_continuation("", &layout()),
            Err(EnquiryError::Parse(_))
        ));
    }
}
