//! App event records as reported to the Graph API activities endpoint.
//!
//! Field names on the wire are fixed by the remote system; absent optional
//! fields are omitted rather than sent as `null`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One reportable user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppEvent {
    /// Event semantics for the remote system, e.g. `fb_mobile_purchase`.
    #[serde(rename = "_eventName")]
    pub name: String,
    /// De-duplication key, unique per event instance.
    #[serde(rename = "event_id")]
    pub id: String,
    #[serde(
        rename = "fb_content",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub contents: Option<Vec<ContentItem>>,
    #[serde(
        rename = "fb_content_type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<String>,
    /// Monetary amount, written with its exact decimal digits. Not
    /// cross-checked against `currency`.
    #[serde(
        rename = "_valueToSum",
        default,
        with = "rust_decimal::serde::arbitrary_precision_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Decimal>,
    /// ISO 4217 code; format is left to the remote system.
    #[serde(
        rename = "fb_currency",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub currency: Option<String>,
}

/// One item within an event: a product SKU, a screen name, a search string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub quantity: Decimal,
}

impl ContentItem {
    pub fn new(id: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            id: id.into(),
            quantity,
        }
    }

    /// An item with quantity 1.
    pub fn single(id: impl Into<String>) -> Self {
        Self::new(id, Decimal::ONE)
    }
}

impl AppEvent {
    /// Whether the event carries a usable name.
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn content_count(&self) -> usize {
        self.contents.as_ref().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_event() -> AppEvent {
        AppEvent {
            name: "fb_mobile_complete_registration".into(),
            id: "login-1".into(),
            contents: None,
            content_type: None,
            value: None,
            currency: None,
        }
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let json = serde_json::to_value(bare_event()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["_eventName"], "fb_mobile_complete_registration");
        assert_eq!(obj["event_id"], "login-1");
    }

    #[test]
    fn test_all_fields_use_wire_names() {
        let event = AppEvent {
            name: "fb_mobile_purchase".into(),
            id: "purchase-1".into(),
            contents: Some(vec![ContentItem::new("sku-1", Decimal::new(2, 0))]),
            content_type: Some("product".into()),
            value: Some(Decimal::new(5998, 2)),
            currency: Some("EUR".into()),
        };
        let json = serde_json::to_value(&event).unwrap();
        let obj = json.as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "_eventName",
                "_valueToSum",
                "event_id",
                "fb_content",
                "fb_content_type",
                "fb_currency"
            ]
        );
        assert_eq!(obj["_valueToSum"].as_f64(), Some(59.98));
        assert_eq!(obj["fb_content"][0]["id"], "sku-1");
        assert_eq!(obj["fb_content"][0]["quantity"].as_f64(), Some(2.0));
    }

    #[test]
    fn test_value_keeps_every_digit() {
        let event = AppEvent {
            value: Some("12345678901234567.89".parse().unwrap()),
            contents: Some(vec![ContentItem::new(
                "sku-1",
                "3.3333333333333333333333333333".parse().unwrap(),
            )]),
            ..bare_event()
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""_valueToSum":12345678901234567.89"#));
        assert!(json.contains(r#""quantity":3.3333333333333333333333333333"#));

        let parsed: AppEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_value_without_currency_is_legal() {
        let event = AppEvent {
            value: Some(Decimal::new(10, 0)),
            ..bare_event()
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("_valueToSum").is_some());
        assert!(json.get("fb_currency").is_none());
    }

    #[test]
    fn test_parse_wire_form() {
        let parsed: AppEvent = serde_json::from_str(
            r#"{"_eventName":"fb_mobile_search","event_id":"search-9","fb_content":[{"id":"shoes","quantity":1}],"fb_content_type":"search"}"#,
        )
        .unwrap();
        assert_eq!(parsed.name, "fb_mobile_search");
        assert_eq!(parsed.content_count(), 1);
        assert_eq!(parsed.contents.unwrap()[0].quantity, Decimal::ONE);
        assert!(parsed.value.is_none());
    }

    #[test]
    fn test_has_name() {
        assert!(bare_event().has_name());
        let blank = AppEvent {
            name: "   ".into(),
            ..bare_event()
        };
        assert!(!blank.has_name());
    }
}
