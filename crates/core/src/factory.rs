//! Event construction: named presets for the standard mobile events plus a
//! builder for fully caller-specified custom events.
//!
//! Preset constructors never fail. Only [`AppEventBuilder::build`] validates,
//! because only there does the caller choose the event name.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{AppEventsError, AppEventsResult};
use crate::model::{AppEvent, ContentItem};

/// Standard event kinds and their default wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPreset {
    Purchase,
    AddToCart,
    RemoveFromCart,
    ScreenView,
    Login,
    Search,
}

impl EventPreset {
    pub fn event_name(self) -> &'static str {
        match self {
            EventPreset::Purchase => "fb_mobile_purchase",
            EventPreset::AddToCart => "fb_mobile_add_to_cart",
            EventPreset::RemoveFromCart => "fb_mobile_remove_from_cart",
            EventPreset::ScreenView => "fb_mobile_content_view",
            EventPreset::Login => "fb_mobile_complete_registration",
            EventPreset::Search => "fb_mobile_search",
        }
    }

    pub fn content_type(self) -> Option<&'static str> {
        match self {
            EventPreset::Purchase | EventPreset::AddToCart | EventPreset::RemoveFromCart => {
                Some("product")
            }
            EventPreset::ScreenView => Some("screen"),
            EventPreset::Search => Some("search"),
            EventPreset::Login => None,
        }
    }

    /// Prefix of generated event ids, e.g. `purchase-<uuid>`.
    pub fn id_prefix(self) -> &'static str {
        match self {
            EventPreset::Purchase => "purchase",
            EventPreset::AddToCart => "addtocart",
            EventPreset::RemoveFromCart => "removefromcart",
            EventPreset::ScreenView => "screenview",
            EventPreset::Login => "login",
            EventPreset::Search => "search",
        }
    }

    pub fn generate_id(self) -> String {
        format!("{}-{}", self.id_prefix(), Uuid::new_v4())
    }

    /// Start an event carrying this preset's defaults, with `overrides` applied.
    fn start(self, overrides: EventOverrides) -> AppEvent {
        let name = overrides
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.event_name().to_string());
        AppEvent {
            name,
            id: overrides.id.unwrap_or_else(|| self.generate_id()),
            contents: None,
            content_type: overrides
                .content_type
                .or_else(|| self.content_type().map(str::to_string)),
            value: None,
            currency: None,
        }
    }
}

/// Optional replacements for a preset's defaults. A blank `name` keeps the
/// preset name.
#[derive(Debug, Clone, Default)]
pub struct EventOverrides {
    pub id: Option<String>,
    pub content_type: Option<String>,
    pub name: Option<String>,
}

impl EventOverrides {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

/// A completed purchase of `contents` for `total_value` in `currency`.
pub fn purchase(
    contents: Vec<ContentItem>,
    total_value: Decimal,
    currency: impl Into<String>,
    overrides: EventOverrides,
) -> AppEvent {
    AppEvent {
        contents: Some(contents),
        value: Some(total_value),
        currency: Some(currency.into()),
        ..EventPreset::Purchase.start(overrides)
    }
}

pub fn add_to_cart(contents: Vec<ContentItem>, overrides: EventOverrides) -> AppEvent {
    AppEvent {
        contents: Some(contents),
        ..EventPreset::AddToCart.start(overrides)
    }
}

pub fn remove_from_cart(contents: Vec<ContentItem>, overrides: EventOverrides) -> AppEvent {
    AppEvent {
        contents: Some(contents),
        ..EventPreset::RemoveFromCart.start(overrides)
    }
}

/// A view of `screen_name`, carried as a single content item.
pub fn screen_view(screen_name: impl Into<String>, overrides: EventOverrides) -> AppEvent {
    AppEvent {
        contents: Some(vec![ContentItem::single(screen_name)]),
        ..EventPreset::ScreenView.start(overrides)
    }
}

/// Login or registration completion. Carries no content.
pub fn login(overrides: EventOverrides) -> AppEvent {
    EventPreset::Login.start(overrides)
}

/// A search for `search_term`, carried as a single content item.
pub fn search(search_term: impl Into<String>, overrides: EventOverrides) -> AppEvent {
    AppEvent {
        contents: Some(vec![ContentItem::single(search_term)]),
        ..EventPreset::Search.start(overrides)
    }
}

/// Builder for custom events. Every field besides the name is optional.
#[derive(Debug, Clone)]
pub struct AppEventBuilder {
    name: String,
    id: Option<String>,
    content_type: Option<String>,
    contents: Option<Vec<ContentItem>>,
    value: Option<Decimal>,
    currency: Option<String>,
}

impl AppEvent {
    pub fn builder(name: impl Into<String>) -> AppEventBuilder {
        AppEventBuilder::new(name)
    }
}

impl AppEventBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            content_type: None,
            contents: None,
            value: None,
            currency: None,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn contents(mut self, contents: Vec<ContentItem>) -> Self {
        self.contents = Some(contents);
        self
    }

    pub fn content(mut self, item: ContentItem) -> Self {
        self.contents.get_or_insert_with(Vec::new).push(item);
        self
    }

    pub fn value(mut self, value: Decimal) -> Self {
        self.value = Some(value);
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Fails with `InvalidArgument` when the name is empty or whitespace.
    /// Without an explicit id a bare UUID is generated.
    pub fn build(self) -> AppEventsResult<AppEvent> {
        if self.name.trim().is_empty() {
            return Err(AppEventsError::invalid_argument(
                "event name cannot be empty or whitespace",
            ));
        }
        Ok(AppEvent {
            name: self.name,
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            contents: self.contents,
            content_type: self.content_type,
            value: self.value,
            currency: self.currency,
        })
    }
}

/// Fully caller-specified event.
pub fn custom(
    name: impl Into<String>,
    id: Option<String>,
    content_type: Option<String>,
    contents: Option<Vec<ContentItem>>,
    value: Option<Decimal>,
    currency: Option<String>,
) -> AppEventsResult<AppEvent> {
    AppEventBuilder {
        name: name.into(),
        id,
        content_type,
        contents,
        value,
        currency,
    }
    .build()
}
