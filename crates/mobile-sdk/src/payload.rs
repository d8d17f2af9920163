//! Form body for the Graph API `activities` endpoint.

use appevents_core::{AppEvent, AppEventsError, AppEventsResult, IdentitySnapshot};

/// Value of the `event` field for app-reported custom events.
pub const CUSTOM_APP_EVENTS: &str = "CUSTOM_APP_EVENTS";

/// Ordered form fields of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitiesForm {
    fields: Vec<(&'static str, String)>,
}

impl ActivitiesForm {
    /// Build the form for `events`.
    ///
    /// Fails with `InvalidArgument` on an empty batch or an event without a
    /// name. `custom_events` carries the batch as a JSON array.
    pub fn encode(
        app_id: &str,
        client_token: &str,
        identity: &IdentitySnapshot,
        events: &[AppEvent],
    ) -> AppEventsResult<Self> {
        if events.is_empty() {
            return Err(AppEventsError::invalid_argument(
                "at least one app event must be provided",
            ));
        }
        if let Some(unnamed) = events.iter().find(|e| !e.has_name()) {
            return Err(AppEventsError::InvalidArgument(format!(
                "event '{}' has an empty name",
                unnamed.id
            )));
        }

        let custom_events = serde_json::to_string(events)?;
        let tracking = identity.tracking_flag();

        Ok(Self {
            fields: vec![
                ("event", CUSTOM_APP_EVENTS.to_string()),
                ("app_id", app_id.to_string()),
                ("client_token", client_token.to_string()),
                ("advertiser_id", identity.advertiser_id_or_empty().to_string()),
                ("advertiser_tracking_enabled", tracking.to_string()),
                ("application_tracking_enabled", tracking.to_string()),
                ("custom_events", custom_events),
            ],
        })
    }

    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}
