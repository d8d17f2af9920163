//! Process-wide sender slot for call sites that cannot hold a sender, such
//! as UI event handlers.
//!
//! The slot starts empty and is filled at most once, by
//! [`EventSenderBuilder::build_global`](crate::EventSenderBuilder::build_global)
//! or [`install`]. There is no reset. Code that can be handed an
//! `Arc<EventSender>` should call [`EventSender::dispatch`] on it instead.

use std::sync::Arc;

use appevents_core::{AppEvent, AppEventsError, AppEventsResult};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::sender::EventSender;

static INSTALLED: OnceCell<Arc<EventSender>> = OnceCell::new();

/// Claim the slot for `sender`. Returns `false` if another sender already
/// holds it; the existing sender stays in place.
pub fn install(sender: Arc<EventSender>) -> bool {
    let app_id = sender.app_id().to_string();
    match INSTALLED.set(sender) {
        Ok(()) => {
            info!(app_id = %app_id, "process-wide event sender installed");
            true
        }
        Err(_) => {
            warn!(app_id = %app_id, "process-wide event sender already installed, keeping the first");
            false
        }
    }
}

pub fn installed() -> Option<Arc<EventSender>> {
    INSTALLED.get().cloned()
}

pub fn is_initialized() -> bool {
    INSTALLED.get().is_some()
}

/// Fire-and-forget `events` through the installed sender.
///
/// Fails with `InvalidOperation` before a sender is installed or outside a
/// tokio runtime. Once spawned, the submission's outcome never reaches the
/// caller; see [`EventSender::dispatch`].
pub fn dispatch(events: Vec<AppEvent>) -> AppEventsResult<()> {
    let sender = INSTALLED.get().ok_or_else(|| {
        AppEventsError::invalid_operation(
            "event sender not initialized; build one with EventSenderBuilder::build_global first",
        )
    })?;
    sender.dispatch(events)
}
