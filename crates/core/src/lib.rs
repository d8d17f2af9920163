//! App event model, construction presets, advertiser identity, and the
//! shared error and configuration types.
//!
//! # Modules
//!
//! - [`model`] — Event and content item records with their wire field names
//! - [`factory`] — Preset constructors and the custom event builder
//! - [`identity`] — Advertiser identity provider capability and snapshot
//! - [`config`] — Client configuration loaded from env and TOML

pub mod config;
pub mod error;
pub mod factory;
pub mod identity;
pub mod model;

pub use config::AppEventsConfig;
pub use error::{AppEventsError, AppEventsResult};
pub use factory::{AppEventBuilder, EventOverrides, EventPreset};
pub use identity::{AdvertiserIdentityProvider, IdentitySnapshot};
pub use model::{AppEvent, ContentItem};
pub use rust_decimal::Decimal;
