//! Advertiser identity: the per-device advertising identifier (IDFA/GAID)
//! and the user's tracking consent.
//!
//! Platform lookups live behind [`AdvertiserIdentityProvider`]. The host picks
//! one implementation at startup; submissions query it afresh every time.

use async_trait::async_trait;

use crate::config::IdentityConfig;

/// Identifier value platforms report when the user opted out.
pub const ZEROED_ADVERTISER_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Source of the advertising identifier and tracking consent.
///
/// Implementations must not fail: platform errors resolve to `None` / `false`.
#[async_trait]
pub trait AdvertiserIdentityProvider: Send + Sync {
    async fn advertiser_id(&self) -> Option<String>;

    async fn is_tracking_enabled(&self) -> bool;
}

/// Identity resolved for a single submission. Never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentitySnapshot {
    pub advertiser_id: Option<String>,
    pub tracking_enabled: bool,
}

impl IdentitySnapshot {
    pub fn new(advertiser_id: Option<String>, tracking_enabled: bool) -> Self {
        Self {
            advertiser_id,
            tracking_enabled,
        }
    }

    /// Query both values from `provider`.
    pub async fn resolve(provider: &dyn AdvertiserIdentityProvider) -> Self {
        let advertiser_id = provider.advertiser_id().await;
        let tracking_enabled = provider.is_tracking_enabled().await;
        Self {
            advertiser_id,
            tracking_enabled,
        }
    }

    /// The identifier as sent on the wire: empty when absent.
    pub fn advertiser_id_or_empty(&self) -> &str {
        self.advertiser_id.as_deref().unwrap_or_default()
    }

    /// `"1"` or `"0"`.
    pub fn tracking_flag(&self) -> &'static str {
        if self.tracking_enabled {
            "1"
        } else {
            "0"
        }
    }
}

/// Map a raw platform identifier to `None` when it is blank or the all-zero
/// opt-out sentinel.
pub fn normalize_advertiser_id(raw: Option<&str>) -> Option<String> {
    let id = raw?.trim();
    if id.is_empty() || id == ZEROED_ADVERTISER_ID {
        return None;
    }
    Some(id.to_string())
}

/// Provider with fixed answers, for hosts that learn the identity out of band.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    advertiser_id: Option<String>,
    tracking_enabled: bool,
}

impl StaticIdentityProvider {
    pub fn new(advertiser_id: Option<&str>, tracking_enabled: bool) -> Self {
        Self {
            advertiser_id: normalize_advertiser_id(advertiser_id),
            tracking_enabled,
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(config.advertiser_id.as_deref(), config.tracking_enabled)
    }
}

#[async_trait]
impl AdvertiserIdentityProvider for StaticIdentityProvider {
    async fn advertiser_id(&self) -> Option<String> {
        self.advertiser_id.clone()
    }

    async fn is_tracking_enabled(&self) -> bool {
        self.tracking_enabled
    }
}

/// Provider for platforms with no advertising identifier: always absent,
/// tracking always off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeniedIdentityProvider;

#[async_trait]
impl AdvertiserIdentityProvider for DeniedIdentityProvider {
    async fn advertiser_id(&self) -> Option<String> {
        None
    }

    async fn is_tracking_enabled(&self) -> bool {
        false
    }
}
