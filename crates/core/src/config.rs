use serde::Deserialize;
use url::Url;

use crate::error::{AppEventsError, AppEventsResult};

/// Root configuration for an app-events client. Loaded from environment
/// variables with the prefix `APP_EVENTS__` and an optional TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppEventsConfig {
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub client_token: String,
    #[serde(default)]
    pub graph: GraphApiConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Location of the Graph API activities endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Fixed advertiser identity for hosts without a platform lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub advertiser_id: Option<String>,
    #[serde(default)]
    pub tracking_enabled: bool,
}

fn default_base_url() -> String {
    "https://graph.facebook.com".to_string()
}
fn default_api_version() -> String {
    "v23.0".to_string()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for GraphApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl GraphApiConfig {
    /// `{base_url}/{api_version}/{app_id}/activities`
    pub fn activities_url(&self, app_id: &str) -> AppEventsResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| {
                AppEventsError::Config(format!(
                    "graph base_url '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend([self.api_version.as_str(), app_id, "activities"]);
        Ok(url)
    }
}

impl AppEventsConfig {
    /// Load configuration from environment variables only.
    pub fn load() -> AppEventsResult<Self> {
        Self::load_with_file(None)
    }

    /// Load configuration from an optional TOML file, overridden by
    /// `APP_EVENTS__*` environment variables.
    pub fn load_with_file(path: Option<&str>) -> AppEventsResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix("APP_EVENTS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Reject configurations that could never authenticate against the endpoint.
    pub fn validate(&self) -> AppEventsResult<()> {
        if self.app_id.trim().is_empty() {
            return Err(AppEventsError::invalid_argument("app_id must not be empty"));
        }
        if self.client_token.trim().is_empty() {
            return Err(AppEventsError::invalid_argument(
                "client_token must not be empty",
            ));
        }
        self.graph.activities_url(&self.app_id)?;
        Ok(())
    }
}
