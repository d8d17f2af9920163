//! Event sender — resolves advertiser identity, encodes a batch into the
//! activities form, posts it, and classifies the answer.
//!
//! Outcomes of an awaited submission:
//! - `Ok(true)`: the endpoint answered 2xx
//! - `Ok(false)`: the endpoint answered anything else; status and body are logged
//! - `Err(Network)`: the request never got an answer
//!
//! [`EventSender::dispatch`] is the fire-and-forget variant. It returns as soon
//! as the submission is spawned; its outcome only reaches the logs and the
//! optional failure callback.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use appevents_core::config::GraphApiConfig;
use appevents_core::identity::StaticIdentityProvider;
use appevents_core::{
    AdvertiserIdentityProvider, AppEvent, AppEventsConfig, AppEventsError, AppEventsResult,
    IdentitySnapshot,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::dispatch;
use crate::payload::ActivitiesForm;
use crate::transport::{HttpTransport, ReqwestTransport};

/// Why a fire-and-forget submission did not go through.
#[derive(Debug)]
pub enum DispatchFailure {
    /// The endpoint answered with a non-2xx status.
    Rejected { event_count: usize },
    /// The submission failed before an answer was received.
    Failed(AppEventsError),
}

/// Callback invoked from the detached task when a dispatch fails.
pub type DispatchFailureCallback = Arc<dyn Fn(&DispatchFailure) + Send + Sync>;

/// Client for the Graph API activities endpoint.
pub struct EventSender {
    transport: Arc<dyn HttpTransport>,
    app_id: String,
    client_token: String,
    endpoint: Url,
    identity_provider: Option<Arc<dyn AdvertiserIdentityProvider>>,
    on_dispatch_failure: Option<DispatchFailureCallback>,
}

impl fmt::Debug for EventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("app_id", &self.app_id)
            .field("endpoint", &self.endpoint.as_str())
            .field("client_token", &"***")
            .field("auto_identity", &self.identity_provider.is_some())
            .finish()
    }
}

impl EventSender {
    pub fn builder() -> EventSenderBuilder {
        EventSenderBuilder::default()
    }

    /// Sender with a reqwest transport and the configured static identity.
    pub fn from_config(config: &AppEventsConfig) -> AppEventsResult<Arc<Self>> {
        config.validate()?;
        let transport = ReqwestTransport::with_timeout(Duration::from_millis(
            config.graph.request_timeout_ms,
        ))?;
        Self::builder()
            .transport(Arc::new(transport))
            .app_id(config.app_id.clone())
            .client_token(config.client_token.clone())
            .graph_config(config.graph.clone())
            .identity_provider(Arc::new(StaticIdentityProvider::from_config(
                &config.identity,
            )))
            .build()
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether [`submit_auto`](Self::submit_auto) can resolve identity itself.
    pub fn has_identity_provider(&self) -> bool {
        self.identity_provider.is_some()
    }

    /// Submit `events` with a caller-supplied identity. An empty
    /// `advertiser_id` means the identifier is unavailable.
    pub async fn submit_with_identity(
        &self,
        advertiser_id: &str,
        tracking_enabled: bool,
        events: &[AppEvent],
    ) -> AppEventsResult<bool> {
        let identity = IdentitySnapshot::new(
            Some(advertiser_id.to_string()).filter(|id| !id.is_empty()),
            tracking_enabled,
        );
        self.submit(&identity, events).await
    }

    /// Submit `events`, resolving identity from the configured provider.
    /// Fails with `InvalidOperation` when no provider was configured.
    pub async fn submit_auto(&self, events: &[AppEvent]) -> AppEventsResult<bool> {
        let provider = self.identity_provider.as_deref().ok_or_else(|| {
            AppEventsError::invalid_operation(
                "an advertiser identity provider must be configured for automatic identity resolution",
            )
        })?;
        let identity = IdentitySnapshot::resolve(provider).await;
        self.submit(&identity, events).await
    }

    /// Spawn [`submit_auto`](Self::submit_auto) on the current tokio runtime
    /// and return without waiting for it.
    ///
    /// The caller cannot observe the outcome: rejections and errors are
    /// logged and handed to the failure callback if one was configured,
    /// otherwise they are dropped. There is no cancellation handle.
    pub fn dispatch(self: &Arc<Self>, events: Vec<AppEvent>) -> AppEventsResult<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            AppEventsError::invalid_operation("fire-and-forget dispatch requires a tokio runtime")
        })?;

        metrics::counter!("appevents.dispatched").increment(1);
        let sender = Arc::clone(self);
        runtime.spawn(async move {
            let outcome = sender.submit_auto(&events).await;
            sender.report_dispatch(outcome, events.len());
        });
        Ok(())
    }

    async fn submit(
        &self,
        identity: &IdentitySnapshot,
        events: &[AppEvent],
    ) -> AppEventsResult<bool> {
        let form = ActivitiesForm::encode(&self.app_id, &self.client_token, identity, events)?;

        let response = match self.transport.post_form(&self.endpoint, form.fields()).await {
            Ok(response) => response,
            Err(e) => {
                metrics::counter!("appevents.transport_errors").increment(1);
                return Err(e);
            }
        };

        if !response.is_success() {
            metrics::counter!("appevents.rejected").increment(1);
            warn!(
                app_id = %self.app_id,
                status = response.status,
                body = %response.body,
                event_count = events.len(),
                "Graph API rejected app events"
            );
            return Ok(false);
        }

        metrics::counter!("appevents.submitted").increment(events.len() as u64);
        debug!(
            app_id = %self.app_id,
            status = response.status,
            event_count = events.len(),
            tracking_enabled = identity.tracking_enabled,
            "app events submitted"
        );
        Ok(true)
    }

    fn report_dispatch(&self, outcome: AppEventsResult<bool>, event_count: usize) {
        let failure = match outcome {
            Ok(true) => return,
            Ok(false) => DispatchFailure::Rejected { event_count },
            Err(e) => {
                warn!(error = %e, event_count, "fire-and-forget app event submission failed");
                DispatchFailure::Failed(e)
            }
        };

        metrics::counter!("appevents.dispatch_failures").increment(1);
        if let Some(callback) = &self.on_dispatch_failure {
            callback(&failure);
        }
    }
}

/// Builder for [`EventSender`]. Transport, app id and client token are
/// required; the identity provider is optional.
#[derive(Default)]
pub struct EventSenderBuilder {
    transport: Option<Arc<dyn HttpTransport>>,
    app_id: Option<String>,
    client_token: Option<String>,
    identity_provider: Option<Arc<dyn AdvertiserIdentityProvider>>,
    graph: GraphApiConfig,
    on_dispatch_failure: Option<DispatchFailureCallback>,
}

impl EventSenderBuilder {
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use an existing reqwest client as the transport.
    pub fn http_client(self, client: reqwest::Client) -> Self {
        self.transport(Arc::new(ReqwestTransport::new(client)))
    }

    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn client_token(mut self, client_token: impl Into<String>) -> Self {
        self.client_token = Some(client_token.into());
        self
    }

    /// Enables [`EventSender::submit_auto`] and [`EventSender::dispatch`].
    pub fn identity_provider(mut self, provider: Arc<dyn AdvertiserIdentityProvider>) -> Self {
        self.identity_provider = Some(provider);
        self
    }

    pub fn graph_config(mut self, graph: GraphApiConfig) -> Self {
        self.graph = graph;
        self
    }

    /// Receive fire-and-forget failures instead of dropping them.
    pub fn on_dispatch_failure(
        mut self,
        callback: impl Fn(&DispatchFailure) + Send + Sync + 'static,
    ) -> Self {
        self.on_dispatch_failure = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> AppEventsResult<Arc<EventSender>> {
        let transport = self.transport.ok_or_else(|| {
            AppEventsError::invalid_argument("an HTTP transport (network client) is required")
        })?;
        let app_id = required(self.app_id, "app_id")?;
        let client_token = required(self.client_token, "client_token")?;
        let endpoint = self.graph.activities_url(&app_id)?;

        info!(
            app_id = %app_id,
            endpoint = %endpoint,
            auto_identity = self.identity_provider.is_some(),
            "event sender initialized"
        );

        Ok(Arc::new(EventSender {
            transport,
            app_id,
            client_token,
            endpoint,
            identity_provider: self.identity_provider,
            on_dispatch_failure: self.on_dispatch_failure,
        }))
    }

    /// Build and claim the process-wide slot used by [`dispatch::dispatch`].
    /// The first sender installed stays installed.
    pub fn build_global(self) -> AppEventsResult<Arc<EventSender>> {
        let sender = self.build()?;
        dispatch::install(Arc::clone(&sender));
        Ok(sender)
    }
}

fn required(value: Option<String>, field: &str) -> AppEventsResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppEventsError::InvalidArgument(format!("{field} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::CaptureTransport;
    use appevents_core::factory::{self, EventOverrides};
    use appevents_core::identity::DeniedIdentityProvider;
    use appevents_core::{ContentItem, Decimal};

    fn sender_with(transport: Arc<CaptureTransport>) -> Arc<EventSender> {
        EventSender::builder()
            .transport(transport)
            .app_id("1234567890")
            .client_token("client-token")
            .build()
            .unwrap()
    }

    fn purchase() -> AppEvent {
        factory::purchase(
            vec![
                ContentItem::new("product-123", Decimal::new(2, 0)),
                ContentItem::new("product-456", Decimal::ONE),
            ],
            Decimal::new(10997, 2),
            "USD",
            EventOverrides::default(),
        )
    }

    #[test]
    fn test_build_requires_transport_app_id_and_token() {
        let err = EventSender::builder()
            .app_id("1")
            .client_token("t")
            .build()
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let transport = Arc::new(CaptureTransport::new());
        let err = EventSender::builder()
            .transport(transport.clone())
            .client_token("t")
            .build()
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = EventSender::builder()
            .transport(transport.clone())
            .app_id("1")
            .build()
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = EventSender::builder()
            .transport(transport)
            .app_id("1")
            .client_token("")
            .build()
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_endpoint_uses_app_id() {
        let sender = sender_with(Arc::new(CaptureTransport::new()));
        assert_eq!(
            sender.endpoint().as_str(),
            "https://graph.facebook.com/v23.0/1234567890/activities"
        );
        assert!(!sender.has_identity_provider());
        assert!(!format!("{sender:?}").contains("client-token"));
    }

    #[tokio::test]
    async fn test_submit_with_identity_form() {
        let transport = Arc::new(CaptureTransport::new());
        let sender = sender_with(transport.clone());

        let accepted = sender
            .submit_with_identity("1234-5678", true, &[purchase()])
            .await
            .unwrap();
        assert!(accepted);

        let request = transport.last().unwrap();
        assert_eq!(
            request.url,
            "https://graph.facebook.com/v23.0/1234567890/activities"
        );
        assert_eq!(request.field("advertiser_id"), Some("1234-5678"));
        assert_eq!(request.field("advertiser_tracking_enabled"), Some("1"));
        assert_eq!(request.field("application_tracking_enabled"), Some("1"));
        assert_eq!(request.field("client_token"), Some("client-token"));

        let events: serde_json::Value =
            serde_json::from_str(request.field("custom_events").unwrap()).unwrap();
        assert_eq!(events.as_array().unwrap().len(), 1);
        assert_eq!(events[0]["_valueToSum"].as_f64(), Some(109.97));
        assert_eq!(events[0]["fb_currency"], "USD");
    }

    #[tokio::test]
    async fn test_non_success_status_reports_false() {
        let transport = Arc::new(CaptureTransport::responding(
            400,
            r#"{"error":{"message":"Invalid OAuth access token"}}"#,
        ));
        let sender = sender_with(transport.clone());
        let accepted = sender
            .submit_with_identity("", false, &[purchase()])
            .await
            .unwrap();
        assert!(!accepted);
        assert_eq!(transport.count(), 1);
    }

    #[tokio::test]
    async fn test_success_status_reports_true() {
        for status in [200, 201, 204] {
            let sender = sender_with(Arc::new(CaptureTransport::responding(status, "")));
            assert!(sender
                .submit_with_identity("", false, &[purchase()])
                .await
                .unwrap());
        }
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let sender = sender_with(Arc::new(CaptureTransport::failing("connection reset")));
        let err = sender
            .submit_with_identity("id", true, &[purchase()])
            .await
            .unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_empty_batch_never_reaches_transport() {
        let transport = Arc::new(CaptureTransport::new());
        let sender = sender_with(transport.clone());
        for (id, tracking) in [("", false), ("1234-5678", true)] {
            let err = sender
                .submit_with_identity(id, tracking, &[])
                .await
                .unwrap_err();
            assert!(err.is_invalid_argument());
        }
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn test_submit_auto_requires_provider() {
        let transport = Arc::new(CaptureTransport::new());
        let sender = sender_with(transport.clone());
        let err = sender.submit_auto(&[purchase()]).await.unwrap_err();
        assert!(err.is_invalid_operation());
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn test_submit_auto_substitutes_empty_id() {
        let transport = Arc::new(CaptureTransport::new());
        let sender = EventSender::builder()
            .transport(transport.clone())
            .app_id("1")
            .client_token("t")
            .identity_provider(Arc::new(DeniedIdentityProvider))
            .build()
            .unwrap();

        assert!(sender.submit_auto(&[purchase()]).await.unwrap());
        let request = transport.last().unwrap();
        assert_eq!(request.field("advertiser_id"), Some(""));
        assert_eq!(request.field("advertiser_tracking_enabled"), Some("0"));
    }

    #[tokio::test]
    async fn test_submit_auto_uses_provider_identity() {
        let transport = Arc::new(CaptureTransport::new());
        let sender = EventSender::builder()
            .transport(transport.clone())
            .app_id("1")
            .client_token("t")
            .identity_provider(Arc::new(StaticIdentityProvider::new(
                Some("ABCD-EF01"),
                true,
            )))
            .build()
            .unwrap();

        assert!(sender.submit_auto(&[purchase()]).await.unwrap());
        let request = transport.last().unwrap();
        assert_eq!(request.field("advertiser_id"), Some("ABCD-EF01"));
        assert_eq!(request.field("application_tracking_enabled"), Some("1"));
    }

    #[test]
    fn test_dispatch_outside_runtime_fails() {
        let sender = sender_with(Arc::new(CaptureTransport::new()));
        let err = sender.dispatch(vec![purchase()]).unwrap_err();
        assert!(err.is_invalid_operation());
    }
}
