//! Client side of app event reporting: posts batches of app events to the
//! Graph API `activities` endpoint with the device's advertiser identity.
//!
//! # Modules
//!
//! - [`sender`] — Event sender, its builder, and fire-and-forget dispatch
//! - [`dispatch`] — Process-wide sender slot for handle-less call sites
//! - [`payload`] — Form encoding of a submission
//! - [`transport`] — HTTP transport seam (reqwest and in-memory capture)

pub mod dispatch;
pub mod payload;
pub mod sender;
pub mod transport;

pub use payload::ActivitiesForm;
pub use sender::{DispatchFailure, EventSender, EventSenderBuilder};
pub use transport::{CaptureTransport, HttpTransport, ReqwestTransport, TransportResponse};
