//! Transport abstraction layer for the Behave SDK.
//!
//! The SDK reaches the outside world through two narrow seams:
//!
//! ```text
//! Transport       request/response over HTTP (required)
//! RealtimeClient  reward pushes over a publish/subscribe channel (optional)
//! ```
//!
//! Neither seam knows about players or rewards; they move JSON. Concrete
//! implementations live in their own crates (`behave-transport-http`), and
//! in-memory doubles are available behind the `mock` feature.

pub mod traits;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use traits::{RealtimeClient, RealtimeError, Transport, TransportError};
pub use types::{HttpRequest, RealtimeMessage, RealtimeSubscription};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockRealtime, MockTransport};
