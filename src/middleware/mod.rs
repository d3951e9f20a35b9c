//! HTTP integration for axum routers.
//!
//! Three ways to wire a [`Tracker`] into a service:
//!
//! 1. **Tracked routes**: [`tracked`] measures every response of a router
//! 2. **Chaff endpoint**: the [`chaff`] handler serves chaff on its own route
//! 3. **Single endpoint**: [`gated`] lets a [`Detector`](crate::Detector)
//!    divert chaff requests before they reach the real handlers
//!
//! ```ignore
//! let tracker = Arc::new(Tracker::new()?);
//! let app = chaff::middleware::tracked(Router::new().route("/", get(index)), tracker.clone())
//!     .route("/chaff", get(chaff::middleware::chaff))
//!     .with_state(tracker);
//! ```

mod counting;
mod tracking;

pub use counting::{ByteCounter, CountingBody};
pub use tracking::{chaff, header_size, serve_chaff, track, track_or_chaff, ChaffGate};

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::Router;

use crate::profile::Tracker;

/// Track every route currently in `router`.
///
/// Routes added afterwards are not tracked.
pub fn tracked<S>(router: Router<S>, tracker: Arc<Tracker>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(tracker, track))
}

/// Serve detected chaff on, and track real traffic to, every route currently
/// in `router`.
pub fn gated<S>(router: Router<S>, gate: ChaffGate) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(gate, track_or_chaff))
}
