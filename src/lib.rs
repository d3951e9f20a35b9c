//! # chaff
//!
//! Chaff (decoy) responses for HTTP servers that are statistically similar
//! to real traffic, so that an observer of request timing and size cannot
//! tell which clients are actually talking to the server.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          Middleware (track, track_or_chaff, chaff)       │
//! ├──────────────────────────────┬──────────────────────────┤
//! │  Detector (is this chaff?)   │  Responder (plain, JSON)  │
//! ├──────────────────────────────┴──────────────────────────┤
//! │   Tracker (rolling window, ingestion task, snapshots)    │
//! ├─────────────────────────────────────────────────────────┤
//! │          Random filler (OS entropy, base64)              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Real responses are measured as they stream out and folded into a rolling
//! average of the last [`profile::MAX_CAPACITY`] requests. Chaff responses
//! carry random filler sized to that average and are delayed until the
//! average latency has passed.
//!
//! The averaging is heuristic. This is not a cryptographic padding scheme.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod detector;
pub mod error;
pub mod middleware;
pub mod profile;
pub mod random;
pub mod responder;

#[cfg(feature = "server")]
pub mod server;

pub use detector::{Detector, HeaderDetector};
pub use error::{Error, Result};
pub use profile::{ProfileSnapshot, Sample, Tracker, TrackerConfig};
pub use responder::{JsonResponder, PlainResponder, RenderFailed, Responder};

/// Name of the header carrying random filler on chaff responses.
pub const HEADER: &str = "X-Chaff";
