//! Server configuration.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detector::HeaderDetector;
use crate::error::{Error, Result};
use crate::profile::TrackerConfig;
use crate::responder::{JsonResponder, PlainResponder, Responder};

/// Built-in chaff response formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponderKind {
    /// Raw base64 filler
    #[default]
    Plain,
    /// Filler wrapped as `{"data": "<filler>"}`
    Json,
}

impl ResponderKind {
    /// Build the responder.
    pub fn build(self) -> Arc<dyn Responder> {
        match self {
            ResponderKind::Plain => Arc::new(PlainResponder),
            ResponderKind::Json => {
                Arc::new(JsonResponder::new(|data| serde_json::json!({ "data": data })))
            }
        }
    }
}

impl FromStr for ResponderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(ResponderKind::Plain),
            "json" => Ok(ResponderKind::Json),
            other => Err(Error::config(format!("unknown responder: {}", other))),
        }
    }
}

impl fmt::Display for ResponderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponderKind::Plain => f.write_str("plain"),
            ResponderKind::Json => f.write_str("json"),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: String,
    /// Listen port
    pub listen_port: u16,
    /// Rolling window and queue sizes
    pub tracker: TrackerConfig,
    /// Chaff response format
    pub responder: ResponderKind,
    /// Route of the dedicated chaff endpoint
    pub chaff_path: String,
    /// Header marking chaff requests; enables single-endpoint mode
    pub detector_header: Option<String>,
    /// Shortest simulated work in the demo handler
    pub demo_delay_min: Duration,
    /// Longest simulated work in the demo handler
    pub demo_delay_max: Duration,
}

impl ServerConfig {
    /// Create a configuration with default tracking settings.
    pub fn new(listen_addr: impl Into<String>, listen_port: u16) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            listen_port,
            tracker: TrackerConfig::default(),
            responder: ResponderKind::Plain,
            chaff_path: "/chaff".to_string(),
            detector_header: None,
            demo_delay_min: Duration::from_millis(100),
            demo_delay_max: Duration::from_millis(1100),
        }
    }

    /// Detector for single-endpoint mode, if configured.
    pub fn detector(&self) -> Result<Option<HeaderDetector>> {
        self.detector_header
            .as_deref()
            .map(HeaderDetector::new)
            .transpose()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.is_empty() {
            return Err(Error::config("listen_addr cannot be empty"));
        }
        validate_chaff_path(&self.chaff_path)?;
        if self.detector_header.is_none() && self.chaff_path == "/" {
            return Err(Error::config(
                "chaff_path cannot be '/' without a detector_header",
            ));
        }
        if self.demo_delay_min > self.demo_delay_max {
            return Err(Error::config("demo delay min exceeds max"));
        }
        self.tracker.validate()?;
        self.detector()?;
        Ok(())
    }
}

/// The chaff route must be a literal path: axum panics on malformed
/// captures, and a capture would let chaff shadow other routes.
fn validate_chaff_path(path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(Error::config("chaff_path must start with '/'"));
    }
    if path.contains(['{', '}']) {
        return Err(Error::config(format!(
            "chaff_path must not contain captures: {}",
            path
        )));
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        return Err(Error::config(format!(
            "chaff_path segments must not start with ':' or '*': {}",
            path
        )));
    }
    Ok(())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("0.0.0.0", 8080)
    }
}

/// Configuration file format for serialization.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServerConfigFile {
    /// Listen address
    pub listen_addr: String,
    /// Listen port
    pub listen_port: u16,
    /// Rolling window capacity
    pub capacity: usize,
    /// Ingestion queue bound
    pub queue_capacity: usize,
    /// `plain` or `json`
    #[serde(default)]
    pub responder: ResponderKind,
    /// Route of the dedicated chaff endpoint
    pub chaff_path: String,
    /// Header marking chaff requests
    #[serde(default)]
    pub detector_header: Option<String>,
    /// Demo handler delay lower bound (milliseconds)
    pub demo_delay_min_ms: u64,
    /// Demo handler delay upper bound (milliseconds)
    pub demo_delay_max_ms: u64,
}

impl ServerConfigFile {
    /// Convert to runtime configuration.
    pub fn to_config(&self) -> Result<ServerConfig> {
        let config = ServerConfig {
            listen_addr: self.listen_addr.clone(),
            listen_port: self.listen_port,
            tracker: TrackerConfig {
                capacity: self.capacity,
                queue_capacity: self.queue_capacity,
            },
            responder: self.responder,
            chaff_path: self.chaff_path.clone(),
            detector_header: self.detector_header.clone(),
            demo_delay_min: Duration::from_millis(self.demo_delay_min_ms),
            demo_delay_max: Duration::from_millis(self.demo_delay_max_ms),
        };
        config.validate()?;
        Ok(config)
    }

    /// Create from runtime configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            listen_addr: config.listen_addr.clone(),
            listen_port: config.listen_port,
            capacity: config.tracker.capacity,
            queue_capacity: config.tracker.queue_capacity,
            responder: config.responder,
            chaff_path: config.chaff_path.clone(),
            detector_header: config.detector_header.clone(),
            demo_delay_min_ms: config.demo_delay_min.as_millis() as u64,
            demo_delay_max_ms: config.demo_delay_max.as_millis() as u64,
        }
    }
}
