// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Node configuration.
//!
//! Supports both programmatic and file-based (TOML) configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Unique identifier for this node, used in heartbeats and the
    /// peer directory.
    pub node_id: String,

    /// Multicast group:port carrying payload envelopes.
    #[serde(default = "default_multicast_payload_addr")]
    pub multicast_payload_addr: String,

    /// Multicast group:port carrying heartbeats.
    #[serde(default = "default_multicast_control_addr")]
    pub multicast_control_addr: String,

    /// Address this node's unicast fetch server binds to, and the
    /// address advertised in its own heartbeats.
    #[serde(default = "default_fetch_bind_addr")]
    pub fetch_bind_addr: String,

    /// Heartbeat emission period, milliseconds.
    #[serde(default = "default_heartbeat_period_ms")]
    pub heartbeat_period_ms: u64,

    /// Unicast fetch client timeout, milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Payload/control multicast receive poll interval, milliseconds.
    #[serde(default = "default_recv_poll_ms")]
    pub recv_poll_ms: u64,

    /// Fetch server accept-loop poll interval, milliseconds.
    #[serde(default = "default_fetch_server_poll_ms")]
    pub fetch_server_poll_ms: u64,
}

fn default_multicast_payload_addr() -> String {
    "239.27.14.1:7700".to_string()
}

fn default_multicast_control_addr() -> String {
    "239.27.14.2:7701".to_string()
}

fn default_fetch_bind_addr() -> String {
    "0.0.0.0:7702".to_string()
}

fn default_heartbeat_period_ms() -> u64 {
    2000
}

fn default_fetch_timeout_ms() -> u64 {
    2000
}

fn default_recv_poll_ms() -> u64 {
    100
}

fn default_fetch_server_poll_ms() -> u64 {
    200
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: "node".to_string(),
            multicast_payload_addr: default_multicast_payload_addr(),
            multicast_control_addr: default_multicast_control_addr(),
            fetch_bind_addr: default_fetch_bind_addr(),
            heartbeat_period_ms: default_heartbeat_period_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            recv_poll_ms: default_recv_poll_ms(),
            fetch_server_poll_ms: default_fetch_server_poll_ms(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_id.is_empty() {
            return Err(ConfigError::Invalid("node_id must not be empty".into()));
        }
        if self.heartbeat_period_ms == 0 {
            return Err(ConfigError::Invalid(
                "heartbeat_period_ms must be nonzero".into(),
            ));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "fetch_timeout_ms must be nonzero".into(),
            ));
        }
        Ok(())
    }
}
