//! Configuration types for the underlying DNS monitor

use crate::traits::AddressScope;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Interval of the polling fallback (in seconds)
    ///
    /// Bounds how long a change that produced no OS event (e.g. roaming
    /// between access points on the same adapter) can go unnoticed.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Destination scope used to select the default interface
    #[serde(default)]
    pub address_scope: AddressScope,

    /// Capacity of the monitor event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// User-supplied DNS that replaces the discovered value for consumers
    #[serde(default)]
    pub override_dns: Option<String>,
}

impl MonitorConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            address_scope: AddressScope::default(),
            event_channel_capacity: default_event_channel_capacity(),
            override_dns: None,
        }
    }

    /// Set the polling interval
    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Set the address scope
    pub fn with_address_scope(mut self, scope: AddressScope) -> Self {
        self.address_scope = scope;
        self
    }

    /// Set the DNS override
    pub fn with_override_dns(mut self, dns: impl Into<String>) -> Self {
        self.override_dns = Some(dns.into());
        self
    }

    /// Polling interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        if let Some(dns) = self.override_dns.as_deref().map(str::trim)
            && !dns.is_empty()
            && dns.parse::<IpAddr>().is_err()
        {
            return Err(crate::Error::config(format!(
                "Override DNS '{dns}' is not an IP address"
            )));
        }

        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_event_channel_capacity() -> usize {
    64
}
