//! Web site and binding models

use super::{ensure, ensure_not_empty, ensure_physical_path};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::str::FromStr;

/// Application pool IIS assigns when none is configured
pub const DEFAULT_APP_POOL: &str = "DefaultAppPool";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSite {
    /// Host-assigned numeric id, read-only
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub physical_path: String,
    /// Identity impersonated when accessing the physical path
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub application_pool: String,
    pub bindings: Vec<Binding>,
    pub trace_failed_requests_logging: TraceFailedRequestsLogging,
}

impl Default for WebSite {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            state: None,
            physical_path: String::new(),
            username: None,
            password: None,
            application_pool: DEFAULT_APP_POOL.to_string(),
            bindings: Vec::new(),
            trace_failed_requests_logging: TraceFailedRequestsLogging::default(),
        }
    }
}

impl WebSite {
    pub fn new(name: impl Into<String>, physical_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            physical_path: physical_path.into(),
            ..Default::default()
        }
    }

    pub fn binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure_not_empty("name", &self.name)?;
        ensure(!self.name.contains(['/', '\\']), || {
            format!("name cannot contain path separators, got '{}'", self.name)
        })?;
        ensure_physical_path("physical_path", &self.physical_path)?;
        ensure_not_empty("application_pool", &self.application_pool)?;
        self.bindings.iter().try_for_each(Binding::validate)?;
        self.trace_failed_requests_logging.validate()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(Error::Parse(format!("unsupported binding protocol '{}'", other))),
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where HTTP.sys listens for a site
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Binding {
    pub protocol: Protocol,
    /// IP literal or `*` for all unassigned addresses
    pub ip: String,
    pub port: u16,
    /// Empty matches any host name
    pub host_header: String,
}

impl Default for Binding {
    fn default() -> Self {
        Self {
            protocol: Protocol::Http,
            ip: "*".to_string(),
            port: 80,
            host_header: String::new(),
        }
    }
}

impl Binding {
    pub fn http(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    pub fn https(port: u16) -> Self {
        Self {
            protocol: Protocol::Https,
            port,
            ..Default::default()
        }
    }

    pub fn host_header(mut self, host: impl Into<String>) -> Self {
        self.host_header = host.into();
        self
    }

    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = ip.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.port != 0, || "binding port must be between 1 and 65535".into())?;
        let literal = self.ip.trim_start_matches('[').trim_end_matches(']');
        ensure(self.ip == "*" || literal.parse::<IpAddr>().is_ok(), || {
            format!("binding ip must be '*' or an IP address, got '{}'", self.ip)
        })?;
        ensure(
            !self.host_header.contains(|c: char| c == ':' || c.is_whitespace()),
            || format!("binding host header '{}' is not a valid host name", self.host_header),
        )
    }
}

/// Failed request tracing for the site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceFailedRequestsLogging {
    pub enabled: bool,
    pub directory: String,
    pub max_log_files: u32,
}

impl Default for TraceFailedRequestsLogging {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: r"%SystemDrive%\inetpub\logs\FailedReqLogFiles".to_string(),
            max_log_files: 50,
        }
    }
}

impl TraceFailedRequestsLogging {
    fn validate(&self) -> Result<()> {
        ensure_not_empty("trace_failed_requests_logging.directory", &self.directory)?;
        ensure(self.max_log_files >= 1, || {
            "trace_failed_requests_logging.max_log_files must be at least 1".into()
        })
    }
}
