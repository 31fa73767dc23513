//! `ip:port[:hostheader]` binding information strings

use crate::{Error, Result};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInformation {
    pub ip: String,
    pub port: u16,
    /// Empty when the binding matches any host
    pub host_header: String,
}

impl FromStr for BindingInformation {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        // Bracketed IPv6 literals carry their own colons
        let (ip, rest) = if value.starts_with('[') {
            let end = value
                .find("]:")
                .ok_or_else(|| Error::Parse(format!("binding '{}' has no port", value)))?;
            (&value[..=end], &value[end + 2..])
        } else {
            value
                .split_once(':')
                .ok_or_else(|| Error::Parse(format!("binding '{}' has no port", value)))?
        };

        let mut segments = rest.split(':');
        let port = segments.next().unwrap_or_default();
        let port: u16 = port
            .parse()
            .map_err(|e| Error::Parse(format!("binding '{}' has invalid port '{}': {}", value, port, e)))?;
        let host_header = segments.next().unwrap_or_default();
        if segments.next().is_some() {
            return Err(Error::Parse(format!(
                "binding '{}' has more than three segments",
                value
            )));
        }

        Ok(Self {
            ip: ip.to_string(),
            port,
            host_header: host_header.to_string(),
        })
    }
}

impl std::fmt::Display for BindingInformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.ip, self.port, self.host_header)
    }
}

impl<'de> Deserialize<'de> for BindingInformation {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wildcard_without_host() {
        let info: BindingInformation = "*:80".parse().unwrap();
        assert_eq!(info.ip, "*");
        assert_eq!(info.port, 80);
        assert_eq!(info.host_header, "");
    }

    #[test]
    fn test_parse_with_host_header() {
        let info: BindingInformation = "10.0.0.1:443:example.com".parse().unwrap();
        assert_eq!(info.ip, "10.0.0.1");
        assert_eq!(info.port, 443);
        assert_eq!(info.host_header, "example.com");
    }

    #[test]
    fn test_parse_trailing_empty_host() {
        let info: BindingInformation = "*:8080:".parse().unwrap();
        assert_eq!(info.port, 8080);
        assert_eq!(info.host_header, "");
    }

    #[test]
    fn test_parse_ipv6() {
        let info: BindingInformation = "[::1]:443:localhost".parse().unwrap();
        assert_eq!(info.ip, "[::1]");
        assert_eq!(info.port, 443);
        assert_eq!(info.host_header, "localhost");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("*:abc".parse::<BindingInformation>(), Err(Error::Parse(_))));
        assert!(matches!("*".parse::<BindingInformation>(), Err(Error::Parse(_))));
        assert!(matches!("*:70000".parse::<BindingInformation>(), Err(Error::Parse(_))));
        assert!(matches!("[::1]".parse::<BindingInformation>(), Err(Error::Parse(_))));
        assert!(matches!("1.2.3.4:80:a:b".parse::<BindingInformation>(), Err(Error::Parse(_))));
        assert!(matches!("[::1]:443:a:b".parse::<BindingInformation>(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_deserialize_from_json_string() {
        let info: BindingInformation = serde_json::from_str(r#""*:80:www.example.com""#).unwrap();
        assert_eq!(info.to_string(), "*:80:www.example.com");
        assert!(serde_json::from_str::<BindingInformation>(r#""*:http""#).is_err());
    }
}
