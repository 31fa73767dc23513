//! Web application model

use super::{ensure_not_empty, ensure_physical_path, DEFAULT_APP_POOL};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An application under a site, identified by `(site, name)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebApplication {
    pub site: String,
    pub name: String,
    /// URL path reported by the host, e.g. `/api`
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub physical_path: String,
    pub application_pool: String,
}

impl Default for WebApplication {
    fn default() -> Self {
        Self {
            site: String::new(),
            name: String::new(),
            path: None,
            physical_path: String::new(),
            application_pool: DEFAULT_APP_POOL.to_string(),
        }
    }
}

impl WebApplication {
    pub fn new(
        site: impl Into<String>,
        name: impl Into<String>,
        physical_path: impl Into<String>,
    ) -> Self {
        Self {
            site: site.into(),
            name: name.into(),
            physical_path: physical_path.into(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> WebApplicationId {
        WebApplicationId::new(&self.site, &self.name)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_not_empty("site", &self.site)?;
        ensure_not_empty("name", &self.name)?;
        ensure_physical_path("physical_path", &self.physical_path)?;
        ensure_not_empty("application_pool", &self.application_pool)
    }
}

/// Composite identity, written as `site/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebApplicationId {
    pub site: String,
    pub name: String,
}

impl WebApplicationId {
    pub fn new(site: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for WebApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.site, self.name)
    }
}

impl FromStr for WebApplicationId {
    type Err = Error;

    /// Site names cannot contain `/`, application names can (nested apps)
    fn from_str(value: &str) -> Result<Self> {
        match value.split_once('/') {
            Some((site, name)) if !site.is_empty() && !name.is_empty() => Ok(Self::new(site, name)),
            _ => Err(Error::Config(format!(
                "web application id must look like 'site/name', got '{}'",
                value
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trip() {
        let id: WebApplicationId = "Default Web Site/api/v2".parse().unwrap();
        assert_eq!(id.site, "Default Web Site");
        assert_eq!(id.name, "api/v2");
        assert_eq!(id.to_string(), "Default Web Site/api/v2");
    }

    #[test]
    fn test_id_rejects_malformed() {
        for bad in ["", "site", "/name", "site/"] {
            assert!(matches!(bad.parse::<WebApplicationId>(), Err(Error::Config(_))), "{bad}");
        }
    }

    #[test]
    fn test_validate() {
        let app = WebApplication::new("shop", "api", r"C:\sites\shop\api");
        assert!(app.validate().is_ok());
        assert_eq!(app.id(), WebApplicationId::new("shop", "api"));

        let mut bad = app.clone();
        bad.physical_path = "api".into();
        assert!(bad.validate().is_err());
    }
}
