//! Domain models for IIS objects
//!
//! These are the desired/current state shapes callers work with. They are
//! decoupled from the wire responses, which live next to their repositories.

mod app_pool;
mod web_application;
mod web_site;

pub use app_pool::*;
pub use web_application::*;
pub use web_site::*;

use crate::{Error, Result};

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::Validation(message()))
    }
}

fn ensure_in_range(field: &str, value: u32, min: u32, max: u32) -> Result<()> {
    ensure(value >= min && value <= max, || {
        format!("{} must be between {} and {}, got {}", field, min, max, value)
    })
}

fn ensure_not_empty(field: &str, value: &str) -> Result<()> {
    ensure(!value.trim().is_empty(), || format!("{} cannot be empty", field))
}

/// Drive-letter (`C:\x`, `C:/x`) or UNC (`\\server\share`) path
fn ensure_physical_path(field: &str, path: &str) -> Result<()> {
    let bytes = path.as_bytes();
    let drive = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes[2], b'\\' | b'/');
    let unc = path.starts_with(r"\\") && path.len() > 2;
    let forbidden = path
        .get(2..)
        .is_some_and(|rest| rest.contains(['*', '?', '"', '<', '>', '|', ':']));

    ensure((drive || unc) && !forbidden, || {
        format!("{} must be an absolute Windows path, got '{}'", field, path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_path_validation() {
        assert!(ensure_physical_path("p", r"C:\inetpub\wwwroot").is_ok());
        assert!(ensure_physical_path("p", "D:/sites/shop").is_ok());
        assert!(ensure_physical_path("p", r"\\fileserver\content").is_ok());
        assert!(ensure_physical_path("p", "relative/path").is_err());
        assert!(ensure_physical_path("p", "C:").is_err());
        assert!(ensure_physical_path("p", r"C:\bad|name").is_err());
        assert!(ensure_physical_path("p", "").is_err());
    }

    #[test]
    fn test_range_validation_message() {
        let err = ensure_in_range("queue_length", 5, 10, 65535).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: queue_length must be between 10 and 65535, got 5"
        );
    }
}
