//! Get/Create/Update/Delete for each IIS entity
//!
//! All three repositories share the same contract:
//!
//! - `get` issues one read; empty output is [`Error::NotFound`].
//! - `create` establishes the entity, configures it, and deletes it again if
//!   configuration fails, so no half-configured entity is left behind.
//! - `update` snapshots the current state, applies the desired state, and
//!   re-applies the snapshot once if applying fails. The caller always gets
//!   the original failure back.
//! - `delete` issues one removal and is not idempotent.
//!
//! Scripts are not transactional on the host: a failed script may already
//! have applied a prefix of its statements. Callers should re-read after any
//! failed write.

mod app_pool;
mod rollback;
mod web_application;
mod web_site;

pub use app_pool::AppPools;
pub use web_application::WebApplications;
pub use web_site::WebSites;

use crate::{Error, Result};
use serde::de::DeserializeOwned;

/// The operations every entity repository exposes
pub trait Repository {
    type Entity;
    type Id: ?Sized;

    fn get(&self, id: &Self::Id) -> Result<Self::Entity>;
    fn create(&self, desired: &Self::Entity) -> Result<Self::Entity>;
    fn update(&self, desired: &Self::Entity) -> Result<()>;
    fn delete(&self, id: &Self::Id) -> Result<()>;
}

/// Decode `ConvertTo-Json` output. `None` when the host printed nothing.
pub(crate) fn decode<T: DeserializeOwned>(output: &[u8]) -> Result<Option<T>> {
    let text = String::from_utf8_lossy(output);
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Ok(None);
    }

    let value = match serde_json::from_str::<serde_json::Value>(text)? {
        serde_json::Value::Array(mut items) => match items.len() {
            0 => return Ok(None),
            1 => items.remove(0),
            n => {
                return Err(Error::Parse(format!(
                    "expected a single object, host returned {} results",
                    n
                )))
            }
        },
        other => other,
    };

    Ok(Some(serde_json::from_value(value)?))
}

/// Empty strings on the wire mean "not set"
pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
