//! IIS Agent
//!
//! Declarative management of IIS application pools, web sites and web
//! applications. Every operation is a PowerShell script executed locally or
//! over WinRM (`Invoke-Command`), and every read comes back as
//! `ConvertTo-Json` output decoded into typed models.
//!
//! # Key Features
//!
//! - **Desired state** - `create` and `update` take the full entity and write
//!   every property
//! - **Compensation** - a failed update re-applies the previous state, a
//!   failed create removes the half-built entity
//! - **Safe scripts** - all values are rendered as quoted PowerShell literals
//!
//! # Example
//!
//! ```no_run
//! use iis_agent::{ApplicationPool, Client, ConnectionConfig, Repository};
//!
//! let config = ConnectionConfig::builder()
//!     .hostname("web01.corp.local")
//!     .username(r"CORP\deploy")
//!     .password("secret")
//!     .build();
//! let client = Client::new(config)?;
//!
//! let mut pool = ApplicationPool::new("shop");
//! pool.queue_length = 5000;
//! pool.validate()?;
//!
//! match client.app_pools().get("shop") {
//!     Ok(_) => client.app_pools().update(&pool)?,
//!     Err(e) if e.is_not_found() => {
//!         client.app_pools().create(&pool)?;
//!     }
//!     Err(e) => return Err(e),
//! }
//! # Ok::<(), iis_agent::Error>(())
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod script;
pub mod transport;

pub use client::Client;
pub use config::ConnectionConfig;
pub use error::{EntityKind, Error, Result};
pub use models::{
    ApplicationPool, Binding, Protocol, WebApplication, WebApplicationId, WebSite,
};
pub use repository::Repository;
pub use transport::{PowerShell, Transport};
