//! Ordinal-coded enums
//!
//! The host reports these as small integers; the domain keeps the symbolic
//! token, which is also what gets written back. Unmapped ordinals decode to
//! `Unknown` instead of failing.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Decoding from a wire ordinal or a symbolic label
pub trait Ordinal: Sized {
    fn from_ordinal(ordinal: i64) -> Self;
    fn from_label(label: &str) -> Self;
}

macro_rules! ordinal_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($ordinal:literal => $variant:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant,)+
            #[default]
            Unknown,
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant),)+
                    $name::Unknown => "Unknown",
                }
            }
        }

        impl Ordinal for $name {
            fn from_ordinal(ordinal: i64) -> Self {
                match ordinal {
                    $($ordinal => $name::$variant,)+
                    _ => $name::Unknown,
                }
            }

            fn from_label(label: &str) -> Self {
                match label {
                    $(stringify!($variant) => $name::$variant,)+
                    _ => $name::Unknown,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

ordinal_enum! {
    /// Runtime state of an application pool (read-only)
    AppPoolState { 0 => Starting, 1 => Started, 2 => Stopping, 3 => Stopped }
}

ordinal_enum! {
    StartMode { 0 => OnDemand, 1 => AlwaysRunning }
}

ordinal_enum! {
    /// Managed pipeline mode
    PipelineMode { 0 => Integrated, 1 => Classic }
}

ordinal_enum! {
    /// Account the worker process runs as
    IdentityType {
        0 => LocalSystem,
        1 => LocalService,
        2 => NetworkService,
        3 => SpecificUser,
        4 => ApplicationPoolIdentity,
    }
}

ordinal_enum! {
    IdleTimeoutAction { 0 => Terminate, 1 => Suspend }
}

ordinal_enum! {
    /// What IIS does when the CPU limit is exceeded
    CpuAction { 0 => NoAction, 1 => KillW3wp, 2 => Throttle, 3 => ThrottleUnderLoad }
}

/// `deserialize_with` adapter for ordinal-coded wire fields
pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Ordinal,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => Ok(n.as_i64().map_or_else(|| T::from_label(""), T::from_ordinal)),
        serde_json::Value::String(label) => Ok(T::from_label(&label)),
        other => Err(D::Error::custom(format!("expected an enum ordinal, got {}", other))),
    }
}
