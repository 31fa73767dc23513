//! Converters between IIS wire shapes and domain values
//!
//! `ConvertTo-Json` hands enums back as ordinals, durations as `TimeSpan`
//! objects and bindings as `ip:port:host` strings. Writes go the other way:
//! symbolic enum tokens, `HH:MM:SS` clock strings and `True`/`False`.

pub mod binding;
pub mod duration;
pub mod ordinal;

pub use binding::BindingInformation;
pub use duration::{Granularity, TimeSpan};
pub use ordinal::{
    AppPoolState, CpuAction, IdentityType, IdleTimeoutAction, Ordinal, PipelineMode, StartMode,
};

/// PowerShell boolean token for a flag
pub fn pascal_case(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case(true), "True");
        assert_eq!(pascal_case(false), "False");
    }
}
