//! PowerShell command transport
//!
//! Every call spawns exactly one `powershell.exe` process. The script is wrapped
//! in `Invoke-Command` (remote when a host is configured) and handed over as
//! `-EncodedCommand`, so the body never goes through Windows argument quoting.

use crate::config::ConnectionConfig;
use crate::script::quote;
use crate::{Error, Result};
use base64::Engine;
use std::process::Command;

/// Executes a script and returns its raw standard output
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    fn execute(&self, script: &str) -> Result<Vec<u8>>;
}

/// Production transport backed by a PowerShell child process
#[derive(Debug, Clone)]
pub struct PowerShell {
    config: ConnectionConfig,
}

impl PowerShell {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Wrap a script body into the `Invoke-Command` call sent to the host
    pub fn wrap(&self, script: &str) -> String {
        let mut command = String::from("$ProgressPreference = 'SilentlyContinue'; Invoke-Command ");

        if let Some(host) = self.config.host() {
            command.push_str(&format!("-ComputerName {} ", quote(host)));

            if let Some((user, pass)) = self.config.credential() {
                command.push_str(&format!(
                    "-Credential (New-Object System.Management.Automation.PSCredential ({}, (ConvertTo-SecureString {} -AsPlainText -Force))) -Authentication Negotiate ",
                    quote(user),
                    quote(pass)
                ));
            }
        } else if self.config.credential().is_some() {
            // Invoke-Command only accepts -Credential together with -ComputerName
            tracing::debug!("Credentials ignored for local execution");
        }

        command.push_str(&format!(
            "-ScriptBlock {{ param() $ProgressPreference = 'SilentlyContinue'; {} }}",
            script
        ));
        command
    }
}

impl Transport for PowerShell {
    fn execute(&self, script: &str) -> Result<Vec<u8>> {
        let host = self.config.host().unwrap_or("localhost");
        tracing::debug!(host = %host, script_len = script.len(), "Executing PowerShell script");
        tracing::trace!(host = %host, script = %script, "Script body");

        let encoded = encode_command(&self.wrap(script));
        let output = Command::new(&self.config.executable)
            .args([
                "-NoProfile",
                "-NonInteractive",
                "-ExecutionPolicy",
                "Bypass",
                "-EncodedCommand",
                &encoded,
            ])
            .output()?;

        classify(output.status.success(), output.status.code(), output.stdout, &output.stderr)
            .inspect_err(|e| tracing::error!(host = %host, error = %e, "PowerShell script failed"))
    }
}

/// Base64 of the UTF-16LE bytes, as `-EncodedCommand` expects
fn encode_command(command: &str) -> String {
    let bytes: Vec<u8> = command
        .encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Any text on stderr fails the call, even on a zero exit code.
fn classify(success: bool, code: Option<i32>, stdout: Vec<u8>, stderr: &[u8]) -> Result<Vec<u8>> {
    let stderr = String::from_utf8_lossy(stderr).trim().to_string();

    if !success {
        if !stderr.is_empty() {
            return Err(Error::Execution(stderr));
        }
        return Err(Error::Execution(match code {
            Some(code) => format!("script exited with code {}", code),
            None => "script terminated without an exit code".to_string(),
        }));
    }

    if !stderr.is_empty() {
        return Err(Error::Execution(stderr));
    }

    Ok(stdout)
}
