//! Connection configuration with builder pattern

/// Default PowerShell executable used to run scripts
pub const DEFAULT_EXECUTABLE: &str = "powershell.exe";

/// Where and as whom scripts are executed
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Remote host; `None` runs scripts on the local machine
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// PowerShell binary (`powershell.exe`, or `pwsh` for PowerShell 7)
    pub executable: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            username: None,
            password: None,
            executable: DEFAULT_EXECUTABLE.to_string(),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("executable", &self.executable)
            .finish()
    }
}

impl ConnectionConfig {
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// Target host, if any. Blank hostnames mean local execution.
    pub fn host(&self) -> Option<&str> {
        self.hostname.as_deref().filter(|h| !h.trim().is_empty())
    }

    /// Credential pair, only when both halves are non-empty
    pub fn credential(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.executable.trim().is_empty() {
            return Err(crate::Error::Config("executable cannot be empty".into()));
        }
        let has_user = self.username.as_deref().is_some_and(|u| !u.is_empty());
        let has_pass = self.password.as_deref().is_some_and(|p| !p.is_empty());
        if has_user != has_pass {
            return Err(crate::Error::Config(
                "username and password must be supplied together".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.config.hostname = Some(hostname.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    pub fn executable(mut self, executable: impl Into<String>) -> Self {
        self.config.executable = executable.into();
        self
    }

    pub fn build(self) -> ConnectionConfig {
        self.config
    }

    pub fn build_validated(self) -> crate::Result<ConnectionConfig> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
