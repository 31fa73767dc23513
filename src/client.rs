//! Entry point tying a transport to the entity repositories

use crate::config::ConnectionConfig;
use crate::repository::{AppPools, WebApplications, WebSites};
use crate::transport::{PowerShell, Transport};
use crate::Result;

/// Handle to one IIS host
///
/// Repositories borrow the client's transport, so they are cheap to create
/// per call.
#[derive(Debug)]
pub struct Client<T: Transport = PowerShell> {
    transport: T,
}

impl Client<PowerShell> {
    /// Validate the connection settings and build a PowerShell-backed client
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            host = config.host().unwrap_or("localhost"),
            remote = config.host().is_some(),
            "IIS client configured"
        );
        Ok(Self::with_transport(PowerShell::new(config)))
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn app_pools(&self) -> AppPools<'_, T> {
        AppPools::new(&self.transport)
    }

    pub fn web_sites(&self) -> WebSites<'_, T> {
        WebSites::new(&self.transport)
    }

    pub fn web_applications(&self) -> WebApplications<'_, T> {
        WebApplications::new(&self.transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Repository;
    use crate::transport::MockTransport;
    use crate::Error;

    #[test]
    fn test_new_rejects_half_credentials() {
        let config = ConnectionConfig::builder()
            .hostname("web01")
            .username("admin")
            .build();
        assert!(matches!(Client::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_new_local() {
        let client = Client::new(ConnectionConfig::default()).unwrap();
        assert!(client.transport().config().host().is_none());
    }

    #[test]
    fn test_repositories_share_transport() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(2)
            .returning(|_| Ok(Vec::new()));

        let client = Client::with_transport(transport);
        assert!(client.app_pools().get("a").unwrap_err().is_not_found());
        assert!(client.web_sites().get("b").unwrap_err().is_not_found());
    }
}
