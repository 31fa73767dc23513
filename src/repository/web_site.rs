//! Web site repository

use super::rollback::{configure_or_remove, update_with_rollback};
use super::{decode, non_empty, Repository};
use crate::codec::BindingInformation;
use crate::error::EntityKind;
use crate::models::{Binding, Protocol, TraceFailedRequestsLogging, WebSite};
use crate::script::{windows_path, ItemPath, Query, Script, Statement};
use crate::transport::Transport;
use crate::{Error, Result};
use serde::Deserialize;

/// `Get-Website` response shape
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebSiteResponse {
    name: String,
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    physical_path: String,
    #[serde(default, alias = "username")]
    user_name: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    application_pool: String,
    #[serde(default)]
    bindings: BindingCollection,
    #[serde(default)]
    trace_failed_requests_logging: TraceResponse,
}

#[derive(Debug, Default, Deserialize)]
struct BindingCollection {
    #[serde(rename = "Collection", default)]
    collection: Vec<BindingResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BindingResponse {
    protocol: String,
    /// Only http(s) bindings are `ip:port:host`; `net.tcp` uses `808:*`
    binding_information: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TraceResponse {
    enabled: bool,
    directory: String,
    max_log_files: u32,
}

impl Default for TraceResponse {
    fn default() -> Self {
        let defaults = TraceFailedRequestsLogging::default();
        Self {
            enabled: defaults.enabled,
            directory: defaults.directory,
            max_log_files: defaults.max_log_files,
        }
    }
}

/// http(s) bindings of a site. Other protocols are left alone on the host.
fn managed_bindings(site: &str, collection: Vec<BindingResponse>) -> Result<Vec<Binding>> {
    let mut bindings = Vec::with_capacity(collection.len());
    for response in collection {
        let Ok(protocol) = response.protocol.parse::<Protocol>() else {
            tracing::warn!(
                site = %site,
                protocol = %response.protocol,
                binding = %response.binding_information,
                "Skipping binding with unmanaged protocol"
            );
            continue;
        };
        let info: BindingInformation = response.binding_information.parse()?;
        bindings.push(Binding {
            protocol,
            ip: info.ip,
            port: info.port,
            host_header: info.host_header,
        });
    }
    Ok(bindings)
}

impl TryFrom<WebSiteResponse> for WebSite {
    type Error = Error;

    fn try_from(response: WebSiteResponse) -> Result<Self> {
        let bindings = managed_bindings(&response.name, response.bindings.collection)?;

        Ok(WebSite {
            id: response.id,
            name: response.name,
            state: response.state,
            physical_path: response.physical_path,
            username: non_empty(response.user_name),
            password: non_empty(response.password),
            application_pool: response.application_pool,
            bindings,
            trace_failed_requests_logging: TraceFailedRequestsLogging {
                enabled: response.trace_failed_requests_logging.enabled,
                directory: response.trace_failed_requests_logging.directory,
                max_log_files: response.trace_failed_requests_logging.max_log_files,
            },
        })
    }
}

/// Site properties followed by a full replacement of its http(s) bindings
pub(crate) fn configure_script(site: &WebSite) -> Script {
    let path = ItemPath::Site(site.name.clone());
    let trace = &site.trace_failed_requests_logging;

    let mut script = Script::web_administration()
        .with(Statement::EnsureDirectory(site.physical_path.clone()))
        .with(Statement::set(&path, "applicationPool", site.application_pool.as_str()))
        .with(Statement::set(&path, "physicalPath", windows_path(&site.physical_path)))
        .with(Statement::set(&path, "userName", site.username.clone().unwrap_or_default()))
        .with(Statement::set(&path, "password", site.password.clone().unwrap_or_default()))
        .with(Statement::set(&path, "traceFailedRequestsLogging.enabled", trace.enabled))
        .with(Statement::set(&path, "traceFailedRequestsLogging.directory", trace.directory.as_str()))
        .with(Statement::set(&path, "traceFailedRequestsLogging.maxLogFiles", trace.max_log_files))
        .with(Statement::RemoveBindings(site.name.clone()));

    for binding in &site.bindings {
        script.push(Statement::AddBinding {
            site: site.name.clone(),
            binding: binding.clone(),
        });
    }
    script
}

/// Web sites on the host
pub struct WebSites<'a, T: Transport> {
    transport: &'a T,
}

impl<'a, T: Transport> WebSites<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    fn apply(&self, site: &WebSite) -> Result<()> {
        self.transport.execute(&configure_script(site).render())?;
        Ok(())
    }
}

impl<T: Transport> Repository for WebSites<'_, T> {
    type Entity = WebSite;
    type Id = str;

    fn get(&self, name: &str) -> Result<WebSite> {
        let script = Script::from(Statement::Query(Query::WebSite(name.to_string())));
        let output = self.transport.execute(&script.render())?;
        let response: WebSiteResponse =
            decode(&output)?.ok_or_else(|| Error::not_found(EntityKind::WebSite, name))?;
        WebSite::try_from(response)
    }

    fn create(&self, desired: &WebSite) -> Result<WebSite> {
        let name = desired.name.as_str();
        let script = Script::web_administration()
            .with(Statement::EnsureDirectory(desired.physical_path.clone()))
            .with(Statement::NewWebSite {
                name: name.to_string(),
                physical_path: desired.physical_path.clone(),
                binding: desired.bindings.first().cloned(),
            });
        self.transport.execute(&script.render())?;

        configure_or_remove(
            EntityKind::WebSite,
            name,
            || self.apply(desired),
            || self.delete(name),
        )?;

        tracing::info!(site = %name, bindings = desired.bindings.len(), "Web site created");
        self.get(name)
    }

    fn update(&self, desired: &WebSite) -> Result<()> {
        let snapshot = self.get(&desired.name)?;
        update_with_rollback(
            EntityKind::WebSite,
            &desired.name,
            &snapshot,
            desired,
            |site| self.apply(site),
        )?;

        tracing::info!(site = %desired.name, "Web site updated");
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        let script = Script::web_administration().with(Statement::RemoveWebSite(name.to_string()));
        self.transport.execute(&script.render())?;
        tracing::info!(site = %name, "Web site deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use mockall::Sequence;

    const SITE_JSON: &str = r#"[{"name":"shop","id":3,"serverAutoStart":true,"state":"Started",
        "bindings":{"Collection":[
            {"protocol":"http","bindingInformation":"*:80:","sslFlags":0},
            {"protocol":"https","bindingInformation":"10.0.0.1:443:shop.example.com","sslFlags":1}]},
        "physicalPath":"C:\\sites\\shop","applicationPool":"shop","userName":"","password":"",
        "traceFailedRequestsLogging":{"enabled":true,"directory":"D:\\logs\\frt","maxLogFiles":10}}]"#;

    fn site() -> WebSite {
        WebSite::new("shop", "C:/sites/shop")
            .binding(Binding::http(80))
            .binding(Binding::https(443).host_header("shop.example.com"))
    }

    #[test]
    fn test_get_decodes_bindings_and_trace() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|script: &str| script.contains("$_.Name -eq 'shop'"))
            .times(1)
            .returning(|_| Ok(SITE_JSON.as_bytes().to_vec()));

        let site = WebSites::new(&transport).get("shop").unwrap();
        assert_eq!(site.id, Some(3));
        assert_eq!(site.state.as_deref(), Some("Started"));
        assert_eq!(site.physical_path, r"C:\sites\shop");
        assert_eq!(site.application_pool, "shop");
        assert_eq!(site.username, None);
        assert_eq!(site.bindings.len(), 2);
        assert_eq!(site.bindings[0], Binding::http(80));
        assert_eq!(
            site.bindings[1],
            Binding::https(443).ip("10.0.0.1").host_header("shop.example.com")
        );
        assert!(site.trace_failed_requests_logging.enabled);
        assert_eq!(site.trace_failed_requests_logging.max_log_files, 10);
    }

    #[test]
    fn test_get_skips_unmanaged_protocols() {
        let mut transport = MockTransport::new();
        transport.expect_execute().returning(|_| {
            Ok(br#"{"name":"wcf","bindings":{"Collection":[
                {"protocol":"net.tcp","bindingInformation":"808:*"},
                {"protocol":"http","bindingInformation":"*:8080:"},
                {"protocol":"ftp","bindingInformation":"*:21:"}]}}"#
                .to_vec())
        });

        let site = WebSites::new(&transport).get("wcf").unwrap();
        assert_eq!(site.bindings, vec![Binding::http(8080)]);
    }

    #[test]
    fn test_get_rejects_malformed_http_binding() {
        let mut transport = MockTransport::new();
        transport.expect_execute().returning(|_| {
            Ok(br#"{"name":"shop","bindings":{"Collection":[{"protocol":"http","bindingInformation":"*:http:"}]}}"#.to_vec())
        });

        let err = WebSites::new(&transport).get("shop").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_get_missing_site() {
        let mut transport = MockTransport::new();
        transport.expect_execute().returning(|_| Ok(b"\r\n".to_vec()));

        let err = WebSites::new(&transport).get("missing").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "web site 'missing' could not be found at the host");
    }

    #[test]
    fn test_configure_script_replaces_bindings() {
        let rendered = configure_script(&site()).render();
        let lines: Vec<&str> = rendered.lines().collect();

        assert!(lines[1].starts_with(r"if (!(Test-Path -LiteralPath 'C:\sites\shop'))"));
        assert!(rendered.contains(r"Set-ItemProperty -Path 'IIS:\Sites\shop' -Name 'physicalPath' -Value 'C:\sites\shop';"));
        assert!(rendered.contains("-Name 'userName' -Value '';"));
        assert!(rendered.contains("-Name 'traceFailedRequestsLogging.enabled' -Value 'False';"));

        let remove = lines.iter().position(|l| l.starts_with("Get-WebBinding")).unwrap();
        assert_eq!(
            &lines[remove + 1..],
            &[
                "New-WebBinding -Name 'shop' -IPAddress '*' -Port 80 -HostHeader '' -Protocol 'http';",
                "New-WebBinding -Name 'shop' -IPAddress '*' -Port 443 -HostHeader 'shop.example.com' -Protocol 'https';",
            ]
        );
    }

    #[test]
    fn test_create_removes_site_when_binding_fails() {
        let mut transport = MockTransport::new();
        let mut seq = Sequence::new();
        transport
            .expect_execute()
            .withf(|script: &str| {
                script.contains("New-Website -Name 'shop' -PhysicalPath 'C:\\sites\\shop' -IPAddress '*' -Port 80 -HostHeader '' | Out-Null;")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Vec::new()));
        transport
            .expect_execute()
            .withf(|script: &str| script.contains("New-WebBinding"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(Error::Execution("Cannot add duplicate collection entry".into())));
        transport
            .expect_execute()
            .withf(|script: &str| script.contains("Remove-Website -Name 'shop';"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Vec::new()));

        let err = WebSites::new(&transport).create(&site()).unwrap_err();
        assert!(matches!(err, Error::Execution(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn test_update_restores_previous_bindings() {
        let mut transport = MockTransport::new();
        let mut seq = Sequence::new();
        transport
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(SITE_JSON.as_bytes().to_vec()));
        transport
            .expect_execute()
            .withf(|script: &str| script.contains("-Port 8443"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(Error::Execution("port in use".into())));
        transport
            .expect_execute()
            .withf(|script: &str| {
                script.contains("-IPAddress '10.0.0.1' -Port 443 -HostHeader 'shop.example.com'")
                    && script.contains("-Name 'traceFailedRequestsLogging.maxLogFiles' -Value 10;")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Vec::new()));

        let desired = WebSite::new("shop", "C:/sites/shop").binding(Binding::https(8443));
        let err = WebSites::new(&transport).update(&desired).unwrap_err();
        assert!(matches!(err, Error::Execution(ref m) if m == "port in use"));
    }

    #[test]
    fn test_delete() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|script: &str| script.ends_with("Remove-Website -Name 'shop';"))
            .times(1)
            .returning(|_| Ok(Vec::new()));

        WebSites::new(&transport).delete("shop").unwrap();
    }
}
