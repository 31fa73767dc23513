//! Web application repository

use super::rollback::update_with_rollback;
use super::{decode, Repository};
use crate::error::EntityKind;
use crate::models::{WebApplication, WebApplicationId};
use crate::script::{windows_path, ItemPath, Query, Script, Statement};
use crate::transport::Transport;
use crate::{Error, Result};
use serde::Deserialize;

/// `Get-WebApplication` response shape. Site and name are not echoed back.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebApplicationResponse {
    #[serde(default)]
    path: Option<String>,
    #[serde(default, alias = "PhysicalPath")]
    physical_path: String,
    #[serde(default)]
    application_pool: String,
}

impl WebApplicationResponse {
    fn into_model(self, id: &WebApplicationId) -> WebApplication {
        WebApplication {
            site: id.site.clone(),
            name: id.name.clone(),
            path: self.path,
            physical_path: self.physical_path,
            application_pool: self.application_pool,
        }
    }
}

fn item_path(app: &WebApplication) -> ItemPath {
    ItemPath::Application {
        site: app.site.clone(),
        name: app.name.clone(),
    }
}

pub(crate) fn configure_script(app: &WebApplication) -> Script {
    let path = item_path(app);
    Script::web_administration()
        .with(Statement::EnsureDirectory(app.physical_path.clone()))
        .with(Statement::set(&path, "applicationPool", app.application_pool.as_str()))
        .with(Statement::set(&path, "physicalPath", windows_path(&app.physical_path)))
}

/// Web applications under the host's sites
pub struct WebApplications<'a, T: Transport> {
    transport: &'a T,
}

impl<'a, T: Transport> WebApplications<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    fn apply(&self, app: &WebApplication) -> Result<()> {
        self.transport.execute(&configure_script(app).render())?;
        Ok(())
    }
}

impl<T: Transport> Repository for WebApplications<'_, T> {
    type Entity = WebApplication;
    type Id = WebApplicationId;

    fn get(&self, id: &WebApplicationId) -> Result<WebApplication> {
        let script = Script::from(Statement::Query(Query::WebApplication {
            site: id.site.clone(),
            name: id.name.clone(),
        }));
        let output = self.transport.execute(&script.render())?;
        let response: WebApplicationResponse = decode(&output)?
            .ok_or_else(|| Error::not_found(EntityKind::WebApplication, id))?;
        Ok(response.into_model(id))
    }

    /// `New-WebApplication` takes every writable property, so there is no
    /// separate configure step to compensate.
    fn create(&self, desired: &WebApplication) -> Result<WebApplication> {
        let script = Script::web_administration()
            .with(Statement::EnsureDirectory(desired.physical_path.clone()))
            .with(Statement::NewWebApplication {
                site: desired.site.clone(),
                name: desired.name.clone(),
                application_pool: desired.application_pool.clone(),
                physical_path: desired.physical_path.clone(),
            });
        self.transport.execute(&script.render())?;

        let id = desired.id();
        tracing::info!(application = %id, "Web application created");
        self.get(&id)
    }

    fn update(&self, desired: &WebApplication) -> Result<()> {
        let id = desired.id();
        let snapshot = self.get(&id)?;
        update_with_rollback(
            EntityKind::WebApplication,
            &id.to_string(),
            &snapshot,
            desired,
            |app| self.apply(app),
        )?;

        tracing::info!(application = %id, "Web application updated");
        Ok(())
    }

    fn delete(&self, id: &WebApplicationId) -> Result<()> {
        let script = Script::web_administration().with(Statement::RemoveWebApplication {
            site: id.site.clone(),
            name: id.name.clone(),
        });
        self.transport.execute(&script.render())?;
        tracing::info!(application = %id, "Web application deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use mockall::Sequence;

    const APP_JSON: &str = r#"{"path":"/api","applicationPool":"shop","enabledProtocols":"http","PhysicalPath":"C:\\sites\\shop\\api"}"#;

    #[test]
    fn test_get_fills_identity_from_request() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|script: &str| script.starts_with("Get-WebApplication -Site 'shop' -Name 'api'"))
            .times(1)
            .returning(|_| Ok(APP_JSON.as_bytes().to_vec()));

        let app = WebApplications::new(&transport)
            .get(&WebApplicationId::new("shop", "api"))
            .unwrap();
        assert_eq!(app.site, "shop");
        assert_eq!(app.name, "api");
        assert_eq!(app.path.as_deref(), Some("/api"));
        assert_eq!(app.physical_path, r"C:\sites\shop\api");
        assert_eq!(app.application_pool, "shop");
    }

    #[test]
    fn test_get_missing_application() {
        let mut transport = MockTransport::new();
        transport.expect_execute().returning(|_| Ok(Vec::new()));

        let err = WebApplications::new(&transport)
            .get(&WebApplicationId::new("shop", "gone"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "web application 'shop/gone' could not be found at the host"
        );
    }

    #[test]
    fn test_create_in_one_script() {
        let mut transport = MockTransport::new();
        let mut seq = Sequence::new();
        transport
            .expect_execute()
            .withf(|script: &str| {
                script.contains(r"Test-Path -LiteralPath 'C:\sites\shop\api'")
                    && script.contains(
                        r"New-WebApplication -Site 'shop' -Name 'api' -ApplicationPool 'shop' -PhysicalPath 'C:\sites\shop\api'",
                    )
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Vec::new()));
        transport
            .expect_execute()
            .withf(|script: &str| script.starts_with("Get-WebApplication"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(APP_JSON.as_bytes().to_vec()));

        let mut desired = WebApplication::new("shop", "api", "C:/sites/shop/api");
        desired.application_pool = "shop".into();
        let created = WebApplications::new(&transport).create(&desired).unwrap();
        assert_eq!(created.path.as_deref(), Some("/api"));
    }

    #[test]
    fn test_update_rolls_back_pool_change() {
        let mut transport = MockTransport::new();
        let mut seq = Sequence::new();
        transport
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(APP_JSON.as_bytes().to_vec()));
        transport
            .expect_execute()
            .withf(|script: &str| {
                script.contains(r"Set-ItemProperty -Path 'IIS:\Sites\shop\api' -Name 'applicationPool' -Value 'missing';")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(Error::Execution("application pool does not exist".into())));
        transport
            .expect_execute()
            .withf(|script: &str| script.contains("-Name 'applicationPool' -Value 'shop';"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Vec::new()));

        let mut desired = WebApplication::new("shop", "api", r"C:\sites\shop\api");
        desired.application_pool = "missing".into();
        let err = WebApplications::new(&transport).update(&desired).unwrap_err();
        assert!(matches!(err, Error::Execution(ref m) if m == "application pool does not exist"));
    }

    #[test]
    fn test_delete() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|script: &str| script.ends_with("Remove-WebApplication -Site 'shop' -Name 'api';"))
            .times(1)
            .returning(|_| Ok(Vec::new()));

        WebApplications::new(&transport)
            .delete(&WebApplicationId::new("shop", "api"))
            .unwrap();
    }
}
