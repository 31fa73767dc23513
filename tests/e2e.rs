//! End-to-end integration tests
//! Run with: cargo test --test e2e -- --ignored (requires an IIS host with
//! the WebAdministration module; set IIS_HOSTNAME/IIS_USERNAME/IIS_PASSWORD
//! to target a remote machine)

use iis_agent::{
    ApplicationPool, Binding, Client, ConnectionConfig, Repository, WebApplication,
    WebApplicationId, WebSite,
};

fn client() -> Client {
    let mut builder = ConnectionConfig::builder();
    if let Ok(host) = std::env::var("IIS_HOSTNAME") {
        builder = builder.hostname(host);
    }
    if let Ok(user) = std::env::var("IIS_USERNAME") {
        builder = builder.username(user);
    }
    if let Ok(pass) = std::env::var("IIS_PASSWORD") {
        builder = builder.password(pass);
    }
    Client::new(builder.build()).unwrap()
}

#[test]
#[ignore] // Run manually: cargo test --test e2e -- --ignored
fn test_app_pool_lifecycle() {
    let client = client();
    let pools = client.app_pools();

    let mut pool = ApplicationPool::new("iis-agent-e2e-pool");
    pool.queue_length = 2000;
    pool.process_model.idle_timeout = 45;
    pool.validate().unwrap();

    let created = pools.create(&pool).unwrap();
    assert_eq!(created.queue_length, 2000);
    assert_eq!(created.process_model.idle_timeout, 45);

    pool.queue_length = 3000;
    pools.update(&pool).unwrap();
    assert_eq!(pools.get(&pool.name).unwrap().queue_length, 3000);

    pools.delete(&pool.name).unwrap();
    assert!(pools.get(&pool.name).unwrap_err().is_not_found());
}

#[test]
#[ignore]
fn test_app_pool_update_rejected_by_host_keeps_state() {
    let client = client();
    let pools = client.app_pools();

    let mut pool = ApplicationPool::new("iis-agent-e2e-rollback");
    pools.create(&pool).unwrap();

    // Skips local validation so the host rejects it
    pool.queue_length = 70000;
    assert!(pools.update(&pool).is_err());
    assert_eq!(pools.get(&pool.name).unwrap().queue_length, 1000);

    pools.delete(&pool.name).unwrap();
}

#[test]
#[ignore]
fn test_site_and_application_lifecycle() {
    let client = client();
    let sites = client.web_sites();
    let apps = client.web_applications();

    let site = WebSite::new("iis-agent-e2e-site", r"C:\inetpub\iis-agent-e2e")
        .binding(Binding::http(18080))
        .binding(Binding::http(18081).host_header("e2e.local"));
    site.validate().unwrap();

    let created = sites.create(&site).unwrap();
    assert_eq!(created.bindings.len(), 2);
    assert!(created.id.is_some());

    let app = WebApplication::new(&site.name, "api", r"C:\inetpub\iis-agent-e2e\api");
    let created_app = apps.create(&app).unwrap();
    assert_eq!(created_app.path.as_deref(), Some("/api"));

    let id = WebApplicationId::new(&site.name, "api");
    apps.delete(&id).unwrap();
    assert!(apps.get(&id).unwrap_err().is_not_found());

    sites.delete(&site.name).unwrap();
    assert!(sites.get(&site.name).unwrap_err().is_not_found());
}
