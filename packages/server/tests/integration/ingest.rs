use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use server::entity::version::VersionStatus;
use server::entity::{event, plugin, version};

use crate::common::{TestApp, make_zip, plugin_archive, routes};

#[tokio::test]
async fn ingest_creates_plugin_version_and_events() {
    let app = TestApp::spawn().await;

    let res = app.ingest_ok(7, plugin_archive("navigator", "1.2.3")).await;
    assert_eq!(res.body["pluginid"], "navigator");
    assert_eq!(res.body["version"], "1.2.3");
    assert!(res.body["result"].as_str().unwrap().contains("plugin.json"));

    let plugin = plugin::Entity::find_by_id("navigator")
        .one(&app.db)
        .await
        .unwrap()
        .expect("plugin row should exist");
    assert_eq!(plugin.user_id, 7);

    let version = version::Entity::find_by_id(("navigator".to_string(), "1.2.3".to_string()))
        .one(&app.db)
        .await
        .unwrap()
        .expect("version row should exist");
    assert_eq!(version.status, VersionStatus::Pending);
    assert!(!version.published);
    assert_eq!(version.downloads, 0);
    assert_eq!(version.pkg_digest.len(), 40);

    let infos: Vec<String> = event::Entity::find()
        .filter(event::Column::PluginId.eq("navigator"))
        .all(&app.db)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.info)
        .collect();
    assert!(infos.contains(&"Plugin created".to_string()));
    assert!(infos.contains(&"Ingested version '1.2.3' status: Pending".to_string()));
}

#[tokio::test]
async fn ingest_requires_userid() {
    let app = TestApp::spawn().await;

    let res = app
        .post_bytes("/api/ingest", plugin_archive("p", "1.0.0"))
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn ingest_requires_an_archive() {
    let app = TestApp::spawn().await;

    let res = app.post("/api/ingest?userid=7").await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn duplicate_version_is_rejected_with_original_timestamp() {
    let app = TestApp::spawn().await;

    app.ingest_ok(7, plugin_archive("dup", "1.0.0")).await;

    let res = app
        .post_bytes("/api/ingest?userid=7", plugin_archive("dup", "1.0.0"))
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["error"], true);
    let transcript = res.body["result"].as_str().unwrap();
    assert!(transcript.contains("already ingested at"), "{transcript}");
    assert!(res.body.get("pluginid").is_none());

    // The first row survives untouched.
    let count = version::Entity::find()
        .filter(version::Column::PluginId.eq("dup"))
        .all(&app.db)
        .await
        .unwrap()
        .len();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn non_owner_cannot_ingest_into_existing_plugin() {
    let app = TestApp::spawn().await;

    app.ingest_ok(7, plugin_archive("owned", "1.0.0")).await;

    let res = app
        .post_bytes("/api/ingest?userid=8", plugin_archive("owned", "1.1.0"))
        .await;
    assert_eq!(res.body["error"], true);
    assert!(
        res.body["result"]
            .as_str()
            .unwrap()
            .contains("owned by another user")
    );

    // Administrative override succeeds without transferring ownership.
    let res = app
        .post_bytes(
            "/api/ingest?userid=8&admin=1",
            plugin_archive("owned", "1.1.0"),
        )
        .await;
    assert_eq!(res.body["error"], false, "{}", res.body["result"]);

    let p = plugin::Entity::find_by_id("owned")
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(p.user_id, 7);
}

#[tokio::test]
async fn autoapprove_requires_admin() {
    let app = TestApp::spawn().await;

    app.post_bytes(
        "/api/ingest?userid=7&autoapprove=1",
        plugin_archive("sneaky", "1.0.0"),
    )
    .await;
    let v = version::Entity::find_by_id(("sneaky".to_string(), "1.0.0".to_string()))
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(v.status, VersionStatus::Pending);

    app.post_bytes(
        "/api/ingest?userid=7&admin=1&autoapprove=1",
        plugin_archive("trusted", "1.0.0"),
    )
    .await;
    let v = version::Entity::find_by_id(("trusted".to_string(), "1.0.0".to_string()))
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(v.status, VersionStatus::Approved);
}

#[tokio::test]
async fn manifest_in_shared_subdirectory_is_accepted() {
    let app = TestApp::spawn().await;

    let manifest = r#"{"id": "nested", "version": "2.0.0", "type": "javascript"}"#;
    let archive = make_zip(&[
        ("nested-2.0.0/plugin.json", manifest.as_bytes()),
        ("nested-2.0.0/main.js", b"x"),
    ]);

    let res = app.ingest_ok(7, archive).await;
    assert_eq!(res.body["pluginid"], "nested");
    assert_eq!(res.body["version"], "2.0.0");
}

#[tokio::test]
async fn missing_manifest_fields_are_reported() {
    let app = TestApp::spawn().await;

    let archive = make_zip(&[("plugin.json", br#"{"version": "1.0.0", "type": "js"}"#)]);
    let res = app.post_bytes("/api/ingest?userid=7", archive).await;
    assert_eq!(res.body["error"], true);
    assert!(
        res.body["result"]
            .as_str()
            .unwrap()
            .contains("'id' missing from plugin.json")
    );
}

#[tokio::test]
async fn failed_ingest_leaves_no_rows_behind() {
    let app = TestApp::spawn().await;

    // Manifest decodes but lacks a required field, so the pipeline aborts
    // before any row is committed.
    let archive = make_zip(&[("plugin.json", br#"{"id": "ghost", "version": "1.0"}"#)]);
    let res = app.post_bytes("/api/ingest?userid=7", archive).await;
    assert_eq!(res.body["error"], true);

    assert!(
        plugin::Entity::find_by_id("ghost")
            .one(&app.db)
            .await
            .unwrap()
            .is_none()
    );

    let events = event::Entity::find()
        .filter(event::Column::PluginId.eq("ghost"))
        .all(&app.db)
        .await
        .unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn backend_failures_are_reported_generically() {
    let app = TestApp::spawn().await;

    // Deflates to a small upload but repackages (stored) past the blob
    // size limit, so the pipeline fails inside the store.
    let manifest = r#"{"id": "huge", "version": "1.0.0", "type": "javascript"}"#;
    let payload = vec![0u8; 17 * 1024 * 1024];
    let archive = make_zip(&[
        ("plugin.json", manifest.as_bytes()),
        ("payload.bin", payload.as_slice()),
    ]);

    let res = app.post_bytes("/api/ingest?userid=7", archive).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["error"], true);
    let transcript = res.body["result"].as_str().unwrap();
    assert!(transcript.contains("ERROR: Storage problems"), "{transcript}");
    assert!(!transcript.contains("size limit"), "{transcript}");
}

#[tokio::test]
async fn ingest_rejects_non_http_urls() {
    let app = TestApp::spawn().await;

    let res = app
        .post("/api/ingest?userid=7&url=file:///etc/passwd")
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["error"], true);
    assert!(
        res.body["result"]
            .as_str()
            .unwrap()
            .contains("unsupported download protocol")
    );
}

#[tokio::test]
async fn icon_is_stored_when_present() {
    let app = TestApp::spawn().await;

    let manifest = serde_json::json!({
        "id": "iconic",
        "version": "1.0.0",
        "type": "javascript",
        "icon": "logo.png",
    });
    let archive = make_zip(&[
        ("plugin.json", manifest.to_string().as_bytes()),
        ("logo.png", &[0x89, 0x50, 0x4e, 0x47]),
    ]);
    let res = app.ingest_ok(7, archive).await;
    assert!(res.body["result"].as_str().unwrap().contains("as icon"));

    let v = version::Entity::find_by_id(("iconic".to_string(), "1.0.0".to_string()))
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    let icon = v.icon_digest.expect("icon digest should be recorded");
    assert_eq!(icon.len(), 40);

    let blob = app.get(&routes::blob(&icon)).await;
    assert_eq!(blob.status, 200);
}
