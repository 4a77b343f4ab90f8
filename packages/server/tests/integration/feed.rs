use crate::common::{TestApp, plugin_archive, routes};

/// Ingest, approve and publish one version so it is publicly visible.
async fn publish_plugin(app: &TestApp, id: &str, version: &str) {
    app.ingest_ok(7, plugin_archive(id, version)).await;
    let res = app
        .post(&format!(
            "{}?userid=9&admin=1",
            routes::version_action(id, version, "approve")
        ))
        .await;
    assert_eq!(res.status, 200, "approve failed: {}", res.text);
    let res = app
        .post(&format!(
            "{}?userid=7",
            routes::version_action(id, version, "publish")
        ))
        .await;
    assert_eq!(res.status, 200, "publish failed: {}", res.text);
}

#[tokio::test]
async fn feed_lists_published_approved_versions() {
    let app = TestApp::spawn().await;

    publish_plugin(&app, "navigator", "1.2.3").await;
    app.ingest_ok(7, plugin_archive("hidden", "0.1.0")).await;

    let res = app.get(routes::FEED).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["version"], 1);

    let plugins = res.body["plugins"].as_array().unwrap();
    assert_eq!(plugins.len(), 1);
    assert_eq!(plugins[0]["id"], "navigator");
    assert_eq!(plugins[0]["version"], "1.2.3");
    let url = plugins[0]["downloadURL"].as_str().unwrap();
    assert!(
        url.starts_with("http://registry.test/public/data/"),
        "{url}"
    );
}

#[tokio::test]
async fn feed_picks_highest_published_version() {
    let app = TestApp::spawn().await;

    publish_plugin(&app, "nav", "1.0.0").await;
    publish_plugin(&app, "nav", "1.10.0").await;
    publish_plugin(&app, "nav", "1.9.0").await;

    let res = app.get(routes::FEED).await;
    let plugins = res.body["plugins"].as_array().unwrap();
    assert_eq!(plugins.len(), 1);
    assert_eq!(plugins[0]["version"], "1.10.0");
}

#[tokio::test]
async fn rejected_versions_land_on_the_blacklist() {
    let app = TestApp::spawn().await;

    app.ingest_ok(7, plugin_archive("bad", "0.9.0")).await;
    app.post(&format!(
        "{}?userid=9&admin=1",
        routes::version_action("bad", "0.9.0", "reject")
    ))
    .await;

    let res = app.get(routes::FEED).await;
    assert!(res.body["plugins"].as_array().unwrap().is_empty());
    let blacklist = res.body["blacklist"].as_array().unwrap();
    assert_eq!(blacklist.len(), 1);
    assert_eq!(blacklist[0]["id"], "bad");
    assert_eq!(blacklist[0]["version"], "0.9.0");
}

#[tokio::test]
async fn etag_revalidation_returns_304() {
    let app = TestApp::spawn().await;

    publish_plugin(&app, "navigator", "1.0.0").await;

    let first = app.get(routes::FEED).await;
    let etag = first.etag.expect("feed response should carry an ETag");

    let revalidated = app
        .get_with_header(routes::FEED, "If-None-Match", &etag)
        .await;
    assert_eq!(revalidated.status, 304);

    // A catalog change invalidates the tag.
    publish_plugin(&app, "other", "1.0.0").await;
    let changed = app
        .get_with_header(routes::FEED, "If-None-Match", &etag)
        .await;
    assert_eq!(changed.status, 200);
    assert_ne!(changed.etag.unwrap(), etag);
}

#[tokio::test]
async fn beta_password_reveals_pending_versions() {
    let app = TestApp::spawn().await;

    app.ingest_ok(7, plugin_archive("beta", "1.0.0")).await;
    let res = app
        .put_json(
            &format!("{}?userid=7", routes::plugin("beta")),
            &serde_json::json!({"betasecret": "hush"}),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let anonymous = app.get(routes::FEED).await;
    assert!(anonymous.body["plugins"].as_array().unwrap().is_empty());

    let tester = app.get(&format!("{}?betapassword=hush", routes::FEED)).await;
    let plugins = tester.body["plugins"].as_array().unwrap();
    assert_eq!(plugins.len(), 1);
    assert_eq!(plugins[0]["id"], "beta");
}

#[tokio::test]
async fn admin_feed_password_bypasses_gating() {
    let app = TestApp::spawn().await;

    app.ingest_ok(7, plugin_archive("pending", "1.0.0")).await;

    let res = app
        .get(&format!("{}?betapassword=adminfeed", routes::FEED))
        .await;
    let plugins = res.body["plugins"].as_array().unwrap();
    assert_eq!(plugins.len(), 1);
    assert_eq!(plugins[0]["id"], "pending");
}

#[tokio::test]
async fn min_app_version_filters_old_clients() {
    let app = TestApp::spawn().await;

    let manifest = serde_json::json!({
        "id": "modern",
        "version": "2.0.0",
        "type": "javascript",
        "minAppVersion": "4.10.0",
    });
    let archive = crate::common::make_zip(&[
        ("plugin.json", manifest.to_string().as_bytes()),
        ("main.js", b"x"),
    ]);
    app.ingest_ok(7, archive).await;
    app.post(&format!(
        "{}?userid=9&admin=1",
        routes::version_action("modern", "2.0.0", "approve")
    ))
    .await;
    app.post(&format!(
        "{}?userid=7",
        routes::version_action("modern", "2.0.0", "publish")
    ))
    .await;

    let old_client = app.get(&format!("{}?version=4.9.0", routes::FEED)).await;
    assert!(old_client.body["plugins"].as_array().unwrap().is_empty());

    let new_client = app.get(&format!("{}?version=4.10.0", routes::FEED)).await;
    assert_eq!(new_client.body["plugins"].as_array().unwrap().len(), 1);

    // No version argument and no parseable User-Agent: no filtering.
    let unknown = app.get(routes::FEED).await;
    assert_eq!(unknown.body["plugins"].as_array().unwrap().len(), 1);

    // An unparseable version argument means no filtering either.
    let garbled = app.get(&format!("{}?version=abc", routes::FEED)).await;
    assert_eq!(garbled.body["plugins"].as_array().unwrap().len(), 1);
}
