use crate::common::{TestApp, plugin_archive, routes};

#[tokio::test]
async fn public_listing_only_shows_live_plugins() {
    let app = TestApp::spawn().await;

    app.ingest_ok(7, plugin_archive("draft", "1.0.0")).await;

    let res = app.get(routes::PLUGINS).await;
    assert_eq!(res.status, 200);
    assert!(res.body.as_array().unwrap().is_empty());
    assert_eq!(app.get(routes::PLUGINS_COUNT).await.text, "0");

    app.post(&format!(
        "{}?userid=9&admin=1",
        routes::version_action("draft", "1.0.0", "approve")
    ))
    .await;
    app.post(&format!(
        "{}?userid=7",
        routes::version_action("draft", "1.0.0", "publish")
    ))
    .await;

    let res = app.get(routes::PLUGINS).await;
    let rows = res.body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "draft");
    assert_eq!(rows[0]["version"], "1.0.0");
    assert_eq!(rows[0]["userid"], 7);
    assert_eq!(app.get(routes::PLUGINS_COUNT).await.text, "1");
}

#[tokio::test]
async fn owner_and_admin_views_include_drafts() {
    let app = TestApp::spawn().await;

    app.ingest_ok(7, plugin_archive("mine", "1.0.0")).await;
    app.ingest_ok(8, plugin_archive("theirs", "1.0.0")).await;

    let owner = app.get(&format!("{}?userid=7", routes::PLUGINS)).await;
    let rows = owner.body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "mine");
    assert_eq!(rows[0]["status"], "p");

    let admin = app.get(&format!("{}?admin=1", routes::PLUGINS)).await;
    let ids: Vec<&str> = admin
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["mine", "theirs"]);
}

#[tokio::test]
async fn listing_pagination() {
    let app = TestApp::spawn().await;

    for i in 0..5 {
        app.ingest_ok(7, plugin_archive(&format!("plugin-{i}"), "1.0.0"))
            .await;
    }

    let page = app
        .get(&format!("{}?admin=1&offset=2&limit=2", routes::PLUGINS))
        .await;
    let ids: Vec<&str> = page
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["plugin-2", "plugin-3"]);

    assert_eq!(
        app.get(&format!("{}?admin=1", routes::PLUGINS_COUNT)).await.text,
        "5"
    );
}

#[tokio::test]
async fn plugin_record_fetch_and_update() {
    let app = TestApp::spawn().await;

    app.ingest_ok(7, plugin_archive("navigator", "1.0.0")).await;

    let res = app.get(&routes::plugin("navigator")).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], "navigator");
    assert_eq!(res.body["userid"], 7);
    assert_eq!(res.body["betasecret"], "");

    let missing = app.get(&routes::plugin("nope")).await;
    assert_eq!(missing.status, 404);

    let update = serde_json::json!({
        "betasecret": "hush",
        "downloadurl": "https://example.com/navigator.zip",
    });
    let denied = app
        .put_json(&format!("{}?userid=8", routes::plugin("navigator")), &update)
        .await;
    assert_eq!(denied.status, 403);

    let res = app
        .put_json(&format!("{}?userid=7", routes::plugin("navigator")), &update)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["betasecret"], "hush");
    assert_eq!(res.body["downloadurl"], "https://example.com/navigator.zip");
}

#[tokio::test]
async fn version_listing_and_fetch() {
    let app = TestApp::spawn().await;

    app.ingest_ok(7, plugin_archive("nav", "1.0.0")).await;
    app.ingest_ok(7, plugin_archive("nav", "1.1.0")).await;

    let res = app.get(&routes::versions("nav")).await;
    let rows = res.body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    // Newest first.
    assert_eq!(rows[0]["version"], "1.1.0");
    assert_eq!(rows[1]["version"], "1.0.0");

    let one = app.get(&routes::version("nav", "1.0.0")).await;
    assert_eq!(one.status, 200);
    assert_eq!(one.body["type"], "javascript");
    assert_eq!(one.body["status"], "p");
    assert_eq!(one.body["pkg"].as_str().unwrap().len(), 40);

    let missing = app.get(&routes::version("nav", "9.9.9")).await;
    assert_eq!(missing.status, 404);
}

#[tokio::test]
async fn version_delete_requires_ownership() {
    let app = TestApp::spawn().await;

    app.ingest_ok(7, plugin_archive("nav", "1.0.0")).await;

    let denied = app
        .delete(&format!("{}?userid=8", routes::version("nav", "1.0.0")))
        .await;
    assert_eq!(denied.status, 403);

    let res = app
        .delete(&format!("{}?userid=7", routes::version("nav", "1.0.0")))
        .await;
    assert_eq!(res.status, 204);

    let gone = app.get(&routes::version("nav", "1.0.0")).await;
    assert_eq!(gone.status, 404);

    let events = app.get(&format!("{}?plugin=nav", routes::EVENTS)).await;
    let infos: Vec<&str> = events
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["info"].as_str().unwrap())
        .collect();
    assert!(infos.contains(&"Deleted version '1.0.0'"));
}

#[tokio::test]
async fn lifecycle_actions_update_status_and_audit_log() {
    let app = TestApp::spawn().await;

    app.ingest_ok(7, plugin_archive("nav", "1.0.0")).await;

    let res = app
        .post(&format!(
            "{}?userid=9&admin=1",
            routes::version_action("nav", "1.0.0", "approve")
        ))
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "a");

    let res = app
        .post(&format!(
            "{}?userid=7",
            routes::version_action("nav", "1.0.0", "publish")
        ))
        .await;
    assert_eq!(res.body["published"], true);

    let res = app
        .post(&format!(
            "{}?userid=9&admin=1",
            routes::version_action("nav", "1.0.0", "pend")
        ))
        .await;
    assert_eq!(res.body["status"], "p");

    let unknown = app
        .post(&format!(
            "{}?userid=7",
            routes::version_action("nav", "1.0.0", "explode")
        ))
        .await;
    assert_eq!(unknown.status, 400);

    let anonymous = app
        .post(&routes::version_action("nav", "1.0.0", "publish"))
        .await;
    assert_eq!(anonymous.status, 400);

    let events = app.get(&format!("{}?plugin=nav", routes::EVENTS)).await;
    let infos: Vec<&str> = events
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["info"].as_str().unwrap())
        .collect();
    assert!(infos.contains(&"Approved '1.0.0'"));
    assert!(infos.contains(&"Published '1.0.0'"));
    assert!(infos.contains(&"Pended '1.0.0'"));
}

#[tokio::test]
async fn event_listing_filters_and_counts() {
    let app = TestApp::spawn().await;

    app.ingest_ok(7, plugin_archive("first", "1.0.0")).await;
    app.ingest_ok(8, plugin_archive("second", "1.0.0")).await;

    // Each ingest records "Plugin created" plus the ingest event.
    assert_eq!(app.get(routes::EVENTS_COUNT).await.text, "4");
    assert_eq!(
        app.get(&format!("{}?plugin=first", routes::EVENTS_COUNT))
            .await
            .text,
        "2"
    );
    assert_eq!(
        app.get(&format!("{}?userid=8", routes::EVENTS_COUNT)).await.text,
        "2"
    );

    let res = app.get(&format!("{}?plugin=second", routes::EVENTS)).await;
    let rows = res.body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|e| e["pluginid"] == "second"));
    assert!(rows.iter().all(|e| e["userid"] == 8));
}

#[tokio::test]
async fn blob_download_bumps_the_download_counter() {
    let app = TestApp::spawn().await;

    app.ingest_ok(7, plugin_archive("nav", "1.0.0")).await;

    let version = app.get(&routes::version("nav", "1.0.0")).await;
    let digest = version.body["pkg"].as_str().unwrap().to_string();

    let blob = app.get(&routes::blob(&digest)).await;
    assert_eq!(blob.status, 200);
    assert!(!blob.text.is_empty());
    assert_eq!(blob.etag.unwrap(), format!("\"{digest}\""));

    let version = app.get(&routes::version("nav", "1.0.0")).await;
    assert_eq!(version.body["downloads"], 1);
}

#[tokio::test]
async fn blob_lookup_rejects_malformed_digests() {
    let app = TestApp::spawn().await;

    for digest in ["short", "../../etc/passwd", &"zz".repeat(20)] {
        let res = app.get(&routes::blob(digest)).await;
        assert_eq!(res.status, 404, "digest {digest:?} should 404");
    }

    let absent = app.get(&routes::blob(&"ab".repeat(20))).await;
    assert_eq!(absent.status, 404);
}
