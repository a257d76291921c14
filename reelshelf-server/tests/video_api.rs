mod common;

use std::{path::Path, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use axum_test::multipart::{MultipartForm, Part};
use reelshelf_core::{ExtractionFailed, FrameSource, Theme, UnavailableFrameSource};
use reelshelf_server::routes::create_app;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{build_test_app, build_test_app_with};

const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];

fn video_part(name: &str) -> Part {
    Part::bytes(b"not really a video".to_vec())
        .file_name(name)
        .mime_type("video/mp4")
}

async fn upload(server: &axum_test::TestServer, names: &[&str]) -> Value {
    let mut form = MultipartForm::new();
    for name in names {
        form = form.add_part("files", video_part(name));
    }
    let response = server.post("/api/upload").multipart(form).await;
    response.assert_status_ok();
    response.json::<Value>()
}

async fn list(server: &axum_test::TestServer) -> Vec<Value> {
    let response = server.get("/api/videos").await;
    response.assert_status_ok();
    response.json::<Value>()["items"]
        .as_array()
        .cloned()
        .unwrap_or_default()
}

#[tokio::test]
async fn upload_cover_delete_end_to_end() -> Result<()> {
    let app = build_test_app().await?;
    let server = &app.server;

    let body = upload(server, &["lesson1.mp4"]).await;
    assert_eq!(body, json!({"ok": true, "count": 1}));

    let items = list(server).await;
    assert_eq!(items.len(), 1);
    let video = &items[0];
    let id = video["id"].as_str().expect("id").to_string();
    assert_eq!(video["title"], "lesson1");
    assert_eq!(video["size"], 18);
    assert!(video["uploadedAt"].as_u64().is_some());
    assert_eq!(video["url"], format!("/uploads/{id}"));

    let thumb = video["thumb"].as_str().expect("slate thumb").to_string();
    assert!(thumb.ends_with(".svg"));
    let slate = server.get(&thumb).await;
    slate.assert_status_ok();
    assert!(slate.text().contains("lesson1"));

    let cover = server
        .post(&format!("/api/videos/{id}/cover"))
        .multipart(
            MultipartForm::new().add_part(
                "cover",
                Part::bytes(PNG.to_vec())
                    .file_name("cover.png")
                    .mime_type("image/png"),
            ),
        )
        .await;
    cover.assert_status_ok();
    let cover_url = format!("/uploads/{id}.cover.jpg");
    assert_eq!(
        cover.json::<Value>(),
        json!({"ok": true, "coverURL": cover_url})
    );
    assert_eq!(list(server).await[0]["thumb"], cover_url);

    server
        .delete(&format!("/api/videos/{id}"))
        .await
        .assert_status_ok();
    assert!(list(server).await.is_empty());

    let again = server.delete(&format!("/api/videos/{id}")).await;
    again.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(again.json::<Value>()["error"]["status"], 404);

    let mut entries = tokio::fs::read_dir(app.library_root()).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        assert_eq!(name, "metadata.json", "unexpected leftover {name}");
    }
    Ok(())
}

#[tokio::test]
async fn batch_upload_gives_every_file_a_thumbnail() -> Result<()> {
    let app = build_test_app().await?;

    let body = upload(&app.server, &["a.mp4", "a.mp4", "b.mov"]).await;
    assert_eq!(body["count"], 3);

    let items = list(&app.server).await;
    assert_eq!(items.len(), 3);
    for item in &items {
        assert!(item["thumb"].is_string(), "missing thumb for {item}");
    }
    assert_ne!(items[0]["id"], items[1]["id"]);
    Ok(())
}

#[tokio::test]
async fn non_video_files_and_other_fields_are_skipped() -> Result<()> {
    let app = build_test_app().await?;

    let form = MultipartForm::new()
        .add_text("note", "hello")
        .add_part(
            "files",
            Part::bytes(b"plain".to_vec())
                .file_name("notes.txt")
                .mime_type("text/plain"),
        )
        .add_part("files", video_part("clip.webm"));
    let response = app.server.post("/api/upload").multipart(form).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"ok": true, "count": 1}));

    let empty = app
        .server
        .post("/api/upload")
        .multipart(MultipartForm::new().add_text("note", "nothing"))
        .await;
    assert_eq!(empty.json::<Value>(), json!({"ok": true, "count": 0}));
    Ok(())
}

#[tokio::test]
async fn oversize_upload_is_rejected_without_leftovers() -> Result<()> {
    let app = build_test_app_with(Arc::new(UnavailableFrameSource), |config| {
        config.library.max_video_bytes = 8;
        config.library.max_cover_bytes = 4;
    })
    .await?;

    let form = MultipartForm::new().add_part("files", video_part("big.mp4"));
    let response = app.server.post("/api/upload").multipart(form).await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    assert!(list(&app.server).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn rename_validates_and_isolates() -> Result<()> {
    let app = build_test_app().await?;
    upload(&app.server, &["one.mp4", "two.mp4"]).await;
    let before = list(&app.server).await;
    let id = before[0]["id"].as_str().unwrap().to_string();

    let blank = app
        .server
        .patch(&format!("/api/videos/{id}"))
        .json(&json!({"title": "   "}))
        .await;
    blank.assert_status(StatusCode::BAD_REQUEST);

    let missing = app
        .server
        .patch(&format!("/api/videos/{id}"))
        .json(&json!({}))
        .await;
    missing.assert_status(StatusCode::BAD_REQUEST);

    let renamed = app
        .server
        .patch(&format!("/api/videos/{id}"))
        .json(&json!({"title": "Quadratics"}))
        .await;
    renamed.assert_status_ok();
    assert_eq!(renamed.json::<Value>(), json!({"ok": true}));

    let after = list(&app.server).await;
    assert_eq!(after[0]["title"], "Quadratics");
    for field in ["id", "url", "thumb", "size", "uploadedAt"] {
        assert_eq!(before[0][field], after[0][field], "{field} changed");
    }
    assert_eq!(before[1], after[1]);

    app.server
        .patch("/api/videos/1700000000000-0__gone.mp4")
        .json(&json!({"title": "x"}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn rename_without_a_json_body_is_bad_request() -> Result<()> {
    let app = build_test_app().await?;
    upload(&app.server, &["one.mp4"]).await;
    let id = list(&app.server).await[0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let router = create_app(app.state.clone());

    let empty = Request::builder()
        .method("PATCH")
        .uri(format!("/api/videos/{id}"))
        .body(Body::empty())?;
    let response = router.clone().oneshot(empty).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&body)?;
    assert_eq!(body["error"]["status"], 400);

    let garbled = Request::builder()
        .method("PATCH")
        .uri(format!("/api/videos/{id}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{title:"))?;
    let response = router.oneshot(garbled).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(list(&app.server).await[0]["title"], "one");
    Ok(())
}

#[tokio::test]
async fn size_cap_applies_per_file_not_per_batch() -> Result<()> {
    let app = build_test_app_with(Arc::new(UnavailableFrameSource), |config| {
        config.library.max_video_bytes = 100 * 1024;
        config.library.max_cover_bytes = 4 * 1024;
    })
    .await?;

    let sized = |name: &str, len: usize| {
        Part::bytes(vec![7u8; len])
            .file_name(name)
            .mime_type("video/mp4")
    };

    let form = MultipartForm::new()
        .add_part("files", sized("first.mp4", 90 * 1024))
        .add_part("files", sized("second.mp4", 90 * 1024));
    let response = app.server.post("/api/upload").multipart(form).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["count"], 2);

    let form = MultipartForm::new().add_part("files", sized("third.mp4", 101 * 1024));
    let response = app.server.post("/api/upload").multipart(form).await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    assert_eq!(list(&app.server).await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn hand_copied_files_are_listed_renamed_and_deleted() -> Result<()> {
    let app = build_test_app().await?;
    tokio::fs::write(app.library_root().join("My Lesson.mp4"), b"video").await?;

    let items = list(&app.server).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "My Lesson.mp4");
    assert_eq!(items[0]["title"], "My Lesson");
    assert_eq!(items[0]["url"], "/uploads/My%20Lesson.mp4");

    app.server
        .patch("/api/videos/My%20Lesson.mp4")
        .json(&json!({"title": "Week one"}))
        .await
        .assert_status_ok();
    assert_eq!(list(&app.server).await[0]["title"], "Week one");

    app.server
        .delete("/api/videos/My%20Lesson.mp4")
        .await
        .assert_status_ok();
    assert!(list(&app.server).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn slate_regeneration_applies_theme() -> Result<()> {
    let app = build_test_app().await?;
    upload(&app.server, &["lesson2.mp4"]).await;
    let id = list(&app.server).await[0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .server
        .post(&format!("/api/videos/{id}/slate"))
        .add_query_param("theme", "paper")
        .await;
    response.assert_status_ok();
    let slate_url = format!("/uploads/{id}.svg");
    assert_eq!(
        response.json::<Value>(),
        json!({"ok": true, "slateURL": slate_url})
    );

    let svg = app.server.get(&slate_url).await.text();
    let paper = Theme::Paper.palette().background_start;
    assert!(svg.contains(paper));

    app.server
        .post("/api/videos/1700000000000-0__gone.mp4/slate")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn unknown_slate_theme_uses_configured_default() -> Result<()> {
    let app = build_test_app_with(Arc::new(UnavailableFrameSource), |config| {
        config.slate.default_theme = Theme::Chalk;
    })
    .await?;
    upload(&app.server, &["lesson4.mp4"]).await;
    let id = list(&app.server).await[0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .server
        .post(&format!("/api/videos/{id}/slate"))
        .add_query_param("theme", "bogus")
        .await;
    response.assert_status_ok();

    let svg = app.server.get(&format!("/uploads/{id}.svg")).await.text();
    assert!(svg.contains(Theme::Chalk.palette().background_start));
    assert!(!svg.contains(Theme::Midnight.palette().background_start));
    Ok(())
}

#[tokio::test]
async fn disallowed_cover_is_rejected_and_previous_kept() -> Result<()> {
    let app = build_test_app().await?;
    upload(&app.server, &["lesson3.mp4"]).await;
    let id = list(&app.server).await[0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let path = format!("/api/videos/{id}/cover");

    app.server
        .post(&path)
        .multipart(MultipartForm::new().add_part(
            "cover",
            Part::bytes(PNG.to_vec()).file_name("c.png").mime_type("image/png"),
        ))
        .await
        .assert_status_ok();

    let gif = app
        .server
        .post(&path)
        .multipart(MultipartForm::new().add_part(
            "cover",
            Part::bytes(b"GIF89a\x01\x00".to_vec())
                .file_name("c.gif")
                .mime_type("image/gif"),
        ))
        .await;
    gif.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let missing_field = app
        .server
        .post(&path)
        .multipart(MultipartForm::new().add_text("other", "x"))
        .await;
    missing_field.assert_status(StatusCode::BAD_REQUEST);

    let stored = tokio::fs::read(app.library_root().join(format!("{id}.cover.jpg"))).await?;
    assert_eq!(stored, PNG);
    Ok(())
}

#[tokio::test]
async fn traversal_ids_are_not_found() -> Result<()> {
    let app = build_test_app().await?;
    app.server
        .delete("/api/videos/..%2Fmetadata.json")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .delete("/api/videos/metadata.json")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert!(app.library_root().exists());
    Ok(())
}

/// Writes a tiny JPEG for every source.
struct StillFrames;

#[async_trait]
impl FrameSource for StillFrames {
    fn name(&self) -> &'static str {
        "still"
    }

    async fn extract(&self, _source: &Path, out: &Path) -> Result<(), ExtractionFailed> {
        tokio::fs::write(out, [0xFF, 0xD8, 0xFF, 0xD9])
            .await
            .map_err(|_| ExtractionFailed)
    }
}

#[tokio::test]
async fn extracted_frames_are_preferred_and_ping_reports_source() -> Result<()> {
    let app = build_test_app_with(Arc::new(StillFrames), |_| {}).await?;

    let ping = app.server.get("/ping").await;
    ping.assert_status_ok();
    assert_eq!(ping.json::<Value>()["frameSource"], "still");

    upload(&app.server, &["intro.mkv"]).await;
    let items = list(&app.server).await;
    let item = &items[0];
    let id = item["id"].as_str().unwrap();
    assert_eq!(item["thumb"], format!("/uploads/{id}.jpg"));
    Ok(())
}
