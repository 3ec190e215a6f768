use serde_json::json;
use server::files::OwnerKind;

use crate::common::{TestApp, routes};

mod singleton {
    use super::*;

    #[tokio::test]
    async fn replacing_thumbnail_keeps_one_row() {
        let app = TestApp::spawn().await;
        let first = app.insert_file("a.png", 1).await;
        let second = app.insert_file("b.png", 1).await;

        let res = app
            .put(&routes::post_thumbnail(1), &json!({"file_id": first.id}))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app
            .put(&routes::post_thumbnail(1), &json!({"file_id": second.id}))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.ids("file_ids"), vec![second.id]);

        let rows = app.mappings(OwnerKind::Post, 1, "thumbnail").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].file_id, second.id);
    }

    #[tokio::test]
    async fn thumbnail_for_unknown_file_is_rejected() {
        let app = TestApp::spawn().await;
        let existing = app.insert_file("a.png", 1).await;
        app.put(&routes::post_thumbnail(1), &json!({"file_id": existing.id}))
            .await;

        let res = app
            .put(&routes::post_thumbnail(1), &json!({"file_id": 424_242}))
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert!(res.body["message"].as_str().unwrap().contains("424242"));

        // The previous thumbnail survives the failed replacement.
        let rows = app.mappings(OwnerKind::Post, 1, "thumbnail").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].file_id, existing.id);
    }

    #[tokio::test]
    async fn profile_image_is_scoped_to_user() {
        let app = TestApp::spawn().await;
        let avatar = app.insert_file("me.png", 1).await;

        let res = app
            .put(&routes::profile_image(5), &json!({"file_id": avatar.id}))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["owner_type"], "user");
        assert_eq!(res.body["role"], "profile_image");

        assert_eq!(app.mappings(OwnerKind::User, 5, "profile_image").await.len(), 1);
        assert!(app.mappings(OwnerKind::Post, 5, "profile_image").await.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .put(&routes::post_thumbnail(1), &json!({"file_id": "abc"}))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod content {
    use super::*;

    fn body(ids: &[i64]) -> String {
        ids.iter()
            .map(|id| format!("Paragraph.\n\n::file[id={id} caption=\"x\"]::"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[tokio::test]
    async fn content_sync_adds_and_removes_references() {
        let app = TestApp::spawn().await;
        let a = app.insert_file("a.png", 1).await;
        let b = app.insert_file("b.png", 1).await;
        let c = app.insert_file("c.png", 1).await;

        let res = app
            .put(&routes::post_content(9), &json!({"body": body(&[a.id, b.id, a.id])}))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.ids("added"), vec![a.id, b.id]);
        assert!(res.ids("removed").is_empty());

        let res = app
            .put(&routes::post_content(9), &json!({"body": body(&[b.id, c.id])}))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.ids("added"), vec![c.id]);
        assert_eq!(res.ids("removed"), vec![a.id]);
        assert_eq!(res.ids("file_ids"), vec![b.id, c.id]);

        let rows = app.mappings(OwnerKind::Post, 9, "content").await;
        let mut mapped: Vec<i64> = rows.iter().map(|r| r.file_id).collect();
        mapped.sort_unstable();
        assert_eq!(mapped, vec![b.id, c.id]);
    }

    #[tokio::test]
    async fn content_with_unknown_reference_changes_nothing() {
        let app = TestApp::spawn().await;
        let a = app.insert_file("a.png", 1).await;
        app.put(&routes::post_content(3), &json!({"body": body(&[a.id])}))
            .await;

        let res = app
            .put(&routes::post_content(3), &json!({"body": body(&[777_777])}))
            .await;
        assert_eq!(res.status, 404);
        assert!(res.body["message"].as_str().unwrap().contains("777777"));

        // Removal of `a` was rolled back together with the failed add.
        let rows = app.mappings(OwnerKind::Post, 3, "content").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].file_id, a.id);
    }

    #[tokio::test]
    async fn blank_content_clears_content_but_not_thumbnail() {
        let app = TestApp::spawn().await;
        let a = app.insert_file("a.png", 1).await;
        app.put(&routes::post_content(4), &json!({"body": body(&[a.id])}))
            .await;
        app.put(&routes::post_thumbnail(4), &json!({"file_id": a.id}))
            .await;

        let res = app.put(&routes::post_content(4), &json!({})).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.ids("removed"), vec![a.id]);

        assert!(app.mappings(OwnerKind::Post, 4, "content").await.is_empty());
        assert_eq!(app.mappings(OwnerKind::Post, 4, "thumbnail").await.len(), 1);
    }

    #[tokio::test]
    async fn clearing_post_removes_every_mapping() {
        let app = TestApp::spawn().await;
        let a = app.insert_file("a.png", 1).await;
        let b = app.insert_file("b.png", 1).await;
        app.put(&routes::post_content(8), &json!({"body": body(&[a.id, b.id])}))
            .await;
        app.put(&routes::post_thumbnail(8), &json!({"file_id": a.id}))
            .await;

        let res = app.delete(&routes::post_files(8)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["removed"], 3);

        assert!(app.mappings(OwnerKind::Post, 8, "content").await.is_empty());
        assert!(app.mappings(OwnerKind::Post, 8, "thumbnail").await.is_empty());
        // Files stay until garbage collection.
        assert!(app.file_exists(a.id).await);
    }
}
