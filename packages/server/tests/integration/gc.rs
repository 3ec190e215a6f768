use serde_json::json;

use crate::common::{TestApp, routes};

/// Map `file_id` as a thumbnail of some post so the used set is non-empty.
async fn reference(app: &TestApp, post_id: i64, file_id: i64) {
    let res = app
        .put(&routes::post_thumbnail(post_id), &json!({"file_id": file_id}))
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
}

mod collection {
    use super::*;

    #[tokio::test]
    async fn old_unreferenced_file_is_deleted() {
        let app = TestApp::spawn().await;
        let orphan = app.insert_file("orphan.png", 25).await;
        let kept = app.insert_file("kept.png", 25).await;
        reference(&app, 1, kept.id).await;

        let report = app.gc.run_once().await.unwrap();

        assert_eq!(report.candidates, 1);
        assert_eq!(report.remote_deleted, 1);
        assert_eq!(report.rows_deleted, 1);
        assert!(!app.file_exists(orphan.id).await);
        assert!(!app.store.contains(&orphan.storage_key));
    }

    #[tokio::test]
    async fn referenced_file_is_kept_regardless_of_age() {
        let app = TestApp::spawn().await;
        let ancient = app.insert_file("ancient.png", 24 * 365).await;
        reference(&app, 1, ancient.id).await;

        let report = app.gc.run_once().await.unwrap();

        assert_eq!(report.candidates, 0);
        assert!(app.file_exists(ancient.id).await);
        assert!(app.store.contains(&ancient.storage_key));
    }

    #[tokio::test]
    async fn file_within_grace_period_is_kept() {
        let app = TestApp::spawn().await;
        let fresh = app.insert_file("fresh.png", 1).await;
        let kept = app.insert_file("kept.png", 1).await;
        reference(&app, 1, kept.id).await;

        let report = app.gc.run_once().await.unwrap();

        assert_eq!(report.candidates, 0);
        assert!(app.file_exists(fresh.id).await);
    }

    #[tokio::test]
    async fn nothing_referenced_skips_the_run() {
        let app = TestApp::spawn().await;
        let old = app.insert_file("old.png", 24 * 30).await;

        let report = app.gc.run_once().await.unwrap();

        assert!(report.skipped);
        assert_eq!(report.rows_deleted, 0);
        assert!(app.file_exists(old.id).await);
        assert!(app.store.batch_calls().is_empty());
    }

    #[tokio::test]
    async fn references_from_every_domain_are_honoured() {
        let app = TestApp::spawn().await;
        let thumb = app.insert_file("thumb.png", 48).await;
        let avatar = app.insert_file("avatar.png", 48).await;
        let inline = app.insert_file("inline.png", 48).await;
        let orphan = app.insert_file("orphan.png", 48).await;

        reference(&app, 1, thumb.id).await;
        app.put(&routes::profile_image(2), &json!({"file_id": avatar.id}))
            .await;
        app.put(
            &routes::post_content(3),
            &json!({"body": format!("::file[id={}]::", inline.id)}),
        )
        .await;

        let report = app.gc.run_once().await.unwrap();

        assert_eq!(report.used, 3);
        assert_eq!(report.rows_deleted, 1);
        assert!(!app.file_exists(orphan.id).await);
        for kept in [&thumb, &avatar, &inline] {
            assert!(app.file_exists(kept.id).await);
        }
    }

    #[tokio::test]
    async fn file_released_by_owner_is_collected() {
        let app = TestApp::spawn().await;
        let a = app.insert_file("a.png", 48).await;
        let b = app.insert_file("b.png", 48).await;
        reference(&app, 1, a.id).await;
        reference(&app, 2, b.id).await;

        app.delete(&routes::post_files(1)).await;
        let report = app.gc.run_once().await.unwrap();

        assert_eq!(report.rows_deleted, 1);
        assert!(!app.file_exists(a.id).await);
        assert!(app.file_exists(b.id).await);
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn failed_remote_delete_keeps_record_for_next_run() {
        let app = TestApp::spawn().await;
        let gone = app.insert_file("gone.png", 30).await;
        let stuck = app.insert_file("stuck.png", 30).await;
        let kept = app.insert_file("kept.png", 30).await;
        reference(&app, 1, kept.id).await;
        app.store.fail_key(stuck.storage_key.clone());

        let report = app.gc.run_once().await.unwrap();
        assert_eq!(report.candidates, 2);
        assert_eq!(report.remote_failed, 1);
        assert_eq!(report.rows_deleted, 1);
        assert!(!app.file_exists(gone.id).await);
        assert!(app.file_exists(stuck.id).await);

        let report = app.gc.run_once().await.unwrap();
        assert_eq!(report.candidates, 1);
        assert_eq!(report.rows_deleted, 0);
        assert!(app.file_exists(stuck.id).await);
    }

    #[tokio::test]
    async fn cdn_invalidation_covers_confirmed_keys_only() {
        let app = TestApp::spawn().await;
        let gone = app.insert_file("gone.png", 30).await;
        let stuck = app.insert_file("stuck.png", 30).await;
        let kept = app.insert_file("kept.png", 30).await;
        reference(&app, 1, kept.id).await;
        app.store.fail_key(stuck.storage_key.clone());

        app.gc.run_once().await.unwrap();

        assert_eq!(
            app.cdn.calls(),
            vec![vec![format!("/{}", gone.storage_key)]]
        );
    }

    #[tokio::test]
    async fn cdn_failure_still_deletes_rows() {
        let app = TestApp::spawn().await;
        let gone = app.insert_file("gone.png", 30).await;
        let kept = app.insert_file("kept.png", 30).await;
        reference(&app, 1, kept.id).await;
        app.cdn.set_failing(true);

        let report = app.gc.run_once().await.unwrap();

        assert_eq!(report.invalidation_batches, 1);
        assert!(!app.file_exists(gone.id).await);
    }
}

mod admin {
    use super::*;

    #[tokio::test]
    async fn admin_endpoint_runs_collection() {
        let app = TestApp::spawn().await;
        let orphan = app.insert_file("orphan.png", 30).await;
        let kept = app.insert_file("kept.png", 30).await;
        reference(&app, 1, kept.id).await;

        let res = app.post(routes::ADMIN_GC, &json!({})).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["skipped"], false);
        assert_eq!(res.body["candidates"], 1);
        assert_eq!(res.body["rows_deleted"], 1);
        assert!(!app.file_exists(orphan.id).await);
    }
}
