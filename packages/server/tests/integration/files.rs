use crate::common::{TEST_IMAGE_MAX_BYTES, TestApp, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_stores_object_and_record() {
        let app = TestApp::spawn().await;

        let res = app.upload("Diagram.PNG", vec![7u8; 128]).await;
        assert_eq!(res.status, 201, "upload failed: {}", res.text);

        let id = res.id();
        assert_eq!(res.body["original_name"], "Diagram.PNG");
        assert_eq!(res.body["content_type"], "image/png");
        assert_eq!(res.body["size"], 128);

        let url = res.body["url"].as_str().unwrap();
        assert!(url.starts_with("https://cdn.test/public/images/"), "{url}");
        assert!(url.ends_with(".png"), "{url}");

        let key = url.trim_start_matches("https://cdn.test/");
        assert!(app.store.contains(key));
        assert!(app.file_exists(id).await);
    }

    #[tokio::test]
    async fn upload_rejects_unsupported_extension() {
        let app = TestApp::spawn().await;

        let res = app.upload("setup.exe", vec![1u8; 16]).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.store.is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_path_traversal() {
        let app = TestApp::spawn().await;

        let res = app.upload("..secret.png", vec![1u8; 16]).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn upload_rejects_empty_file() {
        let app = TestApp::spawn().await;

        let res = app.upload("empty.png", Vec::new()).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn upload_enforces_category_limit() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("big.png", vec![0u8; TEST_IMAGE_MAX_BYTES as usize + 1])
            .await;
        assert_eq!(res.status, 413, "{}", res.text);
        assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
        assert!(app.store.is_empty());

        // Documents have their own, larger limit.
        let res = app
            .upload("notes.txt", vec![b'a'; TEST_IMAGE_MAX_BYTES as usize + 1])
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn upload_requires_file_field() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new().text("other", "value");
        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::FILES))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn upload_rejects_second_file_field() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(vec![1u8; 16]).file_name("first.png"),
            )
            .part(
                "file",
                reqwest::multipart::Part::bytes(vec![2u8; 16]).file_name("second.png"),
            );
        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::FILES))
            .multipart(form)
            .send()
            .await
            .unwrap();
        let res = crate::common::TestResponse::from_response(res).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.store.is_empty());
    }
}

mod lookup {
    use super::*;

    #[tokio::test]
    async fn get_file_returns_metadata_and_url() {
        let app = TestApp::spawn().await;
        let file = app.insert_file("cover.png", 1).await;

        let res = app.get(&routes::file(file.id)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.id(), file.id);
        assert_eq!(
            res.body["url"],
            format!("https://cdn.test/{}", file.storage_key)
        );
    }

    #[tokio::test]
    async fn get_missing_file_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::file(999_999)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn presigned_url_uses_default_ttl() {
        let app = TestApp::spawn().await;
        let file = app.insert_file("cover.png", 1).await;

        let res = app.get(&routes::presigned(file.id)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["expires_in_minutes"], 10);
        assert!(res.body["url"].as_str().unwrap().ends_with("expires_in=600"));
    }

    #[tokio::test]
    async fn presigned_url_clamps_ttl() {
        let app = TestApp::spawn().await;
        let file = app.insert_file("cover.png", 1).await;

        let res = app
            .get(&format!("{}?ttl_minutes=999999", routes::presigned(file.id)))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["expires_in_minutes"], 10080);
    }
}
