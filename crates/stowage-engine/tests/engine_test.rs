// End-to-end engine tests against an in-memory gateway and pass-through transforms.

mod helpers;

use bytes::Bytes;
use std::sync::Arc;
use stowage_core::StreamError;
use stowage_engine::{
    EngineError, ErrorMetadata, ImageStorageEngine, IncomingFile, Removal, StorageEngine,
};
use stowage_storage::StorageError;

use helpers::fixtures::{body, BrokenNames, SequentialNames, BODY};
use helpers::gateway::MemoryGateway;
use helpers::{config, setup_engine, setup_engine_with};

fn names_and_labels(files: &stowage_engine::StoredFiles) -> Vec<(&str, &str)> {
    files
        .files
        .iter()
        .map(|f| (f.name.as_str(), f.variant_label.as_str()))
        .collect()
}

#[tokio::test]
async fn test_gif_with_thumb_and_web_alternates() {
    let t = setup_engine(r#"{"sizes": [{}, {"name": "thumb", "width": 100}], "webP": true}"#);

    let stored = t
        .engine
        .handle_file(IncomingFile::new("photo.gif", body()))
        .await
        .unwrap();

    assert_eq!(
        names_and_labels(&stored),
        vec![
            ("ab12ef.png", "original"),
            ("ab12ef.webp", "original"),
            ("ab12ef_thumb.png", "thumb"),
            ("ab12ef_thumb.webp", "thumb"),
        ]
    );
    assert_eq!(t.transforms.web_flags(), vec![false, true, false, true]);
    assert!(!t.engine.registry().contains("photo.gif"));

    for file in &stored.files {
        assert_eq!(t.gateway.object(&file.name), Some(Bytes::from_static(BODY)));
        assert_eq!(file.content_hash, format!("etag-{}", BODY.len()));
        assert_eq!(
            file.url,
            format!("https://s3.test/test-bucket/{}", file.name)
        );
    }
}

#[tokio::test]
async fn test_result_count_and_order_follow_plan() {
    let t = setup_engine(
        r#"{"sizes": [
            {"name": "a", "webP": true},
            {"name": "b"},
            {"name": "c", "webP": true}
        ]}"#,
    );

    let stored = t
        .engine
        .handle_file(IncomingFile::new("photo.jpg", body()))
        .await
        .unwrap();

    // 3 variants, 2 of them with web alternates
    assert_eq!(stored.files.len(), 5);
    assert_eq!(
        names_and_labels(&stored),
        vec![
            ("ab12ef_a.jpg", "a"),
            ("ab12ef_a.webp", "a"),
            ("ab12ef_b.jpg", "b"),
            ("ab12ef_c.jpg", "c"),
            ("ab12ef_c.webp", "c"),
        ]
    );
    assert_eq!(
        t.gateway.begun_keys(),
        vec![
            "ab12ef_a.jpg",
            "ab12ef_a.webp",
            "ab12ef_b.jpg",
            "ab12ef_c.jpg",
            "ab12ef_c.webp",
        ]
    );
}

#[tokio::test]
async fn test_store_failure_keeps_registry_entry() {
    let t = setup_engine_with(
        r#"{"sizes": [{}, {"name": "thumb", "width": 100}]}"#,
        MemoryGateway::new().failing_upload("ab12ef_thumb.jpg"),
    );

    let err = t
        .engine
        .handle_file(IncomingFile::new("photo.jpg", body()))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Store(StorageError::UploadFailed(_))));
    assert_eq!(err.error_code(), "STORE_ERROR");
    assert_eq!(
        t.engine.registry().keys("photo.jpg"),
        Some(vec!["ab12ef.jpg".to_string(), "ab12ef_thumb.jpg".to_string()])
    );
}

#[tokio::test]
async fn test_remove_compensates_in_dispatch_order() {
    let t = setup_engine_with(
        r#"{"sizes": [{}, {"name": "thumb"}, {"name": "large"}], "webP": true}"#,
        MemoryGateway::new().failing_upload("ab12ef_large.webp"),
    );

    assert!(t
        .engine
        .handle_file(IncomingFile::new("photo.jpg", body()))
        .await
        .is_err());

    let removal = t.engine.remove_file("photo.jpg").await.unwrap();
    let expected = vec![
        "ab12ef.jpg",
        "ab12ef.webp",
        "ab12ef_thumb.jpg",
        "ab12ef_thumb.webp",
        "ab12ef_large.jpg",
        "ab12ef_large.webp",
    ];
    assert_eq!(removal.deleted_keys(), expected);
    assert!(!t.engine.registry().contains("photo.jpg"));
    for key in expected {
        assert_eq!(t.gateway.object(key), None);
    }
}

#[tokio::test]
async fn test_remove_without_entry_is_trivial() {
    let t = setup_engine("{}");

    let removal = t.engine.remove_file("never-uploaded.jpg").await.unwrap();

    assert_eq!(removal, Removal::NothingToCompensate);
    assert!(t.gateway.deleted_keys().is_empty());
}

#[tokio::test]
async fn test_remove_entry_without_keys() {
    // No extension to suffix, so the session fails before any key is registered
    let t = setup_engine(r#"{"sizes": [{"name": "thumb"}]}"#);

    let err = t
        .engine
        .handle_file(IncomingFile::new("photo", body()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Filename(_)));
    assert_eq!(t.engine.registry().keys("photo"), Some(vec![]));

    let removal = t.engine.remove_file("photo").await.unwrap();

    assert_eq!(removal, Removal::Deleted(vec![]));
    assert!(t.engine.registry().is_empty());
    assert!(t.gateway.deleted_keys().is_empty());
}

#[tokio::test]
async fn test_remove_propagates_delete_failure() {
    let t = setup_engine_with(
        "{}",
        MemoryGateway::new()
            .failing_upload("ab12ef.jpg")
            .failing_delete("ab12ef.jpg"),
    );
    assert!(t
        .engine
        .handle_file(IncomingFile::new("photo.jpg", body()))
        .await
        .is_err());
    assert!(t.engine.registry().contains("photo.jpg"));

    let err = t.engine.remove_file("photo.jpg").await.unwrap_err();

    assert!(matches!(err, EngineError::Store(StorageError::DeleteFailed(_))));
    assert_eq!(t.gateway.deleted_keys(), vec!["ab12ef.jpg"]);
    // The entry is taken before deleting
    assert!(!t.engine.registry().contains("photo.jpg"));
}

#[tokio::test]
async fn test_cdn_url_uses_primary_filename() {
    let t = setup_engine(
        r#"{"cdn": "https://cdn.x", "s3Path": "u/", "sizes": [{}, {"name": "thumb"}]}"#,
    );

    let stored = t
        .engine
        .handle_file(IncomingFile::new("name.jpg", body()))
        .await
        .unwrap();

    assert_eq!(t.gateway.begun_keys(), vec!["u/ab12ef.jpg", "u/ab12ef_thumb.jpg"]);
    for file in &stored.files {
        assert_eq!(file.url, "https://cdn.x/u/ab12ef.jpg");
    }
    assert_eq!(stored.files[1].name, "ab12ef_thumb.jpg");
}

#[tokio::test]
async fn test_empty_sizes_store_nothing() {
    let t = setup_engine(r#"{"sizes": []}"#);

    let stored = t
        .engine
        .handle_file(IncomingFile::new("photo.jpg", body()))
        .await
        .unwrap();

    assert!(stored.files.is_empty());
    assert!(t.gateway.begun_keys().is_empty());
    assert!(t.engine.registry().is_empty());
}

#[tokio::test]
async fn test_source_failure_is_reported_as_source() {
    let t = setup_engine(r#"{"sizes": [{}, {"name": "thumb"}]}"#);
    let broken: stowage_core::ByteStream = Box::pin(futures::stream::iter(vec![
        Ok(Bytes::from_static(b"partial")),
        Err(StreamError::Source("connection reset".to_string())),
    ]));

    let err = t
        .engine
        .handle_file(IncomingFile::new("photo.jpg", broken))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Source(ref m) if m == "connection reset"));
    assert!(t.engine.registry().contains("photo.jpg"));
    assert_eq!(t.gateway.object("ab12ef.jpg"), None);
}

#[tokio::test]
async fn test_invalid_variant_fails_before_any_upload() {
    let t = setup_engine(r#"{"sizes": [{}, {"name": "bad", "width": 0}]}"#);

    let err = t
        .engine
        .handle_file(IncomingFile::new("photo.jpg", body()))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Transform(_)));
    assert!(t.gateway.object("ab12ef.jpg").is_none());
    assert_eq!(
        t.engine.registry().keys("photo.jpg"),
        Some(vec!["ab12ef.jpg".to_string(), "ab12ef_bad.jpg".to_string()])
    );
}

#[tokio::test]
async fn test_name_failure_aborts_before_registration() {
    let gateway = Arc::new(MemoryGateway::new());
    let engine = ImageStorageEngine::builder(config("{}"), gateway.clone())
        .name_generator(Arc::new(BrokenNames))
        .build();

    let err = engine
        .handle_file(IncomingFile::new("photo.jpg", body()))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::NameGeneration(_)));
    assert!(engine.registry().is_empty());
    assert!(gateway.begun_keys().is_empty());
}

#[tokio::test]
async fn test_concurrent_sessions() {
    let gateway = Arc::new(MemoryGateway::new());
    let engine = ImageStorageEngine::builder(
        config(r#"{"sizes": [{}, {"name": "thumb"}]}"#),
        gateway.clone(),
    )
    .name_generator(Arc::new(SequentialNames::default()))
    .transform_factory(Arc::new(helpers::fixtures::PassThrough::default()))
    .build();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .handle_file(IncomingFile::new(format!("file-{}.jpg", i), body()))
                    .await
            })
        })
        .collect();

    for handle in handles {
        let stored = handle.await.unwrap().unwrap();
        assert_eq!(stored.files.len(), 2);
        assert_eq!(stored.files[0].variant_label, "original");
        assert_eq!(stored.files[1].variant_label, "thumb");
    }
    assert!(engine.registry().is_empty());
    assert_eq!(gateway.begun_keys().len(), 16);
    assert_eq!(gateway.objects.lock().unwrap().len(), 16);
}

#[tokio::test]
async fn test_stored_file_json_shape() {
    let t = setup_engine("{}");

    let stored = t
        .engine
        .handle_file(IncomingFile::new("photo.jpg", body()))
        .await
        .unwrap();
    let json = serde_json::to_value(&stored.files[0]).unwrap();

    assert_eq!(json["name"], "ab12ef.jpg");
    assert_eq!(json["type"], "original");
    assert_eq!(json["eTag"], format!("etag-{}", BODY.len()));
    assert_eq!(json["url"], "https://s3.test/test-bucket/ab12ef.jpg");
}
