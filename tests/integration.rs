use std::sync::Arc;
use thumbcache::{
    lock::ProcessLock,
    models::Dimensions,
    pipeline::{GenerationPipeline, ImagePipeline, MockPipeline},
    resolver::ThumbnailResolver,
    settings::{Overrides, Settings, SettingsResolver},
    source::{MediaLocation, MediaSource, SourceRef, StoredSource},
    storage::{FsStorage, MockStorage, StorageBackend},
};

fn size(w: u32, h: u32) -> Dimensions {
    Dimensions::new(w, h).unwrap()
}

fn opts(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

fn write_source_png(media_root: &std::path::Path, relative: &str, w: u32, h: u32) {
    let path = media_root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = image::RgbImage::from_pixel(w, h, image::Rgb([40, 90, 160]));
    img.save_with_format(&path, image::ImageFormat::Png).unwrap();
}

#[tokio::test]
async fn test_full_workflow_with_mocks() {
    let storage = MockStorage::new();
    let pipeline = MockPipeline::new().with_response(vec![0xFF, 0xD8, 0xFF]);
    let resolver = ThumbnailResolver::new(
        SettingsResolver::new(Settings::default()),
        Box::new(storage.clone()),
        Box::new(pipeline.clone()),
    );

    let source = MediaSource::new(
        "photos/cat.jpg",
        MediaLocation::new("/var/media", "https://media.example.com/"),
    )
    .unwrap();
    let overrides = Overrides::new()
        .with_quality(90)
        .with_subdir("thumbs")
        .with_extension("");

    // First resolution generates and stores.
    let first = resolver
        .resolve(&source, size(100, 100), &opts(&["crop"]), &overrides)
        .await
        .unwrap();
    assert_eq!(first.key, "photos/thumbs/catjpg_100x100_crop_90q");
    assert_eq!(
        first.url,
        "https://media.example.com/photos/thumbs/catjpg_100x100_crop_90q"
    );
    assert!(first.generated);
    assert_eq!(pipeline.get_generate_count(), 1);
    assert!(storage.exists(&first.key).await.unwrap());

    // Second resolution with identical inputs is a cache hit.
    let second = resolver
        .resolve(&source, size(100, 100), &opts(&["crop"]), &overrides)
        .await
        .unwrap();
    assert_eq!(second.key, first.key);
    assert!(!second.generated);
    assert_eq!(pipeline.get_generate_count(), 1);
    assert_eq!(storage.get_write_count(), 1);
}

#[tokio::test]
async fn test_distinct_requests_resolve_to_distinct_artifacts() {
    let storage = MockStorage::new();
    let pipeline = MockPipeline::new();
    let resolver = ThumbnailResolver::new(
        SettingsResolver::new(Settings::default()),
        Box::new(storage.clone()),
        Box::new(pipeline.clone()),
    );

    let source = MediaSource::new(
        "photos/cat.jpg",
        MediaLocation::new("/var/media", "/media/"),
    )
    .unwrap();
    let overrides = Overrides::new().with_extension("");

    let requests: [(Dimensions, Vec<String>, Overrides); 4] = [
        (size(100, 100), opts(&["crop"]), overrides.clone()),
        (size(100, 100), opts(&[]), overrides.clone()),
        (size(50, 100), opts(&["crop"]), overrides.clone()),
        (
            size(100, 100),
            opts(&["crop"]),
            overrides.clone().with_quality(10),
        ),
    ];

    for (dimensions, options, overrides) in &requests {
        resolver
            .resolve(&source, *dimensions, options, overrides)
            .await
            .unwrap();
    }

    assert_eq!(storage.get_files().len(), 4);
    assert_eq!(pipeline.get_generate_count(), 4);
}

#[tokio::test]
async fn test_end_to_end_on_filesystem() {
    let media_root = tempfile::tempdir().unwrap();
    write_source_png(media_root.path(), "photos/cat.png", 120, 80);

    let resolver = ThumbnailResolver::new(
        SettingsResolver::new(Settings::default()),
        Box::new(FsStorage::new(media_root.path(), "/media/")),
        Box::new(ImagePipeline::new()),
    );

    let source = MediaSource::new(
        "photos/cat.png",
        MediaLocation::new(media_root.path(), "/media/"),
    )
    .unwrap();
    let overrides = Overrides::new()
        .with_quality(90)
        .with_subdir("thumbs")
        .with_extension("jpg");

    let thumbnail = resolver
        .resolve(&source, size(60, 60), &opts(&["crop"]), &overrides)
        .await
        .unwrap();

    assert_eq!(thumbnail.key, "photos/thumbs/catpng_60x60_crop_90q.jpg");
    assert!(thumbnail.generated);
    assert!(thumbnail.dest.exists());

    let stored = image::open(&thumbnail.dest).unwrap();
    assert_eq!((stored.width(), stored.height()), (60, 60));

    // Identical request resolves to the stored artifact without regenerating.
    let again = resolver
        .resolve(&source, size(60, 60), &opts(&["crop"]), &overrides)
        .await
        .unwrap();
    assert!(!again.generated);
    assert_eq!(again.dest, thumbnail.dest);
}

#[tokio::test]
async fn test_stored_source_uses_store_location() {
    let store_root = tempfile::tempdir().unwrap();
    write_source_png(store_root.path(), "uploads/dog.png", 40, 40);

    let storage = FsStorage::new(store_root.path(), "https://files.example.com/");
    let source = StoredSource::from_store("uploads/dog.png", &storage).unwrap();
    assert_eq!(source.root_dir(), store_root.path());

    let resolver = ThumbnailResolver::new(
        SettingsResolver::new(Settings::default()),
        Box::new(storage),
        Box::new(ImagePipeline::new()),
    );
    let overrides = Overrides::new().with_subdir("thumbs");

    let thumbnail = resolver
        .resolve(&source, size(20, 20), &[], &overrides)
        .await
        .unwrap();

    assert_eq!(thumbnail.key, "uploads/thumbs/dogpng_20x20_85q.jpg");
    assert_eq!(
        thumbnail.url,
        "https://files.example.com/uploads/thumbs/dogpng_20x20_85q.jpg"
    );
    assert!(thumbnail.dest.exists());
}

#[tokio::test]
async fn test_concurrent_resolutions_with_process_lock() {
    let storage = MockStorage::new();
    let pipeline = MockPipeline::new();
    let resolver = Arc::new(
        ThumbnailResolver::new(
            SettingsResolver::new(Settings::default()),
            Box::new(storage.clone()),
            Box::new(pipeline.clone()),
        )
        .with_lock(Box::new(ProcessLock::new())),
    );

    let mut handles = Vec::new();
    for _ in 0..8 {
        let resolver = resolver.clone();
        handles.push(tokio::spawn(async move {
            let source = MediaSource::new(
                "photos/cat.jpg",
                MediaLocation::new("/var/media", "/media/"),
            )
            .unwrap();
            resolver
                .resolve(&source, size(32, 32), &[], &Overrides::new())
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(pipeline.get_generate_count(), 1);
    assert_eq!(storage.get_write_count(), 1);
}

#[tokio::test]
async fn test_pipeline_trait_object_usage() {
    // The resolver only sees the trait; a custom pipeline slots in.
    struct StaticPipeline;

    #[async_trait::async_trait]
    impl GenerationPipeline for StaticPipeline {
        async fn generate(
            &self,
            _source: &std::path::Path,
            _size: Dimensions,
            _options: &[String],
            _settings: &thumbcache::settings::EffectiveSettings,
        ) -> thumbcache::Result<Vec<u8>> {
            Ok(b"static".to_vec())
        }
    }

    let storage = MockStorage::new();
    let resolver = ThumbnailResolver::new(
        SettingsResolver::new(Settings::default()),
        Box::new(storage.clone()),
        Box::new(StaticPipeline),
    );
    let source = MediaSource::new("a.png", MediaLocation::new("/m", "/media/")).unwrap();

    let thumbnail = resolver
        .resolve(&source, size(8, 8), &[], &Overrides::new())
        .await
        .unwrap();

    assert_eq!(thumbnail.bytes.as_deref(), Some(&b"static"[..]));
    assert_eq!(storage.get_files()[&thumbnail.key], b"static");
}
