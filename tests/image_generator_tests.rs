//! Integration tests for the image stage: photo search, placeholder fallback,
//! watermarking and the cache short-circuit.

mod common;

use common::*;
use media_studio::studio::PreparedPrompt;
use media_studio::{ArtifactSource, ImageGenerator, Language, StageOptions, Studio};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_search_result_is_saved_as_jpeg() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .and(query_param("query", "A farmer working in the field"))
        .and(query_param("client_id", "test-access-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "abc",
            "urls": { "regular": format!("{}/photo.jpg", server.uri()) }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/photo.jpg"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(jpeg_bytes(400, 300, PHOTO_COLOR)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path(), &server.uri());
    let generator = ImageGenerator::new(&config).unwrap();
    let dest = temp_dir.path().join("out.jpg");

    let outcome = generator
        .generate("A farmer working in the field", &dest, false, false, false)
        .await;

    assert_eq!(outcome.path.as_deref(), Some(dest.as_path()));
    assert_eq!(outcome.source, ArtifactSource::PhotoSearch);
    let saved = image::open(&dest).unwrap();
    assert_eq!((saved.width(), saved.height()), (400, 300));
    assert!(close_to(region_mean(&dest, 100, 100, 20), PHOTO_COLOR, 12.0));
}

#[tokio::test]
async fn test_search_failure_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path(), &server.uri());
    let generator = ImageGenerator::new(&config).unwrap();
    let dest = temp_dir.path().join("out.jpg");

    let outcome = generator.generate("sunset", &dest, false, false, true).await;

    assert_eq!(outcome.path.as_deref(), Some(dest.as_path()));
    assert_eq!(outcome.source, ArtifactSource::FallbackImage);
    assert!(close_to(region_mean(&dest, 100, 100, 20), FALLBACK_COLOR, 12.0));
    assert!(outcome
        .debug_lines
        .iter()
        .any(|l| l.contains("using fallback image")));
}

#[tokio::test]
async fn test_unreachable_service_uses_fallback() {
    let temp_dir = TempDir::new().unwrap();
    // Nothing listens on the discard port
    let config = test_config(temp_dir.path(), "http://127.0.0.1:9");
    let generator = ImageGenerator::new(&config).unwrap();
    let dest = temp_dir.path().join("out.jpg");

    let outcome = generator.generate("sunset", &dest, false, false, false).await;

    assert_eq!(outcome.source, ArtifactSource::FallbackImage);
    assert!(image::open(&dest).is_ok());
}

#[tokio::test]
async fn test_missing_key_skips_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(temp_dir.path(), &server.uri());
    config.keys.photo_search = None;
    let generator = ImageGenerator::new(&config).unwrap();
    let dest = temp_dir.path().join("out.jpg");

    let outcome = generator.generate("sunset", &dest, false, false, false).await;
    assert_eq!(outcome.source, ArtifactSource::FallbackImage);
}

#[tokio::test]
async fn test_undecodable_download_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "urls": { "regular": format!("{}/photo.jpg", server.uri()) }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/photo.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path(), &server.uri());
    let generator = ImageGenerator::new(&config).unwrap();
    let dest = temp_dir.path().join("out.jpg");

    let outcome = generator.generate("sunset", &dest, false, false, false).await;
    assert_eq!(outcome.source, ArtifactSource::FallbackImage);
    assert!(close_to(region_mean(&dest, 10, 10, 20), FALLBACK_COLOR, 12.0));
}

#[tokio::test]
async fn test_no_fallback_returns_none() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(temp_dir.path(), "http://127.0.0.1:9");
    config.paths.fallback_image = temp_dir.path().join("missing.jpg");
    let generator = ImageGenerator::new(&config).unwrap();
    let dest = temp_dir.path().join("out.jpg");

    let outcome = generator.generate("sunset", &dest, true, false, false).await;

    assert!(outcome.path.is_none());
    assert_eq!(outcome.source, ArtifactSource::Failed);
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_watermark_changes_bottom_right_region() {
    let server = MockServer::start().await;
    mount_photo(&server, 2).await;

    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path(), &server.uri());
    let generator = ImageGenerator::new(&config).unwrap();
    let plain = temp_dir.path().join("plain.jpg");
    let marked = temp_dir.path().join("marked.jpg");

    generator.generate("lake", &plain, false, false, false).await;
    generator.generate("lake", &marked, true, false, false).await;

    // The 100px logo sits 10px in from the bottom-right corner of 400x300
    let plain_corner = region_mean(&plain, 300, 200, 80);
    let marked_corner = region_mean(&marked, 300, 200, 80);
    assert!(close_to(plain_corner, PHOTO_COLOR, 12.0));
    assert!(close_to(marked_corner, [255, 0, 0], 30.0));

    // Away from the logo the two images agree
    let plain_top = region_mean(&plain, 10, 10, 40);
    let marked_top = region_mean(&marked, 10, 10, 40);
    assert!(close_to(marked_top, [plain_top[0] as u8, plain_top[1] as u8, plain_top[2] as u8], 6.0));
}

#[tokio::test]
async fn test_watermark_applies_to_fallback() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(temp_dir.path(), "http://127.0.0.1:9");
    config.keys.photo_search = None;
    let generator = ImageGenerator::new(&config).unwrap();
    let dest = temp_dir.path().join("out.jpg");

    let outcome = generator.generate("sunset", &dest, true, false, false).await;

    assert_eq!(outcome.source, ArtifactSource::FallbackImage);
    // Fallback is 320x240; the logo covers x in [210, 310), y in [130, 230)
    assert!(close_to(region_mean(&dest, 230, 150, 60), [255, 0, 0], 30.0));
}

#[tokio::test]
async fn test_mood_biases_search_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .and(query_param("query", "city street at night, low light"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "urls": { "regular": format!("{}/photo.jpg", server.uri()) }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/photo.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg_bytes(64, 64, PHOTO_COLOR)))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path(), &server.uri());
    let generator = ImageGenerator::new(&config).unwrap();

    let outcome = generator
        .generate("city street", &temp_dir.path().join("o.jpg"), false, true, false)
        .await;
    assert_eq!(outcome.source, ArtifactSource::PhotoSearch);
}

fn prepared(text: &str, key: &str) -> PreparedPrompt {
    PreparedPrompt {
        original: text.to_string(),
        text: text.to_string(),
        key: key.to_string(),
        language: Language::English,
    }
}

#[tokio::test]
async fn test_cached_image_is_not_fetched_again() {
    let server = MockServer::start().await;
    mount_photo(&server, 1).await;

    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path(), &server.uri());
    let studio = Studio::new(&config).unwrap();
    let prompt = prepared("A farmer working in the field", "a_farmer_working_in_the_field");

    let first = studio.image(&prompt, StageOptions::default()).await;
    assert_eq!(first.source, ArtifactSource::PhotoSearch);

    let second = studio.image(&prompt, StageOptions::default()).await;
    assert_eq!(second.source, ArtifactSource::Cached);
    assert_eq!(first.path, second.path);
}

#[tokio::test]
async fn test_force_and_changed_flags_regenerate() {
    let server = MockServer::start().await;
    mount_photo(&server, 3).await;

    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path(), &server.uri());
    let studio = Studio::new(&config).unwrap();
    let prompt = prepared("lake", "lake");

    studio.image(&prompt, StageOptions::default()).await;

    // Toggling the watermark invalidates the cached image
    let watermarked = StageOptions {
        watermark: true,
        ..Default::default()
    };
    let outcome = studio.image(&prompt, watermarked).await;
    assert_eq!(outcome.source, ArtifactSource::PhotoSearch);

    let forced = StageOptions {
        watermark: true,
        force: true,
        ..Default::default()
    };
    let outcome = studio.image(&prompt, forced).await;
    assert_eq!(outcome.source, ArtifactSource::PhotoSearch);
}

#[tokio::test]
async fn test_fallback_image_is_retried_next_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path(), &server.uri());
    let studio = Studio::new(&config).unwrap();
    let prompt = prepared("lake", "lake");

    let first = studio.image(&prompt, StageOptions::default()).await;
    let second = studio.image(&prompt, StageOptions::default()).await;
    assert_eq!(first.source, ArtifactSource::FallbackImage);
    assert_eq!(second.source, ArtifactSource::FallbackImage);
}

#[tokio::test]
async fn test_unapplied_watermark_is_not_cached() {
    let server = MockServer::start().await;
    mount_photo(&server, 2).await;

    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path(), &server.uri());
    std::fs::remove_file(&config.paths.watermark_image).unwrap();
    let studio = Studio::new(&config).unwrap();
    let prompt = prepared("lake", "lake");
    let watermarked = StageOptions {
        watermark: true,
        ..Default::default()
    };

    let unmarked = studio.image(&prompt, watermarked).await;
    assert_eq!(unmarked.source, ArtifactSource::PhotoSearch);
    assert!(unmarked.degraded);
    let path = unmarked.path.unwrap();
    assert!(close_to(region_mean(&path, 300, 200, 80), PHOTO_COLOR, 12.0));

    // With the logo back, the next request regenerates instead of reusing
    write_assets(temp_dir.path());
    let marked = studio.image(&prompt, watermarked).await;
    assert_eq!(marked.source, ArtifactSource::PhotoSearch);
    assert!(!marked.degraded);
    assert!(close_to(region_mean(&path, 300, 200, 80), [255, 0, 0], 30.0));

    let cached = studio.image(&prompt, watermarked).await;
    assert_eq!(cached.source, ArtifactSource::Cached);
}
