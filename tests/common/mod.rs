//! Shared fixtures for the integration tests.
//!
//! Image fixtures are synthesized with the `image` crate, and every upstream
//! service is served by one wiremock server.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use media_studio::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PHOTO_COLOR: [u8; 3] = [20, 40, 220];
pub const FALLBACK_COLOR: [u8; 3] = [220, 200, 30];
pub const PHOTO_SIZE: (u32, u32) = (400, 300);

/// Encode a solid-color JPEG in memory.
pub fn jpeg_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
    buf.into_inner()
}

/// Write the placeholder image and the watermark logo under `dir`.
pub fn write_assets(dir: &Path) -> (PathBuf, PathBuf) {
    let assets = dir.join("assets");
    std::fs::create_dir_all(&assets).unwrap();

    let fallback = assets.join("fallback.jpg");
    std::fs::write(&fallback, jpeg_bytes(320, 240, FALLBACK_COLOR)).unwrap();

    let logo = assets.join("logo_watermark.png");
    RgbaImage::from_pixel(40, 40, Rgba([255, 0, 0, 255]))
        .save(&logo)
        .unwrap();

    (fallback, logo)
}

/// Configuration with every endpoint on `server_uri` and every path under `root`.
pub fn test_config(root: &Path, server_uri: &str) -> Config {
    let (fallback, logo) = write_assets(root);

    let mut config = Config::default();
    config.keys.photo_search = Some("test-access-key".to_string());
    config.keys.voice_synthesis = Some("test-voice-key".to_string());
    config.paths.output_dir = root.join("outputs");
    config.paths.fallback_image = fallback;
    config.paths.watermark_image = logo;
    config.endpoints.photo_search = server_uri.to_string();
    config.endpoints.premium_voice = server_uri.to_string();
    config.endpoints.free_voice = server_uri.to_string();
    config.endpoints.translation = server_uri.to_string();
    config.network.timeout_secs = 5;
    config.network.retries = 0;
    config
}

/// Serve `/photos/random` pointing at `/photo.jpg`, and the photo itself.
pub async fn mount_photo(server: &MockServer, expected_searches: u64) {
    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "test-photo",
            "urls": {
                "regular": format!("{}/photo.jpg", server.uri()),
                "small": format!("{}/photo-small.jpg", server.uri())
            }
        })))
        .expect(expected_searches)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/photo.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(jpeg_bytes(PHOTO_SIZE.0, PHOTO_SIZE.1, PHOTO_COLOR))
                .insert_header("content-type", "image/jpeg"),
        )
        .mount(server)
        .await;
}

/// Serve free synthesis for any language.
pub async fn mount_free_voice(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"ID3-free-voice-audio".to_vec())
                .insert_header("content-type", "audio/mpeg"),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Serve premium synthesis for the default voice.
pub async fn mount_premium_voice(server: &MockServer, status: u16, expected_calls: u64) {
    let template = if status == 200 {
        ResponseTemplate::new(200)
            .set_body_bytes(b"ID3-premium-voice-audio".to_vec())
            .insert_header("content-type", "audio/mpeg")
    } else {
        ResponseTemplate::new(status).set_body_string("voice service error")
    };

    Mock::given(method("POST"))
        .and(path("/v1/text-to-speech/21m00Tcm4TlvDq8ikWAM"))
        .respond_with(template)
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Average color of the `size`-square region whose top-left corner is (x, y).
pub fn region_mean(path: &Path, x: u32, y: u32, size: u32) -> [f64; 3] {
    let img = image::open(path).unwrap().to_rgb8();
    let mut sum = [0f64; 3];
    for py in y..y + size {
        for px in x..x + size {
            let p = img.get_pixel(px, py);
            for c in 0..3 {
                sum[c] += f64::from(p[c]);
            }
        }
    }
    let n = f64::from(size * size);
    [sum[0] / n, sum[1] / n, sum[2] / n]
}

/// Whether two colors are within `tolerance` on every channel.
pub fn close_to(actual: [f64; 3], expected: [u8; 3], tolerance: f64) -> bool {
    actual
        .iter()
        .zip(expected.iter())
        .all(|(a, e)| (a - f64::from(*e)).abs() <= tolerance)
}

/// Write `secs` seconds of 48 kHz mono silence as WAV.
///
/// ffmpeg and ffprobe detect the container from content, so the file may
/// carry an `.mp3` name.
pub fn write_wav(dest: &Path, secs: f64) {
    const RATE: u32 = 48_000;
    let samples = (f64::from(RATE) * secs).round() as u32;
    let data_len = samples * 2;

    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&RATE.to_le_bytes());
    wav.extend_from_slice(&(RATE * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(dest, wav).unwrap();
}
