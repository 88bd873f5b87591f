//! VideoComposer - a still image held for the length of an audio track.

use std::path::Path;

use image::DynamicImage;
use tempfile::NamedTempFile;

use super::{ArtifactSource, DebugLog, Outcome};
use crate::artifacts::{persist, temp_sibling};
use crate::config::{Config, VideoConfig};
use crate::ffmpeg::{self, FfmpegError};
use crate::imaging::{self, ImagingError, MOOD_BRIGHTNESS};

/// Reported when the video stage runs before its inputs exist.
pub const MISSING_INPUTS_MESSAGE: &str = "generate both image and audio first";

#[derive(Debug, thiserror::Error)]
enum ComposeError {
    #[error(transparent)]
    Ffmpeg(#[from] FfmpegError),

    #[error("mood image: {0}")]
    Imaging(#[from] ImagingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct VideoComposer {
    height: u32,
    fps: u32,
}

impl VideoComposer {
    pub fn new(config: &Config) -> Self {
        Self::with_settings(&config.video)
    }

    pub fn with_settings(video: &VideoConfig) -> Self {
        Self {
            height: video.height,
            fps: video.fps.max(1),
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Mux `image` and `audio` into an MP4 at `dest`.
    ///
    /// The video lasts exactly as long as the audio. With `mood` the image is
    /// darkened into a temporary file that is removed when the call returns.
    /// `watermark` only affects the image stage; it is recorded here so a
    /// caller can trace which inputs produced the video.
    #[allow(clippy::too_many_arguments)]
    pub async fn generate(
        &self,
        prompt: &str,
        image: &Path,
        audio: &Path,
        dest: &Path,
        watermark: bool,
        mood: bool,
        debug: bool,
    ) -> Outcome {
        let mut log = DebugLog::new(debug);
        log.debug(format!(
            "Composing video for {:?} (watermark: {}, mood: {})",
            prompt, watermark, mood
        ));

        if !image.is_file() || !audio.is_file() {
            log.warn(format!(
                "Cannot compose video: {} (image {}, audio {})",
                MISSING_INPUTS_MESSAGE,
                image.display(),
                audio.display()
            ));
            return log.failed();
        }

        match self.compose(image, audio, dest, mood, &mut log).await {
            Ok(duration) => {
                log.info(format!(
                    "Composed {:.2}s video at {}",
                    duration,
                    dest.display()
                ));
                log.finish(Some(dest.to_path_buf()), ArtifactSource::Composed)
            }
            Err(e) => {
                log.warn(format!("Video composition failed: {}", e));
                log.failed()
            }
        }
    }

    async fn compose(
        &self,
        image: &Path,
        audio: &Path,
        dest: &Path,
        mood: bool,
        log: &mut DebugLog,
    ) -> Result<f64, ComposeError> {
        // Held until the encoder finishes; dropping it deletes the file
        let mood_image = if mood {
            let darkened = darken_to_temp(image)?;
            log.debug(format!(
                "Darkened image written to {}",
                darkened.path().display()
            ));
            Some(darkened)
        } else {
            None
        };
        let input = mood_image.as_ref().map_or(image, |t| t.path());

        let duration = ffmpeg::probe_duration(audio).await?;
        log.debug(format!("Audio duration: {:.3}s", duration));

        let output = temp_sibling(dest)?;
        let args = self.ffmpeg_args(input, audio, duration, output.path());
        log.debug(format!("ffmpeg {}", args.join(" ")));
        ffmpeg::run_ffmpeg(&args).await?;
        persist(output, dest)?;

        Ok(duration)
    }

    /// Arguments that loop `image` at the configured rate for `duration`
    /// seconds, scale it to the configured height and mux it with `audio`.
    pub fn ffmpeg_args(&self, image: &Path, audio: &Path, duration: f64, output: &Path) -> Vec<String> {
        let fps = self.fps.to_string();
        vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loop".to_string(),
            "1".to_string(),
            "-framerate".to_string(),
            fps.clone(),
            "-i".to_string(),
            image.display().to_string(),
            "-i".to_string(),
            audio.display().to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-t".to_string(),
            format!("{:.3}", duration),
            "-vf".to_string(),
            format!("scale=-2:{},format=yuv420p", self.height),
            "-r".to_string(),
            fps,
            "-c:v".to_string(),
            "libx264".to_string(),
            "-tune".to_string(),
            "stillimage".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-f".to_string(),
            "mp4".to_string(),
            output.display().to_string(),
        ]
    }
}

/// Write a darkened copy of `image` to a new temporary JPEG.
fn darken_to_temp(image: &Path) -> Result<NamedTempFile, ComposeError> {
    let img = imaging::load(image)?;
    let darkened = DynamicImage::ImageRgb8(imaging::darken(&img, MOOD_BRIGHTNESS));

    let temp = tempfile::Builder::new()
        .prefix("media-studio-mood-")
        .suffix(".jpg")
        .tempfile()?;
    imaging::encode_jpeg(&darkened, temp.as_file())?;
    Ok(temp)
}
