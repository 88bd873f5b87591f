//! ImageGenerator - stock photo with placeholder fallback.

use std::path::{Path, PathBuf};

use super::{ArtifactSource, DebugLog, Outcome};
use crate::config::Config;
use crate::imaging::{self, ImagingError};
use crate::providers::{PhotoSearchClient, ProviderError};

/// Appended to the search query when a mood image is requested.
pub const MOOD_QUERY_SUFFIX: &str = " at night, low light";

#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("downloaded image could not be used: {0}")]
    Imaging(#[from] ImagingError),
}

pub struct ImageGenerator {
    photos: PhotoSearchClient,
    fallback_image: PathBuf,
    watermark_image: PathBuf,
}

impl ImageGenerator {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        Ok(Self::with_client(
            PhotoSearchClient::new(config)?,
            config.paths.fallback_image.clone(),
            config.paths.watermark_image.clone(),
        ))
    }

    pub fn with_client(
        photos: PhotoSearchClient,
        fallback_image: PathBuf,
        watermark_image: PathBuf,
    ) -> Self {
        Self {
            photos,
            fallback_image,
            watermark_image,
        }
    }

    /// Produce an image for `prompt` at `dest`.
    ///
    /// Tries stock-photo search first and falls back to the bundled
    /// placeholder. When `watermark` is set the logo is composited into
    /// whichever image was saved. The result is always JPEG.
    pub async fn generate(
        &self,
        prompt: &str,
        dest: &Path,
        watermark: bool,
        mood: bool,
        debug: bool,
    ) -> Outcome {
        let mut log = DebugLog::new(debug);

        let query = if mood {
            format!("{}{}", prompt, MOOD_QUERY_SUFFIX)
        } else {
            prompt.to_string()
        };
        log.debug(format!("Searching photos for {:?}", query));

        let source = match self.fetch_remote(&query, dest).await {
            Ok(()) => {
                log.info(format!("Saved photo search result to {}", dest.display()));
                ArtifactSource::PhotoSearch
            }
            Err(e) => {
                log.warn(format!("Photo search failed ({}); using fallback image", e));
                match self.copy_fallback(dest) {
                    Ok(()) => {
                        log.info(format!(
                            "Saved fallback image {} to {}",
                            self.fallback_image.display(),
                            dest.display()
                        ));
                        ArtifactSource::FallbackImage
                    }
                    Err(e) => {
                        log.warn(format!(
                            "Fallback image {} unusable: {}",
                            self.fallback_image.display(),
                            e
                        ));
                        return log.failed();
                    }
                }
            }
        };

        let mut degraded = false;
        if watermark {
            match imaging::apply_watermark(dest, &self.watermark_image) {
                Ok(()) => log.debug(format!(
                    "Applied watermark {}",
                    self.watermark_image.display()
                )),
                // The unmarked image is still a usable result
                Err(e) => {
                    log.warn(format!(
                        "Watermark {} could not be applied: {}",
                        self.watermark_image.display(),
                        e
                    ));
                    degraded = true;
                }
            }
        }

        let mut outcome = log.finish(Some(dest.to_path_buf()), source);
        outcome.degraded = degraded;
        outcome
    }

    async fn fetch_remote(&self, query: &str, dest: &Path) -> Result<(), FetchError> {
        let url = self.photos.random_photo_url(query).await?;
        let bytes = self.photos.download(&url).await?;
        let img = imaging::decode(&bytes)?;
        imaging::save_jpeg(&img, dest)?;
        Ok(())
    }

    fn copy_fallback(&self, dest: &Path) -> Result<(), ImagingError> {
        let img = imaging::load(&self.fallback_image)?;
        imaging::save_jpeg(&img, dest)
    }
}
