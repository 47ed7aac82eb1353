//! Drives the generate → download → save loop for one prompt.
//!
//! Every run writes into `<output_root>/<YYYY-MM-DD_HH-MM>/output_<seed>_<index>.jpg`. The
//! directory is picked once when the [`ImageGenerator`] is built, so repeated calls to
//! [`ImageGenerator::generate_images`] land in the same place and overwrite files with the same
//! seed and index.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use bytes::Bytes;
use chrono::{Local, NaiveDateTime};
use color_eyre::{Result, eyre::WrapErr as _};
use log::{debug, info, warn};
use reqwest::StatusCode;

use crate::{InferenceBox, image_model::Model};

pub const DEFAULT_ASPECT_RATIO: &str = "1:1";
pub const DEFAULT_NUM_IMAGES: u64 = 10;
pub const DEFAULT_OUTPUT_ROOT: &str = "outputs";

const DIR_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M";

pub struct ImageGenerator {
    prompt: String,
    model: Model,
    output_dir: PathBuf,
    inference: InferenceBox,
    http: reqwest::Client,
}

impl ImageGenerator {
    /// Parses `model` before anything else, so an unknown name fails without touching the
    /// filesystem or the network.
    pub fn from_model_name(
        prompt: impl Into<String>,
        model: &str,
        inference: InferenceBox,
        output_root: impl AsRef<Path>,
    ) -> Result<Self> {
        let model: Model = model.parse()?;
        Self::with_output_root(prompt, model, inference, output_root)
    }

    pub fn with_output_root(
        prompt: impl Into<String>,
        model: Model,
        inference: InferenceBox,
        output_root: impl AsRef<Path>,
    ) -> Result<Self> {
        let output_dir = output_dir_for(output_root.as_ref(), Local::now().naive_local());
        fs::create_dir_all(&output_dir).wrap_err_with(|| {
            format!("Couldn't create output directory {}", output_dir.display())
        })?;
        debug!("Output directory: {}", output_dir.display());

        Ok(Self {
            prompt: prompt.into(),
            model,
            output_dir,
            inference,
            http: reqwest::Client::new(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn generate_images_with_defaults(&self) -> Result<GenerationReport> {
        self.generate_images(DEFAULT_ASPECT_RATIO, DEFAULT_NUM_IMAGES)
            .await
    }

    /// Runs one inference per seed in `0..num_images` and saves every returned image.
    /// Images that can't be downloaded are logged and skipped, everything else aborts the run.
    pub async fn generate_images(
        &self,
        aspect_ratio: &str,
        num_images: u64,
    ) -> Result<GenerationReport> {
        let mut report = GenerationReport::default();

        for seed in 0..num_images {
            let request = self.model.build_request(&self.prompt, aspect_ratio, seed);
            let result = self
                .inference
                .run(&request)
                .await
                .wrap_err_with(|| format!("Inference failed for seed {seed}"))?;
            debug!("Seed {seed} produced {} image(s)", result.len());

            for (index, url) in result.urls().enumerate() {
                match download(&self.http, url).await? {
                    Download::Image(bytes) => {
                        let path = self.image_path(seed, index);
                        fs::write(&path, &bytes)
                            .wrap_err_with(|| format!("Couldn't write {}", path.display()))?;
                        info!("Saved {}", path.display());
                        report.saved.push(path);
                    }
                    Download::Failed(status) => {
                        let failed = FailedDownload {
                            seed,
                            index,
                            status,
                        };
                        warn!("{failed}");
                        report.failed.push(failed);
                    }
                }
            }
        }

        Ok(report)
    }

    fn image_path(&self, seed: u64, index: usize) -> PathBuf {
        self.output_dir.join(format!("output_{seed}_{index}.jpg"))
    }
}

/// What a call to [`ImageGenerator::generate_images`] wrote and what it had to skip.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub saved: Vec<PathBuf>,
    pub failed: Vec<FailedDownload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDownload {
    pub seed: u64,
    pub index: usize,
    pub status: StatusCode,
}

impl fmt::Display for FailedDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to download image for seed {}, output {}: {}",
            self.seed, self.index, self.status
        )
    }
}

pub fn output_dir_for(output_root: &Path, time: NaiveDateTime) -> PathBuf {
    output_root.join(time.format(DIR_TIME_FORMAT).to_string())
}

enum Download {
    Image(Bytes),
    Failed(StatusCode),
}

async fn download(http: &reqwest::Client, url: &str) -> Result<Download> {
    let resp = http.get(url).send().await?;
    let status = resp.status();
    if status != StatusCode::OK {
        return Ok(Download::Failed(status));
    }
    Ok(Download::Image(resp.bytes().await?))
}
