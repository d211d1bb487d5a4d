use crate::error::AppError;
use crate::models::classify_types::{ModelStatus, PredictionResult};
use crate::services::classifier::{inference, ImageClassifier};
use futures::StreamExt;
use image::DynamicImage;
use ort::session::Session;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

// `confirm=t` skips the virus-scan interstitial Drive serves for large files.
const GDRIVE_DOWNLOAD_URL: &str = "https://drive.google.com/uc?export=download&confirm=t&id=";
const CONFIG_FILE_NAME: &str = "config.json";

/// Where the classifier artifact is fetched from when it is not cached yet.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelSource {
    /// A shared Google Drive file holding the ONNX model. The label config
    /// must then be given separately or already be cached.
    GoogleDrive {
        file_id: String,
        config_url: Option<String>,
    },
    Url {
        model_url: String,
        config_url: Option<String>,
    },
    /// Only use what is already on disk.
    Local,
}

impl ModelSource {
    pub fn model_url(&self) -> Option<String> {
        match self {
            ModelSource::GoogleDrive { file_id, .. } => Some(format!("{}{}", GDRIVE_DOWNLOAD_URL, file_id)),
            ModelSource::Url { model_url, .. } => Some(model_url.clone()),
            ModelSource::Local => None,
        }
    }

    pub fn config_url(&self) -> Option<&str> {
        match self {
            ModelSource::GoogleDrive { config_url, .. } | ModelSource::Url { config_url, .. } => {
                config_url.as_deref()
            }
            ModelSource::Local => None,
        }
    }
}

pub type OnnxModel = Session;

#[derive(Clone)]
pub struct ModelManager {
    pub model_dir: PathBuf,
    model_file: String,
    source: ModelSource,
    crop_size: u32,
    labels: Arc<std::sync::Mutex<Option<Vec<String>>>>,
    model: Arc<std::sync::Mutex<Option<OnnxModel>>>,
    loading: Arc<Mutex<bool>>,
    error: Arc<Mutex<Option<String>>>,
}

impl ModelManager {
    pub fn new(data_dir: &Path, model_file: &str, source: ModelSource, crop_size: u32) -> Self {
        Self {
            model_dir: data_dir.join("models"),
            model_file: model_file.to_string(),
            source,
            crop_size,
            labels: Arc::new(std::sync::Mutex::new(None)),
            model: Arc::new(std::sync::Mutex::new(None)),
            loading: Arc::new(Mutex::new(false)),
            error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }

    pub fn config_path(&self) -> PathBuf {
        self.model_dir.join(CONFIG_FILE_NAME)
    }

    pub fn is_downloaded(&self) -> bool {
        self.model_path().exists() && self.config_path().exists()
    }

    pub fn is_ready(&self) -> bool {
        self.model.lock().map(|m| m.is_some()).unwrap_or(false)
    }

    pub async fn is_loading(&self) -> bool {
        *self.loading.lock().await
    }

    pub async fn status(&self) -> ModelStatus {
        ModelStatus {
            downloaded: self.is_downloaded(),
            loading: self.is_loading().await,
            ready: self.is_ready(),
            labels: self.labels.lock().ok().and_then(|l| l.as_ref().map(Vec::len)).unwrap_or(0),
            error: self.error.lock().await.clone(),
        }
    }

    /// Fetch whichever of the model and config files are not cached yet.
    pub async fn download_model(&self) -> Result<(), AppError> {
        if self.is_downloaded() {
            tracing::debug!(dir = %self.model_dir.display(), "model already cached");
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.model_dir).await.map_err(|e| AppError {
            message: format!("Failed to create model directory: {}", e),
        })?;

        let config_path = self.config_path();
        if !config_path.exists() {
            let url = self.source.config_url().ok_or_else(|| AppError {
                message: format!(
                    "Label config {} is missing and no config URL is configured",
                    config_path.display()
                ),
            })?;
            download_file(url, &config_path).await?;
        }

        let model_path = self.model_path();
        if !model_path.exists() {
            let url = self.source.model_url().ok_or_else(|| AppError {
                message: format!(
                    "Model {} is missing and no download source is configured",
                    model_path.display()
                ),
            })?;
            download_file(&url, &model_path).await?;
        }

        Ok(())
    }

    pub async fn load_model(&self, use_gpu: bool) -> Result<(), AppError> {
        if self.is_ready() {
            return Ok(());
        }

        {
            let mut loading = self.loading.lock().await;
            if *loading {
                return Err("Model is already loading".into());
            }
            *loading = true;
        }

        *self.error.lock().await = None;

        let result = self.do_load_model(use_gpu).await;

        *self.loading.lock().await = false;

        if let Err(ref e) = result {
            tracing::error!(error = %e, "failed to load model");
            *self.error.lock().await = Some(e.message.clone());
        }

        result
    }

    /// Read only the vocabulary; enough for content checks without a session.
    pub async fn load_labels(&self) -> Result<Vec<String>, AppError> {
        let config_path = self.config_path();
        let config_content = tokio::fs::read_to_string(&config_path)
            .await
            .map_err(|e| AppError {
                message: format!("Failed to read config file {}: {}", config_path.display(), e),
            })?;

        let labels = labels_from_config(&config_content)?;
        tracing::info!(labels = labels.len(), "loaded model vocabulary");

        if let Ok(mut slot) = self.labels.lock() {
            *slot = Some(labels.clone());
        }
        Ok(labels)
    }

    async fn do_load_model(&self, use_gpu: bool) -> Result<(), AppError> {
        self.load_labels().await?;

        let model_path = self.model_path();

        let model = tokio::task::spawn_blocking(move || -> Result<Session, AppError> {
            let _ = ort::init()
                .with_name("label-showcase")
                .commit();

            let mut builder = Session::builder()
                .map_err(|e| AppError { message: format!("Failed to create session builder: {}", e) })?
                .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
                .map_err(|e| AppError { message: format!("Failed to set optimization level: {}", e) })?
                .with_intra_threads(4)
                .map_err(|e| AppError { message: format!("Failed to set intra threads: {}", e) })?;

            if use_gpu {
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default().build(),
                    ort::execution_providers::CoreMLExecutionProvider::default().build(),
                    ort::execution_providers::CPUExecutionProvider::default().build(),
                ]).map_err(|e| AppError { message: format!("Failed to register GPU execution providers: {}", e) })?;
            } else {
                builder = builder.with_execution_providers([
                    ort::execution_providers::CPUExecutionProvider::default().build(),
                ]).map_err(|e| AppError { message: format!("Failed to register CPU execution provider: {}", e) })?;
            }

            builder.commit_from_file(&model_path).map_err(|e| AppError {
                message: format!("Failed to load ONNX model {}: {}", model_path.display(), e),
            })
        })
        .await
        .map_err(|e| AppError {
            message: format!("Failed to spawn model loading task: {}", e),
        })??;

        *self.model.lock().map_err(|_| AppError::from("Model lock poisoned"))? = Some(model);
        tracing::info!(gpu = use_gpu, "model ready");

        Ok(())
    }
}

impl ImageClassifier for ModelManager {
    fn vocabulary(&self) -> Result<Vec<String>, AppError> {
        self.labels
            .lock()
            .map_err(|_| AppError::from("Label lock poisoned"))?
            .clone()
            .ok_or_else(|| AppError {
                message: "Labels not loaded".to_string(),
            })
    }

    fn classify(&self, image: &DynamicImage) -> Result<PredictionResult, AppError> {
        let labels = self.vocabulary()?;
        let tensor = inference::preprocess_image(image, self.crop_size)?;

        let mut guard = self
            .model
            .lock()
            .map_err(|_| AppError::from("Model lock poisoned"))?;
        let session = guard.as_mut().ok_or_else(|| AppError {
            message: "Model not loaded. Run `model download` first.".to_string(),
        })?;

        let result = inference::run_inference_with_model(session, tensor, &labels)?;
        tracing::debug!(label = %result.label, "classified image");
        Ok(result)
    }
}

/// Parse the ordered vocabulary out of a model `config.json` (`id2label`).
pub fn labels_from_config(config_content: &str) -> Result<Vec<String>, AppError> {
    let config: serde_json::Value = serde_json::from_str(config_content).map_err(|e| AppError {
        message: format!("Failed to parse config JSON: {}", e),
    })?;

    let id2label = config["id2label"]
        .as_object()
        .ok_or_else(|| AppError {
            message: "Config missing id2label field".to_string(),
        })?;

    let mut labels: Vec<(usize, String)> = id2label
        .iter()
        .map(|(k, v)| -> Result<(usize, String), AppError> {
            let idx = k.parse::<usize>().map_err(|_| AppError {
                message: format!("id2label key {:?} is not an index", k),
            })?;
            let label = v
                .as_str()
                .ok_or_else(|| AppError {
                    message: format!("id2label entry {} is not a string", k),
                })?
                .to_string();
            Ok((idx, label))
        })
        .collect::<Result<_, AppError>>()?;
    labels.sort_by_key(|(idx, _)| *idx);

    Ok(labels.into_iter().map(|(_, label)| label).collect())
}

/// Stream `url` into `<dest>.part` and move it to `dest` only once complete,
/// so an interrupted or rejected download never looks cached.
async fn download_file(url: &str, dest: &Path) -> Result<(), AppError> {
    tracing::info!(url = %url, dest = %dest.display(), "downloading");

    let part = partial_path(dest);
    let result = match stream_to_file(url, &part).await {
        Ok(()) => tokio::fs::rename(&part, dest).await.map_err(|e| AppError {
            message: format!("Failed to move {} into place: {}", part.display(), e),
        }),
        Err(e) => Err(e),
    };
    if result.is_err() {
        let _ = tokio::fs::remove_file(&part).await;
    }
    result
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// An HTML body means we got a sign-in or confirmation page, not the artifact.
fn check_content_type(url: &str, content_type: Option<&str>) -> Result<(), AppError> {
    match content_type {
        Some(ct) if ct.trim().to_ascii_lowercase().starts_with("text/html") => Err(format!(
            "Download from {} returned an HTML page instead of a file; check that the link is public",
            url
        )
        .into()),
        _ => Ok(()),
    }
}

async fn stream_to_file(url: &str, dest: &Path) -> Result<(), AppError> {
    let client = reqwest::Client::new();
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(format!(
            "Failed to download {}: HTTP {}",
            url,
            response.status()
        )
        .into());
    }

    check_content_type(
        url,
        response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
    )?;

    let total_size = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    let mut file = tokio::fs::File::create(dest).await.map_err(|e| AppError {
        message: format!("Failed to create file {}: {}", dest.display(), e),
    })?;

    let mut stream = response.bytes_stream();
    let mut last_logged = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        downloaded += chunk.len() as u64;
        tokio::io::AsyncWriteExt::write_all(&mut file, &chunk)
            .await
            .map_err(|e| AppError {
                message: format!("Failed to write to file: {}", e),
            })?;

        if total_size > 0 {
            let progress = (downloaded * 100) / total_size;
            if progress > last_logged {
                tracing::debug!(progress, "download progress");
                last_logged = progress;
            }
        }
    }
    tokio::io::AsyncWriteExt::flush(&mut file).await?;
    tracing::info!(bytes = downloaded, dest = %dest.display(), "download complete");

    Ok(())
}
