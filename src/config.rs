use crate::services::classifier::model_manager::ModelSource;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "label-showcase", version, about = "Classify an image and show curated content for its label")]
pub struct Cli {
    #[command(flatten)]
    pub config: AppConfig,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Directory for the cached model and its label config
    #[arg(long, env = "LABEL_SHOWCASE_DATA_DIR", default_value = ".label-showcase", global = true)]
    pub data_dir: PathBuf,

    /// JSON file mapping labels to texts, images and videos
    #[arg(long, env = "LABEL_SHOWCASE_CONTENT", default_value = "content.json", global = true)]
    pub content: PathBuf,

    /// Google Drive file id of the ONNX model
    #[arg(long, env = "GDRIVE_FILE_ID", global = true)]
    pub gdrive_file_id: Option<String>,

    /// Direct download URL of the ONNX model (takes precedence over the Drive id)
    #[arg(long, env = "MODEL_URL", global = true)]
    pub model_url: Option<String>,

    /// Download URL of the model's config.json with `id2label`
    #[arg(long, env = "MODEL_CONFIG_URL", global = true)]
    pub config_url: Option<String>,

    /// File name of the model inside the cache directory
    #[arg(long, env = "MODEL_PATH", default_value = "model.onnx", global = true)]
    pub model_file: String,

    /// Square input size the model expects
    #[arg(
        long,
        default_value_t = 224,
        global = true,
        value_parser = clap::value_parser!(u32).range(1..=2048)
    )]
    pub crop_size: u32,

    /// Run inference on the CPU only
    #[arg(long, global = true)]
    pub cpu: bool,
}

impl AppConfig {
    pub fn model_source(&self) -> ModelSource {
        if let Some(model_url) = &self.model_url {
            ModelSource::Url {
                model_url: model_url.clone(),
                config_url: self.config_url.clone(),
            }
        } else if let Some(file_id) = &self.gdrive_file_id {
            ModelSource::GoogleDrive {
                file_id: file_id.clone(),
                config_url: self.config_url.clone(),
            }
        } else {
            ModelSource::Local
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify one image and show its content
    Classify {
        image: PathBuf,
        /// Show content for this label instead of the predicted one
        #[arg(long)]
        label: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show the content configured for a label
    Content {
        label: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the thumbnail URL derived from a video link
    Thumbnail { url: String },
    /// Check the content file against the model vocabulary
    Check,
    /// Inspect or fetch the model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Interactive session reading commands from stdin
    Session,
}

#[derive(Debug, Subcommand)]
pub enum ModelAction {
    Status,
    Download,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct OutputArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}
