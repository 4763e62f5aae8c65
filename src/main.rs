use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use id_redact::config::{RedactorConfig, ServerConfig};
use id_redact::face::FaceDetectorParams;
use id_redact::RenderOptions;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "id-redact")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Black out faces and personal details in scanned ID documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Redact image files and write them to a folder
    Redact {
        /// Images to redact
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output folder for redacted pictures
        #[arg(short, long)]
        output_folder: PathBuf,

        #[command(flatten)]
        redactor: RedactorArgs,
    },
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0", env = "ID_REDACT_HOST")]
        host: String,

        /// Port to listen on
        #[arg(long, short, default_value_t = 8000, env = "ID_REDACT_PORT")]
        port: u16,

        /// Origin allowed to call the API from a browser
        #[arg(long, default_value = "http://localhost:3000", env = "ID_REDACT_ALLOWED_ORIGIN")]
        allowed_origin: String,

        /// Largest accepted upload in bytes
        #[arg(long, default_value_t = 10 * 1024 * 1024)]
        max_upload_bytes: usize,

        #[command(flatten)]
        redactor: RedactorArgs,
    },
}

#[derive(Args)]
struct RedactorArgs {
    /// Text detection model
    #[arg(long, default_value = "text-detection.rten", env = "ID_REDACT_DET_MODEL")]
    detection_model: PathBuf,

    /// Text recognition model
    #[arg(long, default_value = "text-recognition.rten", env = "ID_REDACT_REC_MODEL")]
    recognition_model: PathBuf,

    /// Face detection model (UltraFace-style `scores`/`boxes` outputs)
    #[arg(long, default_value = "face-detection.rten", env = "ID_REDACT_FACE_MODEL")]
    face_model: PathBuf,

    #[arg(long, default_value_t = 320)]
    face_input_width: u32,

    #[arg(long, default_value_t = 240)]
    face_input_height: u32,

    /// Ratio between face search scales
    #[arg(long, default_value_t = 1.1)]
    scale_factor: f32,

    /// Candidates that must agree before a face is accepted
    #[arg(long, default_value_t = 5)]
    min_neighbors: usize,

    /// Smallest face size in pixels
    #[arg(long, default_value_t = 60)]
    min_size: u32,

    #[arg(long, default_value_t = 0.7)]
    face_score_threshold: f32,

    /// Named-entity recognition service endpoint
    #[arg(long, env = "ID_REDACT_NER_URL")]
    ner_url: String,

    /// NER request timeout in seconds
    #[arg(long, default_value_t = 30)]
    ner_timeout: u64,

    #[arg(long, default_value_t = 0)]
    x_offset: u32,

    #[arg(long, default_value_t = 0)]
    y_offset: u32,
}

impl RedactorArgs {
    fn into_config(self) -> RedactorConfig {
        RedactorConfig {
            detection_model: self.detection_model,
            recognition_model: self.recognition_model,
            face_model: self.face_model,
            face_input_size: (self.face_input_width, self.face_input_height),
            face: FaceDetectorParams {
                scale_factor: self.scale_factor,
                min_neighbors: self.min_neighbors,
                min_size: self.min_size,
                score_threshold: self.face_score_threshold,
            },
            ner_url: self.ner_url,
            ner_timeout: Duration::from_secs(self.ner_timeout),
            render: RenderOptions {
                x_offset: self.x_offset,
                y_offset: self.y_offset,
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Redact {
            input,
            output_folder,
            redactor,
        } => {
            let redactor = redactor.into_config().build()?;
            std::fs::create_dir_all(&output_folder)?;

            for path in input {
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let filename = path.file_name().and_then(|n| n.to_str());
                let redacted = redactor
                    .redact(&bytes, filename)
                    .with_context(|| format!("Failed to redact {}", path.display()))?;

                let out_path = output_folder.join(&redacted.filename);
                std::fs::write(&out_path, &redacted.bytes)?;
                tracing::info!(output = %out_path.display(), "Written redacted image");
            }
        }
        Commands::Serve {
            host,
            port,
            allowed_origin,
            max_upload_bytes,
            redactor,
        } => {
            // Collaborators are loaded before the runtime starts: the NER
            // client is blocking and must be created and dropped outside it.
            let redactor = Arc::new(redactor.into_config().build()?);
            let config = ServerConfig {
                host,
                port,
                allowed_origin,
                max_upload_bytes,
            };

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(id_redact::server::run_server(redactor.clone(), config))?;
            drop(runtime);
            drop(redactor);
        }
    }

    Ok(())
}
