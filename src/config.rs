//! Configuration types for the redactor and the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::face::{FaceDetectorParams, RtenFaceDetector};
use crate::ner::HttpEntityRecognizer;
use crate::ocr::OcrsRecognizer;
use crate::pipeline::Redactor;
use crate::render::RenderOptions;

/// Everything needed to load the collaborators and build a [`Redactor`].
#[derive(Debug, Clone)]
pub struct RedactorConfig {
    pub detection_model: PathBuf,
    pub recognition_model: PathBuf,
    pub face_model: PathBuf,
    /// Width and height the face model expects.
    pub face_input_size: (u32, u32),
    pub face: FaceDetectorParams,
    pub ner_url: String,
    pub ner_timeout: Duration,
    pub render: RenderOptions,
}

impl RedactorConfig {
    /// Loads every model and client. Fails if any collaborator is unavailable.
    pub fn build(&self) -> anyhow::Result<Redactor> {
        info!("Loading OCR models...");
        let ocr = OcrsRecognizer::load(&self.detection_model, &self.recognition_model)?;

        info!("Loading face detection model...");
        let faces = RtenFaceDetector::load(&self.face_model, self.face_input_size, self.face)?;

        let ner = HttpEntityRecognizer::new(self.ner_url.clone(), self.ner_timeout)?;
        info!(url = %self.ner_url, "Using NER service");

        Ok(Redactor::new(Arc::new(ocr), Arc::new(faces), Arc::new(ner))
            .with_render_options(self.render))
    }
}

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS, e.g. the upload front-end.
    pub allowed_origin: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origin: "http://localhost:3000".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}
