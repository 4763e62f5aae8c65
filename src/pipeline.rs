//! One redaction request, start to finish.
//!
//! Stages run strictly in order: faces, text recognition, entity recognition,
//! then the word detectors (digit sequences, patterns, entities,
//! capitalization, address blocks) and finally rendering. Any stage failing
//! fails the whole request; there is no partial output.

use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info};

use crate::detectors::{DetectionContext, DetectorChain};
use crate::error::{RedactError, Result};
use crate::face::FaceDetector;
use crate::mask::MaskIndexSet;
use crate::ner::{EntityRecognizer, EntitySpan};
use crate::ocr::TextRecognizer;
use crate::render::{self, RedactedImage, RenderOptions};
use crate::words::{PixelRect, WordTable};

/// Everything the detectors decided for one image.
#[derive(Debug, Clone)]
pub struct RedactionPlan {
    pub faces: Vec<PixelRect>,
    pub text: String,
    pub words: WordTable,
    pub entities: Vec<EntitySpan>,
    pub mask: MaskIndexSet,
}

impl RedactionPlan {
    /// Bounding boxes of every masked word, in index order.
    pub fn masked_word_rects(&self) -> impl Iterator<Item = PixelRect> + '_ {
        self.mask
            .indices()
            .filter_map(|i| self.words.get(i))
            .map(|w| w.rect)
    }
}

/// Holds the collaborator handles, which are loaded once and only read
/// afterwards. All per-request state lives on the stack of [`Redactor::redact`].
pub struct Redactor {
    ocr: Arc<dyn TextRecognizer>,
    faces: Arc<dyn FaceDetector>,
    ner: Arc<dyn EntityRecognizer>,
    detectors: DetectorChain,
    render: RenderOptions,
}

impl Redactor {
    pub fn new(
        ocr: Arc<dyn TextRecognizer>,
        faces: Arc<dyn FaceDetector>,
        ner: Arc<dyn EntityRecognizer>,
    ) -> Self {
        Self {
            ocr,
            faces,
            ner,
            detectors: DetectorChain::standard(),
            render: RenderOptions::default(),
        }
    }

    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    pub fn with_detectors(mut self, detectors: DetectorChain) -> Self {
        self.detectors = detectors;
        self
    }

    /// Runs every detection stage without touching pixels.
    pub fn plan(&self, image: &DynamicImage) -> Result<RedactionPlan> {
        let rgb = image.to_rgb8();

        let faces = self.faces.detect(&rgb).map_err(RedactError::FaceDetection)?;
        debug!(faces = faces.len(), "Faces detected");

        let ocr = self.ocr.recognize(&rgb).map_err(RedactError::Ocr)?;
        debug!(words = ocr.words.len(), "Words recognized");

        let entities = self
            .ner
            .entities(&ocr.text)
            .map_err(RedactError::EntityRecognition)?;
        debug!(entities = entities.len(), "Entities recognized");

        let ctx = DetectionContext {
            text: &ocr.text,
            words: &ocr.words,
            entities: &entities,
        };
        let mask = self.detectors.run(&ctx);

        Ok(RedactionPlan {
            faces,
            text: ocr.text,
            words: ocr.words,
            entities,
            mask,
        })
    }

    /// Decodes `bytes`, blacks out every detected region and re-encodes the
    /// result in the input's format.
    pub fn redact(&self, bytes: &[u8], filename: Option<&str>) -> Result<RedactedImage> {
        let start = Instant::now();
        let decoded = render::decode(bytes)?;
        let plan = self.plan(&decoded.image)?;

        let mut surface = decoded.image;
        let painted = render::paint(
            &mut surface,
            &plan.faces,
            plan.masked_word_rects(),
            &self.render,
        );

        let format = render::output_format(Some(decoded.format));
        let bytes = render::encode(&surface, format)?;
        let filename = render::masked_filename(filename, format);

        info!(
            faces = plan.faces.len(),
            masked_words = plan.mask.len(),
            total_words = plan.words.len(),
            painted,
            width = surface.width(),
            height = surface.height(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Redacted image"
        );

        Ok(RedactedImage {
            bytes,
            format,
            filename,
        })
    }
}
