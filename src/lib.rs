//! Redacts personal information from scanned identity documents.
//!
//! An image goes through OCR, face detection and named-entity recognition;
//! a fixed chain of detectors turns those signals into a set of word indices;
//! the renderer blacks out the faces and the masked words and writes the image
//! back in its original format.

pub mod config;
pub mod detectors;
pub mod error;
pub mod face;
pub mod mask;
pub mod ner;
pub mod ocr;
pub mod pipeline;
pub mod render;
pub mod server;
pub mod words;

pub use error::{RedactError, Result};
pub use mask::MaskIndexSet;
pub use pipeline::{RedactionPlan, Redactor};
pub use render::{RedactedImage, RenderOptions};
pub use words::{OcrOutput, PixelRect, WordBox, WordTable};
