//! Text recognition collaborator: turns an image into recognised text plus the
//! word table the detectors work on.

use std::path::Path;

use anyhow::Context;
use image::RgbImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use rten_imageproc::{BoundingRect, RotatedRect};
use tracing::debug;

use crate::words::{OcrOutput, PixelRect, WordTable};

pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &RgbImage) -> anyhow::Result<OcrOutput>;
}

/// OCR backed by `ocrs` detection and recognition models.
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    pub fn load(detection_model_path: &Path, recognition_model_path: &Path) -> anyhow::Result<Self> {
        let detection_model = Model::load_file(detection_model_path).with_context(|| {
            format!("Failed to load detection model {}", detection_model_path.display())
        })?;
        let recognition_model = Model::load_file(recognition_model_path).with_context(|| {
            format!("Failed to load recognition model {}", recognition_model_path.display())
        })?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })?;
        Ok(Self { engine })
    }
}

fn word_rect(word: &RotatedRect, width: u32, height: u32) -> PixelRect {
    let bounds = word.bounding_rect();
    let corner = bounds.top_left();
    let rect = PixelRect::new(
        corner.x.floor() as i32,
        corner.y.floor() as i32,
        bounds.width().ceil().max(0.0) as u32,
        bounds.height().ceil().max(0.0) as u32,
    );
    rect.padded_within(0, 0, width, height)
        .unwrap_or(PixelRect::new(rect.x.max(0), rect.y.max(0), 0, 0))
}

/// Builds the word table and full text from lines of `(text, rect)` words.
/// Words within a line are joined by a space and lines by a newline; empty
/// words stay in the table as placeholders but add nothing to the text.
pub fn assemble(lines: Vec<Vec<(String, PixelRect)>>) -> OcrOutput {
    let mut words = WordTable::new();
    let mut line_texts = Vec::with_capacity(lines.len());

    for line in lines {
        let mut parts = Vec::new();
        for (text, rect) in line {
            let text = text.trim().to_string();
            if !text.is_empty() {
                parts.push(text.clone());
            }
            words.push(text, rect);
        }
        if !parts.is_empty() {
            line_texts.push(parts.join(" "));
        }
    }

    OcrOutput {
        text: line_texts.join("\n"),
        words,
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn recognize(&self, image: &RgbImage) -> anyhow::Result<OcrOutput> {
        let (width, height) = image.dimensions();
        let img_source = ImageSource::from_bytes(image.as_raw(), image.dimensions())?;
        let ocr_input = self.engine.prepare_input(img_source)?;

        let word_rects = self.engine.detect_words(&ocr_input)?;
        let lines = self.engine.find_text_lines(&ocr_input, &word_rects);

        // Each word is recognised as a one-word line so the returned texts
        // line up with the rectangles one to one.
        let single_words: Vec<Vec<RotatedRect>> =
            lines.iter().flatten().map(|word| vec![*word]).collect();
        let texts = self.engine.recognize_text(&ocr_input, &single_words)?;

        let mut texts = texts.into_iter();
        let assembled_lines = lines
            .iter()
            .map(|line| {
                line.iter()
                    .map(|word| {
                        let text = texts
                            .next()
                            .flatten()
                            .map(|t| t.to_string())
                            .unwrap_or_default();
                        (text, word_rect(word, width, height))
                    })
                    .collect()
            })
            .collect();

        let output = assemble(assembled_lines);
        debug!(
            lines = lines.len(),
            words = output.words.len(),
            "Text recognition finished"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: i32) -> PixelRect {
        PixelRect::new(x, 0, 10, 10)
    }

    #[test]
    fn assemble_keeps_placeholders_in_table() {
        let output = assemble(vec![
            vec![("Name:".into(), rect(0)), ("".into(), rect(20)), ("Jane".into(), rect(40))],
            vec![("DOB".into(), rect(0)), (" 01/02/1990 ".into(), rect(20))],
        ]);

        assert_eq!(output.text, "Name: Jane\nDOB 01/02/1990");
        assert_eq!(output.words.len(), 5);
        assert!(output.words.get(1).is_some_and(|w| w.is_placeholder()));
        assert_eq!(output.words.get(4).map(|w| w.text.as_str()), Some("01/02/1990"));
        assert_eq!(output.words.get(4).map(|w| w.rect), Some(rect(20)));
    }

    #[test]
    fn empty_lines_add_no_text() {
        let output = assemble(vec![vec![("".into(), rect(0))], vec![("ok".into(), rect(0))]]);
        assert_eq!(output.text, "ok");
        assert_eq!(output.words.len(), 2);
    }
}
