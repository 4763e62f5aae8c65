//! Fake collaborators and image helpers shared by the integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use anyhow::anyhow;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use id_redact::face::FaceDetector;
use id_redact::ner::{EntityLabel, EntityRecognizer, EntitySpan};
use id_redact::ocr::TextRecognizer;
use id_redact::{OcrOutput, PixelRect, Redactor, WordTable};

pub const WIDTH: u32 = 640;
pub const HEIGHT: u32 = 200;

pub struct FakeOcr(pub OcrOutput);

impl TextRecognizer for FakeOcr {
    fn recognize(&self, _image: &RgbImage) -> anyhow::Result<OcrOutput> {
        Ok(self.0.clone())
    }
}

pub struct FakeFaces(pub Vec<PixelRect>);

impl FaceDetector for FakeFaces {
    fn detect(&self, _image: &RgbImage) -> anyhow::Result<Vec<PixelRect>> {
        Ok(self.0.clone())
    }
}

pub struct FakeNer(pub Vec<EntitySpan>);

impl EntityRecognizer for FakeNer {
    fn entities(&self, _text: &str) -> anyhow::Result<Vec<EntitySpan>> {
        Ok(self.0.clone())
    }
}

pub struct FailingNer;

impl EntityRecognizer for FailingNer {
    fn entities(&self, _text: &str) -> anyhow::Result<Vec<EntitySpan>> {
        Err(anyhow!("NER service unavailable"))
    }
}

/// Ten words per row, 60 px apart horizontally and 30 px vertically.
pub fn word_rect(index: usize) -> PixelRect {
    PixelRect::new(
        (index % 10) as i32 * 60 + 5,
        (index / 10) as i32 * 30 + 5,
        50,
        20,
    )
}

pub fn ocr_output(words: &[&str]) -> OcrOutput {
    let table: WordTable = words
        .iter()
        .enumerate()
        .map(|(i, w)| (*w, word_rect(i)))
        .collect();
    let text = words
        .iter()
        .filter(|w| !w.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    OcrOutput { text, words: table }
}

pub fn person(text: &str, start: usize) -> EntitySpan {
    EntitySpan {
        text: text.to_string(),
        label: EntityLabel::Person,
        start,
        end: start + text.chars().count(),
    }
}

pub fn redactor(words: &[&str], faces: Vec<PixelRect>, entities: Vec<EntitySpan>) -> Redactor {
    Redactor::new(
        Arc::new(FakeOcr(ocr_output(words))),
        Arc::new(FakeFaces(faces)),
        Arc::new(FakeNer(entities)),
    )
}

pub fn white_image() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([255, 255, 255])))
}

pub fn encoded(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn contains(rect: &PixelRect, x: u32, y: u32) -> bool {
    let (x, y) = (x as i32, y as i32);
    x >= rect.x && x < rect.right() && y >= rect.y && y < rect.bottom()
}
