use once_cell::sync::Lazy;
use regex::Regex;

use super::{DetectionContext, Detector, Detection, Proposals};
use crate::mask::MaskIndexSet;

const NAME: &str = "digit_sequence";

/// OCR tends to split a 12-digit national ID into up to three tokens.
const WINDOW_LEN: usize = 3;

static SINGLE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d[\s-]*){12}$").expect("valid single-word ID regex"));

static WINDOW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{12}$").expect("valid windowed ID regex"));

fn strip_separators(text: &str) -> String {
    text.chars().filter(|c| *c != ' ' && *c != '-').collect()
}

/// Finds 12-digit ID numbers written as one token or spread over three
/// consecutive tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitSequenceDetector;

impl Detector for DigitSequenceDetector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn detect(&self, ctx: &DetectionContext<'_>, masked: &MaskIndexSet) -> Vec<Detection> {
        let mut proposals = Proposals::new(masked);
        let words: Vec<_> = ctx.words.iter().collect();
        let stripped: Vec<String> = words.iter().map(|w| strip_separators(&w.text)).collect();

        for i in 0..words.len() {
            if !words[i].is_placeholder() && SINGLE_WORD.is_match(&stripped[i]) {
                proposals.claim(i, NAME);
            }

            if i + WINDOW_LEN > words.len() {
                continue;
            }
            let combined = stripped[i..i + WINDOW_LEN].concat();
            if WINDOW.is_match(&combined) {
                for j in i..i + WINDOW_LEN {
                    if !words[j].is_placeholder() {
                        proposals.claim(j, NAME);
                    }
                }
            }
        }

        proposals.into_detections()
    }
}
