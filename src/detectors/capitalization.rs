use super::{DetectionContext, Detector, Detection, Proposals};
use crate::mask::MaskIndexSet;

const NAME: &str = "capitalization";

/// Form boilerplate that is capitalised but never sensitive on its own.
pub const BOILERPLATE_KEYWORDS: &[&str] = &[
    "address",
    "dob",
    "date",
    "of",
    "birth",
    "father",
    "mother",
    "post",
    "village",
    "tehsil",
    "district",
    "unique",
    "identification",
    "authority",
    "india",
    "government",
    "male",
    "female",
];

fn looks_like_name(text: &str) -> bool {
    let starts_upper = text.chars().next().is_some_and(char::is_uppercase);
    let all_digits = text.chars().all(char::is_numeric);
    starts_upper
        && !all_digits
        && text.chars().count() > 2
        && !BOILERPLATE_KEYWORDS.contains(&text.to_lowercase().as_str())
}

/// Fallback net: any capitalised, non-numeric word longer than two characters
/// that is not boilerplate is treated as a probable name.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapitalizationDetector;

impl Detector for CapitalizationDetector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn detect(&self, ctx: &DetectionContext<'_>, masked: &MaskIndexSet) -> Vec<Detection> {
        let mut proposals = Proposals::new(masked);
        for word in ctx.words.texts() {
            if looks_like_name(&word.text) {
                proposals.claim(word.index, NAME);
            }
        }
        proposals.into_detections()
    }
}
