use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use super::{DetectionContext, Detector, Detection, Proposals};
use crate::mask::MaskIndexSet;

/// A named, case-insensitive PII pattern.
#[derive(Debug, Clone)]
pub struct PiiPattern {
    pub name: &'static str,
    /// Detection tag, `pattern:<name>`.
    pub tag: &'static str,
    pub regex: Regex,
}

impl PiiPattern {
    pub fn new(name: &'static str, tag: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { name, tag, regex })
    }
}

// Applied in this order. Numeric IDs first so the broader `long_number` and
// `phone` rules only pick up what the specific formats left behind.
const STANDARD: &[(&str, &str, &str)] = &[
    ("aadhaar", "pattern:aadhaar", r"(?:\d[\s-]*){12}"),
    ("pan", "pattern:pan", r"\b[A-Z]{5}\d{4}[A-Z]\b"),
    ("passport", "pattern:passport", r"\b[A-Z]\d{7}\b"),
    ("voter_id", "pattern:voter_id", r"\b[A-Z]{3}\d{7}\b"),
    ("long_number", "pattern:long_number", r"\b\d{8,}\b"),
    ("phone", "pattern:phone", r"\b[6-9]\d{9}\b"),
    ("email", "pattern:email", r"[\w.-]+@[\w.-]+"),
    ("dob", "pattern:dob", r"\b\d{2}/\d{2}/\d{4}\b"),
    (
        "dob_text",
        "pattern:dob_text",
        r"\b\d{1,2}[\s./-]+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?[\s./-]+\d{4}\b",
    ),
    ("dob_hindi", "pattern:dob_hindi", r"जन्म तिथि|डीओबी"),
    ("address_hindi", "pattern:address_hindi", r"पता|गांव|जिला|पोस्ट|तहसील"),
];

static STANDARD_PATTERNS: Lazy<Vec<PiiPattern>> = Lazy::new(|| {
    STANDARD
        .iter()
        .map(|(name, tag, pattern)| {
            PiiPattern::new(name, tag, pattern).expect("standard PII patterns compile")
        })
        .collect()
});

/// Matches regex patterns against the full text and maps each match back to
/// the first free word that contains it or matches the pattern on its own.
///
/// A match spanning several words only masks one of them.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    patterns: Vec<PiiPattern>,
}

impl PatternDetector {
    pub fn new(patterns: Vec<PiiPattern>) -> Self {
        Self { patterns }
    }

    pub fn standard() -> Self {
        Self::new(STANDARD_PATTERNS.clone())
    }

    pub fn patterns(&self) -> &[PiiPattern] {
        &self.patterns
    }
}

impl Detector for PatternDetector {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn detect(&self, ctx: &DetectionContext<'_>, masked: &MaskIndexSet) -> Vec<Detection> {
        let mut proposals = Proposals::new(masked);

        for pattern in &self.patterns {
            for found in pattern.regex.find_iter(ctx.text) {
                let pii = found.as_str();
                let hit = ctx.words.texts().find(|w| {
                    proposals.is_free(w.index)
                        && (w.text.contains(pii) || pattern.regex.is_match(&w.text))
                });
                if let Some(word) = hit {
                    proposals.claim(word.index, pattern.tag);
                }
            }
        }

        proposals.into_detections()
    }
}
