//! Word-level PII detectors and the fusion step that merges their proposals.
//!
//! Every detector is a pure function of the recognised text, the word table,
//! the entity spans and the indices committed by the detectors that ran
//! before it. Order matters: later detectors skip what earlier ones already
//! claimed, so [`DetectorChain::standard`] fixes it once.

mod address;
mod capitalization;
mod digits;
mod entities;
mod patterns;

pub use address::{AddressBlockDetector, ADDRESS_TRIGGERS, ADDRESS_WINDOW};
pub use capitalization::{CapitalizationDetector, BOILERPLATE_KEYWORDS};
pub use digits::DigitSequenceDetector;
pub use entities::EntityDetector;
pub use patterns::{PatternDetector, PiiPattern};

use std::collections::BTreeSet;

use tracing::debug;

use crate::mask::MaskIndexSet;
use crate::ner::EntitySpan;
use crate::words::WordTable;

/// Read-only inputs shared by all detectors for one image.
#[derive(Debug, Clone, Copy)]
pub struct DetectionContext<'a> {
    pub text: &'a str,
    pub words: &'a WordTable,
    pub entities: &'a [EntitySpan],
}

/// A word index proposed for redaction, tagged with the detector that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub index: usize,
    pub detector: &'static str,
}

pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Proposes word indices to redact. Never proposes an index already in
    /// `masked`, and never proposes the same index twice.
    fn detect(&self, ctx: &DetectionContext<'_>, masked: &MaskIndexSet) -> Vec<Detection>;
}

/// Tracks what one detector has claimed on top of the committed mask, so a
/// detector sees its own earlier picks as masked without mutating the set.
pub(crate) struct Proposals<'a> {
    masked: &'a MaskIndexSet,
    claimed: BTreeSet<usize>,
    detections: Vec<Detection>,
}

impl<'a> Proposals<'a> {
    pub(crate) fn new(masked: &'a MaskIndexSet) -> Self {
        Self {
            masked,
            claimed: BTreeSet::new(),
            detections: Vec::new(),
        }
    }

    pub(crate) fn is_free(&self, index: usize) -> bool {
        !self.masked.contains(index) && !self.claimed.contains(&index)
    }

    pub(crate) fn claim(&mut self, index: usize, detector: &'static str) -> bool {
        if !self.is_free(index) {
            return false;
        }
        self.claimed.insert(index);
        self.detections.push(Detection { index, detector });
        true
    }

    pub(crate) fn into_detections(self) -> Vec<Detection> {
        self.detections
    }
}

/// Detectors in the order they run.
pub struct DetectorChain {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorChain {
    pub fn new(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self { detectors }
    }

    /// digit sequences → patterns → entities → capitalization → address blocks.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(DigitSequenceDetector),
            Box::new(PatternDetector::standard()),
            Box::new(EntityDetector),
            Box::new(CapitalizationDetector),
            Box::new(AddressBlockDetector),
        ])
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Runs every detector in order, committing each one's proposals before
    /// the next one starts.
    pub fn run(&self, ctx: &DetectionContext<'_>) -> MaskIndexSet {
        let mut mask = MaskIndexSet::new();
        for detector in &self.detectors {
            let proposed = detector.detect(ctx, &mask);
            let committed = proposed
                .into_iter()
                .filter(|d| mask.insert(d.index, d.detector))
                .count();
            debug!(detector = detector.name(), committed, "Detector finished");
        }
        mask
    }
}

impl Default for DetectorChain {
    fn default() -> Self {
        Self::standard()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{table, text_of};
    use super::*;

    #[test]
    fn standard_order() {
        assert_eq!(
            DetectorChain::standard().names(),
            vec![
                "digit_sequence",
                "pattern",
                "entity",
                "capitalization",
                "address_block"
            ]
        );
    }

    #[test]
    fn earlier_detectors_take_precedence() {
        // "ABCDE1234F" is claimed by the pattern detector even though the
        // capitalization heuristic would also accept it.
        let words = ["name", "ABCDE1234F", "card"];
        let words_table = table(&words);
        let text = text_of(&words);
        let ctx = DetectionContext {
            text: &text,
            words: &words_table,
            entities: &[],
        };

        let mask = DetectorChain::standard().run(&ctx);
        assert_eq!(mask.indices().collect::<Vec<_>>(), vec![1]);
        assert_eq!(mask.source(1), Some("pattern:pan"));
    }

    #[test]
    fn proposals_see_their_own_claims() {
        let mut committed = MaskIndexSet::new();
        committed.insert(0, "earlier");

        let mut proposals = Proposals::new(&committed);
        assert!(!proposals.claim(0, "later"));
        assert!(proposals.claim(1, "later"));
        assert!(!proposals.claim(1, "later"));
        assert_eq!(proposals.into_detections().len(), 1);
    }
}
