use std::collections::HashSet;

use super::{DetectionContext, Detector, Detection, Proposals};
use crate::mask::MaskIndexSet;
use crate::ner::EntityLabel;

const PERSON: &str = "entity:person";
const LOCATION: &str = "entity:location";

/// Maps named-entity spans back onto words by substring containment.
///
/// A location or organisation masks the first free word containing it. A
/// person name masks every free word containing it, since names tend to
/// recur (header, signature, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityDetector;

impl Detector for EntityDetector {
    fn name(&self) -> &'static str {
        "entity"
    }

    fn detect(&self, ctx: &DetectionContext<'_>, masked: &MaskIndexSet) -> Vec<Detection> {
        let mut proposals = Proposals::new(masked);
        let mut seen = HashSet::new();
        let mut person_names = Vec::new();

        for span in ctx.entities {
            let text = span.text.trim();
            if text.is_empty() {
                continue;
            }
            match span.label {
                EntityLabel::LocationOrOrg => {
                    let hit = ctx
                        .words
                        .texts()
                        .find(|w| proposals.is_free(w.index) && w.text.contains(text));
                    if let Some(word) = hit {
                        proposals.claim(word.index, LOCATION);
                    }
                }
                EntityLabel::Person => {
                    if seen.insert(text) {
                        person_names.push(text);
                    }
                }
                EntityLabel::Other => {}
            }
        }

        for name in person_names {
            for word in ctx.words.texts() {
                if word.text.contains(name) {
                    proposals.claim(word.index, PERSON);
                }
            }
        }

        proposals.into_detections()
    }
}
