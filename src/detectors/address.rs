use super::{DetectionContext, Detector, Detection, Proposals};
use crate::mask::MaskIndexSet;

const NAME: &str = "address_block";

/// Lower-case substrings that open an address block.
pub const ADDRESS_TRIGGERS: &[&str] = &["address", "post", "village", "tehsil", "district"];

/// Words masked after a trigger. The OCR gives no line boundaries, so a
/// fixed trailing window stands in for "the rest of the address".
pub const ADDRESS_WINDOW: usize = 5;

fn is_trigger(text: &str) -> bool {
    let lower = text.to_lowercase();
    ADDRESS_TRIGGERS.iter().any(|kw| lower.contains(kw))
}

/// Masks each address label and the words that follow it.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressBlockDetector;

impl Detector for AddressBlockDetector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn detect(&self, ctx: &DetectionContext<'_>, masked: &MaskIndexSet) -> Vec<Detection> {
        let mut proposals = Proposals::new(masked);
        let triggers: Vec<usize> = ctx
            .words
            .texts()
            .filter(|w| is_trigger(&w.text))
            .map(|w| w.index)
            .collect();

        for start in triggers {
            let end = (start + ADDRESS_WINDOW + 1).min(ctx.words.len());
            for index in start..end {
                if ctx.words.get(index).is_some_and(|w| !w.is_placeholder()) {
                    proposals.claim(index, NAME);
                }
            }
        }

        proposals.into_detections()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::{table, text_of};

    fn run_with(words: &[&str], masked: &MaskIndexSet) -> Vec<usize> {
        let words_table = table(words);
        let text = text_of(words);
        let ctx = DetectionContext {
            text: &text,
            words: &words_table,
            entities: &[],
        };
        let mut found: Vec<_> = AddressBlockDetector
            .detect(&ctx, masked)
            .into_iter()
            .map(|d| d.index)
            .collect();
        found.sort_unstable();
        found
    }

    fn run(words: &[&str]) -> Vec<usize> {
        run_with(words, &MaskIndexSet::new())
    }

    #[test]
    fn trigger_and_next_five_words() {
        let words = ["Name", "Address:", "12", "main", "road", "near", "temple", "sector", "9"];
        assert_eq!(run(&words), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn trigger_at_last_index_masks_only_itself() {
        assert_eq!(run(&["a", "b", "District"]), vec![2]);
    }

    #[test]
    fn window_near_end_is_truncated() {
        assert_eq!(run(&["x", "Village", "y", "z"]), vec![1, 2, 3]);
    }

    #[test]
    fn trigger_matches_substrings() {
        // "Postal" contains "post".
        assert_eq!(run(&["Postal", "a"]), vec![0, 1]);
    }

    #[test]
    fn masked_indices_are_skipped() {
        let mut masked = MaskIndexSet::new();
        masked.insert(2, "capitalization");
        assert_eq!(run_with(&["address", "a", "b"], &masked), vec![0, 1]);
    }
}
