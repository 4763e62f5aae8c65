//! OCR output normalised into an index-addressable table of word boxes.

/// Axis-aligned rectangle in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Grows the rectangle by `dx`/`dy` on each side and clips it to an image of
    /// `width` x `height`. Returns `None` when nothing is left inside the image.
    pub fn padded_within(&self, dx: u32, dy: u32, width: u32, height: u32) -> Option<PixelRect> {
        let left = (self.x - dx as i32).max(0);
        let top = (self.y - dy as i32).max(0);
        let right = (self.right() + dx as i32).min(width as i32);
        let bottom = (self.bottom() + dy as i32).min(height as i32);
        if right <= left || bottom <= top {
            return None;
        }
        Some(PixelRect::new(
            left,
            top,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

/// One recognised token and its bounding box. `index` is the token's position in
/// OCR reading order and is the only identity used for masking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBox {
    pub index: usize,
    pub text: String,
    pub rect: PixelRect,
}

impl WordBox {
    /// Placeholder tokens carry no text and are never matched or masked.
    pub fn is_placeholder(&self) -> bool {
        self.text.is_empty()
    }
}

/// Ordered word boxes for a single image.
///
/// Text and geometry live in the same entry, so index `i` always names the
/// same token whichever view a detector reads.
#[derive(Debug, Clone, Default)]
pub struct WordTable {
    words: Vec<WordBox>,
}

impl WordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a token, assigning it the next index.
    pub fn push(&mut self, text: impl Into<String>, rect: PixelRect) -> usize {
        let index = self.words.len();
        self.words.push(WordBox {
            index,
            text: text.into(),
            rect,
        });
        index
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WordBox> {
        self.words.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordBox> {
        self.words.iter()
    }

    /// Words that carry text, skipping OCR placeholders.
    pub fn texts(&self) -> impl Iterator<Item = &WordBox> {
        self.words.iter().filter(|w| !w.is_placeholder())
    }
}

impl<S: Into<String>> FromIterator<(S, PixelRect)> for WordTable {
    fn from_iter<I: IntoIterator<Item = (S, PixelRect)>>(iter: I) -> Self {
        let mut table = WordTable::new();
        for (text, rect) in iter {
            table.push(text, rect);
        }
        table
    }
}

/// What the OCR collaborator hands back: the full recognised text plus the
/// per-token table it was assembled from.
#[derive(Debug, Clone, Default)]
pub struct OcrOutput {
    pub text: String,
    pub words: WordTable,
}
