//! Paragraph-accumulation segmenter.
//!
//! Splits raw session text on blank-line boundaries and greedily accumulates
//! paragraphs until the running candidate reaches the configured minimum
//! length, at which point a [`Segment`] is emitted. Order is preserved and no
//! paragraph is ever dropped or duplicated: concatenating the emitted
//! segments with blank-line separators reconstructs the trimmed source
//! paragraphs exactly.
//!
//! Leftover paragraphs at the end of the input are emitted as a final
//! segment when they reach the minimum on their own — or when nothing has
//! been emitted yet, so any non-empty input yields at least one segment.
//! Otherwise they are appended to the last emitted segment's text.
//!
//! Lengths are counted in characters, not bytes, so multi-byte text does not
//! segment differently from its visible length.

use crate::artifact::Segment;

/// Default minimum segment length, in characters.
pub const DEFAULT_MIN_SEGMENT_LEN: usize = 250;

/// Partition `text` into ordered segments of at least `min_length` characters.
///
/// Inputs that trim to nothing produce an empty vector. An input whose
/// paragraphs never reach `min_length` in total produces exactly one segment
/// holding the whole trimmed input.
///
/// ```
/// use loreweave::segmenter::segment;
///
/// let segments = segment("A short line.\n\nAnother short line.", 250);
/// assert_eq!(segments.len(), 1);
/// assert_eq!(segments[0].text, "A short line.\n\nAnother short line.");
/// ```
#[must_use]
pub fn segment(text: &str, min_length: usize) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut buffer: Vec<String> = Vec::new();

    for paragraph in paragraphs(text) {
        if buffer.is_empty() {
            if char_len(&paragraph) >= min_length {
                segments.push(Segment::new(paragraph));
            } else {
                buffer.push(paragraph);
            }
            continue;
        }
        buffer.push(paragraph);
        let candidate = buffer.join("\n\n");
        if char_len(&candidate) >= min_length {
            segments.push(Segment::new(candidate));
            buffer.clear();
        }
    }

    if !buffer.is_empty() {
        let leftover = buffer.join("\n\n");
        if char_len(&leftover) >= min_length || segments.is_empty() {
            segments.push(Segment::new(leftover));
        } else if let Some(last) = segments.last_mut() {
            last.text.push_str("\n\n");
            last.text.push_str(&leftover);
        }
    }

    segments
}

/// Split `text` into trimmed, non-empty paragraphs on blank-line boundaries.
///
/// A blank line is any line that trims to nothing, so `"\n \t \n"` separates
/// paragraphs just like `"\n\n"` does.
fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            push_paragraph(&mut out, &mut current);
        } else {
            current.push(line);
        }
    }
    push_paragraph(&mut out, &mut current);
    out
}

fn push_paragraph(out: &mut Vec<String>, lines: &mut Vec<&str>) {
    if lines.is_empty() {
        return;
    }
    let paragraph = lines.join("\n");
    let trimmed = paragraph.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    lines.clear();
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
