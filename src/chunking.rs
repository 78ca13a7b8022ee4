//! Sentence-aligned document chunking.
//!
//! Splitting is a pure function over text: normalize whitespace, segment into
//! sentences, then greedily pack sentences into chunks of at most
//! `chunk_size` characters with a sentence-aligned overlap carried between
//! consecutive chunks. Every chunk is a contiguous slice of the normalized
//! text, so the separators between sentences (a space or a blank line)
//! survive inside chunk contents and stripping the overlap prefixes
//! reconstructs the normalized text exactly. A sentence longer than
//! `chunk_size` is emitted whole rather than split mid-sentence or dropped.

use regex::Regex;
use std::sync::OnceLock;

use crate::document::DocumentChunk;

/// Fallback slice length when the text has neither terminal punctuation nor
/// paragraph breaks.
const FALLBACK_SLICE_CHARS: usize = 500;

fn sentence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^.!?]*[.!?]+(?:\s+|$)").expect("valid sentence regex"))
}

/// Collapse whitespace: runs containing two or more newlines become exactly
/// one blank line, every other run becomes a single space. Leading and
/// trailing whitespace is removed.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_ws = false;
    let mut newlines = 0usize;

    for ch in text.chars() {
        if ch.is_whitespace() {
            pending_ws = true;
            if ch == '\n' {
                newlines += 1;
            }
        } else {
            if pending_ws && !out.is_empty() {
                if newlines >= 2 {
                    out.push_str("\n\n");
                } else {
                    out.push(' ');
                }
            }
            pending_ws = false;
            newlines = 0;
            out.push(ch);
        }
    }

    out
}

/// Segment text into sentences on terminal punctuation (`.`, `!`, `?`
/// followed by whitespace or end of text).
///
/// Trailing text without terminal punctuation is kept as a final segment so
/// no content is lost across the split. When the text contains no terminal
/// punctuation at all, falls back to paragraph splitting on blank lines, and
/// as a last resort to fixed-length slices, so non-empty input always yields
/// at least one segment.
pub fn split_into_sentences(text: &str) -> Vec<String> {
    sentence_spans(text).into_iter().map(|(start, end)| text[start..end].to_string()).collect()
}

/// Byte spans of the segments [`split_into_sentences`] returns, in order,
/// each shrunk to exclude surrounding whitespace.
fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut last_end = 0;

    for m in sentence_regex().find_iter(text) {
        if let Some(span) = trimmed_span(text, m.start(), m.end()) {
            spans.push(span);
        }
        last_end = m.end();
    }

    if spans.is_empty() {
        let mut pos = 0;
        for paragraph in text.split("\n\n") {
            if let Some(span) = trimmed_span(text, pos, pos + paragraph.len()) {
                spans.push(span);
            }
            pos += paragraph.len() + 2;
        }
        if !spans.is_empty() {
            return spans;
        }
        return slice_spans(text, FALLBACK_SLICE_CHARS);
    }

    // Unterminated tail after the last matched sentence.
    if let Some(span) = trimmed_span(text, last_end, text.len()) {
        spans.push(span);
    }

    spans
}

/// Shrink `[start, end)` to exclude leading and trailing whitespace. `None`
/// when nothing remains.
fn trimmed_span(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let slice = &text[start..end];
    let lead = slice.len() - slice.trim_start().len();
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some((start + lead, start + lead + trimmed.len()))
}

/// Byte spans of consecutive slices of at most `n` characters.
fn slice_spans(text: &str, n: usize) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut count = 0usize;
    for (i, ch) in text.char_indices() {
        count += 1;
        if count >= n {
            let end = i + ch.len_utf8();
            spans.push((start, end));
            start = end;
            count = 0;
        }
    }
    if start < text.len() {
        spans.push((start, text.len()));
    }
    spans
}

/// The last `n` characters of `s`, on a character boundary.
fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((i, _)) => &s[i..],
        None => s,
    }
}

/// Select the overlap text carried from a flushed chunk into the next one.
///
/// Searches a window of the last `overlap * 3 / 2` characters for a sentence
/// boundary and starts the overlap right after it, keeping the overlap
/// sentence-aligned. Falls back to the last `overlap` raw characters when no
/// boundary is found in the window.
pub fn overlap_suffix(chunk: &str, overlap: usize) -> String {
    if overlap == 0 {
        return String::new();
    }
    if chunk.chars().count() <= overlap {
        return chunk.to_string();
    }

    let window = tail_chars(chunk, overlap * 3 / 2);
    let mut prev: Option<(usize, char)> = None;
    for (i, ch) in window.char_indices() {
        if let Some((pi, pc)) = prev {
            if matches!(pc, '.' | '!' | '?') && ch.is_whitespace() && pi > 0 {
                return window[pi + pc.len_utf8()..].trim().to_string();
            }
        }
        prev = Some((i, ch));
    }

    tail_chars(chunk, overlap).to_string()
}

/// Splits text into overlapping, sentence-aligned [`DocumentChunk`]s.
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    chunk_size: usize,
    overlap: usize,
}

impl SentenceChunker {
    /// Create a new chunker.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `overlap` — characters carried from the end of one chunk into the next
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self { chunk_size, overlap }
    }

    /// Split `text` into chunks attributed to `source`.
    ///
    /// Returns an empty `Vec` for empty (or all-whitespace) input. Chunk
    /// indices are `0..n` with no gaps. Each chunk's content is the exact
    /// slice of the normalized text between its `start_char` and `end_char`
    /// offsets (inclusive), so paragraph breaks inside a chunk are preserved.
    pub fn chunk(&self, text: &str, source: &str) -> Vec<DocumentChunk> {
        let cleaned = normalize_whitespace(text);
        if cleaned.is_empty() {
            return Vec::new();
        }

        // (byte start, byte end, char start, char end) of each sentence in
        // the cleaned text. Never empty for non-empty cleaned input.
        let spans = sentence_spans(&cleaned);
        let mut char_spans = Vec::with_capacity(spans.len());
        let mut byte_pos = 0;
        let mut char_pos = 0;
        for &(start, end) in &spans {
            char_pos += cleaned[byte_pos..start].chars().count();
            let char_start = char_pos;
            char_pos += cleaned[start..end].chars().count();
            char_spans.push((start, end, char_start, char_pos));
            byte_pos = end;
        }

        let mut chunks = Vec::new();
        let (mut chunk_start, mut body_end, mut chunk_start_char, mut body_end_char) =
            char_spans[0];
        let mut current_chars = body_end_char - chunk_start_char;
        let mut chunk_index = 0usize;

        for &(start, end, char_start, char_end) in &char_spans[1..] {
            let sentence_chars = char_end - char_start;

            if current_chars + 1 + sentence_chars > self.chunk_size {
                chunks.push(DocumentChunk {
                    content: cleaned[chunk_start..body_end].to_string(),
                    source: source.to_string(),
                    chunk_index,
                    page_number: None,
                    start_char: Some(chunk_start_char),
                    end_char: Some(body_end_char - 1),
                });
                chunk_index += 1;

                // The overlap is a suffix of the flushed chunk, so the next
                // chunk starts that many characters before the flush point
                // and stays a contiguous slice of the cleaned text.
                let overlap_text = overlap_suffix(&cleaned[chunk_start..body_end], self.overlap);
                if overlap_text.is_empty() {
                    chunk_start = start;
                    chunk_start_char = char_start;
                } else {
                    chunk_start = body_end - overlap_text.len();
                    chunk_start_char = body_end_char - overlap_text.chars().count();
                }
            }

            body_end = end;
            body_end_char = char_end;
            current_chars = body_end_char - chunk_start_char;
        }

        chunks.push(DocumentChunk {
            content: cleaned[chunk_start..body_end].to_string(),
            source: source.to_string(),
            chunk_index,
            page_number: None,
            start_char: Some(chunk_start_char),
            end_char: Some(body_end_char - 1),
        });

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_spaces_and_blank_lines() {
        let text = "first   line\t here\n\n\n\nsecond    paragraph\nstill second";
        assert_eq!(
            normalize_whitespace(text),
            "first line here\n\nsecond paragraph still second"
        );
    }

    #[test]
    fn normalize_trims_edges() {
        assert_eq!(normalize_whitespace("  hello  "), "hello");
        assert_eq!(normalize_whitespace("\n\n\n"), "");
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        let sentences = split_into_sentences("One. Two! Three?");
        assert_eq!(sentences, vec!["One.", "Two!", "Three?"]);
    }

    #[test]
    fn keeps_unterminated_tail() {
        let sentences = split_into_sentences("Complete sentence. trailing fragment");
        assert_eq!(sentences, vec!["Complete sentence.", "trailing fragment"]);
    }

    #[test]
    fn falls_back_to_paragraphs_without_punctuation() {
        let sentences = split_into_sentences("first paragraph\n\nsecond paragraph");
        assert_eq!(sentences, vec!["first paragraph", "second paragraph"]);
    }

    #[test]
    fn unpunctuated_single_paragraph_is_kept_whole() {
        let text = "a".repeat(1200);
        let sentences = split_into_sentences(&text);
        assert_eq!(sentences, vec![text]);
    }

    #[test]
    fn slicing_is_the_last_resort_for_degenerate_input() {
        // No punctuation and every paragraph trims to nothing, so only the
        // fixed-length slicer can produce output.
        let sentences = split_into_sentences("   ");
        assert_eq!(sentences.len(), 1);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunker = SentenceChunker::new(100, 20);
        assert!(chunker.chunk("", "doc").is_empty());
        assert!(chunker.chunk("   \n  ", "doc").is_empty());
    }

    #[test]
    fn single_text_fits_in_one_chunk() {
        let chunker = SentenceChunker::new(100, 20);
        let chunks = chunker.chunk("A short sentence.", "doc");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "A short sentence.");
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].source, "doc");
    }

    #[test]
    fn overlap_reappears_at_start_of_next_chunk() {
        // "A. B." flushes when "C." would push it past 5 chars; the 2-char
        // overlap window falls back to the raw tail "B.".
        let chunker = SentenceChunker::new(5, 2);
        let chunks = chunker.chunk("A. B. C.", "doc");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "A. B.");
        assert_eq!(chunks[1].content, "B. C.");
        assert!(chunks[1].content.starts_with("B."));
    }

    #[test]
    fn chunk_indices_are_contiguous() {
        let text = "One sentence here. Another sentence there. A third one follows. \
                    And a fourth to round it out. Plus a fifth for good measure.";
        let chunker = SentenceChunker::new(60, 15);
        let chunks = chunker.chunk(text, "doc");
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
        }
    }

    #[test]
    fn overlong_sentence_is_emitted_whole() {
        let long = format!("{}.", "x".repeat(80));
        let text = format!("Short one. {long} Short two.");
        let chunker = SentenceChunker::new(40, 10);
        let chunks = chunker.chunk(&text, "doc");
        assert!(chunks.iter().any(|c| c.content.contains(&long)));
    }

    #[test]
    fn no_sentence_is_lost_across_chunks() {
        let sentences: Vec<String> =
            (0..30).map(|i| format!("Sentence number {i} has some words.")).collect();
        let text = sentences.join(" ");
        let chunker = SentenceChunker::new(120, 30);
        let chunks = chunker.chunk(&text, "doc");
        let joined: String =
            chunks.iter().map(|c| c.content.as_str()).collect::<Vec<_>>().join(" ");
        for sentence in &sentences {
            assert!(joined.contains(sentence), "missing: {sentence}");
        }
    }

    #[test]
    fn overlap_suffix_is_sentence_aligned_when_possible() {
        let chunk = "First part ends here. Second part continues";
        // The window is large enough to see the boundary after "here."
        let suffix = overlap_suffix(chunk, 20);
        assert_eq!(suffix, "Second part continues");
    }

    #[test]
    fn overlap_suffix_falls_back_to_raw_tail() {
        let chunk = "no boundaries in this text at all";
        let suffix = overlap_suffix(chunk, 6);
        assert_eq!(suffix, "at all");
    }

    #[test]
    fn overlap_suffix_returns_short_chunks_whole() {
        assert_eq!(overlap_suffix("tiny", 10), "tiny");
    }

    #[test]
    fn paragraph_break_survives_inside_a_chunk() {
        let text = "First sentence here.\n\nSecond paragraph sentence.";
        let chunker = SentenceChunker::new(1000, 200);
        let chunks = chunker.chunk(text, "doc");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, normalize_whitespace(text));
    }

    #[test]
    fn offsets_locate_each_chunk_in_the_cleaned_text() {
        let text = "Alpha beta gamma delta.\n\nEpsilon zeta eta theta. Iota kappa lambda mu.\n\n\
                    Nu xi omicron pi rho sigma.";
        let cleaned = normalize_whitespace(text);
        let chunker = SentenceChunker::new(40, 10);
        let chunks = chunker.chunk(text, "doc");
        assert!(chunks.len() > 1);

        for chunk in &chunks {
            let start = chunk.start_char.unwrap();
            let end = chunk.end_char.unwrap();
            let slice: String = cleaned.chars().skip(start).take(end - start + 1).collect();
            assert_eq!(slice, chunk.content);
        }
    }

    #[test]
    fn stripping_overlaps_reconstructs_the_cleaned_text() {
        let text = "Alpha beta gamma delta.\n\nEpsilon zeta eta theta. Iota kappa lambda mu. \
                    Nu xi omicron pi.";
        let cleaned = normalize_whitespace(text);
        let chunker = SentenceChunker::new(40, 10);
        let chunks = chunker.chunk(text, "doc");
        assert!(chunks.len() > 1);

        let mut rebuilt = chunks[0].content.clone();
        let mut covered = chunks[0].end_char.unwrap();
        for chunk in &chunks[1..] {
            let overlap = covered + 1 - chunk.start_char.unwrap();
            rebuilt.extend(chunk.content.chars().skip(overlap));
            covered = chunk.end_char.unwrap();
        }
        assert_eq!(rebuilt, cleaned);
    }

    #[test]
    fn offsets_cover_the_normalized_text() {
        let text = "Alpha beta gamma. Delta epsilon zeta. Eta theta iota. Kappa lambda mu.";
        let chunker = SentenceChunker::new(40, 10);
        let chunks = chunker.chunk(text, "doc");
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].start_char, Some(0));
        let cleaned_len = normalize_whitespace(text).chars().count();
        assert_eq!(chunks.last().unwrap().end_char, Some(cleaned_len - 1));
    }
}
