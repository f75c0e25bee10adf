//! Splitting text into elementary units for segmentation.

use regex::Regex;
use std::sync::OnceLock;

fn sentence_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.?!]\s+").expect("sentence pattern is valid"))
}

fn word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\S+").expect("word pattern is valid"))
}

/// Byte range of a unit inside the source text. Never includes surrounding whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Split text into sentence spans, breaking after `.`, `?` or `!` followed by
/// whitespace. Sentences over `max_words` words are cut into windows of
/// `max_words` words.
pub fn split_units(text: &str, max_words: usize) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;

    for m in sentence_end().find_iter(text) {
        // The punctuation is ASCII, so +1 stays on a char boundary
        push_trimmed(text, last, m.start() + 1, &mut spans);
        last = m.end();
    }
    push_trimmed(text, last, text.len(), &mut spans);

    if max_words == 0 {
        return spans;
    }

    spans
        .into_iter()
        .flat_map(|span| split_long(text, span, max_words))
        .collect()
}

fn push_trimmed(text: &str, start: usize, end: usize, spans: &mut Vec<Span>) {
    let slice = &text[start..end];
    let trimmed_start = slice.len() - slice.trim_start().len();
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return;
    }
    let start = start + trimmed_start;
    spans.push(Span {
        start,
        end: start + trimmed.len(),
    });
}

fn split_long(text: &str, span: Span, max_words: usize) -> Vec<Span> {
    let words: Vec<Span> = word()
        .find_iter(span.text(text))
        .map(|m| Span {
            start: span.start + m.start(),
            end: span.start + m.end(),
        })
        .collect();

    if words.len() <= max_words {
        return vec![span];
    }

    words
        .chunks(max_words)
        .filter_map(|window| {
            let first = window.first()?;
            let last = window.last()?;
            Some(Span {
                start: first.start,
                end: last.end,
            })
        })
        .collect()
}

/// Join each unit with `buffer_size` neighbors on either side.
pub fn combine_with_neighbors(units: &[&str], buffer_size: usize) -> Vec<String> {
    (0..units.len())
        .map(|i| {
            let from = i.saturating_sub(buffer_size);
            let to = (i + buffer_size + 1).min(units.len());
            units[from..to].join(" ")
        })
        .collect()
}
