//! Deterministic layout pass over a combined commit message
//!
//! Three phases run in order:
//!
//! 1. spacing: trailing whitespace and runs of blank lines outside code
//!    fences are collapsed, leading blank lines dropped
//! 2. content: headings are fitted to the title limit, subjects and prose
//!    are re-wrapped, fences and separators get blank lines around them
//! 3. closing: an unbalanced fence is closed (before the signature line when
//!    one ends the message) and trailing separators are dropped
//!
//! Running the normalizer on its own output returns the same text.

use super::wrap::{fit_heading, strip_trailing_period, wrap_words};
use crate::models::Contract;
use crate::parser::classify::{
    is_fence, is_heading, is_list_item, is_module_heading, is_separator, is_subject_line,
    is_title_line, list_item_prefix, Fence, FenceTracker,
};
use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_MAX_LINE_LENGTH: usize = 72;

static TRAILER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Z][A-Za-z-]*-by|Refs|Closes|Fixes|BREAKING[ -]CHANGE): ").expect("trailer regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub title_max: usize,
    pub subject_max: usize,
    pub body_max: usize,
    /// Line that must stay last, e.g. a `Generated-by:` trailer
    pub signature: Option<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::with_max_line_length(DEFAULT_MAX_LINE_LENGTH)
    }
}

impl NormalizeOptions {
    /// Same limit for titles, subjects and body lines
    pub fn with_max_line_length(max: usize) -> Self {
        Self {
            title_max: max,
            subject_max: max,
            body_max: max,
            signature: None,
        }
    }

    pub fn from_contract(contract: &Contract) -> Self {
        Self {
            title_max: contract.limits.title_max,
            subject_max: contract.limits.subject_max,
            body_max: contract.limits.body_max,
            signature: contract.signature().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    pub fn normalize(&self, text: &str) -> String {
        let lines = collapse_spacing(text);
        let lines = self.layout(&lines);
        self.close(lines)
    }

    fn is_signature(&self, line: &str) -> bool {
        self.options
            .signature
            .as_deref()
            .is_some_and(|sig| !sig.is_empty() && line.contains(sig))
    }

    /// Lines that end a paragraph and never join one
    fn is_structural(&self, line: &str) -> bool {
        line.trim().is_empty()
            || is_fence(line)
            || is_separator(line)
            || is_heading(line)
            || is_subject_line(line)
            || is_list_item(line)
            || is_verbatim(line)
            || self.is_signature(line)
    }

    fn layout(&self, lines: &[String]) -> Vec<String> {
        let opts = &self.options;
        let structural = |line: &str| self.is_structural(line);
        let mut out: Vec<String> = Vec::new();
        let mut need_blank = false;
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i].as_str();
            if line.is_empty() {
                push_blank(&mut out);
                i += 1;
                continue;
            }
            if need_blank {
                push_blank(&mut out);
                need_blank = false;
            }

            if self.is_signature(line) {
                out.push(line.to_string());
                i += 1;
                continue;
            }

            if let Some((fence, _)) = Fence::open(line) {
                push_blank(&mut out);
                out.push(line.to_string());
                i += 1;
                while i < lines.len() {
                    let inner = lines[i].as_str();
                    out.push(inner.to_string());
                    i += 1;
                    if fence.is_closed_by(inner) {
                        need_blank = true;
                        break;
                    }
                }
                continue;
            }

            if is_separator(line) {
                push_blank(&mut out);
                out.push(line.trim().to_string());
                need_blank = true;
                i += 1;
                continue;
            }

            if is_title_line(line) || is_module_heading(line) {
                out.push(fit_heading(line, opts.title_max));
                need_blank = true;
                i += 1;
                continue;
            }
            if is_heading(line) {
                out.push(line.to_string());
                need_blank = true;
                i += 1;
                continue;
            }

            if is_verbatim(line) || starts_indented(line) {
                out.push(line.to_string());
                i += 1;
                continue;
            }

            // A subject absorbs the prose lines that directly follow it
            if is_subject_line(line) {
                let (words, next) = self.collect_paragraph(lines, i, line);
                let joined = words.join(" ");
                let joined = strip_trailing_period(&joined);
                let words: Vec<&str> = joined.split_whitespace().collect();
                out.extend(wrap_words(&words, "", "", opts.subject_max, &structural));
                i = next;
                continue;
            }

            if let Some(prefix_len) = list_item_prefix(line) {
                let (indent, marker) = split_marker(&line[..prefix_len]);
                let first_prefix = format!("{}{} ", indent, marker);
                let cont_prefix = " ".repeat(first_prefix.chars().count());
                let (words, next) = self.collect_paragraph(lines, i, &line[prefix_len..]);
                out.extend(wrap_words(
                    &words,
                    &first_prefix,
                    &cont_prefix,
                    opts.body_max,
                    &structural,
                ));
                i = next;
                continue;
            }

            let (words, next) = self.collect_paragraph(lines, i, line);
            let wrapped = wrap_words(&words, "", "", opts.body_max, &structural);
            // Joining must not turn the first line into a heading, subject or
            // list item, or the next pass would read it differently
            if next > i + 1 && wrapped.first().is_some_and(|l| self.is_structural(l)) {
                let own: Vec<&str> = line.split_whitespace().collect();
                out.extend(wrap_words(&own, "", "", opts.body_max, &structural));
                i += 1;
                continue;
            }
            out.extend(wrapped);
            i = next;
        }

        out
    }

    /// Words of `first` plus every following non-structural line
    fn collect_paragraph<'a>(
        &self,
        lines: &'a [String],
        start: usize,
        first: &'a str,
    ) -> (Vec<&'a str>, usize) {
        let mut words: Vec<&str> = first.split_whitespace().collect();
        let mut next = start + 1;
        while next < lines.len() && !self.is_structural(&lines[next]) {
            words.extend(lines[next].split_whitespace());
            next += 1;
        }
        (words, next)
    }

    fn close(&self, mut lines: Vec<String>) -> String {
        let mut tracker = FenceTracker::default();
        for line in &lines {
            tracker.feed(line);
        }
        if let Some(fence) = tracker.open_fence() {
            let signature_at = lines
                .iter()
                .rposition(|l| !l.trim().is_empty())
                .filter(|&idx| self.is_signature(&lines[idx]));
            match signature_at {
                Some(idx) => {
                    let tail = lines.split_off(idx);
                    trim_trailing_blanks(&mut lines);
                    lines.push(fence.delimiter());
                    lines.push(String::new());
                    lines.extend(tail);
                }
                None => {
                    trim_trailing_blanks(&mut lines);
                    lines.push(fence.delimiter());
                }
            }
        }

        while lines
            .last()
            .is_some_and(|l| l.trim().is_empty() || is_separator(l))
        {
            lines.pop();
        }
        let leading = lines
            .iter()
            .take_while(|l| l.trim().is_empty() || is_separator(l))
            .count();
        lines.drain(..leading);

        if lines.is_empty() {
            return String::new();
        }
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

/// Normalize with default limits and no signature
pub fn normalize(text: &str) -> String {
    Normalizer::default().normalize(text)
}

/// Phase one: strip trailing whitespace and collapse blank runs, leaving
/// fenced content untouched
fn collapse_spacing(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut fences = FenceTracker::default();

    for raw in text.lines() {
        let was_open = fences.is_open();
        if fences.feed(raw) {
            out.push(raw.trim_end().to_string());
            continue;
        }
        if was_open {
            out.push(raw.to_string());
            continue;
        }
        let line = raw.trim_end();
        if line.is_empty() {
            if out.last().is_some_and(|l| !l.is_empty()) {
                out.push(String::new());
            }
            continue;
        }
        out.push(line.to_string());
    }
    out
}

/// Tables, quotes and trailers are kept as written
fn is_verbatim(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('|') || trimmed.starts_with('>') || TRAILER_RE.is_match(line)
}

/// Indented code only counts at the start of a block
fn starts_indented(line: &str) -> bool {
    line.starts_with('\t') || line.starts_with("    ")
}

fn split_marker(prefix: &str) -> (&str, &str) {
    let indent_len = prefix.len() - prefix.trim_start().len();
    (&prefix[..indent_len], prefix.trim())
}

fn push_blank(out: &mut Vec<String>) {
    if out.last().is_some_and(|l| !l.is_empty()) {
        out.push(String::new());
    }
}

fn trim_trailing_blanks(lines: &mut Vec<String>) {
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_idempotent(input: &str) -> String {
        let once = normalize(input);
        let twice = normalize(&once);
        assert_eq!(once, twice, "not idempotent for input:\n{input}");
        once
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("\n\n  \n"), "");
    }

    #[test]
    fn test_collapses_blank_lines_outside_fences() {
        let out = assert_idempotent("\n\n# api: fix: a\n\n\n\nbody\n```\na\n\n\nb\n```\n");
        assert_eq!(out, "# api: fix: a\n\nbody\n\n```\na\n\n\nb\n```\n");
    }

    #[test]
    fn test_title_truncated_with_ellipsis() {
        let title = format!("# api: feat: {}", "extend ".repeat(15));
        let out = assert_idempotent(&title);
        let first = out.lines().next().unwrap();
        assert!(first.chars().count() <= 72);
        assert!(first.ends_with("..."));
    }

    #[test]
    fn test_title_loses_trailing_period() {
        assert_eq!(normalize("# api: fix: handle nulls."), "# api: fix: handle nulls\n");
    }

    #[test]
    fn test_subject_wrapped_not_truncated() {
        let subject = format!("api: feat: {}.", "add retry support ".repeat(6).trim_end());
        let out = assert_idempotent(&format!("## api\n\n{subject}\n"));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "## api");
        assert!(lines[2].starts_with("api: feat: add retry"));
        assert!(lines.iter().all(|l| l.chars().count() <= 72));
        assert!(!out.contains("..."));
        assert!(out.trim_end().ends_with("support"));
        let words: usize = lines[2..].iter().map(|l| l.split_whitespace().count()).sum();
        assert_eq!(words, subject.split_whitespace().count());
    }

    #[test]
    fn test_subject_joins_continuation_lines() {
        let out = assert_idempotent("## api\napi: fix: handle\nempty payloads.\n\nBody text.\n");
        assert_eq!(out, "## api\n\napi: fix: handle empty payloads\n\nBody text.\n");
    }

    #[test]
    fn test_paragraph_rewrapped() {
        let para = "word ".repeat(40);
        let out = assert_idempotent(&format!("# api: docs: x\n\n{para}\n"));
        assert!(out.lines().all(|l| l.chars().count() <= 72));
        assert_eq!(out.split_whitespace().filter(|w| *w == "word").count(), 40);
    }

    #[test]
    fn test_list_items_hanging_indent() {
        let item = format!("- {}", "retry ".repeat(20));
        let out = assert_idempotent(&format!("{item}\n- short one\n"));
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("- retry"));
        assert!(lines[1].starts_with("  retry"));
        assert_eq!(lines.last(), Some(&"- short one"));
    }

    #[test]
    fn test_long_word_stays_alone() {
        let url = format!("https://example.com/{}", "a".repeat(80));
        let out = assert_idempotent(&format!("see\n{url}\nfor details\n"));
        assert!(out.lines().any(|l| l == url));
    }

    #[test]
    fn test_fence_gets_blank_lines() {
        let out = assert_idempotent("text\n```diff\n+a\n```\nmore\n");
        assert_eq!(out, "text\n\n```diff\n+a\n```\n\nmore\n");
    }

    #[test]
    fn test_separator_spacing_and_trailing_separator() {
        let out = assert_idempotent("# a: fix: b\nbody\n---\n## api\napi: fix: c\n---\n\n");
        assert_eq!(out, "# a: fix: b\n\nbody\n\n---\n\n## api\n\napi: fix: c\n");
    }

    #[test]
    fn test_unbalanced_fence_closed() {
        let out = assert_idempotent("# a: fix: b\n\n```diff\n+x\n\n");
        assert_eq!(out, "# a: fix: b\n\n```diff\n+x\n```\n");
    }

    #[test]
    fn test_fence_closed_before_signature() {
        let normalizer = Normalizer::new(NormalizeOptions {
            signature: Some("Generated-by: modcommit".to_string()),
            ..NormalizeOptions::default()
        });
        let out = normalizer.normalize("# a: fix: b\n\n```\ncode\n\nGenerated-by: modcommit\n");
        assert_eq!(out, "# a: fix: b\n\n```\ncode\n```\n\nGenerated-by: modcommit\n");
        assert_eq!(normalizer.normalize(&out), out);
    }

    #[test]
    fn test_quoted_fences_stay_inside_longer_fence() {
        let input = "## docs\n\ndocs: chore: update docs/usage.md\n\n````diff\n ```bash\n cargo run --release -- --config path/to/config.toml --verbose --flag value another\n ```\n+Run the binary with a config file.\n````\n";
        assert_eq!(assert_idempotent(input), input);
    }

    #[test]
    fn test_unclosed_long_fence_closed_with_same_run() {
        let out = assert_idempotent("# a: fix: b\n\n````md\n```\nx\n");
        assert_eq!(out, "# a: fix: b\n\n````md\n```\nx\n````\n");
    }

    #[test]
    fn test_join_never_creates_heading_or_subject() {
        assert_eq!(
            assert_idempotent("#\nword\n# api: feat: add\n"),
            "#\nword\n# api: feat: add\n"
        );
        assert_eq!(assert_idempotent("##\nword\n"), "##\nword\n");
        assert_eq!(assert_idempotent("api:\nfeat: add x.\n"), "api:\nfeat: add x.\n");
        assert_eq!(assert_idempotent("some\nwords\n"), "some words\n");
    }

    #[test]
    fn test_wrapped_dash_does_not_become_list() {
        let para = format!("{} - with backoff and jitter", "retry ".repeat(12).trim_end());
        let out = assert_idempotent(&para);
        assert!(!out.lines().skip(1).any(|l| l.starts_with("- ")));
    }

    #[test]
    fn test_tables_and_trailers_verbatim() {
        let input = "| a | b |\n|---|---|\n\nSigned-off-by: Dev <dev@example.com>\nRefs: #12\n";
        assert_eq!(assert_idempotent(input), input);
    }
}
