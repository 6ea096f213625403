//! Greedy word wrapping and heading truncation

/// Character count, the unit all limits are expressed in
pub fn width(s: &str) -> usize {
    s.chars().count()
}

/// Greedily pack `words` into lines of at most `max` characters
///
/// The first line is prefixed with `first_prefix`, the rest with
/// `cont_prefix`. Words are never split; a word wider than `max` gets a line
/// of its own. A continuation line is never allowed to start in a way
/// `is_structural` recognizes (a list marker, a fence, a heading, ...): the
/// break moves one or more words earlier instead, so the output reads back as
/// the same paragraph.
pub fn wrap_words(
    words: &[&str],
    first_prefix: &str,
    cont_prefix: &str,
    max: usize,
    is_structural: &dyn Fn(&str) -> bool,
) -> Vec<String> {
    let mut lines: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let line_len = |line: &[&str], first: bool| -> usize {
        let prefix = if first { first_prefix } else { cont_prefix };
        width(prefix) + line.iter().map(|w| width(w)).sum::<usize>() + line.len().saturating_sub(1)
    };

    let starts_structural = |start: usize| -> bool {
        let end = (start + 3).min(words.len());
        let candidate = format!("{}{}", cont_prefix, words[start..end].join(" "));
        let single = format!("{}{}", cont_prefix, words[start]);
        is_structural(&candidate) || is_structural(&single)
    };

    for (idx, &word) in words.iter().enumerate() {
        if current.is_empty() {
            current.push(word);
            continue;
        }

        let first = lines.is_empty();
        if line_len(&current, first) + 1 + width(word) <= max {
            current.push(word);
            continue;
        }

        // Break before `word`, pulling words down while the new line would
        // start like a structural line.
        let mut start = idx;
        while starts_structural(start) && current.len() > 1 {
            current.pop();
            start -= 1;
        }
        if starts_structural(start) {
            current.push(word);
            continue;
        }

        lines.push(std::mem::take(&mut current));
        current.extend_from_slice(&words[start..=idx]);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let prefix = if i == 0 { first_prefix } else { cont_prefix };
            format!("{}{}", prefix, line.join(" "))
        })
        .collect()
}

/// Fit a heading line into `max` characters
///
/// Longer headings are cut and end in `...`; shorter ones lose trailing
/// periods (an existing ellipsis is kept).
pub fn fit_heading(line: &str, max: usize) -> String {
    let line = line.trim_end();
    if width(line) > max {
        let cut: String = line.chars().take(max.saturating_sub(3)).collect();
        let cut = cut.trim_end().trim_end_matches('.').trim_end();
        return format!("{}...", cut);
    }
    if line.ends_with("...") {
        return line.to_string();
    }
    line.trim_end_matches('.').trim_end().to_string()
}

/// Drop a trailing period from a sentence, keeping an ellipsis
pub fn strip_trailing_period(text: &str) -> &str {
    if text.ends_with("...") {
        text
    } else {
        text.trim_end_matches('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never(_: &str) -> bool {
        false
    }

    #[test]
    fn test_wrap_greedy() {
        let words: Vec<&str> = "the quick brown fox jumps over the lazy dog".split(' ').collect();
        let lines = wrap_words(&words, "", "", 15, &never);
        assert_eq!(lines, vec!["the quick brown", "fox jumps over", "the lazy dog"]);
    }

    #[test]
    fn test_wrap_long_word_gets_own_line() {
        let words = vec!["see", "https://example.com/a/very/long/path", "now"];
        let lines = wrap_words(&words, "", "", 10, &never);
        assert_eq!(lines, vec!["see", "https://example.com/a/very/long/path", "now"]);
    }

    #[test]
    fn test_wrap_with_hanging_indent() {
        let words: Vec<&str> = "one two three four five".split(' ').collect();
        let lines = wrap_words(&words, "- ", "  ", 12, &never);
        assert_eq!(lines, vec!["- one two", "  three four", "  five"]);
        assert!(lines.iter().all(|l| width(l) <= 12));
    }

    #[test]
    fn test_wrap_avoids_structural_line_start() {
        let words: Vec<&str> = "retry the call - with backoff".split(' ').collect();
        let is_list = |line: &str| line.starts_with("- ");
        let plain = wrap_words(&words, "", "", 15, &never);
        assert_eq!(plain[1], "- with backoff");

        let guarded = wrap_words(&words, "", "", 15, &is_list);
        assert_eq!(guarded, vec!["retry the", "call - with", "backoff"]);
    }

    #[test]
    fn test_fit_heading() {
        assert_eq!(fit_heading("# api: fix: handle nulls.", 72), "# api: fix: handle nulls");
        assert_eq!(fit_heading("# api: fix: more...", 72), "# api: fix: more...");

        let long = format!("# api: feat: {}", "word ".repeat(20));
        let fitted = fit_heading(&long, 72);
        assert!(width(&fitted) <= 72);
        assert!(fitted.ends_with("..."));
        assert_eq!(fit_heading(&fitted, 72), fitted);
    }

    #[test]
    fn test_strip_trailing_period() {
        assert_eq!(strip_trailing_period("add endpoint."), "add endpoint");
        assert_eq!(strip_trailing_period("and more..."), "and more...");
        assert_eq!(strip_trailing_period("no period"), "no period");
    }
}
