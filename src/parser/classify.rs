//! Line classifiers for free-form agent text
//!
//! Each predicate looks at a single line (or a heading's text) and answers one
//! question. The sanitizer, combiner, normalizer and validator are all built
//! from these.

use regex::Regex;
use std::sync::LazyLock;

/// Change types accepted when no contract is at hand
pub const DEFAULT_CHANGE_TYPES: &[&str] = &[
    "feat", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci", "chore", "revert",
];

static SUBJECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_][\w./@-]*): ([a-z]+)(!)?: (\S.*)$").expect("subject regex")
});

static CHANGE_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^# .*?: ([a-z]+)!?:(?:\s|$)").expect("title regex"));

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}\s").expect("heading regex"));

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*-{3,}\s*$").expect("separator regex"));

static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*(?:[-*+]|\d{1,3}[.)])\s+)\S").expect("list regex"));

/// Conversational openers agents put in front of the actual answer
const NOISE_PREFIXES: &[&str] = &[
    "sure",
    "certainly",
    "of course",
    "absolutely",
    "okay",
    "ok,",
    "ok.",
    "great",
    "hello",
    "hi ",
    "hi,",
    "hi!",
    "here is",
    "here's",
    "here are",
    "below is",
    "the following",
    "based on",
    "i'll",
    "i will",
    "i've",
    "i have",
    "i am",
    "i'm",
    "let me",
    "as an ai",
    "as requested",
    "commit message:",
    "**commit message",
    "generated commit message",
];

/// Closing remarks agents append after the answer
const CLOSING_PREFIXES: &[&str] = &[
    "let me know",
    "hope this helps",
    "i hope this",
    "feel free",
    "if you'd like",
    "if you would like",
    "if you want",
    "would you like",
    "please let me know",
];

/// A parsed `<module>: <type>[!]: <description>` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub module: String,
    pub change_type: String,
    pub breaking: bool,
    pub description: String,
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// A code fence delimiter: marker character and run length
///
/// Follows CommonMark: up to three spaces of indent, then at least three
/// backticks or tildes. A block is only closed by a run of the same marker
/// that is at least as long as the opener and carries no info string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence {
    pub marker: char,
    pub len: usize,
}

impl Fence {
    /// Backtick fence long enough to wrap `text` without being closed early
    pub fn backticks_around(text: &str) -> Self {
        let longest = text
            .split(|c| c != '`')
            .map(str::len)
            .max()
            .unwrap_or(0);
        Self {
            marker: '`',
            len: (longest + 1).max(3),
        }
    }

    /// Parse an opening fence, returning it with its info string
    pub fn open(line: &str) -> Option<(Self, &str)> {
        let rest = strip_fence_indent(line)?;
        let marker = rest.chars().next().filter(|c| matches!(c, '`' | '~'))?;
        let len = rest.chars().take_while(|&c| c == marker).count();
        if len < 3 {
            return None;
        }
        let info = rest[len..].trim();
        if marker == '`' && info.contains('`') {
            return None;
        }
        Some((Self { marker, len }, info))
    }

    pub fn is_closed_by(&self, line: &str) -> bool {
        let Some(rest) = strip_fence_indent(line) else {
            return false;
        };
        let len = rest.chars().take_while(|&c| c == self.marker).count();
        len >= self.len && rest[len..].trim().is_empty()
    }

    /// Bare delimiter text, e.g. "````"
    pub fn delimiter(&self) -> String {
        self.marker.to_string().repeat(self.len)
    }
}

fn strip_fence_indent(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches(' ');
    (line.len() - rest.len() <= 3).then_some(rest)
}

/// Line that could open a code fence
pub fn is_fence(line: &str) -> bool {
    Fence::open(line).is_some()
}

/// Walks lines in order, tracking which fence (if any) is open
#[derive(Debug, Clone, Default)]
pub struct FenceTracker {
    open: Option<Fence>,
}

impl FenceTracker {
    /// Feed the next line; true when it opens or closes a block
    pub fn feed(&mut self, line: &str) -> bool {
        match self.open {
            Some(fence) if fence.is_closed_by(line) => {
                self.open = None;
                true
            }
            Some(_) => false,
            None => match Fence::open(line) {
                Some((fence, _)) => {
                    self.open = Some(fence);
                    true
                }
                None => false,
            },
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// The fence left open after the last line fed
    pub fn open_fence(&self) -> Option<Fence> {
        self.open
    }
}

/// Horizontal rule used between sections
pub fn is_separator(line: &str) -> bool {
    SEPARATOR_RE.is_match(line)
}

/// Any markdown ATX heading
pub fn is_heading(line: &str) -> bool {
    HEADING_RE.is_match(line)
}

/// Level-1 heading (`# ...`)
pub fn is_title_line(line: &str) -> bool {
    line.starts_with("# ")
}

/// Title line carrying a recognized change type as `: <type>:`
pub fn is_change_title(line: &str, types: &[String]) -> bool {
    CHANGE_TITLE_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .is_some_and(|t| types.iter().any(|known| known == t.as_str()))
}

/// Title line that starts with the multi-module scope, e.g. `# multi-module: ...`
pub fn is_multi_module_title(line: &str, scope: &str) -> bool {
    line.strip_prefix("# ")
        .is_some_and(|rest| rest.trim_start().starts_with(scope))
}

/// Level-2 heading with real content
pub fn is_module_heading(line: &str) -> bool {
    match line.strip_prefix("## ") {
        Some(rest) => {
            let rest = rest.trim();
            !rest.is_empty() && !rest.chars().all(|c| matches!(c, '-' | '=' | '*' | '_' | '#'))
        }
        None => false,
    }
}

/// Module name a `## ` heading refers to
///
/// Takes the first token, ignoring markdown emphasis and a trailing colon:
/// `## api`, ``## `api` ``, `## **api**: changes` all name `api`.
pub fn heading_module_name(line: &str) -> Option<String> {
    if !is_module_heading(line) {
        return None;
    }
    let rest = line.trim_start_matches('#').trim();
    let token = rest.split_whitespace().next()?;
    let name = token
        .trim_matches(|c: char| c == '`' || c == '*' || c == '_')
        .trim_end_matches(':')
        .trim_matches(|c: char| c == '`' || c == '*' || c == '_');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

pub fn parse_subject(line: &str) -> Option<Subject> {
    let caps = SUBJECT_RE.captures(line.trim_end())?;
    Some(Subject {
        module: caps[1].to_string(),
        change_type: caps[2].to_string(),
        breaking: caps.get(3).is_some(),
        description: caps[4].to_string(),
    })
}

pub fn is_subject_line(line: &str) -> bool {
    parse_subject(line).is_some()
}

/// Width of a list item's marker including trailing spaces
pub fn list_item_prefix(line: &str) -> Option<usize> {
    LIST_ITEM_RE.captures(line).and_then(|caps| caps.get(1)).map(|m| m.end())
}

pub fn is_list_item(line: &str) -> bool {
    list_item_prefix(line).is_some()
}

/// Greeting, acknowledgement or self-introduction
pub fn is_noise_line(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    NOISE_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Trailing offer of further help
pub fn is_closing_remark(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    CLOSING_PREFIXES.iter().any(|p| lower.starts_with(p))
}
