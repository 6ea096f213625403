//! Output sanitizer: cuts an agent's reply down to the commit message text
//!
//! Agents wrap their answer in greetings, a ```` ```markdown ```` fence, or
//! a closing offer of help. The sanitizer finds where the message starts for
//! the role that produced it and drops everything around it.

use super::classify::{
    is_blank, is_change_title, is_closing_remark, is_module_heading, is_multi_module_title,
    is_noise_line, is_separator, is_subject_line, Fence, FenceTracker, DEFAULT_CHANGE_TYPES,
};
use crate::models::{AgentResponse, AgentRole, Contract};

/// Fence languages that mean "this whole block is the answer"
const WRAPPER_LANGS: &[&str] = &["", "markdown", "md", "text", "txt", "commit", "git"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizeOptions {
    pub types: Vec<String>,
    pub multi_module_scope: String,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            types: DEFAULT_CHANGE_TYPES.iter().map(|t| t.to_string()).collect(),
            multi_module_scope: "multi-module".to_string(),
        }
    }
}

impl SanitizeOptions {
    pub fn from_contract(contract: &Contract) -> Self {
        Self {
            types: contract.subject.types.clone(),
            multi_module_scope: contract.title.multi_module_scope.clone(),
        }
    }
}

/// Strip conversational framing from `raw`
///
/// Returns the text from the role's start marker on: a change title for the
/// top-level and repair roles, a `## ` heading or subject line for module
/// agents. Without a marker, leading blanks, separators and greetings are
/// skipped instead. The result ends with one newline, or is empty.
pub fn sanitize(role: AgentRole, raw: &str, opts: &SanitizeOptions) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let lines = unwrap_fence(&lines);

    let start = match find_marker(role, lines, opts) {
        Some(idx) => idx,
        None => {
            tracing::debug!(role = role.name(), "no start marker, skipping preamble");
            lines
                .iter()
                .position(|l| !(is_blank(l) || is_separator(l) || is_noise_line(l)))
                .unwrap_or(lines.len())
        }
    };

    let mut kept: Vec<&str> = lines[start..].to_vec();
    trim_tail(&mut kept);

    if kept.is_empty() {
        return String::new();
    }
    let mut text = kept.join("\n");
    text.push('\n');
    text
}

/// Sanitize one agent reply; the response is consumed here
pub fn sanitize_response(response: AgentResponse, opts: &SanitizeOptions) -> String {
    sanitize(response.role, &response.raw_text, opts)
}

fn find_marker(role: AgentRole, lines: &[&str], opts: &SanitizeOptions) -> Option<usize> {
    match role {
        AgentRole::TopLevel | AgentRole::Repair => lines.iter().position(|l| {
            is_change_title(l, &opts.types) || is_multi_module_title(l, &opts.multi_module_scope)
        }),
        AgentRole::Module => lines
            .iter()
            .position(|l| is_module_heading(l) || is_subject_line(l)),
    }
}

/// Contents of a fence that wraps the whole reply, else `lines` unchanged
///
/// Only greetings may precede the opening fence and only closing remarks may
/// follow the closing one.
fn unwrap_fence<'a>(lines: &'a [&'a str]) -> &'a [&'a str] {
    let Some(open) = lines.iter().position(|l| !(is_blank(l) || is_noise_line(l))) else {
        return lines;
    };
    let Some(fence) = wrapper_fence(lines[open]) else {
        return lines;
    };
    let Some(close) = lines.iter().rposition(|l| !(is_blank(l) || is_closing_remark(l))) else {
        return lines;
    };
    if close <= open || !fence.is_closed_by(lines[close]) {
        return lines;
    }
    &lines[open + 1..close]
}

fn wrapper_fence(line: &str) -> Option<Fence> {
    let (fence, info) = Fence::open(line)?;
    WRAPPER_LANGS
        .contains(&info.to_lowercase().as_str())
        .then_some(fence)
}

/// Drop trailing blanks, closing remarks and a dangling closing fence
fn trim_tail(lines: &mut Vec<&str>) {
    loop {
        while lines.last().is_some_and(|l| is_blank(l)) {
            lines.pop();
        }
        let Some(last) = lines.last() else {
            return;
        };
        if is_closing_remark(last) {
            lines.pop();
            continue;
        }
        // A bare fence that opens a block nothing closes
        let mut fences = FenceTracker::default();
        for line in &lines[..lines.len() - 1] {
            fences.feed(line);
        }
        let dangling = !fences.is_open()
            && Fence::open(last).is_some_and(|(_, info)| info.is_empty());
        if dangling {
            lines.pop();
            continue;
        }
        return;
    }
}
