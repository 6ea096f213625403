//! Context builder: turns the staged diff and module map into prompt payloads
//!
//! One top-level payload describes the whole change set. When more than one
//! module is affected, each module additionally gets its own payload holding
//! only the diff chunks of files it owns.

use crate::models::{DiffContext, FileDiff, ModuleContext};
use crate::parser::classify::Fence;

const TRUNCATION_MARKER: &str = "[... diff truncated ...]";

/// Split a unified diff into per-file chunks
///
/// Uses `diff --git` headers when present, else `--- `/`+++ ` pairs. The owning
/// path is the new side, or the old side for deletions. Text before the first
/// header belongs to no file and is dropped.
pub fn split_diff(diff: &str) -> Vec<FileDiff> {
    let lines: Vec<&str> = diff.split_inclusive('\n').collect();
    let git_style = lines.iter().any(|l| l.starts_with("diff --git "));

    let mut chunks: Vec<FileDiff> = Vec::new();
    let mut current: Option<FileDiff> = None;
    let mut old_path: Option<String> = None;
    let mut in_header = false;

    for (idx, line) in lines.iter().enumerate() {
        let starts_chunk = if git_style {
            line.starts_with("diff --git ")
        } else {
            line.starts_with("--- ")
                && lines.get(idx + 1).is_some_and(|next| next.starts_with("+++ "))
                && !current.as_ref().is_some_and(|c| in_hunk(&c.text))
        };

        if starts_chunk {
            if let Some(chunk) = current.take() {
                chunks.push(chunk);
            }
            old_path = None;
            in_header = true;
            let path = if git_style { git_header_path(line) } else { String::new() };
            current = Some(FileDiff {
                path,
                text: String::new(),
            });
        }

        let Some(chunk) = current.as_mut() else {
            continue;
        };
        chunk.text.push_str(line);

        if line.starts_with("@@") {
            in_header = false;
        }
        if !in_header {
            continue;
        }
        if let Some(rest) = line.strip_prefix("--- ") {
            old_path = marker_path(rest, "a/");
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            match marker_path(rest, "b/") {
                Some(path) => chunk.path = path,
                None => {
                    if let Some(old) = old_path.clone() {
                        chunk.path = old;
                    }
                }
            }
        }
    }

    if let Some(chunk) = current {
        chunks.push(chunk);
    }
    chunks.retain(|c| !c.path.is_empty());
    chunks
}

/// True while the last hunk of `text` still expects body lines
///
/// A `--- ` line inside a hunk is a removed line starting with `-- `, not a
/// new file header.
fn in_hunk(text: &str) -> bool {
    let mut remaining: Option<(usize, usize)> = None;
    for line in text.lines() {
        if let Some(counts) = parse_hunk_header(line) {
            remaining = Some(counts);
            continue;
        }
        if let Some((old, new)) = remaining.as_mut() {
            match line.chars().next() {
                Some('-') => *old = old.saturating_sub(1),
                Some('+') => *new = new.saturating_sub(1),
                Some('\\') => {}
                _ => {
                    *old = old.saturating_sub(1);
                    *new = new.saturating_sub(1);
                }
            }
        }
    }
    remaining.is_some_and(|(old, new)| old > 0 || new > 0)
}

/// `@@ -a,b +c,d @@` -> (b, d)
fn parse_hunk_header(line: &str) -> Option<(usize, usize)> {
    let rest = line.strip_prefix("@@ -")?;
    let (ranges, _) = rest.split_once(" @@")?;
    let (old, new) = ranges.split_once(" +")?;
    let count = |range: &str| -> Option<usize> {
        match range.split_once(',') {
            Some((_, n)) => n.parse().ok(),
            None => Some(1),
        }
    };
    Some((count(old)?, count(new)?))
}

/// Path from `diff --git a/x b/x`, taking the `b/` side
fn git_header_path(line: &str) -> String {
    let header = line.trim_end().trim_start_matches("diff --git ");
    match header.rfind(" b/") {
        Some(pos) => header[pos + 3..].to_string(),
        None => header
            .split_whitespace()
            .next()
            .map(|p| p.trim_start_matches("a/").to_string())
            .unwrap_or_default(),
    }
}

/// Path after a `--- `/`+++ ` marker, `None` for `/dev/null`
fn marker_path(rest: &str, prefix: &str) -> Option<String> {
    let path = rest.trim_end().split('\t').next().unwrap_or_default().trim();
    if path.is_empty() || path == "/dev/null" {
        return None;
    }
    Some(path.strip_prefix(prefix).unwrap_or(path).to_string())
}

/// One context per affected module, only for multi-module changes
pub fn build_module_contexts(ctx: &DiffContext) -> Vec<ModuleContext> {
    if !ctx.is_multi_module() {
        return Vec::new();
    }

    let chunks = split_diff(&ctx.unified_diff);
    ctx.affected_modules
        .iter()
        .map(|module| {
            let files = ctx.files_for(module);
            let module_diff: String = chunks
                .iter()
                .filter(|chunk| files.contains(&chunk.path))
                .map(|chunk| chunk.text.as_str())
                .collect();

            ModuleContext {
                module_name: module.clone(),
                files,
                module_diff,
            }
        })
        .collect()
}

/// Cap `diff` at `max_chars`, cutting at a line boundary
pub fn truncate_diff(diff: &str, max_chars: usize) -> String {
    if diff.chars().count() <= max_chars {
        return diff.to_string();
    }
    let cut: String = diff.chars().take(max_chars).collect();
    let kept = match cut.rfind('\n') {
        Some(pos) => &cut[..=pos],
        None => "",
    };
    format!("{}{}\n", kept, TRUNCATION_MARKER)
}

/// Markdown payload describing the whole change set
pub fn build_top_level_payload(ctx: &DiffContext, max_diff_chars: usize) -> String {
    let mut out = String::from("## Affected Modules\n");
    if ctx.affected_modules.is_empty() {
        out.push_str("(none)\n");
    }
    for module in &ctx.affected_modules {
        out.push_str(&format!("- {}\n", module));
    }

    out.push_str("\n## Staged Files\n| File | Modules |\n|------|---------|\n");
    for file in &ctx.staged_files {
        let modules = if file.modules.is_empty() {
            "(none)".to_string()
        } else {
            file.modules.join(", ")
        };
        out.push_str(&format!("| {} | {} |\n", file.path, modules));
    }

    out.push_str("\n## Diff\n");
    push_fenced_diff(&mut out, &truncate_diff(&ctx.unified_diff, max_diff_chars));
    out
}

/// Markdown payload for one module
pub fn build_module_payload(module: &ModuleContext, max_diff_chars: usize) -> String {
    let mut out = format!("## Module\n{}\n\n## Files\n", module.module_name);
    for file in &module.files {
        out.push_str(&format!("- {}\n", file));
    }

    out.push_str("\n## Diff\n");
    push_fenced_diff(&mut out, &truncate_diff(&module.module_diff, max_diff_chars));
    out
}

fn push_fenced_diff(out: &mut String, diff: &str) {
    let fence = "`".repeat(Fence::backticks_around(diff).len.max(4));
    out.push_str(&fence);
    out.push_str("diff\n");
    out.push_str(diff);
    if !diff.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&fence);
    out.push('\n');
}
