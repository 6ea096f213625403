//! Section combiner: merges top-level and per-module agent output into one
//! draft with exactly one section per affected module
//!
//! Precedence for a module's section, first match wins:
//! 1. the module agent's own `## <module>` section
//! 2. a heading-less module reply whose first line is that module's subject
//! 3. a `## <module>` section the top-level agent wrote
//! 4. a synthesized stub built from the module's diff

use crate::context::split_diff;
use crate::models::{CommitMessageDraft, DiffContext, Section};
use crate::parser::classify::{is_blank, parse_subject, Fence};

/// Diff lines quoted in a stub section
const STUB_DIFF_LINES: usize = 10;

/// Width budget for the file list in a stub subject
const STUB_FILES_WIDTH: usize = 40;

/// Build the draft for `ctx` from sanitized agent texts
///
/// `module_texts` pairs a module name with its agent's sanitized reply. For
/// single-module changes every `## ` section is folded into the top-level
/// body and module replies are ignored.
pub fn combine(
    ctx: &DiffContext,
    top_text: &str,
    module_texts: &[(String, String)],
) -> CommitMessageDraft {
    let top = CommitMessageDraft::parse(top_text);

    if !ctx.is_multi_module() {
        return fold_single_module(&top);
    }

    for section in top.module_sections() {
        let name = section.module_name.as_deref().unwrap_or_default();
        if !ctx.affected_modules.iter().any(|m| m == name) {
            tracing::warn!(module = name, "dropping section for unaffected module");
        }
    }

    let mut draft = CommitMessageDraft::new(top.top_level().body.clone());
    for module in &ctx.affected_modules {
        let own = module_texts
            .iter()
            .find(|(name, _)| name == module)
            .and_then(|(_, text)| section_from_reply(module, text));

        let section = match own {
            Some(section) => section,
            None => match top.module_section(module) {
                Some(section) => {
                    tracing::debug!(module = %module, "using section from top-level reply");
                    Section::module(module.clone(), section.body.clone())
                }
                None => {
                    tracing::info!(module = %module, "no section generated, synthesizing stub");
                    stub_section(ctx, module)
                }
            },
        };
        draft.push_module(section);
    }
    draft
}

/// The module's section from its own agent reply, if the reply has one
fn section_from_reply(module: &str, text: &str) -> Option<Section> {
    let reply = CommitMessageDraft::parse(text);
    if let Some(section) = reply.module_section(module) {
        return Some(Section::module(module, section.body.clone()));
    }

    let body = reply.top_level().body.as_str();
    let first = body.lines().find(|l| !is_blank(l))?;
    let subject = parse_subject(first)?;
    if subject.module != module {
        tracing::debug!(module, found = %subject.module, "module reply names another module");
        return None;
    }
    Some(Section::module(module, format!("## {}\n\n{}", module, body)))
}

/// Single-module messages carry no `## ` headings
fn fold_single_module(top: &CommitMessageDraft) -> CommitMessageDraft {
    let mut parts: Vec<String> = vec![top.top_level().body.clone()];
    for section in top.module_sections() {
        let body: Vec<&str> = section.body.lines().skip(1).collect();
        let body = body.join("\n");
        let body = body.trim_matches('\n');
        if !body.trim().is_empty() {
            parts.push(body.to_string());
        }
    }
    let parts: Vec<&str> = parts
        .iter()
        .map(|p| p.trim_matches('\n'))
        .filter(|p| !p.trim().is_empty())
        .collect();
    CommitMessageDraft::new(parts.join("\n\n"))
}

/// Placeholder section built from the module's own diff
pub fn stub_section(ctx: &DiffContext, module: &str) -> Section {
    let files = ctx.files_for(module);
    let mut body = format!(
        "## {module}\n\n{module}: chore: update {}",
        summarize_files(&files)
    );

    let chunks = split_diff(&ctx.unified_diff);
    let diff_lines: Vec<&str> = chunks
        .iter()
        .filter(|chunk| files.contains(&chunk.path))
        .flat_map(|chunk| chunk.text.lines())
        .take(STUB_DIFF_LINES)
        .collect();

    if !diff_lines.is_empty() {
        let excerpt = diff_lines.join("\n");
        // Longer than any backtick run in the excerpt so quoted fences stay inside
        let fence = Fence::backticks_around(&excerpt).delimiter();
        body.push_str(&format!("\n\n{fence}diff\n{excerpt}\n{fence}"));
    }
    Section::stub(module, body)
}

fn summarize_files(files: &[String]) -> String {
    if files.is_empty() {
        return "files".to_string();
    }
    let joined = files.join(", ");
    if joined.chars().count() <= STUB_FILES_WIDTH {
        return joined;
    }
    let cut: String = joined.chars().take(STUB_FILES_WIDTH - 3).collect();
    format!("{}...", cut.trim_end_matches([',', ' ']))
}
