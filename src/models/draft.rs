use crate::parser::classify::{
    heading_module_name, is_blank, is_module_heading, is_separator, FenceTracker,
};
use serde::{Deserialize, Serialize};

/// Which agent persona produced (or should produce) a text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Title + overall summary of the change set
    TopLevel,
    /// One `## <module>` section
    Module,
    /// Corrects a previously generated message
    Repair,
}

impl AgentRole {
    pub fn name(&self) -> &'static str {
        match self {
            AgentRole::TopLevel => "top_level",
            AgentRole::Module => "module",
            AgentRole::Repair => "repair",
        }
    }
}

/// Raw text returned by one agent invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentResponse {
    pub role: AgentRole,
    pub raw_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    TopLevel,
    Module,
}

/// One section of a commit message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub module_name: Option<String>,
    /// Section text; module sections include their `## ` heading
    pub body: String,
    /// Synthesized placeholder rather than agent output
    #[serde(default)]
    pub stub: bool,
}

impl Section {
    pub fn top_level(body: impl Into<String>) -> Self {
        Self {
            kind: SectionKind::TopLevel,
            module_name: None,
            body: body.into(),
            stub: false,
        }
    }

    pub fn module(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: SectionKind::Module,
            module_name: Some(name.into()),
            body: body.into(),
            stub: false,
        }
    }

    pub fn stub(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            stub: true,
            ..Self::module(name, body)
        }
    }
}

/// Ordered sections of the message being assembled or repaired
///
/// Holds exactly one top-level section followed by module sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMessageDraft {
    pub sections: Vec<Section>,
}

impl CommitMessageDraft {
    pub fn new(top_level: impl Into<String>) -> Self {
        Self {
            sections: vec![Section::top_level(top_level)],
        }
    }

    pub fn push_module(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub fn top_level(&self) -> &Section {
        &self.sections[0]
    }

    pub fn module_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.kind == SectionKind::Module)
    }

    pub fn module_section(&self, name: &str) -> Option<&Section> {
        self.module_sections()
            .find(|s| s.module_name.as_deref() == Some(name))
    }

    pub fn module_count(&self) -> usize {
        self.module_sections().count()
    }

    /// Join sections with a blank-line-delimited `---` separator
    pub fn render(&self) -> String {
        let bodies: Vec<&str> = self
            .sections
            .iter()
            .map(|s| s.body.trim_matches('\n'))
            .filter(|b| !b.trim().is_empty())
            .collect();

        let mut out = bodies.join("\n\n---\n\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Split rendered text back into sections at `## ` headings outside fences
    ///
    /// Every heading becomes a module section; callers decide which modules
    /// they accept.
    pub fn parse(text: &str) -> Self {
        let mut top: Vec<&str> = Vec::new();
        let mut modules: Vec<(String, Vec<&str>)> = Vec::new();
        let mut fences = FenceTracker::default();

        for line in text.lines() {
            let delimiter = fences.feed(line);
            if !delimiter && !fences.is_open() && is_module_heading(line) {
                if let Some(name) = heading_module_name(line) {
                    modules.push((name, vec![line]));
                    continue;
                }
            }
            match modules.last_mut() {
                Some((_, lines)) => lines.push(line),
                None => top.push(line),
            }
        }

        let mut draft = Self::new(trim_section(&top));
        for (name, lines) in modules {
            draft.push_module(Section::module(name, trim_section(&lines)));
        }
        draft
    }
}

/// Drop surrounding blank lines and trailing separators from a section
fn trim_section(lines: &[&str]) -> String {
    let mut end = lines.len();
    while end > 0 && (is_blank(lines[end - 1]) || is_separator(lines[end - 1])) {
        end -= 1;
    }
    let mut start = 0;
    while start < end && (is_blank(lines[start]) || is_separator(lines[start])) {
        start += 1;
    }
    lines[start..end].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_joins_with_separator() {
        let mut draft = CommitMessageDraft::new("# multi-module: feat: add search\n\nSummary.");
        draft.push_module(Section::module("api", "## api\n\napi: feat: add search endpoint"));
        draft.push_module(Section::module("web", "## web\n\nweb: feat: add search box\n"));

        let rendered = draft.render();
        assert_eq!(
            rendered,
            "# multi-module: feat: add search\n\nSummary.\n\n---\n\n## api\n\napi: feat: add search endpoint\n\n---\n\n## web\n\nweb: feat: add search box\n"
        );
        assert!(!rendered.trim_end().ends_with("---"));
    }

    #[test]
    fn test_parse_roundtrips_sections() {
        let text = "# multi-module: fix: x\n\nBody\n\n---\n\n## api\n\napi: fix: y\n\n---\n\n## docs\n\ndocs: docs: z\n";
        let draft = CommitMessageDraft::parse(text);
        assert_eq!(draft.sections.len(), 3);
        assert_eq!(draft.top_level().body, "# multi-module: fix: x\n\nBody");
        assert_eq!(draft.module_section("api").unwrap().body, "## api\n\napi: fix: y");
        assert_eq!(draft.module_section("docs").unwrap().body, "## docs\n\ndocs: docs: z");
        assert_eq!(draft.render(), text);
    }

    #[test]
    fn test_parse_ignores_headings_in_fences() {
        let text = "# api: feat: x\n\n```md\n## not a section\n```\n";
        let draft = CommitMessageDraft::parse(text);
        assert_eq!(draft.module_count(), 0);

        // A shorter run inside a longer fence does not close it
        let text = "# api: feat: x\n\n````md\n```\n## still quoted\n````\n\n## api\n\napi: feat: y\n";
        let draft = CommitMessageDraft::parse(text);
        assert_eq!(draft.module_count(), 1);
        assert!(draft.top_level().body.contains("## still quoted"));
    }

    #[test]
    fn test_render_skips_empty_top_level() {
        let mut draft = CommitMessageDraft::new("");
        draft.push_module(Section::stub("api", "## api\n\napi: chore: update a.rs"));
        assert_eq!(draft.render(), "## api\n\napi: chore: update a.rs\n");
        assert!(draft.module_section("api").unwrap().stub);
    }
}
