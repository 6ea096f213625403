//! Prompt templates for agent orchestration
//!
//! Prompts are derived from the loaded contract so that limits, change
//! types and the multi-module scope the agents see are the ones the
//! validator enforces.

use crate::models::{Contract, ValidationResult};

/// Rules shared by every role
fn format_rules(contract: &Contract) -> String {
    let breaking = if contract.subject.allow_breaking {
        "Append `!` to the type for breaking changes (`feat!:`)."
    } else {
        "Breaking-change markers (`!`) are not allowed."
    };
    format!(
        r#"## Format Rules
- Change types: {types}
- {breaking}
- Titles are at most {title_max} characters, subjects at most {subject_max}.
- Wrap body lines at {body_max} characters.
- No trailing period on titles or subjects.
- Output only the commit message text. No greeting, no explanation, no code fence around the message."#,
        types = contract.subject.types.join(", "),
        breaking = breaking,
        title_max = contract.limits.title_max,
        subject_max = contract.limits.subject_max,
        body_max = contract.limits.body_max,
    )
}

/// Prompt for the agent writing the title and overall summary
pub fn top_level_prompt(contract: &Contract, multi_module: bool, payload: &str) -> String {
    let title_rule = if multi_module {
        format!(
            "Start with `# {scope}: <type>: <description>` summarizing the whole change set, then a short body.\nDo not write `## <module>` sections; other agents write those.",
            scope = contract.title.multi_module_scope
        )
    } else {
        "Start with `# <module>: <type>: <description>`, then a body explaining what changed and why.\nDo not add `## ` headings.".to_string()
    };

    format!(
        r#"You write git commit messages from staged changes.

## Task
{title_rule}

{rules}

{payload}"#,
        title_rule = title_rule,
        rules = format_rules(contract),
        payload = payload,
    )
}

/// Prompt for the agent writing one module's section
pub fn module_prompt(contract: &Contract, module: &str, payload: &str) -> String {
    format!(
        r#"You write one section of a git commit message, covering only module `{module}`.

## Task
Output exactly:

## {module}

{module}: <type>: <description>

<body explaining the change to {module}>

Describe only the files listed below.

{rules}

{payload}"#,
        module = module,
        rules = format_rules(contract),
        payload = payload,
    )
}

/// Prompt asking for a corrected full message
///
/// Built on the top-level prompt so the repair agent sees the same change
/// set, plus the rejected message and every violation found in it.
pub fn repair_prompt(
    top_level_prompt: &str,
    message: &str,
    result: &ValidationResult,
    affected_modules: &[String],
) -> String {
    let sections = if affected_modules.len() > 1 {
        format!(
            "Keep one `## <module>` section for each of: {}. Separate sections with `---`.",
            affected_modules.join(", ")
        )
    } else {
        "Keep it a single-module message without `## ` sections.".to_string()
    };

    format!(
        r#"{top_level_prompt}

## Rejected Message
````markdown
{message}````

## Violations
{violations}

## Repair Task
Rewrite the complete commit message so that every violation above is fixed.
{sections}
Output only the corrected message."#,
        top_level_prompt = top_level_prompt,
        message = message,
        violations = result.format_errors(),
        sections = sections,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationError;

    #[test]
    fn test_prompts_carry_contract_limits() {
        let contract = Contract::bundled();
        let prompt = top_level_prompt(&contract, true, "## Diff\n");
        assert!(prompt.contains("# multi-module: <type>: <description>"));
        assert!(prompt.contains("at most 72 characters"));
        assert!(prompt.contains("feat, fix"));
        assert!(prompt.ends_with("## Diff\n"));

        let single = top_level_prompt(&contract, false, "");
        assert!(single.contains("Do not add `## ` headings"));
    }

    #[test]
    fn test_module_prompt_names_module() {
        let prompt = module_prompt(&Contract::bundled(), "api", "payload");
        assert!(prompt.contains("## api\n\napi: <type>: <description>"));
    }

    #[test]
    fn test_repair_prompt_lists_violations() {
        let result = ValidationResult::new(vec![ValidationError::error(
            "subject-length",
            "Subject is 90 characters (max 72)",
            Some(7),
        )]);
        let modules = vec!["api".to_string(), "docs".to_string()];
        let prompt = repair_prompt("BASE", "# multi-module: fix: x\n", &result, &modules);
        assert!(prompt.starts_with("BASE"));
        assert!(prompt.contains("[subject-length]"));
        assert!(prompt.contains("api, docs"));
        assert!(prompt.contains("# multi-module: fix: x\n````"));
    }
}
