use crate::error::ContractError;
use crate::models::{Contract, ValidationError, ValidationResult};
use crate::parser::classify::{
    heading_module_name, is_blank, is_module_heading, is_separator, list_item_prefix,
    parse_subject, FenceTracker, Subject,
};
use std::collections::BTreeMap;

/// Rule ids this validator knows how to enforce
pub const IMPLEMENTED_RULES: &[&str] = &[
    "title",
    "line-length",
    "module-sections",
    "code-fence",
    "trailing-marker",
];

/// Checks a finished commit message against a [`Contract`]
#[derive(Debug, Clone)]
pub struct ContractValidator {
    contract: Contract,
}

/// Line-indexed view of the message, shared by all rules
struct Message<'a> {
    lines: Vec<&'a str>,
    /// True for fence lines and everything between them
    fenced: Vec<bool>,
    /// `## <module>` headings outside fences: (line index, module name)
    headings: Vec<(usize, String)>,
}

impl<'a> Message<'a> {
    fn new(text: &'a str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let mut fences = FenceTracker::default();
        let fenced: Vec<bool> = lines
            .iter()
            .map(|line| {
                let was_open = fences.is_open();
                fences.feed(line) || was_open
            })
            .collect();

        let headings = lines
            .iter()
            .enumerate()
            .filter(|(idx, line)| !fenced[*idx] && is_module_heading(line))
            .filter_map(|(idx, line)| heading_module_name(line).map(|name| (idx, name)))
            .collect();

        Self {
            lines,
            fenced,
            headings,
        }
    }

    fn title_index(&self) -> Option<usize> {
        self.lines.iter().position(|l| !is_blank(l))
    }

    /// Line range of the section opened by heading number `n`
    fn section_range(&self, n: usize) -> std::ops::Range<usize> {
        let start = self.headings[n].0;
        let end = self
            .headings
            .get(n + 1)
            .map(|(idx, _)| *idx)
            .unwrap_or(self.lines.len());
        start..end
    }
}

impl ContractValidator {
    /// Fails when the contract names a rule this validator lacks
    pub fn new(contract: &Contract) -> Result<Self, ContractError> {
        contract.check_rules(IMPLEMENTED_RULES)?;
        Ok(Self {
            contract: contract.clone(),
        })
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Validate `text` for a change touching `affected_modules`
    pub fn validate(&self, text: &str, affected_modules: &[String]) -> ValidationResult {
        if text.trim().is_empty() {
            return ValidationResult::new(vec![ValidationError::error(
                "empty-message",
                "Commit message is empty",
                None,
            )]);
        }

        let message = Message::new(text);
        let mut errors = Vec::new();

        if self.contract.has_rule("title") {
            errors.extend(self.check_title(&message, affected_modules));
        }
        if self.contract.has_rule("line-length") {
            errors.extend(self.check_line_lengths(&message));
        }
        if self.contract.has_rule("module-sections") {
            errors.extend(self.check_module_sections(&message, affected_modules));
        }
        if self.contract.has_rule("code-fence") {
            errors.extend(check_fences(&message));
        }
        if self.contract.has_rule("trailing-marker") {
            errors.extend(self.check_trailing_markers(&message));
        }

        errors.sort_by_key(|e| e.line.unwrap_or(0));
        ValidationResult::new(errors)
    }

    fn check_title(&self, message: &Message, affected: &[String]) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let Some(idx) = message.title_index() else {
            return errors;
        };
        let line_no = Some(idx + 1);
        let title = message.lines[idx].trim_end();

        let Some(rest) = title.strip_prefix("# ") else {
            errors.push(ValidationError::error(
                "title-missing",
                "Message must start with a '# <scope>: <type>: <description>' title",
                line_no,
            ));
            return errors;
        };

        let Some(subject) = parse_subject(rest.trim_start()) else {
            errors.push(ValidationError::error(
                "title-format",
                format!("Title '{}' does not match '# <scope>: <type>: <description>'", title),
                line_no,
            ));
            return errors;
        };
        if let Some(problem) = self.subject_problem(&subject) {
            errors.push(ValidationError::error("title-format", problem, line_no));
        }

        let expected_scope = match affected {
            [] => None,
            [single] => Some(single.as_str()),
            _ => Some(self.contract.title.multi_module_scope.as_str()),
        };
        if let Some(expected) = expected_scope {
            if subject.module != expected {
                errors.push(ValidationError::warning(
                    "title-scope-mismatch",
                    format!("Title scope is '{}', expected '{}'", subject.module, expected),
                    line_no,
                ));
            }
        }

        if title.ends_with('.') && !title.ends_with("...") {
            errors.push(ValidationError::warning(
                "title-trailing-period",
                "Title should not end with a period",
                line_no,
            ));
        }
        errors
    }

    /// Type and breaking-marker problems shared by titles and subjects
    fn subject_problem(&self, subject: &Subject) -> Option<String> {
        let rules = &self.contract.subject;
        if !rules.types.iter().any(|t| *t == subject.change_type) {
            return Some(format!(
                "Unknown change type '{}' (allowed: {})",
                subject.change_type,
                rules.types.join(", ")
            ));
        }
        if subject.breaking && !rules.allow_breaking {
            return Some("Breaking-change marker '!' is not allowed".to_string());
        }
        None
    }

    fn check_line_lengths(&self, message: &Message) -> Vec<ValidationError> {
        let limits = &self.contract.limits;
        let title_idx = message.title_index();
        let mut errors = Vec::new();

        for (idx, line) in message.lines.iter().enumerate() {
            if message.fenced[idx] {
                continue;
            }
            let len = line.chars().count();
            let line_no = Some(idx + 1);

            if Some(idx) == title_idx && line.starts_with("# ") {
                if len > limits.title_max {
                    errors.push(ValidationError::error(
                        "title-length",
                        format!("Title is {} characters (max {})", len, limits.title_max),
                        line_no,
                    ));
                }
                continue;
            }

            if parse_subject(line).is_some() {
                if len > limits.subject_max {
                    errors.push(ValidationError::error(
                        "subject-length",
                        format!("Subject is {} characters (max {})", len, limits.subject_max),
                        line_no,
                    ));
                }
                continue;
            }

            if len > limits.body_max {
                let content = match list_item_prefix(line) {
                    Some(prefix) => &line[prefix..],
                    None => line.trim_start(),
                };
                if content.contains(char::is_whitespace) {
                    errors.push(ValidationError::error(
                        "body-line-length",
                        format!("Line is {} characters (max {})", len, limits.body_max),
                        line_no,
                    ));
                } else {
                    errors.push(ValidationError::warning(
                        "body-unbreakable-line",
                        format!(
                            "Line is {} characters (max {}) and has no break point",
                            len, limits.body_max
                        ),
                        line_no,
                    ));
                }
            }
        }
        errors
    }

    fn check_module_sections(&self, message: &Message, affected: &[String]) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if affected.len() <= 1 {
            for (idx, name) in &message.headings {
                errors.push(ValidationError::warning(
                    "module-section-unexpected",
                    format!("Single-module message should not have a '## {}' section", name),
                    Some(idx + 1),
                ));
            }
            return errors;
        }

        let mut by_module: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (n, (_, name)) in message.headings.iter().enumerate() {
            by_module.entry(name.as_str()).or_default().push(n);
        }

        for module in affected {
            match by_module.get(module.as_str()).map(Vec::as_slice) {
                None | Some([]) => errors.push(ValidationError::error(
                    "module-section-missing",
                    format!("Missing '## {}' section", module),
                    None,
                )),
                Some([first, rest @ ..]) => {
                    for dup in rest {
                        errors.push(ValidationError::error(
                            "module-section-duplicate",
                            format!("Module '{}' has more than one section", module),
                            Some(message.headings[*dup].0 + 1),
                        ));
                    }
                    errors.extend(self.check_section_body(message, *first, module));
                }
            }
        }

        for (idx, name) in &message.headings {
            if !affected.iter().any(|m| m == name) {
                errors.push(ValidationError::warning(
                    "module-section-unexpected",
                    format!("Section '## {}' is not an affected module", name),
                    Some(idx + 1),
                ));
            }
        }
        errors
    }

    /// Subject line and body of heading number `n`
    fn check_section_body(&self, message: &Message, n: usize, module: &str) -> Vec<ValidationError> {
        let range = message.section_range(n);
        let heading_line = range.start + 1;
        let mut errors = Vec::new();

        let subject_idx = (range.start + 1..range.end).find(|&i| !is_blank(message.lines[i]));
        let subject = subject_idx
            .filter(|&i| !message.fenced[i])
            .and_then(|i| parse_subject(message.lines[i]).map(|s| (i, s)));

        let Some((idx, subject)) = subject else {
            errors.push(ValidationError::error(
                "module-subject-missing",
                format!(
                    "Section '## {}' must start with '{}: <type>: <description>'",
                    module, module
                ),
                Some(subject_idx.map_or(heading_line, |i| i + 1)),
            ));
            return errors;
        };

        if subject.module != module {
            errors.push(ValidationError::error(
                "module-subject-format",
                format!("Subject names '{}' inside the '{}' section", subject.module, module),
                Some(idx + 1),
            ));
        } else if let Some(problem) = self.subject_problem(&subject) {
            errors.push(ValidationError::error("module-subject-format", problem, Some(idx + 1)));
        }

        // Body: prose after the subject paragraph, fenced blocks excluded
        let after_subject = (idx + 1..range.end)
            .skip_while(|&i| !is_blank(message.lines[i]) && !message.fenced[i])
            .any(|i| !message.fenced[i] && !is_blank(message.lines[i]) && !is_separator(message.lines[i]));
        if !after_subject {
            errors.push(ValidationError::warning(
                "module-body-missing",
                format!("Section '## {}' has no description beyond its subject", module),
                Some(heading_line),
            ));
        }
        errors
    }

    fn check_trailing_markers(&self, message: &Message) -> Vec<ValidationError> {
        let markers = &self.contract.trailing_markers;
        if markers.is_empty() {
            return Vec::new();
        }

        let lines: Vec<(usize, &str)> = message
            .lines
            .iter()
            .enumerate()
            .filter(|(_, l)| !is_blank(l))
            .map(|(idx, l)| (idx, *l))
            .collect();
        let tail = &lines[lines.len().saturating_sub(markers.len())..];
        // Markers beyond the message length have no line to sit on
        let offset = markers.len() - tail.len();

        let mut errors = Vec::new();
        for (pos, marker) in markers.iter().enumerate() {
            let present = pos >= offset && tail[pos - offset].1.contains(marker.as_str());
            if !present {
                errors.push(ValidationError::error(
                    "trailing-marker-missing",
                    format!("Message must end with '{}'", marker),
                    tail.last().map(|(idx, _)| idx + 1),
                ));
            }
        }
        errors
    }
}

fn check_fences(message: &Message) -> Vec<ValidationError> {
    let mut fences = FenceTracker::default();
    let mut open: Option<usize> = None;
    for (idx, line) in message.lines.iter().enumerate() {
        if fences.feed(line) {
            open = fences.is_open().then_some(idx);
        }
    }
    match open {
        Some(idx) => vec![ValidationError::error(
            "unbalanced-fence",
            "Code fence is opened but never closed",
            Some(idx + 1),
        )],
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ContractValidator {
        ContractValidator::new(&Contract::bundled()).unwrap()
    }

    fn modules(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    const TWO_MODULES: &str = "\
# multi-module: feat: add search

Adds search across the stack.

---

## api

api: feat: add search endpoint

Exposes GET /search.

---

## web

web: feat: add search box

Calls the new endpoint.
";

    #[test]
    fn test_clean_multi_module_message() {
        let result = validator().validate(TWO_MODULES, &modules(&["api", "web"]));
        assert!(result.is_valid(), "{}", result.format_errors());
        assert!(!result.has_issues());
    }

    #[test]
    fn test_empty_message() {
        let result = validator().validate("  \n", &modules(&["api"]));
        assert!(result.has_code("empty-message"));
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_title_missing_and_format() {
        let result = validator().validate("api: feat: no title\n", &modules(&["api"]));
        assert!(result.has_code("title-missing"));

        let result = validator().validate("# Add a thing\n", &modules(&["api"]));
        assert!(result.has_code("title-format"));

        let result = validator().validate("# api: feature: add\n", &modules(&["api"]));
        assert!(result.has_code("title-format"));
    }

    #[test]
    fn test_title_scope_and_period_are_warnings() {
        let result = validator().validate("# web: fix: wrong scope.\n", &modules(&["api"]));
        assert!(result.is_valid());
        assert!(result.has_code("title-scope-mismatch"));
        assert!(result.has_code("title-trailing-period"));
    }

    #[test]
    fn test_line_lengths() {
        let long_subject = format!("api: feat: {}", "x ".repeat(40));
        let long_body = "word ".repeat(20);
        let url = format!("https://example.com/{}", "a".repeat(80));
        let text = format!(
            "# multi-module: feat: x\n\n{long_body}\n\n{url}\n\n---\n\n## api\n\n{long_subject}\n\nBody.\n\n```\n{}\n```\n\n---\n\n## web\n\nweb: fix: y\n\nBody.\n",
            "z".repeat(100)
        );
        let result = validator().validate(&text, &modules(&["api", "web"]));
        assert!(result.has_code("subject-length"));
        assert!(result.has_code("body-line-length"));
        assert!(result.has_code("body-unbreakable-line"));
        assert_eq!(result.blocking().len(), 2, "{}", result.format_errors());
    }

    #[test]
    fn test_missing_duplicate_and_unexpected_sections() {
        let text = "# multi-module: fix: x\n\n## api\n\napi: fix: a\n\nBody.\n\n## api\n\napi: fix: b\n\nBody.\n\n## web\n\nweb: fix: c\n\nBody.\n";
        let result = validator().validate(text, &modules(&["api", "docs"]));
        assert!(result.has_code("module-section-missing"));
        assert!(result.has_code("module-section-duplicate"));
        assert!(result.has_code("module-section-unexpected"));
        assert_eq!(result.blocking().len(), 2);
    }

    #[test]
    fn test_module_subject_checks() {
        let text = "# multi-module: fix: x\n\n## api\n\nSome prose first.\n\n## web\n\napi: fix: wrong module\n\nBody.\n";
        let result = validator().validate(text, &modules(&["api", "web"]));
        assert!(result.has_code("module-subject-missing"));
        assert!(result.has_code("module-subject-format"));
    }

    #[test]
    fn test_stub_like_section_warns() {
        let text = "# multi-module: fix: x\n\nSummary.\n\n---\n\n## api\n\napi: fix: a\n\nBody.\n\n---\n\n## docs\n\ndocs: chore: update guide.md\n\n```diff\n+b\n```\n";
        let result = validator().validate(text, &modules(&["api", "docs"]));
        assert!(result.is_valid(), "{}", result.format_errors());
        assert!(result.has_code("module-body-missing"));
        assert_eq!(result.warnings().len(), 1);
    }

    #[test]
    fn test_single_module_headings_are_unexpected() {
        let text = "# api: fix: x\n\n## api\n\nBody.\n";
        let result = validator().validate(text, &modules(&["api"]));
        assert!(result.is_valid());
        assert!(result.has_code("module-section-unexpected"));
    }

    #[test]
    fn test_unbalanced_fence() {
        let text = "# api: fix: x\n\n```diff\n+a\n";
        let result = validator().validate(text, &modules(&["api"]));
        let fence = result
            .errors
            .iter()
            .find(|e| e.code == "unbalanced-fence")
            .unwrap();
        assert_eq!(fence.line, Some(3));
    }

    #[test]
    fn test_shorter_fence_inside_longer_one() {
        let text = format!(
            "# api: fix: x\n\n````diff\n ```bash\n {}\n ```\n+a\n````\n",
            "cargo ".repeat(20)
        );
        let result = validator().validate(&text, &modules(&["api"]));
        assert!(!result.has_code("unbalanced-fence"), "{}", result.format_errors());
        assert!(!result.has_code("body-line-length"), "{}", result.format_errors());
    }

    #[test]
    fn test_fenced_lines_exempt_from_length() {
        let text = format!("# api: fix: x\n\n```\n{}\n```\n", "long ".repeat(30));
        let result = validator().validate(&text, &modules(&["api"]));
        assert!(!result.has_issues(), "{}", result.format_errors());
    }

    #[test]
    fn test_trailing_marker() {
        let contract = Contract::from_yaml(
            "version: 1.0.0\ntrailing_markers: ['Generated-by: modcommit']\nrules: [trailing-marker]\n",
        )
        .unwrap();
        let validator = ContractValidator::new(&contract).unwrap();
        assert!(validator
            .validate("# api: fix: x\n\nGenerated-by: modcommit\n", &[])
            .is_valid());
        assert!(validator
            .validate("# api: fix: x\n\nbody\n", &[])
            .has_code("trailing-marker-missing"));
    }

    #[test]
    fn test_rules_not_in_contract_are_skipped() {
        let contract = Contract::from_yaml("version: 1.0.0\nrules: [code-fence]\n").unwrap();
        let validator = ContractValidator::new(&contract).unwrap();
        assert!(validator.validate("no title here\n", &[]).is_valid());
    }

    #[test]
    fn test_unknown_rule_fails_construction() {
        let contract = Contract::from_yaml("version: 1.0.0\nrules: [title, emoji]\n").unwrap();
        assert!(matches!(
            ContractValidator::new(&contract),
            Err(ContractError::UnsupportedRules(_))
        ));
    }
}
