// Normalizer properties over a corpus of realistic agent output

use modcommit::formatter::{normalize, NormalizeOptions, Normalizer};
use modcommit::models::Contract;
use modcommit::parser::classify::FenceTracker;
use modcommit::validator::ContractValidator;

const CORPUS: &[&str] = &[
    "",
    "\n\n\n",
    "# api: feat: add endpoint.",
    "# multi-module: refactor: split the storage layer into separate read and write paths for clarity",
    "# api: fix: handle timeouts\n\n\n\nRetries now back off exponentially and give up after five attempts so that a stuck upstream no longer pins a worker forever.\n",
    "# multi-module: feat: add search\n---\n## api\napi: feat: add search endpoint with cursor pagination, stable ordering and typed filters.\nAdds GET /search.\n---\n## docs\ndocs: docs: describe search\n",
    "# api: fix: guard parser\n\n- reject empty input before tokenizing so the lexer never sees a zero-length buffer\n- keep the old error type\n  1. for callers\n",
    "# api: fix: x\n\n```rust\nfn main() {}\n",
    "# api: fix: x\n\n```\nlet a = 1;\n```\nafter the fence with a long line that needs wrapping because it goes past the limit\n",
    "# api: chore: bump\n\n| crate | from | to |\n|---|---|---|\n| tokio | 1.37 | 1.38 |\n\n> quoted note that is intentionally long and must survive untouched by the wrapping logic\n",
    "# api: fix: x\n\nBody.\n\nSigned-off-by: Dev <dev@example.com>\nRefs: #42\n",
    "---\n\n# api: fix: leading separator\n\n---\n",
    "## docs\n\ndocs: chore: update docs/usage.md\n\n````diff\n ```bash\n cargo run --release -- --config path/to/config.toml --verbose --flag value another\n ```\n+Run the binary.\n````\n",
    "# api: docs: x\n\n````md\n```\nunclosed\n",
    "#\nword\n# api: feat: add\n",
    "##\nword\n## api\n",
    "api:\nfeat: add x.\nmore text\n",
    "Signed-off-by:\nDev <dev@example.com>\n",
];

#[test]
fn test_normalize_is_idempotent() {
    for input in CORPUS {
        let once = normalize(input);
        assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
    }
}

#[test]
fn test_normalize_is_idempotent_at_narrow_width() {
    let normalizer = Normalizer::new(NormalizeOptions::with_max_line_length(30));
    for input in CORPUS {
        let once = normalizer.normalize(input);
        assert_eq!(normalizer.normalize(&once), once, "not idempotent for {input:?}");
    }
}

#[test]
fn test_fences_always_balanced() {
    for input in CORPUS {
        let out = normalize(input);
        let mut fences = FenceTracker::default();
        for line in out.lines() {
            fences.feed(line);
        }
        assert!(!fences.is_open(), "unclosed fence for {input:?}");
    }
}

#[test]
fn test_title_invariant() {
    let long = format!("# api: feat: {}", "extend ".repeat(12).trim_end());
    assert!(long.chars().count() > 72);
    let out = normalize(&long);
    let title = out.lines().next().unwrap();
    assert!(title.chars().count() <= 72);
    assert!(title.ends_with("..."));

    let short = "# api: feat: add endpoint.";
    assert_eq!(normalize(short), "# api: feat: add endpoint\n");
    assert!(!normalize("# api: feat: add endpoint").contains("..."));
}

#[test]
fn test_subject_words_survive_wrapping() {
    let subject = "api: feat: add search endpoint with cursor pagination, stable ordering and typed filters";
    let out = normalize(&format!("## api\n\n{}\n", subject));
    let wrapped: Vec<&str> = out.lines().skip(2).take_while(|l| !l.is_empty()).collect();
    assert!(wrapped.iter().all(|l| l.chars().count() <= 72));
    assert_eq!(wrapped.join(" "), subject);
}

#[test]
fn test_bare_hash_line_keeps_its_own_line() {
    let once = normalize("#\nword\n# api: feat: add\n");
    assert_eq!(once, "#\nword\n# api: feat: add\n");
    assert_eq!(normalize(&once), once);
}

#[test]
fn test_fence_closed_before_signature() {
    let normalizer = Normalizer::new(NormalizeOptions {
        signature: Some("Generated-by: modcommit".to_string()),
        ..NormalizeOptions::default()
    });
    let out = normalizer.normalize("# api: fix: x\n\n```sh\nmake test\n\nGenerated-by: modcommit\n");
    assert_eq!(
        out,
        "# api: fix: x\n\n```sh\nmake test\n```\n\nGenerated-by: modcommit\n"
    );
    assert_eq!(normalizer.normalize(&out), out);
}

#[test]
fn test_normalized_output_passes_length_rules() {
    let contract = Contract::bundled();
    let validator = ContractValidator::new(&contract).unwrap();
    let normalizer = Normalizer::new(NormalizeOptions::from_contract(&contract));

    let out = normalizer.normalize(CORPUS[4]);
    let result = validator.validate(&out, &["api".to_string()]);
    assert!(!result.has_code("body-line-length"), "{}", result.format_errors());
    assert!(result.is_valid(), "{}", result.format_errors());
}
