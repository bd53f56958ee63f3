use std::path::PathBuf;

use proto_merge_core::{
    Exclusions, HeaderPolicy, MergeError, MergeRules, merge_documents, try_merge_documents,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fixture(module: &str, file: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(module)
        .join(file);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()))
}

fn measure_exclusions() -> Exclusions {
    Exclusions::new(
        [
            "DeleteExpiredSegmentsRequest",
            "DeleteExpiredSegmentsResponse",
            "InternalWriteRequest",
        ],
        ["DeleteExpiredSegments"],
    )
}

fn measure_docs(first: &str, second: &str) -> [String; 2] {
    [fixture("measure", first), fixture("measure", second)]
}

fn merged_measure() -> String {
    let docs = measure_docs("write.proto", "rpc.proto");
    let rules = MergeRules::default();
    merge_documents(&docs, "measure", &measure_exclusions(), &rules)
}

fn brace_balance(text: &str) -> i64 {
    text.chars().fold(0, |depth, ch| match ch {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}

// ---------------------------------------------------------------------------
// Full module merge
// ---------------------------------------------------------------------------

#[test]
fn test_measure_module_matches_expected() {
    assert_eq!(merged_measure(), fixture("measure", "expected.proto"));
}

#[test]
fn test_merge_is_deterministic() {
    assert_eq!(merged_measure(), merged_measure());
}

#[test]
fn test_merged_output_properties() {
    let merged = merged_measure();

    // Header appears once.
    assert_eq!(merged.matches("syntax = \"proto3\";").count(), 1);
    assert_eq!(merged.matches("package banyandb.measure.v1;").count(), 1);
    assert_eq!(merged.matches("option java_package").count(), 1);

    // Nothing the skip rules target survives.
    assert!(!merged.contains("go_package"));
    assert!(!merged.contains("openapiv2"));
    assert!(!merged.contains("google.api.http"));
    assert!(!merged.contains("google/api/annotations.proto"));

    // Excluded definitions are gone, including their bodies.
    assert!(!merged.contains("DeleteExpiredSegments"));
    assert!(!merged.contains("InternalWriteRequest"));
    assert!(!merged.contains("series_hash"));

    // No self import and no unrewritten module paths.
    assert!(!merged.contains("banyandb-measure.proto"));
    assert!(!merged.contains("banyandb/model/v1/"));

    assert_eq!(brace_balance(&merged), 0);
    assert!(!merged.contains("\n\n\n"));
    assert!(merged.ends_with("}\n"));
}

#[test]
fn test_document_order_controls_body_order() {
    let docs = measure_docs("rpc.proto", "write.proto");
    let rules = MergeRules::default();
    let merged = merge_documents(&docs, "measure", &measure_exclusions(), &rules);

    let service = merged.find("service MeasureService").unwrap();
    let message = merged.find("message DataPointValue").unwrap();
    assert!(service < message);
    // The header still comes from the first document.
    assert_eq!(merged.matches("package banyandb.measure.v1;").count(), 1);
}

#[test]
fn test_without_exclusions_internal_definitions_remain() {
    let docs = measure_docs("write.proto", "rpc.proto");
    let rules = MergeRules::default();
    let merged = merge_documents(&docs, "measure", &Exclusions::default(), &rules);

    assert!(merged.contains("message InternalWriteRequest {"));
    let rpc = "  rpc DeleteExpiredSegments(DeleteExpiredSegmentsRequest)";
    assert!(merged.contains(rpc));
    assert_eq!(brace_balance(&merged), 0);
}

// ---------------------------------------------------------------------------
// Header policy
// ---------------------------------------------------------------------------

#[test]
fn test_reject_policy_accepts_consistent_module() {
    let rules = MergeRules {
        header_policy: HeaderPolicy::Reject,
        ..MergeRules::default()
    };
    let docs = measure_docs("write.proto", "rpc.proto");
    let merged = try_merge_documents(&docs, "measure", &measure_exclusions(), &rules).unwrap();
    assert_eq!(merged, fixture("measure", "expected.proto"));
}

#[test]
fn test_reject_policy_refuses_mixed_packages() {
    let rules = MergeRules {
        header_policy: HeaderPolicy::Reject,
        ..MergeRules::default()
    };
    let rpc = fixture("measure", "rpc.proto");
    let foreign = rpc.replace("banyandb.measure.v1;", "banyandb.stream.v1;");
    let docs = [fixture("measure", "write.proto"), foreign];

    let err = try_merge_documents(&docs, "measure", &measure_exclusions(), &rules).unwrap_err();
    let MergeError::HeaderConflict {
        module,
        document,
        other,
        ..
    } = err;
    assert_eq!(module, "measure");
    assert_eq!(document, 1);
    assert_eq!(other, "package banyandb.stream.v1;");
}
