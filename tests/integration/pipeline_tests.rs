//! End-to-end runs of the indexing pipeline over temporary trees

use crate::helpers::test_harness::{expected, TestHarness};
use wordindex::config::{IndexStrategy, IndexerConfig, RunPaths};
use wordindex::indexing::ProcessingStage;

fn sample_tree() -> TestHarness {
    let harness = TestHarness::new().unwrap();
    harness
        .create_test_file("a.txt", "The cat sat. The dog sat!")
        .unwrap();
    harness
        .create_zip("nested/b.zip", &[("c.txt", "Cat cat bird")])
        .unwrap();
    harness
}

fn sample_counts() -> std::collections::HashMap<String, u64> {
    expected(&[("the", 2), ("cat", 3), ("sat", 2), ("dog", 1), ("bird", 1)])
}

#[test]
fn test_text_and_archive_are_counted() {
    let harness = sample_tree();
    let outcome = harness
        .run(TestHarness::settings(2, IndexStrategy::Shared))
        .unwrap();

    assert_eq!(outcome.counts, sample_counts());
    assert_eq!(outcome.stats.units_indexed, 2);
    assert_eq!(outcome.stats.words_counted, 9);
    assert!(!outcome.errors.has_errors());
}

#[test]
fn test_thread_count_does_not_change_result() {
    let harness = sample_tree();
    for i in 0..20 {
        harness
            .create_test_file(&format!("bulk/{i}.txt"), "alpha beta beta gamma's")
            .unwrap();
    }

    let single = harness
        .counts(TestHarness::settings(1, IndexStrategy::Shared))
        .unwrap();
    let many = harness
        .counts(TestHarness::settings(8, IndexStrategy::Shared))
        .unwrap();

    assert_eq!(single, many);
    assert_eq!(single["beta"], 40);
    assert_eq!(single["gamma's"], 20);
}

#[test]
fn test_merge_strategy_matches_shared() {
    let harness = sample_tree();
    for i in 0..10 {
        harness
            .create_test_file(&format!("more/{i}.txt"), "one two two")
            .unwrap();
    }

    let shared = harness
        .counts(TestHarness::settings(4, IndexStrategy::Shared))
        .unwrap();
    let merged = harness
        .run(IndexerConfig {
            merging_threads: 2,
            words_queue_capacity: 2,
            ..TestHarness::settings(4, IndexStrategy::Merge)
        })
        .unwrap();

    assert_eq!(merged.counts, shared);
    assert_eq!(merged.stats.partials_merged, 12);
}

#[test]
fn test_size_threshold_is_exclusive() {
    let harness = TestHarness::new().unwrap();
    // 16 bytes each
    harness.create_test_file("at.txt", "exact exact exac").unwrap();
    // 15 bytes
    harness.create_test_file("under.txt", "under under und").unwrap();

    let outcome = harness
        .run(IndexerConfig {
            max_file_size: 16,
            ..IndexerConfig::default()
        })
        .unwrap();

    assert_eq!(outcome.counts, expected(&[("under", 2), ("und", 1)]));
    assert_eq!(outcome.stats.files_skipped_oversize, 1);
    assert_eq!(outcome.stats.files_enumerated, 1);
}

#[test]
fn test_unsupported_files_are_ignored() {
    let harness = TestHarness::new().unwrap();
    harness.create_test_file("notes.md", "ignored words").unwrap();
    harness.create_test_file("data.bin", [0u8, 159, 146, 150]).unwrap();
    harness.create_test_file("keep.TXT", "kept").unwrap();

    let counts = harness.counts(IndexerConfig::default()).unwrap();
    assert_eq!(counts, expected(&[("kept", 1)]));
}

#[test]
fn test_malformed_archive_is_skipped() {
    let harness = sample_tree();
    harness.create_test_file("broken.zip", "not a zip at all").unwrap();

    let outcome = harness
        .run(TestHarness::settings(3, IndexStrategy::Shared))
        .unwrap();

    assert_eq!(outcome.counts, sample_counts());
    assert_eq!(outcome.stats.unit_failures, 1);
    assert_eq!(outcome.errors.total_errors, 1);
    assert!(outcome.errors.by_stage.contains_key(&ProcessingStage::Decode));
}

#[test]
fn test_empty_tree_writes_empty_reports() {
    let harness = TestHarness::new().unwrap();
    std::fs::create_dir(harness.path().join("input")).unwrap();

    let outcome = wordindex::Pipeline::new(harness.path().join("input"), IndexerConfig::default())
        .run()
        .unwrap();
    assert!(outcome.counts.is_empty());

    let paths = RunPaths {
        indir: harness.path().join("input"),
        out_by_name: harness.path().join("out/by_name.txt"),
        out_by_value: harness.path().join("out/by_value.txt"),
    };
    outcome.write_reports(&paths).unwrap();
    assert_eq!(std::fs::read_to_string(&paths.out_by_name).unwrap(), "");
    assert_eq!(std::fs::read_to_string(&paths.out_by_value).unwrap(), "");
}

#[test]
fn test_reports_are_sorted() {
    let harness = sample_tree();
    let outcome = harness.run(IndexerConfig::default()).unwrap();

    let out_dir = tempfile::tempdir().unwrap();
    let paths = RunPaths {
        indir: harness.path().to_path_buf(),
        out_by_name: out_dir.path().join("by_name.txt"),
        out_by_value: out_dir.path().join("by_value.txt"),
    };
    outcome.write_reports(&paths).unwrap();

    let words = |path: &std::path::Path| -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| line.split_whitespace().next().unwrap().to_string())
            .collect()
    };

    assert_eq!(
        words(&paths.out_by_name),
        vec!["bird", "cat", "dog", "sat", "the"]
    );
    assert_eq!(
        words(&paths.out_by_value),
        vec!["bird", "dog", "sat", "the", "cat"]
    );

    let by_value = std::fs::read_to_string(&paths.out_by_value).unwrap();
    let last = by_value.lines().last().unwrap();
    assert!(last.starts_with("cat"));
    assert!(last.trim_end().ends_with('3'));
}

#[cfg(unix)]
#[test]
fn test_symlinked_oversize_file_is_skipped() {
    let outside = tempfile::tempdir().unwrap();
    let target = outside.path().join("big.txt");
    std::fs::write(&target, "huge ".repeat(100)).unwrap();

    let harness = TestHarness::new().unwrap();
    harness.create_test_file("small.txt", "tiny").unwrap();
    std::os::unix::fs::symlink(&target, harness.path().join("link.txt")).unwrap();

    let outcome = harness
        .run(IndexerConfig {
            max_file_size: 100,
            ..IndexerConfig::default()
        })
        .unwrap();

    assert_eq!(outcome.counts, expected(&[("tiny", 1)]));
    assert_eq!(outcome.stats.files_skipped_oversize, 1);
}

#[cfg(unix)]
#[test]
fn test_broken_link_is_recorded_and_run_continues() {
    let harness = sample_tree();
    std::os::unix::fs::symlink(
        harness.path().join("deleted.txt"),
        harness.path().join("dangling.txt"),
    )
    .unwrap();

    let outcome = harness
        .run(TestHarness::settings(2, IndexStrategy::Shared))
        .unwrap();

    assert_eq!(outcome.counts, sample_counts());
    assert_eq!(outcome.stats.walk_errors, 1);
    let errors = &outcome.errors.by_stage[&ProcessingStage::Enumerate];
    assert_eq!(errors.len(), 1);
    assert!(errors[0].path.ends_with("dangling.txt"));
}
