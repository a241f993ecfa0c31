//! Loading configuration files from disk and driving a run from them

use crate::helpers::test_harness::{expected, TestHarness};
use wordindex::config::{Config, IndexStrategy};
use wordindex::{IndexError, Pipeline};

const LEGACY_TUNING: &str = "indexing_threads=4\n\
                             merging_threads=1\n\
                             max_names_queue_size=16\n\
                             max_files_queue_size=8\n\
                             max_words_queue_size=8\n";

#[test]
fn test_legacy_config_drives_a_run() {
    let harness = TestHarness::new().unwrap();
    harness
        .create_test_file("in/a.txt", "The cat sat. The dog sat!")
        .unwrap();
    harness
        .create_zip("in/b.zip", &[("c.txt", "Cat cat bird")])
        .unwrap();

    let root = harness.path();
    let config_path = harness
        .create_test_file(
            "config.dat",
            format!(
                "indir=\"{}\"\nout_by_name=\"{}\"\nout_by_value=\"{}\"\n{}",
                root.join("in").display(),
                root.join("res/by_name.txt").display(),
                root.join("res/by_value.txt").display(),
                LEGACY_TUNING,
            ),
        )
        .unwrap();

    let config = Config::load(&config_path).unwrap();
    let paths = config.run_paths().unwrap();
    assert_eq!(config.indexer.indexing_threads, 4);

    let outcome = Pipeline::new(paths.indir.clone(), config.indexer.clone())
        .run()
        .unwrap();
    assert_eq!(
        outcome.counts,
        expected(&[("the", 2), ("cat", 3), ("sat", 2), ("dog", 1), ("bird", 1)])
    );

    outcome.write_reports(&paths).unwrap();
    assert_eq!(
        std::fs::read_to_string(&paths.out_by_name)
            .unwrap()
            .lines()
            .count(),
        5
    );
}

#[test]
fn test_missing_compulsory_key_is_reported() {
    let harness = TestHarness::new().unwrap();
    let config_path = harness
        .create_test_file(
            "config.dat",
            format!("out_by_name=a.txt\nout_by_value=b.txt\n{LEGACY_TUNING}"),
        )
        .unwrap();

    let err = Config::load(&config_path).unwrap_err();
    assert!(matches!(err, IndexError::Config(_)));
    assert!(err.to_string().contains("indir"));
}

#[test]
fn test_legacy_config_without_tuning_keys_is_rejected() {
    let harness = TestHarness::new().unwrap();
    let config_path = harness
        .create_test_file("config.dat", "indir=in\nout_by_name=a.txt\nout_by_value=b.txt\n")
        .unwrap();

    let err = Config::load(&config_path).unwrap_err();
    assert!(err.to_string().contains("indexing_threads"));
}

#[test]
fn test_toml_accepts_legacy_queue_keys() {
    let harness = TestHarness::new().unwrap();
    let config_path = harness
        .create_test_file(
            "wordindex.toml",
            "[paths]\nindir = \"in\"\nout_by_name = \"n.txt\"\nout_by_value = \"v.txt\"\n\n\
             [indexer]\nmax_files_queue_size = 7\nstrategy = \"merge\"\n",
        )
        .unwrap();

    let config = Config::load(&config_path).unwrap();
    assert_eq!(config.indexer.files_queue_capacity, 7);
    assert_eq!(config.indexer.strategy, IndexStrategy::Merge);
}

#[test]
fn test_invalid_range_is_rejected_on_load() {
    let harness = TestHarness::new().unwrap();
    let config_path = harness
        .create_test_file(
            "config.dat",
            format!(
                "indir=in\nout_by_name=a.txt\nout_by_value=b.txt\n{}",
                LEGACY_TUNING.replace("max_names_queue_size=16", "max_names_queue_size=0")
            ),
        )
        .unwrap();

    let err = Config::load(&config_path).unwrap_err();
    assert!(matches!(err, IndexError::Config(_)));
}

#[test]
fn test_init_template_round_trips() {
    let harness = TestHarness::new().unwrap();
    let path = harness.path().join("wordindex.toml");

    wordindex::commands::init::run(&path, false).unwrap();
    assert!(wordindex::commands::init::run(&path, false).is_err());
    wordindex::commands::init::run(&path, true).unwrap();

    let config = Config::load(&path).unwrap();
    assert!(config.run_paths().is_ok());
}
