//! End-to-end tests driving a pipeline the way `main` does: parse a TOML
//! config, validate it, resolve it against the stage registry, and run the
//! resulting `Sequence` against real queues.
//!
//! Grounded on `original_source/test/test_filters.py`'s
//! `FilterTests.create`/`waitForEmpty` pattern: wire a real input queue, push
//! events, stop, then assert on what landed in the output queue.

use cascadeflow::config::{load_config_from_string, validate_config};
use cascadeflow::core::queue::bounded;
use cascadeflow::core::stage::Stage;
use cascadeflow::stages::registry;

#[tokio::test]
async fn set_field_then_regex_extract_runs_in_declared_order() {
    let toml = r#"
        name = "pipeline-under-test"
        capacity = 16

        [[stage]]
        type = "set_field"
        name = "copy_raw"
        [stage.parameters]
        field_in = "raw"
        field_out = "line"

        [[stage]]
        type = "regex_extract"
        name = "split_line"
        [stage.parameters]
        field_in = "line"
        pattern = '(?P<host>\S+) - (?P<status>\d+)'
    "#;

    let config = load_config_from_string(toml).unwrap();
    validate_config(&config).unwrap();
    let mut pipeline = registry::build(&config).unwrap();

    let (terminal, mut terminal_consumer) = bounded(8);
    let input = pipeline.setup(terminal);
    pipeline.start().await.unwrap();

    let mut event = cascadeflow::core::event::Event::new();
    event.set_field("raw", "web-1 - 200");
    input.put(event).await.unwrap();

    pipeline.stop().await.unwrap();

    let received = terminal_consumer.get().await.unwrap();
    assert_eq!(received.get("host"), serde_json::json!("web-1"));
    assert_eq!(received.get("status"), serde_json::json!("200"));
    assert!(received.tags().is_empty());
}

#[tokio::test]
async fn unmatched_event_is_tagged_instead_of_dropped() {
    let toml = r#"
        name = "pipeline-under-test"

        [[stage]]
        type = "regex_extract"
        name = "split_line"
        on_error = "tag"
        [stage.parameters]
        field_in = "line"
        pattern = '^\d+$'
    "#;

    let config = load_config_from_string(toml).unwrap();
    validate_config(&config).unwrap();
    let mut pipeline = registry::build(&config).unwrap();

    let (terminal, mut terminal_consumer) = bounded(8);
    let input = pipeline.setup(terminal);
    pipeline.start().await.unwrap();

    let mut event = cascadeflow::core::event::Event::new();
    event.set_field("line", "not a number");
    input.put(event).await.unwrap();

    pipeline.stop().await.unwrap();

    let received = terminal_consumer.get().await.unwrap();
    assert_eq!(received.tags(), &["_unparsed".to_string()]);
}

#[tokio::test]
async fn unknown_error_policy_fails_validation_before_the_pipeline_runs() {
    let toml = r#"
        name = "bad"

        [[stage]]
        type = "log"
        on_error = "retry"
    "#;

    let config = load_config_from_string(toml).unwrap();
    assert!(validate_config(&config).is_err());
}

#[tokio::test]
async fn duplicate_stage_names_fail_validation() {
    let toml = r#"
        name = "bad"

        [[stage]]
        type = "log"
        name = "sink"

        [[stage]]
        type = "log"
        name = "sink"
    "#;

    let config = load_config_from_string(toml).unwrap();
    assert!(validate_config(&config).is_err());
}
