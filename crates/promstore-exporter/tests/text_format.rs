#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use promstore_core::{Command, InMemoryStore, MetricStorage, MetricType, UpdatePayload};
use promstore_exporter::exposition::render;

#[test]
fn renders_counter_gauge_histogram() {
    let store = InMemoryStore::new();
    store
        .update_counter(
            &UpdatePayload::new(MetricType::Counter, "test_some_counter", "it increases")
                .labels(["type"], ["blue"])
                .value(3.0),
        )
        .unwrap();
    store
        .update_gauge(
            &UpdatePayload::new(MetricType::Gauge, "test_some_gauge", "it sets")
                .labels(["type"], ["blue"])
                .command(Command::Set)
                .value(2.5),
        )
        .unwrap();
    store
        .update_histogram(
            &UpdatePayload::new(MetricType::Histogram, "test_some_histogram", "it observes")
                .labels(["type"], ["blue"])
                .buckets(vec![0.1, 1.0, 3.5])
                .value(3.5),
        )
        .unwrap();

    let text = render(&store.collect().unwrap());
    let expected = "\
# HELP test_some_counter it increases
# TYPE test_some_counter counter
test_some_counter{type=\"blue\"} 3
# HELP test_some_gauge it sets
# TYPE test_some_gauge gauge
test_some_gauge{type=\"blue\"} 2.5
# HELP test_some_histogram it observes
# TYPE test_some_histogram histogram
test_some_histogram_bucket{type=\"blue\",le=\"0.1\"} 0
test_some_histogram_bucket{type=\"blue\",le=\"1\"} 0
test_some_histogram_bucket{type=\"blue\",le=\"3.5\"} 1
test_some_histogram_bucket{type=\"blue\",le=\"+Inf\"} 1
test_some_histogram_count{type=\"blue\"} 1
test_some_histogram_sum{type=\"blue\"} 3.5
";
    assert_eq!(text, expected);
}

#[test]
fn escapes_label_values_and_help() {
    let store = InMemoryStore::new();
    store
        .update_counter(
            &UpdatePayload::new(MetricType::Counter, "odd_total", "line one\nline \\ two")
                .labels(["path"], ["a\"b\\c\nd"])
                .value(1.0),
        )
        .unwrap();
    store
        .update_gauge(&UpdatePayload::new(MetricType::Gauge, "plain", "").value(-0.5))
        .unwrap();

    let text = render(&store.collect().unwrap());
    assert!(text.contains("# HELP odd_total line one\\nline \\\\ two\n"));
    assert!(text.contains("odd_total{path=\"a\\\"b\\\\c\\nd\"} 1\n"));
    assert!(text.contains("\nplain -0.5\n"));
}
