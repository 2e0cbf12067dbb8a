use super::*;

fn create_test_registry() -> Registry {
    let registry = Registry::new_custom(Some("calico".to_string()), None).unwrap();
    register_custom_metrics(&registry);
    registry
}

#[test]
fn test_custom_registry() {
    let registry = create_test_registry();

    ENDPOINT_UPDATES_METRIC.with_label_values(&["upsert"]).inc();
    let metrics = &registry.gather();
    assert!(!metrics.is_empty());

    let metric_names: Vec<_> = metrics.iter().map(|m| m.get_name()).collect();
    assert!(
        metric_names.contains(&"calico_endpoint_updates_total"),
        "Missing calico_endpoint_updates_total"
    );
}

#[test]
fn test_counter_increment() {
    let before = IGNORED_EVENTS_METRIC.with_label_values(&["test-action"]).get();

    IGNORED_EVENTS_METRIC.with_label_values(&["test-action"]).inc();
    IGNORED_EVENTS_METRIC.with_label_values(&["test-action"]).inc();

    let value = IGNORED_EVENTS_METRIC.with_label_values(&["test-action"]).get();
    assert_eq!(value, before + 2, "Counter should increment correctly");
}

#[test]
fn test_gather_text_exposes_counters() {
    LABEL_MERGE_CONFLICTS_METRIC.inc();
    let text = gather_text();
    assert!(text.contains("label_merge_conflicts_total"));
}
