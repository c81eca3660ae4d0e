mod support;

use std::collections::HashSet;
use std::sync::Arc;

use metrics_util::debugging::DebuggingRecorder;

use bazaar::application::pagination::PageRequest;
use bazaar::domain::types::{ItemChange, SortOption};

use support::{FailingBackend, Harness};

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // Miss, then hit, on the memory backend; warm-up and invalidation timings.
    let harness = Harness::in_memory();
    let kitchen = harness.repo.seed_category("Kitchen").await;
    let kettle = harness.repo.seed_item("Kettle", 1500, &kitchen).await;
    for _ in 0..2 {
        harness
            .catalog
            .items_list(SortOption::PriceDesc, PageRequest::new(20, 20))
            .await
            .expect("items");
    }
    harness.orchestrator.warm_up().await.expect("warm-up");
    let report = harness
        .orchestrator
        .on_item_mutated(&kettle, ItemChange::Created)
        .await;
    assert!(report.is_clean());

    // Write errors against a dead backend.
    let broken = Harness::new(Arc::new(FailingBackend::default()));
    broken.repo.seed_category("Garden").await;
    broken.catalog.category_list().await.expect("categories");

    let entries = snapshotter.snapshot().into_vec();
    let names: HashSet<String> = entries
        .iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "bazaar_cache_hit_total",
        "bazaar_cache_miss_total",
        "bazaar_cache_write_error_total",
        "bazaar_cache_warm_ms",
        "bazaar_cache_invalidate_ms",
    ];
    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }

    let views: HashSet<(String, String)> = entries
        .iter()
        .filter(|(composite_key, _, _, _)| composite_key.key().name().ends_with("_total"))
        .flat_map(|(composite_key, _, _, _)| {
            let name = composite_key.key().name().to_string();
            composite_key
                .key()
                .labels()
                .filter(|label| label.key() == "view")
                .map(move |label| (name.clone(), label.value().to_string()))
                .collect::<Vec<_>>()
        })
        .collect();
    assert!(views.contains(&("bazaar_cache_hit_total".into(), "all_items".into())));
    assert!(views.contains(&(
        "bazaar_cache_write_error_total".into(),
        "all_categories".into()
    )));
}
