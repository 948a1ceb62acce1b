mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use asset_optimizer::{AssetOptimizer, FormatFilter, LedgerStore, OptimizeError, OptimizerConfig};
use common::*;

const DRAWABLE: &str = "app/src/main/res/drawable";

async fn run(
    root: &std::path::Path,
    config: OptimizerConfig,
    service: &Arc<MockService>,
) -> Result<asset_optimizer::OptimizationOutcome, OptimizeError> {
    AssetOptimizer::new(root, config, service.clone()).run().await
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let project = create_temp_project();
    let root = project.path();
    write_image(root, &format!("{}/a.png", DRAWABLE), 10_000);
    write_image(root, &format!("{}/b.jpg", DRAWABLE), 10_000);
    let service = Arc::new(MockService::new(0.6));

    let first = run(root, test_config(), &service).await.unwrap();
    assert_eq!(first.records.len(), 2);
    assert!(first.ledger_written);
    assert_eq!(first.before_size(), 20_000);
    assert_eq!(first.after_size(), 12_000);
    assert_eq!(service.optimize_calls(), 2);

    let second = run(root, test_config(), &service).await.unwrap();
    assert!(second.records.is_empty());
    assert!(!second.ledger_written);
    assert_eq!(service.optimize_calls(), 2);

    let ledger = LedgerStore::for_project(root).load().await;
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.total_saved(), 8_000);
    let record = ledger.get(&format!("{}/a.png", DRAWABLE)).unwrap();
    assert_eq!(record.before_size, 10_000);
    assert_eq!(record.after_size, 6_000);
}

#[tokio::test]
async fn test_modified_file_is_resubmitted_once() {
    let project = create_temp_project();
    let root = project.path();
    let a = write_image(root, &format!("{}/a.png", DRAWABLE), 10_000);
    write_image(root, &format!("{}/b.png", DRAWABLE), 10_000);
    let service = Arc::new(MockService::new(0.6));

    run(root, test_config(), &service).await.unwrap();
    let key = format!("{}/a.png", DRAWABLE);
    let old_fingerprint = LedgerStore::for_project(root).load().await.get(&key).unwrap().fingerprint.clone();

    touch_at(&a, 2_000_000_000);
    let second = run(root, test_config(), &service).await.unwrap();

    assert_eq!(service.optimize_calls(), 3);
    assert_eq!(second.records.len(), 1);
    assert_eq!(second.records[0].path, key);

    let ledger = LedgerStore::for_project(root).load().await;
    assert_eq!(ledger.len(), 2);
    assert_ne!(ledger.get(&key).unwrap().fingerprint, old_fingerprint);

    run(root, test_config(), &service).await.unwrap();
    assert_eq!(service.optimize_calls(), 3);
}

#[tokio::test]
async fn test_small_gain_leaves_file_untouched() {
    let project = create_temp_project();
    let root = project.path();
    let file = write_image(root, &format!("{}/a.png", DRAWABLE), 1_000);
    let service = Arc::new(MockService::new(0.95));
    let config = OptimizerConfig {
        skip_size: 100,
        ..test_config()
    };

    let outcome = run(root, config, &service).await.unwrap();

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.stats.files_discarded, 1);
    assert_eq!(std::fs::read(&file).unwrap(), vec![b'x'; 1_000]);
    assert!(!LedgerStore::for_project(root).path().exists());
}

#[tokio::test]
async fn test_grown_file_is_still_recorded() {
    let project = create_temp_project();
    let root = project.path();
    let file = write_image(root, &format!("{}/a.png", DRAWABLE), 1_000);
    let service = Arc::new(MockService::new(1.2));
    let config = OptimizerConfig {
        skip_size: 100,
        ..test_config()
    };

    let outcome = run(root, config, &service).await.unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].after_size, 1_200);
    assert_eq!(std::fs::metadata(&file).unwrap().len(), 1_200);
    assert_eq!(LedgerStore::for_project(root).load().await.len(), 1);
}

#[tokio::test]
async fn test_quota_exhaustion_keeps_partial_progress() {
    let project = create_temp_project();
    let root = project.path();
    for name in ["a1.png", "a2.png", "a3.png", "a4.png"] {
        write_image(root, &format!("A/{}", name), 10_000);
    }
    let b1 = write_image(root, "B/b1.png", 10_000);
    let service = Arc::new(MockService::new(0.5).with_quota_after(2));
    let config = OptimizerConfig {
        append_mode: false,
        resource_dirs: vec![PathBuf::from("A"), PathBuf::from("B")],
        ..test_config()
    };

    let outcome = run(root, config, &service).await.unwrap();

    assert!(outcome.quota_exhausted);
    assert_eq!(service.optimize_calls(), 3);
    let paths: Vec<_> = outcome.records.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["A/a1.png", "A/a2.png"]);

    let ledger = LedgerStore::for_project(root).load().await;
    assert_eq!(ledger.len(), 2);
    assert!(ledger.get("B/b1.png").is_none());
    assert_eq!(std::fs::metadata(&b1).unwrap().len(), 10_000);
}

#[tokio::test]
async fn test_failure_stops_only_current_directory() {
    let project = create_temp_project();
    let root = project.path();
    write_image(root, "A/a1.png", 10_000);
    let mut failing = FAIL_MARKER.to_vec();
    failing.resize(10_000, b'x');
    write_bytes(root, "A/a2.png", &failing);
    write_image(root, "A/a3.png", 10_000);
    write_image(root, "B/b1.png", 10_000);
    let service = Arc::new(MockService::new(0.5));
    let config = OptimizerConfig {
        append_mode: false,
        resource_dirs: vec![PathBuf::from("A"), PathBuf::from("B")],
        ..test_config()
    };

    let outcome = run(root, config, &service).await.unwrap();

    assert!(!outcome.quota_exhausted);
    assert_eq!(outcome.stats.errors, 1);
    assert_eq!(service.optimize_calls(), 3);
    let paths: Vec<_> = outcome.records.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["A/a1.png", "B/b1.png"]);
}

#[tokio::test]
async fn test_whitelisted_file_is_never_selected() {
    let project = create_temp_project();
    let root = project.path();
    let logo = write_image(root, &format!("{}/logo.png", DRAWABLE), 500_000);
    write_image(root, &format!("{}/other.png", DRAWABLE), 10_000);
    let service = Arc::new(MockService::new(0.5));
    let config = OptimizerConfig {
        white_list: vec!["logo.png".to_string()],
        ..test_config()
    };

    let outcome = run(root, config.clone(), &service).await.unwrap();
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].path, format!("{}/other.png", DRAWABLE));

    touch_at(&logo, 2_000_000_000);
    run(root, config, &service).await.unwrap();
    assert_eq!(service.optimize_calls(), 1);
    assert_eq!(std::fs::metadata(&logo).unwrap().len(), 500_000);
}

#[tokio::test]
async fn test_size_threshold_and_nine_patch_are_skipped() {
    let project = create_temp_project();
    let root = project.path();
    write_image(root, &format!("{}/tiny.png", DRAWABLE), 5 * 1024);
    write_image(root, &format!("{}/bubble.9.png", DRAWABLE), 50_000);
    write_image(root, &format!("{}/photo.JPG", DRAWABLE), 50_000);
    let service = Arc::new(MockService::new(0.5));

    let outcome = run(root, test_config(), &service).await.unwrap();

    assert_eq!(service.optimize_calls(), 1);
    assert_eq!(outcome.records[0].path, format!("{}/photo.JPG", DRAWABLE));
}

#[tokio::test]
async fn test_format_filter_limits_selection() {
    let project = create_temp_project();
    let root = project.path();
    write_image(root, &format!("{}/a.png", DRAWABLE), 10_000);
    write_image(root, &format!("{}/b.webp", DRAWABLE), 10_000);
    let service = Arc::new(MockService::new(0.5));
    let config = OptimizerConfig {
        support_format: FormatFilter::Webp,
        ..test_config()
    };

    let outcome = run(root, config, &service).await.unwrap();
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].path, format!("{}/b.webp", DRAWABLE));
}

#[tokio::test]
async fn test_exclusive_mode_without_dirs_is_a_configuration_error() {
    let project = create_temp_project();
    let root = project.path();
    write_image(root, &format!("{}/a.png", DRAWABLE), 10_000);
    let service = Arc::new(MockService::new(0.5));
    let config = OptimizerConfig {
        append_mode: false,
        ..test_config()
    };

    let err = run(root, config, &service).await.unwrap_err();
    assert!(matches!(err, OptimizeError::Configuration(_)));
    assert_eq!(service.optimize_calls(), 0);
    assert!(!LedgerStore::for_project(root).path().exists());
}

#[tokio::test]
async fn test_missing_or_invalid_credential_aborts() {
    let project = create_temp_project();
    let root = project.path();
    write_image(root, &format!("{}/a.png", DRAWABLE), 10_000);

    let service = Arc::new(MockService::new(0.5));
    let config = OptimizerConfig {
        api_key: String::new(),
        ..test_config()
    };
    let err = run(root, config, &service).await.unwrap_err();
    assert!(matches!(err, OptimizeError::Configuration(_)));

    let service = Arc::new(MockService::new(0.5).with_invalid_credential());
    let err = run(root, test_config(), &service).await.unwrap_err();
    assert!(matches!(err, OptimizeError::Configuration(_)));
    assert_eq!(service.optimize_calls(), 0);
    assert!(!LedgerStore::for_project(root).path().exists());
}

#[tokio::test]
async fn test_malformed_ledger_is_replaced() {
    let project = create_temp_project();
    let root = project.path();
    write_image(root, &format!("{}/a.png", DRAWABLE), 10_000);
    let store = LedgerStore::for_project(root);
    std::fs::write(store.path(), "{ not json").unwrap();
    let service = Arc::new(MockService::new(0.5));

    let outcome = run(root, test_config(), &service).await.unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(store.load().await.len(), 1);
}

#[tokio::test]
async fn test_ledger_write_failure_is_surfaced() {
    let project = create_temp_project();
    let root = project.path();
    write_image(root, &format!("{}/a.png", DRAWABLE), 10_000);
    let store = LedgerStore::for_project(root);
    std::fs::create_dir(store.path()).unwrap();
    let service = Arc::new(MockService::new(0.5));

    let err = run(root, test_config(), &service).await.unwrap_err();
    assert!(matches!(err, OptimizeError::LedgerWrite { .. }));
}

#[tokio::test]
async fn test_existing_records_are_preserved() {
    let project = create_temp_project();
    let root = project.path();
    write_image(root, &format!("{}/a.png", DRAWABLE), 10_000);
    let store = LedgerStore::for_project(root);
    std::fs::write(
        store.path(),
        r#"[{"path":"legacy/old.png","beforeSize":900,"afterSize":300,"md5":"abc","ignore":false}]"#,
    )
    .unwrap();
    let service = Arc::new(MockService::new(0.5));

    run(root, test_config(), &service).await.unwrap();

    let ledger = store.load().await;
    let paths: Vec<_> = ledger.records().iter().map(|r| r.path.clone()).collect();
    assert_eq!(paths, vec!["legacy/old.png".to_string(), format!("{}/a.png", DRAWABLE)]);
}

#[tokio::test]
async fn test_convert_only_skips_optimization() {
    let project = create_temp_project();
    let root = project.path();
    let png = write_image(root, &format!("{}/a.png", DRAWABLE), 10_000);
    write_image(root, &format!("{}/b.webp", DRAWABLE), 10_000);
    let service = Arc::new(MockService::new(0.5));
    let config = OptimizerConfig {
        convert_to_webp: true,
        only_convert: true,
        ..test_config()
    };

    let outcome = run(root, config, &service).await.unwrap();

    assert_eq!(service.convert_calls(), 1);
    assert_eq!(service.optimize_calls(), 0);
    assert_eq!(outcome.stats.files_converted, 1);
    assert!(!png.exists());
    assert_eq!(
        std::fs::read(root.join(DRAWABLE).join("a.webp")).unwrap(),
        b"converted"
    );
    assert!(!LedgerStore::for_project(root).path().exists());
}

#[tokio::test]
async fn test_convert_then_optimize() {
    let project = create_temp_project();
    let root = project.path();
    write_image(root, &format!("{}/a.png", DRAWABLE), 10_000);
    write_image(root, &format!("{}/b.webp", DRAWABLE), 10_000);
    let service = Arc::new(MockService::new(0.5));
    let config = OptimizerConfig {
        convert_to_webp: true,
        ..test_config()
    };

    let outcome = run(root, config, &service).await.unwrap();

    assert_eq!(service.convert_calls(), 1);
    // The converted a.webp is tiny and falls under the skip size
    assert_eq!(service.optimize_calls(), 1);
    assert_eq!(outcome.records[0].path, format!("{}/b.webp", DRAWABLE));
}

#[tokio::test]
async fn test_parallel_workers_submit_each_file_once() {
    let project = create_temp_project();
    let root = project.path();
    for i in 0..12 {
        write_image(root, &format!("{}/img{:02}.png", DRAWABLE, i), 10_000);
    }
    let service = Arc::new(MockService::new(0.5));
    let config = OptimizerConfig {
        workers: 4,
        resource_dirs: vec![PathBuf::from(DRAWABLE)],
        ..test_config()
    };

    let outcome = tokio_test::assert_ok!(run(root, config, &service).await);

    assert_eq!(service.optimize_calls(), 12);
    assert_eq!(outcome.records.len(), 12);
    assert_eq!(outcome.directories.len(), 1);
    assert_eq!(outcome.records[0].path, format!("{}/img00.png", DRAWABLE));
    assert_eq!(LedgerStore::for_project(root).load().await.len(), 12);
}

#[tokio::test]
async fn test_quota_during_conversion_skips_optimization() {
    let project = create_temp_project();
    let root = project.path();
    let a = write_image(root, &format!("{}/a.png", DRAWABLE), 10_000);
    let b = write_image(root, &format!("{}/b.png", DRAWABLE), 10_000);
    let service = Arc::new(MockService::new(0.5).with_convert_quota_after(0));
    let config = OptimizerConfig {
        convert_to_webp: true,
        ..test_config()
    };

    let outcome = run(root, config, &service).await.unwrap();

    assert!(outcome.quota_exhausted);
    assert_eq!(service.convert_calls(), 1);
    assert_eq!(service.optimize_calls(), 0);
    assert_eq!(outcome.stats.files_converted, 0);
    assert!(outcome.records.is_empty());
    assert!(a.exists());
    assert!(b.exists());
    assert!(!LedgerStore::for_project(root).path().exists());
}

#[tokio::test]
async fn test_deadline_stops_dispatch_and_persists_finished_work() {
    let project = create_temp_project();
    let root = project.path();
    for name in ["a.png", "b.png", "c.png", "d.png"] {
        write_image(root, &format!("{}/{}", DRAWABLE, name), 10_000);
    }
    let service = Arc::new(MockService::new(0.5).with_delay(Duration::from_millis(700)));
    let config = OptimizerConfig {
        deadline_secs: Some(1),
        ..test_config()
    };

    let outcome = run(root, config, &service).await.unwrap();

    assert!(outcome.deadline_reached);
    assert!(!outcome.quota_exhausted);
    assert!(!outcome.records.is_empty());
    assert!(outcome.records.len() < 4);
    assert_eq!(service.optimize_calls(), outcome.records.len());
    assert!(outcome.ledger_written);

    let ledger = LedgerStore::for_project(root).load().await;
    assert_eq!(ledger.len(), outcome.records.len());
    for record in &outcome.records {
        assert_eq!(ledger.get(&record.path), Some(record));
    }
}
