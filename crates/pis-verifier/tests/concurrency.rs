//! Scenario 8 (§8): four threads, two verifications each, all against the
//! starting position with samples = 3. All eight must complete, and every
//! logger line independently parses as JSON regardless of which thread
//! wrote it (the DebugLogger's sinks are serialized internally under
//! lock, see `pis_core::logger`).

use pis_core::backend::NullBackend;
use pis_core::config::{Config, SamplingMode};
use pis_core::controller::{Controller, SearchLimits};
use serde_json::Value;
use std::io::Read;
use std::sync::Arc;
use std::thread;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[test]
fn four_threads_two_verifications_each_all_complete() {
    let log_path = std::env::temp_dir().join(format!(
        "pis_concurrency_test_{}.jsonl",
        uuid::Uuid::new_v4()
    ));

    let cfg = Config {
        lambda: 0.1,
        samples: 3,
        sampling_mode: SamplingMode::Competitive,
        debug_logging: true,
        metrics_file: Some(log_path.clone()),
        ..Config::default()
    };

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cfg = cfg.clone();
            thread::spawn(move || {
                let mut completed = 0;
                for _ in 0..2 {
                    let controller = Controller::new(cfg.clone(), Arc::new(NullBackend));
                    let position = pis_core::chess::parse_fen(START_FEN).unwrap();
                    let selected = controller.select_move(&position, SearchLimits::default());
                    assert!(selected.is_some());
                    let metrics = controller.get_last_sampling_metrics();
                    assert!(metrics.actual_samples > 0);
                    completed += 1;
                }
                completed
            })
        })
        .collect();

    let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, 8);

    let mut contents = String::new();
    std::fs::File::open(&log_path)
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    let mut line_count = 0;
    for line in contents.lines() {
        let _: Value = serde_json::from_str(line).expect("every logger line is valid JSON");
        line_count += 1;
    }
    assert!(line_count > 0);

    let _ = std::fs::remove_file(&log_path);
}
