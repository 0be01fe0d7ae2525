//! # Orchestrator Tests / 编排器测试
//!
//! Drives whole runs against scripted modules and checks what ends up on the
//! status board and in which order it was announced.
//!
//! 针对脚本化模块驱动完整运行，并检查状态板上的最终结果以及通知的顺序。

mod common;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use batched_test_runner::board::StatusBoard;
use batched_test_runner::core::params::{OutputFormat, RunParams};
use batched_test_runner::models::{LoadProgress, RunStatus, TestResult, TestStatus};
use batched_test_runner::orchestrator::Orchestrator;
use common::{Recorder, Script, ScriptedLoader, ScriptedModule};

fn result(status: TestStatus, exit_code: Option<i32>, output: Option<&str>) -> TestResult {
    TestResult {
        status,
        exit_code,
        text_output: output.map(str::to_string),
    }
}

#[tokio::test]
async fn test_discovered_tests_are_registered_in_order_before_execution() {
    let module = ScriptedModule::new("A B C\n");
    let loader = ScriptedLoader::new(module);
    let (board, writer) = StatusBoard::new();

    // Capture the whole board the moment the first test starts running.
    let seen_at_first_start: Rc<RefCell<Option<Vec<(String, TestStatus)>>>> = Rc::default();
    let weak = board.downgrade();
    let seen = Rc::clone(&seen_at_first_start);
    board.on_test_status_changed().subscribe(move |change| {
        if change.status == TestStatus::Running && seen.borrow().is_none() {
            let board = weak.upgrade().expect("board alive");
            let statuses = board
                .results()
                .into_iter()
                .map(|(name, r)| (name, r.status))
                .collect();
            *seen.borrow_mut() = Some(statuses);
        }
    });

    let status = Orchestrator::new(&loader, writer)
        .run(None, OutputFormat::Txt)
        .await;

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(
        seen_at_first_start.borrow().clone().unwrap(),
        vec![
            ("A".to_string(), TestStatus::Running),
            ("B".to_string(), TestStatus::Pending),
            ("C".to_string(), TestStatus::Pending),
        ]
    );
    let names: Vec<String> = board.results().into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_requested_test_skips_enumeration() {
    let module = ScriptedModule::new("A B C").with("A", Script::Exit(0, "ok"));
    let loader = ScriptedLoader::new(module.clone());
    let (board, writer) = StatusBoard::new();

    let status = Orchestrator::new(&loader, writer)
        .run(Some("A"), OutputFormat::Txt)
        .await;

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(module.listing_calls(), 0);
    assert_eq!(board.test_count(), 1);
    assert_eq!(
        board.result("A"),
        Some(result(TestStatus::Completed, Some(0), Some("ok")))
    );
}

#[tokio::test]
async fn test_outcomes_are_classified_per_test() {
    let module = ScriptedModule::new("A B C D")
        .with("A", Script::Exit(0, "ok"))
        .with("B", Script::Exit(-1, ""))
        .with("C", Script::Abort("partial..."))
        .with("D", Script::Fail);
    let loader = ScriptedLoader::new(module);
    let (board, writer) = StatusBoard::new();
    let recorder = Recorder::attach(&board);

    let status = Orchestrator::new(&loader, writer)
        .run(None, OutputFormat::Txt)
        .await;

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(board.status(), RunStatus::Completed);
    assert_eq!(board.error_details(), None);
    assert_eq!(
        board.result("A"),
        Some(result(TestStatus::Completed, Some(0), Some("ok")))
    );
    assert_eq!(
        board.result("B"),
        Some(result(TestStatus::Error, Some(-1), Some("")))
    );
    assert_eq!(
        board.result("C"),
        Some(result(TestStatus::Crashed, None, Some("partial...")))
    );
    assert_eq!(board.result("D"), Some(result(TestStatus::Crashed, None, None)));
    assert_eq!(recorder.run_events(), vec![RunStatus::Completed]);
}

#[tokio::test]
async fn test_each_test_announces_running_then_its_final_status() {
    let module = ScriptedModule::new("A B")
        .with("A", Script::Exit(3, "2 failures"))
        .with("B", Script::Exit(-2, ""));
    let loader = ScriptedLoader::new(module);
    let (board, writer) = StatusBoard::new();
    let recorder = Recorder::attach(&board);

    Orchestrator::new(&loader, writer)
        .run(None, OutputFormat::Txt)
        .await;

    // Registration as Pending is not a status change, so it is not announced.
    assert_eq!(
        recorder.test_events(),
        vec![
            ("A".to_string(), TestStatus::Running),
            ("A".to_string(), TestStatus::Completed),
            ("B".to_string(), TestStatus::Running),
            ("B".to_string(), TestStatus::Error),
        ]
    );
}

#[tokio::test]
async fn test_invocation_requests_log_stream_in_given_format() {
    let module = ScriptedModule::new("tst_qurl");
    let loader = ScriptedLoader::new(module.clone());
    let (_board, writer) = StatusBoard::new();

    Orchestrator::new(&loader, writer)
        .run(None, OutputFormat::JUnitXml)
        .await;

    assert_eq!(
        module.calls(),
        vec![
            None,
            Some(vec![
                "tst_qurl".to_string(),
                "-o".to_string(),
                "-,junitxml".to_string()
            ]),
        ]
    );
}

#[tokio::test]
async fn test_bad_format_fails_run_before_loading() {
    let loader = ScriptedLoader::new(ScriptedModule::new("A"));
    let (board, writer) = StatusBoard::new();
    let recorder = Recorder::attach(&board);

    let status = Orchestrator::new(&loader, writer)
        .start(RunParams::new(None, Some("bogus")))
        .await;

    assert_eq!(status, RunStatus::Error);
    assert_eq!(board.status(), RunStatus::Error);
    assert!(board.error_details().unwrap().contains("bogus"));
    assert_eq!(board.test_count(), 0);
    assert_eq!(loader.loads(), 0);
    assert_eq!(recorder.run_events(), vec![RunStatus::Error]);
}

#[tokio::test]
async fn test_empty_test_name_fails_run_before_registration() {
    let loader = ScriptedLoader::new(ScriptedModule::new("A"));
    let (board, writer) = StatusBoard::new();

    let status = Orchestrator::new(&loader, writer)
        .start(RunParams::new(Some(""), None))
        .await;

    assert_eq!(status, RunStatus::Error);
    assert_eq!(
        board.error_details().as_deref(),
        Some("The testName parameter is incorrect")
    );
    assert_eq!(board.test_count(), 0);
}

#[tokio::test]
async fn test_load_failure_is_a_run_error() {
    let loader = ScriptedLoader::failing();
    let (board, writer) = StatusBoard::new();

    let status = Orchestrator::new(&loader, writer)
        .with_module_name("my_batch")
        .run(None, OutputFormat::Txt)
        .await;

    assert_eq!(status, RunStatus::Error);
    let details = board.error_details().unwrap();
    assert!(details.contains("my_batch"), "details: {details}");
    assert!(details.contains("fetch of 'my_batch.wasm' failed"), "details: {details}");
    assert_eq!(board.test_count(), 0);
}

#[tokio::test]
async fn test_enumeration_failure_is_a_run_error() {
    let loader = ScriptedLoader::new(ScriptedModule::unlistable());
    let (board, writer) = StatusBoard::new();

    let status = Orchestrator::new(&loader, writer)
        .run(None, OutputFormat::Txt)
        .await;

    assert_eq!(status, RunStatus::Error);
    assert!(board.error_details().unwrap().contains("listing crashed"));
    assert_eq!(board.test_count(), 0);
}

#[tokio::test]
async fn test_duplicate_listing_registers_nothing() {
    let loader = ScriptedLoader::new(ScriptedModule::new("A B A"));
    let (board, writer) = StatusBoard::new();

    let status = Orchestrator::new(&loader, writer)
        .run(None, OutputFormat::Txt)
        .await;

    assert_eq!(status, RunStatus::Error);
    assert!(board.error_details().unwrap().contains("'A'"));
    assert_eq!(board.test_count(), 0);
}

#[tokio::test]
async fn test_empty_listing_runs_one_unnamed_test() {
    let module = ScriptedModule::new("   \n");
    let loader = ScriptedLoader::new(module.clone());
    let (board, writer) = StatusBoard::new();

    let status = Orchestrator::new(&loader, writer)
        .run(None, OutputFormat::Txt)
        .await;

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(board.test_count(), 1);
    assert_eq!(board.result("").map(|r| r.status), Some(TestStatus::Completed));
}

#[tokio::test]
async fn test_hanging_test_is_crashed_after_timeout() {
    let module = ScriptedModule::new("slow fast")
        .with("slow", Script::Hang)
        .with("fast", Script::Exit(0, "ok"));
    let loader = ScriptedLoader::new(module);
    let (board, writer) = StatusBoard::new();

    let status = Orchestrator::new(&loader, writer)
        .with_timeout(Some(Duration::from_millis(50)))
        .run(None, OutputFormat::Txt)
        .await;

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(board.result("slow"), Some(result(TestStatus::Crashed, None, None)));
    assert_eq!(
        board.result("fast"),
        Some(result(TestStatus::Completed, Some(0), Some("ok")))
    );
}

#[tokio::test]
async fn test_load_progress_is_forwarded() {
    let loader = ScriptedLoader::new(ScriptedModule::new("A"));
    let (_board, writer) = StatusBoard::new();
    let events: Rc<RefCell<Vec<LoadProgress>>> = Rc::default();
    let sink = Rc::clone(&events);

    Orchestrator::new(&loader, writer)
        .with_load_progress(move |progress| sink.borrow_mut().push(progress.clone()))
        .run(None, OutputFormat::Txt)
        .await;

    assert_eq!(
        *events.borrow(),
        vec![
            LoadProgress::Resolving {
                name: "test_batch".to_string()
            },
            LoadProgress::Ready {
                name: "test_batch".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_finished_board_is_not_run_again() {
    let module = ScriptedModule::new("A").with("A", Script::Exit(0, "ok"));
    let loader = ScriptedLoader::new(module.clone());
    let (board, writer) = StatusBoard::new();
    let recorder = Recorder::attach(&board);
    let orchestrator = Orchestrator::new(&loader, writer);

    assert_eq!(
        orchestrator.run(None, OutputFormat::Txt).await,
        RunStatus::Completed
    );
    assert_eq!(
        orchestrator.run(None, OutputFormat::Txt).await,
        RunStatus::Completed
    );
    assert_eq!(
        orchestrator.start(RunParams::new(None, Some("bogus"))).await,
        RunStatus::Completed
    );

    assert_eq!(board.status(), RunStatus::Completed);
    assert_eq!(board.error_details(), None);
    assert_eq!(recorder.run_events(), vec![RunStatus::Completed]);
    assert_eq!(loader.loads(), 1);
    // One listing call and one execution of A.
    assert_eq!(module.calls().len(), 2);
}

#[tokio::test]
async fn test_failed_board_keeps_its_first_error() {
    let loader = ScriptedLoader::failing();
    let (board, writer) = StatusBoard::new();
    let recorder = Recorder::attach(&board);
    let orchestrator = Orchestrator::new(&loader, writer);

    orchestrator.run(None, OutputFormat::Txt).await;
    let first = board.error_details();
    let status = orchestrator
        .start(RunParams::new(Some(""), None))
        .await;

    assert_eq!(status, RunStatus::Error);
    assert_eq!(board.error_details(), first);
    assert_eq!(recorder.run_events(), vec![RunStatus::Error]);
    assert_eq!(loader.loads(), 1);
}
