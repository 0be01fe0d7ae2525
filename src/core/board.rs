//! # Status Board Module / 状态板模块
//!
//! The authoritative, observable store of run-level and per-test status.
//!
//! [`StatusBoard::new`] returns two halves of the same board: a cloneable
//! [`StatusBoard`] that observers use to read state and subscribe to changes,
//! and a single [`BoardWriter`] that is moved into the orchestrator. The
//! writer is not `Clone`, so the board has exactly one writer for its whole
//! life.
//!
//! 运行级和测试级状态的权威可观察存储。
//!
//! [`StatusBoard::new`] 返回同一状态板的两部分：可克隆的 [`StatusBoard`]，
//! 供观察者读取状态和订阅变更；以及唯一的 [`BoardWriter`]，它被移交给编排器。
//! 写入端不可克隆，因此状态板在整个生命周期内只有一个写入者。

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::events::EventSource;
use crate::core::models::{RunStatus, TestResult, TestStatus};

/// Payload of the per-test status channel.
/// 测试状态通道的负载。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestStatusChange {
    pub name: String,
    pub status: TestStatus,
}

/// Rejected mutations. / 被拒绝的变更。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("test '{0}' is not registered")]
    UnknownTest(String),
    #[error("test '{0}' is already registered")]
    AlreadyRegistered(String),
    #[error("test '{name}' cannot move from {from} to {to}")]
    InvalidTransition {
        name: String,
        from: TestStatus,
        to: TestStatus,
    },
    #[error("the run has already finished with status {0}")]
    RunFinished(RunStatus),
}

#[derive(Debug)]
struct RunState {
    status: RunStatus,
    error_details: Option<String>,
}

#[derive(Debug, Default)]
struct Results {
    order: Vec<String>,
    records: HashMap<String, TestResult>,
}

struct Inner {
    results: RefCell<Results>,
    run: RefCell<RunState>,
    on_status_changed: EventSource<RunStatus>,
    on_test_status_changed: EventSource<TestStatusChange>,
}

/// Read-only view of the board plus its two subscription channels.
#[derive(Clone)]
pub struct StatusBoard {
    inner: Rc<Inner>,
}

/// A non-owning handle to a board, for callbacks that read the board they
/// are subscribed to without keeping it alive.
#[derive(Clone)]
pub struct WeakStatusBoard {
    inner: Weak<Inner>,
}

impl WeakStatusBoard {
    pub fn upgrade(&self) -> Option<StatusBoard> {
        self.inner.upgrade().map(|inner| StatusBoard { inner })
    }
}

/// The privileged mutation interface. Exactly one exists per board.
/// 特权变更接口。每个状态板只有一个。
pub struct BoardWriter {
    inner: Rc<Inner>,
}

/// A point-in-time copy of the board, suitable for serialization.
/// 状态板的某一时刻副本，可用于序列化。
#[derive(Debug, Clone, Serialize)]
pub struct BoardSnapshot {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    pub results: Vec<NamedResult>,
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedResult {
    pub name: String,
    #[serde(flatten)]
    pub result: TestResult,
}

impl StatusBoard {
    /// Creates an empty board in the `Running` state and its sole writer.
    pub fn new() -> (StatusBoard, BoardWriter) {
        let inner = Rc::new(Inner {
            results: RefCell::new(Results::default()),
            run: RefCell::new(RunState {
                status: RunStatus::Running,
                error_details: None,
            }),
            on_status_changed: EventSource::new(),
            on_test_status_changed: EventSource::new(),
        });
        (
            StatusBoard {
                inner: Rc::clone(&inner),
            },
            BoardWriter { inner },
        )
    }

    pub fn downgrade(&self) -> WeakStatusBoard {
        WeakStatusBoard {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn status(&self) -> RunStatus {
        self.inner.run.borrow().status
    }

    pub fn error_details(&self) -> Option<String> {
        self.inner.run.borrow().error_details.clone()
    }

    /// The current record for `name`, if registered.
    pub fn result(&self, name: &str) -> Option<TestResult> {
        self.inner.results.borrow().records.get(name).cloned()
    }

    /// All records in registration order.
    pub fn results(&self) -> Vec<(String, TestResult)> {
        let results = self.inner.results.borrow();
        results
            .order
            .iter()
            .filter_map(|name| {
                results
                    .records
                    .get(name)
                    .map(|record| (name.clone(), record.clone()))
            })
            .collect()
    }

    /// Runs `f` over the live records without copying them.
    ///
    /// The board is borrowed for the duration of the call; `f` must not hold
    /// on to anything across an await point.
    pub fn with_results<R>(
        &self,
        f: impl FnOnce(&mut dyn Iterator<Item = (&str, &TestResult)>) -> R,
    ) -> R {
        let results = self.inner.results.borrow();
        let mut iter = results
            .order
            .iter()
            .filter_map(|name| results.records.get(name).map(|r| (name.as_str(), r)));
        f(&mut iter)
    }

    pub fn test_count(&self) -> usize {
        self.inner.results.borrow().order.len()
    }

    /// Fires with the new run status whenever it changes.
    pub fn on_status_changed(&self) -> &EventSource<RunStatus> {
        &self.inner.on_status_changed
    }

    /// Fires with `(test, new_status)` whenever a test's status changes.
    pub fn on_test_status_changed(&self) -> &EventSource<TestStatusChange> {
        &self.inner.on_test_status_changed
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let run = self.inner.run.borrow();
        BoardSnapshot {
            status: run.status,
            error_details: run.error_details.clone(),
            results: self
                .results()
                .into_iter()
                .map(|(name, result)| NamedResult { name, result })
                .collect(),
            taken_at: Utc::now(),
        }
    }
}

impl fmt::Debug for StatusBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusBoard")
            .field("status", &self.status())
            .field("tests", &self.test_count())
            .finish_non_exhaustive()
    }
}

impl BoardWriter {
    /// The run status as last written.
    pub fn run_status(&self) -> RunStatus {
        self.inner.run.borrow().status
    }

    /// Adds `name` as `Pending`. Registering the same name twice is an error.
    pub fn register_test(&self, name: &str) -> Result<(), BoardError> {
        let mut results = self.inner.results.borrow_mut();
        if results.records.contains_key(name) {
            return Err(BoardError::AlreadyRegistered(name.to_string()));
        }
        results.order.push(name.to_string());
        results
            .records
            .insert(name.to_string(), TestResult::pending());
        Ok(())
    }

    /// Updates the status of `name`. Writing the current status is a silent no-op.
    pub fn set_test_status(&self, name: &str, status: TestStatus) -> Result<(), BoardError> {
        {
            let mut results = self.inner.results.borrow_mut();
            let record = lookup(&mut results, name)?;
            if record.status == status {
                return Ok(());
            }
            check_transition(name, record.status, status)?;
            record.status = status;
        }
        self.fire_test_status(name, status);
        Ok(())
    }

    /// Records the final data of a test. Only a status change is announced.
    pub fn set_test_result_data(
        &self,
        name: &str,
        status: TestStatus,
        exit_code: Option<i32>,
        text_output: Option<String>,
    ) -> Result<(), BoardError> {
        let status_changed = {
            let mut results = self.inner.results.borrow_mut();
            let record = lookup(&mut results, name)?;
            let changed = record.status != status;
            if changed {
                check_transition(name, record.status, status)?;
            }
            record.status = status;
            record.exit_code = exit_code;
            record.text_output = text_output;
            changed
        };
        if status_changed {
            self.fire_test_status(name, status);
        }
        Ok(())
    }

    /// Moves the run to `status`. Unchanged writes are no-ops; a finished
    /// run cannot move anywhere else.
    pub fn set_runner_status(&self, status: RunStatus) -> Result<(), BoardError> {
        {
            let mut run = self.inner.run.borrow_mut();
            if run.status == status {
                return Ok(());
            }
            if run.status.is_terminal() {
                return Err(BoardError::RunFinished(run.status));
            }
            run.status = status;
        }
        self.inner.on_status_changed.fire(&status);
        Ok(())
    }

    /// Forces the run into `Error` with `details` and always notifies, since
    /// the details may differ from a previous error.
    pub fn set_runner_error(&self, details: impl Into<String>) {
        {
            let mut run = self.inner.run.borrow_mut();
            run.status = RunStatus::Error;
            run.error_details = Some(details.into());
        }
        self.inner.on_status_changed.fire(&RunStatus::Error);
    }

    fn fire_test_status(&self, name: &str, status: TestStatus) {
        self.inner.on_test_status_changed.fire(&TestStatusChange {
            name: name.to_string(),
            status,
        });
    }
}

impl fmt::Debug for BoardWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardWriter").finish_non_exhaustive()
    }
}

fn lookup<'a>(results: &'a mut Results, name: &str) -> Result<&'a mut TestResult, BoardError> {
    results
        .records
        .get_mut(name)
        .ok_or_else(|| BoardError::UnknownTest(name.to_string()))
}

fn check_transition(name: &str, from: TestStatus, to: TestStatus) -> Result<(), BoardError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(BoardError::InvalidTransition {
            name: name.to_string(),
            from,
            to,
        })
    }
}
