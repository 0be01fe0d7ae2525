// Shared test helpers for integration tests
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use batched_test_runner::board::{StatusBoard, TestStatusChange};
use batched_test_runner::core::execution::{ModuleLoader, TestModule};
use batched_test_runner::models::{
    ExecError, ExecOptions, ExecOutput, LoadProgress, RunStatus,
};

/// What the scripted module does when asked to run a given test.
#[derive(Debug, Clone)]
pub enum Script {
    /// Finishes with this exit code and stdout.
    Exit(i32, &'static str),
    /// Aborts, keeping the output printed so far.
    Abort(&'static str),
    /// Fails without any output.
    Fail,
    /// Never finishes.
    Hang,
}

/// An in-memory module whose behavior is fixed up front. Clones share the
/// call log.
#[derive(Clone)]
pub struct ScriptedModule {
    listing: Result<String, &'static str>,
    scripts: HashMap<String, Script>,
    calls: Rc<RefCell<Vec<Option<Vec<String>>>>>,
}

impl ScriptedModule {
    pub fn new(listing: &str) -> Self {
        Self {
            listing: Ok(listing.to_string()),
            scripts: HashMap::new(),
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// A module whose listing run fails.
    pub fn unlistable() -> Self {
        Self {
            listing: Err("listing crashed"),
            ..Self::new("")
        }
    }

    pub fn with(mut self, test: &str, script: Script) -> Self {
        self.scripts.insert(test.to_string(), script);
        self
    }

    /// Every `exec` call so far; `None` marks a listing call.
    pub fn calls(&self) -> Vec<Option<Vec<String>>> {
        self.calls.borrow().clone()
    }

    pub fn listing_calls(&self) -> usize {
        self.calls.borrow().iter().filter(|call| call.is_none()).count()
    }
}

impl TestModule for ScriptedModule {
    async fn exec(&self, options: Option<ExecOptions>) -> Result<ExecOutput, ExecError> {
        self.calls
            .borrow_mut()
            .push(options.as_ref().map(|o| o.args.clone()));

        let Some(options) = options else {
            return match &self.listing {
                Ok(listing) => Ok(ExecOutput {
                    exit_code: 0,
                    stdout: listing.clone(),
                }),
                Err(reason) => Err(ExecError::Failed(anyhow::anyhow!(*reason))),
            };
        };

        let test = options.args.first().cloned().unwrap_or_default();
        match self.scripts.get(&test).cloned().unwrap_or(Script::Exit(0, "")) {
            Script::Exit(exit_code, stdout) => Ok(ExecOutput {
                exit_code,
                stdout: stdout.to_string(),
            }),
            Script::Abort(stdout) => Err(ExecError::Aborted {
                reason: "abort() called".to_string(),
                stdout: stdout.to_string(),
            }),
            Script::Fail => Err(ExecError::Failed(anyhow::anyhow!("out of memory"))),
            Script::Hang => std::future::pending().await,
        }
    }
}

/// Hands out a scripted module, or fails to load when built with `failing`.
pub struct ScriptedLoader {
    module: Option<ScriptedModule>,
    loads: Cell<usize>,
}

impl ScriptedLoader {
    pub fn new(module: ScriptedModule) -> Self {
        Self {
            module: Some(module),
            loads: Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            module: None,
            loads: Cell::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.get()
    }
}

impl ModuleLoader for &ScriptedLoader {
    type Module = ScriptedModule;

    async fn load_module(
        &self,
        name: &str,
        progress: &dyn Fn(LoadProgress),
    ) -> anyhow::Result<ScriptedModule> {
        self.loads.set(self.loads.get() + 1);
        progress(LoadProgress::Resolving {
            name: name.to_string(),
        });
        let module = self
            .module
            .clone()
            .ok_or_else(|| anyhow::anyhow!("fetch of '{}.wasm' failed", name))?;
        progress(LoadProgress::Ready {
            name: name.to_string(),
        });
        Ok(module)
    }
}

/// Everything the board announced, in delivery order.
#[derive(Default)]
pub struct Recorder {
    pub run: Rc<RefCell<Vec<RunStatus>>>,
    pub tests: Rc<RefCell<Vec<TestStatusChange>>>,
}

impl Recorder {
    pub fn attach(board: &StatusBoard) -> Self {
        let recorder = Recorder::default();
        let run = Rc::clone(&recorder.run);
        board
            .on_status_changed()
            .subscribe(move |status| run.borrow_mut().push(*status));
        let tests = Rc::clone(&recorder.tests);
        board
            .on_test_status_changed()
            .subscribe(move |change| tests.borrow_mut().push(change.clone()));
        recorder
    }

    pub fn run_events(&self) -> Vec<RunStatus> {
        self.run.borrow().clone()
    }

    pub fn test_events(&self) -> Vec<(String, batched_test_runner::models::TestStatus)> {
        self.tests
            .borrow()
            .iter()
            .map(|change| (change.name.clone(), change.status))
            .collect()
    }
}
