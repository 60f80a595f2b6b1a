// ABOUTME: Scoped cleanup: actions registered per step, run in reverse on every exit path.
// ABOUTME: Each action is independently best-effort; failures become warnings.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use crate::diagnostics::{Diagnostics, Warning};

type Action<'a> = Box<dyn FnOnce() -> BoxFuture<'a, Result<(), String>> + Send + 'a>;

/// Stack of pending cleanup actions.
///
/// Register an action as soon as the thing it undoes may have happened, then
/// call [`CleanupStack::run`] once the guarded work has finished, whatever
/// its result.
#[derive(Default)]
pub struct CleanupStack<'a> {
    actions: Vec<(String, Action<'a>)>,
}

impl<'a> CleanupStack<'a> {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    pub fn push<F, Fut, E>(&mut self, label: impl Into<String>, action: F)
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<(), E>> + Send + 'a,
        E: Display,
    {
        let boxed: Action<'a> = Box::new(move || {
            async move { action().await.map_err(|e| e.to_string()) }.boxed()
        });
        self.actions.push((label.into(), boxed));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run every action, last registered first. Returns how many succeeded.
    pub async fn run(mut self, diagnostics: &mut Diagnostics) -> usize {
        let mut ok = 0;
        while let Some((label, action)) = self.actions.pop() {
            tracing::debug!(cleanup = %label, "running cleanup");
            match AssertUnwindSafe(action()).catch_unwind().await {
                Ok(Ok(())) => ok += 1,
                Ok(Err(message)) => diagnostics.warn(Warning::cleanup_failed(&label, message)),
                Err(_) => diagnostics.warn(Warning::cleanup_failed(&label, "panicked")),
            }
        }
        ok
    }
}

/// Owned cleanup stack that still runs if its owner is dropped mid-flight.
///
/// A cancelled future never reaches its own `run` call, so on drop the
/// pending actions are handed to a task on the current runtime.
#[derive(Default)]
pub struct DeferredCleanup {
    stack: Option<CleanupStack<'static>>,
}

impl DeferredCleanup {
    pub fn new() -> Self {
        Self {
            stack: Some(CleanupStack::new()),
        }
    }

    pub fn stack_mut(&mut self) -> &mut CleanupStack<'static> {
        self.stack.get_or_insert_with(CleanupStack::new)
    }

    pub fn len(&self) -> usize {
        self.stack.as_ref().map_or(0, CleanupStack::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn run(mut self, diagnostics: &mut Diagnostics) -> usize {
        match self.stack.take() {
            Some(stack) => stack.run(diagnostics).await,
            None => 0,
        }
    }
}

impl Drop for DeferredCleanup {
    fn drop(&mut self) {
        let Some(stack) = self.stack.take() else {
            return;
        };
        if stack.is_empty() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(pending = stack.len(), "cancelled, running cleanup in the background");
                handle.spawn(async move {
                    let mut diagnostics = Diagnostics::default();
                    stack.run(&mut diagnostics).await;
                    for warning in diagnostics.warnings() {
                        tracing::warn!("{}", warning.message);
                    }
                });
            }
            // No runtime left to drive the actions; the stack's own drop logs them.
            Err(_) => drop(stack),
        }
    }
}

impl Drop for CleanupStack<'_> {
    fn drop(&mut self) {
        if !self.actions.is_empty() {
            let labels: Vec<&str> = self.actions.iter().map(|(l, _)| l.as_str()).collect();
            tracing::error!(pending = ?labels, "cleanup stack dropped without running");
        }
    }
}
