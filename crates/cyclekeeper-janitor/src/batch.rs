//! Bounded-concurrency batch execution
//!
//! Candidates are staged until a batch is full, then every staged invocation
//! is launched at once and the caller waits for all of them before anything
//! else is staged. At most `batch_size` handlers are ever in flight.

use crate::handler::{ActionHandler, ActionInvocation, ActionOutcome};
use cyclekeeper_domain::Environment;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Lifecycle of the batch currently held by the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Nothing staged
    Empty,

    /// Some invocations staged, room for more
    Filling,

    /// Staged invocations reached the batch size
    Full,

    /// Handlers launched, waiting on the barrier
    Running,

    /// Every handler of the batch has terminated
    Drained,
}

/// Runs action handlers in fixed-size, fully joined batches
///
/// # Examples
///
/// ```no_run
/// use cyclekeeper_janitor::{BatchExecutor, CommandHandler, HandlerTable, CommandSpec};
/// use cyclekeeper_domain::Environment;
/// use std::sync::Arc;
///
/// # async fn demo(invocations: Vec<cyclekeeper_janitor::ActionInvocation>) {
/// let handler = Arc::new(CommandHandler::new(HandlerTable::uniform(CommandSpec::new("hk-action"))));
/// let mut batch = BatchExecutor::new(4, handler, Arc::new(Environment::from_process()));
///
/// let mut actioned = 0;
/// for invocation in invocations {
///     actioned += batch.add_or_process(invocation).await;
/// }
/// actioned += batch.process().await;
/// # }
/// ```
pub struct BatchExecutor {
    batch_size: usize,
    handler: Arc<dyn ActionHandler>,
    env: Arc<Environment>,
    staged: Vec<ActionInvocation>,
    state: BatchState,
    dry_run: bool,
    succeeded: usize,
    failed: usize,
    batches: usize,
}

impl BatchExecutor {
    /// Create an executor; a batch size of zero is treated as one
    pub fn new(batch_size: usize, handler: Arc<dyn ActionHandler>, env: Arc<Environment>) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            handler,
            env,
            staged: Vec::with_capacity(batch_size),
            state: BatchState::Empty,
            dry_run: false,
            succeeded: 0,
            failed: 0,
            batches: 0,
        }
    }

    /// Log flushed invocations instead of launching them
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Maximum invocations per batch
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Current batch state
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Invocations waiting for the next flush
    pub fn staged(&self) -> usize {
        self.staged.len()
    }

    /// Successful invocations over the executor's lifetime
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    /// Failed invocations over the executor's lifetime
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Batches flushed so far (empty flushes excluded)
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Whether flushes are suppressed
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Stage an invocation, running the batch if this fills it
    ///
    /// Returns the number of successful invocations when a batch ran, zero
    /// otherwise.
    pub async fn add_or_process(&mut self, invocation: ActionInvocation) -> usize {
        self.staged.push(invocation);
        if self.staged.len() < self.batch_size {
            self.state = BatchState::Filling;
            return 0;
        }

        self.state = BatchState::Full;
        self.flush().await
    }

    /// Run whatever is staged (possibly nothing)
    ///
    /// Returns the number of successful invocations.
    pub async fn process(&mut self) -> usize {
        self.flush().await
    }

    async fn flush(&mut self) -> usize {
        if self.staged.is_empty() {
            self.state = BatchState::Empty;
            return 0;
        }

        let batch = std::mem::take(&mut self.staged);
        let size = batch.len();
        self.batches += 1;
        self.state = BatchState::Running;

        if self.dry_run {
            for invocation in &batch {
                tracing::info!(
                    "DRY RUN: Would {} {}",
                    invocation.operation,
                    describe(invocation)
                );
            }
            self.state = BatchState::Empty;
            return 0;
        }

        tracing::debug!("Launching batch {} ({} handlers)", self.batches, size);

        let mut tasks = JoinSet::new();
        for invocation in batch {
            let handler = Arc::clone(&self.handler);
            let env = Arc::clone(&self.env);
            tasks.spawn(async move {
                let label = describe(&invocation);
                let operation = invocation.operation;
                let outcome = handler.execute(invocation, env).await;
                (operation, label, outcome)
            });
        }

        // Barrier: nothing else starts until every handler has finished
        let mut succeeded = 0;
        let mut failed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, _, ActionOutcome::Succeeded)) => succeeded += 1,
                Ok((operation, label, outcome)) => {
                    failed += 1;
                    tracing::warn!("Failed to {} {}: {:?}", operation, label, outcome);
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!("Action task aborted: {}", e);
                }
            }
        }

        self.state = BatchState::Drained;
        tracing::debug!(
            "Batch {} drained: {} succeeded, {} failed",
            self.batches,
            succeeded,
            failed
        );

        self.succeeded += succeeded;
        self.failed += failed;
        self.state = BatchState::Empty;
        succeeded
    }
}

fn describe(invocation: &ActionInvocation) -> String {
    match &invocation.destination {
        Some(dest) => format!("{} -> {}", invocation.source.display(), dest.display()),
        None => invocation.source.display().to_string(),
    }
}
