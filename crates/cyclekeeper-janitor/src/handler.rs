//! Action handler abstraction
//!
//! The engine never touches candidate files itself. Each actionable entry is
//! handed to an [`ActionHandler`]; the stock implementation spawns one
//! external process per entry and reads success from its exit status.

use crate::config::{CommandSpec, HandlerConfig};
use async_trait::async_trait;
use cyclekeeper_domain::{Environment, Operation};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

/// Everything a handler needs to act on one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInvocation {
    /// What to do
    pub operation: Operation,

    /// Entry to act on
    pub source: PathBuf,

    /// Resolved destination (`None` for delete)
    pub destination: Option<PathBuf>,

    /// Ask the handler for verbose output
    pub verbose: bool,

    /// Ask the handler for the cheapest implementation
    pub cheap: bool,
}

/// How a single invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Exit status zero
    Succeeded,

    /// Non-zero exit (`None` when killed by a signal)
    Failed {
        /// Exit code, if any
        status: Option<i32>,
    },

    /// Deadline passed; the process was killed
    TimedOut,

    /// Process could not be started or waited on
    SpawnFailed {
        /// Error text
        reason: String,
    },
}

impl ActionOutcome {
    /// Whether the invocation counts as actioned
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Succeeded)
    }
}

/// Performs copy/move/delete for one candidate
///
/// Implementations must be safe to call concurrently: a batch runs up to
/// `batch_size` invocations at once.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Act on one candidate with the run's variable bindings
    async fn execute(&self, invocation: ActionInvocation, env: Arc<Environment>) -> ActionOutcome;
}

/// Command selection per operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerTable {
    copy: CommandSpec,
    move_: CommandSpec,
    delete: CommandSpec,
}

impl HandlerTable {
    /// Same command for every operation
    pub fn uniform(command: CommandSpec) -> Self {
        Self {
            copy: command.clone(),
            move_: command.clone(),
            delete: command,
        }
    }

    /// Table from settings, using `fallback` where nothing is configured
    pub fn from_config(config: &HandlerConfig, fallback: &CommandSpec) -> Self {
        let pick = |op| config.command_for(op).unwrap_or(fallback).clone();
        Self {
            copy: pick(Operation::Copy),
            move_: pick(Operation::Move),
            delete: pick(Operation::Delete),
        }
    }

    /// Replace the command for one operation
    pub fn with(mut self, operation: Operation, command: CommandSpec) -> Self {
        match operation {
            Operation::Copy => self.copy = command,
            Operation::Move => self.move_ = command,
            Operation::Delete => self.delete = command,
        }
        self
    }

    /// Command that handles `operation`
    pub fn command_for(&self, operation: Operation) -> &CommandSpec {
        match operation {
            Operation::Copy => &self.copy,
            Operation::Move => &self.move_,
            Operation::Delete => &self.delete,
        }
    }
}

/// Handler that runs one external process per invocation
///
/// Argument vector:
/// `program [leading args] [--verbose] [--cheap] <operation> <source> <destination>`
/// where the destination is an empty string for delete. The process sees
/// exactly the bindings of the run's [`Environment`] and writes its standard
/// output to our standard error.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    table: HandlerTable,
    timeout: Option<Duration>,
}

impl CommandHandler {
    /// Create a handler with no deadline
    pub fn new(table: HandlerTable) -> Self {
        Self {
            table,
            timeout: None,
        }
    }

    /// Kill invocations that run longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the process for an invocation
    pub fn command(&self, invocation: &ActionInvocation, env: &Environment) -> Command {
        let spec = self.table.command_for(invocation.operation);

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if invocation.verbose {
            cmd.arg("--verbose");
        }
        if invocation.cheap {
            cmd.arg("--cheap");
        }
        cmd.arg(invocation.operation.as_str())
            .arg(&invocation.source)
            .arg(invocation.destination.as_deref().unwrap_or(Path::new("")));

        // stdout carries the run report, so handler output goes to stderr
        cmd.env_clear()
            .envs(env.vars_os())
            .stdin(Stdio::null())
            .stdout(std::io::stderr())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ActionHandler for CommandHandler {
    async fn execute(&self, invocation: ActionInvocation, env: Arc<Environment>) -> ActionOutcome {
        let mut child = match self.command(&invocation, &env).spawn() {
            Ok(child) => child,
            Err(e) => {
                return ActionOutcome::SpawnFailed {
                    reason: format!(
                        "{}: {}",
                        self.table.command_for(invocation.operation).program.display(),
                        e
                    ),
                }
            }
        };

        let waited = match self.timeout {
            Some(limit) => {
                let deadline = tokio::time::timeout(limit, child.wait()).await;
                match deadline {
                    Ok(waited) => waited,
                    Err(_) => {
                        tracing::warn!(
                            "Handler for {} timed out after {:?}, killing it",
                            invocation.source.display(),
                            limit
                        );
                        if let Err(e) = child.kill().await {
                            tracing::warn!("Failed to kill handler: {}", e);
                        }
                        return ActionOutcome::TimedOut;
                    }
                }
            }
            None => child.wait().await,
        };

        match waited {
            Ok(status) if status.success() => ActionOutcome::Succeeded,
            Ok(status) => ActionOutcome::Failed {
                status: status.code(),
            },
            Err(e) => ActionOutcome::SpawnFailed {
                reason: e.to_string(),
            },
        }
    }
}
