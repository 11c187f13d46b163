use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use quarry_error::{DbError, Result};
use uuid::Uuid;

use crate::config::session::SessionConfig;

/// Shared flag used to cancel a running query.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Per-query context passed to every analyzer rule and evaluation call.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    current_database: String,
    query_id: Uuid,
    cancel: CancellationToken,
    deadline: Option<Instant>,
    config: Arc<SessionConfig>,
}

impl ExecutionContext {
    pub fn new(current_database: impl Into<String>, config: Arc<SessionConfig>) -> Self {
        let deadline = match config.query_timeout_ms {
            0 => None,
            ms => Some(Instant::now() + Duration::from_millis(ms)),
        };

        ExecutionContext {
            current_database: current_database.into(),
            query_id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
            deadline,
            config,
        }
    }

    /// Context with no current database and a default config.
    pub fn empty() -> Self {
        Self::new("", Arc::new(SessionConfig::default()))
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn current_database(&self) -> &str {
        &self.current_database
    }

    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Error if the query has been cancelled or ran past its deadline.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(DbError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(DbError::DeadlineExceeded);
        }
        Ok(())
    }
}
