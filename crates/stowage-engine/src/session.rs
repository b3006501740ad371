//! Per-upload session state
//!
//! `Planning → Dispatching → AwaitingCompletion → {Succeeded | Failed}`. Terminal states
//! are never left.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::{EngineError, ErrorMetadata, LogLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Planning,
    Dispatching,
    AwaitingCompletion,
    Succeeded,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Succeeded | SessionState::Failed)
    }

    fn can_advance_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Planning, Dispatching)
                | (Dispatching, AwaitingCompletion)
                | (AwaitingCompletion, Succeeded)
                | (_, Failed)
        ) && !self.is_terminal()
    }
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            SessionState::Planning => "planning",
            SessionState::Dispatching => "dispatching",
            SessionState::AwaitingCompletion => "awaiting_completion",
            SessionState::Succeeded => "succeeded",
            SessionState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Bookkeeping for one `handle_file` invocation.
#[derive(Debug)]
pub struct UploadSession {
    original_name: String,
    base_name: Option<String>,
    state: SessionState,
}

impl UploadSession {
    pub fn new(original_name: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            base_name: None,
            state: SessionState::Planning,
        }
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn base_name(&self) -> Option<&str> {
        self.base_name.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn set_base_name(&mut self, base_name: impl Into<String>) {
        self.base_name = Some(base_name.into());
    }

    /// Move to `next`. Out-of-order transitions are ignored and return `false`.
    pub fn advance(&mut self, next: SessionState) -> bool {
        if !self.state.can_advance_to(next) {
            tracing::warn!(
                original_name = %self.original_name,
                from = %self.state,
                to = %next,
                "Ignoring invalid session transition"
            );
            return false;
        }

        tracing::debug!(
            original_name = %self.original_name,
            base_name = self.base_name.as_deref().unwrap_or_default(),
            from = %self.state,
            to = %next,
            "Session transition"
        );
        self.state = next;
        true
    }

    /// Move to `Failed`, logging `error` at its level.
    pub fn fail(&mut self, error: &EngineError) {
        if !self.advance(SessionState::Failed) {
            return;
        }
        let base_name = self.base_name.as_deref().unwrap_or_default();
        match error.log_level() {
            LogLevel::Debug => tracing::debug!(
                original_name = %self.original_name,
                base_name = base_name,
                error = %error,
                error_code = error.error_code(),
                "Upload session failed"
            ),
            LogLevel::Warn | LogLevel::Error => tracing::warn!(
                original_name = %self.original_name,
                base_name = base_name,
                error = %error,
                error_code = error.error_code(),
                "Upload session failed"
            ),
        }
    }
}
