//! The assistant — wires routing, the directory, normalization,
//! presentation, and session history together.
//!
//! One instance serves every session. Each message is processed
//! independently: snapshot history → record the user turn → route →
//! act → record the reply. Upstream failures surface as `AssistantError`
//! and are rendered to stable text at the transport edge; they never
//! append an assistant turn.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::directory::{Directory, DirectoryError, PatientQuery};
use crate::fields::CanonicalPatient;
use crate::intent::{self, Intent};
use crate::normalize;
use crate::presenter;
use crate::session::{ConversationTurn, Role, SessionStore};
use crate::tools::{ToolCall, CATALOG};

/// Failures a message can hit after routing. Zero-result filters and
/// unrecognized intents are replies, not errors.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl AssistantError {
    /// Stable, user-readable rendering — raw detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AssistantError::Directory(err) => presenter::render_error(err),
        }
    }
}

/// Result of a tool invocation: text for the calling runtime, plus the
/// canonical records when the tool produced any.
#[derive(Debug, Clone)]
pub struct ToolReply {
    pub text: String,
    pub records: Option<Vec<CanonicalPatient>>,
}

/// The chat assistant. Cheap to share behind an `Arc`.
pub struct Assistant {
    config: AppConfig,
    directory: Arc<dyn Directory>,
    sessions: SessionStore,
}

impl Assistant {
    pub fn new(config: AppConfig, directory: Arc<dyn Directory>) -> Self {
        let sessions = SessionStore::new(config.session.max_turns);
        Self {
            config,
            directory,
            sessions,
        }
    }

    /// Handle one chat message for one session.
    ///
    /// The user turn is recorded before routing; the assistant turn is
    /// recorded only when a reply was produced, so a failed upstream call
    /// leaves the history exactly one turn longer.
    pub async fn process_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<String, AssistantError> {
        let context = self.sessions.history(session_id);
        self.sessions
            .append(session_id, ConversationTurn::now(Role::User, message));

        let routed = intent::route(message, &context);
        tracing::debug!(session_id, intent = ?routed, "routed utterance");

        let reply = match routed {
            Intent::Greeting { name } => presenter::render_greeting(name.as_deref()),
            Intent::Help => presenter::render_help(),
            Intent::ListTools => presenter::render_tool_catalog(CATALOG),
            Intent::GetPatients { name_filter, limit } => {
                self.patients_reply(name_filter.as_deref(), limit).await?
            }
            Intent::Unknown { utterance } => {
                tracing::info!(session_id, %utterance, "unrecognized intent");
                presenter::render_fallback()
            }
        };

        self.sessions
            .append(session_id, ConversationTurn::now(Role::Assistant, reply.clone()));
        Ok(reply)
    }

    /// Execute a parsed tool call.
    pub async fn invoke_tool(&self, call: ToolCall) -> Result<ToolReply, AssistantError> {
        match call {
            ToolCall::GetPatientList {
                patient_name,
                limit,
            } => {
                let records = self
                    .fetch_patient_records(patient_name.as_deref(), limit)
                    .await?;
                Ok(ToolReply {
                    text: presenter::render_patients(&records),
                    records: Some(records),
                })
            }
            ToolCall::ListTools => Ok(ToolReply {
                text: presenter::render_tool_catalog(CATALOG),
                records: None,
            }),
        }
    }

    /// Clear one session's history, or every session's when no id is
    /// given. Returns the number of sessions removed.
    pub fn clear_history(&self, session_id: Option<&str>) -> usize {
        match session_id {
            Some(id) => {
                if self.sessions.clear(id) {
                    1
                } else {
                    0
                }
            }
            None => {
                let count = self.sessions.session_count();
                self.sessions.clear_all();
                count
            }
        }
    }

    /// Snapshot of one session's turns.
    pub fn history(&self, session_id: &str) -> Vec<ConversationTurn> {
        self.sessions.history(session_id)
    }

    /// Number of live sessions (status endpoint).
    pub fn session_count(&self) -> usize {
        self.sessions.session_count()
    }

    /// Where the upstream directory lives (status endpoint).
    pub fn directory_url(&self) -> String {
        format!(
            "{}{}",
            self.config.directory.base_url, self.config.directory.patients_path
        )
    }

    async fn patients_reply(
        &self,
        name_filter: Option<&str>,
        limit: Option<u32>,
    ) -> Result<String, AssistantError> {
        let records = self.fetch_patient_records(name_filter, limit).await?;
        Ok(presenter::render_patients(&records))
    }

    /// Fetch + normalize one patient query.
    ///
    /// An explicit limit of 0 means "no results" and never reaches the
    /// upstream; otherwise the configured default applies when no limit
    /// was given. The filter and limit are re-applied after normalization
    /// — the upstream's own filtering is an optimization, not a contract.
    async fn fetch_patient_records(
        &self,
        name_filter: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<CanonicalPatient>, AssistantError> {
        if limit == Some(0) {
            return Ok(Vec::new());
        }
        let effective_limit = limit.unwrap_or(self.config.directory.default_limit);

        let query = PatientQuery {
            name: name_filter.map(str::to_string),
            limit: effective_limit,
        };
        let raw = self.directory.fetch_patients(&query).await?;

        let records = normalize::normalize(
            &raw,
            &self.config.aliases,
            name_filter,
            Some(effective_limit),
        )
        .map_err(DirectoryError::from)?;

        tracing::info!(
            filter = name_filter.unwrap_or("<none>"),
            limit = effective_limit,
            matched = records.len(),
            "patient query served"
        );
        Ok(records)
    }
}
