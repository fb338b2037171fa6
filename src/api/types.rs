//! Shared types for the chat API layer.

use std::sync::Arc;

use crate::assistant::Assistant;

/// Shared context for all API routes: one assistant serves every
/// connection and session.
#[derive(Clone)]
pub struct ApiContext {
    pub assistant: Arc<Assistant>,
}

impl ApiContext {
    pub fn new(assistant: Arc<Assistant>) -> Self {
        Self { assistant }
    }
}
