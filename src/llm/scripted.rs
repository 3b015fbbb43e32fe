use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::LlmError;
use super::provider::{LlmProvider, LlmRequest};

/// [`LlmProvider`] that replays queued replies, then repeats a default.
#[derive(Debug, Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    default_reply: Mutex<Option<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that answers every call with `text`.
    pub fn always(text: impl Into<String>) -> Self {
        let llm = Self::new();
        *llm.default_reply.lock() = Some(Ok(text.into()));
        llm
    }

    /// Provider that fails every call with `error`.
    pub fn failing(error: LlmError) -> Self {
        let llm = Self::new();
        *llm.default_reply.lock() = Some(Err(error));
        llm
    }

    pub fn push_reply(&self, text: impl Into<String>) -> &Self {
        self.replies.lock().push_back(Ok(text.into()));
        self
    }

    pub fn push_error(&self, error: LlmError) -> &Self {
        self.replies.lock().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// User prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(request.prompt.clone());

        if let Some(reply) = self.replies.lock().pop_front() {
            return reply;
        }
        self.default_reply
            .lock()
            .clone()
            .unwrap_or(Err(LlmError::Unavailable {
                message: "no scripted reply".to_string(),
            }))
    }
}
