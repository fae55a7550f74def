//! Test doubles shared by the pipeline's unit tests.

use crate::transport::{ChatRequest, CompletionTransport};
use async_trait::async_trait;
use mindmates_core::ChatError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted transport: hands out canned contents in order and counts calls.
pub(crate) struct ScriptedTransport {
    responses: Mutex<Vec<Result<String, ChatError>>>,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<String, ChatError>>) -> Self {
        let mut responses = responses;
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Content of the `index`-th request's sole message.
    pub fn request_content(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index].messages[0].content.clone()
    }
}

#[async_trait]
impl CompletionTransport for ScriptedTransport {
    async fn complete(&self, _api_key: &str, request: &ChatRequest) -> Result<String, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(ChatError::Transport("script exhausted".into())))
    }
}
