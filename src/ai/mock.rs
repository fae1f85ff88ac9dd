use super::ContentGenerator;
use crate::wire::GenerateContentRequest;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

enum Scripted {
    Text(String),
    Upstream(String),
    Empty,
}

/// Scripted [`ContentGenerator`] that records every request it receives.
#[derive(Clone)]
pub struct MockContentGenerator {
    responses: Arc<Mutex<Vec<Scripted>>>,
    requests: Arc<Mutex<Vec<GenerateContentRequest>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockContentGenerator {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_text_response(self, text: String) -> Self {
        self.responses.lock().unwrap().push(Scripted::Text(text));
        self
    }

    pub fn with_upstream_error(self, message: String) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(Scripted::Upstream(message));
        self
    }

    pub fn with_empty_completion(self) -> Self {
        self.responses.lock().unwrap().push(Scripted::Empty);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_requests(&self) -> Vec<GenerateContentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockContentGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentGenerator for MockContentGenerator {
    async fn generate(&self, request: &GenerateContentRequest) -> Result<String> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        self.requests.lock().unwrap().push(request.clone());

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok("Observaciones Principales: sin hallazgos.".to_string());
        }

        let index = (*count - 1) % responses.len();
        match &responses[index] {
            Scripted::Text(text) => Ok(text.clone()),
            Scripted::Upstream(message) => Err(Error::Upstream(message.clone())),
            Scripted::Empty => Err(Error::EmptyCompletion),
        }
    }
}
