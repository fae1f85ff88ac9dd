use super::ReportService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A recorded `request_report` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportCall {
    pub image: Vec<u8>,
    pub mime_type: String,
    pub medical_history: String,
}

#[derive(Clone)]
pub struct MockReportClient {
    responses: Arc<Mutex<Vec<std::result::Result<String, String>>>>,
    calls: Arc<Mutex<Vec<ReportCall>>>,
}

impl MockReportClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_report(self, text: String) -> Self {
        self.responses.lock().unwrap().push(Ok(text));
        self
    }

    pub fn with_failure(self, message: String) -> Self {
        self.responses.lock().unwrap().push(Err(message));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_calls(&self) -> Vec<ReportCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockReportClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportService for MockReportClient {
    async fn request_report(
        &self,
        image: &[u8],
        mime_type: &str,
        medical_history: &str,
    ) -> Result<String> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(ReportCall {
            image: image.to_vec(),
            mime_type: mime_type.to_string(),
            medical_history: medical_history.to_string(),
        });

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(format!(
                "Observaciones Principales: imagen de {} bytes analizada.",
                image.len()
            ));
        }

        let index = (calls.len() - 1) % responses.len();
        responses[index].clone().map_err(Error::Report)
    }
}
