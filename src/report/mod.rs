//! Report client
//!
//! Caller-side orchestration of a report request: encode the image, compose
//! the instruction, call the report proxy and pull the generated text out of
//! the response envelope.

pub mod client;
pub mod mock;

pub use client::ReportClient;
pub use mock::MockReportClient;

use crate::prompts;
use crate::wire::{Content, GenerateContentRequest, InlineData, Part};
use crate::Result;
use async_trait::async_trait;
use base64::Engine as _;

#[async_trait]
pub trait ReportService: Send + Sync {
    async fn request_report(
        &self,
        image: &[u8],
        mime_type: &str,
        medical_history: &str,
    ) -> Result<String>;
}

/// Build the proxy request body for one image.
pub fn build_request(image: &[u8], mime_type: &str, medical_history: &str) -> GenerateContentRequest {
    let data = base64::engine::general_purpose::STANDARD.encode(image);

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![
                Part::Text {
                    text: prompts::compose_instruction(medical_history),
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.to_string(),
                        data,
                    },
                },
            ],
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_request_shape() {
        let image = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        let request = build_request(&image, "image/jpeg", "ninguno");

        assert_eq!(request.contents.len(), 1);
        let content = &request.contents[0];
        assert_eq!(content.role.as_deref(), Some("user"));
        assert_eq!(content.parts.len(), 2);

        match &content.parts[0] {
            Part::Text { text } => assert!(text.contains("ninguno")),
            other => panic!("expected text part, got {:?}", other),
        }
        match &content.parts[1] {
            Part::InlineData { inline_data } => {
                assert_eq!(inline_data.mime_type, "image/jpeg");
                assert_eq!(inline_data.data, "/9j/4AAQ");
                assert_eq!(
                    base64::engine::general_purpose::STANDARD
                        .decode(&inline_data.data)
                        .unwrap(),
                    image
                );
            }
            other => panic!("expected inline data part, got {:?}", other),
        }
    }

    #[test]
    fn test_build_request_serializes_wire_shape() {
        let request = build_request(&[0x01, 0x02, 0x03], "image/png", "G1P1");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(
            value["contents"][0]["parts"][1],
            serde_json::json!({ "inlineData": { "mimeType": "image/png", "data": "AQID" } })
        );
        assert_eq!(
            value["contents"][0]["parts"][0]["text"],
            prompts::compose_instruction("G1P1")
        );
    }
}
