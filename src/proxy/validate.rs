//! Boundary decoding of the report request body.
//!
//! The body is decoded into optional-field raw types and checked once; only a
//! fully populated [`ReportRequest`] leaves this module.

use super::ProxyError;
use crate::wire::{Content, GenerateContentRequest, InlineData, Part};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawBody {
    contents: Option<Vec<RawContent>>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    parts: Option<Vec<RawPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPart {
    text: Option<String>,
    inline_data: Option<RawInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInlineData {
    mime_type: Option<String>,
    data: Option<String>,
}

/// A validated report request: the instruction plus at least one image.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub instruction: String,
    pub images: Vec<InlineData>,
}

impl ReportRequest {
    /// Parse and validate a raw request body.
    pub fn from_body(body: &[u8]) -> Result<Self, ProxyError> {
        let raw: RawBody = serde_json::from_slice(body)
            .map_err(|e| ProxyError::BadRequest(Some(format!("JSON inválido: {}", e))))?;

        let parts = raw
            .contents
            .and_then(|contents| contents.into_iter().next())
            .and_then(|content| content.parts)
            .filter(|parts| !parts.is_empty())
            .ok_or(ProxyError::BadRequest(None))?;

        let mut texts = Vec::new();
        let mut images = Vec::new();
        for part in parts {
            if let Some(text) = part.text.filter(|t| !t.is_empty()) {
                texts.push(text);
            }
            if let Some(inline) = part.inline_data {
                images.push(validate_inline(inline)?);
            }
        }

        if texts.is_empty() || images.is_empty() {
            return Err(ProxyError::BadRequest(Some(
                "Falta el prompt o la imagen en la solicitud.".to_string(),
            )));
        }

        Ok(Self {
            instruction: texts.join("\n"),
            images,
        })
    }

    /// The single multimodal request forwarded upstream.
    pub fn into_upstream(self) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(self.images.len() + 1);
        parts.push(Part::Text {
            text: self.instruction,
        });
        parts.extend(
            self.images
                .into_iter()
                .map(|inline_data| Part::InlineData { inline_data }),
        );

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
        }
    }
}

fn validate_inline(raw: RawInlineData) -> Result<InlineData, ProxyError> {
    match (raw.mime_type, raw.data) {
        (Some(mime_type), Some(data)) if !mime_type.is_empty() && !data.is_empty() => {
            Ok(InlineData { mime_type, data })
        }
        _ => Err(ProxyError::BadRequest(Some(
            "La imagen requiere mimeType y data.".to_string(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn image_part() -> serde_json::Value {
        json!({ "inlineData": { "mimeType": "image/jpeg", "data": "/9j/4AAQ" } })
    }

    #[test]
    fn test_valid_request() {
        let request = ReportRequest::from_body(&body(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Informe" }, image_part()] }]
        })))
        .unwrap();

        assert_eq!(request.instruction, "Informe");
        assert_eq!(
            request.images,
            vec![InlineData {
                mime_type: "image/jpeg".to_string(),
                data: "/9j/4AAQ".to_string(),
            }]
        );
    }

    #[test]
    fn test_multiple_images_and_texts_are_kept() {
        let request = ReportRequest::from_body(&body(json!({
            "contents": [{ "parts": [
                { "text": "primera" },
                image_part(),
                { "text": "segunda" },
                { "inlineData": { "mimeType": "image/png", "data": "iVBO" } }
            ] }]
        })))
        .unwrap();

        assert_eq!(request.instruction, "primera\nsegunda");
        assert_eq!(request.images.len(), 2);
        assert_eq!(request.images[1].mime_type, "image/png");
    }

    #[test]
    fn test_malformed_shapes_are_bad_requests() {
        let cases = [
            json!({}),
            json!({ "contents": null }),
            json!({ "contents": [] }),
            json!({ "contents": [{}] }),
            json!({ "contents": [{ "parts": [] }] }),
            json!({ "contents": [{ "parts": [{ "text": "solo texto" }] }] }),
            json!({ "contents": [{ "parts": [image_part()] }] }),
            json!({ "contents": [{ "parts": [{ "text": "" }, image_part()] }] }),
            json!({ "contents": [{ "parts": [
                { "text": "x" },
                { "inlineData": { "mimeType": "image/jpeg" } }
            ] }] }),
            json!({ "contents": [{ "parts": [
                { "text": "x" },
                { "inlineData": { "mimeType": "", "data": "abc" } }
            ] }] }),
        ];

        for case in cases {
            let result = ReportRequest::from_body(&body(case.clone()));
            assert!(
                matches!(result, Err(ProxyError::BadRequest(_))),
                "expected BadRequest for {}",
                case
            );
        }
    }

    #[test]
    fn test_invalid_json_is_bad_request() {
        let result = ReportRequest::from_body(b"not json");
        assert!(matches!(result, Err(ProxyError::BadRequest(Some(_)))));
    }

    #[test]
    fn test_wrong_field_types_are_bad_requests() {
        let result = ReportRequest::from_body(&body(json!({ "contents": "nope" })));
        assert!(matches!(result, Err(ProxyError::BadRequest(_))));

        let result = ReportRequest::from_body(&body(json!({
            "contents": [{ "parts": [{ "text": 42 }, image_part()] }]
        })));
        assert!(matches!(result, Err(ProxyError::BadRequest(_))));
    }

    #[test]
    fn test_into_upstream_puts_instruction_first() {
        let request = ReportRequest {
            instruction: "Informe".to_string(),
            images: vec![InlineData {
                mime_type: "image/jpeg".to_string(),
                data: "AAAA".to_string(),
            }],
        };

        assert_eq!(
            serde_json::to_value(request.into_upstream()).unwrap(),
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "Informe" },
                        { "inlineData": { "mimeType": "image/jpeg", "data": "AAAA" } }
                    ]
                }]
            })
        );
    }
}
