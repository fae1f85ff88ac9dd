//! Data models and configuration
//!
//! Defines the patient record kept in the document store and the
//! environment-driven configuration shared by the proxy and the CLI client.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A patient document as stored in the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub age: Option<u32>,
    pub ssn: Option<String>,
    pub medical_history: Option<String>,
    pub image_url: Option<String>,
    pub report_text: Option<String>,
}

/// Field set used to create or partially update a patient.
///
/// `None` fields are left untouched on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_text: Option<String>,
}

impl Patient {
    pub fn from_data(id: String, data: PatientData) -> Self {
        Self {
            id,
            name: data.name.unwrap_or_default(),
            age: data.age,
            ssn: data.ssn,
            medical_history: data.medical_history,
            image_url: data.image_url,
            report_text: data.report_text,
        }
    }

    /// Merge the populated fields of `data` into this record.
    pub fn apply(&mut self, data: PatientData) {
        if let Some(name) = data.name {
            self.name = name;
        }
        if data.age.is_some() {
            self.age = data.age;
        }
        if data.ssn.is_some() {
            self.ssn = data.ssn;
        }
        if data.medical_history.is_some() {
            self.medical_history = data.medical_history;
        }
        if data.image_url.is_some() {
            self.image_url = data.image_url;
        }
        if data.report_text.is_some() {
            self.report_text = data.report_text;
        }
    }
}

impl PatientData {
    pub fn report(text: String) -> Self {
        Self {
            report_text: Some(text),
            ..Self::default()
        }
    }

    pub fn image(url: String) -> Self {
        Self {
            image_url: Some(url),
            ..Self::default()
        }
    }
}

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_REPORT_ENDPOINT: &str = "http://127.0.0.1:3000/api/generate-report";
/// Platform maximum execution time for one report call.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_S3_REGION: &str = "us-east-1";

/// S3-compatible bucket holding patient images.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    /// Public prefix image URLs are built from (`{public_url}/{key}`).
    pub public_url: String,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream credential; absence is reported per request, not at startup.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub upstream_timeout: Duration,
    pub bind_addr: String,
    pub max_body_bytes: usize,
    pub report_endpoint: String,
    /// Image storage; `None` unless `S3_BUCKET` is set.
    pub storage: Option<StorageConfig>,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let upstream_timeout_secs = match var("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                crate::Error::Config(format!("UPSTREAM_TIMEOUT_SECS is not a number: {}", raw))
            })?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };

        let max_body_bytes = match var("MAX_BODY_BYTES") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                crate::Error::Config(format!("MAX_BODY_BYTES is not a number: {}", raw))
            })?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        let storage = match var("S3_BUCKET") {
            Some(bucket) => {
                let required = |key: &str| {
                    var(key).ok_or_else(|| {
                        crate::Error::Config(format!("{} not set (required with S3_BUCKET)", key))
                    })
                };
                Some(StorageConfig {
                    access_key_id: required("S3_ACCESS_KEY_ID")?,
                    secret_access_key: required("S3_SECRET_ACCESS_KEY")?,
                    endpoint: required("S3_ENDPOINT")?,
                    region: var("S3_REGION").unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
                    public_url: required("S3_PUBLIC_URL")?,
                    bucket,
                })
            }
            None => None,
        };

        Ok(Self {
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: var("GEMINI_BASE_URL")
                .unwrap_or_else(|| crate::ai::gemini::client::DEFAULT_BASE_URL.to_string()),
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            max_body_bytes,
            report_endpoint: var("REPORT_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_REPORT_ENDPOINT.to_string()),
            storage,
        })
    }
}
