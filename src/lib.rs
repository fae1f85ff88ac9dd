//! Colposcopy report service
//!
//! A report proxy that forwards a colposcopy image and instruction to a
//! generative-language API, the client that calls it, and the patient-record
//! workflow built around them.

pub mod ai;
pub mod app;
pub mod error;
pub mod models;
pub mod prompts;
pub mod proxy;
pub mod records;
pub mod report;
pub mod wire;

pub use error::{Error, Result};
