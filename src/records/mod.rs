//! Patient records and image storage
//!
//! Interfaces to the document store holding patient records and the blob
//! store holding colposcopy images, with in-memory and S3 implementations.

pub mod memory;
pub mod s3;

pub use memory::{MemoryBlobStore, MemoryPatientStore};
pub use s3::S3BlobStore;

use crate::models::{Patient, PatientData};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Create a patient and return its new id.
    async fn create(&self, data: PatientData) -> Result<String>;
    /// Merge `data` into an existing patient. Last write wins.
    async fn update(&self, id: &str, data: PatientData) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Patient>>;
    async fn delete(&self, id: &str) -> Result<()>;
    /// Live view of every patient, ordered by name, refreshed on each change.
    fn subscribe(&self) -> watch::Receiver<Vec<Patient>>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key` and return a URL it can be fetched from.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> Result<String>;
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
    /// Delete the object behind `url`. An already absent object is not an error.
    async fn delete(&self, url: &str) -> Result<()>;
}

/// Storage key for a patient's image: `images/{patient}/{millis}_{file}`.
pub fn image_key(patient_id: &str, file_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "images/{}/{}_{}",
        patient_id,
        now.timestamp_millis(),
        file_name
    )
}

/// Patients whose name contains `filter`, ignoring case.
pub fn filter_patients<'a>(patients: &'a [Patient], filter: &str) -> Vec<&'a Patient> {
    let needle = filter.to_lowercase();
    patients
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .collect()
}

pub(crate) fn sort_by_name(patients: &mut [Patient]) {
    patients.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn patient(id: &str, name: &str) -> Patient {
        Patient::from_data(
            id.to_string(),
            PatientData {
                name: Some(name.to_string()),
                ..PatientData::default()
            },
        )
    }

    #[test]
    fn test_image_key_layout() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            image_key("p1", "colpo.jpg", now),
            "images/p1/1709294400000_colpo.jpg"
        );
    }

    #[test]
    fn test_filter_patients_is_case_insensitive() {
        let patients = vec![
            patient("1", "Ana Pérez"),
            patient("2", "Mariela López"),
            patient("3", "Mariana Ruiz"),
        ];

        let names: Vec<&str> = filter_patients(&patients, "MARI")
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Mariela López", "Mariana Ruiz"]);

        assert_eq!(filter_patients(&patients, "").len(), 3);
        assert!(filter_patients(&patients, "zzz").is_empty());
    }

    #[test]
    fn test_sort_by_name() {
        let mut patients = vec![patient("1", "Rosa"), patient("2", "Ana"), patient("3", "Luz")];
        sort_by_name(&mut patients);
        let names: Vec<&str> = patients.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Luz", "Rosa"]);
    }
}
