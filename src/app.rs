//! Clinician workflow: analyze an image, save and delete patients.

use crate::ai::mime::detect_image_mime;
use crate::models::{Patient, PatientData};
use crate::records::{image_key, BlobStore, PatientStore};
use crate::report::ReportService;
use crate::{Error, Result};
use chrono::Utc;
use tracing::{info, warn};

/// An image picked by the clinician but not yet stored.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Build an upload, sniffing the MIME type from the bytes.
    pub fn new(file_name: String, bytes: Vec<u8>) -> Self {
        let mime_type = detect_image_mime(&bytes).to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }
}

/// Result of an analysis request.
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    /// The report was stored on the existing patient.
    Saved(String),
    /// The patient does not exist yet; keep the text and pass it to
    /// [`Workspace::save`] when the record is created.
    Pending(String),
}

impl Analysis {
    pub fn text(&self) -> &str {
        match self {
            Analysis::Saved(text) | Analysis::Pending(text) => text,
        }
    }
}

/// Injectable service bundle used to construct [`Workspace`].
pub struct WorkspaceServices {
    pub reports: Box<dyn ReportService>,
    pub patients: Box<dyn PatientStore>,
    pub blobs: Box<dyn BlobStore>,
}

/// Coordinates the report service with patient and image storage.
pub struct Workspace {
    reports: Box<dyn ReportService>,
    patients: Box<dyn PatientStore>,
    blobs: Box<dyn BlobStore>,
}

impl Workspace {
    pub fn with_services(services: WorkspaceServices) -> Self {
        Self {
            reports: services.reports,
            patients: services.patients,
            blobs: services.blobs,
        }
    }

    pub fn patients(&self) -> &dyn PatientStore {
        self.patients.as_ref()
    }

    /// Generate a report for a freshly picked image, or else for the image
    /// already stored on `patient`.
    pub async fn analyze(
        &self,
        patient: Option<&Patient>,
        upload: Option<&ImageUpload>,
        medical_history: &str,
    ) -> Result<Analysis> {
        let fetched;
        let (image, mime_type): (&[u8], &str) =
            match (upload, patient.and_then(|p| p.image_url.as_deref())) {
                (Some(upload), _) => (upload.bytes.as_slice(), upload.mime_type.as_str()),
                (None, Some(url)) => {
                    fetched = self.blobs.fetch(url).await?;
                    (fetched.as_slice(), detect_image_mime(&fetched))
                }
                (None, None) => return Err(Error::NoImage),
            };

        let text = self
            .reports
            .request_report(image, mime_type, medical_history)
            .await?;

        match patient {
            Some(patient) => {
                self.patients
                    .update(&patient.id, PatientData::report(text.clone()))
                    .await?;
                info!("Report saved for patient {}", patient.id);
                Ok(Analysis::Saved(text))
            }
            None => Ok(Analysis::Pending(text)),
        }
    }

    /// Create (`patient_id` is `None`) or update a patient, uploading the
    /// picked image if there is one. Returns the patient id.
    ///
    /// `pending_report` is only applied when creating.
    pub async fn save(
        &self,
        patient_id: Option<&str>,
        mut data: PatientData,
        upload: Option<&ImageUpload>,
        pending_report: Option<String>,
    ) -> Result<String> {
        match patient_id {
            Some(id) => {
                if let Some(upload) = upload {
                    data.image_url = Some(self.upload_image(id, upload).await?);
                }
                self.patients.update(id, data).await?;
                info!("Patient {} updated", id);
                Ok(id.to_string())
            }
            None => {
                if pending_report.is_some() {
                    data.report_text = pending_report;
                }
                let id = self.patients.create(data).await?;
                if let Some(upload) = upload {
                    let url = self.upload_image(&id, upload).await?;
                    self.patients.update(&id, PatientData::image(url)).await?;
                }
                info!("Patient {} created", id);
                Ok(id)
            }
        }
    }

    /// Delete a patient and its image. A missing or undeletable image does
    /// not stop the record from being deleted.
    pub async fn delete(&self, patient: &Patient) -> Result<()> {
        if let Some(url) = &patient.image_url {
            if let Err(e) = self.blobs.delete(url).await {
                warn!(
                    "Image for patient {} could not be deleted, removing record only: {}",
                    patient.id, e
                );
            }
        }

        self.patients.delete(&patient.id).await?;
        info!("Patient {} deleted", patient.id);
        Ok(())
    }

    async fn upload_image(&self, patient_id: &str, upload: &ImageUpload) -> Result<String> {
        let key = image_key(patient_id, &upload.file_name, Utc::now());
        self.blobs
            .upload(&key, &upload.bytes, &upload.mime_type)
            .await
    }
}
