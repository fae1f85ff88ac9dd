use super::{sort_by_name, BlobStore, PatientStore};
use crate::models::{Patient, PatientData};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use uuid::Uuid;

/// In-process patient store publishing name-ordered snapshots on every change.
#[derive(Clone)]
pub struct MemoryPatientStore {
    patients: Arc<Mutex<HashMap<String, Patient>>>,
    snapshots: Arc<watch::Sender<Vec<Patient>>>,
}

impl MemoryPatientStore {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Vec::new());
        Self {
            patients: Arc::new(Mutex::new(HashMap::new())),
            snapshots: Arc::new(sender),
        }
    }

    pub fn with_patient(self, patient: Patient) -> Self {
        self.patients
            .lock()
            .unwrap()
            .insert(patient.id.clone(), patient);
        self.publish();
        self
    }

    fn publish(&self) {
        let mut snapshot: Vec<Patient> = self.patients.lock().unwrap().values().cloned().collect();
        sort_by_name(&mut snapshot);
        self.snapshots.send_replace(snapshot);
    }
}

impl Default for MemoryPatientStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PatientStore for MemoryPatientStore {
    async fn create(&self, data: PatientData) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.patients
            .lock()
            .unwrap()
            .insert(id.clone(), Patient::from_data(id.clone(), data));
        self.publish();
        Ok(id)
    }

    async fn update(&self, id: &str, data: PatientData) -> Result<()> {
        {
            let mut patients = self.patients.lock().unwrap();
            let patient = patients
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            patient.apply(data);
        }
        self.publish();
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Patient>> {
        Ok(self.patients.lock().unwrap().get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let removed = self.patients.lock().unwrap().remove(id);
        if removed.is_none() {
            return Err(Error::NotFound(id.to_string()));
        }
        self.publish();
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Vec<Patient>> {
        self.snapshots.subscribe()
    }
}

struct StoredBlob {
    data: Vec<u8>,
    content_type: String,
}

/// In-process blob store addressing objects as `{base_url}/{key}`.
#[derive(Clone)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, StoredBlob>>>,
    base_url: String,
    upload_count: Arc<Mutex<usize>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://blobs.example.com".to_string(),
            upload_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.key_for_url(url)
            .map(|key| self.blobs.lock().unwrap().contains_key(key))
            .unwrap_or(false)
    }

    pub fn content_type(&self, url: &str) -> Option<String> {
        let key = self.key_for_url(url).ok()?;
        self.blobs
            .lock()
            .unwrap()
            .get(key)
            .map(|b| b.content_type.clone())
    }

    fn key_for_url<'a>(&self, url: &'a str) -> Result<&'a str> {
        url.strip_prefix(&self.base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| Error::Storage(format!("URL outside blob store: {}", url)))
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> Result<String> {
        *self.upload_count.lock().unwrap() += 1;
        self.blobs.lock().unwrap().insert(
            key.to_string(),
            StoredBlob {
                data: data.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("{}/{}", self.base_url, key))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let key = self.key_for_url(url)?;
        self.blobs
            .lock()
            .unwrap()
            .get(key)
            .map(|b| b.data.clone())
            .ok_or_else(|| Error::Storage(format!("File not found: {}", key)))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let key = self.key_for_url(url)?;
        if self.blobs.lock().unwrap().remove(key).is_none() {
            tracing::debug!("Blob already absent: {}", key);
        }
        Ok(())
    }
}
