//! Camera inventory collaborators
//!
//! The inventory is read-only to this crate and is only queried on demand;
//! refresh cadence belongs to the caller.

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;

use serde::Deserialize;

use super::descriptor::CameraDescriptor;
use crate::error::{Error, Result};

/// Source of the current camera list
pub trait CameraInventory {
    /// Fetch the current camera descriptors
    fn cameras(&self) -> impl Future<Output = Result<Vec<CameraDescriptor>>> + Send;
}

/// Inventory documents are either a bare array or `{"cameras": [...]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum InventoryDocument {
    List(Vec<CameraDescriptor>),
    Wrapped { cameras: Vec<CameraDescriptor> },
}

impl InventoryDocument {
    fn into_cameras(self) -> Vec<CameraDescriptor> {
        match self {
            InventoryDocument::List(cameras) => cameras,
            InventoryDocument::Wrapped { cameras } => cameras,
        }
    }
}

fn parse_document(json: &str) -> Result<Vec<CameraDescriptor>> {
    let doc: InventoryDocument = serde_json::from_str(json)?;
    let cameras = doc.into_cameras();

    // Sessions are keyed by camera id
    let mut seen = HashSet::new();
    for camera in &cameras {
        if !seen.insert(&camera.id) {
            return Err(Error::Inventory(format!("duplicate camera id {}", camera.id)));
        }
    }

    Ok(cameras)
}

/// Fixed, in-memory inventory
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    cameras: Vec<CameraDescriptor>,
}

impl StaticInventory {
    pub fn new(cameras: Vec<CameraDescriptor>) -> Self {
        Self { cameras }
    }

    /// Parse an inventory document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(parse_document(json)?))
    }

    /// Replace the camera list
    pub fn replace(&mut self, cameras: Vec<CameraDescriptor>) {
        self.cameras = cameras;
    }
}

impl CameraInventory for StaticInventory {
    async fn cameras(&self) -> Result<Vec<CameraDescriptor>> {
        Ok(self.cameras.clone())
    }
}

/// Inventory read from a JSON file on every query
#[derive(Debug, Clone)]
pub struct JsonFileInventory {
    path: PathBuf,
}

impl JsonFileInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CameraInventory for JsonFileInventory {
    async fn cameras(&self) -> Result<Vec<CameraDescriptor>> {
        let json = tokio::fs::read_to_string(&self.path).await?;
        let cameras = parse_document(&json)?;

        tracing::debug!(
            path = %self.path.display(),
            cameras = cameras.len(),
            "Inventory loaded"
        );

        Ok(cameras)
    }
}
