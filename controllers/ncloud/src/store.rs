//! Local state file: which handle each declared resource was created as.
//!
//! Records keep manifest order so destroy can walk them in reverse. The
//! file is replaced atomically (write to a sibling, then rename).

use crate::error::ControllerError;
use crate::lifecycle::Handle;
use crate::manifest::ResourceSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One reconciled resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub name: String,
    pub kind: String,
    pub handle: Handle,
    /// Spec as last applied, references resolved
    pub spec: ResourceSpec,
    /// Last observed vendor status; `None` until the first wait completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateDocument {
    #[serde(default)]
    resources: Vec<ResourceRecord>,
}

/// In-memory view of the state file
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    records: Vec<ResourceRecord>,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ControllerError + '_ {
    move |source| ControllerError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl StateStore {
    /// Load the state file; a missing file is an empty state
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, ControllerError> {
        let path = path.into();
        let records = match tokio::fs::read_to_string(&path).await {
            Ok(json) => serde_json::from_str::<StateDocument>(&json)?.resources,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => return Err(io_error(&path)(e)),
        };
        Ok(Self { path, records })
    }

    pub async fn save(&self) -> Result<(), ControllerError> {
        let document = StateDocument {
            resources: self.records.clone(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, json).await.map_err(io_error(&tmp))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(io_error(&self.path))?;
        debug!("Saved {} records to {}", self.records.len(), self.path.display());
        Ok(())
    }

    pub fn records(&self) -> &[ResourceRecord] {
        &self.records
    }

    pub fn get(&self, name: &str) -> Option<&ResourceRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Replace the record of the same name in place, or append
    pub fn upsert(&mut self, record: ResourceRecord) {
        match self.records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<ResourceRecord> {
        let index = self.records.iter().position(|r| r.name == name)?;
        Some(self.records.remove(index))
    }
}
