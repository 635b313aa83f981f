#![allow(dead_code)]

//! In-memory artifact store. Backs the orchestration unit tests; never
//! used by a running server.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::artifacts::{check_key, ArtifactStore};

#[derive(Default)]
pub struct MemoryArtifactStore {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn load(&self, job_id: &str, name: &str) -> Result<Option<String>> {
        check_key(job_id, name)?;
        let entries = self.entries.lock().expect("artifact store lock poisoned");
        Ok(entries.get(&(job_id.to_string(), name.to_string())).cloned())
    }

    async fn save(&self, job_id: &str, name: &str, value: &str) -> Result<()> {
        check_key(job_id, name)?;
        let mut entries = self.entries.lock().expect("artifact store lock poisoned");
        entries.insert((job_id.to_string(), name.to_string()), value.to_string());
        Ok(())
    }

    async fn append(&self, job_id: &str, name: &str, line: &str) -> Result<()> {
        check_key(job_id, name)?;
        let mut entries = self.entries.lock().expect("artifact store lock poisoned");
        let entry = entries
            .entry((job_id.to_string(), name.to_string()))
            .or_default();
        entry.push_str(line);
        entry.push('\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_append() {
        let store = MemoryArtifactStore::new();
        assert!(store.load("job-1", "a.json").await.unwrap().is_none());

        store.save("job-1", "a.json", "{}").await.unwrap();
        assert_eq!(store.load("job-1", "a.json").await.unwrap().unwrap(), "{}");

        store.append("job-1", "log", "one").await.unwrap();
        store.append("job-1", "log", "two").await.unwrap();
        assert_eq!(
            store.load("job-1", "log").await.unwrap().unwrap(),
            "one\ntwo\n"
        );
    }
}
