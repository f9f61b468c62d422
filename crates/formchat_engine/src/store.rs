use std::sync::Arc;

use async_trait::async_trait;
use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::records::Record;
use crate::FetchError;

/// Remote CRUD surface of one server collection.
#[async_trait]
pub trait Collection<R: Record>: Send + Sync {
    async fn list(&self) -> Result<Vec<R>, FetchError>;
    async fn create(&self, draft: &R::Draft) -> Result<R, FetchError>;
    async fn update(&self, id: &str, patch: &R::Patch) -> Result<R, FetchError>;
    async fn delete(&self, id: &str) -> Result<(), FetchError>;
}

/// Local cache of a collection, only ever changed after the server confirms.
pub struct RecordStore<R: Record> {
    remote: Arc<dyn Collection<R>>,
    records: Vec<R>,
    last_error: Option<FetchError>,
}

impl<R: Record> RecordStore<R> {
    pub fn new(remote: Arc<dyn Collection<R>>) -> Self {
        Self {
            remote,
            records: Vec::new(),
            last_error: None,
        }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn find(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|record| record.record_id() == id)
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Replaces the cache with the server's list. On failure the cache is left as it was.
    pub async fn list(&mut self) -> Result<&[R], FetchError> {
        let records = self.remote.list().await.map_err(|err| self.fail("list", err))?;
        engine_info!("loaded {} {}", records.len(), R::COLLECTION);
        self.records = records;
        self.last_error = None;
        Ok(&self.records)
    }

    /// Appends the record as returned by the server, including its assigned id.
    pub async fn create(&mut self, draft: &R::Draft) -> Result<R, FetchError> {
        let record = self
            .remote
            .create(draft)
            .await
            .map_err(|err| self.fail("create", err))?;
        self.records.push(record.clone());
        self.last_error = None;
        Ok(record)
    }

    pub async fn update(&mut self, id: &str, patch: &R::Patch) -> Result<R, FetchError> {
        let record = self
            .remote
            .update(id, patch)
            .await
            .map_err(|err| self.fail("update", err))?;
        match self.records.iter_mut().find(|cached| cached.record_id() == id) {
            Some(slot) => *slot = record.clone(),
            None => engine_debug!("updated {} {} was not cached", R::COLLECTION, id),
        }
        self.last_error = None;
        Ok(record)
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), FetchError> {
        self.remote
            .delete(id)
            .await
            .map_err(|err| self.fail("delete", err))?;
        self.records.retain(|record| record.record_id() != id);
        self.last_error = None;
        Ok(())
    }

    fn fail(&mut self, op: &str, err: FetchError) -> FetchError {
        engine_warn!("{} {} failed: {}", op, R::COLLECTION, err);
        self.last_error = Some(err.clone());
        err
    }
}
