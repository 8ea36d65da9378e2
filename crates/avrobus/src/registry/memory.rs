//! In-memory schema registry for testing and development

use super::SchemaRegistryClient;
use crate::error::{RegistryError, RegistryResult};
use crate::fingerprint::SchemaFingerprint;
use crate::types::SchemaId;
use apache_avro::Schema;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// In-memory registry
///
/// Ids are global, start at 1 and are deduplicated by schema fingerprint.
/// Each subject keeps the ids registered under it in registration order.
pub struct MemoryRegistry {
    /// Schema ID counter
    next_id: AtomicI32,
    /// Schemas by ID
    schemas: DashMap<SchemaId, Arc<Schema>>,
    /// Fingerprint -> ID mapping (for deduplication)
    fingerprints: DashMap<SchemaFingerprint, SchemaId>,
    /// Subject -> versions, oldest first
    subjects: DashMap<String, Vec<SchemaId>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI32::new(1),
            schemas: DashMap::new(),
            fingerprints: DashMap::new(),
            subjects: DashMap::new(),
        }
    }

    /// Number of distinct schemas
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered subjects, sorted
    pub fn subjects(&self) -> Vec<String> {
        let mut subjects: Vec<String> = self.subjects.iter().map(|e| e.key().clone()).collect();
        subjects.sort();
        subjects
    }

    /// Ids registered under `subject`, oldest first
    pub fn versions(&self, subject: &str) -> RegistryResult<Vec<SchemaId>> {
        self.subjects
            .get(subject)
            .map(|versions| versions.clone())
            .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))
    }

    /// Most recently registered id under `subject`
    pub fn latest(&self, subject: &str) -> RegistryResult<SchemaId> {
        self.versions(subject)?
            .last()
            .copied()
            .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))
    }

    fn id_for(&self, schema: &Schema) -> SchemaId {
        let fingerprint = SchemaFingerprint::compute(schema);
        // The entry guard holds the shard lock, so two concurrent
        // registrations of a new schema agree on one id.
        *self.fingerprints.entry(fingerprint).or_insert_with(|| {
            let id = SchemaId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
            self.schemas.insert(id, Arc::new(schema.clone()));
            id
        })
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchemaRegistryClient for MemoryRegistry {
    async fn register(&self, subject: &str, schema: &Schema) -> RegistryResult<SchemaId> {
        let id = self.id_for(schema);

        let mut versions = self.subjects.entry(subject.to_string()).or_default();
        if !versions.contains(&id) {
            versions.push(id);
            tracing::debug!(
                subject = %subject,
                schema_id = %id,
                version = versions.len(),
                "Registered schema version"
            );
        }

        Ok(id)
    }

    async fn get_by_id(&self, id: SchemaId) -> RegistryResult<Arc<Schema>> {
        self.schemas
            .get(&id)
            .map(|schema| Arc::clone(schema.value()))
            .ok_or(RegistryError::SchemaNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_schema() -> Schema {
        Schema::parse_str(
            r#"{"type": "record", "name": "User", "fields": [{"name": "id", "type": "long"}]}"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_ids_start_at_one() {
        let registry = MemoryRegistry::new();
        let id = registry.register("users-value", &user_schema()).await.unwrap();
        assert_eq!(id, SchemaId::new(1));

        let id = registry.register("users-value", &Schema::Long).await.unwrap();
        assert_eq!(id, SchemaId::new(2));
    }

    #[tokio::test]
    async fn test_schema_deduplication() {
        let registry = MemoryRegistry::new();

        let id1 = registry.register("events-value", &user_schema()).await.unwrap();
        let id2 = registry
            .register("notifications-value", &user_schema())
            .await
            .unwrap();
        let again = registry.register("events-value", &user_schema()).await.unwrap();

        assert_eq!(id1, id2);
        assert_eq!(id1, again);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.subjects(), ["events-value", "notifications-value"]);
        assert_eq!(registry.versions("events-value").unwrap(), [id1]);
    }

    #[tokio::test]
    async fn test_versions_in_registration_order() {
        let registry = MemoryRegistry::new();
        let a = registry.register("s", &Schema::Int).await.unwrap();
        let b = registry.register("s", &Schema::String).await.unwrap();

        assert_eq!(registry.versions("s").unwrap(), [a, b]);
        assert_eq!(registry.latest("s").unwrap(), b);
        assert!(matches!(
            registry.latest("missing"),
            Err(RegistryError::SubjectNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let registry = MemoryRegistry::new();
        let id = registry.register("users-value", &user_schema()).await.unwrap();

        let schema = registry.get_by_id(id).await.unwrap();
        assert_eq!(*schema, user_schema());

        let err = registry.get_by_id(SchemaId::new(999)).await.unwrap_err();
        assert!(matches!(err, RegistryError::SchemaNotFound(SchemaId(999))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registration_agrees_on_id() {
        let registry = Arc::new(MemoryRegistry::new());
        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    registry
                        .register(&format!("subject-{}", i % 4), &user_schema())
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids, [SchemaId::new(1)]);
        assert_eq!(registry.subjects().len(), 4);
    }
}
