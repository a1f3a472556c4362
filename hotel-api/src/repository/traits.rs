//! Repository trait definitions

use async_trait::async_trait;

use super::error::RepositoryError;
use crate::filters::{Filters, Metadata};

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// CRUD access to one resource
///
/// The trait is object safe so application state can hold either backend
/// behind an `Arc<dyn Repository<..>>`.
///
/// # Type Parameters
///
/// - `Key`: what a client addresses the entity by (passport number, id)
/// - `Entity`: the stored record, bookkeeping included
/// - `Fields`: the client-supplied attributes used to create an entity
/// - `Search`: resource-specific list filters
#[async_trait]
pub trait Repository<Key, Entity, Fields, Search>: Send + Sync
where
    Key: Send + Sync,
    Entity: Send,
    Fields: Send + 'static,
    Search: Sync,
{
    /// Store a new entity
    ///
    /// Fails with `AlreadyExists` when a unique key is taken.
    async fn insert(&self, fields: Fields) -> RepositoryResult<Entity>;

    /// Load one entity; `NotFound` when absent
    async fn find(&self, key: &Key) -> RepositoryResult<Entity>;

    /// One page of entities matching `search`, ordered by the validated
    /// sort key with the id as tie-break
    ///
    /// `filters` must have passed
    /// [`validate_filters`](crate::filters::validate_filters).
    async fn list(
        &self,
        search: &Search,
        filters: &Filters,
    ) -> RepositoryResult<(Vec<Entity>, Metadata)>;

    /// Write back an entity previously returned by `find`
    ///
    /// Succeeds only if the stored version still matches `entity.version`,
    /// then bumps it. A stale or deleted row gives `EditConflict`.
    async fn update(&self, entity: &mut Entity) -> RepositoryResult<()>;

    /// Remove an entity; `NotFound` when absent
    async fn delete(&self, key: &Key) -> RepositoryResult<()>;
}
