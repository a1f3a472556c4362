//! In-process repository
//!
//! Mirrors the PostgreSQL semantics closely enough for the handlers to be
//! exercised without a database: generated ids, unique keys, optimistic
//! versions, full-text style filters and stable ordering.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::error::{RepositoryError, RepositoryOperation};
use super::traits::{Repository, RepositoryResult};
use crate::filters::{calculate_metadata, Filters, Metadata, SortOrder};
use crate::models::{
    Guest, GuestFields, GuestSearch, Room, RoomFields, RoomSearch, RoomType, RoomTypeFields,
    RoomTypeSearch,
};

/// A record the in-memory store knows how to key, filter and order
pub trait MemoryRecord: Clone + Send + Sync + 'static {
    type Key: fmt::Display + Send + Sync;
    type Fields: Send + 'static;
    type Search: Sync;

    /// Entity name used in errors
    const ENTITY: &'static str;

    fn create(id: i64, fields: Self::Fields, created_at: DateTime<Utc>) -> Self;
    fn id(&self) -> i64;
    fn version(&self) -> i32;
    fn set_version(&mut self, version: i32);
    fn has_key(&self, key: &Self::Key) -> bool;
    /// Value of the column carrying a unique constraint
    fn unique_key(&self) -> String;
    fn matches(&self, search: &Self::Search) -> bool;
    fn compare_by(&self, other: &Self, column: &str) -> Ordering;
}

#[derive(Debug)]
struct Store<R> {
    next_id: i64,
    rows: BTreeMap<i64, R>,
}

/// Repository backed by a map behind an async lock
#[derive(Debug)]
pub struct MemoryRepository<R> {
    store: RwLock<Store<R>>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Default for MemoryRepository<R> {
    fn default() -> Self {
        Self {
            store: RwLock::new(Store {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
            _record: PhantomData,
        }
    }
}

impl<R: MemoryRecord> MemoryRepository<R> {
    pub fn new() -> Self {
        Self::default()
    }
}

fn find_by_key<'a, R: MemoryRecord>(store: &'a Store<R>, key: &R::Key) -> Option<&'a R> {
    store.rows.values().find(|row| row.has_key(key))
}

fn key_taken<R: MemoryRecord>(store: &Store<R>, candidate: &R) -> bool {
    let unique = candidate.unique_key();
    store
        .rows
        .values()
        .any(|row| row.id() != candidate.id() && row.unique_key() == unique)
}

#[async_trait]
impl<R: MemoryRecord> Repository<R::Key, R, R::Fields, R::Search> for MemoryRepository<R> {
    async fn insert(&self, fields: R::Fields) -> RepositoryResult<R> {
        let mut store = self.store.write().await;

        let record = R::create(store.next_id, fields, Utc::now());
        if key_taken(&store, &record) {
            return Err(RepositoryError::already_exists(
                RepositoryOperation::Insert,
                R::ENTITY,
                record.unique_key(),
            ));
        }

        store.next_id += 1;
        store.rows.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn find(&self, key: &R::Key) -> RepositoryResult<R> {
        let store = self.store.read().await;
        find_by_key(&store, key)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(RepositoryOperation::Find, R::ENTITY, key))
    }

    async fn list(
        &self,
        search: &R::Search,
        filters: &Filters,
    ) -> RepositoryResult<(Vec<R>, Metadata)> {
        let store = self.store.read().await;
        let (column, direction) = filters.ordering();

        let mut matching: Vec<&R> = store.rows.values().filter(|row| row.matches(search)).collect();
        matching.sort_by(|a, b| {
            let primary = match direction {
                SortOrder::Asc => a.compare_by(b, column),
                SortOrder::Desc => b.compare_by(a, column),
            };
            primary.then_with(|| a.id().cmp(&b.id()))
        });

        let total = matching.len() as i64;
        let offset = usize::try_from(filters.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(filters.limit()).unwrap_or(0);
        let page: Vec<R> = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        // Like a windowed count, the total is only known when the page has rows.
        let total = if page.is_empty() { 0 } else { total };
        Ok((page, calculate_metadata(total, filters.page, filters.page_size)))
    }

    async fn update(&self, entity: &mut R) -> RepositoryResult<()> {
        let mut store = self.store.write().await;

        match store.rows.get(&entity.id()) {
            Some(current) if current.version() == entity.version() => {}
            _ => return Err(RepositoryError::edit_conflict(R::ENTITY, entity.id())),
        }
        if key_taken(&store, entity) {
            return Err(RepositoryError::already_exists(
                RepositoryOperation::Update,
                R::ENTITY,
                entity.unique_key(),
            ));
        }

        entity.set_version(entity.version() + 1);
        store.rows.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn delete(&self, key: &R::Key) -> RepositoryResult<()> {
        let mut store = self.store.write().await;
        let id = find_by_key(&store, key)
            .map(|row| row.id())
            .ok_or_else(|| RepositoryError::not_found(RepositoryOperation::Delete, R::ENTITY, key))?;
        store.rows.remove(&id);
        Ok(())
    }
}

/// Whether every word of `query` occurs as a word of `document`
///
/// Case-insensitive; an empty query matches everything.
fn text_matches(document: &str, query: &str) -> bool {
    let words = |text: &str| -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
            .collect()
    };
    let document = words(document);
    words(query).iter().all(|term| document.contains(term))
}

impl MemoryRecord for Guest {
    type Key = String;
    type Fields = GuestFields;
    type Search = GuestSearch;

    const ENTITY: &'static str = "Guest";

    fn create(id: i64, fields: GuestFields, created_at: DateTime<Utc>) -> Self {
        Guest {
            id,
            fields,
            created_at,
            version: 1,
        }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn has_key(&self, key: &String) -> bool {
        self.fields.passport_number == *key
    }

    fn unique_key(&self) -> String {
        self.fields.passport_number.clone()
    }

    fn matches(&self, search: &GuestSearch) -> bool {
        text_matches(&self.fields.name, &search.name)
            && text_matches(&self.fields.country, &search.country)
    }

    fn compare_by(&self, other: &Self, column: &str) -> Ordering {
        match column {
            "passport_number" => self.fields.passport_number.cmp(&other.fields.passport_number),
            "name" => self.fields.name.cmp(&other.fields.name),
            "created_at" => self.created_at.cmp(&other.created_at),
            _ => Ordering::Equal,
        }
    }
}

impl MemoryRecord for Room {
    type Key = i64;
    type Fields = RoomFields;
    type Search = RoomSearch;

    const ENTITY: &'static str = "Room";

    fn create(id: i64, fields: RoomFields, created_at: DateTime<Utc>) -> Self {
        Room {
            id,
            created_at,
            fields,
            version: 1,
        }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn has_key(&self, key: &i64) -> bool {
        self.id == *key
    }

    fn unique_key(&self) -> String {
        self.fields.room_number.to_string()
    }

    fn matches(&self, search: &RoomSearch) -> bool {
        text_matches(&self.fields.room_type, &search.room_type)
            && search
                .available
                .map_or(true, |available| self.fields.available == available)
    }

    fn compare_by(&self, other: &Self, column: &str) -> Ordering {
        match column {
            "id" => self.id.cmp(&other.id),
            "room_number" => self.fields.room_number.cmp(&other.fields.room_number),
            "max_occupancy" => self.fields.max_occupancy.cmp(&other.fields.max_occupancy),
            _ => Ordering::Equal,
        }
    }
}

impl MemoryRecord for RoomType {
    type Key = i64;
    type Fields = RoomTypeFields;
    type Search = RoomTypeSearch;

    const ENTITY: &'static str = "RoomType";

    fn create(id: i64, fields: RoomTypeFields, created_at: DateTime<Utc>) -> Self {
        RoomType {
            id,
            fields,
            created_at,
            version: 1,
        }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn has_key(&self, key: &i64) -> bool {
        self.id == *key
    }

    fn unique_key(&self) -> String {
        self.fields.title.clone()
    }

    fn matches(&self, search: &RoomTypeSearch) -> bool {
        text_matches(&self.fields.title, &search.title)
    }

    fn compare_by(&self, other: &Self, column: &str) -> Ordering {
        match column {
            "id" => self.id.cmp(&other.id),
            "title" => self.fields.title.cmp(&other.fields.title),
            "base_rate" => self.fields.base_rate.total_cmp(&other.fields.base_rate),
            _ => Ordering::Equal,
        }
    }
}
