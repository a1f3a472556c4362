//! Data access for guests, rooms and room types
//!
//! Handlers only see the [`Repository`] trait. Two backends implement it:
//! PostgreSQL through sqlx, and an in-process store used when no database is
//! configured.
//!
//! # Example
//!
//! ```rust
//! use hotel_api::filters::Filters;
//! use hotel_api::models::{RoomType, RoomTypeFields, RoomTypeSearch, ROOM_TYPE_SORT_SAFELIST};
//! use hotel_api::repository::{MemoryRepository, Repository};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let repo = MemoryRepository::<RoomType>::new();
//! let created = repo
//!     .insert(RoomTypeFields {
//!         title: "Twin".to_string(),
//!         base_rate: 95.0,
//!         max_occupancy: 2,
//!         bed_count: 2,
//!         has_balcony: false,
//!     })
//!     .await
//!     .unwrap();
//!
//! let filters = Filters::new(1, 20, "title", ROOM_TYPE_SORT_SAFELIST);
//! let (page, metadata) = repo.list(&RoomTypeSearch::default(), &filters).await.unwrap();
//! assert_eq!(page[0].id, created.id);
//! assert_eq!(metadata.total_records, 1);
//! # });
//! ```

mod error;
mod memory;
mod postgres;
mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use memory::{MemoryRecord, MemoryRepository};
pub use postgres::{PgGuestRepository, PgRoomRepository, PgRoomTypeRepository};
pub use traits::{Repository, RepositoryResult};

use crate::models::{
    Guest, GuestFields, GuestSearch, Room, RoomFields, RoomSearch, RoomType, RoomTypeFields,
    RoomTypeSearch,
};

/// Guests, keyed by passport number
pub type GuestRepository = dyn Repository<String, Guest, GuestFields, GuestSearch>;

/// Rooms, keyed by id
pub type RoomRepository = dyn Repository<i64, Room, RoomFields, RoomSearch>;

/// Room types, keyed by id
pub type RoomTypeRepository = dyn Repository<i64, RoomType, RoomTypeFields, RoomTypeSearch>;
