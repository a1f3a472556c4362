//! Application state management

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::{
    config::Config,
    error::Result,
    middleware::ClientRateLimiter,
    models::{Guest, Room, RoomType},
    repository::{
        GuestRepository, MemoryRepository, PgGuestRepository, PgRoomRepository,
        PgRoomTypeRepository, RoomRepository, RoomTypeRepository,
    },
};

/// Application state shared across handlers
///
/// Cloning is cheap; every member sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    guests: Arc<GuestRepository>,
    rooms: Arc<RoomRepository>,
    room_types: Arc<RoomTypeRepository>,
    rate_limiter: Option<Arc<ClientRateLimiter>>,
    pool: Option<PgPool>,
}

impl AppState {
    /// State backed by PostgreSQL
    ///
    /// Every query is abandoned after `query_timeout`.
    pub fn postgres(config: Config, pool: PgPool, query_timeout: Duration) -> Result<Self> {
        let mut state = Self::with_repositories(
            config,
            Arc::new(PgGuestRepository::new(pool.clone(), query_timeout)),
            Arc::new(PgRoomRepository::new(pool.clone(), query_timeout)),
            Arc::new(PgRoomTypeRepository::new(pool.clone(), query_timeout)),
        )?;
        state.pool = Some(pool);
        Ok(state)
    }

    /// State backed by process-local storage
    ///
    /// Nothing survives a restart.
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_repositories(
            config,
            Arc::new(MemoryRepository::<Guest>::new()),
            Arc::new(MemoryRepository::<Room>::new()),
            Arc::new(MemoryRepository::<RoomType>::new()),
        )
    }

    /// Assemble state from explicit repositories
    pub fn with_repositories(
        config: Config,
        guests: Arc<GuestRepository>,
        rooms: Arc<RoomRepository>,
        room_types: Arc<RoomTypeRepository>,
    ) -> Result<Self> {
        let rate_limiter = if config.limiter.enabled {
            Some(Arc::new(ClientRateLimiter::new(&config.limiter)?))
        } else {
            None
        };

        Ok(Self {
            config: Arc::new(config),
            guests,
            rooms,
            room_types,
            rate_limiter,
            pool: None,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn guests(&self) -> &GuestRepository {
        self.guests.as_ref()
    }

    pub fn rooms(&self) -> &RoomRepository {
        self.rooms.as_ref()
    }

    pub fn room_types(&self) -> &RoomTypeRepository {
        self.room_types.as_ref()
    }

    /// The per-client limiter, `None` when limiting is disabled
    pub fn rate_limiter(&self) -> Option<&Arc<ClientRateLimiter>> {
        self.rate_limiter.as_ref()
    }

    /// The connection pool, `None` for in-memory storage
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }
}
