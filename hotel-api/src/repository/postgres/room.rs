use std::time::Duration;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Row};

use super::{order_clause, tag_duplicate, timed};
use crate::filters::{calculate_metadata, Filters, Metadata};
use crate::models::{Room, RoomFields, RoomSearch};
use crate::repository::error::{RepositoryError, RepositoryOperation};
use crate::repository::traits::{Repository, RepositoryResult};

const ENTITY: &str = "Room";

const COLUMNS: &str =
    "id, created_at, room_number, room_type, max_occupancy, has_balcony, available, version";

#[derive(Debug, Clone)]
pub struct PgRoomRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgRoomRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

#[async_trait]
impl Repository<i64, Room, RoomFields, RoomSearch> for PgRoomRepository {
    async fn insert(&self, fields: RoomFields) -> RepositoryResult<Room> {
        let query = format!(
            "INSERT INTO room (room_number, room_type, max_occupancy, has_balcony, available)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );

        timed(
            self.query_timeout,
            RepositoryOperation::Insert,
            sqlx::query_as::<_, Room>(&query)
                .bind(fields.room_number)
                .bind(&fields.room_type)
                .bind(fields.max_occupancy)
                .bind(fields.has_balcony)
                .bind(fields.available)
                .fetch_one(&self.pool),
        )
        .await
        .map_err(|e| tag_duplicate(e, ENTITY, fields.room_number))
    }

    async fn find(&self, id: &i64) -> RepositoryResult<Room> {
        let query = format!("SELECT {COLUMNS} FROM room WHERE id = $1");

        timed(
            self.query_timeout,
            RepositoryOperation::Find,
            sqlx::query_as::<_, Room>(&query)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| RepositoryError::not_found(RepositoryOperation::Find, ENTITY, id))
    }

    async fn list(
        &self,
        search: &RoomSearch,
        filters: &Filters,
    ) -> RepositoryResult<(Vec<Room>, Metadata)> {
        let query = format!(
            "SELECT count(*) OVER() AS total_records, {COLUMNS}
             FROM room
             WHERE (to_tsvector('simple', room_type) @@ plainto_tsquery('simple', $1) OR $1 = '')
             AND ($2::boolean IS NULL OR available = $2)
             ORDER BY {}
             LIMIT $3 OFFSET $4",
            order_clause(filters, "id")
        );

        let rows = timed(
            self.query_timeout,
            RepositoryOperation::List,
            sqlx::query(&query)
                .bind(&search.room_type)
                .bind(search.available)
                .bind(filters.limit())
                .bind(filters.offset())
                .fetch_all(&self.pool),
        )
        .await?;

        let mut total_records = 0_i64;
        let mut rooms = Vec::with_capacity(rows.len());
        for row in &rows {
            total_records = row
                .try_get("total_records")
                .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::List))?;
            rooms.push(
                Room::from_row(row)
                    .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::List))?,
            );
        }

        Ok((
            rooms,
            calculate_metadata(total_records, filters.page, filters.page_size),
        ))
    }

    async fn update(&self, room: &mut Room) -> RepositoryResult<()> {
        let fields = &room.fields;
        let version: Option<i32> = timed(
            self.query_timeout,
            RepositoryOperation::Update,
            sqlx::query_scalar(
                "UPDATE room
                 SET room_number = $1, room_type = $2, max_occupancy = $3,
                     has_balcony = $4, available = $5, version = version + 1
                 WHERE id = $6 AND version = $7
                 RETURNING version",
            )
            .bind(fields.room_number)
            .bind(&fields.room_type)
            .bind(fields.max_occupancy)
            .bind(fields.has_balcony)
            .bind(fields.available)
            .bind(room.id)
            .bind(room.version)
            .fetch_optional(&self.pool),
        )
        .await
        .map_err(|e| tag_duplicate(e, ENTITY, fields.room_number))?;

        room.version = version.ok_or_else(|| RepositoryError::edit_conflict(ENTITY, room.id))?;
        Ok(())
    }

    async fn delete(&self, id: &i64) -> RepositoryResult<()> {
        let result = timed(
            self.query_timeout,
            RepositoryOperation::Delete,
            sqlx::query("DELETE FROM room WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(
                RepositoryOperation::Delete,
                ENTITY,
                id,
            ));
        }
        Ok(())
    }
}
