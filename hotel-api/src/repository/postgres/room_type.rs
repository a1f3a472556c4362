use std::time::Duration;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Row};

use super::{order_clause, tag_duplicate, timed};
use crate::filters::{calculate_metadata, Filters, Metadata};
use crate::models::{RoomType, RoomTypeFields, RoomTypeSearch};
use crate::repository::error::{RepositoryError, RepositoryOperation};
use crate::repository::traits::{Repository, RepositoryResult};

const ENTITY: &str = "RoomType";

const COLUMNS: &str = "id, title, base_rate, max_occupancy, bed_count, has_balcony, created_at, version";

#[derive(Debug, Clone)]
pub struct PgRoomTypeRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgRoomTypeRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

#[async_trait]
impl Repository<i64, RoomType, RoomTypeFields, RoomTypeSearch> for PgRoomTypeRepository {
    async fn insert(&self, fields: RoomTypeFields) -> RepositoryResult<RoomType> {
        let query = format!(
            "INSERT INTO room_type (title, base_rate, max_occupancy, bed_count, has_balcony)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );

        timed(
            self.query_timeout,
            RepositoryOperation::Insert,
            sqlx::query_as::<_, RoomType>(&query)
                .bind(&fields.title)
                .bind(fields.base_rate)
                .bind(fields.max_occupancy)
                .bind(fields.bed_count)
                .bind(fields.has_balcony)
                .fetch_one(&self.pool),
        )
        .await
        .map_err(|e| tag_duplicate(e, ENTITY, &fields.title))
    }

    async fn find(&self, id: &i64) -> RepositoryResult<RoomType> {
        let query = format!("SELECT {COLUMNS} FROM room_type WHERE id = $1");

        timed(
            self.query_timeout,
            RepositoryOperation::Find,
            sqlx::query_as::<_, RoomType>(&query)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| RepositoryError::not_found(RepositoryOperation::Find, ENTITY, id))
    }

    async fn list(
        &self,
        search: &RoomTypeSearch,
        filters: &Filters,
    ) -> RepositoryResult<(Vec<RoomType>, Metadata)> {
        let query = format!(
            "SELECT count(*) OVER() AS total_records, {COLUMNS}
             FROM room_type
             WHERE (to_tsvector('simple', title) @@ plainto_tsquery('simple', $1) OR $1 = '')
             ORDER BY {}
             LIMIT $2 OFFSET $3",
            order_clause(filters, "id")
        );

        let rows = timed(
            self.query_timeout,
            RepositoryOperation::List,
            sqlx::query(&query)
                .bind(&search.title)
                .bind(filters.limit())
                .bind(filters.offset())
                .fetch_all(&self.pool),
        )
        .await?;

        let mut total_records = 0_i64;
        let mut room_types = Vec::with_capacity(rows.len());
        for row in &rows {
            let listed = row
                .try_get::<i64, _>("total_records")
                .and_then(|total| RoomType::from_row(row).map(|rt| (total, rt)))
                .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::List))?;
            total_records = listed.0;
            room_types.push(listed.1);
        }

        Ok((
            room_types,
            calculate_metadata(total_records, filters.page, filters.page_size),
        ))
    }

    async fn update(&self, rt: &mut RoomType) -> RepositoryResult<()> {
        let fields = &rt.fields;
        let version: Option<i32> = timed(
            self.query_timeout,
            RepositoryOperation::Update,
            sqlx::query_scalar(
                "UPDATE room_type
                 SET title = $1, base_rate = $2, max_occupancy = $3, bed_count = $4,
                     has_balcony = $5, version = version + 1
                 WHERE id = $6 AND version = $7
                 RETURNING version",
            )
            .bind(&fields.title)
            .bind(fields.base_rate)
            .bind(fields.max_occupancy)
            .bind(fields.bed_count)
            .bind(fields.has_balcony)
            .bind(rt.id)
            .bind(rt.version)
            .fetch_optional(&self.pool),
        )
        .await
        .map_err(|e| tag_duplicate(e, ENTITY, &fields.title))?;

        rt.version = version.ok_or_else(|| RepositoryError::edit_conflict(ENTITY, rt.id))?;
        Ok(())
    }

    async fn delete(&self, id: &i64) -> RepositoryResult<()> {
        let result = timed(
            self.query_timeout,
            RepositoryOperation::Delete,
            sqlx::query("DELETE FROM room_type WHERE id = $1")
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
