//! Guests span two tables: `person` holds the personal attributes and
//! `guest` shares its primary key and holds the passport and contact details.
//! Writes touch both inside one transaction.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};

use super::{order_clause, tag_duplicate, timed};
use crate::filters::{calculate_metadata, Filters, Metadata};
use crate::models::{Guest, GuestFields, GuestSearch};
use crate::repository::error::{RepositoryError, RepositoryOperation};
use crate::repository::traits::{Repository, RepositoryResult};

const ENTITY: &str = "Guest";

const COLUMNS: &str = "g.id, g.passport_number, g.contact_email, g.contact_phone, \
     p.name, p.gender, p.street, p.city, p.country, p.created_at, g.version";

#[derive(Debug, Clone)]
pub struct PgGuestRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgGuestRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

#[async_trait]
impl Repository<String, Guest, GuestFields, GuestSearch> for PgGuestRepository {
    async fn insert(&self, fields: GuestFields) -> RepositoryResult<Guest> {
        let (id, created_at, version) = timed(self.query_timeout, RepositoryOperation::Insert, async {
            let mut tx = self.pool.begin().await?;

            let person = sqlx::query(
                "INSERT INTO person (name, gender, street, city, country)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id, created_at",
            )
            .bind(&fields.name)
            .bind(&fields.gender)
            .bind(&fields.street)
            .bind(&fields.city)
            .bind(&fields.country)
            .fetch_one(&mut *tx)
            .await?;
            let id: i64 = person.try_get("id")?;
            let created_at: DateTime<Utc> = person.try_get("created_at")?;

            let version: i32 = sqlx::query_scalar(
                "INSERT INTO guest (id, passport_number, contact_email, contact_phone)
                 VALUES ($1, $2, $3, $4)
                 RETURNING version",
            )
            .bind(id)
            .bind(&fields.passport_number)
            .bind(&fields.contact_email)
            .bind(&fields.contact_phone)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>((id, created_at, version))
        })
        .await
        .map_err(|e| tag_duplicate(e, ENTITY, &fields.passport_number))?;

        Ok(Guest {
            id,
            fields,
            created_at,
            version,
        })
    }

    async fn find(&self, passport: &String) -> RepositoryResult<Guest> {
        let query = format!(
            "SELECT {COLUMNS}
             FROM guest g
             JOIN person p ON p.id = g.id
             WHERE g.passport_number = $1"
        );

        timed(
            self.query_timeout,
            RepositoryOperation::Find,
            sqlx::query_as::<_, Guest>(&query)
                .bind(passport)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| RepositoryError::not_found(RepositoryOperation::Find, ENTITY, passport))
    }

    async fn list(
        &self,
        search: &GuestSearch,
        filters: &Filters,
    ) -> RepositoryResult<(Vec<Guest>, Metadata)> {
        let query = format!(
            "SELECT count(*) OVER() AS total_records, {COLUMNS}
             FROM guest g
             JOIN person p ON p.id = g.id
             WHERE (to_tsvector('simple', p.name) @@ plainto_tsquery('simple', $1) OR $1 = '')
             AND (to_tsvector('simple', p.country) @@ plainto_tsquery('simple', $2) OR $2 = '')
             ORDER BY {}
             LIMIT $3 OFFSET $4",
            order_clause(filters, "g.id")
        );

        let rows = timed(
            self.query_timeout,
            RepositoryOperation::List,
            sqlx::query(&query)
                .bind(&search.name)
                .bind(&search.country)
                .bind(filters.limit())
                .bind(filters.offset())
                .fetch_all(&self.pool),
        )
        .await?;

        let mut total_records = 0_i64;
        let mut guests = Vec::with_capacity(rows.len());
        for row in &rows {
            total_records = row
                .try_get::<i64, _>("total_records")
                .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::List))?;
            guests.push(
                Guest::from_row(row)
                    .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::List))?,
            );
        }

        Ok((
            guests,
            calculate_metadata(total_records, filters.page, filters.page_size),
        ))
    }

    async fn update(&self, guest: &mut Guest) -> RepositoryResult<()> {
        let fields = &guest.fields;
        let (id, expected) = (guest.id, guest.version);

        let version = timed(self.query_timeout, RepositoryOperation::Update, async {
            let mut tx = self.pool.begin().await?;

            let version: Option<i32> = sqlx::query_scalar(
                "UPDATE guest
                 SET contact_email = $1, contact_phone = $2, version = version + 1
                 WHERE id = $3 AND version = $4
                 RETURNING version",
            )
            .bind(&fields.contact_email)
            .bind(&fields.contact_phone)
            .bind(id)
            .bind(expected)
            .fetch_optional(&mut *tx)
            .await?;

            // Dropping the transaction rolls it back.
            let Some(version) = version else {
                return Ok(None);
            };

            sqlx::query(
                "UPDATE person
                 SET name = $1, gender = $2, street = $3, city = $4, country = $5
                 WHERE id = $6",
            )
            .bind(&fields.name)
            .bind(&fields.gender)
            .bind(&fields.street)
            .bind(&fields.city)
            .bind(&fields.country)
            .bind(id)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(Some(version))
        })
        .await?;

        guest.version = version.ok_or_else(|| RepositoryError::edit_conflict(ENTITY, id))?;
        Ok(())
    }

    async fn delete(&self, passport: &String) -> RepositoryResult<()> {
        let deleted = timed(self.query_timeout, RepositoryOperation::Delete, async {
            let mut tx = self.pool.begin().await?;

            let id: Option<i64> =
                sqlx::query_scalar("DELETE FROM guest WHERE passport_number = $1 RETURNING id")
                    .bind(passport)
                    .fetch_optional(&mut *tx)
                    .await?;
            let Some(id) = id else {
                return Ok(false);
            };

            sqlx::query("DELETE FROM person WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(true)
        })
        .await?;

        if !deleted {
            return Err(RepositoryError::not_found(
                RepositoryOperation::Delete,
                ENTITY,
                passport,
            ));
        }
        Ok(())
    }
}
