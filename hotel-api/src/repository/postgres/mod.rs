//! PostgreSQL repositories (sqlx)
//!
//! Every statement runs under the configured query timeout. The `ORDER BY`
//! column is the only interpolated text and always comes from
//! [`Filters::ordering`](crate::filters::Filters::ordering), which refuses
//! anything outside the resource's safelist.

mod guest;
mod room;
mod room_type;

pub use guest::PgGuestRepository;
pub use room::PgRoomRepository;
pub use room_type::PgRoomTypeRepository;

use std::future::Future;
use std::time::Duration;

use super::error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
use super::traits::RepositoryResult;
use crate::filters::Filters;

/// Run `query` under `limit`, classifying driver errors for `operation`
pub(crate) async fn timed<T, F>(
    limit: Duration,
    operation: RepositoryOperation,
    query: F,
) -> RepositoryResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, query).await {
        Ok(result) => result.map_err(|e| RepositoryError::from(e).with_operation(operation)),
        Err(_) => {
            tracing::warn!(%operation, ?limit, "Query timed out");
            Err(RepositoryError::timeout(
                operation,
                format!("Query did not complete within {:?}", limit),
            ))
        }
    }
}

/// Attach entity context to duplicate-key errors
pub(crate) fn tag_duplicate(
    err: RepositoryError,
    entity_type: &str,
    identifier: impl std::fmt::Display,
) -> RepositoryError {
    if err.kind == RepositoryErrorKind::AlreadyExists {
        err.with_entity(entity_type, identifier)
    } else {
        err
    }
}

/// `ORDER BY` body for a validated filter set, with `tie_break` appended
pub(crate) fn order_clause(filters: &Filters, tie_break: &str) -> String {
    let (column, direction) = filters.ordering();
    format!("{} {}, {} ASC", column, direction.as_sql(), tie_break)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GUEST_SORT_SAFELIST, ROOM_TYPE_SORT_SAFELIST};

    #[test]
    fn test_order_clause() {
        let filters = Filters::new(1, 20, "-base_rate", ROOM_TYPE_SORT_SAFELIST);
        assert_eq!(order_clause(&filters, "id"), "base_rate DESC, id ASC");

        let filters = Filters::new(1, 20, "name", GUEST_SORT_SAFELIST);
        assert_eq!(order_clause(&filters, "g.id"), "name ASC, g.id ASC");
    }

    #[test]
    #[should_panic(expected = "Unsafe sort parameter")]
    fn test_order_clause_refuses_unsafe_sort() {
        let filters = Filters::new(1, 20, "id; DROP TABLE guest", ROOM_TYPE_SORT_SAFELIST);
        let _ = order_clause(&filters, "id");
    }

    #[tokio::test]
    async fn test_timed_reports_timeout() {
        let err = timed(
            Duration::from_millis(10),
            RepositoryOperation::List,
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, sqlx::Error>(())
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind, RepositoryErrorKind::Timeout);
        assert_eq!(err.operation, RepositoryOperation::List);
    }

    #[tokio::test]
    async fn test_timed_classifies_driver_errors() {
        let err = timed(Duration::from_secs(1), RepositoryOperation::Delete, async {
            Err::<(), _>(sqlx::Error::RowNotFound)
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind, RepositoryErrorKind::NotFound);
        assert_eq!(err.operation, RepositoryOperation::Delete);
    }
}
