use sqlx::{self, postgres::PgArguments, postgres::PgRow, FromRow, PgPool, Postgres, Row};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::patch::{Changes, SqlValue};
use crate::database::table::{DeletionPolicy, Table};
use crate::filter::types::SqlResult;

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;
type PgQueryAs<'q, O> = sqlx::query::QueryAs<'q, Postgres, O, PgArguments>;

/// Statement builders for single-row operations on tenant-scoped tables.
/// The row id is always `$1` and the organization id `$2`, followed by any
/// assignment values.
pub struct QueryBuilder;

impl QueryBuilder {
    pub fn find_by_id(table: Table, id: Uuid, organization_id: Uuid) -> SqlResult {
        SqlResult {
            query: format!(
                "SELECT * FROM \"{}\" WHERE \"id\" = $1 AND ({})",
                table.name(),
                table.tenant_predicate(2)
            ),
            params: vec![SqlValue::Uuid(Some(id)), SqlValue::Uuid(Some(organization_id))],
        }
    }

    /// `UPDATE ... SET <changes>, updated_at = NOW() ... RETURNING *`, or
    /// `None` when there is nothing to write.
    pub fn update(table: Table, id: Uuid, organization_id: Uuid, changes: &Changes) -> Option<SqlResult> {
        if changes.is_empty() {
            return None;
        }

        let mut params = vec![SqlValue::Uuid(Some(id)), SqlValue::Uuid(Some(organization_id))];
        let mut assignments = Vec::with_capacity(changes.len() + 1);
        for assignment in changes.iter() {
            let placeholder = if assignment.value.is_bound() {
                params.push(assignment.value.clone());
                assignment.value.placeholder(params.len())
            } else {
                assignment.value.placeholder(0)
            };
            assignments.push(format!("\"{}\" = {}", assignment.column, placeholder));
        }
        assignments.push("\"updated_at\" = NOW()".to_string());

        Some(SqlResult {
            query: format!(
                "UPDATE \"{}\" SET {} WHERE \"id\" = $1 AND ({}) RETURNING *",
                table.name(),
                assignments.join(", "),
                table.tenant_predicate(2)
            ),
            params,
        })
    }

    /// Delete following the table's [`DeletionPolicy`].
    pub fn delete(table: Table, id: Uuid, organization_id: Uuid) -> SqlResult {
        let query = match table.deletion_policy() {
            DeletionPolicy::Soft => format!(
                "UPDATE \"{}\" SET \"deleted_at\" = NOW(), \"updated_at\" = NOW() WHERE \"id\" = $1 AND ({})",
                table.name(),
                table.tenant_predicate(2)
            ),
            DeletionPolicy::Hard => format!(
                "DELETE FROM \"{}\" WHERE \"id\" = $1 AND ({})",
                table.name(),
                table.tenant_predicate(2)
            ),
        };
        SqlResult {
            query,
            params: vec![SqlValue::Uuid(Some(id)), SqlValue::Uuid(Some(organization_id))],
        }
    }
}

pub async fn select_all<T>(pool: &PgPool, sql: &SqlResult) -> Result<Vec<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut q = sqlx::query_as::<_, T>(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query_as(q, p);
    }
    Ok(q.fetch_all(pool).await?)
}

pub async fn select_optional<T>(pool: &PgPool, sql: &SqlResult) -> Result<Option<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut q = sqlx::query_as::<_, T>(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query_as(q, p);
    }
    Ok(q.fetch_optional(pool).await?)
}

pub async fn count(pool: &PgPool, sql: &SqlResult) -> Result<i64, DatabaseError> {
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query(q, p);
    }
    let row = q.fetch_one(pool).await?;
    Ok(row.try_get("count")?)
}

/// Run a statement and report how many rows it touched.
pub async fn execute(pool: &PgPool, sql: &SqlResult) -> Result<u64, DatabaseError> {
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query(q, p);
    }
    Ok(q.execute(pool).await?.rows_affected())
}

/// Apply `changes` to one scoped row. An empty change set issues no write
/// and returns the current row. `None` means the row is out of scope.
pub async fn update_scoped<T>(
    pool: &PgPool,
    table: Table,
    id: Uuid,
    organization_id: Uuid,
    changes: &Changes,
) -> Result<Option<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    match QueryBuilder::update(table, id, organization_id, changes) {
        Some(sql) => select_optional(pool, &sql).await,
        None => select_optional(pool, &QueryBuilder::find_by_id(table, id, organization_id)).await,
    }
}

pub async fn delete_scoped(pool: &PgPool, table: Table, id: Uuid, organization_id: Uuid) -> Result<bool, DatabaseError> {
    let affected = execute(pool, &QueryBuilder::delete(table, id, organization_id)).await?;
    Ok(affected > 0)
}

fn bind_param_query<'q>(q: PgQuery<'q>, v: &'q SqlValue) -> PgQuery<'q> {
    match v {
        SqlValue::Text(s) => q.bind(s.as_deref()),
        SqlValue::Int(i) => q.bind(*i),
        SqlValue::Bool(b) => q.bind(*b),
        SqlValue::Uuid(u) => q.bind(*u),
        SqlValue::Timestamp(t) => q.bind(*t),
        SqlValue::Decimal(d) => q.bind(*d),
        SqlValue::TextArray(a) => q.bind(a.as_slice()),
        SqlValue::Json(j) => q.bind(j),
        SqlValue::Enum { value, .. } => q.bind(value.as_str()),
        SqlValue::Now => q,
    }
}

fn bind_param_query_as<'q, O>(q: PgQueryAs<'q, O>, v: &'q SqlValue) -> PgQueryAs<'q, O>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        SqlValue::Text(s) => q.bind(s.as_deref()),
        SqlValue::Int(i) => q.bind(*i),
        SqlValue::Bool(b) => q.bind(*b),
        SqlValue::Uuid(u) => q.bind(*u),
        SqlValue::Timestamp(t) => q.bind(*t),
        SqlValue::Decimal(d) => q.bind(*d),
        SqlValue::TextArray(a) => q.bind(a.as_slice()),
        SqlValue::Json(j) => q.bind(j),
        SqlValue::Enum { value, .. } => q.bind(value.as_str()),
        SqlValue::Now => q,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{TaskPatch, TaskStatus};
    use crate::database::patch::Patch;

    #[test]
    fn update_touches_only_supplied_columns() {
        let mut changes = Changes::new();
        changes.set("title", SqlValue::text("Renewal")).set("notes", SqlValue::Text(None));

        let sql = QueryBuilder::update(Table::Deals, Uuid::new_v4(), Uuid::new_v4(), &changes).unwrap();
        assert!(sql.query.starts_with(
            "UPDATE \"deals\" SET \"title\" = $3, \"notes\" = $4, \"updated_at\" = NOW() WHERE \"id\" = $1 AND ("
        ));
        assert!(sql.query.ends_with("RETURNING *"));
        assert_eq!(sql.params.len(), 4);
        assert_eq!(sql.params[3], SqlValue::Text(None));
    }

    #[test]
    fn empty_changes_build_no_statement() {
        assert!(QueryBuilder::update(Table::Tasks, Uuid::new_v4(), Uuid::new_v4(), &Changes::new()).is_none());
    }

    #[test]
    fn task_completion_is_written_in_the_same_statement() {
        let patch = TaskPatch { status: Some(TaskStatus::Complete), ..Default::default() };
        let sql = QueryBuilder::update(Table::Tasks, Uuid::new_v4(), Uuid::new_v4(), &patch.changes()).unwrap();

        assert!(sql.query.contains("\"status\" = $3::task_status"));
        assert!(sql.query.contains("\"completed_at\" = NOW()"));
        assert_eq!(sql.params.len(), 3);
    }

    #[test]
    fn delete_follows_deletion_policy() {
        let soft = QueryBuilder::delete(Table::Customers, Uuid::new_v4(), Uuid::new_v4());
        assert!(soft.query.starts_with("UPDATE \"customers\" SET \"deleted_at\" = NOW()"));

        let hard = QueryBuilder::delete(Table::ContactHistory, Uuid::new_v4(), Uuid::new_v4());
        assert!(hard.query.starts_with("DELETE FROM \"contact_history\""));
    }

    #[test]
    fn lookups_are_tenant_scoped() {
        let sql = QueryBuilder::find_by_id(Table::Tasks, Uuid::new_v4(), Uuid::new_v4());
        assert!(sql.query.contains("\"assignee_id\" IN (SELECT \"id\" FROM \"users\" WHERE \"organization_id\" = $2)"));
    }
}
