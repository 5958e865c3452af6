use uuid::Uuid;

use crate::database::patch::SqlValue;
use crate::database::table::Table;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOp, FilterOrderInfo, FilterWhereInfo, SortDirection, SqlResult};

/// SELECT builder for one tenant-scoped table. The organization predicate
/// is always `$1`; there is no constructor without it.
pub struct Filter {
    table: Table,
    organization_id: Uuid,
    conditions: Vec<FilterWhereInfo>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn scoped(table: Table, organization_id: Uuid) -> Self {
        Self {
            table,
            organization_id,
            conditions: vec![],
            order_data: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn where_op(mut self, column: &str, operator: FilterOp, data: SqlValue) -> Self {
        self.conditions.push(FilterWhereInfo::Compare {
            column: column.to_string(),
            operator,
            data,
        });
        self
    }

    pub fn eq(self, column: &str, data: SqlValue) -> Self {
        self.where_op(column, FilterOp::Eq, data)
    }

    /// Adds an equality condition only when `value` is present.
    pub fn eq_opt<T>(self, column: &str, value: Option<T>, to_value: impl FnOnce(T) -> SqlValue) -> Self {
        match value {
            Some(v) => self.eq(column, to_value(v)),
            None => self,
        }
    }

    /// Case-insensitive substring match over any of `columns`.
    pub fn search(mut self, columns: &[&str], term: &str) -> Self {
        let pattern = format!("%{}%", term.replace('%', "\\%").replace('_', "\\_"));
        let alternatives = columns
            .iter()
            .map(|column| FilterWhereInfo::Compare {
                column: column.to_string(),
                operator: FilterOp::ILike,
                data: SqlValue::text(pattern.clone()),
            })
            .collect();
        self.conditions.push(FilterWhereInfo::AnyOf(alternatives));
        self
    }

    pub fn order(mut self, column: &str, sort: SortDirection) -> Self {
        self.order_data.push(FilterOrderInfo {
            column: column.to_string(),
            sort,
            nulls_last: false,
        });
        self
    }

    pub fn order_nulls_last(mut self, column: &str, sort: SortDirection) -> Self {
        self.order_data.push(FilterOrderInfo {
            column: column.to_string(),
            sort,
            nulls_last: true,
        });
        self
    }

    pub fn limit(mut self, limit: i64, offset: Option<i64>) -> Result<Self, FilterError> {
        if limit < 1 {
            return Err(FilterError::InvalidLimit("Limit must be at least 1".to_string()));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
            }
        }
        self.limit = Some(limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data)?;
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT * FROM \"{}\"", self.table.name()),
            format!("WHERE {}", where_clause),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = self.to_where_sql()?;
        Ok(SqlResult {
            query: format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.table.name(), where_clause),
            params,
        })
    }

    fn to_where_sql(&self) -> Result<(String, Vec<SqlValue>), FilterError> {
        let mut params = vec![SqlValue::Uuid(Some(self.organization_id))];
        let mut clauses = vec![format!("({})", self.table.tenant_predicate(1))];

        if !self.conditions.is_empty() {
            let (conditions_sql, condition_params) = FilterWhere::generate(&self.conditions, 1)?;
            clauses.push(conditions_sql);
            params.extend(condition_params);
        }
        Ok((clauses.join(" AND "), params))
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_predicate_is_always_first() {
        let org = Uuid::new_v4();
        let sql = Filter::scoped(Table::Deals, org)
            .eq("stage_id", SqlValue::text("proposal"))
            .order("created_at", SortDirection::Desc)
            .to_sql()
            .unwrap();

        assert!(sql.query.starts_with("SELECT * FROM \"deals\" WHERE (\"pipeline_id\" IN"));
        assert!(sql.query.contains("\"stage_id\" = $2"));
        assert!(sql.query.ends_with("ORDER BY \"created_at\" DESC"));
        assert_eq!(sql.params[0], SqlValue::Uuid(Some(org)));
    }

    #[test]
    fn count_ignores_order_and_limit() {
        let sql = Filter::scoped(Table::ContactHistory, Uuid::new_v4())
            .order("created_at", SortDirection::Desc)
            .limit(2, Some(4))
            .unwrap()
            .to_count_sql()
            .unwrap();
        assert!(sql.query.starts_with("SELECT COUNT(*) AS count FROM \"contact_history\""));
        assert!(!sql.query.contains("LIMIT"));
    }

    #[test]
    fn limit_must_be_positive() {
        assert!(Filter::scoped(Table::Tasks, Uuid::new_v4()).limit(0, None).is_err());
        assert!(Filter::scoped(Table::Tasks, Uuid::new_v4()).limit(5, Some(-1)).is_err());
    }

    #[test]
    fn search_escapes_wildcards() {
        let sql = Filter::scoped(Table::Customers, Uuid::new_v4())
            .search(&["first_name", "email"], "50%_off")
            .to_sql()
            .unwrap();
        assert_eq!(sql.params[1], SqlValue::text("%50\\%\\_off%"));
        assert!(sql.query.contains("(\"first_name\" ILIKE $2 OR \"email\" ILIKE $3)"));
    }
}
