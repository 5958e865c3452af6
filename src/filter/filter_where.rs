use crate::database::patch::SqlValue;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo};

/// Renders WHERE conditions with sequential `$n` placeholders.
pub struct FilterWhere {
    param_values: Vec<SqlValue>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Render `conditions` joined with AND, numbering parameters after
    /// `starting_param_index`.
    pub fn generate(conditions: &[FilterWhereInfo], starting_param_index: usize) -> Result<(String, Vec<SqlValue>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let mut parts = Vec::with_capacity(conditions.len());
        for condition in conditions {
            parts.push(filter_where.build_sql_condition(condition)?);
        }
        Ok((parts.join(" AND "), filter_where.param_values))
    }

    pub fn validate_column(column: &str) -> Result<(), FilterError> {
        let mut chars = column.chars();
        let valid_start = chars.next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false);
        if !valid_start || !column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidColumn(column.to_string()));
        }
        Ok(())
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        match condition {
            FilterWhereInfo::Compare { column, operator, data } => {
                Self::validate_column(column)?;
                let quoted_column = format!("\"{}\"", column);
                let sql = match operator {
                    FilterOp::Eq => format!("{} = {}", quoted_column, self.param(data.clone())),
                    FilterOp::Gte => format!("{} >= {}", quoted_column, self.param(data.clone())),
                    FilterOp::Lte => format!("{} <= {}", quoted_column, self.param(data.clone())),
                    FilterOp::ILike => format!("{} ILIKE {}", quoted_column, self.param(data.clone())),
                    FilterOp::Contains => format!("{} @> ARRAY[{}]", quoted_column, self.param(data.clone())),
                };
                Ok(sql)
            }
            FilterWhereInfo::AnyOf(alternatives) => {
                if alternatives.is_empty() {
                    return Ok("1=0".to_string());
                }
                let mut parts = Vec::with_capacity(alternatives.len());
                for alternative in alternatives {
                    parts.push(self.build_sql_condition(alternative)?);
                }
                Ok(format!("({})", parts.join(" OR ")))
            }
        }
    }

    fn param(&mut self, value: SqlValue) -> String {
        if !value.is_bound() {
            return value.placeholder(0);
        }
        self.param_index += 1;
        let placeholder = value.placeholder(self.param_index);
        self.param_values.push(value);
        placeholder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_parameters_after_offset() {
        let conditions = vec![
            FilterWhereInfo::Compare {
                column: "stage_id".into(),
                operator: FilterOp::Eq,
                data: SqlValue::text("won"),
            },
            FilterWhereInfo::AnyOf(vec![
                FilterWhereInfo::Compare {
                    column: "first_name".into(),
                    operator: FilterOp::ILike,
                    data: SqlValue::text("%jo%"),
                },
                FilterWhereInfo::Compare {
                    column: "email".into(),
                    operator: FilterOp::ILike,
                    data: SqlValue::text("%jo%"),
                },
            ]),
        ];
        let (sql, params) = FilterWhere::generate(&conditions, 1).unwrap();
        assert_eq!(sql, "\"stage_id\" = $2 AND (\"first_name\" ILIKE $3 OR \"email\" ILIKE $4)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn rejects_injected_column_names() {
        assert!(FilterWhere::validate_column("status; DROP TABLE users").is_err());
        assert!(FilterWhere::validate_column("1abc").is_err());
        assert!(FilterWhere::validate_column("due_date").is_ok());
    }
}
