use super::error::FilterError;
use super::filter_where::FilterWhere;
use super::types::FilterOrderInfo;

pub struct FilterOrder;

impl FilterOrder {
    pub fn generate(infos: &[FilterOrderInfo]) -> Result<String, FilterError> {
        if infos.is_empty() {
            return Ok(String::new());
        }
        let mut parts = Vec::with_capacity(infos.len());
        for info in infos {
            FilterWhere::validate_column(&info.column)?;
            let nulls = if info.nulls_last { " NULLS LAST" } else { "" };
            parts.push(format!("\"{}\" {}{}", info.column, info.sort.to_sql(), nulls));
        }
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}
