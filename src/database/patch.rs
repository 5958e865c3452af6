//! Typed sparse updates.
//!
//! A patch lists only the fields a caller supplied. [`Patch::changes`]
//! turns it into column assignments for the SQL composer, and
//! [`Patch::apply`] applies the same change set to an in-memory entity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// A typed bind value. `None` payloads bind a typed SQL NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Int(Option<i32>),
    Bool(Option<bool>),
    Uuid(Option<Uuid>),
    Timestamp(Option<DateTime<Utc>>),
    Decimal(Option<Decimal>),
    TextArray(Vec<String>),
    Json(serde_json::Value),
    /// Text bound and cast to a Postgres enum type.
    Enum { type_name: &'static str, value: String },
    /// Rendered as `NOW()`; binds nothing.
    Now,
}

impl SqlValue {
    pub fn text(value: impl Into<String>) -> Self {
        SqlValue::Text(Some(value.into()))
    }

    /// Placeholder text for this value at the given parameter position.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            SqlValue::Enum { type_name, .. } => format!("${}::{}", index, type_name),
            SqlValue::Now => "NOW()".to_string(),
            _ => format!("${}", index),
        }
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self, SqlValue::Now)
    }
}

/// A Rust enum mirrored by a Postgres enum type.
pub trait PgEnum {
    const TYPE_NAME: &'static str;

    fn as_str(&self) -> &'static str;

    fn sql_value(&self) -> SqlValue {
        SqlValue::Enum {
            type_name: Self::TYPE_NAME,
            value: self.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: &'static str,
    pub value: SqlValue,
}

/// Ordered list of column assignments produced by a patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    assignments: Vec<Assignment>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &'static str, value: SqlValue) -> &mut Self {
        self.assignments.push(Assignment { column, value });
        self
    }

    /// Push an assignment only when the field was supplied.
    pub fn set_some<T>(&mut self, column: &'static str, field: &Option<T>, to_value: impl FnOnce(&T) -> SqlValue) -> &mut Self {
        if let Some(v) = field {
            self.set(column, to_value(v));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.assignments.iter().map(|a| a.column).collect()
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.assignments.iter().find(|a| a.column == column).map(|a| &a.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter()
    }
}

/// A sparse update for one entity type.
pub trait Patch: Send + Sync {
    type Target;

    fn changes(&self) -> Changes;

    fn apply(&self, target: &mut Self::Target);

    fn is_empty(&self) -> bool {
        self.changes().is_empty()
    }
}

/// Deserialize a nullable field so that an absent key stays `None` and an
/// explicit `null` becomes `Some(None)`. Use with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "nullable")]
        notes: Option<Option<String>>,
    }

    #[test]
    fn nullable_distinguishes_absent_from_null() {
        let absent: Body = serde_json::from_str("{}").unwrap();
        let null: Body = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        let value: Body = serde_json::from_str(r#"{"notes": "call back"}"#).unwrap();

        assert_eq!(absent.notes, None);
        assert_eq!(null.notes, Some(None));
        assert_eq!(value.notes, Some(Some("call back".to_string())));
    }

    #[test]
    fn placeholders_cast_enums_and_inline_now() {
        let status = SqlValue::Enum { type_name: "task_status", value: "COMPLETE".into() };
        assert_eq!(status.placeholder(3), "$3::task_status");
        assert_eq!(SqlValue::Now.placeholder(3), "NOW()");
        assert!(!SqlValue::Now.is_bound());
        assert_eq!(SqlValue::text("x").placeholder(1), "$1");
    }

    #[test]
    fn set_some_skips_absent_fields() {
        let mut changes = Changes::new();
        changes
            .set_some("title", &Some("Renewal".to_string()), |v| SqlValue::text(v.clone()))
            .set_some("notes", &None::<String>, |v| SqlValue::text(v.clone()));
        assert_eq!(changes.columns(), vec!["title"]);
    }
}
