use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::database::patch::{nullable, Changes, Patch, PgEnum, SqlValue};

#[derive(Debug, Error, PartialEq)]
#[error("Unknown contact type '{0}', expected one of CALL, EMAIL, MEETING, NOTE")]
pub struct ContactTypeError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "contact_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactType {
    Call,
    Email,
    Meeting,
    Note,
}

impl PgEnum for ContactType {
    const TYPE_NAME: &'static str = "contact_type";

    fn as_str(&self) -> &'static str {
        match self {
            ContactType::Call => "CALL",
            ContactType::Email => "EMAIL",
            ContactType::Meeting => "MEETING",
            ContactType::Note => "NOTE",
        }
    }
}

impl FromStr for ContactType {
    type Err = ContactTypeError;

    /// Case-insensitive.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CALL" => Ok(ContactType::Call),
            "EMAIL" => Ok(ContactType::Email),
            "MEETING" => Ok(ContactType::Meeting),
            "NOTE" => Ok(ContactType::Note),
            _ => Err(ContactTypeError(raw.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for ContactType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContactHistory {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    pub subject: Option<String>,
    pub content: String,
    pub duration_minutes: Option<i32>,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewContactHistory {
    pub customer_id: Uuid,

    #[serde(rename = "type")]
    pub contact_type: String,

    #[validate(length(max = 255, message = "Subject too long"))]
    pub subject: Option<String>,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    #[validate(range(min = 0, max = 1440, message = "Duration must be between 0 and 1440 minutes"))]
    pub duration_minutes: Option<i32>,

    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactHistoryPatch {
    #[serde(rename = "type")]
    pub contact_type: Option<ContactType>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 255, message = "Subject too long"))]
    pub subject: Option<Option<String>>,

    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(range(min = 0, max = 1440, message = "Duration must be between 0 and 1440 minutes"))]
    pub duration_minutes: Option<Option<i32>>,

    pub attachments: Option<Vec<String>>,
}

impl Patch for ContactHistoryPatch {
    type Target = ContactHistory;

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        changes
            .set_some("contact_type", &self.contact_type, |v| v.sql_value())
            .set_some("subject", &self.subject, |v| SqlValue::Text(v.clone()))
            .set_some("content", &self.content, |v| SqlValue::text(v.clone()))
            .set_some("duration_minutes", &self.duration_minutes, |v| SqlValue::Int(*v))
            .set_some("attachments", &self.attachments, |v| SqlValue::TextArray(v.clone()));
        changes
    }

    fn apply(&self, entry: &mut ContactHistory) {
        if let Some(v) = self.contact_type {
            entry.contact_type = v;
        }
        if let Some(v) = &self.subject {
            entry.subject = v.clone();
        }
        if let Some(v) = &self.content {
            entry.content = v.clone();
        }
        if let Some(v) = self.duration_minutes {
            entry.duration_minutes = v;
        }
        if let Some(v) = &self.attachments {
            entry.attachments = v.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactHistoryListQuery {
    pub customer_id: Option<Uuid>,

    #[serde(rename = "type")]
    pub contact_type: Option<String>,

    #[validate(range(min = 1, message = "Limit must be at least 1"))]
    pub limit: Option<i64>,

    #[validate(range(min = 0, message = "Offset cannot be negative"))]
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_contact_type_case_insensitively() {
        assert_eq!("call".parse::<ContactType>(), Ok(ContactType::Call));
        assert_eq!(" Meeting ".parse::<ContactType>(), Ok(ContactType::Meeting));
        assert!("fax".parse::<ContactType>().is_err());
    }

    #[test]
    fn entry_serializes_type_key() {
        let entry = ContactHistory {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            contact_type: ContactType::Email,
            subject: None,
            content: "Sent the proposal".into(),
            duration_minutes: None,
            attachments: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "EMAIL");
        assert!(json.get("contactType").is_none());
    }

    #[test]
    fn patch_rejects_unknown_type() {
        let parsed: Result<ContactHistoryPatch, _> = serde_json::from_str(r#"{"type": "FAX"}"#);
        assert!(parsed.is_err());
    }
}
