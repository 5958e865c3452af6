use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::database::patch::{nullable, Changes, Patch, PgEnum, SqlValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "customer_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerStatus {
    #[default]
    Lead,
    Prospect,
    Customer,
    Inactive,
}

impl PgEnum for CustomerStatus {
    const TYPE_NAME: &'static str = "customer_status";

    fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Lead => "LEAD",
            CustomerStatus::Prospect => "PROSPECT",
            CustomerStatus::Customer => "CUSTOMER",
            CustomerStatus::Inactive => "INACTIVE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub status: CustomerStatus,
    pub source: Option<String>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    #[validate(length(min = 1, max = 100, message = "First name must be between 1 and 100 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name must be between 1 and 100 characters"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(max = 50, message = "Phone number too long"))]
    pub phone: Option<String>,

    #[validate(length(max = 255, message = "Company name too long"))]
    pub company: Option<String>,

    #[validate(length(max = 100, message = "Position too long"))]
    pub position: Option<String>,

    #[serde(default)]
    pub status: CustomerStatus,

    #[validate(length(max = 100, message = "Source too long"))]
    pub source: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub notes: Option<String>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    #[validate(length(min = 1, max = 100, message = "First name must be between 1 and 100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Last name must be between 1 and 100 characters"))]
    pub last_name: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 50, message = "Phone number too long"))]
    pub phone: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub company: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub position: Option<Option<String>>,

    pub status: Option<CustomerStatus>,

    #[serde(default, deserialize_with = "nullable")]
    pub source: Option<Option<String>>,

    pub tags: Option<Vec<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub assigned_to: Option<Option<Uuid>>,
}

impl Patch for CustomerPatch {
    type Target = Customer;

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        changes
            .set_some("first_name", &self.first_name, |v| SqlValue::text(v.clone()))
            .set_some("last_name", &self.last_name, |v| SqlValue::text(v.clone()))
            .set_some("email", &self.email, |v| SqlValue::Text(v.clone()))
            .set_some("phone", &self.phone, |v| SqlValue::Text(v.clone()))
            .set_some("company", &self.company, |v| SqlValue::Text(v.clone()))
            .set_some("position", &self.position, |v| SqlValue::Text(v.clone()))
            .set_some("status", &self.status, |v| v.sql_value())
            .set_some("source", &self.source, |v| SqlValue::Text(v.clone()))
            .set_some("tags", &self.tags, |v| SqlValue::TextArray(v.clone()))
            .set_some("notes", &self.notes, |v| SqlValue::Text(v.clone()))
            .set_some("assigned_to", &self.assigned_to, |v| SqlValue::Uuid(*v));
        changes
    }

    fn apply(&self, customer: &mut Customer) {
        if let Some(v) = &self.first_name {
            customer.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            customer.last_name = v.clone();
        }
        if let Some(v) = &self.email {
            customer.email = v.clone();
        }
        if let Some(v) = &self.phone {
            customer.phone = v.clone();
        }
        if let Some(v) = &self.company {
            customer.company = v.clone();
        }
        if let Some(v) = &self.position {
            customer.position = v.clone();
        }
        if let Some(v) = self.status {
            customer.status = v;
        }
        if let Some(v) = &self.source {
            customer.source = v.clone();
        }
        if let Some(v) = &self.tags {
            customer.tags = v.clone();
        }
        if let Some(v) = &self.notes {
            customer.notes = v.clone();
        }
        if let Some(v) = self.assigned_to {
            customer.assigned_to = v;
        }
    }
}

/// `GET /customers` query string.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListQuery {
    #[validate(length(max = 200, message = "Search term too long"))]
    pub search: Option<String>,
    pub status: Option<CustomerStatus>,
    pub tag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_null_clears_nullable_columns() {
        let patch: CustomerPatch = serde_json::from_str(r#"{"phone": null, "status": "CUSTOMER"}"#).unwrap();
        let changes = patch.changes();

        assert_eq!(changes.columns(), vec!["phone", "status"]);
        assert_eq!(changes.get("phone"), Some(&SqlValue::Text(None)));
        assert_eq!(
            changes.get("status"),
            Some(&SqlValue::Enum { type_name: "customer_status", value: "CUSTOMER".into() })
        );
    }

    #[test]
    fn unknown_fields_produce_an_empty_patch() {
        let patch: CustomerPatch = serde_json::from_str(r#"{"favouriteColour": "green"}"#).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn new_customer_defaults_to_lead() {
        let body: NewCustomer = serde_json::from_str(r#"{"firstName": "John", "lastName": "Doe", "email": "john@x.com"}"#).unwrap();
        assert_eq!(body.status, CustomerStatus::Lead);
        assert!(body.tags.is_empty());
        assert!(body.validate().is_ok());
    }

    #[test]
    fn new_customer_rejects_bad_email() {
        let body: NewCustomer = serde_json::from_str(r#"{"firstName": "John", "lastName": "Doe", "email": "nope"}"#).unwrap();
        assert!(body.validate().is_err());
    }
}
