use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::database::patch::{nullable, Changes, Patch, SqlValue};

/// Clamp a deal probability into 0..=100.
pub fn clamp_probability(probability: i32) -> i32 {
    probability.clamp(0, 100)
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        return Err(ValidationError::new("non_negative"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DealProduct {
    #[validate(length(min = 1, max = 255, message = "Product name must be between 1 and 255 characters"))]
    pub name: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(custom(function = "non_negative", message = "Unit price cannot be negative"))]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub pipeline_id: Uuid,
    pub stage_id: String,
    pub title: String,
    pub value: Decimal,
    pub currency: String,
    pub probability: i32,
    pub expected_close_date: Option<DateTime<Utc>>,
    pub actual_close_date: Option<DateTime<Utc>>,
    pub products: Json<Vec<DealProduct>>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewDeal {
    pub customer_id: Uuid,
    pub pipeline_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Stage id is required"))]
    pub stage_id: String,

    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(custom(function = "non_negative", message = "Value cannot be negative"))]
    pub value: Decimal,

    #[serde(default = "default_currency")]
    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,

    /// Falls back to the stage probability when omitted.
    pub probability: Option<i32>,

    pub expected_close_date: Option<DateTime<Utc>>,

    #[serde(default)]
    #[validate(nested)]
    pub products: Vec<DealProduct>,

    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DealPatch {
    pub customer_id: Option<Uuid>,
    pub pipeline_id: Option<Uuid>,

    #[validate(length(min = 1, max = 100, message = "Stage id cannot be empty"))]
    pub stage_id: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,

    #[validate(custom(function = "non_negative", message = "Value cannot be negative"))]
    pub value: Option<Decimal>,

    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: Option<String>,

    pub probability: Option<i32>,

    #[serde(default, deserialize_with = "nullable")]
    pub expected_close_date: Option<Option<DateTime<Utc>>>,

    #[serde(default, deserialize_with = "nullable")]
    pub actual_close_date: Option<Option<DateTime<Utc>>>,

    #[validate(nested)]
    pub products: Option<Vec<DealProduct>>,

    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl DealPatch {
    /// Whether the patch moves the deal to another stage or pipeline.
    pub fn moves_stage(&self) -> bool {
        self.stage_id.is_some() || self.pipeline_id.is_some()
    }
}

impl Patch for DealPatch {
    type Target = Deal;

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        changes
            .set_some("customer_id", &self.customer_id, |v| SqlValue::Uuid(Some(*v)))
            .set_some("pipeline_id", &self.pipeline_id, |v| SqlValue::Uuid(Some(*v)))
            .set_some("stage_id", &self.stage_id, |v| SqlValue::text(v.clone()))
            .set_some("title", &self.title, |v| SqlValue::text(v.clone()))
            .set_some("value", &self.value, |v| SqlValue::Decimal(Some(*v)))
            .set_some("currency", &self.currency, |v| SqlValue::text(v.to_uppercase()))
            .set_some("probability", &self.probability, |v| SqlValue::Int(Some(clamp_probability(*v))))
            .set_some("expected_close_date", &self.expected_close_date, |v| SqlValue::Timestamp(*v))
            .set_some("actual_close_date", &self.actual_close_date, |v| SqlValue::Timestamp(*v))
            .set_some("products", &self.products, |v| SqlValue::Json(serde_json::json!(v)))
            .set_some("notes", &self.notes, |v| SqlValue::Text(v.clone()));
        changes
    }

    fn apply(&self, deal: &mut Deal) {
        if let Some(v) = self.customer_id {
            deal.customer_id = v;
        }
        if let Some(v) = self.pipeline_id {
            deal.pipeline_id = v;
        }
        if let Some(v) = &self.stage_id {
            deal.stage_id = v.clone();
        }
        if let Some(v) = &self.title {
            deal.title = v.clone();
        }
        if let Some(v) = self.value {
            deal.value = v;
        }
        if let Some(v) = &self.currency {
            deal.currency = v.to_uppercase();
        }
        if let Some(v) = self.probability {
            deal.probability = clamp_probability(v);
        }
        if let Some(v) = self.expected_close_date {
            deal.expected_close_date = v;
        }
        if let Some(v) = self.actual_close_date {
            deal.actual_close_date = v;
        }
        if let Some(v) = &self.products {
            deal.products = Json(v.clone());
        }
        if let Some(v) = &self.notes {
            deal.notes = v.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DealListQuery {
    pub pipeline_id: Option<Uuid>,
    pub stage_id: Option<String>,
    pub customer_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_is_clamped() {
        assert_eq!(clamp_probability(-5), 0);
        assert_eq!(clamp_probability(150), 100);
        assert_eq!(clamp_probability(42), 42);

        let patch = DealPatch { probability: Some(250), ..Default::default() };
        assert_eq!(patch.changes().get("probability"), Some(&SqlValue::Int(Some(100))));
    }

    #[test]
    fn new_deal_defaults() {
        let body: NewDeal = serde_json::from_value(serde_json::json!({
            "customerId": Uuid::new_v4(),
            "pipelineId": Uuid::new_v4(),
            "stageId": "lead",
            "title": "Website rebuild",
            "value": 5000
        }))
        .unwrap();
        assert_eq!(body.currency, "USD");
        assert_eq!(body.value, Decimal::from(5000));
        assert!(body.probability.is_none());
        assert!(body.validate().is_ok());
    }

    #[test]
    fn negative_value_fails_validation() {
        let patch = DealPatch { value: Some(Decimal::from(-1)), ..Default::default() };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn stage_move_detection() {
        assert!(!DealPatch { title: Some("x".into()), ..Default::default() }.moves_stage());
        assert!(DealPatch { pipeline_id: Some(Uuid::new_v4()), ..Default::default() }.moves_stage());
    }
}
