use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq)]
pub enum StageError {
    #[error("Pipeline must have at least one stage")]
    Empty,

    #[error("Stage at position {0} has an empty id")]
    BlankId(usize),

    #[error("Duplicate stage id '{0}'")]
    DuplicateId(String),

    #[error("Stage '{id}' has probability {probability}, expected 0-100")]
    ProbabilityOutOfRange { id: String, probability: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub name: String,
    pub order: i32,
    pub probability: i32,
}

impl Stage {
    pub fn new(id: &str, name: &str, order: i32, probability: i32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            order,
            probability,
        }
    }
}

/// Ordered, validated stage definitions of a pipeline.
///
/// Built through [`StageList::new`] or deserialization, both of which
/// reject empty lists, blank or duplicate ids and probabilities outside
/// 0-100. Stages are kept sorted by `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Stage>", into = "Vec<Stage>")]
pub struct StageList(Vec<Stage>);

impl StageList {
    pub fn new(mut stages: Vec<Stage>) -> Result<Self, StageError> {
        if stages.is_empty() {
            return Err(StageError::Empty);
        }
        let mut seen = HashSet::with_capacity(stages.len());
        for (position, stage) in stages.iter().enumerate() {
            if stage.id.trim().is_empty() {
                return Err(StageError::BlankId(position));
            }
            if !(0..=100).contains(&stage.probability) {
                return Err(StageError::ProbabilityOutOfRange {
                    id: stage.id.clone(),
                    probability: stage.probability,
                });
            }
            if !seen.insert(stage.id.as_str()) {
                return Err(StageError::DuplicateId(stage.id.clone()));
            }
        }
        stages.sort_by_key(|s| s.order);
        Ok(Self(stages))
    }

    /// Stages every new organization starts with. Ids are minted per call,
    /// so a stage id never matches a stage of another pipeline.
    pub fn default_stages() -> Self {
        let stage = |name: &str, order: i32, probability: i32| Stage {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            order,
            probability,
        };
        Self(vec![
            stage("Lead", 1, 10),
            stage("Qualified", 2, 25),
            stage("Proposal", 3, 50),
            stage("Negotiation", 4, 75),
            stage("Closed Won", 5, 100),
            stage("Closed Lost", 6, 0),
        ])
    }

    pub fn get(&self, id: &str) -> Option<&Stage> {
        self.0.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stage> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<Stage>> for StageList {
    type Error = StageError;

    fn try_from(stages: Vec<Stage>) -> Result<Self, Self::Error> {
        StageList::new(stages)
    }
}

impl From<StageList> for Vec<Stage> {
    fn from(list: StageList) -> Self {
        list.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub stages: Json<StageList>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPipeline {
    pub name: String,
    pub stages: StageList,
    pub is_default: bool,
}

impl NewPipeline {
    pub fn default_for_organization() -> Self {
        Self {
            name: "Sales Pipeline".to_string(),
            stages: StageList::default_stages(),
            is_default: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_sorted_by_order() {
        let list = StageList::new(vec![
            Stage::new("b", "B", 2, 50),
            Stage::new("a", "A", 1, 10),
        ])
        .unwrap();
        let ids: Vec<_> = list.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn rejects_duplicate_and_blank_ids() {
        let dup = StageList::new(vec![Stage::new("a", "A", 1, 10), Stage::new("a", "A2", 2, 20)]);
        assert_eq!(dup, Err(StageError::DuplicateId("a".into())));

        let blank = StageList::new(vec![Stage::new(" ", "A", 1, 10)]);
        assert_eq!(blank, Err(StageError::BlankId(0)));

        assert_eq!(StageList::new(vec![]), Err(StageError::Empty));
    }

    #[test]
    fn rejects_out_of_range_probability_on_load() {
        let raw = r#"[{"id":"x","name":"X","order":1,"probability":140}]"#;
        let parsed: Result<StageList, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn default_stages_are_valid() {
        let defaults = StageList::default_stages();
        let reparsed = StageList::new(defaults.clone().into()).unwrap();
        assert_eq!(defaults, reparsed);
        assert_eq!(defaults.len(), 6);

        let proposal = defaults.iter().find(|s| s.name == "Proposal").unwrap();
        assert_eq!(defaults.get(&proposal.id).map(|s| s.probability), Some(50));
    }

    #[test]
    fn default_stage_ids_differ_between_pipelines() {
        let first = StageList::default_stages();
        let second = StageList::default_stages();
        assert!(first.iter().all(|s| !second.contains(&s.id)));
    }
}
