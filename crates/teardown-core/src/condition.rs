//! Status conditions with merge-by-type semantics

use chrono::Utc;
use indexmap::IndexMap;
use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::Schema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Condition type recorded when a request is first seen
pub const CONDITION_INITIALIZED: &str = "Initialized";
/// Condition type summarizing the outcome of the latest pass
pub const CONDITION_COMPLETE: &str = "Complete";

pub const REASON_RECONCILING: &str = "Reconciling";
pub const REASON_NO_RESOURCES: &str = "NoResources";
pub const REASON_COMPLETED_SUCCESSFULLY: &str = "CompletedSuccessfully";
pub const REASON_COMPLETED_WITH_ERRORS: &str = "CompletedWithErrors";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

/// A named, mergeable status fact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    /// RFC 3339 time of the last status change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl Condition {
    /// A `True` condition, the only status the reconciler writes
    pub fn truthy(type_: impl Into<String>, reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            status: ConditionStatus::True,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: None,
            observed_generation: None,
        }
    }

    pub fn with_observed_generation(mut self, generation: Option<i64>) -> Self {
        self.observed_generation = generation;
        self
    }
}

/// Conditions keyed by type, in first-insertion order.
///
/// Serialized as a plain list. Duplicate types in an incoming list collapse
/// into one entry holding the last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    entries: IndexMap<String, Condition>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, type_: &str) -> Option<&Condition> {
        self.entries.get(type_)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.entries.values()
    }

    /// Merge a condition by type.
    ///
    /// An existing entry keeps its position; its reason, message and observed
    /// generation are replaced, and its transition time only moves when the
    /// status changes. Returns whether anything changed.
    pub fn set(&mut self, mut condition: Condition) -> bool {
        let now = Utc::now().to_rfc3339();
        match self.entries.get_mut(&condition.type_) {
            Some(existing) => {
                let mut changed = false;
                if existing.status != condition.status {
                    existing.status = condition.status;
                    existing.last_transition_time =
                        Some(condition.last_transition_time.take().unwrap_or(now));
                    changed = true;
                }
                if existing.reason != condition.reason {
                    existing.reason = condition.reason;
                    changed = true;
                }
                if existing.message != condition.message {
                    existing.message = condition.message;
                    changed = true;
                }
                if existing.observed_generation != condition.observed_generation {
                    existing.observed_generation = condition.observed_generation;
                    changed = true;
                }
                changed
            }
            None => {
                if condition.last_transition_time.is_none() {
                    condition.last_transition_time = Some(now);
                }
                self.entries.insert(condition.type_.clone(), condition);
                true
            }
        }
    }

    /// Whether a condition of this type is `True` with the given reason
    pub fn is_reason(&self, type_: &str, reason: &str) -> bool {
        self.get(type_)
            .map(|c| c.status == ConditionStatus::True && c.reason == reason)
            .unwrap_or(false)
    }
}

impl FromIterator<Condition> for Conditions {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        let mut out = Self::new();
        for condition in iter {
            out.entries.insert(condition.type_.clone(), condition);
        }
        out
    }
}

impl Serialize for Conditions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}

impl<'de> Deserialize<'de> for Conditions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let list = Vec::<Condition>::deserialize(deserializer)?;
        Ok(list.into_iter().collect())
    }
}

impl JsonSchema for Conditions {
    fn schema_name() -> String {
        "Conditions".to_string()
    }

    fn is_referenceable() -> bool {
        false
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        <Vec<Condition>>::json_schema(generator)
    }
}
