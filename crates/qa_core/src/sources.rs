//! Raw records as external collaborators hand them over, plus the narrow
//! source/sink traits the pipeline consumes.
//!
//! Raw types are deliberately loose (optional fields, strings or numbers);
//! normalization and validation belong to the catalog / roster stages.

use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::ids::{Assignee, ItemId};

// ----------------------------- Items -----------------------------

/// Item identifier as found in the source: a row number or a text key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    /// `None` for blank text.
    pub fn to_item_id(&self) -> Option<ItemId> {
        match self {
            RawId::Number(n) => Some(ItemId::from(*n)),
            RawId::Text(s) => s.parse().ok(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Explicit override flag; `priority_markers` are checked as well.
    #[serde(default)]
    pub priority: Option<bool>,
    /// Override marker cells; any numeric value marks the item as priority.
    #[serde(default)]
    pub priority_markers: Vec<serde_json::Value>,
    #[serde(default)]
    pub sequence_key: Option<String>,
}

impl RawItem {
    pub fn is_priority(&self) -> bool {
        self.priority.unwrap_or(false) || self.priority_markers.iter().any(serde_json::Value::is_number)
    }
}

// ----------------------------- Roster -----------------------------

/// Capacity as typed by a person: a number, or text that should hold one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCapacity {
    Count(i64),
    Text(String),
}

impl RawCapacity {
    /// Non-negative integer or `MalformedCapacity`.
    pub fn parse(&self, worker: &str) -> Result<u32, CoreError> {
        let malformed = |raw: String| CoreError::MalformedCapacity { worker: worker.to_owned(), raw };
        match self {
            RawCapacity::Count(n) => u32::try_from(*n).map_err(|_| malformed(n.to_string())),
            RawCapacity::Text(s) => s.trim().parse::<u32>().map_err(|_| malformed(s.clone())),
        }
    }
}

/// Preferences given either as a list or as one comma-separated cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPreferences {
    List(Vec<String>),
    Joined(String),
}

impl Default for RawPreferences {
    fn default() -> Self {
        RawPreferences::List(Vec::new())
    }
}

impl RawPreferences {
    /// Non-blank entries in the order given.
    pub fn entries(&self) -> Vec<&str> {
        match self {
            RawPreferences::List(v) => v.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect(),
            RawPreferences::Joined(s) => s.split(',').map(str::trim).filter(|s| !s.is_empty()).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMember {
    pub name: String,
    #[serde(default)]
    pub capacity: Option<RawCapacity>,
    #[serde(default)]
    pub preferences: RawPreferences,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCapacityOverride {
    pub name: String,
    pub capacity: RawCapacity,
}

impl RawCapacityOverride {
    /// Parse one `Name:Limit` entry. The limit stays raw; it is validated by the roster stage.
    pub fn parse_pair(entry: &str) -> Result<Self, CoreError> {
        let (name, limit) = entry.split_once(':').ok_or_else(|| CoreError::MalformedCapacity {
            worker: entry.trim().to_owned(),
            raw: String::new(),
        })?;
        Ok(RawCapacityOverride {
            name: name.trim().to_owned(),
            capacity: RawCapacity::Text(limit.trim().to_owned()),
        })
    }

    /// Parse `"A:10, B:5"`; blank input yields an empty list.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, CoreError> {
        s.split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(Self::parse_pair)
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPreAssignment {
    pub brand: String,
    pub worker: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRoster {
    pub members: Vec<RawMember>,
    #[serde(default)]
    pub absent: Vec<String>,
    #[serde(default)]
    pub capacity_overrides: Vec<RawCapacityOverride>,
    #[serde(default)]
    pub pre_assignments: Vec<RawPreAssignment>,
}

// ----------------------------- Traits -----------------------------

/// Finite, single-pass sequence of raw item records.
pub trait ItemSource {
    type Records: Iterator<Item = RawItem>;
    fn into_records(self) -> Self::Records;
}

impl ItemSource for Vec<RawItem> {
    type Records = std::vec::IntoIter<RawItem>;
    fn into_records(self) -> Self::Records {
        self.into_iter()
    }
}

/// Roster intake: members, capacity overrides, absentees, pre-assignments.
pub trait WorkerSource {
    fn into_roster(self) -> RawRoster;
}

impl WorkerSource for RawRoster {
    fn into_roster(self) -> RawRoster {
        self
    }
}

/// Receives the final `item → assignee` entries, one call per item, catalog order.
pub trait AssignmentSink {
    type Error;
    fn record(&mut self, item: &ItemId, assignee: &Assignee) -> Result<(), Self::Error>;
    fn finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl AssignmentSink for Vec<(ItemId, Assignee)> {
    type Error = Infallible;
    fn record(&mut self, item: &ItemId, assignee: &Assignee) -> Result<(), Self::Error> {
        self.push((item.clone(), assignee.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_marker_means_priority() {
        let mut r = RawItem { priority_markers: vec![json!(null), json!("x")], ..RawItem::default() };
        assert!(!r.is_priority());
        r.priority_markers.push(json!(3));
        assert!(r.is_priority());
        let flagged = RawItem { priority: Some(true), ..RawItem::default() };
        assert!(flagged.is_priority());
    }

    #[test]
    fn raw_ids_accept_numbers_and_text() {
        let a: RawId = serde_json::from_value(json!(17)).unwrap();
        let b: RawId = serde_json::from_value(json!(" r-9 ")).unwrap();
        assert_eq!(a.to_item_id().unwrap().as_str(), "17");
        assert_eq!(b.to_item_id().unwrap().as_str(), "r-9");
        assert!(RawId::Text("  ".into()).to_item_id().is_none());
    }

    #[test]
    fn capacity_parse_rejects_garbage() {
        assert_eq!(RawCapacity::Count(5).parse("A").unwrap(), 5);
        assert_eq!(RawCapacity::Text(" 12 ".into()).parse("A").unwrap(), 12);
        assert!(RawCapacity::Count(-1).parse("A").is_err());
        assert!(RawCapacity::Text("ten".into()).parse("A").is_err());
    }

    #[test]
    fn override_list_parsing() {
        let v = RawCapacityOverride::parse_list("alice:10, bob : 5 ,").unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(v[1].name, "bob");
        assert_eq!(v[1].capacity.parse("bob").unwrap(), 5);
        assert!(RawCapacityOverride::parse_list("alice").is_err());
        assert!(RawCapacityOverride::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn preferences_list_or_joined() {
        let a: RawPreferences = serde_json::from_value(json!(["Toys", " "])).unwrap();
        let b: RawPreferences = serde_json::from_value(json!("toys, garden,")).unwrap();
        assert_eq!(a.entries(), vec!["Toys"]);
        assert_eq!(b.entries(), vec!["toys", "garden"]);
    }

    #[test]
    fn vec_sink_collects_in_order() {
        let mut sink: Vec<(ItemId, Assignee)> = Vec::new();
        sink.record(&ItemId::from(2u64), &Assignee::Backlog).unwrap();
        sink.record(&ItemId::from(1u64), &Assignee::Backlog).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink[0].0.as_str(), "2");
    }
}
