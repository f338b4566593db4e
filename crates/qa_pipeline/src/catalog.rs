//! Item Catalog: raw records → typed `Item`s in source order.
//!
//! Per-record problems (blank or duplicate id) make that record unassignable;
//! it is reported with its 0-based source position and never dropped silently.
//! Source-level problems (no record carries an id, or backlog ordering
//! requested while no record carries a sequence key) are hard data errors.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use qa_core::sources::{ItemSource, RawId};
use qa_core::{Brand, Category, Item, ItemId, SequenceKey};

use crate::PipelineError;

/// A record excluded from allocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unassignable {
    pub position: usize,
    /// The id as given, when there was one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemCatalog {
    /// Assignable items in source order; `position` is the source index.
    pub items: Vec<Item>,
    pub unassignable: Vec<Unassignable>,
}

impl ItemCatalog {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[instrument(skip_all, fields(backlog_mode = backlog_mode))]
pub fn build_catalog<S: ItemSource>(source: S, backlog_mode: bool) -> Result<ItemCatalog, PipelineError> {
    let mut catalog = ItemCatalog::default();
    let mut seen: BTreeSet<ItemId> = BTreeSet::new();
    let mut records = 0usize;
    let mut any_id = false;
    let mut any_key = false;

    for (position, raw) in source.into_records().enumerate() {
        records += 1;
        let raw_id = raw.id.as_ref();
        let id = raw_id.and_then(|r| r.to_item_id());
        let shown = raw_id.map(|r| match r {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s.clone(),
        });

        let Some(id) = id else {
            catalog.unassignable.push(Unassignable { position, id: shown, reason: "missing id".into() });
            continue;
        };
        any_id = true;
        if !seen.insert(id.clone()) {
            catalog.unassignable.push(Unassignable {
                position,
                id: Some(id.as_str().to_owned()),
                reason: "duplicate id".into(),
            });
            continue;
        }

        let sequence_key = raw.sequence_key.as_deref().and_then(SequenceKey::from_raw);
        any_key |= sequence_key.is_some();
        catalog.items.push(Item {
            id,
            brand: Brand::from_raw(raw.brand.as_deref()),
            category: raw.category.as_deref().and_then(Category::normalize),
            priority: raw.is_priority(),
            sequence_key,
            position,
        });
    }

    if records > 0 && !any_id {
        return Err(PipelineError::Data(format!("none of the {records} item records carries an id")));
    }
    if backlog_mode && records > 0 && !any_key {
        return Err(PipelineError::Data(
            "backlog ordering requested but no item record carries a sequence_key".into(),
        ));
    }

    debug!(items = catalog.items.len(), unassignable = catalog.unassignable.len(), "catalog built");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core::sources::RawItem;
    use serde_json::json;

    fn raw(id: Option<RawId>, brand: Option<&str>) -> RawItem {
        RawItem { id, brand: brand.map(str::to_owned), ..RawItem::default() }
    }

    #[test]
    fn normalizes_fields_and_keeps_source_order() {
        let recs = vec![
            RawItem {
                category: Some("  garden  tools ".into()),
                priority_markers: vec![json!(1)],
                sequence_key: Some("2025-01-02".into()),
                ..raw(Some(RawId::Number(7)), Some(" Acme "))
            },
            raw(Some(RawId::Text("b".into())), Some("  ")),
        ];
        let c = build_catalog(recs, false).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.items[0].id.as_str(), "7");
        assert_eq!(c.items[0].brand.as_str(), "Acme");
        assert_eq!(c.items[0].category.as_ref().unwrap().as_str(), "Garden Tools");
        assert!(c.items[0].priority);
        assert!(c.items[1].brand.is_sentinel());
        assert_eq!(c.items[1].position, 1);
    }

    #[test]
    fn blank_and_duplicate_ids_are_unassignable() {
        let recs = vec![
            raw(Some(RawId::Number(1)), None),
            raw(None, None),
            raw(Some(RawId::Text(" ".into())), None),
            raw(Some(RawId::Text("1".into())), None),
        ];
        let c = build_catalog(recs, false).unwrap();
        assert_eq!(c.len(), 1);
        let got: Vec<(usize, &str)> = c.unassignable.iter().map(|u| (u.position, u.reason.as_str())).collect();
        assert_eq!(got, vec![(1, "missing id"), (2, "missing id"), (3, "duplicate id")]);
        assert_eq!(c.unassignable[2].id.as_deref(), Some("1"));
    }

    #[test]
    fn source_without_any_id_is_a_data_error() {
        let recs = vec![raw(None, Some("A")), raw(None, Some("B"))];
        assert!(matches!(build_catalog(recs, false), Err(PipelineError::Data(_))));
        assert!(build_catalog(Vec::<RawItem>::new(), true).unwrap().is_empty());
    }

    #[test]
    fn backlog_mode_needs_some_sequence_key() {
        let recs = vec![raw(Some(RawId::Number(1)), None)];
        assert!(matches!(build_catalog(recs.clone(), true), Err(PipelineError::Data(_))));
        assert!(build_catalog(recs, false).is_ok());
    }
}
