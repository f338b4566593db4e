//! Normalized domain entities shared by every stage.

use serde::{Deserialize, Serialize};

use crate::ids::{Brand, Category, ItemId, SequenceKey, WorkerName};

/// One unit of work. Immutable once built by the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub brand: Brand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// True when the source carried a numeric override marker.
    pub priority: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_key: Option<SequenceKey>,
    /// 0-based position in the item source; the canonical catalog order.
    pub position: usize,
}

/// One assignable team member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub name: WorkerName,
    pub capacity: u32,
    /// Ordered by the roster; only used as an eligibility filter.
    pub preferred_categories: Vec<Category>,
    pub active: bool,
}

impl Worker {
    #[inline]
    pub fn prefers(&self, category: &Category) -> bool {
        self.preferred_categories.iter().any(|c| c == category)
    }
}

/// Items sharing a brand, in fixed relative order. Items are borrowed from the catalog.
#[derive(Clone, Debug)]
pub struct Block<'a> {
    pub brand: Brand,
    pub items: Vec<&'a Item>,
    /// Catalog position of the brand's first item (input-order tie key).
    pub origin: usize,
}

impl<'a> Block<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Smallest sequence key among the block's items; `None` if no item has one.
    pub fn earliest_key(&self) -> Option<&'a SequenceKey> {
        self.items.iter().filter_map(|it| it.sequence_key.as_ref()).min()
    }

    /// Same brand identity and origin, different (ordered) item subset.
    pub fn with_items(&self, items: Vec<&'a Item>) -> Block<'a> {
        Block { brand: self.brand.clone(), items, origin: self.origin }
    }
}
