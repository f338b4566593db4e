//! crates/qa_core/src/ids.rs
//! Identifier newtypes: items, workers, brands, categories, ordering keys.
//! Normalization happens once, at construction; equality and ordering are
//! plain string comparisons afterwards.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Sentinel brand for items that carry none.
pub const NO_BRAND: &str = "No Brand";

/// Sentinel assignee string for deferred work.
pub const BACKLOG: &str = "Backlog";

macro_rules! simple_string_newtype {
    ($(#[$m:meta])* $name:ident) => {
        $(#[$m])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        string_accessors!($name);
    }
}

macro_rules! string_accessors {
    ($name:ident) => {
        impl $name {
            #[inline] pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str { &self.0 }
        }
    }
}

/// Collapse internal whitespace and title-case every word:
/// the first letter after any non-letter is upper-cased, the rest lower-cased.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for (wi, word) in raw.split_whitespace().enumerate() {
        if wi > 0 {
            out.push(' ');
        }
        let mut prev_alpha = false;
        for c in word.chars() {
            if c.is_alphabetic() {
                if prev_alpha {
                    out.extend(c.to_lowercase());
                } else {
                    out.extend(c.to_uppercase());
                }
                prev_alpha = true;
            } else {
                out.push(c);
                prev_alpha = false;
            }
        }
    }
    out
}

simple_string_newtype!(
    /// Opaque, stable item identifier (e.g. a spreadsheet row number).
    ItemId
);

impl FromStr for ItemId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.is_empty() {
            return Err(CoreError::EmptyToken("item id"));
        }
        Ok(ItemId(t.to_owned()))
    }
}

impl From<u64> for ItemId {
    fn from(n: u64) -> Self {
        ItemId(n.to_string())
    }
}

/// Worker key: trimmed, whitespace-collapsed, title-cased.
///
/// Deserialization runs through [`WorkerName::normalize`] as well, so a blank
/// or `Backlog` name in a config file or summary is rejected, not trusted.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkerName(String);

string_accessors!(WorkerName);

impl WorkerName {
    /// Normalize a raw roster name. Blank names and the backlog sentinel are rejected.
    pub fn normalize(raw: &str) -> Result<Self, CoreError> {
        let n = title_case(raw);
        if n.is_empty() {
            return Err(CoreError::EmptyToken("worker name"));
        }
        if n == BACKLOG {
            return Err(CoreError::DomainOutOfRange("worker name collides with the backlog sentinel"));
        }
        Ok(WorkerName(n))
    }
}

impl FromStr for WorkerName {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkerName::normalize(s)
    }
}

impl TryFrom<String> for WorkerName {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        WorkerName::normalize(&s)
    }
}

impl From<WorkerName> for String {
    fn from(w: WorkerName) -> Self {
        w.0
    }
}

simple_string_newtype!(
    /// Grouping key. Blank or missing brands collapse into [`NO_BRAND`].
    Brand
);

impl Brand {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if !s.is_empty() => Brand(s.to_owned()),
            _ => Brand(NO_BRAND.to_owned()),
        }
    }

    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.0 == NO_BRAND
    }
}

simple_string_newtype!(
    /// Category matched against worker preferences (title-cased, like names).
    Category
);

impl Category {
    /// `None` for blank input.
    pub fn normalize(raw: &str) -> Option<Self> {
        let n = title_case(raw);
        (!n.is_empty()).then_some(Category(n))
    }
}

simple_string_newtype!(
    /// Ordering key for backlog mode. ISO-8601 strings order lexicographically.
    SequenceKey
);

impl SequenceKey {
    pub fn from_raw(raw: &str) -> Option<Self> {
        let t = raw.trim();
        (!t.is_empty()).then(|| SequenceKey(t.to_owned()))
    }
}

/// Terminal value of one assignment-map entry.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Assignee {
    Worker(WorkerName),
    Backlog,
}

impl Assignee {
    #[inline]
    pub fn is_backlog(&self) -> bool {
        matches!(self, Assignee::Backlog)
    }

    pub fn worker(&self) -> Option<&WorkerName> {
        match self {
            Assignee::Worker(w) => Some(w),
            Assignee::Backlog => None,
        }
    }
}

impl fmt::Display for Assignee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assignee::Worker(w) => f.write_str(w.as_str()),
            Assignee::Backlog => f.write_str(BACKLOG),
        }
    }
}

impl From<Assignee> for String {
    fn from(a: Assignee) -> Self {
        a.to_string()
    }
}

impl From<String> for Assignee {
    /// Reads back a written value verbatim; names were normalized before writing.
    fn from(s: String) -> Self {
        if s == BACKLOG {
            Assignee::Backlog
        } else {
            Assignee::Worker(WorkerName(s))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_collapses_and_capitalizes() {
        assert_eq!(title_case("  mary   ann "), "Mary Ann");
        assert_eq!(title_case("o'neil"), "O'Neil");
        assert_eq!(title_case("HOME & garden"), "Home & Garden");
        assert_eq!(title_case("   "), "");
    }

    #[test]
    fn worker_name_rejects_blank_and_sentinel() {
        assert_eq!(WorkerName::normalize(" alice ").unwrap().as_str(), "Alice");
        assert!(WorkerName::normalize("  ").is_err());
        assert!(WorkerName::normalize("backlog").is_err());
    }

    #[test]
    fn worker_name_deserializes_through_normalize() {
        let w: WorkerName = serde_json::from_str("\"  mary   ann \"").unwrap();
        assert_eq!(w.as_str(), "Mary Ann");
        assert!(serde_json::from_str::<WorkerName>("\"backlog\"").is_err());
        assert!(serde_json::from_str::<WorkerName>("\"   \"").is_err());
        assert_eq!(serde_json::to_string(&w).unwrap(), "\"Mary Ann\"");

        // map keys go through the same path
        let m: std::collections::BTreeMap<WorkerName, u32> = serde_json::from_str(r#"{" bob ": 3}"#).unwrap();
        assert_eq!(m[&WorkerName::normalize("Bob").unwrap()], 3);
        assert!(serde_json::from_str::<std::collections::BTreeMap<WorkerName, u32>>(r#"{"Backlog": 1}"#).is_err());
    }

    #[test]
    fn brand_blank_maps_to_sentinel() {
        assert!(Brand::from_raw(None).is_sentinel());
        assert!(Brand::from_raw(Some("   ")).is_sentinel());
        assert_eq!(Brand::from_raw(Some(" Acme ")).as_str(), "Acme");
    }

    #[test]
    fn assignee_string_round_trip() {
        let a = Assignee::Worker(WorkerName::normalize("bob").unwrap());
        let s: String = a.clone().into();
        assert_eq!(s, "Bob");
        assert_eq!(Assignee::from(s), a);
        assert_eq!(Assignee::from(BACKLOG.to_string()), Assignee::Backlog);
        assert_eq!(serde_json::to_string(&Assignee::Backlog).unwrap(), "\"Backlog\"");
    }

    #[test]
    fn item_id_trims_and_rejects_blank() {
        assert_eq!("  12 ".parse::<ItemId>().unwrap().as_str(), "12");
        assert!("".parse::<ItemId>().is_err());
        assert_eq!(ItemId::from(7u64).as_str(), "7");
    }
}
