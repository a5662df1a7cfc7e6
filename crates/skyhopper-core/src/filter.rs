//! Content filters for suction and links.
//!
//! A [`Filter`] pairs a [`FilterType`] with a de-duplicated item set. The
//! policy is a closed sum; [`evaluate`] is the single pure decision function
//! used everywhere an item type must pass a filter.

use crate::id::ItemTypeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// How a filter's item set is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Everything passes; the item set is ignored.
    #[default]
    None,
    /// Only listed items pass.
    Whitelist,
    /// Listed items are refused.
    Blacklist,
    /// Listed items are voided; everything else passes.
    Destroy,
}

impl FilterType {
    pub const ALL: [FilterType; 4] = [
        FilterType::None,
        FilterType::Whitelist,
        FilterType::Blacklist,
        FilterType::Destroy,
    ];

    /// Stable upper-case name, as stored by hosts.
    pub fn name(self) -> &'static str {
        match self {
            FilterType::None => "NONE",
            FilterType::Whitelist => "WHITELIST",
            FilterType::Blacklist => "BLACKLIST",
            FilterType::Destroy => "DESTROY",
        }
    }

    /// Parse a stored name. Unknown names fall back to [`FilterType::None`].
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a filter type name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter type: {0}")]
pub struct UnknownFilterType(pub String);

impl FromStr for FilterType {
    type Err = UnknownFilterType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownFilterType(s.to_string()))
    }
}

/// Outcome of running an item type through a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Allow,
    Deny,
    Destroy,
}

/// Decide what happens to `item` under `filter_type` with the given set.
pub fn evaluate(filter_type: FilterType, item: ItemTypeId, items: &BTreeSet<ItemTypeId>) -> Verdict {
    let listed = items.contains(&item);
    match filter_type {
        FilterType::None => Verdict::Allow,
        FilterType::Whitelist if listed => Verdict::Allow,
        FilterType::Whitelist => Verdict::Deny,
        FilterType::Blacklist if listed => Verdict::Deny,
        FilterType::Blacklist => Verdict::Allow,
        FilterType::Destroy if listed => Verdict::Destroy,
        FilterType::Destroy => Verdict::Allow,
    }
}

/// A filter policy and its item set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filter {
    pub kind: FilterType,
    items: BTreeSet<ItemTypeId>,
}

impl Filter {
    pub fn new(kind: FilterType) -> Self {
        Self {
            kind,
            items: BTreeSet::new(),
        }
    }

    pub fn with_items(kind: FilterType, items: impl IntoIterator<Item = ItemTypeId>) -> Self {
        Self {
            kind,
            items: items.into_iter().collect(),
        }
    }

    pub fn evaluate(&self, item: ItemTypeId) -> Verdict {
        evaluate(self.kind, item, &self.items)
    }

    pub fn items(&self) -> &BTreeSet<ItemTypeId> {
        &self.items
    }

    /// Returns false if the item was already listed.
    pub fn add_item(&mut self, item: ItemTypeId) -> bool {
        self.items.insert(item)
    }

    /// Returns false if the item was not listed.
    pub fn remove_item(&mut self, item: ItemTypeId) -> bool {
        self.items.remove(&item)
    }

    pub fn clear_items(&mut self) {
        self.items.clear();
    }
}
