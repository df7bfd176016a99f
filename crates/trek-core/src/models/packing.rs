//! Packing list model

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Stable identifier for a packing item, using UUID v7 (time-sortable).
///
/// Keys are assigned client-side the first time an item is seen. Items are
/// addressed by key rather than by their position inside a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey(Uuid);

impl ItemKey {
    /// Create a new unique item key using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this key
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ItemKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemKey {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A single line entry in a packing list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingItem {
    /// Stable key (generated when the server sent none, or one that is not a UUID)
    #[serde(rename = "id", default, deserialize_with = "deserialize_item_key")]
    pub key: ItemKey,
    /// Display name
    pub name: String,
    /// Optional positive quantity
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_quantity"
    )]
    pub quantity: Option<u32>,
    /// Whether the item is packed
    #[serde(default)]
    pub packed: bool,
    /// Marks user-added items (vs. generated suggestions)
    #[serde(default)]
    pub is_custom: bool,
}

impl PackingItem {
    /// Create an unpacked, generated item.
    pub fn new(name: impl Into<String>, quantity: Option<u32>) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidInput(
                "packing item name must not be empty".to_string(),
            ));
        }
        if quantity == Some(0) {
            return Err(Error::InvalidInput(
                "packing item quantity must be positive".to_string(),
            ));
        }
        Ok(Self {
            key: ItemKey::new(),
            name,
            quantity,
            packed: false,
            is_custom: false,
        })
    }

    /// Create an unpacked, user-added item.
    pub fn custom(name: impl Into<String>, quantity: Option<u32>) -> Result<Self> {
        let mut item = Self::new(name, quantity)?;
        item.is_custom = true;
        Ok(item)
    }
}

fn deserialize_item_key<'de, D>(deserializer: D) -> std::result::Result<ItemKey, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|id| id.trim().parse().ok())
        .unwrap_or_default())
}

fn deserialize_quantity<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<u32>::deserialize(deserializer)?;
    Ok(raw.filter(|quantity| *quantity > 0))
}

/// Where an item lives inside a packing list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemPosition<'a> {
    pub category: &'a str,
    pub index: usize,
    pub item: &'a PackingItem,
}

/// Packed vs. total item counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PackingProgress {
    pub packed: usize,
    pub total: usize,
}

impl PackingProgress {
    /// Whole-number percentage; an empty list counts as 0%.
    #[must_use]
    pub fn percent(self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        u8::try_from(self.packed.min(self.total) * 100 / self.total).unwrap_or(100)
    }

    #[must_use]
    pub const fn is_complete(self) -> bool {
        self.total > 0 && self.packed >= self.total
    }
}

/// Categorized collection of packing items, keyed by category name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackingList {
    categories: BTreeMap<String, Vec<PackingItem>>,
}

impl PackingList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from `(category, items)` pairs.
    #[must_use]
    pub fn from_categories<I, C>(categories: I) -> Self
    where
        I: IntoIterator<Item = (C, Vec<PackingItem>)>,
        C: Into<String>,
    {
        Self {
            categories: categories
                .into_iter()
                .map(|(category, items)| (category.into(), items))
                .collect(),
        }
    }

    /// Category names in display order.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Iterate categories with their items.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[PackingItem])> {
        self.categories
            .iter()
            .map(|(category, items)| (category.as_str(), items.as_slice()))
    }

    #[must_use]
    pub fn items(&self, category: &str) -> Option<&[PackingItem]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    #[must_use]
    pub fn get(&self, category: &str, index: usize) -> Option<&PackingItem> {
        self.categories.get(category)?.get(index)
    }

    /// Resolve a positional address to the item's stable key.
    #[must_use]
    pub fn locate(&self, category: &str, index: usize) -> Option<ItemKey> {
        self.get(category, index).map(|item| item.key)
    }

    #[must_use]
    pub fn find(&self, key: ItemKey) -> Option<ItemPosition<'_>> {
        self.categories.iter().find_map(|(category, items)| {
            items
                .iter()
                .position(|item| item.key == key)
                .map(|index| ItemPosition {
                    category: category.as_str(),
                    index,
                    item: &items[index],
                })
        })
    }

    /// Clone of this list with the keyed item's `packed` flag flipped.
    ///
    /// Returns `None` when the key is unknown; `self` is never modified.
    #[must_use]
    pub fn with_packed_toggled(&self, key: ItemKey) -> Option<Self> {
        let packed = self.find(key)?.item.packed;
        self.with_packed(key, !packed)
    }

    /// Clone of this list with the keyed item's `packed` flag set.
    #[must_use]
    pub fn with_packed(&self, key: ItemKey, packed: bool) -> Option<Self> {
        let mut next = self.clone();
        let item = next.item_mut(key)?;
        item.packed = packed;
        Some(next)
    }

    /// Clone of this list taking each item's `packed` flag from `accepted`.
    ///
    /// Items for which `hold` returns true, and items `accepted` does not
    /// contain, keep their own flag. Returns `None` when nothing differs.
    #[must_use]
    pub fn with_packed_from(
        &self,
        accepted: &Self,
        hold: impl Fn(ItemKey) -> bool,
    ) -> Option<Self> {
        let mut next = self.clone();
        let mut changed = false;
        for item in next.categories.values_mut().flatten() {
            if hold(item.key) {
                continue;
            }
            if let Some(position) = accepted.find(item.key) {
                if position.item.packed != item.packed {
                    item.packed = position.item.packed;
                    changed = true;
                }
            }
        }
        changed.then_some(next)
    }

    /// Append an item to a category, creating the category when missing.
    pub fn add_item(&mut self, category: &str, item: PackingItem) -> Result<ItemKey> {
        let category = category.trim();
        if category.is_empty() {
            return Err(Error::InvalidInput(
                "packing category must not be empty".to_string(),
            ));
        }
        let key = item.key;
        self.categories
            .entry(category.to_string())
            .or_default()
            .push(item);
        Ok(key)
    }

    /// Remove an item; empty categories are dropped.
    pub fn remove_item(&mut self, key: ItemKey) -> Option<PackingItem> {
        let (category, index) = self
            .find(key)
            .map(|position| (position.category.to_string(), position.index))?;
        let items = self.categories.get_mut(&category)?;
        let removed = items.remove(index);
        if items.is_empty() {
            self.categories.remove(&category);
        }
        Some(removed)
    }

    #[must_use]
    pub fn progress(&self) -> PackingProgress {
        self.categories
            .values()
            .flatten()
            .fold(PackingProgress::default(), |mut progress, item| {
                progress.total += 1;
                if item.packed {
                    progress.packed += 1;
                }
                progress
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn item_mut(&mut self, key: ItemKey) -> Option<&mut PackingItem> {
        self.categories
            .values_mut()
            .flatten()
            .find(|item| item.key == key)
    }
}
