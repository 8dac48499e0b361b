//! Display items and list normalization
//!
//! Callers hand over drawable ids, image URLs or rich records. Whatever the
//! input, the popup works on one ordered list of [`DisplayItem`]s carrying a
//! selection flag.

use crate::error::{PopupError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Packaged image resource id
pub type DrawableId = u32;

/// Rich item record supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemRecord {
    pub image_url: Option<String>,
    pub drawable_id: Option<DrawableId>,
    pub title: Option<String>,
}

/// Where an item's image comes from. Exactly one variant per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    Drawable(DrawableId),
    Url(String),
    Record(ItemRecord),
}

impl ItemSource {
    /// Stable key used to content-address the cached image
    pub fn cache_key(&self) -> String {
        match self {
            ItemSource::Drawable(id) => format!("drawable:{}", id),
            ItemSource::Url(url) => format!("url:{}", url),
            ItemSource::Record(record) => match (&record.image_url, record.drawable_id) {
                (Some(url), _) => format!("url:{}", url),
                (None, Some(id)) => format!("drawable:{}", id),
                (None, None) => format!("record:{}", record.title.as_deref().unwrap_or("")),
            },
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            ItemSource::Drawable(_) => ItemKind::Drawable,
            ItemSource::Url(_) => ItemKind::Url,
            ItemSource::Record(_) => ItemKind::Record,
        }
    }
}

/// Element kind of a caller list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Drawable,
    Url,
    Record,
}

/// One element of the caller's list, before validation
#[derive(Debug, Clone, PartialEq)]
pub enum RawItem {
    Drawable(DrawableId),
    Url(String),
    Record(ItemRecord),
    /// Anything the popup cannot display; carries a description for the error
    Unsupported(String),
}

impl RawItem {
    /// Map a JSON value: non-negative integer, string or object
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_u64().and_then(|v| DrawableId::try_from(v).ok()) {
                Some(id) => RawItem::Drawable(id),
                None => RawItem::Unsupported(format!("number {}", n)),
            },
            Value::String(s) => RawItem::Url(s.clone()),
            Value::Object(_) => match serde_json::from_value::<ItemRecord>(value.clone()) {
                Ok(record) => RawItem::Record(record),
                Err(e) => RawItem::Unsupported(format!("record ({})", e)),
            },
            Value::Null => RawItem::Unsupported("null".into()),
            Value::Bool(b) => RawItem::Unsupported(format!("bool {}", b)),
            Value::Array(_) => RawItem::Unsupported("nested list".into()),
        }
    }

    fn into_source(self) -> Option<ItemSource> {
        match self {
            RawItem::Drawable(id) => Some(ItemSource::Drawable(id)),
            RawItem::Url(url) => Some(ItemSource::Url(url)),
            RawItem::Record(record) => Some(ItemSource::Record(record)),
            RawItem::Unsupported(_) => None,
        }
    }
}

impl From<DrawableId> for RawItem {
    fn from(id: DrawableId) -> Self {
        RawItem::Drawable(id)
    }
}

impl From<&str> for RawItem {
    fn from(url: &str) -> Self {
        RawItem::Url(url.to_string())
    }
}

impl From<String> for RawItem {
    fn from(url: String) -> Self {
        RawItem::Url(url)
    }
}

impl From<ItemRecord> for RawItem {
    fn from(record: ItemRecord) -> Self {
        RawItem::Record(record)
    }
}

/// An item as displayed by the pager and the strip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayItem {
    pub source: ItemSource,
    pub is_selected: bool,
}

/// Non-empty ordered list of display items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemList {
    items: Vec<DisplayItem>,
}

impl ItemList {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Never true for a normalized list
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.items.len() - 1
    }

    pub fn contains_index(&self, index: usize) -> bool {
        index < self.items.len()
    }

    pub fn get(&self, index: usize) -> Option<&DisplayItem> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisplayItem> {
        self.items.iter()
    }

    /// Index of the selected item, if any
    pub fn selected_index(&self) -> Option<usize> {
        self.items.iter().position(|item| item.is_selected)
    }

    /// Select item 0 when nothing is selected yet
    pub fn activate_selection(&mut self) {
        if self.selected_index().is_none() {
            self.items[0].is_selected = true;
        }
    }

    /// Move the selection flag to `index`. Returns the previously selected index.
    ///
    /// Out-of-range indices leave the list untouched.
    pub fn select(&mut self, index: usize) -> Option<usize> {
        if !self.contains_index(index) {
            return self.selected_index();
        }
        let previous = self.selected_index();
        if let Some(prev) = previous {
            self.items[prev].is_selected = false;
        }
        self.items[index].is_selected = true;
        previous
    }
}

/// Normalize a caller list into an [`ItemList`].
///
/// Fails with `InvalidInput` when the list is empty, holds an unsupported
/// element, or mixes element kinds. All items start unselected.
pub fn normalize<I>(raw: I) -> Result<ItemList>
where
    I: IntoIterator,
    I::Item: Into<RawItem>,
{
    let raw: Vec<RawItem> = raw.into_iter().map(Into::into).collect();
    if raw.is_empty() {
        return Err(PopupError::InvalidInput("List must not be empty".into()));
    }

    let mut expected: Option<ItemKind> = None;
    for (index, item) in raw.iter().enumerate() {
        let kind = match item {
            RawItem::Unsupported(what) => {
                return Err(PopupError::InvalidInput(format!(
                    "Unsupported element at {}: {}. List must contain drawable ids, image URLs or records",
                    index, what
                )));
            }
            RawItem::Drawable(_) => ItemKind::Drawable,
            RawItem::Url(_) => ItemKind::Url,
            RawItem::Record(_) => ItemKind::Record,
        };
        match expected {
            None => expected = Some(kind),
            Some(first) if first != kind => {
                return Err(PopupError::InvalidInput(format!(
                    "Mixed element kinds: {:?} at 0, {:?} at {}",
                    first, kind, index
                )));
            }
            Some(_) => {}
        }
    }

    let items = raw
        .into_iter()
        .filter_map(RawItem::into_source)
        .map(|source| DisplayItem { source, is_selected: false })
        .collect();

    Ok(ItemList { items })
}

/// Normalize a JSON array
pub fn normalize_json(values: &[Value]) -> Result<ItemList> {
    normalize(values.iter().map(RawItem::from_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_urls() {
        let list = normalize(["a.png", "b.png", "c.png"]).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(1).unwrap().source, ItemSource::Url("b.png".into()));
        assert!(list.iter().all(|item| !item.is_selected));
    }

    #[test]
    fn test_normalize_empty() {
        let err = normalize(Vec::<RawItem>::new()).unwrap_err();
        assert!(matches!(err, PopupError::InvalidInput(_)));
    }

    #[test]
    fn test_normalize_mixed_json() {
        let err = normalize_json(&[json!(1), json!("a")]).unwrap_err();
        assert!(matches!(err, PopupError::InvalidInput(_)));

        let err = normalize_json(&[json!(true)]).unwrap_err();
        assert!(matches!(err, PopupError::InvalidInput(_)));

        let err = normalize_json(&[json!(-3)]).unwrap_err();
        assert!(matches!(err, PopupError::InvalidInput(_)));
    }

    #[test]
    fn test_normalize_records() {
        let list = normalize_json(&[
            json!({"image_url": "https://x/1.jpg", "title": "one"}),
            json!({"drawable_id": 7}),
        ])
        .unwrap();
        assert_eq!(list.get(0).unwrap().source.cache_key(), "url:https://x/1.jpg");
        assert_eq!(list.get(1).unwrap().source.cache_key(), "drawable:7");
    }

    #[test]
    fn test_select_moves_flag() {
        let mut list = normalize([1u32, 2, 3]).unwrap();
        assert_eq!(list.selected_index(), None);

        list.activate_selection();
        assert_eq!(list.selected_index(), Some(0));

        assert_eq!(list.select(2), Some(0));
        assert_eq!(list.selected_index(), Some(2));
        assert_eq!(list.iter().filter(|i| i.is_selected).count(), 1);

        // Out of range is ignored
        assert_eq!(list.select(9), Some(2));
        assert_eq!(list.selected_index(), Some(2));
    }
}
