//! Read-only vocabulary catalog.
//!
//! A catalog is an ordered list of categories, each holding an ordered list of
//! items. The scheduler never mutates catalog content; it only reads item keys
//! and relies on declaration order to break priority ties.
//!
//! Catalogs are JSON documents:
//!
//! ```json
//! { "categories": [
//!     { "id": "verbos", "name": "Common verbs",
//!       "items": [ { "token": "ser", "displayText": "to be", "exampleText": "Yo soy alto" } ] }
//! ] }
//! ```
//!
//! The field names of the older browser dataset (`words`, `spanish`,
//! `translation`, `example`) are accepted as aliases.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::error::CatalogError;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// Separator between category id and token inside an [`ItemKey`].
pub const KEY_SEPARATOR: &str = "::";

/// Stable identity of an item: `categoryId::token`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(String);

impl ItemKey {
    pub fn new(category_id: &str, token: &str) -> Self {
        Self(format!("{category_id}{KEY_SEPARATOR}{token}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Category part of the key. Keys without a separator belong to no category.
    pub fn category_id(&self) -> Option<&str> {
        self.0.split_once(KEY_SEPARATOR).map(|(category, _)| category)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// A single vocabulary entry scoped to a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub category_id: String,
    pub token: String,
    pub display_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_text: Option<String>,
}

impl Item {
    pub fn key(&self) -> ItemKey {
        ItemKey::new(&self.category_id, &self.token)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub items: Vec<Item>,
}

impl Category {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
}

// On-disk shapes. Items do not repeat their category id, so the public
// types are built from these after validation.

#[derive(Deserialize)]
struct RawCatalog {
    categories: Vec<RawCategory>,
}

#[derive(Deserialize)]
struct RawCategory {
    id: String,
    name: String,
    #[serde(default, alias = "words")]
    items: Vec<RawItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    #[serde(alias = "spanish")]
    token: String,
    #[serde(alias = "translation")]
    display_text: String,
    #[serde(default, alias = "example")]
    example_text: Option<String>,
}

impl Catalog {
    /// The catalog bundled with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Parse and validate a catalog document.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed, a category id repeats, or a
    /// category id or token is blank. Empty categories are accepted here and
    /// refused only when a session is started on them.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog =
            serde_json::from_str(json).map_err(|e| CatalogError::ParseFailed(e.to_string()))?;

        let mut seen = HashSet::new();
        let mut categories = Vec::with_capacity(raw.categories.len());
        for (index, cat) in raw.categories.into_iter().enumerate() {
            if cat.id.trim().is_empty() {
                return Err(CatalogError::BlankIdentifier {
                    category: cat.name,
                    index,
                });
            }
            if !seen.insert(cat.id.clone()) {
                return Err(CatalogError::DuplicateCategory(cat.id));
            }

            let mut items = Vec::with_capacity(cat.items.len());
            for (index, item) in cat.items.into_iter().enumerate() {
                if item.token.trim().is_empty() {
                    return Err(CatalogError::BlankIdentifier {
                        category: cat.id,
                        index,
                    });
                }
                items.push(Item {
                    category_id: cat.id.clone(),
                    token: item.token,
                    display_text: item.display_text,
                    example_text: item.example_text.filter(|e| !e.is_empty()),
                });
            }

            categories.push(Category {
                id: cat.id,
                name: cat.name,
                items,
            });
        }

        Ok(Self { categories })
    }

    /// Load a catalog file from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or fails validation.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Load `path` if given, otherwise the bundled catalog.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }
}
