// src/catalog.rs
//! Tutorial catalog: categories of drawing items, each with an ordered list of
//! illustrated steps. Loaded once at startup and shared read-only.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

const BUILTIN_LIBRARY: &str = include_str!("../data/default_library.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed drawing library: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid drawing library: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub instruction: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorialItem {
    pub id: String,
    pub name: String,
    pub keywords: Vec<String>,
    pub final_image_url: String,
    pub steps: Vec<Step>,
}

impl TutorialItem {
    /// True when one of the keywords occurs inside the already-normalized input.
    fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|keyword| normalized.contains(keyword.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorialCategory {
    pub id: String,
    pub name: String,
    pub items: Vec<TutorialItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultTutorial {
    pub id: String,
    pub name: String,
    pub final_image_url: String,
    pub steps: Vec<Step>,
}

/// Result of a keyword lookup. `item` is `None` when the default tutorial was used.
#[derive(Debug, Clone)]
pub struct TutorialMatch<'a> {
    pub item: Option<&'a TutorialItem>,
    pub steps: &'a [Step],
    pub final_image_url: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: String,
    pub name: String,
    pub item_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: String,
    pub name: String,
    pub final_image_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorialDetail {
    pub name: String,
    pub steps: Vec<Step>,
    pub final_image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawingLibrary {
    pub categories: Vec<TutorialCategory>,
    pub default: DefaultTutorial,
}

impl DrawingLibrary {
    /// The library shipped with the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_LIBRARY)
    }

    /// Keywords are lowercased here because lookups only normalize the prompt.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let mut library: DrawingLibrary = serde_json::from_str(raw)?;
        for item in library.categories.iter_mut().flat_map(|c| c.items.iter_mut()) {
            for keyword in &mut item.keywords {
                *keyword = keyword.to_lowercase();
            }
        }
        library.validate()?;
        Ok(library)
    }

    /// Load the library from `path`. A missing file is seeded with the built-in
    /// library so operators have something to edit.
    pub async fn load_or_init(path: &Path) -> Result<Self, CatalogError> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => {
                let library = Self::from_json(&raw)?;
                tracing::info!(
                    path = %path.display(),
                    categories = library.categories.len(),
                    "Drawing library loaded"
                );
                Ok(library)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %path.display(),
                    "Drawing library file not found, writing the built-in library"
                );
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(path, BUILTIN_LIBRARY).await?;
                Self::builtin()
            }
            Err(e) => Err(e.into()),
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut category_ids = HashSet::new();
        for category in &self.categories {
            if !category_ids.insert(category.id.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate category id '{}'",
                    category.id
                )));
            }

            let mut item_ids = HashSet::new();
            for item in &category.items {
                if !item_ids.insert(item.id.as_str()) {
                    return Err(CatalogError::Invalid(format!(
                        "duplicate item id '{}' in category '{}'",
                        item.id, category.id
                    )));
                }
                // An empty keyword is a substring of every prompt.
                if item.keywords.iter().any(|k| k.is_empty()) {
                    return Err(CatalogError::Invalid(format!(
                        "item '{}' has an empty keyword",
                        item.id
                    )));
                }
                if item.steps.is_empty() {
                    return Err(CatalogError::Invalid(format!(
                        "item '{}' has no steps",
                        item.id
                    )));
                }
            }
        }

        if self.default.steps.is_empty() {
            return Err(CatalogError::Invalid("default tutorial has no steps".to_string()));
        }
        Ok(())
    }

    /// First-match-wins keyword lookup. Categories and items are scanned in
    /// catalog order; nothing is ranked.
    pub fn find_tutorial(&self, input: &str) -> TutorialMatch<'_> {
        let normalized = input.trim().to_lowercase();

        let hit = self
            .categories
            .iter()
            .flat_map(|category| category.items.iter())
            .find(|item| item.matches(&normalized));

        match hit {
            Some(item) => TutorialMatch {
                item: Some(item),
                steps: &item.steps,
                final_image_url: &item.final_image_url,
            },
            None => TutorialMatch {
                item: None,
                steps: &self.default.steps,
                final_image_url: &self.default.final_image_url,
            },
        }
    }

    pub fn categories(&self) -> Vec<CategorySummary> {
        self.categories
            .iter()
            .map(|category| CategorySummary {
                id: category.id.clone(),
                name: category.name.clone(),
                item_count: category.items.len(),
            })
            .collect()
    }

    /// Items of a category, or an empty list for an unknown id.
    pub fn items_in_category(&self, category_id: &str) -> Vec<ItemSummary> {
        self.category(category_id)
            .map(|category| {
                category
                    .items
                    .iter()
                    .map(|item| ItemSummary {
                        id: item.id.clone(),
                        name: item.name.clone(),
                        final_image_url: item.final_image_url.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn tutorial(&self, category_id: &str, item_id: &str) -> Option<TutorialDetail> {
        let item = self
            .category(category_id)?
            .items
            .iter()
            .find(|item| item.id == item_id)?;

        Some(TutorialDetail {
            name: item.name.clone(),
            steps: item.steps.clone(),
            final_image_url: item.final_image_url.clone(),
        })
    }

    fn category(&self, category_id: &str) -> Option<&TutorialCategory> {
        self.categories.iter().find(|category| category.id == category_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> DrawingLibrary {
        DrawingLibrary::builtin().expect("built-in library is valid")
    }

    #[test]
    fn test_kitty_prompt_returns_cat_tutorial() {
        let library = library();
        let found = library.find_tutorial("I want to draw my kitty");

        assert_eq!(found.item.map(|i| i.id.as_str()), Some("cat"));
        assert_eq!(found.steps.len(), 5);
        assert_eq!(found.final_image_url, "/assets/cat/final.jpg");
    }

    #[test]
    fn test_unmatched_prompt_returns_default() {
        let library = library();
        let found = library.find_tutorial("a spaceship");

        assert!(found.item.is_none());
        assert_eq!(found.steps.len(), 4);
        assert_eq!(found.final_image_url, "/assets/default/final.jpg");
    }

    #[test]
    fn test_every_keyword_matches_its_own_item() {
        let library = library();
        for category in &library.categories {
            for item in &category.items {
                for keyword in &item.keywords {
                    let prompt = format!("  Please show me a {} today ", keyword.to_uppercase());
                    let found = library.find_tutorial(&prompt);
                    assert_eq!(
                        found.item.map(|i| i.id.as_str()),
                        Some(item.id.as_str()),
                        "keyword '{}' should select '{}'",
                        keyword,
                        item.id
                    );
                    assert_eq!(found.steps, item.steps.as_slice());
                }
            }
        }
    }

    #[test]
    fn test_first_match_wins_in_catalog_order() {
        // "cat" comes before "house" in the catalog.
        let library = library();
        let found = library.find_tutorial("a house for my cat");
        assert_eq!(found.item.map(|i| i.id.as_str()), Some("cat"));

        // Substring, not word, matching: "category" contains "cat".
        let found = library.find_tutorial("category");
        assert_eq!(found.item.map(|i| i.id.as_str()), Some("cat"));
    }

    #[test]
    fn test_category_queries() {
        let library = library();

        let categories = library.categories();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].id, "animals");
        assert_eq!(categories[0].item_count, 2);
        assert_eq!(categories[1].item_count, 1);

        let items = library.items_in_category("animals");
        assert_eq!(items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), ["cat", "dog"]);
        assert!(library.items_in_category("vehicles").is_empty());

        let tutorial = library.tutorial("objects", "house").unwrap();
        assert_eq!(tutorial.name, "House");
        assert_eq!(tutorial.steps.len(), 5);
        assert!(library.tutorial("objects", "cat").is_none());
        assert!(library.tutorial("nope", "cat").is_none());
    }

    #[test]
    fn test_rejects_empty_keyword() {
        let raw = r#"{
            "categories": [{"id": "a", "name": "A", "items": [
                {"id": "x", "name": "X", "keywords": [""], "finalImageUrl": "/f",
                 "steps": [{"instruction": "i", "imageUrl": "/s"}]}
            ]}],
            "default": {"id": "default", "name": "D", "finalImageUrl": "/d",
                        "steps": [{"instruction": "i", "imageUrl": "/s"}]}
        }"#;
        assert!(matches!(DrawingLibrary::from_json(raw), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn test_mixed_case_keywords_still_match() {
        let raw = r#"{
            "categories": [{"id": "a", "name": "A", "items": [
                {"id": "x", "name": "X", "keywords": ["Cat", "SEA Horse"], "finalImageUrl": "/f",
                 "steps": [{"instruction": "i", "imageUrl": "/s"}]}
            ]}],
            "default": {"id": "default", "name": "D", "finalImageUrl": "/d",
                        "steps": [{"instruction": "i", "imageUrl": "/s"}]}
        }"#;
        let library = DrawingLibrary::from_json(raw).unwrap();
        assert_eq!(library.categories[0].items[0].keywords, ["cat", "sea horse"]);

        let found = library.find_tutorial("my cat");
        assert_eq!(found.item.map(|i| i.id.as_str()), Some("x"));
        let found = library.find_tutorial("a Sea Horse please");
        assert_eq!(found.item.map(|i| i.id.as_str()), Some("x"));
    }

    #[test]
    fn test_rejects_duplicate_category() {
        let raw = r#"{
            "categories": [
                {"id": "a", "name": "A", "items": []},
                {"id": "a", "name": "A again", "items": []}
            ],
            "default": {"id": "default", "name": "D", "finalImageUrl": "/d",
                        "steps": [{"instruction": "i", "imageUrl": "/s"}]}
        }"#;
        assert!(matches!(DrawingLibrary::from_json(raw), Err(CatalogError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_load_or_init_seeds_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("drawingLibrary.json");

        let library = DrawingLibrary::load_or_init(&path).await.unwrap();
        assert_eq!(library.categories.len(), 2);
        assert!(path.exists());

        // Second load reads the file that was just written.
        let reloaded = DrawingLibrary::load_or_init(&path).await.unwrap();
        assert_eq!(reloaded.default.steps.len(), 4);
    }

    #[tokio::test]
    async fn test_load_or_init_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drawingLibrary.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let result = DrawingLibrary::load_or_init(&path).await;
        assert!(matches!(result, Err(CatalogError::Json(_))));
    }
}
