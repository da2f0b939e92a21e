//! Level content: categories of collectible items
//!
//! Categories are static data supplied by the host (or the built-in table).
//! They are validated once, when a `Categories` is built, so the rest of the
//! simulation can rely on every category having at least one item.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One collectible: what it is and how it is drawn
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryItem {
    pub identity: String,
    pub glyph: String,
}

impl CategoryItem {
    pub fn new(identity: impl Into<String>, glyph: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            glyph: glyph.into(),
        }
    }

    /// Items need both an identity and something to draw
    pub fn is_well_formed(&self) -> bool {
        !self.identity.trim().is_empty() && !self.glyph.is_empty()
    }
}

/// A level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub items: Vec<CategoryItem>,
    /// Present items in list order (alphabet, counting) instead of shuffled
    #[serde(default)]
    pub requires_sequence: bool,
}

#[derive(Error, Debug)]
pub enum CategoryError {
    #[error("Failed to parse categories: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No categories defined")]
    NoCategories,

    #[error("Category {name:?} has no items")]
    EmptyCategory { name: String },

    #[error("Category {name:?} item {index} is missing an identity or glyph")]
    MalformedItem { name: String, index: usize },
}

/// Validated, non-empty list of levels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Categories {
    levels: Vec<Category>,
}

impl Categories {
    pub fn new(levels: Vec<Category>) -> Result<Self, CategoryError> {
        if levels.is_empty() {
            return Err(CategoryError::NoCategories);
        }
        for category in &levels {
            if category.items.is_empty() {
                return Err(CategoryError::EmptyCategory {
                    name: category.name.clone(),
                });
            }
            if let Some(index) = category.items.iter().position(|i| !i.is_well_formed()) {
                return Err(CategoryError::MalformedItem {
                    name: category.name.clone(),
                    index,
                });
            }
        }
        Ok(Self { levels })
    }

    /// Parse and validate a JSON array of categories
    pub fn from_json(json: &str) -> Result<Self, CategoryError> {
        let levels: Vec<Category> = serde_json::from_str(json)?;
        Self::new(levels)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Clamp a level index into range
    pub fn clamp_level(&self, level: usize) -> usize {
        level.min(self.levels.len().saturating_sub(1))
    }

    /// Level after `level`, wrapping to the first
    pub fn next_level(&self, level: usize) -> usize {
        (level + 1) % self.levels.len().max(1)
    }

    /// Category for a level, falling back to the first one
    pub fn get(&self, level: usize) -> &Category {
        match self.levels.get(level) {
            Some(category) => category,
            None => {
                log::warn!("Unknown level {}, using level 0", level);
                &self.levels[0]
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.levels.iter()
    }
}

impl Default for Categories {
    fn default() -> Self {
        Self {
            levels: default_categories(),
        }
    }
}

fn category(name: &str, requires_sequence: bool, items: &[(&str, &str)]) -> Category {
    Category {
        name: name.to_string(),
        items: items
            .iter()
            .map(|(identity, glyph)| CategoryItem::new(*identity, *glyph))
            .collect(),
        requires_sequence,
    }
}

/// Built-in level table
pub fn default_categories() -> Vec<Category> {
    let alphabet: Vec<(String, String)> = ('A'..='Z')
        .map(|c| (c.to_ascii_lowercase().to_string(), c.to_string()))
        .collect();
    let alphabet: Vec<(&str, &str)> = alphabet
        .iter()
        .map(|(i, g)| (i.as_str(), g.as_str()))
        .collect();

    vec![
        category(
            "Fruits & Vegetables",
            false,
            &[
                ("apple", "🍎"),
                ("banana", "🍌"),
                ("grapes", "🍇"),
                ("strawberry", "🍓"),
                ("carrot", "🥕"),
                ("cucumber", "🥒"),
                ("watermelon", "🍉"),
                ("broccoli", "🥦"),
                ("orange", "🍊"),
            ],
        ),
        category(
            "Counting Fun",
            true,
            &[
                ("1", "1"),
                ("2", "2"),
                ("3", "3"),
                ("4", "4"),
                ("5", "5"),
                ("6", "6"),
                ("7", "7"),
                ("8", "8"),
                ("9", "9"),
                ("10", "10"),
            ],
        ),
        category(
            "Shapes & Colors",
            false,
            &[
                ("red circle", "🔴"),
                ("blue square", "🟦"),
                ("star", "⭐"),
                ("green square", "🟩"),
                ("heart", "❤️"),
                ("diamond", "🔷"),
                ("yellow circle", "🟡"),
                ("triangle", "🔺"),
            ],
        ),
        category(
            "Animals & Nature",
            false,
            &[
                ("dog", "🐶"),
                ("cat", "🐱"),
                ("fox", "🦊"),
                ("turtle", "🐢"),
                ("butterfly", "🦋"),
                ("owl", "🦉"),
                ("tree", "🌳"),
                ("flower", "🌸"),
                ("elephant", "🐘"),
            ],
        ),
        category(
            "Things That Go",
            false,
            &[
                ("car", "🚗"),
                ("bus", "🚌"),
                ("train", "🚂"),
                ("airplane", "✈️"),
                ("rocket", "🚀"),
                ("bicycle", "🚲"),
                ("boat", "⛵"),
                ("fire truck", "🚒"),
            ],
        ),
        category("Alphabet Challenge", true, &alphabet),
    ]
}
