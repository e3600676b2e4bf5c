use serde::{Deserialize, Serialize};

/// A named group of recipes, optionally scoped to a package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub key: String,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub query: CollectionQuery,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionQuery {
    /// Tags narrowing catalog selection when the collection is used with a catalog.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Candidate recipe ids.
    #[serde(default)]
    pub recipes: Vec<String>,
}

impl Collection {
    /// Collections without a package are visible from every package.
    pub fn belongs_to(&self, package: &str) -> bool {
        self.package.as_deref().map_or(true, |p| p == package)
    }

    pub fn has_recipes(&self) -> bool {
        !self.query.recipes.is_empty()
    }
}
