/// Generation context: what a pattern execution may ask of its host.
///
/// Recursive generation, cross-package catalogs and recipe collections all go
/// through this trait, so the composer never owns a registry itself.
use std::collections::HashMap;

use crate::core::composer::ComposeError;
use crate::schema::catalog::Catalog;
use crate::schema::collection::Collection;
use crate::schema::filter::WhereClause;
use crate::schema::recipe::Recipe;

/// Runtime filters keyed by catalog key, merged into every selection from
/// that catalog.
pub type Filters = HashMap<String, WhereClause>;

/// Component toggles keyed by `component_key`. Only an explicit `false`
/// disables an optional block.
pub type ComponentToggles = HashMap<String, bool>;

/// Parameters handed down to a nested recipe execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecipeParams<'a> {
    pub filters: Option<&'a Filters>,
    pub components: Option<&'a ComponentToggles>,
    /// Nesting depth of the recipe about to run; top-level runs are 0.
    pub depth: usize,
}

pub trait GenerationContext {
    fn recipe(&self, id: &str) -> Option<&Recipe>;

    /// Ids of every known recipe, for diagnostics.
    fn recipe_ids(&self) -> Vec<String>;

    /// Run a recipe and return its text. Implementations usually call back
    /// into [`execute_pattern`](crate::core::composer::execute_pattern).
    fn execute_recipe(
        &self,
        id: &str,
        locale: &str,
        seed: Option<&str>,
        params: &RecipeParams<'_>,
    ) -> Result<String, ComposeError>;

    /// Catalog `key` of another package, for `"package:key"` references.
    fn package_catalog(&self, package: &str, key: &str) -> Option<&Catalog>;

    fn package_catalog_keys(&self, _package: &str) -> Vec<String> {
        Vec::new()
    }

    fn collections(&self) -> &[Collection];
}
