/// The recipe engine: a registry of catalogs, recipes and collections that
/// runs recipes by id.
///
/// Built via `RecipeEngine::builder()`. Loading happens in `build()`; after
/// that the engine is read-only and may be shared across threads.
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::composer::{execute_pattern, ComposeError, Composition, PatternInput};
use crate::core::context::{ComponentToggles, Filters, GenerationContext, RecipeParams};
use crate::core::seed;
use crate::schema::catalog::{Catalog, Catalogs};
use crate::schema::collection::Collection;
use crate::schema::filter::WhereClause;
use crate::schema::lang::LanguageRules;
use crate::schema::recipe::Recipe;
use crate::schema::{load_ron, LoadError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("compose error: {0}")]
    Compose(#[from] ComposeError),
    #[error("load error: {0}")]
    Load(#[from] LoadError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options for one top-level generation.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub locale: String,
    pub seed: Option<String>,
    pub filters: Filters,
    pub components: ComponentToggles,
}

impl GenerateRequest {
    pub fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            ..Self::default()
        }
    }

    pub fn seed(mut self, seed: &str) -> Self {
        self.seed = Some(seed.to_string());
        self
    }

    /// Narrow every selection from `catalog`.
    pub fn filter(mut self, catalog: &str, filter: WhereClause) -> Self {
        self.filters.insert(catalog.to_string(), filter);
        self
    }

    pub fn component(mut self, key: &str, enabled: bool) -> Self {
        self.components.insert(key.to_string(), enabled);
        self
    }
}

pub struct RecipeEngine {
    catalogs: Catalogs,
    packages: HashMap<String, Catalogs>,
    recipes: BTreeMap<String, Recipe>,
    collections: Vec<Collection>,
    lang_rules: LanguageRules,
    max_depth: Option<usize>,
}

/// Builder for constructing a `RecipeEngine`.
pub struct RecipeEngineBuilder {
    catalogs_dir: Option<PathBuf>,
    package_dirs: Vec<(String, PathBuf)>,
    recipes_path: Option<PathBuf>,
    collections_path: Option<PathBuf>,
    language_rules_path: Option<PathBuf>,
    max_depth: Option<usize>,
    /// Directly provided data (for testing without files).
    catalogs: Catalogs,
    packages: HashMap<String, Catalogs>,
    recipes: Vec<Recipe>,
    collections: Vec<Collection>,
    lang_rules: LanguageRules,
}

impl RecipeEngine {
    pub fn builder() -> RecipeEngineBuilder {
        RecipeEngineBuilder {
            catalogs_dir: None,
            package_dirs: Vec::new(),
            recipes_path: None,
            collections_path: None,
            language_rules_path: None,
            max_depth: None,
            catalogs: Catalogs::new(),
            packages: HashMap::new(),
            recipes: Vec::new(),
            collections: Vec::new(),
            lang_rules: LanguageRules::default(),
        }
    }

    /// Run a recipe. Unseeded runs draw from the thread RNG.
    pub fn generate(
        &self,
        recipe_id: &str,
        locale: &str,
        seed: Option<&str>,
    ) -> Result<Composition, EngineError> {
        let mut request = GenerateRequest::new(locale);
        request.seed = seed.map(str::to_string);
        self.generate_with(recipe_id, &request)
    }

    /// Run a recipe with runtime filters and component toggles.
    pub fn generate_with(
        &self,
        recipe_id: &str,
        request: &GenerateRequest,
    ) -> Result<Composition, EngineError> {
        let recipe = self.lookup_recipe(recipe_id)?;
        let input = PatternInput::new(&self.catalogs, &self.lang_rules, &request.locale)
            .seed(request.seed.as_deref())
            .filters(&request.filters)
            .components(&request.components)
            .context(self);
        Ok(execute_pattern(&recipe.pattern, &input)?)
    }

    /// Generate `count` variants, seeded `seed:v0`, `seed:v1`, ...
    pub fn generate_variants(
        &self,
        recipe_id: &str,
        locale: &str,
        seed: Option<&str>,
        count: usize,
    ) -> Result<Vec<Composition>, EngineError> {
        (0..count)
            .map(|i| {
                let variant_seed = seed::derive(seed, &format!("v{i}"));
                self.generate(recipe_id, locale, variant_seed.as_deref())
            })
            .collect()
    }

    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    pub fn language_rules(&self) -> &LanguageRules {
        &self.lang_rules
    }

    fn lookup_recipe(&self, id: &str) -> Result<&Recipe, ComposeError> {
        self.recipes
            .get(id)
            .ok_or_else(|| ComposeError::RecipeNotFound {
                id: id.to_string(),
                available: self.recipe_ids(),
            })
    }
}

impl GenerationContext for RecipeEngine {
    fn recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    fn recipe_ids(&self) -> Vec<String> {
        self.recipes.keys().cloned().collect()
    }

    fn execute_recipe(
        &self,
        id: &str,
        locale: &str,
        seed: Option<&str>,
        params: &RecipeParams<'_>,
    ) -> Result<String, ComposeError> {
        if let Some(max) = self.max_depth {
            if params.depth > max {
                return Err(ComposeError::RecursionLimit {
                    recipe: id.to_string(),
                    depth: max,
                });
            }
        }
        let recipe = self.lookup_recipe(id)?;
        let mut input = PatternInput::new(&self.catalogs, &self.lang_rules, locale)
            .seed(seed)
            .depth(params.depth)
            .context(self);
        if let Some(filters) = params.filters {
            input = input.filters(filters);
        }
        if let Some(components) = params.components {
            input = input.components(components);
        }
        debug!(recipe = id, depth = params.depth, "running nested recipe");
        execute_pattern(&recipe.pattern, &input).map(|composition| composition.text)
    }

    fn package_catalog(&self, package: &str, key: &str) -> Option<&Catalog> {
        self.packages.get(package)?.get(key)
    }

    fn package_catalog_keys(&self, package: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .packages
            .get(package)
            .map(|catalogs| catalogs.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn collections(&self) -> &[Collection] {
        &self.collections
    }
}

impl RecipeEngineBuilder {
    /// Directory of `.ron` catalogs; each file stem becomes a catalog key.
    pub fn catalogs_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.catalogs_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Directory of `.ron` catalogs for package `name`, addressed as `name:key`.
    pub fn package_dir(mut self, name: &str, path: impl AsRef<Path>) -> Self {
        self.package_dirs
            .push((name.to_string(), path.as_ref().to_path_buf()));
        self
    }

    /// RON file holding a list of recipes.
    pub fn recipes_path(mut self, path: impl AsRef<Path>) -> Self {
        self.recipes_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// RON file holding a list of collections.
    pub fn collections_path(mut self, path: impl AsRef<Path>) -> Self {
        self.collections_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn language_rules_path(mut self, path: impl AsRef<Path>) -> Self {
        self.language_rules_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Reject nested recipes deeper than `depth`. Unlimited by default.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Provide a catalog directly (for testing without files).
    pub fn with_catalog(mut self, key: &str, catalog: Catalog) -> Self {
        self.catalogs.insert(key.to_string(), catalog);
        self
    }

    /// Provide catalogs directly (for testing without files).
    pub fn with_catalogs(mut self, catalogs: Catalogs) -> Self {
        self.catalogs.extend(catalogs);
        self
    }

    /// Provide a package's catalogs directly (for testing without files).
    pub fn with_package(mut self, name: &str, catalogs: Catalogs) -> Self {
        self.packages
            .entry(name.to_string())
            .or_default()
            .extend(catalogs);
        self
    }

    /// Provide recipes directly (for testing without files).
    pub fn with_recipes(mut self, recipes: Vec<Recipe>) -> Self {
        self.recipes.extend(recipes);
        self
    }

    /// Provide collections directly (for testing without files).
    pub fn with_collections(mut self, collections: Vec<Collection>) -> Self {
        self.collections.extend(collections);
        self
    }

    /// Provide language rules directly (for testing without files).
    pub fn with_language_rules(mut self, rules: LanguageRules) -> Self {
        self.lang_rules.merge(rules);
        self
    }

    /// Load every configured file. Loaded data overrides directly provided
    /// data with the same key.
    pub fn build(self) -> Result<RecipeEngine, EngineError> {
        let mut catalogs = self.catalogs;
        let mut packages = self.packages;
        let mut recipe_list = self.recipes;
        let mut collections = self.collections;
        let mut lang_rules = self.lang_rules;

        if let Some(dir) = existing(self.catalogs_dir.as_deref()) {
            load_catalog_dir(dir, &mut catalogs)?;
        }

        for (name, dir) in &self.package_dirs {
            if let Some(dir) = existing(Some(dir.as_path())) {
                load_catalog_dir(dir, packages.entry(name.clone()).or_default())?;
            }
        }

        if let Some(path) = existing(self.recipes_path.as_deref()) {
            let loaded: Vec<Recipe> = load_ron(path)?;
            recipe_list.extend(loaded);
        }

        if let Some(path) = existing(self.collections_path.as_deref()) {
            let loaded: Vec<Collection> = load_ron(path)?;
            collections.extend(loaded);
        }

        if let Some(path) = existing(self.language_rules_path.as_deref()) {
            let loaded: LanguageRules = load_ron(path)?;
            lang_rules.merge(loaded);
        }

        let mut recipes = BTreeMap::new();
        for recipe in recipe_list {
            if recipes.contains_key(&recipe.id) {
                debug!(recipe = %recipe.id, "recipe redefined, later definition wins");
            }
            recipes.insert(recipe.id.clone(), recipe);
        }

        Ok(RecipeEngine {
            catalogs,
            packages,
            recipes,
            collections,
            lang_rules,
            max_depth: self.max_depth,
        })
    }
}

/// The configured path, if it exists. Missing paths are skipped with a warning.
fn existing(path: Option<&Path>) -> Option<&Path> {
    let path = path?;
    if path.exists() {
        Some(path)
    } else {
        warn!(path = %path.display(), "configured path does not exist, skipped");
        None
    }
}

fn load_catalog_dir(dir: &Path, catalogs: &mut Catalogs) -> Result<(), EngineError> {
    load_ron_files_from_dir(dir, |path| {
        let catalog = Catalog::load_from_ron(path)?;
        let key = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        catalogs.insert(key, catalog);
        Ok(())
    })
}

/// Load all .ron files from a directory in name order, calling `loader` for each.
fn load_ron_files_from_dir<F>(dir: &Path, mut loader: F) -> Result<(), EngineError>
where
    F: FnMut(&Path) -> Result<(), EngineError>,
{
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) == Some("ron") {
            paths.push(path);
        }
    }
    paths.sort();
    for path in &paths {
        loader(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::CatalogItem;
    use crate::schema::from_ron_str;

    fn recipes() -> Vec<Recipe> {
        from_ron_str(
            r#"[
                (id: "greeting", pattern: [
                    Literal(text: {"en": "Hello", "de": "Hallo"}),
                    Generate(from: Recipe, key: "name", as: "Name"),
                ]),
                (id: "name", pattern: [Select(key: "names")]),
                (id: "loop", pattern: [Generate(from: Recipe, key: "loop")]),
            ]"#,
        )
        .unwrap()
    }

    fn build_test_engine() -> RecipeEngine {
        RecipeEngine::builder()
            .with_catalog(
                "names",
                Catalog::new(vec![
                    CatalogItem::new("en", "Ada"),
                    CatalogItem::new("en", "Grace"),
                    CatalogItem::new("en", "Edsger"),
                ]),
            )
            .with_recipes(recipes())
            .max_depth(8)
            .build()
            .unwrap()
    }

    #[test]
    fn nested_recipe_output() {
        let engine = build_test_engine();
        let result = engine.generate("greeting", "de", Some("n")).unwrap();
        let name = result.parts.text("Name", "de").unwrap();
        assert_eq!(result.text, format!("Hallo {name}"));
    }

    #[test]
    fn unknown_recipe_lists_known_ids() {
        let engine = build_test_engine();
        let err = engine.generate("farewell", "en", None).unwrap_err();
        assert!(matches!(err, EngineError::Compose(ComposeError::RecipeNotFound { .. })));
        assert!(err.to_string().contains("greeting, loop, name"));
    }

    #[test]
    fn depth_limit_stops_cycles() {
        let engine = build_test_engine();
        let err = engine.generate("loop", "en", Some("l")).unwrap_err();
        let EngineError::Compose(compose) = err else {
            panic!("expected compose error");
        };
        assert!(matches!(
            compose.innermost(),
            ComposeError::RecursionLimit { recipe, depth: 8 } if recipe == "loop"
        ));
    }

    #[test]
    fn variants_are_reproducible() {
        let engine = build_test_engine();
        let first: Vec<String> = engine
            .generate_variants("name", "en", Some("v"), 5)
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        let second: Vec<String> = engine
            .generate_variants("name", "en", Some("v"), 5)
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
    }

    #[test]
    fn missing_paths_are_skipped() {
        let engine = RecipeEngine::builder()
            .catalogs_dir("does/not/exist")
            .recipes_path("does/not/exist.ron")
            .build()
            .unwrap();
        assert!(engine.catalogs().is_empty());
        assert!(engine.recipe_ids().is_empty());
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RecipeEngine>();
    }
}
