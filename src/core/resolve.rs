//! Resolution of select, generate and prepositional-phrase blocks against
//! catalogs and the generation context.

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::core::agreement::derive_filter;
use crate::core::composer::{part_text, ComposeError, PatternInput, Step};
use crate::core::context::RecipeParams;
use crate::core::parts::{Part, Parts, SyntheticItem};
use crate::core::seed;
use crate::core::selector::{select, SelectError, SelectOptions};
use crate::schema::agreement::{AgreementConfig, AgreementFallback};
use crate::schema::catalog::{Catalog, GramValue, ItemIdentity};
use crate::schema::collection::Collection;
use crate::schema::filter::WhereClause;
use crate::schema::lang::normalize_gender;
use crate::schema::recipe::{
    BlockExt, GenerateBlock, GenerateFrom, PpBlock, PpTarget, SelectBlock, SelectSource,
};

/// Separates package and catalog in a cross-package key (`"fantasy:names"`).
const PACKAGE_SEPARATOR: char = ':';

/// One catalog selection request.
struct CatalogRequest<'b> {
    key: &'b str,
    filter: WhereClause,
    distinct_from: &'b [String],
    agreement: Option<&'b AgreementConfig>,
}

pub(crate) fn resolve_select(
    block: &SelectBlock,
    input: &PatternInput<'_>,
    parts: &Parts,
    seed: Option<&str>,
) -> Result<Option<Part>, ComposeError> {
    let resolved = match block.source {
        SelectSource::Catalog => select_from_catalog(
            &CatalogRequest {
                key: &block.key,
                filter: block.filter.clone(),
                distinct_from: &block.distinct_from,
                agreement: block.ext.agree_with.as_ref(),
            },
            input,
            parts,
            seed,
        ),
        SelectSource::Generator => run_recipe(&block.key, input, seed).map(Some),
    };
    skip_if_optional(resolved, &block.ext)
}

pub(crate) fn resolve_generate(
    block: &GenerateBlock,
    input: &PatternInput<'_>,
    parts: &Parts,
    seed: Option<&str>,
) -> Result<Option<Part>, ComposeError> {
    match &block.from {
        GenerateFrom::Recipe => {
            let key = required_key(block)?;
            skip_if_optional(run_recipe(key, input, seed).map(Some), &block.ext)
        }
        GenerateFrom::Catalog => {
            let key = required_key(block)?;
            let resolved = collection_filter(block, input).and_then(|filter| {
                select_from_catalog(
                    &CatalogRequest {
                        key,
                        filter,
                        distinct_from: &block.distinct_from,
                        agreement: block.ext.agree_with.as_ref(),
                    },
                    input,
                    parts,
                    seed,
                )
            });
            skip_if_optional(resolved, &block.ext)
        }
        // Package generation must always yield text, so failures stay fatal.
        GenerateFrom::Package(package) => {
            generate_from_package(package, block.collection.as_deref(), input, seed).map(Some)
        }
    }
}

/// Resolve a prepositional phrase: `<form> <referent>`, the form chosen by
/// the referent's grammatical gender.
pub(crate) fn resolve_pp(
    block: &PpBlock,
    input: &PatternInput<'_>,
    parts: &Parts,
    seed: Option<&str>,
) -> Result<Step, ComposeError> {
    match &block.target {
        PpTarget::Ref(alias) => match parts.get(alias) {
            Some(part) => {
                let text = part_text(part, None, input, parts);
                Ok(Step::emit(pp_phrase(&block.prep, part, &text, input)))
            }
            None => {
                warn!(alias = %alias, "prepositional phrase refers to unbound alias, nothing emitted");
                Ok(Step::default())
            }
        },
        PpTarget::Select(inline) => {
            let inline_seed = seed::derive(seed, "pp");
            let Some(part) = resolve_select(inline, input, parts, inline_seed.as_deref())? else {
                return Ok(Step::default());
            };
            let text = part_text(&part, inline.transform.as_deref(), input, parts);
            let phrase = pp_phrase(&block.prep, &part, &text, input);
            Ok(Step::emit(phrase).bind(inline.alias.as_deref(), part))
        }
    }
}

fn pp_phrase(prep: &str, referent: &Part, text: &str, input: &PatternInput<'_>) -> String {
    let gender = referent
        .gram_value("gender")
        .and_then(GramValue::as_key)
        .map(|g| normalize_gender(&g));
    let form = input
        .lang_rules
        .locale(input.locale)
        .and_then(|rules| rules.prepositions.get(prep))
        .and_then(|rule| rule.form(gender.as_deref()))
        .unwrap_or(prep);
    format!("{form} {text}")
}

fn required_key(block: &GenerateBlock) -> Result<&str, ComposeError> {
    block
        .key
        .as_deref()
        .ok_or_else(|| ComposeError::MalformedBlock {
            reason: format!("generate from {:?} needs a key", block.from),
        })
}

fn skip_if_optional(
    resolved: Result<Option<Part>, ComposeError>,
    ext: &BlockExt,
) -> Result<Option<Part>, ComposeError> {
    match resolved {
        Err(err) if ext.optional => {
            debug!(error = %err, "optional block failed, skipped");
            Ok(None)
        }
        other => other,
    }
}

/// Static filter merged with a named collection's tag query.
fn collection_filter(
    block: &GenerateBlock,
    input: &PatternInput<'_>,
) -> Result<WhereClause, ComposeError> {
    let Some(name) = block.collection.as_deref() else {
        return Ok(block.filter.clone());
    };
    let context = input.context.ok_or(ComposeError::MissingContext {
        capability: "collections",
    })?;
    let collections = context.collections();
    let collection = collections
        .iter()
        .find(|c| c.key == name)
        .ok_or_else(|| ComposeError::CollectionNotFound {
            query: name.to_string(),
            available: collection_keys(collections.iter()),
        })?;
    Ok(block
        .filter
        .merge(&WhereClause::with_tags(collection.query.tags.iter().cloned())))
}

fn select_from_catalog(
    request: &CatalogRequest<'_>,
    input: &PatternInput<'_>,
    parts: &Parts,
    seed: Option<&str>,
) -> Result<Option<Part>, ComposeError> {
    let catalog = lookup_catalog(request.key, input)?;
    let base = match input.filters.and_then(|filters| filters.get(request.key)) {
        Some(runtime) => request.filter.merge(runtime),
        None => request.filter.clone(),
    };
    let distinct = distinct_identities(request.distinct_from, parts);
    let pick = |filter: WhereClause| {
        let options = SelectOptions::default()
            .filter(filter)
            .distinct_from(distinct.clone())
            .seed(seed);
        select(&catalog.items, &options)
            .map(|item| Part::Catalog(item.clone()))
            .map_err(|err| selection_error(err, request, &options.filter))
    };

    let Some(agreement) = request.agreement else {
        return pick(base).map(Some);
    };
    match pick(base.merge(&derive_filter(agreement, parts))) {
        Ok(part) => Ok(Some(part)),
        Err(err) => match &agreement.fallback {
            None | Some(AgreementFallback::Error) => Err(err),
            Some(AgreementFallback::Skip) => {
                debug!(catalog = request.key, error = %err, "agreement failed, block skipped");
                Ok(None)
            }
            Some(AgreementFallback::Filter(fallback)) => {
                debug!(catalog = request.key, fallback = %fallback, "agreement failed, retrying with fallback filter");
                pick(base.merge(fallback)).map(Some)
            }
        },
    }
}

fn selection_error(err: SelectError, request: &CatalogRequest<'_>, filter: &WhereClause) -> ComposeError {
    let catalog = request.key.to_string();
    match err {
        SelectError::Empty => ComposeError::CatalogEmpty { catalog },
        SelectError::NoMatch { candidates, .. } => ComposeError::CatalogNoMatch {
            catalog,
            filter: filter.clone(),
            candidates,
        },
        SelectError::DistinctExhausted { attempts, .. } => ComposeError::SelectionDistinctExhausted {
            catalog,
            filter: filter.clone(),
            attempts,
            excluded: request.distinct_from.to_vec(),
        },
    }
}

/// Identities bound to the given aliases. Unbound aliases are ignored.
fn distinct_identities(aliases: &[String], parts: &Parts) -> FxHashSet<ItemIdentity> {
    aliases
        .iter()
        .filter_map(|alias| match parts.get(alias) {
            Some(part) => Some(part.identity()),
            None => {
                debug!(alias = %alias, "distinct_from alias not bound, ignored");
                None
            }
        })
        .collect()
}

fn lookup_catalog<'a>(key: &str, input: &PatternInput<'a>) -> Result<&'a Catalog, ComposeError> {
    if let Some((package, catalog_key)) = key.split_once(PACKAGE_SEPARATOR) {
        let context = input.context.ok_or(ComposeError::MissingContext {
            capability: "package_catalog",
        })?;
        return context
            .package_catalog(package, catalog_key)
            .ok_or_else(|| ComposeError::CatalogNotFound {
                key: key.to_string(),
                available: context
                    .package_catalog_keys(package)
                    .into_iter()
                    .map(|k| format!("{package}{PACKAGE_SEPARATOR}{k}"))
                    .collect(),
            });
    }
    input
        .catalogs
        .get(key)
        .ok_or_else(|| ComposeError::CatalogNotFound {
            key: key.to_string(),
            available: sorted(input.catalogs.keys().cloned().collect()),
        })
}

/// Run a recipe through the context and wrap its text as a part.
fn run_recipe(id: &str, input: &PatternInput<'_>, seed: Option<&str>) -> Result<Part, ComposeError> {
    let context = input.context.ok_or(ComposeError::MissingContext {
        capability: "execute_recipe",
    })?;
    if context.recipe(id).is_none() {
        return Err(ComposeError::RecipeNotFound {
            id: id.to_string(),
            available: sorted(context.recipe_ids()),
        });
    }
    let params = RecipeParams {
        filters: input.filters,
        components: input.components,
        depth: input.depth + 1,
    };
    let text = context.execute_recipe(id, input.locale, seed, &params)?;
    Ok(Part::Synthetic(SyntheticItem::new(text, input.locale, id)))
}

/// Pick a recipe from one of the package's collections and run it.
///
/// Without a collection name the first collection that lists recipes is used.
fn generate_from_package(
    package: &str,
    collection: Option<&str>,
    input: &PatternInput<'_>,
    seed: Option<&str>,
) -> Result<Part, ComposeError> {
    let context = input.context.ok_or(ComposeError::MissingContext {
        capability: "collections",
    })?;
    let candidates: Vec<&Collection> = context
        .collections()
        .iter()
        .filter(|c| c.belongs_to(package))
        .collect();

    let chosen = match collection {
        Some(name) => {
            let query = format!("{package}/{name}");
            let found = candidates
                .iter()
                .copied()
                .find(|c| c.key == name)
                .ok_or_else(|| ComposeError::CollectionNotFound {
                    query: query.clone(),
                    available: collection_keys(candidates.iter().copied()),
                })?;
            if !found.has_recipes() {
                return Err(ComposeError::CollectionWithoutRecipes {
                    collection: query,
                    available: collection_keys(candidates.iter().copied().filter(|c| c.has_recipes())),
                });
            }
            found
        }
        None => candidates
            .iter()
            .copied()
            .find(|c| c.has_recipes())
            .ok_or_else(|| ComposeError::CollectionNotFound {
                query: format!("{package}/*"),
                available: collection_keys(candidates.iter().copied()),
            })?,
    };

    let recipes = &chosen.query.recipes;
    let recipe_id = &recipes[seed::index(seed, recipes.len())];
    debug!(package, collection = %chosen.key, recipe = %recipe_id, "recipe chosen from collection");
    run_recipe(recipe_id, input, seed)
}

fn collection_keys<'c>(collections: impl Iterator<Item = &'c Collection>) -> Vec<String> {
    collections.map(|c| c.key.clone()).collect()
}

fn sorted(mut values: Vec<String>) -> Vec<String> {
    values.sort();
    values
}
