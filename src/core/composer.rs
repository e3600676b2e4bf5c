//! The pattern interpreter: walks a recipe's blocks in order and assembles
//! the generated text plus the alias table.

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::context::{ComponentToggles, Filters, GenerationContext};
use crate::core::parts::{Part, Parts};
use crate::core::resolve;
use crate::core::seed;
use crate::core::transform::apply_block_transform;
use crate::schema::catalog::{localized, Catalogs};
use crate::schema::filter::WhereClause;
use crate::schema::lang::LanguageRules;
use crate::schema::recipe::{Block, BlockExt, LiteralBlock, RefBlock};

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("catalog '{catalog}' is empty")]
    CatalogEmpty { catalog: String },
    #[error("no item in catalog '{catalog}' matches {filter} ({candidates} items checked)")]
    CatalogNoMatch {
        catalog: String,
        filter: WhereClause,
        candidates: usize,
    },
    #[error(
        "no item in catalog '{catalog}' matching {filter} differs from [{}] after {attempts} attempts",
        .excluded.join(", ")
    )]
    SelectionDistinctExhausted {
        catalog: String,
        filter: WhereClause,
        attempts: u32,
        /// Aliases whose selections had to be avoided.
        excluded: Vec<String>,
    },
    #[error("catalog '{key}' not found (available: {})", list(.available))]
    CatalogNotFound { key: String, available: Vec<String> },
    #[error("recipe '{id}' not found (available: {})", list(.available))]
    RecipeNotFound { id: String, available: Vec<String> },
    #[error("collection '{query}' not found (available: {})", list(.available))]
    CollectionNotFound { query: String, available: Vec<String> },
    #[error("collection '{collection}' lists no recipes (collections with recipes: {})", list(.available))]
    CollectionWithoutRecipes {
        collection: String,
        available: Vec<String>,
    },
    #[error("a generation context providing {capability} is required")]
    MissingContext { capability: &'static str },
    #[error("malformed block: {reason}")]
    MalformedBlock { reason: String },
    #[error("recipe '{recipe}' exceeds the maximum nesting depth of {depth}")]
    RecursionLimit { recipe: String, depth: usize },
    #[error("block {index}: {source}")]
    Block {
        index: usize,
        #[source]
        source: Box<ComposeError>,
    },
}

impl ComposeError {
    /// The error underneath any block-index wrapping.
    pub fn innermost(&self) -> &ComposeError {
        match self {
            Self::Block { source, .. } => source.innermost(),
            other => other,
        }
    }
}

fn list(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        values.join(", ")
    }
}

/// Everything one pattern execution reads. Built with chained setters:
///
/// ```ignore
/// let input = PatternInput::new(&catalogs, &rules, "de").seed(Some("abc"));
/// ```
#[derive(Clone, Copy)]
pub struct PatternInput<'a> {
    pub(crate) catalogs: &'a Catalogs,
    pub(crate) lang_rules: &'a LanguageRules,
    pub(crate) locale: &'a str,
    pub(crate) seed: Option<&'a str>,
    pub(crate) filters: Option<&'a Filters>,
    pub(crate) components: Option<&'a ComponentToggles>,
    pub(crate) context: Option<&'a dyn GenerationContext>,
    pub(crate) depth: usize,
}

impl<'a> PatternInput<'a> {
    pub fn new(catalogs: &'a Catalogs, lang_rules: &'a LanguageRules, locale: &'a str) -> Self {
        Self {
            catalogs,
            lang_rules,
            locale,
            seed: None,
            filters: None,
            components: None,
            context: None,
            depth: 0,
        }
    }

    pub fn seed(mut self, seed: Option<&'a str>) -> Self {
        self.seed = seed;
        self
    }

    pub fn filters(mut self, filters: &'a Filters) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn components(mut self, components: &'a ComponentToggles) -> Self {
        self.components = Some(components);
        self
    }

    pub fn context(mut self, context: &'a dyn GenerationContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }
}

/// Result of one pattern execution.
#[derive(Debug, Clone)]
pub struct Composition {
    pub text: String,
    pub parts: Parts,
}

/// What one block contributes: at most one token and any new bindings.
#[derive(Debug, Default)]
pub(crate) struct Step {
    pub(crate) token: Option<String>,
    pub(crate) bindings: Vec<(String, Part)>,
}

impl Step {
    pub(crate) fn emit(text: String) -> Self {
        Self {
            token: Some(text),
            bindings: Vec::new(),
        }
    }

    pub(crate) fn bind(mut self, alias: Option<&str>, part: Part) -> Self {
        if let Some(alias) = alias {
            self.bindings.push((alias.to_string(), part));
        }
        self
    }
}

/// Execute a pattern and return the joined text with its alias table.
///
/// Each block runs with the sub-seed `seed:b<index>`. A failing block aborts
/// the run with [`ComposeError::Block`] carrying its index, unless the block
/// is optional or its agreement fallback turns the failure into a skip.
pub fn execute_pattern(
    pattern: &[Block],
    input: &PatternInput<'_>,
) -> Result<Composition, ComposeError> {
    let mut parts = Parts::default();
    let mut tokens: Vec<String> = Vec::new();

    for (index, block) in pattern.iter().enumerate() {
        if block.ext().is_some_and(|ext| toggled_off(ext, input.components)) {
            debug!(block = index, "component disabled, block skipped");
            continue;
        }

        let block_seed = seed::for_block(input.seed, index);
        let step = run_block(block, input, &parts, block_seed.as_deref()).map_err(|source| {
            ComposeError::Block {
                index,
                source: Box::new(source),
            }
        })?;

        tokens.extend(step.token);
        for (alias, part) in step.bindings {
            parts.insert(alias, part);
        }
    }

    Ok(Composition {
        text: join_tokens(&tokens),
        parts,
    })
}

fn toggled_off(ext: &BlockExt, components: Option<&ComponentToggles>) -> bool {
    if !ext.optional {
        return false;
    }
    match (ext.component_key.as_deref(), components) {
        (Some(key), Some(components)) => components.get(key) == Some(&false),
        _ => false,
    }
}

fn run_block(
    block: &Block,
    input: &PatternInput<'_>,
    parts: &Parts,
    seed: Option<&str>,
) -> Result<Step, ComposeError> {
    match block {
        Block::Select(select) => {
            let part = resolve::resolve_select(select, input, parts, seed)?;
            Ok(selection_step(
                part,
                select.alias.as_deref(),
                select.transform.as_deref(),
                &select.ext,
                input,
                parts,
            ))
        }
        Block::Generate(generate) => {
            let part = resolve::resolve_generate(generate, input, parts, seed)?;
            Ok(selection_step(
                part,
                generate.alias.as_deref(),
                generate.transform.as_deref(),
                &generate.ext,
                input,
                parts,
            ))
        }
        Block::Literal(literal) => Ok(literal_step(literal, input, parts)),
        Block::Pp(pp) => resolve::resolve_pp(pp, input, parts, seed),
        Block::Ref(reference) => Ok(ref_step(reference, input, parts)),
    }
}

fn selection_step(
    part: Option<Part>,
    alias: Option<&str>,
    transform: Option<&str>,
    ext: &BlockExt,
    input: &PatternInput<'_>,
    parts: &Parts,
) -> Step {
    let Some(part) = part else {
        return Step::default();
    };
    let token = if ext.hidden {
        None
    } else {
        Some(part_text(&part, transform, input, parts))
    };
    Step {
        token,
        bindings: Vec::new(),
    }
    .bind(alias, part)
}

/// Locale text of a part with the block transform applied.
pub(crate) fn part_text(
    part: &Part,
    transform: Option<&str>,
    input: &PatternInput<'_>,
    parts: &Parts,
) -> String {
    let text = part.text(input.locale).unwrap_or_default();
    match transform {
        Some(name) => apply_block_transform(name, text, input.locale, input.lang_rules, parts),
        None => text.to_string(),
    }
}

fn literal_step(literal: &LiteralBlock, input: &PatternInput<'_>, parts: &Parts) -> Step {
    if let Some(alias) = &literal.ext.optional_with {
        if !parts.contains(alias) {
            debug!(alias = %alias, "literal skipped, alias not bound");
            return Step::default();
        }
    }
    if literal.ext.hidden {
        return Step::default();
    }
    match localized(&literal.text, input.locale) {
        Some(text) => Step::emit(text.to_string()),
        None => Step::default(),
    }
}

fn ref_step(reference: &RefBlock, input: &PatternInput<'_>, parts: &Parts) -> Step {
    match parts.text(&reference.alias, input.locale) {
        Some(text) => Step::emit(text.to_string()),
        None => {
            warn!(alias = %reference.alias, "reference to unbound alias, nothing emitted");
            Step::default()
        }
    }
}

/// Join tokens with single spaces, drop spaces before punctuation, trim.
fn join_tokens(tokens: &[String]) -> String {
    let joined = tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = String::with_capacity(joined.len());
    for c in joined.chars() {
        if matches!(c, ',' | '.' | ';' | ':' | '!' | '?') {
            while out.ends_with(char::is_whitespace) {
                out.pop();
            }
        }
        out.push(c);
    }
    out.trim().to_string()
}
