//! Recipe Engine: seeded procedural text generation from declarative recipes.
//!
//! A recipe is an ordered pattern of blocks (catalog selections, nested
//! generations, literals, prepositional phrases and references). Executing a
//! pattern yields the composed text plus a table of named intermediate
//! selections, reproducible from a seed string.

pub mod core;
pub mod schema;

pub use crate::core::composer::{execute_pattern, ComposeError, Composition, PatternInput};
pub use crate::core::context::{ComponentToggles, Filters, GenerationContext, RecipeParams};
pub use crate::core::engine::{EngineError, GenerateRequest, RecipeEngine, RecipeEngineBuilder};
pub use crate::core::parts::{Part, Parts, SyntheticItem};
pub use crate::core::transform::apply_transforms;
