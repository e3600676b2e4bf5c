use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::filter::WhereClause;

/// Keeps one block consistent with an earlier block's selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementConfig {
    /// Alias of the earlier selection to agree with.
    #[serde(rename = "ref")]
    pub source: String,
    pub features: Vec<AgreementFeature>,
    #[serde(default)]
    pub fallback: Option<AgreementFallback>,
}

/// One attribute carried from the source selection into the filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgreementFeature {
    /// Source tags that appear in `required` become ALL-of tags.
    Tags { required: Vec<String> },
    /// The grammatical value at `path` is mapped to a tag through `map`.
    Gram {
        path: String,
        map: BTreeMap<String, String>,
    },
    /// Source kinds that appear in `required` become the kinds constraint.
    Kinds { required: Vec<String> },
}

/// What to do when selection fails under an agreement filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgreementFallback {
    Skip,
    Error,
    /// Retry without the agreement filter, with this filter merged in.
    Filter(WhereClause),
}
