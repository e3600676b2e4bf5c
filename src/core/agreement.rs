//! Agreement: derive a filter for one block from an earlier selection.

use tracing::warn;

use crate::core::parts::Parts;
use crate::schema::agreement::{AgreementConfig, AgreementFeature};
use crate::schema::filter::WhereClause;

/// Build the filter that keeps a block consistent with `config.source`.
///
/// Agreement is advisory: a missing source alias yields an empty filter.
pub fn derive_filter(config: &AgreementConfig, parts: &Parts) -> WhereClause {
    let mut filter = WhereClause::default();
    let Some(source) = parts.get(&config.source) else {
        warn!(alias = %config.source, "agreement source not bound; no filter derived");
        return filter;
    };

    for feature in &config.features {
        match feature {
            AgreementFeature::Tags { required } => {
                filter.tags.extend(
                    required
                        .iter()
                        .filter(|tag| source.tags().contains(*tag))
                        .cloned(),
                );
            }
            AgreementFeature::Gram { path, map } => {
                let mapped = source
                    .gram_value(path)
                    .and_then(|value| value.as_key())
                    .and_then(|key| map.get(&key));
                if let Some(tag) = mapped {
                    filter.tags.push(tag.clone());
                }
            }
            AgreementFeature::Kinds { required } => {
                let kinds: Vec<String> = required
                    .iter()
                    .filter(|kind| source.kinds().contains(*kind))
                    .cloned()
                    .collect();
                if !kinds.is_empty() {
                    filter.kinds = kinds;
                }
            }
        }
    }
    filter
}
