use serde::{Deserialize, Serialize};

use super::agreement::AgreementConfig;
use super::catalog::LocalizedText;
use super::filter::WhereClause;

/// A named, ordered pattern of blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub pattern: Vec<Block>,
}

/// One instruction in a recipe pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Block {
    Select(SelectBlock),
    Generate(GenerateBlock),
    Literal(LiteralBlock),
    Pp(PpBlock),
    Ref(RefBlock),
}

impl Block {
    pub fn ext(&self) -> Option<&BlockExt> {
        match self {
            Self::Select(b) => Some(&b.ext),
            Self::Generate(b) => Some(&b.ext),
            Self::Literal(b) => Some(&b.ext),
            Self::Pp(_) | Self::Ref(_) => None,
        }
    }
}

/// Optional behaviour shared by selecting blocks and literals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockExt {
    #[serde(default)]
    pub optional: bool,
    /// Resolve and bind the alias, but emit no text.
    #[serde(default)]
    pub hidden: bool,
    /// Toggle key consulted when `optional` is set.
    #[serde(default)]
    pub component_key: Option<String>,
    /// Literal is only emitted when this alias is bound.
    #[serde(default)]
    pub optional_with: Option<String>,
    #[serde(default)]
    pub agree_with: Option<AgreementConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectSource {
    #[default]
    Catalog,
    /// `key` names a recipe to run.
    Generator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectBlock {
    #[serde(default)]
    pub source: SelectSource,
    pub key: String,
    #[serde(default, rename = "where")]
    pub filter: WhereClause,
    #[serde(default)]
    pub distinct_from: Vec<String>,
    #[serde(default, rename = "as")]
    pub alias: Option<String>,
    #[serde(default)]
    pub transform: Option<String>,
    #[serde(default)]
    pub ext: BlockExt,
}

impl SelectBlock {
    pub fn catalog(key: &str) -> Self {
        Self {
            source: SelectSource::Catalog,
            key: key.to_string(),
            filter: WhereClause::default(),
            distinct_from: Vec::new(),
            alias: None,
            transform: None,
            ext: BlockExt::default(),
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }
}

/// Where a generate block gets its text from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerateFrom {
    Recipe,
    Catalog,
    /// Shorthand: run a recipe chosen from one of the package's collections.
    Package(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateBlock {
    pub from: GenerateFrom,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default, rename = "where")]
    pub filter: WhereClause,
    #[serde(default)]
    pub distinct_from: Vec<String>,
    #[serde(default, rename = "as")]
    pub alias: Option<String>,
    #[serde(default)]
    pub transform: Option<String>,
    #[serde(default)]
    pub ext: BlockExt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiteralBlock {
    pub text: LocalizedText,
    #[serde(default)]
    pub ext: BlockExt,
}

/// Preposition + referent phrase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpBlock {
    pub prep: String,
    #[serde(rename = "ref")]
    pub target: PpTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PpTarget {
    Ref(String),
    Select(Box<SelectBlock>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefBlock {
    pub alias: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::agreement::{AgreementFallback, AgreementFeature};
    use crate::schema::from_ron_str;

    #[test]
    fn parse_full_recipe() {
        let recipe: Recipe = from_ron_str(
            r#"(
                id: "noble",
                pattern: [
                    Select(key: "persons", as: "Person", ext: (hidden: true)),
                    Select(
                        key: "titles",
                        as: "Title",
                        transform: "genderAdapt",
                        ext: (agree_with: (
                            ref: "Person",
                            features: [Gram(path: "gender", map: {"f": "fem", "m": "masc"})],
                            fallback: Filter(tags: ["neutral"]),
                        )),
                    ),
                    Ref(alias: "Person"),
                    Literal(text: {"de": "von", "en": "of"}, ext: (optional_with: "Place")),
                    Select(key: "places", as: "Place", ext: (optional: true, component_key: "origin")),
                    Pp(prep: "in", ref: Select(key: "regions")),
                    Generate(from: Package("fantasy"), collection: "epithets"),
                ],
            )"#,
        )
        .unwrap();

        assert_eq!(recipe.id, "noble");
        assert_eq!(recipe.pattern.len(), 7);

        let Block::Select(title) = &recipe.pattern[1] else {
            panic!("expected select");
        };
        let agreement = title.ext.agree_with.as_ref().unwrap();
        assert_eq!(agreement.source, "Person");
        assert!(matches!(&agreement.features[0], AgreementFeature::Gram { path, .. } if path == "gender"));
        assert!(matches!(&agreement.fallback, Some(AgreementFallback::Filter(f)) if f.tags == vec!["neutral".to_string()]));

        let Block::Pp(pp) = &recipe.pattern[5] else {
            panic!("expected pp");
        };
        assert!(matches!(&pp.target, PpTarget::Select(s) if s.key == "regions"));

        let Block::Generate(generate) = &recipe.pattern[6] else {
            panic!("expected generate");
        };
        assert_eq!(generate.from, GenerateFrom::Package("fantasy".to_string()));
        assert_eq!(generate.collection.as_deref(), Some("epithets"));
    }

    #[test]
    fn block_ext_accessor() {
        let select = Block::Select(SelectBlock::catalog("names"));
        assert!(select.ext().is_some());
        let reference = Block::Ref(RefBlock {
            alias: "Person".to_string(),
        });
        assert!(reference.ext().is_none());
    }
}
