//! Read-only catalog model: products, sets, cards, parallels and tag vocabularies.
//!
//! A catalog is loaded once from a JSON document and never mutated. Cards are
//! identified by name triples (product, set, card number), never by position,
//! so identities survive a reload of the same document.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::fields::TagKind;
use crate::owned::{OwnedAggregate, build_owned_aggregate};

/// Accept either a JSON string or a JSON number and keep its textual form.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub products: Vec<Product>,
    pub tags: TagVocabulary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collection: Vec<OwnershipRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub sport: String,
    #[serde(deserialize_with = "string_or_number")]
    pub year: String,
    pub name: String,
    #[serde(default)]
    pub sets: Vec<CardSet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSet {
    pub name: String,
    #[serde(rename = "type", default)]
    pub set_type: String,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub parallels: Vec<Parallel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(deserialize_with = "string_or_number")]
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default)]
    pub rookie: bool,
    #[serde(default)]
    pub sp: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parallel {
    pub name: String,
    #[serde(default)]
    pub is_base: bool,
    /// Print run, when the parallel is serial numbered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_numbered: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        color_hex: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TagRepr")]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
}

impl From<TagRepr> for Tag {
    fn from(repr: TagRepr) -> Self {
        match repr {
            TagRepr::Name(name) => Self {
                name,
                color_hex: None,
            },
            TagRepr::Full { name, color_hex } => Self { name, color_hex },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagVocabulary {
    #[serde(default)]
    pub location: Vec<Tag>,
    #[serde(default)]
    pub price_bucket: Vec<Tag>,
    #[serde(default)]
    pub status: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    pub product: String,
    pub set: String,
    #[serde(deserialize_with = "string_or_number")]
    pub card_number: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}

impl Catalog {
    /// Parse and validate a catalog document.
    pub fn load(raw: &str) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| CoreError::InvalidCatalog(format!("not a JSON document: {e}")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        let Some(object) = value.as_object() else {
            return Err(CoreError::InvalidCatalog("document is not an object".into()));
        };
        for key in ["products", "tags"] {
            if !object.contains_key(key) {
                return Err(CoreError::InvalidCatalog(format!("missing `{key}`")));
            }
        }
        let catalog: Catalog =
            serde_json::from_value(value).map_err(|e| CoreError::InvalidCatalog(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Card numbers and parallel names must be unique within a set.
    fn validate(&self) -> Result<(), CoreError> {
        for product in &self.products {
            for set in &product.sets {
                let mut numbers = HashSet::new();
                for card in &set.cards {
                    if !numbers.insert(card.number.as_str()) {
                        return Err(CoreError::InvalidCatalog(format!(
                            "duplicate card number {} in {} / {}",
                            card.number, product.name, set.name
                        )));
                    }
                }
                let mut parallels = HashSet::new();
                for parallel in &set.parallels {
                    if !parallels.insert(parallel.name.as_str()) {
                        return Err(CoreError::InvalidCatalog(format!(
                            "duplicate parallel {} in {} / {}",
                            parallel.name, product.name, set.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    pub fn fingerprint(&self) -> Result<[u8; 32], CoreError> {
        let bytes =
            serde_json::to_vec(self).map_err(|e| CoreError::Serialization(e.to_string()))?;
        Ok(*blake3::hash(&bytes).as_bytes())
    }

    /// Distinct sport names, ascending.
    pub fn sports_list(&self) -> Vec<&str> {
        self.products
            .iter()
            .map(|p| p.sport.as_str())
            .filter(|s| !s.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Products of one sport (all when `sport` is `None` or empty), newest year
    /// first by numeric value, then by name.
    pub fn products_for(&self, sport: Option<&str>) -> Vec<&Product> {
        let sport = sport.filter(|s| !s.is_empty());
        let mut products: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| sport.is_none_or(|s| p.sport == s))
            .collect();
        products.sort_by(|a, b| {
            b.year_number()
                .cmp(&a.year_number())
                .then_with(|| a.name.cmp(&b.name))
        });
        products
    }

    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }
}

impl Product {
    /// The year as a number. `None` when it is not numeric, which sorts after
    /// every numeric year in descending order.
    pub fn year_number(&self) -> Option<u32> {
        self.year.trim().parse().ok()
    }

    pub fn set(&self, name: &str) -> Option<&CardSet> {
        self.sets.iter().find(|s| s.name == name)
    }

    pub fn set_names(&self) -> Vec<&str> {
        self.sets.iter().map(|s| s.name.as_str()).collect()
    }
}

impl CardSet {
    pub fn card(&self, number: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.number == number)
    }

    pub fn parallel(&self, name: &str) -> Option<&Parallel> {
        self.parallels.iter().find(|p| p.name == name)
    }

    pub fn has_parallel(&self, name: &str) -> bool {
        self.parallel(name).is_some()
    }

    /// The parallel flagged as base, else the first one listed.
    pub fn base_parallel(&self) -> Option<&Parallel> {
        self.parallels
            .iter()
            .find(|p| p.is_base)
            .or_else(|| self.parallels.first())
    }
}

impl Card {
    pub fn display_name(&self) -> &str {
        self.player
            .as_deref()
            .or(self.card_name.as_deref())
            .unwrap_or("")
    }
}

impl TagVocabulary {
    pub fn get(&self, kind: TagKind) -> &[Tag] {
        match kind {
            TagKind::Location => &self.location,
            TagKind::PriceBucket => &self.price_bucket,
            TagKind::Status => &self.status,
        }
    }

    pub fn names(&self, kind: TagKind) -> Vec<&str> {
        self.get(kind).iter().map(|t| t.name.as_str()).collect()
    }

    pub fn contains(&self, kind: TagKind, name: &str) -> bool {
        self.get(kind).iter().any(|t| t.name == name)
    }

    pub fn color_of(&self, kind: TagKind, name: &str) -> Option<&str> {
        self.get(kind)
            .iter()
            .find(|t| t.name == name)
            .and_then(|t| t.color_hex.as_deref())
    }
}

/// A loaded catalog together with the data derived from it on load.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    catalog: Catalog,
    owned: OwnedAggregate,
    fingerprint: blake3::Hash,
}

impl CatalogIndex {
    pub fn new(catalog: Catalog) -> Result<Self, CoreError> {
        let owned = build_owned_aggregate(&catalog);
        let fingerprint = blake3::Hash::from(catalog.fingerprint()?);
        Ok(Self {
            catalog,
            owned,
            fingerprint,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn owned(&self) -> &OwnedAggregate {
        &self.owned
    }

    pub fn fingerprint(&self) -> &[u8; 32] {
        self.fingerprint.as_bytes()
    }

    pub fn fingerprint_hex(&self) -> String {
        self.fingerprint.to_hex().to_string()
    }

    pub fn sports_list(&self) -> Vec<&str> {
        self.catalog.sports_list()
    }

    pub fn products_for(&self, sport: Option<&str>) -> Vec<&Product> {
        self.catalog.products_for(sport)
    }
}
