use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::Catalog;

/// Name-based card identity: (product, set, card number).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CardKey {
    pub product: String,
    pub set: String,
    pub number: String,
}

impl CardKey {
    pub fn new(product: &str, set: &str, number: &str) -> Self {
        Self {
            product: product.to_string(),
            set: set.to_string(),
            number: number.to_string(),
        }
    }
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.product, self.set, self.number)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnedSummary {
    pub qty: u64,
    pub median_price: Option<f64>,
    pub grade: Option<String>,
}

/// Prior ownership summed per card. Rebuilt from scratch on every catalog load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnedAggregate {
    entries: BTreeMap<CardKey, OwnedSummary>,
}

impl OwnedAggregate {
    pub fn get(&self, product: &str, set: &str, number: &str) -> Option<&OwnedSummary> {
        self.entries.get(&CardKey::new(product, set, number))
    }

    pub fn total_quantity(&self) -> u64 {
        self.entries.values().map(|s| s.qty).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CardKey, &OwnedSummary)> {
        self.entries.iter()
    }
}

/// Quantities are summed; price and grade keep the first non-null value seen.
pub fn build_owned_aggregate(catalog: &Catalog) -> OwnedAggregate {
    let mut entries: BTreeMap<CardKey, OwnedSummary> = BTreeMap::new();
    for record in &catalog.collection {
        let summary = entries
            .entry(CardKey::new(&record.product, &record.set, &record.card_number))
            .or_default();
        summary.qty += u64::from(record.quantity);
        if summary.median_price.is_none() {
            summary.median_price = record.median_price;
        }
        if summary.grade.is_none() {
            summary.grade = record.grade.clone();
        }
    }
    OwnedAggregate { entries }
}
