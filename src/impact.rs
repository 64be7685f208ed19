//! Impact aggregation: join attributed supply to impact factors and sum per
//! item.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::attribution::{AttributedSupply, SupplyFlag};
use crate::reconcile::{normalize_name, NameMapping};

/// Biodiversity impact coefficient for one (product, location).
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactFactor {
    pub product_name: String,
    pub location_name: String,
    pub impact_factor: Option<f64>,
}

/// Impact factors indexed by normalized (product, location).
#[derive(Debug, Clone, Default)]
pub struct ImpactFactorTable {
    factors: HashMap<(String, String), Vec<f64>>,
}

impl ImpactFactorTable {
    /// Rows with a missing or non-finite factor value are left out of the
    /// index.
    pub fn new(rows: &[ImpactFactor]) -> Self {
        let mut factors: HashMap<(String, String), Vec<f64>> = HashMap::new();
        for row in rows {
            let Some(value) = row.impact_factor.filter(|v| v.is_finite()) else {
                continue;
            };
            factors
                .entry((
                    normalize_name(&row.product_name),
                    normalize_name(&row.location_name),
                ))
                .or_default()
                .push(value);
        }
        Self { factors }
    }

    pub fn get(&self, product: &str, location: &str) -> &[f64] {
        self.factors
            .get(&(normalize_name(product), normalize_name(location)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// One fact row after the three left joins. Unmatched join steps are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactResult {
    pub item: String,
    pub origin_country: String,
    pub flag: SupplyFlag,
    pub supply_quantity: Option<f64>,
    pub impact_product: Option<String>,
    pub impact_location: Option<String>,
    pub impact_factor: Option<f64>,
    pub total_impact: Option<f64>,
}

/// Per-item footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactSummary {
    pub item: String,
    pub total_impact: f64,
    pub total_consumption: f64,
}

/// Left-join the fact table to product names, location names and factors.
///
/// Each join is an explicit cross product over the matches: a row with two
/// mapped products and one mapped location yields two detail rows. A join
/// step without any match yields a single row with `None` in its place.
pub fn join_impact_factors(
    fact: &[AttributedSupply],
    products: &NameMapping,
    locations: &NameMapping,
    factors: &ImpactFactorTable,
) -> Vec<ImpactResult> {
    let mut detail = Vec::with_capacity(fact.len());

    for row in fact {
        for product in optional_targets(products, &row.item) {
            for location in optional_targets(locations, &row.origin_country) {
                let matched: &[f64] = match (product, location) {
                    (Some(p), Some(l)) => factors.get(p, l),
                    _ => &[],
                };
                let base = ImpactResult {
                    item: normalize_name(&row.item),
                    origin_country: normalize_name(&row.origin_country),
                    flag: row.flag,
                    supply_quantity: row.supply_quantity,
                    impact_product: product.cloned(),
                    impact_location: location.cloned(),
                    impact_factor: None,
                    total_impact: None,
                };

                if matched.is_empty() {
                    detail.push(base);
                    continue;
                }
                for &factor in matched {
                    detail.push(ImpactResult {
                        impact_factor: Some(factor),
                        total_impact: row.supply_quantity.map(|q| q * factor),
                        ..base.clone()
                    });
                }
            }
        }
    }

    detail
}

fn optional_targets<'a>(mapping: &'a NameMapping, key: &str) -> Vec<Option<&'a String>> {
    let targets = mapping.targets(key);
    if targets.is_empty() {
        vec![None]
    } else {
        targets.iter().map(Some).collect()
    }
}

/// Sum impact and consumption per item.
///
/// `total_consumption` is taken from the fact table so that fan-out in the
/// impact joins does not count a quantity twice. Every item of the fact table
/// gets a summary row; items with no matched factor have zero impact.
pub fn summarize(fact: &[AttributedSupply], detail: &[ImpactResult]) -> Vec<ImpactSummary> {
    let mut totals: BTreeMap<String, (f64, f64)> = BTreeMap::new();

    for row in fact {
        totals.entry(normalize_name(&row.item)).or_default().1 += row.supply_quantity.unwrap_or(0.0);
    }
    for row in detail {
        totals.entry(normalize_name(&row.item)).or_default().0 += row.total_impact.unwrap_or(0.0);
    }

    totals
        .into_iter()
        .map(|(item, (total_impact, total_consumption))| ImpactSummary {
            item,
            total_impact,
            total_consumption,
        })
        .collect()
}

/// Join gaps found while matching the fact table to impact factors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImpactGaps {
    pub items_without_product: Vec<String>,
    pub origins_without_location: Vec<String>,
    pub pairs_without_factor: Vec<(String, String)>,
}

/// Collect the distinct unmatched keys of a detail table.
pub fn impact_gaps(detail: &[ImpactResult]) -> ImpactGaps {
    let mut items = BTreeSet::new();
    let mut origins = BTreeSet::new();
    let mut pairs = BTreeSet::new();

    for row in detail {
        if row.impact_product.is_none() {
            items.insert(row.item.clone());
        }
        if row.impact_location.is_none() {
            origins.insert(row.origin_country.clone());
        }
        if let (Some(p), Some(l), None) = (&row.impact_product, &row.impact_location, row.impact_factor) {
            pairs.insert((p.clone(), l.clone()));
        }
    }

    debug!(
        items = items.len(),
        origins = origins.len(),
        pairs = pairs.len(),
        "impact join gaps"
    );

    ImpactGaps {
        items_without_product: items.into_iter().collect(),
        origins_without_location: origins.into_iter().collect(),
        pairs_without_factor: pairs.into_iter().collect(),
    }
}
