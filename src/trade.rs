//! Trade apportionment: per-commodity percentage shares by exporter.

use std::collections::BTreeMap;

use tracing::debug;

use crate::reconcile::normalize_name;

/// One bilateral trade flow.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeFlowRow {
    pub exporter: String,
    pub commodity: String,
    pub weight: Option<f64>,
    pub year: Option<i64>,
    pub importer: Option<String>,
}

impl TradeFlowRow {
    pub fn new(exporter: &str, commodity: &str, weight: f64) -> Self {
        Self {
            exporter: exporter.to_string(),
            commodity: commodity.to_string(),
            weight: Some(weight),
            year: None,
            importer: None,
        }
    }
}

/// Share of one exporter in a commodity's total traded weight.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeShare {
    pub commodity: String,
    pub exporter: String,
    pub total_weight: f64,
    pub percentage: f64,
}

/// Keep the flows of the reference year that were imported by `country`.
///
/// Flows without a year or without an importer are taken as already
/// filtered on that axis.
pub fn filter_flows(rows: &[TradeFlowRow], country: &str, reference_year: i64) -> Vec<TradeFlowRow> {
    let country = normalize_name(country);
    rows.iter()
        .filter(|row| row.year.map_or(true, |y| y == reference_year))
        .filter(|row| {
            row.importer
                .as_deref()
                .map_or(true, |importer| normalize_name(importer) == country)
        })
        .cloned()
        .collect()
}

/// Result of apportioning trade flows.
#[derive(Debug, Clone, Default)]
pub struct Apportionment {
    pub shares: Vec<TradeShare>,
    /// Commodities whose total weight was zero; their exporters are dropped.
    pub degenerate: Vec<String>,
}

/// Group flows by (commodity, exporter) and compute percentage shares.
///
/// Missing and non-finite weights count as zero. Shares are ordered by commodity, then
/// exporter.
pub fn apportion(rows: &[TradeFlowRow]) -> Apportionment {
    let mut grouped: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for row in rows {
        *grouped
            .entry(normalize_name(&row.commodity))
            .or_default()
            .entry(normalize_name(&row.exporter))
            .or_default() += row.weight.filter(|w| w.is_finite()).unwrap_or(0.0);
    }

    let mut result = Apportionment::default();
    for (commodity, exporters) in grouped {
        let commodity_total: f64 = exporters.values().sum();
        if commodity_total == 0.0 || !commodity_total.is_finite() {
            debug!(%commodity, "dropping commodity with zero total trade weight");
            result.degenerate.push(commodity);
            continue;
        }

        for (exporter, total_weight) in exporters {
            result.shares.push(TradeShare {
                commodity: commodity.clone(),
                exporter,
                total_weight,
                percentage: 100.0 * total_weight / commodity_total,
            });
        }
    }

    result
}

/// Trade shares indexed by commodity.
#[derive(Debug, Clone, Default)]
pub struct TradeShares {
    by_commodity: BTreeMap<String, Vec<TradeShare>>,
}

impl TradeShares {
    pub fn new(shares: &[TradeShare]) -> Self {
        let mut by_commodity: BTreeMap<String, Vec<TradeShare>> = BTreeMap::new();
        for share in shares {
            by_commodity
                .entry(normalize_name(&share.commodity))
                .or_default()
                .push(share.clone());
        }
        Self { by_commodity }
    }

    /// Shares for `commodity`, empty when the commodity has no trade data.
    pub fn for_commodity(&self, commodity: &str) -> &[TradeShare] {
        self.by_commodity
            .get(&normalize_name(commodity))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
