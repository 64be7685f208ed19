//! Origin attribution: per-item supply becomes per-(item, origin) rows.

use std::fmt;

use tracing::debug;

use crate::consumption::ConsumptionSplit;
use crate::reconcile::NameMapping;
use crate::schema::flag;
use crate::trade::TradeShares;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupplyFlag {
    Domestic,
    Imported,
}

impl SupplyFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplyFlag::Domestic => flag::DOMESTIC,
            SupplyFlag::Imported => flag::IMPORTED,
        }
    }
}

impl fmt::Display for SupplyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the attributed consumption fact table.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributedSupply {
    pub item: String,
    pub consuming_area: String,
    pub origin_country: String,
    /// `None` for domestic rows of items whose import ratio is undefined.
    pub supply_quantity: Option<f64>,
    pub flag: SupplyFlag,
}

/// Fact table plus the items whose imports could not be apportioned.
#[derive(Debug, Clone, Default)]
pub struct Attribution {
    pub rows: Vec<AttributedSupply>,
    /// Items with imported supply but no trade-name mapping.
    pub unmapped_items: Vec<String>,
    /// Items whose mapped trade commodities carry no shares.
    pub items_without_shares: Vec<String>,
}

/// Attribute every item's supply to its origin countries.
///
/// Domestic supply stays with the consuming area. Imported supply is spread
/// over the exporters of every trade commodity the item maps to, in
/// proportion to their percentage share. Items without a mapping or without
/// shares contribute no imported rows.
pub fn attribute_origins(
    splits: &[ConsumptionSplit],
    trade_names: &NameMapping,
    shares: &TradeShares,
) -> Attribution {
    let mut attribution = Attribution::default();

    for split in splits {
        attribution.rows.push(AttributedSupply {
            item: split.item.clone(),
            consuming_area: split.area.clone(),
            origin_country: split.area.clone(),
            supply_quantity: split.domestic_supply,
            flag: SupplyFlag::Domestic,
        });
    }

    for split in splits {
        let Some(imported) = split.imported_supply else {
            debug!(item = %split.item, "skipping imports with undefined ratio");
            continue;
        };

        let commodities = trade_names.targets(&split.item);
        if commodities.is_empty() {
            debug!(item = %split.item, "no trade-name mapping");
            if imported != 0.0 {
                attribution.unmapped_items.push(split.item.clone());
            }
            continue;
        }

        let mut allocated_rows = 0usize;
        for commodity in commodities {
            for share in shares.for_commodity(commodity) {
                attribution.rows.push(AttributedSupply {
                    item: split.item.clone(),
                    consuming_area: split.area.clone(),
                    origin_country: share.exporter.clone(),
                    supply_quantity: Some(imported * share.percentage / 100.0),
                    flag: SupplyFlag::Imported,
                });
                allocated_rows += 1;
            }
        }

        if allocated_rows == 0 && imported != 0.0 {
            debug!(item = %split.item, ?commodities, "no trade shares for mapped commodities");
            attribution.items_without_shares.push(split.item.clone());
        }
    }

    attribution
}
