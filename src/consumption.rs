//! Consumption splitting: per-item domestic vs imported food supply.

use std::collections::BTreeMap;

use tracing::debug;

use crate::reconcile::normalize_name;
use crate::schema::element;

/// One raw food-balance triple, before pivoting.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodBalanceRecord {
    pub area: String,
    pub item: String,
    pub element: String,
    pub value: Option<f64>,
    /// `None` when the source table carries no year column.
    pub year: Option<i64>,
}

/// Food-balance figures for one item in the selected area and year.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodBalanceRow {
    pub item: String,
    pub area: String,
    pub production: f64,
    pub import_qty: f64,
    pub export_qty: f64,
    pub supply_per_capita: f64,
}

/// Per-capita supply of one item split by origin.
///
/// The three quantities are `None` when the import dependency ratio is
/// undefined (zero denominator). Such items cannot be apportioned.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionSplit {
    pub item: String,
    pub area: String,
    pub import_ratio: Option<f64>,
    pub domestic_supply: Option<f64>,
    pub imported_supply: Option<f64>,
}

impl ConsumptionSplit {
    pub fn is_undefined(&self) -> bool {
        self.import_ratio.is_none()
    }
}

#[derive(Default)]
struct ElementTotals {
    production: f64,
    import_qty: f64,
    export_qty: f64,
    supply_per_capita: f64,
}

/// Pivot raw (item, element, value) triples into one row per item.
///
/// Only triples for `country` (compared after name normalization) and for
/// `year` (when the triple has a year) are kept. Duplicate (item, element)
/// values are summed, missing elements and missing values count as zero.
pub fn pivot_food_balance(
    records: &[FoodBalanceRecord],
    country: &str,
    year: i64,
) -> Vec<FoodBalanceRow> {
    let country = normalize_name(country);
    let mut by_item: BTreeMap<String, ElementTotals> = BTreeMap::new();

    for record in records {
        if normalize_name(&record.area) != country {
            continue;
        }
        if record.year.is_some_and(|y| y != year) {
            continue;
        }

        let item = normalize_name(&record.item);
        let totals = by_item.entry(item).or_default();
        let value = record.value.unwrap_or(0.0);

        match normalize_name(&record.element).as_str() {
            element::PRODUCTION => totals.production += value,
            element::IMPORT_QUANTITY => totals.import_qty += value,
            element::EXPORT_QUANTITY => totals.export_qty += value,
            element::FOOD_SUPPLY => totals.supply_per_capita += value,
            other => debug!(item = %record.item, element = other, "ignoring food-balance element"),
        }
    }

    by_item
        .into_iter()
        .map(|(item, totals)| FoodBalanceRow {
            item,
            area: country.clone(),
            production: totals.production,
            import_qty: totals.import_qty,
            export_qty: totals.export_qty,
            supply_per_capita: totals.supply_per_capita,
        })
        .collect()
}

/// Import dependency ratio: `import / (production + import - export)`.
///
/// Returns `None` when the denominator is zero or the ratio is otherwise not
/// a finite number.
pub fn import_dependency_ratio(row: &FoodBalanceRow) -> Option<f64> {
    let denominator = row.production + row.import_qty - row.export_qty;
    if denominator == 0.0 {
        return None;
    }
    let ratio = row.import_qty / denominator;
    ratio.is_finite().then_some(ratio)
}

/// Split each item's per-capita supply into domestic and imported parts.
pub fn split_consumption(rows: &[FoodBalanceRow]) -> Vec<ConsumptionSplit> {
    rows.iter()
        .map(|row| {
            let ratio = import_dependency_ratio(row);
            if ratio.is_none() {
                debug!(item = %row.item, "import dependency ratio undefined");
            }
            ConsumptionSplit {
                item: row.item.clone(),
                area: row.area.clone(),
                import_ratio: ratio,
                domestic_supply: ratio.map(|r| (1.0 - r) * row.supply_per_capita),
                imported_supply: ratio.map(|r| r * row.supply_per_capita),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(area: &str, item: &str, element: &str, value: f64) -> FoodBalanceRecord {
        FoodBalanceRecord {
            area: area.to_string(),
            item: item.to_string(),
            element: element.to_string(),
            value: Some(value),
            year: None,
        }
    }

    fn balance(production: f64, import_qty: f64, export_qty: f64, supply: f64) -> FoodBalanceRow {
        FoodBalanceRow {
            item: "Wheat".to_string(),
            area: "Brazil".to_string(),
            production,
            import_qty,
            export_qty,
            supply_per_capita: supply,
        }
    }

    #[test]
    fn test_pivot_one_row_per_item() {
        let records = vec![
            record("Brazil", "Wheat", element::PRODUCTION, 100.0),
            record("Brazil", "Wheat", element::IMPORT_QUANTITY, 50.0),
            record("Brazil", "Wheat", element::EXPORT_QUANTITY, 10.0),
            record("Brazil", "Wheat", element::FOOD_SUPPLY, 20.0),
            record("Brazil", "Rice", element::PRODUCTION, 5.0),
        ];

        let rows = pivot_food_balance(&records, "Brazil", 2019);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].item, "Rice");
        assert_eq!(rows[0].import_qty, 0.0);
        assert_eq!(rows[0].supply_per_capita, 0.0);
        assert_eq!(rows[1], balance(100.0, 50.0, 10.0, 20.0));
    }

    #[test]
    fn test_pivot_sums_duplicates_and_fills_missing() {
        let mut missing = record("Brazil", "Wheat", element::PRODUCTION, 0.0);
        missing.value = None;
        let records = vec![
            record("Brazil", "Wheat", element::PRODUCTION, 60.0),
            record("Brazil", "Wheat\u{a0}", element::PRODUCTION, 40.0),
            missing,
        ];

        let rows = pivot_food_balance(&records, "Brazil", 2019);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].production, 100.0);
        assert_eq!(rows[0].export_qty, 0.0);
    }

    #[test]
    fn test_pivot_filters_area_and_year() {
        let mut old = record("Brazil", "Wheat", element::PRODUCTION, 999.0);
        old.year = Some(2010);
        let mut current = record("Brazil", "Wheat", element::PRODUCTION, 7.0);
        current.year = Some(2019);
        let records = vec![
            old,
            current,
            record("Argentina", "Wheat", element::PRODUCTION, 500.0),
            record(" Brazil ", "Wheat", element::IMPORT_QUANTITY, 3.0),
        ];

        let rows = pivot_food_balance(&records, "Brazil", 2019);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].production, 7.0);
        assert_eq!(rows[0].import_qty, 3.0);
    }

    #[test]
    fn test_pivot_ignores_unknown_elements() {
        let records = vec![
            record("Brazil", "Wheat", "Stock Variation", 12.0),
            record("Brazil", "Wheat", element::FOOD_SUPPLY, 20.0),
        ];
        let rows = pivot_food_balance(&records, "Brazil", 2019);
        assert_eq!(rows[0].supply_per_capita, 20.0);
        assert_eq!(rows[0].production, 0.0);
    }

    #[test]
    fn test_split_wheat_brazil() {
        let splits = split_consumption(&[balance(100.0, 50.0, 10.0, 20.0)]);
        let split = &splits[0];

        let ratio = split.import_ratio.unwrap();
        assert!((ratio - 50.0 / 140.0).abs() < 1e-12);
        assert!((split.domestic_supply.unwrap() - 12.857142857).abs() < 1e-6);
        assert!((split.imported_supply.unwrap() - 7.142857142).abs() < 1e-6);
    }

    #[test]
    fn test_split_zero_denominator_is_undefined() {
        let splits = split_consumption(&[balance(0.0, 10.0, 10.0, 5.0)]);
        assert!(splits[0].is_undefined());
        assert_eq!(splits[0].domestic_supply, None);
        assert_eq!(splits[0].imported_supply, None);

        let splits = split_consumption(&[balance(0.0, 0.0, 0.0, 5.0)]);
        assert!(splits[0].is_undefined());
    }

    #[test]
    fn test_split_no_imports_is_all_domestic() {
        let splits = split_consumption(&[balance(80.0, 0.0, 0.0, 12.0)]);
        assert_eq!(splits[0].imported_supply, Some(0.0));
        assert_eq!(splits[0].domestic_supply, Some(12.0));
    }

    proptest! {
        #[test]
        fn split_parts_sum_to_supply(
            production in 0.0f64..1e6,
            import_qty in 0.0f64..1e6,
            export_qty in 0.0f64..1e6,
            supply in 0.0f64..1e3,
        ) {
            let denominator = production + import_qty - export_qty;
            prop_assume!(denominator.abs() > 1e-3);
            let splits = split_consumption(&[balance(production, import_qty, export_qty, supply)]);
            let total = splits[0].domestic_supply.unwrap() + splits[0].imported_supply.unwrap();
            let tolerance = 1e-9 * (1.0 + supply * (1.0 + splits[0].import_ratio.unwrap().abs()));
            prop_assert!((total - supply).abs() <= tolerance);
        }
    }
}
