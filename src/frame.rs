//! Conversion between polars `DataFrame`s and the typed row sets.
//!
//! Input frames are validated against the column constants in
//! [`crate::schema`]; a missing required column aborts with
//! [`FootprintError::MissingColumn`]. Numeric columns may arrive as strings
//! (CSV read with all columns as text) or as numeric dtypes.

use polars::prelude::*;

use crate::attribution::AttributedSupply;
use crate::consumption::{ConsumptionSplit, FoodBalanceRecord, FoodBalanceRow};
use crate::error::{FootprintError, Result};
use crate::impact::{ImpactFactor, ImpactResult, ImpactSummary};
use crate::reconcile::{normalize_name, NameMapping};
use crate::schema::{
    attributed, detail, element, food_balance, impact_factors, shares, split, summary, trade,
};
use crate::trade::{TradeFlowRow, TradeShare};

// ── Column access ───────────────────────────────────────────────────────────

pub fn require_columns(df: &DataFrame, table: &'static str, required: &[&str]) -> Result<()> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(FootprintError::MissingColumn {
                table,
                column: col_name.to_string(),
            });
        }
    }
    Ok(())
}

fn column<'a>(df: &'a DataFrame, table: &'static str, name: &str) -> Result<&'a Column> {
    df.column(name).map_err(|_| FootprintError::MissingColumn {
        table,
        column: name.to_string(),
    })
}

/// Values of a column as strings, whatever its dtype.
pub fn string_values(df: &DataFrame, table: &'static str, name: &str) -> Result<Vec<Option<String>>> {
    let column = column(df, table, name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Values of a numeric column. Blank strings and non-finite values (`NaN`,
/// `inf`) are missing values.
pub fn float_values(df: &DataFrame, table: &'static str, name: &str) -> Result<Vec<Option<f64>>> {
    let column = column(df, table, name)?;
    if column.dtype() == &DataType::String {
        return column
            .str()?
            .into_iter()
            .map(|v| v.map(|s| parse_float(table, name, s)).transpose())
            .map(|v| v.map(Option::flatten))
            .collect();
    }
    let column = column.cast(&DataType::Float64)?;
    Ok(column
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

/// Values of an integer column such as a year.
pub fn int_values(df: &DataFrame, table: &'static str, name: &str) -> Result<Vec<Option<i64>>> {
    let column = column(df, table, name)?;
    if column.dtype() == &DataType::String {
        return column
            .str()?
            .into_iter()
            .map(|v| v.map(|s| parse_int(table, name, s)).transpose())
            .map(|v| v.map(Option::flatten))
            .collect();
    }
    let column = column.cast(&DataType::Int64)?;
    Ok(column.i64()?.into_iter().collect())
}

fn parse_float(table: &str, name: &str, raw: &str) -> Result<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = trimmed.parse::<f64>().map_err(|_| {
        FootprintError::InvalidData(format!(
            "{table} column '{name}': '{raw}' is not a number"
        ))
    })?;
    Ok(Some(value).filter(|v| v.is_finite()))
}

fn parse_int(table: &str, name: &str, raw: &str) -> Result<Option<i64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(Some(value));
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.is_finite() => Ok(Some(value as i64)),
        _ => Err(FootprintError::InvalidData(format!(
            "{table} column '{name}': '{raw}' is not an integer"
        ))),
    }
}

/// A join key, or `None` when the cell is null or blank after normalization.
fn key(value: Option<String>) -> Option<String> {
    value.filter(|v| !normalize_name(v).is_empty())
}

fn optional_column<T>(
    df: &DataFrame,
    name: &str,
    read: impl FnOnce(&DataFrame) -> Result<Vec<Option<T>>>,
) -> Result<Vec<Option<T>>> {
    if df.column(name).is_ok() {
        read(df)
    } else {
        Ok((0..df.height()).map(|_| None).collect())
    }
}

// ── Input tables ────────────────────────────────────────────────────────────

/// Raw food-balance triples.
///
/// Required columns: area, item, element, value. Optional: year. Rows with
/// a null or blank area, item or element are skipped.
pub fn food_balance_records(df: &DataFrame) -> Result<Vec<FoodBalanceRecord>> {
    use food_balance::*;
    require_columns(df, TABLE, &[AREA, ITEM, ELEMENT, VALUE])?;

    let areas = string_values(df, TABLE, AREA)?;
    let items = string_values(df, TABLE, ITEM)?;
    let elements = string_values(df, TABLE, ELEMENT)?;
    let values = float_values(df, TABLE, VALUE)?;
    let years = optional_column(df, YEAR, |df| int_values(df, TABLE, YEAR))?;

    Ok(areas
        .into_iter()
        .zip(items)
        .zip(elements)
        .zip(values)
        .zip(years)
        .filter_map(|((((area, item), element), value), year)| {
            Some(FoodBalanceRecord {
                area: key(area)?,
                item: key(item)?,
                element: key(element)?,
                value,
                year,
            })
        })
        .collect())
}

/// Bilateral trade flows.
///
/// Required columns: exporter, commodity, weight. Optional: year, importer.
/// Rows with a null or blank exporter or commodity are skipped.
pub fn trade_flows(df: &DataFrame) -> Result<Vec<TradeFlowRow>> {
    use trade::*;
    require_columns(df, TABLE, &[EXPORTER, COMMODITY, WEIGHT])?;

    let exporters = string_values(df, TABLE, EXPORTER)?;
    let commodities = string_values(df, TABLE, COMMODITY)?;
    let weights = float_values(df, TABLE, WEIGHT)?;
    let years = optional_column(df, YEAR, |df| int_values(df, TABLE, YEAR))?;
    let importers = optional_column(df, IMPORTER, |df| string_values(df, TABLE, IMPORTER))?;

    Ok(exporters
        .into_iter()
        .zip(commodities)
        .zip(weights)
        .zip(years)
        .zip(importers)
        .filter_map(|((((exporter, commodity), weight), year), importer)| {
            Some(TradeFlowRow {
                exporter: key(exporter)?,
                commodity: key(commodity)?,
                weight,
                year,
                importer,
            })
        })
        .collect())
}

/// A two-column name matching table. Rows with a null on either side are
/// skipped.
pub fn name_mapping(
    df: &DataFrame,
    table: &'static str,
    source: &str,
    target: &str,
) -> Result<NameMapping> {
    require_columns(df, table, &[source, target])?;
    let sources = string_values(df, table, source)?;
    let targets = string_values(df, table, target)?;

    Ok(NameMapping::from_pairs(
        sources
            .into_iter()
            .zip(targets)
            .filter_map(|(s, t)| Some((s?, t?))),
    ))
}

/// Impact factors.
///
/// Required columns: product, location, impact_factor. Rows with a null or
/// blank product or location are skipped.
pub fn impact_factors(df: &DataFrame) -> Result<Vec<ImpactFactor>> {
    use impact_factors::*;
    require_columns(df, TABLE, &[PRODUCT, LOCATION, IMPACT_FACTOR])?;

    let products = string_values(df, TABLE, PRODUCT)?;
    let locations = string_values(df, TABLE, LOCATION)?;
    let factors = float_values(df, TABLE, IMPACT_FACTOR)?;

    Ok(products
        .into_iter()
        .zip(locations)
        .zip(factors)
        .filter_map(|((product, location), factor)| {
            Some(ImpactFactor {
                product_name: key(product)?,
                location_name: key(location)?,
                impact_factor: factor,
            })
        })
        .collect())
}

// ── Output tables ───────────────────────────────────────────────────────────

pub fn food_balance_frame(rows: &[FoodBalanceRow]) -> Result<DataFrame> {
    let items: Vec<&str> = rows.iter().map(|r| r.item.as_str()).collect();
    let areas: Vec<&str> = rows.iter().map(|r| r.area.as_str()).collect();
    let production: Vec<f64> = rows.iter().map(|r| r.production).collect();
    let imports: Vec<f64> = rows.iter().map(|r| r.import_qty).collect();
    let exports: Vec<f64> = rows.iter().map(|r| r.export_qty).collect();
    let supply: Vec<f64> = rows.iter().map(|r| r.supply_per_capita).collect();

    Ok(DataFrame::new(vec![
        Column::new(food_balance::ITEM.into(), &items),
        Column::new(food_balance::AREA.into(), &areas),
        Column::new(element::PRODUCTION.into(), &production),
        Column::new(element::IMPORT_QUANTITY.into(), &imports),
        Column::new(element::EXPORT_QUANTITY.into(), &exports),
        Column::new(element::FOOD_SUPPLY.into(), &supply),
    ])?)
}

pub fn splits_frame(rows: &[ConsumptionSplit]) -> Result<DataFrame> {
    let items: Vec<&str> = rows.iter().map(|r| r.item.as_str()).collect();
    let areas: Vec<&str> = rows.iter().map(|r| r.area.as_str()).collect();
    let ratios: Vec<Option<f64>> = rows.iter().map(|r| r.import_ratio).collect();
    let domestic: Vec<Option<f64>> = rows.iter().map(|r| r.domestic_supply).collect();
    let imported: Vec<Option<f64>> = rows.iter().map(|r| r.imported_supply).collect();

    Ok(DataFrame::new(vec![
        Column::new(split::ITEM.into(), &items),
        Column::new(split::AREA.into(), &areas),
        Column::new(split::IMPORT_RATIO.into(), &ratios),
        Column::new(split::DOMESTIC_SUPPLY.into(), &domestic),
        Column::new(split::IMPORTED_SUPPLY.into(), &imported),
    ])?)
}

pub fn shares_frame(rows: &[TradeShare]) -> Result<DataFrame> {
    let commodities: Vec<&str> = rows.iter().map(|r| r.commodity.as_str()).collect();
    let exporters: Vec<&str> = rows.iter().map(|r| r.exporter.as_str()).collect();
    let weights: Vec<f64> = rows.iter().map(|r| r.total_weight).collect();
    let percentages: Vec<f64> = rows.iter().map(|r| r.percentage).collect();

    Ok(DataFrame::new(vec![
        Column::new(shares::COMMODITY.into(), &commodities),
        Column::new(shares::EXPORTER.into(), &exporters),
        Column::new(shares::TOTAL_WEIGHT.into(), &weights),
        Column::new(shares::PERCENTAGE.into(), &percentages),
    ])?)
}

pub fn attributed_frame(rows: &[AttributedSupply]) -> Result<DataFrame> {
    let items: Vec<&str> = rows.iter().map(|r| r.item.as_str()).collect();
    let areas: Vec<&str> = rows.iter().map(|r| r.consuming_area.as_str()).collect();
    let origins: Vec<&str> = rows.iter().map(|r| r.origin_country.as_str()).collect();
    let quantities: Vec<Option<f64>> = rows.iter().map(|r| r.supply_quantity).collect();
    let flags: Vec<&str> = rows.iter().map(|r| r.flag.as_str()).collect();

    Ok(DataFrame::new(vec![
        Column::new(attributed::ITEM.into(), &items),
        Column::new(attributed::CONSUMING_AREA.into(), &areas),
        Column::new(attributed::ORIGIN_COUNTRY.into(), &origins),
        Column::new(attributed::SUPPLY_QUANTITY.into(), &quantities),
        Column::new(attributed::FLAG.into(), &flags),
    ])?)
}

pub fn detail_frame(rows: &[ImpactResult]) -> Result<DataFrame> {
    let items: Vec<&str> = rows.iter().map(|r| r.item.as_str()).collect();
    let origins: Vec<&str> = rows.iter().map(|r| r.origin_country.as_str()).collect();
    let flags: Vec<&str> = rows.iter().map(|r| r.flag.as_str()).collect();
    let quantities: Vec<Option<f64>> = rows.iter().map(|r| r.supply_quantity).collect();
    let products: Vec<Option<&str>> = rows.iter().map(|r| r.impact_product.as_deref()).collect();
    let locations: Vec<Option<&str>> = rows.iter().map(|r| r.impact_location.as_deref()).collect();
    let factors: Vec<Option<f64>> = rows.iter().map(|r| r.impact_factor).collect();
    let impacts: Vec<Option<f64>> = rows.iter().map(|r| r.total_impact).collect();

    Ok(DataFrame::new(vec![
        Column::new(attributed::ITEM.into(), &items),
        Column::new(attributed::ORIGIN_COUNTRY.into(), &origins),
        Column::new(attributed::FLAG.into(), &flags),
        Column::new(attributed::SUPPLY_QUANTITY.into(), &quantities),
        Column::new(detail::IMPACT_PRODUCT.into(), &products),
        Column::new(detail::IMPACT_LOCATION.into(), &locations),
        Column::new(detail::IMPACT_FACTOR.into(), &factors),
        Column::new(detail::TOTAL_IMPACT.into(), &impacts),
    ])?)
}

pub fn summary_frame(rows: &[ImpactSummary]) -> Result<DataFrame> {
    let items: Vec<&str> = rows.iter().map(|r| r.item.as_str()).collect();
    let impacts: Vec<f64> = rows.iter().map(|r| r.total_impact).collect();
    let consumption: Vec<f64> = rows.iter().map(|r| r.total_consumption).collect();

    Ok(DataFrame::new(vec![
        Column::new(summary::ITEM.into(), &items),
        Column::new(summary::TOTAL_IMPACT.into(), &impacts),
        Column::new(summary::TOTAL_CONSUMPTION.into(), &consumption),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::trade_names;

    #[test]
    fn test_food_balance_records_from_strings() {
        let df = df! {
            "area" => &["Brazil", "Brazil"],
            "item" => &["Wheat", "Wheat"],
            "element" => &["Production", "Import Quantity"],
            "value" => &[" 100 ", ""],
            "year" => &["2019", "2019.0"],
        }
        .unwrap();

        let records = food_balance_records(&df).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value, Some(100.0));
        assert_eq!(records[1].value, None);
        assert_eq!(records[1].year, Some(2019));
    }

    #[test]
    fn test_food_balance_records_numeric_without_year() {
        let df = df! {
            "area" => &["Brazil"],
            "item" => &["Rice"],
            "element" => &["Production"],
            "value" => &[12i64],
        }
        .unwrap();

        let records = food_balance_records(&df).unwrap();

        assert_eq!(records[0].value, Some(12.0));
        assert_eq!(records[0].year, None);
    }

    #[test]
    fn test_missing_column_is_schema_violation() {
        let df = df! {
            "exporter" => &["A"],
            "commodity" => &["Wheat"],
        }
        .unwrap();

        match trade_flows(&df) {
            Err(FootprintError::MissingColumn { table, column }) => {
                assert_eq!(table, trade::TABLE);
                assert_eq!(column, "weight");
            }
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_number_is_invalid_data() {
        let df = df! {
            "product" => &["Wheat"],
            "location" => &["BRA"],
            "impact_factor" => &["n/a"],
        }
        .unwrap();

        assert!(matches!(impact_factors(&df), Err(FootprintError::InvalidData(_))));
    }

    #[test]
    fn test_nan_weight_is_missing() {
        let df = df! {
            "exporter" => &["Exporter A", "Exporter B", "Exporter C"],
            "commodity" => &["Wheat", "Wheat", "Wheat"],
            "weight" => &["30", "70", "NaN"],
        }
        .unwrap();

        let flows = trade_flows(&df).unwrap();
        assert_eq!(flows[2].weight, None);

        let result = crate::trade::apportion(&flows);
        assert!(result.degenerate.is_empty());
        let percentages: Vec<f64> = result.shares.iter().map(|s| s.percentage).collect();
        assert!((percentages[0] - 30.0).abs() < 1e-9);
        assert!((percentages[1] - 70.0).abs() < 1e-9);
        assert_eq!(percentages[2], 0.0);
    }

    #[test]
    fn test_nan_impact_factor_is_missing() {
        let df = df! {
            "product" => &["Wheat", "Wheat", "Wheat"],
            "location" => &["BRA", "EXA", "EXB"],
            "impact_factor" => &["1.5", "NaN", "inf"],
        }
        .unwrap();

        let factors = impact_factors(&df).unwrap();
        let values: Vec<Option<f64>> = factors.iter().map(|f| f.impact_factor).collect();
        assert_eq!(values, [Some(1.5), None, None]);
    }

    #[test]
    fn test_nan_in_numeric_column_is_missing() {
        let df = df! {
            "product" => &["Wheat", "Wheat"],
            "location" => &["BRA", "EXA"],
            "impact_factor" => &[2.0, f64::NAN],
        }
        .unwrap();

        let factors = impact_factors(&df).unwrap();
        assert_eq!(factors[0].impact_factor, Some(2.0));
        assert_eq!(factors[1].impact_factor, None);
    }

    #[test]
    fn test_null_trade_keys_are_skipped() {
        let df = df! {
            "exporter" => &[None, Some("Exporter A"), Some(" "), Some("Exporter B")],
            "commodity" => &[Some("Wheat"), Some("Wheat"), Some("Wheat"), None],
            "weight" => &[100.0, 30.0, 10.0, 70.0],
        }
        .unwrap();

        let flows = trade_flows(&df).unwrap();

        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].exporter, "Exporter A");
        let shares = crate::trade::apportion(&flows).shares;
        assert_eq!(shares.len(), 1);
        assert!((shares[0].percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_null_food_balance_keys_are_skipped() {
        let df = df! {
            "area" => &[Some("Brazil"), Some("Brazil"), None],
            "item" => &[Some("Wheat"), None, Some("Wheat")],
            "element" => &[Some("Production"), Some("Production"), Some("Production")],
            "value" => &["100", "40", "5"],
        }
        .unwrap();

        let records = food_balance_records(&df).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].item, "Wheat");
        assert_eq!(records[0].area, "Brazil");
    }

    #[test]
    fn test_null_impact_factor_keys_are_skipped() {
        let df = df! {
            "product" => &[Some("Wheat"), None],
            "location" => &[Some("BRA"), Some("BRA")],
            "impact_factor" => &[1.0, 3.0],
        }
        .unwrap();

        let factors = impact_factors(&df).unwrap();
        assert_eq!(factors.len(), 1);
        assert_eq!(factors[0].product_name, "Wheat");
    }

    #[test]
    fn test_name_mapping_skips_nulls() {
        let df = df! {
            "fbs_item" => &[Some("Wheat and products"), None, Some("Rice")],
            "trade_commodity" => &[Some("Wheat"), Some("Barley"), None],
        }
        .unwrap();

        let mapping = name_mapping(
            &df,
            trade_names::TABLE,
            trade_names::FBS_ITEM,
            trade_names::TRADE_COMMODITY,
        )
        .unwrap();

        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.targets("Wheat and products"), ["Wheat".to_string()]);
    }

    #[test]
    fn test_summary_frame_columns() {
        let df = summary_frame(&[ImpactSummary {
            item: "Wheat".to_string(),
            total_impact: 1.5,
            total_consumption: 20.0,
        }])
        .unwrap();

        assert_eq!(
            df.get_column_names_str(),
            vec!["item", "total_impact", "total_consumption"]
        );
        assert_eq!(df.column("total_impact").unwrap().f64().unwrap().get(0), Some(1.5));
    }
}
