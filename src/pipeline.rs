//! End-to-end footprint run: split → apportion → attribute → join → sum.

use polars::prelude::DataFrame;
use tracing::{info, warn};

use crate::attribution::{attribute_origins, AttributedSupply};
use crate::consumption::{
    pivot_food_balance, split_consumption, ConsumptionSplit, FoodBalanceRecord, FoodBalanceRow,
};
use crate::error::Result;
use crate::frame;
use crate::impact::{
    impact_gaps, join_impact_factors, summarize, ImpactFactor, ImpactFactorTable, ImpactResult,
    ImpactSummary,
};
use crate::reconcile::{normalize_name, NameMapping};
use crate::schema::{location_names, product_names, trade_names};
use crate::trade::{apportion, filter_flows, TradeFlowRow, TradeShare, TradeShares};

/// Parameters of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Consuming country; selects the food-balance area and trade importer.
    pub country: String,
    /// Year kept from the food-balance and trade tables.
    pub reference_year: i64,
}

impl PipelineConfig {
    pub fn new(country: impl Into<String>, reference_year: i64) -> Self {
        Self {
            country: country.into(),
            reference_year,
        }
    }
}

/// The six input tables as polars frames.
#[derive(Clone)]
pub struct PipelineInputs {
    pub food_balance: DataFrame,
    pub trade: DataFrame,
    pub trade_names: DataFrame,
    pub product_names: DataFrame,
    pub location_names: DataFrame,
    pub impact_factors: DataFrame,
}

impl PipelineInputs {
    /// Validate every frame and convert it to typed rows.
    ///
    /// All schemas are checked before any computation starts.
    pub fn to_tables(&self) -> Result<PipelineTables> {
        Ok(PipelineTables {
            food_balance: frame::food_balance_records(&self.food_balance)?,
            trade: frame::trade_flows(&self.trade)?,
            trade_names: frame::name_mapping(
                &self.trade_names,
                trade_names::TABLE,
                trade_names::FBS_ITEM,
                trade_names::TRADE_COMMODITY,
            )?,
            product_names: frame::name_mapping(
                &self.product_names,
                product_names::TABLE,
                product_names::FBS_ITEM,
                product_names::IMPACT_PRODUCT,
            )?,
            location_names: frame::name_mapping(
                &self.location_names,
                location_names::TABLE,
                location_names::COUNTRY,
                location_names::IMPACT_LOCATION,
            )?,
            impact_factors: frame::impact_factors(&self.impact_factors)?,
        })
    }
}

/// The six input tables as typed rows.
#[derive(Debug, Clone, Default)]
pub struct PipelineTables {
    pub food_balance: Vec<FoodBalanceRecord>,
    pub trade: Vec<TradeFlowRow>,
    pub trade_names: NameMapping,
    pub product_names: NameMapping,
    pub location_names: NameMapping,
    pub impact_factors: Vec<ImpactFactor>,
}

/// Join gaps of one run. Every list is sorted and free of duplicates.
///
/// `ambiguous_names` is informational: names with several mapping targets
/// fan out into one row per target and do not make a run incomplete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageReport {
    pub undefined_ratio_items: Vec<String>,
    pub degenerate_commodities: Vec<String>,
    pub items_without_trade_mapping: Vec<String>,
    pub items_without_trade_shares: Vec<String>,
    pub items_without_product: Vec<String>,
    pub origins_without_location: Vec<String>,
    pub pairs_without_factor: Vec<(String, String)>,
    pub ambiguous_names: Vec<String>,
}

impl CoverageReport {
    pub fn is_complete(&self) -> bool {
        self.undefined_ratio_items.is_empty()
            && self.degenerate_commodities.is_empty()
            && self.items_without_trade_mapping.is_empty()
            && self.items_without_trade_shares.is_empty()
            && self.items_without_product.is_empty()
            && self.origins_without_location.is_empty()
            && self.pairs_without_factor.is_empty()
    }
}

/// Every table produced by a run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub food_balance: Vec<FoodBalanceRow>,
    pub splits: Vec<ConsumptionSplit>,
    pub shares: Vec<TradeShare>,
    pub attributed: Vec<AttributedSupply>,
    pub detail: Vec<ImpactResult>,
    pub summary: Vec<ImpactSummary>,
    pub coverage: CoverageReport,
}

impl PipelineOutput {
    pub fn summary_frame(&self) -> Result<DataFrame> {
        frame::summary_frame(&self.summary)
    }

    pub fn attributed_frame(&self) -> Result<DataFrame> {
        frame::attributed_frame(&self.attributed)
    }

    pub fn detail_frame(&self) -> Result<DataFrame> {
        frame::detail_frame(&self.detail)
    }

    pub fn splits_frame(&self) -> Result<DataFrame> {
        frame::splits_frame(&self.splits)
    }

    pub fn shares_frame(&self) -> Result<DataFrame> {
        frame::shares_frame(&self.shares)
    }

    pub fn food_balance_frame(&self) -> Result<DataFrame> {
        frame::food_balance_frame(&self.food_balance)
    }
}

pub struct FootprintPipeline {
    config: PipelineConfig,
}

impl FootprintPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Parameters this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run on polars frames. Fails only on schema or parse errors.
    pub fn run(&self, inputs: &PipelineInputs) -> Result<PipelineOutput> {
        let tables = inputs.to_tables()?;
        Ok(self.run_tables(&tables))
    }

    /// Run on typed rows. Arithmetic edge cases and unmatched names never
    /// fail; they show up in [`PipelineOutput::coverage`].
    pub fn run_tables(&self, tables: &PipelineTables) -> PipelineOutput {
        let PipelineConfig {
            country,
            reference_year,
        } = &self.config;

        let food_balance = pivot_food_balance(&tables.food_balance, country, *reference_year);
        let splits = split_consumption(&food_balance);
        info!(
            %country,
            year = reference_year,
            items = splits.len(),
            "split consumption into domestic and imported supply"
        );

        let flows = filter_flows(&tables.trade, country, *reference_year);
        let apportionment = apportion(&flows);
        info!(
            flows = flows.len(),
            shares = apportionment.shares.len(),
            degenerate = apportionment.degenerate.len(),
            "apportioned trade flows"
        );

        let trade_shares = TradeShares::new(&apportionment.shares);
        let attribution = attribute_origins(&splits, &tables.trade_names, &trade_shares);
        info!(rows = attribution.rows.len(), "attributed supply to origins");

        let factors = ImpactFactorTable::new(&tables.impact_factors);
        let detail = join_impact_factors(
            &attribution.rows,
            &tables.product_names,
            &tables.location_names,
            &factors,
        );
        let summary = summarize(&attribution.rows, &detail);
        info!(
            detail = detail.len(),
            items = summary.len(),
            "aggregated impact per item"
        );

        let gaps = impact_gaps(&detail);
        let ambiguous_names = collect_ambiguous(&attribution.rows, tables);
        let coverage = CoverageReport {
            undefined_ratio_items: sorted(
                splits
                    .iter()
                    .filter(|s| s.is_undefined())
                    .map(|s| s.item.clone())
                    .collect(),
            ),
            degenerate_commodities: sorted(apportionment.degenerate),
            items_without_trade_mapping: sorted(attribution.unmapped_items),
            items_without_trade_shares: sorted(attribution.items_without_shares),
            items_without_product: gaps.items_without_product,
            origins_without_location: gaps.origins_without_location,
            pairs_without_factor: gaps.pairs_without_factor,
            ambiguous_names,
        };
        if !coverage.is_complete() {
            warn!(
                undefined_ratio = coverage.undefined_ratio_items.len(),
                degenerate = coverage.degenerate_commodities.len(),
                no_trade_mapping = coverage.items_without_trade_mapping.len(),
                no_trade_shares = coverage.items_without_trade_shares.len(),
                no_product = coverage.items_without_product.len(),
                no_location = coverage.origins_without_location.len(),
                no_factor = coverage.pairs_without_factor.len(),
                "footprint has coverage gaps"
            );
        }
        if !coverage.ambiguous_names.is_empty() {
            info!(
                names = coverage.ambiguous_names.len(),
                "ambiguous name mappings fanned out"
            );
        }

        PipelineOutput {
            food_balance,
            splits,
            shares: apportionment.shares,
            attributed: attribution.rows,
            detail,
            summary,
            coverage,
        }
    }
}

/// Items and origins of the fact table with more than one mapping target.
fn collect_ambiguous(fact: &[AttributedSupply], tables: &PipelineTables) -> Vec<String> {
    let mut names = Vec::new();
    for row in fact {
        let lookups = [
            (&tables.trade_names, row.item.as_str()),
            (&tables.product_names, row.item.as_str()),
            (&tables.location_names, row.origin_country.as_str()),
        ];
        for (mapping, name) in lookups {
            if mapping.lookup(name).is_ambiguous() {
                names.push(normalize_name(name));
            }
        }
    }
    sorted(names)
}

fn sorted(mut values: Vec<String>) -> Vec<String> {
    values.sort();
    values.dedup();
    values
}
