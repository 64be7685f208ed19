use std::collections::HashMap;
use std::path::PathBuf;

use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::PyDataFrame;

use polars::prelude::DataFrame;

use crate::error::FootprintError;
use crate::io;
use crate::pipeline::{FootprintPipeline, PipelineConfig, PipelineInputs, PipelineOutput};
use crate::schema;

#[pyclass]
pub struct FootprintModel {
    base_path: PathBuf,
    config: PipelineConfig,
    food_balance: Option<DataFrame>,
    trade: Option<DataFrame>,
    trade_names: Option<DataFrame>,
    product_names: Option<DataFrame>,
    location_names: Option<DataFrame>,
    impact_factors: Option<DataFrame>,
    output: Option<PipelineOutput>,
}

#[pymethods]
impl FootprintModel {
    #[new]
    fn new(base_path: String, country: String, reference_year: i64) -> Self {
        Self {
            base_path: PathBuf::from(base_path),
            config: PipelineConfig::new(country, reference_year),
            food_balance: None,
            trade: None,
            trade_names: None,
            product_names: None,
            location_names: None,
            impact_factors: None,
            output: None,
        }
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Load food-balance triples (area, item, element, value, optional year).
    #[pyo3(signature = (filename=None, rename=None))]
    fn load_food_balance(
        &mut self,
        filename: Option<&str>,
        rename: Option<HashMap<String, String>>,
    ) -> PyResult<PyDataFrame> {
        let df = self.read(filename.unwrap_or("food_balance.csv"), rename)?;
        self.food_balance = Some(df.clone());
        self.output = None;
        Ok(PyDataFrame(df))
    }

    /// Load bilateral trade flows (exporter, commodity, weight, optional
    /// year and importer).
    #[pyo3(signature = (filename=None, rename=None))]
    fn load_trade(
        &mut self,
        filename: Option<&str>,
        rename: Option<HashMap<String, String>>,
    ) -> PyResult<PyDataFrame> {
        let df = self.read(filename.unwrap_or("trade.csv"), rename)?;
        self.trade = Some(df.clone());
        self.output = None;
        Ok(PyDataFrame(df))
    }

    #[pyo3(signature = (filename=None, rename=None))]
    fn load_trade_names(
        &mut self,
        filename: Option<&str>,
        rename: Option<HashMap<String, String>>,
    ) -> PyResult<PyDataFrame> {
        let df = self.read(filename.unwrap_or("trade_names.csv"), rename)?;
        self.trade_names = Some(df.clone());
        self.output = None;
        Ok(PyDataFrame(df))
    }

    #[pyo3(signature = (filename=None, rename=None))]
    fn load_product_names(
        &mut self,
        filename: Option<&str>,
        rename: Option<HashMap<String, String>>,
    ) -> PyResult<PyDataFrame> {
        let df = self.read(filename.unwrap_or("product_names.csv"), rename)?;
        self.product_names = Some(df.clone());
        self.output = None;
        Ok(PyDataFrame(df))
    }

    #[pyo3(signature = (filename=None, rename=None))]
    fn load_location_names(
        &mut self,
        filename: Option<&str>,
        rename: Option<HashMap<String, String>>,
    ) -> PyResult<PyDataFrame> {
        let df = self.read(filename.unwrap_or("location_names.csv"), rename)?;
        self.location_names = Some(df.clone());
        self.output = None;
        Ok(PyDataFrame(df))
    }

    #[pyo3(signature = (filename=None, rename=None))]
    fn load_impact_factors(
        &mut self,
        filename: Option<&str>,
        rename: Option<HashMap<String, String>>,
    ) -> PyResult<PyDataFrame> {
        let df = self.read(filename.unwrap_or("impact_factors.csv"), rename)?;
        self.impact_factors = Some(df.clone());
        self.output = None;
        Ok(PyDataFrame(df))
    }

    // ── Running ─────────────────────────────────────────────────────────────

    /// Run the footprint pipeline and return the per-item summary.
    fn run(&mut self) -> PyResult<PyDataFrame> {
        let inputs = PipelineInputs {
            food_balance: Self::loaded(&self.food_balance, "food_balance")?,
            trade: Self::loaded(&self.trade, "trade")?,
            trade_names: Self::loaded(&self.trade_names, "trade_names")?,
            product_names: Self::loaded(&self.product_names, "product_names")?,
            location_names: Self::loaded(&self.location_names, "location_names")?,
            impact_factors: Self::loaded(&self.impact_factors, "impact_factors")?,
        };
        let output = FootprintPipeline::new(self.config.clone()).run(&inputs)?;
        let summary = output.summary_frame()?;
        self.output = Some(output);
        Ok(PyDataFrame(summary))
    }

    /// Write the summary of the last run as CSV next to the inputs.
    #[pyo3(signature = (filename=None))]
    fn write_summary(&self, filename: Option<&str>) -> PyResult<()> {
        let mut df = self.output()?.summary_frame()?;
        let path = self.base_path.join(filename.unwrap_or("impact_summary.csv"));
        io::write_csv(&mut df, &path)?;
        Ok(())
    }

    // ── Properties ──────────────────────────────────────────────────────────

    #[getter]
    fn country(&self) -> String {
        self.config.country.clone()
    }

    #[getter]
    fn reference_year(&self) -> i64 {
        self.config.reference_year
    }

    #[getter]
    fn food_balance_df(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.output()?.food_balance_frame()?))
    }

    #[getter]
    fn splits_df(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.output()?.splits_frame()?))
    }

    #[getter]
    fn shares_df(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.output()?.shares_frame()?))
    }

    #[getter]
    fn attributed_df(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.output()?.attributed_frame()?))
    }

    #[getter]
    fn detail_df(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.output()?.detail_frame()?))
    }

    /// Coverage gaps of the last run as a dict of lists.
    #[getter]
    fn coverage(&self) -> PyResult<HashMap<String, Vec<String>>> {
        let coverage = &self.output()?.coverage;
        let pairs = coverage
            .pairs_without_factor
            .iter()
            .map(|(p, l)| format!("{p} @ {l}"))
            .collect();
        Ok(HashMap::from([
            ("undefined_ratio_items".to_string(), coverage.undefined_ratio_items.clone()),
            ("degenerate_commodities".to_string(), coverage.degenerate_commodities.clone()),
            (
                "items_without_trade_mapping".to_string(),
                coverage.items_without_trade_mapping.clone(),
            ),
            (
                "items_without_trade_shares".to_string(),
                coverage.items_without_trade_shares.clone(),
            ),
            ("items_without_product".to_string(), coverage.items_without_product.clone()),
            (
                "origins_without_location".to_string(),
                coverage.origins_without_location.clone(),
            ),
            ("pairs_without_factor".to_string(), pairs),
            ("ambiguous_names".to_string(), coverage.ambiguous_names.clone()),
        ]))
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

impl FootprintModel {
    fn read(
        &self,
        filename: &str,
        rename: Option<HashMap<String, String>>,
    ) -> Result<DataFrame, FootprintError> {
        io::read_table(&self.base_path.join(filename), rename.as_ref())
    }

    fn loaded(df: &Option<DataFrame>, name: &str) -> Result<DataFrame, FootprintError> {
        df.clone()
            .ok_or_else(|| FootprintError::NotLoaded(name.to_string()))
    }

    fn output(&self) -> Result<&PipelineOutput, FootprintError> {
        self.output
            .as_ref()
            .ok_or_else(|| FootprintError::NotLoaded("run() has not been called".into()))
    }
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Food balance
    let food_balance = PyModule::new(m.py(), "food_balance")?;
    food_balance.add("AREA", schema::food_balance::AREA)?;
    food_balance.add("ITEM", schema::food_balance::ITEM)?;
    food_balance.add("ELEMENT", schema::food_balance::ELEMENT)?;
    food_balance.add("VALUE", schema::food_balance::VALUE)?;
    food_balance.add("YEAR", schema::food_balance::YEAR)?;
    m.add_submodule(&food_balance)?;

    // Elements
    let element = PyModule::new(m.py(), "element")?;
    element.add("PRODUCTION", schema::element::PRODUCTION)?;
    element.add("IMPORT_QUANTITY", schema::element::IMPORT_QUANTITY)?;
    element.add("EXPORT_QUANTITY", schema::element::EXPORT_QUANTITY)?;
    element.add("FOOD_SUPPLY", schema::element::FOOD_SUPPLY)?;
    m.add_submodule(&element)?;

    // Trade
    let trade = PyModule::new(m.py(), "trade")?;
    trade.add("EXPORTER", schema::trade::EXPORTER)?;
    trade.add("IMPORTER", schema::trade::IMPORTER)?;
    trade.add("COMMODITY", schema::trade::COMMODITY)?;
    trade.add("WEIGHT", schema::trade::WEIGHT)?;
    trade.add("YEAR", schema::trade::YEAR)?;
    m.add_submodule(&trade)?;

    // Name matching
    let names = PyModule::new(m.py(), "names")?;
    names.add("FBS_ITEM", schema::trade_names::FBS_ITEM)?;
    names.add("TRADE_COMMODITY", schema::trade_names::TRADE_COMMODITY)?;
    names.add("IMPACT_PRODUCT", schema::product_names::IMPACT_PRODUCT)?;
    names.add("COUNTRY", schema::location_names::COUNTRY)?;
    names.add("IMPACT_LOCATION", schema::location_names::IMPACT_LOCATION)?;
    m.add_submodule(&names)?;

    // Impact factors
    let impact_factors = PyModule::new(m.py(), "impact_factors")?;
    impact_factors.add("PRODUCT", schema::impact_factors::PRODUCT)?;
    impact_factors.add("LOCATION", schema::impact_factors::LOCATION)?;
    impact_factors.add("IMPACT_FACTOR", schema::impact_factors::IMPACT_FACTOR)?;
    m.add_submodule(&impact_factors)?;

    // Summary
    let summary = PyModule::new(m.py(), "summary")?;
    summary.add("ITEM", schema::summary::ITEM)?;
    summary.add("TOTAL_IMPACT", schema::summary::TOTAL_IMPACT)?;
    summary.add("TOTAL_CONSUMPTION", schema::summary::TOTAL_CONSUMPTION)?;
    m.add_submodule(&summary)?;

    Ok(())
}

#[pymodule]
#[pyo3(name = "_core")]
fn core_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<FootprintModel>()?;
    add_schema_exports(m)?;
    Ok(())
}
