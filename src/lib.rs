//! Location-specific biodiversity footprint of a country's food consumption.
//!
//! Food-balance statistics are split into domestic and imported supply,
//! imports are apportioned over exporting countries by trade share, and the
//! attributed quantities are multiplied by biodiversity impact factors keyed
//! by (product, location). See [`pipeline::FootprintPipeline`].

pub mod attribution;
pub mod consumption;
pub mod error;
pub mod frame;
pub mod impact;
pub mod io;
pub mod pipeline;
pub mod reconcile;
pub mod schema;
pub mod trade;

#[cfg(feature = "python")]
mod python;

pub use attribution::{AttributedSupply, SupplyFlag};
pub use consumption::{ConsumptionSplit, FoodBalanceRecord, FoodBalanceRow};
pub use error::{FootprintError, Result};
pub use impact::{ImpactFactor, ImpactResult, ImpactSummary};
pub use pipeline::{
    CoverageReport, FootprintPipeline, PipelineConfig, PipelineInputs, PipelineOutput,
    PipelineTables,
};
pub use reconcile::{normalize_name, NameMapping, NameMatch};
pub use trade::{TradeFlowRow, TradeShare};
