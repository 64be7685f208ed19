/// Column-name constants for the footprint input and output tables.
/// Single source of truth - exported to Python via PyO3.

// ── Food balance triples ────────────────────────────────────────────────────
pub mod food_balance {
    pub const TABLE: &str = "food balance";
    pub const AREA: &str = "area";
    pub const ITEM: &str = "item";
    pub const ELEMENT: &str = "element";
    pub const VALUE: &str = "value";
    pub const YEAR: &str = "year";
}

// ── Element values ──────────────────────────────────────────────────────────
pub mod element {
    pub const PRODUCTION: &str = "Production";
    pub const IMPORT_QUANTITY: &str = "Import Quantity";
    pub const EXPORT_QUANTITY: &str = "Export Quantity";
    pub const FOOD_SUPPLY: &str = "Food supply quantity (kg/capita/yr)";
}

// ── Bilateral trade flows ───────────────────────────────────────────────────
pub mod trade {
    pub const TABLE: &str = "trade";
    pub const EXPORTER: &str = "exporter";
    pub const IMPORTER: &str = "importer";
    pub const COMMODITY: &str = "commodity";
    pub const WEIGHT: &str = "weight";
    pub const YEAR: &str = "year";
}

// ── Name matching tables ────────────────────────────────────────────────────
pub mod trade_names {
    pub const TABLE: &str = "trade-name mapping";
    pub const FBS_ITEM: &str = "fbs_item";
    pub const TRADE_COMMODITY: &str = "trade_commodity";
}

pub mod product_names {
    pub const TABLE: &str = "product mapping";
    pub const FBS_ITEM: &str = "fbs_item";
    pub const IMPACT_PRODUCT: &str = "impact_product";
}

pub mod location_names {
    pub const TABLE: &str = "location mapping";
    pub const COUNTRY: &str = "country";
    pub const IMPACT_LOCATION: &str = "impact_location";
}

// ── Impact factors ──────────────────────────────────────────────────────────
pub mod impact_factors {
    pub const TABLE: &str = "impact factor";
    pub const PRODUCT: &str = "product";
    pub const LOCATION: &str = "location";
    pub const IMPACT_FACTOR: &str = "impact_factor";
}

// ── Derived tables ──────────────────────────────────────────────────────────
pub mod split {
    pub const ITEM: &str = "item";
    pub const AREA: &str = "area";
    pub const IMPORT_RATIO: &str = "import_ratio";
    pub const DOMESTIC_SUPPLY: &str = "domestic_supply";
    pub const IMPORTED_SUPPLY: &str = "imported_supply";
}

pub mod shares {
    pub const COMMODITY: &str = "commodity";
    pub const EXPORTER: &str = "exporter";
    pub const TOTAL_WEIGHT: &str = "total_weight";
    pub const PERCENTAGE: &str = "percentage";
}

pub mod attributed {
    pub const ITEM: &str = "item";
    pub const CONSUMING_AREA: &str = "consuming_area";
    pub const ORIGIN_COUNTRY: &str = "origin_country";
    pub const SUPPLY_QUANTITY: &str = "supply_quantity";
    pub const FLAG: &str = "flag";
}

pub mod detail {
    pub const IMPACT_PRODUCT: &str = "impact_product";
    pub const IMPACT_LOCATION: &str = "impact_location";
    pub const IMPACT_FACTOR: &str = "impact_factor";
    pub const TOTAL_IMPACT: &str = "total_impact";
}

pub mod summary {
    pub const ITEM: &str = "item";
    pub const TOTAL_IMPACT: &str = "total_impact";
    pub const TOTAL_CONSUMPTION: &str = "total_consumption";
}

// ── Flag values ─────────────────────────────────────────────────────────────
pub mod flag {
    pub const DOMESTIC: &str = "domestic";
    pub const IMPORTED: &str = "imported";
}
