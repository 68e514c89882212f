use serde::{Deserialize, Serialize};

/// Per-bike pricing as served by the rate catalog. Amounts are whole
/// currency units. `rate_per_7_days` is an optional discounted weekly rate;
/// when absent, weekly pricing falls back to seven daily rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSheet {
    pub rate_per_hour: i64,
    pub rate_per_day: i64,
    pub rate_per_7_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bike {
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    #[serde(flatten)]
    pub rates: RateSheet,
}
