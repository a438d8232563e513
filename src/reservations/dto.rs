use serde::Deserialize;
use time::Date;

#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    pub planned_kcal: f64,
    pub note: Option<String>,
    #[serde(default, with = "crate::dates::iso_date::option")]
    pub as_of: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustedBudgetQuery {
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
}
