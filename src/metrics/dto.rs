use serde::Deserialize;
use time::Date;

#[derive(Debug, Default, Deserialize)]
pub struct RecalculateRequest {
    #[serde(default, with = "crate::dates::iso_date::option")]
    pub date: Option<Date>,
}
