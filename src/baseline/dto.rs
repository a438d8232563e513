use serde::Deserialize;
use time::Date;

#[derive(Debug, Default, Deserialize)]
pub struct StartBaselineRequest {
    #[serde(default, with = "crate::dates::iso_date::option")]
    pub start_date: Option<Date>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BaselineExitRequest {
    #[serde(default, with = "crate::dates::iso_date::option")]
    pub as_of: Option<Date>,
}
