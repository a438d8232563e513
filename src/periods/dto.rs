use serde::Deserialize;
use time::Date;

#[derive(Debug, Default, Deserialize)]
pub struct RotateRequest {
    #[serde(default, with = "crate::dates::iso_date::option")]
    pub as_of: Option<Date>,
}
