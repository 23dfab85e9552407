use records::HealthSample;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One line of an import file: `prn,date,spo2,heart_rate[,weight]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub prn: String,
    pub date: String,
    pub sample: HealthSample,
}

#[derive(Error, Debug, PartialEq)]
pub enum RowError {
    #[error("expected 4 or 5 comma separated fields, found {0}")]
    FieldCount(usize),

    #[error("PRN must contain only numbers: {0:?}")]
    Prn(String),

    #[error("date must be YYYY-MM-DD: {0:?}")]
    Date(String),

    #[error("SpO2 must be a percentage between 0 and 100: {0:?}")]
    OxygenSaturation(String),

    #[error("heart rate must be a positive number of beats per minute: {0:?}")]
    HeartRate(String),

    #[error("weight must be a positive number of kilograms: {0:?}")]
    Weight(String),
}
