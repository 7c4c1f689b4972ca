use thiserror::Error;

pub type EsResult<T> = Result<T, EsError>;

#[derive(Error, Debug)]
pub enum EsError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Negative value for {what}: {value}")]
    Negative { what: &'static str, value: f64 },
}
