use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("Invalid panel shape: {0}")]
    InputShape(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Calculation error: {0}")]
    Calculation(String),

    #[error("Detector error: {0}")]
    Detector(String),
}
