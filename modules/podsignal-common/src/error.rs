use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    /// A field name that is not in the field table. Always a programming error.
    #[error("Unknown profile field: {0}")]
    UnknownField(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
