use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("sqlite store error: {0}")]
  Sqlite(#[from] gatepass_store_sqlite::Error),

  #[error("local store error: {0}")]
  Local(#[from] gatepass_store_local::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
