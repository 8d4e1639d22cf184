use crate::config::ConfigError;
use crate::enrich::EnrichError;
use crate::service::ServiceError;
use crate::source::SourceError;
use crate::translate::TranslationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Enrich(#[from] EnrichError),
    #[error(transparent)]
    Translation(#[from] TranslationError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

pub type Result<T> = std::result::Result<T, Error>;
