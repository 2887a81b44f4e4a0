pub mod error;
pub mod plan;
pub mod schedule;
pub mod types;

#[cfg(feature = "purchase")]
pub mod purchase;

#[cfg(feature = "irs_limit")]
pub mod irs_limit;

#[cfg(feature = "market_data")]
pub mod market_data;

#[cfg(feature = "offering")]
pub mod offering;

pub use error::EsppError;
pub use types::*;

/// Standard result type for all ESPP operations
pub type EsppResult<T> = Result<T, EsppError>;
