pub mod batch;
pub mod error;
pub mod feed;
pub mod revision;
pub mod sink;

pub type BoostfeedResult<T> = std::result::Result<T, error::BoostfeedError>;
