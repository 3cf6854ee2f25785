//! Storefront Common Types
//!
//! Currency codes, currency metadata and monetary amounts shared by the
//! pricing crates.

pub mod currency;
pub mod monetary;
pub mod error;

pub use currency::*;
pub use monetary::*;
pub use error::*;
