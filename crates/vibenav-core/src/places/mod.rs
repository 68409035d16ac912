//! Place data model
//!
//! Places and their reviews are written by the scraping phase as one JSON
//! array per (category, city) and read wholesale here.

mod catalog;
mod model;

pub use catalog::*;
pub use model::*;
