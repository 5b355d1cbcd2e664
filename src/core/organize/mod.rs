//! Media organization module.
//!
//! Classifies files by extension, names them from their resolved date and
//! fingerprint, and copies them into `<Category>/<YYYY-MM>/` folders.

mod attributes;
mod executor;
mod planner;
mod types;

pub use executor::OrganizeExecutor;
pub use planner::{OrganizePlanner, FINGERPRINT_PREFIX_LEN};
pub use types::*;
