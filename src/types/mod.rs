// ABOUTME: Validated domain types shared across modules.
// ABOUTME: Colors, color pairs, and supervisor domain names.

mod color;
mod domain_name;

pub use color::{Color, ColorError, ColorPair};
pub use domain_name::{DomainName, DomainNameError};
