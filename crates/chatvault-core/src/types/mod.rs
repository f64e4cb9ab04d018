//! Common type definitions for ChatVault.

mod identifiers;
mod platform;
mod records;

pub use identifiers::*;
pub use platform::*;
pub use records::*;
