//! swiftcheck fixtures
//!
//! The regression fixture table for the SwiftTranslator suite: literal
//! Singlish inputs paired with the exact Sinhala text the site is expected to
//! render, grouped into positive, negative and UI categories.
//!
//! The table is a versioned YAML document. A copy is compiled into this crate
//! ([`FixtureTable::bundled`]); alternative revisions can be loaded from disk
//! with [`FixtureTable::from_file`].

pub mod error;
pub mod table;
pub mod types;

pub use error::{FixtureError, Result};
pub use table::{FixtureTable, Selection, FORMAT_VERSION};
pub use types::{Category, Fixture, InputLength};
