//! SQL text for the SQLite session: quoted identifiers, values as parameters.

pub mod builder;
pub mod params;
mod selection;
pub use params::*;
pub use selection::Selection;
pub use builder::Statement;
