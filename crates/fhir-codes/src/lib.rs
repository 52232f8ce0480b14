//! Terminology lookups shared read-only by every worker.
//!
//! - [`CodeLookup`]: diagnosis code descriptions from the published code list.
//! - [`ProcedureCodeTable`]: procedure code short descriptions.

pub mod error;
pub mod lookup;
pub mod procedures;
pub mod source;

pub use error::{CodesError, Result};
pub use lookup::{CodeLookup, normalize_code};
pub use procedures::ProcedureCodeTable;
pub use source::{CodeSource, DEFAULT_CODES_MEMBER, DEFAULT_CODES_URL, load, read_member, try_load};
