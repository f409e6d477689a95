//! Table loading from delimited text.

mod table;

pub(crate) use table::is_missing_token;
pub use table::{parse_delimiter, RawTable};
