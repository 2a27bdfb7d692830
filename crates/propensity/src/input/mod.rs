//! Raw table input, layout and delimited-text loading.

mod layout;
mod parser;
mod source;

pub use layout::{TableLayout, detect_first_respondent_row};
pub use parser::{Parser, ParserConfig};
pub use source::{Cell, RawTable, SourceMetadata};
