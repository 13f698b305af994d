//! # eroi-io: Pipeline Data Files
//!
//! - [`tsv`]: multi-level-header matrices (`A.txt`, `Y.txt`, extensions, results)
//! - [`records`]: row tables read and written through `serde`
//! - [`layout`]: where each year's inputs and outputs live under the data root

pub mod layout;
pub mod records;
pub mod tsv;

pub use layout::DataLayout;
pub use records::{delimiter_for, read_records, read_region_codes, read_region_table, write_records};
pub use tsv::{format_matrix, parse_matrix, read_matrix, write_matrix};
