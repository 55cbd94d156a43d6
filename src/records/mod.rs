//! Destination record types
//!
//! One struct per destination table. Each is built by a validating transform
//! that returns `None` when the row cannot produce its conflict key, so bad
//! rows go to the drop count instead of the write.
//!
//! # Tables
//!
//! | record        | table          | conflict key |
//! |---------------|----------------|--------------|
//! | [`Building`]  | buildings      | bbl          |
//! | [`Listing`]   | listings       | url          |
//! | [`IntelScore`]| intel_current  | bbl          |
//! | [`PlutoParcel`]| pluto_raw     | bbl          |
//! | [`DobPermit`] | dob_permits    | source_id    |

mod bbl;
mod csv_tables;
mod fields;
mod socrata;
mod types;

pub use bbl::{borough_code, derive_bbl, normalize_bbl};
pub use csv_tables::{Building, IntelScore, Listing};
pub use fields::FieldSource;
pub use socrata::{DobPermit, PlutoParcel};
pub use types::{CsvRecord, PagedRecord, TableRecord};
