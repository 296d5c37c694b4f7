//! Transformation stages.
//!
//! - Columns: placeholder column removal
//! - Normalize: text trimming and amount canonicalization
//! - Coerce: typing and account-key validation
//! - Noise: total row removal
//! - Pipeline: stage orchestration

pub mod coerce;
pub mod columns;
pub mod noise;
pub mod normalize;
pub mod pipeline;

pub use coerce::{coerce_types, parse_number};
pub use columns::{is_placeholder_column, sanitize_columns};
pub use noise::remove_noise_rows;
pub use normalize::{canonical_number, normalize_table};
pub use pipeline::*;
