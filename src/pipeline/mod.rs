//! Analysis stages, leaves first: CSS extraction and categorization on the
//! static side, then filtering, ranking and token inference on the rendered
//! samples.

pub mod categorize;
pub mod extract;
pub mod filter;
pub mod rank;
pub mod tokens;
