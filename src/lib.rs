//! Website color and typography extraction with design-token inference.
//!
//! Static CSS is scanned into a color and font inventory; rendered element
//! samples are filtered and ranked by visual salience; a small set of design
//! tokens is inferred from the ranking.

pub mod analyze;
pub mod backends;
pub mod cli;
pub mod color;
pub mod error;
pub mod page;
pub mod pipeline;
pub mod report;
pub mod sample;

pub use analyze::{Analyzer, AnalyzerConfig};
pub use color::Color;
pub use error::{Error, Result};
pub use report::AnalysisResult;
