pub mod css;
pub mod json;

use std::path::Path;

use crate::error::{Error, Result};
use crate::report::AnalysisResult;

pub use css::CssBackend;
pub use json::JsonBackend;

/// An output format for a finished analysis.
pub trait ReportBackend {
    fn name(&self) -> &str;

    fn serialize(&self, result: &AnalysisResult) -> Result<String>;

    fn write_to(&self, result: &AnalysisResult, path: &Path) -> Result<()> {
        let content = self.serialize(result)?;
        std::fs::write(path, content).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
