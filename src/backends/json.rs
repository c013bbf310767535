use crate::error::Result;
use crate::report::AnalysisResult;

use super::ReportBackend;

/// The full report as pretty-printed JSON.
pub struct JsonBackend;

impl ReportBackend for JsonBackend {
    fn name(&self) -> &str {
        "JSON"
    }

    fn serialize(&self, result: &AnalysisResult) -> Result<String> {
        let mut out = serde_json::to_string_pretty(result)?;
        out.push('\n');
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::extract_css;

    fn result() -> AnalysisResult {
        let inventory = extract_css(":root { --fg: #222; } p { color: var(--fg); font-family: Georgia; }");
        AnalysisResult::new("https://example.com/", inventory, &[])
    }

    #[test]
    fn output_is_valid_json() {
        let output = JsonBackend.serialize(&result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["summary"]["total_unique_colors"], 1);
        assert_eq!(value["summary"]["total_css_variables"], 1);
        assert_eq!(value["css_variables"]["--fg"], "#222");
        assert_eq!(value["colors"]["#222222"]["css_variables"][0], "--fg");
        assert!(value["fonts"]["Georgia"].is_object());
    }

    #[test]
    fn empty_samples_give_null_tokens() {
        let output = JsonBackend.serialize(&result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        let tokens = value["design_tokens"].as_object().unwrap();
        assert_eq!(tokens.len(), 9);
        assert!(tokens.values().all(|v| v.is_null()));
        assert!(value["ranked_colors"].as_object().unwrap().is_empty());
    }

    #[test]
    fn write_to_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        JsonBackend.write_to(&result(), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("}\n"));
    }
}
