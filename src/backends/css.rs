use crate::error::Result;
use crate::report::AnalysisResult;

use super::ReportBackend;

/// Custom-property prefix for emitted tokens.
const PREFIX: &str = "--site";

/// The inferred tokens as a `:root` block of custom properties.
pub struct CssBackend;

impl ReportBackend for CssBackend {
    fn name(&self) -> &str {
        "CSS"
    }

    fn serialize(&self, result: &AnalysisResult) -> Result<String> {
        let mut out = String::new();
        out.push_str(&format!("/* Design tokens for {} */\n", result.url()));
        out.push_str(":root {\n");
        for (name, value) in result.tokens().iter() {
            let property = format!("{PREFIX}-{}", name.css_name());
            match value {
                Some(color) => out.push_str(&format!("  {property}: {};\n", color.to_hex())),
                None => out.push_str(&format!("  /* {property}: not inferred */\n")),
            }
        }
        out.push_str("}\n");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::StyleInventory;
    use crate::sample::{ComputedStyleSample, ElementRole};

    fn result(samples: &[ComputedStyleSample]) -> AnalysisResult {
        AnalysisResult::new("https://example.com/", StyleInventory::default(), samples)
    }

    #[test]
    fn present_tokens_become_properties() {
        let output = CssBackend
            .serialize(&result(&[ComputedStyleSample::new(ElementRole::Body, 800.0, 600.0)
                .with_background("rgb(250, 250, 250)")]))
            .unwrap();
        assert!(output.contains("  --site-widget-bg: #fafafa;\n"));
        assert!(output.contains("  --site-bot-bubble-bg: #fafafa;\n"));
        assert!(output.contains("  /* --site-accent: not inferred */\n"));
    }

    #[test]
    fn absent_tokens_are_comments_only() {
        let output = CssBackend.serialize(&result(&[])).unwrap();
        assert!(output.starts_with("/* Design tokens for https://example.com/ */\n:root {\n"));
        assert!(output.ends_with("}\n"));
        // no declarations, one comment per token
        assert!(!output.lines().any(|l| l.trim_start().starts_with("--")));
        assert_eq!(output.matches("not inferred").count(), 9);
    }
}
