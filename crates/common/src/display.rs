//! Human-readable renderings shared by every front end

use crate::models::{GenerateResponse, Usage};

/// Sizes the way the document lists show them: `0 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Usage figures of a generation, with absent usage reading as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageSummary {
    pub model: String,
    pub total_tokens: u64,
    pub cost: f64,
}

impl UsageSummary {
    pub fn from_usage(usage: Option<&Usage>) -> Self {
        match usage {
            Some(usage) => Self {
                model: if usage.model.is_empty() {
                    "Unknown".to_string()
                } else {
                    usage.model.clone()
                },
                total_tokens: usage.input_tokens + usage.output_tokens,
                cost: usage.cost,
            },
            None => Self {
                model: "Unknown".to_string(),
                total_tokens: 0,
                cost: 0.0,
            },
        }
    }

    /// Cost rounded to four decimals, e.g. `$0.0012`.
    pub fn cost_display(&self) -> String {
        format!("${:.4}", self.cost)
    }
}

const NO_PREVIEW: &str = "(no preview)";

/// Multi-line report of a finished generation.
pub fn generation_report(result: &GenerateResponse, download_url: &str) -> String {
    let usage = UsageSummary::from_usage(result.usage.as_ref());
    let preview = result
        .preview
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(NO_PREVIEW);

    format!(
        "File:     {}\nFormat:   {}\nModel:    {}\nTokens:   {}\nCost:     {}\nDownload: {}\n\n{}",
        result.filename,
        result.format,
        usage.model,
        usage.total_tokens,
        usage.cost_display(),
        download_url,
        preview
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
    }

    #[test]
    fn test_missing_usage_reads_as_zero() {
        let summary = UsageSummary::from_usage(None);
        assert_eq!(summary.model, "Unknown");
        assert_eq!(summary.total_tokens, 0);
        assert_eq!(summary.cost_display(), "$0.0000");
    }

    #[test]
    fn test_cost_rounds_to_four_places() {
        let usage = Usage {
            model: "gpt-4o-mini".into(),
            input_tokens: 1200,
            output_tokens: 800,
            cost: 0.000_876_5,
        };
        let summary = UsageSummary::from_usage(Some(&usage));
        assert_eq!(summary.total_tokens, 2000);
        assert_eq!(summary.cost_display(), "$0.0009");
    }

    #[test]
    fn test_report_uses_placeholder_preview() {
        let result = GenerateResponse {
            filename: "out.pdf".into(),
            format: "pdf".into(),
            usage: None,
            preview: None,
        };
        let report = generation_report(&result, "http://127.0.0.1:5000/api/download/out.pdf");
        assert!(report.contains("out.pdf"));
        assert!(report.contains("$0.0000"));
        assert!(report.ends_with(NO_PREVIEW));
    }
}
