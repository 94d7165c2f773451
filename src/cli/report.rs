//! Console report
//!
//! Prints the model response followed by the usage reported in the
//! response metadata and the usage observed on the wire.

use crossterm::style::Stylize;
use std::fmt::{self, Write};
use tokendiff_core::ChatTokenUsage;
use tokendiff_llm::{RateLimitSnapshot, UsageSummary};

/// Everything printed after a run
pub struct Report<'a> {
    pub response: &'a str,
    pub kernel_usage: Option<ChatTokenUsage>,
    pub http_usage: UsageSummary,
    pub rate_limit: Option<RateLimitSnapshot>,
}

impl Report<'_> {
    /// Render the report; headings are coloured when `color` is set
    pub fn render(&self, color: bool) -> Result<String, fmt::Error> {
        let mut out = String::new();
        self.write_to(&mut out, color)?;
        Ok(out)
    }

    fn write_to(&self, out: &mut String, color: bool) -> fmt::Result {
        let heading = |text: &str, paint: fn(&str) -> String| {
            if color {
                paint(text)
            } else {
                text.to_string()
            }
        };

        writeln!(out, "#RESPONSE")?;
        writeln!(out, "{}", self.response)?;

        writeln!(
            out,
            "{}",
            heading("#Token Usage from Kernel Metadata", |t| t.magenta().to_string())
        )?;
        let usage = self.kernel_usage;
        write_counts(
            out,
            usage.map(|u| u.input_token_count.to_string()),
            usage.map(|u| u.output_token_count.to_string()),
            usage.map(|u| u.total_token_count.to_string()),
        )?;

        writeln!(
            out,
            "{}",
            heading("#Token Usage from HTTP Client", |t| t.yellow().to_string())
        )?;
        write_counts(
            out,
            Some(self.http_usage.input_tokens.to_string()),
            Some(self.http_usage.output_tokens.to_string()),
            Some(self.http_usage.total_tokens.to_string()),
        )?;

        if let Some(snapshot) = &self.rate_limit {
            writeln!(out, "#Rate Limit")?;
            writeln!(
                out,
                "Remaining requests : {} / Remaining tokens : {}",
                optional(snapshot.requests_remaining),
                optional(snapshot.tokens_remaining)
            )?;
        }

        Ok(())
    }
}

fn write_counts(
    out: &mut String,
    input: Option<String>,
    output: Option<String>,
    total: Option<String>,
) -> fmt::Result {
    writeln!(out, "Input token : {}", input.unwrap_or_default())?;
    writeln!(out, "Output token : {}", output.unwrap_or_default())?;
    writeln!(out, "Total token : {}", total.unwrap_or_default())
}

fn optional(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    fn summary(input: u64, output: u64, total: u64) -> UsageSummary {
        UsageSummary {
            calls: 2,
            input_tokens: input,
            output_tokens: output,
            total_tokens: total,
        }
    }

    #[test]
    fn test_render_plain() {
        let report = Report {
            response: "The Table Lamp is now on.",
            kernel_usage: Some(ChatTokenUsage {
                input_token_count: 150,
                output_token_count: 10,
                total_token_count: 160,
            }),
            http_usage: summary(250, 30, 280),
            rate_limit: None,
        };

        assert_eq!(
            report.render(false).unwrap(),
            "#RESPONSE\n\
             The Table Lamp is now on.\n\
             #Token Usage from Kernel Metadata\n\
             Input token : 150\n\
             Output token : 10\n\
             Total token : 160\n\
             #Token Usage from HTTP Client\n\
             Input token : 250\n\
             Output token : 30\n\
             Total token : 280\n"
        );
    }

    #[test]
    fn test_missing_kernel_usage_prints_blank_values() {
        let report = Report {
            response: "",
            kernel_usage: None,
            http_usage: UsageSummary::default(),
            rate_limit: None,
        };

        let text = report.render(false).unwrap();
        assert!(text.contains("#Token Usage from Kernel Metadata\nInput token : \nOutput token : \nTotal token : \n"));
        assert!(text.ends_with("#Token Usage from HTTP Client\nInput token : 0\nOutput token : 0\nTotal token : 0\n"));
    }

    #[test]
    fn test_rate_limit_line() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining-requests", HeaderValue::from_static("99"));
        let report = Report {
            response: "ok",
            kernel_usage: None,
            http_usage: UsageSummary::default(),
            rate_limit: Some(RateLimitSnapshot::from_headers(&headers)),
        };

        assert!(report
            .render(false)
            .unwrap()
            .ends_with("#Rate Limit\nRemaining requests : 99 / Remaining tokens : -\n"));
    }

    #[test]
    fn test_colored_headings() {
        let report = Report {
            response: "ok",
            kernel_usage: None,
            http_usage: UsageSummary::default(),
            rate_limit: None,
        };

        // Escape codes may be suppressed by NO_COLOR, the text never is
        let text = report.render(true).unwrap();
        assert!(text.starts_with("#RESPONSE\nok\n"));
        assert!(text.contains("#Token Usage from Kernel Metadata"));
        assert!(text.contains("#Token Usage from HTTP Client"));
    }
}
