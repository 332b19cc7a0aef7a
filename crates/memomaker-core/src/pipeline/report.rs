//! Usage summary formatting for the operation log.

use std::time::Duration;

use crate::provider::UsageMetadata;

/// Format one usage summary block.
///
/// Token counts appear only when the service returned usage metadata; a
/// failed operation carries its error text verbatim.
pub(crate) fn usage_summary(
    operation: &str,
    payload_size: u64,
    elapsed: Duration,
    usage: Option<&UsageMetadata>,
    error: Option<&str>,
) -> String {
    let mut lines = vec![
        "api usage summary:".to_string(),
        format!("  operation: {operation}"),
        format!(
            "  payload: {payload_size} bytes ({:.2} MB)",
            payload_size as f64 / (1024.0 * 1024.0)
        ),
        format!("  elapsed: {:.2}s", elapsed.as_secs_f64()),
    ];

    if let Some(usage) = usage {
        lines.push(format!("  input tokens: {}", count(usage.prompt_tokens)));
        lines.push(format!("  output tokens: {}", count(usage.response_tokens)));
        lines.push(format!("  total tokens: {}", count(usage.total_tokens)));
    }

    lines.push(format!(
        "  success: {}",
        if error.is_none() { "yes" } else { "no" }
    ));
    if let Some(error) = error {
        lines.push(format!("  error: {error}"));
    }

    lines.join("\n")
}

fn count(value: Option<u64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |n| n.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_summaries_carry_the_error_text() {
        let summary = usage_summary(
            "transcript generation",
            1024,
            Duration::from_secs(3),
            None,
            Some("upstream boom"),
        );
        assert!(summary.contains("success: no"));
        assert!(summary.contains("error: upstream boom"));
        assert!(!summary.contains("tokens"));
    }

    #[test]
    fn token_counts_appear_when_usage_is_present() {
        let usage = UsageMetadata {
            prompt_tokens: Some(10),
            response_tokens: None,
            total_tokens: Some(10),
        };
        let summary = usage_summary(
            "memo generation",
            2048,
            Duration::from_millis(1500),
            Some(&usage),
            None,
        );
        assert!(summary.contains("input tokens: 10"));
        assert!(summary.contains("output tokens: n/a"));
        assert!(summary.contains("elapsed: 1.50s"));
        assert!(summary.contains("success: yes"));
    }
}
