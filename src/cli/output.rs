//! CLI output formatting utilities.

use crate::workflow::PipelineEvent;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
///
/// Status messages go to stderr so the generated text on stdout can be piped.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        eprintln!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        eprintln!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        eprintln!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        eprintln!("  {}: {}", style(key).dim(), value);
    }

    /// Print one agent's summary line.
    pub fn agent_run(name: &str, output_key: &str, iterations: usize, tool_calls: usize, elapsed_ms: u64) {
        eprintln!(
            "  {} {} -> {} ({} call(s), {} tool call(s), {})",
            style("*").cyan(),
            style(name).bold(),
            style(output_key).dim(),
            iterations,
            tool_calls,
            format_elapsed(elapsed_ms)
        );
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Describe a pipeline event for the spinner line.
    pub fn describe_event(event: &PipelineEvent) -> String {
        match event {
            PipelineEvent::AgentStarted { agent } => format!("{} working...", agent),
            PipelineEvent::ToolCalled { agent, tool, arguments } => {
                format!("{} -> {} {}", agent, tool, truncate(arguments, 60))
            }
            PipelineEvent::Retrying { agent, attempt, delay } => format!(
                "{} retrying (attempt {}) in {:.1}s",
                agent,
                attempt + 1,
                delay.as_secs_f64()
            ),
            PipelineEvent::AgentFinished { agent, output_key, elapsed_ms } => format!(
                "{} published {} in {}",
                agent,
                output_key,
                format_elapsed(*elapsed_ms)
            ),
        }
    }
}

/// Format milliseconds as a short human-readable duration.
fn format_elapsed(ms: u64) -> String {
    let seconds = ms / 1000;
    if seconds >= 60 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds > 0 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}ms", ms)
    }
}

/// Truncate content with ellipsis, respecting char boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(250), "250ms");
        assert_eq!(format_elapsed(1500), "1.5s");
        assert_eq!(format_elapsed(125_000), "2m 5s");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_describe_retry_event() {
        let text = Output::describe_event(&PipelineEvent::Retrying {
            agent: "TitleResearchAgent".to_string(),
            attempt: 1,
            delay: Duration::from_secs(7),
        });
        assert_eq!(text, "TitleResearchAgent retrying (attempt 2) in 7.0s");
    }
}
