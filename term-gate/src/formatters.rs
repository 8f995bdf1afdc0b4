//! Report formatting for validation errors.
//!
//! Formatters render a [`ValidationErrors`] as JSON for APIs, as plain or
//! colorized text for consoles, or as Markdown for pull request comments and
//! documentation.
//!
//! # Examples
//!
//! ```rust
//! use term_gate::core::ValidationErrors;
//! use term_gate::formatters::{FormatterConfig, HumanFormatter, ReportFormatter};
//!
//! let mut errors = ValidationErrors::new();
//! errors.add("email", "email is required");
//!
//! let formatter = HumanFormatter::with_config(FormatterConfig::ci());
//! let output = formatter.format(&errors).unwrap();
//! assert!(output.contains("email is required"));
//! ```

use crate::core::ValidationErrors;
use crate::error::{Result, TermError};
use std::fmt::{self, Write};

/// Configuration options for formatting reports.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include the field and message counts
    pub include_summary: bool,
    /// Maximum number of fields to display (-1 for all)
    pub max_fields: i32,
    /// Whether to use colorized output (for human formatter)
    pub use_colors: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_summary: true,
            max_fields: -1,
            use_colors: true,
        }
    }
}

impl FormatterConfig {
    /// Creates a minimal configuration: messages only, no colors.
    pub fn minimal() -> Self {
        Self {
            include_summary: false,
            max_fields: -1,
            use_colors: false,
        }
    }

    /// Creates a configuration suitable for CI/CD environments.
    pub fn ci() -> Self {
        Self {
            include_summary: true,
            max_fields: 50,
            use_colors: false,
        }
    }

    /// Sets whether to include the summary.
    pub fn with_summary(mut self, include: bool) -> Self {
        self.include_summary = include;
        self
    }

    /// Sets the maximum number of fields to display.
    pub fn with_max_fields(mut self, max: i32) -> Self {
        self.max_fields = max;
        self
    }

    /// Sets whether to use colorized output.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn limit(&self, total: usize) -> usize {
        if self.max_fields < 0 {
            total
        } else {
            total.min(self.max_fields as usize)
        }
    }
}

/// Renders a validation report.
///
/// ```rust
/// use term_gate::core::ValidationErrors;
/// use term_gate::formatters::ReportFormatter;
///
/// struct CountFormatter;
///
/// impl ReportFormatter for CountFormatter {
///     fn format(&self, errors: &ValidationErrors) -> term_gate::Result<String> {
///         Ok(format!("{} invalid fields", errors.len()))
///     }
/// }
/// ```
pub trait ReportFormatter {
    /// Formats `errors` with the formatter's own configuration.
    fn format(&self, errors: &ValidationErrors) -> Result<String>;

    /// Formats `errors` with an explicit configuration.
    fn format_with_config(
        &self,
        errors: &ValidationErrors,
        _config: &FormatterConfig,
    ) -> Result<String> {
        self.format(errors)
    }
}

fn rendered(result: fmt::Result, output: String) -> Result<String> {
    result
        .map(|()| output)
        .map_err(|e| TermError::Internal(format!("Failed to render report: {e}")))
}

/// Formats reports as a JSON object of field path to messages.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    /// Creates a new JSON formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, errors: &ValidationErrors) -> Result<String> {
        self.format_with_config(errors, &self.config)
    }

    fn format_with_config(
        &self,
        errors: &ValidationErrors,
        config: &FormatterConfig,
    ) -> Result<String> {
        let shown = config.limit(errors.len());
        let fields: serde_json::Map<String, serde_json::Value> = errors
            .iter()
            .take(shown)
            .map(|(field, messages)| (field.clone(), serde_json::json!(messages)))
            .collect();

        let document = if config.include_summary {
            serde_json::json!({
                "valid": errors.is_empty(),
                "invalid_fields": errors.len(),
                "errors": fields,
            })
        } else {
            serde_json::Value::Object(fields)
        };

        let serialized = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };
        serialized
            .map_err(|e| TermError::Internal(format!("Failed to serialize report to JSON: {e}")))
    }
}

/// Formats reports for console output.
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    /// Creates a new human formatter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new human formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn render(
        errors: &ValidationErrors,
        config: &FormatterConfig,
        output: &mut String,
    ) -> fmt::Result {
        let paint = |code: &str, text: &str| {
            if config.use_colors {
                format!("\x1b[{code}m{text}\x1b[0m")
            } else {
                text.to_string()
            }
        };

        if errors.is_empty() {
            return writeln!(output, "✅ {}", paint("32", "Validation PASSED"));
        }
        writeln!(output, "❌ {}", paint("31", "Validation FAILED"))?;

        if config.include_summary {
            let messages: usize = errors.iter().map(|(_, m)| m.len()).sum();
            writeln!(output)?;
            writeln!(output, "   Invalid fields: {}", errors.len())?;
            writeln!(output, "   Messages: {messages}")?;
        }

        let shown = config.limit(errors.len());
        writeln!(output)?;
        for (field, messages) in errors.iter().take(shown) {
            writeln!(output, "   {}", paint("1", field))?;
            for message in messages {
                writeln!(output, "      - {message}")?;
            }
        }
        if shown < errors.len() {
            writeln!(output, "   ... and {} more fields", errors.len() - shown)?;
        }
        Ok(())
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, errors: &ValidationErrors) -> Result<String> {
        self.format_with_config(errors, &self.config)
    }

    fn format_with_config(
        &self,
        errors: &ValidationErrors,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();
        let result = Self::render(errors, config, &mut output);
        rendered(result, output)
    }
}

/// Formats reports as Markdown.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    heading_level: u8,
}

impl MarkdownFormatter {
    /// Creates a new Markdown formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            heading_level: 2,
        }
    }

    /// Creates a new Markdown formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            heading_level: 2,
        }
    }

    /// Sets the heading level of the report title (1-6).
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 6);
        self
    }

    fn render(
        &self,
        errors: &ValidationErrors,
        config: &FormatterConfig,
        output: &mut String,
    ) -> fmt::Result {
        let h = "#".repeat(self.heading_level as usize);
        if errors.is_empty() {
            return writeln!(output, "{h} ✅ Validation PASSED");
        }
        writeln!(output, "{h} ❌ Validation FAILED")?;
        writeln!(output)?;

        if config.include_summary {
            writeln!(output, "**Invalid fields:** {}", errors.len())?;
            writeln!(output)?;
        }

        writeln!(output, "| Field | Message |")?;
        writeln!(output, "|-------|---------|")?;
        let shown = config.limit(errors.len());
        for (field, messages) in errors.iter().take(shown) {
            for message in messages {
                writeln!(output, "| `{field}` | {} |", message.replace('|', "\\|"))?;
            }
        }
        if shown < errors.len() {
            writeln!(output)?;
            writeln!(output, "_{} more fields not shown_", errors.len() - shown)?;
        }
        Ok(())
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, errors: &ValidationErrors) -> Result<String> {
        self.format_with_config(errors, &self.config)
    }

    fn format_with_config(
        &self,
        errors: &ValidationErrors,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();
        let result = self.render(errors, config, &mut output);
        rendered(result, output)
    }
}
