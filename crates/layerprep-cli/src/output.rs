use console::{style, StyledObject};
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Severity of a one-line status message
#[derive(Debug, Clone, Copy)]
enum Level {
    Success,
    Info,
    Warning,
}

impl Level {
    fn status(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
        }
    }

    fn symbol(self) -> StyledObject<&'static str> {
        match self {
            Level::Success => style("✓").green().bold(),
            Level::Info => style("ℹ").blue().bold(),
            Level::Warning => style("⚠").yellow().bold(),
        }
    }
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            },
        }
    }

    /// Warnings go to stderr so stdout stays parseable
    fn message(&self, level: Level, message: impl Display) {
        let line = match self.format {
            OutputFormat::Human => format!("{} {}", level.symbol(), message),
            OutputFormat::Json => format!(
                "{:#}",
                serde_json::json!({
                    "status": level.status(),
                    "message": message.to_string(),
                })
            ),
        };
        match level {
            Level::Warning => eprintln!("{}", line),
            Level::Success | Level::Info => println!("{}", line),
        }
    }

    pub fn success(&self, message: impl Display) {
        self.message(Level::Success, message);
    }

    pub fn info(&self, message: impl Display) {
        self.message(Level::Info, message);
    }

    pub fn warning(&self, message: impl Display) {
        self.message(Level::Warning, message);
    }

    /// Render rows as a table; JSON runs carry the same rows in `result`
    pub fn table<T: Tabled>(&self, rows: Vec<T>) {
        if self.is_json() {
            return;
        }
        if rows.is_empty() {
            println!("{}", style("(no data)").dim());
        } else {
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}", table);
        }
    }

    /// Print a command's result, wrapped in a status envelope for JSON runs
    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        let rendered = match self.format {
            OutputFormat::Human => serde_json::to_string_pretty(&data)?,
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "status": "success",
                "data": serde_json::to_value(&data)?,
            }))?,
        };
        println!("{}", rendered);
        Ok(())
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        if !self.is_json() {
            println!("{}: {}", style(key).bold(), value);
        }
    }

    pub fn section(&self, title: impl Display) {
        if !self.is_json() {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}
