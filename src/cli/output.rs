//! Output formatting for CLI listings

use anyhow::{Context, Result};
use serde::Serialize;

use super::EngineRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            "table" => Ok(OutputFormat::Table),
            _ => anyhow::bail!(
                "Unsupported output format: '{}'. Use 'json', 'yaml', or 'table'.",
                s
            ),
        }
    }
}

/// Print the engine listing in the requested format
pub(super) fn print_engines(rows: &[EngineRow], format: &str) -> Result<()> {
    match format.parse::<OutputFormat>()? {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Yaml => print_yaml(&rows),
        OutputFormat::Table => {
            print!("{}", engine_table(rows));
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

fn print_yaml<T: Serialize>(data: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(data).context("Failed to serialize to YAML")?;
    println!("{}", yaml);
    Ok(())
}

fn engine_table(rows: &[EngineRow]) -> String {
    let width = rows.iter().map(|row| row.identifier.len()).max().unwrap_or(0).max("ENGINE".len());
    let mut table = format!("{:<width$} KIND\n", "ENGINE", width = width);
    table.push_str(&"-".repeat(width + 1 + "KIND".len().max(7)));
    table.push('\n');
    for row in rows {
        table.push_str(&format!("{:<width$} {}\n", row.identifier, row.kind, width = width));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<EngineRow> {
        vec![
            EngineRow { identifier: "file".to_string(), kind: "storage".to_string() },
            EngineRow { identifier: "noop".to_string(), kind: "opaque".to_string() },
        ]
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("YAML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_engine_table() {
        let table = engine_table(&rows());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "ENGINE KIND");
        assert_eq!(lines[2], "file   storage");
        assert_eq!(lines[3], "noop   opaque");
    }

    #[test]
    fn test_print_engines_formats() {
        assert!(print_engines(&rows(), "json").is_ok());
        assert!(print_engines(&rows(), "yaml").is_ok());
        assert!(print_engines(&rows(), "csv").is_err());
    }
}
