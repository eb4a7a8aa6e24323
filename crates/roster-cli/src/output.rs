//! Output formatting for the CLI.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::json;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `{"status": ..., "message": ...}` with the message escaped.
pub fn status_json(status: &str, message: &str) -> String {
    json!({ "status": status, "message": message }).to_string()
}

/// Print a success message.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => println!("{}", status_json("success", message)),
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => eprintln!("{}", status_json("error", message)),
    }
}

/// Print a notice on stderr so stdout stays machine-readable.
pub fn print_notice(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("{}", message),
        OutputFormat::Json => eprintln!("{}", status_json("notice", message)),
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", label), value);
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "-".repeat(50));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn status_json_escapes_message() {
        let line = status_json("error", r#"Name "x" is too short"#);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["message"], r#"Name "x" is too short"#);
    }

    #[test]
    fn format_parses_from_cli_value() {
        assert_eq!(
            <OutputFormat as ValueEnum>::from_str("JSON", true).unwrap(),
            OutputFormat::Json
        );
        assert!(<OutputFormat as ValueEnum>::from_str("yaml", true).is_err());
    }
}
