//! Output formatting for CLI results
//!
//! Three output formats:
//! - Table: Human-readable tables (default)
//! - JSON: Structured JSON for scripting and automation
//! - Quiet: Only the bare result value, if the command produces one

use std::str::FromStr;

use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use crate::ExitCode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Quiet,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "quiet" => Ok(Self::Quiet),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Quiet => write!(f, "quiet"),
        }
    }
}

/// Standard JSON response wrapper
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// ISO 8601 timestamp
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl<T: Serialize> JsonResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: None,
        }
    }

    pub fn success_with_command(data: T, command: &str) -> Self {
        Self {
            command: Some(command.to_string()),
            ..Self::success(data)
        }
    }
}

impl JsonResponse<()> {
    pub fn error(message: &str) -> JsonResponse<()> {
        JsonResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: None,
        }
    }
}

/// Anything a command reports: a JSON shape, table rows, and optionally one
/// bare value for quiet mode.
pub trait Report: Serialize {
    fn rows(&self) -> Vec<(&'static str, String)>;

    fn quiet_value(&self) -> Option<&str> {
        None
    }

    /// Exit status the process should end with after printing this report.
    fn exit_code(&self) -> ExitCode {
        ExitCode::Success
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
    verbose: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    pub fn is_quiet(&self) -> bool {
        self.format == OutputFormat::Quiet
    }

    /// Render a command result. Empty in quiet mode unless the report has a
    /// bare value.
    pub fn format_report<R: Report>(&self, report: &R, command: &str) -> String {
        match self.format {
            OutputFormat::Table => property_table(&report.rows()),
            OutputFormat::Json => self.to_json_response(report, command),
            OutputFormat::Quiet => report.quiet_value().unwrap_or_default().to_string(),
        }
    }

    /// Print a rendered report, skipping empty output.
    pub fn print_report<R: Report>(&self, report: &R, command: &str) {
        let rendered = self.format_report(report, command);
        if !rendered.is_empty() {
            println!("{rendered}");
        }
    }

    pub fn format_error_with_code(&self, message: &str, code: ExitCode) -> String {
        match self.format {
            OutputFormat::Table => format!("Error: {message}"),
            OutputFormat::Json => {
                let mut output = serde_json::to_value(JsonResponse::<()>::error(message))
                    .unwrap_or_default();
                output["exit_code"] = serde_json::json!(code as i32);
                output["exit_code_name"] = serde_json::json!(code.name());
                self.to_json(&output)
            }
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Report a failed command: JSON on stdout, text on stderr, nothing when quiet.
    pub fn error(&self, message: &str, code: ExitCode) {
        let rendered = self.format_error_with_code(message, code);
        match self.format {
            OutputFormat::Table => eprintln!("✗ {}", rendered.trim_start_matches("Error: ")),
            OutputFormat::Json => println!("{rendered}"),
            OutputFormat::Quiet => {}
        }
    }

    /// Progress note, verbose table mode only.
    pub fn progress(&self, message: &str) {
        if self.verbose && self.format == OutputFormat::Table {
            eprintln!("... {message}");
        }
    }

    pub fn success(&self, message: &str) {
        if self.format == OutputFormat::Table {
            println!("✓ {message}");
        }
    }

    pub fn warning(&self, message: &str) {
        if self.format == OutputFormat::Table {
            eprintln!("⚠ {message}");
        }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    fn to_json_response<T: Serialize>(&self, value: &T, command: &str) -> String {
        self.to_json(&JsonResponse::success_with_command(value, command))
    }
}

fn property_table(rows: &[(&'static str, String)]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Property", "Value"]);
    for (label, value) in rows {
        table.add_row(vec![*label, value.as_str()]);
    }
    table.to_string()
}

// Command results

#[derive(Debug, Serialize)]
pub struct EnvelopeOutput {
    pub envelope: String,
    pub plaintext_bytes: usize,
    pub envelope_bytes: usize,
}

impl Report for EnvelopeOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Envelope", self.envelope.clone()),
            ("Plaintext Bytes", self.plaintext_bytes.to_string()),
            ("Envelope Bytes", self.envelope_bytes.to_string()),
        ]
    }

    fn quiet_value(&self) -> Option<&str> {
        Some(&self.envelope)
    }
}

#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub total_bytes: usize,
    pub point_tag: String,
    pub point_on_curve: bool,
    pub ephemeral_point: String,
    pub iv: String,
    pub ciphertext_bytes: usize,
    pub ciphertext_blocks: usize,
    /// Upper bound on the plaintext length (padding takes 1..=16 bytes).
    pub max_plaintext_bytes: usize,
}

impl Report for InspectOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Total Bytes", self.total_bytes.to_string()),
            ("Point Tag", self.point_tag.clone()),
            ("Point On Curve", if self.point_on_curve { "yes" } else { "no" }.to_string()),
            ("Ephemeral Point", self.ephemeral_point.clone()),
            ("IV", self.iv.clone()),
            ("Ciphertext Bytes", self.ciphertext_bytes.to_string()),
            ("Ciphertext Blocks", self.ciphertext_blocks.to_string()),
            ("Max Plaintext Bytes", self.max_plaintext_bytes.to_string()),
        ]
    }
}

#[derive(Debug, Serialize)]
pub struct KeygenOutput {
    pub bits: usize,
    pub private_key_path: String,
    pub public_key_path: String,
}

impl Report for KeygenOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Bits", self.bits.to_string()),
            ("Private Key", self.private_key_path.clone()),
            ("Public Key", self.public_key_path.clone()),
        ]
    }
}

#[derive(Debug, Serialize)]
pub struct KeyCheckOutput {
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<pwdm_crypto::FailureKind>,
}

impl Report for KeyCheckOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![("Matched", if self.matched { "yes" } else { "no" }.to_string())];
        if let Some(message) = &self.message {
            rows.push(("Reason", message.clone()));
        }
        rows
    }

    fn exit_code(&self) -> ExitCode {
        self.kind.map(ExitCode::from).unwrap_or(ExitCode::Success)
    }
}

/// Result of sign / seal / open: one produced value.
#[derive(Debug, Serialize)]
pub struct ValueOutput {
    #[serde(skip)]
    pub label: &'static str,
    pub value: String,
}

impl Report for ValueOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![(self.label, self.value.clone())]
    }

    fn quiet_value(&self) -> Option<&str> {
        Some(&self.value)
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyOutput {
    pub valid: bool,
}

impl Report for VerifyOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![("Signature Valid", if self.valid { "yes" } else { "no" }.to_string())]
    }

    fn exit_code(&self) -> ExitCode {
        if self.valid {
            ExitCode::Success
        } else {
            ExitCode::VerificationFailed
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PathOutput {
    pub path: String,
    pub exists: bool,
}

impl Report for PathOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Path", self.path.clone()),
            ("Exists", if self.exists { "yes" } else { "no" }.to_string()),
        ]
    }

    fn quiet_value(&self) -> Option<&str> {
        Some(&self.path)
    }
}

impl Report for crate::config::Config {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let path_or_unset = |path: &Option<std::path::PathBuf>| {
            path.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unset)".to_string())
        };
        vec![
            ("Server ECC Key", self.server.ecc_public_key.clone()),
            ("Public Key Path", path_or_unset(&self.keys.public_key_path)),
            ("Private Key Path", path_or_unset(&self.keys.private_key_path)),
            ("Default Bits", self.keys.default_bits.to_string()),
            ("Output Format", self.output.format.clone()),
            ("Verbose", self.output.verbose.to_string()),
            ("Log Level", self.logging.level.clone()),
        ]
    }
}
