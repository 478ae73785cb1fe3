//! Structured output envelope for CLI commands.
//!
//! Every command prints a result envelope on stdout:
//!
//! ```json
//! { "ok": true, "command": "status", "data": { ... } }
//! ```
//!
//! On failure `ok` is false and `error` carries a machine-readable code.

use serde::Serialize;

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text (default)
	#[default]
	Text,
	/// JSON envelope
	Json,
}

/// The result envelope printed by all commands.
#[derive(Debug, Serialize)]
pub struct CommandResult {
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<serde_json::Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	InvalidInput,
	PaymentRequired,
	Conflict,
	RobotOffline,
	NetworkError,
	ServerError,
	IoError,
	InternalError,
}

pub struct ResultBuilder {
	command: String,
	data: Option<serde_json::Value>,
	error: Option<CommandError>,
}

impl ResultBuilder {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
		}
	}

	pub fn data(mut self, data: serde_json::Value) -> Self {
		self.data = Some(data);
		self
	}

	pub fn error(mut self, code: ErrorCode, message: &str) -> Self {
		self.error = Some(CommandError {
			code,
			message: message.to_string(),
		});
		self
	}

	pub fn build(self) -> CommandResult {
		CommandResult {
			ok: self.error.is_none(),
			command: self.command,
			data: self.data,
			error: self.error,
		}
	}
}

pub fn print_result(result: &CommandResult, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			let json = serde_json::to_string(result).expect("command result is always serializable");
			println!("{json}");
		}
		OutputFormat::Text => print_text(result),
	}
}

pub fn print_error_stderr(error: &CommandError) {
	eprintln!("error: {}", error.message);
}

fn print_text(result: &CommandResult) {
	if let Some(error) = &result.error {
		eprintln!("error: {}", error.message);
		return;
	}
	match &result.data {
		Some(serde_json::Value::Object(map)) => {
			for (key, value) in map {
				match value {
					serde_json::Value::String(s) => println!("{key}: {s}"),
					other => println!("{key}: {other}"),
				}
			}
		}
		Some(other) => println!("{other}"),
		None => println!("ok"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn success_envelope_omits_error() {
		let result = ResultBuilder::new("status")
			.data(serde_json::json!({ "active": true }))
			.build();
		let json = serde_json::to_string(&result).unwrap();
		assert!(json.contains(r#""ok":true"#));
		assert!(!json.contains("error"));
	}

	#[test]
	fn error_envelope_carries_code() {
		let result = ResultBuilder::new("purchase")
			.error(ErrorCode::Conflict, "robot in use")
			.build();
		assert!(!result.ok);
		let json = serde_json::to_string(&result).unwrap();
		assert!(json.contains(r#""code":"CONFLICT""#));
	}
}
