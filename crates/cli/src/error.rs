use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("{0}")]
	Config(String),

	#[error("broker error: {0}")]
	Server(String),

	#[error(transparent)]
	Http(#[from] reqwest::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Core(#[from] teleop::CoreError),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	/// Convert this error to a CommandError for structured output.
	pub fn to_command_error(&self) -> CommandError {
		let (code, message) = match self {
			CliError::Config(msg) => (ErrorCode::InvalidInput, msg.clone()),
			CliError::Server(msg) => (ErrorCode::ServerError, msg.clone()),
			CliError::Http(err) => (ErrorCode::NetworkError, err.to_string()),
			CliError::Io(err) => (ErrorCode::IoError, err.to_string()),
			CliError::Json(err) => (ErrorCode::InternalError, format!("JSON error: {err}")),
			CliError::Core(err) => (ErrorCode::ServerError, err.to_string()),
			CliError::Anyhow(err) => (ErrorCode::InternalError, err.to_string()),
		};

		CommandError { code, message }
	}
}
