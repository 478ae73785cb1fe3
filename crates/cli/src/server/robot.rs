//! Robot probe, motor and camera routes.
//!
//! Motor and camera routes are session-gated: ownership is re-validated
//! against the lock table on every call, so an expired session loses
//! control even if the sweeper has not run yet.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use teleop::{MotorCommand, probe};
use teleop_protocol::CommandReply;

use super::{AppState, error_reply, wallet_header};

#[derive(Debug, Deserialize)]
pub(super) struct StatusQuery {
	robot_host: String,
	camera_host: Option<String>,
}

pub(super) async fn status(
	State(state): State<AppState>,
	Query(query): Query<StatusQuery>,
) -> Response {
	let status = probe(
		&state.robots,
		&state.sessions,
		&query.robot_host,
		query.camera_host.as_deref(),
	)
	.await;
	Json(status.into_reply()).into_response()
}

pub(super) async fn motor(
	State(state): State<AppState>,
	Path(command): Path<String>,
	headers: HeaderMap,
) -> Response {
	let command: MotorCommand = match command.parse() {
		Ok(command) => command,
		Err(detail) => return error_reply(StatusCode::BAD_REQUEST, detail),
	};
	let robot_host = match session_robot(&state, &headers) {
		Ok(robot_host) => robot_host,
		Err(response) => return response,
	};

	if !state.robots.motor_command(&robot_host, command).await {
		return error_reply(StatusCode::SERVICE_UNAVAILABLE, "Robot motor offline");
	}
	Json(CommandReply {
		status: "ok".to_string(),
		command: command.as_str().to_string(),
	})
	.into_response()
}

pub(super) async fn camera_frame(State(state): State<AppState>, headers: HeaderMap) -> Response {
	let robot_host = match session_robot(&state, &headers) {
		Ok(robot_host) => robot_host,
		Err(response) => return response,
	};

	match state.robots.camera_frame(&robot_host, None).await {
		Some(frame) => (
			StatusCode::OK,
			[(header::CONTENT_TYPE, "image/jpeg")],
			frame,
		)
			.into_response(),
		None => error_reply(StatusCode::SERVICE_UNAVAILABLE, "Robot camera offline"),
	}
}

/// The robot bound to the caller's live session, or the refusal to send.
fn session_robot(state: &AppState, headers: &HeaderMap) -> Result<String, Response> {
	let Some(wallet) = wallet_header(headers) else {
		return Err(error_reply(
			StatusCode::UNAUTHORIZED,
			"Wallet address required. Include X-Wallet-Address header.",
		));
	};
	state.sessions.robot_for(&wallet).ok_or_else(|| {
		error_reply(
			StatusCode::FORBIDDEN,
			"No active session. Purchase access first.",
		)
	})
}
