//! The broker HTTP server.
//!
//! Route semantics: a purchase either grants (200), challenges for
//! payment (402 with a price quote), conflicts (409), or finds the robot
//! offline (503). These are expected branches, distinct from transport
//! faults. Command and camera routes re-validate session ownership on
//! every call.

mod access;
mod robot;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use axum::routing::{get, post};
use teleop::{
	BrokerConfig, FacilitatorClient, PaymentGate, RobotClient, SessionService, SystemClock, sweeper,
};
use teleop_protocol::{ErrorReply, PAYMENT_HEADER, PaymentPayload, WALLET_HEADER};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

use crate::cli::ServeArgs;
use crate::error::{CliError, Result};

#[derive(Clone)]
pub struct AppState {
	pub sessions: Arc<SessionService>,
	pub robots: Arc<RobotClient>,
	pub config: Arc<BrokerConfig>,
}

/// Builds the broker router over shared state.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/v1/access/purchase", post(access::purchase))
		.route("/api/v1/access/status", get(access::status))
		.route("/api/v1/access/release", post(access::release))
		.route("/api/v1/access/config", get(access::config))
		.route("/api/v1/robot/status", get(robot::status))
		.route("/api/v1/robot/motor/{command}", get(robot::motor))
		.route("/api/v1/robot/camera/frame", get(robot::camera_frame))
		.with_state(state)
}

/// Runs the broker until interrupted.
pub async fn serve(args: ServeArgs) -> Result<()> {
	let config = broker_config(&args);

	if config.payment_enabled {
		info!(
			target = "teleop.http",
			price = %config.session_price,
			minutes = config.session_duration.as_secs() / 60,
			network = %config.network,
			"x402 payments enabled"
		);
	} else {
		info!(target = "teleop.http", "payment gateway disabled; free access mode");
	}

	let settlement = FacilitatorClient::new(&config.facilitator_url, Duration::from_secs(20))?;
	let gate = PaymentGate::new(&config, Box::new(settlement));
	let sessions = Arc::new(SessionService::new(
		gate,
		Arc::new(SystemClock),
		config.session_duration,
	));
	let robots = Arc::new(RobotClient::new(config.robot_timeout)?);

	let (sweep_stop, sweep_task) = sweeper::spawn(Arc::clone(&sessions), config.sweep_interval);

	let state = AppState {
		sessions,
		robots,
		config: Arc::new(config),
	};
	let app = router(state).layer(cors_layer(&args.cors_origins));

	let addr = format!("{}:{}", args.host, args.port);
	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.map_err(|e| CliError::Config(format!("Failed to bind to {addr}: {e}")))?;
	info!(target = "teleop.http", addr = %addr, "broker listening");

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await
		.map_err(|e| CliError::Config(format!("Server error: {e}")))?;

	let _ = sweep_stop.send(true);
	let _ = sweep_task.await;
	Ok(())
}

fn broker_config(args: &ServeArgs) -> BrokerConfig {
	BrokerConfig {
		payment_enabled: args.payment_enabled,
		payment_address: args.payment_address.clone(),
		network: args.network.clone(),
		facilitator_url: args.facilitator_url.clone(),
		session_price: args.session_price.clone(),
		session_duration: Duration::from_secs(args.session_duration_minutes * 60),
		sweep_interval: Duration::from_secs(args.sweep_interval_secs),
		robot_timeout: Duration::from_secs(args.robot_timeout_secs),
	}
}

fn cors_layer(origins: &[String]) -> CorsLayer {
	let origins: Vec<HeaderValue> = origins
		.iter()
		.filter_map(|origin| origin.parse().ok())
		.collect();
	CorsLayer::new()
		.allow_origin(AllowOrigin::list(origins))
		.allow_methods(Any)
		.allow_headers(Any)
}

async fn shutdown_signal() {
	#[cfg(unix)]
	{
		use tokio::signal::unix::{SignalKind, signal};
		let mut sigterm = match signal(SignalKind::terminate()) {
			Ok(sig) => sig,
			Err(_) => return tokio::signal::ctrl_c().await.unwrap_or_default(),
		};
		tokio::select! {
			_ = tokio::signal::ctrl_c() => {}
			_ = sigterm.recv() => {}
		}
		info!(target = "teleop.http", "shutdown requested");
	}

	#[cfg(not(unix))]
	{
		let _ = tokio::signal::ctrl_c().await;
		info!(target = "teleop.http", "shutdown requested");
	}
}

async fn health(
	axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
	Json(serde_json::json!({
		"status": "healthy",
		"payment_enabled": state.config.payment_enabled,
	}))
}

/// Caller-asserted wallet identity; the broker binds sessions to it
/// without authenticating it.
fn wallet_header(headers: &HeaderMap) -> Option<String> {
	headers
		.get(WALLET_HEADER)
		.and_then(|value| value.to_str().ok())
		.map(str::to_string)
		.filter(|wallet| !wallet.is_empty())
}

fn payment_header(headers: &HeaderMap) -> std::result::Result<Option<PaymentPayload>, String> {
	let Some(value) = headers.get(PAYMENT_HEADER) else {
		return Ok(None);
	};
	let raw = value
		.to_str()
		.map_err(|_| "X-PAYMENT header is not valid ascii".to_string())?;
	PaymentPayload::decode_header(raw)
		.map(Some)
		.map_err(|e| e.to_string())
}

fn error_reply(status: StatusCode, detail: impl Into<String>) -> Response {
	(
		status,
		Json(ErrorReply {
			detail: detail.into(),
		}),
	)
		.into_response()
}
