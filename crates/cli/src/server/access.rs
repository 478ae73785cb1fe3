//! Purchase, status, release and payment-config routes.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use teleop::{Conflict, PurchaseOutcome, Session};
use teleop_protocol::{
	AccessConfigReply, PaymentRequiredReply, PurchaseReply, PurchaseRequest, ReleaseReply,
	SessionView,
};
use tracing::error;

use super::{AppState, error_reply, payment_header, wallet_header};

pub(super) async fn purchase(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(body): Json<PurchaseRequest>,
) -> Response {
	let Some(wallet) = wallet_header(&headers) else {
		return error_reply(
			StatusCode::UNAUTHORIZED,
			"Wallet address required. Include X-Wallet-Address header.",
		);
	};
	let proof = match payment_header(&headers) {
		Ok(proof) => proof,
		Err(detail) => return error_reply(StatusCode::BAD_REQUEST, detail),
	};

	// The robot must answer discovery before anything is charged or
	// locked.
	if !state.robots.motor_online(&body.robot_host).await {
		return error_reply(
			StatusCode::SERVICE_UNAVAILABLE,
			format!("Robot '{}' is offline. Cannot create session.", body.robot_host),
		);
	}

	let outcome = state
		.sessions
		.purchase(&wallet, &body.robot_host, proof.as_ref())
		.await;

	match outcome {
		Ok(PurchaseOutcome::Granted(session)) => {
			let minutes = state.config.session_duration.as_secs() / 60;
			let now = state.sessions.now();
			let reply = PurchaseReply {
				status: "success".to_string(),
				message: format!(
					"Access granted to '{}' for {} minutes",
					session.robot_host, minutes
				),
				session: session_view(&session, now),
				payment_tx: session.payment_tx.clone(),
			};
			(StatusCode::OK, Json(reply)).into_response()
		}
		Ok(PurchaseOutcome::PaymentRequired(quote)) => (
			StatusCode::PAYMENT_REQUIRED,
			Json(PaymentRequiredReply::new("payment required", quote)),
		)
			.into_response(),
		Ok(PurchaseOutcome::PaymentRejected { reason }) => {
			// The proof is spent; the caller needs a fresh one against
			// the same quote.
			let quote = state.sessions.quote_for(&body.robot_host);
			(
				StatusCode::PAYMENT_REQUIRED,
				Json(PaymentRequiredReply::new(reason, quote)),
			)
				.into_response()
		}
		Ok(PurchaseOutcome::Conflict(conflict)) => {
			error_reply(StatusCode::CONFLICT, conflict_detail(&conflict, &body.robot_host))
		}
		Err(err) => {
			error!(target = "teleop.http", error = %err, "purchase failed");
			error_reply(StatusCode::BAD_GATEWAY, err.to_string())
		}
	}
}

pub(super) async fn status(State(state): State<AppState>, headers: HeaderMap) -> Response {
	let Some(wallet) = wallet_header(&headers) else {
		return Json(SessionView::inactive()).into_response();
	};
	let view = match state.sessions.status(&wallet) {
		Some(session) => session_view(&session, state.sessions.now()),
		None => SessionView::inactive(),
	};
	Json(view).into_response()
}

pub(super) async fn release(State(state): State<AppState>, headers: HeaderMap) -> Response {
	let Some(wallet) = wallet_header(&headers) else {
		return error_reply(
			StatusCode::UNAUTHORIZED,
			"Wallet address required. Include X-Wallet-Address header.",
		);
	};
	let released = state.sessions.release(&wallet);
	Json(ReleaseReply { released }).into_response()
}

pub(super) async fn config(State(state): State<AppState>) -> Json<AccessConfigReply> {
	let config = &state.config;
	Json(AccessConfigReply {
		payment_enabled: config.payment_enabled,
		session_duration_minutes: config.session_duration.as_secs() / 60,
		session_price: config
			.payment_enabled
			.then(|| config.session_price.clone()),
	})
}

fn session_view(session: &Session, now: u64) -> SessionView {
	SessionView {
		active: true,
		robot_host: Some(session.robot_host.clone()),
		expires_at: Some(session.expires_at),
		remaining_seconds: Some(session.remaining_secs(now)),
	}
}

fn conflict_detail(conflict: &Conflict, robot_host: &str) -> String {
	match conflict {
		Conflict::RobotInUse { .. } => {
			format!("Robot '{robot_host}' is currently in use by another user.")
		}
		Conflict::WalletBound { robot_host } => {
			format!("Wallet already controls '{robot_host}' for this session.")
		}
	}
}
