//! Request/response bodies for the broker HTTP API.

use serde::{Deserialize, Serialize};

/// Header carrying the caller-asserted wallet identity.
///
/// The broker binds sessions to whatever identifier arrives here; it does
/// not authenticate it.
pub const WALLET_HEADER: &str = "x-wallet-address";

/// Header carrying a base64-encoded x402 payment proof.
pub const PAYMENT_HEADER: &str = "x-payment";

/// Caller-visible view of a control session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
	pub active: bool,
	/// mDNS name or IP the session is bound to.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub robot_host: Option<String>,
	/// Unix seconds at which control lapses.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub remaining_seconds: Option<u64>,
}

impl SessionView {
	/// View for a wallet with nothing held.
	pub fn inactive() -> Self {
		Self {
			active: false,
			robot_host: None,
			expires_at: None,
			remaining_seconds: None,
		}
	}
}

/// Request to purchase control of a robot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
	/// mDNS name or IP of the robot.
	pub robot_host: String,
}

/// Response after a granted purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReply {
	pub status: String,
	pub message: String,
	pub session: SessionView,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub payment_tx: Option<String>,
}

/// Response after an explicit release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseReply {
	/// False when the wallet held nothing (release is idempotent).
	pub released: bool,
}

/// Payment policy advertised to frontends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfigReply {
	pub payment_enabled: bool,
	pub session_duration_minutes: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub session_price: Option<String>,
}

/// Response for motor commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandReply {
	pub status: String,
	pub command: String,
}

/// Combined reachability and availability report for one robot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotStatusReply {
	/// mDNS name or IP used to query.
	pub robot_host: String,
	pub motor_online: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub motor_ip: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub motor_mdns: Option<String>,
	pub camera_online: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub camera_ip: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub camera_mdns: Option<String>,
	/// True only when both interfaces are online and no live lock exists.
	pub available: bool,
	/// Masked holder wallet, when locked.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub locked_by: Option<String>,
}

/// Error body used for 4xx/5xx replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReply {
	pub detail: String,
}

/// Masks a wallet address for display (first 6 and last 4 chars).
pub fn mask_wallet(wallet: &str) -> String {
	if wallet.len() <= 10 {
		return wallet.to_string();
	}
	format!("{}...{}", &wallet[..6], &wallet[wallet.len() - 4..])
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mask_wallet_keeps_short_identifiers() {
		assert_eq!(mask_wallet("0xabc"), "0xabc");
	}

	#[test]
	fn mask_wallet_elides_middle() {
		let masked = mask_wallet("0x1234567890abcdef1234567890abcdef12345678");
		assert_eq!(masked, "0x1234...5678");
	}

	#[test]
	fn inactive_session_serializes_without_optionals() {
		let json = serde_json::to_string(&SessionView::inactive()).unwrap();
		assert_eq!(json, r#"{"active":false}"#);
	}

	#[test]
	fn robot_status_round_trips() {
		let reply = RobotStatusReply {
			robot_host: "finland-tumbller-01".into(),
			motor_online: true,
			motor_ip: Some("192.168.1.40".into()),
			motor_mdns: Some("finland-tumbller-01".into()),
			camera_online: false,
			camera_ip: None,
			camera_mdns: None,
			available: false,
			locked_by: Some("0x1234...5678".into()),
		};
		let back: RobotStatusReply =
			serde_json::from_str(&serde_json::to_string(&reply).unwrap()).unwrap();
		assert!(!back.available);
		assert_eq!(back.locked_by.as_deref(), Some("0x1234...5678"));
	}
}
