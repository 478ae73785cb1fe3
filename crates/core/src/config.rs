use std::time::Duration;

/// Runtime policy for the broker engine.
///
/// Read-only after startup; the engine never mutates it.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
	/// When false, every purchase is granted without settlement.
	pub payment_enabled: bool,
	/// Recipient address for settlements.
	pub payment_address: String,
	/// Chain identifier advertised in price quotes, e.g. `"base-sepolia"`.
	pub network: String,
	/// Base URL of the x402 facilitator.
	pub facilitator_url: String,
	/// Price advertised in quotes, e.g. `"$0.10"`.
	pub session_price: String,
	/// How long one purchased session lasts.
	pub session_duration: Duration,
	/// Period of the expiry sweeper task.
	pub sweep_interval: Duration,
	/// Timeout for robot motor/camera requests.
	pub robot_timeout: Duration,
}

impl Default for BrokerConfig {
	fn default() -> Self {
		Self {
			payment_enabled: false,
			payment_address: String::new(),
			network: "base-sepolia".to_string(),
			facilitator_url: "https://x402.org/facilitator".to_string(),
			session_price: "$0.10".to_string(),
			session_duration: Duration::from_secs(10 * 60),
			sweep_interval: Duration::from_secs(30),
			robot_timeout: Duration::from_secs(5),
		}
	}
}
