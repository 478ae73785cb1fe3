//! Payment gate: decides whether a purchase may proceed and at what cost.
//!
//! The gate itself is stateless per call; policy (enabled flag, price,
//! recipient, network) is fixed at startup. Settlement happens through the
//! [`Settlement`] collaborator and involves a network round trip, so the
//! session service always finishes here before touching the lock table.

use async_trait::async_trait;
use teleop_protocol::{PaymentPayload, PriceQuote};
use tracing::debug;

use crate::config::BrokerConfig;
use crate::error::Result;

/// Outcome of the payment gate for one purchase attempt.
#[derive(Debug, Clone)]
pub enum PaymentDecision {
	/// Payments disabled: the grant proceeds without settlement. The
	/// session is still time-bounded.
	FreePass,
	/// Payment needed and no proof was attached. An expected branch, not
	/// a fault; the caller retries with a proof for this quote.
	Required(PriceQuote),
	/// Proof settled; `tx` is the on-chain settlement reference.
	Verified { tx: String },
	/// Proof refused by the facilitator. Proofs are single-use, so this
	/// is surfaced verbatim and never retried here.
	Rejected { reason: String },
}

/// Facilitator verdict for one proof.
#[derive(Debug, Clone)]
pub enum SettleVerdict {
	Settled { tx: String },
	Refused { reason: String },
}

/// Collaborator that verifies and settles x402 payment proofs.
#[async_trait]
pub trait Settlement: Send + Sync {
	/// Checks `payload` against `quote` and, if valid, settles it.
	///
	/// Errors mean the facilitator itself misbehaved (unreachable,
	/// malformed reply); an invalid proof is a `Refused` verdict.
	async fn settle(&self, payload: &PaymentPayload, quote: &PriceQuote) -> Result<SettleVerdict>;
}

/// Payment policy plus its settlement collaborator.
pub struct PaymentGate {
	enabled: bool,
	price: String,
	pay_to: String,
	network: String,
	duration_minutes: u64,
	settlement: Box<dyn Settlement>,
}

impl PaymentGate {
	pub fn new(config: &BrokerConfig, settlement: Box<dyn Settlement>) -> Self {
		Self {
			enabled: config.payment_enabled && !config.payment_address.is_empty(),
			price: config.session_price.clone(),
			pay_to: config.payment_address.clone(),
			network: config.network.clone(),
			duration_minutes: config.session_duration.as_secs() / 60,
			settlement,
		}
	}

	pub fn enabled(&self) -> bool {
		self.enabled
	}

	/// The quote a caller must satisfy to control `robot_host`.
	pub fn quote_for(&self, robot_host: &str) -> PriceQuote {
		PriceQuote {
			scheme: "exact".to_string(),
			network: self.network.clone(),
			max_amount_required: self.price.clone(),
			resource: "/api/v1/access/purchase".to_string(),
			description: format!(
				"{} minutes of control of '{}'",
				self.duration_minutes, robot_host
			),
			pay_to: self.pay_to.clone(),
			max_timeout_seconds: 60,
			asset: None,
		}
	}

	/// Runs the gate for one purchase attempt.
	pub async fn evaluate(
		&self,
		wallet: &str,
		robot_host: &str,
		proof: Option<&PaymentPayload>,
	) -> Result<PaymentDecision> {
		if !self.enabled {
			return Ok(PaymentDecision::FreePass);
		}

		let quote = self.quote_for(robot_host);
		let Some(payload) = proof else {
			debug!(
				target = "teleop.payment",
				wallet = %wallet,
				robot = %robot_host,
				"no proof attached; challenging caller"
			);
			return Ok(PaymentDecision::Required(quote));
		};

		match self.settlement.settle(payload, &quote).await? {
			SettleVerdict::Settled { tx } => {
				debug!(
					target = "teleop.payment",
					wallet = %wallet,
					tx = %tx,
					"payment settled"
				);
				Ok(PaymentDecision::Verified { tx })
			}
			SettleVerdict::Refused { reason } => {
				debug!(
					target = "teleop.payment",
					wallet = %wallet,
					reason = %reason,
					"payment refused"
				);
				Ok(PaymentDecision::Rejected { reason })
			}
		}
	}
}


#[cfg(test)]
mod tests {
	use super::testing::{StaticSettlement, proof};
	use super::*;
	use crate::config::BrokerConfig;

	fn gate(enabled: bool, verdict: SettleVerdict) -> PaymentGate {
		let config = BrokerConfig {
			payment_enabled: enabled,
			payment_address: "0xrecipient".into(),
			..BrokerConfig::default()
		};
		PaymentGate::new(&config, Box::new(StaticSettlement(verdict)))
	}

	#[tokio::test]
	async fn disabled_gate_always_free_passes() {
		let gate = gate(false, SettleVerdict::Refused { reason: "unused".into() });
		// No proof required, settlement never consulted.
		let decision = gate.evaluate("0xaaa", "bot-1", None).await.unwrap();
		assert!(matches!(decision, PaymentDecision::FreePass));
	}

	#[tokio::test]
	async fn enabled_gate_without_proof_challenges() {
		let gate = gate(true, SettleVerdict::Settled { tx: "0xfeed".into() });
		let decision = gate.evaluate("0xaaa", "bot-1", None).await.unwrap();
		match decision {
			PaymentDecision::Required(quote) => {
				assert_eq!(quote.pay_to, "0xrecipient");
				assert_eq!(quote.max_amount_required, "$0.10");
				assert!(quote.description.contains("bot-1"));
			}
			other => panic!("expected Required, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn enabled_gate_with_proof_settles() {
		let gate = gate(true, SettleVerdict::Settled { tx: "0xfeed".into() });
		let decision = gate.evaluate("0xaaa", "bot-1", Some(&proof())).await.unwrap();
		assert!(matches!(decision, PaymentDecision::Verified { tx } if tx == "0xfeed"));
	}

	#[tokio::test]
	async fn refused_proof_is_surfaced_not_retried() {
		let gate = gate(true, SettleVerdict::Refused { reason: "insufficient funds".into() });
		let decision = gate.evaluate("0xaaa", "bot-1", Some(&proof())).await.unwrap();
		assert!(
			matches!(decision, PaymentDecision::Rejected { reason } if reason == "insufficient funds")
		);
	}

	#[tokio::test]
	async fn enabled_without_recipient_falls_back_to_free() {
		let config = BrokerConfig {
			payment_enabled: true,
			payment_address: String::new(),
			..BrokerConfig::default()
		};
		let gate = PaymentGate::new(
			&config,
			Box::new(StaticSettlement(SettleVerdict::Refused { reason: "unused".into() })),
		);
		assert!(!gate.enabled());
		let decision = gate.evaluate("0xaaa", "bot-1", None).await.unwrap();
		assert!(matches!(decision, PaymentDecision::FreePass));
	}
}
