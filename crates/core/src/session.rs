//! Session lifecycle: purchase, status, release.
//!
//! `SessionService` owns the lock table behind one mutex and drives the
//! two-phase purchase protocol: payment settles first (no table lock
//! held across that round trip), then one atomic acquire installs both
//! index entries or reports a conflict. A conflict is only ever reported
//! after the winning claim is fully installed, so no caller observes a
//! half-granted session.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use teleop_protocol::{PaymentPayload, PriceQuote};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::Result;
use crate::lock::{Conflict, LockTable, RobotLock};
use crate::payment::{PaymentDecision, PaymentGate};

/// Caller-visible view of one grant of control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
	pub wallet: String,
	pub robot_host: String,
	pub issued_at: u64,
	pub expires_at: u64,
	pub payment_tx: Option<String>,
}

impl Session {
	pub fn remaining_secs(&self, now: u64) -> u64 {
		self.expires_at.saturating_sub(now)
	}

	fn from_lock(lock: RobotLock) -> Self {
		Self {
			wallet: lock.holder,
			robot_host: lock.robot_host,
			issued_at: lock.acquired_at,
			expires_at: lock.expires_at,
			payment_tx: lock.payment_tx,
		}
	}
}

/// Result of one purchase attempt.
///
/// The transport layer maps these to distinct signals (grant / 402 / 409);
/// none of them is a fault.
#[derive(Debug, Clone)]
pub enum PurchaseOutcome {
	Granted(Session),
	PaymentRequired(PriceQuote),
	Conflict(Conflict),
	PaymentRejected { reason: String },
}

pub struct SessionService {
	table: Mutex<LockTable>,
	gate: PaymentGate,
	clock: Arc<dyn Clock>,
	duration_secs: u64,
}

impl SessionService {
	pub fn new(gate: PaymentGate, clock: Arc<dyn Clock>, session_duration: Duration) -> Self {
		Self {
			table: Mutex::new(LockTable::new()),
			gate,
			clock,
			duration_secs: session_duration.as_secs(),
		}
	}

	pub fn now(&self) -> u64 {
		self.clock.now()
	}

	/// Runs the purchase protocol for one wallet/robot pair.
	///
	/// An advisory availability check runs before the gate so obviously
	/// doomed attempts are refused without charging; the acquire after
	/// settlement remains the authoritative check.
	pub async fn purchase(
		&self,
		wallet: &str,
		robot_host: &str,
		proof: Option<&PaymentPayload>,
	) -> Result<PurchaseOutcome> {
		let wallet = normalize(wallet);
		let robot_host = normalize(robot_host);

		if let Some(conflict) = self.availability_conflict(&wallet, &robot_host) {
			return Ok(PurchaseOutcome::Conflict(conflict));
		}

		let payment_tx = match self.gate.evaluate(&wallet, &robot_host, proof).await? {
			PaymentDecision::FreePass => None,
			PaymentDecision::Verified { tx } => Some(tx),
			PaymentDecision::Required(quote) => {
				return Ok(PurchaseOutcome::PaymentRequired(quote));
			}
			PaymentDecision::Rejected { reason } => {
				return Ok(PurchaseOutcome::PaymentRejected { reason });
			}
		};

		let now = self.clock.now();
		let acquired = self.table.lock().try_acquire(
			&wallet,
			&robot_host,
			now,
			self.duration_secs,
			payment_tx.clone(),
		);

		match acquired {
			Ok(lock) => {
				info!(
					target = "teleop.session",
					wallet = %wallet,
					robot = %robot_host,
					expires_at = lock.expires_at,
					tx = payment_tx.as_deref().unwrap_or("-"),
					"session granted"
				);
				Ok(PurchaseOutcome::Granted(Session::from_lock(lock)))
			}
			Err(conflict) => {
				if let Some(tx) = &payment_tx {
					// Settled payment with no grant: nothing here can
					// refund it, so leave a loud trail for manual
					// reconciliation.
					warn!(
						target = "teleop.session",
						wallet = %wallet,
						robot = %robot_host,
						tx = %tx,
						conflict = ?conflict,
						"verified payment lost the acquire race; grant refused"
					);
				}
				Ok(PurchaseOutcome::Conflict(conflict))
			}
		}
	}

	/// The wallet's live session, if any. Read-only, time-derived.
	pub fn status(&self, wallet: &str) -> Option<Session> {
		let now = self.clock.now();
		self.table
			.lock()
			.lock_for(&normalize(wallet), now)
			.cloned()
			.map(Session::from_lock)
	}

	/// The robot bound to the wallet's live session.
	pub fn robot_for(&self, wallet: &str) -> Option<String> {
		self.status(wallet).map(|s| s.robot_host)
	}

	/// Ends the wallet's session immediately. Idempotent; true when a
	/// claim was actually removed.
	pub fn release(&self, wallet: &str) -> bool {
		let wallet = normalize(wallet);
		match self.table.lock().release(&wallet) {
			Some(lock) => {
				info!(
					target = "teleop.session",
					wallet = %wallet,
					robot = %lock.robot_host,
					"session released"
				);
				true
			}
			None => false,
		}
	}

	/// The quote a caller must satisfy to control `robot_host`.
	pub fn quote_for(&self, robot_host: &str) -> PriceQuote {
		self.gate.quote_for(&normalize(robot_host))
	}

	/// Live holder of `robot_host`, unmasked.
	pub fn holder_of(&self, robot_host: &str) -> Option<String> {
		let now = self.clock.now();
		self.table
			.lock()
			.holder_of(&normalize(robot_host), now)
			.map(str::to_string)
	}

	/// Removes every expired claim. Returns the eviction count.
	pub fn sweep_now(&self) -> usize {
		let now = self.clock.now();
		self.table.lock().sweep_expired(now)
	}

	fn availability_conflict(&self, wallet: &str, robot_host: &str) -> Option<Conflict> {
		let now = self.clock.now();
		let table = self.table.lock();
		if let Some(holder) = table.holder_of(robot_host, now) {
			if holder != wallet {
				return Some(Conflict::RobotInUse {
					holder: holder.to_string(),
				});
			}
			return Some(Conflict::WalletBound {
				robot_host: robot_host.to_string(),
			});
		}
		if let Some(lock) = table.lock_for(wallet, now) {
			return Some(Conflict::WalletBound {
				robot_host: lock.robot_host.clone(),
			});
		}
		None
	}
}

fn normalize(raw: &str) -> String {
	raw.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::testing::ManualClock;
	use crate::config::BrokerConfig;
	use crate::payment::testing::{StaticSettlement, proof};
	use crate::payment::SettleVerdict;

	const DURATION: Duration = Duration::from_secs(600);

	fn service_with(
		payment_enabled: bool,
		verdict: SettleVerdict,
		clock: Arc<ManualClock>,
	) -> SessionService {
		let config = BrokerConfig {
			payment_enabled,
			payment_address: "0xrecipient".into(),
			..BrokerConfig::default()
		};
		let gate = PaymentGate::new(&config, Box::new(StaticSettlement(verdict)));
		SessionService::new(gate, clock, DURATION)
	}

	fn free_service(clock: Arc<ManualClock>) -> SessionService {
		service_with(false, SettleVerdict::Refused { reason: "unused".into() }, clock)
	}

	#[tokio::test]
	async fn free_purchase_never_challenges() {
		let clock = Arc::new(ManualClock::at(1_000));
		let service = free_service(clock);

		let outcome = service.purchase("0xAAA", "Bot-1", None).await.unwrap();
		match outcome {
			PurchaseOutcome::Granted(session) => {
				// Identifiers are normalized, the grant is time-bounded
				// even without payment.
				assert_eq!(session.wallet, "0xaaa");
				assert_eq!(session.robot_host, "bot-1");
				assert_eq!(session.expires_at, 1_600);
				assert!(session.payment_tx.is_none());
			}
			other => panic!("expected grant, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn concurrent_purchases_have_one_winner() {
		let clock = Arc::new(ManualClock::at(1_000));
		let service = Arc::new(free_service(clock));

		let mut handles = Vec::new();
		for i in 0..8 {
			let service = Arc::clone(&service);
			handles.push(tokio::spawn(async move {
				service.purchase(&format!("0x{i:03}"), "bot-1", None).await.unwrap()
			}));
		}

		let mut granted = 0;
		let mut conflicts = 0;
		for handle in handles {
			match handle.await.unwrap() {
				PurchaseOutcome::Granted(_) => granted += 1,
				PurchaseOutcome::Conflict(Conflict::RobotInUse { .. }) => conflicts += 1,
				other => panic!("unexpected outcome {other:?}"),
			}
		}
		assert_eq!(granted, 1);
		assert_eq!(conflicts, 7);
	}

	#[tokio::test]
	async fn one_robot_per_wallet() {
		let clock = Arc::new(ManualClock::at(0));
		let service = free_service(clock);

		assert!(matches!(
			service.purchase("0xaaa", "bot-1", None).await.unwrap(),
			PurchaseOutcome::Granted(_)
		));
		let outcome = service.purchase("0xaaa", "bot-2", None).await.unwrap();
		assert!(matches!(
			outcome,
			PurchaseOutcome::Conflict(Conflict::WalletBound { robot_host }) if robot_host == "bot-1"
		));

		// The held claim is untouched by the refused attempt.
		assert_eq!(service.status("0xaaa").unwrap().robot_host, "bot-1");
		assert!(service.holder_of("bot-2").is_none());
	}

	#[tokio::test]
	async fn expiry_is_time_derived_not_sweep_derived() {
		let clock = Arc::new(ManualClock::at(100));
		let service = free_service(Arc::clone(&clock));

		service.purchase("0xaaa", "bot-1", None).await.unwrap();

		clock.set(699);
		let session = service.status("0xaaa").unwrap();
		assert_eq!(session.remaining_secs(clock.now()), 1);

		// At the boundary the session is gone even though nothing swept.
		clock.set(700);
		assert!(service.status("0xaaa").is_none());
		assert!(service.holder_of("bot-1").is_none());

		// And the robot is immediately purchasable by someone else.
		assert!(matches!(
			service.purchase("0xbbb", "bot-1", None).await.unwrap(),
			PurchaseOutcome::Granted(_)
		));
	}

	#[tokio::test]
	async fn release_is_idempotent() {
		let clock = Arc::new(ManualClock::at(0));
		let service = free_service(clock);

		service.purchase("0xaaa", "bot-1", None).await.unwrap();
		assert!(service.release("0xaaa"));
		assert!(!service.release("0xaaa"));
		assert!(service.status("0xaaa").is_none());
	}

	#[tokio::test]
	async fn paid_purchase_round_trip() {
		let clock = Arc::new(ManualClock::at(0));
		let service = service_with(
			true,
			SettleVerdict::Settled { tx: "0xfeed".into() },
			clock,
		);

		// No proof: challenged with a quote, no lock created.
		let outcome = service.purchase("0xaaa", "bot-1", None).await.unwrap();
		match outcome {
			PurchaseOutcome::PaymentRequired(quote) => {
				assert_eq!(quote.pay_to, "0xrecipient");
			}
			other => panic!("expected challenge, got {other:?}"),
		}
		assert!(service.status("0xaaa").is_none());

		// With proof: settled and granted with the tx reference.
		let outcome = service.purchase("0xaaa", "bot-1", Some(&proof())).await.unwrap();
		match outcome {
			PurchaseOutcome::Granted(session) => {
				assert_eq!(session.payment_tx.as_deref(), Some("0xfeed"));
			}
			other => panic!("expected grant, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn rejected_proof_creates_no_lock() {
		let clock = Arc::new(ManualClock::at(0));
		let service = service_with(
			true,
			SettleVerdict::Refused { reason: "invalid signature".into() },
			clock,
		);

		let outcome = service.purchase("0xaaa", "bot-1", Some(&proof())).await.unwrap();
		assert!(matches!(
			outcome,
			PurchaseOutcome::PaymentRejected { reason } if reason == "invalid signature"
		));
		assert!(service.status("0xaaa").is_none());
		assert!(service.holder_of("bot-1").is_none());
	}

	#[tokio::test]
	async fn held_robot_refuses_before_charging() {
		let clock = Arc::new(ManualClock::at(0));
		let service = service_with(
			true,
			SettleVerdict::Settled { tx: "0xfeed".into() },
			clock,
		);

		service.purchase("0xaaa", "bot-1", Some(&proof())).await.unwrap();

		// The advisory precheck fires before the gate, so no challenge
		// and no settlement happen for a robot already held.
		let outcome = service.purchase("0xbbb", "bot-1", None).await.unwrap();
		assert!(matches!(
			outcome,
			PurchaseOutcome::Conflict(Conflict::RobotInUse { holder }) if holder == "0xaaa"
		));
	}

	#[tokio::test]
	async fn sweep_evicts_staggered_expiries_in_order() {
		let clock = Arc::new(ManualClock::at(0));
		let config = BrokerConfig {
			session_duration: Duration::from_secs(100),
			..BrokerConfig::default()
		};
		let gate = PaymentGate::new(
			&config,
			Box::new(StaticSettlement(SettleVerdict::Refused { reason: "unused".into() })),
		);
		let service = SessionService::new(gate, Arc::clone(&clock) as Arc<dyn Clock>, Duration::from_secs(100));

		service.purchase("0xaaa", "bot-1", None).await.unwrap();
		clock.set(50);
		service.purchase("0xbbb", "bot-2", None).await.unwrap();
		clock.set(80);
		service.purchase("0xccc", "bot-3", None).await.unwrap();

		// Between the first and second expiry only one entry goes.
		clock.set(120);
		assert_eq!(service.sweep_now(), 1);
		assert!(service.status("0xaaa").is_none());
		assert!(service.status("0xbbb").is_some());

		clock.set(500);
		assert_eq!(service.sweep_now(), 2);
	}
}
