//! The robot lock table: sole authority on who holds what, until when.
//!
//! Two indices back the table: `locks` maps a robot host to its current
//! claim, `wallets` maps a wallet to the robot it holds. Both mutate only
//! inside [`LockTable`] methods, and callers serialize those through one
//! mutex, so the pair is never observed torn. Expiry is decided against
//! the caller-supplied `now` on every read — table membership alone never
//! proves a claim is live, since the sweeper runs on its own cadence.

use std::collections::HashMap;

/// Exclusive, time-bounded claim on one robot by one wallet.
///
/// This is the session record: the settlement reference rides along so the
/// caller-visible session can be derived from the table alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotLock {
	pub robot_host: String,
	pub holder: String,
	pub acquired_at: u64,
	pub expires_at: u64,
	pub payment_tx: Option<String>,
}

impl RobotLock {
	pub fn is_live(&self, now: u64) -> bool {
		now < self.expires_at
	}
}

/// Why an acquire attempt was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
	/// The robot is held by a different wallet with a live claim.
	RobotInUse { holder: String },
	/// The wallet already holds a live claim (renewal is not supported,
	/// so this includes re-purchasing the same robot before expiry).
	WalletBound { robot_host: String },
}

/// Two-index map of robot claims.
#[derive(Debug, Default)]
pub struct LockTable {
	/// Claims indexed by robot host.
	locks: HashMap<String, RobotLock>,
	/// Inverse index: wallet -> robot host it holds.
	wallets: HashMap<String, String>,
}

impl LockTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Claims `robot_host` for `wallet`, or reports why it cannot.
	///
	/// The availability check and the double insert happen inside one call;
	/// the caller's mutex makes the whole step indivisible with respect to
	/// concurrent acquires, releases, and sweeps. Expired claims standing
	/// in the way are evicted here rather than waiting for the sweeper.
	pub fn try_acquire(
		&mut self,
		wallet: &str,
		robot_host: &str,
		now: u64,
		duration_secs: u64,
		payment_tx: Option<String>,
	) -> Result<RobotLock, Conflict> {
		self.evict_if_expired(robot_host, now);
		if let Some(held) = self.wallets.get(wallet).cloned() {
			self.evict_if_expired(&held, now);
		}

		if let Some(existing) = self.locks.get(robot_host) {
			if existing.holder != wallet {
				return Err(Conflict::RobotInUse {
					holder: existing.holder.clone(),
				});
			}
			return Err(Conflict::WalletBound {
				robot_host: existing.robot_host.clone(),
			});
		}
		if let Some(held) = self.wallets.get(wallet) {
			return Err(Conflict::WalletBound {
				robot_host: held.clone(),
			});
		}

		let lock = RobotLock {
			robot_host: robot_host.to_string(),
			holder: wallet.to_string(),
			acquired_at: now,
			expires_at: now + duration_secs,
			payment_tx,
		};
		self.locks.insert(robot_host.to_string(), lock.clone());
		self.wallets.insert(wallet.to_string(), robot_host.to_string());
		Ok(lock)
	}

	/// Removes the wallet's claim from both indices. Idempotent.
	pub fn release(&mut self, wallet: &str) -> Option<RobotLock> {
		let robot_host = self.wallets.remove(wallet)?;
		match self.locks.get(&robot_host) {
			Some(lock) if lock.holder == wallet => self.locks.remove(&robot_host),
			_ => None,
		}
	}

	/// The wallet's claim, if still live at `now`.
	pub fn lock_for(&self, wallet: &str, now: u64) -> Option<&RobotLock> {
		let robot_host = self.wallets.get(wallet)?;
		self.locks
			.get(robot_host)
			.filter(|lock| lock.holder == wallet && lock.is_live(now))
	}

	/// The wallet holding `robot_host`, if its claim is still live at `now`.
	pub fn holder_of(&self, robot_host: &str, now: u64) -> Option<&str> {
		self.locks
			.get(robot_host)
			.filter(|lock| lock.is_live(now))
			.map(|lock| lock.holder.as_str())
	}

	/// Removes every claim whose expiry has passed. Returns the count.
	pub fn sweep_expired(&mut self, now: u64) -> usize {
		let expired: Vec<String> = self
			.locks
			.values()
			.filter(|lock| !lock.is_live(now))
			.map(|lock| lock.robot_host.clone())
			.collect();
		for robot_host in &expired {
			self.evict_if_expired(robot_host, now);
		}
		expired.len()
	}

	pub fn len(&self) -> usize {
		self.locks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.locks.is_empty()
	}

	fn evict_if_expired(&mut self, robot_host: &str, now: u64) {
		let Some(lock) = self.locks.get(robot_host) else {
			return;
		};
		if lock.is_live(now) {
			return;
		}
		let holder = lock.holder.clone();
		self.locks.remove(robot_host);
		if self.wallets.get(&holder).map(String::as_str) == Some(robot_host) {
			self.wallets.remove(&holder);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MIN_10: u64 = 600;

	#[test]
	fn first_acquire_wins_second_conflicts() {
		let mut table = LockTable::new();
		let lock = table.try_acquire("0xaaa", "bot-1", 100, MIN_10, None).unwrap();
		assert_eq!(lock.expires_at, 700);

		let err = table.try_acquire("0xbbb", "bot-1", 101, MIN_10, None).unwrap_err();
		assert_eq!(err, Conflict::RobotInUse { holder: "0xaaa".into() });
	}

	#[test]
	fn wallet_cannot_hold_two_robots() {
		let mut table = LockTable::new();
		table.try_acquire("0xaaa", "bot-1", 100, MIN_10, None).unwrap();

		let err = table.try_acquire("0xaaa", "bot-2", 101, MIN_10, None).unwrap_err();
		assert_eq!(err, Conflict::WalletBound { robot_host: "bot-1".into() });

		// The losing attempt left the original claim untouched.
		assert_eq!(table.holder_of("bot-1", 101), Some("0xaaa"));
		assert_eq!(table.holder_of("bot-2", 101), None);
	}

	#[test]
	fn same_wallet_same_robot_is_not_a_renewal() {
		let mut table = LockTable::new();
		table.try_acquire("0xaaa", "bot-1", 100, MIN_10, None).unwrap();

		let err = table.try_acquire("0xaaa", "bot-1", 200, MIN_10, None).unwrap_err();
		assert_eq!(err, Conflict::WalletBound { robot_host: "bot-1".into() });

		// Expiry was not extended by the refused attempt.
		assert_eq!(table.lock_for("0xaaa", 200).unwrap().expires_at, 700);
	}

	#[test]
	fn expired_claim_is_free_without_a_sweep() {
		let mut table = LockTable::new();
		table.try_acquire("0xaaa", "bot-1", 100, MIN_10, None).unwrap();

		// Visible before expiry, gone at the boundary.
		assert_eq!(table.holder_of("bot-1", 699), Some("0xaaa"));
		assert_eq!(table.holder_of("bot-1", 700), None);
		assert!(table.lock_for("0xaaa", 700).is_none());

		// A new wallet can claim it even though the sweeper never ran,
		// and the stale holder's inverse entry goes with it.
		let lock = table.try_acquire("0xbbb", "bot-1", 700, MIN_10, None).unwrap();
		assert_eq!(lock.holder, "0xbbb");
		assert!(table.try_acquire("0xaaa", "bot-2", 700, MIN_10, None).is_ok());
	}

	#[test]
	fn release_is_idempotent_and_scoped() {
		let mut table = LockTable::new();
		table.try_acquire("0xaaa", "bot-1", 100, MIN_10, None).unwrap();
		table.try_acquire("0xbbb", "bot-2", 100, MIN_10, None).unwrap();

		assert!(table.release("0xaaa").is_some());
		assert!(table.release("0xaaa").is_none());
		assert!(table.release("0xccc").is_none());

		// Other wallets' claims are unaffected.
		assert_eq!(table.holder_of("bot-2", 101), Some("0xbbb"));
		assert_eq!(table.holder_of("bot-1", 101), None);
	}

	#[test]
	fn released_robot_can_be_reacquired_immediately() {
		let mut table = LockTable::new();
		table.try_acquire("0xaaa", "bot-1", 100, MIN_10, None).unwrap();
		table.release("0xaaa");
		assert!(table.try_acquire("0xbbb", "bot-1", 101, MIN_10, None).is_ok());
	}

	#[test]
	fn sweep_removes_exactly_the_elapsed_entries() {
		let mut table = LockTable::new();
		table.try_acquire("0xaaa", "bot-1", 0, 100, None).unwrap();
		table.try_acquire("0xbbb", "bot-2", 0, 200, None).unwrap();
		table.try_acquire("0xccc", "bot-3", 0, 300, None).unwrap();

		// Between the first and second expiry: one entry goes, from both indices.
		assert_eq!(table.sweep_expired(150), 1);
		assert_eq!(table.len(), 2);
		assert!(table.try_acquire("0xaaa", "bot-1", 150, 100, None).is_ok());

		assert_eq!(table.sweep_expired(1000), 3);
		assert!(table.is_empty());
	}

	#[test]
	fn payment_tx_rides_on_the_claim() {
		let mut table = LockTable::new();
		let lock = table
			.try_acquire("0xaaa", "bot-1", 100, MIN_10, Some("0xfeed".into()))
			.unwrap();
		assert_eq!(lock.payment_tx.as_deref(), Some("0xfeed"));
		assert_eq!(
			table.lock_for("0xaaa", 101).unwrap().payment_tx.as_deref(),
			Some("0xfeed")
		);
	}
}
