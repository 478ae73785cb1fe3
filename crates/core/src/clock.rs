//! Time source for expiry arithmetic.
//!
//! All expiry decisions compare against a [`Clock`] rather than calling
//! into `std::time` directly, so session lifetimes are testable without
//! sleeping.

use std::time::{SystemTime, UNIX_EPOCH};

/// Provider of the current unix time in seconds.
pub trait Clock: Send + Sync + 'static {
	fn now(&self) -> u64;
}

/// Wall-clock time from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> u64 {
		SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.unwrap_or_default()
			.as_secs()
	}
}

#[cfg(test)]
pub(crate) mod testing {
	use std::sync::atomic::{AtomicU64, Ordering};

	use super::Clock;

	/// Hand-cranked clock for expiry tests.
	#[derive(Debug, Default)]
	pub struct ManualClock(AtomicU64);

	impl ManualClock {
		pub fn at(secs: u64) -> Self {
			Self(AtomicU64::new(secs))
		}

		pub fn advance(&self, secs: u64) {
			self.0.fetch_add(secs, Ordering::SeqCst);
		}

		pub fn set(&self, secs: u64) {
			self.0.store(secs, Ordering::SeqCst);
		}
	}

	impl Clock for ManualClock {
		fn now(&self) -> u64 {
			self.0.load(Ordering::SeqCst)
		}
	}
}
