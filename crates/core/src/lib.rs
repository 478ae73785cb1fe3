//! Session, lock and payment engine for the teleop access broker.
//!
//! One process owns the lock table: a two-index map deciding which wallet
//! controls which robot, until when. Purchases run payment verification
//! first (never under the table's mutex), then a single atomic acquire.
//! Everything external — robot firmware, payment settlement — sits behind
//! an HTTP client or a trait.

pub mod clock;
pub mod config;
pub mod error;
pub mod facilitator;
pub mod lock;
pub mod payment;
pub mod robot;
pub mod session;
pub mod sweeper;

pub use clock::{Clock, SystemClock};
pub use config::BrokerConfig;
pub use error::{CoreError, Result};
pub use facilitator::FacilitatorClient;
pub use lock::{Conflict, LockTable, RobotLock};
pub use payment::{PaymentDecision, PaymentGate, SettleVerdict, Settlement};
pub use robot::{MotorCommand, RobotClient, RobotStatus, probe};
pub use session::{PurchaseOutcome, Session, SessionService};
