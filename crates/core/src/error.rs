use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Faults from the engine and its HTTP collaborators.
///
/// Expected branches of a purchase (payment required, conflict, rejected
/// proof) are not errors; they are variants of
/// [`PurchaseOutcome`](crate::session::PurchaseOutcome).
#[derive(Debug, Error)]
pub enum CoreError {
	/// The settlement facilitator could not be reached or answered
	/// malformed data. Distinct from a refused proof.
	#[error("settlement facilitator unavailable: {0}")]
	Facilitator(String),

	#[error(transparent)]
	Http(#[from] reqwest::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
