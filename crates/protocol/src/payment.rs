//! x402 payment types and the `X-PAYMENT` header codec.
//!
//! The x402 flow is carried over plain HTTP: a protected endpoint answers
//! `402` with a [`PaymentRequiredReply`] describing acceptable payment, the
//! client retries with a base64-encoded [`PaymentPayload`] in the
//! `X-PAYMENT` header, and the broker forwards that proof to a facilitator
//! for verification and settlement. The proof's inner `payload` is opaque
//! here; only the facilitator interprets it.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// Protocol version sent in 402 bodies and payment payloads.
pub const X402_VERSION: u32 = 1;

/// Machine-readable description of one acceptable payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
	/// Settlement scheme, e.g. `"exact"`.
	pub scheme: String,
	/// Chain identifier, e.g. `"base-sepolia"`.
	pub network: String,
	/// Price in the scheme's units, e.g. `"$0.10"`.
	pub max_amount_required: String,
	/// Path of the protected resource this quote unlocks.
	pub resource: String,
	pub description: String,
	/// Recipient address for the settlement.
	pub pay_to: String,
	/// Seconds the caller has to settle against this quote.
	pub max_timeout_seconds: u64,
	/// Optional asset (token contract) the scheme settles in.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub asset: Option<String>,
}

/// Body of a `402 Payment Required` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredReply {
	pub x402_version: u32,
	/// Why payment is (still) required, e.g. a rejection reason on retry.
	pub error: String,
	pub accepts: Vec<PriceQuote>,
}

impl PaymentRequiredReply {
	pub fn new(error: impl Into<String>, quote: PriceQuote) -> Self {
		Self {
			x402_version: X402_VERSION,
			error: error.into(),
			accepts: vec![quote],
		}
	}
}

/// Decoded `X-PAYMENT` header: a settlement proof supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
	pub x402_version: u32,
	pub scheme: String,
	pub network: String,
	/// Scheme-specific proof, passed through to the facilitator untouched.
	pub payload: serde_json::Value,
}

impl PaymentPayload {
	/// Encodes this proof for the `X-PAYMENT` header.
	pub fn encode_header(&self) -> String {
		let json = serde_json::to_vec(self).expect("payment payload is always serializable");
		BASE64.encode(json)
	}

	/// Decodes an `X-PAYMENT` header value.
	pub fn decode_header(header: &str) -> Result<Self, PaymentHeaderError> {
		let raw = BASE64
			.decode(header.trim())
			.map_err(|e| PaymentHeaderError::Base64(e.to_string()))?;
		serde_json::from_slice(&raw).map_err(|e| PaymentHeaderError::Json(e.to_string()))
	}
}

/// Reasons an `X-PAYMENT` header failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentHeaderError {
	Base64(String),
	Json(String),
}

impl std::fmt::Display for PaymentHeaderError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			PaymentHeaderError::Base64(e) => write!(f, "invalid base64 in payment header: {e}"),
			PaymentHeaderError::Json(e) => write!(f, "invalid payment payload: {e}"),
		}
	}
}

impl std::error::Error for PaymentHeaderError {}
