//! HTTP client for an x402 settlement facilitator.
//!
//! The facilitator exposes `POST /verify` and `POST /settle`, both taking
//! the proof plus the quote it was produced against. Verify is cheap and
//! catches bad signatures before anything touches the chain; settle
//! executes the transfer and returns the transaction hash.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use teleop_protocol::{PaymentPayload, PriceQuote, X402_VERSION};
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::payment::{SettleVerdict, Settlement};

pub struct FacilitatorClient {
	http: reqwest::Client,
	base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FacilitatorRequest<'a> {
	x402_version: u32,
	payment_payload: &'a PaymentPayload,
	payment_requirements: &'a PriceQuote,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyReply {
	is_valid: bool,
	#[serde(default)]
	invalid_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettleReply {
	success: bool,
	#[serde(default)]
	error_reason: Option<String>,
	#[serde(default)]
	transaction: Option<String>,
}

impl FacilitatorClient {
	pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
		let http = reqwest::Client::builder().timeout(timeout).build()?;
		Ok(Self {
			http,
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}

	async fn post<T: serde::de::DeserializeOwned>(
		&self,
		path: &str,
		body: &FacilitatorRequest<'_>,
	) -> Result<T> {
		let url = format!("{}/{path}", self.base_url);
		let response = self
			.http
			.post(&url)
			.json(body)
			.send()
			.await
			.map_err(|e| CoreError::Facilitator(format!("{path}: {e}")))?;
		let status = response.status();
		if !status.is_success() {
			return Err(CoreError::Facilitator(format!("{path}: http {status}")));
		}
		response
			.json::<T>()
			.await
			.map_err(|e| CoreError::Facilitator(format!("{path}: {e}")))
	}
}

#[async_trait::async_trait]
impl Settlement for FacilitatorClient {
	async fn settle(&self, payload: &PaymentPayload, quote: &PriceQuote) -> Result<SettleVerdict> {
		let request = FacilitatorRequest {
			x402_version: X402_VERSION,
			payment_payload: payload,
			payment_requirements: quote,
		};

		let verify: VerifyReply = self.post("verify", &request).await?;
		if !verify.is_valid {
			return Ok(SettleVerdict::Refused {
				reason: verify
					.invalid_reason
					.unwrap_or_else(|| "proof failed verification".to_string()),
			});
		}

		let settle: SettleReply = self.post("settle", &request).await?;
		if !settle.success {
			return Ok(SettleVerdict::Refused {
				reason: settle
					.error_reason
					.unwrap_or_else(|| "settlement failed".to_string()),
			});
		}
		let Some(tx) = settle.transaction else {
			return Err(CoreError::Facilitator(
				"settle reply missing transaction hash".to_string(),
			));
		};
		debug!(target = "teleop.payment", tx = %tx, "facilitator settled payment");
		Ok(SettleVerdict::Settled { tx })
	}
}
