//! HTTP client for a running broker, used by the client-side commands.

use reqwest::StatusCode;
use teleop_protocol::{
	ErrorReply, PAYMENT_HEADER, PaymentRequiredReply, PurchaseReply, PurchaseRequest, ReleaseReply,
	RobotStatusReply, SessionView, WALLET_HEADER,
};

use crate::error::{CliError, Result};

/// Outcome of a purchase call, separating the broker's expected refusals
/// from transport faults.
#[derive(Debug)]
pub enum PurchaseCall {
	Granted(PurchaseReply),
	PaymentRequired(PaymentRequiredReply),
	/// Conflict or offline robot; `status` is the HTTP code.
	Refused { status: u16, detail: String },
}

pub struct BrokerClient {
	http: reqwest::Client,
	base: String,
}

impl BrokerClient {
	pub fn new(base: &str) -> Result<Self> {
		let http = reqwest::Client::builder()
			.timeout(std::time::Duration::from_secs(30))
			.build()?;
		Ok(Self {
			http,
			base: base.trim_end_matches('/').to_string(),
		})
	}

	pub async fn status(&self, wallet: &str) -> Result<SessionView> {
		let response = self
			.http
			.get(format!("{}/api/v1/access/status", self.base))
			.header(WALLET_HEADER, wallet)
			.send()
			.await?;
		expect_ok(response).await?.json().await.map_err(Into::into)
	}

	pub async fn purchase(
		&self,
		wallet: &str,
		robot_host: &str,
		payment: Option<&str>,
	) -> Result<PurchaseCall> {
		let mut request = self
			.http
			.post(format!("{}/api/v1/access/purchase", self.base))
			.header(WALLET_HEADER, wallet)
			.json(&PurchaseRequest {
				robot_host: robot_host.to_string(),
			});
		if let Some(payment) = payment {
			request = request.header(PAYMENT_HEADER, payment);
		}

		let response = request.send().await?;
		match response.status() {
			StatusCode::OK => Ok(PurchaseCall::Granted(response.json().await?)),
			StatusCode::PAYMENT_REQUIRED => {
				Ok(PurchaseCall::PaymentRequired(response.json().await?))
			}
			StatusCode::CONFLICT | StatusCode::SERVICE_UNAVAILABLE => {
				let status = response.status().as_u16();
				Ok(PurchaseCall::Refused {
					status,
					detail: error_detail(response).await,
				})
			}
			_ => Err(CliError::Server(error_detail(response).await)),
		}
	}

	pub async fn release(&self, wallet: &str) -> Result<ReleaseReply> {
		let response = self
			.http
			.post(format!("{}/api/v1/access/release", self.base))
			.header(WALLET_HEADER, wallet)
			.send()
			.await?;
		expect_ok(response).await?.json().await.map_err(Into::into)
	}

	pub async fn robot_status(
		&self,
		robot_host: &str,
		camera_host: Option<&str>,
	) -> Result<RobotStatusReply> {
		let mut query = vec![("robot_host", robot_host)];
		if let Some(camera) = camera_host {
			query.push(("camera_host", camera));
		}
		let response = self
			.http
			.get(format!("{}/api/v1/robot/status", self.base))
			.query(&query)
			.send()
			.await?;
		expect_ok(response).await?.json().await.map_err(Into::into)
	}
}

async fn expect_ok(response: reqwest::Response) -> Result<reqwest::Response> {
	if response.status().is_success() {
		Ok(response)
	} else {
		Err(CliError::Server(error_detail(response).await))
	}
}

async fn error_detail(response: reqwest::Response) -> String {
	let status = response.status();
	match response.json::<ErrorReply>().await {
		Ok(reply) => reply.detail,
		Err(_) => format!("http {status}"),
	}
}
