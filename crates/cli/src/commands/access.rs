//! Client-side access commands against a running broker.

use serde_json::json;

use crate::client::{BrokerClient, PurchaseCall};
use crate::error::Result;
use crate::output::{ErrorCode, OutputFormat, ResultBuilder, print_result};

pub async fn status(api: &str, wallet: &str, format: OutputFormat) -> Result<()> {
	let client = BrokerClient::new(api)?;
	let view = client.status(wallet).await?;
	let result = ResultBuilder::new("status")
		.data(serde_json::to_value(&view)?)
		.build();
	print_result(&result, format);
	Ok(())
}

pub async fn purchase(
	api: &str,
	wallet: &str,
	robot: &str,
	payment: Option<&str>,
	format: OutputFormat,
) -> Result<()> {
	let client = BrokerClient::new(api)?;
	let result = match client.purchase(wallet, robot, payment).await? {
		PurchaseCall::Granted(reply) => ResultBuilder::new("purchase")
			.data(serde_json::to_value(&reply)?)
			.build(),
		PurchaseCall::PaymentRequired(challenge) => {
			// Expected branch: echo the quote so the caller can settle
			// and retry with --payment.
			let mut builder = ResultBuilder::new("purchase")
				.error(ErrorCode::PaymentRequired, &challenge.error);
			if let Ok(accepts) = serde_json::to_value(&challenge.accepts) {
				builder = builder.data(json!({ "accepts": accepts }));
			}
			builder.build()
		}
		PurchaseCall::Refused { status, detail } => {
			let code = if status == 409 {
				ErrorCode::Conflict
			} else {
				ErrorCode::RobotOffline
			};
			ResultBuilder::new("purchase").error(code, &detail).build()
		}
	};
	print_result(&result, format);
	if !result.ok {
		std::process::exit(1);
	}
	Ok(())
}

pub async fn release(api: &str, wallet: &str, format: OutputFormat) -> Result<()> {
	let client = BrokerClient::new(api)?;
	let reply = client.release(wallet).await?;
	let result = ResultBuilder::new("release")
		.data(json!({ "released": reply.released }))
		.build();
	print_result(&result, format);
	Ok(())
}
