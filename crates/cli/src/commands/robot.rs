//! Client-side robot queries against a running broker.

use crate::client::BrokerClient;
use crate::error::Result;
use crate::output::{OutputFormat, ResultBuilder, print_result};

pub async fn status(
	api: &str,
	robot: &str,
	camera: Option<&str>,
	format: OutputFormat,
) -> Result<()> {
	let client = BrokerClient::new(api)?;
	let reply = client.robot_status(robot, camera).await?;
	let result = ResultBuilder::new("robot status")
		.data(serde_json::to_value(&reply)?)
		.build();
	print_result(&result, format);
	Ok(())
}
