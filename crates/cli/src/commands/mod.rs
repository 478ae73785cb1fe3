mod access;
mod robot;
mod serve;

use crate::cli::{Cli, Commands, RobotAction};
use crate::error::Result;
use crate::output::OutputFormat;

pub async fn dispatch(cli: Cli, format: OutputFormat) -> Result<()> {
	let api = cli.api;
	match cli.command {
		Commands::Serve(args) => serve::run(args).await,
		Commands::Status { wallet } => access::status(&api, &wallet, format).await,
		Commands::Purchase { wallet, robot, payment } => {
			access::purchase(&api, &wallet, &robot, payment.as_deref(), format).await
		}
		Commands::Release { wallet } => access::release(&api, &wallet, format).await,
		Commands::Robot(args) => match args.action {
			RobotAction::Status { robot, camera } => {
				robot::status(&api, &robot, camera.as_deref(), format).await
			}
		},
	}
}
