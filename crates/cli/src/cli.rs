use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Root CLI for the teleop access broker.
#[derive(Parser, Debug)]
#[command(name = "teleop")]
#[command(about = "Robot access broker - exclusive, pay-per-session teleoperation")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default) or json
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Broker base URL for client commands.
	#[arg(long, global = true, env = "TELEOP_API", default_value = "http://127.0.0.1:8000")]
	pub api: String,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Run the broker HTTP server.
	Serve(ServeArgs),
	/// Show the session bound to a wallet.
	Status {
		#[arg(long)]
		wallet: String,
	},
	/// Purchase a control session for a robot.
	Purchase {
		#[arg(long)]
		wallet: String,
		/// mDNS name or IP of the robot.
		#[arg(long)]
		robot: String,
		/// Base64 x402 payment proof (the X-PAYMENT header value).
		#[arg(long)]
		payment: Option<String>,
	},
	/// Release a wallet's session.
	Release {
		#[arg(long)]
		wallet: String,
	},
	/// Robot-facing queries.
	Robot(RobotArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
	#[arg(long, env = "HOST", default_value = "0.0.0.0")]
	pub host: String,

	#[arg(long, env = "PORT", default_value_t = 8000)]
	pub port: u16,

	/// Toggle the x402 payment gateway.
	#[arg(long, env = "PAYMENT_ENABLED", default_value_t = false)]
	pub payment_enabled: bool,

	/// Recipient address for settlements.
	#[arg(long, env = "PAYMENT_ADDRESS", default_value = "")]
	pub payment_address: String,

	#[arg(long, env = "X402_NETWORK", default_value = "base-sepolia")]
	pub network: String,

	#[arg(long, env = "FACILITATOR_URL", default_value = "https://x402.org/facilitator")]
	pub facilitator_url: String,

	#[arg(long, env = "SESSION_DURATION_MINUTES", default_value_t = 10)]
	pub session_duration_minutes: u64,

	#[arg(long, env = "SESSION_PRICE", default_value = "$0.10")]
	pub session_price: String,

	#[arg(long, env = "SWEEP_INTERVAL_SECS", default_value_t = 30)]
	pub sweep_interval_secs: u64,

	/// Timeout for robot motor/camera requests.
	#[arg(long, env = "ROBOT_TIMEOUT_SECS", default_value_t = 5)]
	pub robot_timeout_secs: u64,

	/// Allowed CORS origins, comma separated.
	#[arg(long, env = "CORS_ORIGINS", value_delimiter = ',', default_value = "http://localhost:5173")]
	pub cors_origins: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RobotArgs {
	#[command(subcommand)]
	pub action: RobotAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RobotAction {
	/// Probe reachability and availability of a robot.
	Status {
		/// mDNS name or IP of the robot.
		#[arg(long)]
		robot: String,
		/// Separate camera host, when not derivable from the robot host.
		#[arg(long)]
		camera: Option<String>,
	},
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn serve_defaults_match_policy() {
		let cli = Cli::try_parse_from(["teleop", "serve"]).unwrap();
		let Commands::Serve(args) = cli.command else {
			panic!("expected serve");
		};
		assert!(!args.payment_enabled);
		assert_eq!(args.session_duration_minutes, 10);
		assert_eq!(args.session_price, "$0.10");
		assert_eq!(args.port, 8000);
	}

	#[test]
	fn purchase_parses_optional_payment() {
		let cli = Cli::try_parse_from([
			"teleop", "purchase", "--wallet", "0xabc", "--robot", "bot-1",
		])
		.unwrap();
		let Commands::Purchase { wallet, robot, payment } = cli.command else {
			panic!("expected purchase");
		};
		assert_eq!(wallet, "0xabc");
		assert_eq!(robot, "bot-1");
		assert!(payment.is_none());
	}
}
