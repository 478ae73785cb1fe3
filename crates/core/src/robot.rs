//! HTTP client for robot controllers (motor + camera) and the status probe.
//!
//! Robots are addressed by an opaque host that is either a bare IPv4
//! address (optionally with a port) or an mDNS name:
//!
//! - mDNS: `finland-tumbller-01` -> `http://finland-tumbller-01.local`,
//!   camera at `http://finland-tumbller-01-cam.local`
//! - IP: `192.168.1.100` -> `http://192.168.1.100`, camera on the same
//!   device
//!
//! An explicit camera host overrides the derivation. Unreachable endpoints
//! report as offline; they are never errors.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::session::SessionService;
use teleop_protocol::RobotStatusReply;

/// Motor commands the firmware understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCommand {
	Forward,
	Back,
	Left,
	Right,
	Stop,
}

impl MotorCommand {
	pub fn as_str(self) -> &'static str {
		match self {
			MotorCommand::Forward => "forward",
			MotorCommand::Back => "back",
			MotorCommand::Left => "left",
			MotorCommand::Right => "right",
			MotorCommand::Stop => "stop",
		}
	}
}

impl std::str::FromStr for MotorCommand {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"forward" => Ok(MotorCommand::Forward),
			"back" => Ok(MotorCommand::Back),
			"left" => Ok(MotorCommand::Left),
			"right" => Ok(MotorCommand::Right),
			"stop" => Ok(MotorCommand::Stop),
			_ => Err(format!("unknown motor command: {s}")),
		}
	}
}

/// Identity reported by a controller's `/info` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointInfo {
	#[serde(default)]
	pub mdns_name: Option<String>,
	#[serde(default)]
	pub ip: Option<String>,
}

pub struct RobotClient {
	http: reqwest::Client,
}

impl RobotClient {
	pub fn new(timeout: Duration) -> Result<Self> {
		let http = reqwest::Client::builder().timeout(timeout).build()?;
		Ok(Self { http })
	}

	/// Identity of the motor controller, or `None` when unreachable.
	pub async fn motor_info(&self, robot_host: &str) -> Option<EndpointInfo> {
		self.fetch_info(&motor_url(robot_host)).await
	}

	/// Identity of the camera, or `None` when unreachable.
	pub async fn camera_info(&self, robot_host: &str, camera_host: Option<&str>) -> Option<EndpointInfo> {
		self.fetch_info(&camera_url(robot_host, camera_host)).await
	}

	/// True when the motor controller answers `/info`.
	pub async fn motor_online(&self, robot_host: &str) -> bool {
		self.motor_info(robot_host).await.is_some()
	}

	/// Sends a motor command. False on any failure.
	pub async fn motor_command(&self, robot_host: &str, command: MotorCommand) -> bool {
		let url = format!("{}/motor/{}", motor_url(robot_host), command.as_str());
		match self.http.get(&url).send().await {
			Ok(response) => response.status().is_success(),
			Err(err) => {
				debug!(target = "teleop.robot", robot = %robot_host, error = %err, "motor command failed");
				false
			}
		}
	}

	/// One JPEG frame from the camera, or `None` when offline.
	pub async fn camera_frame(&self, robot_host: &str, camera_host: Option<&str>) -> Option<Vec<u8>> {
		let url = format!("{}/getImage", camera_url(robot_host, camera_host));
		let response = self.http.get(&url).send().await.ok()?;
		if !response.status().is_success() {
			return None;
		}
		response.bytes().await.ok().map(|b| b.to_vec())
	}

	async fn fetch_info(&self, base: &str) -> Option<EndpointInfo> {
		let url = format!("{base}/info");
		let response = self.http.get(&url).send().await.ok()?;
		if !response.status().is_success() {
			return None;
		}
		response.json::<EndpointInfo>().await.ok()
	}
}

/// Reachability + lock status for one robot, combined by [`probe`].
#[derive(Debug, Clone)]
pub struct RobotStatus {
	pub robot_host: String,
	pub motor: Option<EndpointInfo>,
	pub camera: Option<EndpointInfo>,
	/// Live holder wallet, unmasked.
	pub locked_by: Option<String>,
}

impl RobotStatus {
	pub fn available(&self) -> bool {
		self.motor.is_some() && self.camera.is_some() && self.locked_by.is_none()
	}

	/// Wire form with the holder masked for privacy.
	pub fn into_reply(self) -> RobotStatusReply {
		let available = self.available();
		RobotStatusReply {
			robot_host: self.robot_host,
			motor_online: self.motor.is_some(),
			motor_ip: self.motor.as_ref().and_then(|i| i.ip.clone()),
			motor_mdns: self.motor.as_ref().and_then(|i| i.mdns_name.clone()),
			camera_online: self.camera.is_some(),
			camera_ip: self.camera.as_ref().and_then(|i| i.ip.clone()),
			camera_mdns: self.camera.as_ref().and_then(|i| i.mdns_name.clone()),
			available,
			locked_by: self.locked_by.as_deref().map(teleop_protocol::mask_wallet),
		}
	}
}

/// Queries both controller interfaces and the lock table for one robot.
///
/// Read-only: reports, never mutates. Unreachable interfaces show as
/// offline.
pub async fn probe(
	client: &RobotClient,
	sessions: &SessionService,
	robot_host: &str,
	camera_host: Option<&str>,
) -> RobotStatus {
	let motor = client.motor_info(robot_host).await;
	let camera = client.camera_info(robot_host, camera_host).await;
	RobotStatus {
		robot_host: robot_host.to_string(),
		motor,
		camera,
		locked_by: sessions.holder_of(robot_host),
	}
}

/// True for bare IPv4 addresses, with or without a port.
fn is_ip_address(host: &str) -> bool {
	host.parse::<Ipv4Addr>().is_ok() || host.parse::<SocketAddrV4>().is_ok()
}

fn motor_url(robot_host: &str) -> String {
	if is_ip_address(robot_host) {
		format!("http://{robot_host}")
	} else {
		format!("http://{robot_host}.local")
	}
}

fn camera_url(robot_host: &str, camera_host: Option<&str>) -> String {
	if let Some(camera) = camera_host {
		return if is_ip_address(camera) {
			format!("http://{camera}")
		} else {
			format!("http://{camera}.local")
		};
	}
	if is_ip_address(robot_host) {
		// Camera shares the device.
		format!("http://{robot_host}")
	} else {
		format!("http://{robot_host}-cam.local")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn motor_url_derivation() {
		assert_eq!(motor_url("192.168.1.100"), "http://192.168.1.100");
		assert_eq!(motor_url("127.0.0.1:8080"), "http://127.0.0.1:8080");
		assert_eq!(
			motor_url("finland-tumbller-01"),
			"http://finland-tumbller-01.local"
		);
	}

	#[test]
	fn camera_url_derivation() {
		assert_eq!(camera_url("192.168.1.100", None), "http://192.168.1.100");
		assert_eq!(
			camera_url("finland-tumbller-01", None),
			"http://finland-tumbller-01-cam.local"
		);
		assert_eq!(
			camera_url("finland-tumbller-01", Some("10.0.0.7")),
			"http://10.0.0.7"
		);
		assert_eq!(
			camera_url("192.168.1.100", Some("front-cam")),
			"http://front-cam.local"
		);
	}

	#[test]
	fn motor_command_parse_round_trip() {
		for cmd in ["forward", "back", "left", "right", "stop"] {
			let parsed: MotorCommand = cmd.parse().unwrap();
			assert_eq!(parsed.as_str(), cmd);
		}
		assert!("spin".parse::<MotorCommand>().is_err());
	}
}
