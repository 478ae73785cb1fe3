use crate::cli::ServeArgs;
use crate::error::Result;
use crate::server;

pub async fn run(args: ServeArgs) -> Result<()> {
	server::serve(args).await
}
