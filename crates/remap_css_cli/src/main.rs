mod command;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::command::RemapCommand;

fn main() -> anyhow::Result<()> {
  let cmd = RemapCommand::parse();

  let filter = match &cmd.log {
    Some(directives) => EnvFilter::try_new(directives)?,
    None => EnvFilter::new("warn"),
  };
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(filter)
    .init();

  command::main(cmd)
}
