use clap::Parser;
use flowclip_daemon::Cli;

fn main() -> anyhow::Result<()> {
    flowclip_daemon::run(Cli::parse())
}
