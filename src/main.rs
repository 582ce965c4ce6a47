use clap::Parser;
use phone_tools::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.command.run()
}
