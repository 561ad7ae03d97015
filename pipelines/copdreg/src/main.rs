use clap::Parser;

mod cli;
mod profile;
mod result;
mod runner;
mod stages;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logger(cli.log_level)?;
    cli.run_program()
}
