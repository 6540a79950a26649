mod cmd;
mod config;

use anyhow::Result;
use clap::Command;
use env_logger::Env;

fn cli() -> Command {
    Command::new("tome")
        .about("Mirror a Notion workspace into Markdown and CSV files")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(cmd::export::make_subcommand())
        .subcommand(cmd::scan::make_subcommand())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match cli().get_matches().subcommand() {
        Some(("export", args)) => cmd::export::execute(args),
        Some(("scan", args)) => cmd::scan::execute(args),
        _ => Ok(()),
    }
}
