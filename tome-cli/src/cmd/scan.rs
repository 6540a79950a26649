use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use tome_core::OutputScanner;

pub fn make_subcommand() -> Command {
    Command::new("scan")
        .about("Summarise an existing export directory")
        .arg(
            Arg::new("dir")
                .value_name("DIR")
                .help("Export directory to inspect")
                .default_value("./root_page"),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let dir = args
        .get_one::<String>("dir")
        .map(String::as_str)
        .unwrap_or("./root_page");

    let summary = OutputScanner::new(dir).scan()?;
    println!("{}: {}", dir, summary);

    Ok(())
}
