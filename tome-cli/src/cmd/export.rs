use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tome_core::{ExportBuilder, NotionClient, OutputScanner};

use crate::config::{DEFAULT_CONFIG_FILE, load_config};

pub fn add_export_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("root")
                .short('r')
                .long("root")
                .value_name("ID")
                .help("Id of the page to export (overrides NOTION_ROOT_PAGE_ID)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Directory the export is written to"),
        )
        .arg(
            Arg::new("no-images")
                .long("no-images")
                .help("Keep links to hosted images instead of downloading them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("database")
                .long("database")
                .help("The root id names a database rather than a page")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file")
                .default_value(DEFAULT_CONFIG_FILE),
        )
}

pub fn make_subcommand() -> Command {
    add_export_args(Command::new("export"))
        .about("Export a Notion page tree to Markdown and CSV files")
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;
    let export_config = config.export_config()?;
    let client = NotionClient::new(&config.notion_config()?)?;
    let output_dir = export_config.output_dir.clone();

    log::info!("Exporting {} into {}", export_config.root_id, output_dir.display());

    let report = ExportBuilder::new()
        .source(client)
        .config(export_config)
        .build()?
        .export()?;

    if !report.is_clean() {
        log::warn!(
            "{} node(s) could not be exported: {}",
            report.failed.len(),
            report.failed.join(", ")
        );
    }

    let summary = OutputScanner::new(&output_dir).scan()?;
    println!("Export finished in {}: {}", output_dir.display(), summary);

    Ok(())
}
