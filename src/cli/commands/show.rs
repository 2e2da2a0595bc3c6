//! Show command - display usage for one package

use super::open_store;
use crate::cli::args::{OutputFormat, ShowArgs};
use crate::config::Config;
use crate::error::{DexUseError, DexUseResult};
use crate::usage::PackageUseInfo;
use console::style;

/// Execute the show command
pub async fn execute(args: ShowArgs, config: &Config) -> DexUseResult<()> {
    let store = open_store(config);

    let info = store.get_package_use_info(&args.package).ok_or_else(|| {
        DexUseError::User(format!("No usage recorded for package: {}", args.package))
    })?;

    match args.format {
        OutputFormat::Table => print_table(&args.package, &info),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        OutputFormat::Plain => {
            for path in info.dex_usage().keys() {
                println!("{}", path);
            }
        }
    }

    Ok(())
}

fn print_table(package: &str, info: &PackageUseInfo) {
    println!(
        "{} {}",
        style("Package").bold(),
        style(package).cyan()
    );
    println!(
        "  used by other apps: {}",
        yes_no(info.is_used_by_other_apps())
    );

    if info.dex_usage().is_empty() {
        println!("  no secondary dex files");
        return;
    }

    println!();
    println!(
        "{:<50} {:<6} {:<7} {:<20}",
        style("DEX PATH").bold(),
        style("OWNER").bold(),
        style("SHARED").bold(),
        style("ISAS").bold()
    );
    println!("{}", "-".repeat(86));

    for (path, dex) in info.dex_usage() {
        let isas: Vec<&str> = dex.loader_isas().iter().map(String::as_str).collect();
        println!(
            "{:<50} {:<6} {:<7} {:<20}",
            path,
            dex.owner_user_id(),
            yes_no(dex.is_used_by_other_apps()),
            isas.join(",")
        );
    }
}

fn yes_no(value: bool) -> String {
    if value {
        style("yes").green().to_string()
    } else {
        style("no").dim().to_string()
    }
}
