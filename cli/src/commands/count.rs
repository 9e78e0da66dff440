use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tapescan_core::{scan_file, Record};

use super::{print_summary, ScanArgs};

/// Count the records in a tape file without printing them
#[derive(Args, Debug)]
pub struct CountArgs {
    #[command(flatten)]
    pub scan: ScanArgs,
}

/// Run the `count` command
pub fn run_count(args: CountArgs) -> Result<()> {
    let config = args.scan.to_scan_config()?;

    let start = Instant::now();
    let summary = scan_file(&args.scan.file, config, |_: Record<'_>| -> Result<()> {
        Ok(())
    })
    .with_context(|| format!("Unable to scan {:?}", args.scan.file))?;

    println!("{}", summary.records);
    print_summary("Found", &summary, start.elapsed());

    Ok(())
}
