use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::PathBuf,
    thread::spawn,
    time::Instant,
};

use anyhow::{bail, Context, Result};
use clap::Args;
use crossbeam_channel::{bounded, Receiver};
use tapescan_core::{scan_file, Record, ScanSummary};
use tracing::debug;

use super::{parse_separator, print_summary, ScanArgs};

/// Extract all records from a tape file
#[derive(Args, Debug)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Write every record into its own file in this directory instead of
    /// printing it to stdout
    #[arg(long, short)]
    pub output_dir: Option<PathBuf>,

    /// Printed after every record written to stdout (may be empty)
    #[arg(long, default_value = "\\n")]
    pub separator: String,
}

/// Write records to `writer`, each followed by `separator`
fn write_records<W: Write>(
    records: Receiver<Vec<u8>>,
    mut writer: W,
    separator: &[u8],
) -> Result<u64> {
    let mut written = 0;
    for record in records {
        writer.write_all(&record)?;
        writer.write_all(separator)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Write every record into a separate numbered file in `dir`
fn write_files(records: Receiver<Vec<u8>>, dir: PathBuf) -> Result<u64> {
    fs::create_dir_all(&dir)
        .with_context(|| format!("Unable to create output directory {:?}", dir))?;

    let mut written = 0;
    for record in records {
        let path = dir.join(format!("{written:08}.rec"));
        let mut file =
            File::create(&path).with_context(|| format!("Unable to create {:?}", path))?;
        file.write_all(&record)?;
        debug!(path = %path.display(), len = record.len(), "wrote record");
        written += 1;
    }
    Ok(written)
}

/// Scan the file and hand all records to a separate writer thread
fn extract(args: &ExtractArgs, separator: Vec<u8>) -> Result<(ScanSummary, u64)> {
    let config = args.scan.to_scan_config()?;

    // run separate thread for writing
    let (record_send, record_recv) = bounded::<Vec<u8>>(1024);
    let output_dir = args.output_dir.clone();
    let writer_thread = spawn(move || match output_dir {
        Some(dir) => write_files(record_recv, dir),
        None => {
            let stdout = io::stdout().lock();
            write_records(record_recv, BufWriter::new(stdout), &separator)
        }
    });

    let summary = scan_file(
        &args.scan.file,
        config,
        |r: Record<'_>| -> anyhow::Result<()> {
            record_send
                .send(r.to_vec())
                .context("Writer thread stopped accepting records")?;
            Ok(())
        },
    );

    drop(record_send);
    let written = match writer_thread.join() {
        Ok(written) => written?,
        Err(err) => bail!("Writer thread threw an error: {err:?}"),
    };

    let summary = summary
        .with_context(|| format!("Unable to extract records from {:?}", args.scan.file))?;
    Ok((summary, written))
}

/// Run the `extract` command
pub fn run_extract(args: ExtractArgs) -> Result<()> {
    let separator = parse_separator("--separator", &args.separator)?;

    let start = Instant::now();
    let (summary, written) = extract(&args, separator)?;
    debug!(written, "all records written");

    print_summary("Extracted", &summary, start.elapsed());

    Ok(())
}
