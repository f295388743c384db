use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use env_logger::Builder;
use log::{self, LevelFilter, debug, error, info};

use rgsplit::cli::parse;
use rgsplit::config::defs::RunConfig;
use rgsplit::pipelines::readgroup_split::{self, SplitOutcome};


#[tokio::main]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    let run_config = match RunConfig::from_args(args) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!(
        "TEMPDIR = '{}', OUTPREFIX = '{}'",
        run_config.tempdir.display(),
        run_config.out_dir.display()
    );
    info!("Starting program with the following arguments: {:?}", run_config.args);
    debug!("Passing {} threads to external tools", run_config.threads);

    match readgroup_split::run(run_config).await {
        Ok(SplitOutcome::Consistent(readgroups)) => {
            info!("Split into {} readgroup(s)", readgroups.len());
        }
        Ok(SplitOutcome::Recovered) => {
            info!("Split fell back to the default readgroup");
        }
        Err(e) => {
            error!("{} at {} milliseconds.", e, run_start.elapsed().as_millis());
            std::process::exit(1);
        }
    }

    info!("Run is completed successfully in {} milliseconds.", run_start.elapsed().as_millis());
    Ok(())
}
