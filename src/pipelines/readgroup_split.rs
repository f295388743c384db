use std::path::{Path, PathBuf};
use std::sync::Arc;
use log::{info, warn};
use crate::config::defs::{Mate, PipelineError, RunConfig, DEFAULT_READGROUP};
use crate::utils::command::{check_version, line_count_pipeline, parse_line_count, readgroup_discovery_pipeline, split_pipeline};
use crate::utils::file::{remove_files, split_output_path, validate_file_inputs, write_readgroups};
use crate::utils::readgroup::{collect_candidates, ReadgroupList};
use crate::utils::streams::Sink;


/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome {
    /// Split by the discovered readgroups and line counts matched.
    Consistent(ReadgroupList),
    /// Line counts did not match; every read was re-tagged with the default readgroup.
    Recovered,
}


/// Line counts for one input file and its per-readgroup outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub input: PathBuf,
    pub input_lines: u64,
    pub outputs: Vec<(PathBuf, u64)>,
}

impl ConsistencyReport {
    pub fn output_lines(&self) -> u64 {
        self.outputs.iter().map(|(_, n)| n).sum()
    }

    pub fn is_consistent(&self) -> bool {
        self.input_lines == self.output_lines()
    }

    fn log_mismatch(&self) {
        warn!("Inconsistency detected!");
        warn!("Total number of lines in input fastq file:");
        warn!("'{}': {}", self.input.display(), self.input_lines);
        warn!("Number of lines in output fastq files:");
        for (path, lines) in &self.outputs {
            warn!("'{}': {}", path.display(), lines);
        }
    }
}


/// Discover -> Split -> Verify -> {Success | Recover -> Success | Fail}
///
/// # Arguments
///
/// * `config` - RunConfig struct from main.
///
/// # Returns
/// SplitOutcome, or the first fatal error.
pub async fn run(config: Arc<RunConfig>) -> Result<SplitOutcome, PipelineError> {
    let inputs = config.input_files();
    let input_paths: Vec<&Path> = inputs.iter().map(|(p, _)| p.as_path()).collect();
    validate_file_inputs(&input_paths)?;
    check_version(&config).await?;
    tokio::fs::create_dir_all(&config.out_dir).await?;

    let readgroups_txt = config.readgroups_txt_path();
    let readgroups = discover_readgroups(&config, &inputs[0].0, &readgroups_txt).await?;
    let outputs = split_by_readgroups(&config, &inputs, &readgroups).await?;

    let reports = verify_split(&config, &inputs, &readgroups).await?;
    if reports.iter().all(ConsistencyReport::is_consistent) {
        info!("Consistency check passed for all input fastq files.");
        return Ok(SplitOutcome::Consistent(readgroups));
    }

    if !config.args.ignore_warnings {
        return Err(PipelineError::ConsistencyCheckFailed);
    }
    info!(
        "Because of inconsistent results and passed '--ignore-warnings' flag, readgroups reset to '{}'.",
        DEFAULT_READGROUP
    );
    recover(&config, &inputs, &readgroups_txt, &outputs).await?;
    Ok(SplitOutcome::Recovered)
}


/// Finds readgroup tokens in the headers of `fastq` and writes the resolved
/// list to `readgroups_txt`, overwriting it.
pub async fn discover_readgroups(
    config: &RunConfig,
    fastq: &Path,
    readgroups_txt: &Path,
) -> Result<ReadgroupList, PipelineError> {
    let raw = readgroup_discovery_pipeline(config, fastq).run(Sink::Capture).await?;
    let candidates = collect_candidates(&String::from_utf8_lossy(&raw));
    let found = candidates.len();
    let readgroups = ReadgroupList::from_candidates(candidates);
    if readgroups.is_default() {
        warn!(
            "Unable to find readgroups in fastq headers by pattern ({} candidates). Going to use default '{}' readgroup.",
            found, DEFAULT_READGROUP
        );
    }
    write_readgroups(readgroups_txt, &readgroups).await?;
    Ok(readgroups)
}


/// Runs one filter per (readgroup, input) pair.
///
/// # Returns
/// Every output file written, in readgroup then mate order.
pub async fn split_by_readgroups(
    config: &RunConfig,
    inputs: &[(PathBuf, Mate)],
    readgroups: &ReadgroupList,
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut outputs = Vec::with_capacity(readgroups.len() * inputs.len());
    for rg in readgroups.ids() {
        for (fastq, mate) in inputs {
            let output = split_output_path(&config.out_dir, &config.args.output_basename, rg, *mate);
            if rg == DEFAULT_READGROUP {
                info!("Injecting default '{}' readgroup to '{}'...", rg, fastq.display());
            } else {
                info!("Splitting {} by '{}'...", fastq.display(), rg);
            }
            split_pipeline(config, rg, fastq, &output).run(Sink::Null).await?;
            info!("Wrote '{}'", output.display());
            outputs.push(output);
        }
    }
    Ok(outputs)
}


pub async fn count_lines(config: &RunConfig, fastq: &Path) -> Result<u64, PipelineError> {
    let out = line_count_pipeline(config, fastq).run(Sink::Capture).await?;
    parse_line_count(&out)
}


/// Compares each input's line count to the sum over its per-readgroup outputs.
/// Mismatches are logged, not raised.
pub async fn verify_split(
    config: &RunConfig,
    inputs: &[(PathBuf, Mate)],
    readgroups: &ReadgroupList,
) -> Result<Vec<ConsistencyReport>, PipelineError> {
    let mut reports = Vec::with_capacity(inputs.len());
    for (fastq, mate) in inputs {
        info!("Checking if '{}' is consistent...", fastq.display());
        let input_lines = count_lines(config, fastq).await?;

        let mut outputs = Vec::with_capacity(readgroups.len());
        for rg in readgroups.ids() {
            let output = split_output_path(&config.out_dir, &config.args.output_basename, rg, *mate);
            let lines = count_lines(config, &output).await?;
            outputs.push((output, lines));
        }

        let report = ConsistencyReport {
            input: fastq.clone(),
            input_lines,
            outputs,
        };
        if report.is_consistent() {
            info!("Consistency check passed for '{}'", fastq.display());
        } else {
            report.log_mismatch();
        }
        reports.push(report);
    }
    Ok(reports)
}


/// Resets the readgroup list to the default, drops `previous_outputs` and
/// re-splits. The re-split is verified too; a mismatch there is fatal.
pub async fn recover(
    config: &RunConfig,
    inputs: &[(PathBuf, Mate)],
    readgroups_txt: &Path,
    previous_outputs: &[PathBuf],
) -> Result<(), PipelineError> {
    let readgroups = ReadgroupList::default_only();
    warn!("Writing '{}' to '{}'...", DEFAULT_READGROUP, readgroups_txt.display());
    write_readgroups(readgroups_txt, &readgroups).await?;

    info!("Removing all split fastq files...");
    remove_files(previous_outputs).await?;

    split_by_readgroups(config, inputs, &readgroups).await?;

    let reports = verify_split(config, inputs, &readgroups).await?;
    if reports.iter().all(ConsistencyReport::is_consistent) {
        Ok(())
    } else {
        Err(PipelineError::ConsistencyCheckFailed)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_sums_outputs() {
        let report = ConsistencyReport {
            input: PathBuf::from("in.fastq.gz"),
            input_lines: 800,
            outputs: vec![
                (PathBuf::from("a.fastq.gz"), 400),
                (PathBuf::from("b.fastq.gz"), 240),
                (PathBuf::from("c.fastq.gz"), 160),
            ],
        };
        assert_eq!(report.output_lines(), 800);
        assert!(report.is_consistent());
    }

    #[test]
    fn test_report_mismatch() {
        let report = ConsistencyReport {
            input: PathBuf::from("in.fastq.gz"),
            input_lines: 800,
            outputs: vec![(PathBuf::from("a.fastq.gz"), 796)],
        };
        assert!(!report.is_consistent());
    }
}
