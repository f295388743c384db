/// Functions and structs for building external tool command lines

use std::path::Path;
use log::{info, warn};
use crate::config::defs::{
    PipelineError, RunConfig, SeqkitSubcommand, DEFAULT_READGROUP, GREP_TAG, SEQKIT_TAG,
    SED_TAG, SORT_TAG, TOOL_VERSIONS, UNPIGZ_TAG, WC_TAG, ZCAT_TAG,
};
use crate::utils::streams::{CommandPipeline, Sink, Stage};


pub mod seqkit {
    use std::path::Path;
    use crate::config::defs::{SeqkitSubcommand, DEFAULT_READGROUP};

    /// Regex selecting headers whose ID begins with the readgroup, provided the
    /// next character is not a digit, so `A:1:B:1` does not also select `A:1:B:10`.
    pub fn readgroup_pattern(readgroup: &str) -> String {
        format!("^{}([^0-9]|$)", readgroup)
    }

    pub fn arg_generator(
        subcommand: SeqkitSubcommand,
        readgroup: &str,
        threads: usize,
        input: &Path,
        output: &Path,
    ) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        match subcommand {
            SeqkitSubcommand::Grep => {
                args_vec.push("grep".to_string());
                args_vec.push("--use-regexp".to_string());
                args_vec.push("--pattern".to_string());
                args_vec.push(readgroup_pattern(readgroup));
            }
            SeqkitSubcommand::Replace => {
                args_vec.push("replace".to_string());
                args_vec.push("--pattern".to_string());
                args_vec.push("^".to_string());
                args_vec.push("--replacement".to_string());
                args_vec.push(format!("{}:", DEFAULT_READGROUP));
            }
            SeqkitSubcommand::Version => {
                args_vec.push("version".to_string());
                return args_vec;
            }
        }
        args_vec.push("--threads".to_string());
        args_vec.push(threads.to_string());
        args_vec.push("--out-file".to_string());
        args_vec.push(output.to_string_lossy().to_string());
        args_vec.push(input.to_string_lossy().to_string());
        args_vec
    }

    /// Parses `seqkit v2.10.0` into (2, 10).
    pub fn parse_version(output: &str) -> Option<(u32, u32)> {
        let token = output
            .split_whitespace()
            .find(|t| t.trim_start_matches('v').starts_with(|c: char| c.is_ascii_digit()))?;
        let mut parts = token.trim_start_matches('v').split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().and_then(|m| m.parse().ok()).unwrap_or(0);
        Some((major, minor))
    }
}

mod unpigz {
    use std::path::Path;

    pub fn arg_generator(threads: usize, input: &Path) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("-c".to_string());
        args_vec.push("-p".to_string());
        args_vec.push(threads.to_string());
        args_vec.push(input.to_string_lossy().to_string());
        args_vec
    }
}

mod coreutils {
    use std::path::Path;
    use crate::config::defs::READGROUP_HEADER_PATTERN;

    pub fn zcat_args(input: &Path) -> Vec<String> {
        vec![input.to_string_lossy().to_string()]
    }

    /// Every 4th line starting at 1: the FASTQ header lines.
    pub fn sed_header_args() -> Vec<String> {
        vec!["-n".to_string(), "1~4p".to_string()]
    }

    pub fn grep_readgroup_args() -> Vec<String> {
        vec!["-oE".to_string(), READGROUP_HEADER_PATTERN.to_string()]
    }

    pub fn sort_unique_args() -> Vec<String> {
        vec!["-u".to_string()]
    }

    pub fn wc_lines_args() -> Vec<String> {
        vec!["-l".to_string()]
    }
}


/// `zcat | sed -n 1~4p | grep -oE PATTERN | sort -u` over the first read file.
pub fn readgroup_discovery_pipeline(config: &RunConfig, fastq: &Path) -> CommandPipeline {
    let tools = &config.tools;
    CommandPipeline::new(&format!("discover readgroups in {}", fastq.display()))
        .stage(Stage::new(ZCAT_TAG, &tools.zcat, coreutils::zcat_args(fastq)))
        .stage(Stage::new(SED_TAG, &tools.sed, coreutils::sed_header_args()))
        .stage(Stage::new(GREP_TAG, &tools.grep, coreutils::grep_readgroup_args()).accept_codes(&[1]))
        .stage(Stage::new(SORT_TAG, &tools.sort, coreutils::sort_unique_args()))
}

/// `unpigz -c -p N FILE | wc -l`
pub fn line_count_pipeline(config: &RunConfig, fastq: &Path) -> CommandPipeline {
    let tools = &config.tools;
    CommandPipeline::new(&format!("count lines in {}", fastq.display()))
        .stage(Stage::new(UNPIGZ_TAG, &tools.unpigz, unpigz::arg_generator(config.threads, fastq)))
        .stage(Stage::new(WC_TAG, &tools.wc, coreutils::wc_lines_args()))
}

/// Filters `input` down to one readgroup, or tags every record with the
/// default readgroup when `readgroup` is the default.
pub fn split_pipeline(config: &RunConfig, readgroup: &str, input: &Path, output: &Path) -> CommandPipeline {
    let (subcommand, label) = if readgroup == DEFAULT_READGROUP {
        (SeqkitSubcommand::Replace, format!("inject '{}' to '{}'", readgroup, input.display()))
    } else {
        (SeqkitSubcommand::Grep, format!("extract '{}' from '{}'", readgroup, input.display()))
    };
    let args = seqkit::arg_generator(subcommand, readgroup, config.threads, input, output);
    CommandPipeline::new(&label).stage(Stage::new(SEQKIT_TAG, &config.tools.seqkit, args))
}


/// Parses the leading integer of `wc -l` output.
pub fn parse_line_count(output: &[u8]) -> Result<u64, PipelineError> {
    let text = String::from_utf8_lossy(output);
    text.split_whitespace()
        .next()
        .and_then(|n| n.parse::<u64>().ok())
        .ok_or_else(|| PipelineError::ToolOutput {
            tool: WC_TAG.to_string(),
            error: format!("expected a line count, got '{}'", text.trim()),
        })
}


/// Confirms seqkit can be spawned and reports its version.
pub async fn check_version(config: &RunConfig) -> Result<String, PipelineError> {
    let args = seqkit::arg_generator(
        SeqkitSubcommand::Version,
        "",
        config.threads,
        Path::new(""),
        Path::new(""),
    );
    let output = CommandPipeline::new("seqkit presence check")
        .stage(Stage::new(SEQKIT_TAG, &config.tools.seqkit, args))
        .run(Sink::Capture)
        .await?;
    let text = String::from_utf8_lossy(&output).trim().to_string();
    let version = seqkit::parse_version(&text).ok_or_else(|| PipelineError::ToolOutput {
        tool: SEQKIT_TAG.to_string(),
        error: format!("Invalid seqkit version output: {}", text),
    })?;

    if let Some(&minimum) = TOOL_VERSIONS.get(SEQKIT_TAG) {
        if version < minimum {
            warn!(
                "{} {}.{} is older than the tested minimum {}.{}",
                SEQKIT_TAG, version.0, version.1, minimum.0, minimum.1
            );
        }
    }
    info!("Using {} {}", SEQKIT_TAG, text);
    Ok(text)
}
