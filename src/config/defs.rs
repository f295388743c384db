use std::env;
use std::path::PathBuf;
use lazy_static::lazy_static;
use std::collections::HashMap;
use thiserror::Error;
use crate::cli::Arguments;

// External software
pub const SEQKIT_TAG: &str = "seqkit";
pub const UNPIGZ_TAG: &str = "unpigz";
pub const ZCAT_TAG: &str = "zcat";
pub const SED_TAG: &str = "sed";
pub const GREP_TAG: &str = "grep";
pub const SORT_TAG: &str = "sort";
pub const WC_TAG: &str = "wc";


lazy_static! {
    /// Minimum (major, minor) versions known to work.
    pub static ref TOOL_VERSIONS: HashMap<&'static str, (u32, u32)> = {
        let mut m = HashMap::new();
        m.insert(SEQKIT_TAG, (2, 0));
        m
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeqkitSubcommand {
    Grep,
    Replace,
    Version,
}

// Readgroups
pub const DEFAULT_READGROUP: &str = "DEFAULT:000:READGROUP:1";
pub const READGROUPS_NUM_THRESHOLD: usize = 10; // at or above this, DEFAULT_READGROUP is used

/// ERE handed to `grep -oE` against FASTQ header lines. Keeps the leading '@'.
pub const READGROUP_HEADER_PATTERN: &str = "^@[A-Za-z0-9_-]+:[0-9]+:[A-Za-z0-9_]+:[0-9]+";

/// Full-token form used to validate what the external tools hand back.
pub const READGROUP_TOKEN_PATTERN: &str = r"^[\w-]+:\d+:\w+:\d+$";

// Static Filenames
pub const FASTQ_GZ_EXT: &str = "fastq.gz";
pub const DEFAULT_TEMPDIR: &str = "/tmp";


/// Which file of a run a read file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mate {
    Single,
    R1,
    R2,
}

impl Mate {
    pub fn suffix(&self) -> &'static str {
        match self {
            Mate::Single => "",
            Mate::R1 => "_1",
            Mate::R2 => "_2",
        }
    }
}


#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to spawn {tool}: {error}. Is {tool} installed?")]
    ToolSpawn { tool: String, error: String },

    #[error("Pipeline '{pipeline}' failed at stage {stage} ({tool}): {status}")]
    StageFailed {
        pipeline: String,
        stage: usize,
        tool: String,
        status: String,
    },

    #[error("Unexpected output from {tool}: {error}")]
    ToolOutput { tool: String, error: String },

    #[error("I/O error: {0}")]
    IOError(String),

    #[error("Failed to pass consistency check")]
    ConsistencyCheckFailed,
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::IOError(e.to_string())
    }
}


/// Executables used for each external tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolPaths {
    pub seqkit: PathBuf,
    pub unpigz: PathBuf,
    pub zcat: PathBuf,
    pub sed: PathBuf,
    pub grep: PathBuf,
    pub sort: PathBuf,
    pub wc: PathBuf,
}

impl ToolPaths {
    pub fn from_args(args: &Arguments) -> Self {
        ToolPaths {
            seqkit: PathBuf::from(&args.seqkit),
            unpigz: PathBuf::from(&args.unpigz),
            ..ToolPaths::default()
        }
    }
}

impl Default for ToolPaths {
    fn default() -> Self {
        ToolPaths {
            seqkit: PathBuf::from(SEQKIT_TAG),
            unpigz: PathBuf::from(UNPIGZ_TAG),
            zcat: PathBuf::from(ZCAT_TAG),
            sed: PathBuf::from(SED_TAG),
            grep: PathBuf::from(GREP_TAG),
            sort: PathBuf::from(SORT_TAG),
            wc: PathBuf::from(WC_TAG),
        }
    }
}


/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub cwd: PathBuf,
    pub tempdir: PathBuf,
    pub out_dir: PathBuf,
    pub threads: usize,
    pub tools: ToolPaths,
    pub args: Arguments,
}

impl RunConfig {
    /// Resolves directories and thread count from parsed arguments.
    /// Output directory: `--out-dir`/`OUTPREFIX`, then `HOME`, then the cwd.
    pub fn from_args(args: Arguments) -> Result<Self, PipelineError> {
        let cwd = env::current_dir()?;

        let out_dir = match &args.out_dir {
            Some(dir) => PathBuf::from(dir),
            None => match env::var_os("HOME") {
                Some(home) if !home.is_empty() => PathBuf::from(home),
                _ => cwd.clone(),
            },
        };

        let threads = match args.threads {
            Some(0) => {
                return Err(PipelineError::InvalidConfig("--threads must be at least 1".to_string()));
            }
            Some(n) => n,
            None => num_cpus::get(),
        };

        Ok(RunConfig {
            cwd,
            tempdir: PathBuf::from(&args.tempdir),
            out_dir,
            threads,
            tools: ToolPaths::from_args(&args),
            args,
        })
    }

    /// `--readgroups-txt` joined onto the output directory.
    pub fn readgroups_txt_path(&self) -> PathBuf {
        self.out_dir.join(&self.args.readgroups_txt)
    }

    /// Input read files in mate order.
    pub fn input_files(&self) -> Vec<(PathBuf, Mate)> {
        match &self.args.fastq2 {
            Some(fastq2) => vec![
                (PathBuf::from(&self.args.fastq1), Mate::R1),
                (PathBuf::from(fastq2), Mate::R2),
            ],
            None => vec![(PathBuf::from(&self.args.fastq1), Mate::Single)],
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Arguments {
        Arguments {
            fastq1: "in_1.fastq.gz".to_string(),
            output_basename: "sample".to_string(),
            readgroups_txt: "readgroups.txt".to_string(),
            tempdir: DEFAULT_TEMPDIR.to_string(),
            seqkit: SEQKIT_TAG.to_string(),
            unpigz: UNPIGZ_TAG.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_out_dir_prefixes_readgroups_txt() {
        let mut args = base_args();
        args.out_dir = Some("/data/out".to_string());
        let config = RunConfig::from_args(args).unwrap();
        assert_eq!(config.readgroups_txt_path(), PathBuf::from("/data/out/readgroups.txt"));
    }

    #[test]
    fn test_threads_default_and_zero() {
        let config = RunConfig::from_args(base_args()).unwrap();
        assert_eq!(config.threads, num_cpus::get());

        let mut args = base_args();
        args.threads = Some(0);
        assert!(matches!(RunConfig::from_args(args), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_input_files_single_and_paired() {
        let config = RunConfig::from_args(base_args()).unwrap();
        assert_eq!(config.input_files(), vec![(PathBuf::from("in_1.fastq.gz"), Mate::Single)]);

        let mut args = base_args();
        args.fastq2 = Some("in_2.fastq.gz".to_string());
        let config = RunConfig::from_args(args).unwrap();
        let mates: Vec<Mate> = config.input_files().into_iter().map(|(_, m)| m).collect();
        assert_eq!(mates, vec![Mate::R1, Mate::R2]);
    }

    #[test]
    fn test_tool_paths_override() {
        let mut args = base_args();
        args.seqkit = "/opt/bin/seqkit".to_string();
        let tools = ToolPaths::from_args(&args);
        assert_eq!(tools.seqkit, PathBuf::from("/opt/bin/seqkit"));
        assert_eq!(tools.zcat, PathBuf::from(ZCAT_TAG));
    }
}
