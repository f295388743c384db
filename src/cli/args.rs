use clap::Parser;
use crate::config::defs::DEFAULT_TEMPDIR;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "rgsplit", version, about = "Split FASTQ files into per-readgroup files and check the split is lossless")]
pub struct Arguments {

    #[arg(long = "fastq1", help = "Input fastq.gz file, SE or PE pair 1")]
    pub fastq1: String,

    #[arg(long = "fastq2", help = "Input fastq.gz file, PE pair 2")]
    pub fastq2: Option<String>,

    #[arg(long = "output-basename", help = "Output prefix")]
    pub output_basename: String,

    #[arg(long = "readgroups-txt", help = "Output readgroups.txt file with listed unique readgroups, relative to the output directory")]
    pub readgroups_txt: String,

    #[arg(long = "ignore-warnings", action, help = "In case of inconsistent results fall back to the default readgroup instead of failing")]
    pub ignore_warnings: bool,

    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,

    #[arg(short = 't', long, help = "Threads passed to external tools. Defaults to the number of available processors.")]
    pub threads: Option<usize>,

    #[arg(long, env = "TEMPDIR", default_value = DEFAULT_TEMPDIR)]
    pub tempdir: String,

    #[arg(long = "out-dir", env = "OUTPREFIX", help = "Output directory. Defaults to $HOME.")]
    pub out_dir: Option<String>,

    #[arg(long, default_value = "seqkit")]
    pub seqkit: String,

    #[arg(long, default_value = "unpigz")]
    pub unpigz: String,
}
