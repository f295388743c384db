use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use log::{debug, info};
use crate::config::defs::{Mate, PipelineError, FASTQ_GZ_EXT};
use crate::utils::readgroup::ReadgroupList;

pub fn is_gzipped(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut buffer = [0u8; 2];
    match file.read_exact(&mut buffer) {
        Ok(()) => Ok(buffer == [0x1F, 0x8B]), // Gzip magic bytes
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}


/// Checks that every input exists and is gzip compressed.
pub fn validate_file_inputs(paths: &[&Path]) -> Result<(), PipelineError> {
    for path in paths {
        if !path.is_file() {
            return Err(PipelineError::InvalidInput(format!("Cannot find '{}'", path.display())));
        }
        let gz = is_gzipped(path)
            .map_err(|e| PipelineError::InvalidInput(format!("Cannot read '{}': {}", path.display(), e)))?;
        if !gz {
            return Err(PipelineError::InvalidInput(format!("'{}' is not gzip compressed", path.display())));
        }
    }
    Ok(())
}


/// `{out_dir}/{basename}-{readgroup}{mate suffix}.fastq.gz`
pub fn split_output_path(out_dir: &Path, basename: &str, readgroup: &str, mate: Mate) -> PathBuf {
    out_dir.join(format!("{}-{}{}.{}", basename, readgroup, mate.suffix(), FASTQ_GZ_EXT))
}


/// Overwrites `path` with one readgroup per line.
pub async fn write_readgroups(path: &Path, readgroups: &ReadgroupList) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, readgroups.to_file_contents())
        .await
        .map_err(|e| PipelineError::IOError(format!("Failed to write {}: {}", path.display(), e)))?;
    info!("'{}' file content: {:?}", path.display(), readgroups.ids());
    Ok(())
}


/// Deletes files, skipping ones that are already gone.
pub async fn remove_files(paths: &[PathBuf]) -> Result<(), PipelineError> {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!("Removed {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(PipelineError::IOError(format!("Failed to remove {}: {}", path.display(), e)));
            }
        }
    }
    Ok(())
}
