// src/utils/streams.rs
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use log::{debug, error, info};
use tokio::process::{Child, Command};

use crate::config::defs::PipelineError;


/// One external command in a pipeline.
#[derive(Debug, Clone)]
pub struct Stage {
    pub tool: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub ok_codes: Vec<i32>,
}

impl Stage {
    pub fn new(tool: &str, program: &Path, args: Vec<String>) -> Self {
        Stage {
            tool: tool.to_string(),
            program: program.to_path_buf(),
            args,
            ok_codes: vec![0],
        }
    }

    /// Accepts extra exit codes as success, e.g. grep's 1 for "no lines selected".
    pub fn accept_codes(mut self, codes: &[i32]) -> Self {
        for &code in codes {
            if !self.ok_codes.contains(&code) {
                self.ok_codes.push(code);
            }
        }
        self
    }

    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().into_owned()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    fn is_success(&self, status: &ExitStatus) -> bool {
        match status.code() {
            Some(code) => self.ok_codes.contains(&code),
            None => false, // killed by signal
        }
    }
}


/// Where the last stage's stdout goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sink {
    Capture,
    Null,
}


/// Ordered external commands, each stage's stdout feeding the next stage's stdin.
#[derive(Debug, Clone)]
pub struct CommandPipeline {
    pub label: String,
    pub stages: Vec<Stage>,
}

impl CommandPipeline {
    pub fn new(label: &str) -> Self {
        CommandPipeline {
            label: label.to_string(),
            stages: Vec::new(),
        }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn command_line(&self) -> String {
        self.stages
            .iter()
            .map(|s| s.command_line())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Runs every stage to completion.
    ///
    /// # Arguments
    ///
    /// * `sink` - Destination of the final stage's stdout.
    ///
    /// # Returns
    /// Captured stdout of the final stage (empty unless `Sink::Capture`).
    /// If several stages fail, all are logged and the upstream-most one is returned.
    pub async fn run(&self, sink: Sink) -> Result<Vec<u8>, PipelineError> {
        if self.stages.is_empty() {
            return Err(PipelineError::InvalidConfig(format!("Pipeline '{}' has no stages", self.label)));
        }
        info!("Running the following subprocess command: '{}'", self.command_line());

        let last_index = self.stages.len() - 1;
        let mut children: Vec<Child> = Vec::with_capacity(self.stages.len());
        let mut upstream: Option<Stdio> = None;

        for (index, stage) in self.stages.iter().enumerate() {
            let stdin = upstream.take().unwrap_or_else(Stdio::null);
            let stdout = if index < last_index {
                Stdio::piped()
            } else {
                match sink {
                    Sink::Capture => Stdio::piped(),
                    Sink::Null => Stdio::null(),
                }
            };

            let mut child = Command::new(&stage.program)
                .args(&stage.args)
                .stdin(stdin)
                .stdout(stdout)
                .stderr(Stdio::inherit())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| PipelineError::ToolSpawn {
                    tool: stage.tool.clone(),
                    error: e.to_string(),
                })?;

            if index < last_index {
                let child_stdout = child.stdout.take().ok_or_else(|| PipelineError::ToolOutput {
                    tool: stage.tool.clone(),
                    error: "stdout was not captured".to_string(),
                })?;
                let next_stdin: Stdio = child_stdout.try_into()?;
                upstream = Some(next_stdin);
            }
            children.push(child);
        }

        let last = children.pop().ok_or_else(|| {
            PipelineError::InvalidConfig(format!("Pipeline '{}' has no stages", self.label))
        })?;
        let (last_status, captured) = match sink {
            Sink::Capture => {
                let output = last.wait_with_output().await?;
                (output.status, output.stdout)
            }
            Sink::Null => {
                let mut last = last;
                (last.wait().await?, Vec::new())
            }
        };

        let mut statuses = Vec::with_capacity(self.stages.len());
        for child in children.iter_mut() {
            statuses.push(child.wait().await?);
        }
        statuses.push(last_status);

        let mut first_failure: Option<PipelineError> = None;
        for (index, (stage, status)) in self.stages.iter().zip(statuses.iter()).enumerate() {
            if stage.is_success(status) {
                debug!("'{}' stage {} ({}) exited with {}", self.label, index, stage.tool, status);
                continue;
            }
            error!("'{}' stage {} ({}) failed: {}", self.label, index, stage.tool, status);
            if first_failure.is_none() {
                first_failure = Some(PipelineError::StageFailed {
                    pipeline: self.label.clone(),
                    stage: index,
                    tool: stage.tool.clone(),
                    status: status.to_string(),
                });
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(captured),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Stage {
        Stage::new("sh", Path::new("sh"), vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn test_three_stage_capture() {
        let pipeline = CommandPipeline::new("count")
            .stage(sh("printf 'a\\nb\\na\\nc\\n'"))
            .stage(Stage::new("sort", Path::new("sort"), vec!["-u".to_string()]))
            .stage(Stage::new("wc", Path::new("wc"), vec!["-l".to_string()]));
        let out = pipeline.run(Sink::Capture).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&out).trim(), "3");
    }

    #[tokio::test]
    async fn test_failing_stage_is_attributed() {
        let pipeline = CommandPipeline::new("broken")
            .stage(sh("printf 'x\\n'; exit 3"))
            .stage(Stage::new("wc", Path::new("wc"), vec!["-l".to_string()]));
        match pipeline.run(Sink::Capture).await {
            Err(PipelineError::StageFailed { pipeline, stage, tool, .. }) => {
                assert_eq!(pipeline, "broken");
                assert_eq!(stage, 0);
                assert_eq!(tool, "sh");
            }
            other => panic!("expected StageFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_accepted_exit_code() {
        let pipeline = CommandPipeline::new("nomatch").stage(sh("exit 1").accept_codes(&[1]));
        assert!(pipeline.run(Sink::Null).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let pipeline = CommandPipeline::new("missing")
            .stage(Stage::new("nope", Path::new("/nonexistent/bin/nope"), vec![]));
        assert!(matches!(pipeline.run(Sink::Null).await, Err(PipelineError::ToolSpawn { .. })));
    }

    #[tokio::test]
    async fn test_empty_pipeline() {
        let result = CommandPipeline::new("empty").run(Sink::Null).await;
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }
}
