use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::Instant;

use crate::cleanup::clear_output_dir;
use crate::errors::BenchError;
use crate::stats::TrialResult;
use crate::types::{CleanupPolicy, Target};

/// Fully resolved child-process request: the shell command, the directory
/// it runs in, and the acceleration variable to set (`Some`) or strip (`None`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub working_dir: Option<PathBuf>,
    pub env_var: String,
    pub env_value: Option<&'static str>,
}

/// Runs one invocation to completion. `Err` carries a human-readable reason.
pub trait CommandExecutor {
    fn execute(&self, invocation: &Invocation) -> Result<(), String>;
}

/// Executes through `sh -c` (or `cmd /C` on Windows), capturing output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellExecutor;

impl ShellExecutor {
    fn shell_command(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(&self, invocation: &Invocation) -> Result<(), String> {
        let mut cmd = Self::shell_command(&invocation.command);
        match invocation.env_value {
            Some(value) => cmd.env(&invocation.env_var, value),
            None => cmd.env_remove(&invocation.env_var),
        };
        if let Some(dir) = &invocation.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());

        let output = cmd
            .output()
            .map_err(|e| format!("failed to spawn `{}`: {}", invocation.command, e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(failure_detail(&output))
        }
    }
}

/// Exit status plus the last non-empty stderr line, if any.
fn failure_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    match stderr.lines().rev().map(str::trim).find(|l| !l.is_empty()) {
        Some(line) => format!("{} ({})", output.status, line),
        None => output.status.to_string(),
    }
}

/// Repeatedly times a target, clearing the output directory around each trial.
pub struct TrialRunner<E = ShellExecutor> {
    executor: E,
    output_dir: PathBuf,
    working_dir: Option<PathBuf>,
    acceleration_env: String,
    cleanup: CleanupPolicy,
}

impl TrialRunner<ShellExecutor> {
    pub fn new(output_dir: impl Into<PathBuf>, acceleration_env: &str) -> Self {
        Self::with_executor(ShellExecutor, output_dir, acceleration_env)
    }
}

impl<E: CommandExecutor> TrialRunner<E> {
    pub fn with_executor(
        executor: E,
        output_dir: impl Into<PathBuf>,
        acceleration_env: &str,
    ) -> Self {
        TrialRunner {
            executor,
            output_dir: output_dir.into(),
            working_dir: None,
            acceleration_env: acceleration_env.to_string(),
            cleanup: CleanupPolicy::default(),
        }
    }

    pub fn cleanup_policy(mut self, policy: CleanupPolicy) -> Self {
        self.cleanup = policy;
        self
    }

    /// Run every command in `dir` instead of the inherited directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Builds the child-process request for `target`.
    pub fn invocation(&self, target: &Target) -> Invocation {
        Invocation {
            command: target.command.clone(),
            working_dir: self.working_dir.clone(),
            env_var: self.acceleration_env.clone(),
            env_value: target.acceleration.map(|mode| mode.env_value()),
        }
    }

    /// Time `target` for `runs` trials.
    pub fn measure(&self, target: &Target, runs: usize) -> Result<TrialResult, BenchError> {
        self.measure_with_progress(target, runs, |_, _| {})
    }

    /// Like [`measure`](Self::measure), calling `on_trial(iteration, runs)`
    /// before each trial. Iterations are 1-based.
    ///
    /// The first failing trial aborts the whole measurement; no partial
    /// result is returned.
    pub fn measure_with_progress<F>(
        &self,
        target: &Target,
        runs: usize,
        mut on_trial: F,
    ) -> Result<TrialResult, BenchError>
    where
        F: FnMut(usize, usize),
    {
        if runs == 0 {
            return Err(BenchError::InvalidRunCount { runs });
        }

        let invocation = self.invocation(target);
        let mut samples = Vec::with_capacity(runs);

        for iteration in 1..=runs {
            on_trial(iteration, runs);
            clear_output_dir(&self.output_dir, self.cleanup)?;

            let start = Instant::now();
            self.executor
                .execute(&invocation)
                .map_err(|detail| BenchError::Execution {
                    label: target.label.clone(),
                    iteration,
                    runs,
                    detail,
                })?;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

            tracing::debug!(
                "{} run {}/{}: {:.2}ms",
                target.label,
                iteration,
                runs,
                elapsed_ms
            );
            samples.push(elapsed_ms);

            clear_output_dir(&self.output_dir, self.cleanup)?;
        }

        TrialResult::from_samples(samples)
    }
}
