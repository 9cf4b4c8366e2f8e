//! Process execution helper.

use std::process::Command;
use tracing::{debug, warn};

/// Runs an external program and hands back whatever it wrote to stdout.
///
/// Execution failures are not reported to the caller: a program that cannot
/// be spawned yields empty output, and a program that exits non-zero still
/// yields the stdout it produced.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Vec<u8>;
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[&str]) -> Vec<u8> {
        debug!(program, ?args, "Running command");

        let output = match Command::new(program).args(args).output() {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to run '{}': {}", program, e);
                return Vec::new();
            }
        };

        if !output.status.success() {
            warn!(
                "'{}' exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        output.stdout
    }
}
