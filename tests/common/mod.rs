//! Shared test infrastructure for integration tests.
#![allow(dead_code)]

use serde_json::Value;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

fn manifest_dir() -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()))
}

/// Raw model output saved under tests/fixtures/.
pub fn fixture(name: &str) -> String {
    let path = manifest_dir().join("tests/fixtures").join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("read fixture {}: {err}", path.display()))
}

/// Result from one drape-guide invocation.
#[derive(Debug)]
pub struct CliRun {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CliRun {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout).unwrap_or_else(|err| {
            panic!(
                "stdout is not JSON ({err}):\n{}\nstderr:\n{}",
                self.stdout, self.stderr
            )
        })
    }
}

/// Run the binary with `args`, feeding `stdin` when given.
///
/// Upstream variables are cleared so a developer's environment cannot reach
/// a real endpoint.
pub fn run_cli(args: &[&str], stdin: Option<&str>) -> CliRun {
    let mut command = Command::new(env!("CARGO_BIN_EXE_drape-guide"));
    command
        .args(args)
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("API_BASE_URL")
        .env_remove("DRAPE_LOG")
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().expect("spawn drape-guide");
    if let Some(input) = stdin {
        let mut pipe = child.stdin.take().expect("stdin piped");
        pipe.write_all(input.as_bytes()).expect("write stdin");
    }
    let output = child.wait_with_output().expect("wait for drape-guide");
    CliRun {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}
