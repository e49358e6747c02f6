use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, instrument};

fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// Find a working Java install: `$JAVA_HOME` first, then `PATH`.
#[instrument]
pub fn find_java_path() -> Option<PathBuf> {
    if let Ok(java_home) = std::env::var("JAVA_HOME") {
        let candidate = Path::new(&java_home).join("bin").join(java_exe());
        if candidate.exists() && runs_version(&candidate) {
            return Some(candidate);
        }
    }

    let candidate = which_java()?;
    if runs_version(&candidate) {
        Some(candidate)
    } else {
        None
    }
}

fn which_java() -> Option<PathBuf> {
    let output = if cfg!(windows) {
        Command::new("where").arg(java_exe()).output()
    } else {
        Command::new("which").arg(java_exe()).output()
    }
    .ok()?;

    if !output.status.success() {
        return None;
    }

    first_path_line(&String::from_utf8_lossy(&output.stdout))
}

fn first_path_line(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
}

fn runs_version(java_bin: &Path) -> bool {
    let ok = Command::new(java_bin)
        .arg("-version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false);
    debug!("Probing {:?}: usable={}", java_bin, ok);
    ok
}
