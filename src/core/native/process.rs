// ─── Game Process ───
// Turns a `LaunchRequest` into a spawned `java -cp ... <main class>` process.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};

use super::LaunchRequest;

/// Returns the OS-specific classpath separator.
pub fn get_classpath_separator() -> &'static str {
    if cfg!(windows) {
        ";"
    } else {
        ":"
    }
}

fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// Resolve the java executable from a configured runtime path.
///
/// The path may point at the runtime root, its `bin` directory or the
/// executable itself. An empty path falls back to `java` on `PATH`.
pub fn java_command(runtime_path: &str) -> PathBuf {
    if runtime_path.trim().is_empty() {
        return PathBuf::from(java_exe());
    }

    let path = Path::new(runtime_path);
    match path.file_name().and_then(|n| n.to_str()) {
        Some("bin") => path.join(java_exe()),
        Some("java") | Some("java.exe") => path.to_path_buf(),
        _ => path.join("bin").join(java_exe()),
    }
}

/// Assemble the argument vector: runtime args, `-cp`, main class, program args.
pub fn build_arguments(request: &LaunchRequest, main_class: &str) -> Vec<String> {
    let classpath = request
        .classpath
        .iter()
        .map(|entry| entry.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(get_classpath_separator());

    let mut args = request.runtime_args.clone();
    args.push("-cp".to_string());
    args.push(classpath);
    args.push(main_class.to_string());
    args.extend(request.program_args.iter().cloned());
    args
}

pub fn spawn_game(request: &LaunchRequest, main_class: &str) -> LauncherResult<()> {
    let java_bin = java_command(&request.runtime_path);
    let args = build_arguments(request, main_class);

    info!("Launching game with Java: {:?}", java_bin);
    debug!("Launching game with args: {}", args.join(" "));

    let child = Command::new(&java_bin)
        .args(&args)
        .current_dir(&request.working_dir)
        .stdin(Stdio::null())
        .spawn()
        .map_err(|e| LauncherError::ProcessLaunch(format!("{}: {}", java_bin.display(), e)))?;

    info!("Game process started (pid={})", child.id());
    Ok(())
}
