use crate::core::error::{LauncherError, LauncherResult};

/// Operating systems a runtime is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeOs {
    Windows,
    Mac,
    Linux,
}

/// CPU architectures a runtime is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeArch {
    X64,
    Aarch64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: RuntimeOs,
    pub arch: RuntimeArch,
}

impl RuntimeOs {
    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeOs::Windows => "windows",
            RuntimeOs::Mac => "mac",
            RuntimeOs::Linux => "linux",
        }
    }

    pub fn archive_extension(self) -> &'static str {
        match self {
            RuntimeOs::Windows => "zip",
            RuntimeOs::Mac | RuntimeOs::Linux => "tar.gz",
        }
    }
}

impl RuntimeArch {
    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeArch::X64 => "x64",
            RuntimeArch::Aarch64 => "aarch64",
        }
    }
}

impl Platform {
    /// Map Rust's `std::env::consts` names onto the runtime release naming.
    pub fn resolve(os: &str, arch: &str) -> LauncherResult<Self> {
        let unsupported = || LauncherError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        };

        let os_kind = match os {
            "windows" => RuntimeOs::Windows,
            "macos" | "darwin" => RuntimeOs::Mac,
            "linux" => RuntimeOs::Linux,
            _ => return Err(unsupported()),
        };
        let arch_kind = match arch {
            "x86_64" => RuntimeArch::X64,
            "aarch64" => RuntimeArch::Aarch64,
            _ => return Err(unsupported()),
        };

        Ok(Self {
            os: os_kind,
            arch: arch_kind,
        })
    }

    pub fn current() -> LauncherResult<Self> {
        Self::resolve(std::env::consts::OS, std::env::consts::ARCH)
    }
}
