pub mod detect;
pub mod platform;
pub mod provisioner;

pub use detect::find_java_path;
pub use platform::{Platform, RuntimeArch, RuntimeOs};
pub use provisioner::{
    runtime_archive_name, runtime_download_url, RuntimeProgress, RuntimeProgressFn,
    RuntimeProvisioner, RuntimeStatus,
};
