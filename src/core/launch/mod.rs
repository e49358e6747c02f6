pub mod classpath;
pub mod task;

pub use classpath::build_classpath;
pub use task::{LaunchOptions, LaunchOrchestrator};
