pub mod app_state;
pub mod settings;
pub mod store;

pub use app_state::AppContext;
pub use settings::{ReleaseChannel, Settings, SettingsManager};
pub use store::JsonStore;
