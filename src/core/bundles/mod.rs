pub mod cache;
pub mod sync;

pub use cache::{server_hash, BundleCache};
pub use sync::{BundleCheck, BundleDescriptor, BundleProgressFn, BundleReport, BundleSync};
