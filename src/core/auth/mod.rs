pub mod pkce;
pub mod provider;
pub mod session;

pub use provider::{IdentityProvider, TokenSet};
pub use session::{Session, SessionManager};
