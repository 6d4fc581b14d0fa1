pub mod store;

pub use store::{SessionState, SessionStore, TOKEN_KEY, USER_KEY};
