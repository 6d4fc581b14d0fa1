pub mod profile;
pub mod session;
pub mod trade;

pub use profile::*;
pub use session::*;
pub use trade::*;
