pub mod cache;
pub mod form;
pub mod legacy;
pub mod pl;
pub mod share;
pub mod stats;

pub use cache::TradeCache;
pub use form::{validate_credentials, TradeForm, ValidationError};
pub use legacy::LegacyTrade;
pub use pl::{calculate_pl, pl_text, UNDEFINED_MARKER};
pub use share::{parse_share_link, share_link};
pub use stats::{compute_stats, equity_curve, equity_points, EquityCurvePoint, JournalStats};
