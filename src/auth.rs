//! App-only credentials, bearer token records, and the cached token source.

mod metrics;
pub mod record;
pub mod secret;
pub mod source;

pub use self::metrics::*;
pub use record::*;
pub use secret::*;
pub use source::*;
