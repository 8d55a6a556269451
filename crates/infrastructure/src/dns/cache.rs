pub mod clock;
pub mod key;
pub mod record_bag;
pub mod record_cache;

pub use clock::{Clock, SystemClock};
pub use key::CacheKey;
pub use record_bag::RecordBag;
pub use record_cache::RecordCache;
