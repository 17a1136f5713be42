pub mod cancel;
pub mod limiter;
pub mod page;
pub mod pool;
pub mod spider;

pub use cancel::{CancelHandle, CancelToken};
pub use limiter::RateLimiter;
pub use pool::{PoolClosed, WorkerPool};
pub use spider::{DocumentSink, Spider};
