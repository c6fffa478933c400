//! Eventual-consistency polling.
//!
//! Objects written to a bucket become visible on the locally mounted view
//! after a delay. Before trusting a local read, commands poll the mount path
//! with a bounded budget of checks separated by a fixed delay:
//!
//! - [`ConsistencyPoller::wait_for_file`] fails with `ConsistencyTimeout`
//!   when the path never appears.
//! - [`ConsistencyPoller::wait_for_file_update`] waits for a recent
//!   modification time and proceeds anyway when none shows up.
//!
//! Time and filesystem access go through [`Clock`] and [`PathProbe`].

mod clock;
mod probe;
mod request;
mod waiter;

pub use clock::{Clock, SystemClock};
pub use probe::{FsProbe, PathProbe};
pub use request::{
    PollReport, PollRequest, PollState, DEFAULT_FILE_CHECK_DELAY, DEFAULT_FILE_CHECK_RETRIES,
};
pub use waiter::ConsistencyPoller;
