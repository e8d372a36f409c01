//! Queue-mode orchestration for flowclip.
//!
//! [`QueueSession`] owns the process-wide queue mode and the commands the
//! queue panel exposes; [`CaptureRouter`] decides where each clipboard
//! capture goes.

mod mode;
mod router;
mod session;

pub use mode::QueueMode;
pub use router::{CaptureRouter, HistoryRef, HistorySink, NullHistory, Routed};
pub use session::{QueueSession, SessionError};
