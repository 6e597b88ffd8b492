//! Event-loop scheduling primitives.
//!
//! `Deferred` runs work on the next loop turn; `RepaintTimer` paces repaints.
//! Both are single-threaded and rely on the runtime to drive them.

mod deferred;
mod timer;

pub use deferred::Deferred;
pub use timer::RepaintTimer;
