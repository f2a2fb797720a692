//! The censor pipeline: scheduler, worker, and the plumbing between them.
//!
//! ```text
//!              audio callback (real-time)          censor worker (thread)
//! ┌─────────┐  ┌──────────────────────────┐        ┌────────────────────┐
//! │  input  │─▶│ append ─▶ delay ring ────┼──read──▶ overwrite(censored)│
//! │ frames  │  │    │                     │        │        ▲           │
//! └─────────┘  │ downmix ─▶ staging ──────┼─slot───▶ filter ─▶ resample │
//!              │                          │        │ ─▶ ASR ─▶ detect   │
//! ┌─────────┐  │ read_at(write - delay) ──┼──────┐ └────────────────────┘
//! │ output  │◀─┤ (silence until buffered, │      │
//! │ frames  │  │  paused on underrun)     │      └─ delayed, censored audio
//! └─────────┘  └──────────────────────────┘
//! ```

pub mod engine;
pub mod handoff;
pub mod report;
pub mod scheduler;
pub mod stats;
pub mod worker;

pub use engine::{CensorPipeline, PipelineHandle};
pub use handoff::StagedChunk;
pub use report::{ErrorReporter, LogReporter, StageError};
pub use scheduler::Scheduler;
pub use stats::{PipelineStats, StatsSnapshot};
