//! Asynchronous job manager: accepts a screening request, runs the
//! tiered pipeline (manned assets → catalog sweep, or fleet mode) on a
//! background worker, and exposes progress/result polling (spec.md
//! §4.10, C10).

mod job;
mod manager;
mod traits;

pub use job::{Job, JobStatus, ScreeningResult, ScreeningStats, Threat};
pub use manager::{JobError, JobManager, Result, SubmitRequest};
pub use traits::{
    CannedNarrativeGenerator, FileSystemPdfRenderer, NarrativeGenerator, PdfRenderer,
    XaiNarrativeGenerator,
};
