//! Result of one supervised run.

use crate::error::TaskError;
use crate::idle::{LoopReport, StopReason};

/// How one producer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerOutcome {
    /// Producer name.
    pub name: String,
    /// `Ok(())`, its returned error, or `TaskError::Panicked` for a contained panic.
    pub result: Result<(), TaskError>,
}

impl ProducerOutcome {
    /// `true` if the producer failed or panicked (cancellation is not a fault).
    pub fn is_fault(&self) -> bool {
        matches!(&self.result, Err(e) if e.is_fault())
    }
}

/// Summary returned by [`Supervisor::run`](crate::Supervisor::run).
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Report of the consumer loop.
    pub loop_report: LoopReport,
    /// One entry per producer that finished (in completion order).
    pub producers: Vec<ProducerOutcome>,
    /// Offers accepted by the channel.
    pub accepted: u64,
    /// Offers rejected (full or closed).
    pub rejected: u64,
    /// Accepted items still buffered when the run ended.
    pub undelivered: usize,
}

impl RunReport {
    /// Why the consumer loop stopped.
    pub fn reason(&self) -> StopReason {
        self.loop_report.reason
    }

    /// Producers that failed or panicked.
    pub fn faults(&self) -> impl Iterator<Item = &ProducerOutcome> {
        self.producers.iter().filter(|p| p.is_fault())
    }
}
