//! Fixed identifiers of the queue schema. Nothing here is request-derived.

pub const JOB_TABLE: &str = "nuq.queue_scrape";
pub const BACKLOG_TABLE: &str = "nuq.queue_scrape_backlog";
pub const JOB_STATUS_TYPE: &str = "nuq.job_status";
