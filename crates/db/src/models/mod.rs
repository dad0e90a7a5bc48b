pub mod job;

pub use job::{JobRecord, JobStatus, NewJob};
