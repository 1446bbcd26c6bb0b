//! Database repositories.

#![allow(missing_docs)]

mod audit_log;
mod enrollment;
mod invite_code;
mod payment;
mod profile;
mod project;
mod report;

pub use audit_log::AuditLogRepository;
pub use enrollment::EnrollmentRepository;
pub use invite_code::InviteCodeRepository;
pub use payment::PaymentRepository;
pub use profile::{DeleteOutcome, ProfileDependencies, ProfileRepository};
pub use project::ProjectRepository;
pub use report::ReportRepository;
