//! Database entities.

#![allow(missing_docs)]

pub mod audit_log;
pub mod enrollment;
pub mod invite_code;
pub mod payment;
pub mod profile;
pub mod project;
pub mod report;
pub mod sub_project;

pub use audit_log::Entity as AuditLog;
pub use enrollment::Entity as Enrollment;
pub use invite_code::Entity as InviteCode;
pub use payment::Entity as Payment;
pub use profile::Entity as Profile;
pub use project::Entity as Project;
pub use report::Entity as Report;
pub use sub_project::Entity as SubProject;
