//! Business logic services.

#![allow(missing_docs)]

pub mod audit;
pub mod bulk_removal;
pub mod confirmation;
pub mod context;
pub mod eligibility;
pub mod enrollment;
pub mod invite;
pub mod profile;
pub mod project;
pub mod removal_session;
pub mod report;
pub mod selection;
pub mod user_admin;
pub mod user_admin_remote;

pub use audit::{AuditEntry, AuditService, AuditSink};
pub use bulk_removal::{
    ActionResult, BulkRemovalService, Notice, NoticeLevel, PlannedUser, ReactivationResult,
    RemovalPlan,
};
pub use confirmation::{ConfirmationGate, GateState};
pub use context::AdminContext;
pub use eligibility::{DependencyKind, EligibilityReport, EligibilityService, UserEligibility};
pub use enrollment::{EnrollInput, EnrollmentService};
pub use invite::{CreateInviteInput, InviteService, SignupInput};
pub use profile::ProfileService;
pub use project::{CreateProjectInput, CreateSubProjectInput, ProjectDependencies, ProjectService};
pub use removal_session::{RemovalSession, RemovalSessionStore, RemovalSessionView};
pub use report::{ReportService, SubmitReportInput};
pub use selection::Selection;
pub use user_admin::{
    ActionResults, DbUserAdmin, FailedUser, GatewayError, UserAction, UserAdminGateway,
};
pub use user_admin_remote::RemoteUserAdmin;
