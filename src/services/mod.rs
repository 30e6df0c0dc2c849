mod accounts;
mod actor;
mod catalog;
mod certificate;
mod enrollment;

pub use accounts::AccountService;
pub use actor::Actor;
pub use catalog::{CatalogService, CourseSummary, LessonAdded, PublishedCourse};
pub use certificate::{CertificateIssuer, serial_for};
pub use enrollment::{
    CompletionOutcome, EnrollmentEngine, EnrollmentError, EnrollmentResult, ProgressReport,
};
