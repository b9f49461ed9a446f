pub mod assignment_service;
pub mod attempt_service;
pub mod deadline;
pub mod eligibility_service;
pub mod prerequisite_service;
pub mod scoring;
pub mod sweep_service;

pub use assignment_service::AssignmentService;
pub use attempt_service::AttemptService;
pub use eligibility_service::EligibilityService;
pub use prerequisite_service::{
    AlwaysMetPrerequisites, HttpPrerequisiteChecker, PrerequisiteChecker,
};
pub use sweep_service::ExpirySweeper;
