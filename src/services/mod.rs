pub mod analytics;
pub mod assessments;
pub mod attachments;
pub mod export;

pub use analytics::AnalyticsService;
pub use assessments::AssessmentService;
pub use attachments::AttachmentService;
