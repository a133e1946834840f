pub mod assignment;
pub mod course;
pub mod dashboard;
pub mod database;
pub mod enrollment;
pub mod grade;
pub mod memory_store;
pub mod notification;
pub mod store;

// 重新导出常用类型
pub use assignment::AssignmentService;
pub use course::CourseService;
pub use dashboard::DashboardService;
pub use database::Database;
pub use enrollment::EnrollmentService;
pub use grade::GradeService;
pub use memory_store::MemoryStore;
pub use notification::NotificationService;
pub use store::{DocumentQuery, DocumentStore, SharedStore};
