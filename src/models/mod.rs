pub mod assignment;
pub mod course;
pub mod dashboard;
pub mod enrollment;
pub mod filter;
pub mod grade;
pub mod notification;
pub mod response;

pub use assignment::Assignment;
pub use course::{ContentBlock, Course, CourseDocument, CourseLevel, CourseModule, CourseStatus, Lesson, QuizOption, QuizQuestion};
pub use dashboard::{ActivityItem, ActivityType, DashboardData, DashboardStats};
pub use enrollment::{EnrollResult, Enrollment, EnrollmentStatus, LessonProgress};
pub use filter::{CourseFilter, FilterOptions};
pub use grade::Grade;
pub use notification::{Notification, NotificationPriority, NotificationQuery};
pub use response::ApiResponse;
