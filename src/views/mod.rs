pub mod course_browser;
pub mod dashboard;
pub mod notification_bell;
pub mod shell;

pub use course_browser::CourseBrowserView;
pub use dashboard::{DashboardState, DashboardView, RefreshOutcome};
pub use notification_bell::NotificationBell;
pub use shell::{Shell, ShellState, Tab};
