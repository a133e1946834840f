use super::notification_bell::NotificationBell;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Dashboard,
    Courses,
    Grades,
    Assignments,
    Notifications,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Dashboard, Tab::Courses, Tab::Grades, Tab::Assignments, Tab::Notifications];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Courses => "My Courses",
            Tab::Grades => "Grades",
            Tab::Assignments => "Assignments",
            Tab::Notifications => "Notifications",
        }
    }
}

impl FromStr for Tab {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Tab::ALL
            .into_iter()
            .find(|tab| tab.label().eq_ignore_ascii_case(s) || format!("{:?}", tab).eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::bad_request(&format!("Unknown tab: {}", s)))
    }
}

/// 侧边栏外壳：当前标签页和通知铃铛
pub struct Shell {
    active: Tab,
    bell: NotificationBell,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellState {
    pub active_tab: Tab,
    pub unread_count: usize,
    pub dropdown_open: bool,
}

impl Shell {
    pub fn new(bell: NotificationBell) -> Self {
        Self { active: Tab::default(), bell }
    }

    pub fn active(&self) -> Tab {
        self.active
    }

    /// 切换标签页时顺带关闭通知面板
    pub fn switch_to(&mut self, tab: Tab) {
        self.active = tab;
        self.bell.dismiss_outside();
    }

    pub fn bell(&self) -> &NotificationBell {
        &self.bell
    }

    pub fn bell_mut(&mut self) -> &mut NotificationBell {
        &mut self.bell
    }

    pub fn state(&self) -> ShellState {
        ShellState {
            active_tab: self.active,
            unread_count: self.bell.unread_count(),
            dropdown_open: self.bell.is_open(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{MemoryStore, NotificationService};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn tabs_parse_by_name_or_label() {
        assert_eq!("grades".parse::<Tab>().unwrap(), Tab::Grades);
        assert_eq!("My Courses".parse::<Tab>().unwrap(), Tab::Courses);
        assert!("settings".parse::<Tab>().is_err());
    }

    #[tokio::test]
    async fn switching_tabs_closes_dropdown() {
        let service = NotificationService::new(Arc::new(MemoryStore::new())).await.unwrap();
        let mut shell = Shell::new(NotificationBell::start(service, "u1", Duration::from_secs(30)));

        assert_eq!(shell.active(), Tab::Dashboard);
        shell.bell_mut().toggle();
        assert!(shell.state().dropdown_open);

        shell.switch_to(Tab::Assignments);
        let state = shell.state();
        assert_eq!(state.active_tab, Tab::Assignments);
        assert!(!state.dropdown_open);
    }
}
