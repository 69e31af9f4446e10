// src/navigation.rs

use std::fmt;

use crate::models::Role;
use crate::session::Session;

/// Roles that may approve or reject leave and expense requests.
pub const APPROVER_ROLES: [Role; 3] = [Role::Manager, Role::Admin, Role::Hr];

/// Roles that may use the admin surface (departments, users, reference data).
pub const ADMIN_ROLES: [Role; 2] = [Role::Admin, Role::Hr];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Login,
    Dashboard,
    Leave,
    Expense,
    Attendance,
    Reports,
    Admin,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Login => "Login",
            View::Dashboard => "Dashboard",
            View::Leave => "Leave",
            View::Expense => "Expense",
            View::Attendance => "Attendance",
            View::Reports => "Reports",
            View::Admin => "Admin",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.title())
    }
}

/// Tabs inside the leave and expense views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTab {
    Submit,
    MyRequests,
    Approvals,
}

pub fn can_approve(role: Role) -> bool {
    APPROVER_ROLES.contains(&role)
}

pub fn can_access_admin(role: Role) -> bool {
    ADMIN_ROLES.contains(&role)
}

fn authenticated_role(session: &Session) -> Option<Role> {
    if session.authenticated {
        session.role()
    } else {
        None
    }
}

/// The navigable views for a session. Without a session only `Login` is reachable.
pub fn visible_views(session: &Session) -> Vec<View> {
    let Some(role) = authenticated_role(session) else {
        return vec![View::Login];
    };

    let mut views = vec![
        View::Dashboard,
        View::Leave,
        View::Expense,
        View::Attendance,
        View::Reports,
    ];
    if can_access_admin(role) {
        views.push(View::Admin);
    }
    views
}

pub fn can_access(session: &Session, view: View) -> bool {
    visible_views(session).contains(&view)
}

pub fn request_tabs(role: Role) -> Vec<RequestTab> {
    let mut tabs = vec![RequestTab::Submit, RequestTab::MyRequests];
    if can_approve(role) {
        tabs.push(RequestTab::Approvals);
    }
    tabs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn session_for(role: Role) -> Session {
        Session {
            user: Some(User {
                id: "u1".into(),
                email: "someone@company.com".into(),
                full_name: "Some One".into(),
                employee_id: "EMP100".into(),
                role,
                department_id: None,
                phone: None,
                is_active: true,
                created_at: None,
            }),
            token: Some("t".into()),
            authenticated: true,
            loading: false,
        }
    }

    #[test]
    fn unauthenticated_sees_only_login() {
        assert_eq!(visible_views(&Session::default()), vec![View::Login]);
        assert!(!can_access(&Session::default(), View::Dashboard));
    }

    #[test]
    fn admin_view_is_limited_to_admin_and_hr() {
        assert!(can_access(&session_for(Role::Admin), View::Admin));
        assert!(can_access(&session_for(Role::Hr), View::Admin));
        assert!(!can_access(&session_for(Role::Manager), View::Admin));
        assert!(!can_access(&session_for(Role::Employee), View::Admin));
    }

    #[test]
    fn employee_gets_no_approval_tab() {
        assert!(!can_approve(Role::Employee));
        assert_eq!(
            request_tabs(Role::Employee),
            vec![RequestTab::Submit, RequestTab::MyRequests]
        );
        assert!(request_tabs(Role::Manager).contains(&RequestTab::Approvals));
        assert!(request_tabs(Role::Hr).contains(&RequestTab::Approvals));
    }

    #[test]
    fn logged_in_session_never_lists_login() {
        assert!(!visible_views(&session_for(Role::Employee)).contains(&View::Login));
    }
}
