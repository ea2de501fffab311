//! Application paths the session layer redirects to, and which of them are
//! protected.

use crate::guard::AccessRequirement;

pub const CUSTOMER_LOGIN: &str = "/login";
pub const ADMIN_LOGIN: &str = "/login/admin";
pub const REGISTER: &str = "/register";
pub const CUSTOMER_HOME: &str = "/home";
pub const CUSTOMER_DASHBOARD: &str = "/dashboard";
pub const ADMIN_HOME: &str = "/admin";

/// The access requirement of an application path, or `None` for public
/// pages. Query strings and fragments are ignored.
pub fn requirement_for(location: &str) -> Option<AccessRequirement> {
    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');

    if path == ADMIN_HOME || path.starts_with("/admin/") {
        Some(AccessRequirement::Admin)
    } else if path == CUSTOMER_DASHBOARD {
        Some(AccessRequirement::Authenticated)
    } else {
        None
    }
}
