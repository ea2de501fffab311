//! Role-gated protection for application routes.
//!
//! A [`RouteGuard`] is mounted once per protected navigation. Each mount
//! starts out verifying, asks the backend for the role behind the stored
//! token, and settles as granted or denied. A denied mount redirects to the
//! login page matching its access requirement.
//!
//! ```ignore
//! let guard = RouteGuard::new(client);
//! let mounted = guard.mount(AccessRequirement::Admin, "/admin/orders");
//! mounted.verify().await;
//! match mounted.render(|| admin_dashboard()) {
//!     Rendered::Loading => spinner(),
//!     Rendered::Content(page) => page,
//!     Rendered::Redirect(_) => blank(),
//! }
//! ```


use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::api::AuthApi;
use crate::client::SessionClient;
use crate::navigation::Navigation;
use crate::routes;
use crate::session::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessRequirement {
    /// Any session the backend accepts
    Authenticated,
    /// Only sessions the backend reports as admin
    Admin,
}

impl AccessRequirement {
    /// Where a denied visitor is sent.
    pub fn login_path(self) -> &'static str {
        match self {
            AccessRequirement::Authenticated => routes::CUSTOMER_LOGIN,
            AccessRequirement::Admin => routes::ADMIN_LOGIN,
        }
    }

    pub fn admits(self, role: Role) -> bool {
        match self {
            AccessRequirement::Authenticated => true,
            AccessRequirement::Admin => role == Role::Admin,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardState {
    Verifying,
    Granted,
    Denied,
}

/// What a mounted guard shows.
#[derive(Debug, PartialEq, Eq)]
pub enum Rendered<T> {
    Loading,
    Content(T),
    Redirect(Navigation),
}

#[derive(Clone, Debug)]
pub struct RouteGuard {
    auth: AuthApi,
}

impl RouteGuard {
    pub fn new(client: SessionClient) -> Self {
        Self {
            auth: AuthApi::new(client),
        }
    }

    fn client(&self) -> &SessionClient {
        self.auth.client()
    }

    /// Mounts the guard for one navigation. Without a stored token the mount
    /// is denied right away and its redirect issued; nothing is sent.
    pub fn mount(&self, requirement: AccessRequirement, location: impl Into<String>) -> MountedGuard {
        let mounted = MountedGuard {
            guard: self.clone(),
            requirement,
            location: location.into(),
            shared: Arc::new(MountState {
                mounted: AtomicBool::new(true),
                progress: Mutex::new(Progress::default()),
            }),
        };

        if self.client().session().token().is_none() {
            debug!(location = %mounted.location, "no stored token");
            mounted.deny(mounted.denied_navigation(), true);
        }

        mounted
    }
}

#[derive(Debug)]
struct MountState {
    mounted: AtomicBool,
    progress: Mutex<Progress>,
}

#[derive(Debug)]
struct Progress {
    state: GuardState,
    /// Set once denied: the redirect the user was actually sent through.
    redirect: Option<Navigation>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            state: GuardState::Verifying,
            redirect: None,
        }
    }
}

/// One mount of a [`RouteGuard`]. Clones refer to the same mount.
#[derive(Clone, Debug)]
pub struct MountedGuard {
    guard: RouteGuard,
    requirement: AccessRequirement,
    location: String,
    shared: Arc<MountState>,
}

impl MountedGuard {
    pub fn state(&self) -> GuardState {
        self.shared.progress.lock().state
    }

    /// The redirect that followed a denial, if the mount was denied.
    pub fn redirect(&self) -> Option<Navigation> {
        self.shared.progress.lock().redirect.clone()
    }

    pub fn requirement(&self) -> AccessRequirement {
        self.requirement
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Hosts remount the guard whenever this key changes.
    pub fn key(&self) -> (AccessRequirement, &str) {
        (self.requirement, &self.location)
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.mounted.load(Ordering::Acquire)
    }

    /// Stops this mount from changing state or navigating. A verification
    /// already in flight still runs to completion.
    pub fn unmount(&self) {
        self.shared.mounted.store(false, Ordering::Release);
    }

    /// Runs the verification for this mount and returns the resulting state.
    /// Returns the current state unchanged if the mount already settled, and
    /// `Verifying` if it was unmounted before the backend answered.
    pub async fn verify(&self) -> GuardState {
        let current = self.state();
        if current != GuardState::Verifying {
            return current;
        }

        let client = self.guard.client();
        let session = client.session();
        if session.token().is_none() {
            return self.deny(self.denied_navigation(), true);
        }

        let redirect_was_pending = client.redirect_pending();
        match self.guard.auth.check_role().await {
            Ok(role) => {
                if let Err(err) = session.set_role(role) {
                    warn!(error = %err, "could not store verified role");
                }
                let admitted = self.requirement.admits(role);
                debug!(location = %self.location, %role, requirement = ?self.requirement, admitted, "role verified");
                if admitted {
                    self.grant()
                } else {
                    self.deny(self.denied_navigation(), true)
                }
            }
            Err(err) => {
                warn!(location = %self.location, error = %err, "role verification failed");
                if let Err(err) = session.clear() {
                    warn!(error = %err, "could not clear session after failed verification");
                }
                // A 401 here has already sent the user to the login page
                // with a full page load.
                if !redirect_was_pending && client.redirect_pending() {
                    self.deny(SessionClient::unauthorized_navigation(), false)
                } else {
                    self.deny(self.denied_navigation(), true)
                }
            }
        }
    }

    pub fn render<T>(&self, children: impl FnOnce() -> T) -> Rendered<T> {
        let (state, redirect) = {
            let progress = self.shared.progress.lock();
            (progress.state, progress.redirect.clone())
        };
        match state {
            GuardState::Verifying => Rendered::Loading,
            GuardState::Granted => Rendered::Content(children()),
            GuardState::Denied => {
                Rendered::Redirect(redirect.unwrap_or_else(|| self.denied_navigation()))
            }
        }
    }

    fn denied_navigation(&self) -> Navigation {
        Navigation::replace(self.requirement.login_path(), Some(self.location.clone()))
    }

    fn grant(&self) -> GuardState {
        if !self.is_mounted() {
            debug!(location = %self.location, "guard unmounted before verification finished");
            return self.state();
        }

        self.shared.progress.lock().state = GuardState::Granted;
        GuardState::Granted
    }

    /// Denies the mount. `navigation` is where the user ends up; it is only
    /// issued from here when `issue` is set.
    fn deny(&self, navigation: Navigation, issue: bool) -> GuardState {
        if !self.is_mounted() {
            debug!(location = %self.location, "guard unmounted before verification finished");
            return self.state();
        }

        {
            let mut progress = self.shared.progress.lock();
            progress.state = GuardState::Denied;
            progress.redirect = Some(navigation.clone());
        }

        if issue {
            self.guard.client().navigate(navigation);
        }
        GuardState::Denied
    }
}
