//! Role-based page guards.
//!
//! Every protected page declares the role it serves and asks the guard
//! before rendering. The guard never raises: the answer is either the
//! session to render with or the route to bounce to.

use radboard_models::Role;

use crate::error::AppResult;
use crate::session::{SessionContext, SessionSnapshot};

/// Where a rejected visitor gets sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    SignIn,
    TechHome,
    EmployerHome,
}

impl RedirectTarget {
    pub fn path(&self) -> &'static str {
        match self {
            RedirectTarget::SignIn => "/signin",
            RedirectTarget::TechHome => "/jobs",
            RedirectTarget::EmployerHome => "/employer/jobs",
        }
    }
}

/// Guard verdict for one page load.
#[derive(Debug, Clone)]
pub enum GuardOutcome {
    /// Render the page with this session.
    Authorized(SessionSnapshot),
    /// Send the visitor elsewhere.
    Redirect(RedirectTarget),
}

impl GuardOutcome {
    pub fn is_authorized(&self) -> bool {
        matches!(self, GuardOutcome::Authorized(_))
    }
}

fn home_of(role: Role) -> RedirectTarget {
    match role {
        Role::Tech => RedirectTarget::TechHome,
        Role::Employer => RedirectTarget::EmployerHome,
    }
}

/// Decide what a page load should do, given the session state.
///
/// Signed-out visitors and accounts with no resolvable role go to sign-in;
/// a signed-in account with the wrong role goes to its own home page.
pub fn evaluate(snapshot: Option<SessionSnapshot>, required: Role) -> GuardOutcome {
    let Some(snapshot) = snapshot else {
        return GuardOutcome::Redirect(RedirectTarget::SignIn);
    };

    match snapshot.role() {
        Some(role) if role == required => GuardOutcome::Authorized(snapshot),
        Some(role) => GuardOutcome::Redirect(home_of(role)),
        None => GuardOutcome::Redirect(RedirectTarget::SignIn),
    }
}

/// Guard a page load, restoring the session from a stored token when the
/// cache is cold.
pub async fn guard_page(ctx: &SessionContext, required: Role) -> AppResult<GuardOutcome> {
    let snapshot = match ctx.current().await {
        Some(snapshot) => Some(snapshot),
        None => ctx.restore().await?,
    };
    Ok(evaluate(snapshot, required))
}

// =============================================================================
// Tests
// =============================================================================
