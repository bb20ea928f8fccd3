// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Access control for destinations, decided purely by session phase.

use std::fmt;

use log::debug;

use crate::session::{self, Phase};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Access {
    Public,
    /// Signed-in users only.
    Guarded,
    /// Signed-out visitors only: the login and registration forms.
    GuestOnly,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Destination {
    Landing,
    Login,
    Register,
    Dashboard,
    Upload,
    History,
    Advisory,
    Profile,
    NotFound,
}

impl Destination {
    /// Where signed-in users land when they try to open a guest-only page.
    pub(crate) const HOME: Self = Self::Dashboard;

    pub(crate) const fn access(self) -> Access {
        match self {
            Self::Landing | Self::NotFound => Access::Public,
            Self::Login | Self::Register => Access::GuestOnly,
            Self::Dashboard | Self::Upload | Self::History | Self::Advisory | Self::Profile => {
                Access::Guarded
            }
        }
    }

    pub(crate) const fn path(self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/dashboard",
            Self::Upload => "/upload",
            Self::History => "/history",
            Self::Advisory => "/advisory",
            Self::Profile => "/profile",
            Self::NotFound => "/404",
        }
    }

    /// Unknown paths resolve to [`Destination::NotFound`] rather than failing.
    pub(crate) fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        match path.trim_end_matches('/') {
            "" => Self::Landing,
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/dashboard" => Self::Dashboard,
            "/upload" => Self::Upload,
            "/history" => Self::History,
            "/advisory" => Self::Advisory,
            "/profile" => Self::Profile,
            _ => Self::NotFound,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Decision {
    Render(Destination),
    Redirect(Destination),
    /// The outcome depends on a verification still in flight.
    Loading,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Render(destination) => write!(f, "render {destination}"),
            Self::Redirect(destination) => write!(f, "redirect to {destination}"),
            Self::Loading => f.write_str("loading"),
        }
    }
}

pub(crate) const fn decide(phase: Phase, destination: Destination) -> Decision {
    match (destination.access(), phase) {
        (Access::Public, _)
        | (Access::Guarded, Phase::Authenticated)
        | (Access::GuestOnly, Phase::Initializing | Phase::Unauthenticated) => {
            Decision::Render(destination)
        }
        (Access::Guarded, Phase::Initializing) => Decision::Loading,
        (Access::Guarded, Phase::Unauthenticated) => Decision::Redirect(Destination::Login),
        (Access::GuestOnly, Phase::Authenticated) => Decision::Redirect(Destination::HOME),
    }
}

/// Decide once the decision no longer depends on a pending verification.
/// Public and guest-only destinations never wait.
pub(crate) async fn admit(session: &session::Manager, destination: Destination) -> Decision {
    let mut phase = session.subscribe();
    loop {
        let decision = decide(*phase.borrow_and_update(), destination);
        if decision != Decision::Loading {
            return decision;
        }

        debug!("Waiting for the session to be verified before opening {}", destination);
        if phase.changed().await.is_err() {
            return decide(session.phase(), destination);
        }
    }
}
