//! Session store: the whole application state and its reducer.
//!
//! Views never touch tickets directly. They turn user input into an
//! [`Intent`] and hand it to [`AppState::reduce`], which validates it against
//! the current user, delegates ticket logic to [`crate::engine`], and returns
//! the next state. A failed intent leaves the previous state untouched.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::engine;
use crate::error::{EngineError, SessionError};
use crate::model::{NewTicket, Role, Status, StatusFilter, Ticket, TicketId, Tickets, User, UserId};
use crate::stats::TicketStats;

/// Which screen the session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Login,
    Register,
    Dashboard,
    TicketDetails,
}

/// Dashboard filters applied on login, per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterDefaults {
    pub technician: StatusFilter,
    pub admin: StatusFilter,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            technician: StatusFilter::default_for(Role::Technician),
            admin: StatusFilter::default_for(Role::Admin),
        }
    }
}

impl FilterDefaults {
    const fn for_role(self, role: Role) -> StatusFilter {
        match role {
            Role::Technician => self.technician,
            Role::Admin => self.admin,
            Role::User => StatusFilter::All,
        }
    }
}

/// Everything a view can ask the session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Log in by username. Passwords are not part of this model.
    Login { username: String },
    Register { username: String },
    Logout,
    ShowRegister,
    ShowLogin,
    ViewTicket { id: TicketId },
    BackToDashboard,
    CreateTicket(NewTicket),
    AssignTechnician { ticket_id: TicketId, technician_id: UserId },
    UpdateStatus { ticket_id: TicketId, status: Status },
    SubmitReport { ticket_id: TicketId, report: String },
    SetFilter(StatusFilter),
}

impl Intent {
    const fn needs_user(&self) -> bool {
        !matches!(
            self,
            Self::Login { .. } | Self::Register { .. } | Self::ShowRegister | Self::ShowLogin
        )
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Register { .. } => "register",
            Self::Logout => "logout",
            Self::ShowRegister => "show_register",
            Self::ShowLogin => "show_login",
            Self::ViewTicket { .. } => "view_ticket",
            Self::BackToDashboard => "back_to_dashboard",
            Self::CreateTicket(_) => "create_ticket",
            Self::AssignTechnician { .. } => "assign_technician",
            Self::UpdateStatus { .. } => "update_status",
            Self::SubmitReport { .. } => "submit_report",
            Self::SetFilter(_) => "set_filter",
        }
    }
}

/// Immutable application state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppState {
    current_user: Option<User>,
    users: Vec<User>,
    tickets: Tickets,
    view: View,
    selected_ticket: Option<TicketId>,
    filter: StatusFilter,
    #[serde(skip)]
    filter_defaults: FilterDefaults,
}

impl AppState {
    /// Logged-out state over a user directory and an initial ticket set.
    #[must_use]
    pub fn new(users: Vec<User>, tickets: Tickets) -> Self {
        Self {
            current_user: None,
            users,
            tickets,
            view: View::Login,
            selected_ticket: None,
            filter: StatusFilter::All,
            filter_defaults: FilterDefaults::default(),
        }
    }

    #[must_use]
    pub fn with_filter_defaults(mut self, defaults: FilterDefaults) -> Self {
        self.filter_defaults = defaults;
        self
    }

    #[must_use]
    pub const fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }

    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    #[must_use]
    pub const fn tickets(&self) -> &Tickets {
        &self.tickets
    }

    #[must_use]
    pub const fn view(&self) -> View {
        self.view
    }

    #[must_use]
    pub const fn filter(&self) -> StatusFilter {
        self.filter
    }

    #[must_use]
    pub fn find_user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    /// The assignment roster.
    #[must_use]
    pub fn technicians(&self) -> Vec<&User> {
        engine::technicians(&self.users)
    }

    /// Tickets the current user may see under the current filter.
    #[must_use]
    pub fn visible(&self) -> Vec<Arc<Ticket>> {
        self.current_user
            .as_ref()
            .map(|user| engine::visible_tickets(&self.tickets, user, self.filter))
            .unwrap_or_default()
    }

    /// Counts over everything the current user may see, ignoring the filter.
    #[must_use]
    pub fn stats(&self) -> TicketStats {
        self.current_user
            .as_ref()
            .map(|user| {
                TicketStats::from_tickets(&engine::visible_tickets(
                    &self.tickets,
                    user,
                    StatusFilter::All,
                ))
            })
            .unwrap_or_default()
    }

    /// The ticket open in the details view, if it is still visible.
    #[must_use]
    pub fn selected(&self) -> Option<Arc<Ticket>> {
        let user = self.current_user.as_ref()?;
        let id = self.selected_ticket.as_ref()?;
        self.tickets
            .get(id)
            .filter(|t| engine::can_see(user, t))
            .cloned()
    }

    /// Statuses the current user may move `ticket` to.
    #[must_use]
    pub fn available_transitions(&self, ticket: &Ticket) -> Vec<Status> {
        self.current_user
            .as_ref()
            .map(|user| engine::available_transitions(user, ticket))
            .unwrap_or_default()
    }

    /// Apply `intent`, stamping any new ticket with the wall clock.
    ///
    /// # Errors
    ///
    /// See [`AppState::reduce_at`].
    pub fn reduce(&self, intent: Intent) -> Result<Self, SessionError> {
        self.reduce_at(intent, Utc::now())
    }

    /// Apply `intent` and return the next state.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NotAuthenticated`] for any intent other than login,
    ///   registration, or login/register view switching while logged out.
    /// - [`SessionError::UnknownUser`] when logging in as a name not in the
    ///   directory.
    /// - [`SessionError::Engine`] with `InvalidInput` when switching to the
    ///   login or register view while logged in.
    /// - [`SessionError::Engine`] for everything the engine rejects.
    pub fn reduce_at(&self, intent: Intent, now: DateTime<Utc>) -> Result<Self, SessionError> {
        debug!(intent = intent.name(), "reducing intent");
        let actor = match (&self.current_user, intent.needs_user()) {
            (Some(user), _) => Some(user),
            (None, true) => return Err(SessionError::NotAuthenticated),
            (None, false) => None,
        };

        let mut next = self.clone();
        match intent {
            Intent::Login { username } => {
                let user = self
                    .find_user(username.trim())
                    .cloned()
                    .ok_or(SessionError::UnknownUser { username })?;
                next.enter_dashboard(user);
            }
            Intent::Register { username } => {
                let user = self.register_user(&username)?;
                next.users.push(user.clone());
                next.enter_dashboard(user);
            }
            Intent::Logout => {
                if let Some(user) = actor {
                    info!(user = %user.username, "logged out");
                }
                next.current_user = None;
                next.selected_ticket = None;
                next.filter = StatusFilter::All;
                next.view = View::Login;
            }
            Intent::ShowRegister | Intent::ShowLogin if actor.is_some() => {
                return Err(
                    EngineError::invalid("view", "already logged in; log out first").into(),
                );
            }
            Intent::ShowRegister => next.view = View::Register,
            Intent::ShowLogin => next.view = View::Login,
            Intent::ViewTicket { id } => {
                let user = actor.ok_or(SessionError::NotAuthenticated)?;
                let visible = self.tickets.get(&id).is_some_and(|t| engine::can_see(user, t));
                if !visible {
                    return Err(EngineError::TicketNotFound { id }.into());
                }
                next.selected_ticket = Some(id);
                next.view = View::TicketDetails;
            }
            Intent::BackToDashboard => {
                next.selected_ticket = None;
                next.view = View::Dashboard;
            }
            Intent::CreateTicket(draft) => {
                let user = actor.ok_or(SessionError::NotAuthenticated)?;
                next.tickets = engine::create_ticket(&self.tickets, user, draft, now)?;
            }
            Intent::AssignTechnician {
                ticket_id,
                technician_id,
            } => {
                let user = actor.ok_or(SessionError::NotAuthenticated)?;
                let technician = self.roster_entry(&technician_id)?;
                next.tickets = engine::assign(&self.tickets, &ticket_id, user, technician)?;
            }
            Intent::UpdateStatus { ticket_id, status } => {
                let user = actor.ok_or(SessionError::NotAuthenticated)?;
                next.tickets = engine::set_status(&self.tickets, &ticket_id, user, status)?;
            }
            Intent::SubmitReport { ticket_id, report } => {
                let user = actor.ok_or(SessionError::NotAuthenticated)?;
                next.tickets = engine::submit_report(&self.tickets, &ticket_id, user, &report)?;
            }
            Intent::SetFilter(filter) => next.filter = filter,
        }
        Ok(next)
    }

    fn enter_dashboard(&mut self, user: User) {
        info!(user = %user.username, role = %user.role, "logged in");
        self.filter = self.filter_defaults.for_role(user.role);
        self.current_user = Some(user);
        self.selected_ticket = None;
        self.view = View::Dashboard;
    }

    fn register_user(&self, username: &str) -> Result<User, EngineError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(EngineError::invalid("username", "must not be empty"));
        }
        if self.find_user(username).is_some() {
            return Err(EngineError::invalid(
                "username",
                format!("'{username}' is already taken"),
            ));
        }
        let id = UserId::next_after(self.users.iter().map(|u| &u.id))
            .ok_or_else(|| EngineError::invalid("id", "user id sequence is exhausted"))?;
        info!(user = %username, id = %id, "registered");
        Ok(User {
            id,
            username: username.to_string(),
            role: Role::User,
        })
    }

    fn roster_entry(&self, id: &UserId) -> Result<&User, EngineError> {
        self.users
            .iter()
            .find(|u| &u.id == id && u.is_technician())
            .ok_or_else(|| {
                EngineError::invalid("technician", format!("'{id}' is not on the technician roster"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::model::TicketType;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 8, 0, 0).unwrap()
    }

    fn directory() -> Vec<User> {
        vec![
            User::new("1", "alice", Role::User),
            User::new("2", "admin", Role::Admin),
            User::new("3", "bob", Role::Technician),
            User::new("4", "carol", Role::Technician),
        ]
    }

    fn logged_in(username: &str) -> AppState {
        AppState::new(directory(), Tickets::new())
            .reduce(Intent::Login {
                username: username.to_string(),
            })
            .unwrap()
    }

    fn switch_user(state: &AppState, username: &str) -> AppState {
        state
            .reduce(Intent::Logout)
            .unwrap()
            .reduce(Intent::Login {
                username: username.to_string(),
            })
            .unwrap()
    }

    #[test]
    fn starts_logged_out_on_login_view() {
        let state = AppState::new(directory(), Tickets::new());
        assert!(!state.is_authenticated());
        assert_eq!(state.view(), View::Login);
        assert!(state.visible().is_empty());
        assert_eq!(state.stats(), TicketStats::default());
    }

    #[test]
    fn login_sets_role_default_filter() {
        let bob = logged_in("bob");
        assert_eq!(bob.view(), View::Dashboard);
        assert_eq!(bob.filter(), StatusFilter::Only(Status::Assigned));
        assert_eq!(logged_in("admin").filter(), StatusFilter::All);
    }

    #[test]
    fn configured_filter_defaults_apply_on_login() {
        let defaults = FilterDefaults {
            technician: StatusFilter::All,
            admin: StatusFilter::Only(Status::Created),
        };
        let state = AppState::new(directory(), Tickets::new()).with_filter_defaults(defaults);
        let admin = state
            .reduce(Intent::Login {
                username: "admin".to_string(),
            })
            .unwrap();
        assert_eq!(admin.filter(), StatusFilter::Only(Status::Created));
    }

    #[test]
    fn unknown_login_is_reported() {
        let state = AppState::new(directory(), Tickets::new());
        assert_eq!(
            state.reduce(Intent::Login {
                username: "mallory".to_string()
            }),
            Err(SessionError::UnknownUser {
                username: "mallory".to_string()
            })
        );
    }

    #[test]
    fn logged_out_mutations_are_rejected() {
        let state = AppState::new(directory(), Tickets::new());
        let draft = NewTicket::new("t", "d", TicketType::Software);
        assert_eq!(
            state.reduce(Intent::CreateTicket(draft)),
            Err(SessionError::NotAuthenticated)
        );
        assert_eq!(state.reduce(Intent::Logout), Err(SessionError::NotAuthenticated));
        let register = state.reduce(Intent::ShowRegister).unwrap();
        assert_eq!(register.view(), View::Register);
        assert_eq!(register.reduce(Intent::ShowLogin).unwrap().view(), View::Login);
    }

    #[test]
    fn register_adds_user_role_and_logs_in() {
        let state = AppState::new(directory(), Tickets::new());
        let next = state
            .reduce(Intent::Register {
                username: " dave ".to_string(),
            })
            .unwrap();
        let dave = next.current_user().unwrap();
        assert_eq!(dave.username, "dave");
        assert_eq!(dave.role, Role::User);
        assert_eq!(dave.id, UserId::new("u-1"));
        assert_eq!(next.users().len(), 5);

        let dup = next.reduce(Intent::Register {
            username: "alice".to_string(),
        });
        assert!(matches!(
            dup,
            Err(SessionError::Engine(EngineError::InvalidInput {
                field: "username",
                ..
            }))
        ));
    }

    #[test]
    fn login_and_register_views_only_while_logged_out() {
        let state = AppState::new(directory(), Tickets::new());
        let register = state.reduce(Intent::ShowRegister).unwrap();
        assert_eq!(register.view(), View::Register);
        assert_eq!(register.reduce(Intent::ShowLogin).unwrap().view(), View::Login);

        let admin = logged_in("admin");
        for intent in [Intent::ShowRegister, Intent::ShowLogin] {
            let err = admin.reduce(intent).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidInput);
        }
        assert_eq!(admin.view(), View::Dashboard);
    }

    #[test]
    fn register_fails_cleanly_when_user_ids_run_out() {
        let mut users = directory();
        users.push(User::new("u-18446744073709551615", "last", Role::User));
        let state = AppState::new(users, Tickets::new());
        let err = state
            .reduce(Intent::Register {
                username: "dave".to_string(),
            })
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert!(state.find_user("dave").is_none());
    }

    #[test]
    fn logout_keeps_tickets() {
        let alice = logged_in("alice");
        let alice = alice
            .reduce_at(
                Intent::CreateTicket(NewTicket::new("VPN down", "No tunnel", TicketType::Network)),
                at(),
            )
            .unwrap();
        let out = alice.reduce(Intent::Logout).unwrap();
        assert!(!out.is_authenticated());
        assert_eq!(out.view(), View::Login);
        assert_eq!(out.tickets().len(), 1);
    }

    #[test]
    fn full_lifecycle_through_reducer() {
        let alice = logged_in("alice");
        let alice = alice
            .reduce_at(
                Intent::CreateTicket(NewTicket::new(
                    "Printer broken",
                    "Jams constantly",
                    TicketType::Hardware,
                )),
                at(),
            )
            .unwrap();
        let id = TicketId::new("tk-1");

        let admin = switch_user(&alice, "admin");
        let admin = admin
            .reduce(Intent::AssignTechnician {
                ticket_id: id.clone(),
                technician_id: UserId::new("3"),
            })
            .unwrap();
        assert_eq!(admin.tickets().get(&id).unwrap().status, Status::Assigned);

        let bob = switch_user(&admin, "bob");
        assert_eq!(bob.visible().len(), 1);
        let bob = bob
            .reduce(Intent::UpdateStatus {
                ticket_id: id.clone(),
                status: Status::InProgress,
            })
            .unwrap();
        // default technician filter hides in-progress work
        assert!(bob.visible().is_empty());
        assert_eq!(bob.stats().in_progress, 1);

        let carol = switch_user(&bob, "carol");
        assert!(matches!(
            carol.reduce(Intent::UpdateStatus {
                ticket_id: id,
                status: Status::Resolved,
            }),
            Err(SessionError::Engine(EngineError::Unauthorized { .. }))
        ));
    }

    #[test]
    fn assign_rejects_non_roster_ids() {
        let admin = logged_in("admin");
        let err = admin.reduce(Intent::AssignTechnician {
            ticket_id: TicketId::new("tk-1"),
            technician_id: UserId::new("1"),
        });
        assert!(matches!(
            err,
            Err(SessionError::Engine(EngineError::InvalidInput {
                field: "technician",
                ..
            }))
        ));
    }

    #[test]
    fn view_ticket_requires_visibility() {
        let alice = logged_in("alice")
            .reduce_at(
                Intent::CreateTicket(NewTicket::new("Laptop", "Won't boot", TicketType::Hardware)),
                at(),
            )
            .unwrap();
        let id = TicketId::new("tk-1");

        let details = alice.reduce(Intent::ViewTicket { id: id.clone() }).unwrap();
        assert_eq!(details.view(), View::TicketDetails);
        assert_eq!(details.selected().unwrap().title, "Laptop");
        let back = details.reduce(Intent::BackToDashboard).unwrap();
        assert_eq!(back.view(), View::Dashboard);
        assert!(back.selected().is_none());

        let carol = switch_user(&alice, "carol");
        assert!(matches!(
            carol.reduce(Intent::ViewTicket { id }),
            Err(SessionError::Engine(EngineError::TicketNotFound { .. }))
        ));
    }

    #[test]
    fn failed_intent_leaves_state_unchanged() {
        let alice = logged_in("alice");
        let before = alice.clone();
        let _ = alice.reduce(Intent::UpdateStatus {
            ticket_id: TicketId::new("tk-1"),
            status: Status::Closed,
        });
        assert_eq!(alice, before);
    }

    #[test]
    fn set_filter_narrows_admin_view() {
        let alice = logged_in("alice")
            .reduce_at(
                Intent::CreateTicket(NewTicket::new("a", "a", TicketType::Software)),
                at(),
            )
            .unwrap();
        let admin = switch_user(&alice, "admin");
        assert_eq!(admin.visible().len(), 1);
        let filtered = admin
            .reduce(Intent::SetFilter(StatusFilter::Only(Status::Closed)))
            .unwrap();
        assert!(filtered.visible().is_empty());
        assert_eq!(filtered.stats().total, 1);
    }
}
