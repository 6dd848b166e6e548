//! Access-control policy - pure decision functions.
//!
//! Each function takes a resource snapshot and an [`Actor`] and returns an
//! [`Access`] decision; nothing here reads or writes storage. There are two
//! distinct authorization shapes and they stay two distinct named functions:
//! ownership of tasks and integration connections is overridable by an
//! elevated role, ownership of a calendar never is. A calendar's share list
//! is itself a trust boundary, so an administrator must not be able to expose
//! another user's private schedule through a role override.

use daybook_domain::{Calendar, DaybookError, Result, Visibility};

/// The authenticated caller, as extracted by the request layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    /// Elevated-role flag. Overrides ownership checks for
    /// ownership-overridable resources (tasks, connections), never for
    /// calendars.
    pub elevated: bool,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, elevated: bool) -> Self {
        Self { user_id: user_id.into(), elevated }
    }
}

/// Reason code attached to a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeniedReason {
    /// Actor is not the owner (and not elevated where that matters).
    NotOwner,
    /// Actor has no visibility of the resource.
    NoAccess,
}

/// Outcome of a policy decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied(DeniedReason),
}

impl Access {
    /// Convert the decision into a domain error, describing `what` in the
    /// denial message.
    pub fn require(self, what: &str) -> Result<()> {
        match self {
            Self::Granted => Ok(()),
            Self::Denied(DeniedReason::NotOwner) => {
                Err(DaybookError::NotOwner(what.to_string()))
            }
            Self::Denied(DeniedReason::NoAccess) => {
                Err(DaybookError::NoAccess(what.to_string()))
            }
        }
    }

    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Ownership rule for tasks and integration connections: the owner, or any
/// actor carrying the elevated role.
pub fn owner_or_elevated(owner_id: &str, actor: &Actor) -> Access {
    if actor.elevated || actor.user_id == owner_id {
        Access::Granted
    } else {
        Access::Denied(DeniedReason::NotOwner)
    }
}

/// Calendar mutation rule: strictly the owner, regardless of elevated role.
pub fn calendar_owner_only(calendar: &Calendar, actor: &Actor) -> Access {
    if actor.user_id == calendar.owner_id {
        Access::Granted
    } else {
        Access::Denied(DeniedReason::NotOwner)
    }
}

/// Calendar read rule: the owner, anyone for a public calendar, or a share
/// grantee of a shared calendar.
pub fn calendar_visible_to(calendar: &Calendar, actor: &Actor) -> Access {
    let visible = actor.user_id == calendar.owner_id
        || match calendar.visibility {
            Visibility::Public => true,
            Visibility::Shared => calendar.is_shared_with(&actor.user_id),
            Visibility::Private => false,
        };

    if visible {
        Access::Granted
    } else {
        Access::Denied(DeniedReason::NoAccess)
    }
}

#[cfg(test)]
mod tests {
    use daybook_domain::CalendarShare;
    use uuid::Uuid;

    use super::*;

    fn calendar(owner: &str, visibility: Visibility, shared_with: &[&str]) -> Calendar {
        let id = Uuid::now_v7();
        Calendar {
            id,
            owner_id: owner.to_string(),
            name: "cal".to_string(),
            visibility,
            deleted: false,
            shares: shared_with
                .iter()
                .map(|u| CalendarShare { calendar_id: id, user_id: (*u).to_string() })
                .collect(),
        }
    }

    #[test]
    fn owner_rule_allows_owner_and_elevated() {
        let owner = Actor::new("alice", false);
        let admin = Actor::new("root", true);
        let other = Actor::new("bob", false);

        assert!(owner_or_elevated("alice", &owner).is_granted());
        assert!(owner_or_elevated("alice", &admin).is_granted());
        assert_eq!(
            owner_or_elevated("alice", &other),
            Access::Denied(DeniedReason::NotOwner)
        );
    }

    #[test]
    fn calendar_owner_rule_ignores_elevated_role() {
        let cal = calendar("alice", Visibility::Private, &[]);
        let admin = Actor::new("root", true);

        assert_eq!(
            calendar_owner_only(&cal, &admin),
            Access::Denied(DeniedReason::NotOwner)
        );
        assert!(calendar_owner_only(&cal, &Actor::new("alice", false)).is_granted());
    }

    #[test]
    fn private_calendar_is_visible_to_owner_only() {
        let cal = calendar("alice", Visibility::Private, &[]);

        assert!(calendar_visible_to(&cal, &Actor::new("alice", false)).is_granted());
        assert_eq!(
            calendar_visible_to(&cal, &Actor::new("bob", false)),
            Access::Denied(DeniedReason::NoAccess)
        );
        // Elevated role does not grant visibility either.
        assert_eq!(
            calendar_visible_to(&cal, &Actor::new("root", true)),
            Access::Denied(DeniedReason::NoAccess)
        );
    }

    #[test]
    fn shared_calendar_is_visible_to_grantees() {
        let cal = calendar("alice", Visibility::Shared, &["bob"]);

        assert!(calendar_visible_to(&cal, &Actor::new("bob", false)).is_granted());
        assert_eq!(
            calendar_visible_to(&cal, &Actor::new("carol", false)),
            Access::Denied(DeniedReason::NoAccess)
        );
    }

    #[test]
    fn public_calendar_is_visible_to_everyone() {
        let cal = calendar("alice", Visibility::Public, &[]);
        assert!(calendar_visible_to(&cal, &Actor::new("mallory", false)).is_granted());
    }

    #[test]
    fn require_maps_reasons_to_domain_errors() {
        assert!(Access::Granted.require("x").is_ok());
        assert_eq!(
            Access::Denied(DeniedReason::NoAccess).require("calendar"),
            Err(DaybookError::NoAccess("calendar".to_string()))
        );
        assert_eq!(
            Access::Denied(DeniedReason::NotOwner).require("task"),
            Err(DaybookError::NotOwner("task".to_string()))
        );
    }
}
