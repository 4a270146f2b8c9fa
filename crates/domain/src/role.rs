use fieldforce_core::{AppError, AppResult, Identity};
use serde::{Deserialize, Serialize};

/// Closed set of dashboard roles.
///
/// Variants are declared in priority order: when a user holds several
/// grants, the earliest variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Manages a team of coordinators and field officers.
    Manager,
    /// Coordinates visits for a set of field officers.
    Coordinator,
    /// Field sales officer visiting locations.
    FieldOfficer,
    /// Authenticated user without a recognised dashboard role.
    Unassigned,
}

impl Role {
    /// Every role, highest priority first.
    pub const PRIORITY: [Self; 5] = [
        Self::Admin,
        Self::Manager,
        Self::Coordinator,
        Self::FieldOfficer,
        Self::Unassigned,
    ];

    /// Parses one raw authority string.
    ///
    /// Matching ignores case and an optional `ROLE_` prefix. Unknown
    /// authorities map to [`Role::Unassigned`].
    #[must_use]
    pub fn from_authority(authority: &str) -> Self {
        let normalized = authority.trim().to_ascii_uppercase();
        let name = normalized.strip_prefix("ROLE_").unwrap_or(&normalized);

        match name {
            "ADMIN" | "SUPER_ADMIN" => Self::Admin,
            "MANAGER" => Self::Manager,
            "COORDINATOR" => Self::Coordinator,
            "FIELD_OFFICER" | "FIELDOFFICER" => Self::FieldOfficer,
            _ => Self::Unassigned,
        }
    }

    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Coordinator => "coordinator",
            Self::FieldOfficer => "field_officer",
            Self::Unassigned => "unassigned",
        }
    }

    /// Returns the classification of the identity's first authority.
    #[must_use]
    pub fn primary_of(identity: &Identity) -> Self {
        classify_role(identity.primary_authority().as_slice())
    }

    /// Returns the classification of every authority the identity holds.
    #[must_use]
    pub fn effective_of(identity: &Identity) -> Self {
        classify_role(identity.authorities())
    }
}

/// Classifies a list of raw grants into a single role using [`Role::PRIORITY`].
#[must_use]
pub fn classify_role<S: AsRef<str>>(authorities: &[S]) -> Role {
    authorities
        .iter()
        .map(|authority| Role::from_authority(authority.as_ref()))
        .min()
        .unwrap_or(Role::Unassigned)
}

/// Non-exclusive role flags plus a resolution marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFlags {
    /// Holds an admin grant.
    pub is_admin: bool,
    /// Holds a manager grant.
    pub is_manager: bool,
    /// Holds a coordinator grant.
    pub is_coordinator: bool,
    /// Holds a field officer grant.
    pub is_field_officer: bool,
    /// Identity lookup finished, successfully or not.
    pub resolved: bool,
}

impl RoleFlags {
    /// Flags for a view that has not resolved its identity yet.
    #[must_use]
    pub fn pending() -> Self {
        Self::default()
    }

    /// Flags used when identity resolution failed.
    #[must_use]
    pub fn unresolved_fallback() -> Self {
        Self {
            resolved: true,
            ..Self::default()
        }
    }

    /// Derives flags from every granted authority.
    #[must_use]
    pub fn from_authorities<S: AsRef<str>>(authorities: &[S]) -> Self {
        let mut flags = Self::unresolved_fallback();
        for authority in authorities {
            match Role::from_authority(authority.as_ref()) {
                Role::Admin => flags.is_admin = true,
                Role::Manager => flags.is_manager = true,
                Role::Coordinator => flags.is_coordinator = true,
                Role::FieldOfficer => flags.is_field_officer = true,
                Role::Unassigned => {}
            }
        }

        flags
    }

    /// Returns whether the flags include the given role.
    #[must_use]
    pub fn has(&self, role: Role) -> bool {
        match role {
            Role::Admin => self.is_admin,
            Role::Manager => self.is_manager,
            Role::Coordinator => self.is_coordinator,
            Role::FieldOfficer => self.is_field_officer,
            Role::Unassigned => self.resolved,
        }
    }
}

/// Ordered list of roles one view accepts, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewAccess {
    view: &'static str,
    priority: &'static [Role],
}

impl ViewAccess {
    /// Approvals page: admins see every request, managers their team,
    /// coordinators their field officers.
    pub const APPROVALS: Self = Self {
        view: "approvals",
        priority: &[Role::Admin, Role::Manager, Role::Coordinator],
    };

    /// Dashboard overview and live map.
    pub const DASHBOARD: Self = Self {
        view: "dashboard",
        priority: &[Role::Admin, Role::Manager, Role::Coordinator],
    };

    /// Visit assignment grid.
    pub const ASSIGN_VISITS: Self = Self {
        view: "assign_visits",
        priority: &[Role::Admin, Role::Manager, Role::Coordinator],
    };

    /// Salary and allowance administration.
    pub const SALARIES: Self = Self {
        view: "salaries",
        priority: &[Role::Admin],
    };

    /// Own visits and expenses.
    pub const MY_WORK: Self = Self {
        view: "my_work",
        priority: &[
            Role::Admin,
            Role::Manager,
            Role::Coordinator,
            Role::FieldOfficer,
        ],
    };

    /// Creates a custom access rule.
    #[must_use]
    pub const fn new(view: &'static str, priority: &'static [Role]) -> Self {
        Self { view, priority }
    }

    /// Returns the view name used in permission messages.
    #[must_use]
    pub fn view(&self) -> &'static str {
        self.view
    }

    /// Returns the accepted roles in priority order.
    #[must_use]
    pub fn priority(&self) -> &'static [Role] {
        self.priority
    }

    /// Picks the highest-priority accepted role the flags hold.
    pub fn scope(&self, flags: &RoleFlags) -> AppResult<Role> {
        if !flags.resolved {
            return Err(AppError::Permission(format!(
                "identity not resolved yet for view '{}'",
                self.view
            )));
        }

        self.priority
            .iter()
            .copied()
            .find(|role| flags.has(*role))
            .ok_or_else(|| {
                AppError::Permission(format!(
                    "your account has no role that can open '{}'",
                    self.view
                ))
            })
    }
}
