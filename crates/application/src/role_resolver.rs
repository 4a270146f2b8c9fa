use std::sync::Arc;

use fieldforce_core::{AppResult, Identity};
use fieldforce_domain::{Role, RoleFlags, ViewAccess};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::dashboard_ports::IdentityGateway;

/// Identity lookup result shared by every view of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Signed-in user, `None` when the lookup failed.
    pub identity: Option<Identity>,
    /// Role flags derived from every authority.
    pub flags: RoleFlags,
    /// Highest-priority role across every authority.
    pub role: Role,
}

/// Resolves the current user's roles once per session.
///
/// Concurrent callers share a single identity request. A failed lookup is
/// remembered as resolved-with-no-roles so views stop waiting and render
/// their permission state.
pub struct RoleResolver {
    gateway: Arc<dyn IdentityGateway>,
    resolved: OnceCell<ResolvedIdentity>,
}

impl RoleResolver {
    /// Creates an unresolved resolver.
    #[must_use]
    pub fn new(gateway: Arc<dyn IdentityGateway>) -> Self {
        Self {
            gateway,
            resolved: OnceCell::new(),
        }
    }

    /// Returns the resolved identity, fetching it on first use.
    pub async fn resolve(&self) -> &ResolvedIdentity {
        self.resolved
            .get_or_init(|| async {
                match self.gateway.current_identity().await {
                    Ok(identity) => {
                        let flags = RoleFlags::from_authorities(identity.authorities());
                        let role = Role::effective_of(&identity);
                        info!(
                            user_id = %identity.id(),
                            role = role.as_str(),
                            primary_role = Role::primary_of(&identity).as_str(),
                            "resolved signed-in identity"
                        );
                        ResolvedIdentity {
                            identity: Some(identity),
                            flags,
                            role,
                        }
                    }
                    Err(error) => {
                        warn!(error = %error, "identity lookup failed, continuing without roles");
                        ResolvedIdentity {
                            identity: None,
                            flags: RoleFlags::unresolved_fallback(),
                            role: Role::Unassigned,
                        }
                    }
                }
            })
            .await
    }

    /// Returns the flags without triggering a lookup.
    #[must_use]
    pub fn flags(&self) -> RoleFlags {
        self.resolved
            .get()
            .map_or_else(RoleFlags::pending, |resolved| resolved.flags)
    }

    /// Resolves and picks the scope a view should use.
    pub async fn scope_for(&self, access: ViewAccess) -> AppResult<Role> {
        access.scope(&self.resolve().await.flags)
    }

    /// Forgets the cached identity, e.g. after the token changed.
    pub fn invalidate(&mut self) {
        self.resolved = OnceCell::new();
    }
}
