//! Users and trip collaborators

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lightweight reference to a user as embedded by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserRef {
    /// Name, then email, then id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Access level of a collaborator on a trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorRole {
    /// Created the trip; cannot be changed or removed
    Owner,
    /// May modify the trip and its packing list
    #[default]
    Edit,
    /// Read-only access
    View,
}

impl CollaboratorRole {
    #[must_use]
    pub const fn can_edit(self) -> bool {
        matches!(self, Self::Owner | Self::Edit)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Edit => "edit",
            Self::View => "view",
        }
    }
}

/// A user attached to a trip with a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub user: UserRef,
    pub role: CollaboratorRole,
}

/// Check that `current` may be changed to `requested`.
///
/// The owner role is immutable and cannot be granted.
pub fn ensure_role_change_allowed(
    current: CollaboratorRole,
    requested: CollaboratorRole,
) -> Result<()> {
    if current == CollaboratorRole::Owner {
        return Err(Error::InvalidInput(
            "the trip owner's role cannot be changed".to_string(),
        ));
    }
    if requested == CollaboratorRole::Owner {
        return Err(Error::InvalidInput(
            "ownership cannot be granted to a collaborator".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(CollaboratorRole::Owner.can_edit());
        assert!(CollaboratorRole::Edit.can_edit());
        assert!(!CollaboratorRole::View.can_edit());
    }

    #[test]
    fn test_role_change_rules() {
        assert!(ensure_role_change_allowed(CollaboratorRole::Edit, CollaboratorRole::View).is_ok());
        assert!(ensure_role_change_allowed(CollaboratorRole::Owner, CollaboratorRole::View).is_err());
        assert!(ensure_role_change_allowed(CollaboratorRole::View, CollaboratorRole::Owner).is_err());
    }

    #[test]
    fn test_user_ref_accepts_mongo_ids() {
        let user: UserRef = serde_json::from_str(r#"{"_id":"u1","email":"a@b.c"}"#).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.display_name(), "a@b.c");
    }
}
