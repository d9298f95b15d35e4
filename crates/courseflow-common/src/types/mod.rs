//! Common types used across Courseflow

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CourseflowError, Result};

/// The authenticated caller of an operation.
///
/// Identity is established upstream (session layer or gateway) and trusted
/// as given. `is_admin` grants access to other users' enrollment and progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub is_admin: bool,
}

impl Actor {
    pub fn student(id: Uuid) -> Self {
        Self {
            id,
            is_admin: false,
        }
    }

    pub fn admin(id: Uuid) -> Self {
        Self { id, is_admin: true }
    }

    /// Parse an identity from its raw header values.
    ///
    /// A missing admin flag means a regular student.
    pub fn parse(id: &str, is_admin: Option<&str>) -> Result<Self> {
        let id = Uuid::parse_str(id.trim())
            .map_err(|_| CourseflowError::InvalidUserId(id.to_string()))?;

        let is_admin = match is_admin.map(|s| s.trim().to_ascii_lowercase()) {
            None => false,
            Some(flag) => match flag.as_str() {
                "true" | "1" => true,
                "false" | "0" | "" => false,
                _ => return Err(CourseflowError::InvalidAdminFlag(flag)),
            },
        };

        Ok(Self { id, is_admin })
    }

    /// Whether this caller may read or act on data scoped to `user_id`
    pub fn can_access_user(&self, user_id: Uuid) -> bool {
        self.is_admin || self.id == user_id
    }

    /// Resolve an optional target user, defaulting to the caller
    pub fn target_user(&self, user_id: Option<Uuid>) -> Uuid {
        user_id.unwrap_or(self.id)
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_admin {
            write!(f, "{} (admin)", self.id)
        } else {
            write!(f, "{}", self.id)
        }
    }
}
