//! Organization entities referenced by the engine.
//!
//! These are owned by external administration; the engine only reads them
//! through the [`Directory`](crate::directory::Directory) port.

use serde::{Deserialize, Serialize};

/// Role of a user in the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Unrestricted administrator.
    SuperAdmin,
    /// Administrator.
    Admin,
    /// Leads one or more groups.
    GroupLeader,
    /// Production worker.
    Worker,
}

/// The user performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The user id.
    pub id: String,
    /// The user's role.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    /// Returns true for SUPER_ADMIN and ADMIN.
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::SuperAdmin | Role::Admin)
    }
}

/// A factory worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    /// User id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Employee code shown in reports.
    #[serde(default)]
    pub code: Option<String>,
    /// The group the worker belongs to, if any.
    #[serde(default)]
    pub group_id: Option<String>,
    /// The worker's role.
    pub role: Role,
    /// Inactive workers are left out of groups and reports.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// A production group, led by one group leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owning team.
    pub team_id: String,
    /// The group's leader.
    #[serde(default)]
    pub leader_id: Option<String>,
}

/// A team of groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owning department.
    pub department_id: String,
}

/// A department of teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Department id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owning office.
    pub office_id: String,
}

/// A factory office, the root of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Office {
    /// Office id.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// A product or a process, both referenced by id and name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalogued {
    /// Id.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// A process that may be performed on a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductProcess {
    /// Product id.
    pub product_id: String,
    /// Process id.
    pub process_id: String,
}
