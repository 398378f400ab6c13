//! Organization directory port.
//!
//! Offices, departments, teams, groups, workers and the product catalogue are
//! administered elsewhere. The engine only reads them through [`Directory`],
//! so tests and local runs use the YAML-seeded [`InMemoryDirectory`].

mod in_memory;

use async_trait::async_trait;

use crate::error::{EngineError, EngineResult};
use crate::models::{Actor, Department, Group, Office, Team, Worker};

pub use in_memory::InMemoryDirectory;

/// Read access to the organization hierarchy and catalogue.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Looks up any user by id.
    async fn user(&self, id: &str) -> Option<Worker>;

    /// Looks up a group.
    async fn group(&self, id: &str) -> Option<Group>;

    /// Looks up a team.
    async fn team(&self, id: &str) -> Option<Team>;

    /// Looks up a department.
    async fn department(&self, id: &str) -> Option<Department>;

    /// Looks up an office.
    async fn office(&self, id: &str) -> Option<Office>;

    /// All offices, in directory order.
    async fn offices(&self) -> Vec<Office>;

    /// Departments of an office.
    async fn departments_of(&self, office_id: &str) -> Vec<Department>;

    /// Teams of a department.
    async fn teams_of(&self, department_id: &str) -> Vec<Team>;

    /// Groups of a team.
    async fn groups_of(&self, team_id: &str) -> Vec<Group>;

    /// Active users assigned to a group.
    async fn active_members(&self, group_id: &str) -> Vec<Worker>;

    /// Returns true if the process may be performed on the product.
    async fn is_valid_pairing(&self, product_id: &str, process_id: &str) -> bool;

    /// Display name of a product.
    async fn product_name(&self, product_id: &str) -> Option<String>;

    /// Display name of a process.
    async fn process_name(&self, process_id: &str) -> Option<String>;

    /// Resolves the acting user. Unknown users are refused.
    async fn actor(&self, id: &str) -> EngineResult<Actor> {
        self.user(id)
            .await
            .filter(|user| user.active)
            .map(|user| Actor::new(user.id, user.role))
            .ok_or_else(|| EngineError::permission_denied(id, "unknown or inactive user"))
    }

    /// Resolves the office owning a group through its team and department.
    async fn office_of_group(&self, group_id: &str) -> EngineResult<String> {
        let group = self
            .group(group_id)
            .await
            .ok_or_else(|| EngineError::not_found("group", group_id))?;
        let team = self
            .team(&group.team_id)
            .await
            .ok_or_else(|| EngineError::not_found("team", &group.team_id))?;
        let department = self
            .department(&team.department_id)
            .await
            .ok_or_else(|| EngineError::not_found("department", &team.department_id))?;
        Ok(department.office_id)
    }
}
