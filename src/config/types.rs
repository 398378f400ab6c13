//! Configuration types for the worksheet engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use serde::Deserialize;

use crate::models::{Catalogued, Department, Group, Office, ProductProcess, Team, Worker};

/// Engine settings from `engine.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineSettings {
    /// The factory's wall-clock offset from UTC, e.g. `"+07:00"`.
    pub utc_offset: String,
    /// Days after which ACTIVE and COMPLETED worksheets are archived.
    pub archive_after_days: u32,
    /// The address the HTTP server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Capacity of the change event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_event_buffer() -> usize {
    256
}

/// The organization directory seed from `organization.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrganizationConfig {
    /// Factory offices.
    #[serde(default)]
    pub offices: Vec<Office>,
    /// Departments of the offices.
    #[serde(default)]
    pub departments: Vec<Department>,
    /// Teams of the departments.
    #[serde(default)]
    pub teams: Vec<Team>,
    /// Production groups of the teams.
    #[serde(default)]
    pub groups: Vec<Group>,
    /// All users, workers and administrators alike.
    #[serde(default)]
    pub workers: Vec<Worker>,
    /// Product catalogue.
    #[serde(default)]
    pub products: Vec<Catalogued>,
    /// Process catalogue.
    #[serde(default)]
    pub processes: Vec<Catalogued>,
    /// Valid product/process pairings.
    #[serde(default)]
    pub product_processes: Vec<ProductProcess>,
}

/// The complete configuration loaded from a configuration directory.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    settings: EngineSettings,
    organization: OrganizationConfig,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(settings: EngineSettings, organization: OrganizationConfig) -> Self {
        Self {
            settings,
            organization,
        }
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the organization seed.
    pub fn organization(&self) -> &OrganizationConfig {
        &self.organization
    }
}
