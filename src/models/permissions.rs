// tyr-service/src/models/permissions.rs
use serde::{Deserialize, Serialize};

// Global role supplied by the identity provider. Admin bypasses every
// entity-level check in the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalRole {
    Admin,
    TeamManager,
    Employee,
    Client,
}

// Role of a member inside a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Owner,
    Manager,
    Member,
}

// Permission bundle carried on a team membership record. Always derived
// from the role through `TeamRole::permissions`, never set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPermissions {
    pub can_invite: bool,
    pub can_manage_projects: bool,
    pub can_view_all_tasks: bool,
    pub can_manage_tasks: bool,
}

impl TeamRole {
    // The single role -> bundle lookup table. Adding a role means editing
    // this table and nothing else.
    pub fn permissions(&self) -> TeamPermissions {
        match self {
            TeamRole::Owner | TeamRole::Manager => TeamPermissions {
                can_invite: true,
                can_manage_projects: true,
                can_view_all_tasks: true,
                can_manage_tasks: true,
            },
            TeamRole::Member => TeamPermissions {
                can_invite: false,
                can_manage_projects: false,
                can_view_all_tasks: true,
                can_manage_tasks: false,
            },
        }
    }
}

// Role of a member inside a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectRole {
    Lead,
    Developer,
    Designer,
    Tester,
    Client,
}

impl Default for ProjectRole {
    fn default() -> Self {
        ProjectRole::Developer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPermissions {
    pub can_edit_project: bool,
    pub can_manage_tasks: bool,
    pub can_invite_members: bool,
}

impl ProjectRole {
    pub fn permissions(&self) -> ProjectPermissions {
        match self {
            ProjectRole::Lead => ProjectPermissions {
                can_edit_project: true,
                can_manage_tasks: true,
                can_invite_members: true,
            },
            _ => ProjectPermissions {
                can_edit_project: false,
                can_manage_tasks: false,
                can_invite_members: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_bundle_matches_owner_bundle() {
        assert_eq!(TeamRole::Owner.permissions(), TeamRole::Manager.permissions());
        assert!(TeamRole::Manager.permissions().can_manage_projects);
    }

    #[test]
    fn plain_member_can_only_view_tasks() {
        let perms = TeamRole::Member.permissions();
        assert!(perms.can_view_all_tasks);
        assert!(!perms.can_invite);
        assert!(!perms.can_manage_projects);
        assert!(!perms.can_manage_tasks);
    }

    #[test]
    fn only_lead_gets_project_permissions() {
        assert!(ProjectRole::Lead.permissions().can_edit_project);
        for role in [
            ProjectRole::Developer,
            ProjectRole::Designer,
            ProjectRole::Tester,
            ProjectRole::Client,
        ] {
            let perms = role.permissions();
            assert!(!perms.can_edit_project);
            assert!(!perms.can_manage_tasks);
            assert!(!perms.can_invite_members);
        }
    }
}
