// tyr-service/src/utils/access_control.rs
//
// The role-permission resolver. Every cascading access rule for the
// Team -> Project -> Task hierarchy is defined here and nowhere else; the
// guard and any read path must come through these functions.
//
// All checks are pure ORs over already-loaded data: a single satisfied clause
// grants access and admin short-circuits first. A denial is a plain `false`,
// never an error; missing entities are the loader's problem.
use crate::models::{Actor, Project, ProjectRole, Task, Team, TeamRole};
use serde::{Deserialize, Serialize};

// Capability requested against a team or project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Read,
    Manage,
}

// Capability requested against a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCapability {
    Read,
    Update,
    Delete,
}

// Check whether an actor may read or manage a team.
//
// The owner always has manage access, membership record or not; the two
// checks are deliberately independent.
pub fn can_access_team(actor: &Actor, team: &Team, capability: Capability) -> bool {
    if actor.is_admin() {
        return true;
    }

    if team.owner_id == actor.id {
        return true;
    }

    match capability {
        Capability::Read => team.member(&actor.id).is_some(),
        Capability::Manage => team
            .member(&actor.id)
            .map_or(false, |m| matches!(m.role, TeamRole::Owner | TeamRole::Manager)),
    }
}

// Check whether an actor may read or manage a project, cascading through the
// project's team when it has one. The caller loads the parent chain eagerly
// and passes the team along; a team-less project gets `None`.
//
// Team membership alone grants read on every project under the team; team
// manage grants project manage. Project-level lead role (or an explicit
// can_edit_project grant) is sufficient on its own.
pub fn can_access_project(
    actor: &Actor,
    project: &Project,
    team: Option<&Team>,
    capability: Capability,
) -> bool {
    if actor.is_admin() {
        return true;
    }

    if project.owner_id == actor.id {
        return true;
    }

    match capability {
        Capability::Read => {
            if project.member(&actor.id).is_some() {
                return true;
            }
            team.map_or(false, |t| can_access_team(actor, t, Capability::Read))
        }
        Capability::Manage => {
            if let Some(member) = project.member(&actor.id) {
                if member.role == ProjectRole::Lead || member.permissions.can_edit_project {
                    return true;
                }
            }
            team.map_or(false, |t| can_access_team(actor, t, Capability::Manage))
        }
    }
}

// Check whether an actor may read, update or delete a task. Direct
// relationships (assignee, creator, watcher) always win; otherwise the check
// cascades into the task's project, and from there into its team.
//
// Deleting is stricter than updating: the assignee may update but only the
// creator (or someone with project manage) may delete.
pub fn can_access_task(
    actor: &Actor,
    task: &Task,
    project: Option<&Project>,
    team: Option<&Team>,
    capability: TaskCapability,
) -> bool {
    if actor.is_admin() {
        return true;
    }

    if task.created_by == actor.id {
        return true;
    }

    let is_assignee = task.assigned_to.as_deref() == Some(actor.id.as_str());

    match capability {
        TaskCapability::Read => {
            if is_assignee || task.is_watcher(&actor.id) {
                return true;
            }
            project.map_or(false, |p| {
                can_access_project(actor, p, team, Capability::Read)
            })
        }
        TaskCapability::Update => {
            if is_assignee {
                return true;
            }
            project.map_or(false, |p| {
                can_access_project(actor, p, team, Capability::Manage)
            })
        }
        TaskCapability::Delete => project.map_or(false, |p| {
            can_access_project(actor, p, team, Capability::Manage)
        }),
    }
}
