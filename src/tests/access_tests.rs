#[cfg(test)]
mod tests {
    use crate::models::{
        Actor, GlobalRole, Project, ProjectMember, ProjectRole, Task, Team, TeamMember, TeamRole,
    };
    use crate::utils::access_control::{
        can_access_project, can_access_task, can_access_team, Capability, TaskCapability,
    };

    fn employee(id: &str) -> Actor {
        let _ = env_logger::builder().is_test(true).try_init();
        Actor::new(id, GlobalRole::Employee)
    }

    fn admin(id: &str) -> Actor {
        Actor::new(id, GlobalRole::Admin)
    }

    // Team T owned by u1 with u2 as a plain member and u3 as a manager
    fn sample_team() -> Team {
        let mut team = Team::new("Platform", "u1");
        team.members.push(TeamMember::new("u2", TeamRole::Member, None));
        team.members.push(TeamMember::new("u3", TeamRole::Manager, None));
        team
    }

    #[test]
    fn admin_passes_every_check() {
        let team = sample_team();
        let project = Project::new("Billing", "u1", Some(team.id.clone()));
        let task = Task::new("Fix invoice rounding", "u1", Some(project.id.clone()), None);
        let root = admin("root");

        assert!(can_access_team(&root, &team, Capability::Read));
        assert!(can_access_team(&root, &team, Capability::Manage));
        assert!(can_access_project(&root, &project, Some(&team), Capability::Read));
        assert!(can_access_project(&root, &project, Some(&team), Capability::Manage));
        assert!(can_access_task(&root, &task, Some(&project), Some(&team), TaskCapability::Read));
        assert!(can_access_task(&root, &task, Some(&project), Some(&team), TaskCapability::Update));
        assert!(can_access_task(&root, &task, Some(&project), Some(&team), TaskCapability::Delete));
    }

    #[test]
    fn owner_manages_even_without_a_membership_record() {
        let mut team = sample_team();
        // The owner check must not depend on the membership set
        team.members.retain(|m| m.user_id != "u1");

        assert!(can_access_team(&employee("u1"), &team, Capability::Read));
        assert!(can_access_team(&employee("u1"), &team, Capability::Manage));
    }

    #[test]
    fn plain_member_reads_but_does_not_manage_the_team() {
        let team = sample_team();
        let u2 = employee("u2");

        assert!(can_access_team(&u2, &team, Capability::Read));
        assert!(!can_access_team(&u2, &team, Capability::Manage));
    }

    #[test]
    fn outsider_gets_nothing_on_the_team() {
        let team = sample_team();
        let stranger = employee("u9");

        assert!(!can_access_team(&stranger, &team, Capability::Read));
        assert!(!can_access_team(&stranger, &team, Capability::Manage));
    }

    #[test]
    fn team_manager_manages_projects_without_project_membership() {
        let team = sample_team();
        let mut project = Project::new("Billing", "u1", Some(team.id.clone()));
        project.members.clear();

        let manager = employee("u3");
        assert!(can_access_project(&manager, &project, Some(&team), Capability::Read));
        assert!(can_access_project(&manager, &project, Some(&team), Capability::Manage));
    }

    #[test]
    fn team_member_reads_projects_under_the_team_but_cannot_manage() {
        let team = sample_team();
        let mut project = Project::new("Billing", "u1", Some(team.id.clone()));
        project.members.clear();

        let member = employee("u2");
        assert!(can_access_project(&member, &project, Some(&team), Capability::Read));
        assert!(!can_access_project(&member, &project, Some(&team), Capability::Manage));
    }

    #[test]
    fn team_member_with_project_lead_role_manages_the_project() {
        let team = sample_team();
        let mut project = Project::new("Billing", "u1", Some(team.id.clone()));
        project.members.push(ProjectMember::new("u2", ProjectRole::Lead));

        assert!(can_access_project(&employee("u2"), &project, Some(&team), Capability::Manage));
    }

    #[test]
    fn project_developer_reads_but_does_not_manage() {
        let mut project = Project::new("Standalone", "u1", None);
        project.members.push(ProjectMember::new("u7", ProjectRole::Developer));

        let dev = employee("u7");
        assert!(can_access_project(&dev, &project, None, Capability::Read));
        assert!(!can_access_project(&dev, &project, None, Capability::Manage));
    }

    // Spec scenario: team T owned by U1, U2 plain member, project P under T
    // with no explicit project-level members
    #[test]
    fn cascade_scenario_owner_and_member() {
        let mut team = Team::new("T", "U1");
        team.members.push(TeamMember::new("U2", TeamRole::Member, None));
        let mut project = Project::new("P", "U1", Some(team.id.clone()));
        project.members.clear();

        assert!(can_access_project(&employee("U2"), &project, Some(&team), Capability::Read));
        assert!(!can_access_project(&employee("U2"), &project, Some(&team), Capability::Manage));
        assert!(can_access_project(&employee("U1"), &project, Some(&team), Capability::Manage));
    }

    // Spec scenario: task assigned to U3 on a team-less project created by U4
    #[test]
    fn assignee_reads_task_without_project_membership() {
        let mut project = Project::new("P", "U4", None);
        project.members.retain(|m| m.user_id == "U4");
        let mut task = Task::new("X", "U4", Some(project.id.clone()), None);
        task.assigned_to = Some("U3".to_string());

        assert!(can_access_task(&employee("U3"), &task, Some(&project), None, TaskCapability::Read));

        // A fifth actor with no relation at all gets nothing
        let u5 = employee("U5");
        assert!(!can_access_task(&u5, &task, Some(&project), None, TaskCapability::Read));
        assert!(!can_access_task(&u5, &task, Some(&project), None, TaskCapability::Update));
        assert!(!can_access_task(&u5, &task, Some(&project), None, TaskCapability::Delete));
    }

    #[test]
    fn assignee_updates_but_only_creator_deletes() {
        let mut task = Task::new("X", "creator", None, None);
        task.assigned_to = Some("assignee".to_string());

        let assignee = employee("assignee");
        assert!(can_access_task(&assignee, &task, None, None, TaskCapability::Update));
        assert!(!can_access_task(&assignee, &task, None, None, TaskCapability::Delete));

        let creator = employee("creator");
        assert!(can_access_task(&creator, &task, None, None, TaskCapability::Update));
        assert!(can_access_task(&creator, &task, None, None, TaskCapability::Delete));
    }

    #[test]
    fn watcher_reads_but_cannot_update() {
        let mut task = Task::new("X", "creator", None, None);
        task.watchers.push("onlooker".to_string());

        let onlooker = employee("onlooker");
        assert!(can_access_task(&onlooker, &task, None, None, TaskCapability::Read));
        assert!(!can_access_task(&onlooker, &task, None, None, TaskCapability::Update));
        assert!(!can_access_task(&onlooker, &task, None, None, TaskCapability::Delete));
    }

    #[test]
    fn project_manage_cascades_into_task_update_and_delete() {
        let team = sample_team();
        let mut project = Project::new("Billing", "u1", Some(team.id.clone()));
        project.members.clear();
        let task = Task::new("X", "someone-else", Some(project.id.clone()), Some(team.id.clone()));

        // u3 is a team manager: manage cascades team -> project -> task
        let manager = employee("u3");
        assert!(can_access_task(&manager, &task, Some(&project), Some(&team), TaskCapability::Update));
        assert!(can_access_task(&manager, &task, Some(&project), Some(&team), TaskCapability::Delete));

        // u2 is a plain team member: read cascades, mutation does not
        let member = employee("u2");
        assert!(can_access_task(&member, &task, Some(&project), Some(&team), TaskCapability::Read));
        assert!(!can_access_task(&member, &task, Some(&project), Some(&team), TaskCapability::Update));
    }

    #[test]
    fn removing_the_last_manager_leaves_owner_access_intact() {
        let mut team = sample_team();
        team.members.retain(|m| m.role != TeamRole::Manager);

        assert!(can_access_team(&employee("u1"), &team, Capability::Manage));
        assert!(!can_access_team(&employee("u3"), &team, Capability::Manage));
    }
}
