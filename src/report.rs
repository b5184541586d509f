// Presentation: pure functions turning workflow state into the text shown
// to the operator. No I/O and no decisions happen here.

use crate::api::{Identity, Organization, Role};
use crate::workflow::{AssignmentOutcome, AssignmentRequest};

pub const NO_ROLES_MARKER: &str = "(no specific roles, member access only)";

pub fn loaded_counts(organizations: usize, roles: usize) -> String {
    format!(
        "Loaded {} organization{} and {} role{}",
        organizations,
        plural(organizations),
        roles,
        plural(roles)
    )
}

pub fn found_identity(identity: &Identity) -> String {
    format!("Found user: {}", identity_label(identity))
}

pub fn identity_label(identity: &Identity) -> String {
    match &identity.display_name {
        Some(name) if !name.is_empty() => format!("{} <{}> ({})", name, identity.email, identity.id),
        _ => format!("{} ({})", identity.email, identity.id),
    }
}

/// Line shown for an organization in the selection list and the review.
pub fn organization_label(org: &Organization) -> String {
    match &org.display_name {
        Some(display) if !display.is_empty() && display != &org.name => {
            format!("{} [{}] ({})", display, org.name, org.id)
        }
        _ => format!("{} ({})", org.name, org.id),
    }
}

pub fn role_label(role: &Role) -> String {
    match &role.description {
        Some(desc) if !desc.is_empty() => format!("{} - {}", role.name, desc),
        _ => role.name.clone(),
    }
}

/// The block shown right before the confirmation prompt.
pub fn review(request: &AssignmentRequest) -> String {
    let mut out = String::from("Review assignment\n");
    out.push_str(&format!("  User:          {}\n", identity_label(&request.identity)));
    out.push_str(&format!("  Organizations ({}):\n", request.organizations.len()));
    for org in &request.organizations {
        out.push_str(&format!("    - {}\n", organization_label(org)));
    }
    if request.roles.is_empty() {
        out.push_str(&format!("  Roles:         {}\n", NO_ROLES_MARKER));
    } else {
        out.push_str(&format!("  Roles ({}):\n", request.roles.len()));
        for role in &request.roles {
            out.push_str(&format!("    - {}\n", role.name));
        }
    }
    out
}

pub fn progress_line(outcome: &AssignmentOutcome) -> String {
    match &outcome.error_detail {
        None => format!("[ok]     {}", organization_label(&outcome.organization)),
        Some(detail) => format!("[failed] {}: {}", organization_label(&outcome.organization), detail),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub succeeded: usize,
    pub failed: usize,
}

impl Tally {
    pub fn from_outcomes(outcomes: &[AssignmentOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.succeeded).count();
        Tally {
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }
}

pub fn tally(outcomes: &[AssignmentOutcome]) -> String {
    let t = Tally::from_outcomes(outcomes);
    format!(
        "Done: {} successful, {} failed (of {} organization{})",
        t.succeeded,
        t.failed,
        outcomes.len(),
        plural(outcomes.len())
    )
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(roles: Vec<Role>) -> AssignmentRequest {
        AssignmentRequest {
            identity: Identity {
                id: "auth0|1".into(),
                email: "jane@example.com".into(),
                display_name: Some("Jane".into()),
            },
            organizations: vec![Organization {
                id: "org_1".into(),
                name: "acme".into(),
                display_name: Some("Acme Inc".into()),
            }],
            roles,
        }
    }

    #[test]
    fn counts_are_pluralized() {
        assert_eq!(loaded_counts(1, 3), "Loaded 1 organization and 3 roles");
        assert_eq!(loaded_counts(0, 1), "Loaded 0 organizations and 1 role");
    }

    #[test]
    fn review_with_roles() {
        let text = review(&request(vec![Role {
            id: "rol_1".into(),
            name: "admin".into(),
            description: None,
        }]));
        assert_eq!(
            text,
            "Review assignment\n\
             \x20 User:          Jane <jane@example.com> (auth0|1)\n\
             \x20 Organizations (1):\n\
             \x20   - Acme Inc [acme] (org_1)\n\
             \x20 Roles (1):\n\
             \x20   - admin\n"
        );
    }

    #[test]
    fn review_without_roles_shows_marker() {
        assert!(review(&request(vec![])).contains(NO_ROLES_MARKER));
    }

    #[test]
    fn progress_and_tally() {
        let org = |id: &str| Organization {
            id: id.into(),
            name: id.into(),
            display_name: None,
        };
        let outcomes = vec![
            AssignmentOutcome {
                organization: org("a"),
                succeeded: true,
                error_detail: None,
            },
            AssignmentOutcome {
                organization: org("b"),
                succeeded: false,
                error_detail: Some("Remote API Error (403): Forbidden".into()),
            },
        ];
        assert_eq!(progress_line(&outcomes[0]), "[ok]     a (a)");
        assert_eq!(
            progress_line(&outcomes[1]),
            "[failed] b (b): Remote API Error (403): Forbidden"
        );
        assert_eq!(tally(&outcomes), "Done: 1 successful, 1 failed (of 2 organizations)");
    }
}
