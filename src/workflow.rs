// Selection workflow: the linear wizard that resolves a user, lets the
// operator pick organizations and roles, confirms, and then assigns one
// organization at a time.
//
// Terminal interaction goes through the `Terminal` trait so the whole flow
// can be driven by a script in tests; `ui::DialoguerTerminal` is the real
// implementation.

use crate::api::{ApiClient, Identity, ManagementApi, MemberAssignment, Organization, Role};
use crate::email;
use crate::error::Result;
use crate::report;
use std::fmt;
use std::io;

/// What the workflow needs from the terminal.
pub trait Terminal {
    /// Let the operator pick any number of `items`; returns their indices.
    fn multi_select(&mut self, prompt: &str, items: &[String]) -> io::Result<Vec<usize>>;

    /// Yes/no question. Only an explicit yes returns `true`.
    fn confirm(&mut self, prompt: &str) -> io::Result<bool>;

    fn info(&mut self, line: &str);

    fn success(&mut self, line: &str);

    fn failure(&mut self, line: &str);

    /// Signal that a remote call is in flight (spinner in the real UI).
    fn start_task(&mut self, message: &str);

    fn finish_task(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Initializing,
    ResolvingUser,
    SelectingOrganizations,
    SelectingRoles,
    ReviewingAndConfirming,
    Executing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Initializing => "initializing",
            Stage::ResolvingUser => "resolving-user",
            Stage::SelectingOrganizations => "selecting-organizations",
            Stage::SelectingRoles => "selecting-roles",
            Stage::ReviewingAndConfirming => "reviewing",
            Stage::Executing => "executing",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// The plan built up during the wizard. Only executed after confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRequest {
    pub identity: Identity,
    pub organizations: Vec<Organization>,
    pub roles: Vec<Role>,
}

impl AssignmentRequest {
    pub fn role_ids(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.id.clone()).collect()
    }
}

/// Result of assigning the user to one organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentOutcome {
    pub organization: Organization,
    pub succeeded: bool,
    pub error_detail: Option<String>,
}

/// How a run ended when no fatal error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Assignments were attempted; one entry per organization, in selection order.
    Completed(Vec<AssignmentOutcome>),
    UserNotFound { email: String },
    NoOrganizationsSelected,
    Cancelled,
    /// `--dry-run`: stopped after the review.
    DryRun,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::UserNotFound { .. } => 1,
            Outcome::Completed(_)
            | Outcome::NoOrganizationsSelected
            | Outcome::Cancelled
            | Outcome::DryRun => 0,
        }
    }
}

/// Reference data loaded once per run.
struct Catalog {
    organizations: Vec<Organization>,
    roles: Vec<Role>,
}

pub struct Workflow<'a, A, T> {
    client: &'a ApiClient<A>,
    terminal: &'a mut T,
    dry_run: bool,
}

impl<'a, A: ManagementApi, T: Terminal> Workflow<'a, A, T> {
    pub fn new(client: &'a ApiClient<A>, terminal: &'a mut T) -> Self {
        Workflow {
            client,
            terminal,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Drive the whole wizard for `email`.
    ///
    /// Errors while loading reference data or resolving the user abort the
    /// run. Errors while assigning are recorded per organization instead.
    pub fn run(&mut self, email: &str) -> Result<Outcome> {
        let email = email::normalize(email)?;

        self.enter(Stage::Initializing);
        let catalog = self.initialize()?;
        self.terminal
            .info(&report::loaded_counts(catalog.organizations.len(), catalog.roles.len()));

        self.enter(Stage::ResolvingUser);
        self.terminal.start_task(&format!("Looking up {}", email));
        let found = self.client.find_single_by_email(&email);
        self.terminal.finish_task();
        let identity = match found? {
            Some(identity) => identity,
            None => {
                self.terminal.failure(&format!("No user found with email {}", email));
                return Ok(Outcome::UserNotFound { email });
            }
        };
        self.terminal.success(&report::found_identity(&identity));

        self.enter(Stage::SelectingOrganizations);
        let organizations = self.select_organizations(&catalog.organizations)?;
        if organizations.is_empty() {
            self.terminal.info("No organizations selected, nothing to do.");
            return Ok(Outcome::NoOrganizationsSelected);
        }

        self.enter(Stage::SelectingRoles);
        let roles = self.select_roles(&catalog.roles)?;

        self.enter(Stage::ReviewingAndConfirming);
        let request = AssignmentRequest {
            identity,
            organizations,
            roles,
        };
        self.terminal.info(&report::review(&request));
        if self.dry_run {
            self.terminal.info("Dry run: no changes made.");
            return Ok(Outcome::DryRun);
        }
        if !self.terminal.confirm("Proceed with this assignment?")? {
            self.terminal.info("Assignment cancelled, no changes made.");
            return Ok(Outcome::Cancelled);
        }

        self.enter(Stage::Executing);
        let outcomes = self.execute(&request);

        self.enter(Stage::Done);
        let summary = report::tally(&outcomes);
        if outcomes.iter().all(|o| o.succeeded) {
            self.terminal.success(&summary);
        } else {
            self.terminal.failure(&summary);
        }
        Ok(Outcome::Completed(outcomes))
    }

    fn enter(&self, stage: Stage) {
        tracing::debug!(%stage, "workflow stage");
    }

    fn initialize(&mut self) -> Result<Catalog> {
        self.terminal.start_task("Loading organizations and roles");
        let loaded = self
            .client
            .list_organizations()
            .and_then(|organizations| Ok((organizations, self.client.list_roles()?)));
        self.terminal.finish_task();
        let (organizations, roles) = loaded?;
        Ok(Catalog {
            organizations,
            roles,
        })
    }

    fn select_organizations(&mut self, available: &[Organization]) -> Result<Vec<Organization>> {
        if available.is_empty() {
            self.terminal.info("No organizations available.");
            return Ok(Vec::new());
        }
        let labels: Vec<String> = available.iter().map(report::organization_label).collect();
        let picked = self
            .terminal
            .multi_select("Select organizations (space to toggle, enter to confirm)", &labels)?;
        Ok(pick(available, &picked))
    }

    fn select_roles(&mut self, available: &[Role]) -> Result<Vec<Role>> {
        if available.is_empty() {
            return Ok(Vec::new());
        }
        let labels: Vec<String> = available.iter().map(report::role_label).collect();
        let picked = self
            .terminal
            .multi_select("Select roles (none selected = member access only)", &labels)?;
        Ok(pick(available, &picked))
    }

    /// Assign the user to each organization in turn. A failure is recorded
    /// and the loop moves on to the next organization.
    fn execute(&mut self, request: &AssignmentRequest) -> Vec<AssignmentOutcome> {
        let members = [MemberAssignment {
            identity_id: request.identity.id.clone(),
            role_ids: request.role_ids(),
        }];

        let mut outcomes = Vec::with_capacity(request.organizations.len());
        for org in &request.organizations {
            self.terminal
                .start_task(&format!("Assigning to {}", report::organization_label(org)));
            let result = self.client.assign(&org.id, &members);
            self.terminal.finish_task();

            let outcome = match result {
                Ok(()) => {
                    tracing::info!(organization = %org.id, user = %request.identity.id, "assigned");
                    AssignmentOutcome {
                        organization: org.clone(),
                        succeeded: true,
                        error_detail: None,
                    }
                }
                Err(err) => {
                    tracing::warn!(organization = %org.id, user = %request.identity.id, error = %err, "assignment failed");
                    AssignmentOutcome {
                        organization: org.clone(),
                        succeeded: false,
                        error_detail: Some(err.to_string()),
                    }
                }
            };

            let line = report::progress_line(&outcome);
            if outcome.succeeded {
                self.terminal.success(&line);
            } else {
                self.terminal.failure(&line);
            }
            outcomes.push(outcome);
        }
        outcomes
    }
}

/// Map selected indices back to items, keeping selection order and
/// ignoring repeats or out-of-range indices.
fn pick<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    let mut seen = Vec::with_capacity(indices.len());
    let mut picked = Vec::with_capacity(indices.len());
    for &idx in indices {
        if seen.contains(&idx) {
            continue;
        }
        if let Some(item) = items.get(idx) {
            seen.push(idx);
            picked.push(item.clone());
        }
    }
    picked
}
