// API client module: the single boundary between the interactive workflow
// and the remote identity-management service.
//
// The remote procedure calls themselves sit behind the `ManagementApi`
// trait (implemented over HTTP in `http.rs`). `ApiClient` layers the rules
// the workflow relies on on top of it: email validation, the
// "exactly one user" lookup, and the membership-then-roles assignment.

use crate::email;
use crate::error::{Error, RemoteApiError, Result};
use serde::{Deserialize, Serialize};

/// A user record returned by the email lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "user_id")]
    pub id: String,
    pub email: String,
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One member to register in an organization, with the roles to attach
/// afterwards. An empty `role_ids` means plain membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAssignment {
    pub identity_id: String,
    pub role_ids: Vec<String>,
}

/// The raw remote operations. Implementations must already have folded
/// every failure into a `RemoteApiError`.
pub trait ManagementApi {
    fn users_by_email(&self, email: &str) -> std::result::Result<Vec<Identity>, RemoteApiError>;

    fn organizations(&self) -> std::result::Result<Vec<Organization>, RemoteApiError>;

    fn roles(&self) -> std::result::Result<Vec<Role>, RemoteApiError>;

    /// Register several users as members of one organization in a single call.
    fn add_members(&self, organization_id: &str, user_ids: &[String]) -> std::result::Result<(), RemoteApiError>;

    /// Attach roles to an existing member of an organization.
    fn add_member_roles(
        &self,
        organization_id: &str,
        user_id: &str,
        role_ids: &[String],
    ) -> std::result::Result<(), RemoteApiError>;
}

/// Gateway used by the workflow. Generic over the transport so tests can
/// swap in an in-memory fake.
pub struct ApiClient<T> {
    remote: T,
}

impl<T: ManagementApi> ApiClient<T> {
    pub fn new(remote: T) -> Self {
        ApiClient { remote }
    }

    /// Access the underlying transport.
    pub fn remote(&self) -> &T {
        &self.remote
    }

    /// Look up users by email. The email is validated, trimmed and
    /// lowercased before the remote call; an invalid email never reaches
    /// the network. No match is an empty list, not an error.
    pub fn find_by_email(&self, email: &str) -> Result<Vec<Identity>> {
        let normalized = email::normalize(email)?;
        tracing::debug!(email = %normalized, "looking up users by email");
        Ok(self.remote.users_by_email(&normalized)?)
    }

    /// Look up the single user owning `email`. `Ok(None)` when nobody
    /// matches, `AmbiguousResult` when more than one does.
    pub fn find_single_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let mut users = self.find_by_email(email)?;
        match users.len() {
            0 => Ok(None),
            1 => Ok(users.pop()),
            count => Err(Error::AmbiguousResult {
                email: email.trim().to_lowercase(),
                count,
            }),
        }
    }

    pub fn list_organizations(&self) -> Result<Vec<Organization>> {
        let orgs = self.remote.organizations()?;
        tracing::debug!(count = orgs.len(), "loaded organizations");
        Ok(orgs)
    }

    pub fn list_roles(&self) -> Result<Vec<Role>> {
        let roles = self.remote.roles()?;
        tracing::debug!(count = roles.len(), "loaded roles");
        Ok(roles)
    }

    /// Add `members` to an organization, then attach roles member by member.
    ///
    /// All members are registered in one batched call first. If that fails
    /// nothing else is attempted. Role attachment then runs in input order
    /// for every member with a non-empty role list and stops at the first
    /// failure. Memberships already added are NOT rolled back, so a role
    /// failure can leave a member in the organization without its roles.
    pub fn assign(&self, organization_id: &str, members: &[MemberAssignment]) -> Result<()> {
        let user_ids: Vec<String> = members.iter().map(|m| m.identity_id.clone()).collect();
        tracing::debug!(organization = organization_id, members = user_ids.len(), "adding members");
        self.remote.add_members(organization_id, &user_ids)?;

        for member in members.iter().filter(|m| !m.role_ids.is_empty()) {
            tracing::debug!(
                organization = organization_id,
                user = %member.identity_id,
                roles = member.role_ids.len(),
                "attaching member roles"
            );
            self.remote
                .add_member_roles(organization_id, &member.identity_id, &member.role_ids)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Recording in-memory `ManagementApi` shared by the unit tests.

    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        UsersByEmail(String),
        Organizations,
        Roles,
        AddMembers(String, Vec<String>),
        AddMemberRoles(String, String, Vec<String>),
    }

    #[derive(Default)]
    pub struct FakeApi {
        pub users: Vec<Identity>,
        pub orgs: Vec<Organization>,
        pub roles: Vec<Role>,
        pub fail_lookup: Option<RemoteApiError>,
        pub fail_orgs: Option<RemoteApiError>,
        pub fail_roles: Option<RemoteApiError>,
        /// organization id -> error returned by `add_members`
        pub fail_members: HashMap<String, RemoteApiError>,
        /// (organization id, user id) -> error returned by `add_member_roles`
        pub fail_roles_for: HashMap<(String, String), RemoteApiError>,
        pub calls: RefCell<Vec<Call>>,
    }

    impl FakeApi {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        pub fn mutation_calls(&self) -> Vec<Call> {
            self.calls()
                .into_iter()
                .filter(|c| matches!(c, Call::AddMembers(..) | Call::AddMemberRoles(..)))
                .collect()
        }

        fn record(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }
    }

    pub fn remote_error(code: u16, message: &str) -> RemoteApiError {
        RemoteApiError::from_value(&serde_json::json!({ "statusCode": code, "message": message }))
    }

    pub fn identity(id: &str, email: &str) -> Identity {
        Identity {
            id: id.into(),
            email: email.into(),
            display_name: None,
        }
    }

    pub fn org(id: &str, name: &str) -> Organization {
        Organization {
            id: id.into(),
            name: name.into(),
            display_name: None,
        }
    }

    pub fn role(id: &str, name: &str) -> Role {
        Role {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }

    impl ManagementApi for FakeApi {
        fn users_by_email(&self, email: &str) -> std::result::Result<Vec<Identity>, RemoteApiError> {
            self.record(Call::UsersByEmail(email.to_string()));
            match &self.fail_lookup {
                Some(err) => Err(err.clone()),
                None => Ok(self.users.clone()),
            }
        }

        fn organizations(&self) -> std::result::Result<Vec<Organization>, RemoteApiError> {
            self.record(Call::Organizations);
            match &self.fail_orgs {
                Some(err) => Err(err.clone()),
                None => Ok(self.orgs.clone()),
            }
        }

        fn roles(&self) -> std::result::Result<Vec<Role>, RemoteApiError> {
            self.record(Call::Roles);
            match &self.fail_roles {
                Some(err) => Err(err.clone()),
                None => Ok(self.roles.clone()),
            }
        }

        fn add_members(&self, organization_id: &str, user_ids: &[String]) -> std::result::Result<(), RemoteApiError> {
            self.record(Call::AddMembers(organization_id.to_string(), user_ids.to_vec()));
            match self.fail_members.get(organization_id) {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        fn add_member_roles(
            &self,
            organization_id: &str,
            user_id: &str,
            role_ids: &[String],
        ) -> std::result::Result<(), RemoteApiError> {
            self.record(Call::AddMemberRoles(
                organization_id.to_string(),
                user_id.to_string(),
                role_ids.to_vec(),
            ));
            match self
                .fail_roles_for
                .get(&(organization_id.to_string(), user_id.to_string()))
            {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }
}
