// Configuration loaded from the environment (optionally seeded from a
// `.env` file). The resulting `Config` is passed explicitly into the HTTP
// client; nothing below `main` reads the environment on its own.

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DOMAIN_VAR: &str = "ORG_ASSIGN_DOMAIN";
pub const TOKEN_VAR: &str = "ORG_ASSIGN_TOKEN";
pub const CLIENT_ID_VAR: &str = "ORG_ASSIGN_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "ORG_ASSIGN_CLIENT_SECRET";
pub const AUDIENCE_VAR: &str = "ORG_ASSIGN_AUDIENCE";

const REMEDIATION: &str = "set ORG_ASSIGN_DOMAIN (e.g. my-tenant.eu.auth0.com) and either ORG_ASSIGN_TOKEN \
or both ORG_ASSIGN_CLIENT_ID and ORG_ASSIGN_CLIENT_SECRET, in the environment or a .env file";

/// How the client authenticates against the management API.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A ready-to-use bearer token.
    Token(String),
    /// A machine-to-machine client exchanged for a token at startup.
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
}

// Secrets never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(<redacted>)"),
            Credentials::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bare tenant host, e.g. `my-tenant.eu.auth0.com`.
    pub domain: String,
    /// Audience requested in the client-credentials exchange.
    pub audience: String,
    pub credentials: Credentials,
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Blank values
    /// count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let raw_domain = get(DOMAIN_VAR)
            .ok_or_else(|| Error::Configuration(format!("{} is not set; {}", DOMAIN_VAR, REMEDIATION)))?;
        let domain = normalize_domain(&raw_domain)?;

        let credentials = match (get(TOKEN_VAR), get(CLIENT_ID_VAR), get(CLIENT_SECRET_VAR)) {
            (Some(token), _, _) => Credentials::Token(token),
            (None, Some(client_id), Some(client_secret)) => Credentials::ClientCredentials {
                client_id,
                client_secret,
            },
            (None, Some(_), None) => {
                return Err(Error::Configuration(format!(
                    "{} is set but {} is missing; {}",
                    CLIENT_ID_VAR, CLIENT_SECRET_VAR, REMEDIATION
                )))
            }
            (None, None, Some(_)) => {
                return Err(Error::Configuration(format!(
                    "{} is set but {} is missing; {}",
                    CLIENT_SECRET_VAR, CLIENT_ID_VAR, REMEDIATION
                )))
            }
            (None, None, None) => {
                return Err(Error::Configuration(format!("no credentials found; {}", REMEDIATION)))
            }
        };

        let audience = get(AUDIENCE_VAR).unwrap_or_else(|| format!("https://{}/api/v2/", domain));

        Ok(Config {
            domain,
            audience,
            credentials,
        })
    }

    /// Root URL of the tenant, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("https://{}", self.domain)
    }
}

/// Accept `tenant.example.com`, `https://tenant.example.com/` and similar,
/// returning the bare host.
fn normalize_domain(raw: &str) -> Result<String> {
    let host = raw
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    let valid = !host.is_empty()
        && host.contains('.')
        && !host.contains('/')
        && !host.chars().any(char::is_whitespace);
    if !valid {
        return Err(Error::Configuration(format!(
            "{}='{}' is not a valid domain; {}",
            DOMAIN_VAR, raw, REMEDIATION
        )));
    }
    Ok(host.to_lowercase())
}

/// Seed the process environment from a `.env` file. Variables already set
/// in the environment win.
///
/// An explicit path must exist. Otherwise `./.env` is tried, then
/// `<config dir>/org-assign/.env`. Returns the file that was loaded, if any.
pub fn load_dotenv(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        dotenvy::from_path(path).map_err(|e| {
            Error::Configuration(format!("failed to load env file {}: {}", path.display(), e))
        })?;
        return Ok(Some(path.to_path_buf()));
    }

    let mut candidates = vec![PathBuf::from(".env")];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("org-assign").join(".env"));
    }

    for candidate in candidates {
        if candidate.is_file() {
            dotenvy::from_path(&candidate).map_err(|e| {
                Error::Configuration(format!("failed to load env file {}: {}", candidate.display(), e))
            })?;
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}
