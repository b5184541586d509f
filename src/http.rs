// HTTP transport: a small blocking client for the management API. Every
// failure, whether the server answered with an error status or the request
// never got an answer, leaves this module as a `RemoteApiError`.

use crate::api::{Identity, ManagementApi, Organization, Role};
use crate::config::{Config, Credentials};
use crate::error::{Error, RemoteApiError, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

/// Listing endpoints are read as a single page of this size.
const PAGE_SIZE: &str = "100";

/// Blocking client holding the base URL and a resolved bearer token.
#[derive(Clone)]
pub struct HttpManagementApi {
    client: Client,
    base_url: Url,
    auth_header: HeaderValue,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl HttpManagementApi {
    /// Build the client from configuration. Client credentials are
    /// exchanged for a token here, so a bad secret fails at startup.
    pub fn connect(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("org-assign/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {}", e)))?;
        let base_url = Url::parse(&config.base_url())
            .map_err(|e| Error::Configuration(format!("invalid domain {}: {}", config.domain, e)))?;

        let token = match &config.credentials {
            Credentials::Token(token) => token.clone(),
            Credentials::ClientCredentials {
                client_id,
                client_secret,
            } => exchange_client_credentials(&client, &base_url, &config.audience, client_id, client_secret)?,
        };
        crate::token::warn_on_problems(&token);

        let auth_header = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| Error::Configuration("bearer token contains invalid characters".into()))?;

        Ok(HttpManagementApi {
            client,
            base_url,
            auth_header,
        })
    }

    /// `{base}/api/v2/{segments...}` with every segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, RemoteApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| RemoteApiError::from_value(&json!("base URL cannot carry a path")))?;
            path.clear().push("api").push("v2").extend(segments);
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, self.auth_header.clone())
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> std::result::Result<T, RemoteApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "GET");
        let response = self
            .authorized(self.client.get(url))
            .query(query)
            .send()
            .map_err(transport_error)?;
        read_json(response)
    }

    fn post(&self, segments: &[&str], body: &Value) -> std::result::Result<(), RemoteApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "POST");
        let response = self
            .authorized(self.client.post(url))
            .json(body)
            .send()
            .map_err(transport_error)?;
        ensure_success(response).map(|_| ())
    }
}

impl ManagementApi for HttpManagementApi {
    fn users_by_email(&self, email: &str) -> std::result::Result<Vec<Identity>, RemoteApiError> {
        self.get_json(&["users-by-email"], &[("email", email)])
    }

    fn organizations(&self) -> std::result::Result<Vec<Organization>, RemoteApiError> {
        self.get_json(&["organizations"], &[("per_page", PAGE_SIZE)])
    }

    fn roles(&self) -> std::result::Result<Vec<Role>, RemoteApiError> {
        self.get_json(&["roles"], &[("per_page", PAGE_SIZE)])
    }

    fn add_members(&self, organization_id: &str, user_ids: &[String]) -> std::result::Result<(), RemoteApiError> {
        self.post(
            &["organizations", organization_id, "members"],
            &json!({ "members": user_ids }),
        )
    }

    fn add_member_roles(
        &self,
        organization_id: &str,
        user_id: &str,
        role_ids: &[String],
    ) -> std::result::Result<(), RemoteApiError> {
        self.post(
            &["organizations", organization_id, "members", user_id, "roles"],
            &json!({ "roles": role_ids }),
        )
    }
}

fn exchange_client_credentials(
    client: &Client,
    base_url: &Url,
    audience: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<String> {
    let url = base_url
        .join("/oauth/token")
        .map_err(|e| Error::Configuration(format!("invalid token endpoint: {}", e)))?;
    tracing::debug!(%url, client_id, "exchanging client credentials for a management token");
    let response = client
        .post(url)
        .json(&json!({
            "grant_type": "client_credentials",
            "client_id": client_id,
            "client_secret": client_secret,
            "audience": audience,
        }))
        .send()
        .map_err(transport_error)?;
    let token: TokenResponse = read_json(response)?;
    Ok(token.access_token)
}

fn read_json<T: DeserializeOwned>(response: Response) -> std::result::Result<T, RemoteApiError> {
    let response = ensure_success(response)?;
    let status = response.status().as_u16();
    response.json::<T>().map_err(|e| {
        RemoteApiError::from_value(&json!({
            "statusCode": status,
            "message": format!("unexpected response body: {}", e),
        }))
    })
}

fn ensure_success(response: Response) -> std::result::Result<Response, RemoteApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let err = RemoteApiError::from_value(&error_body(status.as_u16(), status.canonical_reason(), &body));
    tracing::debug!(status = status.as_u16(), error = %err, "remote call failed");
    Err(err)
}

/// The request never produced a usable response (DNS, TLS, timeout, ...).
fn transport_error(err: reqwest::Error) -> RemoteApiError {
    match err.status() {
        Some(status) => RemoteApiError::from_value(&json!({
            "statusCode": status.as_u16(),
            "message": err.to_string(),
        })),
        None => RemoteApiError::from_value(&Value::String(err.to_string())),
    }
}

/// Shape an error response into the object `RemoteApiError::from_value`
/// understands. JSON error bodies keep their own fields; the HTTP status
/// fills in a missing `statusCode`, and OAuth-style `error_description`
/// or `error` fills in a missing `message`.
fn error_body(status: u16, reason: Option<&str>, body: &str) -> Value {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(mut fields)) => {
            fields.entry("statusCode").or_insert_with(|| json!(status));
            let has_message = fields.get("message").and_then(Value::as_str).is_some();
            if !has_message {
                let fallback = ["error_description", "error"]
                    .iter()
                    .find_map(|key| fields.get(*key).and_then(Value::as_str).map(str::to_string));
                if let Some(message) = fallback.or_else(|| reason.map(str::to_string)) {
                    fields.insert("message".into(), json!(message));
                }
            }
            Value::Object(fields)
        }
        _ => {
            let text = body.trim();
            let message = if text.is_empty() {
                reason.unwrap_or_default().to_string()
            } else {
                text.to_string()
            };
            json!({ "statusCode": status, "message": message })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(status: u16, reason: Option<&str>, body: &str) -> String {
        RemoteApiError::from_value(&error_body(status, reason, body)).to_string()
    }

    #[test]
    fn management_api_error_body() {
        let body = r#"{"statusCode":404,"error":"Not Found","message":"The user does not exist.","errorCode":"inexistent_user"}"#;
        assert_eq!(
            render(404, Some("Not Found"), body),
            "Remote API Error (404): The user does not exist."
        );
    }

    #[test]
    fn oauth_error_body_uses_description() {
        let body = r#"{"error":"access_denied","error_description":"Unauthorized"}"#;
        assert_eq!(render(401, Some("Unauthorized"), body), "Remote API Error (401): Unauthorized");
    }

    #[test]
    fn plain_text_body() {
        assert_eq!(
            render(502, Some("Bad Gateway"), "upstream connect error\n"),
            "Remote API Error (502): upstream connect error"
        );
    }

    #[test]
    fn empty_body_falls_back_to_reason() {
        assert_eq!(
            render(429, Some("Too Many Requests"), ""),
            "Remote API Error (429): Too Many Requests"
        );
    }

    #[test]
    fn endpoint_encodes_path_segments() {
        let api = HttpManagementApi {
            client: Client::new(),
            base_url: Url::parse("https://tenant.auth0.com").unwrap(),
            auth_header: HeaderValue::from_static("Bearer test"),
        };
        let url = api
            .endpoint(&["organizations", "org_1", "members", "auth0|abc 1", "roles"])
            .unwrap();
        let url = url.as_str();
        assert!(url.starts_with("https://tenant.auth0.com/api/v2/organizations/org_1/members/auth0"));
        assert!(url.ends_with("abc%201/roles"), "{url}");
    }
}
