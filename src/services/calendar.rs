// ============================================================================
// GOOGLE CALENDAR (OAuth2 + Calendar v3)
// ============================================================================
//
// Description:
//   Adaptateur vers Google: URL de consentement, échange du code, refresh du
//   jeton, création d'un événement avec lien Meet, ajout d'un participant.
//
// Points d'attention:
//   - Le refresh est réactif: l'appelant le déclenche quand l'expiration
//     stockée est <= maintenant (token_needs_refresh)
//   - "insufficient authentication scopes" et "invalid_grant" deviennent
//     CalendarError::NeedsReauth (l'utilisateur doit reconnecter son compte)
//   - Aucune relance automatique
//
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::config::Config;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const EVENTS_ENDPOINT: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";

const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/calendar.events",
];

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Google Calendar integration is not configured")]
    NotConfigured,

    #[error("{0}")]
    NeedsReauth(String),

    #[error("{0}")]
    Api(String),

    #[error("Google request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Associe un message d'erreur Google à la bonne variante
pub fn classify_calendar_error(message: &str) -> CalendarError {
    let lower = message.to_lowercase();
    if lower.contains("insufficient authentication scopes") {
        CalendarError::NeedsReauth(
            "Insufficient permissions. Please reconnect your Google account.".to_string(),
        )
    } else if lower.contains("invalid_grant") {
        CalendarError::NeedsReauth(
            "Authentication expired. Please reconnect your Google account.".to_string(),
        )
    } else {
        CalendarError::Api(message.to_string())
    }
}

pub fn token_needs_refresh(expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    matches!(expiry, Some(expiry) if expiry <= now)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoogleTokens {
    pub access_token: String,
    /// Absent lors d'un refresh
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct EventRequest {
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub time_zone: String,
    pub attendee_emails: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: Option<String>,
    pub meet_link: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendeeOutcome {
    Added,
    AlreadyPresent,
}

#[async_trait]
pub trait CalendarClient: Send + Sync {
    fn auth_url(&self, state: &str) -> Result<String, CalendarError>;
    async fn exchange_code(&self, code: &str) -> Result<GoogleTokens, CalendarError>;
    async fn refresh_token(&self, refresh_token: &str) -> Result<GoogleTokens, CalendarError>;
    async fn create_event(
        &self,
        access_token: &str,
        event: &EventRequest,
    ) -> Result<CreatedEvent, CalendarError>;
    async fn add_attendee(
        &self,
        access_token: &str,
        event_id: &str,
        email: &str,
        name: Option<&str>,
    ) -> Result<AttendeeOutcome, CalendarError>;
}

pub type DynCalendarClient = Arc<dyn CalendarClient>;

#[derive(Clone)]
struct OAuthCredentials {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

pub struct GoogleCalendarClient {
    client: reqwest::Client,
    credentials: Option<OAuthCredentials>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

impl GoogleCalendarClient {
    pub fn from_config(config: &Config) -> Self {
        let credentials = match (
            &config.google_client_id,
            &config.google_client_secret,
            &config.google_redirect_uri,
        ) {
            (Some(id), Some(secret), Some(redirect)) => Some(OAuthCredentials {
                client_id: id.clone(),
                client_secret: secret.clone(),
                redirect_uri: redirect.clone(),
            }),
            _ => None,
        };

        GoogleCalendarClient {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    fn credentials(&self) -> Result<&OAuthCredentials, CalendarError> {
        self.credentials.as_ref().ok_or(CalendarError::NotConfigured)
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<GoogleTokens, CalendarError> {
        let response = self.client.post(TOKEN_ENDPOINT).form(params).send().await?;
        let response = check_response(response).await?;
        let tokens: TokenResponse = response.json().await?;

        Ok(GoogleTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}

/// Transforme une réponse non-2xx en CalendarError classée
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, CalendarError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(classify_calendar_error(&google_error_message(status.as_u16(), &body)))
}

// {"error": "invalid_grant", ...} (OAuth) ou {"error": {"message": ...}} (API)
fn google_error_message(status: u16, body: &str) -> String {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    match &parsed["error"] {
        Value::String(code) => match parsed["error_description"].as_str() {
            Some(desc) => format!("{}: {}", code, desc),
            None => code.clone(),
        },
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Google API error")
            .to_string(),
        _ => format!("Google API error ({})", status),
    }
}

fn meet_link(event: &Value) -> Option<String> {
    let entry_points = event["conferenceData"]["entryPoints"].as_array()?;
    entry_points
        .iter()
        .find(|ep| ep["entryPointType"] == "video")
        .or_else(|| entry_points.first())
        .and_then(|ep| ep["uri"].as_str())
        .map(str::to_string)
}

pub fn event_body(event: &EventRequest, request_id: &str) -> Value {
    json!({
        "summary": event.title,
        "description": event.description,
        "start": { "dateTime": event.start.to_rfc3339(), "timeZone": event.time_zone },
        "end": { "dateTime": event.end.to_rfc3339(), "timeZone": event.time_zone },
        "conferenceData": {
            "createRequest": {
                "requestId": request_id,
                "conferenceSolutionKey": { "type": "hangoutsMeet" }
            }
        },
        "attendees": event.attendee_emails.iter().map(|email| json!({ "email": email })).collect::<Vec<_>>(),
        "reminders": {
            "useDefault": false,
            "overrides": [
                { "method": "email", "minutes": 24 * 60 },
                { "method": "popup", "minutes": 30 }
            ]
        }
    })
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    fn auth_url(&self, state: &str) -> Result<String, CalendarError> {
        let creds = self.credentials()?;
        let scope = SCOPES.join(" ");
        let url = Url::parse_with_params(
            AUTH_ENDPOINT,
            &[
                ("client_id", creds.client_id.as_str()),
                ("redirect_uri", creds.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
            .map_err(|e| CalendarError::Api(e.to_string()))?;
        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<GoogleTokens, CalendarError> {
        let creds = self.credentials()?.clone();
        self.token_request(&[
            ("code", code),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("redirect_uri", creds.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
            .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<GoogleTokens, CalendarError> {
        let creds = self.credentials()?.clone();
        self.token_request(&[
            ("refresh_token", refresh_token),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ])
            .await
    }

    async fn create_event(
        &self,
        access_token: &str,
        event: &EventRequest,
    ) -> Result<CreatedEvent, CalendarError> {
        let request_id = format!("webinar-{}", Utc::now().timestamp_millis());
        let response = self
            .client
            .post(EVENTS_ENDPOINT)
            .query(&[("conferenceDataVersion", "1"), ("sendUpdates", "all")])
            .bearer_auth(access_token)
            .json(&event_body(event, &request_id))
            .send()
            .await?;
        let created: Value = check_response(response).await?.json().await?;

        let id = created["id"]
            .as_str()
            .ok_or_else(|| CalendarError::Api("Event created without id".to_string()))?
            .to_string();

        Ok(CreatedEvent {
            id,
            html_link: created["htmlLink"].as_str().map(str::to_string),
            meet_link: meet_link(&created),
            start_time: created["start"]["dateTime"].as_str().map(str::to_string),
            end_time: created["end"]["dateTime"].as_str().map(str::to_string),
        })
    }

    async fn add_attendee(
        &self,
        access_token: &str,
        event_id: &str,
        email: &str,
        name: Option<&str>,
    ) -> Result<AttendeeOutcome, CalendarError> {
        let url = format!("{}/{}", EVENTS_ENDPOINT, event_id);

        let response = self.client.get(&url).bearer_auth(access_token).send().await?;
        let event: Value = check_response(response).await?.json().await?;

        let mut attendees = event["attendees"].as_array().cloned().unwrap_or_default();
        let already_present = attendees.iter().any(|a| {
            a["email"]
                .as_str()
                .is_some_and(|existing| existing.eq_ignore_ascii_case(email))
        });
        if already_present {
            return Ok(AttendeeOutcome::AlreadyPresent);
        }

        attendees.push(json!({
            "email": email,
            "displayName": name,
            "responseStatus": "needsAction"
        }));

        let response = self
            .client
            .patch(&url)
            .query(&[("sendUpdates", "all")])
            .bearer_auth(access_token)
            .json(&json!({ "attendees": attendees }))
            .send()
            .await?;
        check_response(response).await?;

        Ok(AttendeeOutcome::Added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn reauth_errors_are_detected() {
        assert!(matches!(
            classify_calendar_error("Request had insufficient authentication scopes."),
            CalendarError::NeedsReauth(_)
        ));
        assert!(matches!(
            classify_calendar_error("invalid_grant: Token has been expired or revoked."),
            CalendarError::NeedsReauth(_)
        ));
        match classify_calendar_error("Rate Limit Exceeded") {
            CalendarError::Api(msg) => assert_eq!(msg, "Rate Limit Exceeded"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn refresh_only_when_expired() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert!(token_needs_refresh(Some(now), now));
        assert!(token_needs_refresh(Some(now - Duration::seconds(1)), now));
        assert!(!token_needs_refresh(Some(now + Duration::minutes(5)), now));
        assert!(!token_needs_refresh(None, now));
    }

    #[test]
    fn google_error_bodies() {
        assert_eq!(
            google_error_message(400, r#"{"error":"invalid_grant","error_description":"Bad Request"}"#),
            "invalid_grant: Bad Request"
        );
        assert_eq!(
            google_error_message(403, r#"{"error":{"code":403,"message":"Request had insufficient authentication scopes."}}"#),
            "Request had insufficient authentication scopes."
        );
        assert_eq!(google_error_message(502, "<html>"), "Google API error (502)");
    }

    #[test]
    fn consent_url_requests_offline_access() {
        let client = GoogleCalendarClient::from_config(&Config::for_tests());
        let url = Url::parse(&client.auth_url("abc").unwrap()).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["prompt"], "consent");
        assert_eq!(params["state"], "abc");
        assert!(params["scope"].contains("calendar.events"));
    }

    #[test]
    fn unconfigured_client() {
        let mut config = Config::for_tests();
        config.google_client_id = None;
        let client = GoogleCalendarClient::from_config(&config);
        assert!(matches!(client.auth_url("x"), Err(CalendarError::NotConfigured)));
    }

    #[test]
    fn event_body_has_meet_and_reminders() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap();
        let body = event_body(
            &EventRequest {
                title: "Live".into(),
                description: "d".into(),
                start,
                end: start + Duration::minutes(60),
                time_zone: "Europe/Paris".into(),
                attendee_emails: vec!["a@b.c".into()],
            },
            "webinar-1",
        );
        assert_eq!(body["conferenceData"]["createRequest"]["conferenceSolutionKey"]["type"], "hangoutsMeet");
        assert_eq!(body["reminders"]["overrides"][0]["minutes"], 1440);
        assert_eq!(body["attendees"][0]["email"], "a@b.c");
        assert_eq!(body["start"]["timeZone"], "Europe/Paris");
    }

    #[test]
    fn meet_link_prefers_video_entry() {
        let event = json!({"conferenceData": {"entryPoints": [
            {"entryPointType": "phone", "uri": "tel:+1"},
            {"entryPointType": "video", "uri": "https://meet.google.com/xyz"}
        ]}});
        assert_eq!(meet_link(&event).as_deref(), Some("https://meet.google.com/xyz"));
    }
}
