//! Remote Trek API client.
//!
//! Every request carries the bearer token obtained from a [`BearerSource`].
//! Any non-success status is an error; 401 additionally invalidates the
//! stored credential.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::{parse_api_error, AuthError, BearerSource};
use crate::config::normalize_api_url;
use crate::models::{
    Collaborator, CollaboratorRole, Invitation, NewInvitation, NewTrip, Notification,
    NotificationSettings, PackingList, Trip, TripId, TripListing, TripUpdate,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid API configuration: {0}")]
    InvalidConfiguration(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Session expired or rejected by the server. Run `trek auth login` again.")]
    Unauthorized,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {message}")]
    Status { status: u16, message: String },
    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Read access to trips, used by cache loaders.
#[async_trait]
pub trait TripSource: Send + Sync {
    async fn list_trips(&self) -> ApiResult<TripListing>;
    async fn get_trip(&self, id: &TripId) -> ApiResult<Trip>;
}

/// Replace-style packing list persistence.
#[async_trait]
pub trait PackingListApi: Send + Sync {
    /// Send the complete list; the server may echo the persisted trip.
    async fn update_packing_list(&self, id: &TripId, list: &PackingList)
        -> ApiResult<Option<Trip>>;
}

/// reqwest-backed implementation of the Trek API.
#[derive(Clone)]
pub struct HttpTripApi {
    base_url: String,
    client: Client,
    credentials: Arc<dyn BearerSource>,
}

impl HttpTripApi {
    pub fn new(base_url: impl AsRef<str>, credentials: Arc<dyn BearerSource>) -> ApiResult<Self> {
        let base_url =
            normalize_api_url(base_url.as_ref()).map_err(ApiError::InvalidConfiguration)?;
        Ok(Self {
            base_url,
            client: Client::builder().build()?,
            credentials,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn create_trip(&self, trip: &NewTrip) -> ApiResult<Trip> {
        trip.validate()
            .map_err(|error| ApiError::InvalidPayload(error.to_string()))?;
        let request = self.client.post(self.url("/trips")).json(trip);
        self.send_json(request, Some("trip")).await
    }

    pub async fn update_trip(&self, id: &TripId, update: &TripUpdate) -> ApiResult<Trip> {
        let request = self
            .client
            .patch(self.url(&format!("/trips/{}", segment(id.as_str()))))
            .json(update);
        self.send_json(request, Some("trip")).await
    }

    pub async fn delete_trip(&self, id: &TripId) -> ApiResult<()> {
        let request = self
            .client
            .delete(self.url(&format!("/trips/{}", segment(id.as_str()))));
        self.send(request).await.map(drop)
    }

    pub async fn list_collaborators(&self, id: &TripId) -> ApiResult<Vec<Collaborator>> {
        let request = self.client.get(self.url(&format!(
            "/trips/{}/collaborators",
            segment(id.as_str())
        )));
        self.send_json(request, Some("collaborators")).await
    }

    pub async fn update_collaborator_role(
        &self,
        id: &TripId,
        user_id: &str,
        role: CollaboratorRole,
    ) -> ApiResult<Collaborator> {
        let request = self
            .client
            .patch(self.url(&format!(
                "/trips/{}/collaborators/{}",
                segment(id.as_str()),
                segment(user_id)
            )))
            .json(&serde_json::json!({ "role": role }));
        self.send_json(request, Some("collaborator")).await
    }

    pub async fn remove_collaborator(&self, id: &TripId, user_id: &str) -> ApiResult<()> {
        let request = self.client.delete(self.url(&format!(
            "/trips/{}/collaborators/{}",
            segment(id.as_str()),
            segment(user_id)
        )));
        self.send(request).await.map(drop)
    }

    pub async fn send_invitation(&self, invitation: &NewInvitation) -> ApiResult<Invitation> {
        if invitation.email.trim().is_empty() {
            return Err(ApiError::InvalidPayload(
                "invitee email must not be empty".to_string(),
            ));
        }
        let request = self.client.post(self.url("/invitations")).json(invitation);
        self.send_json(request, Some("invitation")).await
    }

    pub async fn list_invitations(&self) -> ApiResult<Vec<Invitation>> {
        let request = self.client.get(self.url("/invitations"));
        self.send_json(request, Some("invitations")).await
    }

    pub async fn respond_invitation(&self, id: &str, accept: bool) -> ApiResult<Invitation> {
        let action = if accept { "accept" } else { "decline" };
        let request = self
            .client
            .post(self.url(&format!("/invitations/{}/{action}", segment(id))));
        self.send_json(request, Some("invitation")).await
    }

    pub async fn list_notifications(&self) -> ApiResult<Vec<Notification>> {
        let request = self.client.get(self.url("/notifications"));
        self.send_json(request, Some("notifications")).await
    }

    pub async fn mark_notification_read(&self, id: &str) -> ApiResult<()> {
        let request = self
            .client
            .patch(self.url(&format!("/notifications/{}/read", segment(id))));
        self.send(request).await.map(drop)
    }

    pub async fn mark_all_notifications_read(&self) -> ApiResult<()> {
        let request = self.client.patch(self.url("/notifications/read-all"));
        self.send(request).await.map(drop)
    }

    pub async fn notification_settings(&self) -> ApiResult<NotificationSettings> {
        let request = self.client.get(self.url("/notifications/settings"));
        self.send_json(request, Some("settings")).await
    }

    pub async fn update_notification_settings(
        &self,
        settings: &NotificationSettings,
    ) -> ApiResult<NotificationSettings> {
        let request = self
            .client
            .put(self.url("/notifications/settings"))
            .json(settings);
        self.send_json(request, Some("settings")).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let token = self.credentials.bearer()?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.credentials.invalidate()?;
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = parse_api_error(status, &body);
            tracing::debug!("API request failed: {}", message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        field: Option<&str>,
    ) -> ApiResult<T> {
        let body = self.send(request).await?.text().await?;
        decode_body(&body, field)
    }
}

#[async_trait]
impl TripSource for HttpTripApi {
    async fn list_trips(&self) -> ApiResult<TripListing> {
        let request = self.client.get(self.url("/trips"));
        let body = self.send(request).await?.text().await?;
        decode_listing(&body)
    }

    async fn get_trip(&self, id: &TripId) -> ApiResult<Trip> {
        let request = self
            .client
            .get(self.url(&format!("/trips/{}", segment(id.as_str()))));
        self.send_json(request, Some("trip")).await
    }
}

#[async_trait]
impl PackingListApi for HttpTripApi {
    async fn update_packing_list(
        &self,
        id: &TripId,
        list: &PackingList,
    ) -> ApiResult<Option<Trip>> {
        let request = self
            .client
            .put(self.url(&format!("/trips/{}/packing-list", segment(id.as_str()))))
            .json(&serde_json::json!({ "packingList": list }));
        let body = self.send(request).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        // Acknowledgement-only bodies are still a success.
        Ok(decode_body::<Trip>(&body, Some("trip")).ok())
    }
}

fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Decode `body`, unwrapping `{ "<field>": ... }` envelopes when present.
fn decode_body<T: DeserializeOwned>(body: &str, field: Option<&str>) -> ApiResult<T> {
    let mut value: serde_json::Value = serde_json::from_str(body)
        .map_err(|error| ApiError::InvalidPayload(error.to_string()))?;
    if let Some(field) = field {
        if let Some(inner) = value.get_mut(field).map(serde_json::Value::take) {
            value = inner;
        }
    }
    serde_json::from_value(value).map_err(|error| ApiError::InvalidPayload(error.to_string()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListingBody {
    Wrapped { trips: Vec<Trip> },
    Split { upcoming: Vec<Trip>, past: Vec<Trip> },
    Flat(Vec<Trip>),
}

fn decode_listing(body: &str) -> ApiResult<TripListing> {
    let parsed: ListingBody = serde_json::from_str(body)
        .map_err(|error| ApiError::InvalidPayload(error.to_string()))?;
    let today = Local::now().date_naive();
    Ok(match parsed {
        ListingBody::Split { upcoming, past } => TripListing { upcoming, past },
        ListingBody::Wrapped { trips } | ListingBody::Flat(trips) => {
            TripListing::partition(trips, today)
        }
    })
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::auth::{AuthSession, AuthUser, Credentials, MemorySessionStore};
    use crate::models::PackingItem;

    /// Read one HTTP request, headers and body, as text.
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut raw = Vec::new();
        let mut chunk = [0_u8; 4096];
        loop {
            let Ok(read) = socket.read(&mut chunk).await else {
                break;
            };
            if read == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..read]);
            let text = String::from_utf8_lossy(&raw);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if raw.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).into_owned()
    }

    /// Serve one canned response; the handle yields the request it answered.
    async fn spawn_capturing_server(
        status_line: &str,
        body: &str,
    ) -> (String, JoinHandle<String>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let address = listener.local_addr().expect("local address");
        let body = body.to_string();
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return String::new();
            };
            let request = read_request(&mut socket).await;
            let _ = socket.write_all(response.as_bytes()).await;
            request
        });

        (format!("http://{address}/api"), handle)
    }

    async fn spawn_one_shot_server(status_line: &str, body: &str) -> String {
        spawn_capturing_server(status_line, body).await.0
    }

    fn signed_in() -> Credentials<MemorySessionStore> {
        let credentials = Credentials::new(MemorySessionStore::default());
        credentials
            .set(AuthSession {
                token: "token".to_string(),
                expires_at: None,
                user: AuthUser {
                    id: "u1".to_string(),
                    name: None,
                    email: None,
                },
            })
            .unwrap();
        credentials
    }

    #[test]
    fn decode_body_unwraps_envelopes() {
        let wrapped: Vec<String> = decode_body(r#"{"items":["a"]}"#, Some("items")).unwrap();
        let bare: Vec<String> = decode_body(r#"["a"]"#, Some("items")).unwrap();
        assert_eq!(wrapped, bare);
        assert!(decode_body::<Vec<String>>("not json", None).is_err());
    }

    #[test]
    fn decode_listing_accepts_flat_arrays() {
        let body = r#"[{"_id":"t1","destination":"Rome","startDate":"2000-01-01","endDate":"2000-01-02"}]"#;
        let listing = decode_listing(body).unwrap();
        assert_eq!(listing.past.len(), 1);
        assert!(listing.upcoming.is_empty());

        let split = decode_listing(r#"{"upcoming":[],"past":[]}"#).unwrap();
        assert!(split.is_empty());
    }

    #[test]
    fn decode_listing_rejects_unknown_envelopes() {
        let error = decode_listing(r#"{"data":[]}"#).unwrap_err();
        assert!(matches!(error, ApiError::InvalidPayload(_)));
        assert!(decode_listing(r#"{"upcoming":[]}"#).is_err());
    }

    #[tokio::test]
    async fn update_packing_list_puts_the_whole_list() {
        let (url, request) = spawn_capturing_server("204 No Content", "").await;
        let api = HttpTripApi::new(url, Arc::new(signed_in())).unwrap();
        let mut list = PackingList::new();
        list.add_item("clothing", PackingItem::new("T-shirt", Some(3)).unwrap())
            .unwrap();
        list.add_item("clothing", PackingItem::new("Rain jacket", None).unwrap())
            .unwrap();
        let wallet = list
            .add_item("essentials", PackingItem::new("Wallet", None).unwrap())
            .unwrap();
        let list = list.with_packed(wallet, true).unwrap();

        let echoed = api
            .update_packing_list(&TripId::new("trip 1"), &list)
            .await
            .expect("update should succeed");
        assert!(echoed.is_none());

        let request = request.await.unwrap();
        let (head, body) = request.split_once("\r\n\r\n").unwrap();
        assert!(
            head.starts_with("PUT /api/trips/trip%201/packing-list HTTP/1.1"),
            "unexpected request line: {head}"
        );
        assert!(head
            .lines()
            .any(|line| line.eq_ignore_ascii_case("authorization: Bearer token")));

        let sent: serde_json::Value = serde_json::from_str(body).unwrap();
        let object = sent.as_object().unwrap();
        assert_eq!(object.len(), 1);
        let sent_list: PackingList =
            serde_json::from_value(sent["packingList"].clone()).unwrap();
        assert_eq!(sent_list, list);
        assert_eq!(sent["packingList"]["clothing"].as_array().unwrap().len(), 2);
        assert_eq!(sent["packingList"]["essentials"][0]["packed"], true);
    }

    #[tokio::test]
    async fn update_packing_list_returns_echoed_trip() {
        let body = r#"{"trip":{"_id":"t1","destination":"Rome","startDate":"2030-01-01","endDate":"2030-01-02","packingList":{}}}"#;
        let url = spawn_one_shot_server("200 OK", body).await;
        let api = HttpTripApi::new(url, Arc::new(signed_in())).unwrap();

        let trip = api
            .update_packing_list(&TripId::new("t1"), &PackingList::new())
            .await
            .expect("update should succeed")
            .expect("trip should be echoed");
        assert_eq!(trip.id.as_str(), "t1");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let url = spawn_one_shot_server("500 Internal Server Error", r#"{"message":"boom"}"#).await;
        let api = HttpTripApi::new(url, Arc::new(signed_in())).unwrap();

        let error = api
            .update_packing_list(&TripId::new("t1"), &PackingList::new())
            .await
            .expect_err("update should fail");
        assert_eq!(error.status(), Some(500));
        assert!(error.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn unauthorized_clears_credentials() {
        let url = spawn_one_shot_server("401 Unauthorized", "").await;
        let credentials = signed_in();
        let api = HttpTripApi::new(url, Arc::new(credentials.clone())).unwrap();

        let error = api.get_trip(&TripId::new("t1")).await.unwrap_err();
        assert!(matches!(error, ApiError::Unauthorized));
        assert!(credentials.session().unwrap().is_none());
    }

    #[tokio::test]
    async fn requests_require_a_session() {
        let api = HttpTripApi::new(
            "http://127.0.0.1:9",
            Arc::new(Credentials::new(MemorySessionStore::default())),
        )
        .unwrap();
        let error = api.list_notifications().await.unwrap_err();
        assert!(matches!(error, ApiError::Auth(AuthError::NotSignedIn)));
    }
}
