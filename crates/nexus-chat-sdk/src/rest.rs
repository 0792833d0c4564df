//! Async REST client for the metadata store.

use std::time::Duration;

use async_trait::async_trait;
use nexus_chat_common::config::StoreConfig;
use nexus_chat_common::models::{
    ChatEvent, CustomData, MembershipPageResponse, MembershipsQuery, PageRequest, RawUser,
};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{ChatError, Result};
use crate::store::{MetadataStore, PresenceApi};

/// HTTP implementation of [`MetadataStore`] and [`PresenceApi`].
///
/// ```rust,no_run
/// use nexus_chat_common::config::ChatConfig;
/// use nexus_chat_sdk::rest::RestClient;
///
/// # fn main() -> nexus_chat_sdk::Result<()> {
/// let config = ChatConfig::load()?;
/// let rest = RestClient::new(&config.store)?;
/// # let _ = rest;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    subscribe_key: String,
    publish_key: Option<String>,
    user_id: String,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct WhereNowResponse {
    payload: WhereNowPayload,
}

#[derive(Deserialize)]
struct WhereNowPayload {
    #[serde(default)]
    channels: Vec<String>,
}

#[derive(Deserialize)]
struct HereNowResponse {
    #[serde(default)]
    uuids: Vec<HereNowEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HereNowEntry {
    Id(String),
    Detailed { uuid: String },
}

impl RestClient {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .default_headers({
                let mut h = reqwest::header::HeaderMap::new();
                h.insert(
                    reqwest::header::CONTENT_TYPE,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                if let Some(secret) = &config.secret_key {
                    h.insert(
                        reqwest::header::AUTHORIZATION,
                        reqwest::header::HeaderValue::from_str(&format!("Bearer {secret}"))
                            .map_err(|e| ChatError::invalid_argument(e.to_string()))?,
                    );
                }
                h
            })
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(ChatError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            subscribe_key: config.subscribe_key.clone(),
            publish_key: config.publish_key.clone(),
            user_id: config.user_id.clone(),
        })
    }

    // ── Internal ──────────────────────────────────────────────────────────────

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .client
            .request(method.clone(), &url)
            .query(&[("uuid", self.user_id.as_str())])
            .query(query);
        if let Some(b) = body {
            req = req.json(b);
        }
        debug!(%method, path, "store request");
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let msg = resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| error_message(&v))
                .unwrap_or_else(|| status.to_string());
            return Err(ChatError::Api { status: status.as_u16(), message: msg });
        }
        if status == StatusCode::NO_CONTENT {
            return serde_json::from_value(Value::Null).map_err(ChatError::Json);
        }
        Ok(resp.json::<T>().await?)
    }

    fn objects_path(&self, user_id: &str) -> String {
        format!("/v2/objects/{}/uuids/{user_id}", self.subscribe_key)
    }
}

fn error_message(body: &Value) -> Option<String> {
    let err = body.get("error")?;
    err.as_str()
        .or_else(|| err.get("message").and_then(Value::as_str))
        .map(str::to_owned)
}

#[async_trait]
impl MetadataStore for RestClient {
    async fn query_memberships(&self, query: MembershipsQuery) -> Result<MembershipPageResponse> {
        let mut params: Vec<(&str, String)> = vec![
            ("include", query.include.to_query_value()),
            ("count", query.include.total_count.to_string()),
        ];
        if let Some(filter) = query.filter {
            params.push(("filter", filter));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        match query.page {
            Some(PageRequest::Next(cursor)) => params.push(("start", cursor.0)),
            Some(PageRequest::Prev(cursor)) => params.push(("end", cursor.0)),
            None => {}
        }
        for key in query.sort {
            params.push(("sort", key));
        }
        let path = format!("{}/channels", self.objects_path(&query.owner_id));
        self.request(Method::GET, &path, &params, None).await
    }

    async fn set_membership(
        &self,
        user_id: &str,
        channel_id: &str,
        custom: Option<CustomData>,
    ) -> Result<()> {
        let mut entry = json!({ "channel": { "id": channel_id } });
        if let Some(custom) = custom {
            entry["custom"] = Value::Object(custom);
        }
        let path = format!("{}/channels", self.objects_path(user_id));
        self.request::<Value>(Method::PATCH, &path, &[], Some(&json!({ "set": [entry] })))
            .await?;
        Ok(())
    }

    async fn remove_membership(&self, user_id: &str, channel_id: &str) -> Result<()> {
        let body = json!({ "delete": [{ "channel": { "id": channel_id } }] });
        let path = format!("{}/channels", self.objects_path(user_id));
        self.request::<Value>(Method::PATCH, &path, &[], Some(&body)).await?;
        Ok(())
    }

    async fn set_user(&self, user: RawUser) -> Result<RawUser> {
        let path = self.objects_path(&user.id);
        let body = serde_json::to_value(&user)?;
        let envelope: DataEnvelope<RawUser> = self
            .request(Method::PATCH, &path, &[("include", "custom,status,type".into())], Some(&body))
            .await?;
        Ok(envelope.data)
    }

    async fn remove_user(&self, user_id: &str) -> Result<()> {
        let path = self.objects_path(user_id);
        self.request::<Value>(Method::DELETE, &path, &[], None).await?;
        Ok(())
    }
}

#[async_trait]
impl PresenceApi for RestClient {
    async fn where_now(&self, user_id: &str) -> Result<Vec<String>> {
        let path = format!("/v2/presence/sub-key/{}/uuid/{user_id}", self.subscribe_key);
        let resp: WhereNowResponse = self.request(Method::GET, &path, &[], None).await?;
        Ok(resp.payload.channels)
    }

    async fn here_now(&self, channel_id: &str) -> Result<Vec<String>> {
        let path = format!("/v2/presence/sub-key/{}/channel/{channel_id}", self.subscribe_key);
        let resp: HereNowResponse = self
            .request(Method::GET, &path, &[("disable_uuids", "0".into())], None)
            .await?;
        Ok(resp
            .uuids
            .into_iter()
            .map(|entry| match entry {
                HereNowEntry::Id(id) | HereNowEntry::Detailed { uuid: id } => id,
            })
            .collect())
    }

    async fn publish(&self, channel_id: &str, event: &ChatEvent) -> Result<()> {
        let publish_key = self
            .publish_key
            .as_deref()
            .ok_or_else(|| ChatError::invalid_argument("publishing requires a publish key"))?;
        let path = format!("/publish/{publish_key}/{}/0/{channel_id}/0", self.subscribe_key);
        let body = serde_json::to_value(event)?;
        self.request::<Value>(Method::POST, &path, &[], Some(&body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(&json!({ "error": "bad filter" })).as_deref(),
            Some("bad filter")
        );
        assert_eq!(
            error_message(&json!({ "error": { "message": "Invalid filter expression" } }))
                .as_deref(),
            Some("Invalid filter expression")
        );
        assert_eq!(error_message(&json!({ "status": 400 })), None);
    }

    #[test]
    fn test_here_now_accepts_both_entry_shapes() {
        let resp: HereNowResponse =
            serde_json::from_value(json!({ "uuids": ["a", { "uuid": "b" }] })).unwrap();
        let ids: Vec<String> = resp
            .uuids
            .into_iter()
            .map(|e| match e {
                HereNowEntry::Id(id) | HereNowEntry::Detailed { uuid: id } => id,
            })
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_new_trims_base_url() {
        let rest = RestClient::new(&StoreConfig {
            base_url: "http://localhost:9999/".into(),
            subscribe_key: "sub".into(),
            publish_key: None,
            secret_key: Some("secret".into()),
            user_id: "alice".into(),
            request_timeout_ms: 1000,
        })
        .unwrap();
        assert_eq!(rest.base_url, "http://localhost:9999");
        assert_eq!(rest.objects_path("bob"), "/v2/objects/sub/uuids/bob");
    }
}
