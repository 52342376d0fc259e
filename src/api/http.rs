//! JSON/HTTPS implementation of [`ForumApi`]

use super::{ApiConfig, ApiError, ApiResult, ForumApi, ThreadQuery};
use crate::model::{
    AdminStats, NewThread, Notification, NotificationId, ReactionKind, Reply, ReplyId,
    ReplyPayload, Report, ReportId, ReportKind, ReportStats, ThreadDetail, ThreadId,
    ThreadReactionResponse, ThreadSummary, Vote, VoteCounts,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

#[derive(serde::Deserialize)]
struct CreatedThread {
    id: ThreadId,
}

#[derive(serde::Deserialize)]
struct UnreadCount {
    #[serde(default)]
    count: u32,
}

/// [`ForumApi`] over reqwest.
pub struct HttpForumApi {
    client: Client,
    config: ApiConfig,
}

impl HttpForumApi {
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Map a non-success status onto the error taxonomy. The response body's
    /// `detail` field, when present, becomes the message.
    async fn check(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response
            .text()
            .await
            .ok()
            .and_then(|body| {
                serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
                    .or(Some(body))
            })
            .unwrap_or_default();

        Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Validation(detail)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::NotPermitted,
            StatusCode::NOT_FOUND => ApiError::NotFound,
            StatusCode::CONFLICT => ApiError::Conflict(detail),
            _ => ApiError::Server(status.as_u16()),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.authorize(self.client.get(self.url(path))).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> ApiResult<T> {
        let response = self
            .authorize(self.client.post(self.url(path)).json(body))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn post_unit(&self, path: &str, body: &serde_json::Value) -> ApiResult<()> {
        let response = self
            .authorize(self.client.post(self.url(path)).json(body))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_unit(&self, path: &str) -> ApiResult<()> {
        let response = self
            .authorize(self.client.delete(self.url(path)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

/// Collapse a nested wire reply into the flat domain form. Children are
/// handled by the tree builder, not here.
fn into_reply(thread: ThreadId, payload: &ReplyPayload, parent: Option<ReplyId>) -> Reply {
    Reply {
        id: payload.id,
        thread_id: thread,
        body: payload.body.clone(),
        created_at: payload.created_at,
        author: payload.author.clone(),
        parent_id: payload.parent_id.or(parent),
        up: payload.up,
        down: payload.down,
        flagged: payload.flagged,
    }
}

#[async_trait]
impl ForumApi for HttpForumApi {
    async fn list_threads(&self, query: &ThreadQuery) -> ApiResult<Vec<ThreadSummary>> {
        let mut params: Vec<(&str, String)> = vec![
            ("offset", query.offset.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(q) = query.q.as_deref().filter(|s| !s.is_empty()) {
            params.push(("q", q.to_string()));
        }
        if let Some(topic) = query.topic.as_deref() {
            params.push(("topic", topic.to_string()));
        }
        if let Some(uni) = query.university.as_deref() {
            params.push(("uni", uni.to_string()));
        }
        let response = self
            .authorize(self.client.get(self.url("/forum")).query(&params))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn fetch_thread(&self, id: ThreadId) -> ApiResult<ThreadDetail> {
        self.get_json(&format!("/forum/{id}")).await
    }

    async fn create_thread(&self, request: &NewThread) -> ApiResult<ThreadId> {
        let body = serde_json::to_value(request)?;
        let created: CreatedThread = self.post_json("/forum", &body).await?;
        Ok(created.id)
    }

    async fn delete_thread(&self, id: ThreadId) -> ApiResult<()> {
        self.delete_unit(&format!("/forum/{id}")).await
    }

    async fn add_reply(
        &self,
        thread: ThreadId,
        body: &str,
        parent: Option<ReplyId>,
    ) -> ApiResult<Reply> {
        let payload = match parent {
            Some(parent_id) => json!({ "body": body, "parent_id": parent_id }),
            None => json!({ "body": body }),
        };
        let created: ReplyPayload = self
            .post_json(&format!("/forum/{thread}/reply"), &payload)
            .await?;
        Ok(into_reply(thread, &created, parent))
    }

    async fn delete_reply(&self, id: ReplyId) -> ApiResult<()> {
        self.delete_unit(&format!("/forum/reply/{id}")).await
    }

    async fn react_to_thread(
        &self,
        id: ThreadId,
        kind: Option<ReactionKind>,
    ) -> ApiResult<ThreadReactionResponse> {
        self.post_json(&format!("/forum/{id}/react"), &json!({ "type": kind }))
            .await
    }

    async fn react_to_reply(&self, id: ReplyId, vote: Vote) -> ApiResult<VoteCounts> {
        self.post_json(&format!("/forum/reply/{id}/react"), &json!({ "type": vote }))
            .await
    }

    async fn report_thread(&self, id: ThreadId, reason: Option<&str>) -> ApiResult<()> {
        self.post_unit(&format!("/forum/{id}/report"), &json!({ "reason": reason }))
            .await
    }

    async fn report_reply(&self, id: ReplyId, reason: Option<&str>) -> ApiResult<()> {
        self.post_unit(
            &format!("/forum/reply/{id}/report"),
            &json!({ "reason": reason }),
        )
        .await
    }

    async fn unhandled_reports(&self, kind: ReportKind) -> ApiResult<Vec<Report>> {
        self.get_json(&format!(
            "/admin/reports/{}?handled=false",
            kind.path_segment()
        ))
        .await
    }

    async fn handle_report(
        &self,
        kind: ReportKind,
        id: ReportId,
        delete_content: bool,
    ) -> ApiResult<()> {
        let mut body = serde_json::Map::new();
        body.insert(
            kind.delete_field().to_string(),
            serde_json::Value::Bool(delete_content),
        );
        self.post_unit(
            &format!("/admin/reports/{}/{id}/handle", kind.path_segment()),
            &serde_json::Value::Object(body),
        )
        .await
    }

    async fn moderation_stats(&self) -> ApiResult<ReportStats> {
        let stats: AdminStats = self.get_json("/admin/stats").await?;
        Ok(stats.reports)
    }

    async fn notifications(&self) -> ApiResult<Vec<Notification>> {
        self.get_json("/notifications").await
    }

    async fn mark_notification_read(&self, id: NotificationId) -> ApiResult<()> {
        self.post_unit(&format!("/notifications/{id}/read"), &json!({}))
            .await
    }

    async fn delete_notification(&self, id: NotificationId) -> ApiResult<()> {
        self.delete_unit(&format!("/notifications/{id}")).await
    }

    async fn unread_count(&self) -> ApiResult<u32> {
        let unread: UnreadCount = self.get_json("/notifications/unread_count").await?;
        Ok(unread.count)
    }
}
