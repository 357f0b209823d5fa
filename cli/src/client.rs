//! HTTP client for the Taskboard server

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::messages::{
    AnalyticsSnapshot, Announcement, AnnouncementKind, ApproveTaskRequest, AssignTaskRequest,
    AssignedTask, ErrorBody, PostAnnouncementRequest, PurgeSummary, RegisterUserRequest, Task,
    TaskAction, TaskFields, TransitionRequest, User,
};

/// Header carrying the caller's user id
const USER_ID_HEADER: &str = "x-user-id";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{code} ({status}): {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },

    #[error("no user id given; pass --user or set TASKBOARD_USER")]
    MissingUser,
}

pub type Result<T> = std::result::Result<T, ClientError>;

pub struct TaskboardClient {
    client: Client,
    base_url: String,
    user: Option<Uuid>,
}

impl TaskboardClient {
    pub fn new(base_url: impl Into<String>, user: Option<Uuid>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            user,
        }
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let user = self.user.ok_or(ClientError::MissingUser)?;
        Ok(self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(USER_ID_HEADER, user.to_string()))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let response = check(response).await?;
        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let builder = self.request(Method::GET, path)?;
        self.send(builder).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let builder = self.request(Method::POST, path)?.json(body);
        self.send(builder).await
    }

    async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let builder = self.request(Method::PUT, path)?.json(body);
        self.send(builder).await
    }

    /// Register a new account. Needs no identity.
    pub async fn register(&self, name: &str, email: &str) -> Result<User> {
        let builder = self
            .client
            .post(format!("{}/users", self.base_url))
            .json(&RegisterUserRequest {
                name: name.to_string(),
                email: email.to_string(),
            });
        self.send(builder).await
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        self.get("/tasks").await
    }

    pub async fn create_task(&self, fields: &TaskFields) -> Result<Task> {
        self.post("/tasks", fields).await
    }

    pub async fn transition(&self, task_id: Uuid, action: TaskAction) -> Result<Task> {
        self.post(
            &format!("/tasks/{}/transition", task_id),
            &TransitionRequest { action },
        )
        .await
    }

    pub async fn list_announcements(&self) -> Result<Vec<Announcement>> {
        self.get("/announcements").await
    }

    // Admin operations

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.get("/admin/users").await
    }

    pub async fn list_all_tasks(&self) -> Result<Vec<AssignedTask>> {
        self.get("/admin/tasks").await
    }

    pub async fn assign_task(&self, user_id: Uuid, fields: TaskFields) -> Result<Task> {
        self.post("/admin/tasks/assign", &AssignTaskRequest { user_id, fields })
            .await
    }

    pub async fn approve(&self, task_id: Uuid, approver_email: Option<String>) -> Result<Task> {
        self.put(
            &format!("/admin/tasks/{}/approve", task_id),
            &ApproveTaskRequest { approver_email },
        )
        .await
    }

    pub async fn reject(&self, task_id: Uuid) -> Result<Task> {
        let builder = self.request(Method::PUT, &format!("/admin/tasks/{}/reject", task_id))?;
        self.send(builder).await
    }

    pub async fn delete_task(&self, task_id: Uuid) -> Result<()> {
        let builder = self.request(Method::DELETE, &format!("/admin/tasks/{}", task_id))?;
        check(builder.send().await?).await?;
        Ok(())
    }

    pub async fn purge(&self) -> Result<PurgeSummary> {
        let builder = self.request(Method::DELETE, "/admin/tasks/purge-old")?;
        self.send(builder).await
    }

    pub async fn announce(
        &self,
        title: &str,
        content: &str,
        kind: AnnouncementKind,
    ) -> Result<Announcement> {
        self.post(
            "/admin/announcements",
            &PostAnnouncementRequest {
                title: title.to_string(),
                content: content.to_string(),
                kind,
            },
        )
        .await
    }

    pub async fn analytics(&self) -> Result<AnalyticsSnapshot> {
        self.get("/admin/analytics").await
    }
}

/// Turn a non-success response into [`ClientError::Api`]
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.error, body.message),
        Err(_) => ("http_error".to_string(), format!("{} - {}", status, text)),
    };
    tracing::debug!("Server returned {} ({})", status, code);
    Err(ClientError::Api {
        status,
        code,
        message,
    })
}
