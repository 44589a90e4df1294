//! services/app/src/adapters/http.rs
//!
//! The HTTP adapter: one reqwest-backed client implementing every backend
//! port. All outbound calls go through this module; it owns bearer-token
//! injection and the single 401 refresh-and-retry.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use edudash_core::domain::{
    Assignment, AuthTokens, ChatMessage, ChatRole, Material, MaterialUpload, NewAssignment,
    UserProfile,
};
use edudash_core::ports::{
    AssignmentService, AuthService, DocumentQaService, MaterialService, PortError, PortResult,
    ScoutChatService,
};

use crate::config::Config;
use crate::error::AppError;
use crate::session::SessionManager;

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Deserialize)]
struct AssignmentsResponse {
    #[serde(default)]
    assignments: Vec<Assignment>,
}

#[derive(Deserialize)]
struct MaterialsResponse {
    #[serde(default)]
    materials: Vec<Material>,
}

#[derive(Serialize)]
struct RagQueryRequest<'a> {
    material_ids: &'a [String],
    query: &'a str,
    num_results: u32,
    temperature: f64,
}

#[derive(Deserialize)]
struct RagQueryResponse {
    #[serde(default)]
    answer: Option<String>,
}

#[derive(Serialize)]
struct ScoutHistoryItem<'a> {
    role: ChatRole,
    content: &'a str,
}

#[derive(Serialize)]
struct ScoutChatRequest<'a> {
    message: &'a str,
    conversation_history: Vec<ScoutHistoryItem<'a>>,
}

#[derive(Deserialize)]
struct ScoutChatResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Serialize)]
struct FirebaseLoginRequest<'a> {
    id_token: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    full_name: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    user: UserProfile,
}

/// The structured error body the backend attaches to failed requests.
#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

//=========================================================================================
// The Adapter
//=========================================================================================

/// Implements all backend-facing ports over a single reqwest client.
#[derive(Clone)]
pub struct HttpBackendAdapter {
    client: reqwest::Client,
    base_url: String,
    scout_base_url: String,
    session: SessionManager,
}

impl HttpBackendAdapter {
    pub fn new(config: &Config, session: SessionManager) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            scout_base_url: config.scout_base_url.clone(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match self.session.access_token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Sends an authorized request. A 401 triggers exactly one token
    /// refresh followed by a replay of the original request; if the
    /// refresh fails the local credentials are cleared and `Unauthorized`
    /// is surfaced so the caller can redirect to login. Requests whose
    /// bodies cannot be cloned still refresh (rotating the token pair)
    /// before surfacing `Unauthorized`; callers holding the original
    /// payload may then rebuild and resend once themselves.
    async fn send_with_auth(&self, req: RequestBuilder) -> PortResult<Response> {
        let replay = req.try_clone();
        let response = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        self.refresh_session().await?;

        let Some(replay) = replay else {
            return Err(PortError::Unauthorized);
        };
        self.authorize(replay)
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))
    }

    /// Rotates the token pair using the stored refresh token. A missing
    /// token or a failed rotation clears the local credentials; the
    /// still-valid refresh token survives any failure of the original
    /// request itself.
    async fn refresh_session(&self) -> PortResult<()> {
        let Some(refresh_token) = self.session.refresh_token() else {
            self.session.clear_credentials();
            return Err(PortError::Unauthorized);
        };

        debug!("Access token rejected; attempting refresh");
        if let Err(e) = self.refresh(&refresh_token).await {
            warn!("Token refresh failed: {e}");
            self.session.clear_credentials();
            return Err(PortError::Unauthorized);
        }
        Ok(())
    }

    /// Maps a non-success response to `PortError::Api`, pulling out the
    /// structured `detail` message when the body carries one.
    async fn ok_or_api_error(response: Response) -> PortResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(PortError::Unauthorized);
        }
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail);
        Err(PortError::Api {
            status: status.as_u16(),
            detail,
        })
    }

    async fn send_upload(&self, upload: &MaterialUpload) -> PortResult<Response> {
        let file_part = reqwest::multipart::Part::bytes(upload.file_bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str("application/pdf")
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("title", upload.title.clone())
            .text("description", upload.description.clone())
            .text("course_id", upload.course_id.clone())
            .text("tags", upload.tags.join(","))
            .text("is_public", upload.is_public.to_string())
            .text("vectorize", upload.vectorize.to_string());

        let req = self.client.post(self.url("/materials/upload")).multipart(form);
        self.authorize(req)
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> PortResult<T> {
        let response = self.send_with_auth(self.client.get(self.url(path))).await?;
        let response = Self::ok_or_api_error(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl AssignmentService for HttpBackendAdapter {
    async fn list_assignments(&self) -> PortResult<Vec<Assignment>> {
        let body: AssignmentsResponse = self.get_json("/assignments/").await?;
        Ok(body.assignments)
    }

    async fn create_assignment(&self, assignment: &NewAssignment) -> PortResult<()> {
        let req = self.client.post(self.url("/assignments/")).json(assignment);
        let response = self.send_with_auth(req).await?;
        Self::ok_or_api_error(response).await?;
        Ok(())
    }
}

#[async_trait]
impl MaterialService for HttpBackendAdapter {
    async fn list_materials(&self) -> PortResult<Vec<Material>> {
        let body: MaterialsResponse = self.get_json("/materials/").await?;
        Ok(body.materials)
    }

    async fn download_material(&self, material_id: &str) -> PortResult<Bytes> {
        let path = format!("/materials/{material_id}/download");
        let response = self.send_with_auth(self.client.get(self.url(&path))).await?;
        let response = Self::ok_or_api_error(response).await?;
        response
            .bytes()
            .await
            .map_err(|e| PortError::Network(e.to_string()))
    }

    async fn delete_material(&self, material_id: &str) -> PortResult<()> {
        let path = format!("/materials/{material_id}");
        let response = self
            .send_with_auth(self.client.delete(self.url(&path)))
            .await?;
        Self::ok_or_api_error(response).await?;
        Ok(())
    }

    async fn upload_material(&self, upload: &MaterialUpload) -> PortResult<()> {
        // Multipart bodies cannot be cloned for a replay, so the retry
        // rebuilds the whole form from the payload after the refresh.
        let response = self.send_upload(upload).await?;
        let response = if response.status() == StatusCode::UNAUTHORIZED {
            self.refresh_session().await?;
            self.send_upload(upload).await?
        } else {
            response
        };
        Self::ok_or_api_error(response).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentQaService for HttpBackendAdapter {
    async fn query_documents(
        &self,
        material_ids: &[String],
        query: &str,
        num_results: u32,
        temperature: f64,
    ) -> PortResult<String> {
        let payload = RagQueryRequest {
            material_ids,
            query,
            num_results,
            temperature,
        };
        let req = self.client.post(self.url("/rag/query-multiple")).json(&payload);
        let response = self.send_with_auth(req).await?;
        let response = Self::ok_or_api_error(response).await?;
        let body: RagQueryResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(body.answer.unwrap_or_default())
    }
}

#[async_trait]
impl ScoutChatService for HttpBackendAdapter {
    async fn chat(&self, message: &str, history: &[ChatMessage]) -> PortResult<String> {
        let payload = ScoutChatRequest {
            message,
            conversation_history: history
                .iter()
                .map(|m| ScoutHistoryItem {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
        };
        let url = format!("{}/scout/chat", self.scout_base_url);
        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;
        let response = Self::ok_or_api_error(response).await?;
        let body: ScoutChatResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(body.response.unwrap_or_default())
    }
}

#[async_trait]
impl AuthService for HttpBackendAdapter {
    async fn login_firebase(&self, id_token: &str) -> PortResult<UserProfile> {
        let response = self
            .client
            .post(self.url("/auth/login/firebase"))
            .json(&FirebaseLoginRequest { id_token })
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;
        let response = Self::ok_or_api_error(response).await?;
        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        self.session.save_tokens(&AuthTokens {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
        })?;
        self.session.save_user(&body.user)?;
        Ok(body.user)
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> PortResult<UserProfile> {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(&RegisterRequest {
                email,
                password,
                full_name,
            })
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;
        let response = Self::ok_or_api_error(response).await?;
        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        self.session.save_tokens(&AuthTokens {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
        })?;
        self.session.save_user(&body.user)?;
        Ok(body.user)
    }

    async fn refresh(&self, refresh_token: &str) -> PortResult<AuthTokens> {
        let response = self
            .client
            .post(self.url("/auth/refresh"))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;
        let response = Self::ok_or_api_error(response).await?;
        let tokens: AuthTokens = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.session.save_tokens(&tokens)?;
        Ok(tokens)
    }

    async fn logout(&self) -> PortResult<()> {
        let req = self.client.post(self.url("/auth/logout"));
        // Best-effort server-side invalidation; local state is cleared
        // regardless so logout always succeeds from the user's side.
        if let Err(e) = self.send_with_auth(req).await {
            warn!("Server-side logout failed: {e}");
        }
        self.session.clear_all();
        Ok(())
    }

    async fn me(&self) -> PortResult<UserProfile> {
        let user: UserProfile = self.get_json("/auth/me").await?;
        self.session.save_user(&user)?;
        Ok(user)
    }
}
