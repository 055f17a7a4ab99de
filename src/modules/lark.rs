use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use reqwest::multipart::{Form, Part};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::{
    path::Path,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use super::error::{Result, SyncError};
use super::records::ScanRecord;

pub const LARK_BASE_URL: &str = "https://open.larksuite.com/open-apis";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);
const IMAGE_CONTENT_TYPE: &str = "image/jpeg";
const DEFAULT_IMAGE_NAME: &str = "image.jpg";

/// The remote side of a sync run: somewhere to put images and rows.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Uploads an image file and returns its file token.
    async fn upload_image(&self, path: &Path) -> Result<String>;

    /// Inserts one row and returns the id of the created record.
    async fn add_record(&self, base_id: &str, table_id: &str, row: &LarkRow) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_token: String,
}

// phone typed columns in Lark reject empty strings, so those are left out when blank
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LarkFields {
    pub name: String,
    pub company: String,
    pub department: String,
    pub position: String,
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mobile: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fax: String,
    pub postal_code: String,
    pub address: String,
    pub url: String,
    pub notes: String,
    pub image: Vec<Attachment>,
    pub scan_date: i64,
}

/// Body of a row insert request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LarkRow {
    pub fields: LarkFields,
}

impl LarkRow {
    pub fn new(record: &ScanRecord, file_token: Option<String>, scan_date: i64) -> LarkRow {
        LarkRow {
            fields: LarkFields {
                name: record.name.clone(),
                company: record.company.clone(),
                department: record.department.clone(),
                position: record.position.clone(),
                email: record.email.clone(),
                phone: record.phone.clone(),
                mobile: record.mobile.clone(),
                fax: record.fax.clone(),
                postal_code: record.postal_code.clone(),
                address: record.address.clone(),
                url: record.url.clone(),
                notes: record.notes.clone(),
                image: file_token
                    .map(|file_token| vec![Attachment { file_token }])
                    .unwrap_or_default(),
                scan_date,
            },
        }
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    refresh_at: Instant,
}

impl AccessToken {
    // refresh a minute before the server side expiry
    fn new(value: String, lifetime: Duration, issued_at: Instant) -> AccessToken {
        AccessToken {
            value,
            refresh_at: issued_at + lifetime.saturating_sub(TOKEN_REFRESH_MARGIN),
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now < self.refresh_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: String,
    #[serde(default)]
    expire: u64,
}

impl TokenResponse {
    fn into_token(self, issued_at: Instant) -> Result<AccessToken> {
        if self.code != 0 {
            return Err(SyncError::Auth(self.msg));
        }
        Ok(AccessToken::new(
            self.tenant_access_token,
            Duration::from_secs(self.expire),
            issued_at,
        ))
    }
}

// every open api response: code 0 is success, anything else carries msg
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn into_data(self, failure: fn(String) -> SyncError) -> Result<T> {
        if self.code != 0 {
            return Err(failure(self.msg));
        }
        self.data
            .ok_or_else(|| failure(format!("response without data ({})", self.msg)))
    }
}

#[derive(Debug, Deserialize)]
struct UploadData {
    file_token: String,
}

#[derive(Debug, Deserialize)]
struct RecordData {
    record: CreatedRecord,
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    record_id: String,
}

/// Client for the Lark open api (tenant token, drive media upload, bitable records).
pub struct LarkClient {
    client: reqwest::Client,
    base_url: String,
    app_id: String,
    app_secret: String,
    token: Mutex<Option<AccessToken>>,
}

impl LarkClient {
    pub fn new(app_id: &str, app_secret: &str) -> Result<LarkClient> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(LarkClient::with_http_client(
            app_id,
            app_secret,
            LARK_BASE_URL,
            client,
        ))
    }

    pub fn with_http_client(
        app_id: &str,
        app_secret: &str,
        base_url: &str,
        client: reqwest::Client,
    ) -> LarkClient {
        LarkClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
            app_secret: app_secret.to_string(),
            token: Mutex::new(None),
        }
    }

    // the lock is held across the refresh so only one caller ever fetches
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        let now = Instant::now();

        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        debug!("Requesting tenant access token");
        let response: TokenResponse = self
            .client
            .post(format!("{}/auth/v3/tenant_access_token/internal", self.base_url))
            .json(&json!({
                "app_id": self.app_id,
                "app_secret": self.app_secret,
            }))
            .send()
            .await?
            .json()
            .await?;

        let token = response.into_token(now)?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<ApiResponse<T>> {
        let token = self.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        debug!("{} {}", response.status(), response.url());
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TableStore for LarkClient {
    async fn upload_image(&self, path: &Path) -> Result<String> {
        // credentials are checked before the file is touched
        self.access_token().await?;

        let content = tokio::fs::read(path)
            .await
            .map(Bytes::from)
            .map_err(|source| SyncError::ImageRead {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_IMAGE_NAME.to_string());
        let size = content.len();

        let file = Part::stream_with_length(content, size as u64)
            .file_name(file_name.clone())
            .mime_str(IMAGE_CONTENT_TYPE)?;
        let form = Form::new()
            .text("file_name", file_name)
            .text("parent_type", "bitable_image")
            .text("parent_node", "root")
            .text("size", size.to_string())
            .part("file", file);

        let request = self
            .client
            .post(format!("{}/drive/v1/medias/upload_all", self.base_url))
            .multipart(form);
        let data: UploadData = self.post(request).await?.into_data(SyncError::Upload)?;
        Ok(data.file_token)
    }

    async fn add_record(&self, base_id: &str, table_id: &str, row: &LarkRow) -> Result<String> {
        let request = self
            .client
            .post(format!(
                "{}/bitable/v1/apps/{}/tables/{}/records",
                self.base_url, base_id, table_id
            ))
            .json(row);
        let data: RecordData = self.post(request).await?.into_data(SyncError::Insert)?;
        Ok(data.record.record_id)
    }
}
