/// 경매 이미지 저장소
/// 1. 업로드 검증 (크기, MIME)
/// 2. 오브젝트 경로 생성 / 공개 URL <-> 경로 변환
/// 3. 외부 오브젝트 스토리지 호출
// region:    --- Imports
use crate::auction::model::PLACEHOLDER_IMAGE;
use crate::config::{StorageConfig, UploadConfig};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

// endregion: --- Imports

const MAX_NAME_LEN: usize = 50;

// region:    --- Validation
/// 업로드 검증
pub fn validate_upload(size: usize, mime: &str, config: &UploadConfig) -> AppResult<()> {
    if size == 0 {
        return Err(AppError::validation("빈 파일은 올릴 수 없습니다."));
    }
    if size > config.max_bytes {
        return Err(AppError::validation(format!(
            "파일 크기는 {}MB 이하여야 합니다.",
            config.max_bytes / (1024 * 1024)
        )));
    }
    let mime = mime.trim().to_ascii_lowercase();
    if !config.allowed_mime_types.iter().any(|allowed| *allowed == mime) {
        return Err(AppError::validation(
            "JPEG, PNG, WebP 이미지만 올릴 수 있습니다.",
        ));
    }
    Ok(())
}

/// 파일 이름(확장자 제외)을 경로에 쓸 수 있게 정리
/// 공백은 `_`로, 영문/숫자/`.`/`_`/`-` 외 문자는 지우고 소문자로 바꾼다.
/// 앞쪽 `.`은 지워 `..` 같은 경로 조각이 생기지 않게 한다.
pub fn sanitize_file_name(stem: &str) -> String {
    let mut cleaned = String::with_capacity(stem.len());
    let mut in_space = false;
    for c in stem.chars() {
        if c.is_whitespace() {
            if !in_space {
                cleaned.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            cleaned.push(c.to_ascii_lowercase());
        }
    }
    let cleaned: String = cleaned
        .trim_start_matches('.')
        .chars()
        .take(MAX_NAME_LEN)
        .collect();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

/// 확장자, 없으면 MIME 타입에서 정한다
fn extension_for(file_name: &str, mime: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => match mime {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
        .to_string(),
    }
}

/// 오브젝트 경로: `{user}/{draft}/{millis}_{i}_{name}.{ext}`
pub fn object_path(
    user_id: Uuid,
    draft_id: &str,
    index: usize,
    file_name: &str,
    mime: &str,
    now: DateTime<Utc>,
) -> String {
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(file_name);
    format!(
        "{}/{}/{}_{}_{}.{}",
        user_id,
        sanitize_file_name(draft_id),
        now.timestamp_millis(),
        index,
        sanitize_file_name(stem),
        extension_for(file_name, mime)
    )
}

/// 공개 URL에서 오브젝트 경로 추출
/// http(s)가 아닌 값은 이미 경로로 본다.
pub fn path_from_public_url(url: &str, bucket: &str) -> Option<String> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        let path = url.trim_start_matches('/');
        return (!path.is_empty()).then(|| path.to_string());
    }
    let marker = format!("/{}/", bucket);
    let (_, path) = url.split_once(&marker)?;
    let path = path.split(['?', '#']).next().unwrap_or(path);
    (!path.is_empty()).then(|| path.to_string())
}

/// 소유자 폴더(`{owner}/...`) 아래의 오브젝트 경로만 돌려준다
pub fn owned_path(url: &str, bucket: &str, owner: Uuid) -> Option<String> {
    let path = path_from_public_url(url, bucket)?;
    let rest = path.strip_prefix(&format!("{}/", owner))?;
    if rest.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..") {
        return None;
    }
    Some(path)
}

/// 출품 이미지는 본인이 올린 것(또는 대체 이미지)만 허용
pub fn ensure_owned_images(image_urls: &[String], bucket: &str, owner: Uuid) -> AppResult<()> {
    let foreign: Vec<&str> = image_urls
        .iter()
        .filter(|url| url.as_str() != PLACEHOLDER_IMAGE)
        .filter(|url| owned_path(url, bucket, owner).is_none())
        .map(String::as_str)
        .collect();
    if foreign.is_empty() {
        return Ok(());
    }
    Err(AppError::validation(format!(
        "본인이 올린 이미지만 사용할 수 있습니다: {}",
        foreign.join(", ")
    )))
}

// endregion: --- Validation

// region:    --- Object Storage
/// 업로드 결과
#[derive(Debug, Clone, Serialize)]
pub struct StoredObject {
    pub path: String,
    pub url: String,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> AppResult<StoredObject>;

    async fn delete(&self, paths: &[String]) -> AppResult<()>;

    fn public_url(&self, path: &str) -> String;

    fn bucket(&self) -> &str;
}

/// 이미지 URL 목록에 해당하는 오브젝트 삭제
/// 소유자 폴더 밖의 경로는 지우지 않는다. 실패는 기록만 한다.
pub async fn delete_images_or_warn(storage: &dyn ObjectStorage, owner: Uuid, image_urls: &[String]) {
    let mut paths = Vec::new();
    for url in image_urls.iter().filter(|url| url.as_str() != PLACEHOLDER_IMAGE) {
        match owned_path(url, storage.bucket(), owner) {
            Some(path) => paths.push(path),
            None => warn!(
                "{:<12} --> 소유자 폴더 밖의 이미지는 지우지 않음 owner: {}, url: {}",
                "Storage", owner, url
            ),
        }
    }
    if paths.is_empty() {
        return;
    }
    if let Err(e) = storage.delete(&paths).await {
        warn!(
            "{:<12} --> 이미지 삭제 실패 ({}건): {}",
            "Storage",
            paths.len(),
            e
        );
    }
}

/// HTTP 오브젝트 스토리지 클라이언트
pub struct HttpObjectStorage {
    client: Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

impl HttpObjectStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            service_key: config.service_key.clone(),
        }
    }

    fn external(message: impl ToString) -> AppError {
        AppError::External {
            service: "storage",
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> AppResult<StoredObject> {
        info!(
            "{:<12} --> 이미지 업로드 path: {}, size: {}",
            "Storage",
            path,
            bytes.len()
        );
        let url = format!("{}/object/{}/{}", self.base_url, self.bucket, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("content-type", content_type)
            .header("cache-control", "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(Self::external)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::external(format!("{} {}", status, body)));
        }
        Ok(StoredObject {
            path: path.to_string(),
            url: self.public_url(path),
        })
    }

    async fn delete(&self, paths: &[String]) -> AppResult<()> {
        info!("{:<12} --> 이미지 삭제 {}건", "Storage", paths.len());
        let url = format!("{}/object/{}", self.base_url, self.bucket);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(Self::external)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::external(format!("{} {}", status, body)));
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, self.bucket, path)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}

// endregion: --- Object Storage
