//! Handlers for object commands: listing, uploads (single-request,
//! multipart, type-routed, URL fetch), deletion, version inspection,
//! previous-version restore, and the retention sweep.

use crate::cli::ObjectCommand;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::retention::{RetentionSweeper, collect_versions, restore_previous_version};
use crate::services::s3::S3Store;
use crate::services::store::ObjectStoreClient;
use crate::services::upload::ChunkedUploader;
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

pub async fn dispatch(
    client: Client,
    config: &AppConfig,
    command: ObjectCommand,
) -> Result<(), AppError> {
    match command {
        ObjectCommand::List { bucket, prefix } => {
            list(&S3Store::new(client, bucket), prefix.as_deref()).await
        }
        ObjectCommand::Upload { bucket, file, key } => {
            upload(&S3Store::new(client, bucket), &file, key).await
        }
        ObjectCommand::UploadLarge {
            bucket,
            file,
            key,
            part_size_mib,
        } => upload_large(&S3Store::new(client, bucket), &file, key, part_size_mib).await,
        ObjectCommand::UploadByType { bucket, file } => {
            upload_by_type(&S3Store::new(client, bucket), &file).await
        }
        ObjectCommand::Fetch {
            bucket,
            url,
            keep_local,
        } => fetch(&S3Store::new(client, bucket), config, &url, keep_local).await,
        ObjectCommand::Delete { bucket, key } => {
            let store = S3Store::new(client, bucket);
            store.delete_object(&key).await?;
            println!("Deleted {key} from {}", store.bucket());
            Ok(())
        }
        ObjectCommand::Versions { bucket, key } => {
            versions(&S3Store::new(client, bucket), &key).await
        }
        ObjectCommand::RestorePrevious { bucket, key } => {
            let store = S3Store::new(client, bucket);
            let outcome = restore_previous_version(&store, &key).await?;
            println!(
                "Restored previous version of {} as current (etag {})",
                outcome.key,
                outcome.etag.as_deref().unwrap_or("unknown")
            );
            Ok(())
        }
    }
}

pub async fn sweep(
    client: Client,
    bucket: String,
    prefix: Option<String>,
    months: u32,
    json: bool,
) -> Result<(), AppError> {
    let store = S3Store::new(client, bucket);
    let sweeper = RetentionSweeper::with_horizon(&store, months, Utc::now());
    println!(
        "Sweeping versions of {} older than {}",
        store.bucket(),
        sweeper.cutoff().date_naive()
    );

    let report = sweeper.sweep(prefix.as_deref()).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.deleted == 0 {
        println!("No expired versions found ({} retained)", report.retained);
    } else {
        println!(
            "Deleted {} expired versions ({} retained, {} failed, {} pages)",
            report.deleted, report.retained, report.failed, report.pages
        );
    }
    Ok(())
}

async fn list(store: &S3Store, prefix: Option<&str>) -> Result<(), AppError> {
    let objects = store.list_objects(prefix).await?;
    if objects.is_empty() {
        println!("No objects found");
        return Ok(());
    }
    for object in objects {
        println!("  {}, size: {}", object.key, object.size_bytes);
    }
    Ok(())
}

async fn upload(store: &S3Store, file: &Path, key: Option<String>) -> Result<(), AppError> {
    let key = key.unwrap_or_else(|| file_name_of(file));
    let body = tokio::fs::read(file).await?;
    let content_type = file
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| category_for(ext).1);

    let outcome = store.put_object(&key, Bytes::from(body), content_type).await?;
    println!(
        "Uploaded {} to {} (etag {})",
        outcome.key,
        store.bucket(),
        outcome.etag.as_deref().unwrap_or("unknown")
    );
    Ok(())
}

async fn upload_large(
    store: &S3Store,
    file: &Path,
    key: Option<String>,
    part_size_mib: u64,
) -> Result<(), AppError> {
    if part_size_mib == 0 {
        return Err(AppError::failure("part size must be at least 1 MiB"));
    }
    let key = key.unwrap_or_else(|| file_name_of(file));

    // Abort the in-flight transaction instead of dying mid-part on ^C.
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, aborting upload transaction");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let outcome = ChunkedUploader::new(store)
        .with_part_size(part_size_mib * 1024 * 1024)
        .with_cancel_flag(cancel)
        .upload_file(&key, file)
        .await?;

    println!(
        "Uploaded {} to {} in {} parts ({} bytes, etag {})",
        outcome.key,
        store.bucket(),
        outcome.parts,
        outcome.total_bytes,
        outcome.etag.as_deref().unwrap_or("unknown")
    );
    Ok(())
}

async fn upload_by_type(store: &S3Store, file: &Path) -> Result<(), AppError> {
    let extension = file
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    let (folder, content_type) = category_for(extension);
    let key = format!("{folder}/{}", file_name_of(file));

    let body = tokio::fs::read(file).await?;
    let outcome = store.put_object(&key, Bytes::from(body), Some(content_type)).await?;
    println!("Uploaded {} to {}/{}", outcome.key, store.bucket(), folder);
    Ok(())
}

async fn fetch(
    store: &S3Store,
    config: &AppConfig,
    url: &str,
    keep_local: bool,
) -> Result<(), AppError> {
    let response = reqwest::get(url).await?.error_for_status()?;
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response.bytes().await?;

    let extension = extension_from_url(url).unwrap_or_else(|| "bin".to_string());
    let digest = md5::compute(Utc::now().to_rfc3339());
    let key = format!("fetched_{digest:x}.{extension}");

    if keep_local {
        tokio::fs::write(&key, &body).await?;
        println!("Saved local copy as {key}");
    }

    let outcome = store
        .put_object(&key, body, content_type.as_deref())
        .await?;
    println!("{}", public_object_url(store.bucket(), &outcome.key, config));
    Ok(())
}

async fn versions(store: &S3Store, key: &str) -> Result<(), AppError> {
    let entries = collect_versions(store, key).await?;
    if entries.is_empty() {
        println!("No versions found for {key}");
        return Ok(());
    }

    println!("{} versions of {key}:", entries.len());
    for entry in entries {
        let modified = entry
            .last_modified
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string());
        let mut line = format!("  {}  {}", entry.version_id, modified);
        if let Some(size) = entry.size_bytes {
            line.push_str(&format!("  {size} bytes"));
        }
        if entry.is_delete_marker {
            line.push_str("  (delete marker)");
        }
        if entry.is_latest {
            line.push_str("  (current)");
        }
        println!("{line}");
    }
    Ok(())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string())
}

/// Category folder and content type for an extension, used by the
/// type-routed upload and as a content-type guess elsewhere.
fn category_for(extension: &str) -> (&'static str, &'static str) {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => ("images", "image/jpeg"),
        "png" => ("images", "image/png"),
        "gif" => ("images", "image/gif"),
        "webp" => ("images", "image/webp"),
        "pdf" => ("documents", "application/pdf"),
        "txt" | "md" => ("documents", "text/plain"),
        "doc" | "docx" => ("documents", "application/msword"),
        "mp4" => ("videos", "video/mp4"),
        "avi" => ("videos", "video/x-msvideo"),
        "mov" => ("videos", "video/quicktime"),
        "mp3" => ("audio", "audio/mpeg"),
        "wav" => ("audio", "audio/wav"),
        "json" => ("documents", "application/json"),
        _ => ("misc", "application/octet-stream"),
    }
}

fn extension_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next()?;
    let (_, extension) = segment.rsplit_once('.')?;
    if extension.is_empty() || extension.len() > 5 || !extension.chars().all(char::is_alphanumeric)
    {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

fn public_object_url(bucket: &str, key: &str, config: &AppConfig) -> String {
    match &config.region {
        Some(region) => format!("https://{bucket}.s3.{region}.amazonaws.com/{key}"),
        None => format!("https://{bucket}.s3.amazonaws.com/{key}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_extensions_to_category_folders() {
        assert_eq!(category_for("JPG"), ("images", "image/jpeg"));
        assert_eq!(category_for("pdf"), ("documents", "application/pdf"));
        assert_eq!(category_for("xyz"), ("misc", "application/octet-stream"));
    }

    #[test]
    fn extracts_extension_from_url_path_only() {
        assert_eq!(
            extension_from_url("https://cdn.example.com/a/photo.JPG?w=100"),
            Some("jpg".to_string())
        );
        assert_eq!(extension_from_url("https://example.com/no-extension"), None);
        assert_eq!(extension_from_url("https://example.com/odd.tar.gz"), Some("gz".to_string()));
    }
}
