//! Object storage for files attached to duty-leave requests.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

/// The bucket holding duty-leave supporting documents.
pub const DUTY_LEAVE_BUCKET: &str = "duty-leave";

/// File extensions accepted as duty-leave supporting documents.
pub const ACCEPTED_EXTENSIONS: [&str; 6] = ["pdf", "doc", "docx", "jpg", "jpeg", "png"];

/// A place to put files and get a public link to them back.
pub trait ObjectStorage {
    /// Stores `contents` at `path` inside `bucket`. Fails if the object already exists.
    fn upload(&self, bucket: &str, path: &str, contents: &[u8]) -> Result<()>;

    /// The public URL of the object at `path` inside `bucket`. Does not check that it exists.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Object storage backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_url: String,
}

impl LocalStorage {
    /// Creates storage rooted at `root`, serving public URLs below `public_url`.
    pub fn new(root: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// The on-disk location of an object.
    pub fn object_location(&self, bucket: &str, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let is_plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

        if path.is_empty() || !is_plain || bucket.is_empty() || bucket.contains(['/', '\\']) {
            return Err(Error::Storage(format!("Invalid object path '{bucket}/{path}'")));
        }

        Ok(self.root.join(bucket).join(relative))
    }
}

impl ObjectStorage for LocalStorage {
    fn upload(&self, bucket: &str, path: &str, contents: &[u8]) -> Result<()> {
        let location = self.object_location(bucket, path)?;

        if let Some(parent) = location.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&location)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::Storage("The resource already exists".into()));
            }
            Err(e) => return Err(e.into()),
        };

        file.write_all(contents)?;

        tracing::info!(bucket, path, bytes = contents.len(), "uploaded object");
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.public_url)
    }
}

/// A file selected for upload alongside a duty-leave request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    file_name: String,
    contents: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment from a file name and its contents. Only the final component of
    /// `file_name` is kept.
    pub fn new(file_name: &str, contents: Vec<u8>) -> Result<Self> {
        let file_name = Path::new(file_name)
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::Validation(format!("Invalid file name '{file_name}'")))?;

        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension {
            Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => Ok(Self {
                file_name: file_name.to_string(),
                contents,
            }),
            _ => Err(Error::Validation(format!(
                "Unsupported document '{file_name}', expected one of: {}",
                ACCEPTED_EXTENSIONS.join(", ")
            ))),
        }
    }

    /// Reads an attachment from a local file.
    pub fn read(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::Validation(format!("Invalid file '{}'", path.display())))?;

        // Validate the name before reading the whole file.
        Self::new(file_name, Vec::new())?;

        let contents = fs::read(path)?;
        Self::new(file_name, contents)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// The object path for this attachment in `owner`'s folder, made unique by the upload time.
    pub fn object_path(&self, owner: &str, uploaded_at: DateTime<Utc>) -> String {
        format!(
            "{owner}/{}_{}",
            uploaded_at.timestamp_millis(),
            self.file_name
        )
    }
}
