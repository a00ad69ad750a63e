//! Upload orchestration: source bytes → crop session → encoded blob → object
//! store → public URL → configuration entry.
//!
//! Steps run strictly in sequence. Nothing is retried and nothing is rolled
//! back: a storage failure leaves the configuration untouched, a persist
//! failure leaves an orphaned object behind. Both are reported to the
//! [`OperatorNotifier`] and returned as [`UploadError`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use petal_types::config::{ConfigStore, keys};
use thiserror::Error;

use crate::codec::{CodecError, CropRect, EncodedImage, SourceImage};
use crate::cropper::{Aspect, CropSession, Pan};
use crate::notify::{Notice, OperatorNotifier};
use crate::store::{ObjectStore, StoreError};

pub const DEFAULT_BUCKET: &str = "uploads";

/// Where a cropped image ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    /// Full-screen cover wallpaper.
    Cover,
    /// Profile avatar.
    Avatar,
    /// Cover of a note that is being written; the URL goes into the note
    /// record instead of a config entry.
    NoteCover,
}

impl ImageTarget {
    pub fn config_key(&self) -> Option<&'static str> {
        match self {
            Self::Cover => Some(keys::COVER_IMAGE),
            Self::Avatar => Some(keys::PROFILE_AVATAR),
            Self::NoteCover => None,
        }
    }

    pub fn aspect(&self) -> Aspect {
        match self {
            Self::Avatar => Aspect::SQUARE,
            Self::Cover | Self::NoteCover => Aspect::WIDESCREEN,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Avatar => "avatar",
            Self::NoteCover => "note-cover",
        }
    }
}

/// How the crop rectangle is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropSelection {
    /// Derive it from the cropper view at the target's aspect.
    View { zoom: f32, pan: Pan },
    /// Use a rectangle the client computed.
    Rect(CropRect),
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("crop failed: {0}")]
    Crop(#[from] CodecError),
    #[error("upload failed: {0}")]
    Storage(#[from] StoreError),
    #[error("stored at {url} but saving the URL failed: {reason}")]
    Persist { url: String, reason: String },
    #[error("background task failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uploaded {
    pub url: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// Timestamp-derived object name, e.g. `avatar-1712345678901`.
pub fn object_name(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", prefix, now.timestamp_millis())
}

pub struct ImageUploader<S, C> {
    store: Arc<S>,
    config: Arc<C>,
    bucket: String,
}

impl<S, C> ImageUploader<S, C>
where
    S: ObjectStore + 'static,
    C: ConfigStore + 'static,
{
    pub fn new(store: Arc<S>, config: Arc<C>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            config,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decode the selected file and open a cropper over it at the target's
    /// aspect ratio.
    pub fn open(&self, target: ImageTarget, source: &[u8]) -> Result<CropSession, CodecError> {
        let source = SourceImage::decode(source)?;
        Ok(CropSession::open(source, target.aspect()))
    }

    /// Store an encoded blob and record its public URL for `target`.
    pub async fn upload(
        &self,
        target: ImageTarget,
        image: &EncodedImage,
        notifier: &dyn OperatorNotifier,
    ) -> Result<Uploaded, UploadError> {
        let name = object_name(target.prefix(), Utc::now());

        if let Err(e) = self
            .store
            .store(&self.bucket, &name, image.bytes.clone(), image.content_type)
            .await
        {
            notifier.notify(Notice::UploadFailed {
                target,
                reason: e.to_string(),
            });
            return Err(e.into());
        }

        let url = self.store.public_url(&self.bucket, &name);

        if let Some(key) = target.config_key() {
            let config = self.config.clone();
            let value = url.clone();
            let failure = match tokio::task::spawn_blocking(move || config.upsert(key, &value)).await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(e) => Some(format!("spawn_blocking join error: {}", e)),
            };

            if let Some(reason) = failure {
                notifier.notify(Notice::PersistFailed {
                    target,
                    url: url.clone(),
                    reason: reason.clone(),
                });
                return Err(UploadError::Persist { url, reason });
            }
        }

        notifier.notify(Notice::Uploaded {
            target,
            url: url.clone(),
        });

        Ok(Uploaded {
            url,
            name,
            width: image.width,
            height: image.height,
        })
    }

    /// Full pipeline for one selected file. Decoding and encoding run on the
    /// blocking pool.
    pub async fn process(
        &self,
        target: ImageTarget,
        source: Vec<u8>,
        selection: CropSelection,
        notifier: &dyn OperatorNotifier,
    ) -> Result<Uploaded, UploadError> {
        let cropped = tokio::task::spawn_blocking(move || -> Result<EncodedImage, CodecError> {
            let source = SourceImage::decode(&source)?;
            let mut session = CropSession::open(source, target.aspect());
            match selection {
                CropSelection::View { zoom, pan } => {
                    session.set_zoom(zoom);
                    session.pan_to(pan);
                    session.confirm(|blob| blob)
                }
                CropSelection::Rect(rect) => session.confirm_rect(rect, |blob| blob),
            }
        })
        .await
        .map_err(|e| UploadError::Worker(e.to_string()))?;

        let encoded = match cropped {
            Ok(encoded) => encoded,
            Err(e) => {
                notifier.notify(Notice::CropFailed {
                    target,
                    reason: e.to_string(),
                });
                return Err(e.into());
            }
        };

        self.upload(target, &encoded, notifier).await
    }
}
