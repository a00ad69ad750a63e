use tracing::{error, info};

use crate::pipeline::ImageTarget;

/// Something the operator should hear about while an upload runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    CropFailed { target: ImageTarget, reason: String },
    UploadFailed { target: ImageTarget, reason: String },
    PersistFailed { target: ImageTarget, url: String, reason: String },
    Uploaded { target: ImageTarget, url: String },
}

impl Notice {
    pub fn is_failure(&self) -> bool {
        !matches!(self, Notice::Uploaded { .. })
    }
}

/// Presentation of pipeline notices is the caller's business; the pipeline
/// only reports them.
pub trait OperatorNotifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl OperatorNotifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::CropFailed { target, reason } => {
                error!("Crop failed for {}: {}", target.prefix(), reason)
            }
            Notice::UploadFailed { target, reason } => {
                error!("Upload failed for {}: {}", target.prefix(), reason)
            }
            Notice::PersistFailed { target, url, reason } => {
                error!("Stored {} at {} but saving the URL failed: {}", target.prefix(), url, reason)
            }
            Notice::Uploaded { target, url } => info!("Uploaded {} to {}", target.prefix(), url),
        }
    }
}
