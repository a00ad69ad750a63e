//! Image handling for site uploads: decode, crop, JPEG encode, store, and
//! record the public URL.

pub mod codec;
pub mod cropper;
pub mod data_url;
pub mod notify;
pub mod pipeline;
pub mod store;

pub use codec::{CodecError, CropRect, EncodedImage, SourceImage, crop_and_encode};
pub use cropper::{Aspect, CropSession, CropStatus, CropView, Pan};
pub use notify::{Notice, OperatorNotifier, TracingNotifier};
pub use pipeline::{CropSelection, ImageTarget, ImageUploader, UploadError, Uploaded};
pub use store::{AnyObjectStore, HttpObjectStore, LocalObjectStore, ObjectStore, StoreError};
