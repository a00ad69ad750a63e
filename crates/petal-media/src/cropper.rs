//! Pan/zoom cropper model.
//!
//! A [`CropView`] is the small value an editor UI mutates while the operator
//! drags and zooms; [`CropView::crop_rect`] turns it into the pixel-space
//! rectangle the codec consumes. [`CropSession`] binds a view to a decoded
//! source and exposes the two terminal actions, cancel and confirm.

use crate::codec::{self, CodecError, CropRect, EncodedImage, SourceImage};

pub const ZOOM_MIN: f32 = 1.0;
pub const ZOOM_MAX: f32 = 3.0;
pub const ZOOM_STEP: f32 = 0.1;

/// Fixed crop aspect ratio, chosen by the caller per upload target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aspect {
    width: u32,
    height: u32,
}

impl Aspect {
    /// Avatars.
    pub const SQUARE: Aspect = Aspect { width: 1, height: 1 };
    /// Cover banners.
    pub const WIDESCREEN: Aspect = Aspect { width: 16, height: 9 };

    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    pub fn ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Offset of the crop centre from the image centre, in source pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pan {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropView {
    aspect: Aspect,
    zoom: f32,
    pan: Pan,
}

impl CropView {
    pub fn new(aspect: Aspect) -> Self {
        Self {
            aspect,
            zoom: ZOOM_MIN,
            pan: Pan::default(),
        }
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.set_zoom(zoom);
        self
    }

    pub fn with_pan(mut self, pan: Pan) -> Self {
        self.pan = pan;
        self
    }

    pub fn aspect(&self) -> Aspect {
        self.aspect
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> Pan {
        self.pan
    }

    /// Clamp to `[ZOOM_MIN, ZOOM_MAX]` and snap to the slider step.
    /// Infinities clamp to the nearest bound; NaN leaves the zoom unchanged.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_nan() {
            return;
        }
        let snapped = (zoom.clamp(ZOOM_MIN, ZOOM_MAX) / ZOOM_STEP).round() * ZOOM_STEP;
        self.zoom = snapped.clamp(ZOOM_MIN, ZOOM_MAX);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.pan.x += dx;
            self.pan.y += dy;
        }
    }

    pub fn pan_to(&mut self, pan: Pan) {
        if pan.x.is_finite() && pan.y.is_finite() {
            self.pan = pan;
        }
    }

    /// Pull the pan back so the crop rectangle stays inside the image.
    pub fn clamp_pan(&mut self, image_width: u32, image_height: u32) {
        if image_width == 0 || image_height == 0 {
            self.pan = Pan::default();
            return;
        }
        let (w, h) = self.crop_size(image_width, image_height);
        let max_dx = (image_width as f64 - w) / 2.0;
        let max_dy = (image_height as f64 - h) / 2.0;
        self.pan.x = self.pan.x.clamp(-max_dx, max_dx);
        self.pan.y = self.pan.y.clamp(-max_dy, max_dy);
    }

    /// The rectangle currently framed by the view, inside an image of the
    /// given size. Zero-sized images yield an empty rectangle.
    pub fn crop_rect(&self, image_width: u32, image_height: u32) -> CropRect {
        if image_width == 0 || image_height == 0 {
            return CropRect::default();
        }

        let (w, h) = self.crop_size(image_width, image_height);
        let max_x = image_width as f64 - w;
        let max_y = image_height as f64 - h;
        let x = (max_x / 2.0 + self.pan.x).clamp(0.0, max_x).round();
        let y = (max_y / 2.0 + self.pan.y).clamp(0.0, max_y).round();

        CropRect::new(x as u32, y as u32, w as u32, h as u32)
    }

    /// Largest rectangle of the view's aspect that fits the image, shrunk by
    /// the zoom factor. Whole pixels, at least 1x1.
    fn crop_size(&self, image_width: u32, image_height: u32) -> (f64, f64) {
        let iw = image_width as f64;
        let ih = image_height as f64;
        let ratio = self.aspect.ratio();

        let (base_w, base_h) = if iw / ih > ratio {
            (ih * ratio, ih)
        } else {
            (iw, iw / ratio)
        };

        let zoom = self.zoom.clamp(ZOOM_MIN, ZOOM_MAX) as f64;
        let w = (base_w / zoom).round().clamp(1.0, iw);
        let h = (base_h / zoom).round().clamp(1.0, ih);
        (w, h)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropStatus {
    Editing,
    Encoding,
}

/// An open crop dialog over one decoded source image.
///
/// Dropping the session (or calling [`cancel`](Self::cancel)) discards it
/// without side effects. A failed [`confirm`](Self::confirm) leaves the
/// session open so the operator can adjust and retry.
#[derive(Debug)]
pub struct CropSession {
    source: SourceImage,
    view: CropView,
    status: CropStatus,
}

impl CropSession {
    pub fn open(source: SourceImage, aspect: Aspect) -> Self {
        Self {
            source,
            view: CropView::new(aspect),
            status: CropStatus::Editing,
        }
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    pub fn view(&self) -> &CropView {
        &self.view
    }

    pub fn status(&self) -> CropStatus {
        self.status
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.view.set_zoom(zoom);
        self.view.clamp_pan(self.source.width(), self.source.height());
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.view.pan_by(dx, dy);
        self.view.clamp_pan(self.source.width(), self.source.height());
    }

    pub fn pan_to(&mut self, pan: Pan) {
        self.view.pan_to(pan);
        self.view.clamp_pan(self.source.width(), self.source.height());
    }

    /// Live rectangle for the current pan and zoom.
    pub fn crop_rect(&self) -> CropRect {
        self.view.crop_rect(self.source.width(), self.source.height())
    }

    pub fn cancel(self) {}

    /// Encode the current rectangle and pass the blob to `on_complete`.
    pub fn confirm<F, T>(&mut self, on_complete: F) -> Result<T, CodecError>
    where
        F: FnOnce(EncodedImage) -> T,
    {
        let rect = self.crop_rect();
        self.confirm_rect(rect, on_complete)
    }

    /// Encode an explicit rectangle, for clients that computed their own.
    pub fn confirm_rect<F, T>(&mut self, rect: CropRect, on_complete: F) -> Result<T, CodecError>
    where
        F: FnOnce(EncodedImage) -> T,
    {
        self.status = CropStatus::Encoding;
        let encoded = codec::crop_and_encode(&self.source, rect);
        self.status = CropStatus::Editing;
        encoded.map(on_complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::gradient;

    #[test]
    fn zoom_is_clamped_and_snapped() {
        let mut view = CropView::new(Aspect::SQUARE);
        for (input, expected) in [
            (0.2, 1.0),
            (-5.0, 1.0),
            (1.0, 1.0),
            (1.04, 1.0),
            (1.26, 1.3),
            (2.5, 2.5),
            (3.0, 3.0),
            (7.5, 3.0),
        ] {
            view.set_zoom(input);
            assert!((view.zoom() - expected).abs() < 1e-4, "{input} -> {}", view.zoom());
            assert!((ZOOM_MIN..=ZOOM_MAX).contains(&view.zoom()));
        }

        view.set_zoom(2.0);
        view.set_zoom(f32::NAN);
        assert!((view.zoom() - 2.0).abs() < 1e-4);

        view.set_zoom(f32::INFINITY);
        assert_eq!(view.zoom(), ZOOM_MAX);
        view.set_zoom(f32::NEG_INFINITY);
        assert_eq!(view.zoom(), ZOOM_MIN);
    }

    #[test]
    fn default_view_frames_largest_centered_rectangle() {
        let square = CropView::new(Aspect::SQUARE);
        assert_eq!(square.crop_rect(4000, 3000), CropRect::new(500, 0, 3000, 3000));

        let wide = CropView::new(Aspect::WIDESCREEN);
        assert_eq!(wide.crop_rect(1600, 1200), CropRect::new(0, 150, 1600, 900));
    }

    #[test]
    fn zoom_shrinks_rectangle() {
        let view = CropView::new(Aspect::SQUARE).with_zoom(2.0);
        assert_eq!(view.crop_rect(1000, 1000), CropRect::new(250, 250, 500, 500));

        let max = CropView::new(Aspect::SQUARE).with_zoom(99.0);
        assert_eq!(max.crop_rect(900, 900).width, 300);
    }

    #[test]
    fn pan_moves_rectangle_but_never_past_edges() {
        let view = CropView::new(Aspect::SQUARE).with_pan(Pan { x: -1500.0, y: 0.0 });
        assert_eq!(view.crop_rect(4000, 3000), CropRect::new(0, 0, 3000, 3000));

        let view = CropView::new(Aspect::SQUARE)
            .with_zoom(2.0)
            .with_pan(Pan { x: 100.0, y: -100.0 });
        assert_eq!(view.crop_rect(1000, 1000), CropRect::new(350, 150, 500, 500));

        let far = CropView::new(Aspect::SQUARE)
            .with_zoom(2.0)
            .with_pan(Pan { x: 1e9, y: 1e9 });
        let rect = far.crop_rect(1000, 1000);
        assert!(rect.fits_within(1000, 1000));
        assert_eq!((rect.x, rect.y), (500, 500));
    }

    #[test]
    fn tiny_and_empty_images() {
        let view = CropView::new(Aspect::WIDESCREEN);
        assert!(view.crop_rect(0, 10).is_empty());

        let rect = view.crop_rect(1, 1);
        assert_eq!(rect, CropRect::new(0, 0, 1, 1));
    }

    #[test]
    fn session_clamps_accumulated_pan() {
        let mut session = CropSession::open(gradient(400, 200), Aspect::SQUARE);
        session.set_zoom(2.0);
        session.pan_by(10_000.0, 0.0);
        assert_eq!(session.view().pan().x, 150.0);

        // one drag back moves immediately instead of unwinding the overshoot
        session.pan_by(-50.0, 0.0);
        assert_eq!(session.crop_rect(), CropRect::new(250, 50, 100, 100));
    }

    #[test]
    fn confirm_hands_blob_to_callback() {
        let mut session = CropSession::open(gradient(320, 240), Aspect::WIDESCREEN);
        let size = session
            .confirm(|blob| (blob.width, blob.height, blob.bytes.len()))
            .unwrap();
        assert_eq!((size.0, size.1), (320, 180));
        assert!(size.2 > 0);
        assert_eq!(session.status(), CropStatus::Editing);
    }

    #[test]
    fn failed_confirm_keeps_session_open() {
        let mut session = CropSession::open(gradient(100, 100), Aspect::SQUARE);
        let mut called = false;
        let result = session.confirm_rect(CropRect::new(0, 0, 0, 0), |_| called = true);
        assert!(result.is_err());
        assert!(!called);
        assert_eq!(session.status(), CropStatus::Editing);

        // retry with the live rectangle succeeds
        assert!(session.confirm(|blob| blob.width).is_ok());
    }

    #[test]
    fn aspect_rejects_zero() {
        assert!(Aspect::new(0, 9).is_none());
        assert!(Aspect::new(4, 0).is_none());
        assert_eq!(Aspect::new(16, 9), Some(Aspect::WIDESCREEN));
    }
}
