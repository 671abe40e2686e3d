//! Playback surface abstraction
//!
//! The monitor only ever reads the decoded frame dimensions of whatever is
//! rendering the video.

use crate::types::Resolution;
use std::sync::Arc;
use tokio::sync::watch;

/// Read-only view of the decoded frame size
pub trait PlaybackSurface: Send + Sync {
    /// Current decoded frame width in pixels (0 before the first frame)
    fn video_width(&self) -> u32;

    /// Current decoded frame height in pixels (0 before the first frame)
    fn video_height(&self) -> u32;

    fn dimensions(&self) -> Resolution {
        Resolution::new(self.video_width(), self.video_height())
    }
}

impl<S: PlaybackSurface + ?Sized> PlaybackSurface for Arc<S> {
    fn video_width(&self) -> u32 {
        (**self).video_width()
    }

    fn video_height(&self) -> u32 {
        (**self).video_height()
    }

    fn dimensions(&self) -> Resolution {
        (**self).dimensions()
    }
}

/// Surface whose dimensions are pushed in by the renderer.
///
/// Clones share the same value, so one clone can be handed to the monitor
/// while another is updated on every decoded frame.
#[derive(Debug, Clone)]
pub struct SharedSurface {
    tx: Arc<watch::Sender<Resolution>>,
}

impl SharedSurface {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Resolution::default());
        Self { tx: Arc::new(tx) }
    }

    /// Record the latest decoded frame size
    pub fn set_dimensions(&self, width: u32, height: u32) {
        self.tx.send_replace(Resolution::new(width, height));
    }

    /// Watch for size changes
    pub fn subscribe(&self) -> watch::Receiver<Resolution> {
        self.tx.subscribe()
    }
}

impl Default for SharedSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSurface for SharedSurface {
    fn video_width(&self) -> u32 {
        self.tx.borrow().width
    }

    fn video_height(&self) -> u32 {
        self.tx.borrow().height
    }

    fn dimensions(&self) -> Resolution {
        *self.tx.borrow()
    }
}
