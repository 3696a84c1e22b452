use std::sync::Arc;

use parking_lot::RwLock;

use crate::camera::CameraState;
use crate::light::PointLightSet;
use crate::transform::InstanceTransforms;

/// Immutable per-frame inputs shared by every fragment in a pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSnapshot {
    pub camera: CameraState,
    pub transforms: InstanceTransforms,
    pub lights: PointLightSet,
}

#[derive(Debug, Default)]
struct Published {
    snapshot: Arc<FrameSnapshot>,
    frame: u64,
}

/// Thread-safe holder of the current frame snapshot.
///
/// Writers build a whole new snapshot and swap it in; readers take a clone of
/// the `Arc` and keep a consistent view for as long as they hold it.
#[derive(Debug, Default)]
pub struct FrameState {
    published: Arc<RwLock<Published>>,
}

impl Clone for FrameState {
    fn clone(&self) -> Self {
        Self {
            published: Arc::clone(&self.published),
        }
    }
}

impl FrameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: FrameSnapshot) -> Self {
        Self {
            published: Arc::new(RwLock::new(Published {
                snapshot: Arc::new(snapshot),
                frame: 0,
            })),
        }
    }

    /// Replaces the current snapshot and returns the new frame number.
    pub fn publish(&self, snapshot: FrameSnapshot) -> u64 {
        let snapshot = Arc::new(snapshot);
        let mut guard = self.published.write();
        guard.snapshot = snapshot;
        guard.frame += 1;
        guard.frame
    }

    /// Returns the snapshot that is current right now.
    pub fn snapshot(&self) -> Arc<FrameSnapshot> {
        Arc::clone(&self.published.read().snapshot)
    }

    pub fn frame(&self) -> u64 {
        self.published.read().frame
    }
}
