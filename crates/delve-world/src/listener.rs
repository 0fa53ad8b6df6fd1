//! Terrain change notification.

use delve_types::CubeCoord;

/// Receives a callback whenever a cube changes terrain kind.
pub trait TerrainChangeListener {
    /// Called once per changed cube.
    fn notify(&mut self, coord: CubeCoord);
}

impl<F> TerrainChangeListener for F
where
    F: FnMut(CubeCoord),
{
    fn notify(&mut self, coord: CubeCoord) {
        self(coord);
    }
}

/// A listener that ignores every change.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl TerrainChangeListener for NoopListener {
    fn notify(&mut self, _coord: CubeCoord) {}
}
