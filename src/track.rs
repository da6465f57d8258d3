use std::path::Path;

use crate::error::SimError;

/// Immutable obstacle raster built from a track image.
///
/// A pixel is an obstacle exactly when its RGBA value equals the border
/// color; there is no tolerance.
#[derive(Clone, Debug)]
pub struct TrackMap {
    width: u32,
    height: u32,
    obstacles: Vec<bool>,
}

impl TrackMap {
    /// Decode an image file and classify each pixel against `border`.
    pub fn load(path: impl AsRef<Path>, border: [u8; 4]) -> Result<Self, SimError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| SimError::AssetLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.as_raw(), border)
    }

    /// Build from a tightly packed RGBA8 buffer of exactly `width * height` pixels.
    pub fn from_rgba(
        width: u32,
        height: u32,
        bytes: &[u8],
        border: [u8; 4],
    ) -> Result<Self, SimError> {
        let len = width as usize * height as usize;
        if bytes.len() != len * 4 {
            return Err(SimError::InvalidConfig(format!(
                "{width}x{height} track needs {} RGBA bytes, got {}",
                len * 4,
                bytes.len()
            )));
        }
        let obstacles = bytes.chunks_exact(4).map(|px| px == border).collect();
        Ok(Self {
            width,
            height,
            obstacles,
        })
    }

    /// Build from a predicate evaluated at every pixel.
    pub fn from_fn(width: u32, height: u32, mut is_obstacle: impl FnMut(u32, u32) -> bool) -> Self {
        let mut obstacles = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                obstacles.push(is_obstacle(x, y));
            }
        }
        Self {
            width,
            height,
            obstacles,
        }
    }

    /// A track with no obstacles at all.
    pub fn open(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            obstacles: vec![false; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.iter().filter(|o| **o).count()
    }

    /// Whether the pixel at `(x, y)` is border. Callers clamp before querying;
    /// anything off the raster is an error rather than a wrapped read.
    pub fn is_obstacle(&self, x: i64, y: i64) -> Result<bool, SimError> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return Err(SimError::OutOfBoundsQuery {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.obstacles[y as usize * self.width as usize + x as usize])
    }

    /// Render the obstacle mask as RGBA8 for display.
    pub fn mask_rgba(&self, free: [u8; 4], obstacle: [u8; 4]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.obstacles.len() * 4);
        for o in &self.obstacles {
            bytes.extend_from_slice(if *o { &obstacle } else { &free });
        }
        bytes
    }
}
