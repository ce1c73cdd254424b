//! Pixel-mask overlap testing.
//!
//! A `PixelMask` is a bitgrid with one bit per texel, set where the source
//! image is opaque. Overlap tests intersect the two entities' world
//! rectangles first, then bit-test the intersection, so touching bounding
//! boxes with transparent corners do not count as a hit.

use bevy::prelude::*;

/// Alpha above this counts as opaque when building a mask from image data.
const ALPHA_THRESHOLD: u8 = 16;

#[derive(Debug, Clone)]
pub struct PixelMask {
    width: u32,
    height: u32,
    bits: Vec<u64>,
    solid: bool,
}

impl PixelMask {
    /// A fully opaque mask. Used for entities whose image has not been
    /// decoded yet, and for plain rectangle sprites.
    pub fn solid(width: u32, height: u32) -> Self {
        let len = ((width * height) as usize).div_ceil(64);
        Self {
            width,
            height,
            bits: vec![u64::MAX; len],
            solid: true,
        }
    }

    /// Build a mask from tightly packed RGBA8 pixel data, row-major from the
    /// top-left. Returns None if the buffer does not match the dimensions.
    pub fn from_alpha(width: u32, height: u32, rgba: &[u8]) -> Option<Self> {
        let pixel_count = (width * height) as usize;
        if rgba.len() < pixel_count * 4 {
            return None;
        }
        let mut bits = vec![0u64; pixel_count.div_ceil(64)];
        for i in 0..pixel_count {
            if rgba[i * 4 + 3] > ALPHA_THRESHOLD {
                bits[i / 64] |= 1 << (i % 64);
            }
        }
        Some(Self {
            width,
            height,
            bits,
            solid: false,
        })
    }

    /// Build a mask for a rectangular region of a larger RGBA8 image,
    /// such as one atlas frame within its sprite sheet. Returns None if
    /// the region or buffer does not fit the sheet dimensions.
    pub fn from_alpha_region(
        sheet_width: u32,
        sheet_height: u32,
        rgba: &[u8],
        region: URect,
    ) -> Option<Self> {
        let width = region.width();
        let height = region.height();
        if width == 0 || height == 0 {
            return None;
        }
        if region.max.x > sheet_width || region.max.y > sheet_height {
            return None;
        }
        if rgba.len() < (sheet_width * sheet_height) as usize * 4 {
            return None;
        }
        let mut bits = vec![0u64; ((width * height) as usize).div_ceil(64)];
        for y in 0..height {
            for x in 0..width {
                let src = ((region.min.y + y) * sheet_width + region.min.x + x) as usize;
                if rgba[src * 4 + 3] > ALPHA_THRESHOLD {
                    let idx = (y * width + x) as usize;
                    bits[idx / 64] |= 1 << (idx % 64);
                }
            }
        }
        Some(Self {
            width,
            height,
            bits,
            solid: false,
        })
    }

    pub fn is_solid(&self) -> bool {
        self.solid
    }

    fn bit(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let idx = (y * self.width + x) as usize;
        self.bits[idx / 64] >> (idx % 64) & 1 == 1
    }

    /// Sample the mask at a world point, given the world rectangle the mask
    /// is stretched over. Mask row 0 is the top edge of the rectangle.
    fn sample(&self, rect: Rect, point: Vec2) -> bool {
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return false;
        }
        let u = (point.x - rect.min.x) / rect.width();
        let v = (rect.max.y - point.y) / rect.height();
        let x = (u * self.width as f32).floor() as i64;
        let y = (v * self.height as f32).floor() as i64;
        if x < 0 || y < 0 {
            return false;
        }
        self.bit(x as u32, y as u32)
    }
}

/// Collision mask for an entity, stretched over its hitbox rectangle.
#[derive(Component, Debug, Clone)]
pub struct CollisionMask(pub PixelMask);

/// Mask-accurate overlap of two entities. The rectangles are the entities'
/// world-space hitboxes; masks are sampled at one-pixel steps across the
/// rectangle intersection.
pub fn masks_overlap(
    rect_a: Rect,
    mask_a: &PixelMask,
    rect_b: Rect,
    mask_b: &PixelMask,
) -> bool {
    let overlap = rect_a.intersect(rect_b);
    if overlap.is_empty() {
        return false;
    }
    if mask_a.solid && mask_b.solid {
        return true;
    }

    let steps_x = (overlap.width().ceil() as u32).max(1);
    let steps_y = (overlap.height().ceil() as u32).max(1);
    for iy in 0..steps_y {
        let y = overlap.min.y + (iy as f32 + 0.5) * overlap.height() / steps_y as f32;
        for ix in 0..steps_x {
            let x = overlap.min.x + (ix as f32 + 0.5) * overlap.width() / steps_x as f32;
            let p = Vec2::new(x, y);
            if mask_a.sample(rect_a, p) && mask_b.sample(rect_b, p) {
                return true;
            }
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
