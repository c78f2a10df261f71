//! Dirty-tracked scrolling tilemap renderer.
//!
//! A tilemap keeps a pre-rendered indexed image of its whole map (which is
//! usually wider than the screen) plus a dirty bit per cell. CPU writes to
//! tile RAM mark cells dirty; `draw` re-rasterizes only those cells, then
//! composites the map into the destination bitmap with horizontal wrap.
//! Self-modifying tile RAM therefore costs re-rendering a handful of cells
//! per frame instead of the full grid.

use fixedbitset::FixedBitSet;

use super::bitmap::IndexedBitmap;
use super::gfx::GfxSet;

/// Resolved descriptor of one map cell, produced by the owning board from
/// its tile RAM.
pub struct TileInfo {
    pub code: u16,
    pub color: u8,
}

pub struct Tilemap {
    cols: usize,
    rows: usize,
    tile_w: usize,
    tile_h: usize,
    map_w: usize,
    map_h: usize,
    scroll_x: u16,
    dirty: FixedBitSet,
    /// Map-sized scratch, one byte per pixel: `color << 4 | pen`.
    cache: Vec<u8>,
}

impl Tilemap {
    /// A `cols` × `rows` map of `tile_w` × `tile_h` cells, initially fully
    /// dirty.
    pub fn new(cols: usize, rows: usize, tile_w: usize, tile_h: usize) -> Self {
        let mut dirty = FixedBitSet::with_capacity(cols * rows);
        dirty.set_range(.., true);
        Self {
            cols,
            rows,
            tile_w,
            tile_h,
            map_w: cols * tile_w,
            map_h: rows * tile_h,
            scroll_x: 0,
            dirty,
            cache: vec![0; cols * tile_w * rows * tile_h],
        }
    }

    /// Mark cell `idx` for re-rasterization. The index wraps at the cell
    /// count, so either RAM half of a two-plane cell maps to the same bit.
    /// Dirtiness is a set: marking twice equals marking once.
    pub fn mark_tile_dirty(&mut self, idx: usize) {
        let n = self.dirty.len();
        self.dirty.insert(idx % n);
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty.set_range(.., true);
    }

    pub fn is_dirty(&self, idx: usize) -> bool {
        self.dirty.contains(idx % self.dirty.len())
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.count_ones(..)
    }

    /// Latch the horizontal scroll origin (16-bit wrap value).
    pub fn set_scroll_x(&mut self, v: u16) {
        self.scroll_x = v;
    }

    pub fn scroll_x(&self) -> u16 {
        self.scroll_x
    }

    /// Re-rasterize dirty cells, then composite the map into `dst`.
    ///
    /// `tile_info` resolves a cell index to its tile code and color. Each
    /// cached pixel is `color << 4 | pen`; during the copy, pixels with a
    /// zero pen are transparent, the rest are written as
    /// `palette_base | pixel` with the layer tag. The map wraps
    /// horizontally so that destination column 0 shows map column
    /// `scroll_x mod map_width`.
    pub fn draw<F>(
        &mut self,
        dst: &mut IndexedBitmap,
        gfx: &GfxSet,
        palette_base: u16,
        layer: u8,
        mut tile_info: F,
    ) where
        F: FnMut(usize) -> TileInfo,
    {
        debug_assert_eq!(gfx.width(), self.tile_w);
        debug_assert_eq!(gfx.height(), self.tile_h);

        for idx in self.dirty.ones() {
            let info = tile_info(idx);
            let tile = gfx.tile(info.code as usize);
            let ox = idx % self.cols * self.tile_w;
            let oy = idx / self.cols * self.tile_h;
            for ty in 0..self.tile_h {
                let row = (oy + ty) * self.map_w + ox;
                for tx in 0..self.tile_w {
                    self.cache[row + tx] = info.color << 4 | tile[ty * self.tile_w + tx];
                }
            }
        }
        self.dirty.clear();

        let scroll = self.scroll_x as usize % self.map_w;
        let height = dst.height().min(self.map_h);
        let width = dst.width();
        for y in 0..height {
            let row = &self.cache[y * self.map_w..(y + 1) * self.map_w];
            for x in 0..width {
                let pixel = row[(x + scroll) % self.map_w];
                if pixel & 0x0F != 0 {
                    dst.put(x, y, palette_base | pixel as u16, layer);
                }
            }
        }
    }
}
