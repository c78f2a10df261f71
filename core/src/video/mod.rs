pub mod bitmap;
pub mod gfx;
pub mod palette;
pub mod tilemap;

pub use bitmap::IndexedBitmap;
pub use gfx::{GfxLayout, GfxSet};
pub use palette::PaletteCache;
pub use tilemap::{TileInfo, Tilemap};
