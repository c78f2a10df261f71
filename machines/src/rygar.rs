use log::info;

use tecmo_core::core::machine::{InputButton, Machine};
use tecmo_core::core::Bus;
use tecmo_core::cpu::pins::Pins;
use tecmo_core::cpu::Cpu;
use tecmo_core::video::bitmap::IndexedBitmap;
use tecmo_core::video::gfx::{self, GfxLayout, GfxSet};
use tecmo_core::video::palette::PaletteCache;
use tecmo_core::video::tilemap::{TileInfo, Tilemap};

use crate::rom_loader::{RomEntry, RomLoadError, RomRegion, RomSet};

// ---------------------------------------------------------------------------
// Rygar ROM definitions ("rygar" set, Tecmo 6002 board)
// ---------------------------------------------------------------------------

/// Main CPU program ROMs: 48KB at 0x0000-0xBFFF (32KB + 16KB chips).
pub static RYGAR_PROGRAM_ROM: RomRegion = RomRegion {
    size: 0xC000,
    entries: &[
        RomEntry {
            name: "5.5p",
            size: 0x8000,
            offset: 0x0000,
            crc32: None,
        },
        RomEntry {
            name: "cpu_5m.bin",
            size: 0x4000,
            offset: 0x8000,
            crc32: None,
        },
    ],
};

/// Banked program ROM: 32KB, windowed 2KB at a time into 0xF000-0xF7FF.
pub static RYGAR_BANK_ROM: RomRegion = RomRegion {
    size: 0x8000,
    entries: &[RomEntry {
        name: "cpu_5j.bin",
        size: 0x8000,
        offset: 0x0000,
        crc32: None,
    }],
};

/// Text-layer tiles: 1024 8×8 4bpp tiles.
pub static RYGAR_CHAR_ROM: RomRegion = RomRegion {
    size: 0x8000,
    entries: &[RomEntry {
        name: "cpu_8k.bin",
        size: 0x8000,
        offset: 0x0000,
        crc32: None,
    }],
};

/// Foreground tiles: 1024 16×16 4bpp tiles (four chips, consecutive).
pub static RYGAR_FG_ROM: RomRegion = RomRegion {
    size: 0x20000,
    entries: &[
        RomEntry {
            name: "vid_6p.bin",
            size: 0x8000,
            offset: 0x00000,
            crc32: None,
        },
        RomEntry {
            name: "vid_6o.bin",
            size: 0x8000,
            offset: 0x08000,
            crc32: None,
        },
        RomEntry {
            name: "vid_6n.bin",
            size: 0x8000,
            offset: 0x10000,
            crc32: None,
        },
        RomEntry {
            name: "vid_6l.bin",
            size: 0x8000,
            offset: 0x18000,
            crc32: None,
        },
    ],
};

/// Background tiles: 1024 16×16 4bpp tiles (four chips, consecutive).
pub static RYGAR_BG_ROM: RomRegion = RomRegion {
    size: 0x20000,
    entries: &[
        RomEntry {
            name: "vid_6f.bin",
            size: 0x8000,
            offset: 0x00000,
            crc32: None,
        },
        RomEntry {
            name: "vid_6e.bin",
            size: 0x8000,
            offset: 0x08000,
            crc32: None,
        },
        RomEntry {
            name: "vid_6c.bin",
            size: 0x8000,
            offset: 0x10000,
            crc32: None,
        },
        RomEntry {
            name: "vid_6b.bin",
            size: 0x8000,
            offset: 0x18000,
            crc32: None,
        },
    ],
};

/// Sprite tiles: 4096 8×8 4bpp tiles (four chips, consecutive).
pub static RYGAR_SPRITE_ROM: RomRegion = RomRegion {
    size: 0x20000,
    entries: &[
        RomEntry {
            name: "vid_6k.bin",
            size: 0x8000,
            offset: 0x00000,
            crc32: None,
        },
        RomEntry {
            name: "vid_6j.bin",
            size: 0x8000,
            offset: 0x08000,
            crc32: None,
        },
        RomEntry {
            name: "vid_6h.bin",
            size: 0x8000,
            offset: 0x10000,
            crc32: None,
        },
        RomEntry {
            name: "vid_6g.bin",
            size: 0x8000,
            offset: 0x18000,
            crc32: None,
        },
    ],
};

// ---------------------------------------------------------------------------
// Input button IDs (active-high: 0x00 = all released)
// ---------------------------------------------------------------------------
pub const INPUT_P1_LEFT: u8 = 0;
pub const INPUT_P1_RIGHT: u8 = 1;
pub const INPUT_P1_DOWN: u8 = 2;
pub const INPUT_P1_UP: u8 = 3;
pub const INPUT_P1_ATTACK: u8 = 4;
pub const INPUT_P1_JUMP: u8 = 5;
pub const INPUT_P1_START: u8 = 6;
pub const INPUT_COIN: u8 = 7;

const RYGAR_INPUT_MAP: &[InputButton] = &[
    InputButton {
        id: INPUT_P1_LEFT,
        name: "P1 Left",
    },
    InputButton {
        id: INPUT_P1_RIGHT,
        name: "P1 Right",
    },
    InputButton {
        id: INPUT_P1_DOWN,
        name: "P1 Down",
    },
    InputButton {
        id: INPUT_P1_UP,
        name: "P1 Up",
    },
    InputButton {
        id: INPUT_P1_ATTACK,
        name: "P1 Attack",
    },
    InputButton {
        id: INPUT_P1_JUMP,
        name: "P1 Jump",
    },
    InputButton {
        id: INPUT_P1_START,
        name: "P1 Start",
    },
    InputButton {
        id: INPUT_COIN,
        name: "Coin",
    },
];

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------
// CPU clock:  4.000 MHz
// Frame rate: 60 Hz → 4000000 / 60 ≈ 66,667 ticks per frame
// Field:      525 lines, 42 of them blanking
// VBLANK:     66667 × 42 / 525 ≈ 5,333 ticks with INT asserted

const CPU_CLOCK_HZ: u64 = 4_000_000;
const VSYNC_PERIOD: i32 = 66_667;
const VBLANK_DURATION: i32 = 5_333;
const TICKS_PER_FRAME: u64 = VSYNC_PERIOD as u64;

// Screen: 256×256 composite, visible region Y: 16-239 (224 lines).
const NATIVE_SIZE: usize = 256;
const VBLANK_END: usize = 16; // first visible scanline
const SCREEN_WIDTH: u32 = NATIVE_SIZE as u32;
const SCREEN_HEIGHT: u32 = (NATIVE_SIZE - 2 * VBLANK_END) as u32; // 224

// Palette bases and depth tags of the four layers. Tags grow toward the
// back: tile layers stamp a fixed tag, sprites stamp their per-sprite tag
// and only cover pixels whose tag is deeper than their own.
const SPRITE_PALETTE_BASE: u16 = 0x000;
const CHAR_PALETTE_BASE: u16 = 0x100;
const FG_PALETTE_BASE: u16 = 0x200;
const BG_PALETTE_BASE: u16 = 0x300;

const CHAR_LAYER: u8 = 1;
const FG_LAYER: u8 = 2;
const BG_LAYER: u8 = 3;
/// Tag of the backdrop fill; tag-3 sprites sit behind every layer.
const BACKDROP_LAYER: u8 = 3;

// ---------------------------------------------------------------------------
// Tile layouts
// ---------------------------------------------------------------------------

/// 8×8, 4bpp packed: four plane bits per pixel, columns every 4 bits.
const PACKED_8X8: GfxLayout = GfxLayout {
    width: 8,
    height: 8,
    planes: &[0, 1, 2, 3],
    x_offsets: &[0, 4, 8, 12, 16, 20, 24, 28],
    y_offsets: &[0, 32, 64, 96, 128, 160, 192, 224],
    tile_size: 8 * 8 * 4,
};

/// 16×16 assembled from four 8×8 sub-tiles in reading order: the second
/// half of each offset table is displaced by one (X) or two (Y) sub-tile
/// records of 4*8*8 bits.
const PACKED_16X16: GfxLayout = GfxLayout {
    width: 16,
    height: 16,
    planes: &[0, 1, 2, 3],
    x_offsets: &[
        0, 4, 8, 12, 16, 20, 24, 28, //
        256, 260, 264, 268, 272, 276, 280, 284,
    ],
    y_offsets: &[
        0, 32, 64, 96, 128, 160, 192, 224, //
        512, 544, 576, 608, 640, 672, 704, 736,
    ],
    tile_size: 16 * 16 * 4,
};

/// 8×8 tile order within a multi-tile sprite (Tecmo scan order): 16×16
/// sprites use the top-left 2×2 block, 32×32 the top-left 4×4, and so on.
const SPRITE_TILE_ORDER: [[u16; 8]; 8] = [
    [0, 1, 4, 5, 16, 17, 20, 21],
    [2, 3, 6, 7, 18, 19, 22, 23],
    [8, 9, 12, 13, 24, 25, 28, 29],
    [10, 11, 14, 15, 26, 27, 30, 31],
    [32, 33, 36, 37, 48, 49, 52, 53],
    [34, 35, 38, 39, 50, 51, 54, 55],
    [40, 41, 44, 45, 56, 57, 60, 61],
    [42, 43, 46, 47, 58, 59, 62, 63],
];

/// Rygar Arcade System (Tecmo, 1986), main board only.
///
/// Hardware: Z80 main CPU, three tile layers (8×8 text, two 16×16 scrolling
/// playfields), 8-64px sprites, 1024-color xBGR444 palette RAM.
/// The sound board (second Z80 + FM) is not modeled.
///
/// The CPU core is external: it is handed in at construction and drives
/// [`RygarBoard`] through the pin-bus callback.
pub struct RygarSystem {
    cpu: Box<dyn Cpu>,
    board: RygarBoard,
}

/// Everything on the main board except the CPU: memory, the address
/// decoder, video hardware, input latches and the vsync/vblank counters.
pub struct RygarBoard {
    // Memory
    program_rom: [u8; 0xC000], // 0x0000-0xBFFF
    banked_rom: [u8; 0x8000],  // 2KB window at 0xF000-0xF7FF
    work_ram: [u8; 0x1000],    // 0xC000-0xCFFF
    char_ram: [u8; 0x0800],    // 0xD000-0xD7FF: text layer, two 0x400 planes
    fg_ram: [u8; 0x0400],      // 0xD800-0xDBFF: foreground, two 0x200 planes
    bg_ram: [u8; 0x0400],      // 0xDC00-0xDFFF: background, two 0x200 planes
    sprite_ram: [u8; 0x0800],  // 0xE000-0xE7FF: 256 8-byte descriptors
    palette_ram: [u8; 0x0800], // 0xE800-0xEFFF

    // Decoded tile catalogs (built once at ROM load, immutable after)
    char_gfx: GfxSet,
    fg_gfx: GfxSet,
    bg_gfx: GfxSet,
    sprite_gfx: GfxSet,

    // Video state
    palette: PaletteCache,
    char_tilemap: Tilemap,
    fg_tilemap: Tilemap,
    bg_tilemap: Tilemap,
    bitmap: IndexedBitmap, // 256×256 indexed composite

    // Latches
    fg_scroll: [u8; 3],
    bg_scroll: [u8; 3],
    current_bank: u8,

    // I/O state (active-high: 0x00 = all released)
    joystick: u8,
    buttons: u8,
    sys: u8,

    // Timing
    vsync_count: i32,
    vblank_count: i32,
}

impl RygarSystem {
    pub fn new(cpu: Box<dyn Cpu>) -> Self {
        Self {
            cpu,
            board: RygarBoard::new(),
        }
    }

    /// Load and decode all ROM regions.
    pub fn load_rom_set(&mut self, rom_set: &RomSet) -> Result<(), RomLoadError> {
        self.board.load_rom_set(rom_set)
    }

    pub fn board(&self) -> &RygarBoard {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut RygarBoard {
        &mut self.board
    }
}

impl Default for RygarBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl RygarBoard {
    pub fn new() -> Self {
        let mut board = Self {
            program_rom: [0; 0xC000],
            banked_rom: [0; 0x8000],
            work_ram: [0; 0x1000],
            char_ram: [0; 0x0800],
            fg_ram: [0; 0x0400],
            bg_ram: [0; 0x0400],
            sprite_ram: [0; 0x0800],
            palette_ram: [0; 0x0800],
            char_gfx: GfxSet::blank(8, 8, 1024),
            fg_gfx: GfxSet::blank(16, 16, 1024),
            bg_gfx: GfxSet::blank(16, 16, 1024),
            sprite_gfx: GfxSet::blank(8, 8, 4096),
            palette: PaletteCache::new(1024),
            char_tilemap: Tilemap::new(32, 32, 8, 8),
            fg_tilemap: Tilemap::new(32, 16, 16, 16),
            bg_tilemap: Tilemap::new(32, 16, 16, 16),
            bitmap: IndexedBitmap::new(NATIVE_SIZE, NATIVE_SIZE),
            fg_scroll: [0; 3],
            bg_scroll: [0; 3],
            current_bank: 0,
            joystick: 0,
            buttons: 0,
            sys: 0,
            vsync_count: VSYNC_PERIOD,
            vblank_count: 0,
        };
        board.fg_tilemap.set_scroll_x(scroll_x(&board.fg_scroll));
        board.bg_tilemap.set_scroll_x(scroll_x(&board.bg_scroll));
        board
    }

    /// Load all ROM regions and decode the tile catalogs.
    pub fn load_rom_set(&mut self, rom_set: &RomSet) -> Result<(), RomLoadError> {
        let program = RYGAR_PROGRAM_ROM.load(rom_set)?;
        self.program_rom.copy_from_slice(&program);

        let banked = RYGAR_BANK_ROM.load(rom_set)?;
        self.banked_rom.copy_from_slice(&banked);

        let chars = RYGAR_CHAR_ROM.load(rom_set)?;
        self.char_gfx = gfx::decode(&PACKED_8X8, &chars, 1024);

        let fg = RYGAR_FG_ROM.load(rom_set)?;
        self.fg_gfx = gfx::decode(&PACKED_16X16, &fg, 1024);

        let bg = RYGAR_BG_ROM.load(rom_set)?;
        self.bg_gfx = gfx::decode(&PACKED_16X16, &bg, 1024);

        let sprites = RYGAR_SPRITE_ROM.load(rom_set)?;
        self.sprite_gfx = gfx::decode(&PACKED_8X8, &sprites, 4096);

        self.char_tilemap.mark_all_dirty();
        self.fg_tilemap.mark_all_dirty();
        self.bg_tilemap.mark_all_dirty();

        info!("rygar ROM set loaded and tile catalogs decoded");
        Ok(())
    }

    pub fn char_tilemap(&self) -> &Tilemap {
        &self.char_tilemap
    }

    pub fn fg_tilemap(&self) -> &Tilemap {
        &self.fg_tilemap
    }

    pub fn bg_tilemap(&self) -> &Tilemap {
        &self.bg_tilemap
    }

    pub fn palette(&self) -> &PaletteCache {
        &self.palette
    }

    pub fn current_bank(&self) -> u8 {
        self.current_bank
    }

    fn mem_read(&self, addr: u16) -> u8 {
        match addr {
            // Program ROM
            0x0000..=0xBFFF => self.program_rom[addr as usize],

            // Work RAM
            0xC000..=0xCFFF => self.work_ram[(addr - 0xC000) as usize],

            // Tile RAM
            0xD000..=0xD7FF => self.char_ram[(addr - 0xD000) as usize],
            0xD800..=0xDBFF => self.fg_ram[(addr - 0xD800) as usize],
            0xDC00..=0xDFFF => self.bg_ram[(addr - 0xDC00) as usize],

            // Sprite and palette RAM
            0xE000..=0xE7FF => self.sprite_ram[(addr - 0xE000) as usize],
            0xE800..=0xEFFF => self.palette_ram[(addr - 0xE800) as usize],

            // Banked ROM window
            0xF000..=0xF7FF => {
                self.banked_rom[(addr - 0xF000) as usize + self.current_bank as usize * 0x800]
            }

            // Input ports
            0xF800 => self.joystick,
            0xF801 => self.buttons,
            0xF804 => self.sys,

            // DIP SW2 high nibble; the game reads nothing else of the four
            // DIP halves, so the rest fall through to the bus pull-down.
            0xF807 => 0x08,

            _ => 0x00,
        }
    }

    fn mem_write(&mut self, addr: u16, data: u8) {
        match addr {
            // Work RAM
            0xC000..=0xCFFF => self.work_ram[(addr - 0xC000) as usize] = data,

            // Tile RAM: both planes of a cell share one dirty bit.
            0xD000..=0xD7FF => {
                self.char_ram[(addr - 0xD000) as usize] = data;
                self.char_tilemap.mark_tile_dirty((addr - 0xD000) as usize & 0x3FF);
            }
            0xD800..=0xDBFF => {
                self.fg_ram[(addr - 0xD800) as usize] = data;
                self.fg_tilemap.mark_tile_dirty((addr - 0xD800) as usize & 0x1FF);
            }
            0xDC00..=0xDFFF => {
                self.bg_ram[(addr - 0xDC00) as usize] = data;
                self.bg_tilemap.mark_tile_dirty((addr - 0xDC00) as usize & 0x1FF);
            }

            0xE000..=0xE7FF => self.sprite_ram[(addr - 0xE000) as usize] = data,

            // Palette RAM writes flow through to the RGBA cache.
            0xE800..=0xEFFF => {
                let offset = (addr - 0xE800) as usize;
                self.palette_ram[offset] = data;
                self.palette.write(offset, data);
            }

            // Scroll latches
            0xF800..=0xF802 => {
                self.fg_scroll[(addr - 0xF800) as usize] = data;
                self.fg_tilemap.set_scroll_x(scroll_x(&self.fg_scroll));
            }
            0xF803..=0xF805 => {
                self.bg_scroll[(addr - 0xF803) as usize] = data;
                self.bg_tilemap.set_scroll_x(scroll_x(&self.bg_scroll));
            }

            // Bank switch: only data bits 3-6 reach the latch, so banks
            // past 15 are unreachable.
            0xF808 => self.current_bank = (data & 0x78) >> 3,

            // 0xF806 is the sound latch and 0xF807 the flip-screen latch;
            // neither is modeled. ROM and unmapped writes are ignored.
            _ => {}
        }
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        match button {
            INPUT_P1_LEFT => set_bit(&mut self.joystick, 0, pressed),
            INPUT_P1_RIGHT => set_bit(&mut self.joystick, 1, pressed),
            INPUT_P1_DOWN => set_bit(&mut self.joystick, 2, pressed),
            INPUT_P1_UP => set_bit(&mut self.joystick, 3, pressed),
            INPUT_P1_ATTACK => set_bit(&mut self.buttons, 0, pressed),
            INPUT_P1_JUMP => set_bit(&mut self.buttons, 1, pressed),
            INPUT_P1_START => set_bit(&mut self.sys, 1, pressed),
            INPUT_COIN => set_bit(&mut self.sys, 2, pressed),
            _ => {}
        }
    }

    fn reset(&mut self) {
        self.work_ram = [0; 0x1000];
        self.char_ram = [0; 0x0800];
        self.fg_ram = [0; 0x0400];
        self.bg_ram = [0; 0x0400];
        self.sprite_ram = [0; 0x0800];
        self.palette_ram = [0; 0x0800];
        self.palette = PaletteCache::new(1024);
        self.fg_scroll = [0; 3];
        self.bg_scroll = [0; 3];
        self.current_bank = 0;
        self.joystick = 0;
        self.buttons = 0;
        self.sys = 0;
        self.vsync_count = VSYNC_PERIOD;
        self.vblank_count = 0;
        self.char_tilemap.mark_all_dirty();
        self.fg_tilemap.mark_all_dirty();
        self.fg_tilemap.set_scroll_x(scroll_x(&self.fg_scroll));
        self.bg_tilemap.mark_all_dirty();
        self.bg_tilemap.set_scroll_x(scroll_x(&self.bg_scroll));
        // ROMs and decoded tile catalogs survive a reset.
    }

    /// Compose one frame: backdrop, bg, fg, char, sprites, then resolve the
    /// visible 256×224 window through the palette into RGBA8888.
    ///
    /// The buffer must hold at least `256 * 224 * 4` bytes.
    pub fn render(&mut self, buffer: &mut [u8]) {
        buffer.fill(0);
        self.bitmap.fill(CHAR_PALETTE_BASE, BACKDROP_LAYER);

        let bg_ram = &self.bg_ram;
        self.bg_tilemap.draw(
            &mut self.bitmap,
            &self.bg_gfx,
            BG_PALETTE_BASE,
            BG_LAYER,
            |idx| {
                let lo = bg_ram[idx];
                let hi = bg_ram[idx + 0x200];
                TileInfo {
                    code: (hi as u16 & 0x07) << 8 | lo as u16,
                    color: hi >> 4,
                }
            },
        );

        let fg_ram = &self.fg_ram;
        self.fg_tilemap.draw(
            &mut self.bitmap,
            &self.fg_gfx,
            FG_PALETTE_BASE,
            FG_LAYER,
            |idx| {
                let lo = fg_ram[idx];
                let hi = fg_ram[idx + 0x200];
                TileInfo {
                    code: (hi as u16 & 0x07) << 8 | lo as u16,
                    color: hi >> 4,
                }
            },
        );

        let char_ram = &self.char_ram;
        self.char_tilemap.draw(
            &mut self.bitmap,
            &self.char_gfx,
            CHAR_PALETTE_BASE,
            CHAR_LAYER,
            |idx| {
                let lo = char_ram[idx];
                let hi = char_ram[idx + 0x400];
                TileInfo {
                    code: (hi as u16 & 0x03) << 8 | lo as u16,
                    color: hi >> 4,
                }
            },
        );

        self.draw_sprites();

        for y in 0..SCREEN_HEIGHT as usize {
            for x in 0..SCREEN_WIDTH as usize {
                let index = self.bitmap.index_at(x, y + VBLANK_END);
                let color = self.palette.color(index as usize);
                let offset = (y * SCREEN_WIDTH as usize + x) * 4;
                buffer[offset] = color as u8;
                buffer[offset + 1] = (color >> 8) as u8;
                buffer[offset + 2] = (color >> 16) as u8;
                buffer[offset + 3] = (color >> 24) as u8;
            }
        }
    }

    /// Rasterize all enabled sprites, in descriptor order.
    ///
    /// Descriptor layout (8 bytes, last two unused):
    ///   byte 0: bit 0 flip-x, bit 1 flip-y, bit 2 enable, bits 3-7 code high
    ///   byte 1: code low
    ///   byte 2: bits 0-1 log2 size in tiles (8/16/32/64 px square)
    ///   byte 3: bits 0-3 color, bit 4 x sign, bit 5 y sign, bits 6-7 depth tag
    ///   byte 4: y low
    ///   byte 5: x low
    fn draw_sprites(&mut self) {
        for offs in (0..self.sprite_ram.len()).step_by(8) {
            let bank = self.sprite_ram[offs];
            if bank & 0x04 == 0 {
                continue;
            }

            let flags = self.sprite_ram[offs + 3];
            let size = 1usize << (self.sprite_ram[offs + 2] & 0x03); // tiles per side
            let mut code = self.sprite_ram[offs + 1] as u16 | (bank as u16 & 0xF8) << 5;
            code &= !(size * size - 1) as u16; // align to the tile count consumed
            let color = flags & 0x0F;
            let depth = flags >> 6;
            let flip_x = bank & 0x01 != 0;
            let flip_y = bank & 0x02 != 0;
            let x = self.sprite_ram[offs + 5] as i32 - ((flags as i32 & 0x10) << 4);
            let y = self.sprite_ram[offs + 4] as i32 - ((flags as i32 & 0x20) << 3);

            for ty in 0..size {
                for tx in 0..size {
                    let tile = code + SPRITE_TILE_ORDER[ty][tx];
                    let col = if flip_x { size - 1 - tx } else { tx };
                    let row = if flip_y { size - 1 - ty } else { ty };
                    let sx = x + 8 * col as i32;
                    let sy = y + 8 * row as i32;
                    self.draw_sprite_tile(tile, color, depth, sx, sy, flip_x, flip_y);
                }
            }
        }
    }

    /// Draw one 8×8 sprite tile at (sx, sy). Pen 0 is transparent; a pixel
    /// is written only over strictly deeper layers, so earlier sprites are
    /// never covered by later ones at the same or a deeper tag.
    fn draw_sprite_tile(
        &mut self,
        code: u16,
        color: u8,
        depth: u8,
        sx: i32,
        sy: i32,
        flip_x: bool,
        flip_y: bool,
    ) {
        let tile = self.sprite_gfx.tile(code as usize);
        for py in 0..8usize {
            let dy = sy + py as i32;
            if dy < 0 || dy >= NATIVE_SIZE as i32 {
                continue;
            }
            let src_y = if flip_y { 7 - py } else { py };
            for px in 0..8usize {
                let dx = sx + px as i32;
                if dx < 0 || dx >= NATIVE_SIZE as i32 {
                    continue;
                }
                let src_x = if flip_x { 7 - px } else { px };
                let pen = tile[src_y * 8 + src_x];
                if pen == 0 {
                    continue;
                }
                let (dx, dy) = (dx as usize, dy as usize);
                if self.bitmap.layer_at(dx, dy) > depth {
                    self.bitmap.put(
                        dx,
                        dy,
                        SPRITE_PALETTE_BASE | (color as u16) << 4 | pen as u16,
                        depth,
                    );
                }
            }
        }
    }
}

impl Bus for RygarBoard {
    /// The address decoder and timing driver, invoked once per CPU bus
    /// cycle. Drives INT during the vblank window, routes memory
    /// transactions, and services interrupt acknowledge.
    fn tick(&mut self, ticks: u32, pins: Pins) -> Pins {
        let mut pins = pins;

        // Vertical counters run on every cycle, before address decode.
        self.vsync_count -= ticks as i32;
        if self.vsync_count <= 0 {
            self.vsync_count += VSYNC_PERIOD;
            self.vblank_count = VBLANK_DURATION;
        }
        if self.vblank_count > 0 {
            self.vblank_count = (self.vblank_count - ticks as i32).max(0);
            pins.set_int(true);
        }

        if pins.is_mem_read() {
            pins.data = self.mem_read(pins.addr);
        } else if pins.is_mem_write() {
            self.mem_write(pins.addr, pins.data);
        } else if pins.is_int_ack() {
            // Acknowledge drops the line for the rest of this blanking
            // interval; it returns at the next vsync reload.
            pins.set_int(false);
            self.vblank_count = 0;
        }

        pins
    }
}

impl Machine for RygarSystem {
    fn display_size(&self) -> (u32, u32) {
        (SCREEN_WIDTH, SCREEN_HEIGHT)
    }

    fn display_aspect(&self) -> (u32, u32) {
        (4, 3)
    }

    fn frame_rate_hz(&self) -> f64 {
        CPU_CLOCK_HZ as f64 / TICKS_PER_FRAME as f64
    }

    fn run(&mut self, delta_ticks: u64) -> u64 {
        let mut executed = 0;
        while executed < delta_ticks {
            let ran = self.cpu.exec(&mut self.board, delta_ticks - executed);
            if ran == 0 {
                break; // a core that cannot advance must not spin us forever
            }
            executed += ran;
        }
        executed
    }

    fn run_frame(&mut self) {
        self.run(TICKS_PER_FRAME);
    }

    fn render_frame(&mut self, buffer: &mut [u8]) {
        self.board.render(buffer);
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        self.board.set_input(button, pressed);
    }

    fn input_map(&self) -> &[InputButton] {
        RYGAR_INPUT_MAP
    }

    fn reset(&mut self) {
        self.cpu.reset();
        self.board.reset();
    }
}

/// Effective horizontal scroll of a layer: 16-bit latch plus the board's
/// fixed 48-pixel offset. The third latch byte exists but the game never
/// scrolls vertically.
fn scroll_x(latch: &[u8; 3]) -> u16 {
    ((latch[1] as u16) << 8 | latch[0] as u16).wrapping_add(48)
}

/// Active-high bit manipulation: set bit on press, clear on release.
fn set_bit(reg: &mut u8, bit: u8, pressed: bool) {
    if pressed {
        *reg |= 1 << bit;
    } else {
        *reg &= !(1 << bit);
    }
}
