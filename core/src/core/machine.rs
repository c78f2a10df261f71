/// Describes a single input button that a machine accepts.
pub struct InputButton {
    /// Machine-defined button identifier, passed to `set_input()`.
    pub id: u8,
    /// Human-readable name for display/configuration (e.g., "P1 Left", "Coin").
    pub name: &'static str,
}

/// Machine-agnostic interface for emulated systems.
///
/// Each machine implements this trait to provide a uniform surface for the
/// host layer. The host is a pure clock/window/input shim that does not know
/// about specific hardware (address maps, tilemaps, palette formats, etc.).
pub trait Machine {
    /// Native display resolution as (width, height) in pixels.
    fn display_size(&self) -> (u32, u32);

    /// Display aspect ratio as (horizontal, vertical). Arcade monitors often
    /// stretch the native pixel grid; defaults to the native resolution.
    fn display_aspect(&self) -> (u32, u32) {
        self.display_size()
    }

    /// Nominal frame rate derived from the board's clock chain.
    fn frame_rate_hz(&self) -> f64;

    /// Advance the emulation by at least `delta_ticks` clock periods.
    ///
    /// The CPU core runs whole instructions, so the machine may overshoot;
    /// the actual tick count is returned and the host clock accounts for
    /// the difference on the next call. A zero delta executes nothing.
    fn run(&mut self, delta_ticks: u64) -> u64;

    /// Run one frame's worth of clock ticks.
    fn run_frame(&mut self);

    /// Render the current video state into an RGBA8888 pixel buffer.
    ///
    /// The buffer must be at least `width * height * 4` bytes (from
    /// `display_size()`). Pixels are stored left-to-right, top-to-bottom,
    /// 4 bytes per pixel (R, G, B, A). Takes `&mut self` because layers may
    /// lazily re-rasterize cached tiles during the draw.
    fn render_frame(&mut self, buffer: &mut [u8]);

    /// Handle an input event. `button` is a machine-defined ID from
    /// `input_map()`. `pressed` is true for key-down, false for key-up.
    ///
    /// Called per-event, not per-frame. Each call latches the button state
    /// so that `run_frame()` sees the accumulated input.
    fn set_input(&mut self, button: u8, pressed: bool);

    /// Get the list of input buttons this machine accepts.
    fn input_map(&self) -> &[InputButton];

    /// Reset the machine to its initial power-on state.
    fn reset(&mut self);
}
