//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │                                           │
//! │  canvas: background, skeleton overlays,   │
//! │  dust particles, flashing caption         │
//! │                                           │
//! ├───────────────────────────────────────────┤
//! │  status bar                               │
//! │  key legend                               │
//! └───────────────────────────────────────────┘
//! ```
//!
//! The canvas area paints the controller's draw list verbatim; the bar
//! below it belongs to the viewer.

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, Window, WindowOptions};
use snap_dust::render::Stroke;
use snap_dust::{CanvasSize, DrawCommand, Mode, Rgba, Vec2};

use crate::source::{SimInput, SimKey};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

const STATUS_H:      usize = 40;
const BG_COLOR:      u32   = 0xFF1A1A2E;
const FLOOR_COLOR:   u32   = 0xFF222238;
const TEXT_BG:       u32   = 0xFF0F3460;
const MODE_TRACKING: u32   = 0xFF00B5FF;
const MODE_DUST:     u32   = 0xFFC8A060;
/// Pixels per font cell for canvas text; glyphs are 3×5 cells.
const TEXT_CELL_DIV: f32   = 10.0;
const LEGEND: &str =
    "S=snap  O=orient  H=hand  B=body  <-/->=move  Space=dust  R=reset  Q=quit";

// ════════════════════════════════════════════════════════════════════════════
// Framebuffer
// ════════════════════════════════════════════════════════════════════════════

/// ARGB pixel buffer plus the raster primitives the draw list needs.
pub struct Framebuffer {
    w:   usize,
    h:   usize,
    buf: Vec<u32>,
}

impl Framebuffer {
    pub fn new(w: usize, h: usize) -> Self {
        Framebuffer { w, h, buf: vec![BG_COLOR; w * h] }
    }

    pub fn pixels(&self) -> &[u32] { &self.buf }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.w && y < self.h).then(|| self.buf[y * self.w + x])
    }

    /// Paint one command, clipped to the top `clip_h` rows.
    pub fn paint(&mut self, cmd: &DrawCommand, clip_h: usize) {
        match cmd {
            DrawCommand::Background => self.background(clip_h),
            DrawCommand::Line { from, to, color, width } => {
                self.thick_line(*from, *to, *width, *color, clip_h)
            }
            DrawCommand::Circle { center, radius, color } => {
                self.fill_circle(*center, *radius, *color, clip_h)
            }
            DrawCommand::Text { text, center, size, fill, strokes } => {
                self.big_text(text, *center, *size, *fill, strokes, clip_h)
            }
        }
    }

    /// Stand-in for the camera frame: a dark room with a floor.
    fn background(&mut self, clip_h: usize) {
        let floor = clip_h * 5 / 6;
        for row in 0..clip_h.min(self.h) {
            let color = if row >= floor { FLOOR_COLOR } else { BG_COLOR };
            self.buf[row * self.w..(row + 1) * self.w].fill(color);
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.h) {
            for col in x..(x + w).min(self.w) {
                self.buf[row * self.w + col] = color;
            }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.w && y < self.h {
            self.buf[y * self.w + x] = color;
        }
    }

    fn blend_pixel(&mut self, x: isize, y: isize, color: Rgba, clip_h: usize) {
        if x < 0 || y < 0 || x as usize >= self.w || y as usize >= clip_h.min(self.h) {
            return;
        }
        let i = y as usize * self.w + x as usize;
        let src = 0xFF000000 | (color.to_argb() & 0x00FFFFFF);
        self.buf[i] = blend(self.buf[i], src, color.a);
    }

    fn fill_circle(&mut self, c: Vec2, r: f32, color: Rgba, clip_h: usize) {
        let r = r.max(0.5);
        let (x0, x1) = ((c.x - r).floor() as isize, (c.x + r).ceil() as isize);
        let (y0, y1) = ((c.y - r).floor() as isize, (c.y + r).ceil() as isize);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - c.x;
                let dy = y as f32 + 0.5 - c.y;
                if dx * dx + dy * dy <= r * r {
                    self.blend_pixel(x, y, color, clip_h);
                }
            }
        }
    }

    /// Line of the given width, stamped as a row of discs.
    fn thick_line(&mut self, a: Vec2, b: Vec2, width: f32, color: Rgba, clip_h: usize) {
        let steps = (b - a).length().ceil().max(1.0) as usize;
        let r = width / 2.0;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.fill_circle(a + (b - a) * t, r, color, clip_h);
        }
    }

    /// Scaled bitmap text centered on `center`: every stroke pass first,
    /// widest first, then the fill.
    fn big_text(&mut self, text: &str, center: Vec2, size: f32, fill: Rgba, strokes: &[Stroke], clip_h: usize) {
        let cell = (size / TEXT_CELL_DIV).max(1.0);
        let n = text.chars().count() as f32;
        let width = (n * 4.0 - 1.0).max(0.0) * cell;
        let left = center.x - width / 2.0;
        let top = center.y - 2.5 * cell;

        let mut passes: Vec<(Rgba, f32)> = strokes.iter().map(|s| (s.color, s.width / 2.0)).collect();
        passes.sort_by(|a, b| b.1.total_cmp(&a.1));
        passes.push((fill, 0.0));

        for (color, grow) in passes {
            for (i, ch) in text.chars().enumerate() {
                let gx = left + i as f32 * 4.0 * cell;
                for (col, row) in glyph_cells(ch) {
                    let x = gx + col as f32 * cell - grow;
                    let y = top + row as f32 * cell - grow;
                    let side = cell + 2.0 * grow;
                    for py in y.floor() as isize..(y + side).ceil() as isize {
                        for px in x.floor() as isize..(x + side).ceil() as isize {
                            self.blend_pixel(px, py, color, clip_h);
                        }
                    }
                }
            }
        }
    }

    /// One-pixel status text; stops at the right edge.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        for (i, ch) in text.chars().enumerate() {
            let cx = x + i * 4;
            if cx + 4 > self.w { break; }
            for (col, row) in glyph_cells(ch) {
                self.set_pixel(cx + col, y + row, color);
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:   Window,
    fb:       Framebuffer,
    canvas_h: usize,
    sim_tx:   Sender<SimInput>,
}

impl Visualizer {
    pub fn new(canvas: CanvasSize, fps: u32, sim_tx: Sender<SimInput>) -> Result<Self, String> {
        let (w, canvas_h) = (canvas.width as usize, canvas.height as usize);
        let mut window = Window::new(
            "Snap Dust — finger-snap disintegration",
            w, canvas_h + STATUS_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| e.to_string())?;

        let frame_ms = 1000 / u64::from(fps.max(1));
        window.limit_update_rate(Some(std::time::Duration::from_millis(frame_ms)));

        Ok(Visualizer {
            window,
            fb: Framebuffer::new(w, canvas_h + STATUS_H),
            canvas_h,
            sim_tx,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard inputs and translate to SimInput events.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        // Keys that trigger on first press only
        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        // Keys that repeat while held
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::Quit));
            return false;
        }

        let mut keys = Vec::new();
        for (key, sim) in [
            (Key::Space, SimKey::Trigger),
            (Key::R,     SimKey::Reset),
            (Key::S,     SimKey::Snap),
            (Key::O,     SimKey::Orientation),
            (Key::H,     SimKey::ToggleHand),
            (Key::B,     SimKey::ToggleBody),
        ] {
            if one_shot(key) { keys.push(sim); }
        }
        if held(Key::Left)  { keys.push(SimKey::MoveLeft); }
        if held(Key::Right) { keys.push(SimKey::MoveRight); }

        for key in keys {
            let _ = self.sim_tx.send(SimInput::KeyDown(key));
        }
        true
    }

    /// Render one frame.
    pub fn render(&mut self, commands: &[DrawCommand], status: &str, mode: Mode) {
        for cmd in commands {
            self.fb.paint(cmd, self.canvas_h);
        }

        // ── Status bar ────────────────────────────────────────────────────
        let (w, y) = (self.fb.w, self.canvas_h);
        self.fb.fill_rect(0, y, w, STATUS_H, TEXT_BG);
        let (badge, badge_color) = match mode {
            Mode::Tracking       => ("TRACKING", MODE_TRACKING),
            Mode::Disintegrating => ("DUST", MODE_DUST),
        };
        self.fb.draw_label(badge, 10, y + 8, badge_color);
        self.fb.draw_label(status, 50, y + 8, 0xFFEEEEEE);

        // ── Key legend ────────────────────────────────────────────────────
        self.fb.draw_label(LEGEND, 10, y + STATUS_H - 14, 0xFF888888);

        self.window.update_with_buffer(self.fb.pixels(), self.fb.w, self.fb.h).ok();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

/// Rows top to bottom, bit 2 is the left column.  Letters are keyed upper-case.
const GLYPHS: &[(char, [u8; 5])] = &[
    ('0', [7, 5, 5, 5, 7]), ('1', [2, 6, 2, 2, 7]), ('2', [7, 1, 7, 4, 7]),
    ('3', [7, 1, 7, 1, 7]), ('4', [5, 5, 7, 1, 1]), ('5', [7, 4, 7, 1, 7]),
    ('6', [7, 4, 7, 5, 7]), ('7', [7, 1, 1, 1, 1]), ('8', [7, 5, 7, 5, 7]),
    ('9', [7, 5, 7, 1, 7]),
    ('A', [7, 5, 7, 5, 5]), ('B', [6, 5, 6, 5, 6]), ('C', [7, 4, 4, 4, 7]),
    ('D', [6, 5, 5, 5, 6]), ('E', [7, 4, 7, 4, 7]), ('F', [7, 4, 7, 4, 4]),
    ('G', [7, 4, 5, 5, 7]), ('H', [5, 5, 7, 5, 5]), ('I', [7, 2, 2, 2, 7]),
    ('J', [1, 1, 1, 5, 7]), ('K', [5, 5, 6, 5, 5]), ('L', [4, 4, 4, 4, 7]),
    ('M', [5, 7, 5, 5, 5]), ('N', [7, 5, 5, 5, 5]), ('O', [7, 5, 5, 5, 7]),
    ('P', [7, 5, 7, 4, 4]), ('Q', [7, 5, 5, 7, 1]), ('R', [6, 5, 6, 5, 5]),
    ('S', [7, 4, 7, 1, 7]), ('T', [7, 2, 2, 2, 2]), ('U', [5, 5, 5, 5, 7]),
    ('V', [5, 5, 5, 2, 2]), ('W', [5, 5, 5, 7, 5]), ('X', [5, 5, 2, 5, 5]),
    ('Y', [5, 5, 7, 2, 2]), ('Z', [7, 1, 2, 4, 7]),
    ('.', [0, 0, 0, 0, 2]), (',', [0, 0, 0, 2, 4]), (':', [0, 2, 0, 2, 0]),
    ('!', [2, 2, 2, 0, 2]), ('-', [0, 0, 7, 0, 0]), ('+', [0, 2, 7, 2, 0]),
    ('=', [0, 7, 0, 7, 0]), ('/', [1, 1, 2, 4, 4]), ('(', [1, 2, 2, 2, 1]),
    (')', [4, 2, 2, 2, 4]), ('<', [1, 2, 4, 2, 1]), ('>', [4, 2, 1, 2, 4]),
    (' ', [0, 0, 0, 0, 0]),
];

const MISSING_GLYPH: [u8; 5] = [0, 0, 2, 0, 0];

fn char_glyph(c: char) -> [u8; 5] {
    let key = c.to_ascii_uppercase();
    GLYPHS.iter()
        .find(|(k, _)| *k == key)
        .map_or(MISSING_GLYPH, |&(_, rows)| rows)
}

/// Lit `(col, row)` cells of one character.
fn glyph_cells(c: char) -> impl Iterator<Item = (usize, usize)> {
    let rows = char_glyph(c);
    (0..5usize).flat_map(move |row| {
        (0..3usize).filter(move |col| rows[row] & (4 >> col) != 0).map(move |col| (col, row))
    })
}

/// Mix two ARGB colors; `t = 0` keeps `a`, `t = 1` gives `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    [16u32, 8, 0].iter().fold(0xFF00_0000, |out, &shift| {
        let (ca, cb) = (((a >> shift) & 0xFF) as f32, ((b >> shift) & 0xFF) as f32);
        out | (((ca + (cb - ca) * t).round() as u32) << shift)
    })
}
