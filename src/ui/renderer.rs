/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The cube is drawn as an unfolded net:
///
/// ```text
///         U
///     L   F   R   B
///         D
/// ```
///
/// Each sticker is two terminal columns wide and one row high.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::face::{Face, StickerColor};
use crate::domain::inspect;
use crate::sim::world::WorldState;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the gap
    /// between rows matches the cell color on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: Self::norm_bg(bg) }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }
}

// ── Layout ──

/// Terminal columns per sticker.
const CELL_W: usize = 2;
/// One face block: three stickers plus a one-column gap.
const FACE_W: usize = 3 * CELL_W + 1;
const FACE_H: usize = 4;

const HUD_ROW: usize = 0;
const QUEUE_ROW: usize = 1;
/// Queued moves listed under the HUD.
const QUEUE_PREVIEW: usize = 12;
const NET_ROW: usize = 2;
const NET_COL: usize = 2;
const MSG_ROW: usize = NET_ROW + 3 * FACE_H + 1;
const PROMPT_ROW: usize = MSG_ROW + 1;
const HELP_ROW: usize = PROMPT_ROW + 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

/// Position of each face block in the net, in face units.
const NET: [(Face, usize, usize); 6] = [
    (Face::Top, 1, 0),
    (Face::Left, 0, 1),
    (Face::Front, 1, 1),
    (Face::Right, 2, 1),
    (Face::Back, 3, 1),
    (Face::Bottom, 1, 2),
];

fn sticker_color(c: StickerColor) -> Color {
    match c {
        StickerColor::Orange => Color::Rgb { r: 255, g: 140, b: 0 },
        StickerColor::Red => Color::Rgb { r: 200, g: 30, b: 30 },
        StickerColor::White => Color::Rgb { r: 235, g: 235, b: 235 },
        StickerColor::Yellow => Color::Rgb { r: 240, g: 220, b: 40 },
        StickerColor::Blue => Color::Rgb { r: 30, g: 80, b: 220 },
        StickerColor::Green => Color::Rgb { r: 30, g: 170, b: 60 },
        StickerColor::Gray => Color::Rgb { r: 90, g: 90, b: 90 },
    }
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Repaint everything on the next frame.
    pub fn invalidate(&mut self) {
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, world: &WorldState, now_ms: u64) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.invalidate();
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.compose(world, now_ms);

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors, not ResetColor: the terminal default may
        // differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, w: &WorldState, now_ms: u64) {
        self.front.clear();
        self.compose_hud(w, now_ms);
        self.compose_net(w);

        if !w.message.is_empty() {
            self.front.fill_row(MSG_ROW, MSG_BG);
            self.front.put_str(0, MSG_ROW, &format!(" ◈ {} ", w.message), Color::Black, MSG_BG);
        }

        if let Some(text) = &w.prompt {
            let line = format!(" moves> {text}_");
            self.front.put_str(0, PROMPT_ROW, &line, Color::Rgb { r: 100, g: 200, b: 255 }, Color::Reset);
        }

        let help = " r/R l/L u/U d/D f/F b/B: turn (shift = ')  Space: scramble  z: undo  Tab: routine  Enter: moves  Esc: stop  BkSp: reset  ?: inspect  q: quit";
        self.front.put_str(0, HELP_ROW, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_hud(&mut self, w: &WorldState, now_ms: u64) {
        let turn = match w.animator.current() {
            Some(t) if w.is_animating() => {
                format!("{:<3}{:>3}%", t.mv.to_string(), (t.progress(now_ms) * 100.0) as u32)
            }
            _ => String::from("-"),
        };
        let solved = match w.is_solved() {
            Ok(true) => "SOLVED",
            Ok(false) => "scrambled",
            Err(_) => "??",
        };
        let status = if w.scheduler.fault().is_some() {
            "FAULT: reset required"
        } else if w.scheduler.stop_requested() {
            "stopping"
        } else if w.detector.is_armed() {
            "batch running"
        } else {
            ""
        };

        let hud = format!(
            " CUBE  {:<9}  turn:{:<8}  queued:{:<3}  settled:{:<5}  {:?}  {} ",
            solved, turn, w.scheduler.len(), w.moves_settled, w.animator.phase(), status,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        let next: Vec<String> = w.scheduler.pending().take(QUEUE_PREVIEW).map(|m| m.to_string()).collect();
        if !next.is_empty() {
            let more = if w.scheduler.len() > QUEUE_PREVIEW { " ..." } else { "" };
            let line = format!(" next: {}{more}", next.join(" "));
            self.front.put_str(0, QUEUE_ROW, &line, Color::Grey, Color::Reset);
        }
    }

    fn compose_net(&mut self, w: &WorldState) {
        let turning = w.animator.current().map(|t| t.mv.face);

        for (face, fx, fy) in NET {
            let grid = inspect::face_grid(&w.lattice, face);
            let col0 = NET_COL + fx * FACE_W;
            let row0 = NET_ROW + fy * FACE_H;

            for (r, row) in grid.iter().enumerate() {
                for (c, &color) in row.iter().enumerate() {
                    let bg = sticker_color(color);
                    let col = col0 + c * CELL_W;
                    self.front.set(col, row0 + r, Cell::from_char(' ', Color::White, bg));
                    self.front.set(col + 1, row0 + r, Cell::from_char(' ', Color::White, bg));
                }
            }

            // Face letter in the gap below the block, highlighted while turning.
            let label_fg = if turning == Some(face) { Color::Rgb { r: 255, g: 220, b: 50 } } else { Color::DarkGrey };
            self.front.put_str(col0 + 3 * CELL_W, row0 + 3, &face.letter().to_string(), label_fg, Color::Reset);
        }
    }
}
