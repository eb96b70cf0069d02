/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The level lives in pixel space; one terminal cell covers
/// `PX_PER_COL` x `PX_PER_ROW` pixels. The camera follows the hero
/// horizontally and is clamped to the level edges.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use stickrun::domain::entity::{Entity, EntityKind, Layer};
use stickrun::sim::controller::GameController;
use stickrun::sim::state::GameState;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// gaps between rows match the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
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
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
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

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }
}

// ── Geometry ──

const PX_PER_COL: f64 = 8.0;
const PX_PER_ROW: f64 = 16.0;

/// Vertical layout
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const SKY_BG: Color = Color::Rgb { r: 30, g: 40, b: 70 };
const GROUND_BG: Color = Color::Rgb { r: 60, g: 45, b: 30 };

/// Left edge of the camera in level pixels: hero a third of the way in,
/// never showing past either level edge.
fn camera_left(hero_x: f64, level_width: f64, view_px: f64) -> f64 {
    let max_left = (level_width - view_px).max(0.0);
    (hero_x - view_px / 3.0).clamp(0.0, max_left)
}

/// Glyph and colour for an entity kind.
fn glyph(kind: EntityKind) -> (char, Color) {
    match kind {
        EntityKind::Hero => ('@', Color::White),
        EntityKind::Slime => ('~', Color::Green),
        EntityKind::Mushroom => ('♠', Color::Red),
        EntityKind::Platform => ('▀', Color::DarkYellow),
        EntityKind::Flag => ('▶', Color::Yellow),
        EntityKind::Cloud => ('░', Color::Grey),
        EntityKind::Bullet => ('•', Color::Cyan),
        EntityKind::WinMarker => ('★', Color::Yellow),
        EntityKind::LoseMarker => ('✖', Color::Red),
    }
}

fn state_label(state: GameState) -> &'static str {
    match state {
        GameState::Running => "RUNNING",
        GameState::Stopped => "STOPPED",
    }
}

// ── Renderer ──

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
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Forget what is on screen; the next frame repaints everything.
    pub fn invalidate(&mut self) {
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, game: &GameController, message: &str) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        self.compose_hud(game);
        let map_rows = self.compose_level(game);
        self.compose_footer(MAP_ROW + map_rows, message);

        self.flush_diff()?;
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

        // Explicit base colours; ResetColor would fall back to the
        // terminal's own default and leave line artifacts.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

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

    fn compose_hud(&mut self, game: &GameController) {
        let hud = format!(
            " Level {}/{}  Score:{:<5}  Total:{:<6}  Lives:{}  Time:{:>3}s/{}s  {} ",
            game.level_index() + 1,
            game.level_count(),
            game.current_level_point(),
            game.total_point(),
            game.lives(),
            game.elapsed_seconds(),
            game.level().target_seconds(),
            state_label(game.state()),
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    /// Draw the camera view of the level. Returns the number of rows used.
    fn compose_level(&mut self, game: &GameController) -> usize {
        let level = game.level();
        let reserved_rows = MAP_ROW + 4;
        let max_rows = self.front.height.saturating_sub(reserved_rows).max(1);
        let rows = ((level.height() / PX_PER_ROW).ceil() as usize).min(max_rows);
        let cols = self.front.width;

        let view_px = cols as f64 * PX_PER_COL;
        let left = camera_left(level.hero_x(), level.width(), view_px);
        let top = (level.height() - rows as f64 * PX_PER_ROW).max(0.0);

        // Sky and ground
        let floor_row = ((level.floor_height() - top) / PX_PER_ROW).floor();
        for vy in 0..rows {
            let below = vy as f64 >= floor_row;
            let bg = if below { GROUND_BG } else { SKY_BG };
            for vx in 0..cols {
                let wx = left + vx as f64 * PX_PER_COL;
                let ch = if below && vy as f64 == floor_row && wx < level.width() { '▔' } else { ' ' };
                self.front.set(vx, MAP_ROW + vy, Cell::new(ch, Color::DarkGreen, bg));
            }
        }

        // Entities, back to front
        let mut drawn: Vec<&dyn Entity> = level
            .entities()
            .map(|(_, e)| e)
            .filter(|e| e.is_active() || matches!(e.kind(), EntityKind::WinMarker | EntityKind::LoseMarker))
            .collect();
        drawn.sort_by_key(|e| e.body().layer);

        for entity in drawn {
            if entity.body().layer == Layer::Effect {
                self.compose_banner(entity.kind(), rows, cols);
                continue;
            }
            let body = entity.body();
            let (ch, fg) = glyph(entity.kind());
            let c0 = ((body.x - left) / PX_PER_COL).floor();
            let c1 = ((body.x + body.width - left) / PX_PER_COL).ceil();
            let r0 = ((body.y - top) / PX_PER_ROW).floor();
            let r1 = ((body.y + body.height - top) / PX_PER_ROW).ceil();
            for r in (r0.max(0.0) as usize)..(r1.max(0.0) as usize).min(rows) {
                for c in (c0.max(0.0) as usize)..(c1.max(0.0) as usize).min(cols) {
                    let bg = self.front.get(c, MAP_ROW + r).bg;
                    self.front.set(c, MAP_ROW + r, Cell::new(ch, fg, bg));
                }
            }
        }

        rows
    }

    /// End-of-level markers are drawn as a centred banner.
    fn compose_banner(&mut self, kind: EntityKind, rows: usize, cols: usize) {
        let (text, bg) = match kind {
            EntityKind::WinMarker => ("  ★  LEVEL CLEAR  ★  ", Color::DarkGreen),
            _ => ("  ✖  GAME OVER  ✖  ", Color::DarkRed),
        };
        let width = text.chars().count();
        let x = cols.saturating_sub(width) / 2;
        let y = MAP_ROW + rows / 2;
        self.front.put_str(x, y, text, Color::White, bg);
    }

    fn compose_footer(&mut self, map_end: usize, message: &str) {
        let msg_row = map_end + 1;
        if !message.is_empty() && msg_row < self.front.height {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &format!(" ◈ {message} "), Color::Black, MSG_BG);
        }

        let help_row = map_end + 3;
        if help_row < self.front.height {
            let help = " ←/→ A/D:Move  ↑/W/Space:Jump  F:Shoot  S:Save  L:Load  R:Reset  Q/Esc:Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }
}
