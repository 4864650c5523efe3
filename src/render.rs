use crate::engine::Simulation;
use crate::palette::{Rgb, BACKGROUND, PALETTE};
use crossterm::{
    cursor, execute, queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

/// Rows at the bottom of the terminal reserved for the status bar.
pub(crate) const STATUS_ROWS: u16 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
            bold: false,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    #[cfg(test)]
    pub(crate) fn get(&self, x: u16, y: u16) -> Cell {
        self.cells[self.idx(x, y)]
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell {
            bg,
            ..Cell::default()
        });
    }
}

/// The raster surface the automaton is painted on.
pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Rgb>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![BACKGROUND; (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn get(&self, x: u32, y: u32) -> Rgb {
        self.px[self.idx(x, y)]
    }
    pub(crate) fn clear(&mut self, p: Rgb) {
        self.px.fill(p);
    }
    /// Clipped to the canvas.
    pub(crate) fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, p: Rgb) {
        let x1 = x.saturating_add(w).min(self.w);
        let y1 = y.saturating_add(h).min(self.h);
        for yy in y.min(y1)..y1 {
            let row = self.idx(0, yy);
            self.px[row + x.min(x1) as usize..row + x1 as usize].fill(p);
        }
    }
}

/// Grid `(rows, cols)` that fits a canvas with square cells of `cell_size`.
/// Never smaller than 1x1.
pub(crate) fn grid_dims(canvas_w: u32, canvas_h: u32, cell_size: u32) -> (usize, usize) {
    let cs = cell_size.max(1);
    (
        (canvas_h / cs).max(1) as usize,
        (canvas_w / cs).max(1) as usize,
    )
}

/// Full repaint of the simulation. Returns how many cells were painted,
/// the ant included.
pub(crate) fn render(canvas: &mut PixelCanvas, sim: &Simulation, cell_size: u32) -> usize {
    let cs = cell_size.max(1);
    canvas.clear(BACKGROUND);

    let mut painted = 0;
    for (x, y, s) in sim.grid.iter() {
        let color = if sim.rules.multi_color {
            let ci = (s % sim.rules.color_count) as usize;
            if ci == 0 {
                continue;
            }
            PALETTE[ci % PALETTE.len()]
        } else {
            if s != 1 {
                continue;
            }
            PALETTE[1]
        };
        canvas.fill_rect(x as u32 * cs, y as u32 * cs, cs, cs, color);
        painted += 1;
    }

    canvas.fill_rect(
        sim.ant.x as u32 * cs,
        sim.ant.y as u32 * cs,
        cs,
        cs,
        sim.ant_color,
    );
    painted + 1
}

fn term_color(p: Rgb) -> Color {
    Color::Rgb {
        r: p.r,
        g: p.g,
        b: p.b,
    }
}

/// Half-block encoding: each terminal cell shows two stacked pixels,
/// the top one as foreground of `▀` and the bottom one as background.
pub(crate) fn canvas_to_cells(canvas: &PixelCanvas, out: &mut CellBuffer) {
    let cols = (out.w as u32).min(canvas.w);
    let rows = (out.h as u32).min(canvas.h.div_ceil(2));

    for cy in 0..rows {
        for cx in 0..cols {
            let top = canvas.get(cx, cy * 2);
            let bottom = if cy * 2 + 1 < canvas.h {
                canvas.get(cx, cy * 2 + 1)
            } else {
                BACKGROUND
            };
            let cell = if top == bottom {
                Cell {
                    ch: ' ',
                    fg: Color::White,
                    bg: term_color(top),
                    bold: false,
                }
            } else {
                Cell {
                    ch: '▀',
                    fg: term_color(top),
                    bg: term_color(bottom),
                    bold: false,
                }
            };
            out.set(cx as u16, cy as u16, cell);
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let Some(xx) = x.checked_add(i as u16) else {
            break;
        };
        if xx >= buf.w {
            break;
        }
        buf.set(
            xx,
            y,
            Cell {
                ch,
                fg,
                bg,
                bold: false,
            },
        );
    }
}

/// Full-width bar; text is truncated to fit.
pub(crate) fn draw_bar(buf: &mut CellBuffer, y: u16, s: &str, fg: Color, bg: Color) {
    for x in 0..buf.w {
        buf.set(
            x,
            y,
            Cell {
                ch: ' ',
                fg,
                bg,
                bold: false,
            },
        );
    }
    draw_text(buf, 0, y, s, fg, bg);
}

/// Framed box centered on the buffer. Body lines past the frame are dropped.
pub(crate) fn draw_center_box(buf: &mut CellBuffer, title: &str, body: &[String]) {
    let fg = Color::White;
    let bg = Color::Black;

    let inner_w = body
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(title.chars().count()))
        .max()
        .unwrap_or(0) as u16;
    let bw = (inner_w + 4).min(buf.w.saturating_sub(2)).max(4);
    let bh = (body.len() as u16 + 4).min(buf.h.saturating_sub(2)).max(3);
    let x0 = buf.w.saturating_sub(bw) / 2;
    let y0 = buf.h.saturating_sub(bh) / 2;

    let frame = |ch: char| Cell {
        ch,
        fg,
        bg,
        bold: false,
    };
    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            let edge_x = x == x0 || x == x0 + bw - 1;
            let edge_y = y == y0 || y == y0 + bh - 1;
            let ch = match (edge_x, edge_y) {
                (true, true) => match (x == x0, y == y0) {
                    (true, true) => '┌',
                    (false, true) => '┐',
                    (true, false) => '└',
                    (false, false) => '┘',
                },
                (true, false) => '│',
                (false, true) => '─',
                (false, false) => ' ',
            };
            buf.set(x, y, frame(ch));
        }
    }

    let clip = |s: &str| s.chars().take(bw.saturating_sub(4) as usize).collect::<String>();
    let title = clip(title);
    let ty = y0 + 1;
    draw_text(buf, x0 + 2, ty, &title, Color::Yellow, bg);
    if ty < buf.h {
        for x in (x0 + 2..).take(title.chars().count()).take_while(|&x| x < buf.w) {
            let i = buf.idx(x, ty);
            buf.cells[i].bold = true;
        }
    }
    for (i, line) in body.iter().enumerate() {
        let y = y0 + 2 + i as u16;
        if y >= y0 + bh - 1 {
            break;
        }
        draw_text(buf, x0 + 2, y, &clip(line), fg, bg);
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: PixelCanvas,
    full_redraw: bool,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            canvas: Self::canvas_for(cols, rows),
            full_redraw: true,
        })
    }

    /// Canvas covering every row but the status bar, two pixels per row.
    fn canvas_for(cols: u16, rows: u16) -> PixelCanvas {
        PixelCanvas::new(
            cols as u32,
            rows.saturating_sub(STATUS_ROWS) as u32 * 2,
        )
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_to(&mut self, c: u16, r: u16) -> bool {
        if c == self.cols && r == self.rows {
            return false;
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = Self::canvas_for(c, r);
        self.full_redraw = true;
        true
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        Ok(self.resize_to(c, r))
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_bold = false;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if !self.full_redraw && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                if last_bold != c.bold {
                    let attr = if c.bold {
                        Attribute::Bold
                    } else {
                        Attribute::NormalIntensity
                    };
                    queue!(self.out, SetAttribute(attr))?;
                    last_bold = c.bold;
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(
            self.out,
            SetAttribute(Attribute::Reset),
            ResetColor,
            EndSynchronizedUpdate
        )?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        self.full_redraw = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{DEFAULT_ANT, FILLED};
    use crate::rules::RuleSet;

    fn multi(colors: u8) -> RuleSet {
        RuleSet {
            multi_color: true,
            color_count: colors,
            ..RuleSet::default()
        }
    }

    #[test]
    fn binary_paints_only_filled_cells_then_ant() {
        let mut sim = Simulation::new(4, 5, RuleSet::default(), DEFAULT_ANT);
        sim.grid.set(0, 0, 1);
        sim.grid.set(4, 3, 1);
        let mut canvas = PixelCanvas::new(10, 8);
        canvas.clear(Rgb::new(9, 9, 9));

        let painted = render(&mut canvas, &sim, 2);
        assert_eq!(painted, 3);
        assert_eq!(canvas.get(0, 0), FILLED);
        assert_eq!(canvas.get(1, 1), FILLED);
        assert_eq!(canvas.get(9, 7), FILLED);
        assert_eq!(canvas.get(2, 0), BACKGROUND);
        // ant at (2, 2) in cells -> pixels (4..6, 4..6)
        assert_eq!(canvas.get(4, 4), DEFAULT_ANT);
        assert_eq!(canvas.get(5, 5), DEFAULT_ANT);
    }

    #[test]
    fn multi_color_skips_state_zero_and_indexes_palette() {
        let mut sim = Simulation::new(1, 4, multi(3), DEFAULT_ANT);
        sim.grid.set(1, 0, 1);
        sim.grid.set(3, 0, 2);
        sim.ant.x = 0;
        let mut canvas = PixelCanvas::new(4, 1);

        let painted = render(&mut canvas, &sim, 1);
        assert_eq!(painted, 3);
        assert_eq!(canvas.get(1, 0), PALETTE[1]);
        assert_eq!(canvas.get(2, 0), BACKGROUND);
        assert_eq!(canvas.get(3, 0), PALETTE[2]);
    }

    #[test]
    fn ant_overrides_cell_color() {
        let mut sim = Simulation::new(3, 3, RuleSet::default(), Rgb::new(1, 2, 3));
        sim.grid.set(1, 1, 1);
        let mut canvas = PixelCanvas::new(3, 3);
        render(&mut canvas, &sim, 1);
        assert_eq!(canvas.get(1, 1), Rgb::new(1, 2, 3));
    }

    #[test]
    fn redraw_clears_previous_frame() {
        let mut sim = Simulation::new(2, 2, RuleSet::default(), DEFAULT_ANT);
        sim.grid.set(0, 0, 1);
        let mut canvas = PixelCanvas::new(2, 2);
        render(&mut canvas, &sim, 1);
        sim.grid.set(0, 0, 0);
        render(&mut canvas, &sim, 1);
        assert_eq!(canvas.get(0, 0), BACKGROUND);
    }

    #[test]
    fn fill_rect_clips() {
        let mut canvas = PixelCanvas::new(3, 3);
        canvas.fill_rect(2, 2, 5, 5, FILLED);
        assert_eq!(canvas.get(2, 2), FILLED);
        assert_eq!(canvas.get(1, 1), BACKGROUND);
        canvas.fill_rect(10, 10, 2, 2, FILLED);
    }

    #[test]
    fn grid_dims_divide_by_cell_size() {
        assert_eq!(grid_dims(80, 46, 1), (46, 80));
        assert_eq!(grid_dims(80, 46, 8), (5, 10));
        assert_eq!(grid_dims(3, 3, 8), (1, 1));
    }

    #[test]
    fn half_blocks_stack_two_pixels() {
        let mut canvas = PixelCanvas::new(2, 3);
        canvas.fill_rect(0, 0, 1, 1, FILLED);
        canvas.fill_rect(1, 0, 1, 2, FILLED);
        let mut buf = CellBuffer::new(2, 2);
        canvas_to_cells(&canvas, &mut buf);

        let split = buf.get(0, 0);
        assert_eq!(split.ch, '▀');
        assert_eq!(split.fg, term_color(FILLED));
        assert_eq!(split.bg, term_color(BACKGROUND));

        let solid = buf.get(1, 0);
        assert_eq!(solid.ch, ' ');
        assert_eq!(solid.bg, term_color(FILLED));

        // odd canvas height: last row pairs with background
        assert_eq!(buf.get(0, 1).bg, term_color(BACKGROUND));
    }

    #[test]
    fn center_box_fits_small_buffers() {
        let mut buf = CellBuffer::new(12, 6);
        let body = vec!["a very long line that will not fit".to_string(); 10];
        draw_center_box(&mut buf, "Title", &body);
        assert_eq!(buf.get(1, 1).ch, '┌');
        assert_eq!(buf.get(10, 4).ch, '┘');
        assert_eq!(buf.get(3, 2).ch, 'T');
        assert!(buf.get(3, 2).bold);
        assert!(buf.get(7, 2).bold);
        assert!(!buf.get(3, 3).bold);
        assert!(!buf.get(1, 1).bold);
    }

    #[test]
    fn bar_truncates() {
        let mut buf = CellBuffer::new(4, 1);
        draw_bar(&mut buf, 0, "abcdef", Color::Black, Color::White);
        let s: String = buf.cells.iter().map(|c| c.ch).collect();
        assert_eq!(s, "abcd");
    }
}
