use crate::config::Settings;
use crate::customize::Draft;
use crate::engine::Simulation;
use crate::host::FrameClock;
use crate::input::{collect_input, map_event_to_action, Action, Panel};
use crate::palette::Rgb;
use crate::render::{
    canvas_to_cells, draw_bar, draw_center_box, grid_dims, render, Terminal, STATUS_ROWS,
};
use crate::rules::RuleSet;
use crate::scheduler::{steps_per_tick, CallbackHost, RunState, Scheduler, MAX_TURBO_STEPS};
use anyhow::Result;
use crossterm::style::Color;
use rand::{rngs::StdRng, SeedableRng};
use std::time::{Duration, Instant};

/// Longest the loop sleeps while nothing is scheduled, so resizes and keys
/// are still noticed.
const IDLE_POLL: Duration = Duration::from_millis(50);

const HELP: [&str; 12] = [
    "s  start          p  pause",
    "space  start/pause",
    "r  reset grid and ant",
    "+/-  speed (turbo above 200)",
    "n  single step while paused",
    "c  customize rules and colors",
    "x  randomize rules and apply",
    "h  this help     q  quit",
    "",
    "Binary: turn by the white/black rule,",
    "then flip the cell. Multi-color: even",
    "states turn right, odd turn left.",
];

/// Everything the loop drives apart from the terminal and its clock.
struct Session {
    settings: Settings,
    sim: Simulation,
    scheduler: Scheduler,
    rng: StdRng,
    draft: Draft,
}

impl Session {
    fn new(settings: Settings, canvas_w: u32, canvas_h: u32) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (rows, cols) = grid_dims(canvas_w, canvas_h, settings.cell_size);
        log::info!("grid {}x{} (cell size {})", cols, rows, settings.cell_size);

        let sim = Simulation::new(rows, cols, settings.rules.clone(), settings.ant_color);
        let draft = Draft::new(&sim.rules, sim.ant_color);
        Self {
            scheduler: Scheduler::new(settings.speed),
            settings,
            sim,
            rng,
            draft,
        }
    }

    /// Commits a new configuration: cancels any pending tick and resets.
    fn apply(&mut self, host: &mut impl CallbackHost, rules: RuleSet, ant_color: Rgb) {
        self.scheduler.apply(&mut self.sim, host, rules, ant_color);
    }

    fn randomize(&mut self, host: &mut impl CallbackHost) {
        let rules = self.sim.rules.randomized(&mut self.rng);
        let color = Rgb::random(&mut self.rng);
        self.draft = Draft::new(&rules, color);
        self.apply(host, rules, color);
    }

    fn resize(&mut self, canvas_w: u32, canvas_h: u32) {
        let (rows, cols) = grid_dims(canvas_w, canvas_h, self.settings.cell_size);
        log::info!(
            "resize {}x{} -> {}x{}",
            self.sim.grid.cols,
            self.sim.grid.rows,
            cols,
            rows
        );
        self.sim.resize(rows, cols);
    }
}

pub(crate) struct App {
    session: Session,
    clock: FrameClock,
    term: Terminal,
    panel: Panel,
    should_quit: bool,
    dirty: bool,
}

impl App {
    fn init(settings: Settings) -> Result<Self> {
        let term = Terminal::begin()?;
        let clock = FrameClock::new(settings.fps_cap, Instant::now());
        let session = Session::new(settings, term.canvas.w, term.canvas.h);
        Ok(Self {
            session,
            clock,
            term,
            panel: Panel::None,
            should_quit: false,
            dirty: true,
        })
    }

    fn run(&mut self) -> Result<()> {
        self.repaint();
        if self.session.settings.autostart {
            self.start()?;
        }

        while !self.should_quit {
            if self.term.resize_if_needed()? {
                self.session.resize(self.term.canvas.w, self.term.canvas.h);
                self.repaint();
            }

            let now = Instant::now();
            let wait = self
                .clock
                .next_deadline()
                .map(|d| d.saturating_duration_since(now))
                .unwrap_or(IDLE_POLL)
                .min(IDLE_POLL);

            for ev in collect_input(wait)? {
                if let Some(action) = map_event_to_action(self.panel, &ev) {
                    self.handle(action)?;
                }
                if self.should_quit {
                    break;
                }
            }

            if let Some(id) = self.clock.poll(Instant::now()) {
                let cs = self.session.settings.cell_size;
                let canvas = &mut self.term.canvas;
                let s = &mut self.session;
                let fired = s.scheduler.fire(id, &mut s.sim, &mut self.clock, |sim| {
                    render(canvas, sim, cs);
                    Ok(())
                })?;
                if fired.is_some() {
                    self.dirty = true;
                }
            }

            if self.dirty {
                self.present()?;
            }
        }
        Ok(())
    }

    fn handle(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Start => self.start()?,
            Action::Pause => {
                self.session.scheduler.pause(&mut self.clock);
                self.dirty = true;
            }
            Action::Toggle => {
                if self.session.scheduler.is_running() {
                    self.session.scheduler.pause(&mut self.clock);
                    self.dirty = true;
                } else {
                    self.start()?;
                }
            }
            Action::Reset => {
                let s = &mut self.session;
                s.scheduler.reset(&mut s.sim, &mut self.clock);
                self.repaint();
            }
            Action::Faster => self.nudge_speed(1),
            Action::Slower => self.nudge_speed(-1),
            Action::Step => {
                if !self.session.scheduler.is_running() {
                    self.session.sim.advance(1);
                    self.repaint();
                }
            }
            Action::Randomize => {
                self.session.randomize(&mut self.clock);
                self.repaint();
            }
            Action::CustomizeOpen => {
                let sim = &self.session.sim;
                self.session.draft = Draft::new(&sim.rules, sim.ant_color);
                self.panel = Panel::Customize;
                self.dirty = true;
            }
            Action::HelpToggle => {
                self.panel = Panel::Help;
                self.dirty = true;
            }
            Action::FieldMove(by) => {
                self.session.draft.move_cursor(by);
                self.dirty = true;
            }
            Action::FieldChange(by) => {
                self.session.draft.change(by);
                self.dirty = true;
            }
            Action::Apply => match self.session.draft.commit() {
                Ok((rules, color)) => {
                    self.session.apply(&mut self.clock, rules, color);
                    self.panel = Panel::None;
                    self.repaint();
                }
                Err(e) => log::warn!("not applying customization: {e:#}"),
            },
            Action::Back => {
                self.panel = Panel::None;
                self.dirty = true;
            }
        }
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        let cs = self.session.settings.cell_size;
        let canvas = &mut self.term.canvas;
        let s = &mut self.session;
        s.scheduler.start(&mut s.sim, &mut self.clock, |sim| {
            render(canvas, sim, cs);
            Ok(())
        })?;
        self.dirty = true;
        Ok(())
    }

    fn nudge_speed(&mut self, dir: i32) {
        let scheduler = &mut self.session.scheduler;
        let cur = scheduler.speed();
        let step = if cur < 10 || (dir < 0 && cur <= 10) { 1 } else { 10 };
        let next = if dir > 0 {
            cur.saturating_add(step)
        } else {
            cur.saturating_sub(step)
        };
        scheduler.set_speed(next);
        self.dirty = true;
    }

    fn repaint(&mut self) {
        render(&mut self.term.canvas, &self.session.sim, self.session.settings.cell_size);
        self.dirty = true;
    }

    fn status_line(&self) -> String {
        let Session { sim, scheduler, .. } = &self.session;
        let state = match scheduler.state() {
            RunState::Idle => "PAUSED",
            RunState::Running(_) => "RUNNING",
        };
        let speed = scheduler.speed();
        let turbo = if scheduler.turbo_indicator() {
            let n = steps_per_tick(speed);
            if n == MAX_TURBO_STEPS {
                format!(" TURBO x{n} (max)")
            } else {
                format!(" TURBO x{n}")
            }
        } else {
            String::new()
        };
        format!(
            " {state} | speed {speed}{turbo} | gen {} | {} | ant {} | marked {} | {}x{} | c customize  h help  q quit",
            sim.generation,
            sim.rules.describe(),
            sim.ant.dir.arrow(),
            sim.grid.count_nonzero(),
            sim.grid.cols,
            sim.grid.rows,
        )
    }

    fn present(&mut self) -> Result<()> {
        self.term.cur.clear(Color::Black);
        canvas_to_cells(&self.term.canvas, &mut self.term.cur);

        let status = self.status_line();
        let (fg, bg) = if self.session.scheduler.turbo_indicator() {
            (Color::Black, Color::Yellow)
        } else {
            (Color::Black, Color::Grey)
        };
        if self.term.rows >= STATUS_ROWS {
            let y = self.term.rows - STATUS_ROWS;
            draw_bar(&mut self.term.cur, y, &status, fg, bg);
        }

        match self.panel {
            Panel::None => {}
            Panel::Help => {
                let body: Vec<String> = HELP.iter().map(|s| s.to_string()).collect();
                draw_center_box(&mut self.term.cur, "Langton's ant", &body);
            }
            Panel::Customize => {
                let body = self.session.draft.lines();
                draw_center_box(&mut self.term.cur, "Customize", &body);
            }
        }

        self.term.present()?;
        self.dirty = false;
        Ok(())
    }
}

pub(crate) fn run(settings: Settings) -> Result<()> {
    let mut app = App::init(settings)?;
    let res = app.run();
    // always hand the terminal back, even when the loop failed
    let end = app.term.end();
    res.and(end)
}
