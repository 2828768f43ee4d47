mod logging;
mod status;

use std::cell::RefCell;
use std::io::stdout;
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::{
    event::{
        self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
};
use flurry_config::Config;
use flurry_core::Bounds;
use flurry_field::{
    CellCanvas, ParticleField, ResizeListener, ViewportMonitor, VisibilityGate,
    VisibilityListener, flake_color,
};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout},
    style::Stylize,
    text::{Line, Span},
};

use crate::status::SessionStats;

/// Poll timeout while no frame or resize is pending.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Particles added or removed per keypress.
const COUNT_STEP: usize = 5;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Some(path) = logging::init() {
        log::info!("Logging to {}", path.display());
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Using default settings: {e}");
            Config::default()
        }
    };

    let terminal = ratatui::init();
    // Focus reporting is how we learn the window was switched away from.
    if let Err(e) = execute!(stdout(), EnableFocusChange) {
        log::warn!("Focus reporting unavailable: {e}");
    }

    let size = match crossterm::terminal::size() {
        Ok(size) => Some(size),
        Err(e) => {
            log::warn!("Terminal size unavailable: {e}");
            None
        }
    };

    let result = App::new(config, size).run(terminal);

    if let Err(e) = execute!(stdout(), DisableFocusChange) {
        log::warn!("Failed to disable focus reporting: {e}");
    }
    ratatui::restore();
    result
}

/// Surface bounds for a terminal of `cols` by `rows`, minus the status line.
fn surface_bounds(config: &Config, cols: u16, rows: u16) -> Bounds {
    Bounds::new(
        f32::from(cols) * config.cell_width,
        f32::from(rows.saturating_sub(1)) * config.cell_height,
    )
}

/// The main application which owns the field and its event sources.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    running: bool,
    /// Settings, updated when speed or theme change.
    config: Config,
    /// Whether settings changed and should be saved on exit.
    settings_changed: bool,
    field: Rc<RefCell<ParticleField<CellCanvas>>>,
    viewport: ViewportMonitor,
    visibility: VisibilityGate,
    stats: SessionStats,
}

impl App {
    /// Build the app and start the snowfall if the terminal size is known.
    pub fn new(config: Config, size: Option<(u16, u16)>) -> Self {
        let canvas = CellCanvas::new(
            config.cell_width,
            config.cell_height,
            config.theme,
            config.field.size,
        );
        let mut field = ParticleField::new(config.field.clone(), Some(canvas));
        field.set_speed(config.speed);
        field.set_resize_policy(config.resize_policy);
        field.set_frame_interval(config.frame_interval());

        let bounds = size.map(|(cols, rows)| surface_bounds(&config, cols, rows));
        if let Some(bounds) = bounds {
            field.initialize(config.field.count, bounds);
        }

        let mut viewport = match bounds {
            Some(bounds) => ViewportMonitor::with_bounds(bounds, config.resize_quiet_period()),
            None => ViewportMonitor::new(config.resize_quiet_period()),
        };
        let mut visibility = VisibilityGate::new();

        let owner = field.id();
        let field = Rc::new(RefCell::new(field));
        let on_resize: Rc<RefCell<dyn ResizeListener>> = field.clone();
        let on_visibility: Rc<RefCell<dyn VisibilityListener>> = field.clone();
        viewport.subscribe(owner, Rc::downgrade(&on_resize));
        visibility.subscribe(owner, Rc::downgrade(&on_visibility));

        Self {
            running: false,
            config,
            settings_changed: false,
            field,
            viewport,
            visibility,
            stats: SessionStats::new(),
        }
    }

    /// Run the application's main loop.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        self.running = true;
        while self.running {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_crossterm_events()?;

            let now = Instant::now();
            self.viewport.poll(now);
            self.field.borrow_mut().tick(now);
        }
        self.shutdown();
        Ok(())
    }

    /// Renders the snowfall and the status line.
    fn render(&mut self, frame: &mut Frame) {
        let [canvas_area, status_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(frame.area());

        let field = self.field.borrow();
        if let Some(canvas) = field.target() {
            frame.render_widget(canvas, canvas_area);
        }

        let color = flake_color(self.config.theme, 1.0, 1.0);
        let mut spans: Vec<Span> = vec![
            "q".bold().fg(color),
            " quit  ".dark_gray(),
            "p".bold().fg(color),
            " pause  ".dark_gray(),
            "+/-".bold().fg(color),
            " flakes  ".dark_gray(),
            "s".bold().fg(color),
            format!(" {}  ", self.config.speed.label()).dark_gray(),
            "c".bold().fg(color),
            format!(" {}  ", self.config.theme.label()).dark_gray(),
            "r".bold().fg(color),
            " rebuild  ".dark_gray(),
            format!("{} flakes", field.len()).fg(color),
        ];
        if !field.is_active() {
            spans.push("  paused".bold().yellow());
        }
        spans.push(
            format!(
                "  since {} · {} · {} keys",
                self.stats.since(),
                self.stats.time_on_page(Local::now()),
                self.stats.keypresses()
            )
            .dark_gray(),
        );

        frame.render_widget(Line::from(spans).centered(), status_area);
    }

    /// Reads the crossterm events and updates the state of [`App`].
    /// Waits no longer than the next frame or pending resize.
    fn handle_crossterm_events(&mut self) -> color_eyre::Result<()> {
        if event::poll(self.poll_timeout(Instant::now()))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
                Event::Resize(cols, rows) => {
                    let bounds = surface_bounds(&self.config, cols, rows);
                    self.viewport.report(bounds, Instant::now());
                }
                Event::FocusLost => {
                    self.visibility.signal(false);
                }
                Event::FocusGained => {
                    self.visibility.signal(true);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Time until the next frame or settled resize, whichever comes first.
    fn poll_timeout(&self, now: Instant) -> Duration {
        let frame = self.field.borrow().time_until_frame(now);
        let resize = self
            .viewport
            .deadline()
            .map(|deadline| deadline.saturating_duration_since(now));

        [frame, resize]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(IDLE_POLL)
            .min(IDLE_POLL)
    }

    /// Handles the key events and updates the state of [`App`].
    fn on_key_event(&mut self, key: KeyEvent) {
        self.stats.record_key();
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q'))
            | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => self.quit(),
            (_, KeyCode::Char('p') | KeyCode::Char(' ')) => self.toggle_pause(),
            (_, KeyCode::Char('+') | KeyCode::Char('=')) => self.change_count(true),
            (_, KeyCode::Char('-') | KeyCode::Char('_')) => self.change_count(false),
            (_, KeyCode::Char('s')) => self.cycle_speed(),
            (_, KeyCode::Char('c')) => self.cycle_color_theme(),
            (_, KeyCode::Char('r')) => self.rebuild(),
            _ => {}
        }
    }

    /// Pause or resume the snowfall.
    fn toggle_pause(&mut self) {
        let mut field = self.field.borrow_mut();
        if field.is_active() {
            field.pause();
        } else {
            field.resume();
        }
    }

    /// Grow or shrink the pool by one step, keeping at least one flake.
    fn change_count(&mut self, grow: bool) {
        let mut field = self.field.borrow_mut();
        let count = if grow {
            field.len().saturating_add(COUNT_STEP)
        } else {
            field.len().saturating_sub(COUNT_STEP).max(1)
        };
        field.set_count(count);
        self.config.field.count = count;
        self.settings_changed = true;
    }

    /// Cycle through animation speeds.
    fn cycle_speed(&mut self) {
        self.config.speed = self.config.speed.next();
        self.field.borrow_mut().set_speed(self.config.speed);
        self.settings_changed = true;
    }

    /// Cycle through available color themes.
    fn cycle_color_theme(&mut self) {
        self.config.theme = self.config.theme.next();
        if let Some(canvas) = self.field.borrow_mut().target_mut() {
            canvas.set_theme(self.config.theme);
        }
        self.settings_changed = true;
    }

    /// Recreate the pool at the current size.
    fn rebuild(&mut self) {
        match self.viewport.bounds() {
            Some(bounds) => self.field.borrow_mut().rebuild(bounds),
            None => log::warn!("Cannot rebuild snowfall without a viewport size"),
        }
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }

    /// Release the field and save changed settings.
    fn shutdown(&mut self) {
        let owner = self.field.borrow().id();
        self.viewport.unsubscribe(owner);
        self.visibility.unsubscribe(owner);
        self.field.borrow_mut().teardown();

        if self.settings_changed
            && let Err(e) = self.config.save()
        {
            log::warn!("Failed to save settings: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_bounds_reserves_status_line() {
        let config = Config::default();
        assert_eq!(
            surface_bounds(&config, 80, 25),
            Bounds::new(80.0 * 8.0, 24.0 * 16.0)
        );
        assert!(!surface_bounds(&config, 80, 1).is_usable());
    }

    #[test]
    fn test_app_starts_snowing_with_known_size() {
        let app = App::new(Config::default(), Some((80, 25)));
        let field = app.field.borrow();
        assert_eq!(field.len(), Config::default().field.count);
        assert!(field.is_active());
        assert_eq!(app.viewport.bounds(), field.bounds());
    }

    #[test]
    fn test_app_waits_for_size() {
        let mut app = App::new(Config::default(), None);
        assert!(app.field.borrow().is_empty());

        let now = Instant::now();
        app.viewport.report(surface_bounds(&app.config, 40, 12), now);
        app.viewport.poll(now + app.config.resize_quiet_period());
        assert_eq!(app.field.borrow().len(), Config::default().field.count);
    }

    #[test]
    fn test_focus_loss_pauses_field() {
        let mut app = App::new(Config::default(), Some((80, 25)));
        app.visibility.signal(false);
        assert!(!app.field.borrow().is_active());
        app.visibility.signal(true);
        assert!(app.field.borrow().is_active());
    }

    #[test]
    fn test_count_keys() {
        let mut app = App::new(Config::default(), Some((80, 25)));
        let start = app.field.borrow().len();
        app.on_key_event(KeyEvent::from(KeyCode::Char('+')));
        assert_eq!(app.field.borrow().len(), start + COUNT_STEP);
        app.on_key_event(KeyEvent::from(KeyCode::Char('-')));
        app.on_key_event(KeyEvent::from(KeyCode::Char('-')));
        assert_eq!(app.field.borrow().len(), start - COUNT_STEP);
        assert_eq!(app.stats.keypresses(), 3);
    }

    #[test]
    fn test_count_never_drops_below_one() {
        let mut app = App::new(Config::default(), Some((80, 25)));
        for _ in 0..20 {
            app.on_key_event(KeyEvent::from(KeyCode::Char('-')));
        }
        assert_eq!(app.field.borrow().len(), 1);
        assert_eq!(app.field.borrow().config().count, 1);
        assert_eq!(app.config.field.count, 1);

        app.rebuild();
        assert_eq!(app.field.borrow().len(), 1);
    }

    #[test]
    fn test_hidden_before_first_size_stays_paused() {
        let mut app = App::new(Config::default(), None);
        app.visibility.signal(false);

        let now = Instant::now();
        app.viewport.report(surface_bounds(&app.config, 40, 12), now);
        app.viewport.poll(now + app.config.resize_quiet_period());
        assert_eq!(app.field.borrow().len(), Config::default().field.count);
        assert!(!app.field.borrow().is_active());

        app.visibility.signal(true);
        assert!(app.field.borrow().is_active());
    }

    #[test]
    fn test_poll_timeout_bounded() {
        let app = App::new(Config::default(), None);
        assert_eq!(app.poll_timeout(Instant::now()), IDLE_POLL);

        let app = App::new(Config::default(), Some((80, 25)));
        assert!(app.poll_timeout(Instant::now()) <= app.config.frame_interval());
    }
}
