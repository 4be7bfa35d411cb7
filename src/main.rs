mod assets;
mod audio;
mod config;
mod engine;
mod input;
mod store;
mod ui;
mod world;

use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyboardEnhancementFlags, MouseButton, MouseEventKind, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tracing_subscriber::EnvFilter;

use assets::Assets;
use audio::{AudioSink, SilentAudio};
use config::{Args, Settings};
use engine::{Engine, EngineEvent};
use input::{Control, ControlEvent, InputSource, KeyboardSource, TouchSource};
use store::{FileProgressStore, MemoryProgressStore, ProgressStore};
use world::load_world;

type GameEngine = Engine<Box<dyn ProgressStore>, Box<dyn AudioSink>>;

enum Screen {
    Title,
    Playing,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum MenuOption {
    Continue,
    NewGame,
    Quit,
}

impl MenuOption {
    fn next(self, can_continue: bool) -> Self {
        match self {
            MenuOption::Continue => MenuOption::NewGame,
            MenuOption::NewGame => MenuOption::Quit,
            MenuOption::Quit if can_continue => MenuOption::Continue,
            MenuOption::Quit => MenuOption::NewGame,
        }
    }

    fn prev(self, can_continue: bool) -> Self {
        match self {
            MenuOption::Continue => MenuOption::Quit,
            MenuOption::NewGame if can_continue => MenuOption::Continue,
            MenuOption::NewGame => MenuOption::Quit,
            MenuOption::Quit => MenuOption::NewGame,
        }
    }
}

#[derive(PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct App {
    engine: GameEngine,
    screen: Screen,
    menu_selection: MenuOption,
    assets: Assets,
    keyboard: KeyboardSource,
    touch: TouchSource,
    use_touch: bool,
    started: Instant,
    last_area: Rect,
}

impl App {
    fn new(engine: GameEngine, assets: Assets, keyboard: KeyboardSource, use_touch: bool) -> Self {
        let menu_selection = if engine.resume_level() > 0 {
            MenuOption::Continue
        } else {
            MenuOption::NewGame
        };
        App {
            engine,
            screen: Screen::Title,
            menu_selection,
            assets,
            keyboard,
            touch: TouchSource::default(),
            use_touch,
            started: Instant::now(),
            last_area: Rect::default(),
        }
    }

    fn can_continue(&self) -> bool {
        self.engine.resume_level() > 0
    }

    fn start_game(&mut self, level: usize) {
        self.reset_sources();
        self.engine.start(level);
        self.screen = Screen::Playing;
    }

    fn new_game(&mut self) {
        self.reset_sources();
        self.engine.restart();
        self.screen = Screen::Playing;
    }

    fn reset_sources(&mut self) {
        self.keyboard.reset();
        self.touch.reset();
    }

    fn apply(&mut self, control: ControlEvent) {
        match control {
            ControlEvent::Press(Control::Move(dir)) => self.engine.press(dir),
            ControlEvent::Release(Control::Move(dir)) => self.engine.release(dir),
            ControlEvent::Press(Control::Jump) => {
                self.engine.jump();
            }
            ControlEvent::Release(Control::Jump) => {}
        }
    }

    /// Advances the engine by wall-clock `dt` and reacts to what happened.
    fn tick(&mut self, dt: Duration) {
        let now = self.started.elapsed();
        for control in self.keyboard.expire(now) {
            self.apply(control);
        }

        self.engine.update(dt);

        for event in self.engine.drain_events() {
            match event {
                EngineEvent::LevelStarted(_) | EngineEvent::Triggered(_) => self.reset_sources(),
                EngineEvent::LevelComplete(index) => {
                    log::debug!("level-complete overlay for level {}", index + 1)
                }
                EngineEvent::GameComplete => log::info!("all levels discovered"),
            }
        }
    }

    fn handle(&mut self, event: Event) -> Flow {
        match self.screen {
            Screen::Title => self.handle_title(event),
            Screen::Playing => self.handle_playing(event),
        }
    }

    fn handle_title(&mut self, event: Event) -> Flow {
        let Event::Key(key) = event else {
            return Flow::Continue;
        };
        if key.kind == KeyEventKind::Release {
            return Flow::Continue;
        }
        let can_continue = self.can_continue();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('s') => {
                self.menu_selection = self.menu_selection.next(can_continue);
            }
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('w') => {
                self.menu_selection = self.menu_selection.prev(can_continue);
            }
            KeyCode::Enter => match self.menu_selection {
                MenuOption::Continue => self.start_game(self.engine.resume_level()),
                MenuOption::NewGame => self.new_game(),
                MenuOption::Quit => return Flow::Quit,
            },
            KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
            _ => {}
        }
        Flow::Continue
    }

    fn handle_playing(&mut self, event: Event) -> Flow {
        let now = self.started.elapsed();

        if self.engine.modal().visible() {
            self.handle_modal(&event);
        } else if self.engine.blocked() {
            if confirmed(&event) {
                self.engine.advance();
                if self.engine.progress().game_complete() {
                    self.screen = Screen::Title;
                    self.menu_selection = MenuOption::NewGame;
                }
            }
        } else {
            if let Event::Key(key) = &event {
                if key.code == KeyCode::Char('q') && key.kind != KeyEventKind::Release {
                    return Flow::Quit;
                }
            }
            let mut controls = self.keyboard.translate(&event, now);
            if self.use_touch {
                controls.extend(self.touch.translate(&event, now));
            }
            for control in controls {
                self.apply(control);
            }
            return Flow::Continue;
        }

        // Overlays own the input, but releases still reach the engine so no
        // direction stays held behind them.
        if let Event::Key(key) = &event {
            if key.kind == KeyEventKind::Release {
                if let Some(Control::Move(dir)) = input::control_for_key(key) {
                    self.engine.release(dir);
                }
            }
        }
        Flow::Continue
    }

    fn handle_modal(&mut self, event: &Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char('x') => self.engine.close_event(),
                KeyCode::Char(' ') | KeyCode::Char('n') | KeyCode::Tab => {
                    self.engine.advance_media()
                }
                _ => {}
            },
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                let (modal, media) = ui::modal_rects(self.last_area);
                if ui::contains(media, mouse.column, mouse.row) {
                    self.engine.advance_media();
                } else if !ui::contains(modal, mouse.column, mouse.row) {
                    self.engine.close_event();
                }
            }
            _ => {}
        }
    }
}

fn confirmed(event: &Event) -> bool {
    match event {
        Event::Key(key) => key.kind != KeyEventKind::Release && key.code == KeyCode::Enter,
        Event::Mouse(mouse) => mouse.kind == MouseEventKind::Down(MouseButton::Left),
        _ => false,
    }
}

fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pixel_journey=info".parse()?))
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn open_audio(args: &Args, settings: &Settings) -> Box<dyn AudioSink> {
    if args.mute || settings.audio.mute {
        return Box::new(SilentAudio);
    }

    device_audio(&args.assets).unwrap_or_else(|| Box::new(SilentAudio))
}

#[cfg(feature = "audio")]
fn device_audio(root: &Path) -> Option<Box<dyn AudioSink>> {
    match audio::RodioAudio::new(root) {
        Ok(device) => Some(Box::new(device)),
        Err(e) => {
            log::warn!("no soundtrack: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "audio"))]
fn device_audio(_root: &Path) -> Option<Box<dyn AudioSink>> {
    None
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;
    let settings = Settings::load(args.config.as_deref())?;

    let world = load_world(&args.levels)
        .with_context(|| format!("loading levels from {}", args.levels.display()))?;
    log::info!("loaded {} levels from {}", world.len(), args.levels.display());

    let store: Box<dyn ProgressStore> = if args.no_save {
        Box::new(MemoryProgressStore::default())
    } else {
        Box::new(FileProgressStore::new(&args.save_file))
    };
    let engine = Engine::new(world, settings.engine.clone(), store, open_audio(&args, &settings));

    let (width, _) = terminal::size()?;
    let use_touch = args.use_touch(width);
    let reports_release = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
    log::info!(
        "controls: {} (key releases {})",
        if use_touch { "touch + keyboard" } else { "keyboard" },
        if reports_release { "reported" } else { "timed out" }
    );
    let keyboard = KeyboardSource::new(
        reports_release,
        Duration::from_millis(settings.input.hold_timeout_ms),
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    if reports_release {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(engine, Assets::new(&args.assets), keyboard, use_touch);
    let frame = Duration::from_millis(settings.input.frame_ms.max(1));
    let result = run(&mut terminal, &mut app, frame);

    if reports_release {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    result?;

    if app.engine.progress().game_complete() {
        println!("\nJourney complete. Thanks for playing!\n");
    } else if matches!(app.screen, Screen::Playing) && !args.no_save {
        println!(
            "\nProgress saved at level {}.\n",
            app.engine.level_index() + 1
        );
    }

    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    frame: Duration,
) -> Result<()> {
    let mut last = Instant::now();
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(frame)? && app.handle(event::read()?) == Flow::Quit {
            break;
        }

        let now = Instant::now();
        if matches!(app.screen, Screen::Playing) {
            app.tick(now - last);
        }
        last = now;
    }
    Ok(())
}
