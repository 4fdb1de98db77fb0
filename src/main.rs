use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::supports_keyboard_enhancement;
use ratatui::DefaultTerminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flowmap::app::App;
use flowmap::data::{generate_demo, load_atlas, Atlas};
use flowmap::ui;

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal map of movement between Danish municipalities")]
struct Args {
    /// Movement data JSON (requires --geo)
    #[arg(long, requires = "geo")]
    data: Option<PathBuf>,

    /// Municipality outlines: region list or GeoJSON (requires --data)
    #[arg(long, requires = "data")]
    geo: Option<PathBuf>,

    /// Where log output goes; the terminal belongs to the map
    #[arg(long, default_value = "flowmap.log")]
    log_file: PathBuf,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load(args: &Args) -> Result<Atlas> {
    match (&args.data, &args.geo) {
        (Some(data), Some(geo)) => load_atlas(data, geo),
        _ => {
            info!("no data files given, using the built-in demo");
            Ok(generate_demo())
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    // Fail before touching the terminal
    let atlas = load(&args)?;

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Key release events are needed to track a held Shift
    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            std::io::stdout(),
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                    | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
            )
        )?;
    } else {
        warn!("terminal does not report key releases; use 'd' to flip direction");
    }

    let result = run(&mut terminal, atlas);

    if enhanced {
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
    }
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

fn run(terminal: &mut DefaultTerminal, atlas: Atlas) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(atlas, size.width, size.height)?;
    info!(width = size.width, height = size.height, "session started");

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Nothing animates, so a slow poll is enough
        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) => app.handle_key(key),
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    info!("session ended");
    Ok(())
}
