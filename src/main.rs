// stepviz: step-by-step visualizer for a small Python-flavoured language

use std::fs;
use std::io;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use stepviz::config::{usage, Args, ConfigError};
use stepviz::headless::run_headless;
use stepviz::interpreter::Engine;
use stepviz::logging::init_tracing;
use stepviz::playback::{PlaybackController, Player};
use stepviz::ui::App;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let program_name = std::env::args()
        .next()
        .unwrap_or_else(|| "stepviz".to_string());

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(ConfigError::HelpRequested) => {
            println!("{}", usage(&program_name));
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("{}", usage(&program_name));
            std::process::exit(1);
        }
    };

    if !args.file.exists() {
        eprintln!("Error: File '{}' not found", args.file.display());
        std::process::exit(1);
    }

    let source = fs::read_to_string(&args.file)?;
    let config = args.config;

    let mut engine = Engine::new(config.engine);
    if let Err(e) = engine.start_run(&source) {
        eprintln!("{}: {}", args.file.display(), e);
        std::process::exit(1);
    }
    info!(file = %args.file.display(), headless = config.headless, "loaded program");

    if config.headless {
        let stdout = io::stdout();
        let succeeded = run_headless(&mut engine, config.repr_limit, &mut stdout.lock())?;
        if !succeeded {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let player = Player::new(
        engine,
        PlaybackController::new(config.base_interval, config.speed),
    );
    let mut app = App::new(player, config.repr_limit);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
