//! leitor main entry point
//!
//! Console harness wiring the two components together:
//! 1. stdin lines play the role of the context menu (speak/stop/pause/resume)
//! 2. the coordinator runs on the main thread, owning session and menu state
//! 3. the speaker runs on its own thread, owning the synthesizer, connected
//!    by the command and status channels

use crossbeam_channel::{select, unbounded, Receiver};
use leitor::config::Config;
use leitor::coordinator::menu::{MenuCommand, MenuHost, MenuItem, MenuVisibility, MENU_ITEMS};
use leitor::coordinator::{Coordinator, Event, Notifier, SurfaceId};
use leitor::message::Status;
use leitor::speaker::{create_synth, Speaker};
use leitor::store::Store;
use leitor::Result;
use log::{debug, error, info};
use std::io::{self, BufRead};
use std::process;
use std::thread;

/// The console stands in for the single surface where text is selected
const CONSOLE_SURFACE: SurfaceId = SurfaceId(1);

fn main() {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let debug_mode = args.iter().any(|arg| arg == "--debug" || arg == "-d");

    // Initialize logger
    if debug_mode {
        // Debug mode: write to leitor.log file
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("leitor.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!(
                    "Warning: Failed to open leitor.log for debug logging: {}",
                    e
                );
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "leitor version {} starting (debug mode, logging to leitor.log)",
            leitor::VERSION
        );
    } else {
        // Normal mode: minimal logging to stderr, only errors
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Error)
            .init();
    }

    // Run the application
    if let Err(e) = run() {
        error!("Fatal error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    debug!("Initializing leitor");

    let config = Config::load()?;
    info!("Configuration loaded from {:?}", config.path());
    info!("  Rate: {}", config.default_rate());
    info!("  Language: {}", config.preferred_language());
    info!("  Notifications: {}", config.show_notifications());

    // Channels: commands down to the speaker, statuses back up, plus the
    // synthesizer's own event stream on the speaker side.
    let (command_tx, command_rx) = unbounded();
    let (status_tx, status_rx) = unbounded();
    let (engine_tx, engine_rx) = unbounded();

    // The speaker owns the synthesizer, so both live on this thread.
    let defaults = config.speech_defaults();
    let speaker_handle = thread::spawn(move || {
        let synth = match create_synth(engine_tx) {
            Ok(synth) => synth,
            Err(e) => {
                // Reported once; the session never starts.
                error!("Speech synthesis unavailable: {}", e);
                let _ = status_tx.send(Status::Error {
                    error: e.to_string(),
                });
                return;
            }
        };
        let mut speaker = Speaker::new(synth, defaults, status_tx);

        loop {
            select! {
                recv(command_rx) -> command => match command {
                    Ok(command) => speaker.handle_command(command),
                    Err(_) => {
                        // Coordinator gone: behave like a page unload.
                        speaker.unload();
                        break;
                    }
                },
                recv(engine_rx) -> event => match event {
                    Ok(event) => speaker.handle_engine_event(event),
                    Err(_) => break,
                },
            }
        }
        debug!("Speaker thread exiting");
    });

    // Feed stdin lines through a channel so the main loop can select
    // over user input and speaker statuses.
    let line_rx = spawn_stdin_reader();

    let store = Store::new();
    let mut coordinator = Coordinator::new(
        ConsoleMenu,
        ConsoleNotifier,
        command_tx,
        store,
        &config,
    )?;
    coordinator.startup();

    println!("leitor {} ready", leitor::VERSION);
    println!("Configuration: {}", config.path().display());
    println!("Commands: speak <text> | stop | pause | resume | close | quit");

    loop {
        select! {
            recv(line_rx) -> line => {
                let line = match line {
                    Ok(line) => line,
                    Err(_) => break,
                };
                if !handle_line(&mut coordinator, line.trim()) {
                    break;
                }
            },
            recv(status_rx) -> status => match status {
                Ok(status) => coordinator.handle(Event::Status(status)),
                Err(_) => {
                    error!("Speaker terminated unexpectedly");
                    break;
                }
            },
        }
    }

    coordinator.suspend();
    drop(coordinator);
    let _ = speaker_handle.join();

    Ok(())
}

/// Read stdin lines on a dedicated thread
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
    rx
}

/// Translate one console line into a coordinator event
///
/// Returns false when the user asked to quit.
fn handle_line<M: MenuHost, N: Notifier>(
    coordinator: &mut Coordinator<M, N>,
    line: &str,
) -> bool {
    let (word, rest) = match line.split_once(' ') {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let click = |command: MenuCommand, selection: Option<String>| Event::MenuClicked {
        command,
        surface: CONSOLE_SURFACE,
        selection,
    };

    match word {
        "" => {}
        "speak" => coordinator.handle(click(MenuCommand::Speak, Some(rest.to_string()))),
        "stop" => coordinator.handle(click(MenuCommand::Stop, None)),
        "pause" => coordinator.handle(click(MenuCommand::Pause, None)),
        "resume" => coordinator.handle(click(MenuCommand::Resume, None)),
        "close" => coordinator.handle(Event::SurfaceClosed(CONSOLE_SURFACE)),
        "reload" => coordinator.handle(Event::SurfaceNavigated(CONSOLE_SURFACE)),
        "quit" | "exit" => return false,
        other => {
            // Menu item ids work too, the way a real menu host reports clicks
            if let Some(command) = MenuCommand::from_item_id(other) {
                let selection = (!rest.is_empty()).then(|| rest.to_string());
                coordinator.handle(click(command, selection));
            } else {
                println!("Unknown command: {}", other);
            }
        }
    }
    true
}

/// Menu host that renders the visible items on the console
struct ConsoleMenu;

impl MenuHost for ConsoleMenu {
    fn create_items(&mut self, items: &[MenuItem]) -> Result<()> {
        for item in items {
            debug!("Menu item registered: {} ({})", item.title, item.id);
        }
        Ok(())
    }

    fn apply(&mut self, visibility: MenuVisibility) -> Result<()> {
        let flags = [
            visibility.speak,
            visibility.stop,
            visibility.pause,
            visibility.resume,
        ];
        let titles: Vec<&str> = MENU_ITEMS
            .iter()
            .zip(flags)
            .filter(|(_, visible)| *visible)
            .map(|(item, _)| item.title)
            .collect();
        println!("[menu] {}", titles.join(" | "));
        Ok(())
    }
}

/// Notifier that prints to the console
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, title: &str, message: &str) {
        println!("[{}] {}", title, message);
    }
}
