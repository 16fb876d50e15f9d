use mindmap_engine::config::{load_config, AppConfig, CliArgs, Command};
use mindmap_engine::{actions, app, event, generate, layout, source, store, ui};

use anyhow::{anyhow, Context, Result};
use app::AppState;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use generate::{MindmapGenerator, NoteInput, OutlineGenerator};
use ratatui::{backend::CrosstermBackend, Terminal};
use source::MapSource;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = load_config(&args)?;

    if args.debug_config {
        println!("Configuration:");
        println!("{:#?}", config);
        return Ok(());
    }

    match args.command {
        Some(Command::Layout {
            ref input,
            pretty,
            report,
        }) => {
            init_logging(&config, false)?;
            run_layout(&config, input, pretty, report)
        }
        Some(Command::Outline {
            ref note,
            ref title,
            ref output,
        }) => {
            init_logging(&config, false)?;
            run_outline(&config, note, title.clone(), output.as_deref())
        }
        Some(Command::View {
            ref input,
            ref title,
        }) => {
            // Logging to the terminal would corrupt the display
            init_logging(&config, true)?;
            run_viewer(config, input, title.clone())
        }
        None => Err(anyhow!(
            "no command given, try `mindmap-engine view <file>` or --help"
        )),
    }
}

/// Logs go to stderr for batch commands. The viewer only logs when a log
/// file is configured.
fn init_logging(config: &AppConfig, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;

    match (&config.log_file, interactive) {
        (Some(path), _) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow!(e))?;
        }
        (None, false) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .try_init()
                .map_err(|e| anyhow!(e))?;
        }
        (None, true) => {}
    }

    Ok(())
}

fn run_layout(config: &AppConfig, input: &Path, pretty: bool, report: bool) -> Result<()> {
    let nodes = source::read_node_list(input)?;
    let (layout, diagnostics) = layout::layout_with_report(&nodes, &config.layout_settings());

    let json = if pretty {
        serde_json::to_string_pretty(&layout)?
    } else {
        serde_json::to_string(&layout)?
    };
    println!("{json}");

    if report {
        if diagnostics.is_clean() {
            eprintln!("all {} nodes placed", layout.nodes.len());
        } else {
            if diagnostics.missing_root {
                eprintln!("no root node found");
            }
            for id in &diagnostics.duplicate_ids {
                eprintln!("duplicate id ignored: {id}");
            }
            for id in &diagnostics.extra_roots {
                eprintln!("extra root not placed: {id}");
            }
            for id in diagnostics
                .orphans
                .iter()
                .filter(|id| !diagnostics.extra_roots.contains(id))
            {
                eprintln!("unreachable node not placed: {id}");
            }
        }
    }

    Ok(())
}

fn run_outline(
    config: &AppConfig,
    note_path: &Path,
    title: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    let content = fs::read_to_string(note_path)
        .with_context(|| format!("cannot read note {}", note_path.display()))?;
    let title = title.unwrap_or_else(|| source::title_from_path(note_path));

    let generator = OutlineGenerator {
        max_label_width: config.max_label_width,
        max_nodes: config.max_nodes,
    };
    let nodes = generator.generate(&NoteInput::new(title, content))?;

    match output {
        Some(path) => {
            store::save_canonical(path, &nodes)?;
            info!(path = %path.display(), nodes = nodes.len(), "outline written");
        }
        None => println!("{}", serde_json::to_string_pretty(&nodes)?),
    }

    Ok(())
}

fn run_viewer(config: AppConfig, input: &Path, title: Option<String>) -> Result<()> {
    let map_source = MapSource::from_path(input, title)?;
    let nodes = map_source.load(&config)?;
    let mut app = AppState::new(config, nodes).with_source(map_source);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
) -> Result<()> {
    while app.running {
        app.poll_regeneration();

        terminal.draw(|frame| ui::render(frame, app))?;

        if let Some(action) = event::handle_events(app)? {
            actions::execute_action(action, app)?;
        }
    }

    Ok(())
}
