mod app;
mod config;
mod format;
mod theme;
mod ui;
mod weather;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::{App, Focus, Popup, FETCH_ERROR_MESSAGE};
use config::AppConfig;
use theme::Theme;
use weather::{OpenMeteoClient, Place, Unit, WeatherSnapshot};

#[derive(Parser, Debug)]
#[command(name = "weathernow")]
#[command(version)]
#[command(about = "Search a place and see its current weather, right in the terminal")]
struct Args {
    /// Print places matching NAME as JSON and exit
    #[arg(long, value_name = "NAME")]
    search: Option<String>,

    /// Print current conditions as JSON (for waybar and scripts) and exit
    #[arg(short, long)]
    now: bool,

    /// Place for --now (first search match); defaults to the last viewed place
    #[arg(short, long, value_name = "NAME", requires = "now")]
    place: Option<String>,

    /// Units: c (°C, km/h, mm) or f (°F, mph, in)
    #[arg(short, long)]
    unit: Option<Unit>,

    /// Use this config file instead of the default one
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cli_mode = args.search.is_some() || args.now;

    init_logging(!cli_mode)?;

    let config_path = match args.config {
        Some(path) => path,
        None => AppConfig::default_path()?,
    };
    let mut config = AppConfig::load(&config_path)?;
    if let Some(unit) = args.unit {
        config.unit = unit;
    }

    // Handle CLI-only commands
    if let Some(name) = args.search {
        return print_search(&config, &name).await;
    }

    if args.now {
        return print_now(&config, args.place.as_deref()).await;
    }

    // Run TUI
    ui::init_theme(Theme::load(config.theme_file.as_deref()));
    run_tui(config, config_path).await
}

/// Log to stderr for CLI commands, to a file while the TUI owns the screen
fn init_logging(to_file: bool) -> Result<()> {
    let default_level = if to_file { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if to_file {
        let log_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?
            .join("weathernow");
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Could not create {}", log_dir.display()))?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("weathernow.log"))
            .context("Could not open log file")?;

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .with(filter)
            .init();
    }

    Ok(())
}

async fn print_search(config: &AppConfig, name: &str) -> Result<()> {
    let client = OpenMeteoClient::new(&config.api)?;

    let places = match client.search(name).await {
        Ok(places) => places,
        Err(e) => {
            tracing::warn!("Search for '{}' failed: {}", name, e);
            Vec::new()
        }
    };

    println!("{}", serde_json::to_string_pretty(&places)?);
    Ok(())
}

async fn print_now(config: &AppConfig, place_name: Option<&str>) -> Result<()> {
    let client = OpenMeteoClient::new(&config.api)?;

    let place = match place_name {
        Some(name) => match client.search(name).await {
            Ok(places) => places.into_iter().next(),
            Err(e) => {
                tracing::warn!("Search for '{}' failed: {}", name, e);
                None
            }
        },
        None => config.last_place.clone(),
    };

    let Some(place) = place else {
        anyhow::bail!("No place found; pass --place NAME or pick one in the TUI first");
    };

    let output = match client.forecast(&place, config.unit).await {
        Ok(snapshot) => status_json(&place, &snapshot),
        Err(e) => {
            tracing::error!("Weather fetch for {} failed: {}", place.name, e);
            serde_json::json!({
                "text": "",
                "tooltip": format!("{}\n{}", place.display_name(), FETCH_ERROR_MESSAGE),
                "class": "error",
                "place": place,
            })
        }
    };

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

/// Waybar-compatible status: `text`, `tooltip`, `class`, plus the raw data
fn status_json(place: &Place, snapshot: &WeatherSnapshot) -> serde_json::Value {
    let current = &snapshot.current;
    let condition = snapshot.condition();
    let class = if current.is_day { "day" } else { "night" };

    let tooltip = [
        place.display_name(),
        condition.label.to_string(),
        format!(
            "Feels like {}",
            format::format_temperature(current.apparent_temperature, snapshot.unit)
        ),
        format!("Humidity {}", format::format_humidity(current.relative_humidity)),
        format!(
            "Wind {} {}",
            format::format_wind_speed(current.wind_speed, snapshot.unit),
            format::deg_to_compass(current.wind_direction)
        ),
        format!(
            "Sunrise {} · Sunset {}",
            format::format_local_time(snapshot.sunrise),
            format::format_local_time(snapshot.sunset)
        ),
    ]
    .join("\n");

    serde_json::json!({
        "text": format!(
            "{} {}",
            condition.icon(current.is_day),
            format::format_temperature(current.temperature, snapshot.unit)
        ),
        "tooltip": tooltip,
        "class": class,
        "alt": class,
        "weather_code": condition.code,
        "place": place,
        "conditions": snapshot,
    })
}

async fn run_tui(config: AppConfig, config_path: PathBuf) -> Result<()> {
    // Create app state before touching the terminal so config errors print normally
    let mut app = App::new(config, Some(config_path))?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q')
                            if app.focus == Focus::Conditions && app.popup == Popup::None =>
                        {
                            return Ok(())
                        }
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key) {
                                tracing::warn!("Key handling failed: {}", e);
                                app.status_message = Some(format!("Error: {}", e));
                                app.status_message_time = Some(std::time::Instant::now());
                            }
                        }
                    }
                }
            }
        }

        // Apply finished searches/fetches
        app.tick();

        // Let spawned requests make progress between frames
        tokio::task::yield_now().await;
    }
}
