mod ui;

use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use clap::{error::ErrorKind, ArgGroup, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::info;
use webbrowser::Browser;

use stroll::{
    app::{App, KeyOutcome},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, NarratorKind},
    logging,
    narration::{HttpNarrationService, NarrationService, TemplateNarrator},
    provider::{
        FileRouteProvider, OsrmRouteProvider, RouteProvider, RouteQuery, StraightLineProvider,
    },
    runtime::{
        ChannelEventSource, CrosstermEventSource, FixedTicker, Runner, ThreadDispatcher,
        WalkerEvent, WalkerEventSource,
    },
    util::format_distance,
    Coordinate, Route, Simulation, WalkError, WalkSettings, WalkState,
};

use crate::ui::WalkScreen;

/// Upper bound on how long the screen goes without a redraw.
const UI_REFRESH_MS: u64 = 250;

/// walk a route at your own pace and hear about where you are
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal walking-tour simulator: it moves a walker along a route at the pace you set and narrates the surroundings as you go."
)]
#[clap(group(ArgGroup::new("source").required(true).args(["route", "from"])))]
pub struct Cli {
    /// route file to walk (.json, .geojson or .csv with lat,lng columns)
    #[clap(short = 'r', long)]
    route: Option<PathBuf>,

    /// start point as LAT,LNG
    #[clap(long, requires = "to", allow_hyphen_values = true)]
    from: Option<Coordinate>,

    /// end point as LAT,LNG
    #[clap(long, requires = "from", allow_hyphen_values = true)]
    to: Option<Coordinate>,

    /// walk a straight line between --from and --to instead of asking the routing service
    #[clap(long)]
    straight: bool,

    /// walking pace in km/h
    #[clap(short = 'p', long)]
    pace: Option<f64>,

    /// milliseconds between position updates
    #[clap(long)]
    tick_ms: Option<u64>,

    /// seconds between narrations
    #[clap(long)]
    narration_secs: Option<u64>,

    /// where narration comes from
    #[clap(long, value_enum)]
    narrator: Option<NarratorKind>,

    /// narration endpoint used by the http narrator
    #[clap(long)]
    endpoint: Option<String>,

    /// print narration to stdout instead of opening the terminal UI
    #[clap(long)]
    headless: bool,

    /// remember pace, cadence and narrator settings for next time
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Command line values win over the stored config
    fn apply(&self, cfg: &mut Config) {
        if let Some(pace) = self.pace {
            cfg.pace_kmh = pace;
        }
        if let Some(ms) = self.tick_ms {
            cfg.tick_ms = ms;
        }
        if let Some(secs) = self.narration_secs {
            cfg.narration_secs = secs;
        }
        if let Some(narrator) = self.narrator {
            cfg.narrator = narrator;
        }
        if let Some(endpoint) = &self.endpoint {
            cfg.narrator_endpoint = Some(endpoint.clone());
        }
    }

    fn route_query(&self) -> Option<RouteQuery> {
        match (&self.route, self.from, self.to) {
            (Some(path), _, _) => Some(RouteQuery::File(path.clone())),
            (None, Some(start), Some(end)) => Some(RouteQuery::Between { start, end }),
            _ => None,
        }
    }

    fn route_label(&self) -> String {
        match (&self.route, self.from, self.to) {
            (Some(path), _, _) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            (None, Some(start), Some(end)) => format!("{start} to {end}"),
            _ => String::from("route"),
        }
    }
}

fn load_route(cli: &Cli, cfg: &Config) -> Result<Route, WalkError> {
    let query = cli
        .route_query()
        .ok_or_else(|| WalkError::RouteUnavailable("no route given".to_string()))?;

    let points = match &query {
        RouteQuery::File(_) => FileRouteProvider.fetch(&query)?,
        RouteQuery::Between { .. } if cli.straight => StraightLineProvider.fetch(&query)?,
        RouteQuery::Between { .. } => {
            OsrmRouteProvider::new(cfg.routing_endpoint.clone()).fetch(&query)?
        }
    };
    Route::new(points)
}

fn build_narrator(cfg: &Config) -> Option<Arc<dyn NarrationService>> {
    match (cfg.narrator, &cfg.narrator_endpoint) {
        (NarratorKind::Template, _) => Some(Arc::new(TemplateNarrator)),
        (NarratorKind::Http, Some(endpoint)) => {
            Some(Arc::new(HttpNarrationService::new(endpoint.clone())))
        }
        (NarratorKind::Http, None) => None,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !cli.headless && !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty (or use --headless)")
            .exit();
    }

    if let Some(path) = AppDirs::log_path() {
        logging::init(&path);
    }

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);
    if cli.save_config {
        store.save(&config)?;
        info!(path = %store.path().display(), "config saved");
    }

    let Some(narrator) = build_narrator(&config) else {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::MissingRequiredArgument,
            "the http narrator needs --endpoint",
        )
        .exit();
    };

    let route = load_route(&cli, &config)?;
    let label = cli.route_label();

    if cli.headless {
        return run_headless(route, &config, narrator);
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, route, label, &config, narrator);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    route: Route,
    label: String,
    config: &Config,
    narrator: Arc<dyn NarrationService>,
) -> Result<(), Box<dyn Error>> {
    let settings = WalkSettings::from(config);
    let refresh = settings
        .tick_period
        .min(Duration::from_millis(UI_REFRESH_MS));
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(refresh));
    let dispatcher = ThreadDispatcher::new(narrator, runner.event_source().sender());

    let sim = Simulation::with_route(settings, route, dispatcher)?;
    let mut app = App::new(sim, label);

    loop {
        terminal.draw(|f| f.render_widget(WalkScreen::new(&app), f.area()))?;

        match runner.step() {
            WalkerEvent::Key(key) => match app.handle_key(key, Instant::now()) {
                KeyOutcome::Quit => break,
                KeyOutcome::OpenMap(url) => {
                    if Browser::is_available() {
                        webbrowser::open(&url).unwrap_or_default();
                    }
                }
                KeyOutcome::Handled => {}
            },
            WalkerEvent::Narration(outcome) => {
                app.on_narration(outcome);
            }
            WalkerEvent::Tick | WalkerEvent::Resize => {}
        }

        app.poll(Instant::now());
    }

    Ok(())
}

fn run_headless(
    route: Route,
    config: &Config,
    narrator: Arc<dyn NarrationService>,
) -> Result<(), Box<dyn Error>> {
    let settings = WalkSettings::from(config);
    let runner = Runner::new(
        ChannelEventSource::new(),
        FixedTicker::new(settings.tick_period),
    );
    let dispatcher = ThreadDispatcher::new(narrator, runner.event_source().sender());

    let mut sim = Simulation::with_route(settings, route, dispatcher)?;
    sim.start(Instant::now())?;

    let mut out = io::stdout().lock();
    let mut printed = 0;

    loop {
        if let WalkerEvent::Narration(outcome) = runner.step() {
            sim.on_narration(outcome);
        }
        sim.poll(Instant::now());

        for ev in &sim.log()[printed..] {
            writeln!(out, "[{}] {}", ev.timestamp.format("%H:%M:%S"), ev.message)?;
        }
        printed = sim.log().len();

        if sim.state() == WalkState::Stopped && !sim.narration_in_flight() {
            break;
        }
    }

    let total = sim.route().map(|r| r.total_distance()).unwrap_or(0.0);
    writeln!(
        out,
        "Walked {} of {}.",
        format_distance(sim.distance_traveled()),
        format_distance(total)
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_route_file() {
        let cli = Cli::parse_from(["stroll", "-r", "walk.geojson"]);
        assert_eq!(cli.route, Some(PathBuf::from("walk.geojson")));
        assert_eq!(cli.pace, None);
        assert!(!cli.headless);
        assert_eq!(
            cli.route_query(),
            Some(RouteQuery::File(PathBuf::from("walk.geojson")))
        );
        assert_eq!(cli.route_label(), "walk.geojson");
    }

    #[test]
    fn test_cli_endpoints() {
        let cli = Cli::parse_from([
            "stroll",
            "--from",
            "-33.8568,151.2153",
            "--to",
            "-33.8523,151.2108",
            "--straight",
        ]);
        assert!(cli.straight);
        assert_eq!(
            cli.from,
            Some(Coordinate {
                lat: -33.8568,
                lng: 151.2153
            })
        );
        assert!(matches!(
            cli.route_query(),
            Some(RouteQuery::Between { .. })
        ));
    }

    #[test]
    fn test_cli_requires_a_source() {
        assert!(Cli::try_parse_from(["stroll"]).is_err());
        assert!(Cli::try_parse_from(["stroll", "--from", "1,2"]).is_err());
        assert!(Cli::try_parse_from(["stroll", "--from", "1,2", "--to", "bad"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "stroll",
            "-r",
            "x.csv",
            "-p",
            "6.5",
            "--tick-ms",
            "200",
            "--narration-secs",
            "5",
            "--narrator",
            "http",
            "--endpoint",
            "http://localhost:9000/narrate",
        ]);
        let mut cfg = Config::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.pace_kmh, 6.5);
        assert_eq!(cfg.tick_ms, 200);
        assert_eq!(cfg.narration_secs, 5);
        assert_eq!(cfg.narrator, NarratorKind::Http);
        assert_eq!(
            cfg.narrator_endpoint.as_deref(),
            Some("http://localhost:9000/narrate")
        );
    }

    #[test]
    fn test_http_narrator_needs_endpoint() {
        let cfg = Config {
            narrator: NarratorKind::Http,
            ..Default::default()
        };
        assert!(build_narrator(&cfg).is_none());
        assert!(build_narrator(&Config::default()).is_some());
    }

    #[test]
    fn test_straight_route_loads() {
        let cli = Cli::parse_from(["stroll", "--from", "0,0", "--to", "0,0.001", "--straight"]);
        let route = load_route(&cli, &Config::default()).unwrap();
        assert_eq!(route.len(), 2);
    }
}
