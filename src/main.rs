use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use clap::{Parser, Subcommand, ValueEnum};

use pitwall::config::ReplayConfig;
use pitwall::replay::SessionState;
use pitwall::source::{RecordedSource, SessionKind, TelemetrySource};
use pitwall::PitwallError;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Directory holding schedule and session recordings; defaults to the
    /// config file value
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the recorded events of a season
    Schedule {
        #[arg(short, long)]
        year: u16,
    },
    /// Load a session and print the replay summary
    Load {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Load a session and write a frame range as JSON lines
    Export {
        #[command(flatten)]
        session: SessionArgs,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Exclusive end index; defaults to the last frame
        #[arg(long)]
        end: Option<usize>,
    },
    /// Load a session and print one analysis view
    Analyze {
        #[command(flatten)]
        session: SessionArgs,

        #[arg(short, long, value_enum)]
        view: AnalysisView,

        /// Driver code, required for sector and telemetry views
        #[arg(long)]
        driver: Option<String>,

        /// Lap number for the telemetry view; fastest lap when omitted
        #[arg(long)]
        lap: Option<u32>,
    },
}

#[derive(clap::Args, Debug)]
struct SessionArgs {
    #[arg(short, long)]
    year: u16,

    #[arg(short, long)]
    round: u32,

    /// Session type: R, Q, or S
    #[arg(short, long, default_value = "R")]
    session: SessionKind,

    #[arg(long)]
    fps: Option<u32>,
}

#[derive(ValueEnum, Clone, Debug)]
enum AnalysisView {
    LapTimes,
    Strategy,
    Sectors,
    Weather,
    Telemetry,
}

fn state_for(
    args: &SessionArgs,
    data_dir: Option<PathBuf>,
) -> Result<SessionState<RecordedSource>, PitwallError> {
    let mut config = ReplayConfig::from_local_file().unwrap_or_default();
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    if let Some(fps) = args.fps {
        config.fps = fps;
    }
    let source = RecordedSource::new(config.data_dir.clone());
    let state = SessionState::new(source, config);
    state.load(args.year, args.round, args.session)?;
    Ok(state)
}

fn schedule(year: u16, data_dir: Option<PathBuf>) -> Result<(), PitwallError> {
    let mut config = ReplayConfig::from_local_file().unwrap_or_default();
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    let source = RecordedSource::new(config.data_dir);
    let events = source.list_events(year)?;
    println!("{}", serde_json::to_string_pretty(&events).unwrap());
    Ok(())
}

fn load(args: &SessionArgs, data_dir: Option<PathBuf>) -> Result<(), PitwallError> {
    let state = state_for(args, data_dir)?;
    let session = state.session()?;
    println!(
        "{}",
        serde_json::to_string_pretty(&session.summary()).unwrap()
    );
    for dropped in session.dropped_drivers() {
        log::warn!("driver {} not in replay: {:?}", dropped.code, dropped.reason);
    }
    Ok(())
}

fn export(
    args: &SessionArgs,
    data_dir: Option<PathBuf>,
    output: &PathBuf,
    start: usize,
    end: Option<usize>,
) -> Result<(), PitwallError> {
    let state = state_for(args, data_dir)?;
    let session = state.session()?;
    let end = end.unwrap_or(session.total_frames());

    let file = File::create(output).map_err(|e| PitwallError::ExportError { source: e })?;
    let mut writer = BufWriter::new(file);
    for frame in session.frames(start, end) {
        writeln!(writer, "{}", serde_json::to_string(frame).unwrap())
            .map_err(|e| PitwallError::ExportError { source: e })?;
    }
    writer
        .flush()
        .map_err(|e| PitwallError::ExportError { source: e })?;
    log::info!("wrote frames [{start}, {end}) to {}", output.display());
    Ok(())
}

fn analyze(
    args: &SessionArgs,
    data_dir: Option<PathBuf>,
    view: &AnalysisView,
    driver: Option<&str>,
    lap: Option<u32>,
) -> Result<(), PitwallError> {
    let state = state_for(args, data_dir)?;

    let output = match view {
        AnalysisView::LapTimes => serde_json::to_string_pretty(&state.lap_time_analysis()?),
        AnalysisView::Strategy => serde_json::to_string_pretty(&state.tyre_strategy()?),
        AnalysisView::Weather => serde_json::to_string_pretty(&state.weather_series()?),
        AnalysisView::Sectors => {
            let code = driver.ok_or_else(|| PitwallError::UnknownDriver {
                code: "(missing --driver)".to_string(),
            })?;
            serde_json::to_string_pretty(&state.sector_analysis(code)?)
        }
        AnalysisView::Telemetry => {
            let code = driver.ok_or_else(|| PitwallError::UnknownDriver {
                code: "(missing --driver)".to_string(),
            })?;
            serde_json::to_string_pretty(&state.driver_telemetry(code, lap)?)
        }
    };
    println!("{}", output.unwrap());
    Ok(())
}

fn main() {
    colog::init();

    let cli = Args::parse();
    match &cli.command {
        Commands::Schedule { year } => {
            schedule(*year, cli.data_dir.clone()).expect("Error listing schedule");
        }
        Commands::Load { session } => {
            load(session, cli.data_dir.clone()).expect("Error loading session");
        }
        Commands::Export {
            session,
            output,
            start,
            end,
        } => {
            export(session, cli.data_dir.clone(), output, *start, *end)
                .expect("Error exporting frames");
        }
        Commands::Analyze {
            session,
            view,
            driver,
            lap,
        } => {
            analyze(session, cli.data_dir.clone(), view, driver.as_deref(), *lap)
                .expect("Error running analysis");
        }
    };
}
