use clap::{Parser, Subcommand};
use pushup_core::*;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "pushup")]
#[command(about = "Push-up repetition counter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Count repetitions from a recorded pose stream (JSONL, one pose per line)
    Run {
        /// Path to the pose stream file
        #[arg(long)]
        poses: PathBuf,

        /// Delay between frames in milliseconds (0 = as fast as possible)
        #[arg(long)]
        tick_ms: Option<u64>,
    },

    /// Show the repetition history
    History,

    /// Export the repetition history as CSV
    Export {
        /// Write CSV to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Clear the repetition history
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    pushup_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Run { poses, tick_ms } => cmd_run(data_dir, poses, tick_ms, &config),
        Commands::History => cmd_history(data_dir),
        Commands::Export { output } => cmd_export(data_dir, output),
        Commands::Clear { yes } => cmd_clear(data_dir, yes),
    }
}

/// Pose source reading one JSON-encoded pose per line.
///
/// Unparsable lines are logged and treated as "no person detected" so a
/// bad frame in a recording never aborts the session.
struct JsonlPoseSource {
    lines: io::Lines<BufReader<File>>,
    line_num: usize,
}

impl JsonlPoseSource {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_num: 0,
        })
    }
}

impl PoseSource for JsonlPoseSource {
    fn next_pose(&mut self) -> Result<Option<Pose>> {
        loop {
            let Some(line) = self.lines.next() else {
                return Ok(None);
            };
            self.line_num += 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<Pose>(&line) {
                Ok(pose) => return Ok(Some(pose)),
                Err(e) => {
                    tracing::warn!("Skipping unreadable pose at line {}: {}", self.line_num, e);
                    return Ok(Some(Pose::default()));
                }
            }
        }
    }
}

/// Prints the running total, one line per update.
struct StdoutCounter;

impl CounterDisplay for StdoutCounter {
    fn show_count(&mut self, count: u64) {
        println!("Push-ups: {}", count);
    }
}

fn open_history(data_dir: &Path) -> HistoryStore<FileStore> {
    HistoryStore::new(FileStore::new(data_dir))
}

fn cmd_run(
    data_dir: PathBuf,
    poses: PathBuf,
    tick_ms: Option<u64>,
    config: &Config,
) -> Result<()> {
    config.validate()?;
    store::ensure_data_dir(&data_dir)?;

    let mut source = JsonlPoseSource::open(&poses)?;
    let mut session = Session::new(RepDetector::from_config(config), open_history(&data_dir))?;

    let tick_interval = Duration::from_millis(tick_ms.unwrap_or(config.frame.tick_interval_ms));

    // Replay mode has no device switch or teardown; the stop flag stays
    // clear and the loop ends with the stream.
    let stop = AtomicBool::new(false);
    let total = session.run(&mut source, &mut StdoutCounter, &stop, tick_interval);

    println!("\n✓ Session finished: {} push-ups on record", total);
    Ok(())
}

fn cmd_history(data_dir: PathBuf) -> Result<()> {
    let history = open_history(&data_dir);
    let log = history.list()?;

    if log.is_empty() {
        println!("No repetitions recorded yet.");
        return Ok(());
    }

    println!("{:>5}  Timestamp", "#");
    for (index, event) in log.iter().enumerate() {
        println!("{:>5}  {}", index + 1, format_timestamp(&event.timestamp));
    }
    println!("\nTotal: {} push-ups", log.len());
    Ok(())
}

fn cmd_export(data_dir: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let history = open_history(&data_dir);

    let csv = match history.export_csv() {
        Ok(csv) => csv,
        Err(Error::EmptyHistory) => {
            eprintln!("Nothing to export: no repetitions recorded yet.");
            return Err(Error::EmptyHistory);
        }
        Err(e) => return Err(e),
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &csv)?;
            println!("✓ Exported history to {}", path.display());
        }
        None => print!("{}", csv),
    }

    Ok(())
}

fn cmd_clear(data_dir: PathBuf, yes: bool) -> Result<()> {
    let mut history = open_history(&data_dir);

    if !yes {
        print!("Clear all recorded repetitions? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    history.clear()?;
    println!("✓ History cleared");
    Ok(())
}
