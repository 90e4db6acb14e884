use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use tethercam::types::{Abilities, AssetLocator, CaptureKind};
use tethercam::{Camera, CameraBuilder, SimulatedDriver, TetherConfig, WidgetValue};

#[derive(Parser, Debug)]
#[command(name = "tethercam")]
#[command(about = "Remote control for a tethered camera")]
#[command(version)]
#[command(long_about = "Inspect and drive a tethered camera: read and change its \
configuration, browse its storage, trigger captures, download files and wait for \
device events. Runs against the bundled simulated device.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tethercam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the device identity
    Summary,
    /// Show the configuration tree, optionally changing widgets first
    Config {
        /// Widget assignment as PATH=VALUE, may be repeated
        #[arg(long = "set", value_name = "PATH=VALUE")]
        set: Vec<String>,
    },
    /// List folders or files on the device
    Ls {
        #[arg(default_value = "/")]
        path: String,
        #[arg(short, long)]
        recursive: bool,
        /// List files instead of folders
        #[arg(short, long)]
        files: bool,
    },
    /// Show metadata of a stored file
    Info { folder: String, name: String },
    /// Capture and report where the result was stored
    Capture {
        #[arg(long, value_enum, default_value_t = CaptureArg::Image)]
        kind: CaptureArg,
        /// Download the captured image to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Capture a preview frame to a local file
    Preview {
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Download a stored file
    Download {
        folder: String,
        name: String,
        /// Target path, defaults to the configured download directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Fetch window by window instead of in one piece
        #[arg(long)]
        chunked: bool,
    },
    /// Wait for the next device event
    WaitEvent {
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Trigger a capture before waiting
        #[arg(long)]
        trigger: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CaptureArg {
    Image,
    Movie,
    Sound,
}

impl From<CaptureArg> for CaptureKind {
    fn from(arg: CaptureArg) -> Self {
        match arg {
            CaptureArg::Image => CaptureKind::Image,
            CaptureArg::Movie => CaptureKind::Movie,
            CaptureArg::Sound => CaptureKind::Sound,
        }
    }
}

#[derive(Serialize)]
struct WidgetRow {
    path: String,
    label: String,
    kind: &'static str,
    value_type: &'static str,
    readonly: bool,
    value: WidgetValue,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting tethercam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match TetherConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }
    config.validate()?;

    let command = args.command.unwrap_or(Command::Summary);
    let mut camera = open_camera(&config)?;

    let outcome = run(&mut camera, &config, command).await;
    if let Err(e) = &outcome {
        error!("Command failed: {:#}", e);
    }
    camera.exit()?;
    outcome
}

fn open_camera(config: &TetherConfig) -> Result<Camera> {
    let driver = SimulatedDriver::demo_builder()
        .abilities(Abilities {
            model: config.simulator.model.clone(),
            id: config.simulator.id.clone(),
            library: config.simulator.library.clone(),
        })
        .build();

    let camera = CameraBuilder::new()
        .driver(Arc::new(driver))
        .config(config.clone())
        .build()
        .context("Failed to open camera")?;
    Ok(camera)
}

async fn run(camera: &mut Camera, config: &TetherConfig, command: Command) -> Result<()> {
    match command {
        Command::Summary => print_json(camera.abilities()?),
        Command::Config { set } => {
            for assignment in &set {
                apply_assignment(camera, assignment)?;
            }
            print_json(&widget_rows(camera)?)
        }
        Command::Ls {
            path,
            recursive,
            files,
        } => {
            let entries = match (files, recursive) {
                (false, false) => camera.list_folders(&path)?,
                (false, true) => camera.list_folders_recursive(&path)?,
                (true, false) => camera.list_files(&path)?,
                (true, true) => camera.list_files_recursive(&path)?,
            };
            print_json(&entries)
        }
        Command::Info { folder, name } => print_json(&camera.info(&folder, &name)?),
        Command::Capture { kind, output } => {
            let locator = camera.capture(kind.into())?;
            if let Some(path) = output {
                camera.download(&locator, &path)?;
            }
            print_json(&locator)
        }
        Command::Preview { output } => {
            let written = camera.capture_preview_to_file(&output)?;
            println!("{} bytes written to {}", written, output.display());
            Ok(())
        }
        Command::Download {
            folder,
            name,
            output,
            chunked,
        } => {
            let locator = AssetLocator::new(folder, name);
            let target = match output {
                Some(path) => path,
                None => download_target(&config.transfer.download_dir, &locator)?,
            };
            let written = if chunked {
                camera.copy_chunked_to_file(&locator, &target)?
            } else {
                camera.download(&locator, &target)?
            };
            println!("{} bytes written to {}", written, target.display());
            Ok(())
        }
        Command::WaitEvent {
            timeout_ms,
            trigger,
        } => {
            if trigger {
                camera.trigger()?;
            }
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| camera.event_timeout());
            let mut pending = camera.wait_for_event(timeout)?;
            print_json(&pending.next().await?)
        }
    }
}

/// Apply one `PATH=VALUE` assignment, parsing the value for the widget's type.
fn apply_assignment(camera: &mut Camera, assignment: &str) -> Result<()> {
    let (path, raw) = assignment
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected PATH=VALUE, got '{}'", assignment))?;

    let value_type = {
        let tree = camera.config()?;
        tree.widget(tree.lookup(path)?)?.value_type()
    };
    let value = WidgetValue::parse_as(value_type, raw)?;
    camera
        .set_widget(path, value)
        .with_context(|| format!("Failed to set {}", path))
}

fn widget_rows(camera: &Camera) -> Result<Vec<WidgetRow>> {
    let tree = camera.config()?;
    let mut rows = Vec::with_capacity(tree.len());
    for id in tree.walk()? {
        let widget = tree.widget(id)?;
        rows.push(WidgetRow {
            path: tree.path_of(id)?,
            label: widget.label().to_string(),
            kind: widget.kind().name(),
            value_type: widget.value_type_name(),
            readonly: widget.readonly(),
            value: tree.value(id)?,
        });
    }
    Ok(rows)
}

fn download_target(dir: &str, locator: &AssetLocator) -> Result<PathBuf> {
    let dir = Path::new(dir);
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create download directory {}", dir.display()))?;
    Ok(dir.join(&locator.name))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tethercam={}", log_level)));

    // Logs go to stderr so command output stays machine readable
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# tethercam configuration file");
    println!("# Every key can be overridden with TETHERCAM_<SECTION>__<KEY>");
    println!();
    println!("{}", toml::to_string_pretty(&TetherConfig::default())?);
    Ok(())
}
