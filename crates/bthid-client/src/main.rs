//! bthid-client entry point.
//!
//! Parses the command line, loads the config file, wires the infrastructure
//! adapters into the session manager and maps fatal errors to exit codes.
//!
//! # Usage
//!
//! ```text
//! bthid-client [OPTIONS]
//!
//! Options:
//!   -s, --skip-sdp        Do not register the HID service record with BlueZ
//!   -e, --device <N>      Forward only /dev/input/eventN (repeatable)
//!   -f, --fifo <PATH>     Read input records from a named pipe instead
//!   -l, --list            List input devices and exit
//!   -d, --debug           Log at debug level
//!   -x, --mute-x11        Disable the forwarded devices in the local X session
//!   -c, --config <PATH>   Config file [default: ~/.config/bthid/config.toml]
//! ```
//!
//! # Exit codes
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | clean shutdown                                            |
//! | 1    | invalid configuration, SDP registration failure           |
//! | 2    | no usable input source, Bluetooth socket creation failure |
//! | 3    | bind failure                                              |
//! | 4    | listen failure                                            |
//! | 11   | control listener wait failed                              |
//! | 12   | interrupt listener wait failed                            |
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ run()
//!       ├─ ShutdownFlag        (SIGINT / SIGTERM / SIGHUP)
//!       ├─ SourceSet           (event devices or fifo)
//!       ├─ MutedDevices        (optional, xinput)
//!       ├─ BluetoothTransport  (L2CAP PSM 17 + 19)
//!       └─ run_registered(BluezRegistrar)
//!            └─ SessionManager::run()
//! ```

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bthid_client::application::service::{run_registered, RegistrationError};
use bthid_client::application::session::{InputError, SessionError, SessionManager, TransportError};
use bthid_client::application::shutdown::ShutdownFlag;
use bthid_client::infrastructure::bluetooth::BluetoothTransport;
use bthid_client::infrastructure::console;
use bthid_client::infrastructure::devices::print_devices;
use bthid_client::infrastructure::input::{InputSource, SourceSet, MAX_EVENT_DEVICES};
use bthid_client::infrastructure::sdp::bluez::BluezRegistrar;
use bthid_client::infrastructure::storage::config::{load_config, AppConfig, ConfigError};
use bthid_client::infrastructure::xinput::{MutedDevices, XinputMuter};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Virtual Bluetooth keyboard and mouse.
///
/// Forwards local keyboard and mouse input to a remote host that pairs with
/// this machine as a Bluetooth HID device.  Release PAUSE to drop the host;
/// LeftCtrl+LeftAlt+PAUSE quits.
#[derive(Debug, Parser)]
#[command(
    name = "bthid-client",
    about = "Present local input devices to a remote host as a Bluetooth keyboard and mouse",
    version
)]
struct Cli {
    /// Skip SDP registration (the record is already published elsewhere).
    #[arg(short = 's', long = "skip-sdp")]
    skip_sdp: bool,

    /// Forward only /dev/input/eventN.  May be given several times.
    #[arg(
        short = 'e',
        long = "device",
        value_name = "N",
        value_parser = clap::value_parser!(u8).range(0..i64::from(MAX_EVENT_DEVICES))
    )]
    devices: Vec<u8>,

    /// Read raw input records from this named pipe (created if absent).
    #[arg(short = 'f', long, value_name = "PATH", conflicts_with = "devices")]
    fifo: Option<PathBuf>,

    /// List the available input devices and exit.
    #[arg(short = 'l', long)]
    list: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short = 'd', long)]
    debug: bool,

    /// Disable the forwarded devices in the local X session while running.
    #[arg(short = 'x', long = "mute-x11")]
    mute_x11: bool,

    /// Config file to use instead of the default location.
    #[arg(short = 'c', long, value_name = "PATH", env = "BTHID_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Command-line flags win over the config file.
    fn apply(&self, config: &mut AppConfig) {
        if self.skip_sdp {
            config.bluetooth.register_sdp = false;
        }
        if !self.devices.is_empty() {
            config.input.devices = self.devices.clone();
            config.input.fifo = None;
        }
        if let Some(fifo) = &self.fifo {
            config.input.fifo = Some(fifo.clone());
            config.input.devices.clear();
        }
        if self.mute_x11 {
            config.input.mute_x11 = true;
        }
    }
}

// ── Fatal error classes ───────────────────────────────────────────────────────

/// Everything that ends the process with a non-zero status.
#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl StartupError {
    fn exit_code(&self) -> u8 {
        match self {
            StartupError::Config(_) | StartupError::Registration(_) => 1,
            StartupError::Input(_) => 2,
            StartupError::Transport(e) => match e {
                TransportError::Socket { .. } => 2,
                TransportError::Bind { .. } => 3,
                TransportError::Listen { .. } => 4,
                _ => 1,
            },
            StartupError::Session(SessionError::ControlListener(_)) => 11,
            StartupError::Session(SessionError::InterruptListener(_)) => 12,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging needs the config's level, so the config is loaded first and
    // any error reported once the subscriber exists.
    let config = load_config(cli.config.as_deref());
    init_logging(
        cli.debug,
        config.as_ref().ok().map(|c| c.logging.level.as_str()),
    );

    let result = config
        .map_err(StartupError::from)
        .context("cannot load configuration")
        .and_then(|config| run(&cli, config));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            let code = e.downcast_ref::<StartupError>().map_or(1, StartupError::exit_code);
            ExitCode::from(code)
        }
    }
}

/// `RUST_LOG` first, then `--debug`, then the config file.
fn init_logging(debug: bool, configured: Option<&str>) {
    let fallback = if debug { "debug" } else { configured.unwrap_or("info") };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(cli: &Cli, mut config: AppConfig) -> anyhow::Result<()> {
    cli.apply(&mut config);
    config.validate().map_err(StartupError::from)?;

    if cli.list {
        print_devices(&config.input.device_dir, &XinputMuter, &mut io::stdout().lock())
            .context("cannot write device list")?;
        return Ok(());
    }

    info!("bthid-client starting");

    let shutdown = ShutdownFlag::new();
    shutdown
        .register_termination_signals()
        .context("cannot install signal handlers")?;

    let input = match &config.input.fifo {
        Some(path) => SourceSet::open_fifo(path),
        None => SourceSet::open_devices(&config.input.device_dir, &config.input.devices),
    }
    .map_err(StartupError::from)
    .context("cannot open input")?;

    // Unmutes on drop, after the devices themselves are closed.
    let _muted = (config.input.mute_x11 && config.input.fifo.is_none()).then(|| {
        MutedDevices::mute(
            XinputMuter,
            input.sources().iter().filter_map(InputSource::device_name),
        )
    });

    let transport = BluetoothTransport::bind(
        config.bluetooth.control_psm,
        config.bluetooth.interrupt_psm,
    )
    .map_err(StartupError::from)
    .context("cannot set up Bluetooth listeners")?;

    let mut manager =
        SessionManager::new(input, transport, config.to_session_config(), shutdown);

    let outcome = if config.bluetooth.register_sdp {
        let record = config.service_record().to_xml();
        let mut registrar = BluezRegistrar::new();
        run_registered(&mut registrar, &record, || manager.run())
            .map_err(StartupError::from)
            .context("HID service registration failed")?
    } else {
        manager.run()
    };
    drop(manager);
    // Keystrokes typed while forwarding must not reach the shell.
    console::discard_pending_stdin();

    outcome.map_err(StartupError::from)?;
    info!("bthid-client stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
