//! xray-cli: turn a VLESS link into a ready-to-run Xray deployment.
//!
//! # Data Flow
//! ```text
//! vless:// link + CLI flags
//!     → link registry (parse & validate)
//!     → config builder (full engine document)
//!     → persist (<xray dir>/config.json, atomic write)
//!     → systemd unit file (system or user space)
//!     → printed systemctl instructions (never executed here)
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use xray_cli::config::builder;
use xray_cli::link::LinkRegistry;
use xray_cli::persist;
use xray_cli::systemd::{self, UnitFile};

const CONFIG_FILE_NAME: &str = "config.json";
const UNIT_DESCRIPTION: &str = "Xray Core service";
const RESTART_POLICY: &str = "on-failure";

#[derive(Parser)]
#[command(name = "xray-cli")]
#[command(about = "Generate an Xray config and systemd unit from a VLESS link", long_about = None)]
struct Cli {
    /// Connection link (vless://...)
    #[arg(short, long)]
    link: String,

    /// Path to the xray binary
    #[arg(short = 'x', long)]
    xray_path: PathBuf,

    /// Local socks inbound port
    #[arg(short, long, default_value_t = builder::DEFAULT_SOCKS_PORT)]
    port: u16,

    /// Directory or file path for the unit file (default: the systemd
    /// system or user unit directory)
    #[arg(long)]
    unit_path: Option<PathBuf>,

    /// Target the system space (/etc/systemd/system, requires root)
    /// instead of the user space (~/.config/systemd/user)
    #[arg(long)]
    system: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xray_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let xray_path = std::path::absolute(&cli.xray_path)?;
    let xray_dir = xray_path
        .parent()
        .ok_or("xray binary path has no parent directory")?
        .to_path_buf();
    let config_path = xray_dir.join(CONFIG_FILE_NAME);

    let registry = LinkRegistry::with_builtin_parsers();
    let descriptor = registry.parse(&cli.link)?;
    tracing::info!(
        host = %descriptor.host,
        port = descriptor.port,
        network = %descriptor.network,
        security = %descriptor.security,
        "Link parsed"
    );

    let document = builder::build(&descriptor, cli.port);
    persist::persist(&document, &config_path)?;
    tracing::info!(path = %config_path.display(), "Configuration written");

    let (unit_path, wanted_by) = resolve_unit_placement(&cli)?;
    let unit = UnitFile {
        description: UNIT_DESCRIPTION.to_string(),
        working_dir: xray_dir,
        exec_start: systemd::exec_start(&xray_path, &config_path),
        restart: RESTART_POLICY.to_string(),
        wanted_by: wanted_by.to_string(),
    };
    unit.write(&unit_path)?;
    tracing::info!(path = %unit_path.display(), "Unit file written");

    print_next_steps(cli.system);
    Ok(())
}

fn resolve_unit_placement(cli: &Cli) -> Result<(PathBuf, &'static str), Box<dyn std::error::Error>> {
    let wanted_by = if cli.system {
        "multi-user.target"
    } else {
        "default.target"
    };

    if let Some(path) = &cli.unit_path {
        return Ok((systemd::normalize_unit_path(path), wanted_by));
    }

    if cli.system {
        Ok((
            Path::new(systemd::SYSTEM_UNIT_DIR).join(systemd::UNIT_NAME),
            wanted_by,
        ))
    } else {
        let home = std::env::var_os("HOME")
            .ok_or("HOME is not set; pass --unit-path or --system")?;
        Ok((
            PathBuf::from(home)
                .join(systemd::USER_UNIT_DIR)
                .join(systemd::UNIT_NAME),
            wanted_by,
        ))
    }
}

fn print_next_steps(system: bool) {
    let scope = if system { "" } else { " --user" };
    println!("Unit installed. Enable and start it with:");
    println!("  systemctl{scope} daemon-reload");
    println!("  systemctl{scope} enable --now {}", systemd::UNIT_NAME);
    println!(
        "  journalctl{} -u {} -n 50 --no-pager",
        if system { "" } else { " --user" },
        systemd::UNIT_NAME
    );
}
