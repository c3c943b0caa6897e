//! lca: seal and open passphrase-protected `.lca` snapshot envelopes
//!
//! Commands:
//!   seal <snapshot> <envelope>   - encrypt a database snapshot into an envelope
//!   open <envelope> <snapshot>   - decrypt an envelope back into a snapshot file
//!   inspect <envelope>           - print header fields (or report a legacy file)
//!   config show                  - display the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use lca_archive::{ArchiveService, EnvelopeLayout, FileSnapshot};
use lca_core::config::LcaConfig;
use lca_crypto::CryptoContext;

/// Environment variable consulted before prompting for a passphrase
const PASSPHRASE_ENV: &str = "LCA_PASSPHRASE";

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "lca",
    version,
    about = "Seal and open passphrase-protected .lca snapshot envelopes"
)]
struct Cli {
    /// Path to config.toml
    #[arg(
        long,
        short = 'c',
        env = "LCA_CONFIG",
        default_value = "~/.config/lca/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "LCA_LOG")]
    log: Option<String>,

    /// Log format; overrides the config file
    #[arg(long, env = "LCA_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a snapshot file into an envelope
    ///
    /// The passphrase is read from LCA_PASSPHRASE, or prompted for twice.
    Seal {
        /// Snapshot file to protect
        input: PathBuf,
        /// Envelope to write
        output: PathBuf,
        /// Overwrite the output if it exists
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Decrypt an envelope (with or without a header) into a snapshot file
    Open {
        /// Envelope to read
        input: PathBuf,
        /// Snapshot file to write
        output: PathBuf,
        /// Overwrite the output if it exists
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Print an envelope's header without decrypting it
    Inspect {
        /// Envelope to read
        input: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let config = load_config(&config_path).await?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match cli.log_format.clone() {
        Some(format) => format,
        None => LogFormat::from_str(&config.log.format, true)
            .map_err(|e| anyhow::anyhow!("log.format: {e}"))?,
    };
    init_logging(&level, &format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "lca starting"
    );

    match cli.command {
        Commands::Seal { input, output, force } => cmd_seal(&config, &input, &output, force).await,
        Commands::Open { input, output, force } => cmd_open(&config, &input, &output, force).await,
        Commands::Inspect { input } => cmd_inspect(&config, &input).await,
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &config_path),
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

async fn load_config(path: &Path) -> Result<LcaConfig> {
    if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))
    } else {
        Ok(LcaConfig::default())
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so command output stays clean on stdout
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    match s.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_default();
            PathBuf::from(home).join(rest)
        }
        None => path.to_path_buf(),
    }
}

// ── Passphrase + progress helpers ─────────────────────────────────────────────

fn read_passphrase(confirm: bool) -> Result<SecretString> {
    if let Ok(value) = std::env::var(PASSPHRASE_ENV) {
        if value.is_empty() {
            anyhow::bail!("{PASSPHRASE_ENV} is set but empty");
        }
        return Ok(SecretString::from(value.as_str()));
    }

    let first = prompt_secret("Passphrase: ")?;
    if first.expose_secret().is_empty() {
        anyhow::bail!("passphrase must not be empty");
    }
    if confirm {
        let second = prompt_secret("Confirm passphrase: ")?;
        if first.expose_secret() != second.expose_secret() {
            anyhow::bail!("passphrases do not match");
        }
    }
    Ok(first)
}

fn prompt_secret(prompt: &str) -> Result<SecretString> {
    let value = rpassword::prompt_password(prompt).context("reading passphrase")?;
    Ok(SecretString::from(value.as_str()))
}

fn make_spinner(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "refusing to overwrite {} (pass --force to replace it)",
            path.display()
        );
    }
    Ok(())
}

fn archive_service(config: &LcaConfig) -> Result<ArchiveService> {
    let ctx = CryptoContext::init(&config.kdf).context("initializing crypto")?;
    Ok(ArchiveService::new(ctx))
}

// ── `lca seal` ────────────────────────────────────────────────────────────────

async fn cmd_seal(config: &LcaConfig, input: &Path, output: &Path, force: bool) -> Result<()> {
    ensure_writable(output, force)?;
    let service = archive_service(config)?;
    let passphrase = read_passphrase(true)?;

    let source = FileSnapshot::new(input);
    let pb = make_spinner("seal");
    pb.set_message(format!("deriving key ({})", service.context().archive_params()));

    let envelope = service
        .archive_snapshot(&source, &passphrase)
        .await
        .with_context(|| format!("sealing {}", input.display()))?;
    pb.finish_and_clear();

    tokio::fs::write(output, &envelope)
        .await
        .with_context(|| format!("writing envelope: {}", output.display()))?;

    println!("Sealed {} → {}", input.display(), output.display());
    println!("  bytes:  {}", fmt_bytes(envelope.len() as u64));
    println!("  kdf:    Argon2id {}", service.context().archive_params());
    Ok(())
}

// ── `lca open` ────────────────────────────────────────────────────────────────

async fn cmd_open(config: &LcaConfig, input: &Path, output: &Path, force: bool) -> Result<()> {
    ensure_writable(output, force)?;
    let service = archive_service(config)?;

    let envelope = tokio::fs::read(input)
        .await
        .with_context(|| format!("reading envelope: {}", input.display()))?;
    let passphrase = read_passphrase(false)?;

    let mut target = FileSnapshot::new(output);
    let pb = make_spinner("open");
    pb.set_message("deriving key");

    let result = service
        .restore_snapshot(&mut target, &envelope, &passphrase)
        .await;
    pb.finish_and_clear();
    result.with_context(|| format!("opening {}", input.display()))?;

    println!("Opened {} → {}", input.display(), output.display());
    Ok(())
}

// ── `lca inspect` ─────────────────────────────────────────────────────────────

async fn cmd_inspect(config: &LcaConfig, input: &Path) -> Result<()> {
    let envelope = tokio::fs::read(input)
        .await
        .with_context(|| format!("reading envelope: {}", input.display()))?;
    let layout = EnvelopeLayout::detect(&envelope);

    println!("file:       {}", input.display());
    println!("size:       {}", fmt_bytes(envelope.len() as u64));
    match layout.header() {
        Some(header) => {
            let cipher = header
                .cipher_suite()
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let kdf = header.kdf_params();
            println!("layout:     header + container");
            println!("magic:      {}", String::from_utf8_lossy(header.magic()));
            println!("instance:   {}", header.instance_id());
            println!("cipher:     {} (flag {})", cipher, header.cipher_flag());
            println!("kdf:        Argon2id {kdf}");
            if kdf.mem_cost_kib > config.kdf.max_mem_cost_kib {
                println!(
                    "warning:    memory cost exceeds configured limit ({} KiB)",
                    config.kdf.max_mem_cost_kib
                );
            }
        }
        None => {
            println!("layout:     legacy (no header)");
            println!("kdf:        Argon2id {} (assumed)", lca_crypto::KdfParams::LEGACY);
        }
    }
    println!("container:  {}", fmt_bytes(layout.container().len() as u64));
    Ok(())
}

// ── `lca config show` ─────────────────────────────────────────────────────────

fn cmd_config_show(config: &LcaConfig, path: &Path) -> Result<()> {
    println!("# config: {}", path.display());
    let text = toml::to_string_pretty(config).context("serializing config")?;
    print!("{text}");
    Ok(())
}

// ── Utilities ─────────────────────────────────────────────────────────────────

fn fmt_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    const GIB: u64 = 1024 * MIB;
    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_seal() {
        let cli = Cli::try_parse_from(["lca", "seal", "calendar.db", "calendar.lca", "--force"])
            .unwrap();
        match cli.command {
            Commands::Seal { input, output, force } => {
                assert_eq!(input, PathBuf::from("calendar.db"));
                assert_eq!(output, PathBuf::from("calendar.lca"));
                assert!(force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_log_format() {
        let cli = Cli::try_parse_from(["lca", "--log-format", "json", "inspect", "a.lca"]).unwrap();
        assert_eq!(cli.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn test_expand_tilde() {
        let home = std::env::var("HOME").unwrap_or_default();
        assert_eq!(
            expand_tilde(Path::new("~/.config/lca/config.toml")),
            PathBuf::from(home).join(".config/lca/config.toml")
        );
        assert_eq!(
            expand_tilde(Path::new("/etc/lca.toml")),
            PathBuf::from("/etc/lca.toml")
        );
    }

    #[test]
    fn test_ensure_writable() {
        let tmp = tempfile::TempDir::new().unwrap();
        let existing = tmp.path().join("out.lca");
        std::fs::write(&existing, b"x").unwrap();

        assert!(ensure_writable(&existing, false).is_err());
        assert!(ensure_writable(&existing, true).is_ok());
        assert!(ensure_writable(&tmp.path().join("new.lca"), false).is_ok());
    }

    #[test]
    fn test_fmt_bytes() {
        assert_eq!(fmt_bytes(512), "512 B");
        assert_eq!(fmt_bytes(2048), "2.0 KiB");
        assert_eq!(fmt_bytes(3 * 1024 * 1024), "3.0 MiB");
    }

    #[tokio::test]
    async fn test_load_missing_config_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("absent.toml")).await.unwrap();
        assert_eq!(config.kdf.mem_cost_kib, 65536);
    }
}
