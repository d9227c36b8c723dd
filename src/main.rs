use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[cfg_attr(not(windows), allow(dead_code))]
#[command(
    name = "app_defaulter",
    about = "Set Windows default file associations from a configuration file",
    after_help = "Config file: line 1 is the executable, every further line an extension \
                  (with or without leading dot). Lines starting with # are comments.\n\
                  Extensions without a default get the app as default; the others only get \
                  it added to 'Open with' unless --force is given."
)]
struct Cli {
    /// Plain-text (or .toml) configuration file
    config: String,

    /// Show what would be done without making changes
    #[arg(short = 'n', long, default_value_t = false)]
    dry_run: bool,

    /// Set as default even if one already exists
    #[arg(short, long, default_value_t = false)]
    force: bool,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// JSONL audit file (append)
    #[arg(long)]
    jsonl: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env()
            .add_directive(level.into()))
        .with_target(false)
        .compact()
        .init();

    run(cli)
}

#[cfg(not(windows))]
fn run(_cli: Cli) -> Result<()> {
    anyhow::bail!("this tool only works on Windows")
}

#[cfg(windows)]
fn run(cli: Cli) -> Result<()> {
    use app_defaulter::{
        config::Config,
        driver::{self, Action},
        registry::windows::WindowsRegistry,
        report::AuditLog,
        shell,
    };
    use tracing::{info, warn};

    let admin = shell::is_admin();
    if !admin {
        warn!("not running as Administrator; some operations may fail");
    }

    let cfg = Config::load(&cli.config)?;
    let exe = cfg.resolve_executable()?;
    let store = WindowsRegistry::new();

    println!("Configuration loaded:");
    println!("  Executable: {}", exe);
    println!("  App Name:   {}", exe.stem());
    println!("  Extensions: {}", cfg.extensions.join(", "));
    if cli.force {
        println!("  Mode:       FORCE (will override existing defaults)");
    } else {
        println!("  Mode:       Respect existing defaults");
    }
    println!();

    info!("checking existing associations");
    let plan = driver::plan(&store, &exe, &cfg.extensions, cli.force);
    for p in &plan {
        let q = &p.query;
        if q.has_default {
            println!("  {:10} -> Default: {}", q.extension, q.handler_name());
            if cli.verbose {
                if let Some(path) = &q.executable {
                    println!("             Path: {}", path);
                }
            }
        } else {
            println!("  {:10} -> No default application", q.extension);
        }
    }
    println!();

    if cli.dry_run {
        println!("[DRY RUN] Would perform the following actions:");
        println!();
        println!("1. Register application: {}", exe.file_name());
        println!();
        for p in &plan {
            let ext = p.extension();
            match p.action {
                Action::AddToOpenWith => println!(
                    "  {ext}: Add to 'Open with' list (keeping default: {})",
                    p.query.handler_name()
                ),
                Action::OverrideDefault => {
                    println!("  {ext}: OVERRIDE existing default -> Set {} as default", exe.stem())
                }
                Action::SetDefault => {
                    println!("  {ext}: Set {} as DEFAULT (no existing default)", exe.stem())
                }
            }
        }
        println!();
        println!("2. Notify Windows Shell of changes");
        return Ok(());
    }

    let report = driver::execute(&store, &exe, plan);

    if let Some(path) = &cli.jsonl {
        match AuditLog::open(path) {
            Ok(mut log) => {
                if let Err(e) = log.record_run(&exe, &report) {
                    warn!("audit write error: {e}");
                }
            }
            Err(e) => warn!("{e:#}"),
        }
    }

    shell::notify_association_change();
    info!("notified Windows Shell of association changes");

    let s = report.summary;
    println!();
    println!("Summary -> set as default: {}, added to 'Open with': {}, failed: {}",
        s.set_as_default, s.added_to_open_with, s.failed);

    if s.failed > 0 && !admin {
        println!("Tip: Run as Administrator for better results.");
    }
    if s.changed_anything() {
        println!("Changes applied. You may need to restart Explorer or log out/in for all changes to take effect.");
        if s.added_to_open_with > 0 {
            println!("To open files with {}: right-click a file -> 'Open with' -> Choose another app.", exe.stem());
        }
    }
    Ok(())
}
