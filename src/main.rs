//! Insights CLI
//!
//! Command-line front end for the insights dashboard:
//! - Log in and out
//! - Show the dashboard, optionally filtered by date
//! - Watch the dashboard and change the filter interactively

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use insights_dashboard::insights::parse_bound;
use insights_dashboard::view::render_login;
use insights_dashboard::{
    generate_default_config, render_dashboard, App, AppError, Config, DashboardPage,
    DashboardView, DateRange, LoadOutcome, LoggingConfig, Navigation, Route,
};

#[derive(Parser)]
#[command(name = "insights")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Business insights dashboard in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Insights API base URL (overrides config)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Config file (default: search standard locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open a route: "/", "/login" or "/dashboard"
    Open {
        #[arg(default_value = "/")]
        route: Route,
    },

    /// Log in and show the dashboard
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Load and show the dashboard once
    Dashboard {
        /// Lower date bound (YYYY-MM-DD)
        #[arg(long, value_parser = parse_bound)]
        from: Option<String>,
        /// Upper date bound (YYYY-MM-DD)
        #[arg(long, value_parser = parse_bound)]
        to: Option<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the dashboard and read filter commands from stdin
    Watch {
        #[arg(long, value_parser = parse_bound)]
        from: Option<String>,
        #[arg(long, value_parser = parse_bound)]
        to: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

const WATCH_HELP: &str =
    "Commands: from <YYYY-MM-DD>, to <YYYY-MM-DD>, clear, reload, show, logout, quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(api_base) = cli.api_base {
        config.api.base_url = api_base;
    }

    init_logging(&config.logging);

    let app = App::from_config(config)?;

    match cli.command {
        Commands::Open { route } => match app.navigate(route).await? {
            Navigation::Login { .. } => print!("{}", render_login(None)),
            Navigation::Dashboard(mut page) => {
                let outcome = page.loaded().await;
                print!("{}", page.render().await);
                exit_on_failure(&outcome);
            }
        },

        Commands::Login { email, password } => match app.login(&email, &password).await {
            Ok(route) => {
                if let Navigation::Dashboard(mut page) = app.navigate(route).await? {
                    let outcome = page.loaded().await;
                    print!("{}", page.render().await);
                    exit_on_failure(&outcome);
                }
            }
            Err(AppError::Login(message)) => {
                print!("{}", render_login(Some(&message)));
                std::process::exit(1);
            }
            Err(e) => return Err(e.into()),
        },

        Commands::Logout => {
            app.logout().await?;
            print!("{}", render_login(None));
        }

        Commands::Dashboard { from, to, format } => {
            let mut page = admitted_or_exit(&app).await?;
            let range = DateRange::new(from.as_deref(), to.as_deref());
            let outcome = match page.set_filter(range) {
                Some(cycle) => cycle.await?,
                None => page.loaded().await,
            };

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&page.view().await)?)
                }
                OutputFormat::Text => print!("{}", page.render().await),
            }
            exit_on_failure(&outcome);
        }

        Commands::Watch { from, to } => {
            let page = admitted_or_exit(&app).await?;
            watch(&app, page, DateRange::new(from.as_deref(), to.as_deref())).await?;
        }

        Commands::Config { output } => write_config(output)?,
    }

    Ok(())
}

fn write_config(output: Option<PathBuf>) -> anyhow::Result<()> {
    let content = generate_default_config();
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &content)
                .with_context(|| format!("writing config to {:?}", path))?;
            println!("Config written to {:?}", path);
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Interactive loop: every filter change starts a new cycle, and each cycle
/// that is still current when it ends prints the refreshed dashboard.
async fn watch(app: &App, mut page: DashboardPage, range: DateRange) -> anyhow::Result<()> {
    let first = match page.set_filter(range) {
        Some(cycle) => cycle,
        None => page.take_mount().unwrap_or_else(|| page.spawn_reload()),
    };
    print!("{}", page.render().await);
    report_when_done(app, &page, first);
    eprintln!("{}", WATCH_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or("");
        let arg = parts.next().unwrap_or("");

        let cycle = match command {
            "" => continue,
            "from" | "to" => match parse_bound(arg) {
                Ok(bound) if command == "from" => page.set_from(&bound),
                Ok(bound) => page.set_to(&bound),
                Err(e) => {
                    eprintln!("{}", e);
                    continue;
                }
            },
            "clear" => page.clear_filter(),
            "reload" => Some(page.spawn_reload()),
            "show" => {
                print!("{}", page.render().await);
                continue;
            }
            "logout" => {
                app.logout().await?;
                print!("{}", render_login(None));
                break;
            }
            "quit" | "exit" => break,
            other => {
                eprintln!("Unknown command: {}. {}", other, WATCH_HELP);
                continue;
            }
        };

        if let Some(cycle) = cycle {
            print!("{}", page.render().await);
            report_when_done(app, &page, cycle);
        }
    }

    Ok(())
}

/// Print the dashboard once `cycle` ends, unless a newer cycle replaced it
fn report_when_done(app: &App, page: &DashboardPage, cycle: JoinHandle<LoadOutcome>) {
    let loader = page.loader().clone();
    let filter = page.filter().clone();
    let display = app.config().display.clone();
    let tenant = page.session().tenant_id().map(str::to_string);

    tokio::spawn(async move {
        match cycle.await {
            Ok(LoadOutcome::Superseded) => {}
            Ok(_) => {
                let view = DashboardView::project(&loader.snapshot().await, &display);
                print!("{}", render_dashboard(&view, &filter, tenant.as_deref()));
            }
            Err(e) => tracing::error!(error = %e, "Load task failed"),
        }
    });
}

/// Guard the dashboard; without a session show the login view and exit
async fn admitted_or_exit(app: &App) -> anyhow::Result<DashboardPage> {
    match app.navigate(Route::Dashboard).await? {
        Navigation::Dashboard(page) => Ok(page),
        Navigation::Login { .. } => {
            print!("{}", render_login(None));
            std::process::exit(1);
        }
    }
}

fn exit_on_failure(outcome: &LoadOutcome) {
    if matches!(outcome, LoadOutcome::Failed(_)) {
        std::process::exit(1);
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "insights_dashboard={level},insights={level}",
            level = logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
