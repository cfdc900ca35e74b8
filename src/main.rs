use anyhow::Context;
use medrec::{
    AppState, build_app,
    auth::jwt::AuthService,
    cli::{
        Cli, Commands, admin,
        init::{self, InitConfig, InitResult},
        output::{Mark, Output},
    },
    db::Database,
    utils::{MedrecConfig, config::LogFormat},
};
use std::{path::Path, sync::Arc};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Init { path, force } => match init::run(InitConfig { path, force }, &output) {
            InitResult::Success | InitResult::AlreadyExists => Ok(()),
            InitResult::Error(e) => Err(anyhow::anyhow!(e)),
        },
        Commands::Config { validate } => {
            let config = load_config(&cli.config, cli.verbose)?;
            output.section(&format!("Configuration from {}", cli.config.display()));
            output.settings(&config.redacted());
            if validate {
                println!();
                match config.validate() {
                    Ok(()) => output.mark(Mark::Done, "configuration is valid"),
                    Err(e) => {
                        output.mark(Mark::Failed, &e.to_string());
                        std::process::exit(1);
                    }
                }
            }
            Ok(())
        }
        Commands::Migrate => {
            let config = load_config(&cli.config, cli.verbose)?;
            output.progress(1, 2, &format!("Opening {}", config.database_url()));
            let database = open_database(&config).await?;
            output.progress(2, 2, "Applying migrations");
            let applied = database.migrate().await?;
            output.mark(Mark::Done, &format!("{} migration(s) applied", applied));
            Ok(())
        }
        Commands::CreateAdmin { name, email, password } => {
            let config = load_config(&cli.config, cli.verbose)?;
            let database = open_database(&config).await?;
            database.migrate().await?;
            let user = admin::create_admin(&database, name, email, password).await?;
            output.mark(
                Mark::Done,
                &format!("administrator {} created with ID {}", user.email, user.id),
            );
            Ok(())
        }
        Commands::Serve => serve(load_config(&cli.config, cli.verbose)?).await,
    }
}

fn load_config(path: &Path, verbose: bool) -> anyhow::Result<MedrecConfig> {
    let config = MedrecConfig::load(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    init_tracing(&config, verbose);
    Ok(config)
}

fn init_tracing(config: &MedrecConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level))
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn open_database(config: &MedrecConfig) -> anyhow::Result<Database> {
    let url = config.database_url();
    Database::open(&url, config.database_auth_token())
        .await
        .with_context(|| format!("Failed to open database {}", url))
}

async fn serve(config: MedrecConfig) -> anyhow::Result<()> {
    config.validate().context("Invalid configuration")?;

    let database = open_database(&config).await?;
    let applied = database.migrate().await?;
    tracing::info!(applied, "database ready");

    let auth_service = AuthService::new(config.jwt_secret()?, config.jwt_expiry_seconds());
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState {
        config: Arc::new(config),
        db: Arc::new(database),
        auth_service: Arc::new(auth_service),
    };
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("medrec listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
