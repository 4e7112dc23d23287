//! sessionscope CLI - Command-line interface for sessionscope
//!
//! Runs feedback session listings against JSON fixtures describing both
//! backends, and manages the configuration file.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use sessionscope_applications::{
    CallerIdentity, FeedbackSessionsRequest, FeedbackSessionsService, Fixture,
};
use sessionscope_core::{
    init_logging, log_operation_error, log_operation_start, log_operation_success, ErrorContext,
    ErrorSurface, ScopeConfig, ScopeError, ScopeResult,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "sessionscope")]
#[command(about = "Lists the feedback sessions a caller may see across legacy and migrated courses")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List feedback sessions visible to a caller
    List {
        /// JSON fixture describing both backends and the cutover record
        #[arg(short, long)]
        fixture: PathBuf,

        /// Caller user id
        #[arg(short, long)]
        user: String,

        /// Caller holds the admin role
        #[arg(long)]
        admin: bool,

        /// Caller holds the student role
        #[arg(long)]
        student: bool,

        /// Caller holds the instructor role
        #[arg(long)]
        instructor: bool,

        /// Requested view (STUDENT or INSTRUCTOR)
        #[arg(short, long, default_value = "STUDENT")]
        entity_type: String,

        /// Restrict the listing to one course
        #[arg(long)]
        course: Option<String>,

        /// List soft-deleted sessions instead
        #[arg(long)]
        recycle_bin: bool,

        /// Evaluate statuses at this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<String>,
    },

    /// Configuration management
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Write a default configuration file (to the given path, or the user config dir)
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        init: Option<String>,

        /// Validate the current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("Error ({}): {}", err.surface(), err);
        if let Some(context) = err.context() {
            for suggestion in &context.recovery_suggestions {
                eprintln!("  hint: {}", suggestion);
            }
        }
        std::process::exit(exit_code(err.surface()));
    }
}

fn exit_code(surface: ErrorSurface) -> i32 {
    match surface {
        ErrorSurface::ServerError => 1,
        ErrorSurface::AccessDenied => 3,
        ErrorSurface::NotFound => 4,
    }
}

async fn run(cli: Cli) -> ScopeResult<()> {
    let config = load_config(cli.config.as_ref())?;

    let mut logging_config = config.logging.clone();
    if cli.verbose {
        logging_config.level = "debug".to_string();
    }
    init_logging(&logging_config).map_err(|e| ScopeError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check logging configuration"),
    })?;

    info!("Starting sessionscope CLI v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::List {
            fixture,
            user,
            admin,
            student,
            instructor,
            entity_type,
            course,
            recycle_bin,
            at,
        } => {
            let caller = CallerIdentity::new(user)
                .with_admin(admin)
                .with_student(student)
                .with_instructor(instructor);
            let mut request = FeedbackSessionsRequest::new(entity_type).in_recycle_bin(recycle_bin);
            if let Some(course) = course {
                request = request.for_course(course);
            }
            handle_list(fixture, caller, request, at, &config).await
        }
        Commands::Config {
            show,
            init,
            validate,
        } => handle_config(&config, show, init, validate).await,
    }
}

fn load_config(config_path: Option<&PathBuf>) -> ScopeResult<ScopeConfig> {
    if let Some(path) = config_path {
        return ScopeConfig::from_file(path);
    }

    let default_paths = [
        dirs::config_dir().map(|d| d.join("sessionscope").join("config.toml")),
        dirs::home_dir().map(|d| d.join(".sessionscope").join("config.toml")),
        Some(PathBuf::from("sessionscope.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            return ScopeConfig::from_file(path);
        }
    }

    Ok(ScopeConfig::default())
}

async fn handle_list(
    fixture_path: PathBuf,
    caller: CallerIdentity,
    request: FeedbackSessionsRequest,
    at: Option<String>,
    config: &ScopeConfig,
) -> ScopeResult<()> {
    log_operation_start!("list_sessions", fixture = %fixture_path.display());

    let now = match at {
        Some(at) => parse_instant(&at)?,
        None => Utc::now(),
    };

    let selector = Fixture::from_file(&fixture_path)
        .map_err(|e| {
            log_operation_error!("load_fixture", e, path = %fixture_path.display());
            e
        })?
        .into_selector();
    let service = FeedbackSessionsService::builder(selector)
        .with_retrieval_config(config.retrieval.clone())
        .build();

    let data = service
        .get_feedback_sessions_at(&caller, &request, now)
        .await?;

    println!("{}", serde_json::to_string_pretty(&data)?);
    log_operation_success!("list_sessions", count = data.len());
    Ok(())
}

fn parse_instant(value: &str) -> ScopeResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ScopeError::Config {
            message: format!("Invalid --at timestamp '{}': {}", value, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("cli")
                .with_operation("parse_at")
                .with_suggestion("Use RFC 3339, e.g. 2026-03-01T09:00:00Z"),
        })
}

async fn handle_config(
    config: &ScopeConfig,
    show: bool,
    init: Option<String>,
    validate: bool,
) -> ScopeResult<()> {
    if let Some(path) = init {
        let config_path = if path.is_empty() {
            dirs::config_dir()
                .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
                .ok_or_else(|| ScopeError::Config {
                    message: "Could not determine a configuration directory".to_string(),
                    source: None,
                    context: ErrorContext::new("cli")
                        .with_operation("config_init")
                        .with_suggestion("Pass an explicit path to --init"),
                })?
                .join("sessionscope")
                .join("config.toml")
        } else {
            PathBuf::from(path)
        };

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        ScopeConfig::default().save_to_file(&config_path)?;
        println!("Configuration initialized at: {}", config_path.display());
        return Ok(());
    }

    if validate {
        config.validate()?;
        println!("Configuration is valid");
        return Ok(());
    }

    if show {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("Use --show, --init [path] or --validate");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Counts events that carry an `error` field
    struct ErrorEvents(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for ErrorEvents {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if event.metadata().fields().field("error").is_some() {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_exit_codes_distinguish_surfaces() {
        assert_eq!(exit_code(ErrorSurface::ServerError), 1);
        assert_eq!(exit_code(ErrorSurface::AccessDenied), 3);
        assert_eq!(exit_code(ErrorSurface::NotFound), 4);
    }

    #[test]
    fn test_parse_instant() {
        let at = parse_instant("2026-03-01T10:00:00+01:00").unwrap();
        assert_eq!(at.to_rfc3339(), "2026-03-01T09:00:00+00:00");
        assert!(parse_instant("yesterday").is_err());
    }

    #[test]
    fn test_cli_parses_list_flags() {
        let cli = Cli::try_parse_from([
            "sessionscope",
            "list",
            "--fixture",
            "data.json",
            "--user",
            "prof",
            "--instructor",
            "--entity-type",
            "INSTRUCTOR",
            "--recycle-bin",
        ])
        .unwrap();

        match cli.command {
            Commands::List {
                user,
                instructor,
                student,
                recycle_bin,
                course,
                ..
            } => {
                assert_eq!(user, "prof");
                assert!(instructor && !student && recycle_bin);
                assert!(course.is_none());
            }
            _ => panic!("expected list command"),
        }
    }

    #[tokio::test]
    async fn test_rejected_listing_logged_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{
                "legacy": {
                    "courses": [{ "id": "CS101", "name": "Intro" }],
                    "memberships": [
                        { "courseId": "CS101", "userId": "alice", "email": "alice@uni.edu", "role": "STUDENT" }
                    ]
                },
                "cutover": { "CS101": "legacy" }
            }"#,
        )
        .unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(ErrorEvents(count.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);

        let err = handle_list(
            file.path().to_path_buf(),
            CallerIdentity::new("bob").with_student(true),
            FeedbackSessionsRequest::new("STUDENT").for_course("CS101"),
            None,
            &ScopeConfig::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.surface(), ErrorSurface::AccessDenied);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_config_init_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        handle_config(
            &ScopeConfig::default(),
            false,
            Some(path.to_string_lossy().to_string()),
            false,
        )
        .await
        .unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.retrieval.max_concurrent_courses, 4);
    }
}
