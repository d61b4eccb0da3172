//! session-gate binary entry point.

use std::sync::Arc;

use session_gate::api::{self, AppState};
use session_gate::cli::{self, Args};
use session_gate::config::{Config, StoreBackend};
use session_gate::users::{self, MemoryUserStore, User};
use session_gate::{logging, MemoryStore, RedisStore, SessionStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Run with --help for usage.");
            std::process::exit(2);
        }
    };

    if args.help {
        cli::print_help();
        return;
    }

    if args.version {
        cli::print_version();
        return;
    }

    if let Err(e) = run(args).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> session_gate::Result<()> {
    if args.hash_password {
        let password = cli::read_password(std::io::stdin().lock())?;
        println!("{}", users::hash_password(&password)?);
        return Ok(());
    }

    let config = Config::load(&args)?;

    if logging::try_init_with_level(config.log_filter()).is_err() {
        eprintln!("warning: logging was already initialized");
    }

    info!("session-gate v{}", env!("CARGO_PKG_VERSION"));

    let sessions: Arc<dyn SessionStore> = match config.store.backend {
        StoreBackend::Redis => Arc::new(
            RedisStore::connect(
                &config.store.redis_url,
                config.session.duration(),
                config.store.op_timeout(),
            )
            .await?,
        ),
        StoreBackend::Memory => {
            warn!("Using in-memory session store; sessions are lost on restart");
            let store = Arc::new(MemoryStore::new(config.session.duration()));
            let _reaper = store.spawn_reaper(config.session.duration());
            store
        }
    };

    let user_store =
        MemoryUserStore::with_users(config.users.iter().cloned().map(User::from));
    if user_store.is_empty() {
        warn!("No users configured; sign-in will always fail");
    } else {
        info!("Loaded {} user(s)", user_store.len());
    }

    let state = AppState::new(
        config.session.signing_key.clone(),
        sessions,
        Arc::new(user_store),
    );

    api::serve(config.to_server_config()?, state).await
}
