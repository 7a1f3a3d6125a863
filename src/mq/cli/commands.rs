use super::print::{print_args_error, print_messages, print_usage};
use directories::ProjectDirs;
use log::{debug, warn};
use mq::api::MqApi;
use mq::args::Operation;
use mq::commands::TransferResult;
use mq::config::MqConfig;
use mq::error::{MqError, Result};
use mq::queue::spool::SpoolQueueService;
use mq::store::fs::LocalStore;
use std::env;
use std::path::PathBuf;

const SPOOL_DIR_ENV: &str = "MQ_SPOOL_DIR";
const CONFIG_DIR_ENV: &str = "MQ_CONFIG_DIR";
const SPOOL_SUBDIR: &str = "spool";

struct AppContext {
    api: MqApi<SpoolQueueService, LocalStore>,
}

impl AppContext {
    fn run(mut self, operation: &Operation) -> TransferResult {
        self.api.run(operation)
    }
}

pub fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return Ok(());
    }

    let operation = match Operation::parse(args) {
        Ok(operation) => operation,
        Err(e) => {
            print_args_error(&e);
            return Ok(());
        }
    };

    let result = init_context()?.run(&operation);
    print_messages(&result.messages);

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn init_context() -> Result<AppContext> {
    let cwd = env::current_dir().map_err(MqError::Io)?;
    let proj_dirs = ProjectDirs::from("com", "mq", "mq")
        .ok_or_else(|| MqError::Config("Could not determine config dir".into()))?;

    let config_dir = env::var_os(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| proj_dirs.config_dir().to_path_buf());
    let config = MqConfig::load(&config_dir).unwrap_or_else(|e| {
        warn!("Ignoring config in {}: {}", config_dir.display(), e);
        MqConfig::default()
    });

    let default_spool = proj_dirs.data_dir().join(SPOOL_SUBDIR);
    let spool_override = env::var_os(SPOOL_DIR_ENV).map(PathBuf::from);
    let spool_root = config.spool_root(spool_override, &default_spool);
    debug!("Spool root {}, working dir {}", spool_root.display(), cwd.display());

    let service = SpoolQueueService::new(spool_root).with_poll_interval(config.poll_interval());
    let store = LocalStore::new(cwd);

    Ok(AppContext {
        api: MqApi::new(service, store),
    })
}
