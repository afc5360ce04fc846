// Loads the scalarbridge shared library and runs the example call sequence.
//
// Configuration is read from the environment once, here:
//   SCALARBRIDGE_CONFIG        JSON config file (or a directory holding scalarbridge.json)
//   SCALARBRIDGE_LIBRARY_PATH  extra search directories, platform path-list syntax
//
// Prints one line per call with the bits the library reported receiving.
// Exit codes: 0 success, 127 library not found, 1 anything else.

use std::process::ExitCode;

use log::{error, info};
use scalarbridge::config::{CONFIG_VAR, SEARCH_PATH_VAR};
use scalarbridge::error::LoaderError;
use scalarbridge::{Contract, Loader, LoaderConfig, Scenario};

const EXIT_NOT_FOUND: u8 = 127;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::var_os(CONFIG_VAR) {
        Some(path) => match LoaderConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => LoaderConfig::default(),
    };
    let config = config.with_search_path_list(std::env::var_os(SEARCH_PATH_VAR));
    match serde_json::to_string(&config) {
        Ok(json) => info!("loader config {}", json),
        Err(e) => error!("cannot render loader config: {}", e),
    }

    let library = match Loader::new(config).load() {
        Ok(library) => library,
        Err(e @ LoaderError::NotFound { .. }) => {
            error!("{}", e);
            return ExitCode::from(EXIT_NOT_FOUND);
        }
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let contract = match Contract::bind(&library) {
        Ok(contract) => contract,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match Scenario::example().run_observed(&contract) {
        Ok(report) => {
            for call in report.calls() {
                if let Some(received) = call.received {
                    println!("{} {:#x}", call.kind, received);
                }
            }
            info!("{} calls completed", report.calls().len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
