use netpath::cli::Cli;
use netpath::config::load_with_logger;
use netpath::core::network::{get_debug_logger, Checkers, Executor, ProbeContext};
use std::process::ExitCode;

const EXIT_DISCONNECTED: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let logger = get_debug_logger();

    let config = match load_with_logger(cli.config.as_deref(), &logger) {
        Ok(config) => config,
        Err(e) => {
            logger.error_sync("Main", "config_error", &e.to_string());
            eprintln!("netpath: {}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let ctx = ProbeContext::with_timeout(cli.timeout());
    let executor = Executor::new(Checkers::system(), cli.policy).with_logger(logger);
    let result = executor.run(&ctx, &config).await;

    let rendered = if cli.compact {
        serde_json::to_string(&result)
    } else {
        serde_json::to_string_pretty(&result)
    };
    match rendered {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("netpath: failed to serialize result: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if result.is_connected() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_DISCONNECTED)
    }
}
