use std::{env, process};

use movie_catalog::config::Config;

mod logging;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::setup_logging();

    let config = match Config::from_env() {
        Ok(config) => config.with_data_file(env::args().nth(1)),
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            process::exit(2);
        }
    };

    if let Err(e) = movie_catalog::run(config).await {
        log::error!("{}", e);
        process::exit(1);
    }
}
