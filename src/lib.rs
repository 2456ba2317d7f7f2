use std::{error::Error, io};

use rand::{rngs::StdRng, SeedableRng};

pub mod clients;
use clients::omdb_client::OmdbClient;

pub mod config;
use config::Config;

pub mod matching;
pub mod menu;
use menu::Menu;

pub mod model;

pub mod persisters;
use persisters::{load_or_empty, open_storage};

pub mod renderers;

pub mod service;
use service::collection_service::CollectionService;

pub async fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let storage = open_storage(config.storage_kind, config.data_file.clone());
    let catalog = load_or_empty(storage.as_ref());

    if config.api_key.is_none() {
        log::warn!(
            "OMDB_API_KEY is not set; adding and updating movies will not be able to fetch data"
        );
    }
    let lookup = OmdbClient::new(config.api_base_url.clone(), config.api_key.clone())?;

    let mut service =
        CollectionService::new(catalog, storage, Box::new(lookup), config.thresholds);

    {
        let mut menu = Menu::new(
            &mut service,
            io::stdin().lock(),
            io::stdout(),
            config.web_file.clone(),
            Box::new(StdRng::from_entropy()),
        );
        menu.run().await?;
    }

    log::info!(
        "Collection closed with {} movies in {}",
        service.catalog().len(),
        config.data_file.display()
    );
    Ok(())
}
