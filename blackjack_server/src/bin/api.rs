use actix_web::{web, App, HttpServer};
use blackjack_lib::{AllTimeAccuracy, JsonFileStore};
use blackjack_server::prelude::*;
use clap::Parser;
use log::{error, info, warn};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match ServerConfig::load(Cli::parse()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let all_time = match &config.accuracy_file {
        Some(path) => match AllTimeAccuracy::load(Box::new(JsonFileStore::new(path))) {
            Ok(all_time) => {
                info!(
                    "loaded all-time accuracy {} from {}",
                    all_time.get(),
                    path.display()
                );
                all_time
            }
            Err(e) => {
                error!("unable to load all-time accuracy: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            warn!("no accuracy file configured, all-time accuracy will not survive a restart");
            AllTimeAccuracy::in_memory()
        }
    };

    info!(
        "{} deck shoe, reshuffle below {:?} cards, dealer {} soft 17, dealer peeks: {}",
        config.table.num_decks,
        config.table.reshuffle_threshold,
        if config.table.dealer_hits_soft_17 { "hits" } else { "stands on" },
        config.table.dealer_peeks
    );

    let app_state = web::Data::new(AppState::new(
        config.table,
        Arc::new(all_time),
        config.session_ttl,
    ));

    info!("listening at {}:{}...", config.address, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(configure)
    })
    .bind((config.address.as_str(), config.port))?
    .run()
    .await
}
