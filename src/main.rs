use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use log::{error, info};

use taskrest::auth::{PasswordHasher, TokenService};
use taskrest::config::Config;
use taskrest::repository::PgRepository;
use taskrest::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    let repository = match PgRepository::connect(&config.database_url, config.database_max_connections).await {
        Ok(repository) => Arc::new(repository),
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(repository.pool()).await {
        error!("Failed to run migrations: {}", e);
        return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }

    let state = AppState::new(
        repository.clone(),
        repository,
        TokenService::new(config.jwt_secret.clone(), config.jwt_expiration_hours),
        PasswordHasher::new(config.bcrypt_cost),
    );

    info!("Starting server at {}", config.server_url());
    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(|cfg| state.configure(cfg))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
