use std::env;

use actix_files::Files;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, middleware, web};
use actix_web_flash_messages::{FlashMessagesFramework, storage::CookieMessageStore};
use dotenvy::dotenv;
use pushkind_common::db::establish_connection_pool;
use tera::Tera;

use agency_network::config::ServerConfig;
use agency_network::payment_widget::{WidgetHandle, WidgetState};
use agency_network::repository::DieselRepository;
use agency_network::routes::api::{api_v1_checkout, api_v1_quote, api_v1_receipts};
use agency_network::routes::checkout::{
    checkout_callback, checkout_unavailable, show_checkout, show_payment_failed,
    show_payment_success, submit_checkout_form,
};
use agency_network::routes::main::show_index;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenv().ok(); // Load .env file

    let server_config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let secret_key = match env::var("SECRET_KEY") {
        Ok(key) => Key::from(key.as_bytes()),
        Err(_) => Key::generate(),
    };

    let pool = match establish_connection_pool(&server_config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    let repo = DieselRepository::new(pool);

    let widget = WidgetHandle::new(
        server_config.payment_public_key.clone(),
        server_config.payment_widget_url.clone(),
    );
    if widget.load() != WidgetState::Ready {
        log::warn!("Payment widget is not ready; checkouts will be refused");
    }

    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let tera = match Tera::new("templates/**/*") {
        Ok(t) => t,
        Err(e) => {
            log::error!("Parsing error(s): {e}");
            std::process::exit(1);
        }
    };

    let address = server_config.address.clone();
    let port = server_config.port;
    let domain = server_config.domain.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(false) // set to true in prod
                    .cookie_domain(Some(format!(".{domain}")))
                    .build(),
            )
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .service(Files::new("/assets", "./assets"))
            .service(
                web::scope("/api")
                    .service(api_v1_quote)
                    .service(api_v1_receipts)
                    .service(api_v1_checkout),
            )
            .service(show_index)
            .service(checkout_callback)
            .service(checkout_unavailable)
            .service(show_payment_success)
            .service(show_payment_failed)
            .service(show_checkout)
            .service(submit_checkout_form)
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(server_config.clone()))
            .app_data(web::Data::new(widget.clone()))
    })
    .bind((address, port))?
    .run()
    .await
}
