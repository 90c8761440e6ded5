use actix_web::{Responder, get, web};
use actix_web_flash_messages::IncomingFlashMessages;
use pushkind_common::routes::render_template;
use tera::Tera;

use crate::routes::page_context;
use crate::services::main as main_service;

#[get("/")]
pub async fn show_index(
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let data = main_service::load_index_page();

    let mut context = page_context(&flash_messages, "index");
    context.insert("offers", &data.offers);
    context.insert("discount_percent", &data.discount_percent);
    context.insert("discount_min_units", &data.discount_min_units);
    render_template(&tera, "main/index.html", &context)
}
