use actix_web_flash_messages::{IncomingFlashMessages, Level};
use tera::Context;

pub mod api;
pub mod checkout;
pub mod main;

/// Base template context with the pending flash messages as `(class, text)` pairs.
pub fn page_context(flash_messages: &IncomingFlashMessages, current_page: &str) -> Context {
    let alerts = flash_messages
        .iter()
        .map(|message| (alert_class(message.level()), message.content()))
        .collect::<Vec<_>>();

    let mut context = Context::new();
    context.insert("alerts", &alerts);
    context.insert("current_page", current_page);
    context
}

fn alert_class(level: Level) -> &'static str {
    match level {
        Level::Error => "danger",
        Level::Warning => "warning",
        Level::Success => "success",
        Level::Info | Level::Debug => "info",
    }
}
