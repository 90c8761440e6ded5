use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use pushkind_common::routes::{redirect, render_template};
use serde::Deserialize;
use tera::{Context, Tera};

use crate::config::ServerConfig;
use crate::domain::catalog::PurchaseKind;
use crate::domain::checkout::{CheckoutRedirect, Reference};
use crate::forms::checkout::CheckoutForm;
use crate::payment_widget::WidgetHandle;
use crate::repository::DieselRepository;
use crate::routes::page_context;
use crate::services::ServiceError;
use crate::services::checkout::{
    CheckoutError, CheckoutSession, ProviderCallback, report_widget_unavailable,
    resolve_checkout, submit_checkout,
};
use crate::services::pricing::{self as pricing_service, CheckoutPageData};

/// Shown when the provider callback cannot be matched or stored.
const UNCONFIRMED_PAYMENT: &str =
    "We could not confirm your payment. Please contact support with your reference.";

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub reference: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<PurchaseKind>,
}

#[derive(Debug, Deserialize)]
pub struct FailureQuery {
    pub error: Option<String>,
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UnavailableQuery {
    pub reference: String,
}

fn checkout_path(kind: PurchaseKind) -> String {
    format!("/{kind}/checkout")
}

fn insert_checkout_form(context: &mut Context, data: &CheckoutPageData, config: &ServerConfig) {
    context.insert("kind", &data.kind);
    context.insert("catalog", &data.catalog);
    context.insert("prices", &data.prices);
    context.insert("discount_percent", &data.discount_percent);
    context.insert("discount_min_units", &data.discount_min_units);
    context.insert("verification_site_key", &config.verification_site_key);
    context.insert("verification_widget_url", &config.verification_widget_url);
}

fn insert_pay_page(
    context: &mut Context,
    session: &CheckoutSession,
    widget_script_url: &str,
) -> serde_json::Result<()> {
    context.insert("kind", &session.kind);
    context.insert("pricing", &session.pricing);
    context.insert("discounted", &session.pricing.is_discounted());
    context.insert("reference", session.widget.reference.as_str());
    context.insert("widget_json", &session.widget.to_script_json()?);
    context.insert("phase", &session.phase);
    context.insert("widget_script_url", widget_script_url);
    Ok(())
}

#[get("/{kind}/checkout")]
pub async fn show_checkout(
    kind: web::Path<String>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let kind = match kind.parse::<PurchaseKind>() {
        Ok(kind) => kind,
        Err(_) => return HttpResponse::NotFound().finish(),
    };

    let data = pricing_service::load_checkout_page(kind);

    let mut context = page_context(&flash_messages, kind.as_str());
    insert_checkout_form(&mut context, &data, &server_config);
    render_template(&tera, "checkout/form.html", &context)
}

#[post("/{kind}/checkout")]
pub async fn submit_checkout_form(
    kind: web::Path<String>,
    body: web::Bytes,
    flash_messages: IncomingFlashMessages,
    repo: web::Data<DieselRepository>,
    widget: web::Data<WidgetHandle>,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let kind = match kind.parse::<PurchaseKind>() {
        Ok(kind) => kind,
        Err(_) => return HttpResponse::NotFound().finish(),
    };
    let back = checkout_path(kind);

    let form: CheckoutForm = match serde_html_form::from_bytes(&body) {
        Ok(form) => form,
        Err(err) => {
            log::warn!("Failed to decode {kind} checkout form: {err}");
            FlashMessage::error("The form could not be read. Please try again.").send();
            return redirect(&back);
        }
    };

    let repo = repo.get_ref().clone();
    let handle = widget.get_ref().clone();
    let policy = server_config.widget_readiness;

    let result =
        web::block(move || submit_checkout(&repo, &handle, policy, kind, form)).await;

    match result {
        Ok(Ok(session)) => {
            let mut context = page_context(&flash_messages, kind.as_str());
            if let Err(err) = insert_pay_page(&mut context, &session, &widget.script_url()) {
                log::error!("Failed to encode widget session for {kind}: {err}");
                FlashMessage::error("Checkout could not be started. Please try again.").send();
                return redirect(&back);
            }
            render_template(&tera, "checkout/pay.html", &context)
        }
        Ok(Err(CheckoutError::Validation(err))) => {
            FlashMessage::error(format!("Please check the form: {err}.")).send();
            redirect(&back)
        }
        Ok(Err(CheckoutError::VerificationRequired)) => {
            FlashMessage::warning("Please complete the human verification before paying.").send();
            redirect(&back)
        }
        Ok(Err(CheckoutError::ProviderUnavailable { .. })) => {
            FlashMessage::warning(
                "The payment system is not available right now. Please try again in a moment.",
            )
            .send();
            redirect(&back)
        }
        Ok(Err(err)) => {
            log::error!("Failed to open {kind} checkout: {err}");
            FlashMessage::error("Checkout could not be started. Please try again.").send();
            redirect(&back)
        }
        Err(err) => {
            log::error!("Checkout worker failed: {err}");
            FlashMessage::error("Checkout could not be started. Please try again.").send();
            redirect(&back)
        }
    }
}

#[get("/checkout/callback")]
pub async fn checkout_callback(
    params: web::Query<ProviderCallback>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let callback = params.into_inner();
    let reference = callback.reference.clone();
    let repo = repo.get_ref().clone();

    let result = web::block(move || resolve_checkout(&repo, &repo, callback)).await;

    match result {
        Ok(Ok(target)) => redirect(&target.location()),
        Ok(Err(ServiceError::NotFound)) => {
            log::warn!("Provider callback for unknown reference `{reference}`");
            FlashMessage::error("Unknown checkout reference.").send();
            redirect("/")
        }
        Ok(Err(err)) => {
            log::error!("Failed to resolve checkout {reference}: {err}");
            unconfirmed(reference)
        }
        Err(err) => {
            log::error!("Checkout callback worker failed: {err}");
            unconfirmed(reference)
        }
    }
}

/// Reached when the pay page gave up waiting for the widget script.
#[get("/checkout/unavailable")]
pub async fn checkout_unavailable(
    params: web::Query<UnavailableQuery>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let reference = params.into_inner().reference;
    let lookup = reference.clone();
    let repo = repo.get_ref().clone();

    match web::block(move || report_widget_unavailable(&repo, &lookup)).await {
        Ok(Ok(kind)) => {
            FlashMessage::warning(
                "The payment system is not available right now. Please try again in a moment.",
            )
            .send();
            redirect(&checkout_path(kind))
        }
        Ok(Err(ServiceError::NotFound)) => {
            log::warn!("Unavailable report for unknown reference `{reference}`");
            redirect("/")
        }
        Ok(Err(err)) => {
            log::error!("Failed to handle unavailable widget for {reference}: {err}");
            redirect("/")
        }
        Err(err) => {
            log::error!("Unavailable report worker failed: {err}");
            redirect("/")
        }
    }
}

fn unconfirmed(reference: String) -> HttpResponse {
    let target = CheckoutRedirect::Failure {
        reason: UNCONFIRMED_PAYMENT.to_string(),
        reference: Some(Reference::from(reference)),
    };
    redirect(&target.location())
}

#[get("/payment/success")]
pub async fn show_payment_success(
    params: web::Query<SuccessQuery>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let mut context = page_context(&flash_messages, "payment");
    context.insert("reference", &params.reference);
    context.insert("kind", &params.kind);
    render_template(&tera, "payment/success.html", &context)
}

#[get("/payment/failed")]
pub async fn show_payment_failed(
    params: web::Query<FailureQuery>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let retry_kind = params.reference.as_deref().and_then(|reference| {
        PurchaseKind::ALL
            .into_iter()
            .find(|kind| reference.starts_with(kind.reference_prefix()))
    });

    let mut context = page_context(&flash_messages, "payment");
    context.insert("error", &params.error);
    context.insert("reference", &params.reference);
    context.insert("retry_path", &retry_kind.map(checkout_path));
    render_template(&tera, "payment/failed.html", &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::domain::checkout::{CheckoutPhase, CheckoutRequest};
    use crate::domain::pricing::{ApplicantKind, PriceTable, compute_total};
    use crate::domain::selection::SelectionSet;
    use crate::services::checkout::WidgetSession;

    const HOSTILE_NAME: &str = "Ada</script><script>alert(1)</script>";

    fn templates() -> Tera {
        Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*")).expect("templates")
    }

    fn context_for(page: &str) -> Context {
        let mut context = Context::new();
        context.insert("alerts", &Vec::<(String, String)>::new());
        context.insert("current_page", page);
        context
    }

    fn config() -> ServerConfig {
        ServerConfig::from_lookup(|name| match name {
            "PAYMENT_PUBLIC_KEY" => Some("pk_test".to_string()),
            "VERIFICATION_SITE_KEY" => Some("site_test".to_string()),
            _ => None,
        })
        .expect("config")
    }

    fn hostile_session() -> CheckoutSession {
        let kind = PurchaseKind::Awards;
        let metadata = BTreeMap::from([
            ("full_name".to_string(), HOSTILE_NAME.to_string()),
            ("units".to_string(), "film-craft".to_string()),
        ]);
        let request = CheckoutRequest::new(kind, "ada@example.com", 20_000, "USD", metadata);
        let selection: SelectionSet = ["film-craft"].into_iter().collect();
        let pricing = compute_total(
            ApplicantKind::Agency,
            &selection,
            PriceTable::for_purchase(kind),
        );
        let widget = WidgetSession {
            public_key: "pk_test".to_string(),
            email: request.payer_email().to_string(),
            amount: request.amount_minor_units(),
            currency: request.currency().to_string(),
            reference: request.reference().to_string(),
            metadata: request.metadata().clone(),
            ready_attempts: 10,
            ready_interval_ms: 200,
        };

        CheckoutSession {
            kind,
            request,
            pricing,
            widget,
            phase: CheckoutPhase::ProviderOpen,
        }
    }

    #[test]
    fn pay_page_keeps_submitted_names_inside_the_session_json() {
        let session = hostile_session();
        let mut context = context_for("awards");
        insert_pay_page(&mut context, &session, "https://js.example.com/inline.js")
            .expect("pay page context");

        let html = templates()
            .render("checkout/pay.html", &context)
            .expect("render pay page");

        assert!(!html.contains("<script>alert(1)"));

        let marker = r#"<script id="widget-session" type="application/json">"#;
        let start = html.find(marker).expect("session element") + marker.len();
        let end = start + html[start..].find("</script>").expect("closing tag");
        let decoded: serde_json::Value =
            serde_json::from_str(&html[start..end]).expect("session json");

        assert_eq!(decoded["metadata"]["full_name"], HOSTILE_NAME);
        assert_eq!(decoded["reference"], session.widget.reference.as_str());
        assert_eq!(decoded["amount"], 20_000);
    }

    #[test]
    fn checkout_form_renders_verification_widget() {
        let mut context = context_for("masterclass");
        insert_checkout_form(
            &mut context,
            &pricing_service::load_checkout_page(PurchaseKind::Masterclass),
            &config(),
        );

        let html = templates()
            .render("checkout/form.html", &context)
            .expect("render checkout form");

        assert!(html.contains(r#"data-sitekey="site_test""#));
        assert!(html.contains(r#"data-callback="onHumanVerified""#));
        assert!(html.contains(r#"id="verification-token""#));
        assert!(html.contains(r#"id="pay-button" disabled"#));
        assert!(html.contains("challenges.cloudflare.com"));
    }

    #[test]
    fn success_query_reads_type_key() {
        let query: SuccessQuery =
            serde_qs::from_str("reference=AWD-1&type=masterclass").expect("decode query");

        assert_eq!(query.reference.as_deref(), Some("AWD-1"));
        assert_eq!(query.kind, Some(PurchaseKind::Masterclass));
    }

    #[test]
    fn checkout_path_uses_kind_slug() {
        assert_eq!(checkout_path(PurchaseKind::Awards), "/awards/checkout");
    }
}
