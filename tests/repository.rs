use std::collections::BTreeMap;

use agency_network::domain::catalog::PurchaseKind;
use agency_network::domain::checkout::{
    AttemptStatus, AttemptTransition, CheckoutRequest, NewCheckoutAttempt, ProviderOutcome,
};
use agency_network::domain::pricing::ApplicantKind;
use agency_network::domain::receipt::NewPaymentReceipt;
use agency_network::repository::{
    CheckoutAttemptReader, CheckoutAttemptWriter, DieselRepository, ReceiptReader, ReceiptWriter,
};

mod common;

fn new_attempt(kind: PurchaseKind) -> NewCheckoutAttempt {
    let metadata = BTreeMap::from([
        ("purchase_type".to_string(), kind.as_str().to_string()),
        ("units".to_string(), "film-craft, social-impact".to_string()),
    ]);
    let request = CheckoutRequest::new(kind, "buyer@example.com", 30_000, "USD", metadata);
    NewCheckoutAttempt::from_request(kind, ApplicantKind::Agency, &request)
}

#[test]
fn test_checkout_attempt_round_trip() {
    let test_db = common::TestDb::new("test_checkout_attempt_round_trip.db");
    let repo = DieselRepository::new(test_db.pool());

    let new = new_attempt(PurchaseKind::Awards);
    let created = repo.create_checkout_attempt(&new).unwrap();

    assert_eq!(created.reference, new.reference);
    assert_eq!(created.status, AttemptStatus::Open);
    assert_eq!(created.kind, PurchaseKind::Awards);
    assert_eq!(created.applicant_kind, ApplicantKind::Agency);
    assert_eq!(created.amount_minor_units, 30_000);
    assert_eq!(
        created.metadata.get("units").map(String::as_str),
        Some("film-craft, social-impact")
    );

    let loaded = repo
        .get_checkout_attempt(new.reference.as_str())
        .unwrap()
        .expect("attempt stored");
    assert_eq!(loaded.id, created.id);

    assert!(repo.get_checkout_attempt("AWD-missing").unwrap().is_none());
}

#[test]
fn test_checkout_attempt_resolves_once() {
    let test_db = common::TestDb::new("test_checkout_attempt_resolves_once.db");
    let repo = DieselRepository::new(test_db.pool());

    let created = repo
        .create_checkout_attempt(&new_attempt(PurchaseKind::Masterclass))
        .unwrap();
    let reference = created.reference.as_str().to_string();

    let success = ProviderOutcome::Success {
        transaction: Some("T-1".to_string()),
    };
    let resolution = match created.apply(&success) {
        AttemptTransition::Resolve(resolution) => resolution,
        AttemptTransition::AlreadyResolved => panic!("fresh attempt must resolve"),
    };

    let resolved = repo
        .resolve_checkout_attempt(&reference, &resolution)
        .unwrap()
        .expect("first resolution is stored");
    assert_eq!(resolved.status, AttemptStatus::Succeeded);
    assert_eq!(resolved.transaction.as_deref(), Some("T-1"));

    // A stale copy of the open attempt still produces a resolution; the store refuses it.
    let late = match created.apply(&ProviderOutcome::Cancelled) {
        AttemptTransition::Resolve(resolution) => resolution,
        AttemptTransition::AlreadyResolved => panic!("stale copy is still open"),
    };
    assert!(
        repo.resolve_checkout_attempt(&reference, &late)
            .unwrap()
            .is_none()
    );

    let stored = repo.get_checkout_attempt(&reference).unwrap().unwrap();
    assert_eq!(stored.status, AttemptStatus::Succeeded);
    assert!(stored.failure_reason.is_none());
}

#[test]
fn test_receipt_repository() {
    let test_db = common::TestDb::new("test_receipt_repository.db");
    let repo = DieselRepository::new(test_db.pool());

    let details = BTreeMap::from([("purchase_type".to_string(), "awards".to_string())]);
    let receipt = NewPaymentReceipt::new("AWD-1", "Buyer@Example.com", 45_000, "USD")
        .with_transaction("T-9")
        .with_details(details.clone());

    let created = repo.create_receipt(&receipt).unwrap();
    assert_eq!(created.reference, "AWD-1");
    assert_eq!(created.payer_email, "buyer@example.com");
    assert_eq!(created.details, details);

    let loaded = repo
        .get_receipt_by_reference("AWD-1")
        .unwrap()
        .expect("receipt stored");
    assert_eq!(loaded.transaction.as_deref(), Some("T-9"));

    assert!(repo.create_receipt(&receipt).is_err());
    assert!(repo.get_receipt_by_reference("AWD-2").unwrap().is_none());
}
