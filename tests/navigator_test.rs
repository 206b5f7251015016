//! Integration tests for the five-step navigator workflow
//!
//! A mock portal serves the full page chain; the tests assert outcome
//! classification, session threading, and failure isolation between steps.

mod common;

use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{no_slots_page, selection_page, slots_page, step_form_page, test_target};
use vigia::models::{AvailabilityOutcome, Slot};
use vigia::navigator::{Navigator, PortalFetcher};
use vigia::utils::retry::RetryPolicy;

fn navigator(base_url: &str, retries: usize) -> Navigator {
    let fetcher = PortalFetcher::with_config(
        base_url,
        100,
        RetryPolicy::from_secs(&vec![0; retries]),
        Duration::from_secs(10),
    )
    .unwrap();
    Navigator::new(fetcher)
}

/// Mount the workflow chain up to the availability page
async fn mount_workflow(server: &MockServer, availability_body: String) {
    Mock::given(method("GET"))
        .and(path("/icpplus/acOpcDirect"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(selection_page("/icpplus/citar")),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/icpplus/citar"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(step_form_page("/icpplus/acInfo", "tk-terms")),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/icpplus/acInfo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(step_form_page("/icpplus/acEntrada", "tk-service")),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/icpplus/acEntrada"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(step_form_page("/icpplus/acCitar", "tk-entry-form")),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/icpplus/acCitar"))
        .respond_with(ResponseTemplate::new(200).set_body_string(availability_body))
        .mount(server)
        .await;
}

/// Full workflow ending in the no-appointments marker
#[tokio::test]
async fn test_workflow_no_slots() {
    let server = MockServer::start().await;
    mount_workflow(&server, no_slots_page()).await;

    let navigator = navigator(&server.uri(), 0);
    let outcome = navigator.check_target(&test_target("Almería")).await;

    assert_eq!(outcome, AvailabilityOutcome::NoSlots);
}

/// Full workflow ending in a slot listing
#[tokio::test]
async fn test_workflow_slots_found() {
    let server = MockServer::start().await;
    mount_workflow(
        &server,
        slots_page(&[("01/09/2025", "10:00", "Almería"), ("03/09/2025", "12:30", "Almería")]),
    )
    .await;

    let navigator = navigator(&server.uri(), 0);
    let outcome = navigator.check_target(&test_target("Almería")).await;

    let slots = outcome.slots().expect("slots expected");
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0], Slot::new("01/09/2025", "10:00", "Almería"));
    assert_eq!(slots[0].date, "2025-09-01");
}

/// Session tokens and step-specific fields are threaded through submissions
#[tokio::test]
async fn test_workflow_threads_session_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/icpplus/acOpcDirect"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(selection_page("/icpplus/citar")),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Terms submission must carry the entry token, the selected province
    // value and the acceptance flag
    Mock::given(method("POST"))
        .and(path("/icpplus/citar"))
        .and(body_string_contains("token=tk-entry"))
        .and(body_string_contains("provincia=11"))
        .and(body_string_contains("chkAceptar=si"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(step_form_page("/icpplus/acInfo", "tk-terms")),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Service selection carries the token from the previous page, not the
    // entry token
    Mock::given(method("POST"))
        .and(path("/icpplus/acInfo"))
        .and(body_string_contains("token=tk-terms"))
        .and(body_string_contains("tramiteGrupo=POLICIA"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(step_form_page("/icpplus/acEntrada", "tk-service")),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Applicant data submission
    Mock::given(method("POST"))
        .and(path("/icpplus/acEntrada"))
        .and(body_string_contains("token=tk-service"))
        .and(body_string_contains("txtIdCitado=X1234567"))
        .and(body_string_contains("txtAnnoCitado=1990"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(step_form_page("/icpplus/acCitar", "tk-entry-form")),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/icpplus/acCitar"))
        .and(body_string_contains("token=tk-entry-form"))
        .respond_with(ResponseTemplate::new(200).set_body_string(no_slots_page()))
        .expect(1)
        .mount(&server)
        .await;

    let navigator = navigator(&server.uri(), 0);
    let outcome = navigator.check_target(&test_target("Cádiz")).await;

    assert_eq!(outcome, AvailabilityOutcome::NoSlots);
}

/// Scenario: the terms step exhausts all retries with server errors.
/// The navigator reports a transient failure without attempting later steps
#[tokio::test]
async fn test_step_two_exhaustion_aborts_workflow() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/icpplus/acOpcDirect"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(selection_page("/icpplus/citar")),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/icpplus/citar"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    // Later steps must never be reached
    Mock::given(method("POST"))
        .and(path("/icpplus/acInfo"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/icpplus/acCitar"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let navigator = navigator(&server.uri(), 2);
    let outcome = navigator.check_target(&test_target("Almería")).await;

    assert!(matches!(outcome, AvailabilityOutcome::TransientFailure(_)));
}

/// A province the portal does not offer is a workflow error, not retried
#[tokio::test]
async fn test_unoffered_province_is_workflow_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/icpplus/acOpcDirect"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(selection_page("/icpplus/citar")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let navigator = navigator(&server.uri(), 2);
    let outcome = navigator.check_target(&test_target("Sevilla")).await;

    match outcome {
        AvailabilityOutcome::WorkflowError(reason) => assert!(reason.contains("Sevilla")),
        other => panic!("expected WorkflowError, got {other:?}"),
    }
}

/// A rejected submission (4xx) is a workflow error after a single attempt
#[tokio::test]
async fn test_rejected_submission_is_workflow_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/icpplus/acOpcDirect"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(selection_page("/icpplus/citar")),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/icpplus/citar"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let navigator = navigator(&server.uri(), 3);
    let outcome = navigator.check_target(&test_target("Almería")).await;

    assert!(matches!(outcome, AvailabilityOutcome::WorkflowError(_)));
}

/// An availability page in an unknown shape is a workflow error
#[tokio::test]
async fn test_unrecognized_availability_page() {
    let server = MockServer::start().await;
    mount_workflow(
        &server,
        "<html><body><h1>Página en mantenimiento</h1></body></html>".to_string(),
    )
    .await;

    let navigator = navigator(&server.uri(), 0);
    let outcome = navigator.check_target(&test_target("Almería")).await;

    assert!(matches!(outcome, AvailabilityOutcome::WorkflowError(_)));
}
