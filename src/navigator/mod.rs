//! Multi-step portal workflow per target
//!
//! The navigator executes the fixed five-step sequence for one province:
//! load the selection page, accept terms, pick the asylum service, submit
//! applicant data, and query availability. Each step runs through the retry
//! executor; a failure on any step before the last aborts the attempt and is
//! reported upward without partially interpreting availability.

pub mod fetcher;
pub mod headers;
pub mod session;

pub use fetcher::{PortalFetcher, StepResult};
pub use session::{SessionState, WorkflowStep};

use tracing::debug;

use crate::config::Config;
use crate::models::{AvailabilityOutcome, Target};
use crate::parser::{classify, province_option_value};
use crate::utils::error::ParseError;
use crate::utils::retry::{RetryError, RetryPolicy};

/// Entry path for the appointment workflow
pub const ENTRY_PATH: &str = "/icpplus/acOpcDirect";

/// Service-selection field and its fixed value: national-police asylum request
const FIELD_SERVICE: &str = "tramiteGrupo";
const SERVICE_ASYLUM: &str = "POLICIA-SOLICITUD ASILO";

/// Province dropdown and the terms-acceptance flag submitted with it
const FIELD_PROVINCE: &str = "provincia";
const FIELD_TERMS: &str = "chkAceptar";

/// Entry-form field names used by the portal
const FIELD_DOC_TYPE: &str = "rdbTipoDoc";
const DOC_TYPE_PASSPORT: &str = "PASAPORTE";
const FIELD_PASSPORT: &str = "txtIdCitado";
const FIELD_FULL_NAME: &str = "txtDesCitado";
const FIELD_BIRTH_YEAR: &str = "txtAnnoCitado";
const FIELD_NATIONALITY: &str = "txtPaisNac";

/// How a navigation attempt failed before producing an availability page
#[derive(Debug)]
enum StepFailure {
    /// Retries exhausted on a network step; try again next tick
    Transient(String),
    /// The portal rejected or restructured a step; a site-contract concern
    Workflow(String),
}

impl From<RetryError> for StepFailure {
    fn from(e: RetryError) -> Self {
        match &e {
            RetryError::Exhausted { .. } => Self::Transient(e.to_string()),
            RetryError::Fatal(_) => Self::Workflow(e.to_string()),
        }
    }
}

impl From<ParseError> for StepFailure {
    fn from(e: ParseError) -> Self {
        Self::Workflow(e.to_string())
    }
}

/// Drives the five-step workflow for one target at a time
pub struct Navigator {
    fetcher: PortalFetcher,
}

impl Navigator {
    pub fn new(fetcher: PortalFetcher) -> Self {
        Self { fetcher }
    }

    /// Build a navigator from configuration
    pub fn from_config(config: &Config) -> crate::error::Result<Self> {
        let policy = RetryPolicy::from_secs(&config.http.retry_delays_secs);
        let fetcher = PortalFetcher::with_config(
            &config.http.portal_url,
            config.http.rate_limit,
            policy,
            config.request_timeout(),
        )?;
        Ok(Self::new(fetcher))
    }

    /// Run one full availability check for a target.
    ///
    /// Always produces exactly one outcome; failures are folded into the
    /// outcome rather than returned as errors so the orchestrator can route
    /// them uniformly.
    pub async fn check_target(&self, target: &Target) -> AvailabilityOutcome {
        let mut session = SessionState::new(&target.province);

        match self.run_workflow(target, &mut session).await {
            Ok(body) => classify(&body),
            Err(StepFailure::Transient(reason)) => AvailabilityOutcome::TransientFailure(reason),
            Err(StepFailure::Workflow(reason)) => AvailabilityOutcome::WorkflowError(reason),
        }
    }

    /// Execute steps 1–5, returning the final availability payload
    async fn run_workflow(
        &self,
        target: &Target,
        session: &mut SessionState,
    ) -> Result<String, StepFailure> {
        // Step 1: initial selection page
        debug!(province = %session.province, step = session.step.label(), "Executing step");
        let result = self.fetcher.get(ENTRY_PATH, session.step.label()).await?;
        session.absorb(&result)?;
        let province_value = province_option_value(&result.body, &target.province)?;
        session.advance();

        // Step 2: accept terms with the selected province
        debug!(province = %session.province, step = session.step.label(), "Executing step");
        let fields = session
            .form
            .merged_fields(&[(FIELD_PROVINCE, &province_value), (FIELD_TERMS, "si")]);
        let result = self
            .fetcher
            .post_form(&session.action(), &fields, session.step.label())
            .await?;
        session.absorb(&result)?;
        session.advance();

        // Step 3: service-type selection (fixed asylum service)
        debug!(province = %session.province, step = session.step.label(), "Executing step");
        let fields = session.form.merged_fields(&[(FIELD_SERVICE, SERVICE_ASYLUM)]);
        let result = self
            .fetcher
            .post_form(&session.action(), &fields, session.step.label())
            .await?;
        session.absorb(&result)?;
        session.advance();

        // Step 4: applicant identification data
        debug!(province = %session.province, step = session.step.label(), "Executing step");
        let applicant = &target.applicant;
        let fields = session.form.merged_fields(&[
            (FIELD_DOC_TYPE, DOC_TYPE_PASSPORT),
            (FIELD_PASSPORT, &applicant.passport_number),
            (FIELD_FULL_NAME, &applicant.full_name),
            (FIELD_BIRTH_YEAR, &applicant.birth_year),
            (FIELD_NATIONALITY, &applicant.nationality),
        ]);
        let result = self
            .fetcher
            .post_form(&session.action(), &fields, session.step.label())
            .await?;
        session.absorb(&result)?;
        session.advance();

        // Step 5: availability query; the payload goes to the interpreter
        // untouched and the session ends with this attempt
        debug!(province = %session.province, step = session.step.label(), "Executing step");
        let fields = session.form.merged_fields(&[]);
        let result = self
            .fetcher
            .post_form(&session.action(), &fields, session.step.label())
            .await?;

        Ok(result.body)
    }
}
