//! Per-attempt session state
//!
//! A `SessionState` is created at the start of each target's navigation
//! attempt, owned exclusively by that attempt, and dropped when the attempt
//! concludes. Nothing survives into the next tick: the workflow restarts from
//! the entry page every time.

use crate::navigator::fetcher::StepResult;
use crate::parser::form::{extract_form, PageForm};
use crate::utils::error::ParseError;

/// The fixed step sequence of the portal workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    /// Load the initial province-selection page
    SelectProvince,
    /// Submit terms acceptance with the chosen province
    AcceptTerms,
    /// Submit the service-type selection
    SelectService,
    /// Submit applicant identification data
    SubmitApplicant,
    /// Query appointment availability
    QueryAvailability,
}

impl WorkflowStep {
    /// Step label used in logs and retry output
    pub fn label(&self) -> &'static str {
        match self {
            Self::SelectProvince => "select-province",
            Self::AcceptTerms => "accept-terms",
            Self::SelectService => "select-service",
            Self::SubmitApplicant => "submit-applicant",
            Self::QueryAvailability => "query-availability",
        }
    }

    /// The step that follows this one, if any
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::SelectProvince => Some(Self::AcceptTerms),
            Self::AcceptTerms => Some(Self::SelectService),
            Self::SelectService => Some(Self::SubmitApplicant),
            Self::SubmitApplicant => Some(Self::QueryAvailability),
            Self::QueryAvailability => None,
        }
    }

    /// All steps in workflow order
    pub fn sequence() -> [Self; 5] {
        [
            Self::SelectProvince,
            Self::AcceptTerms,
            Self::SelectService,
            Self::SubmitApplicant,
            Self::QueryAvailability,
        ]
    }
}

/// Mutable state threaded through one navigation attempt
#[derive(Debug)]
pub struct SessionState {
    /// Province this attempt is for
    pub province: String,

    /// Form carried from the last response (action + hidden fields/tokens)
    pub form: PageForm,

    /// URL that served the last response; action fallback for postbacks
    pub current_url: String,

    /// Step the attempt is currently on
    pub step: WorkflowStep,
}

impl SessionState {
    /// Start a fresh attempt at the first step
    pub fn new(province: impl Into<String>) -> Self {
        Self {
            province: province.into(),
            form: PageForm::default(),
            current_url: String::new(),
            step: WorkflowStep::SelectProvince,
        }
    }

    /// Fold a step's response into the session: capture the page form and
    /// remember the serving URL for action fallback
    pub fn absorb(&mut self, result: &StepResult) -> Result<(), ParseError> {
        self.form = extract_form(&result.body)?;
        self.current_url = result.url.clone();
        Ok(())
    }

    /// Move to the next step in the sequence
    pub fn advance(&mut self) {
        if let Some(next) = self.step.next() {
            self.step = next;
        }
    }

    /// Where the next submission should go
    pub fn action(&self) -> String {
        self.form.resolve_action(&self.current_url)
    }
}
