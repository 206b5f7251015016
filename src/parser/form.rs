//! Form extraction for the portal's navigation steps
//!
//! Each workflow step submits the previous page's form with a few fields
//! overridden. The portal threads session tokens through hidden inputs, so
//! every hidden field must be carried forward verbatim.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

use crate::utils::error::ParseError;

lazy_static! {
    static ref FORM: Selector = Selector::parse("form").expect("Invalid CSS selector: form");
    static ref INPUT: Selector = Selector::parse("input").expect("Invalid CSS selector: input");
    static ref OPTION: Selector = Selector::parse("option").expect("Invalid CSS selector: option");
    static ref PROVINCE_SELECT: Selector = Selector::parse(r#"select[name="provincia"]"#)
        .expect("Invalid CSS selector: select[name=provincia]");
}

/// The first form on a portal page: its action and submittable fields.
///
/// Hidden and prefilled inputs are captured as-is; submit buttons are
/// excluded. Select values are resolved separately by the caller since only
/// the province dropdown needs one.
#[derive(Debug, Clone, Default)]
pub struct PageForm {
    /// Raw `action` attribute, possibly relative
    pub action: Option<String>,

    /// Field name → value for hidden and prefilled inputs
    pub fields: HashMap<String, String>,
}

impl PageForm {
    /// Resolve the form action against the portal origin.
    ///
    /// Absolute actions are kept, root-relative actions are joined to the
    /// origin, and a missing action falls back to the page that served the
    /// form (the portal posts back to itself).
    pub fn resolve_action(&self, fallback: &str) -> String {
        match self.action.as_deref() {
            Some(action) if !action.is_empty() => action.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Merge the carried fields with step-specific overrides
    pub fn merged_fields(&self, overrides: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut fields: HashMap<String, String> = self.fields.clone();
        for (name, value) in overrides {
            fields.insert((*name).to_string(), (*value).to_string());
        }
        let mut out: Vec<_> = fields.into_iter().collect();
        // Deterministic submission order keeps request logs diffable
        out.sort();
        out
    }
}

/// Extract the first form on the page
pub fn extract_form(html: &str) -> Result<PageForm, ParseError> {
    let document = Html::parse_document(html);
    let form = document.select(&FORM).next().ok_or(ParseError::FormNotFound)?;

    let mut fields = HashMap::new();
    for input in form.select(&INPUT) {
        let element = input.value();
        let Some(name) = element.attr("name") else {
            continue;
        };
        match element.attr("type").unwrap_or("text") {
            "submit" | "button" | "image" | "reset" => continue,
            _ => {
                fields.insert(
                    name.to_string(),
                    element.attr("value").unwrap_or_default().to_string(),
                );
            }
        }
    }

    Ok(PageForm {
        action: form.value().attr("action").map(str::to_string),
        fields,
    })
}

/// Resolve the option value for a labelled entry in a named dropdown.
///
/// Returns [`ParseError::MissingField`] when the dropdown itself is absent
/// and [`ParseError::ProvinceNotOffered`] when the label is not among its
/// options.
pub fn province_option_value(html: &str, province: &str) -> Result<String, ParseError> {
    let document = Html::parse_document(html);

    let dropdown = document
        .select(&PROVINCE_SELECT)
        .next()
        .ok_or_else(|| ParseError::MissingField("provincia".to_string()))?;

    for option in dropdown.select(&OPTION) {
        if element_text(option).trim() == province {
            return Ok(option.value().attr("value").unwrap_or_default().to_string());
        }
    }

    Err(ParseError::ProvinceNotOffered(province.to_string()))
}

/// Concatenated text content of an element
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}
