//! Availability classification for the final workflow step
//!
//! [`classify`] is a pure function over the step-5 payload: the same payload
//! always yields the same outcome, and no state is carried between calls.
//! Pages that match neither the no-slots template nor a slot listing are a
//! workflow error; they usually mean the portal changed shape and must be
//! surfaced loudly rather than retried.

use scraper::Html;

use crate::models::{AvailabilityOutcome, Slot};
use crate::parser::form::element_text;
use crate::parser::markers::{
    NO_SLOTS_MARKERS, SLOT_DATE, SLOT_LOCATION, SLOT_RADIOS, SLOT_ROWS, SLOT_TIME,
};

/// Classify the availability page into exactly one outcome.
///
/// No-slots markers take precedence over slot extraction: the portal's
/// negative phrasing embeds positive-sounding substrings ("no hay citas
/// disponibles" contains "citas disponibles"), so the negative check must run
/// first.
pub fn classify(html: &str) -> AvailabilityOutcome {
    let document = Html::parse_document(html);

    let page_text = document
        .root_element()
        .text()
        .collect::<String>()
        .to_lowercase();

    for marker in NO_SLOTS_MARKERS {
        if page_text.contains(marker) {
            return AvailabilityOutcome::NoSlots;
        }
    }

    let slots = extract_slots(&document);
    if !slots.is_empty() {
        return AvailabilityOutcome::SlotsFound(slots);
    }

    AvailabilityOutcome::WorkflowError(
        "availability page matches neither the no-slots nor the slot-listing template".to_string(),
    )
}

/// Extract slot descriptors, trying the calendar-table layout first and the
/// radio-input layout as a fallback
fn extract_slots(document: &Html) -> Vec<Slot> {
    let from_table = extract_table_slots(document);
    if !from_table.is_empty() {
        return from_table;
    }

    extract_radio_slots(document)
}

/// Calendar-table layout: one `tr.cita` per slot with fecha/hora/oficina cells
fn extract_table_slots(document: &Html) -> Vec<Slot> {
    let mut slots = Vec::new();

    for row in document.select(&SLOT_ROWS) {
        let date = row.select(&SLOT_DATE).next().map(element_text);
        let time = row.select(&SLOT_TIME).next().map(element_text);
        let location = row.select(&SLOT_LOCATION).next().map(element_text);

        if let (Some(date), Some(time), Some(location)) = (date, time, location) {
            let (date, time, location) = (
                date.trim().to_string(),
                time.trim().to_string(),
                location.trim().to_string(),
            );
            if !date.is_empty() && !time.is_empty() && !location.is_empty() {
                slots.push(Slot::new(date, time, location));
            }
        }
    }

    slots
}

/// Radio-input layout: each option's value carries `date|time|office`
fn extract_radio_slots(document: &Html) -> Vec<Slot> {
    let mut slots = Vec::new();

    for input in document.select(&SLOT_RADIOS) {
        let Some(value) = input.value().attr("value") else {
            continue;
        };

        let parts: Vec<&str> = value.split('|').map(str::trim).collect();
        if parts.len() == 3 && parts.iter().all(|p| !p.is_empty()) {
            slots.push(Slot::new(parts[0], parts[1], parts[2]));
        }
    }

    slots
}
