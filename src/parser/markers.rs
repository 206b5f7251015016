//! Recognized portal markers and selectors
//!
//! The availability page is classified against an explicit, enumerated set of
//! markers so that a portal redesign produces a loud workflow error instead
//! of a silent misclassification. Phrases are matched lowercase against the
//! page text; selectors cover the two slot layouts the portal has shipped.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

/// Phrases the portal renders when no appointments are available (lowercase)
pub const NO_SLOTS_MARKERS: &[&str] = &[
    "no hay citas disponibles",
    "no hay citas libres",
    "en este momento no hay citas disponibles",
    "no quedan citas libres",
    "todas las citas están ocupadas",
];

lazy_static! {
    /// Slot listing rows in the calendar-table layout
    pub static ref SLOT_ROWS: Selector =
        parse_selector!("table.calendario tr.cita, table.calendar tr.cita");

    /// Date cell within a slot row
    pub static ref SLOT_DATE: Selector = parse_selector!("td.fecha");

    /// Time cell within a slot row
    pub static ref SLOT_TIME: Selector = parse_selector!("td.hora");

    /// Office cell within a slot row
    pub static ref SLOT_LOCATION: Selector = parse_selector!("td.oficina");

    /// Radio-input slot layout; values carry `date|time|office`
    pub static ref SLOT_RADIOS: Selector = parse_selector!(
        r#"input[type="radio"][name*="fecha"], input[type="radio"][name*="cita"]"#
    );
}
