//! HTML parsing and availability classification
//!
//! This module interprets portal responses: form extraction for the
//! navigation steps and classification of the final availability page.

pub mod availability;
pub mod form;
pub mod markers;

pub use availability::classify;
pub use form::{province_option_value, PageForm};
