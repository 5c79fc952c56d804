//! Shipping-document rule-set: one row per bill of lading.
//!
//! Header fields come straight from `documents[0].data`. Cargo fields come from
//! the first entry of `marks_and_descriptions_table` only; further cargo rows are
//! dropped on purpose so each file stays a single spreadsheet row.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::{blank_row, FILENAME_COLUMN};
use crate::contract::{Flattener, Header};
use crate::lookup::{self, Step};
use crate::response::{CellValue, FlatRow, RawResponse};

pub const SHIPPING_COLUMNS: &[&str] = &[
    FILENAME_COLUMN,
    "Shipper Name",
    "Shipper Details",
    "Consignee Name",
    "Consignee Details",
    "Notify Party Name",
    "Notify Party Details",
    "B/L Type",
    "B/L Number",
    "Vessel",
    "Voyage",
    "Port of Loading",
    "Port of Discharge",
    "Place of Receipt",
    "Place of Delivery",
    "Marks and Numbers",
    "Number of Packages",
    "Description of Goods",
    "Gross Weight",
    "Measurement",
    "Error",
];

/// Column -> key under `data`.
const HEADER_FIELDS: &[(&str, &str)] = &[
    ("Shipper Name", "shipper_name"),
    ("Shipper Details", "shipper_details"),
    ("Consignee Name", "consignee_name"),
    ("Consignee Details", "consignee_details"),
    ("Notify Party Name", "notify_party_name"),
    ("Notify Party Details", "notify_party_details"),
    ("B/L Type", "bl_type"),
    ("B/L Number", "bl_number"),
    ("Vessel", "vessel_name"),
    ("Voyage", "voyage_number"),
    ("Port of Loading", "port_of_loading"),
    ("Port of Discharge", "port_of_discharge"),
    ("Place of Receipt", "place_of_receipt"),
    ("Place of Delivery", "place_of_delivery"),
];

/// Column -> key under `data.marks_and_descriptions_table[0]`.
const CARGO_FIELDS: &[(&str, &str)] = &[
    ("Marks and Numbers", "marks_and_numbers"),
    ("Number of Packages", "number_of_packages"),
    ("Description of Goods", "description_of_goods"),
    ("Gross Weight", "gross_weight"),
    ("Measurement", "measurement"),
];

const CARGO_TABLE: &str = "marks_and_descriptions_table";

// Any bracketed group, ASCII or full-width, that mentions "invoice".
static INVOICE_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*[(（][^()（）]*invoice[^()（）]*[)）]")
        .expect("invoice annotation pattern is valid")
});

/// Removes bracketed "INVOICE" annotations from a file name and trims it.
///
/// `"BL123 (COMMERCIAL INVOICE).pdf"` and `"BL123（INVOICE）.pdf"` both become
/// `"BL123.pdf"`. Cleaning a clean name returns it unchanged.
pub fn clean_filename(name: &str) -> String {
    let mut cleaned = name.trim().to_string();
    // Removing an inner group can expose an outer one, e.g. "(in(invoice)voice)".
    loop {
        let next = INVOICE_ANNOTATION.replace_all(&cleaned, "").trim().to_string();
        if next == cleaned {
            return cleaned;
        }
        cleaned = next;
    }
}

pub struct ShippingFlattener;

impl Flattener for ShippingFlattener {
    fn name(&self) -> &'static str {
        "shipping"
    }

    fn header(&self) -> Header {
        Header::Fixed(SHIPPING_COLUMNS)
    }

    fn flatten(&self, response: &RawResponse) -> Vec<FlatRow> {
        static NO_DATA: Value = Value::Null;
        let data = response.first_document_data().unwrap_or(&NO_DATA);

        let mut row = blank_row(SHIPPING_COLUMNS);
        row.insert(
            FILENAME_COLUMN.to_string(),
            CellValue::Text(clean_filename(&response.filename)),
        );

        for &(column, key) in HEADER_FIELDS {
            row.insert(column.to_string(), lookup::cell_at(data, &[Step::Key(key)]));
        }

        // First cargo entry only.
        if let Some(cargo) = lookup::lookup(data, &[Step::Key(CARGO_TABLE), Step::Index(0)]) {
            for &(column, key) in CARGO_FIELDS {
                row.insert(column.to_string(), lookup::cell_at(cargo, &[Step::Key(key)]));
            }
        }

        row.insert("Error".to_string(), response.error_cell());
        vec![row]
    }
}
