//! Invoice rule-sets.
//!
//! Two layouts exist for the same document family and a deployment picks one:
//! - [`LineItemInvoiceFlattener`]: one row per `line_items` entry, with the
//!   invoice header repeated on each row and `Amount = quantity * rate.value`.
//! - [`FlatInvoiceFlattener`]: one row per invoice, totals read directly from
//!   top-level keys.

use serde_json::Value;

use super::{blank_row, FILENAME_COLUMN};
use crate::contract::{Flattener, Header};
use crate::lookup::{self, Step};
use crate::response::{CellValue, FlatRow, RawResponse};

pub const LINE_ITEM_COLUMNS: &[&str] = &[
    FILENAME_COLUMN,
    "B/L Number",
    "Invoice Number",
    "Charge Description",
    "Currency",
    "Amount",
    "Exchange Rate",
    "Total Payment Amount",
    "Error",
];

pub const FLAT_COLUMNS: &[&str] = &[
    FILENAME_COLUMN,
    "B/L Number",
    "Invoice Number",
    "Invoice Date",
    "Currency",
    "Amount",
    "Exchange Rate",
    "Total Payment Amount",
    "Error",
];

/// Bill-of-lading keys in priority order; the first non-blank one wins.
const BL_NUMBER_KEYS: &[&str] = &["master_ocean_or_airway_bill_no", "house_ocean_or_airway_bill_no"];

static NO_DATA: Value = Value::Null;

/// `B/L Number`: master bill first, house bill when the master is blank.
pub fn bl_number(data: &Value) -> CellValue {
    lookup::first_present(data, BL_NUMBER_KEYS)
        .map(CellValue::from_json)
        .unwrap_or_default()
}

/// `quantity * rate.value` for one line item.
///
/// Both operands must be present and numeric (numbers or numeric strings);
/// otherwise the amount cannot be computed and the cell is empty. A zero operand
/// is a real value: `0 * 10` is `0`, not empty.
pub fn line_amount(item: &Value) -> CellValue {
    let quantity = lookup::field(item, "quantity").and_then(lookup::number_of);
    let rate = lookup::lookup(item, &[Step::Key("rate"), Step::Key("value")]).and_then(lookup::number_of);
    match (quantity, rate) {
        (Some(q), Some(r)) => {
            let amount = q * r;
            if amount.is_finite() {
                CellValue::Number(amount)
            } else {
                CellValue::Empty
            }
        }
        _ => CellValue::Empty,
    }
}

/// Reads `key` from an object-shaped field; anything else is empty.
fn object_member(item: &Value, object: &str, key: &str) -> CellValue {
    match lookup::object_at(item, &[Step::Key(object)]) {
        Some(map) => map.get(key).map(CellValue::from_json).unwrap_or_default(),
        None => CellValue::Empty,
    }
}

/// Header cells shared by every row of one invoice.
struct InvoiceHeader {
    filename: CellValue,
    bl_number: CellValue,
    invoice_number: CellValue,
    error: CellValue,
}

impl InvoiceHeader {
    fn read(response: &RawResponse, data: &Value) -> Self {
        Self {
            filename: CellValue::Text(response.filename.clone()),
            bl_number: bl_number(data),
            invoice_number: lookup::cell_at(data, &[Step::Key("invoice_number")]),
            error: response.error_cell(),
        }
    }

    fn row(&self, columns: &[&str]) -> FlatRow {
        let mut row = blank_row(columns);
        row.insert(FILENAME_COLUMN.to_string(), self.filename.clone());
        row.insert("B/L Number".to_string(), self.bl_number.clone());
        row.insert("Invoice Number".to_string(), self.invoice_number.clone());
        row.insert("Error".to_string(), self.error.clone());
        row
    }
}

pub struct LineItemInvoiceFlattener;

impl Flattener for LineItemInvoiceFlattener {
    fn name(&self) -> &'static str {
        "invoice_line_items"
    }

    fn header(&self) -> Header {
        Header::Fixed(LINE_ITEM_COLUMNS)
    }

    fn flatten(&self, response: &RawResponse) -> Vec<FlatRow> {
        let data = response.first_document_data().unwrap_or(&NO_DATA);
        let header = InvoiceHeader::read(response, data);
        let items = lookup::array_at(data, &[Step::Key("line_items")]);

        if items.is_empty() {
            return vec![header.row(LINE_ITEM_COLUMNS)];
        }

        items
            .iter()
            .map(|item| {
                let mut row = header.row(LINE_ITEM_COLUMNS);
                row.insert(
                    "Charge Description".to_string(),
                    lookup::cell_at(item, &[Step::Key("description")]),
                );
                row.insert("Currency".to_string(), object_member(item, "rate", "currency"));
                row.insert("Amount".to_string(), line_amount(item));
                row.insert(
                    "Exchange Rate".to_string(),
                    lookup::cell_at(item, &[Step::Key("exchange_rate")]),
                );
                row.insert(
                    "Total Payment Amount".to_string(),
                    object_member(item, "item_total", "value"),
                );
                row
            })
            .collect()
    }
}

pub struct FlatInvoiceFlattener;

impl Flattener for FlatInvoiceFlattener {
    fn name(&self) -> &'static str {
        "invoice_flat"
    }

    fn header(&self) -> Header {
        Header::Fixed(FLAT_COLUMNS)
    }

    fn flatten(&self, response: &RawResponse) -> Vec<FlatRow> {
        let data = response.first_document_data().unwrap_or(&NO_DATA);
        let mut row = InvoiceHeader::read(response, data).row(FLAT_COLUMNS);

        row.insert(
            "Invoice Date".to_string(),
            lookup::cell_at(data, &[Step::Key("invoice_date")]),
        );
        let currency = match lookup::cell_at(data, &[Step::Key("currency")]) {
            CellValue::Empty => object_member(data, "amount", "currency"),
            found => found,
        };
        row.insert("Currency".to_string(), currency);
        row.insert("Amount".to_string(), scalar_or_value(data, "amount"));
        row.insert(
            "Exchange Rate".to_string(),
            scalar_or_value(data, "exchange_rate"),
        );
        row.insert(
            "Total Payment Amount".to_string(),
            scalar_or_value(data, "total_payment_amount"),
        );
        vec![row]
    }
}

/// A top-level field copied as-is, or its `value` when it is a `{value, currency}` object.
fn scalar_or_value(data: &Value, key: &str) -> CellValue {
    match lookup::field(data, key) {
        Some(Value::Object(map)) => map.get("value").map(CellValue::from_json).unwrap_or_default(),
        Some(other) => CellValue::from_json(other),
        None => CellValue::Empty,
    }
}
