//! Response flattening: the rule-sets that turn extraction responses into rows.
//!
//! One [`Flattener`] is selected per run by [`FlattenerKind`]; every response of
//! the run goes through it and the rows are gathered into a [`Table`] whose
//! column order comes from the rule-set's [`Header`].

pub mod generic;
pub mod invoice;
pub mod shipping;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contract::{Flattener, Header};
use crate::response::{FlatRow, RawResponse, Table};

pub use generic::GenericFlattener;
pub use invoice::{FlatInvoiceFlattener, LineItemInvoiceFlattener};
pub use shipping::{clean_filename, ShippingFlattener};

/// Column that carries the source file name in every rule-set.
pub const FILENAME_COLUMN: &str = "filename";

/// Which rule-set a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum FlattenerKind {
    /// Every scalar in the response becomes a `dotted.key.path` column.
    Generic,
    /// Shipping manifest / bill of lading fields, one row per file.
    Shipping,
    /// Invoice with one row per line item.
    #[serde(alias = "invoice")]
    InvoiceLineItems,
    /// Invoice totals, one row per file.
    InvoiceFlat,
}

pub fn flattener_for(kind: FlattenerKind) -> Box<dyn Flattener> {
    match kind {
        FlattenerKind::Generic => Box::new(GenericFlattener),
        FlattenerKind::Shipping => Box::new(ShippingFlattener),
        FlattenerKind::InvoiceLineItems => Box::new(LineItemInvoiceFlattener),
        FlattenerKind::InvoiceFlat => Box::new(FlatInvoiceFlattener),
    }
}

/// Flattens every response, in order, into one table.
pub fn flatten_all(flattener: &dyn Flattener, responses: &[RawResponse]) -> Table {
    let mut rows: Vec<FlatRow> = Vec::new();
    for response in responses {
        let produced = flattener.flatten(response);
        debug!(
            filename = %response.filename,
            rows = produced.len(),
            rule_set = flattener.name(),
            "Flattened response"
        );
        rows.extend(produced);
    }

    let columns = columns_for(flattener.header(), &rows);
    info!(
        rule_set = flattener.name(),
        responses = responses.len(),
        rows = rows.len(),
        columns = columns.len(),
        "Flattened all responses"
    );
    Table::new(columns, rows)
}

fn columns_for(header: Header, rows: &[FlatRow]) -> Vec<String> {
    match header {
        Header::Fixed(columns) => columns.iter().map(|c| c.to_string()).collect(),
        Header::Discovered => {
            let mut columns = indexmap::IndexSet::new();
            columns.insert(FILENAME_COLUMN.to_string());
            for row in rows {
                for key in row.keys() {
                    columns.insert(key.clone());
                }
            }
            columns.into_iter().collect()
        }
    }
}

/// Builds a row with exactly `columns`, each empty, ready to be filled in.
pub(crate) fn blank_row(columns: &[&str]) -> FlatRow {
    columns
        .iter()
        .map(|c| (c.to_string(), Default::default()))
        .collect()
}
