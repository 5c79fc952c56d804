use extract_sheet::contract::Flattener;
use extract_sheet::flatten::{FlatInvoiceFlattener, LineItemInvoiceFlattener};
use extract_sheet::response::{CellValue, RawResponse};
use serde_json::{json, Value};

fn response(filename: &str, body: Value) -> RawResponse {
    RawResponse::from_body(filename, body.as_object().cloned().expect("test body is an object"))
}

fn invoice_with_items(items: Value) -> RawResponse {
    response(
        "INVOICE_001.pdf",
        json!({
            "documents": [{
                "data": {
                    "master_ocean_or_airway_bill_no": "MBL-1",
                    "house_ocean_or_airway_bill_no": "HBL-1",
                    "invoice_number": "INV-42",
                    "line_items": items
                }
            }]
        }),
    )
}

#[test]
fn three_line_items_yield_three_rows_sharing_the_header() {
    let resp = invoice_with_items(json!([
        {"description": "Ocean Freight", "quantity": 2, "rate": {"value": 10, "currency": "USD"},
         "item_total": {"value": 20}, "exchange_rate": 7.1},
        {"description": "THC", "quantity": 1, "rate": {"value": 55.5, "currency": "HKD"}},
        {"description": "Doc fee", "quantity": "3", "rate": {"value": "4"}}
    ]));

    let rows = LineItemInvoiceFlattener.flatten(&resp);
    assert_eq!(rows.len(), 3);

    for row in &rows {
        assert_eq!(row["filename"], CellValue::from("INVOICE_001.pdf"));
        assert_eq!(row["B/L Number"], CellValue::from("MBL-1"));
        assert_eq!(row["Invoice Number"], CellValue::from("INV-42"));
        assert_eq!(row["Error"], CellValue::Empty);
    }

    assert_eq!(rows[0]["Charge Description"], CellValue::from("Ocean Freight"));
    assert_eq!(rows[0]["Amount"], CellValue::Number(20.0));
    assert_eq!(rows[0]["Currency"], CellValue::from("USD"));
    assert_eq!(rows[0]["Total Payment Amount"], CellValue::Number(20.0));
    assert_eq!(rows[0]["Exchange Rate"], CellValue::Number(7.1));

    assert_eq!(rows[1]["Charge Description"], CellValue::from("THC"));
    assert_eq!(rows[1]["Amount"], CellValue::Number(55.5));
    assert_eq!(rows[1]["Total Payment Amount"], CellValue::Empty);

    assert_eq!(rows[2]["Amount"], CellValue::Number(12.0));
    assert_eq!(rows[2]["Currency"], CellValue::Empty);
}

#[test]
fn every_row_has_the_fixed_columns_in_order() {
    let resp = invoice_with_items(json!([{"description": "x"}]));
    let rows = LineItemInvoiceFlattener.flatten(&resp);
    let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "filename",
            "B/L Number",
            "Invoice Number",
            "Charge Description",
            "Currency",
            "Amount",
            "Exchange Rate",
            "Total Payment Amount",
            "Error"
        ]
    );
}

#[test]
fn zero_quantity_is_zero_but_missing_rate_is_empty() {
    let resp = invoice_with_items(json!([
        {"description": "free", "quantity": 0, "rate": {"value": 10}},
        {"description": "unrated", "quantity": 2}
    ]));
    let rows = LineItemInvoiceFlattener.flatten(&resp);
    assert_eq!(rows[0]["Amount"], CellValue::Number(0.0));
    assert_eq!(rows[1]["Amount"], CellValue::Empty);
}

#[test]
fn rate_given_as_scalar_has_no_currency_and_no_amount() {
    let resp = invoice_with_items(json!([
        {"description": "odd", "quantity": 2, "rate": 10, "item_total": "20"}
    ]));
    let rows = LineItemInvoiceFlattener.flatten(&resp);
    assert_eq!(rows[0]["Amount"], CellValue::Empty);
    assert_eq!(rows[0]["Currency"], CellValue::Empty);
    assert_eq!(rows[0]["Total Payment Amount"], CellValue::Empty);
}

#[test]
fn no_line_items_yields_one_header_row() {
    for items in [json!([]), json!(null), json!("not a list")] {
        let rows = LineItemInvoiceFlattener.flatten(&invoice_with_items(items));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["B/L Number"], CellValue::from("MBL-1"));
        assert_eq!(rows[0]["Charge Description"], CellValue::Empty);
        assert_eq!(rows[0]["Amount"], CellValue::Empty);
    }
}

#[test]
fn bl_number_falls_back_to_house_bill() {
    let resp = response(
        "a.pdf",
        json!({"documents": [{"data": {
            "master_ocean_or_airway_bill_no": "",
            "house_ocean_or_airway_bill_no": "HBL-9"
        }}]}),
    );
    let rows = LineItemInvoiceFlattener.flatten(&resp);
    assert_eq!(rows[0]["B/L Number"], CellValue::from("HBL-9"));
}

#[test]
fn error_response_produces_one_row_carrying_the_error() {
    let resp = RawResponse::failed("Invoice_2.pdf", "/in/Invoice_2.pdf", "HTTP 500 from extraction API: oops");
    let rows = LineItemInvoiceFlattener.flatten(&resp);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Error"], CellValue::from("HTTP 500 from extraction API: oops"));
    assert_eq!(rows[0]["filename"], CellValue::from("Invoice_2.pdf"));
    assert_eq!(rows[0]["B/L Number"], CellValue::Empty);
    assert_eq!(rows[0]["Invoice Number"], CellValue::Empty);
}

#[test]
fn empty_or_malformed_documents_do_not_panic() {
    for body in [
        json!({}),
        json!({"documents": []}),
        json!({"documents": "nope"}),
        json!({"documents": [42]}),
        json!({"documents": [{"data": []}]}),
    ] {
        let resp = response("x.pdf", body);
        let rows = LineItemInvoiceFlattener.flatten(&resp);
        assert_eq!(rows.len(), 1);
        assert!(rows[0]["B/L Number"].is_empty());
        let flat = FlatInvoiceFlattener.flatten(&resp);
        assert_eq!(flat.len(), 1);
        assert!(flat[0]["Invoice Number"].is_empty());
    }
}

#[test]
fn flattening_is_deterministic() {
    let resp = invoice_with_items(json!([
        {"description": "a", "quantity": 1, "rate": {"value": 2}},
        {"description": "b", "quantity": 3, "rate": {"value": 4}}
    ]));
    assert_eq!(
        LineItemInvoiceFlattener.flatten(&resp),
        LineItemInvoiceFlattener.flatten(&resp)
    );
}

#[test]
fn only_the_first_document_is_used() {
    let resp = response(
        "two_docs.pdf",
        json!({"documents": [
            {"data": {"invoice_number": "FIRST"}},
            {"data": {"invoice_number": "SECOND"}}
        ]}),
    );
    let rows = LineItemInvoiceFlattener.flatten(&resp);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Invoice Number"], CellValue::from("FIRST"));
}

#[test]
fn flat_invoice_reads_totals_without_multiplying() {
    let resp = response(
        "inv.pdf",
        json!({"documents": [{"data": {
            "house_ocean_or_airway_bill_no": "HBL-3",
            "invoice_number": "INV-7",
            "invoice_date": "2024-05-01",
            "amount": {"value": 150.25, "currency": "EUR"},
            "exchange_rate": "1.08",
            "total_payment_amount": 162.27,
            "quantity": 2,
            "line_items": [{"description": "ignored"}]
        }}]}),
    );

    let rows = FlatInvoiceFlattener.flatten(&resp);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row["B/L Number"], CellValue::from("HBL-3"));
    assert_eq!(row["Invoice Number"], CellValue::from("INV-7"));
    assert_eq!(row["Invoice Date"], CellValue::from("2024-05-01"));
    assert_eq!(row["Amount"], CellValue::Number(150.25));
    assert_eq!(row["Currency"], CellValue::from("EUR"));
    assert_eq!(row["Exchange Rate"], CellValue::from("1.08"));
    assert_eq!(row["Total Payment Amount"], CellValue::Number(162.27));
    assert!(!row.contains_key("Charge Description"));
}

#[test]
fn flat_invoice_error_row() {
    let resp = RawResponse::failed("inv.pdf", "/in/inv.pdf", "connection refused");
    let rows = FlatInvoiceFlattener.flatten(&resp);
    assert_eq!(rows[0]["Error"], CellValue::from("connection refused"));
    assert!(rows[0]["Amount"].is_empty());
}
