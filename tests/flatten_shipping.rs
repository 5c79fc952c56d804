use extract_sheet::contract::Flattener;
use extract_sheet::flatten::shipping::SHIPPING_COLUMNS;
use extract_sheet::flatten::{flatten_all, ShippingFlattener};
use extract_sheet::response::{CellValue, RawResponse};
use serde_json::{json, Value};

fn response(filename: &str, body: Value) -> RawResponse {
    RawResponse::from_body(filename, body.as_object().cloned().expect("test body is an object"))
}

fn bill_of_lading() -> Value {
    json!({
        "documents": [{
            "data": {
                "shipper_name": "ACME Export Ltd",
                "shipper_details": "1 Harbour Rd, Shenzhen",
                "consignee_name": "Widgets BV",
                "consignee_details": "Rotterdam",
                "notify_party_name": "Same as consignee",
                "bl_type": "ORIGINAL",
                "bl_number": "COSU123456",
                "vessel_name": "EVER GIVEN",
                "voyage_number": "021W",
                "port_of_loading": "Yantian",
                "port_of_discharge": "Rotterdam",
                "marks_and_descriptions_table": [
                    {
                        "marks_and_numbers": "N/M",
                        "number_of_packages": 120,
                        "description_of_goods": "Plastic widgets",
                        "gross_weight": "2400 KGS",
                        "measurement": "18.5 CBM"
                    },
                    {
                        "marks_and_numbers": "SECOND",
                        "number_of_packages": 1,
                        "description_of_goods": "Should not appear"
                    }
                ]
            }
        }]
    })
}

#[test]
fn one_row_per_file_with_header_and_first_cargo_entry() {
    let resp = response("BL_COSU123456 (COMMERCIAL INVOICE).pdf", bill_of_lading());
    let rows = ShippingFlattener.flatten(&resp);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];

    assert_eq!(row["filename"], CellValue::from("BL_COSU123456.pdf"));
    assert_eq!(row["Shipper Name"], CellValue::from("ACME Export Ltd"));
    assert_eq!(row["B/L Number"], CellValue::from("COSU123456"));
    assert_eq!(row["Vessel"], CellValue::from("EVER GIVEN"));
    assert_eq!(row["Voyage"], CellValue::from("021W"));
    assert_eq!(row["Marks and Numbers"], CellValue::from("N/M"));
    assert_eq!(row["Number of Packages"], CellValue::Number(120.0));
    assert_eq!(row["Description of Goods"], CellValue::from("Plastic widgets"));
    assert_eq!(row["Measurement"], CellValue::from("18.5 CBM"));

    assert!(row["Notify Party Details"].is_empty());
    assert!(row["Place of Receipt"].is_empty());
    assert!(row["Error"].is_empty());
}

#[test]
fn row_keys_follow_the_fixed_column_order() {
    let rows = ShippingFlattener.flatten(&response("a.pdf", bill_of_lading()));
    let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
    assert_eq!(keys, SHIPPING_COLUMNS);
}

#[test]
fn full_width_invoice_annotation_is_removed_from_filename() {
    let rows = ShippingFlattener.flatten(&response("BL9（INVOICE）.pdf", json!({})));
    assert_eq!(rows[0]["filename"], CellValue::from("BL9.pdf"));
}

#[test]
fn missing_cargo_table_leaves_cargo_columns_empty() {
    for table in [json!([]), json!(null), json!({"marks_and_numbers": "not a list"})] {
        let body = json!({"documents": [{"data": {
            "bl_number": "X1",
            "marks_and_descriptions_table": table
        }}]});
        let rows = ShippingFlattener.flatten(&response("x.pdf", body));
        assert_eq!(rows[0]["B/L Number"], CellValue::from("X1"));
        assert!(rows[0]["Marks and Numbers"].is_empty());
        assert!(rows[0]["Gross Weight"].is_empty());
    }
}

#[test]
fn error_response_still_yields_a_row() {
    let resp = RawResponse::failed("BL1 (invoice).pdf", "/in/BL1 (invoice).pdf", "HTTP 401 from extraction API: denied");
    let rows = ShippingFlattener.flatten(&resp);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["filename"], CellValue::from("BL1.pdf"));
    assert_eq!(rows[0]["Error"], CellValue::from("HTTP 401 from extraction API: denied"));
    assert!(rows[0]["Shipper Name"].is_empty());
}

#[test]
fn table_over_several_files_has_one_row_each() {
    let responses = vec![
        response("a.pdf", bill_of_lading()),
        RawResponse::failed("b.pdf", "/in/b.pdf", "boom"),
        response("c.pdf", json!({"documents": []})),
    ];
    let table = flatten_all(&ShippingFlattener, &responses);
    assert_eq!(table.len(), 3);
    assert_eq!(table.columns, SHIPPING_COLUMNS);
    assert_eq!(table.cell(1, "Error"), &CellValue::from("boom"));
    assert_eq!(table.cell(2, "filename"), &CellValue::from("c.pdf"));
    assert!(table.cell(2, "Vessel").is_empty());
}
