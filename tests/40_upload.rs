mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{workbook, TestApp};

#[tokio::test]
async fn parses_header_and_rows() -> Result<()> {
    let app = TestApp::new();
    let bytes = workbook(&[vec![json!("Name"), json!("Sales")], vec![json!("Widget"), json!(42)]])?;

    let (status, body) = app.upload(Some(("sales.xlsx", bytes))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "File parsed");
    assert_eq!(body["columns"], json!(["Name", "Sales"]));
    assert_eq!(body["rows"], json!([{ "Name": "Widget", "Sales": 42 }]));
    Ok(())
}

#[tokio::test]
async fn upload_needs_no_token() -> Result<()> {
    let app = TestApp::new();
    let bytes = workbook(&[vec![json!("x")], vec![json!(true)], vec![json!(1.25)]])?;

    let (status, body) = app.upload(Some(("flags.xlsx", bytes))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"], json!([{ "x": true }, { "x": 1.25 }]));
    Ok(())
}

#[tokio::test]
async fn csv_uploads_are_parsed() -> Result<()> {
    let app = TestApp::new();
    let csv = b"Region,Revenue\nNorth,1200\nSouth,950.5\n".to_vec();

    let (status, body) = app.upload(Some(("regions.csv", csv))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["columns"], json!(["Region", "Revenue"]));
    assert_eq!(
        body["rows"],
        json!([{ "Region": "North", "Revenue": 1200 }, { "Region": "South", "Revenue": 950.5 }])
    );
    Ok(())
}

#[tokio::test]
async fn legacy_encoded_csv_is_parsed() -> Result<()> {
    let app = TestApp::new();
    // Windows-1252 export: 0xE9 is "é", 0x92 is a right single quote
    let csv = b"Shop,Visits\nCaf\xe9 du Nord,42\nJo\x92s,7\n".to_vec();

    let (status, body) = app.upload(Some(("visits.csv", csv))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["rows"],
        json!([{ "Shop": "Café du Nord", "Visits": 42 }, { "Shop": "Jo\u{2019}s", "Visits": 7 }])
    );
    Ok(())
}

#[tokio::test]
async fn missing_file_is_400() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app.upload(None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file uploaded");

    let (status, body) = app.upload(Some(("empty.xlsx", Vec::new()))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file uploaded");

    // not multipart at all
    let (status, body) = app.post("/api/files/upload", None, json!({ "file": "data" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file uploaded");
    Ok(())
}

#[tokio::test]
async fn unreadable_file_is_500() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app
        .upload(Some(("broken.xlsx", vec![0xff, 0xfe, 0x00, 0x13, 0x37, 0x80])))
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error parsing file");

    let (status, _) = app
        .upload(Some(("truncated.xlsx", b"PK\x03\x04 truncated archive".to_vec())))
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn oversized_upload_is_rejected() -> Result<()> {
    let mut config = chartsheet_api::config::AppConfig::in_memory(common::TEST_SECRET);
    config.api.max_request_size_bytes = 1024;
    let app = TestApp::with_config(config);

    let (status, _) = app.upload(Some(("big.csv", vec![b'a'; 4096]))).await?;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    Ok(())
}
