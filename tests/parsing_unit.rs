use serde_json::json;
use uuid::Uuid;

use producto_backend::api::gemini_client::extract_inline_image;
use producto_backend::api::openai_client::{parse_planning_response, PLANNED_IMAGE_COUNT};
use producto_backend::error::WorkflowError;
use producto_backend::generation::{validate, SubmitRequest};
use producto_backend::models::OrderMetadata;
use producto_backend::s3_utils::build_public_url;

fn planning_json(count: usize, index: usize) -> String {
    let prompts: Vec<serde_json::Value> = (0..count)
        .map(|i| json!({ "imageIndexToUse": index, "prompt": format!("variation {i}") }))
        .collect();
    json!({ "prompts": prompts }).to_string()
}

#[test]
fn planning_response_parses_a_full_plan() {
    let content = planning_json(PLANNED_IMAGE_COUNT, 2);
    let prompts = parse_planning_response(&content, 3).expect("valid plan");
    assert_eq!(prompts.len(), PLANNED_IMAGE_COUNT);
    assert_eq!(prompts[0].image_index_to_use, 2);
    assert_eq!(prompts[0].prompt, "variation 0");
}

#[test]
fn planning_response_rejects_wrong_count() {
    let content = planning_json(PLANNED_IMAGE_COUNT - 1, 0);
    let err = parse_planning_response(&content, 3).unwrap_err();
    assert!(err.to_string().contains("expected 16 prompts"));
}

#[test]
fn planning_response_rejects_out_of_range_index() {
    let content = planning_json(PLANNED_IMAGE_COUNT, 3);
    let err = parse_planning_response(&content, 3).unwrap_err();
    assert!(err.to_string().contains("only 3 were provided"));
}

#[test]
fn planning_response_rejects_non_json() {
    let err = parse_planning_response("sure, here are your prompts!", 3).unwrap_err();
    assert!(err.to_string().contains("not valid JSON"));
}

#[test]
fn order_metadata_round_trips_through_custom_id() {
    let user_id = Uuid::new_v4();
    let blob = serde_json::to_string(&OrderMetadata {
        user_id,
        package_id: "basic".to_string(),
        credits: 21,
    })
    .expect("serialize metadata");

    // Field names are part of the wire contract with the checkout client.
    assert!(blob.contains("\"userId\""));
    assert!(blob.contains("\"packageId\""));

    let parsed: OrderMetadata = serde_json::from_str(&blob).expect("parse metadata");
    assert_eq!(parsed.user_id, user_id);
    assert_eq!(parsed.package_id, "basic");
    assert_eq!(parsed.credits, 21);
}

#[test]
fn order_metadata_rejects_incomplete_blobs() {
    assert!(serde_json::from_str::<OrderMetadata>("{}").is_err());
    assert!(serde_json::from_str::<OrderMetadata>("not json").is_err());
}

#[test]
fn inline_image_is_taken_from_the_first_image_part() {
    let response = json!({
        "candidates": [{
            "content": {
                "parts": [
                    { "text": "some commentary" },
                    { "inlineData": { "mimeType": "image/png", "data": "QUJD" } }
                ]
            }
        }]
    });
    assert_eq!(extract_inline_image(&response), Some("QUJD"));
}

#[test]
fn inline_image_accepts_snake_case_parts() {
    let response = json!({
        "candidates": [{
            "content": {
                "parts": [
                    { "inline_data": { "mime_type": "image/jpeg", "data": "REVG" } }
                ]
            }
        }]
    });
    assert_eq!(extract_inline_image(&response), Some("REVG"));
}

#[test]
fn inline_image_is_absent_from_text_only_responses() {
    let response = json!({
        "candidates": [{
            "content": { "parts": [{ "text": "no image for you" }] }
        }]
    });
    assert_eq!(extract_inline_image(&response), None);
}

#[test]
fn public_urls_handle_templates_and_plain_bases() {
    assert_eq!(
        build_public_url("https://cdn.example.com/{bucket}/{key}", "b", "k.jpg"),
        "https://cdn.example.com/b/k.jpg"
    );
    assert_eq!(
        build_public_url("https://b.s3.amazonaws.com", "b", "k.jpg"),
        "https://b.s3.amazonaws.com/k.jpg"
    );
    assert_eq!(
        build_public_url("https://storage.example.com/", "bucket", "k.jpg"),
        "https://storage.example.com/bucket/k.jpg"
    );
}

fn full_request(user_id: Option<Uuid>, image_urls: Vec<String>) -> SubmitRequest {
    SubmitRequest {
        name: Some("Mug".to_string()),
        description: Some("Ceramic mug".to_string()),
        price: Some("19.99".to_string()),
        category: Some("home".to_string()),
        image_style: Some("studio".to_string()),
        image_urls,
        user_id,
    }
}

#[test]
fn validate_collects_missing_fields_in_wire_spelling() {
    let request = SubmitRequest {
        name: None,
        description: Some(String::new()),
        price: Some("19.99".to_string()),
        category: Some("home".to_string()),
        image_style: None,
        image_urls: Vec::new(),
        user_id: None,
    };

    let err = validate(&request).unwrap_err();
    match err {
        WorkflowError::Validation { missing_fields, .. } => {
            assert_eq!(
                missing_fields,
                vec!["name", "description", "imageStyle", "imageUrls", "userId"]
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn validate_caps_the_source_image_count() {
    let urls = (0..6).map(|i| format!("https://example.com/{i}.jpg")).collect();
    let err = validate(&full_request(Some(Uuid::new_v4()), urls)).unwrap_err();
    match err {
        WorkflowError::Validation { message, .. } => {
            assert!(message.contains("At most 5"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn validate_accepts_a_complete_request() {
    let user_id = Uuid::new_v4();
    let request = full_request(Some(user_id), vec!["https://example.com/0.jpg".to_string()]);
    let valid = validate(&request).expect("valid request");
    assert_eq!(valid.user_id, user_id);
    assert_eq!(valid.image_urls.len(), 1);
}
