use axum::http::{Method, StatusCode};
use serde_json::json;

mod utils;

use utils::*;

#[tokio::test]
async fn test_listing_lifecycle() {
    let setup = TestSetupBuilder::new().build().await;

    let created = setup
        .create_house(house_body("Lake View Villa", "Kakkanad", 32000.0))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.json["data"]["id"].as_str().unwrap().to_string();
    let slug = created.json["data"]["slug"].as_str().unwrap().to_string();
    assert_eq!(slug, "lake-view-villa-kakkanad");

    let by_id = setup.get(&format!("/api/house/{}", id)).await;
    assert_eq!(by_id.status, StatusCode::OK);
    assert_eq!(by_id.json["data"]["title"], "Lake View Villa");

    let by_slug = setup.get(&format!("/api/house/single/{}", slug)).await;
    assert_eq!(by_slug.json["data"]["id"], id.as_str());

    let mut changed = house_body("Lake View Villa Renovated", "Kakkanad", 35000.0);
    changed["furnishing"] = json!("full");
    let updated = setup
        .json(Method::PUT, &format!("/api/house/{}", id), changed, None)
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json["data"]["price"], 35000.0);
    assert_eq!(updated.json["data"]["furnishing"], "full");
    // Slug is fixed at creation
    assert_eq!(updated.json["data"]["slug"], slug.as_str());
    assert_eq!(
        updated.json["data"]["createdAt"],
        created.json["data"]["createdAt"]
    );

    let deleted = setup
        .json(Method::DELETE, &format!("/api/house/{}", id), json!({}), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let gone = setup.get(&format!("/api/house/{}", id)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.json["message"], "House not found");
}

#[tokio::test]
async fn test_colliding_titles_get_numbered_slugs() {
    let setup = TestSetupBuilder::new().build().await;

    let mut slugs = Vec::new();
    for _ in 0..3 {
        let created = setup
            .create_house(house_body("Cozy Studio", "Edappally", 12000.0))
            .await;
        slugs.push(created.json["data"]["slug"].as_str().unwrap().to_string());
    }

    assert_eq!(
        slugs,
        vec![
            "cozy-studio-edappally",
            "cozy-studio-edappally-1",
            "cozy-studio-edappally-2"
        ]
    );
}

#[tokio::test]
async fn test_search_paginates_and_filters_by_price() {
    let setup = TestSetupBuilder::new().build().await;
    for i in 0..12 {
        setup
            .create_house(house_body(
                &format!("Flat number {}", i),
                "Vyttila",
                10000.0 + (i as f64) * 1000.0,
            ))
            .await;
    }

    let page = setup.get("/api/house?page=2&limit=5").await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.json["data"]["houses"].as_array().unwrap().len(), 5);
    assert_eq!(page.json["data"]["total"], 12);
    assert_eq!(page.json["data"]["totalPages"], 3);

    let past_end = setup.get("/api/house?page=9&limit=5").await;
    assert!(past_end.json["data"]["houses"].as_array().unwrap().is_empty());

    // Inclusive on both ends
    let ranged = setup
        .get("/api/house?priceMin=12000&priceMax=14000&sortBy=price&order=asc")
        .await;
    let prices: Vec<f64> = ranged.json["data"]["houses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|house| house["price"].as_f64().unwrap())
        .collect();
    assert_eq!(prices, vec![12000.0, 13000.0, 14000.0]);
}

#[tokio::test]
async fn test_search_term_matches_location_case_insensitively() {
    let setup = TestSetupBuilder::new().build().await;
    setup
        .create_house(house_body("Garden Home", "Fort Kochi", 20000.0))
        .await;
    setup
        .create_house(house_body("Metro Flat", "Aluva", 15000.0))
        .await;

    let found = setup.get("/api/house?search=fort%20KOCHI").await;

    assert_eq!(found.json["data"]["total"], 1);
    assert_eq!(found.json["data"]["houses"][0]["title"], "Garden Home");
}

#[tokio::test]
async fn test_malformed_id_is_rejected() {
    let setup = TestSetupBuilder::new().build().await;

    let response = setup.get("/api/house/not-an-object-id").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json["message"], "Invalid house ID");
}

#[tokio::test]
async fn test_invalid_listing_reports_all_violations() {
    let setup = TestSetupBuilder::new().build().await;
    let mut body = house_body("ab", "Kochi", 20000.0);
    body["carParking"] = json!(true);
    body["bedrooms"] = json!("7");

    let response = setup.create_house(body).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json["message"], "Validation failed");
    assert_eq!(
        response.json["errors"],
        json!([
            "Title must be between 3 and 80 characters.",
            "Car parking count is required when car parking is enabled.",
            "Invalid bedroom count."
        ])
    );
}

#[tokio::test]
async fn test_uploaded_photo_can_back_a_listing() {
    let setup = TestSetupBuilder::new().build().await;

    let uploaded = setup
        .upload("/api/upload-photo/house", "front.jpg", b"\xff\xd8\xff-jpeg")
        .await;
    assert_eq!(uploaded.status, StatusCode::OK);
    let url = uploaded.json["data"]["url"].as_str().unwrap().to_string();
    assert_eq!(
        uploaded.json["data"]["publicId"],
        format!("{}/front-ente-rental-kochi", HOUSE_FOLDER)
    );

    let uploads = setup.image_host.uploads().await;
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].folder, format!("{}/og-image", HOUSE_FOLDER));

    let mut body = house_body("Photo Ready Home", "Kaloor", 18000.0);
    body["images"] = json!([url]);
    let created = setup.create_house(body).await;
    assert_eq!(created.status, StatusCode::CREATED);

    // Spooled files never outlive the request
    let spool = setup.upload_dir.path().join("spool");
    assert_eq!(std::fs::read_dir(spool).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_failure_is_reported_generically() {
    let setup = TestSetupBuilder::new()
        .with_image_host(MockImageHost::unavailable())
        .build()
        .await;

    let response = setup
        .upload("/api/upload-photo/house", "front.jpg", b"jpeg")
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json["message"], "Image upload failed");
}
