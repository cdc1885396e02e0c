use super::*;
use crate::types::ProductOption;

fn make_variant(id: u64, price: Option<&str>) -> Variant {
    Variant {
        id,
        product_id: Some(1),
        title: Some("Small".to_owned()),
        price: price.map(str::to_owned),
        compare_at_price: None,
        sku: Some("SKU-001".to_owned()),
        inventory_quantity: Some(4),
        old_inventory_quantity: None,
        barcode: Some(String::new()),
        weight: None,
        weight_unit: None,
        inventory_item_id: Some(900 + id),
        image_id: None,
        option1: Some("Small".to_owned()),
        option2: None,
        option3: None,
    }
}

fn make_product(variants: Vec<Variant>) -> Product {
    Product {
        id: 632_910_392,
        title: "Canvas Tote".to_owned(),
        body_html: Some("<p>Sturdy.</p>".to_owned()),
        vendor: Some("Acme".to_owned()),
        product_type: Some(String::new()),
        handle: Some("canvas-tote".to_owned()),
        tags: Some("bags, summer ,, sale".to_owned()),
        status: None,
        created_at: Some("2024-01-02T03:04:05-05:00".to_owned()),
        updated_at: None,
        variants,
        images: vec![ProductImage {
            id: 77,
            src: Some("https://cdn.shopify.com/tote.jpg".to_owned()),
            alt: None,
            position: Some(1),
            variant_ids: vec![],
        }],
        options: vec![ProductOption {
            id: Some(5),
            name: "Size".to_owned(),
            values: vec!["Small".to_owned()],
        }],
    }
}

#[test]
fn renames_ids_for_vendors() {
    let normalized = normalize_product(make_product(vec![make_variant(11, Some("19.99"))]));
    assert_eq!(normalized.shopify_id, 632_910_392);
    assert_eq!(normalized.variants[0].shopify_variant_id, 11);
    assert_eq!(normalized.variants[0].shopify_inventory_item_id, Some(911));
    assert_eq!(normalized.images[0].shopify_image_id, 77);
    assert_eq!(
        normalized.shopify_created_at.as_deref(),
        Some("2024-01-02T03:04:05-05:00")
    );
}

#[test]
fn splits_tags_and_drops_blanks() {
    let normalized = normalize_product(make_product(vec![]));
    assert_eq!(normalized.tags, vec!["bags", "summer", "sale"]);
}

#[test]
fn empty_strings_become_absent() {
    let normalized = normalize_product(make_product(vec![make_variant(1, Some("1.00"))]));
    assert_eq!(normalized.product_type, None);
    assert_eq!(normalized.variants[0].barcode, None);
}

#[test]
fn missing_status_defaults_to_active() {
    assert_eq!(normalize_product(make_product(vec![])).status, "active");
}

#[test]
fn prices_parse_as_decimals_and_tolerate_garbage() {
    let normalized = normalize_product(make_product(vec![
        make_variant(1, Some("12.50")),
        make_variant(2, Some("free")),
        make_variant(3, None),
    ]));
    assert_eq!(normalized.variants[0].price, Some(Decimal::new(1250, 2)));
    assert_eq!(normalized.variants[1].price, None);
    assert_eq!(normalized.variants[2].price, None);
}

#[test]
fn join_tags_trims_and_skips_blanks() {
    let tags = vec![" a ".to_owned(), String::new(), "b".to_owned()];
    assert_eq!(join_tags(&tags), "a, b");
}

#[test]
fn split_tags_handles_absent_string() {
    assert!(split_tags(None).is_empty());
}
