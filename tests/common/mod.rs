//! Shared helpers for integration tests

#![allow(dead_code)]

use product_metrics_scraper::ExtractionTarget;
use url::Url;

pub fn item_url(n: usize) -> String {
    format!("https://www.aliexpress.us/item/{n}.html")
}

pub fn url_target(n: usize) -> ExtractionTarget {
    ExtractionTarget::url(Url::parse(&item_url(n)).expect("valid item url"))
}

pub fn url_targets(n: usize) -> Vec<ExtractionTarget> {
    (0..n).map(url_target).collect()
}

/// Page carrying metrics only in microdata and visible text, so every field
/// resolves through a fallback strategy
pub const FALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta property="og:title" content="Folding Camping Chair">
  <script>window.runParams = {"sold": "99999 sold"};</script>
</head>
<body>
  <meta itemprop="ratingValue" content="4.7">
  <meta itemprop="reviewCount" content="1,530">
  <meta itemprop="price" content="34.50">
  <p>Popular pick: 3,200+ orders this month</p>
</body>
</html>"#;
