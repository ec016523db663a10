use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    Ebay,
    Vinted,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Price {
    pub value: f64,
    pub currency: String,
}

impl Price {
    pub fn new(value: f64, currency: impl Into<String>) -> Price {
        Price {
            value,
            currency: currency.into(),
        }
    }
}

pub const UNKNOWN_CONDITION: &str = "Unknown";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingItem {
    pub id: String,
    pub title: String,
    pub price: Price,
    pub condition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller: Option<String>,
    pub image_url: String,
    pub item_url: String,
    pub source: Marketplace,
}

impl ListingItem {
    pub fn new(id: String, title: String, price: Price, source: Marketplace) -> ListingItem {
        ListingItem {
            id,
            title,
            price,
            condition: UNKNOWN_CONDITION.to_string(),
            seller: None,
            image_url: "".to_string(),
            item_url: "".to_string(),
            source,
        }
    }
}

/// eBay regional sites the aggregator can fan out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EbayMarketplace {
    Fr,
    De,
    It,
    Es,
    Gb,
    Us,
}

impl EbayMarketplace {
    pub const ALL: [EbayMarketplace; 6] = [
        EbayMarketplace::Fr,
        EbayMarketplace::De,
        EbayMarketplace::It,
        EbayMarketplace::Es,
        EbayMarketplace::Gb,
        EbayMarketplace::Us,
    ];

    /// Value of the `X-EBAY-C-MARKETPLACE-ID` header.
    pub fn id(&self) -> &'static str {
        match self {
            EbayMarketplace::Fr => "EBAY_FR",
            EbayMarketplace::De => "EBAY_DE",
            EbayMarketplace::It => "EBAY_IT",
            EbayMarketplace::Es => "EBAY_ES",
            EbayMarketplace::Gb => "EBAY_GB",
            EbayMarketplace::Us => "EBAY_US",
        }
    }

    pub fn currency(&self) -> &'static str {
        match self {
            EbayMarketplace::Gb => "GBP",
            EbayMarketplace::Us => "USD",
            _ => "EUR",
        }
    }

    pub fn from_country_code(code: &str) -> Option<EbayMarketplace> {
        match code.trim().to_ascii_lowercase().as_str() {
            "fr" => Some(EbayMarketplace::Fr),
            "de" => Some(EbayMarketplace::De),
            "it" => Some(EbayMarketplace::It),
            "es" => Some(EbayMarketplace::Es),
            "gb" | "uk" => Some(EbayMarketplace::Gb),
            "us" => Some(EbayMarketplace::Us),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketSelection {
    Single(EbayMarketplace),
    Global,
}

impl MarketSelection {
    pub fn marketplaces(&self) -> Vec<EbayMarketplace> {
        match self {
            MarketSelection::Single(m) => vec![*m],
            MarketSelection::Global => EbayMarketplace::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    PriceAsc,
    PriceDesc,
    Title,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<SortKey> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "price_asc" | "price-asc" | "priceasc" | "price_low" | "price" => {
                Some(SortKey::PriceAsc)
            }
            "price_desc" | "price-desc" | "pricedesc" | "price_high" => Some(SortKey::PriceDesc),
            "title" | "name" => Some(SortKey::Title),
            _ => None,
        }
    }
}

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub brands: Vec<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub markets: MarketSelection,
    /// Raw country code, forwarded as-is to Vinted.
    pub country: Option<String>,
    pub page: usize,
    pub page_size: usize,
    pub sort: SortKey,
}

impl Default for SearchRequest {
    fn default() -> Self {
        SearchRequest {
            query: None,
            brands: Vec::new(),
            category: None,
            min_price: None,
            max_price: None,
            markets: MarketSelection::Single(EbayMarketplace::Fr),
            country: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortKey::default(),
        }
    }
}

impl SearchRequest {
    /// Search terms to fan out: the free-text query wins over brand filters.
    pub fn search_terms(&self) -> Vec<String> {
        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => vec![q.to_string()],
            _ => self
                .brands
                .iter()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty())
                .collect(),
        }
    }

    /// Brand filters that still apply; empty whenever a query is present.
    pub fn effective_brands(&self) -> &[String] {
        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => &[],
            _ => &self.brands,
        }
    }

    pub fn price_in_bounds(&self, value: f64) -> bool {
        let min = self.min_price.unwrap_or(0.0);
        let max = self.max_price.unwrap_or(f64::INFINITY);
        value >= min && value <= max
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub items: Vec<ListingItem>,
    pub total_results: usize,
    pub total_pages: usize,
    pub current_page: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_suppresses_brands() {
        let req = SearchRequest {
            query: Some("dior bag".into()),
            brands: vec!["Chanel".into(), "Gucci".into()],
            ..Default::default()
        };
        assert_eq!(req.search_terms(), vec!["dior bag".to_string()]);
        assert!(req.effective_brands().is_empty());
    }

    #[test]
    fn test_brands_used_when_query_blank() {
        let req = SearchRequest {
            query: Some("   ".into()),
            brands: vec!["Chanel".into(), " ".into(), "Gucci".into()],
            ..Default::default()
        };
        assert_eq!(req.search_terms(), vec!["Chanel", "Gucci"]);
    }

    #[test]
    fn test_price_bounds_inclusive() {
        let req = SearchRequest {
            min_price: Some(10.0),
            max_price: Some(20.0),
            ..Default::default()
        };
        assert!(req.price_in_bounds(10.0));
        assert!(req.price_in_bounds(20.0));
        assert!(!req.price_in_bounds(20.01));
        assert!(!req.price_in_bounds(9.99));
        assert!(SearchRequest::default().price_in_bounds(1_000_000.0));
    }

    #[test]
    fn test_sort_key_aliases() {
        assert_eq!(SortKey::parse("price-desc"), Some(SortKey::PriceDesc));
        assert_eq!(SortKey::parse("PRICE_LOW"), Some(SortKey::PriceAsc));
        assert_eq!(SortKey::parse("title"), Some(SortKey::Title));
        assert_eq!(SortKey::parse("random"), None);
    }

    #[test]
    fn test_global_selection_covers_every_marketplace() {
        assert_eq!(MarketSelection::Global.marketplaces().len(), EbayMarketplace::ALL.len());
        assert_eq!(
            EbayMarketplace::from_country_code("UK"),
            Some(EbayMarketplace::Gb)
        );
    }

    #[test]
    fn test_response_omits_degraded_flag_when_false() {
        let resp = SearchResponse {
            success: true,
            items: vec![],
            total_results: 0,
            total_pages: 0,
            current_page: 1,
            message: None,
            degraded: false,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("degraded").is_none());
        assert_eq!(json["totalResults"], 0);
        assert_eq!(json["currentPage"], 1);
    }
}
