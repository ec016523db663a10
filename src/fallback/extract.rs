use std::sync::OnceLock;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::data_models::{ListingItem, Marketplace, Price, UNKNOWN_CONDITION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Grid-item containers as rendered by the catalog page.
    Primary,
    /// Every item link is treated as its own container.
    Alternate,
}

#[derive(Clone, Copy)]
enum Source {
    Text,
    Attr(&'static str),
}

type Probe = (&'static str, Source);

const PRIMARY_CONTAINERS: &[&str] = &[
    "div[data-testid='grid-item']",
    "div.feed-grid__item",
    "div.new-item-box__container",
    "div[class*='ItemBox']",
];

const ALTERNATE_CONTAINERS: &[&str] = &["a[href*='/items/']"];

const TITLE_PROBES: &[Probe] = &[
    ("[data-testid$='--description-title']", Source::Text),
    (".new-item-box__title", Source::Text),
    ("[data-testid$='--title']", Source::Text),
    ("h2", Source::Text),
    ("img[alt]", Source::Attr("alt")),
];

const PRICE_PROBES: &[Probe] = &[
    ("[data-testid$='--price-text']", Source::Text),
    (".new-item-box__price", Source::Text),
    ("[class*='price']", Source::Text),
    ("[class*='Price']", Source::Text),
];

const IMAGE_PROBES: &[Probe] = &[
    ("img[src]", Source::Attr("src")),
    ("img[data-src]", Source::Attr("data-src")),
];

const LINK_PROBES: &[Probe] = &[
    ("a[href*='/items/']", Source::Attr("href")),
    ("a[href]", Source::Attr("href")),
];

struct CompiledProbes {
    primary: Vec<Selector>,
    alternate: Vec<Selector>,
    title: Vec<(Selector, Source)>,
    price: Vec<(Selector, Source)>,
    image: Vec<(Selector, Source)>,
    link: Vec<(Selector, Source)>,
}

static PROBES: OnceLock<CompiledProbes> = OnceLock::new();

fn compile(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
}

fn compile_probes(probes: &[Probe]) -> Vec<(Selector, Source)> {
    probes
        .iter()
        .filter_map(|(s, src)| Selector::parse(s).ok().map(|sel| (sel, *src)))
        .collect()
}

fn probes() -> &'static CompiledProbes {
    PROBES.get_or_init(|| CompiledProbes {
        primary: compile(PRIMARY_CONTAINERS),
        alternate: compile(ALTERNATE_CONTAINERS),
        title: compile_probes(TITLE_PROBES),
        price: compile_probes(PRICE_PROBES),
        image: compile_probes(IMAGE_PROBES),
        link: compile_probes(LINK_PROBES),
    })
}

fn clean_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First non-empty match across the ordered probes.
fn first_match(element: ElementRef<'_>, probes: &[(Selector, Source)]) -> Option<String> {
    probes.iter().find_map(|(selector, source)| {
        element.select(selector).find_map(|found| {
            let value = match source {
                Source::Text => clean_text(found),
                Source::Attr(name) => found.value().attr(name).unwrap_or_default().trim().to_string(),
            };
            (!value.is_empty()).then_some(value)
        })
    })
}

fn own_attr(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Pulls listings out of a rendered catalog page. Items with no title, price, image or link are dropped.
pub fn extract_listings(html: &str, base_url: &Url, strategy: Strategy) -> Vec<ListingItem> {
    let document = Html::parse_document(html);
    let probes = probes();
    let containers = match strategy {
        Strategy::Primary => &probes.primary,
        Strategy::Alternate => &probes.alternate,
    };

    let mut items = Vec::new();
    for container_selector in containers {
        for (index, element) in document.select(container_selector).enumerate() {
            let link = own_attr(element, "href").or_else(|| first_match(element, &probes.link));
            let title = first_match(element, &probes.title).or_else(|| own_attr(element, "title"));
            let price_text = first_match(element, &probes.price);
            let image = first_match(element, &probes.image);

            if link.is_none() && title.is_none() && price_text.is_none() && image.is_none() {
                continue;
            }

            let item_url = link
                .as_deref()
                .and_then(|href| base_url.join(href).ok())
                .map(|u| u.to_string())
                .unwrap_or_default();
            let price = price_text
                .as_deref()
                .and_then(parse_price)
                .unwrap_or_else(|| Price::new(0.0, "EUR"));

            items.push(ListingItem {
                id: item_id(&item_url).unwrap_or_else(|| format!("scraped-{index}")),
                title: title.unwrap_or_default(),
                price,
                condition: UNKNOWN_CONDITION.to_string(),
                seller: None,
                image_url: image.unwrap_or_default(),
                item_url,
                source: Marketplace::Vinted,
            });
        }

        // first container selector that yields anything wins
        if !items.is_empty() {
            break;
        }
    }
    items
}

/// `https://www.vinted.fr/items/4242-sac-dior` -> `4242`, otherwise the full URL.
fn item_id(item_url: &str) -> Option<String> {
    if item_url.is_empty() {
        return None;
    }
    let numeric = item_url
        .split("/items/")
        .nth(1)
        .map(|rest| rest.chars().take_while(char::is_ascii_digit).collect::<String>())
        .filter(|id| !id.is_empty());
    Some(numeric.unwrap_or_else(|| item_url.to_string()))
}

fn detect_currency(text: &str) -> &'static str {
    if text.contains('£') || text.contains("GBP") {
        "GBP"
    } else if text.contains('$') || text.contains("USD") {
        "USD"
    } else if text.contains("zł") || text.contains("PLN") {
        "PLN"
    } else {
        "EUR"
    }
}

/// Parses localized price text such as `12,50 €`, `1.299,00 €` or `£1,299.00`.
pub fn parse_price(text: &str) -> Option<Price> {
    let raw: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    let raw = raw.trim_matches(|c: char| c == ',' || c == '.');
    if raw.is_empty() {
        return None;
    }

    let normalized = match (raw.rfind(','), raw.rfind('.')) {
        // 1.299,00
        (Some(c), Some(d)) if c > d => raw.replace('.', "").replace(',', "."),
        // 1,299.00
        (Some(_), Some(_)) => raw.replace(',', ""),
        (Some(c), None) => {
            if raw.len() - c - 1 == 3 {
                raw.replace(',', "")
            } else {
                let (int, frac) = raw.split_at(c);
                format!("{}.{}", int.replace(',', ""), &frac[1..])
            }
        }
        (None, Some(d)) => {
            if raw.matches('.').count() > 1 || raw.len() - d - 1 == 3 {
                raw.replace('.', "")
            } else {
                raw.to_string()
            }
        }
        (None, None) => raw.to_string(),
    };

    normalized
        .parse::<f64>()
        .ok()
        .map(|value| Price::new(value, detect_currency(text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.vinted.fr/catalog?search_text=dior").unwrap()
    }

    const GRID_PAGE: &str = r#"
        <html><body>
          <div class="feed-grid">
            <div data-testid="grid-item">
              <a href="/items/4242-sac-lady-dior">
                <img src="https://images.vinted.net/1.jpg" alt="Sac Lady Dior noir">
              </a>
              <p data-testid="product-item-id-4242--price-text">1 250,00&nbsp;€</p>
              <p data-testid="product-item-id-4242--description-title">Dior</p>
            </div>
            <div data-testid="grid-item">
              <a href="https://www.vinted.fr/items/77-pochette">
                <img data-src="https://images.vinted.net/2.jpg">
              </a>
              <span class="new-item-box__price">45,50 €</span>
            </div>
            <div data-testid="grid-item"><span>ad slot</span></div>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_primary_extraction() {
        let items = extract_listings(GRID_PAGE, &base(), Strategy::Primary);
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].id, "4242");
        assert_eq!(items[0].title, "Dior");
        assert_eq!(items[0].price, Price::new(1250.0, "EUR"));
        assert_eq!(items[0].item_url, "https://www.vinted.fr/items/4242-sac-lady-dior");
        assert_eq!(items[0].image_url, "https://images.vinted.net/1.jpg");

        assert_eq!(items[1].id, "77");
        assert_eq!(items[1].title, "");
        assert_eq!(items[1].price.value, 45.5);
        assert_eq!(items[1].image_url, "https://images.vinted.net/2.jpg");
    }

    #[test]
    fn test_alternate_extraction_uses_links() {
        let html = r#"
            <html><body>
              <a href="/items/1-a" title="Sac Chanel"><img src="a.jpg"><span class="price">300 €</span></a>
              <a href="/items/2-b"><img src="b.jpg" alt="Sac Gucci"></a>
            </body></html>
        "#;
        assert!(extract_listings(html, &base(), Strategy::Primary).is_empty());

        let items = extract_listings(html, &base(), Strategy::Alternate);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Sac Chanel");
        assert_eq!(items[0].price.value, 300.0);
        assert_eq!(items[1].title, "Sac Gucci");
        assert_eq!(items[1].item_url, "https://www.vinted.fr/items/2-b");
    }

    #[test]
    fn test_parse_price_formats() {
        assert_eq!(parse_price("12,50 €"), Some(Price::new(12.5, "EUR")));
        assert_eq!(parse_price("1.299,00 €"), Some(Price::new(1299.0, "EUR")));
        assert_eq!(parse_price("£1,299.00"), Some(Price::new(1299.0, "GBP")));
        assert_eq!(parse_price("$45"), Some(Price::new(45.0, "USD")));
        assert_eq!(parse_price("1,299 €"), Some(Price::new(1299.0, "EUR")));
        assert_eq!(parse_price("19.99"), Some(Price::new(19.99, "EUR")));
        assert_eq!(parse_price("Prix sur demande"), None);
    }
}
