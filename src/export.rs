use rust_xlsxwriter::{Format, Workbook};

use crate::data_models::{ListingItem, Marketplace};
use crate::error::Result;

pub const HEADERS: [&str; 8] = [
    "Title",
    "Price",
    "Currency",
    "Condition",
    "Seller",
    "Source",
    "Link",
    "Image",
];

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub title: String,
    pub price: f64,
    pub currency: String,
    pub condition: String,
    pub seller: String,
    pub source: &'static str,
    pub link: String,
    pub image: String,
}

impl From<&ListingItem> for ExportRow {
    fn from(item: &ListingItem) -> Self {
        ExportRow {
            title: item.title.clone(),
            price: item.price.value,
            currency: item.price.currency.clone(),
            condition: item.condition.clone(),
            seller: item.seller.clone().unwrap_or_default(),
            source: match item.source {
                Marketplace::Ebay => "eBay",
                Marketplace::Vinted => "Vinted",
            },
            link: item.item_url.clone(),
            image: item.image_url.clone(),
        }
    }
}

pub fn to_rows(items: &[ListingItem]) -> Vec<ExportRow> {
    items.iter().map(ExportRow::from).collect()
}

/// Renders rows into an in-memory xlsx workbook with a bold header row.
pub fn write_workbook(rows: &[ExportRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Listings")?;

    let bold = Format::new().set_bold();
    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = (idx + 1) as u32;
        worksheet.write_string(r, 0, &row.title)?;
        worksheet.write_number(r, 1, row.price)?;
        worksheet.write_string(r, 2, &row.currency)?;
        worksheet.write_string(r, 3, &row.condition)?;
        worksheet.write_string(r, 4, &row.seller)?;
        worksheet.write_string(r, 5, row.source)?;
        worksheet.write_string(r, 6, &row.link)?;
        worksheet.write_string(r, 7, &row.image)?;
    }
    worksheet.set_column_width(0, 50)?;
    worksheet.set_column_width(6, 40)?;

    let buffer = workbook.save_to_buffer()?;
    tracing::info!(rows = rows.len(), bytes = buffer.len(), "export workbook written");
    Ok(buffer)
}

pub fn export_filename() -> String {
    format!("listings_{}.xlsx", chrono::Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_models::Price;

    #[test]
    fn test_rows_follow_items() {
        let mut ebay = ListingItem::new(
            "1".into(),
            "Speedy 30".into(),
            Price::new(420.0, "EUR"),
            Marketplace::Ebay,
        );
        ebay.seller = Some("lux_store".into());
        let vinted = ListingItem::new(
            "2".into(),
            "Pochette".into(),
            Price::new(35.5, "EUR"),
            Marketplace::Vinted,
        );

        let rows = to_rows(&[ebay, vinted]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].seller, "lux_store");
        assert_eq!(rows[0].source, "eBay");
        assert_eq!(rows[1].seller, "");
        assert_eq!(rows[1].source, "Vinted");
        assert_eq!(rows[1].price, 35.5);
    }

    #[test]
    fn test_workbook_is_a_zip_container() {
        let rows = to_rows(&[ListingItem::new(
            "1".into(),
            "Kelly".into(),
            Price::new(9000.0, "EUR"),
            Marketplace::Ebay,
        )]);
        let bytes = write_workbook(&rows).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_filename_shape() {
        let name = export_filename();
        assert!(name.starts_with("listings_"));
        assert!(name.ends_with(".xlsx"));
    }
}
