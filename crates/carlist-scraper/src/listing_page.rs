//! Parsing of a listing results page into validated records.
//!
//! The site has shipped several card layouts, so card discovery tries a list
//! of selectors and keeps the first one that matches anything.

use std::sync::LazyLock;

use carlist_core::{ListingFields, ListingRecord, Transmission, ValidationError};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::error::FieldError;
use crate::extract::{
    extract_acceleration, extract_color, extract_condition_score, extract_displacement,
    extract_fuel_consumption, extract_mileage, extract_price, extract_top_speed,
    extract_transmission, extract_year, infer_body_type, infer_fuel_type, parse_title,
};

/// Value written to the `source` attribute of every record.
pub const SOURCE_NAME: &str = "车168";

const TITLE_ATTR: &str = "carname";

fn selectors(list: &[&str]) -> Vec<Selector> {
    list.iter()
        .map(|s| Selector::parse(s).expect("valid selector"))
        .collect()
}

static CARD_SELECTORS: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&["li.cards-li", ".list-item", ".car-item", ".item-info"]));

static TITLE_SELECTORS: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&["[carname]", "h4", ".card-name", ".car-name", ".title"]));

/// Why a card did not produce a record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CardError {
    #[error("card has no title")]
    MissingTitle,

    #[error("card has no {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Outcome of parsing one results page.
#[derive(Debug, Default)]
pub struct PageParse {
    /// Number of card elements found, valid or not.
    pub cards_found: usize,
    pub records: Vec<ListingRecord>,
    pub rejected: usize,
}

/// Parses every card on a results page collected under `locale`.
#[must_use]
pub fn parse_listing_page(html: &str, locale: &str, reference_year: i32) -> PageParse {
    let document = Html::parse_document(html);

    let cards: Vec<ElementRef<'_>> = CARD_SELECTORS
        .iter()
        .map(|sel| document.select(sel).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default();

    let mut page = PageParse {
        cards_found: cards.len(),
        ..PageParse::default()
    };

    for card in cards {
        let Some(title) = card_title(card) else {
            tracing::debug!(locale, "card rejected: no title");
            page.rejected += 1;
            continue;
        };
        let text = flatten_text(card);
        match build_record(&title, &text, locale, reference_year) {
            Ok(record) => page.records.push(record),
            Err(e) => {
                tracing::debug!(locale, title = %title, error = %e, "card rejected");
                page.rejected += 1;
            }
        }
    }

    page
}

/// Title from the card's own `carname` attribute, then from the first
/// descendant matching one of the title selectors.
fn card_title(card: ElementRef<'_>) -> Option<String> {
    if let Some(name) = non_blank(card.value().attr(TITLE_ATTR)) {
        return Some(name);
    }
    TITLE_SELECTORS.iter().find_map(|sel| {
        let elem = card.select(sel).next()?;
        non_blank(elem.value().attr(TITLE_ATTR)).or_else(|| non_blank(Some(&flatten_text(elem))))
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Concatenates the trimmed text nodes of an element with no separator.
fn flatten_text(elem: ElementRef<'_>) -> String {
    elem.text().map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Builds a validated record from a card's title and flattened text.
///
/// Price, year and mileage are required. A malformed optional field is
/// dropped rather than rejecting the card.
///
/// # Errors
///
/// Returns [`CardError`] when a required field is missing or malformed, or
/// when the record fails validation.
pub fn build_record(
    title: &str,
    text: &str,
    locale: &str,
    reference_year: i32,
) -> Result<ListingRecord, CardError> {
    if title.trim().is_empty() {
        return Err(CardError::MissingTitle);
    }

    let price = extract_price(text)?.ok_or(CardError::MissingField("price"))?;
    let year = extract_year(text)?.ok_or(CardError::MissingField("year"))?;
    let mileage_km = extract_mileage(text)?.ok_or(CardError::MissingField("mileage"))?;

    let (brand, model) = parse_title(title);
    let fuel_type = infer_fuel_type(&brand, &model);
    let body_type = infer_body_type(&model);

    let fields = ListingFields {
        fuel_type,
        body_type,
        transmission: extract_transmission(text).unwrap_or(Transmission::Automatic),
        price,
        year,
        mileage_km,
        source: SOURCE_NAME.to_owned(),
        locale: locale.to_owned(),
        displacement_l: optional(extract_displacement(text)),
        color: extract_color(text).map(str::to_owned),
        condition_score: optional(extract_condition_score(text)),
        fuel_consumption: optional(extract_fuel_consumption(text)),
        top_speed_kmh: optional(extract_top_speed(text)),
        acceleration_s: optional(extract_acceleration(text)),
        brand,
        model,
    };

    Ok(ListingRecord::from_fields(fields, reference_year)?)
}

fn optional<T>(result: Result<Option<T>, FieldError>) -> Option<T> {
    result.unwrap_or_else(|e| {
        tracing::debug!(error = %e, "dropping unusable optional field");
        None
    })
}

#[cfg(test)]
mod tests {
    use carlist_core::{BodyType, FuelType, PriceBracket};

    use super::*;

    const PAGE: &str = r#"
        <html><body><ul class="viewlist_ul">
          <li class="cards-li" carname="宝马X3 2019款 xDrive28i">
            <div class="card-name"><h4>宝马X3 2019款 xDrive28i</h4></div>
            <p class="cards-unit">3.5万公里／2019-06／北京</p>
            <div class="cards-price-box"><span class="pirce"><em>25.8</em>万</span></div>
            <span>2.0T 自动 白色</span>
          </li>
          <li class="cards-li">
            <h4>比亚迪 宋PLUS DM-i</h4>
            <p>1.2万公里 2022年</p>
            <span><em>13.5</em>万</span>
          </li>
          <li class="cards-li">
            <h4>奥迪A4L</h4>
            <p>8万公里 1998款</p>
            <span><em>6.5</em>万</span>
          </li>
          <li class="cards-li">
            <p>5万公里 2020款</p>
            <span><em>9.9</em>万</span>
          </li>
        </ul></body></html>
    "#;

    #[test]
    fn parses_valid_cards_and_counts_rejections() {
        let page = parse_listing_page(PAGE, "bj", 2024);
        assert_eq!(page.cards_found, 4);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.rejected, 2);
    }

    #[test]
    fn first_card_fields() {
        let page = parse_listing_page(PAGE, "bj", 2024);
        let r = &page.records[0];
        assert_eq!(r.brand, "宝马");
        assert_eq!(r.model, "宝马X3 2019款 xDrive28i");
        assert!((r.price - 25.8).abs() < f64::EPSILON);
        assert_eq!(r.year, 2019);
        assert_eq!(r.mileage_km, 35_000);
        assert_eq!(r.displacement_l, Some(2.0));
        assert_eq!(r.color.as_deref(), Some("白色"));
        assert_eq!(r.body_type, BodyType::Suv);
        assert_eq!(r.fuel_type, FuelType::Gasoline);
        assert_eq!(r.price_bracket, PriceBracket::From20To30);
        assert_eq!(r.age_years, 5);
        assert_eq!(r.locale, "bj");
        assert_eq!(r.source, SOURCE_NAME);
    }

    #[test]
    fn title_falls_back_to_heading_text() {
        let page = parse_listing_page(PAGE, "sh", 2024);
        let r = &page.records[1];
        assert_eq!(r.brand, "比亚迪");
        assert_eq!(r.fuel_type, FuelType::PlugInHybrid);
        assert_eq!(r.year, 2022);
    }

    #[test]
    fn alternate_card_selector_used_when_primary_absent() {
        let html = r#"<div><div class="car-item"><span class="title">丰田卡罗拉</span>
            <span>2020款 2万公里 ¥8.8万</span></div></div>"#;
        let page = parse_listing_page(html, "gz", 2024);
        assert_eq!(page.cards_found, 1);
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].brand, "丰田");
    }

    #[test]
    fn page_without_cards() {
        let page = parse_listing_page("<html><body><p>暂无车源</p></body></html>", "bj", 2024);
        assert_eq!(page.cards_found, 0);
        assert!(page.records.is_empty());
    }

    #[test]
    fn build_record_requires_price() {
        let err = build_record("宝马X3", "2019款 3.5万公里 自动 白色", "bj", 2024).unwrap_err();
        assert_eq!(err, CardError::MissingField("price"));
    }

    #[test]
    fn build_record_rejects_out_of_bounds_price() {
        let err = build_record("布加迪", "2020款 1万公里 2500万", "bj", 2024).unwrap_err();
        assert!(matches!(
            err,
            CardError::Invalid(ValidationError::PriceOutOfRange(_))
        ));
    }

    #[test]
    fn build_record_drops_malformed_optional_field() {
        let record =
            build_record("宝马X3", "2019款 3.5万公里 25万 车况:..分", "bj", 2024).unwrap();
        assert_eq!(record.condition_score, None);
    }

    #[test]
    fn build_record_defaults_transmission_to_automatic() {
        let record = build_record("大众帕萨特", "2018款 6万公里 12万", "bj", 2024).unwrap();
        assert_eq!(record.transmission, Transmission::Automatic);
    }
}
