//! Field extraction from the flattened text of a listing card.
//!
//! Numeric extractors return `Result<Option<T>, FieldError>`:
//! `Ok(None)` when no pattern matches, `Err` when a pattern matched but the
//! captured value is not a usable number. When several patterns apply, the
//! first usable value wins and an earlier malformed match is only reported if
//! nothing later succeeds.

use std::sync::LazyLock;

use carlist_core::{BodyType, FuelType, Transmission, MAX_YEAR, MIN_YEAR};
use regex::Regex;

use crate::error::FieldError;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static PRICE_LABELLED: LazyLock<Regex> = LazyLock::new(|| compile(r"售价[：:]?([0-9.]+)万"));
static PRICE_YEN: LazyLock<Regex> = LazyLock::new(|| compile(r"¥([0-9.]+)万"));
static PRICE_BARE: LazyLock<Regex> = LazyLock::new(|| compile(r"([0-9.]+)万"));

static YEAR_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        compile(r"([0-9]{4})款"),
        compile(r"([0-9]{4})年"),
        compile(r"([0-9]{4})-"),
    ]
});

static MILEAGE_WAN_KM: LazyLock<Regex> = LazyLock::new(|| compile(r"([0-9.]+)万公里"));
static MILEAGE_KM: LazyLock<Regex> = LazyLock::new(|| compile(r"([0-9.]+)公里"));

static DISPLACEMENT: LazyLock<Regex> = LazyLock::new(|| compile(r"([0-9.]+)[LT]"));

static CONDITION_SCORE: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        compile(r"车况[：:]?([0-9.]+)分"),
        compile(r"评分[：:]?([0-9.]+)"),
    ]
});

static FUEL_CONSUMPTION: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        compile(r"油耗[：:]?([0-9.]+)L"),
        compile(r"([0-9.]+)L/100km"),
    ]
});

static TOP_SPEED: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        compile(r"最高时速[：:]?([0-9.]+)"),
        compile(r"([0-9.]+)km/h"),
    ]
});

static ACCELERATION: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        compile(r"加速[：:]?([0-9.]+)秒"),
        compile(r"0-100km/h[：:]?([0-9.]+)s"),
    ]
});

const MIN_DISPLACEMENT_L: f64 = 0.5;
const MAX_DISPLACEMENT_L: f64 = 8.0;

const COLORS: &[&str] = &[
    "白色", "黑色", "银色", "灰色", "红色", "蓝色", "金色", "棕色", "绿色", "黄色", "橙色", "紫色",
];

/// Brands recognised in listing titles, matched as substrings in this order.
const BRANDS: &[&str] = &[
    "奥迪", "宝马", "奔驰", "大众", "丰田", "本田", "日产", "马自达", "现代", "起亚", "福特",
    "雪佛兰", "别克", "凯迪拉克", "沃尔沃", "捷豹", "路虎", "保时捷", "特斯拉", "比亚迪", "吉利",
    "长城", "奇瑞", "长安", "荣威", "名爵", "传祺", "红旗", "领克", "蔚来", "小鹏", "理想", "威马",
    "零跑", "哪吒", "极氪", "岚图", "高合", "智己", "雷克萨斯", "英菲尼迪", "讴歌", "林肯",
    "克莱斯勒", "Jeep", "道奇", "菲亚特", "阿尔法罗密欧", "玛莎拉蒂", "法拉利", "兰博基尼", "宾利",
    "劳斯莱斯", "阿斯顿马丁", "迈凯伦", "布加迪", "帕加尼", "柯尼塞格", "五菱", "宝骏", "东风",
    "一汽", "北汽", "江淮", "海马", "众泰", "力帆", "观致", "启辰", "思铭", "理念",
];

const UNKNOWN_BRAND: &str = "未知品牌";

/// Brands that only sell battery-electric or range-extended vehicles.
const ELECTRIC_BRANDS: &[&str] = &["特斯拉", "蔚来", "小鹏", "理想", "威马", "零跑", "哪吒"];

const MPV_KEYWORDS: &[&str] = &["MPV", "GL8", "ODYSSEY", "SIENNA", "ALPHARD", "ELYSION"];
const SUV_KEYWORDS: &[&str] = &["SUV", "GLE", "GL", "RX", "NX", "CX", "CR", "RAV", "XC", "QX"];
/// Single-letter SUV series prefixes, only counted when followed by a digit (X5, Q7).
const SUV_SERIES_LETTERS: &[char] = &['X', 'Q'];

fn parse_number(raw: &str, field: &'static str) -> Result<f64, FieldError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FieldError::Malformed {
            field,
            raw: raw.to_owned(),
        })
}

/// Tries `patterns` in order and returns the first capture that parses.
fn first_number(
    patterns: &[&Regex],
    text: &str,
    field: &'static str,
) -> Result<Option<f64>, FieldError> {
    let mut first_err = None;
    for re in patterns {
        if let Some(caps) = re.captures(text) {
            match parse_number(&caps[1], field) {
                Ok(v) => return Ok(Some(v)),
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
    }
    first_err.map_or(Ok(None), Err)
}

/// Extracts the asking price in 万元.
///
/// Labelled prices (`售价`, `¥`) take precedence over a bare `N万`. A bare
/// match immediately followed by `公里` is a mileage and is skipped.
pub fn extract_price(text: &str) -> Result<Option<f64>, FieldError> {
    let mut first_err = None;
    for re in [&*PRICE_LABELLED, &*PRICE_YEN] {
        if let Some(caps) = re.captures(text) {
            match parse_number(&caps[1], "price") {
                Ok(v) => return Ok(Some(v)),
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
    }
    for caps in PRICE_BARE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if text[whole.end()..].starts_with("公里") {
            continue;
        }
        match parse_number(&caps[1], "price") {
            Ok(v) => return Ok(Some(v)),
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }
    first_err.map_or(Ok(None), Err)
}

/// Extracts the model year from `2019款`, `2019年` or `2019-05` forms.
///
/// Four-digit matches outside the accepted year range are skipped; if every
/// match is out of range the first one is reported.
pub fn extract_year(text: &str) -> Result<Option<i32>, FieldError> {
    let mut first_err = None;
    for re in YEAR_PATTERNS.iter() {
        for caps in re.captures_iter(text) {
            let Ok(year) = caps[1].parse::<i32>() else {
                continue;
            };
            if (MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Ok(Some(year));
            }
            first_err.get_or_insert(FieldError::OutOfRange {
                field: "year",
                value: f64::from(year),
            });
        }
    }
    first_err.map_or(Ok(None), Err)
}

/// Extracts mileage in kilometres from `3.5万公里` or `800公里`.
pub fn extract_mileage(text: &str) -> Result<Option<i64>, FieldError> {
    if let Some(caps) = MILEAGE_WAN_KM.captures(text) {
        let wan = parse_number(&caps[1], "mileage")?;
        return Ok(Some(km_to_i64(wan * 10_000.0)));
    }
    if let Some(caps) = MILEAGE_KM.captures(text) {
        let km = parse_number(&caps[1], "mileage")?;
        return Ok(Some(km_to_i64(km)));
    }
    Ok(None)
}

#[allow(clippy::cast_possible_truncation)]
fn km_to_i64(km: f64) -> i64 {
    km.round() as i64
}

/// Extracts engine displacement in litres (`2.0T`, `1.5L`).
///
/// Matches outside 0.5–8.0 L are skipped in favour of a later match.
pub fn extract_displacement(text: &str) -> Result<Option<f64>, FieldError> {
    let mut first_err = None;
    for caps in DISPLACEMENT.captures_iter(text) {
        match parse_number(&caps[1], "displacement") {
            Ok(v) if (MIN_DISPLACEMENT_L..=MAX_DISPLACEMENT_L).contains(&v) => {
                return Ok(Some(v));
            }
            Ok(v) => {
                first_err.get_or_insert(FieldError::OutOfRange {
                    field: "displacement",
                    value: v,
                });
            }
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }
    first_err.map_or(Ok(None), Err)
}

/// Detects the gearbox from keywords. The generic automatic marker wins over
/// a gearbox name listed next to it, then manual, then CVT, then dual clutch.
#[must_use]
pub fn extract_transmission(text: &str) -> Option<Transmission> {
    if text.contains("自动") || text.contains("AT") {
        Some(Transmission::Automatic)
    } else if text.contains("手动") || text.contains("MT") {
        Some(Transmission::Manual)
    } else if text.contains("CVT") {
        Some(Transmission::Cvt)
    } else if text.contains("双离合") || text.contains("DCT") {
        Some(Transmission::DualClutch)
    } else {
        None
    }
}

#[must_use]
pub fn extract_color(text: &str) -> Option<&'static str> {
    COLORS.iter().copied().find(|c| text.contains(c))
}

pub fn extract_condition_score(text: &str) -> Result<Option<f64>, FieldError> {
    let [a, b] = &*CONDITION_SCORE;
    first_number(&[a, b], text, "condition_score")
}

/// Fuel consumption in L/100km.
pub fn extract_fuel_consumption(text: &str) -> Result<Option<f64>, FieldError> {
    let [a, b] = &*FUEL_CONSUMPTION;
    first_number(&[a, b], text, "fuel_consumption")
}

/// Top speed in km/h.
pub fn extract_top_speed(text: &str) -> Result<Option<f64>, FieldError> {
    let [a, b] = &*TOP_SPEED;
    first_number(&[a, b], text, "top_speed")
}

/// 0-100 km/h acceleration time in seconds.
pub fn extract_acceleration(text: &str) -> Result<Option<f64>, FieldError> {
    let [a, b] = &*ACCELERATION;
    first_number(&[a, b], text, "acceleration")
}

/// Splits a listing title into `(brand, model)`.
///
/// The model is the full title. The brand is the first known brand found in
/// the title, else the first whitespace-separated token.
#[must_use]
pub fn parse_title(title: &str) -> (String, String) {
    let title = title.trim();
    let brand = BRANDS
        .iter()
        .copied()
        .find(|b| title.contains(b))
        .or_else(|| title.split_whitespace().next())
        .unwrap_or(UNKNOWN_BRAND);
    (brand.to_owned(), title.to_owned())
}

/// Infers the energy type from brand and model keywords.
#[must_use]
pub fn infer_fuel_type(brand: &str, model: &str) -> FuelType {
    if ELECTRIC_BRANDS.contains(&brand) {
        FuelType::Electric
    } else if model.contains("PHEV") || model.contains("DM") || model.contains("插电") {
        FuelType::PlugInHybrid
    } else if model.contains("HEV") || model.contains("混动") {
        FuelType::Hybrid
    } else if model.contains("EV") || model.contains('电') {
        FuelType::Electric
    } else {
        FuelType::Gasoline
    }
}

/// Infers the body style from model keywords.
#[must_use]
pub fn infer_body_type(model: &str) -> BodyType {
    let upper = model.to_uppercase();
    if MPV_KEYWORDS.iter().any(|k| upper.contains(k)) {
        return BodyType::Mpv;
    }
    if SUV_KEYWORDS.iter().any(|k| upper.contains(k)) || has_suv_series(&upper) {
        return BodyType::Suv;
    }
    BodyType::Sedan
}

fn has_suv_series(upper: &str) -> bool {
    let chars: Vec<char> = upper.chars().collect();
    chars
        .windows(2)
        .any(|w| SUV_SERIES_LETTERS.contains(&w[0]) && w[1].is_ascii_digit())
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
