//! CSV dataset export.
//!
//! The file starts with a UTF-8 BOM so spreadsheet tools on Chinese-locale
//! systems detect the encoding, and the header uses the Chinese column names
//! the downstream viewer expects.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use carlist_core::{dedup_records, locale_display_name, AppConfig, ListingRecord};
use carlist_scraper::CheckpointStore;
use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::ExportArgs;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "品牌")]
    brand: &'a str,
    #[serde(rename = "车型")]
    model: &'a str,
    #[serde(rename = "价格")]
    price: f64,
    #[serde(rename = "年份")]
    year: i32,
    #[serde(rename = "里程")]
    mileage_km: u32,
    #[serde(rename = "燃料类型")]
    fuel_type: &'static str,
    #[serde(rename = "变速器")]
    transmission: &'static str,
    #[serde(rename = "车辆类型")]
    body_type: &'static str,
    #[serde(rename = "数据来源")]
    source: &'a str,
    #[serde(rename = "所在城市")]
    city: &'a str,
    #[serde(rename = "排量")]
    displacement_l: Option<f64>,
    #[serde(rename = "颜色")]
    color: Option<&'a str>,
    #[serde(rename = "车况评分")]
    condition_score: Option<f64>,
    #[serde(rename = "油耗")]
    fuel_consumption: Option<f64>,
    #[serde(rename = "最高时速")]
    top_speed_kmh: Option<f64>,
    #[serde(rename = "加速时间")]
    acceleration_s: Option<f64>,
    #[serde(rename = "车龄")]
    age_years: i32,
    #[serde(rename = "价格区间")]
    price_bracket: &'static str,
    #[serde(rename = "里程区间")]
    mileage_bracket: &'static str,
}

impl<'a> From<&'a ListingRecord> for CsvRow<'a> {
    fn from(r: &'a ListingRecord) -> Self {
        Self {
            brand: &r.brand,
            model: &r.model,
            price: r.price,
            year: r.year,
            mileage_km: r.mileage_km,
            fuel_type: r.fuel_type.label(),
            transmission: r.transmission.label(),
            body_type: r.body_type.label(),
            source: &r.source,
            city: locale_display_name(&r.locale),
            displacement_l: r.displacement_l,
            color: r.color.as_deref(),
            condition_score: r.condition_score,
            fuel_consumption: r.fuel_consumption,
            top_speed_kmh: r.top_speed_kmh,
            acceleration_s: r.acceleration_s,
            age_years: r.age_years,
            price_bracket: r.price_bracket.label(),
            mileage_bracket: r.mileage_bracket.label(),
        }
    }
}

/// `car_data_YYYYMMDD_HHMMSS.csv`
pub(crate) fn default_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("car_data_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Writes `records` as BOM-prefixed CSV. An empty slice still produces the
/// header row.
pub(crate) fn write_csv<W: Write>(mut writer: W, records: &[ListingRecord]) -> anyhow::Result<()> {
    writer.write_all(UTF8_BOM)?;
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(HEADERS)?;
    for record in records {
        csv.serialize(CsvRow::from(record))?;
    }
    csv.flush()?;
    Ok(())
}

/// Column names in output order. Kept in step with [`CsvRow`].
const HEADERS: [&str; 19] = [
    "品牌", "车型", "价格", "年份", "里程", "燃料类型", "变速器", "车辆类型", "数据来源", "所在城市",
    "排量", "颜色", "车况评分", "油耗", "最高时速", "加速时间", "车龄", "价格区间", "里程区间",
];

/// Writes the dataset to `output`, or to a timestamped file in
/// `output_dir`, optionally deduplicated first. Returns the path written.
pub(crate) fn export_records(
    records: Vec<ListingRecord>,
    dedup: bool,
    output: Option<&Path>,
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let records = if dedup {
        let before = records.len();
        let deduped = dedup_records(records);
        tracing::info!(before, after = deduped.len(), "removed duplicate listings");
        deduped
    } else {
        records
    };

    let path = output.map_or_else(
        || output_dir.join(default_file_name(&chrono::Local::now())),
        Path::to_path_buf,
    );
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }

    let file = std::fs::File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(std::io::BufWriter::new(file), &records)
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), records = records.len(), "dataset exported");
    Ok(path)
}

/// `export` command: write the CSV from the saved checkpoint.
pub(crate) fn run_export(config: &AppConfig, args: &ExportArgs) -> anyhow::Result<()> {
    let state = CheckpointStore::new(&config.checkpoint_path).load();
    if state.records.is_empty() {
        tracing::warn!(
            path = %config.checkpoint_path.display(),
            "checkpoint holds no records; nothing to export"
        );
        return Ok(());
    }
    let path = export_records(
        state.records,
        args.dedup,
        args.output.as_deref(),
        &config.output_dir,
    )?;
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use carlist_scraper::parse_listing_page;

    fn records() -> Vec<ListingRecord> {
        let html = r#"<ul>
            <li class="cards-li" carname="宝马X3 2019款"><p>2019款 3.5万公里 25.8万 2.0T 白色</p></li>
            <li class="cards-li" carname="大众帕萨特"><p>2018款 6万公里 12万</p></li>
            <li class="cards-li" carname="大众帕萨特"><p>2018款 6万公里 12万</p></li>
        </ul>"#;
        parse_listing_page(html, "bj", 2024).records
    }

    fn output_text(records: &[ListingRecord]) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, records).unwrap();
        assert!(buf.starts_with(UTF8_BOM));
        String::from_utf8(buf[UTF8_BOM.len()..].to_vec()).unwrap()
    }

    #[test]
    fn default_file_name_uses_timestamp() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
            .and_utc();
        assert_eq!(default_file_name(&ts), "car_data_20240309_140507.csv");
        assert!(default_file_name(&Utc::now()).starts_with("car_data_"));
    }

    #[test]
    fn header_row_in_chinese() {
        let text = output_text(&[]);
        assert_eq!(
            text.trim_end(),
            "品牌,车型,价格,年份,里程,燃料类型,变速器,车辆类型,数据来源,所在城市,排量,颜色,车况评分,油耗,最高时速,加速时间,车龄,价格区间,里程区间"
        );
    }

    #[test]
    fn row_uses_labels_and_city_name() {
        let text = output_text(&records()[..1]);
        let row = text.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "宝马,宝马X3 2019款,25.8,2019,35000,汽油,自动,SUV,车168,北京,2.0,白色,,,,,5,20-30万,3-5万公里"
        );
    }

    #[test]
    fn export_records_dedups_when_asked() {
        let dir = std::env::temp_dir().join(format!("carlist-export-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let out = dir.join("out").join("data.csv");

        let path = export_records(records(), true, Some(&out), &dir).unwrap();
        assert_eq!(path, out);
        let bytes = std::fs::read(&out).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text.lines().count(), 3);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn export_records_default_name_in_output_dir() {
        let dir = std::env::temp_dir().join(format!("carlist-export-default-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let path = export_records(records(), false, None, &dir).unwrap();
        assert_eq!(path.parent(), Some(dir.as_path()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("car_data_") && name.ends_with(".csv"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
