//! Summary image: country total, last refresh time and the top countries by estimated GDP,
//! drawn onto a fixed 800x600 canvas and cached as PNG.

mod font;

use std::io::Cursor;
use std::path::PathBuf;

use chrono::SecondsFormat;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::store::SummarySnapshot;
use crate::{CountryError, CountryResult};

const IMAGE_WIDTH: u32 = 800;
const IMAGE_HEIGHT: u32 = 600;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);
const TITLE_SCALE: u32 = 4;
const TEXT_SCALE: u32 = 2;

/// Renders [`SummarySnapshot`]s and owns the cached image path.
#[derive(Clone, Debug)]
pub struct SummaryRenderer {
    output_path: PathBuf,
}

impl SummaryRenderer {
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }

    /// Draw the summary onto a fresh canvas.
    pub fn render(&self, snapshot: &SummarySnapshot) -> RgbImage {
        let mut img = RgbImage::from_pixel(IMAGE_WIDTH, IMAGE_HEIGHT, BACKGROUND);

        let last_refresh = snapshot
            .last_refreshed_at
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| "N/A".to_string());

        font::draw_text(&mut img, 20, 20, "Country Summary", TITLE_SCALE, INK);
        font::draw_text(
            &mut img,
            20,
            80,
            &format!("Total Countries: {}", snapshot.total),
            TEXT_SCALE,
            INK,
        );
        font::draw_text(
            &mut img,
            20,
            120,
            &format!("Last Refreshed: {}", last_refresh),
            TEXT_SCALE,
            INK,
        );
        font::draw_text(&mut img, 20, 170, "Top 5 by Estimated GDP:", TEXT_SCALE, INK);

        let mut y = 200;
        for (rank, country) in snapshot.top_by_gdp.iter().enumerate() {
            let line = format!(
                "{}. {} - {}",
                rank + 1,
                country.name,
                format_thousands(country.estimated_gdp.unwrap_or(0.0))
            );
            font::draw_text(&mut img, 40, y, &line, TEXT_SCALE, INK);
            y += 30;
        }

        img
    }

    /// Render and write the PNG to the cache path, replacing any previous image.
    pub fn render_to_cache(&self, snapshot: &SummarySnapshot) -> CountryResult<PathBuf> {
        let png = encode_png(self.render(snapshot))?;

        if let Some(parent) = self.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CountryError::CacheWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        // Write beside the target and rename so readers never see a partial file.
        let staging = self.output_path.with_extension("png.tmp");
        std::fs::write(&staging, &png).map_err(|source| CountryError::CacheWrite {
            path: staging.clone(),
            source,
        })?;
        std::fs::rename(&staging, &self.output_path).map_err(|source| {
            CountryError::CacheWrite {
                path: self.output_path.clone(),
                source,
            }
        })?;

        tracing::info!("summary image written to {}", self.output_path.display());
        Ok(self.output_path.clone())
    }

    /// Bytes of the cached image, or `None` if none has been generated.
    pub fn read_cached(&self) -> CountryResult<Option<Vec<u8>>> {
        match std::fs::read(&self.output_path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CountryError::CacheRead {
                path: self.output_path.clone(),
                source,
            }),
        }
    }
}

fn encode_png(img: RgbImage) -> CountryResult<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// `1234567.891` → `"1,234,567.89"`.
pub fn format_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let digits = int_part.as_bytes();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*d as char);
    }

    format!("{}{}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::Country;
    use chrono::{TimeZone, Utc};

    fn country(id: i64, name: &str, gdp: f64) -> Country {
        Country {
            id,
            name: name.to_string(),
            capital: None,
            region: None,
            population: 1,
            currency_code: None,
            exchange_rate: None,
            estimated_gdp: Some(gdp),
            flag_url: None,
            last_refreshed_at: Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 0).unwrap(),
        }
    }

    fn snapshot() -> SummarySnapshot {
        SummarySnapshot {
            total: 250,
            last_refreshed_at: Some(Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 0).unwrap()),
            top_by_gdp: vec![
                country(1, "United States", 25_000_000_000.0),
                country(2, "Côte d'Ivoire", 1_234_567.891),
            ],
        }
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0.00");
        assert_eq!(format_thousands(999.999), "1,000.00");
        assert_eq!(format_thousands(1_234_567.891), "1,234,567.89");
        assert_eq!(format_thousands(-1234.5), "-1,234.50");
        assert_eq!(format_thousands(100_000.0), "100,000.00");
    }

    #[test]
    fn test_render_has_fixed_size_and_ink() {
        let renderer = SummaryRenderer::new(PathBuf::from("unused.png"));
        let img = renderer.render(&snapshot());

        assert_eq!(img.dimensions(), (IMAGE_WIDTH, IMAGE_HEIGHT));
        assert!(img.pixels().any(|p| *p == INK));
    }

    #[test]
    fn test_render_empty_snapshot() {
        let renderer = SummaryRenderer::new(PathBuf::from("unused.png"));
        let img = renderer.render(&SummarySnapshot {
            total: 0,
            last_refreshed_at: None,
            top_by_gdp: vec![],
        });
        // Nothing is drawn in the ranked-list area.
        for y in 200..IMAGE_HEIGHT {
            for x in 0..IMAGE_WIDTH {
                assert_eq!(*img.get_pixel(x, y), BACKGROUND);
            }
        }
    }

    #[test]
    fn test_render_to_cache_writes_decodable_png() {
        let tmp = tempfile::tempdir().unwrap();
        let renderer = SummaryRenderer::new(tmp.path().join("cache/summary.png"));

        assert_eq!(renderer.read_cached().unwrap(), None);

        let path = renderer.render_to_cache(&snapshot()).unwrap();
        assert!(path.exists());
        assert!(!tmp.path().join("cache/summary.png.tmp").exists());

        let bytes = renderer.read_cached().unwrap().unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert_eq!(decoded.width(), IMAGE_WIDTH);
        assert_eq!(decoded.height(), IMAGE_HEIGHT);
    }

    #[test]
    fn test_render_to_cache_fails_when_cache_dir_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("cache");
        std::fs::write(&blocker, b"not a dir").unwrap();
        let renderer = SummaryRenderer::new(blocker.join("summary.png"));

        let err = renderer.render_to_cache(&snapshot()).unwrap_err();
        assert!(matches!(err, CountryError::CacheWrite { .. }));
    }
}
