//! Named reference palette and nearest-color matching
//!
//! The palette is a flat CSV table of named colors, loaded once at startup
//! and shared read-only across requests. Matching is a linear scan by
//! Euclidean distance in RGB space with a first-seen tie-break.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Squared Euclidean distance to another color
    ///
    /// Monotonic in the true distance, so candidates order identically while
    /// the comparison stays in exact integer arithmetic.
    #[inline]
    pub fn distance_squared(&self, other: &Rgb) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

/// One named reference color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ColorEntry {
    /// Display name, e.g. "Air Force Blue"
    pub name: String,
    /// Reference RGB value
    pub rgb: Rgb,
}

/// Result of a nearest-color lookup
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchResult {
    /// Display name of the matched reference color
    pub name: String,
    /// Reference RGB of the matched entry
    pub matched: Rgb,
    /// The queried pixel
    pub query: Rgb,
    /// Euclidean RGB distance between query and match
    pub distance: f32,
}

/// Raw row of the reference table
///
/// Columns are positional with no header: (color, color_name, hex, R, G, B).
/// Matching only consumes the display name and the three channels.
#[derive(Debug, Deserialize)]
struct PaletteRow {
    _color: String,
    color_name: String,
    _hex: String,
    r: u8,
    g: u8,
    b: u8,
}

/// The fixed, ordered reference list of named colors
///
/// Entry order is preserved from the source table; ties during matching
/// resolve to the earlier entry, so order is part of the semantics.
#[derive(Debug)]
pub struct Palette {
    entries: Vec<ColorEntry>,
}

impl Palette {
    pub fn new(entries: Vec<ColorEntry>) -> Self {
        Self { entries }
    }

    /// Load the reference table from a headerless CSV file
    ///
    /// A row with missing, non-numeric, or out-of-range channel values fails
    /// the whole load so a corrupt table is caught at startup, not during
    /// matching.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_path(path.as_ref())?;
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, AppError> {
        let mut entries = Vec::new();
        for row in reader.deserialize::<PaletteRow>() {
            let row = row.map_err(|e| AppError::MalformedPaletteRow {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                reason: e.to_string(),
            })?;
            entries.push(ColorEntry {
                name: row.color_name,
                rgb: Rgb::new(row.r, row.g, row.b),
            });
        }
        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[ColorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the reference entry closest to `query` by Euclidean RGB distance
    ///
    /// Pure function of its inputs: a linear scan over the table in load
    /// order, keeping the running minimum. The strict comparison means equal
    /// distances never displace the incumbent, so ties deterministically go
    /// to the first-seen entry.
    pub fn find_closest(&self, query: Rgb) -> Result<MatchResult, AppError> {
        let mut best: Option<(&ColorEntry, u32)> = None;

        for entry in &self.entries {
            let dist = entry.rgb.distance_squared(&query);
            match best {
                Some((_, d)) if dist >= d => {}
                _ => best = Some((entry, dist)),
            }
        }

        let (entry, dist) = best.ok_or(AppError::EmptyPalette)?;
        Ok(MatchResult {
            name: entry.name.clone(),
            matched: entry.rgb,
            query,
            distance: (dist as f32).sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_palette() -> Palette {
        Palette::new(vec![
            ColorEntry {
                name: "Black".to_string(),
                rgb: Rgb::new(0, 0, 0),
            },
            ColorEntry {
                name: "White".to_string(),
                rgb: Rgb::new(255, 255, 255),
            },
            ColorEntry {
                name: "Red".to_string(),
                rgb: Rgb::new(255, 0, 0),
            },
            ColorEntry {
                name: "Azure".to_string(),
                rgb: Rgb::new(0, 127, 255),
            },
        ])
    }

    fn palette_from_csv(data: &str) -> Result<Palette, AppError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes());
        Palette::from_csv(reader)
    }

    #[test]
    fn exact_entry_matches_itself() {
        let palette = sample_palette();
        let result = palette.find_closest(Rgb::new(255, 0, 0)).unwrap();
        assert_eq!(result.name, "Red");
        assert_eq!(result.matched, Rgb::new(255, 0, 0));
        assert_eq!(result.distance, 0.0);
    }

    #[test]
    fn near_black_query_matches_black() {
        // (10, 5, 0) is ~11.2 from black and ~441.7 from white.
        let palette = Palette::new(vec![
            ColorEntry {
                name: "Black".to_string(),
                rgb: Rgb::new(0, 0, 0),
            },
            ColorEntry {
                name: "White".to_string(),
                rgb: Rgb::new(255, 255, 255),
            },
        ]);
        let result = palette.find_closest(Rgb::new(10, 5, 0)).unwrap();
        assert_eq!(result.name, "Black");
        assert_eq!(result.matched, Rgb::new(0, 0, 0));
        assert!((result.distance - 125f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn result_distance_is_minimal() {
        let palette = sample_palette();
        let query = Rgb::new(90, 40, 200);
        let result = palette.find_closest(query).unwrap();
        let best = result.matched.distance_squared(&query);
        for entry in palette.entries() {
            assert!(best <= entry.rgb.distance_squared(&query));
        }
    }

    #[test]
    fn repeated_queries_are_deterministic() {
        let palette = sample_palette();
        let query = Rgb::new(120, 120, 120);
        let first = palette.find_closest(query).unwrap();
        for _ in 0..10 {
            let again = palette.find_closest(query).unwrap();
            assert_eq!(again.name, first.name);
            assert_eq!(again.matched, first.matched);
        }
    }

    #[test]
    fn ties_resolve_to_earlier_entry() {
        // Both entries are exactly 10 away from the query on one axis.
        let palette = Palette::new(vec![
            ColorEntry {
                name: "Low".to_string(),
                rgb: Rgb::new(100, 0, 0),
            },
            ColorEntry {
                name: "High".to_string(),
                rgb: Rgb::new(120, 0, 0),
            },
        ]);
        let result = palette.find_closest(Rgb::new(110, 0, 0)).unwrap();
        assert_eq!(result.name, "Low");

        // Same distances, opposite load order.
        let flipped = Palette::new(vec![
            ColorEntry {
                name: "High".to_string(),
                rgb: Rgb::new(120, 0, 0),
            },
            ColorEntry {
                name: "Low".to_string(),
                rgb: Rgb::new(100, 0, 0),
            },
        ]);
        let result = flipped.find_closest(Rgb::new(110, 0, 0)).unwrap();
        assert_eq!(result.name, "High");
    }

    #[test]
    fn empty_palette_is_an_error() {
        let palette = Palette::new(Vec::new());
        let err = palette.find_closest(Rgb::new(1, 2, 3)).unwrap_err();
        assert!(matches!(err, AppError::EmptyPalette));
    }

    #[test]
    fn loads_headerless_csv_rows() {
        let palette = palette_from_csv(
            "black,Black,#000000,0,0,0\n\
             air_force_blue_raf,Air Force Blue (Raf),#5d8aa8,93,138,168\n",
        )
        .unwrap();
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.entries()[0].name, "Black");
        assert_eq!(palette.entries()[1].name, "Air Force Blue (Raf)");
        assert_eq!(palette.entries()[1].rgb, Rgb::new(93, 138, 168));
    }

    #[test]
    fn rejects_non_numeric_channel() {
        let err = palette_from_csv("black,Black,#000000,0,zero,0\n").unwrap_err();
        assert!(matches!(err, AppError::MalformedPaletteRow { .. }));
    }

    #[test]
    fn rejects_out_of_range_channel() {
        let err = palette_from_csv("white,White,#ffffff,256,255,255\n").unwrap_err();
        assert!(matches!(err, AppError::MalformedPaletteRow { .. }));
    }

    #[test]
    fn rejects_truncated_row() {
        let err = palette_from_csv("black,Black,#000000,0,0\n").unwrap_err();
        assert!(matches!(
            err,
            AppError::MalformedPaletteRow { line: 1, .. }
        ));
    }

    #[test]
    fn match_result_serializes_with_stable_field_names() {
        let palette = sample_palette();
        let result = palette.find_closest(Rgb::new(0, 0, 0)).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["name"], "Black");
        assert_eq!(json["matched"]["r"], 0);
        assert_eq!(json["query"]["b"], 0);
        assert_eq!(json["distance"], 0.0);
    }
}
