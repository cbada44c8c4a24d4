use crate::data::{Dataset, Field};
use crate::error::{DashError, Result};
use crate::parser::color::{hex_color, palette_override};
use nom::combinator::all_consuming;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// An sRGB color, written and serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self> {
        all_consuming(hex_color)(s.trim())
            .map(|(_, color)| color)
            .map_err(|_| DashError::Configuration(format!("invalid color '{}', expected #rrggbb", s)))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Colors handed to series that are not grouped by a category (bar charts).
pub const DEFAULT_COLORWAY: [Color; 2] = [Color::rgb(0x1f, 0x77, 0xb4), Color::rgb(0xff, 0x7f, 0x0e)];

/// Registered palettes, one ordered color list per categorical field.
///
/// Colors are indexed by the order a field's distinct values first appear in
/// the dataset. Past the end of a palette the colors repeat from the start.
#[derive(Debug, Clone, Default)]
pub struct CategoryColorTable {
    palettes: BTreeMap<Field, Vec<Color>>,
}

impl CategoryColorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Designer palettes for the tips dataset.
    pub fn tips_default() -> Self {
        let mut palettes = BTreeMap::new();
        palettes.insert(Field::Sex, vec![Color::rgb(0xff, 0x3f, 0xd8), Color::rgb(0x42, 0x90, 0xff)]);
        palettes.insert(Field::Smoker, vec![Color::rgb(0x32, 0xfc, 0x7c), Color::rgb(0xed, 0x28, 0x28)]);
        palettes.insert(Field::Time, vec![Color::rgb(0x00, 0x59, 0xa3), Color::rgb(0xf2, 0xe2, 0x00)]);
        palettes.insert(
            Field::Day,
            vec![
                Color::rgb(0xff, 0x88, 0x00),
                Color::rgb(0xdd, 0xff, 0x00),
                Color::rgb(0x3d, 0xe8, 0x00),
                Color::rgb(0x00, 0xc9, 0xed),
            ],
        );
        Self { palettes }
    }

    /// Register (or replace) the palette of a categorical field.
    pub fn register(&mut self, field: Field, colors: Vec<Color>) -> Result<()> {
        if !field.is_categorical() {
            return Err(DashError::Configuration(format!(
                "palette registered for non-categorical field '{}'",
                field
            )));
        }
        if colors.is_empty() {
            return Err(DashError::Configuration(format!("empty palette for field '{}'", field)));
        }
        self.palettes.insert(field, colors);
        Ok(())
    }

    /// Apply an override written as `field=#rrggbb,#rrggbb`.
    pub fn register_spec(&mut self, spec: &str) -> Result<()> {
        let (_, (name, colors)) = palette_override(spec).map_err(|_| {
            DashError::Configuration(format!(
                "invalid palette '{}', expected field=#rrggbb,#rrggbb",
                spec
            ))
        })?;
        let field = Field::parse(&name)
            .map_err(|_| DashError::Configuration(format!("palette for unknown field '{}'", name)))?;
        self.register(field, colors)
    }

    pub fn colors_for(&self, field: Field) -> Result<&[Color]> {
        self.palettes
            .get(&field)
            .map(Vec::as_slice)
            .ok_or_else(|| DashError::Configuration(format!("no palette registered for field '{}'", field)))
    }

    /// Color of the `index`-th group of `field`.
    pub fn color_for_group(&self, field: Field, index: usize) -> Result<Color> {
        let colors = self.colors_for(field)?;
        Ok(colors[index % colors.len()])
    }

    /// Fail fast when any field the UI can select has no palette.
    pub fn ensure_registered(&self, fields: &[Field]) -> Result<()> {
        let missing: Vec<&str> = fields
            .iter()
            .filter(|f| !self.palettes.contains_key(f))
            .map(|f| f.name())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DashError::Configuration(format!(
                "no palette registered for field(s): {}",
                missing.join(", ")
            )))
        }
    }

    /// Fields whose distinct-value count in `dataset` exceeds their palette length.
    pub fn short_palettes(&self, dataset: &Dataset) -> Vec<(Field, usize, usize)> {
        self.palettes
            .iter()
            .filter_map(|(&field, colors)| {
                let distinct: HashSet<&str> = dataset
                    .records()
                    .iter()
                    .filter_map(|r| r.category(field))
                    .collect();
                (distinct.len() > colors.len()).then_some((field, distinct.len(), colors.len()))
            })
            .collect()
    }
}
