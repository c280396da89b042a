// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity metadata microformat
//!
//! Every datum attached to an entity is a `key:value` string. The decoder
//! splits on the first `:`, matches the key against the known set and
//! parses the value into a typed [`Metadata`] record. Unknown keys are
//! skipped; malformed values keep the field default.

use crate::formula;

/// Known metadata keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    Height,
    Z,
    Name,
    Solid,
    Angle,
    RotateX,
    RotateY,
    Rotate90,
    OpeningArea,
}

impl MetadataKey {
    /// Match a raw key (case-sensitive, as written by the drawing tools)
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "height" => Some(Self::Height),
            "z" => Some(Self::Z),
            "Name" => Some(Self::Name),
            "solid" => Some(Self::Solid),
            "angle" => Some(Self::Angle),
            "rotate_x" => Some(Self::RotateX),
            "rotate_y" => Some(Self::RotateY),
            "rotate90" => Some(Self::Rotate90),
            "Opening_area" => Some(Self::OpeningArea),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Height => "height",
            Self::Z => "z",
            Self::Name => "Name",
            Self::Solid => "solid",
            Self::Angle => "angle",
            Self::RotateX => "rotate_x",
            Self::RotateY => "rotate_y",
            Self::Rotate90 => "rotate90",
            Self::OpeningArea => "Opening_area",
        }
    }
}

/// Typed entity metadata, parsed once per entity
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// Extrusion height
    pub height: f64,
    /// Whether `height` was written explicitly rather than defaulted
    pub height_declared: bool,
    /// Elevation relative to the drawing's global level (`z`)
    pub elevation_relative: f64,
    /// Display name (`Name`)
    pub name: Option<String>,
    /// Solid (true) or void (false)
    pub solid: bool,
    /// Whether `solid` was written explicitly rather than defaulted
    pub solid_declared: bool,
    /// Inclination angle in degrees (`angle`)
    pub incline_angle: f64,
    /// Rotation about X in degrees
    pub rotate_x: f64,
    /// Rotation about Y in degrees
    pub rotate_y: f64,
    /// Extra quarter turn about X
    pub rotate90: bool,
    /// Raw `Opening_area` formula
    pub opening_area_formula: Option<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            height: 1.0,
            height_declared: false,
            elevation_relative: 0.0,
            name: None,
            solid: true,
            solid_declared: false,
            incline_angle: 0.0,
            rotate_x: 0.0,
            rotate_y: 0.0,
            rotate90: false,
            opening_area_formula: None,
        }
    }
}

impl Metadata {
    /// Parse metadata items of the form `key:value`
    pub fn parse<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut metadata = Self::default();

        for item in items {
            let item = item.as_ref();
            let Some((raw_key, raw_value)) = item.split_once(':') else {
                continue;
            };
            let Some(key) = MetadataKey::from_key(raw_key.trim()) else {
                continue;
            };
            metadata.apply(key, raw_value.trim());
        }

        metadata
    }

    fn apply(&mut self, key: MetadataKey, value: &str) {
        match key {
            MetadataKey::Height => {
                if let Some(height) = parse_number(key, value) {
                    self.height = height;
                    self.height_declared = true;
                }
            }
            MetadataKey::Z => {
                self.elevation_relative =
                    parse_number(key, value).unwrap_or(self.elevation_relative)
            }
            MetadataKey::Name => {
                self.name = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            MetadataKey::Solid => {
                if let Some(flag) = parse_flag(key, value) {
                    self.solid = flag;
                    self.solid_declared = true;
                }
            }
            MetadataKey::Angle => {
                self.incline_angle = parse_number(key, value).unwrap_or(self.incline_angle)
            }
            MetadataKey::RotateX => {
                self.rotate_x = parse_number(key, value).unwrap_or(self.rotate_x)
            }
            MetadataKey::RotateY => {
                self.rotate_y = parse_number(key, value).unwrap_or(self.rotate_y)
            }
            MetadataKey::Rotate90 => {
                self.rotate90 = parse_flag(key, value).unwrap_or(self.rotate90)
            }
            MetadataKey::OpeningArea => {
                self.opening_area_formula = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
        }
    }

    /// True when the entity only exists to cut other solids
    #[inline]
    pub fn is_void(&self) -> bool {
        !self.solid
    }

    /// True when any element-level X/Y rotation is requested
    #[inline]
    pub fn has_rotation(&self) -> bool {
        self.rotate_x != 0.0 || self.rotate_y != 0.0 || self.rotate90
    }

    /// Effective rotation about X in degrees, including `rotate90`
    #[inline]
    pub fn effective_rotate_x(&self) -> f64 {
        if self.rotate90 {
            self.rotate_x + 90.0
        } else {
            self.rotate_x
        }
    }

    /// Lateral-area deduction from `Opening_area` (0 when missing or unsafe)
    pub fn opening_deduction(&self) -> f64 {
        formula::opening_deduction(self.opening_area_formula.as_deref())
    }
}

fn parse_number(key: MetadataKey, value: &str) -> Option<f64> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            tracing::debug!(key = key.as_str(), value, "malformed metadata value, using default");
            None
        }
    }
}

fn parse_flag(key: MetadataKey, value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        other => match other.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v != 0.0),
            _ => {
                tracing::debug!(key = key.as_str(), value, "malformed metadata flag, using default");
                None
            }
        },
    }
}
