// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration loaded from environment variables.

/// Tolerances and layer conventions for one conversion.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum shared volume for a void to count as cutting a solid.
    pub intersection_epsilon: f64,
    /// Padding applied to bounding boxes in the cheap overlap pre-test.
    pub bbox_padding: f64,
    /// Roofs only trim solids rising more than this above their bottom.
    pub trim_epsilon: f64,
    /// Outlines and triangles with less area than this are degenerate.
    pub degenerate_area_epsilon: f64,
    /// Segments per bulge arc.
    pub arc_segments: usize,
    /// Layer whose voids cut every solid (matched case-insensitively).
    pub void_layer: String,
    /// Layer whose circles are control points rather than solids.
    pub control_layer: String,
    /// Layer keywords whose entities follow the control-point surface.
    pub spatial_layers: Vec<String>,
    /// Extrusion height for fixture entities without a `height`.
    pub fixture_thickness: f64,
    /// Fixture void layer -> fixture solid layers it may cut, beyond the
    /// same-name rule.
    pub fixture_compatibility: Vec<(String, Vec<String>)>,
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables keep the [`Default`] value.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            intersection_epsilon: env_or(
                "DXF_LITE_INTERSECTION_EPSILON",
                defaults.intersection_epsilon,
            ),
            bbox_padding: env_or("DXF_LITE_BBOX_PADDING", defaults.bbox_padding),
            trim_epsilon: env_or("DXF_LITE_TRIM_EPSILON", defaults.trim_epsilon),
            degenerate_area_epsilon: env_or(
                "DXF_LITE_DEGENERATE_AREA_EPSILON",
                defaults.degenerate_area_epsilon,
            ),
            arc_segments: env_or("DXF_LITE_ARC_SEGMENTS", defaults.arc_segments),
            void_layer: std::env::var("DXF_LITE_VOID_LAYER").unwrap_or(defaults.void_layer),
            control_layer: std::env::var("DXF_LITE_CONTROL_LAYER")
                .unwrap_or(defaults.control_layer),
            spatial_layers: std::env::var("DXF_LITE_SPATIAL_LAYERS")
                .map(|v| keyword_list(&v))
                .unwrap_or(defaults.spatial_layers),
            fixture_thickness: env_or("DXF_LITE_FIXTURE_THICKNESS", defaults.fixture_thickness),
            fixture_compatibility: defaults.fixture_compatibility,
        }
    }

    /// Override the arc segment count (CLI argument); zero keeps the current value.
    pub fn with_arc_segments(mut self, segments: usize) -> Self {
        if segments > 0 {
            self.arc_segments = segments;
        }
        self
    }

    /// True when `layer` is the global void layer.
    pub fn is_void_layer(&self, layer: &str) -> bool {
        layer.eq_ignore_ascii_case(&self.void_layer)
    }

    /// True when entities on `layer` may follow the control-point surface.
    pub fn is_spatial_layer(&self, layer: &str) -> bool {
        let lower = layer.to_ascii_lowercase();
        self.spatial_layers.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Extra fixture solid layers a fixture void layer may cut.
    pub fn compatible_layers(&self, void_layer: &str) -> &[String] {
        self.fixture_compatibility
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(void_layer))
            .map(|(_, layers)| layers.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            intersection_epsilon: 1e-6,
            bbox_padding: 1e-9,
            trim_epsilon: 1e-6,
            degenerate_area_epsilon: 1e-12,
            arc_segments: 16,
            void_layer: "void".to_string(),
            control_layer: "control".to_string(),
            spatial_layers: keyword_list("roof,slab"),
            fixture_thickness: 0.15,
            fixture_compatibility: vec![(
                "reveal".to_string(),
                vec![
                    "frame".to_string(),
                    "door_frame".to_string(),
                    "window_frame".to_string(),
                ],
            )],
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn keyword_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
