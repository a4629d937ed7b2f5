//! Configuration types for diagram rendering.
//!
//! This module provides configuration structures that control how diagrams
//! are styled and which Graphviz layout engine draws them. All types
//! implement [`serde::Deserialize`] for loading from external sources; every
//! field has a default, so an empty document is a valid configuration.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration combining style and backend settings.
//! - [`StyleConfig`] - Fonts, colors and spacing applied to every diagram.
//! - [`BackendConfig`] - Selects the [`LayoutEngine`] used by Graphviz.
//!
//! # Example
//!
//! ```
//! # use archviz::config::AppConfig;
//! // Use default configuration
//! let config = AppConfig::default();
//! assert!(config.style().validate().is_ok());
//! ```

use serde::Deserialize;

use archviz_core::color::Color;

/// Top-level application configuration combining style and backend settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,

    /// Backend configuration section.
    #[serde(default)]
    backend: BackendConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified style and backend configurations.
    pub fn new(style: StyleConfig, backend: BackendConfig) -> Self {
        Self { style, backend }
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Returns the backend configuration.
    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }
}

/// Graphviz layout program.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutEngine {
    /// Hierarchical layout, the usual choice for architecture diagrams.
    #[default]
    Dot,
    Neato,
    Fdp,
    Sfdp,
    Circo,
    Twopi,
}

/// Rendering backend configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    #[serde(default)]
    layout: LayoutEngine,
}

impl BackendConfig {
    pub fn new(layout: LayoutEngine) -> Self {
        Self { layout }
    }

    /// Returns the [`LayoutEngine`] to run.
    pub fn layout(&self) -> LayoutEngine {
        self.layout
    }
}

/// Visual styling configuration for rendered diagrams.
///
/// Colors are kept as strings and parsed on access so that a configuration
/// file with a bad color still loads; [`StyleConfig::validate`] reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    font_name: String,
    /// Title font size in points. Node and edge labels use two points less.
    font_size: f32,
    font_color: String,
    /// Canvas background; transparent when unset.
    background_color: Option<String>,
    node_shape: String,
    node_fill_color: String,
    edge_color: String,
    /// Cluster backgrounds, cycled by nesting depth.
    cluster_colors: Vec<String>,
    /// Margin around the drawing, in inches.
    pad: f32,
    /// Minimum gap between nodes of the same rank, in inches.
    node_sep: f32,
    /// Minimum gap between ranks, in inches.
    rank_sep: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_name: "Sans-Serif".to_string(),
            font_size: 15.0,
            font_color: "#2D3436".to_string(),
            background_color: None,
            node_shape: "box".to_string(),
            node_fill_color: "#FFFFFF".to_string(),
            edge_color: "#7B8894".to_string(),
            cluster_colors: ["#E5F5FD", "#EBF3E7", "#ECE8F6", "#FDF7E3"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            pad: 2.0,
            node_sep: 0.6,
            rank_sep: 0.75,
        }
    }
}

fn parse_color(name: &str, value: &str) -> Result<Color, String> {
    Color::new(value).map_err(|err| format!("Invalid {name} in config: {err}"))
}

impl StyleConfig {
    pub fn font_name(&self) -> &str {
        &self.font_name
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Returns the parsed label font [`Color`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn font_color(&self) -> Result<Color, String> {
        parse_color("font_color", &self.font_color)
    }

    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_deref()
            .map(|color| parse_color("background_color", color))
            .transpose()
    }

    /// Default Graphviz shape for nodes that do not set one.
    pub fn node_shape(&self) -> &str {
        &self.node_shape
    }

    pub fn node_fill_color(&self) -> Result<Color, String> {
        parse_color("node_fill_color", &self.node_fill_color)
    }

    pub fn edge_color(&self) -> Result<Color, String> {
        parse_color("edge_color", &self.edge_color)
    }

    /// Returns the cluster background palette.
    ///
    /// # Errors
    ///
    /// Returns an error if the palette is empty or holds an invalid color.
    pub fn cluster_colors(&self) -> Result<Vec<Color>, String> {
        if self.cluster_colors.is_empty() {
            return Err("Invalid cluster_colors in config: at least one color is required".into());
        }
        self.cluster_colors
            .iter()
            .map(|color| parse_color("cluster_colors", color))
            .collect()
    }

    pub fn pad(&self) -> f32 {
        self.pad
    }

    pub fn node_sep(&self) -> f32 {
        self.node_sep
    }

    pub fn rank_sep(&self) -> f32 {
        self.rank_sep
    }

    /// Checks every color and size in the style.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid setting.
    pub fn validate(&self) -> Result<(), String> {
        self.font_color()?;
        self.background_color()?;
        self.node_fill_color()?;
        self.edge_color()?;
        self.cluster_colors()?;

        let sizes = [
            ("font_size", self.font_size),
            ("pad", self.pad),
            ("node_sep", self.node_sep),
            ("rank_sep", self.rank_sep),
        ];
        for (name, value) in sizes {
            if !value.is_finite() || value < 0.0 {
                return Err(format!(
                    "Invalid {name} in config: expected a non-negative number, got {value}"
                ));
            }
        }
        if self.font_name.trim().is_empty() || self.node_shape.trim().is_empty() {
            return Err("Invalid config: font_name and node_shape must not be empty".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.backend().layout(), LayoutEngine::Dot);
        assert_eq!(config.style().font_name(), "Sans-Serif");
        assert_eq!(config.style().cluster_colors().unwrap().len(), 4);
        assert!(config.style().background_color().unwrap().is_none());
    }

    #[test]
    fn test_partial_style_section() {
        let config: AppConfig = toml::from_str(
            r##"
            [style]
            background_color = "white"
            cluster_colors = ["#ffffff"]
            rank_sep = 1.5

            [backend]
            layout = "fdp"
            "##,
        )
        .unwrap();

        assert_eq!(config.backend().layout(), LayoutEngine::Fdp);
        assert_eq!(config.style().rank_sep(), 1.5);
        assert_eq!(config.style().node_sep(), 0.6);
        assert_eq!(
            config.style().background_color().unwrap().map(|c| c.to_hex()),
            Some("#ffffff".to_string())
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[style]\nfont = \"Arial\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_reports_bad_color() {
        let config: AppConfig = toml::from_str("[style]\nedge_color = \"nope\"\n").unwrap();
        let err = config.style().validate().unwrap_err();
        assert!(err.contains("edge_color"), "got: {err}");
    }

    #[test]
    fn test_validate_rejects_empty_palette() {
        let config: AppConfig = toml::from_str("[style]\ncluster_colors = []\n").unwrap();
        assert!(config.style().validate().is_err());
    }
}
