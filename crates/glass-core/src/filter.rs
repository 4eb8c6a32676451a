//! Filter-graph composition: turns a field and style parameters into the
//! primitives a surface attaches plus the backdrop filter string.

use crate::config::StyleParams;
use crate::constants::{DEVICE_SAMPLE_SCALE, FILTER_REGION_EXTENT, FILTER_REGION_INSET};
use crate::field::Field;
use smallvec::SmallVec;
use std::fmt::Write as _;

pub const SOURCE_GRAPHIC: &str = "SourceGraphic";
pub const DISPLACED: &str = "displaced";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// 4x5 colour matrix keeping only this channel plus alpha.
    pub fn isolate_matrix(self) -> &'static str {
        match self {
            Channel::Red => "1 0 0 0 0  0 0 0 0 0  0 0 0 0 0  0 0 0 1 0",
            Channel::Green => "0 0 0 0 0  0 1 0 0 0  0 0 0 0 0  0 0 0 1 0",
            Channel::Blue => "0 0 0 0 0  0 0 0 0 0  0 0 1 0 0  0 0 0 1 0",
        }
    }
}

/// One stage of the filter graph.
///
/// The displacement scale and the image source are deliberately absent: they
/// change every recompute and are pushed to the surface separately, so the
/// graph itself only changes when its structure does.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterPrimitive {
    Image {
        result: String,
    },
    DisplacementMap {
        input: &'static str,
        map: String,
        result: &'static str,
    },
    Offset {
        input: &'static str,
        dx: f64,
        dy: f64,
        result: &'static str,
    },
    ColorMatrix {
        input: &'static str,
        channel: Channel,
        result: &'static str,
    },
    /// Additive (`lighter`) composite. The last one has no named result.
    Lighter {
        input: &'static str,
        input2: &'static str,
        result: Option<&'static str>,
    },
}

impl FilterPrimitive {
    pub fn tag(&self) -> &'static str {
        match self {
            FilterPrimitive::Image { .. } => "feImage",
            FilterPrimitive::DisplacementMap { .. } => "feDisplacementMap",
            FilterPrimitive::Offset { .. } => "feOffset",
            FilterPrimitive::ColorMatrix { .. } => "feColorMatrix",
            FilterPrimitive::Lighter { .. } => "feComposite",
        }
    }

    /// Attribute list in document order.
    pub fn attributes(&self) -> SmallVec<[(&'static str, String); 5]> {
        let mut attrs = SmallVec::new();
        match self {
            FilterPrimitive::Image { result } => {
                attrs.push(("id", result.clone()));
                attrs.push(("result", result.clone()));
            }
            FilterPrimitive::DisplacementMap { input, map, result } => {
                attrs.push(("in", input.to_string()));
                attrs.push(("in2", map.clone()));
                attrs.push(("xChannelSelector", "R".to_string()));
                attrs.push(("yChannelSelector", "G".to_string()));
                attrs.push(("result", result.to_string()));
            }
            FilterPrimitive::Offset {
                input,
                dx,
                dy,
                result,
            } => {
                attrs.push(("dx", dx.to_string()));
                attrs.push(("dy", dy.to_string()));
                attrs.push(("in", input.to_string()));
                attrs.push(("result", result.to_string()));
            }
            FilterPrimitive::ColorMatrix {
                input,
                channel,
                result,
            } => {
                attrs.push(("in", input.to_string()));
                attrs.push(("type", "matrix".to_string()));
                attrs.push(("values", channel.isolate_matrix().to_string()));
                attrs.push(("result", result.to_string()));
            }
            FilterPrimitive::Lighter {
                input,
                input2,
                result,
            } => {
                attrs.push(("in", input.to_string()));
                attrs.push(("in2", input2.to_string()));
                attrs.push(("operator", "lighter".to_string()));
                if let Some(result) = result {
                    attrs.push(("result", result.to_string()));
                }
            }
        }
        attrs
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterGraph {
    pub id: String,
    pub primitives: SmallVec<[FilterPrimitive; 11]>,
}

impl FilterGraph {
    pub fn map_id(&self) -> Option<&str> {
        self.primitives.iter().find_map(|p| match p {
            FilterPrimitive::Image { result } => Some(result.as_str()),
            _ => None,
        })
    }

    pub fn has_dispersion(&self) -> bool {
        self.primitives
            .iter()
            .any(|p| matches!(p, FilterPrimitive::Offset { .. } | FilterPrimitive::ColorMatrix { .. }))
    }

    /// SVG `<filter>` markup with the current source and scale filled in.
    pub fn to_svg(&self, href: Option<&str>, width: f64, height: f64, scale: f64) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            r#"<filter id="{}" filterUnits="userSpaceOnUse" color-interpolation-filters="sRGB" x="{}" y="{}" width="{}" height="{}">"#,
            self.id, FILTER_REGION_INSET, FILTER_REGION_INSET, FILTER_REGION_EXTENT, FILTER_REGION_EXTENT
        );
        for primitive in &self.primitives {
            let _ = write!(out, "<{}", primitive.tag());
            for (name, value) in primitive.attributes() {
                let _ = write!(out, r#" {}="{}""#, name, value);
            }
            match primitive {
                FilterPrimitive::Image { .. } => {
                    if let Some(href) = href {
                        let _ = write!(out, r#" href="{}""#, href);
                    }
                    let _ = write!(out, r#" width="{}" height="{}""#, width, height);
                }
                FilterPrimitive::DisplacementMap { .. } => {
                    let _ = write!(out, r#" scale="{}""#, scale);
                }
                _ => {}
            }
            out.push_str("/>");
        }
        out.push_str("</filter>");
        out
    }
}

/// Everything the surface needs for one recompute.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposedFilter {
    pub graph: FilterGraph,
    pub displacement_scale: f64,
    pub backdrop_filter: String,
    /// Offset magnitude of the chromatic sub-chain, `None` when omitted.
    pub dispersion: Option<f64>,
}

/// Compose the filter for `field` under the instance id `instance`.
pub fn compose_filter(instance: &str, field: &Field, style: &StyleParams) -> ComposedFilter {
    let dispersion = (style.dispersion.is_finite() && style.dispersion != 0.0).then_some(style.dispersion);
    let graph = build_graph(instance, dispersion);
    let backdrop_filter = backdrop_filter(&graph.id, style);
    ComposedFilter {
        graph,
        displacement_scale: displacement_scale(field.max_scale, style.depth),
        backdrop_filter,
        dispersion,
    }
}

/// Scale for the displacement stage, undoing the raster downsample.
#[inline]
pub fn displacement_scale(max_scale: f64, depth: f64) -> f64 {
    (max_scale * depth.abs() / DEVICE_SAMPLE_SCALE).max(0.0)
}

pub fn filter_id(instance: &str) -> String {
    format!("{instance}_filter")
}

pub fn backdrop_filter(filter_id: &str, style: &StyleParams) -> String {
    let mut out = format!("url(#{}) blur({}px)", filter_id, style.blur);
    if let Some(contrast) = style.contrast {
        let _ = write!(out, " contrast({})", contrast);
    }
    if let Some(brightness) = style.brightness {
        let _ = write!(out, " brightness({})", brightness);
    }
    if let Some(saturation) = style.saturation {
        let _ = write!(out, " saturate({})", saturation);
    }
    out
}

fn build_graph(instance: &str, dispersion: Option<f64>) -> FilterGraph {
    let map = format!("{instance}_map");
    let mut primitives: SmallVec<[FilterPrimitive; 11]> = SmallVec::new();
    primitives.push(FilterPrimitive::Image {
        result: map.clone(),
    });
    primitives.push(FilterPrimitive::DisplacementMap {
        input: SOURCE_GRAPHIC,
        map,
        result: DISPLACED,
    });

    if let Some(d) = dispersion {
        let stages = [
            (d, "redShift", Channel::Red, "redOnly"),
            (0.0, "greenCenter", Channel::Green, "greenOnly"),
            (-d, "blueShift", Channel::Blue, "blueOnly"),
        ];
        for (offset, result, _, _) in stages {
            primitives.push(FilterPrimitive::Offset {
                input: DISPLACED,
                dx: offset,
                dy: offset,
                result,
            });
        }
        for (_, input, channel, result) in stages {
            primitives.push(FilterPrimitive::ColorMatrix {
                input,
                channel,
                result,
            });
        }
        primitives.push(FilterPrimitive::Lighter {
            input: "redOnly",
            input2: "greenOnly",
            result: Some("redGreen"),
        });
        primitives.push(FilterPrimitive::Lighter {
            input: "redGreen",
            input2: "blueOnly",
            result: None,
        });
    }

    FilterGraph {
        id: filter_id(instance),
        primitives,
    }
}
