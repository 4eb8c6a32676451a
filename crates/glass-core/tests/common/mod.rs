// Shared test doubles for host-side scenario tests.

#![allow(dead_code)]

use glass_core::{BoundingBox, FilterGraph, GlassError, MeasureMode, OverlayLayout, Result, Surface};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    AttachFilter(FilterGraph),
    Source { uri_len: usize, width: f64, height: f64 },
    Scale(f64),
    Layout(OverlayLayout),
    Backdrop(String),
}

/// Surface that records every call and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub bounds: Option<BoundingBox>,
    pub calls: Vec<Call>,
    pub fail_source: bool,
}

impl RecordingSurface {
    pub fn mounted(width: f64, height: f64, left: f64, top: f64) -> Self {
        Self {
            bounds: Some(BoundingBox {
                width,
                height,
                left,
                top,
            }),
            ..Self::default()
        }
    }

    pub fn unmounted() -> Self {
        Self::default()
    }

    pub fn backdrops(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Backdrop(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn scales(&self) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Scale(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn last_layout(&self) -> Option<&OverlayLayout> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::Layout(l) => Some(l),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn measure(&self, _mode: MeasureMode) -> Option<BoundingBox> {
        self.bounds
    }

    fn attach_filter(&mut self, graph: &FilterGraph) -> Result<()> {
        self.calls.push(Call::AttachFilter(graph.clone()));
        Ok(())
    }

    fn set_displacement_source(&mut self, data_uri: &str, width: f64, height: f64) -> Result<()> {
        if self.fail_source {
            return Err(GlassError::surface("set_displacement_source", "bitmap refused"));
        }
        self.calls.push(Call::Source {
            uri_len: data_uri.len(),
            width,
            height,
        });
        Ok(())
    }

    fn set_displacement_scale(&mut self, scale: f64) -> Result<()> {
        self.calls.push(Call::Scale(scale));
        Ok(())
    }

    fn apply_layout(&mut self, layout: &OverlayLayout) -> Result<()> {
        self.calls.push(Call::Layout(layout.clone()));
        Ok(())
    }

    fn apply_backdrop_filter(&mut self, filter: &str) -> Result<()> {
        self.calls.push(Call::Backdrop(filter.to_string()));
        Ok(())
    }
}
