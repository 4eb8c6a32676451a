use crate::constants::{
    INSTANCE_ATTR, SETTLE_TRANSITION, SVG_NS, XLINK_NS, Z_INDEX_FLOATING, Z_INDEX_INLINE,
};
use glass_core::constants::{FILTER_REGION_EXTENT, FILTER_REGION_INSET};
use glass_core::{
    BoundingBox, Cursor, FilterGraph, FilterPrimitive, GlassError, MeasureMode, OverlayLayout,
    Surface,
};
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

#[inline]
fn surface_err(operation: &'static str, e: JsValue) -> GlassError {
    GlassError::surface(operation, format!("{:?}", e))
}

#[inline]
fn px(v: f64) -> String {
    format!("{}px", v)
}

/// DOM rendering surface: an overlay element inside the host plus a hidden
/// `<svg>` holding the filter definition.
pub struct DomSurface {
    host: web::HtmlElement,
    overlay: web::HtmlElement,
    svg: web::Element,
    defs: web::Element,
    filter: Option<web::Element>,
    image: Option<web::Element>,
    displacement: Option<web::Element>,
}

impl DomSurface {
    pub fn create(document: &web::Document, host: web::HtmlElement, instance: &str) -> anyhow::Result<Self> {
        let js = |e: JsValue| anyhow::anyhow!(format!("{:?}", e));

        host.style().set_property("position", "relative").map_err(js)?;

        let overlay: web::HtmlElement = document
            .create_element("div")
            .map_err(js)?
            .dyn_into::<web::HtmlElement>()
            .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
        overlay.set_attribute(INSTANCE_ATTR, instance).map_err(js)?;
        let style = overlay.style();
        for (prop, value) in [
            ("position", "absolute"),
            ("overflow", "hidden"),
            ("user-select", "none"),
            ("pointer-events", "none"),
        ] {
            style.set_property(prop, value).map_err(js)?;
        }
        host.append_child(&overlay).map_err(js)?;

        let svg = document.create_element_ns(Some(SVG_NS), "svg").map_err(js)?;
        svg.set_attribute("width", "0").map_err(js)?;
        svg.set_attribute("height", "0").map_err(js)?;
        svg.set_attribute("style", "position:fixed;top:0;left:0;z-index:9999")
            .map_err(js)?;
        let defs = document.create_element_ns(Some(SVG_NS), "defs").map_err(js)?;
        svg.append_child(&defs).map_err(js)?;
        host.append_child(&svg).map_err(js)?;

        log::info!("[dom] surface created for {}", instance);
        Ok(Self {
            host,
            overlay,
            svg,
            defs,
            filter: None,
            image: None,
            displacement: None,
        })
    }

    pub fn overlay(&self) -> &web::HtmlElement {
        &self.overlay
    }

    /// Detach everything this surface added to the host.
    pub fn remove(&self) {
        self.overlay.remove();
        self.svg.remove();
    }

    fn content_element(&self) -> Option<web::HtmlElement> {
        let child = self.host.first_element_child()?;
        if child.is_same_node(Some(self.overlay.as_ref())) || child.is_same_node(Some(self.svg.as_ref())) {
            return None;
        }
        child.dyn_into::<web::HtmlElement>().ok()
    }

    fn build_filter(&self, document: &web::Document, graph: &FilterGraph) -> Result<(web::Element, Option<web::Element>, Option<web::Element>), JsValue> {
        let filter = document.create_element_ns(Some(SVG_NS), "filter")?;
        filter.set_attribute("id", &graph.id)?;
        filter.set_attribute("filterUnits", "userSpaceOnUse")?;
        filter.set_attribute("color-interpolation-filters", "sRGB")?;
        filter.set_attribute("x", FILTER_REGION_INSET)?;
        filter.set_attribute("y", FILTER_REGION_INSET)?;
        filter.set_attribute("width", FILTER_REGION_EXTENT)?;
        filter.set_attribute("height", FILTER_REGION_EXTENT)?;

        let mut image = None;
        let mut displacement = None;
        for primitive in graph.primitives.iter() {
            let el = document.create_element_ns(Some(SVG_NS), primitive.tag())?;
            for (name, value) in primitive.attributes() {
                el.set_attribute(name, &value)?;
            }
            match primitive {
                FilterPrimitive::Image { .. } => image = Some(el.clone()),
                FilterPrimitive::DisplacementMap { .. } => displacement = Some(el.clone()),
                _ => {}
            }
            filter.append_child(&el)?;
        }
        Ok((filter, image, displacement))
    }
}

impl Surface for DomSurface {
    fn measure(&self, mode: MeasureMode) -> Option<BoundingBox> {
        if !self.host.is_connected() {
            return None;
        }
        match mode {
            MeasureMode::Inline => {
                let rect = self.host.get_bounding_client_rect();
                Some(BoundingBox {
                    width: rect.width(),
                    height: rect.height(),
                    left: rect.left(),
                    top: rect.top(),
                })
            }
            MeasureMode::Floating => {
                let content = self.content_element()?;
                Some(BoundingBox {
                    width: content.offset_width() as f64,
                    height: content.offset_height() as f64,
                    left: 0.0,
                    top: 0.0,
                })
            }
        }
    }

    fn attach_filter(&mut self, graph: &FilterGraph) -> glass_core::Result<()> {
        let document = window_document()
            .ok_or_else(|| GlassError::surface("attach_filter", "no document"))?;
        if let Some(old) = self.filter.take() {
            old.remove();
        }
        self.image = None;
        self.displacement = None;

        let (filter, image, displacement) = self
            .build_filter(&document, graph)
            .map_err(|e| surface_err("attach_filter", e))?;
        self.defs
            .append_child(&filter)
            .map_err(|e| surface_err("attach_filter", e))?;
        self.filter = Some(filter);
        self.image = image;
        self.displacement = displacement;
        log::debug!(
            "[dom] filter {} attached ({} primitives)",
            graph.id,
            graph.primitives.len()
        );
        Ok(())
    }

    fn set_displacement_source(&mut self, data_uri: &str, width: f64, height: f64) -> glass_core::Result<()> {
        let op = "set_displacement_source";
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| GlassError::surface(op, "no image stage"))?;
        image
            .set_attribute_ns(Some(XLINK_NS), "xlink:href", data_uri)
            .map_err(|e| surface_err(op, e))?;
        image
            .set_attribute("href", data_uri)
            .map_err(|e| surface_err(op, e))?;
        for el in [Some(image), self.filter.as_ref()].into_iter().flatten() {
            el.set_attribute("width", &width.to_string())
                .map_err(|e| surface_err(op, e))?;
            el.set_attribute("height", &height.to_string())
                .map_err(|e| surface_err(op, e))?;
        }
        Ok(())
    }

    fn set_displacement_scale(&mut self, scale: f64) -> glass_core::Result<()> {
        let op = "set_displacement_scale";
        self.displacement
            .as_ref()
            .ok_or_else(|| GlassError::surface(op, "no displacement stage"))?
            .set_attribute("scale", &scale.to_string())
            .map_err(|e| surface_err(op, e))
    }

    fn apply_layout(&mut self, layout: &OverlayLayout) -> glass_core::Result<()> {
        let style = self.overlay.style();
        let grabbing = layout.cursor == Cursor::Grabbing;
        let props = [
            ("position", if layout.fixed { "fixed".to_string() } else { "absolute".to_string() }),
            ("left", px(layout.left)),
            ("top", px(layout.top)),
            ("width", px(layout.width)),
            ("height", px(layout.height)),
            ("border-radius", px(layout.border_radius)),
            ("box-shadow", layout.box_shadow.clone()),
            ("cursor", layout.cursor.as_css().to_string()),
            (
                "z-index",
                if layout.fixed { Z_INDEX_FLOATING } else { Z_INDEX_INLINE }.to_string(),
            ),
            ("touch-action", layout.touch_action().to_string()),
            (
                "pointer-events",
                if layout.fixed { "auto" } else { "none" }.to_string(),
            ),
            (
                "transition",
                if grabbing { "none" } else { SETTLE_TRANSITION }.to_string(),
            ),
        ];
        for (prop, value) in props.iter() {
            style
                .set_property(prop, value)
                .map_err(|e| surface_err("apply_layout", e))?;
        }
        Ok(())
    }

    fn apply_backdrop_filter(&mut self, filter: &str) -> glass_core::Result<()> {
        let style = self.overlay.style();
        for prop in ["backdrop-filter", "-webkit-backdrop-filter"] {
            style
                .set_property(prop, filter)
                .map_err(|e| surface_err("apply_backdrop_filter", e))?;
        }
        Ok(())
    }
}
