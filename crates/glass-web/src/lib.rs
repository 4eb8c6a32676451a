#![cfg(target_arch = "wasm32")]
//! Browser host: mounts a liquid glass overlay on a DOM element.

mod constants;
mod dom;
mod events;
mod frame;

use dom::DomSurface;
use events::{ElementCapture, InputWiring, Listeners};
use frame::RafFrames;
use glass_core::{FieldCache, GlassConfig, GlassEffect, Position};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

pub(crate) type WebEffect = GlassEffect<DomSurface, RafFrames>;

type PositionCallback = Rc<RefCell<Option<js_sys::Function>>>;

static NEXT_INSTANCE: AtomicU32 = AtomicU32::new(0);

thread_local! {
    // Shared by every instance on the page.
    static FIELD_CACHE: Rc<RefCell<FieldCache>> = Rc::new(RefCell::new(FieldCache::default()));
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("[web] glass-web starting");
    Ok(())
}

#[inline]
fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn position_object(position: Position) -> Result<JsValue, JsValue> {
    let obj = js_sys::Object::new();
    js_sys::Reflect::set(&obj, &JsValue::from_str("x"), &JsValue::from_f64(position.x))?;
    js_sys::Reflect::set(&obj, &JsValue::from_str("y"), &JsValue::from_f64(position.y))?;
    Ok(obj.into())
}

/// A mounted glass effect.
#[wasm_bindgen]
pub struct Glass {
    effect: Rc<RefCell<WebEffect>>,
    capture: Rc<RefCell<ElementCapture>>,
    listeners: Option<Listeners>,
    on_position: PositionCallback,
}

#[wasm_bindgen]
impl Glass {
    /// Mount on the element with id `host_id`. `config_json` may be empty.
    #[wasm_bindgen(constructor)]
    pub fn new(host_id: &str, config_json: &str) -> Result<Glass, JsValue> {
        let config = if config_json.trim().is_empty() {
            GlassConfig::default()
        } else {
            GlassConfig::from_json(config_json).map_err(js_error)?
        };
        mount(host_id, config).map_err(|e| {
            log::error!("[web] mount error: {:?}", e);
            js_error(e)
        })
    }

    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&self, config_json: &str) -> Result<(), JsValue> {
        let config = GlassConfig::from_json(config_json).map_err(js_error)?;
        self.effect
            .borrow_mut()
            .set_config(config, &mut *self.capture.borrow_mut());
        Ok(())
    }

    /// Called with `{x, y}` once a drag has settled for `positioningDuration`.
    #[wasm_bindgen(js_name = onPositionChange)]
    pub fn on_position_change(&self, callback: Option<js_sys::Function>) {
        *self.on_position.borrow_mut() = callback;
    }

    pub fn position(&self) -> Result<JsValue, JsValue> {
        position_object(self.effect.borrow().position())
    }

    /// Re-measure the host on the next frame.
    pub fn refresh(&self) {
        self.effect.borrow_mut().resize();
    }

    pub fn unmount(&mut self) {
        let Some(listeners) = self.listeners.take() else {
            return;
        };
        listeners.detach();
        let mut effect = self.effect.borrow_mut();
        effect.unmount(&mut *self.capture.borrow_mut());
        effect.frames().clear_handlers();
        effect.surface().remove();
        self.on_position.borrow_mut().take();
    }
}

fn mount(host_id: &str, config: GlassConfig) -> anyhow::Result<Glass> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;
    let host: web::HtmlElement = document
        .get_element_by_id(host_id)
        .ok_or_else(|| anyhow::anyhow!("missing #{}", host_id))?
        .dyn_into::<web::HtmlElement>()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;

    let instance = format!("vaso{}", NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed));
    let surface = DomSurface::create(&document, host, &instance)?;
    let overlay = surface.overlay().clone();
    let capture = Rc::new(RefCell::new(ElementCapture::new(overlay.clone().into())));

    let frames = RafFrames::new(window.clone());
    let frame_slot = frames.frame_slot();
    let timer_slot = frames.timer_slot();

    let cache = FIELD_CACHE.with(Rc::clone);
    let effect = Rc::new(RefCell::new(GlassEffect::new(
        instance, config, surface, frames, cache,
    )));
    let on_position: PositionCallback = Rc::new(RefCell::new(None));

    {
        let effect_f = effect.clone();
        frame_slot.set_handler(move |token| {
            effect_f.borrow_mut().on_frame(token);
        });
    }
    {
        let effect_t = effect.clone();
        let on_position_t = on_position.clone();
        timer_slot.set_handler(move |token| {
            let settled = effect_t.borrow_mut().on_timer(token);
            let Some(position) = settled else {
                return;
            };
            let Some(callback) = on_position_t.borrow().clone() else {
                return;
            };
            match position_object(position) {
                Ok(arg) => {
                    if let Err(e) = callback.call1(&JsValue::NULL, &arg) {
                        log::error!("[web] onPositionChange threw: {:?}", e);
                    }
                }
                Err(e) => log::error!("[web] position object error: {:?}", e),
            }
        });
    }

    let listeners = events::wire_input_handlers(InputWiring {
        window,
        overlay,
        effect: effect.clone(),
        capture: capture.clone(),
    });

    effect.borrow_mut().mount();

    Ok(Glass {
        effect,
        capture,
        listeners: Some(listeners),
        on_position,
    })
}
