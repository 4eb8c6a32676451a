use crate::WebEffect;
use glass_core::drag::{DragEvent, InputCapture, PointerId, PointerInput};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Pointer capture on a DOM element.
pub struct ElementCapture {
    element: web::Element,
}

impl ElementCapture {
    pub fn new(element: web::Element) -> Self {
        Self { element }
    }
}

impl InputCapture for ElementCapture {
    fn capture(&mut self, pointer_id: PointerId) -> bool {
        match self.element.set_pointer_capture(pointer_id) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("[input] pointer capture refused: {:?}", e);
                false
            }
        }
    }

    fn release(&mut self, pointer_id: PointerId) {
        let _ = self.element.release_pointer_capture(pointer_id);
    }

    fn has_capture(&self, pointer_id: PointerId) -> bool {
        self.element.has_pointer_capture(pointer_id)
    }
}

#[inline]
fn pointer_input(ev: &web::PointerEvent) -> PointerInput {
    PointerInput::new(ev.pointer_id(), ev.client_x() as f64, ev.client_y() as f64)
}

pub struct InputWiring {
    pub window: web::Window,
    pub overlay: web::HtmlElement,
    pub effect: Rc<RefCell<WebEffect>>,
    pub capture: Rc<RefCell<ElementCapture>>,
}

type PointerClosure = Closure<dyn FnMut(web::PointerEvent)>;

/// Listeners installed for one instance, kept so unmount can remove them.
pub struct Listeners {
    window: web::Window,
    overlay: web::HtmlElement,
    pointer: Vec<(&'static str, PointerClosure)>,
    resize: Closure<dyn FnMut()>,
}

impl Listeners {
    pub fn detach(self) {
        for (name, closure) in self.pointer.iter() {
            let _ = self
                .overlay
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        }
        let _ = self
            .window
            .remove_event_listener_with_callback("resize", self.resize.as_ref().unchecked_ref());
        log::debug!("[input] listeners detached");
    }
}

pub fn wire_input_handlers(w: InputWiring) -> Listeners {
    let mut pointer: Vec<(&'static str, PointerClosure)> = Vec::with_capacity(4);

    // pointerdown
    {
        let effect = w.effect.clone();
        let capture = w.capture.clone();
        let closure = Closure::wrap(Box::new(move |ev: web::PointerEvent| {
            let event = effect
                .borrow_mut()
                .pointer_down(pointer_input(&ev), &mut *capture.borrow_mut());
            if event == DragEvent::Started {
                ev.prevent_default();
            }
        }) as Box<dyn FnMut(_)>);
        pointer.push(("pointerdown", closure));
    }

    // pointermove
    {
        let effect = w.effect.clone();
        let closure = Closure::wrap(Box::new(move |ev: web::PointerEvent| {
            if let DragEvent::Moved(_) = effect.borrow_mut().pointer_move(pointer_input(&ev)) {
                ev.prevent_default();
            }
        }) as Box<dyn FnMut(_)>);
        pointer.push(("pointermove", closure));
    }

    // pointerup / pointercancel
    {
        let effect = w.effect.clone();
        let capture = w.capture.clone();
        let closure = Closure::wrap(Box::new(move |ev: web::PointerEvent| {
            effect
                .borrow_mut()
                .pointer_up(pointer_input(&ev), &mut *capture.borrow_mut());
        }) as Box<dyn FnMut(_)>);
        pointer.push(("pointerup", closure));
    }
    {
        let effect = w.effect.clone();
        let capture = w.capture.clone();
        let closure = Closure::wrap(Box::new(move |ev: web::PointerEvent| {
            effect
                .borrow_mut()
                .pointer_cancel(pointer_input(&ev), &mut *capture.borrow_mut());
        }) as Box<dyn FnMut(_)>);
        pointer.push(("pointercancel", closure));
    }

    for (name, closure) in pointer.iter() {
        let _ = w
            .overlay
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
    }

    // Layout of the host may change with the viewport
    let resize = {
        let effect = w.effect.clone();
        Closure::wrap(Box::new(move || {
            effect.borrow_mut().resize();
        }) as Box<dyn FnMut()>)
    };
    let _ = w
        .window
        .add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref());

    Listeners {
        window: w.window,
        overlay: w.overlay,
        pointer,
        resize,
    }
}
