use glass_core::constants::FALLBACK_FRAME_MS;
use glass_core::{FrameSource, FrameToken};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mechanism {
    AnimationFrame,
    Timeout,
}

type Callback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;
type Pending = Rc<Cell<Option<(FrameToken, i32, Mechanism)>>>;

/// One browser callback plus the request it is currently armed for.
///
/// The engine keeps at most one frame and one timer in flight, so a single
/// pending cell per slot is enough.
#[derive(Clone, Default)]
pub struct CallbackSlot {
    callback: Callback,
    pending: Pending,
}

impl CallbackSlot {
    /// Install the handler that receives the fired token.
    pub fn set_handler(&self, mut handler: impl FnMut(FrameToken) + 'static) {
        let pending = self.pending.clone();
        *self.callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            if let Some((token, _, _)) = pending.take() {
                handler(token);
            }
        }) as Box<dyn FnMut()>));
    }

    /// Drop the handler. Breaks the reference cycle back to the effect.
    pub fn clear(&self) {
        self.pending.set(None);
        self.callback.borrow_mut().take();
    }
}

/// `FrameSource` backed by `requestAnimationFrame`, falling back to a
/// fixed-interval `setTimeout` when the window has no frame callback.
pub struct RafFrames {
    window: web::Window,
    frame: CallbackSlot,
    timer: CallbackSlot,
    has_raf: bool,
    next: u64,
}

impl RafFrames {
    pub fn new(window: web::Window) -> Self {
        let has_raf = js_sys::Reflect::has(&window, &JsValue::from_str("requestAnimationFrame"))
            .unwrap_or(false);
        if !has_raf {
            log::warn!(
                "[frame] requestAnimationFrame unavailable; ticking every {}ms",
                FALLBACK_FRAME_MS
            );
        }
        Self {
            window,
            frame: CallbackSlot::default(),
            timer: CallbackSlot::default(),
            has_raf,
            next: 0,
        }
    }

    pub fn frame_slot(&self) -> CallbackSlot {
        self.frame.clone()
    }

    pub fn timer_slot(&self) -> CallbackSlot {
        self.timer.clone()
    }

    pub fn clear_handlers(&self) {
        self.frame.clear();
        self.timer.clear();
    }

    fn next_token(&mut self) -> FrameToken {
        self.next += 1;
        FrameToken(self.next)
    }

    fn arm(&self, slot: &CallbackSlot, token: FrameToken, delay: Option<i32>) {
        let callback = slot.callback.borrow();
        let Some(closure) = callback.as_ref() else {
            log::warn!("[frame] no handler installed; request {:?} dropped", token);
            return;
        };
        let func: &js_sys::Function = closure.as_ref().unchecked_ref();
        let armed = match delay {
            None if self.has_raf => self
                .window
                .request_animation_frame(func)
                .map(|id| (id, Mechanism::AnimationFrame)),
            None => self
                .window
                .set_timeout_with_callback_and_timeout_and_arguments_0(func, FALLBACK_FRAME_MS as i32)
                .map(|id| (id, Mechanism::Timeout)),
            Some(ms) => self
                .window
                .set_timeout_with_callback_and_timeout_and_arguments_0(func, ms)
                .map(|id| (id, Mechanism::Timeout)),
        };
        match armed {
            Ok((id, mechanism)) => slot.pending.set(Some((token, id, mechanism))),
            Err(e) => log::error!("[frame] scheduling failed: {:?}", e),
        }
    }

    fn disarm(&self, slot: &CallbackSlot, token: FrameToken) {
        let Some((pending, id, mechanism)) = slot.pending.get() else {
            return;
        };
        if pending != token {
            return;
        }
        match mechanism {
            Mechanism::AnimationFrame => {
                let _ = self.window.cancel_animation_frame(id);
            }
            Mechanism::Timeout => self.window.clear_timeout_with_handle(id),
        }
        slot.pending.set(None);
    }
}

impl FrameSource for RafFrames {
    fn request_frame(&mut self) -> FrameToken {
        let token = self.next_token();
        self.arm(&self.frame, token, None);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.disarm(&self.frame, token);
    }

    fn request_timer(&mut self, delay: Duration) -> FrameToken {
        let token = self.next_token();
        let ms = delay.as_millis().min(i32::MAX as u128) as i32;
        self.arm(&self.timer, token, Some(ms));
        token
    }

    fn cancel_timer(&mut self, token: FrameToken) {
        self.disarm(&self.timer, token);
    }
}
