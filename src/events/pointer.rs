use crate::audio::StringSounds;
use crate::core::{wheel_delta_pixels, CLICK_SLOP_PX};
use crate::state::AppState;
use glam::Vec2;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

#[derive(Default, Clone, Copy)]
pub struct PointerState {
    pub down: bool,
    pub last: Vec2,
    pub travel: f32,
}

#[derive(Clone)]
pub struct InputWiring {
    pub canvas: web::HtmlCanvasElement,
    pub state: Rc<RefCell<AppState>>,
    pub sounds: Rc<StringSounds>,
    pub pointer: Rc<RefCell<PointerState>>,
}

pub fn wire_input_handlers(w: InputWiring) {
    wire_wheel(&w);
    wire_pointerdown(&w);
    wire_pointermove(&w);
    wire_pointerup(&w);
}

/// Pointer position in canvas backing pixels.
#[inline]
pub fn pointer_canvas_px(ev: &web::MouseEvent, canvas: &web::HtmlCanvasElement) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    let x_css = ev.client_x() as f32 - rect.left() as f32;
    let y_css = ev.client_y() as f32 - rect.top() as f32;
    let w = (rect.width() as f32).max(1.0);
    let h = (rect.height() as f32).max(1.0);
    Vec2::new(
        x_css / w * canvas.width() as f32,
        y_css / h * canvas.height() as f32,
    )
}

fn wire_wheel(w: &InputWiring) {
    let w = w.clone();
    let closure = Closure::wrap(Box::new(move |ev: web::WheelEvent| {
        let page = w.canvas.client_height().max(1) as f32;
        let delta = wheel_delta_pixels(ev.delta_y(), ev.delta_mode(), page);
        w.state.borrow_mut().on_wheel(delta);
    }) as Box<dyn FnMut(_)>);
    if let Some(document) = crate::dom::window_document() {
        _ = document.add_event_listener_with_callback("wheel", closure.as_ref().unchecked_ref());
    }
    closure.forget();
}

fn wire_pointerdown(w: &InputWiring) {
    let w = w.clone();
    let closure = Closure::wrap(Box::new(move |ev: web::PointerEvent| {
        let pos = pointer_canvas_px(&ev, &w.canvas);
        *w.pointer.borrow_mut() = PointerState {
            down: true,
            last: pos,
            travel: 0.0,
        };
        _ = w.canvas.set_pointer_capture(ev.pointer_id());
    }) as Box<dyn FnMut(_)>);
    _ = w
        .canvas
        .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn wire_pointermove(w: &InputWiring) {
    let w = w.clone();
    let closure = Closure::wrap(Box::new(move |ev: web::PointerEvent| {
        let pos = pointer_canvas_px(&ev, &w.canvas);
        let delta = {
            let mut p = w.pointer.borrow_mut();
            if !p.down {
                return;
            }
            let delta = pos - p.last;
            p.last = pos;
            p.travel += delta.length();
            delta
        };
        let height = w.canvas.height() as f32;
        w.state.borrow_mut().on_drag(delta.x, delta.y, height);
    }) as Box<dyn FnMut(_)>);
    _ = w
        .canvas
        .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn wire_pointerup(w: &InputWiring) {
    let w = w.clone();
    let closure = Closure::wrap(Box::new(move |ev: web::PointerEvent| {
        let was_click = {
            let mut p = w.pointer.borrow_mut();
            let click = p.down && p.travel <= CLICK_SLOP_PX;
            p.down = false;
            click
        };
        _ = w.canvas.release_pointer_capture(ev.pointer_id());
        if !was_click {
            return;
        }
        let pos = pointer_canvas_px(&ev, &w.canvas);
        let hit = w.state.borrow().pick_string(
            pos,
            w.canvas.width() as f32,
            w.canvas.height() as f32,
        );
        if let Some(index) = hit {
            w.sounds.play(index);
        }
    }) as Box<dyn FnMut(_)>);
    _ = w
        .canvas
        .add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref());
    closure.forget();
}
