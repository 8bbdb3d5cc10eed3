use crate::state::AppState;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn is_debug_orbit_key(key: &str) -> bool {
    matches!(key, "f" | "F")
}

pub fn handle_global_keydown(ev: &web::KeyboardEvent, state: &Rc<RefCell<AppState>>) {
    if ev.repeat() {
        return;
    }
    if is_debug_orbit_key(&ev.key()) {
        state.borrow_mut().toggle_debug_orbit();
    }
}

pub fn wire_global_keydown(state: Rc<RefCell<AppState>>) {
    if let Some(window) = web::window() {
        let closure = wasm_bindgen::closure::Closure::wrap(Box::new(move |ev: web::KeyboardEvent| {
            handle_global_keydown(&ev, &state);
        }) as Box<dyn FnMut(_)>);
        _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}
