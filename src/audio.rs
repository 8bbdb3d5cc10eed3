use crate::core::{AppConfig, STRING_SOUNDS};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

/// One preloaded audio element per guitar string.
pub struct StringSounds {
    players: Vec<Option<web::HtmlAudioElement>>,
}

impl StringSounds {
    pub fn load(config: &AppConfig) -> Self {
        let players = STRING_SOUNDS
            .iter()
            .enumerate()
            .map(|(i, file)| {
                let url = config.asset_url(file);
                match web::HtmlAudioElement::new_with_src(&url) {
                    Ok(el) => {
                        el.set_preload("auto");
                        Some(el)
                    }
                    Err(e) => {
                        log::warn!("[audio] string {} ({}) unavailable: {:?}", i, url, e);
                        None
                    }
                }
            })
            .collect();
        Self { players }
    }

    /// Play the sound for `index` on a fresh copy of the preloaded element so
    /// repeated strums overlap. A missing sound or a rejected play request is
    /// logged and otherwise ignored.
    pub fn play(&self, index: usize) {
        let Some(Some(preloaded)) = self.players.get(index) else {
            log::warn!("[audio] no sound for string {}", index);
            return;
        };
        let el = match preloaded
            .clone_node()
            .map_err(|e| format!("{:?}", e))
            .and_then(|n| {
                n.dyn_into::<web::HtmlAudioElement>()
                    .map_err(|_| "clone is not an audio element".to_string())
            }) {
            Ok(el) => el,
            Err(e) => {
                log::warn!("[audio] string {} clone failed: {}", index, e);
                return;
            }
        };
        match el.play() {
            Ok(promise) => {
                let on_reject = Closure::once(move |err: JsValue| {
                    log::warn!("[audio] string {} playback rejected: {:?}", index, err);
                });
                _ = promise.catch(&on_reject);
                on_reject.forget();
            }
            Err(e) => log::warn!("[audio] string {} play error: {:?}", index, e),
        }
        log::debug!("[audio] string {}", index);
    }
}
