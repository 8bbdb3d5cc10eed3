#![cfg(target_arch = "wasm32")]
use crate::core::{AppConfig, HostBridge};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod audio;
mod core;
mod dom;
mod events;
mod frame;
mod loader;
mod player;
mod render;
mod state;

fn read_config() -> AppConfig {
    web::window()
        .and_then(|w| w.location().search().ok())
        .map(|q| AppConfig::from_query(&q))
        .unwrap_or_default()
}

fn connect_host(config: &AppConfig) -> HostBridge {
    if config.testing {
        log::info!("[host] testing mode, host variables disabled");
        return HostBridge::standalone();
    }
    match player::StorylinePlayer::from_parent() {
        Ok(p) => {
            log::info!("[host] connected to player");
            HostBridge::new(Box::new(p))
        }
        Err(e) => {
            log::warn!("[host] no player ({:#}), running standalone", e);
            HostBridge::standalone()
        }
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let config = read_config();
    console_log::init_with_level(config.log_level).ok();
    log::info!("street-scroll starting {:?}", config);

    spawn_local(async move {
        if let Err(e) = init(config).await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init(config: AppConfig) -> anyhow::Result<()> {
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let canvas = dom::scene_canvas(&document)?;

    // Maintain canvas internal pixel size to match CSS size * devicePixelRatio
    dom::wire_canvas_resize(&canvas);

    let host = connect_host(&config);
    let sounds = Rc::new(audio::StringSounds::load(&config));
    let state = Rc::new(RefCell::new(state::AppState::new(config, host)));

    events::wire_global_keydown(state.clone());
    events::wire_input_handlers(events::InputWiring {
        canvas: canvas.clone(),
        state: state.clone(),
        sounds,
        pointer: Rc::new(RefCell::new(events::pointer::PointerState::default())),
    });

    let gpu: loader::SharedGpu = Rc::new(RefCell::new(frame::init_gpu(&canvas).await));
    spawn_local(loader::load_scene(state.clone(), gpu.clone()));

    let frame_ctx = Rc::new(RefCell::new(frame::FrameContext::new(state, gpu, canvas)));
    frame::start_loop(frame_ctx);
    Ok(())
}
