use crate::core::{parse_scene, rig_scene, AnimationSet, AppConfig, ENV_DIR, ENV_FACES, MODEL_DIR};
use crate::dom;
use crate::render::{EnvFaces, GpuState};
use crate::state::{AppState, LoadedScene};
use std::cell::RefCell;
use std::rc::Rc;

pub type SharedGpu = Rc<RefCell<Option<GpuState<'static>>>>;

/// Fetch, decode and rig the scene asset, upload it, then flip the loaded
/// flag. A missing required node aborts with an uncaught JS error; the
/// scene then never reports `meshLoaded`.
pub async fn load_scene(state: Rc<RefCell<AppState>>, gpu: SharedGpu) {
    let config = state.borrow().config.clone();
    let url = config.asset_url(&format!("{}{}", MODEL_DIR, config.model_file));
    log::info!("[loader] fetching {}", url);
    let bytes = match dom::fetch_bytes(&url).await {
        Ok(b) => b,
        Err(e) => {
            log::error!("[loader] {:#}", e);
            return;
        }
    };
    let mut asset = match parse_scene(&bytes) {
        Ok(a) => a,
        Err(e) => {
            log::error!("[loader] {}: {}", url, e);
            return;
        }
    };
    let rig = match rig_scene(&mut asset.graph) {
        Ok(r) => r,
        Err(e) => {
            log::error!("[loader] {}", e);
            wasm_bindgen::throw_str(&e.to_string());
        }
    };
    let animations = AnimationSet::from_clips(&asset.clips);
    log::info!(
        "[loader] nodes={} meshes={} clips={} mixers={} camera={}",
        asset.graph.len(),
        asset.meshes.len(),
        asset.clips.len(),
        animations.len(),
        rig.camera_node.is_some()
    );

    if let Some(g) = gpu.borrow_mut().as_mut() {
        g.upload_scene(&asset);
    }
    {
        let mut st = state.borrow_mut();
        st.scene = Some(LoadedScene {
            asset,
            rig,
            animations,
        });
        st.host.mark_loaded();
    }

    match load_environment(&config).await {
        Ok(faces) => {
            if let Some(g) = gpu.borrow_mut().as_mut() {
                g.set_environment(&faces);
            }
        }
        Err(e) => log::warn!("[loader] environment unavailable, keeping neutral: {:#}", e),
    }
}

async fn load_environment(config: &AppConfig) -> anyhow::Result<EnvFaces> {
    let mut encoded = Vec::with_capacity(ENV_FACES.len());
    for face in ENV_FACES {
        encoded.push(dom::fetch_bytes(&config.asset_url(&format!("{ENV_DIR}{face}"))).await?);
    }
    EnvFaces::decode(&encoded)
}
