use crate::core::scene::SceneGraph;
use crate::core::{Camera, PlaybackMode};
use crate::loader::SharedGpu;
use crate::render::{self, Lighting, SpotPose};
use crate::state::AppState;
use instant::Instant;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct FrameContext {
    pub state: Rc<RefCell<AppState>>,
    pub gpu: SharedGpu,
    pub canvas: web::HtmlCanvasElement,
    pub started: Instant,
    pub last_instant: Instant,
    pub empty_graph: SceneGraph,
}

impl FrameContext {
    pub fn new(state: Rc<RefCell<AppState>>, gpu: SharedGpu, canvas: web::HtmlCanvasElement) -> Self {
        let now = Instant::now();
        Self {
            state,
            gpu,
            canvas,
            started: now,
            last_instant: now,
            empty_graph: SceneGraph::new(),
        }
    }

    pub fn frame(&mut self) {
        let now = Instant::now();
        let dt_sec = (now - self.last_instant).as_secs_f32();
        self.last_instant = now;
        let elapsed_sec = (now - self.started).as_secs_f32();

        let width = self.canvas.width().max(1);
        let height = self.canvas.height().max(1);
        let aspect = width as f32 / height as f32;

        let mut guard = self.state.borrow_mut();
        let st = &mut *guard;

        // Timeline, animation, choreography and host traffic wait for the load.
        if let Some(scene) = st.scene.as_mut() {
            let flags = st.host.poll_flags();
            let mode = st.timeline.mode(flags.auto_animate);
            let anim_num = st.timeline.step(mode, dt_sec);
            if mode != PlaybackMode::DebugOrbit {
                scene.animations.scrub(anim_num);
            }
            scene.animations.apply(&mut scene.asset.graph);
            scene.asset.graph.update_world();

            let progress = st.choreography.evaluate(anim_num, elapsed_sec);
            st.host.publish_progress(&progress);
        }

        let mut camera = match st.scene.as_ref().and_then(|s| {
            let node = s.asset.graph.get(s.rig.camera_node?)?;
            Some(Camera::from_node(node.world, node.camera.as_ref()?, aspect))
        }) {
            Some(c) => c,
            None => Camera {
                aspect,
                ..Camera::default()
            },
        };
        if let Some(orbit) = st.orbit.as_mut() {
            camera.eye = orbit.update(dt_sec);
            camera.target = orbit.center;
            camera.up = glam::Vec3::Y;
            camera.world = None;
        }
        st.camera = camera.clone();

        let mut gpu_ref = self.gpu.borrow_mut();
        let Some(gpu) = gpu_ref.as_mut() else {
            return;
        };
        gpu.resize_if_needed(width, height);

        let mut lighting = Lighting {
            fog: st.choreography.fog,
            dynamic: st.choreography.light,
            spots: Vec::new(),
        };
        let (graph, skins) = match st.scene.as_ref() {
            Some(scene) => {
                lighting.spots = spot_poses(scene);
                (&scene.asset.graph, scene.asset.skins.as_slice())
            }
            None => (&self.empty_graph, &[][..]),
        };
        if let Err(e) = gpu.render(&camera, graph, skins, &lighting) {
            log::error!("[gpu] render error: {:?}", e);
        }
    }
}

fn spot_poses(scene: &crate::state::LoadedScene) -> Vec<SpotPose> {
    scene
        .rig
        .spots
        .iter()
        .filter_map(|spot| {
            let (position, direction) = spot.pose(&scene.asset.graph)?;
            Some(SpotPose {
                position,
                direction,
                color: spot.color,
                intensity: spot.intensity,
                distance: spot.distance,
                angle: spot.angle,
                penumbra: spot.penumbra,
                decay: spot.decay,
            })
        })
        .collect()
}

pub async fn init_gpu(canvas: &web::HtmlCanvasElement) -> Option<render::GpuState<'static>> {
    // leak a canvas clone to satisfy 'static lifetime for surface
    let leaked_canvas = Box::leak(Box::new(canvas.clone()));
    match render::GpuState::new(leaked_canvas).await {
        Ok(g) => Some(g),
        Err(e) => {
            log::error!("[gpu] WebGPU init error: {:?}", e);
            None
        }
    }
}

pub fn start_loop(frame_ctx: Rc<RefCell<FrameContext>>) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        frame_ctx.borrow_mut().frame();
        if let (Some(w), Some(cb)) = (web::window(), tick_clone.borrow().as_ref()) {
            _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut()>));
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}
