use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

pub const CANVAS_ID: &str = "scene-canvas";

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// The page canvas, created and appended to `<body>` when the page has none.
pub fn scene_canvas(document: &web::Document) -> anyhow::Result<web::HtmlCanvasElement> {
    if let Some(el) = document.get_element_by_id(CANVAS_ID) {
        return el
            .dyn_into::<web::HtmlCanvasElement>()
            .map_err(|e| anyhow::anyhow!(format!("#{CANVAS_ID} is not a canvas: {:?}", e)));
    }
    let canvas: web::HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?
        .dyn_into()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
    canvas.set_id(CANVAS_ID);
    let style = canvas.style();
    _ = style.set_property("width", "100%");
    _ = style.set_property("height", "100%");
    _ = style.set_property("display", "block");
    let body = document
        .body()
        .ok_or_else(|| anyhow::anyhow!("no body"))?;
    body.append_child(&canvas)
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
    Ok(canvas)
}

pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) {
    if let Some(w) = web::window() {
        let dpr = w.device_pixel_ratio();
        let rect = canvas.get_bounding_client_rect();
        let w_px = (rect.width() * dpr) as u32;
        let h_px = (rect.height() * dpr) as u32;
        canvas.set_width(w_px.max(1));
        canvas.set_height(h_px.max(1));
    }
}

pub fn wire_canvas_resize(canvas: &web::HtmlCanvasElement) {
    sync_canvas_backing_size(canvas);
    let canvas_resize = canvas.clone();
    let resize_closure = Closure::wrap(Box::new(move || {
        sync_canvas_backing_size(&canvas_resize);
    }) as Box<dyn FnMut()>);
    if let Some(window) = web::window() {
        _ = window
            .add_event_listener_with_callback("resize", resize_closure.as_ref().unchecked_ref());
    }
    resize_closure.forget();
}

/// GET a URL and return the body bytes. Non-2xx responses are errors.
pub async fn fetch_bytes(url: &str) -> anyhow::Result<Vec<u8>> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let resp_value = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| anyhow::anyhow!(format!("fetch {url}: {:?}", e)))?;
    let resp: web::Response = resp_value
        .dyn_into()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
    if !resp.ok() {
        anyhow::bail!("fetch {url}: HTTP {}", resp.status());
    }
    let buffer = resp
        .array_buffer()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
    let buffer = JsFuture::from(buffer)
        .await
        .map_err(|e| anyhow::anyhow!(format!("read {url}: {:?}", e)))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}
