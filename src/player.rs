use crate::core::{HostValue, Player};
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

/// Adapter over the hosting page's player object, obtained from
/// `window.parent.GetPlayer()`.
pub struct StorylinePlayer {
    player: JsValue,
    get_var: js_sys::Function,
    set_var: js_sys::Function,
}

impl StorylinePlayer {
    /// Look the player up on the parent frame. Fails when the page is not
    /// embedded in a host that exposes `GetPlayer`.
    pub fn from_parent() -> anyhow::Result<Self> {
        let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
        let parent = window
            .parent()
            .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?
            .ok_or_else(|| anyhow::anyhow!("no parent window"))?;
        let get_player = method(&parent, "GetPlayer")?;
        let player = get_player
            .call0(&parent)
            .map_err(|e| anyhow::anyhow!(format!("GetPlayer threw: {:?}", e)))?;
        if player.is_undefined() || player.is_null() {
            anyhow::bail!("GetPlayer returned no player");
        }
        Ok(Self {
            get_var: method(&player, "GetVar")?,
            set_var: method(&player, "SetVar")?,
            player,
        })
    }
}

fn method(target: &JsValue, name: &str) -> anyhow::Result<js_sys::Function> {
    js_sys::Reflect::get(target, &JsValue::from_str(name))
        .map_err(|e| anyhow::anyhow!(format!("{name}: {:?}", e)))?
        .dyn_into::<js_sys::Function>()
        .map_err(|_| anyhow::anyhow!("{name} is not a function"))
}

impl Player for StorylinePlayer {
    fn get_var(&self, name: &str) -> Option<HostValue> {
        let value = match self.get_var.call1(&self.player, &JsValue::from_str(name)) {
            Ok(v) => v,
            Err(e) => {
                log::trace!("[host] GetVar({name}) threw: {:?}", e);
                return None;
            }
        };
        if let Some(b) = value.as_bool() {
            Some(HostValue::Bool(b))
        } else if let Some(n) = value.as_f64() {
            Some(HostValue::Number(n))
        } else if value.is_undefined() || value.is_null() {
            None
        } else {
            Some(HostValue::Bool(value.is_truthy()))
        }
    }

    fn set_var(&self, name: &str, value: HostValue) {
        let js = match value {
            HostValue::Bool(b) => JsValue::from_bool(b),
            HostValue::Number(n) => JsValue::from_f64(n),
        };
        if let Err(e) = self
            .set_var
            .call2(&self.player, &JsValue::from_str(name), &js)
        {
            log::trace!("[host] SetVar({name}) threw: {:?}", e);
        }
    }
}
