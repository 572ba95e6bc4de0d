use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use std::future::Future;
use wasm_bindgen::closure::{Closure, WasmClosure, WasmClosureFnOnce};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[rustfmt::skip]
use web_sys::{
    Document,
    Window,
    CanvasRenderingContext2d,
    HtmlAudioElement,
    HtmlCanvasElement,
    HtmlImageElement,
    Response,
};

use crate::engine::Size;

// ==================== Logging ====================
// console output on wasm32, stdout/stderr on the host so the simulation can
// be exercised by plain `cargo test`
macro_rules! log {
    ($($t:tt)*) => {
        $crate::browser::log_str(&format!($($t)*))
    }
}

macro_rules! error {
    ($($t:tt)*) => {
        $crate::browser::error_str(&format!($($t)*))
    }
}

pub fn log_str(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    println!("{}", message);
}

pub fn error_str(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("{}", message);
}

// ==================== Constants ====================
// Constants related to HTML elements
mod html {
    pub const CANVAS_ID: &str = "canvas";
    pub const CONTEXT_2D: &str = "2d";
}

pub type LoopClosure = Closure<dyn FnMut(f64)>;

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn canvas() -> Result<HtmlCanvasElement> {
    document()?
        .get_element_by_id(html::CANVAS_ID)
        .ok_or_else(|| anyhow!("No Canvas Element found with ID : '{:#?}'", html::CANVAS_ID))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))
}

pub fn context() -> Result<CanvasRenderingContext2d> {
    canvas()?
        .get_context(html::CONTEXT_2D)
        // Result<Option<Object>, JsValue> : JsValue error -> anyhow, None -> anyhow
        .map_err(|js_value| anyhow!("Error getting context : {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })
}

/// Stretch the canvas over the whole window and report the resulting
/// viewport, the simulation is laid out against this size
pub fn fit_canvas_to_window() -> Result<Size> {
    let window = window()?;
    let width = window
        .inner_width()
        .map_err(|err| anyhow!("Could not read window width : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("Window width is not a number"))?;
    let height = window
        .inner_height()
        .map_err(|err| anyhow!("Could not read window height : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("Window height is not a number"))?;

    let canvas = canvas()?;
    canvas.set_width(width as u32);
    canvas.set_height(height as u32);

    Ok(Size {
        width: width as f32,
        height: height as f32,
    })
}

pub fn new_image() -> Result<HtmlImageElement> {
    HtmlImageElement::new().map_err(|err| anyhow!("Could not create image element : {:#?}", err))
}

pub fn new_audio(source: &str) -> Result<HtmlAudioElement> {
    HtmlAudioElement::new_with_src(source)
        .map_err(|err| anyhow!("Could not create audio element for {} : {:#?}", source, err))
}

pub fn closure_once<F, M, A, R>(f: F) -> Closure<M>
where
    M: ?Sized + WasmClosure,
    F: 'static + WasmClosureFnOnce<M, A, R>,
{
    Closure::once(f)
}

pub fn closure_wrap<T: WasmClosure + ?Sized>(data: Box<T>) -> Closure<T> {
    Closure::wrap(data)
}

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    closure_wrap(Box::new(f))
}

pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame {:#?}", err))
}

pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

pub async fn fetch_json<T>(json_path: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let resp_value = fetch_with_str(json_path).await?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|element| anyhow!("error converting [{:#?}] to Response", element))?;
    if !resp.ok() {
        return Err(anyhow!(
            "fetching [{}] answered with status {}",
            json_path,
            resp.status()
        ));
    }
    let json = resp
        .json()
        .map_err(|err| anyhow!("Could not get JSON from response [{:#?}]", err))?;

    let json_value = JsFuture::from(json)
        .await
        .map_err(|err| anyhow!("error fetching [{:#?}]", err))?;

    serde_wasm_bindgen::from_value(json_value)
        .map_err(|err| anyhow!("error converting response : {:#?}", err))
}

async fn fetch_with_str(resource: &str) -> Result<JsValue> {
    let resp = window()?.fetch_with_str(resource);

    JsFuture::from(resp)
        .await
        .map_err(|err| anyhow!("error fetching : {:#?}", err))
}

/// DOM screens around the canvas : start page, game over page, score line
pub mod ui {
    use super::document;
    use anyhow::{anyhow, Result};
    use wasm_bindgen::JsCast;
    use web_sys::HtmlElement;

    pub const START_PAGE: &str = "start-page";
    pub const GAME_OVER_PAGE: &str = "game-over-page";
    pub const SCORE: &str = "score";
    pub const FINAL_SCORE: &str = "final-score";

    fn element(id: &str) -> Result<HtmlElement> {
        document()?
            .get_element_by_id(id)
            .ok_or_else(|| anyhow!("No element found with ID : '{}'", id))?
            .dyn_into::<HtmlElement>()
            .map_err(|element| anyhow!("Error converting {:#?} to HtmlElement", element))
    }

    fn set_display(id: &str, value: &str) -> Result<()> {
        element(id)?
            .style()
            .set_property("display", value)
            .map_err(|err| anyhow!("Could not set display of '{}' : {:#?}", id, err))
    }

    pub fn show(id: &str) -> Result<()> {
        set_display(id, "flex")
    }

    pub fn hide(id: &str) -> Result<()> {
        set_display(id, "none")
    }

    pub fn set_text(id: &str, text: &str) -> Result<()> {
        element(id)?.set_inner_text(text);
        Ok(())
    }

    pub fn is_hidden(id: &str) -> Result<bool> {
        let display = element(id)?
            .style()
            .get_property_value("display")
            .map_err(|err| anyhow!("Could not read display of '{}' : {:#?}", id, err))?;
        Ok(display == "none")
    }
}
