// ==================== Imports ====================
use wasm_bindgen::prelude::*;

// macros must be declared before the modules that use them
#[macro_use]
pub mod browser;
pub mod archer;
pub mod collision;
pub mod config;
pub mod enemy;
pub mod engine;
pub mod game;
pub mod scroll;
pub mod sprite;

use engine::GameLoop;
use game::KnightRun;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - installs the panic hook
/// - hands the game to the loop, which loads assets then starts drawing
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    // spawns a new asynchronous task in local thread, for web assembly
    // environment, using wasm_bindgen_futures
    browser::spawn_local(async move {
        if let Err(err) = GameLoop::start(KnightRun::new()).await {
            error!("Could not start game : {:#}", err);
        }
    });

    Ok(())
}
