use crate::browser;
use crate::sprite::SheetId;
use anyhow::{anyhow, Error, Result};
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedReceiver};
use futures::channel::oneshot::channel;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref (unsafe) cast from Javascript type to Rust type
    // - because we control the closure creation and specify the expected type,
    // in principle this should be generally safe (unsafe) code
    JsCast,
    JsValue,
};
use web_sys::{CanvasRenderingContext2d, HtmlAudioElement, HtmlImageElement};

pub use self::input::KeyState;

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn update(&mut self, keystate: &KeyState);
    fn draw(&mut self, renderer: &Renderer);
    /// the canvas was refitted to the window
    fn resize(&mut self, viewport: Size);
}

/// length of a simulation step in milliseconds
pub const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    /// Fixed timestep driver
    /// - every animation frame adds the elapsed time to the accumulator
    /// - the game is stepped once per FRAME_SIZE in the accumulator
    /// - draw runs once per animation frame, after all pending steps
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut keyevent_receiver = input::prepare_input()?;
        let mut resize_receiver = prepare_resize()?;
        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };
        let renderer = Renderer {
            context: browser::context()?,
        };
        let mut keystate = KeyState::new();

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            input::process_input(&mut keystate, &mut keyevent_receiver);
            if let Some(viewport) = latest_size(&mut resize_receiver) {
                game.resize(viewport);
            }

            game_loop.accumulated_delta += (perf - game_loop.last_frame) as f32;
            game_loop.catch_up(game.as_mut(), &mut keystate);
            game_loop.last_frame = perf;
            game.draw(&renderer);

            if let Some(closure) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(closure) {
                    error!("GameLoop: {:#}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }

    /// Run every whole step the accumulator holds. A press is new for
    /// exactly one step, even when a frame catches up on several
    fn catch_up(&mut self, game: &mut dyn Game, keystate: &mut KeyState) {
        while self.accumulated_delta > FRAME_SIZE {
            game.update(keystate);
            self.accumulated_delta -= FRAME_SIZE;
            keystate.end_step();
        }
    }
}

/// Refit the canvas whenever the window changes size and queue the new
/// viewport for the loop
fn prepare_resize() -> Result<UnboundedReceiver<Size>> {
    let (sender, receiver) = unbounded();
    let onresize = browser::closure_wrap(Box::new(move || match browser::fit_canvas_to_window() {
        Ok(viewport) => {
            let _ = sender.unbounded_send(viewport);
        }
        Err(err) => error!("Could not resize canvas : {:#}", err),
    }) as Box<dyn FnMut()>);

    browser::window()?.set_onresize(Some(onresize.as_ref().unchecked_ref()));
    onresize.forget();

    Ok(receiver)
}

// a drag resize fires many events per frame, only the last one matters
fn latest_size(receiver: &mut UnboundedReceiver<Size>) -> Option<Size> {
    let mut latest = None;
    while let Ok(viewport) = receiver.try_recv() {
        latest = Some(viewport);
    }
    latest
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    pub const fn new_from_x_y(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect::new(Point { x, y }, Size { width, height })
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    pub fn right(&self) -> f32 {
        self.x() + self.width()
    }

    pub fn bottom(&self) -> f32 {
        self.y() + self.height()
    }

    /// Strict AABB overlap, touching edges do not count
    pub fn intersects(&self, rect: &Rect) -> bool {
        self.x() < rect.right()
            && self.right() > rect.x()
            && self.y() < rect.bottom()
            && self.bottom() > rect.y()
    }
}

/// Everything the simulation draws goes through this seam, sprites are named
/// by sheet so the world never touches an image element
pub trait Surface {
    fn clear(&self, rect: &Rect);
    /// draw the `frame` sub rectangle of a sheet into `destination`
    fn draw_frame(&self, sheet: SheetId, frame: &Rect, destination: &Rect);
    /// draw a whole image scaled into `destination`
    fn draw_image(&self, sheet: SheetId, destination: &Rect);
    fn stroke_rect(&self, rect: &Rect, color: &str);
}

#[cfg(debug_assertions)]
pub trait DebugDraw {
    fn draw_debug(&self, surface: &dyn Surface);
}

#[cfg(debug_assertions)]
impl DebugDraw for Rect {
    fn draw_debug(&self, surface: &dyn Surface) {
        surface.stroke_rect(self, "#FF0000");
    }
}

pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn clear(&self, rect: &Rect) {
        self.context.clear_rect(
            rect.x().into(),
            rect.y().into(),
            rect.width().into(),
            rect.height().into(),
        );
    }

    pub fn draw_image(&self, image: &HtmlImageElement, frame: &Rect, destination: &Rect) {
        if let Err(err) = self
            .context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image,
                frame.x().into(),
                frame.y().into(),
                frame.width().into(),
                frame.height().into(),
                destination.x().into(),
                destination.y().into(),
                destination.width().into(),
                destination.height().into(),
            )
        {
            error!("Could not draw sprite frame : {:#?}", err);
        }
    }

    pub fn draw_entire_image(&self, image: &HtmlImageElement, destination: &Rect) {
        if let Err(err) = self.context.draw_image_with_html_image_element_and_dw_and_dh(
            image,
            destination.x().into(),
            destination.y().into(),
            destination.width().into(),
            destination.height().into(),
        ) {
            error!("Could not draw image : {:#?}", err);
        }
    }

    pub fn stroke_rect(&self, rect: &Rect, color: &str) {
        self.context.set_stroke_style_str(color);
        self.context.stroke_rect(
            rect.x().into(),
            rect.y().into(),
            rect.width().into(),
            rect.height().into(),
        );
    }
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let source_name = source.to_string();
    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine.rs::load_image] Error loading image {} : {:#?}",
                source_name,
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callback alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // ?? - Result<Result<(), Error>, oneshot::Canceled>
    // - first ? yields channel result : Result<(), Error>
    // - second ? yields image load result : () or propagating Error
    rx.await??;

    Ok(image)
}

/// Same handshake as `load_image`, resolved by the audio `loadeddata` event
pub async fn load_audio(source: &str) -> Result<Sound> {
    let element = browser::new_audio(source)?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let source_name = source.to_string();
    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine.rs::load_audio] Error loading sound {} : {:#?}",
                source_name,
                err
            )));
        }
    });

    element.set_onloadeddata(Some(success_callback.as_ref().unchecked_ref()));
    element.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    element.load();

    success_callback.forget();
    error_callback.forget();

    rx.await??;

    Ok(Sound { element })
}

pub struct Sound {
    element: HtmlAudioElement,
}

impl Sound {
    pub fn set_volume(&self, volume: f64) {
        self.element.set_volume(volume);
    }

    /// Rewind and play, used for one shot cues
    pub fn play(&self) -> Result<()> {
        self.element.set_loop(false);
        self.element.set_current_time(0.0);
        self.element
            .play()
            .map(|_| ())
            .map_err(|err| anyhow!("Could not play sound : {:#?}", err))
    }

    /// Play on a loop, does nothing when already playing
    pub fn play_looping(&self) -> Result<()> {
        if !self.element.paused() {
            return Ok(());
        }
        self.element.set_loop(true);
        self.element
            .play()
            .map(|_| ())
            .map_err(|err| anyhow!("Could not play looping sound : {:#?}", err))
    }

    pub fn stop(&self) -> Result<()> {
        self.element
            .pause()
            .map_err(|err| anyhow!("Could not pause sound : {:#?}", err))?;
        self.element.set_current_time(0.0);
        Ok(())
    }
}

pub mod input {
    use crate::browser;
    use anyhow::Result;
    use futures::channel::mpsc::{unbounded, UnboundedReceiver};
    use std::collections::HashSet;
    use wasm_bindgen::JsCast;
    use web_sys::KeyboardEvent;

    pub const LEFT: &str = "ArrowLeft";
    pub const RIGHT: &str = "ArrowRight";
    pub const JUMP: &str = "ArrowUp";
    pub const ATTACK: &str = "Space";
    pub const START: &str = "Enter";

    // keys whose browser default (page scrolling) gets in the way of play
    const CAPTURED: [&str; 4] = [LEFT, RIGHT, JUMP, ATTACK];

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum KeyPress {
        KeyDown(String),
        KeyUp(String),
    }

    /// Held keys plus the keys that went down since the last simulation
    /// step, keyed by `KeyboardEvent.code`
    #[derive(Debug, Default)]
    pub struct KeyState {
        held: HashSet<String>,
        just_pressed: HashSet<String>,
    }

    impl KeyState {
        pub fn new() -> Self {
            KeyState::default()
        }

        pub fn is_pressed(&self, code: &str) -> bool {
            self.held.contains(code)
        }

        pub fn is_just_pressed(&self, code: &str) -> bool {
            self.just_pressed.contains(code)
        }

        pub fn set_pressed(&mut self, code: &str) {
            // auto repeat keydowns are not new presses
            if self.held.insert(code.to_string()) {
                self.just_pressed.insert(code.to_string());
            }
        }

        pub fn set_released(&mut self, code: &str) {
            self.held.remove(code);
        }

        pub fn end_step(&mut self) {
            self.just_pressed.clear();
        }
    }

    pub fn prepare_input() -> Result<UnboundedReceiver<KeyPress>> {
        let (keydown_sender, keyevent_receiver) = unbounded();
        let keyup_sender = keydown_sender.clone();

        let onkeydown = browser::closure_wrap(Box::new(move |keycode: KeyboardEvent| {
            let code = keycode.code();
            if CAPTURED.contains(&code.as_str()) {
                keycode.prevent_default();
            }
            let _ = keydown_sender.unbounded_send(KeyPress::KeyDown(code));
        }) as Box<dyn FnMut(KeyboardEvent)>);

        let onkeyup = browser::closure_wrap(Box::new(move |keycode: KeyboardEvent| {
            let _ = keyup_sender.unbounded_send(KeyPress::KeyUp(keycode.code()));
        }) as Box<dyn FnMut(KeyboardEvent)>);

        let window = browser::window()?;
        window.set_onkeydown(Some(onkeydown.as_ref().unchecked_ref()));
        window.set_onkeyup(Some(onkeyup.as_ref().unchecked_ref()));
        onkeydown.forget();
        onkeyup.forget();

        Ok(keyevent_receiver)
    }

    pub fn process_input(state: &mut KeyState, keyevent_receiver: &mut UnboundedReceiver<KeyPress>) {
        // drain everything queued since the previous animation frame
        while let Ok(evt) = keyevent_receiver.try_recv() {
            match evt {
                KeyPress::KeyDown(code) => state.set_pressed(&code),
                KeyPress::KeyUp(code) => state.set_released(&code),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn press_is_new_only_until_the_step_ends() {
            let mut keys = KeyState::new();
            keys.set_pressed(JUMP);

            assert!(keys.is_pressed(JUMP));
            assert!(keys.is_just_pressed(JUMP));

            keys.end_step();
            assert!(keys.is_pressed(JUMP));
            assert!(!keys.is_just_pressed(JUMP));
        }

        #[test]
        fn auto_repeat_does_not_retrigger() {
            let mut keys = KeyState::new();
            keys.set_pressed(ATTACK);
            keys.end_step();
            keys.set_pressed(ATTACK);

            assert!(!keys.is_just_pressed(ATTACK));

            keys.set_released(ATTACK);
            keys.set_pressed(ATTACK);
            assert!(keys.is_just_pressed(ATTACK));
        }

        #[test]
        fn queued_events_are_drained_in_order() {
            let (sender, mut receiver) = unbounded();
            sender
                .unbounded_send(KeyPress::KeyDown(LEFT.to_string()))
                .unwrap();
            sender
                .unbounded_send(KeyPress::KeyDown(RIGHT.to_string()))
                .unwrap();
            sender
                .unbounded_send(KeyPress::KeyUp(LEFT.to_string()))
                .unwrap();

            let mut keys = KeyState::new();
            process_input(&mut keys, &mut receiver);

            assert!(!keys.is_pressed(LEFT));
            assert!(keys.is_pressed(RIGHT));
            assert!(keys.is_just_pressed(LEFT));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts steps and the steps that saw a fresh jump press
    #[derive(Default)]
    struct PressCounter {
        steps: usize,
        fresh: usize,
    }

    #[async_trait(?Send)]
    impl Game for PressCounter {
        async fn initialize(&self) -> Result<Box<dyn Game>> {
            Err(anyhow!("nothing to load"))
        }

        fn update(&mut self, keystate: &KeyState) {
            self.steps += 1;
            if keystate.is_just_pressed(input::JUMP) {
                self.fresh += 1;
            }
        }

        fn draw(&mut self, _renderer: &Renderer) {}

        fn resize(&mut self, _viewport: Size) {}
    }

    #[test]
    fn catch_up_steps_see_a_press_once() {
        let mut game_loop = GameLoop {
            last_frame: 0.0,
            accumulated_delta: FRAME_SIZE * 3.5,
        };
        let mut game = PressCounter::default();
        let mut keys = KeyState::new();
        keys.set_pressed(input::JUMP);

        game_loop.catch_up(&mut game, &mut keys);

        assert_eq!(game.steps, 3);
        assert_eq!(game.fresh, 1);
        assert!(keys.is_pressed(input::JUMP));
    }

    #[test]
    fn only_the_last_resize_of_a_frame_counts() {
        let (sender, mut receiver) = unbounded();
        assert_eq!(latest_size(&mut receiver), None);

        for width in [640.0, 800.0, 1024.0] {
            sender
                .unbounded_send(Size {
                    width,
                    height: 480.0,
                })
                .unwrap();
        }

        assert_eq!(
            latest_size(&mut receiver),
            Some(Size {
                width: 1024.0,
                height: 480.0,
            })
        );
        assert_eq!(latest_size(&mut receiver), None);
    }

    #[test]
    fn overlapping_rects_intersect() {
        let a = Rect::new_from_x_y(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new_from_x_y(5.0, 5.0, 10.0, 10.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new_from_x_y(0.0, 0.0, 10.0, 10.0);
        let right = Rect::new_from_x_y(10.0, 0.0, 10.0, 10.0);
        let below = Rect::new_from_x_y(0.0, 10.0, 10.0, 10.0);

        assert!(!a.intersects(&right));
        assert!(!a.intersects(&below));
    }

    #[test]
    fn contained_rect_intersects() {
        let outer = Rect::new_from_x_y(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new_from_x_y(40.0, 40.0, 5.0, 5.0);

        assert!(outer.intersects(&inner));
        assert!(inner.intersects(&outer));
    }
}
