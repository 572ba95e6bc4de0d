use crate::archer::Archers;
use crate::browser::{self, ui};
use crate::collision::{self, CollisionEvent};
use crate::config::GameConfig;
use crate::engine::input::{ATTACK, JUMP, LEFT, RIGHT, START};
use crate::engine::{self, Game, KeyState, Rect, Renderer, Sound, Surface, FRAME_SIZE};
use crate::enemy::Horde;
use crate::scroll::{ParallaxLayer, Scroll};
use crate::sprite::knight::Knight;
use crate::sprite::SheetId;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::future::try_join_all;
use futures::{join, try_join};
use std::collections::HashMap;
use web_sys::HtmlImageElement;

/// TABLE
/// ┌───────────────────────── Game Flow ─────────────────────────────┐
/// │                                                                 │
/// │   Loading ──initialize()──► Loaded(Session)                     │
/// │                                                                 │
/// │   Session phases                                                │
/// │   ┌─────────┐  Enter   ┌─────────┐  hit   ┌──────────┐          │
/// │   │  Ready  ├─────────►│ Playing ├───────►│ GameOver │          │
/// │   └─────────┘          └────▲────┘        └────┬─────┘          │
/// │                             │     Enter        │                │
/// │                             └──(new World)─────┘                │
/// │                                                                 │
/// │   Playing step : scroll → knight → melee → archers & arrows     │
/// │                  → collisions → prune → score                   │
/// └─────────────────────────────────────────────────────────────────┘
pub enum KnightRun {
    /// Assets and config are being fetched
    Loading,

    /// Everything is loaded, the session owns the running world
    Loaded(Box<Loaded>),
}

impl KnightRun {
    const CONFIG_PATH: &'static str = "config.json";

    pub fn new() -> Self {
        KnightRun::Loading
    }

    /// A missing or broken config.json is not fatal, the defaults ship the
    /// same game
    async fn load_config() -> GameConfig {
        let fetched = browser::fetch_json::<GameConfig>(Self::CONFIG_PATH)
            .await
            .and_then(|config| config.validate().map(|_| config));
        match fetched {
            Ok(config) => config,
            Err(err) => {
                log!("Using default config, {} unusable : {:#}", Self::CONFIG_PATH, err);
                GameConfig::default()
            }
        }
    }

    async fn load_images(config: &GameConfig) -> Result<HashMap<SheetId, HtmlImageElement>> {
        let sources = sheet_sources(config);
        // every image loads at once, total time is the slowest one
        let images = try_join_all(sources.iter().map(|(_, source)| async move {
            engine::load_image(source)
                .await
                .with_context(|| format!("Failed to load sprite image from : {}", source))
        }))
        .await?;

        Ok(sources.into_iter().map(|(id, _)| id).zip(images).collect())
    }
}

impl Default for KnightRun {
    fn default() -> Self {
        KnightRun::new()
    }
}

/// Image path for every sheet the world draws
fn sheet_sources(config: &GameConfig) -> Vec<(SheetId, String)> {
    let mut sources: Vec<(SheetId, String)> = [
        (SheetId::Run, "spritesheet.png"),
        (SheetId::Jump, "jumpsheet.png"),
        (SheetId::Attack, "attacksprite.png"),
        (SheetId::Zombie, "zombiesheet.png"),
        (SheetId::ArcherWalk, "Walk.png"),
        (SheetId::ArcherShot, "Shot.png"),
        (SheetId::Arrow, "Arrow.png"),
    ]
    .iter()
    .map(|(id, source)| (*id, source.to_string()))
    .collect();

    sources.extend(
        config
            .layers
            .iter()
            .enumerate()
            .map(|(index, layer)| (SheetId::Layer(index), layer.source.clone())),
    );
    sources
}

#[async_trait(?Send)]
impl Game for KnightRun {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            KnightRun::Loading => {
                let viewport = browser::fit_canvas_to_window()?;
                let config = Self::load_config().await.with_viewport(viewport);
                config.validate().context("Canvas is unusable as a viewport")?;

                let (images, sounds) = join!(Self::load_images(&config), Sounds::load());
                let images = images?;
                let sounds = sounds?;
                log!("Loaded {} images, viewport {:?}", images.len(), viewport);

                report(ui::show(ui::START_PAGE));
                report(ui::hide(ui::GAME_OVER_PAGE));

                Ok(Box::new(KnightRun::Loaded(Box::new(Loaded {
                    session: Session::new(config),
                    images,
                    sounds,
                }))))
            }
            KnightRun::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, keystate: &KeyState) {
        if let KnightRun::Loaded(loaded) = self {
            for signal in loaded.session.update(keystate) {
                loaded.react(signal);
            }
        }
    }

    fn resize(&mut self, viewport: engine::Size) {
        if let KnightRun::Loaded(loaded) = self {
            match loaded.session.resize(viewport) {
                Ok(()) => log!("Viewport resized to {:?}", viewport),
                Err(err) => error!("Ignoring resize : {:#}", err),
            }
        }
    }

    fn draw(&mut self, renderer: &Renderer) {
        if let KnightRun::Loaded(loaded) = self {
            let canvas = SpriteCanvas {
                renderer,
                images: &loaded.images,
            };
            loaded.session.world().draw(&canvas);
        }
    }
}

pub struct Loaded {
    session: Session,
    images: HashMap<SheetId, HtmlImageElement>,
    sounds: Sounds,
}

impl Loaded {
    /// Browser side of a session signal : DOM and audio
    fn react(&self, signal: Signal) {
        match signal {
            Signal::Started => {
                report(ui::hide(ui::START_PAGE));
                report(ui::hide(ui::GAME_OVER_PAGE));
                report(ui::set_text(ui::SCORE, "0"));
            }
            Signal::Cue(cue) => report(self.sounds.play(cue)),
            Signal::Scored(score) => report(ui::set_text(ui::SCORE, &score.to_string())),
            Signal::GameOver(score) => {
                report(ui::set_text(ui::FINAL_SCORE, &score.to_string()));
                report(ui::show(ui::GAME_OVER_PAGE));
            }
        }
    }
}

// UI and audio failures never stop the game
fn report(result: Result<()>) {
    if let Err(err) = result {
        error!("{:#}", err);
    }
}

struct Sounds {
    music: Sound,
    running: Sound,
    jump: Sound,
    attack: Sound,
}

impl Sounds {
    const MUSIC_VOLUME: f64 = 0.1;
    const EFFECT_VOLUME: f64 = 0.4;

    async fn load() -> Result<Sounds> {
        let (music, running, jump, attack) = try_join!(
            engine::load_audio("sounds/backroundmusic.wav"),
            engine::load_audio("sounds/running.wav"),
            engine::load_audio("sounds/jump.wav"),
            engine::load_audio("sounds/attack.wav"),
        )
        .context("Failed to load sounds")?;

        music.set_volume(Self::MUSIC_VOLUME);
        for effect in [&running, &jump, &attack] {
            effect.set_volume(Self::EFFECT_VOLUME);
        }
        Ok(Sounds {
            music,
            running,
            jump,
            attack,
        })
    }

    fn play(&self, cue: SoundCue) -> Result<()> {
        match cue {
            SoundCue::Jump => self.jump.play(),
            SoundCue::Attack => self.attack.play(),
            SoundCue::RunStart => self.running.play_looping(),
            SoundCue::RunStop => self.running.stop(),
            SoundCue::MusicStart => self.music.play_looping(),
            SoundCue::MusicStop => self.music.stop(),
        }
    }
}

/// Maps sheet ids to the loaded images so the world can draw on the canvas
struct SpriteCanvas<'a> {
    renderer: &'a Renderer,
    images: &'a HashMap<SheetId, HtmlImageElement>,
}

impl SpriteCanvas<'_> {
    fn image(&self, sheet: SheetId) -> Option<&HtmlImageElement> {
        let image = self.images.get(&sheet);
        if image.is_none() {
            error!("No image loaded for {:?}", sheet);
        }
        image
    }
}

impl Surface for SpriteCanvas<'_> {
    fn clear(&self, rect: &Rect) {
        self.renderer.clear(rect);
    }

    fn draw_frame(&self, sheet: SheetId, frame: &Rect, destination: &Rect) {
        if let Some(image) = self.image(sheet) {
            self.renderer.draw_image(image, frame, destination);
        }
    }

    fn draw_image(&self, sheet: SheetId, destination: &Rect) {
        if let Some(image) = self.image(sheet) {
            self.renderer.draw_entire_image(image, destination);
        }
    }

    fn stroke_rect(&self, rect: &Rect, color: &str) {
        self.renderer.stroke_rect(rect, color);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ready,
    Playing,
    GameOver,
}

/// What the browser side has to act on after a session update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Started,
    Cue(SoundCue),
    Scored(u32),
    GameOver(u32),
}

/// Phase machine around the world, free of any browser type
pub struct Session {
    config: GameConfig,
    phase: Phase,
    world: World,
}

impl Session {
    pub fn new(config: GameConfig) -> Self {
        Session {
            world: World::new(config.clone()),
            config,
            phase: Phase::Ready,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Refit the running world, a restart keeps the new viewport. A window
    /// too small to stand in is refused and the old viewport kept
    pub fn resize(&mut self, viewport: engine::Size) -> Result<()> {
        let config = self.config.clone().with_viewport(viewport);
        config.validate()?;
        self.world.resize(viewport);
        self.config = config;
        Ok(())
    }

    /// One simulation step
    /// - Ready / GameOver : only Enter does anything, the world is frozen
    /// - Playing : step the world, a fatal hit ends the run exactly once
    pub fn update(&mut self, keystate: &KeyState) -> Vec<Signal> {
        match self.phase {
            Phase::Ready | Phase::GameOver => {
                if keystate.is_just_pressed(START) {
                    self.start();
                    vec![Signal::Started, Signal::Cue(SoundCue::MusicStart)]
                } else {
                    Vec::new()
                }
            }
            Phase::Playing => {
                let step = self.world.step(&Controls::from_keys(keystate));
                let mut signals: Vec<Signal> = step.cues.into_iter().map(Signal::Cue).collect();
                if step.kills > 0 {
                    signals.push(Signal::Scored(self.world.score()));
                }
                if step.game_over {
                    self.phase = Phase::GameOver;
                    log!("Game over, score {}", self.world.score());
                    signals.push(Signal::Cue(SoundCue::RunStop));
                    signals.push(Signal::Cue(SoundCue::MusicStop));
                    signals.push(Signal::GameOver(self.world.score()));
                }
                signals
            }
        }
    }

    // a fresh world brings fresh spawn timers, nothing carries over
    fn start(&mut self) {
        if self.phase == Phase::GameOver {
            self.world = World::new(self.config.clone());
        }
        self.phase = Phase::Playing;
    }
}

/// Player intent for one step, jump and attack are edge triggered
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub attack: bool,
}

impl Controls {
    pub fn from_keys(keystate: &KeyState) -> Self {
        Controls {
            left: keystate.is_pressed(LEFT),
            right: keystate.is_pressed(RIGHT),
            jump: keystate.is_just_pressed(JUMP),
            attack: keystate.is_just_pressed(ATTACK),
        }
    }

    fn moving(&self) -> bool {
        self.left || self.right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Jump,
    Attack,
    RunStart,
    RunStop,
    MusicStart,
    MusicStop,
}

/// Result of one world step
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Step {
    pub cues: Vec<SoundCue>,
    pub kills: u32,
    pub game_over: bool,
}

/// Everything that moves, updated once per fixed step
pub struct World {
    viewport: engine::Size,
    scroll: Scroll,
    knight: Knight,
    horde: Horde,
    archers: Archers,
    layers: Vec<ParallaxLayer>,
    scroll_speed: f32,
    score: u32,
    running: bool,
}

impl World {
    pub fn new(config: GameConfig) -> Self {
        let layers = config
            .layers
            .iter()
            .enumerate()
            .map(|(index, layer)| ParallaxLayer {
                sheet: SheetId::Layer(index),
                speed: layer.speed,
            })
            .collect();

        World {
            viewport: config.viewport,
            scroll: Scroll::default(),
            knight: Knight::new(&config),
            horde: Horde::new(config.melee, config.viewport),
            archers: Archers::new(config.archer, config.arrow, config.viewport),
            layers,
            scroll_speed: config.character.scroll_speed,
            score: 0,
            running: false,
        }
    }

    pub fn step(&mut self, controls: &Controls) -> Step {
        let mut step = Step::default();

        let moving = controls.moving();
        self.scroll.update(controls.left, controls.right, self.scroll_speed);
        if moving != self.running {
            step.cues.push(if moving {
                SoundCue::RunStart
            } else {
                SoundCue::RunStop
            });
            self.running = moving;
        }

        if controls.jump && self.knight.jump() {
            step.cues.push(SoundCue::Jump);
        }
        if controls.attack && self.knight.attack() {
            step.cues.push(SoundCue::Attack);
        }
        self.knight.update(moving);

        self.horde.update(FRAME_SIZE, self.scroll.movement());
        self.archers.update(FRAME_SIZE, self.scroll.offset());

        for event in collision::detect(&self.knight, &mut self.horde, &mut self.archers) {
            match event {
                CollisionEvent::Slain(foe) => {
                    step.kills += 1;
                    log!("{:?} slain", foe);
                }
                CollisionEvent::Struck | CollisionEvent::Shot => step.game_over = true,
            }
        }
        self.horde.prune();
        self.archers.prune();
        self.score += step.kills;

        step
    }

    /// Back to front : background layers, knight, zombies, archers, arrows
    pub fn draw(&self, surface: &dyn Surface) {
        surface.clear(&Rect::new_from_x_y(
            0.0,
            0.0,
            self.viewport.width,
            self.viewport.height,
        ));
        for layer in &self.layers {
            layer.draw(surface, self.scroll.offset(), &self.viewport);
        }
        self.knight.draw(surface);
        self.horde.draw(surface);
        self.archers.draw(surface);
    }

    /// Canvas refitted : new viewport for the background, the knight back at
    /// a third of the width on the new ground, new spawn edges
    pub fn resize(&mut self, viewport: engine::Size) {
        self.viewport = viewport;
        self.knight.resize(&viewport);
        self.horde.resize(viewport);
        self.archers.resize(viewport);
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn scroll(&self) -> &Scroll {
        &self.scroll
    }

    pub fn knight(&self) -> &Knight {
        &self.knight
    }

    pub fn horde(&self) -> &Horde {
        &self.horde
    }

    pub fn horde_mut(&mut self) -> &mut Horde {
        &mut self.horde
    }

    pub fn archers(&self) -> &Archers {
        &self.archers
    }

    pub fn archers_mut(&mut self) -> &mut Archers {
        &mut self.archers
    }
}
