use crate::collision;
use crate::config::{ArcherConfig, ArrowConfig};
#[cfg(debug_assertions)]
use crate::engine::DebugDraw;
use crate::engine::{Rect, Size, Surface};
use crate::enemy::SpawnTimer;
use crate::sprite::{FrameCursor, FrameSheet, SheetId, ARCHER_SHOT_FRAMES, ARCHER_WALK_FRAMES};

// archers stay alive this many sprite widths past either edge
const DESPAWN_MARGIN_WIDTHS: f32 = 2.0;

/// Walking (initial) -> Shooting, never back
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcherState {
    Walking { walked: f32 },
    Shooting { shot_timer: u32 },
}

/// Ranged enemy anchored in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Archer {
    pub world_x: f32,
    pub y: f32,
    screen_x: f32,
    state: ArcherState,
    cursor: FrameCursor,
    active: bool,
}

impl Archer {
    /// Just past the right edge of the viewport, scrolled to `offset`
    pub fn spawn(offset: f32, viewport: &Size, config: &ArcherConfig) -> Self {
        let world_x = offset + viewport.width + config.size;
        Archer {
            world_x,
            y: viewport.height - config.size - config.ground_clearance,
            screen_x: world_x - offset,
            state: ArcherState::Walking { walked: 0.0 },
            cursor: FrameCursor::default(),
            active: true,
        }
    }

    pub fn state(&self) -> ArcherState {
        self.state
    }

    pub fn screen_x(&self) -> f32 {
        self.screen_x
    }

    pub fn frame(&self) -> u8 {
        self.cursor.frame
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn kill(&mut self) {
        self.active = false;
    }

    /// Move or shoot, then place on screen. Returns the arrow fired this step
    fn update(&mut self, config: &ArcherConfig, offset: f32) -> Option<Arrow> {
        if let ArcherState::Walking { walked } = self.state {
            self.world_x -= config.speed;
            let walked = walked + config.speed;
            if walked >= config.walk_distance {
                self.state = ArcherState::Shooting { shot_timer: 0 };
                self.cursor.reset();
            } else {
                self.state = ArcherState::Walking { walked };
            }
        }

        let mut arrow = None;
        if let ArcherState::Shooting { shot_timer } = &mut self.state {
            *shot_timer += 1;
            if *shot_timer % config.fire_interval == 0 {
                arrow = Some(Arrow::new(self.world_x, self.y + config.size / 2.0, offset));
            }
        }

        self.screen_x = self.world_x - offset;
        arrow
    }

    fn animate(&mut self) {
        let (_, frames) = self.sheet();
        self.cursor.advance(&frames);
    }

    fn in_range(&self, viewport_width: f32, size: f32) -> bool {
        let margin = size * DESPAWN_MARGIN_WIDTHS;
        self.screen_x > -margin && self.screen_x < viewport_width + margin
    }

    pub fn sheet(&self) -> (SheetId, FrameSheet) {
        match self.state {
            ArcherState::Walking { .. } => (SheetId::ArcherWalk, ARCHER_WALK_FRAMES),
            ArcherState::Shooting { .. } => (SheetId::ArcherShot, ARCHER_SHOT_FRAMES),
        }
    }

    pub fn bounding_box(&self, size: f32) -> Rect {
        Rect::new_from_x_y(self.screen_x, self.y, size, size)
    }

    pub fn hitbox(&self, size: f32) -> Rect {
        collision::inset(&self.bounding_box(size), collision::ARCHER_INSET)
    }
}

/// Projectile, flies left in world space regardless of the scroll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrow {
    pub world_x: f32,
    pub y: f32,
    screen_x: f32,
    active: bool,
}

impl Arrow {
    pub fn new(world_x: f32, y: f32, offset: f32) -> Self {
        Arrow {
            world_x,
            y,
            screen_x: world_x - offset,
            active: true,
        }
    }

    pub fn screen_x(&self) -> f32 {
        self.screen_x
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    fn update(&mut self, speed: f32, offset: f32) {
        self.world_x -= speed;
        self.screen_x = self.world_x - offset;
    }

    fn in_range(&self, viewport_width: f32, margin: f32) -> bool {
        self.screen_x > -margin && self.screen_x < viewport_width + margin
    }

    /// Arrows hit with their whole sprite, no inset
    pub fn hitbox(&self, config: &ArrowConfig) -> Rect {
        Rect::new_from_x_y(self.screen_x, self.y, config.width, config.height)
    }
}

/// All archers, their arrows and the archer spawner
pub struct Archers {
    archers: Vec<Archer>,
    arrows: Vec<Arrow>,
    timer: SpawnTimer,
    config: ArcherConfig,
    arrow_config: ArrowConfig,
    viewport: Size,
}

impl Archers {
    pub fn new(config: ArcherConfig, arrow_config: ArrowConfig, viewport: Size) -> Self {
        Archers {
            archers: Vec::new(),
            arrows: Vec::new(),
            timer: SpawnTimer::new(config.spawn_interval_ms),
            config,
            arrow_config,
            viewport,
        }
    }

    pub fn size(&self) -> f32 {
        self.config.size
    }

    pub fn arrow_config(&self) -> &ArrowConfig {
        &self.arrow_config
    }

    pub fn spawn(&mut self, offset: f32) {
        self.archers
            .push(Archer::spawn(offset, &self.viewport, &self.config));
    }

    /// One step, in order : archers, arrows (including the ones fired this
    /// step), per archer animation, spawner
    pub fn update(&mut self, delta_ms: f32, offset: f32) {
        let config = self.config;
        let arrow_config = self.arrow_config;
        let width = self.viewport.width;

        let mut fired = Vec::new();
        self.archers.retain_mut(|archer| {
            if !archer.active {
                return false;
            }
            if let Some(arrow) = archer.update(&config, offset) {
                fired.push(arrow);
            }
            archer.in_range(width, config.size)
        });
        self.arrows.extend(fired);

        self.arrows.retain_mut(|arrow| {
            if !arrow.active {
                return false;
            }
            arrow.update(arrow_config.speed, offset);
            arrow.in_range(width, arrow_config.despawn_margin)
        });

        for archer in self.archers.iter_mut() {
            archer.animate();
        }

        if config.enabled && self.timer.tick(delta_ms) {
            self.spawn(offset);
        }
    }

    /// New spawn edge and ground line for archers, arrows fly on unchanged
    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
        let y = viewport.height - self.config.size - self.config.ground_clearance;
        for archer in self.archers.iter_mut() {
            archer.y = y;
        }
    }

    #[cfg(test)]
    pub(crate) fn push_arrow(&mut self, arrow: Arrow) {
        self.arrows.push(arrow);
    }

    pub fn prune(&mut self) {
        self.archers.retain(Archer::is_active);
        self.arrows.retain(Arrow::is_active);
    }

    pub fn archers(&self) -> &[Archer] {
        &self.archers
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn archers_mut(&mut self) -> impl Iterator<Item = &mut Archer> {
        self.archers.iter_mut().filter(|archer| archer.active)
    }

    pub fn arrows_mut(&mut self) -> impl Iterator<Item = &mut Arrow> {
        self.arrows.iter_mut().filter(|arrow| arrow.active)
    }

    pub fn draw(&self, surface: &dyn Surface) {
        let size = self.config.size;
        for archer in self.archers.iter().filter(|archer| archer.active) {
            let (sheet_id, frames) = archer.sheet();
            surface.draw_frame(
                sheet_id,
                &frames.frame_rect(archer.cursor.frame),
                &archer.bounding_box(size),
            );

            #[cfg(debug_assertions)]
            archer.hitbox(size).draw_debug(surface);
        }

        for arrow in self.arrows.iter().filter(|arrow| arrow.active) {
            surface.draw_image(SheetId::Arrow, &arrow.hitbox(&self.arrow_config));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const VIEWPORT: Size = Size {
        width: 800.0,
        height: 400.0,
    };

    fn quiet_archers() -> Archers {
        Archers::new(
            ArcherConfig {
                enabled: false,
                ..ArcherConfig::default()
            },
            ArrowConfig::default(),
            VIEWPORT,
        )
    }

    #[test]
    fn spawns_past_the_right_edge() {
        let mut archers = quiet_archers();
        archers.spawn(500.0);

        let archer = archers.archers()[0];
        assert_relative_eq!(archer.world_x, 500.0 + 800.0 + 120.0);
        assert_relative_eq!(archer.screen_x(), 920.0);
        assert_relative_eq!(archer.y, 400.0 - 120.0 - 10.0);
        assert_eq!(archer.state(), ArcherState::Walking { walked: 0.0 });
    }

    #[test]
    fn starts_shooting_after_the_walk_distance() {
        let mut archers = quiet_archers();
        archers.spawn(0.0);

        for _ in 0..99 {
            archers.update(0.0, 0.0);
        }
        assert!(matches!(
            archers.archers()[0].state(),
            ArcherState::Walking { .. }
        ));

        archers.update(0.0, 0.0);
        let archer = archers.archers()[0];
        assert_eq!(archer.state(), ArcherState::Shooting { shot_timer: 1 });
        assert_eq!(archer.frame(), 0);
        assert_relative_eq!(archer.world_x, 920.0 - 200.0);
    }

    #[test]
    fn shooting_archer_fires_every_sixtieth_step() {
        let mut archers = quiet_archers();
        archers.spawn(0.0);
        for _ in 0..100 {
            archers.update(0.0, 0.0);
        }
        assert!(archers.arrows().is_empty());

        for _ in 0..58 {
            archers.update(0.0, 0.0);
        }
        assert!(archers.arrows().is_empty());

        archers.update(0.0, 0.0);
        assert_eq!(archers.arrows().len(), 1);
        let arrow = archers.arrows()[0];
        // fired from the archer's position at half height, then moved once
        assert_relative_eq!(arrow.world_x, 720.0 - 5.0);
        assert_relative_eq!(arrow.y, 270.0 + 60.0);
    }

    #[test]
    fn arrows_ignore_the_scroll() {
        let mut archers = quiet_archers();
        archers.push_arrow(Arrow::new(400.0, 300.0, 0.0));

        archers.update(0.0, 30.0);
        let arrow = archers.arrows()[0];
        assert_relative_eq!(arrow.world_x, 395.0);
        assert_relative_eq!(arrow.screen_x(), 365.0);
    }

    #[test]
    fn arrows_leave_past_the_margin() {
        let mut archers = quiet_archers();
        archers.push_arrow(Arrow::new(-40.0, 300.0, 0.0));

        archers.update(0.0, 0.0);
        assert_eq!(archers.arrows().len(), 1);
        archers.update(0.0, 0.0);
        assert!(archers.arrows().is_empty());
    }

    #[test]
    fn archers_survive_just_off_screen() {
        let mut archers = quiet_archers();
        archers.spawn(0.0);

        // scrolling far left pushes the archer right on screen
        archers.update(0.0, -100.0);
        assert_relative_eq!(archers.archers()[0].screen_x(), 918.0 + 100.0);
        assert_eq!(archers.archers().len(), 1);

        archers.update(0.0, -200.0);
        assert!(archers.archers().is_empty());
    }

    #[test]
    fn archers_keep_two_widths_past_the_left_edge() {
        let mut archers = quiet_archers();
        archers.spawn(0.0);

        // spawned at world 920, walks 2 per step : 918 after the update
        archers.update(0.0, 918.0 + 239.0);
        assert_relative_eq!(archers.archers()[0].screen_x(), -239.0);
        assert_eq!(archers.archers().len(), 1);

        // 916 - 1156 = -240, right on the margin
        archers.update(0.0, 916.0 + 240.0);
        assert!(archers.archers().is_empty());
    }

    #[test]
    fn arrows_leave_past_the_right_margin() {
        let mut archers = quiet_archers();
        // moves 5 left on the first update, screen x 849
        archers.push_arrow(Arrow::new(854.0, 300.0, 0.0));

        archers.update(0.0, 0.0);
        assert_relative_eq!(archers.arrows()[0].screen_x(), 849.0);

        // world 844, scrolled left by 6 : screen x 850
        archers.update(0.0, -6.0);
        assert!(archers.arrows().is_empty());
    }

    #[test]
    fn resize_moves_archers_to_the_new_ground() {
        let mut archers = quiet_archers();
        archers.spawn(0.0);
        archers.resize(Size {
            width: 1200.0,
            height: 600.0,
        });
        assert_relative_eq!(archers.archers()[0].y, 600.0 - 120.0 - 10.0);

        archers.spawn(0.0);
        assert_relative_eq!(archers.archers()[1].world_x, 1200.0 + 120.0);
    }

    #[test]
    fn archers_animate_out_of_phase() {
        let mut archers = quiet_archers();
        archers.spawn(0.0);
        archers.update(0.0, 0.0);
        archers.update(0.0, 0.0);
        archers.spawn(0.0);
        archers.update(0.0, 0.0);

        let frames: Vec<u8> = archers.archers().iter().map(Archer::frame).collect();
        assert_eq!(frames, vec![1, 0]);
    }

    #[test]
    fn killed_archer_is_pruned() {
        let mut archers = quiet_archers();
        archers.spawn(0.0);
        archers.archers_mut().for_each(Archer::kill);

        archers.prune();
        assert!(archers.archers().is_empty());
    }
}
