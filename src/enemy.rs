use crate::collision;
use crate::config::MeleeConfig;
#[cfg(debug_assertions)]
use crate::engine::DebugDraw;
use crate::engine::{Point, Rect, Size, Surface};
use crate::sprite::{FrameCursor, SheetId, ZOMBIE_FRAMES};

/// Spawn clock driven by the simulation step instead of a platform timer,
/// fires once per elapsed interval and keeps the remainder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnTimer {
    interval: f32,
    elapsed: f32,
}

impl SpawnTimer {
    pub fn new(interval_ms: f32) -> Self {
        SpawnTimer {
            interval: interval_ms,
            elapsed: 0.0,
        }
    }

    pub fn tick(&mut self, delta_ms: f32) -> bool {
        self.elapsed += delta_ms;
        if self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            true
        } else {
            false
        }
    }
}

/// Melee enemy, lives in screen space and drifts left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zombie {
    pub position: Point,
    active: bool,
}

impl Zombie {
    pub fn new(position: Point) -> Self {
        Zombie {
            position,
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn kill(&mut self) {
        self.active = false;
    }

    pub fn bounding_box(&self, size: f32) -> Rect {
        Rect::new(
            self.position,
            Size {
                width: size,
                height: size,
            },
        )
    }

    pub fn hitbox(&self, size: f32) -> Rect {
        collision::inset(&self.bounding_box(size), collision::ENEMY_INSET)
    }
}

/// Every zombie on screen plus their spawner, they all share one frame
/// cursor so the pack walks in step
pub struct Horde {
    zombies: Vec<Zombie>,
    timer: SpawnTimer,
    cursor: FrameCursor,
    config: MeleeConfig,
    viewport: Size,
}

impl Horde {
    pub fn new(config: MeleeConfig, viewport: Size) -> Self {
        Horde {
            zombies: Vec::new(),
            timer: SpawnTimer::new(config.spawn_interval_ms),
            cursor: FrameCursor::default(),
            config,
            viewport,
        }
    }

    pub fn size(&self) -> f32 {
        self.config.size
    }

    /// New zombie on the right edge, feet on the ground
    pub fn spawn(&mut self) {
        self.zombies.push(Zombie::new(Point {
            x: self.viewport.width,
            y: self.viewport.height - self.config.size,
        }));
    }

    /// One step
    /// - drop zombies killed last step
    /// - drift left by own speed plus the scroll movement
    /// - drop zombies whose right edge left the viewport
    /// - spawn when the timer fires, the newcomer moves from next step on
    pub fn update(&mut self, delta_ms: f32, scroll_movement: f32) {
        let size = self.config.size;
        let step = self.config.speed + scroll_movement;
        self.zombies.retain_mut(|zombie| {
            if !zombie.active {
                return false;
            }
            zombie.position.x -= step;
            zombie.position.x > -size
        });

        if self.config.enabled && self.timer.tick(delta_ms) {
            self.spawn();
        }
        self.cursor.advance(&ZOMBIE_FRAMES);
    }

    /// New spawn edge and ground line, zombies already out stand on the new
    /// ground
    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
        let ground = viewport.height - self.config.size;
        for zombie in self.zombies.iter_mut() {
            zombie.position.y = ground;
        }
    }

    pub fn prune(&mut self) {
        self.zombies.retain(Zombie::is_active);
    }

    pub fn zombies(&self) -> &[Zombie] {
        &self.zombies
    }

    pub fn active_mut(&mut self) -> impl Iterator<Item = &mut Zombie> {
        self.zombies.iter_mut().filter(|zombie| zombie.active)
    }

    pub fn frame(&self) -> u8 {
        self.cursor.frame
    }

    pub fn draw(&self, surface: &dyn Surface) {
        let frame = ZOMBIE_FRAMES.frame_rect(self.cursor.frame);
        for zombie in self.zombies.iter().filter(|zombie| zombie.active) {
            surface.draw_frame(SheetId::Zombie, &frame, &zombie.bounding_box(self.config.size));

            #[cfg(debug_assertions)]
            zombie.hitbox(self.config.size).draw_debug(surface);
        }
    }
}
