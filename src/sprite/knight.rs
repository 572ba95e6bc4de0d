use crate::collision;
use crate::config::GameConfig;
#[cfg(debug_assertions)]
use crate::engine::DebugDraw;
use crate::engine::{Point, Rect, Size, Surface};
use crate::sprite::state::{IsAttacking, IsJumping, KnightContext, KnightState, Physics};
use crate::sprite::{self, FrameSheet, SheetId, SpriteState};

/// ELI5:
/// ┌──────────────── State Transition Flow ──────────────────┐
/// │  From State  →  Event   →  To State                     │
/// ├─────────────────────────────────────────────────────────┤
/// │  Running     →  Jump    →  Jumping                      │
/// │  Running     →  Attack  →  Attacking                    │
/// │  Jumping     →  Attack  →  Attacking                    │
/// │  Attacking   →  Jump    →  Attacking (body takes off)   │
/// │  -------        ------                                  │
/// │  Jumping     →  Update  →  Running (when landed)        │
/// │  Attacking   →  Update  →  Running / Jumping (when done)│
/// └─────────────────────────────────────────────────────────┘
pub enum Event {
    Jump,
    Attack,
    Update { moving: bool },
}

/// Which strip is on screen, by priority Attacking > Jumping > Running
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Pose {
    Running,
    Jumping,
    Attacking,
}

#[derive(Debug, Copy, Clone)]
enum KnightStateMachine {
    Running(KnightState<sprite::Running>),
    Jumping(KnightState<sprite::Jumping>),
    Attacking(KnightState<sprite::Attacking>),
}

impl From<KnightState<sprite::Running>> for KnightStateMachine {
    fn from(state: KnightState<sprite::Running>) -> Self {
        KnightStateMachine::Running(state)
    }
}

impl From<KnightState<sprite::Jumping>> for KnightStateMachine {
    fn from(state: KnightState<sprite::Jumping>) -> Self {
        KnightStateMachine::Jumping(state)
    }
}

impl From<KnightState<sprite::Attacking>> for KnightStateMachine {
    fn from(state: KnightState<sprite::Attacking>) -> Self {
        KnightStateMachine::Attacking(state)
    }
}

impl From<IsJumping> for KnightStateMachine {
    fn from(is_jumping: IsJumping) -> Self {
        match is_jumping {
            IsJumping::Landed(running_state) => running_state.into(),
            IsJumping::InProgress(jumping_state) => jumping_state.into(),
        }
    }
}

impl From<IsAttacking> for KnightStateMachine {
    fn from(is_attacking: IsAttacking) -> Self {
        match is_attacking {
            IsAttacking::Done(running_state) => running_state.into(),
            IsAttacking::DoneAirborne(jumping_state) => jumping_state.into(),
            IsAttacking::InProgress(attacking_state) => attacking_state.into(),
        }
    }
}

impl KnightStateMachine {
    // consumes self : the old state can't be reached after a transition
    fn transition(self, event: Event) -> Self {
        use KnightStateMachine::*;
        match (self, event) {
            (Running(state), Event::Jump) => state.jump().into(),
            (Running(state), Event::Attack) => state.attack().into(),
            (Jumping(state), Event::Attack) => state.attack().into(),
            (Attacking(state), Event::Jump) => state.jump().into(),
            (Running(state), Event::Update { moving }) => state.update(moving).into(),
            (Jumping(state), Event::Update { .. }) => state.update().into(),
            (Attacking(state), Event::Update { .. }) => state.update().into(),
            // jump mid air, attack mid swing : ignored
            _ => self,
        }
    }

    fn context(&self) -> &KnightContext {
        use KnightStateMachine::*;
        match self {
            Running(state) => state.context(),
            Jumping(state) => state.context(),
            Attacking(state) => state.context(),
        }
    }

    fn relocate(self, x: f32, ground: f32) -> Self {
        use KnightStateMachine::*;
        match self {
            Running(state) => state.relocate(x, ground).into(),
            Jumping(state) => state.relocate(x, ground).into(),
            Attacking(state) => state.relocate(x, ground).into(),
        }
    }

    fn pose(&self) -> Pose {
        match self {
            KnightStateMachine::Running(_) => Pose::Running,
            KnightStateMachine::Jumping(_) => Pose::Jumping,
            KnightStateMachine::Attacking(_) => Pose::Attacking,
        }
    }

    fn sheet(&self) -> (SheetId, FrameSheet) {
        match self {
            KnightStateMachine::Running(_) => {
                (sprite::Running::sheet_id(), sprite::Running::frames())
            }
            KnightStateMachine::Jumping(_) => {
                (sprite::Jumping::sheet_id(), sprite::Jumping::frames())
            }
            KnightStateMachine::Attacking(_) => {
                (sprite::Attacking::sheet_id(), sprite::Attacking::frames())
            }
        }
    }
}

/// The player character
/// - x is pinned to a third of the viewport, the world scrolls instead
/// - update() -> KnightStateMachine::transition(Event::Update)
pub struct Knight {
    state: KnightStateMachine,
    size: f32,
}

impl Knight {
    pub fn new(config: &GameConfig) -> Self {
        let size = config.character.size;
        let ground = config.viewport.height - size;
        let physics = Physics {
            jump_strength: config.character.jump_strength,
            gravity: config.character.gravity,
            ground,
        };
        let position = Point {
            x: config.viewport.width / 3.0,
            y: ground,
        };
        Knight {
            state: KnightState::new(position, physics).into(),
            size,
        }
    }

    /// Back to a third of the way in, standing on the new ground
    pub fn resize(&mut self, viewport: &Size) {
        self.state = self
            .state
            .relocate(viewport.width / 3.0, viewport.height - self.size);
    }

    pub fn update(&mut self, moving: bool) {
        self.state = self.state.transition(Event::Update { moving });
    }

    /// True when the knight actually took off
    pub fn jump(&mut self) -> bool {
        if self.is_airborne() {
            return false;
        }
        self.state = self.state.transition(Event::Jump);
        self.is_airborne()
    }

    /// True when a new swing started
    pub fn attack(&mut self) -> bool {
        if self.is_attacking() {
            return false;
        }
        self.state = self.state.transition(Event::Attack);
        self.is_attacking()
    }

    pub fn pose(&self) -> Pose {
        self.state.pose()
    }

    pub fn is_attacking(&self) -> bool {
        self.pose() == Pose::Attacking
    }

    pub fn is_airborne(&self) -> bool {
        self.state.context().airborne
    }

    pub fn position(&self) -> Point {
        self.state.context().position
    }

    pub fn velocity_y(&self) -> f32 {
        self.state.context().velocity_y
    }

    pub fn frame(&self) -> u8 {
        self.state.context().cursor.frame
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::new(
            self.position(),
            Size {
                width: self.size,
                height: self.size,
            },
        )
    }

    pub fn hitbox(&self) -> Rect {
        collision::inset(&self.bounding_box(), collision::CHARACTER_INSET)
    }

    /// Reach of the sword, only while swinging
    pub fn attack_hitbox(&self) -> Option<Rect> {
        if !self.is_attacking() {
            return None;
        }
        let position = self.position();
        Some(Rect::new_from_x_y(
            position.x + collision::ATTACK_REACH,
            position.y + collision::CHARACTER_INSET,
            collision::ATTACK_WIDTH,
            self.size - 2.0 * collision::CHARACTER_INSET,
        ))
    }

    pub fn draw(&self, surface: &dyn Surface) {
        let (sheet_id, frames) = self.state.sheet();
        surface.draw_frame(sheet_id, &frames.frame_rect(self.frame()), &self.bounding_box());

        #[cfg(debug_assertions)]
        {
            self.hitbox().draw_debug(surface);
            if let Some(reach) = self.attack_hitbox() {
                reach.draw_debug(surface);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn knight() -> Knight {
        let mut config = GameConfig::default();
        config.viewport = Size {
            width: 900.0,
            height: 400.0,
        };
        Knight::new(&config)
    }

    #[test]
    fn starts_on_the_ground_a_third_of_the_way_in() {
        let knight = knight();

        assert_relative_eq!(knight.position().x, 300.0);
        assert_relative_eq!(knight.position().y, 325.0);
        assert_eq!(knight.pose(), Pose::Running);
    }

    #[test]
    fn standing_still_changes_nothing() {
        let mut knight = knight();
        for _ in 0..10 {
            knight.update(false);
        }

        assert_relative_eq!(knight.position().y, 325.0);
        assert_relative_eq!(knight.velocity_y(), 0.0);
        assert_eq!(knight.pose(), Pose::Running);
        assert_eq!(knight.frame(), 0);
    }

    #[test]
    fn no_double_jump() {
        let mut knight = knight();

        assert!(knight.jump());
        knight.update(false);
        let velocity = knight.velocity_y();

        assert!(!knight.jump());
        assert_relative_eq!(knight.velocity_y(), velocity);
    }

    #[test]
    fn jump_then_land_returns_to_running() {
        let mut knight = knight();
        assert!(knight.jump());
        assert_relative_eq!(knight.velocity_y(), -20.0);
        assert_eq!(knight.pose(), Pose::Jumping);

        for _ in 0..39 {
            assert!(knight.position().y <= 325.0);
            knight.update(false);
        }

        assert!(!knight.is_airborne());
        assert_eq!(knight.pose(), Pose::Running);
        assert_relative_eq!(knight.position().y, 325.0);
    }

    #[test]
    fn attack_only_while_not_attacking() {
        let mut knight = knight();

        assert!(knight.attack());
        knight.update(false);
        assert!(!knight.attack());
        assert_eq!(knight.pose(), Pose::Attacking);
    }

    #[test]
    fn attack_takes_priority_over_jump() {
        let mut knight = knight();
        assert!(knight.jump());
        knight.update(false);
        assert!(knight.attack());

        assert_eq!(knight.pose(), Pose::Attacking);
        assert!(knight.is_airborne());
    }

    #[test]
    fn attack_hitbox_reaches_forward() {
        let mut knight = knight();
        assert!(knight.attack_hitbox().is_none());

        knight.attack();
        let reach = knight.attack_hitbox().expect("swinging");
        assert_relative_eq!(reach.x(), 350.0);
        assert_relative_eq!(reach.y(), 335.0);
        assert_relative_eq!(reach.width(), 100.0);
        assert_relative_eq!(reach.height(), 55.0);
    }

    #[test]
    fn resize_puts_the_knight_back_on_the_new_ground() {
        let mut knight = knight();
        knight.jump();
        for _ in 0..5 {
            knight.update(false);
        }

        knight.resize(&Size {
            width: 1200.0,
            height: 600.0,
        });
        assert_relative_eq!(knight.position().x, 400.0);
        assert_relative_eq!(knight.position().y, 525.0);
        assert!(!knight.is_airborne());

        // the cut short jump lands and stays on the new ground
        for _ in 0..5 {
            knight.update(false);
        }
        assert_eq!(knight.pose(), Pose::Running);
        assert_relative_eq!(knight.position().y, 525.0);
    }

    #[test]
    fn swing_ends_on_its_own() {
        let mut knight = knight();
        knight.attack();
        for _ in 0..20 {
            knight.update(false);
        }

        assert_eq!(knight.pose(), Pose::Running);
        assert!(knight.attack_hitbox().is_none());
    }
}
