/// All code relating to individual knight states lives behind this module and
/// enforces unrepresentable states : a state can only be reached through the
/// transition methods provided here
/// - PUBLIC  : KnightState and KnightContext are public
/// - PRIVATE : transitions on the context are private
///
/// Doesn't know about KnightStateMachine, the enum wrapping lives in knight.rs
use crate::engine::Point;
use crate::sprite::{
    Attacking, FrameCursor, Jumping, Running, SpriteState, JUMP_FALL_FIRST, JUMP_FALL_LAST,
    JUMP_RISE_LAST,
};

pub enum IsJumping {
    Landed(KnightState<Running>),
    InProgress(KnightState<Jumping>),
}

pub enum IsAttacking {
    /// swing finished on the ground
    Done(KnightState<Running>),
    /// swing finished mid air, fall back into the jump strip
    DoneAirborne(KnightState<Jumping>),
    InProgress(KnightState<Attacking>),
}

/// Vertical physics, screen space so negative y is up
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Physics {
    pub jump_strength: f32,
    pub gravity: f32,
    /// y of the knight's top edge when standing
    pub ground: f32,
}

#[derive(Debug, Copy, Clone)]
/// Shared data for :
/// - physics : position + vertical velocity
/// - display : frame cursor of the active strip
pub struct KnightContext {
    pub cursor: FrameCursor,
    pub position: Point,
    pub velocity_y: f32,
    pub airborne: bool,
    physics: Physics,
}

#[derive(Debug, Copy, Clone)]
pub struct KnightState<S> {
    context: KnightContext,
    // phantom state : only tells states apart at compile time
    _state: S,
}

impl<S> KnightState<S> {
    pub fn context(&self) -> &KnightContext {
        &self.context
    }

    /// Put the knight back on a new ground line at `x`, any jump in flight
    /// is cut short and lands on the next update
    pub fn relocate(mut self, x: f32, ground: f32) -> Self {
        self.context.physics.ground = ground;
        self.context.position = Point { x, y: ground };
        self.context.velocity_y = 0.0;
        self.context.airborne = false;
        self
    }
}

impl KnightState<Running> {
    pub fn new(position: Point, physics: Physics) -> Self {
        KnightState {
            context: KnightContext {
                cursor: FrameCursor::default(),
                position,
                velocity_y: 0.0,
                airborne: false,
                physics,
            },
            _state: Running,
        }
    }

    /// `moving` : a horizontal key is held, otherwise hold the idle pose
    pub fn update(mut self, moving: bool) -> Self {
        self.context = self.context.integrate();
        if moving {
            self.context.cursor.advance(&Running::frames());
        } else {
            self.context.cursor.reset();
        }
        self
    }

    pub fn jump(self) -> KnightState<Jumping> {
        KnightState {
            context: self.context.on_state_transition().launch(),
            _state: Jumping,
        }
    }

    pub fn attack(self) -> KnightState<Attacking> {
        KnightState {
            context: self.context.on_state_transition(),
            _state: Attacking,
        }
    }
}

impl KnightState<Jumping> {
    pub fn update(mut self) -> IsJumping {
        self.context = self.context.integrate();
        if self.context.airborne {
            self.context = self.context.animate_jump();
            IsJumping::InProgress(self)
        } else {
            IsJumping::Landed(self.land())
        }
    }

    pub fn attack(self) -> KnightState<Attacking> {
        KnightState {
            context: self.context.on_state_transition(),
            _state: Attacking,
        }
    }

    fn land(self) -> KnightState<Running> {
        KnightState {
            context: self.context.on_state_transition(),
            _state: Running,
        }
    }
}

impl KnightState<Attacking> {
    pub fn update(mut self) -> IsAttacking {
        self.context = self.context.integrate();
        let frames = Attacking::frames();
        if self.context.cursor.tick(frames.frame_delay) {
            let next = self.context.cursor.frame + 1;
            if next >= frames.total_frames {
                return self.finish();
            }
            self.context.cursor.frame = next;
        }
        IsAttacking::InProgress(self)
    }

    /// Jumping mid swing keeps the swing on screen, only the body takes off
    pub fn jump(mut self) -> Self {
        if !self.context.airborne {
            self.context = self.context.launch();
        }
        self
    }

    fn finish(self) -> IsAttacking {
        let context = self.context.on_state_transition();
        if context.airborne {
            let mut context = context;
            if context.velocity_y >= 0.0 {
                context.cursor.frame = JUMP_FALL_FIRST;
            }
            IsAttacking::DoneAirborne(KnightState {
                context,
                _state: Jumping,
            })
        } else {
            IsAttacking::Done(KnightState {
                context,
                _state: Running,
            })
        }
    }
}

impl KnightContext {
    /// Gravity step, only while airborne
    /// - velocity += gravity, y += velocity
    /// - clamp to the ground and zero the velocity on landing
    /// - never rise above the top of the viewport
    fn integrate(mut self) -> Self {
        if !self.airborne {
            return self;
        }
        self.velocity_y += self.physics.gravity;
        self.position.y += self.velocity_y;

        if self.position.y < 0.0 {
            self.position.y = 0.0;
            self.velocity_y = self.velocity_y.max(0.0);
        }
        if self.position.y >= self.physics.ground {
            self.position.y = self.physics.ground;
            self.velocity_y = 0.0;
            self.airborne = false;
        }
        self
    }

    fn launch(mut self) -> Self {
        self.velocity_y = -self.physics.jump_strength;
        self.airborne = true;
        self
    }

    /// Jump strip is clamped, not looped : rising plays 0..=5, falling 6..=10
    fn animate_jump(mut self) -> Self {
        if self.cursor.tick(Jumping::frames().frame_delay) {
            let next = self.cursor.frame + 1;
            self.cursor.frame = if self.velocity_y < 0.0 {
                next.min(JUMP_RISE_LAST)
            } else {
                next.clamp(JUMP_FALL_FIRST, JUMP_FALL_LAST)
            };
        }
        self
    }

    /// Reset the cursor, strips have different frame counts so a stale index
    /// could point past the end of the next strip
    fn on_state_transition(mut self) -> Self {
        self.cursor.reset();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const PHYSICS: Physics = Physics {
        jump_strength: 20.0,
        gravity: 1.0,
        ground: 325.0,
    };

    fn standing() -> KnightState<Running> {
        KnightState::new(Point { x: 100.0, y: 325.0 }, PHYSICS)
    }

    #[test]
    fn jump_sets_upward_velocity() {
        let jumping = standing().jump();

        assert_relative_eq!(jumping.context().velocity_y, -20.0);
        assert!(jumping.context().airborne);
        assert_eq!(jumping.context().cursor.frame, 0);
    }

    #[test]
    fn jump_lands_back_on_the_ground() {
        let mut jumping = standing().jump();
        let mut steps = 0;
        let running = loop {
            steps += 1;
            match jumping.update() {
                IsJumping::InProgress(state) => {
                    assert!(state.context().position.y < PHYSICS.ground);
                    jumping = state;
                }
                IsJumping::Landed(state) => break state,
            }
            assert!(steps < 100, "never landed");
        };

        assert_relative_eq!(running.context().position.y, PHYSICS.ground);
        assert_relative_eq!(running.context().velocity_y, 0.0);
        assert!(!running.context().airborne);
        // velocities -19 ..= 19 cancel out, back on the ground on step 39
        assert_eq!(steps, 39);
    }

    #[test]
    fn jump_frames_follow_the_velocity() {
        let mut jumping = standing().jump();
        loop {
            match jumping.update() {
                IsJumping::InProgress(state) => {
                    let context = state.context();
                    assert!(context.cursor.frame <= JUMP_FALL_LAST);
                    if context.velocity_y < 0.0 {
                        assert!(context.cursor.frame <= JUMP_RISE_LAST);
                    }
                    jumping = state;
                }
                IsJumping::Landed(_) => break,
            }
        }
    }

    #[test]
    fn falling_reaches_the_landing_frames() {
        let mut jumping = standing().jump();
        let mut seen_fall_frame = false;
        while let IsJumping::InProgress(state) = jumping.update() {
            if state.context().velocity_y > 0.0 && state.context().cursor.frame >= JUMP_FALL_FIRST
            {
                seen_fall_frame = true;
            }
            jumping = state;
        }
        assert!(seen_fall_frame);
    }

    #[test]
    fn idle_running_holds_frame_zero() {
        let mut running = standing();
        for _ in 0..10 {
            running = running.update(true);
        }
        assert_ne!(running.context().cursor.frame, 0);

        running = running.update(false);
        assert_eq!(running.context().cursor.frame, 0);
        assert_relative_eq!(running.context().position.y, PHYSICS.ground);
    }

    #[test]
    fn attack_finishes_after_its_strip() {
        let mut attacking = standing().attack();
        let mut steps = 0;
        let running = loop {
            steps += 1;
            match attacking.update() {
                IsAttacking::InProgress(state) => {
                    assert!(state.context().cursor.frame < Attacking::frames().total_frames);
                    attacking = state;
                }
                IsAttacking::Done(state) => break state,
                IsAttacking::DoneAirborne(_) => panic!("attack on the ground ended airborne"),
            }
        };

        // 10 frames, 2 steps each
        assert_eq!(steps, 20);
        assert_eq!(running.context().cursor.frame, 0);
    }

    #[test]
    fn attack_mid_air_falls_back_into_the_jump() {
        let mut attacking = standing().jump().attack();
        assert!(attacking.context().airborne);

        let jumping = loop {
            match attacking.update() {
                IsAttacking::InProgress(state) => attacking = state,
                IsAttacking::DoneAirborne(state) => break state,
                IsAttacking::Done(_) => panic!("landed before the swing ended"),
            }
        };

        // the swing ends 20 steps in, right at the apex
        assert!(jumping.context().airborne);
        assert_relative_eq!(jumping.context().velocity_y, 0.0);
        assert_eq!(jumping.context().cursor.frame, JUMP_FALL_FIRST);
    }

    #[test]
    fn jump_while_swinging_on_the_ground_keeps_the_swing() {
        let attacking = standing().attack().jump();

        assert!(attacking.context().airborne);
        assert_relative_eq!(attacking.context().velocity_y, -20.0);

        // a second jump mid air changes nothing
        let again = attacking.jump();
        assert_relative_eq!(again.context().velocity_y, -20.0);
    }

    #[test]
    fn strong_jump_stops_at_the_top_of_the_viewport() {
        let physics = Physics {
            jump_strength: 60.0,
            ..PHYSICS
        };
        let mut jumping = KnightState::new(Point { x: 0.0, y: 325.0 }, physics).jump();
        while let IsJumping::InProgress(state) = jumping.update() {
            assert!(state.context().position.y >= 0.0);
            jumping = state;
        }
    }
}
