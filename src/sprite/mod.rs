// TABLE:
// ┌──────────────────────────────────────────────────────────────────────────┐
// │                      Directory Structure                                 │
// ├───────────────────┬──────────────────────────────────────────────────────┤
// │ Code Directory    │          Role                                        │
// ├───────────────────┼──────────────────────────────────────────────────────┤
// │ sprite/           │ Sprite sheets and the knight character               │
// │ ├── mod.rs        │ Sheet ids, frame descriptors, frame cursors          │
// │ ├── state.rs      │ Typestate knight states + shared physics context     │
// │ └── knight.rs     │ State machine enum + the Knight the world owns       │
// └───────────────────┴──────────────────────────────────────────────────────┘
// Sheets are single row strips : frame n starts at n * (frame_width + gap)

pub mod knight;
pub mod state;

use crate::engine::Rect;

/// Every drawable the game knows about, the browser side maps these to
/// loaded image elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetId {
    Run,
    Jump,
    Attack,
    Zombie,
    ArcherWalk,
    ArcherShot,
    Arrow,
    Layer(usize),
}

/// Geometry and timing of one sprite strip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSheet {
    pub frame_width: f32,
    pub frame_height: f32,
    pub gap: f32,
    pub total_frames: u8,
    /// simulation steps per frame advance
    pub frame_delay: u8,
}

impl FrameSheet {
    pub fn frame_rect(&self, frame: u8) -> Rect {
        Rect::new_from_x_y(
            frame as f32 * (self.frame_width + self.gap),
            0.0,
            self.frame_width,
            self.frame_height,
        )
    }
}

pub const RUN_FRAMES: FrameSheet = FrameSheet {
    frame_width: 328.0,
    frame_height: 458.0,
    gap: 37.0,
    total_frames: 11,
    frame_delay: 3,
};

pub const JUMP_FRAMES: FrameSheet = FrameSheet {
    frame_width: 282.0,
    frame_height: 483.0,
    gap: 80.0,
    total_frames: 11,
    frame_delay: 3,
};

pub const ATTACK_FRAMES: FrameSheet = FrameSheet {
    frame_width: 480.0,
    frame_height: 458.0,
    gap: 60.0,
    total_frames: 10,
    frame_delay: 2,
};

pub const ZOMBIE_FRAMES: FrameSheet = FrameSheet {
    frame_width: 434.0,
    frame_height: 548.0,
    gap: 110.0,
    total_frames: 9,
    frame_delay: 3,
};

pub const ARCHER_WALK_FRAMES: FrameSheet = FrameSheet {
    frame_width: 110.0,
    frame_height: 130.0,
    gap: 24.0,
    total_frames: 8,
    frame_delay: 3,
};

pub const ARCHER_SHOT_FRAMES: FrameSheet = FrameSheet {
    frame_width: 120.0,
    frame_height: 130.0,
    gap: 5.0,
    total_frames: 14,
    frame_delay: 5,
};

// jump strip : take off frames while rising, landing frames while falling
pub const JUMP_RISE_LAST: u8 = 5;
pub const JUMP_FALL_FIRST: u8 = 6;
pub const JUMP_FALL_LAST: u8 = 10;

/// Playback position inside a sheet
/// - `frame` : index of the frame on screen
/// - `counter` : steps since the last advance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCursor {
    pub frame: u8,
    counter: u8,
}

impl FrameCursor {
    pub fn counter(&self) -> u8 {
        self.counter
    }

    pub fn reset(&mut self) {
        self.frame = 0;
        self.counter = 0;
    }

    /// Count one step, true once `delay` steps have gone by
    pub fn tick(&mut self, delay: u8) -> bool {
        self.counter += 1;
        if self.counter >= delay {
            self.counter = 0;
            true
        } else {
            false
        }
    }

    /// Looping playback
    pub fn advance(&mut self, sheet: &FrameSheet) {
        if self.tick(sheet.frame_delay) {
            self.frame = (self.frame + 1) % sheet.total_frames;
        }
    }
}

/// Static description of a knight animation state
pub trait SpriteState {
    fn sheet_id() -> SheetId;
    fn frames() -> FrameSheet;
}

#[derive(Debug, Copy, Clone)]
pub struct Running;

#[derive(Debug, Copy, Clone)]
pub struct Jumping;

#[derive(Debug, Copy, Clone)]
pub struct Attacking;

impl SpriteState for Running {
    fn sheet_id() -> SheetId {
        SheetId::Run
    }

    fn frames() -> FrameSheet {
        RUN_FRAMES
    }
}

impl SpriteState for Jumping {
    fn sheet_id() -> SheetId {
        SheetId::Jump
    }

    fn frames() -> FrameSheet {
        JUMP_FRAMES
    }
}

impl SpriteState for Attacking {
    fn sheet_id() -> SheetId {
        SheetId::Attack
    }

    fn frames() -> FrameSheet {
        ATTACK_FRAMES
    }
}
