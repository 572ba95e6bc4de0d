use crate::archer::Archers;
use crate::engine::Rect;
use crate::enemy::Horde;
use crate::sprite::knight::Knight;

/// Hitboxes are the sprite box shrunk on every side by these
pub const CHARACTER_INSET: f32 = 10.0;
pub const ENEMY_INSET: f32 = 5.0;
pub const ARCHER_INSET: f32 = 5.0;

/// Sword box, relative to the knight's top left corner
pub const ATTACK_REACH: f32 = 50.0;
pub const ATTACK_WIDTH: f32 = 100.0;

pub fn inset(rect: &Rect, by: f32) -> Rect {
    Rect::new_from_x_y(
        rect.x() + by,
        rect.y() + by,
        rect.width() - 2.0 * by,
        rect.height() - 2.0 * by,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Foe {
    Zombie,
    Archer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEvent {
    /// knight ran into a melee enemy
    Struck,
    /// sword connected, the foe is already deactivated
    Slain(Foe),
    /// knight caught an arrow, the arrow is already deactivated
    Shot,
}

impl CollisionEvent {
    pub fn is_fatal(&self) -> bool {
        matches!(self, CollisionEvent::Struck | CollisionEvent::Shot)
    }
}

/// One collision pass over the active entities, in order
/// - knight vs zombies
/// - sword vs zombies and archers, one hit kills
/// - knight vs arrows
pub fn detect(knight: &Knight, horde: &mut Horde, archers: &mut Archers) -> Vec<CollisionEvent> {
    let mut events = Vec::new();
    let body = knight.hitbox();
    let zombie_size = horde.size();
    let archer_size = archers.size();

    if horde
        .zombies()
        .iter()
        .filter(|zombie| zombie.is_active())
        .any(|zombie| body.intersects(&zombie.hitbox(zombie_size)))
    {
        events.push(CollisionEvent::Struck);
    }

    if let Some(sword) = knight.attack_hitbox() {
        for zombie in horde.active_mut() {
            if sword.intersects(&zombie.hitbox(zombie_size)) {
                zombie.kill();
                events.push(CollisionEvent::Slain(Foe::Zombie));
            }
        }
        for archer in archers.archers_mut() {
            if sword.intersects(&archer.hitbox(archer_size)) {
                archer.kill();
                events.push(CollisionEvent::Slain(Foe::Archer));
            }
        }
    }

    let arrow_config = *archers.arrow_config();
    for arrow in archers.arrows_mut() {
        if body.intersects(&arrow.hitbox(&arrow_config)) {
            arrow.deactivate();
            events.push(CollisionEvent::Shot);
        }
    }

    events
}
