use crate::engine::{Rect, Size, Surface};
use crate::sprite::SheetId;

/// World scroll : the knight stands still on screen, the world slides past
/// - `offset` : world x of the viewport's left edge
/// - `movement` : net offset change of the last step, melee enemies drift by it
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Scroll {
    offset: f32,
    movement: f32,
}

impl Scroll {
    /// Opposing keys both apply and cancel out
    pub fn update(&mut self, left: bool, right: bool, speed: f32) {
        let mut delta = 0.0;
        if left {
            delta -= speed;
        }
        if right {
            delta += speed;
        }
        self.offset += delta;
        self.movement = delta;
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn movement(&self) -> f32 {
        self.movement
    }

    pub fn world_to_screen(&self, world_x: f32) -> f32 {
        world_x - self.offset
    }
}

pub struct ParallaxLayer {
    pub sheet: SheetId,
    pub speed: f32,
}

impl ParallaxLayer {
    /// Left edges of the two tiles covering the viewport
    /// - x1 = (-offset * speed) rem width, remainder takes the sign of the
    ///   dividend so x1 sits in (-width, width)
    /// - x2 = x1 + width
    pub fn positions(&self, offset: f32, viewport_width: f32) -> (f32, f32) {
        let x1 = (-offset * self.speed) % viewport_width;
        (x1, x1 + viewport_width)
    }

    pub fn draw(&self, surface: &dyn Surface, offset: f32, viewport: &Size) {
        let (x1, x2) = self.positions(offset, viewport.width);
        surface.draw_image(self.sheet, &Rect::new_from_x_y(x1, 0.0, viewport.width, viewport.height));
        surface.draw_image(self.sheet, &Rect::new_from_x_y(x2, 0.0, viewport.width, viewport.height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn held_keys_move_the_offset() {
        let mut scroll = Scroll::default();
        scroll.update(false, true, 15.0);
        scroll.update(false, true, 15.0);
        assert_relative_eq!(scroll.offset(), 30.0);
        assert_relative_eq!(scroll.movement(), 15.0);

        scroll.update(true, false, 15.0);
        assert_relative_eq!(scroll.offset(), 15.0);
        assert_relative_eq!(scroll.movement(), -15.0);
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut scroll = Scroll::default();
        scroll.update(true, true, 15.0);

        assert_relative_eq!(scroll.offset(), 0.0);
        assert_relative_eq!(scroll.movement(), 0.0);
    }

    #[test]
    fn world_to_screen_subtracts_the_offset() {
        let mut scroll = Scroll::default();
        scroll.update(false, true, 40.0);

        assert_relative_eq!(scroll.world_to_screen(100.0), 60.0);
    }

    #[test]
    fn layer_positions_scrolling_right() {
        let layer = ParallaxLayer {
            sheet: SheetId::Layer(0),
            speed: 0.2,
        };
        let (x1, x2) = layer.positions(2000.0, 800.0);

        assert_relative_eq!(x1, -400.0);
        assert_relative_eq!(x2, 400.0);
    }

    #[test]
    fn layer_positions_scrolling_left() {
        let layer = ParallaxLayer {
            sheet: SheetId::Layer(1),
            speed: 0.5,
        };
        let (x1, x2) = layer.positions(-100.0, 800.0);

        assert_relative_eq!(x1, 50.0);
        assert_relative_eq!(x2, 850.0);
    }

    #[test]
    fn layer_positions_wrap_every_viewport_width() {
        let layer = ParallaxLayer {
            sheet: SheetId::Layer(2),
            speed: 1.0,
        };
        let (x1, x2) = layer.positions(900.0, 800.0);

        assert_relative_eq!(x1, -100.0);
        assert_relative_eq!(x2, 700.0);
    }
}
