//! Drone state: identity, personality, and positions in the 2D plane.

use serde::{Deserialize, Serialize};

/// A point in the drone's 2D space. Coordinates are unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The simulated drone.
///
/// Owned by exactly one interpreter; the dispatcher is the only caller of the
/// mutators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drone {
    /// Name used in the prompt and when speaking
    pub name: String,

    /// Free-form personality label, only used to parameterize the prompt
    pub personality: String,

    /// Where the drone is
    pub position: Position,

    /// Where the drone believes the user is
    pub user_position: Position,
}

impl Drone {
    pub fn new(name: impl Into<String>, personality: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            personality: personality.into(),
            position: Position::default(),
            user_position: Position::default(),
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_user_at(mut self, user_position: Position) -> Self {
        self.user_position = user_position;
        self
    }

    pub fn move_to(&mut self, position: Position) {
        self.position = position;
    }

    pub fn set_user_position(&mut self, position: Position) {
        self.user_position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_coordinates_render_without_fraction() {
        assert_eq!(Position::new(0.0, 8.0).to_string(), "(0, 8)");
        assert_eq!(Position::new(-2.5, 3.0).to_string(), "(-2.5, 3)");
    }

    #[test]
    fn builder_sets_both_positions() {
        let drone = Drone::new("Mavvik", "sarcastic")
            .at(Position::new(1.0, 2.0))
            .with_user_at(Position::new(5.0, 5.0));
        assert_eq!(drone.position, Position::new(1.0, 2.0));
        assert_eq!(drone.user_position, Position::new(5.0, 5.0));
    }

    #[test]
    fn mutators_touch_only_their_position() {
        let mut drone = Drone::new("Mavvik", "sarcastic");
        drone.move_to(Position::new(3.0, 4.0));
        assert_eq!(drone.position, Position::new(3.0, 4.0));
        assert_eq!(drone.user_position, Position::default());

        drone.set_user_position(Position::new(7.0, 9.0));
        assert_eq!(drone.position, Position::new(3.0, 4.0));
        assert_eq!(drone.user_position, Position::new(7.0, 9.0));
    }
}
