/// Mouse input as the orbit controller consumes it.
///
/// The windowing layer translates platform events into these; nothing past
/// this boundary sees raw window events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouseInput {
    /// Left button pressed.
    LeftButtonDown,
    /// Left button released.
    LeftButtonUp,
    /// Relative pointer motion in pixels.
    Move { dx: i32, dy: i32 },
    /// Wheel notches, horizontal and vertical.
    Wheel { h: i32, v: i32 },
}

impl MouseInput {
    /// Parse a scripted input token: `down`, `up`, `move:DX,DY`, `wheel:V`.
    pub fn parse(token: &str) -> Option<Self> {
        let (kind, args) = token.split_once(':').unwrap_or((token, ""));
        let mut nums = args.split(',').filter(|s| !s.is_empty()).map(str::parse::<i32>);
        match kind {
            "down" => Some(Self::LeftButtonDown),
            "up" => Some(Self::LeftButtonUp),
            "move" => {
                let dx = nums.next()?.ok()?;
                let dy = nums.next()?.ok()?;
                Some(Self::Move { dx, dy })
            }
            "wheel" => {
                let v = nums.next()?.ok()?;
                Some(Self::Wheel { h: 0, v })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_buttons() {
        assert_eq!(MouseInput::parse("down"), Some(MouseInput::LeftButtonDown));
        assert_eq!(MouseInput::parse("up"), Some(MouseInput::LeftButtonUp));
    }

    #[test]
    fn parse_move_and_wheel() {
        assert_eq!(
            MouseInput::parse("move:12,-4"),
            Some(MouseInput::Move { dx: 12, dy: -4 })
        );
        assert_eq!(
            MouseInput::parse("wheel:-3"),
            Some(MouseInput::Wheel { h: 0, v: -3 })
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(MouseInput::parse("move:1"), None);
        assert_eq!(MouseInput::parse("move:a,b"), None);
        assert_eq!(MouseInput::parse("click"), None);
    }
}
