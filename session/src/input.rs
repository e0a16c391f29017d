//! Translation of already-resolved input events into session intents

use protocol::MOVE_STEP;

/// A locally originated request to change state.
///
/// Intents carry no participant index; the session fills in its own owned
/// index when it maps an intent to a wire command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Move { dx: i32, dy: i32 },
    Attribute(String),
    Disconnect,
}

/// Maps one input token to an intent: direction tokens move by a fixed
/// step, color tokens change the attribute, and `quit` leaves the match.
/// Unknown tokens yield None.
pub fn parse_intent(token: &str) -> Option<Intent> {
    match token.to_ascii_lowercase().as_str() {
        "right" => Some(Intent::Move {
            dx: MOVE_STEP,
            dy: 0,
        }),
        "left" => Some(Intent::Move {
            dx: -MOVE_STEP,
            dy: 0,
        }),
        "up" => Some(Intent::Move {
            dx: 0,
            dy: -MOVE_STEP,
        }),
        "down" => Some(Intent::Move {
            dx: 0,
            dy: MOVE_STEP,
        }),
        "red" | "green" | "yellow" | "blue" => {
            Some(Intent::Attribute(token.to_ascii_lowercase()))
        }
        "quit" => Some(Intent::Disconnect),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_tokens() {
        assert_eq!(parse_intent("right"), Some(Intent::Move { dx: 10, dy: 0 }));
        assert_eq!(parse_intent("left"), Some(Intent::Move { dx: -10, dy: 0 }));
        assert_eq!(parse_intent("up"), Some(Intent::Move { dx: 0, dy: -10 }));
        assert_eq!(parse_intent("down"), Some(Intent::Move { dx: 0, dy: 10 }));
    }

    #[test]
    fn test_color_tokens() {
        for color in ["red", "green", "yellow", "blue"] {
            assert_eq!(
                parse_intent(color),
                Some(Intent::Attribute(color.to_string()))
            );
        }
    }

    #[test]
    fn test_quit_token() {
        assert_eq!(parse_intent("quit"), Some(Intent::Disconnect));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(parse_intent("RIGHT"), Some(Intent::Move { dx: 10, dy: 0 }));
        assert_eq!(
            parse_intent("Blue"),
            Some(Intent::Attribute("blue".to_string()))
        );
    }

    #[test]
    fn test_unknown_tokens_rejected() {
        for token in ["", "jump", "purple", "move:0:10:0"] {
            assert_eq!(parse_intent(token), None);
        }
    }
}
