//! Messages exchanged between client and server.
//!
//! The wire format is newline-delimited JSON. Clients send
//! [`ProtocolMessage`] commands; the server answers with full state
//! snapshots, which the client decodes into a [`GameState`].

use crate::error::SnapshotError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A command sent from a client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ProtocolMessage {
    /// Ask the server to move a piece to a named location
    MovePiece {
        /// Piece name
        name: String,
        /// Location id the piece was dropped on
        destination: String,
    },
}

/// One piece on the board: which piece, and at which named location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementEntry {
    /// Piece name, also used to look up its image
    pub name: String,
    /// Id of the layout rectangle the piece sits on
    pub location: String,
}

/// A complete game state snapshot.
///
/// `document` is the snapshot exactly as received, including keys this
/// crate does not interpret; label text substitution reads from it.
/// `pieces` is the decoded `game_board.pieces` list, in snapshot order.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    document: Value,
    pieces: Vec<PlacementEntry>,
}

impl Default for GameState {
    /// An empty board: `{"game_board": {"pieces": []}}`.
    fn default() -> Self {
        Self {
            document: serde_json::json!({ "game_board": { "pieces": [] } }),
            pieces: Vec::new(),
        }
    }
}

impl GameState {
    /// Validates and wraps a snapshot document.
    ///
    /// # Returns
    ///
    /// The state, or a [`SnapshotError`] if `game_board.pieces` is missing,
    /// not a list, or holds an entry without string `name`/`location`.
    pub fn from_value(document: Value) -> Result<Self, SnapshotError> {
        if !document.is_object() {
            return Err(SnapshotError::NotAnObject);
        }
        let pieces = document
            .get("game_board")
            .and_then(|board| board.get("pieces"))
            .ok_or(SnapshotError::MissingPieces)?
            .as_array()
            .ok_or(SnapshotError::PiecesNotAList)?
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let field = |field: &'static str| {
                    entry
                        .get(field)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or(SnapshotError::BadEntry { index, field })
                };
                Ok(PlacementEntry {
                    name: field("name")?,
                    location: field("location")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { document, pieces })
    }

    /// Parses a snapshot from JSON text.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(value)?)
    }

    /// Placements in snapshot order.
    pub fn pieces(&self) -> &[PlacementEntry] {
        &self.pieces
    }

    /// The raw snapshot.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Moves a piece, keeping `pieces` and the raw document in step.
    ///
    /// # Returns
    ///
    /// `false` if no piece has that name.
    pub fn move_piece(&mut self, name: &str, destination: &str) -> bool {
        let Some(idx) = self.pieces.iter().position(|p| p.name == name) else {
            return false;
        };
        self.pieces[idx].location = destination.to_string();
        if let Some(entry) = self
            .document
            .pointer_mut(&format!("/game_board/pieces/{idx}"))
            .and_then(Value::as_object_mut)
        {
            entry.insert("location".into(), Value::String(destination.to_string()));
        }
        true
    }
}

/// Encodes a value as one wire line (JSON plus trailing newline).
pub fn encode_line<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    Ok(line)
}

/// Decodes a client command line. Unknown commands fail to decode.
pub fn decode_command(line: &str) -> Result<ProtocolMessage, serde_json::Error> {
    serde_json::from_str(line.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_move_piece_wire_shape() {
        let msg = ProtocolMessage::MovePiece {
            name: "red_pawn_1".into(),
            destination: "L2".into(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({"command": "move_piece", "name": "red_pawn_1", "destination": "L2"})
        );
        let line = encode_line(&msg).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(decode_command(&line).unwrap(), msg);
    }

    #[test]
    fn test_unknown_command_does_not_decode() {
        assert!(decode_command(r#"{"command":"roll_dice","sides":6}"#).is_err());
    }

    #[test]
    fn test_snapshot_keeps_passthrough_keys() {
        let state = GameState::from_value(json!({
            "game_board": {"pieces": [{"name": "p1", "location": "L1"}], "turn": 3},
            "players": ["ann", "bo"],
        }))
        .unwrap();
        assert_eq!(state.pieces().len(), 1);
        assert_eq!(state.document()["players"][1], "bo");
        assert_eq!(state.document()["game_board"]["turn"], 3);
    }

    #[test]
    fn test_malformed_snapshots_are_rejected() {
        assert_eq!(
            GameState::from_value(json!([1, 2])),
            Err(SnapshotError::NotAnObject)
        );
        assert_eq!(
            GameState::from_value(json!({"players": []})),
            Err(SnapshotError::MissingPieces)
        );
        assert_eq!(
            GameState::from_value(json!({"game_board": {"pieces": "none"}})),
            Err(SnapshotError::PiecesNotAList)
        );
        assert_eq!(
            GameState::from_value(json!({"game_board": {"pieces": [{"name": "p1"}]}})),
            Err(SnapshotError::BadEntry {
                index: 0,
                field: "location"
            })
        );
    }

    #[test]
    fn test_move_piece_updates_document() {
        let mut state = GameState::from_value(json!({
            "game_board": {"pieces": [
                {"name": "p1", "location": "L1", "colour": "red"},
                {"name": "p2", "location": "L1"}
            ]}
        }))
        .unwrap();
        assert!(state.move_piece("p2", "L3"));
        assert!(!state.move_piece("p9", "L3"));
        assert_eq!(state.pieces()[1].location, "L3");
        assert_eq!(state.document()["game_board"]["pieces"][1]["location"], "L3");
        assert_eq!(state.document()["game_board"]["pieces"][0]["colour"], "red");
    }
}
