//! Game session: the client-side orchestrator.
//!
//! Holds the current snapshot and the sprites built from it, turns pointer
//! gestures into `move_piece` commands, and applies inbound snapshots. A
//! snapshot always replaces the previous state wholesale and triggers a full
//! sprite rebuild; moves are shown optimistically until the next snapshot
//! overwrites them.

use crate::channel::SyncChannel;
use crate::error::TransformError;
use crate::images::ImageLookup;
use crate::layout::LayoutIndex;
use crate::occupancy::{self, RenderedSprite};
use crate::protocol::{GameState, ProtocolMessage};
use crate::screen::ScreenTransform;
use log::{debug, warn};
use serde_json::Value;

/// What the pointer is currently holding.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Nothing held
    Idle,
    /// A piece is being dragged
    Dragging {
        /// Index of the held sprite in draw order
        sprite: usize,
        /// Name of the held piece
        piece_name: String,
        /// Where the sprite was before the drag, for rollback
        original_position: (f32, f32),
    },
}

/// Result of releasing the pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Nothing was held
    NotDragging,
    /// Dropped on a named location; a `move_piece` command was queued
    Moved {
        /// Piece that was moved
        piece_name: String,
        /// Location it was dropped on
        destination: String,
    },
    /// Dropped outside any location; the sprite went back where it was
    RolledBack {
        /// Piece that was restored
        piece_name: String,
    },
}

/// Client session state.
pub struct GameSession {
    layout: LayoutIndex,
    images: Box<dyn ImageLookup>,
    channel: SyncChannel,
    state: GameState,
    window_size: (f32, f32),
    transform: ScreenTransform,
    sprites: Vec<RenderedSprite>,
    selection: Selection,
}

impl GameSession {
    /// Creates a session and places the initial state.
    ///
    /// # Returns
    ///
    /// A [`TransformError`] if the layout or window has a non-positive extent.
    pub fn new(
        layout: LayoutIndex,
        images: Box<dyn ImageLookup>,
        channel: SyncChannel,
        initial_state: GameState,
        window_size: (f32, f32),
    ) -> Result<Self, TransformError> {
        let transform = layout.transform_for(window_size.0, window_size.1)?;
        let mut session = Self {
            layout,
            images,
            channel,
            state: initial_state,
            window_size,
            transform,
            sprites: Vec::new(),
            selection: Selection::Idle,
        };
        session.rebuild_sprites();
        Ok(session)
    }

    /// One update tick: service the channel, then apply at most one inbound
    /// message.
    ///
    /// # Returns
    ///
    /// `true` if the state was replaced this tick.
    pub fn tick(&mut self) -> bool {
        self.channel.service_channel();
        match self.channel.receive() {
            Some(value) => self.apply_inbound(value),
            None => false,
        }
    }

    /// Applies one inbound message.
    ///
    /// A valid snapshot replaces the state. Commands (anything carrying a
    /// `command` key) and malformed snapshots are logged and ignored, keeping
    /// the previous state.
    ///
    /// # Returns
    ///
    /// `true` if the state was replaced.
    pub fn apply_inbound(&mut self, value: Value) -> bool {
        if let Some(command) = value.get("command") {
            warn!("Ignoring inbound command {}", command);
            return false;
        }
        match GameState::from_value(value) {
            Ok(state) => {
                self.apply_snapshot(state);
                true
            }
            Err(e) => {
                warn!("Rejected inbound snapshot, keeping previous state: {}", e);
                false
            }
        }
    }

    /// Replaces the state and rebuilds every sprite.
    pub fn apply_snapshot(&mut self, state: GameState) {
        debug!("Applying snapshot with {} pieces", state.pieces().len());
        self.state = state;
        self.rebuild_sprites();
    }

    /// Recomputes the transform for a new window size and rebuilds sprites.
    ///
    /// On error the previous size, transform and sprites are kept.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), TransformError> {
        let transform = self.layout.transform_for(width, height)?;
        self.window_size = (width, height);
        self.transform = transform;
        self.rebuild_sprites();
        Ok(())
    }

    /// Pointer pressed at a window-space point. Grabs the topmost sprite
    /// under it, if any.
    ///
    /// # Returns
    ///
    /// `true` if a piece was picked up.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        let Some(idx) = self.sprites.iter().rposition(|s| s.contains(x, y)) else {
            return false;
        };
        let sprite = &self.sprites[idx];
        debug!("Picked up {}", sprite.piece_name);
        self.selection = Selection::Dragging {
            sprite: idx,
            piece_name: sprite.piece_name.clone(),
            original_position: sprite.position(),
        };
        true
    }

    /// Pointer moved by a window-space delta. Moves the held sprite, if any.
    pub fn pointer_motion(&mut self, dx: f32, dy: f32) {
        if let Selection::Dragging { sprite, .. } = self.selection {
            if let Some(sprite) = self.sprites.get_mut(sprite) {
                sprite.center_x += dx;
                sprite.center_y += dy;
            }
        }
    }

    /// Pointer released at a window-space point.
    ///
    /// Dropping on a named location queues a `move_piece` command and leaves
    /// the sprite where the pointer left it. Dropping anywhere else restores
    /// the sprite's pre-drag position and sends nothing.
    pub fn pointer_up(&mut self, x: f32, y: f32) -> DropOutcome {
        let Selection::Dragging {
            sprite,
            piece_name,
            original_position,
        } = std::mem::replace(&mut self.selection, Selection::Idle)
        else {
            return DropOutcome::NotDragging;
        };

        let destination = self
            .layout
            .hit_test(x, y, &self.transform)
            .and_then(|rect| rect.id.clone());

        match destination {
            Some(destination) => {
                debug!("Move {} to {}", piece_name, destination);
                self.channel.send(ProtocolMessage::MovePiece {
                    name: piece_name.clone(),
                    destination: destination.clone(),
                });
                DropOutcome::Moved {
                    piece_name,
                    destination,
                }
            }
            None => {
                debug!("No location at drop point; returning {}", piece_name);
                if let Some(sprite) = self.sprites.get_mut(sprite) {
                    sprite.set_position(original_position);
                }
                DropOutcome::RolledBack { piece_name }
            }
        }
    }

    /// Rebuilds sprites from the current state and transform.
    ///
    /// A held piece stays held: its new sprite keeps the dragged position and
    /// the rollback target becomes the freshly placed position. If the piece
    /// is gone from the new state the drag ends.
    fn rebuild_sprites(&mut self) {
        let held = match &self.selection {
            Selection::Dragging {
                sprite, piece_name, ..
            } => Some((
                piece_name.clone(),
                self.sprites.get(*sprite).map(RenderedSprite::position),
            )),
            Selection::Idle => None,
        };

        self.sprites = occupancy::resolve_placements(
            self.state.pieces(),
            &self.layout,
            self.images.as_ref(),
            &self.transform,
        );

        let Some((piece_name, dragged_position)) = held else {
            return;
        };
        match self.sprites.iter().rposition(|s| s.piece_name == piece_name) {
            Some(idx) => {
                let original_position = self.sprites[idx].position();
                if let Some(position) = dragged_position {
                    self.sprites[idx].set_position(position);
                }
                self.selection = Selection::Dragging {
                    sprite: idx,
                    piece_name,
                    original_position,
                };
            }
            None => {
                debug!("Held piece {} left the board; ending drag", piece_name);
                self.selection = Selection::Idle;
            }
        }
    }

    /// Sprites in draw order.
    pub fn sprites(&self) -> &[RenderedSprite] {
        &self.sprites
    }

    /// Current snapshot.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Current layout to window transform.
    pub fn transform(&self) -> &ScreenTransform {
        &self.transform
    }

    /// The layout being displayed.
    pub fn layout(&self) -> &LayoutIndex {
        &self.layout
    }

    /// Window size the transform was computed for.
    pub fn window_size(&self) -> (f32, f32) {
        self.window_size
    }

    /// Current pointer selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The session's channel.
    pub fn channel(&self) -> &SyncChannel {
        &self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::TransportEnd;
    use crate::images::ImageRef;
    use crate::layout::{Bounds, LayoutDocument, RectShape, Shape, Style};
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// 200x100 layout with L1 at (0,0) and L2 at (100,0), each 20x20.
    /// Shown in a 400x200 window, so ratio is 2 and there is no letterbox.
    fn session() -> (GameSession, TransportEnd) {
        let rect = |id: &str, x: f32| {
            Shape::Rect(RectShape {
                id: Some(id.to_string()),
                bounds: Bounds {
                    x,
                    y: 0.0,
                    width: 20.0,
                    height: 20.0,
                },
                style: Style::default(),
            })
        };
        let layout = LayoutIndex::new(LayoutDocument {
            width: 200.0,
            height: 100.0,
            shapes: vec![rect("L1", 0.0), rect("L2", 100.0)],
        });
        let images: HashMap<String, ImageRef> = ["p1", "p2"]
            .into_iter()
            .map(|name| {
                (
                    name.to_string(),
                    ImageRef {
                        path: PathBuf::from(format!("{name}.svg")),
                        width: 10.0,
                        height: 10.0,
                    },
                )
            })
            .collect();
        let state = GameState::from_value(json!({
            "game_board": {"pieces": [
                {"name": "p1", "location": "L1"},
                {"name": "p2", "location": "L1"}
            ]}
        }))
        .unwrap();
        let (channel, transport) = SyncChannel::new();
        let session =
            GameSession::new(layout, Box::new(images), channel, state, (400.0, 200.0)).unwrap();
        (session, transport)
    }

    #[test]
    fn test_pointer_down_grabs_topmost_sprite() {
        let (mut session, _transport) = session();
        // p1 at (35,20), p2 at (20,20), both 20x20: they overlap around x=28
        assert!(session.pointer_down(28.0, 20.0));
        match session.selection() {
            Selection::Dragging { piece_name, .. } => assert_eq!(piece_name, "p2"),
            Selection::Idle => panic!("expected a drag"),
        }
    }

    #[test]
    fn test_pointer_down_on_empty_space_stays_idle() {
        let (mut session, _transport) = session();
        assert!(!session.pointer_down(300.0, 150.0));
        assert_eq!(session.selection(), &Selection::Idle);
    }

    #[test]
    fn test_drop_outside_locations_rolls_back() {
        let (mut session, mut transport) = session();
        let before = session.sprites()[1].position();
        assert!(session.pointer_down(20.0, 20.0));
        session.pointer_motion(150.0, 120.0);
        assert_eq!(session.sprites()[1].position(), (170.0, 140.0));

        let outcome = session.pointer_up(170.0, 140.0);
        assert_eq!(
            outcome,
            DropOutcome::RolledBack {
                piece_name: "p2".into()
            }
        );
        assert_eq!(session.sprites()[1].position(), before);
        assert_eq!(session.selection(), &Selection::Idle);

        session.tick();
        assert!(transport.outbound.try_recv().is_err());
    }

    #[test]
    fn test_drop_on_location_queues_one_move() {
        let (mut session, mut transport) = session();
        assert!(session.pointer_down(20.0, 20.0));
        session.pointer_motion(200.0, 0.0);
        let outcome = session.pointer_up(220.0, 20.0);
        assert_eq!(
            outcome,
            DropOutcome::Moved {
                piece_name: "p2".into(),
                destination: "L2".into()
            }
        );
        // optimistic: sprite stays where it was dropped
        assert_eq!(session.sprites()[1].position(), (220.0, 20.0));

        // not visible to the transport until the channel is serviced
        assert!(transport.outbound.try_recv().is_err());
        session.tick();
        assert_eq!(
            transport.outbound.try_recv().unwrap(),
            ProtocolMessage::MovePiece {
                name: "p2".into(),
                destination: "L2".into()
            }
        );
        assert!(transport.outbound.try_recv().is_err());
    }

    #[test]
    fn test_pointer_up_without_drag() {
        let (mut session, _transport) = session();
        assert_eq!(session.pointer_up(20.0, 20.0), DropOutcome::NotDragging);
    }

    #[test]
    fn test_snapshots_apply_one_per_tick() {
        let (mut session, transport) = session();
        for location in ["L2", "L1"] {
            transport
                .inbound
                .send(json!({"game_board": {"pieces": [{"name": "p1", "location": location}]}}))
                .unwrap();
        }
        assert!(session.tick());
        assert_eq!(session.state().pieces()[0].location, "L2");
        assert_eq!(session.sprites().len(), 1);
        assert_eq!(session.sprites()[0].position(), (220.0, 20.0));

        assert!(session.tick());
        assert_eq!(session.state().pieces()[0].location, "L1");
        assert!(!session.tick());
    }

    #[test]
    fn test_malformed_and_command_messages_keep_state() {
        let (mut session, transport) = session();
        let before = session.state().clone();
        transport.inbound.send(json!({"game_board": {}})).unwrap();
        transport
            .inbound
            .send(json!({"command": "roll_dice", "sides": 6}))
            .unwrap();
        assert!(!session.tick());
        assert!(!session.tick());
        assert_eq!(session.state(), &before);
        assert_eq!(session.sprites().len(), 2);
    }

    #[test]
    fn test_unknown_location_in_snapshot_is_skipped() {
        let (mut session, _transport) = session();
        session.apply_snapshot(
            GameState::from_value(json!({"game_board": {"pieces": [
                {"name": "p1", "location": "nowhere"},
                {"name": "p2", "location": "L2"}
            ]}}))
            .unwrap(),
        );
        assert_eq!(session.sprites().len(), 1);
        assert_eq!(session.sprites()[0].piece_name, "p2");
    }

    #[test]
    fn test_snapshot_during_drag_keeps_piece_held() {
        let (mut session, _transport) = session();
        assert!(session.pointer_down(20.0, 20.0));
        session.pointer_motion(0.0, 100.0);

        // Another player moved p1; p2 is now alone on L1
        session.apply_snapshot(
            GameState::from_value(json!({"game_board": {"pieces": [
                {"name": "p2", "location": "L1"},
                {"name": "p1", "location": "L2"}
            ]}}))
            .unwrap(),
        );
        match session.selection() {
            Selection::Dragging {
                sprite,
                piece_name,
                original_position,
            } => {
                assert_eq!(piece_name, "p2");
                assert_eq!(*sprite, 0);
                assert_eq!(*original_position, (20.0, 20.0));
            }
            Selection::Idle => panic!("drag should survive the snapshot"),
        }
        assert_eq!(session.sprites()[0].position(), (20.0, 120.0));

        // Released off-board: back to the authoritative position
        session.pointer_up(20.0, 190.0);
        assert_eq!(session.sprites()[0].position(), (20.0, 20.0));
    }

    #[test]
    fn test_snapshot_removing_held_piece_ends_drag() {
        let (mut session, _transport) = session();
        assert!(session.pointer_down(20.0, 20.0));
        session.apply_snapshot(
            GameState::from_value(json!({"game_board": {"pieces": [
                {"name": "p1", "location": "L1"}
            ]}}))
            .unwrap(),
        );
        assert_eq!(session.selection(), &Selection::Idle);
    }

    #[test]
    fn test_resize_rebuilds_and_rejects_bad_sizes() {
        let (mut session, _transport) = session();
        session.resize(200.0, 100.0).unwrap();
        assert_eq!(session.transform().ratio, 1.0);
        assert_eq!(session.sprites()[1].position(), (10.0, 10.0));

        assert!(session.resize(0.0, 100.0).is_err());
        assert_eq!(session.window_size(), (200.0, 100.0));
        assert_eq!(session.transform().ratio, 1.0);
    }
}
