#![allow(dead_code)]
//! The authoritative broadcast fabric (spec.md §4.9). Grounded on
//! `games_service/long_poller/long_poller.rs`'s `ALL_USERS_MAP`/`LongPoller`/
//! `send_message`: a registry of per-user channels, read-locked just long
//! enough to clone the senders before the actual sends happen outside the
//! lock. The difference from that teacher code is the queue shape — a
//! bounded `mpsc` per seat with accepted-loss on overflow instead of an
//! unbounded one, since §4.9 calls for capacity 1024 and "accepted loss"
//! rather than backpressure on a slow reader.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::entities::buildable::{BuildableType, SeatIndex};
use crate::entities::hand::CardType;
use crate::entities::trade_offer::TradeOffer;
use crate::interaction::ActionDescriptor;

/// Outbound queue capacity per seat (spec.md §4.9).
pub const QUEUE_CAPACITY: usize = 1024;

/// One broadcast-worthy event. `GameState` is the full public view sent
/// after any mutating action; the rest are narrower diffs a client can
/// apply incrementally without waiting for the next full snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BroadcastMessage {
    GameState(Box<PublicGameView>),
    PlayerSecret(Box<PlayerSecretView>),
    CardMove {
        from: Option<SeatIndex>,
        to: Option<SeatIndex>,
        card: Option<CardType>,
        qty: i32,
    },
    VertexBuild {
        seat: SeatIndex,
        at: crate::board::coordinate::VertexCoord,
        kind: BuildableType,
    },
    EdgeBuild {
        seat: SeatIndex,
        at: crate::board::coordinate::EdgeCoord,
    },
    DiceRolled {
        red: u32,
        white: u32,
        event: Option<u32>,
    },
    RobberMoved {
        at: crate::board::coordinate::TileCoord,
    },
    TradeOfferUpdate(TradeOffer),
    TradeOffersClosed,
    TurnChanged {
        seat: SeatIndex,
    },
    PendingAction {
        seat: SeatIndex,
        descriptor: ActionDescriptor,
    },
    PendingActionCleared {
        seat: SeatIndex,
    },
    GameOver {
        winner: SeatIndex,
    },
    Error {
        message: String,
    },
}

/// The sanitized, everyone-sees-this projection of `GameState` (spec.md
/// §4.9's "diffs", here taken to its simplest form: the whole public
/// surface, since the engine has no private board state beyond hands).
/// Hands are per-seat and sent only to their owner via `SendPlayerSecret`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicGameView {
    pub current_player: SeatIndex,
    pub dice_rolled: bool,
    pub last_roll: Option<(u32, u32)>,
    pub init_phase: bool,
    pub barbarian_position: u32,
    pub scores: Vec<u32>,
}

/// One seat's private hand, sent only to that seat (§4.9's
/// `SendPlayerSecret`: visible to its owner, never broadcast).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSecretView {
    pub seat: SeatIndex,
    pub resources: HashMap<CardType, i32>,
    pub dev_cards: HashMap<crate::entities::hand::DevCardType, (i32, bool)>,
}

/// One seat's outbound queue plus the receiver handed to its transport.
struct Outbox {
    tx: mpsc::Sender<BroadcastMessage>,
}

/// Per-game fan-out hub: one bounded queue per seat. `broadcast` reaches
/// every seat; `send_to` targets one (used for `PlayerSecretView` and
/// per-seat `PendingAction` prompts, neither of which other seats should
/// see).
pub struct BroadcastHub {
    outboxes: HashMap<SeatIndex, Outbox>,
}

impl BroadcastHub {
    /// Builds a hub for `seats` and returns the receivers the transport
    /// layer drains, one per seat, in the same order.
    pub fn new(seats: &[SeatIndex]) -> (Self, Vec<(SeatIndex, mpsc::Receiver<BroadcastMessage>)>) {
        let mut outboxes = HashMap::with_capacity(seats.len());
        let mut receivers = Vec::with_capacity(seats.len());
        for &seat in seats {
            let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
            outboxes.insert(seat, Outbox { tx });
            receivers.push((seat, rx));
        }
        (BroadcastHub { outboxes }, receivers)
    }

    /// Sends `msg` to every seat. A full queue drops the message for that
    /// seat only (accepted loss, §4.9) rather than blocking the caller or
    /// the other seats — ordering is preserved per-seat, never guaranteed
    /// across seats.
    pub fn broadcast(&self, msg: BroadcastMessage) {
        for outbox in self.outboxes.values() {
            let _ = outbox.tx.try_send(msg.clone());
        }
    }

    /// Sends `msg` to a single seat only, same accepted-loss semantics.
    pub fn send_to(&self, seat: SeatIndex, msg: BroadcastMessage) {
        if let Some(outbox) = self.outboxes.get(&seat) {
            let _ = outbox.tx.try_send(msg);
        }
    }

    pub fn seats(&self) -> impl Iterator<Item = SeatIndex> + '_ {
        self.outboxes.keys().copied()
    }
}

/// Builds the public view a `GameState::broadcast_state`-style call sends
/// to every seat after a mutation.
pub fn public_view(state: &crate::engine::GameState) -> PublicGameView {
    let scores = (0..state.num_players() as SeatIndex)
        .map(|s| state.public_victory_points(s))
        .collect();
    PublicGameView {
        current_player: state.current_player,
        dice_rolled: state.dice_rolled,
        last_roll: state.last_roll,
        init_phase: state.init_phase,
        barbarian_position: state.barbarian_position,
        scores,
    }
}

/// Builds `seat`'s private hand view (§4.9's `SendPlayerSecret`).
pub fn player_secret_view(state: &crate::engine::GameState, seat: SeatIndex) -> PlayerSecretView {
    let player = state.player(seat);
    let resources = player.hand.iter_cards().collect();
    let dev_cards = player
        .hand
        .iter_dev_cards()
        .map(|(t, deck)| (t, (deck.quantity, deck.can_use)))
        .collect();
    PlayerSecretView {
        seat,
        resources,
        dev_cards,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_every_seat_independently() {
        let (hub, mut receivers) = BroadcastHub::new(&[0, 1]);
        hub.broadcast(BroadcastMessage::TurnChanged { seat: 1 });

        for (_, rx) in receivers.iter_mut() {
            let msg = rx.recv().await.unwrap();
            assert!(matches!(msg, BroadcastMessage::TurnChanged { seat: 1 }));
        }
    }

    #[tokio::test]
    async fn send_to_reaches_only_the_target_seat() {
        let (hub, mut receivers) = BroadcastHub::new(&[0, 1]);
        hub.send_to(0, BroadcastMessage::PendingActionCleared { seat: 0 });

        let (_, rx0) = receivers.iter_mut().find(|(s, _)| *s == 0).unwrap();
        assert!(rx0.try_recv().is_ok());
        let (_, rx1) = receivers.iter_mut().find(|(s, _)| *s == 1).unwrap();
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn a_full_queue_drops_silently_without_blocking_other_seats() {
        let (hub, mut receivers) = BroadcastHub::new(&[0]);
        for _ in 0..QUEUE_CAPACITY {
            hub.broadcast(BroadcastMessage::TradeOffersClosed);
        }
        // queue is now full; one more is an accepted loss, not a panic or block.
        hub.broadcast(BroadcastMessage::TradeOffersClosed);

        let (_, rx) = receivers.iter_mut().next().unwrap();
        let mut drained = 0;
        while rx.try_recv().is_ok() {
            drained += 1;
        }
        assert_eq!(drained, QUEUE_CAPACITY);
    }
}
