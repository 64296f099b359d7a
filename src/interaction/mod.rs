#![allow(dead_code)]
//! The suspend-for-reply interaction protocol (spec.md §4.5). Grounded on
//! `original_source/entities/actions.go` (`PlayerAction`/`PlayerActionType*`
//! tag constants) for the wire shape, and `original_source/game/comm.go`'s
//! `BlockForAction` for the timeout-injection race: a 1Hz ticker competes
//! with the player's reply, decrementing the allotted time and resolving to
//! `None` on expiry or once the seat has been handed to the bot driver.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::time::{interval, Duration};

use crate::entities::buildable::SeatIndex;
use crate::entities::player::ActionReply;

/// Mirrors the original's `PlayerActionType*` string tags one-to-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    SelectCards,
    SelectCardsDone,
    ChooseTile,
    ChoosePlayer,
    ChooseVertex,
    ChooseEdge,
    ChooseDice,
    ChooseImprovement,
}

/// What a suspended action asks the player for. `data` carries the
/// kind-specific payload (allowed tiles, card quantities, etc.) as JSON
/// rather than an `interface{}`, since the kind tag already disambiguates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub kind: ActionKind,
    pub data: serde_json::Value,
    pub can_cancel: bool,
    pub message: String,
}

impl ActionDescriptor {
    pub fn new(kind: ActionKind, data: serde_json::Value, message: impl Into<String>) -> Self {
        ActionDescriptor {
            kind,
            data,
            can_cancel: false,
            message: message.into(),
        }
    }

    pub fn cancelable(mut self) -> Self {
        self.can_cancel = true;
        self
    }
}

/// Runs the timeout-vs-reply race described in spec.md §4.5.
///
/// `timeout_secs == 0` blocks indefinitely on `rx` (cancelable actions with
/// no forced clock, e.g. a trade offer). `timeout_secs > 0` ticks once a
/// second, calling `on_tick` with the seconds remaining; `on_tick` returning
/// `true` ends the wait early (used for "seat became a bot" checks). The
/// reply is `None` on an explicit cancel, a timeout, or a dropped sender.
pub async fn race_reply_against_timeout<F>(
    mut rx: oneshot::Receiver<ActionReply>,
    timeout_secs: u32,
    mut on_tick: F,
) -> ActionReply
where
    F: FnMut(u32) -> bool,
{
    if timeout_secs == 0 {
        return rx.await.unwrap_or(None);
    }

    let mut remaining = timeout_secs;
    let mut ticker = interval(Duration::from_secs(1));
    ticker.tick().await; // the first tick fires immediately; discard it

    loop {
        tokio::select! {
            reply = &mut rx => {
                return reply.unwrap_or(None);
            }
            _ = ticker.tick() => {
                remaining = remaining.saturating_sub(1);
                if remaining == 0 || on_tick(remaining) {
                    return None;
                }
            }
        }
    }
}

/// Fans out a prompt to several seats at once and joins on all of them,
/// the gold-distribution/Wedding shape (spec.md Open Questions): each
/// seat's reply races its own clock independently, and a seat already
/// flagged a bot by the time its prompt is issued ends its wait
/// immediately rather than burning the full timeout. The caller is
/// expected to have released any session-wide lock before calling this
/// and to reacquire it once the returned vector settles (the barrier).
pub async fn run_concurrent_prompts<C>(
    receivers: Vec<(SeatIndex, oneshot::Receiver<ActionReply>)>,
    timeout_secs: u32,
    is_bot: C,
) -> Vec<(SeatIndex, ActionReply)>
where
    C: Fn(SeatIndex) -> bool + Send + Sync + 'static,
{
    let is_bot = Arc::new(is_bot);
    let mut handles = Vec::with_capacity(receivers.len());
    for (seat, rx) in receivers {
        let is_bot = is_bot.clone();
        handles.push(tokio::spawn(async move {
            let reply = race_reply_against_timeout(rx, timeout_secs, move |_| is_bot(seat)).await;
            (seat, reply)
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        if let Ok(pair) = handle.await {
            results.push(pair);
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reply_before_timeout_wins() {
        let (tx, rx) = oneshot::channel();
        tx.send(Some(serde_json::json!({"ok": true}))).unwrap();
        let reply = race_reply_against_timeout(rx, 5, |_| false).await;
        assert_eq!(reply, Some(serde_json::json!({"ok": true})));
    }

    #[tokio::test]
    async fn on_tick_can_end_the_wait_early() {
        let (_tx, rx) = oneshot::channel();
        let reply = race_reply_against_timeout(rx, 5, |_| true).await;
        assert_eq!(reply, None);
    }

    #[tokio::test]
    async fn concurrent_prompts_collect_every_seat_reply() {
        let (tx0, rx0) = oneshot::channel();
        let (tx1, rx1) = oneshot::channel();
        tx0.send(Some(serde_json::json!(1))).unwrap();
        tx1.send(Some(serde_json::json!(2))).unwrap();

        let mut results = run_concurrent_prompts(vec![(0, rx0), (1, rx1)], 5, |_| false).await;
        results.sort_by_key(|(seat, _)| *seat);
        assert_eq!(
            results,
            vec![(0, Some(serde_json::json!(1))), (1, Some(serde_json::json!(2)))]
        );
    }
}
