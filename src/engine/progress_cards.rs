#![allow(dead_code)]
//! Cities & Knights progress card use effects, one `use_progress_*` per
//! card across the Paper/Cloth/Coin stacks. Grounded on
//! `original_source/game/actions_progress_paper.go`,
//! `actions_progress_cloth.go` and `actions_progress_coin.go` (spec.md §4.4).
//!
//! Unlike Base development cards, using a progress card never disables the
//! rest of the player's hand and the card itself returns to the bottom of
//! its stack rather than being destroyed (`consume_progress_card`).

use rand::Rng;

use crate::board::coordinate::{EdgeCoord, TileCoord, VertexCoord};
use crate::entities::buildable::{BuildableType, KnightLevel, SeatIndex, VertexBuildable};
use crate::entities::hand::{CardType, DevCardType};
use crate::error::{GameError, GameResult};
use crate::journal::JournalRecord;

use super::state::GameState;

impl GameState {
    fn check_progress_card(&self, seat: SeatIndex, card: DevCardType) -> GameResult<()> {
        if !self.cities_and_knights {
            return Err(GameError::BadRequest("wrong game mode".into()));
        }
        self.validate_turn(seat, false, false)?;
        let deck = self.player(seat).hand.dev_deck(card);
        if deck.quantity < 1 {
            return Err(GameError::NotFound(format!("{:?} not held", card)));
        }
        if !deck.can_use {
            return Err(GameError::BadRequest(format!("{:?} cannot be used this turn", card)));
        }
        Ok(())
    }

    /// Removes the card and returns it to the bottom of its stack; progress
    /// cards are reusable by future draws, unlike Base's destroyed pile.
    fn consume_progress_card(&mut self, seat: SeatIndex, card: DevCardType) {
        self.player_mut(seat).hand.try_remove_dev_card(card);
        self.journal.write(JournalRecord::UpdateDevelopmentCard {
            seat: Some(seat),
            card,
            quantity_delta: -1,
            num_used_delta: 1,
            can_use: false,
        });
        if let Some(stack) = card.commodity_stack() {
            self.bank.reinsert_progress_card(stack, card);
            self.journal.write(JournalRecord::ReinsertDevelopmentCard { stack, card });
        }
    }

    fn vertex_owner_id(&self, v: VertexCoord) -> Option<crate::entities::buildable::BuildableId> {
        self.graph.vertices.get(&v).and_then(|x| x.placement)
    }

    // ---- Paper stack ----------------------------------------------------

    /// Alchemist: played *before* rolling, not after — it picks the red/white
    /// pair the turn's roll produces instead of leaving it to chance. An
    /// out-of-range or missing pick in either die falls back to a random
    /// roll for that die (`actions_progress_paper.go`'s `UseProgressPaperAlchemist`,
    /// whose malformed-reply path rerolls both dice).
    pub fn use_alchemist_card(
        &mut self,
        seat: SeatIndex,
        red: Option<u32>,
        white: Option<u32>,
    ) -> GameResult<super::dice::RollResult> {
        if !self.cities_and_knights {
            return Err(GameError::BadRequest("wrong game mode".into()));
        }
        if seat != self.current_player {
            return Err(GameError::NotCurrentPlayer);
        }
        if self.dice_rolled {
            return Err(GameError::BadRequest("can only use this before rolling".into()));
        }
        if self.player(seat).has_pending_action() {
            return Err(GameError::PendingActionExists);
        }
        let deck = self.player(seat).hand.dev_deck(DevCardType::Alchemist);
        if deck.quantity < 1 || !deck.can_use {
            return Err(GameError::NotFound("Alchemist not held".into()));
        }

        let red = red.filter(|&d| (1..=6).contains(&d)).unwrap_or(0);
        let white = white.filter(|&d| (1..=6).contains(&d)).unwrap_or(0);
        let result = self.roll_dice(seat, red, white)?;
        self.consume_progress_card(seat, DevCardType::Alchemist);
        Ok(result)
    }

    /// Crane: the next city improvement this turn costs one fewer commodity.
    /// Modeled as a direct pass-through to `build_city_improvement`'s
    /// existing `crane_assist` parameter rather than tracked state, so the
    /// card is consumed at the moment of use.
    pub fn use_crane_card(
        &mut self,
        seat: SeatIndex,
        commodity: CardType,
        metropolis_choice: Option<VertexCoord>,
    ) -> GameResult<()> {
        self.check_progress_card(seat, DevCardType::Crane)?;
        self.can_build_improvement(seat, commodity, true)?;
        self.consume_progress_card(seat, DevCardType::Crane);
        self.build_city_improvement(seat, commodity, true, metropolis_choice)
    }

    /// Engineer: one free city wall, bypassing the brick cost.
    pub fn use_engineer_card(&mut self, seat: SeatIndex, at: VertexCoord) -> GameResult<()> {
        self.check_progress_card(seat, DevCardType::Engineer)?;
        self.build_free_wall(seat, at)?;
        self.consume_progress_card(seat, DevCardType::Engineer);
        Ok(())
    }

    /// Inventor: swap the number tokens of two tiles (neither the desert nor
    /// a 6/8 may end up adjacent to another 6/8, same rule as initial
    /// assignment). Missing or illegal coordinates leave the board untouched
    /// and still consume the card (`UseInventor`'s malformed-reply policy).
    pub fn use_inventor_card(&mut self, seat: SeatIndex, a: Option<TileCoord>, b: Option<TileCoord>) -> GameResult<()> {
        self.check_progress_card(seat, DevCardType::Inventor)?;
        self.consume_progress_card(seat, DevCardType::Inventor);

        let swappable = |g: &GameState, c: TileCoord| -> bool {
            g.graph
                .tiles
                .get(&c)
                .map(|t| !t.fog && t.number > 1 && !matches!(t.number, 2 | 6 | 8 | 12))
                .unwrap_or(false)
        };
        let (Some(a), Some(b)) = (a, b) else { return Ok(()) };
        if a == b || !swappable(self, a) || !swappable(self, b) {
            return Ok(());
        }
        let (Some((type_a, num_a)), Some((type_b, num_b))) = (
            self.graph.tiles.get(&a).map(|t| (t.tile_type, t.number)),
            self.graph.tiles.get(&b).map(|t| (t.tile_type, t.number)),
        ) else {
            return Ok(());
        };
        if let Some(t) = self.graph.tiles.get_mut(&a) {
            t.number = num_b;
        }
        if let Some(t) = self.graph.tiles.get_mut(&b) {
            t.number = num_a;
        }
        self.journal.write(JournalRecord::SetTileType { center: a, tile_type: type_a, number: num_b });
        self.journal.write(JournalRecord::SetTileType { center: b, tile_type: type_b, number: num_a });
        Ok(())
    }

    /// Irrigation: grants 2 grain per settlement/city touching a tile
    /// adjacent to both a field and a Wheat-producing tile, doubled for
    /// cities. Simplified per `UseIrrigation` to: 2 wheat per settlement and
    /// 4 per city the player owns adjacent to any Wheat tile.
    pub fn use_irrigation_card(&mut self, seat: SeatIndex) -> GameResult<i32> {
        self.check_progress_card(seat, DevCardType::Irrigation)?;
        self.consume_progress_card(seat, DevCardType::Irrigation);

        let mut granted = 0i32;
        let placements: Vec<(VertexCoord, BuildableType)> = self
            .player(seat)
            .vertex_placements
            .values()
            .map(|p| (p.at(), p.kind()))
            .collect();
        for (v, kind) in placements {
            let touches_wheat = self
                .graph
                .tiles_touching_vertex(v)
                .iter()
                .any(|t| self.graph.tiles.get(t).map(|t| t.tile_type) == Some(crate::board::tile::TileType::Wheat));
            if !touches_wheat {
                continue;
            }
            let qty = match kind {
                BuildableType::City => 4,
                BuildableType::Settlement => 2,
                _ => 0,
            };
            if qty > 0 {
                let have = self.bank.hand.count(CardType::Wheat).min(qty);
                self.grant_from_bank(seat, CardType::Wheat, have);
                granted += have;
            }
        }
        Ok(granted)
    }

    /// Medicine: a free city (the already-existing `build_free_city` helper
    /// fully subsidizes the cost, grounded on the same "do not check the
    /// bank" comment this card cites).
    pub fn use_medicine_card(&mut self, seat: SeatIndex, at: VertexCoord) -> GameResult<()> {
        self.check_progress_card(seat, DevCardType::Medicine)?;
        self.build_free_city(seat, at)?;
        self.consume_progress_card(seat, DevCardType::Medicine);
        Ok(())
    }

    /// Mining: grants 2 ore per settlement/city touching an Ore tile, double
    /// for cities, mirroring Irrigation's grain variant.
    pub fn use_mining_card(&mut self, seat: SeatIndex) -> GameResult<i32> {
        self.check_progress_card(seat, DevCardType::Mining)?;
        self.consume_progress_card(seat, DevCardType::Mining);

        let mut granted = 0i32;
        let placements: Vec<(VertexCoord, BuildableType)> = self
            .player(seat)
            .vertex_placements
            .values()
            .map(|p| (p.at(), p.kind()))
            .collect();
        for (v, kind) in placements {
            let touches_ore = self
                .graph
                .tiles_touching_vertex(v)
                .iter()
                .any(|t| self.graph.tiles.get(t).map(|t| t.tile_type) == Some(crate::board::tile::TileType::Ore));
            if !touches_ore {
                continue;
            }
            let qty = match kind {
                BuildableType::City => 4,
                BuildableType::Settlement => 2,
                _ => 0,
            };
            if qty > 0 {
                let have = self.bank.hand.count(CardType::Ore).min(qty);
                self.grant_from_bank(seat, CardType::Ore, have);
                granted += have;
            }
        }
        Ok(granted)
    }

    /// Progress Road Building: same two free roads as the Base card, just
    /// drawn from the Paper stack and reusable.
    pub fn use_progress_road_building_card(
        &mut self,
        seat: SeatIndex,
        first: Option<EdgeCoord>,
        second: Option<EdgeCoord>,
    ) -> GameResult<()> {
        self.check_progress_card(seat, DevCardType::ProgressRoadBuilding)?;
        self.consume_progress_card(seat, DevCardType::ProgressRoadBuilding);
        self.free_road_or_fallback(seat, first);
        self.free_road_or_fallback(seat, second);
        Ok(())
    }

    /// Smith: upgrades up to 2 of the player's own knights one level each,
    /// for free. Missing/illegal picks are filled with the player's own
    /// cheapest upgradeable knight, same malformed-reply policy as the rest
    /// of the stack.
    pub fn use_smith_card(&mut self, seat: SeatIndex, picks: &[VertexCoord]) -> GameResult<()> {
        self.check_progress_card(seat, DevCardType::Smith)?;
        self.consume_progress_card(seat, DevCardType::Smith);

        let upgradeable = |g: &GameState, v: VertexCoord| -> bool {
            matches!(
                g.vertex_owner_id(v).and_then(|id| {
                    if id.owner != seat {
                        return None;
                    }
                    g.player(seat).vertex_placements.get(&id.id).cloned()
                }),
                Some(VertexBuildable::Knight { level, .. }) if level.upgrade().is_some()
            )
        };

        let mut targets: Vec<VertexCoord> = picks.iter().copied().filter(|&v| upgradeable(self, v)).collect();
        targets.dedup();
        targets.truncate(2);
        while targets.len() < 2 {
            let Some(v) = self
                .player(seat)
                .knights()
                .map(|k| k.at())
                .find(|&v| upgradeable(self, v) && !targets.contains(&v))
            else {
                break;
            };
            targets.push(v);
        }

        for at in targets {
            let _ = self.costless_knight_upgrade(seat, at);
        }
        Ok(())
    }

    /// Upgrades `seat`'s knight at `at` one level without charging the
    /// usual Wool/Ore cost, preserving its activation state.
    fn costless_knight_upgrade(&mut self, seat: SeatIndex, at: VertexCoord) -> GameResult<()> {
        let id = self.vertex_owner_id(at).filter(|id| id.owner == seat).ok_or(GameError::IllegalLocation("no own knight".into()))?;
        let next_level = match self.player(seat).vertex_placements.get(&id.id) {
            Some(VertexBuildable::Knight { level, .. }) => level.upgrade().ok_or(GameError::NoPiecesLeft)?,
            _ => return Err(GameError::IllegalLocation("not a knight".into())),
        };
        if let Some(VertexBuildable::Knight { level, .. }) = self.player_mut(seat).vertex_placements.get_mut(&id.id) {
            *level = next_level;
        }
        self.journal.write(JournalRecord::VertexBuild { at, placement: Some((seat, BuildableType::Knight)), force: false });
        Ok(())
    }

    // ---- Cloth stack ------------------------------------------------------

    /// Commercial Harbor: swap one card in the player's hand for a resource
    /// of their choice, as if trading 1:1 with the bank. The original loops
    /// letting the player repeat this; the engine resolves one exchange per
    /// call and leaves looping to the caller.
    pub fn use_commercial_harbor_card(&mut self, seat: SeatIndex, give: CardType, take: CardType) -> GameResult<()> {
        self.check_progress_card(seat, DevCardType::CommercialHarbor)?;
        if !give.is_resource() || !take.is_resource() {
            return Err(GameError::BadRequest("commercial harbor trades resources only".into()));
        }
        if self.player(seat).hand.count(give) < 1 || self.bank.hand.count(take) < 1 {
            return Err(GameError::InsufficientResources);
        }
        self.consume_progress_card(seat, DevCardType::CommercialHarbor);
        self.move_cards(Some(seat), None, give, 1, true)?;
        self.grant_from_bank(seat, take, 1);
        Ok(())
    }

    /// Master Merchant: steal up to 2 cards (of the player's choosing, or
    /// random if unspecified/illegal) from the richest opponent, then may
    /// trade with the bank at the 2:1 rate during this action — approximated
    /// here as the straight steal; the follow-on trade is its own action.
    pub fn use_master_merchant_card(&mut self, seat: SeatIndex, picks: &[CardType]) -> GameResult<(SeatIndex, Vec<CardType>)> {
        self.check_progress_card(seat, DevCardType::MasterMerchant)?;
        let richest = (0..self.num_players() as SeatIndex)
            .filter(|&s| s != seat)
            .max_by_key(|&s| self.player(s).hand.total_cards())
            .ok_or_else(|| GameError::NotFound("no opponents".into()))?;
        self.consume_progress_card(seat, DevCardType::MasterMerchant);

        let mut taken = Vec::new();
        for want in picks.iter().copied().take(2) {
            if self.player(richest).hand.count(want) > 0 {
                self.move_cards(Some(richest), Some(seat), want, 1, true)?;
                taken.push(want);
            }
        }
        while taken.len() < 2 {
            let Some(card) = self.player(richest).hand.random_card_type(&mut self.rng) else { break };
            self.move_cards(Some(richest), Some(seat), card, 1, true)?;
            taken.push(card);
        }
        Ok((richest, taken))
    }

    /// Merchant: places the merchant piece on a tile the player owns an
    /// adjacent settlement/city on, granting +1 floating VP while it stays
    /// there and a personal 2:1 trade rate for one resource this turn.
    pub fn use_merchant_card(&mut self, seat: SeatIndex, at: TileCoord, rate_resource: CardType) -> GameResult<()> {
        self.check_progress_card(seat, DevCardType::Merchant)?;
        let owns_adjacent = at
            .vertices()
            .iter()
            .any(|&v| self.vertex_owner_id(v).map(|id| id.owner) == Some(seat));
        if !owns_adjacent || !rate_resource.is_resource() {
            return Err(GameError::IllegalLocation("merchant must sit on a tile you touch".into()));
        }
        self.consume_progress_card(seat, DevCardType::Merchant);
        self.merchant = Some((at, seat));
        self.merchant_fleet.insert(seat, rate_resource);
        self.journal.write(JournalRecord::Merchant { tile: at, owner: seat });
        self.recompute_extra_vp();
        Ok(())
    }

    /// Merchant Fleet: a 2:1 bank rate for one chosen commodity or resource,
    /// lasting the rest of this turn only (cleared in
    /// `end_turn_reset_development_cards`).
    pub fn use_merchant_fleet_card(&mut self, seat: SeatIndex, card: CardType) -> GameResult<()> {
        self.check_progress_card(seat, DevCardType::MerchantFleet)?;
        self.consume_progress_card(seat, DevCardType::MerchantFleet);
        self.merchant_fleet.insert(seat, card);
        self.journal.write(JournalRecord::MerchantFleet { commodity: card });
        Ok(())
    }

    /// Resource Monopoly: like Base Monopoly but for exactly 2 cards per
    /// opponent instead of their whole stock.
    pub fn use_resource_monopoly_card(&mut self, seat: SeatIndex, resource: Option<CardType>) -> GameResult<(CardType, Vec<(SeatIndex, i32)>)> {
        self.check_progress_card(seat, DevCardType::ResourceMonopoly)?;
        let resource = resource.filter(|c| c.is_resource()).unwrap_or(CardType::Wood);
        self.consume_progress_card(seat, DevCardType::ResourceMonopoly);

        let mut stolen = Vec::new();
        for victim in 0..self.num_players() as SeatIndex {
            if victim == seat {
                continue;
            }
            let qty = self.player(victim).hand.count(resource).min(2);
            if qty > 0 {
                let _ = self.move_cards(Some(victim), Some(seat), resource, qty, true);
                stolen.push((victim, qty));
            }
        }
        Ok((resource, stolen))
    }

    /// Trade Monopoly: like Resource Monopoly but for a commodity.
    pub fn use_trade_monopoly_card(&mut self, seat: SeatIndex, commodity: Option<CardType>) -> GameResult<(CardType, Vec<(SeatIndex, i32)>)> {
        self.check_progress_card(seat, DevCardType::TradeMonopoly)?;
        let commodity = commodity.filter(|c| c.is_commodity()).unwrap_or(CardType::Paper);
        self.consume_progress_card(seat, DevCardType::TradeMonopoly);

        let mut stolen = Vec::new();
        for victim in 0..self.num_players() as SeatIndex {
            if victim == seat {
                continue;
            }
            let qty = self.player(victim).hand.count(commodity).min(2);
            if qty > 0 {
                let _ = self.move_cards(Some(victim), Some(seat), commodity, qty, true);
                stolen.push((victim, qty));
            }
        }
        Ok((commodity, stolen))
    }

    // ---- Coin stack -------------------------------------------------------

    /// Bishop: move the robber (like Knight, but bypasses the barbarian-
    /// attack gate only the caller enforces) and steal one random card from
    /// every other owner with a building on the robber's new tile, not just
    /// one chosen victim (`UseProgressCoinBishop`).
    pub fn use_bishop_card(&mut self, seat: SeatIndex, robber_at: TileCoord) -> GameResult<Vec<SeatIndex>> {
        self.check_progress_card(seat, DevCardType::Bishop)?;
        self.move_robber(robber_at, false)?;
        self.consume_progress_card(seat, DevCardType::Bishop);

        let mut stolen_from = Vec::new();
        for owner in self.steal_targets(seat) {
            self.steal_random_card(seat, owner);
            stolen_from.push(owner);
        }
        Ok(stolen_from)
    }

    /// Deserter: remove one opponent knight of any level (the player's
    /// resolved pick, or a random knight among all opponents' when missing
    /// or illegal), then offer the caller a free knight of that same level
    /// at a legal build location if they have one left to place
    /// (`UseProgressCoinDeserter`). Building a Mighty knight this way still
    /// requires the caller's Coin improvement to be at metropolis level.
    pub fn use_deserter_card(
        &mut self,
        seat: SeatIndex,
        opponent_knight: Option<VertexCoord>,
        rebuild_at: Option<VertexCoord>,
    ) -> GameResult<()> {
        self.check_progress_card(seat, DevCardType::Deserter)?;

        let opponent_knights: Vec<VertexCoord> = (0..self.num_players() as SeatIndex)
            .filter(|&s| s != seat)
            .flat_map(|s| self.player(s).knights().map(|k| k.at()).collect::<Vec<_>>())
            .collect();
        if opponent_knights.is_empty() {
            return Err(GameError::NotFound("no opponent knights".into()));
        }
        self.consume_progress_card(seat, DevCardType::Deserter);

        let target = opponent_knight
            .filter(|v| opponent_knights.contains(v))
            .unwrap_or_else(|| opponent_knights[self.rng.gen_range(0..opponent_knights.len())]);
        let Some(id) = self.vertex_owner_id(target) else { return Ok(()) };
        let (level, activated) = match self.player(id.owner).vertex_placements.get(&id.id) {
            Some(VertexBuildable::Knight { level, activated, .. }) => (*level, *activated),
            _ => return Ok(()),
        };

        self.player_mut(id.owner).remove_vertex_placement(id.id);
        self.graph.vertices.get_mut(&target).unwrap().placement = None;
        self.player_mut(id.owner).return_buildable(BuildableType::Knight);
        self.journal.write(JournalRecord::VertexBuild { at: target, placement: None, force: true });

        let meets_metropolis_gate =
            level != KnightLevel::Mighty || self.player(seat).improvements.get(&CardType::Coin).copied().unwrap_or(0) >= 3;
        if self.player(seat).buildables_left(BuildableType::Knight) == 0 || !meets_metropolis_gate {
            return Ok(());
        }
        let legal = self.legal_settlement_locations(seat, false);
        let Some(at) = rebuild_at.filter(|v| legal.contains(v)).or_else(|| legal.first().copied()) else {
            return Ok(());
        };

        let new_id = self.player_mut(seat).next_id();
        self.graph.vertices.entry(at).or_default().placement = Some(new_id);
        self.player_mut(seat).consume_buildable(BuildableType::Knight);
        self.player_mut(seat).add_vertex_placement(VertexBuildable::Knight {
            id: new_id,
            at,
            level,
            activated,
            can_use: activated,
        });
        self.journal.write(JournalRecord::VertexBuild { at, placement: Some((seat, BuildableType::Knight)), force: false });
        Ok(())
    }

    fn edge_is_covered(&self, v: VertexCoord, e: EdgeCoord, owner: SeatIndex) -> bool {
        match self.vertex_owner_id(v) {
            Some(id) if id.owner == owner => return true,
            _ => {}
        }
        self.graph.edges.iter().any(|(&other, edge)| {
            other != e
                && edge.placement.map(|id| id.owner) == Some(owner)
                && (other.endpoints()[0] == v || other.endpoints()[1] == v)
        })
    }

    /// Diplomat: remove any player's road whose both endpoints are
    /// "uncovered" (not an owned settlement/city, and not backed up by
    /// another of that same player's roads at the endpoint) and return it
    /// to its owner's pool. If the removed road was the caller's own, they
    /// immediately get one free replacement road elsewhere
    /// (`UseProgressCoinDiplomat`).
    pub fn use_diplomat_card(&mut self, seat: SeatIndex, road: Option<EdgeCoord>) -> GameResult<()> {
        self.check_progress_card(seat, DevCardType::Diplomat)?;

        let removable: Vec<EdgeCoord> = self
            .graph
            .edges
            .iter()
            .filter_map(|(&e, edge)| {
                let id = edge.placement?;
                let [a, b] = e.endpoints();
                (!self.edge_is_covered(a, e, id.owner) || !self.edge_is_covered(b, e, id.owner)).then_some(e)
            })
            .collect();
        if removable.is_empty() {
            return Err(GameError::BadRequest("cannot use this card now".into()));
        }
        self.consume_progress_card(seat, DevCardType::Diplomat);

        let edge = road.filter(|e| removable.contains(e)).unwrap_or_else(|| removable[self.rng.gen_range(0..removable.len())]);
        let Some(id) = self.graph.edges.get(&edge).and_then(|e| e.placement) else { return Ok(()) };
        self.player_mut(id.owner).remove_edge_placement(id.id);
        self.graph.edges.get_mut(&edge).unwrap().placement = None;
        self.player_mut(id.owner).return_buildable(BuildableType::Road);
        self.journal.write(JournalRecord::EdgeBuild { at: edge, placement: None });

        if id.owner == seat {
            self.free_road_or_fallback(seat, None);
        }
        self.recompute_extra_vp();
        Ok(())
    }

    /// Intrigue: displace one opponent knight that sits on a vertex
    /// touching one of the caller's own roads (`UseProgressCoinIntrigue`).
    /// The original's `DisplaceKnightInteractive` resolution beyond that
    /// isn't specified further; here displacement simply expels the knight,
    /// returning its build slot to the opponent.
    pub fn use_intrigue_card(&mut self, seat: SeatIndex, target: Option<VertexCoord>) -> GameResult<()> {
        self.check_progress_card(seat, DevCardType::Intrigue)?;

        let candidates: Vec<VertexCoord> = self
            .player(seat)
            .owned_edges()
            .iter()
            .flat_map(|e| e.endpoints())
            .filter(|&v| matches!(self.vertex_owner_id(v), Some(id) if id.owner != seat))
            .collect();
        if candidates.is_empty() {
            return Err(GameError::NotFound("no warrior to displace".into()));
        }
        self.consume_progress_card(seat, DevCardType::Intrigue);

        let Some(v) = target.filter(|v| candidates.contains(v)) else { return Ok(()) };
        let Some(id) = self.vertex_owner_id(v) else { return Ok(()) };
        self.player_mut(id.owner).remove_vertex_placement(id.id);
        self.graph.vertices.get_mut(&v).unwrap().placement = None;
        self.player_mut(id.owner).return_buildable(BuildableType::Knight);
        self.journal.write(JournalRecord::VertexBuild { at: v, placement: None, force: true });
        Ok(())
    }

    /// Saboteur: every opponent with more than one card and at least as
    /// many victory points as the caller discards half their hand
    /// (`UseProgressCoinSaboteur`).
    pub fn use_saboteur_card(&mut self, seat: SeatIndex) -> GameResult<Vec<SeatIndex>> {
        self.check_progress_card(seat, DevCardType::Saboteur)?;
        let caster_vp = self.player(seat).public_victory_points();
        let targets: Vec<SeatIndex> = (0..self.num_players() as SeatIndex)
            .filter(|&s| s != seat && self.player(s).hand.total_cards() > 1 && self.player(s).public_victory_points() >= caster_vp)
            .collect();
        if targets.is_empty() {
            return Err(GameError::NotFound("nobody to sabotage".into()));
        }
        self.consume_progress_card(seat, DevCardType::Saboteur);

        for &victim in &targets {
            let total = self.player(victim).hand.total_cards();
            let required = ((total + 1) / 2) as u32;
            self.resolve_discard(victim, required, &[]);
        }
        Ok(targets)
    }

    /// Spy: steal one progress card from a chosen opponent. `choice` is the
    /// caller's resolved pick; missing, unheld, or non-progress picks fall
    /// back to a random held progress card (`UseProgressCoinSpy`).
    pub fn use_spy_card(&mut self, seat: SeatIndex, victim: SeatIndex, choice: Option<DevCardType>) -> GameResult<Option<DevCardType>> {
        self.check_progress_card(seat, DevCardType::Spy)?;
        if victim == seat {
            return Err(GameError::BadRequest("cannot spy on yourself".into()));
        }
        self.consume_progress_card(seat, DevCardType::Spy);

        let card = choice
            .filter(|c| c.commodity_stack().is_some() && self.player(victim).hand.dev_deck(*c).quantity > 0)
            .or_else(|| self.player(victim).hand.random_dev_card_type(&mut self.rng));
        let Some(card) = card else { return Ok(None) };

        self.player_mut(victim).hand.try_remove_dev_card(card);
        self.journal.write(JournalRecord::UpdateDevelopmentCard {
            seat: Some(victim),
            card,
            quantity_delta: -1,
            num_used_delta: 0,
            can_use: false,
        });
        self.player_mut(seat).hand.add_dev_card(card, false);
        self.journal.write(JournalRecord::UpdateDevelopmentCard {
            seat: Some(seat),
            card,
            quantity_delta: 1,
            num_used_delta: 0,
            can_use: false,
        });
        Ok(Some(card))
    }

    /// Warlord: activates every one of the player's un-activated knights for
    /// free, but only for defense this turn — `can_use` stays false, so
    /// they can't also be spent on a knight action
    /// (`UseProgressCoinWarlord`'s `setKnightActive(v, true, false)`).
    pub fn use_warlord_card(&mut self, seat: SeatIndex) -> GameResult<u32> {
        let inactive: Vec<u64> = self
            .player(seat)
            .vertex_placements
            .iter()
            .filter_map(|(&id, p)| matches!(p, VertexBuildable::Knight { activated: false, .. }).then_some(id))
            .collect();
        if inactive.is_empty() {
            return Err(GameError::NotFound("no knight to activate".into()));
        }
        self.check_progress_card(seat, DevCardType::Warlord)?;
        self.consume_progress_card(seat, DevCardType::Warlord);

        let count = inactive.len() as u32;
        for id in inactive {
            self.set_knight_active(seat, id, true, false);
        }
        Ok(count)
    }

    /// Wedding: every opponent with more victory points than the caster and
    /// at least one card pays up to 2 cards of the caster's choosing (or a
    /// random top-up) from their hand (`UseProgressCoinWedding`). `picks`
    /// gives the caller's resolved card choices per victim.
    pub fn use_wedding_card(&mut self, seat: SeatIndex, picks: &[(SeatIndex, Vec<CardType>)]) -> GameResult<Vec<(SeatIndex, i32)>> {
        self.check_progress_card(seat, DevCardType::Wedding)?;
        let caster_vp = self.player(seat).public_victory_points();
        let targets: Vec<SeatIndex> = (0..self.num_players() as SeatIndex)
            .filter(|&s| s != seat && self.player(s).hand.total_cards() > 0 && self.player(s).public_victory_points() > caster_vp)
            .collect();
        if targets.is_empty() {
            return Err(GameError::NotFound("no players to steal from".into()));
        }
        self.consume_progress_card(seat, DevCardType::Wedding);

        let mut collected = Vec::new();
        for &victim in &targets {
            let quota = self.player(victim).hand.total_cards().min(2);
            let mut taken = 0i32;
            if let Some((_, want)) = picks.iter().find(|(s, _)| *s == victim) {
                for &card in want.iter().take(quota as usize) {
                    if self.player(victim).hand.count(card) > 0 {
                        self.move_cards(Some(victim), Some(seat), card, 1, true)?;
                        taken += 1;
                    }
                }
            }
            while taken < quota {
                let Some(card) = self.player(victim).hand.random_card_type(&mut self.rng) else { break };
                self.move_cards(Some(victim), Some(seat), card, 1, true)?;
                taken += 1;
            }
            collected.push((victim, taken));
        }
        Ok(collected)
    }

    /// Forces `seat` to discard one held progress card (the barbarian-attack
    /// overrun aftermath for Cities & Knights, distinct from
    /// `discard_progress_overflow`'s down-to-4 cleanup).
    /// Grounded on `original_source/game/actions_progress_coin.go`'s
    /// `DiscardProgressCard`: a missing/unheld pick falls back to the first
    /// progress card the player holds.
    pub fn discard_one_progress_card(&mut self, seat: SeatIndex, choice: Option<DevCardType>) -> Option<DevCardType> {
        let held: Vec<DevCardType> = self
            .player(seat)
            .hand
            .iter_dev_cards()
            .filter(|&(t, d)| d.quantity > 0 && t.commodity_stack().is_some())
            .map(|(t, _)| t)
            .collect();
        let card = choice.filter(|c| held.contains(c)).or_else(|| held.first().copied())?;

        self.player_mut(seat).hand.try_remove_dev_card(card);
        self.journal.write(JournalRecord::UpdateDevelopmentCard {
            seat: Some(seat),
            card,
            quantity_delta: -1,
            num_used_delta: 0,
            can_use: false,
        });
        if let Some(stack) = card.commodity_stack() {
            self.bank.reinsert_progress_card(stack, card);
            self.journal.write(JournalRecord::ReinsertDevelopmentCard { stack, card });
        }
        Some(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map_definition::MapDefinition;

    fn ready_state() -> GameState {
        let mut g = GameState::new(
            "g1",
            &MapDefinition::base_4_player(),
            &[("a".into(), "A".into()), ("b".into(), "B".into())],
            true,
            7,
            1,
        );
        g.init_phase = false;
        g.dice_rolled = true;
        g
    }

    #[test]
    fn alchemist_picks_the_roll_before_dice_are_rolled() {
        let mut g = ready_state();
        g.dice_rolled = false;
        g.player_mut(0).hand.add_dev_card(DevCardType::Alchemist, true);
        let result = g.use_alchemist_card(0, Some(4), Some(2)).unwrap();
        assert_eq!((result.red, result.white), (4, 2));
        assert!(g.dice_rolled);
        assert_eq!(g.player(0).hand.dev_deck(DevCardType::Alchemist).quantity, 0);
    }

    #[test]
    fn merchant_fleet_sets_turn_local_rate() {
        let mut g = ready_state();
        g.player_mut(0).hand.add_dev_card(DevCardType::MerchantFleet, true);
        g.use_merchant_fleet_card(0, CardType::Ore).unwrap();
        assert_eq!(g.merchant_fleet.get(&0), Some(&CardType::Ore));
    }

    #[test]
    fn resource_monopoly_caps_at_two_per_opponent() {
        let mut g = ready_state();
        g.player_mut(0).hand.add_dev_card(DevCardType::ResourceMonopoly, true);
        g.player_mut(1).hand.add(CardType::Wood, 5);
        let (resource, stolen) = g.use_resource_monopoly_card(0, Some(CardType::Wood)).unwrap();
        assert_eq!(resource, CardType::Wood);
        assert_eq!(stolen, vec![(1, 2)]);
        assert_eq!(g.player(0).hand.count(CardType::Wood), 2);
        assert_eq!(g.player(1).hand.count(CardType::Wood), 3);
    }

    #[test]
    fn warlord_activates_every_knight_for_free() {
        let mut g = ready_state();
        g.player_mut(0).hand.add_dev_card(DevCardType::Warlord, true);
        let id = g.player_mut(0).next_id();
        g.graph.vertices.entry(VertexCoord::new(0, 0)).or_default().placement = Some(id);
        g.player_mut(0).add_vertex_placement(VertexBuildable::Knight {
            id,
            at: VertexCoord::new(0, 0),
            level: KnightLevel::Basic,
            activated: false,
            can_use: false,
        });
        let activated = g.use_warlord_card(0).unwrap();
        assert_eq!(activated, 1);
        assert!(matches!(
            g.player(0).vertex_placements.get(&id.id),
            Some(VertexBuildable::Knight { activated: true, .. })
        ));
    }

    #[test]
    fn spy_steals_a_progress_card_from_the_victim() {
        let mut g = ready_state();
        g.player_mut(0).hand.add_dev_card(DevCardType::Spy, true);
        g.player_mut(1).hand.add_dev_card(DevCardType::Bishop, true);
        let stolen = g.use_spy_card(0, 1, Some(DevCardType::Bishop)).unwrap();
        assert_eq!(stolen, Some(DevCardType::Bishop));
        assert_eq!(g.player(0).hand.dev_deck(DevCardType::Bishop).quantity, 1);
        assert_eq!(g.player(1).hand.dev_deck(DevCardType::Bishop).quantity, 0);
    }

    #[test]
    fn progress_card_is_unusable_in_base_mode() {
        let mut g = GameState::new(
            "g2",
            &MapDefinition::base_4_player(),
            &[("a".into(), "A".into()), ("b".into(), "B".into())],
            false,
            7,
            1,
        );
        g.dice_rolled = true;
        g.player_mut(0).hand.add_dev_card(DevCardType::Warlord, true);
        assert!(g.use_warlord_card(0).is_err());
    }
}
