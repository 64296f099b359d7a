#![allow(dead_code)]
//! Bank trade, player-to-player trade and the trade-offer lifecycle
//! (spec.md §4.3). Grounded on `original_source/game/actions.go`'s
//! `GetRatiosForPlayer`/`CanTradeWithBank`/`CanTradeBetweenPlayers`/`Trade`/
//! `CreateOffer`/`AcceptOffer`/`RejectOffer`/`CloseOffer`/`DestroyOffer`.
//!
//! Offers are stored from the current player's point of view: `give` is
//! what the current player hands over, `ask` is what they want back. A
//! counter-offer from a non-current seat is stored swapped (§9's "Trade
//! offer life-cycle" design note carries over the original's convention).

use crate::entities::buildable::SeatIndex;
use crate::entities::hand::CardType;
use crate::entities::trade_offer::{card_index, Acceptance, CardVector, TradeOffer, TradeOfferDetails};
use crate::error::{GameError, GameResult};
use crate::journal::JournalRecord;

use super::state::GameState;

fn card_for_index(i: usize) -> Option<CardType> {
    use CardType::*;
    match i {
        1 => Some(Wood),
        2 => Some(Brick),
        3 => Some(Wool),
        4 => Some(Wheat),
        5 => Some(Ore),
        6 => Some(Paper),
        7 => Some(Cloth),
        8 => Some(Coin),
        _ => None,
    }
}

fn merge_ratios(a: CardVector, b: CardVector) -> CardVector {
    let mut c = [0i32; 9];
    for i in 0..9 {
        c[i] = a[i].min(b[i]);
    }
    c
}

fn ratios_for_port_type(ratio: crate::board::tile::PortRatio) -> CardVector {
    use crate::board::tile::PortRatio;
    let mut out = [4i32; 9];
    out[0] = -1;
    match ratio {
        PortRatio::ThreeToOne => {
            for i in 1..9 {
                out[i] = 3;
            }
        }
        PortRatio::TwoToOne(t) => {
            out[card_index(crate::engine::build::resource_card(t))] = 2;
        }
    }
    out
}

impl GameState {
    /// The best bank-trade ratio per card type this seat can use right now:
    /// ports they own a building on, C&K trading house (3 cloth), the
    /// merchant, and any Merchant Fleet overrides.
    pub fn ratios_for_player(&self, seat: SeatIndex) -> CardVector {
        let mut ratios = [4i32; 9];
        ratios[0] = -1;

        for edge in self.graph.edges.values() {
            let Some(port) = edge.port else { continue };
            for v in port.edge.endpoints() {
                let owns = self
                    .graph
                    .vertices
                    .get(&v)
                    .and_then(|vx| vx.placement)
                    .map(|id| id.owner == seat)
                    .unwrap_or(false);
                if owns {
                    ratios = merge_ratios(ratios, ratios_for_port_type(port.ratio));
                }
            }
        }

        if self.cities_and_knights {
            if self.player(seat).improvements.get(&CardType::Cloth).copied().unwrap_or(0) >= 3 {
                let mut trading_house = [4i32; 9];
                trading_house[0] = -1;
                for i in 6..9 {
                    trading_house[i] = 2;
                }
                ratios = merge_ratios(ratios, trading_house);
            }
            if let Some((tile, owner)) = self.merchant {
                if owner == seat {
                    let mut merchant_ratio = [4i32; 9];
                    merchant_ratio[0] = -1;
                    if let Some(tile_type) = self.graph.tiles.get(&tile).map(|t| t.tile_type) {
                        if tile_type.is_resource() {
                            merchant_ratio[card_index(crate::engine::build::resource_card(tile_type))] = 2;
                        }
                    }
                    ratios = merge_ratios(ratios, merchant_ratio);
                }
            }
            if let Some(&card) = self.merchant_fleet.get(&seat) {
                let mut fleet = [4i32; 9];
                fleet[0] = -1;
                fleet[card_index(card)] = 2;
                ratios = merge_ratios(ratios, fleet);
            }
        }

        ratios
    }

    pub fn can_trade_with_bank(&self, seat: SeatIndex, give: &CardVector, ask: &CardVector) -> GameResult<()> {
        let ratios = self.ratios_for_player(seat);
        let mut possible = 0i32;
        let mut requested = 0i32;

        for (i, &qty) in give.iter().enumerate() {
            if qty <= 0 {
                continue;
            }
            if qty % ratios[i] != 0 {
                return Err(GameError::BadRequest("cannot trade with bank, invalid exchange".into()));
            }
            possible += qty / ratios[i];
        }

        for (i, &qty) in ask.iter().enumerate() {
            if qty <= 0 {
                continue;
            }
            let Some(card) = card_for_index(i) else {
                return Err(GameError::BadRequest(format!("no such card type - {i}")));
            };
            if self.bank.hand.count(card) < qty {
                return Err(GameError::BadRequest("cannot trade with bank, not enough cards in bank".into()));
            }
            requested += qty;
        }

        if possible != requested {
            return Err(GameError::BadRequest("cannot trade with bank".into()));
        }
        Ok(())
    }

    pub fn can_trade_between_players(
        &self,
        accepting: SeatIndex,
        seat: SeatIndex,
        give: &CardVector,
        ask: &CardVector,
    ) -> GameResult<()> {
        for (i, &qty) in ask.iter().enumerate() {
            if qty <= 0 {
                continue;
            }
            let Some(card) = card_for_index(i) else {
                return Err(GameError::BadRequest(format!("no such card type - {i}")));
            };
            if self.player(accepting).hand.count(card) < qty {
                return Err(GameError::BadRequest(
                    "cannot trade with player, accepting player does not have enough cards in hand".into(),
                ));
            }
        }
        for (i, &qty) in give.iter().enumerate() {
            if qty <= 0 {
                continue;
            }
            let Some(card) = card_for_index(i) else {
                return Err(GameError::BadRequest(format!("no such card type - {i}")));
            };
            if self.player(seat).hand.count(card) < qty {
                return Err(GameError::BadRequest(
                    "cannot trade with player, current player does not have enough cards in hand".into(),
                ));
            }
        }
        Ok(())
    }

    /// Executes `give`/`ask` between `seat` and either `accepting` or the bank.
    fn execute_trade(&mut self, seat: SeatIndex, accepting: Option<SeatIndex>, give: &CardVector, ask: &CardVector) -> GameResult<()> {
        for (i, &qty) in give.iter().enumerate() {
            if qty <= 0 {
                continue;
            }
            if let Some(card) = card_for_index(i) {
                self.move_cards(Some(seat), accepting, card, qty, true)?;
            }
        }
        for (i, &qty) in ask.iter().enumerate() {
            if qty <= 0 {
                continue;
            }
            if let Some(card) = card_for_index(i) {
                self.move_cards(accepting, Some(seat), card, qty, true)?;
            }
        }
        self.trade_offers.clear();
        Ok(())
    }

    pub fn trade_with_bank(&mut self, seat: SeatIndex, give: &CardVector, ask: &CardVector) -> GameResult<()> {
        self.can_trade_with_bank(seat, give, ask)?;
        self.execute_trade(seat, None, give, ask)
    }

    pub fn trade_with_player(&mut self, seat: SeatIndex, accepting: SeatIndex, give: &CardVector, ask: &CardVector) -> GameResult<()> {
        self.can_trade_between_players(accepting, seat, give, ask)?;
        self.execute_trade(seat, Some(accepting), give, ask)
    }

    /// Creates (or auto-executes, for a current-player bank trade) a trade
    /// offer. `None` means the trade executed immediately against the bank.
    pub fn create_offer(&mut self, seat: SeatIndex, give: CardVector, ask: CardVector) -> GameResult<Option<TradeOffer>> {
        if !self.dice_rolled {
            return Err(GameError::DiceNotRolled);
        }
        if self.special_build_active {
            return Err(GameError::InvalidDuringSpecialBuild);
        }
        if self.player(seat).has_pending_action() {
            return Err(GameError::PendingActionExists);
        }

        let mut give_sum = 0i32;
        for (i, &qty) in give.iter().enumerate() {
            if qty <= 0 {
                continue;
            }
            if ask[i] > 0 {
                return Err(GameError::BadRequest("cannot give and take the same resource".into()));
            }
            give_sum += qty;
        }
        let ask_sum: i32 = ask.iter().filter(|&&q| q > 0).sum();
        if give_sum <= 0 {
            return Err(GameError::BadRequest("cannot give nothing".into()));
        }
        if ask_sum <= 0 {
            return Err(GameError::BadRequest("cannot ask for nothing".into()));
        }

        if seat == self.current_player && self.can_trade_with_bank(seat, &give, &ask).is_ok() {
            self.trade_with_bank(seat, &give, &ask)?;
            return Ok(None);
        }

        let (details, offer_id) = if seat == self.current_player {
            (TradeOfferDetails { give, ask }, self.offer_counter.next())
        } else {
            let id = seat as u32;
            if let Some(existing) = self.trade_offers.iter_mut().find(|o| o.id == id) {
                existing.destroy();
                self.trade_offers.retain(|o| o.id != id);
            }
            (TradeOfferDetails { give: ask, ask: give }, id)
        };

        if self.trade_offers.iter().any(|o| o.details.give == details.give && o.details.ask == details.ask) {
            return Err(GameError::InvalidTradeState("offer already exists".into()));
        }

        let num_players = self.num_players();
        let embargos: Vec<bool> = self.players.iter().map(|p| p.embargos.get(self.current_player as usize).copied().unwrap_or(false)).collect();
        let offer = TradeOffer::new(offer_id, seat, self.current_player, details, num_players, |s| embargos[s as usize]);
        self.trade_offers.push(offer.clone());
        Ok(Some(offer))
    }

    pub fn accept_offer(&mut self, offer_id: u32, seat: SeatIndex) -> GameResult<()> {
        let offer = self
            .trade_offers
            .iter_mut()
            .find(|o| o.id == offer_id)
            .ok_or_else(|| GameError::NotFound("no offer to accept".into()))?;
        if offer.acceptances[seat as usize] == Acceptance::Yes {
            return Ok(());
        }
        for (i, &qty) in offer.details.ask.iter().enumerate() {
            if qty <= 0 {
                continue;
            }
            let Some(card) = card_for_index(i) else { continue };
            if self.player(seat).hand.count(card) < qty {
                return Err(GameError::InsufficientResources);
            }
        }
        self.trade_offers
            .iter_mut()
            .find(|o| o.id == offer_id)
            .unwrap()
            .acceptances[seat as usize] = Acceptance::Yes;
        Ok(())
    }

    pub fn reject_offer(&mut self, offer_id: u32, seat: SeatIndex) -> GameResult<()> {
        let (created_by, current_player) = {
            let offer = self
                .trade_offers
                .iter_mut()
                .find(|o| o.id == offer_id)
                .ok_or_else(|| GameError::NotFound("no offer to reject".into()))?;
            offer.acceptances[seat as usize] = Acceptance::No;
            (offer.created_by, offer.current_player)
        };
        if created_by == seat || current_player == seat {
            if let Some(offer) = self.trade_offers.iter_mut().find(|o| o.id == offer_id) {
                offer.destroy();
            }
            self.trade_offers.retain(|o| o.id != offer_id);
        }
        Ok(())
    }

    pub fn close_offer(&mut self, offer_id: u32, seat: SeatIndex, accepting: SeatIndex) -> GameResult<()> {
        self.validate_turn(seat, false, false)?;
        let offer = self
            .trade_offers
            .iter()
            .find(|o| o.id == offer_id)
            .ok_or_else(|| GameError::NotFound("the other player retracted the offer".into()))?;
        if offer.acceptances[accepting as usize] != Acceptance::Yes {
            return Err(GameError::InvalidTradeState(
                "cannot close an offer not accepted by the other party".into(),
            ));
        }
        let (give, ask) = (offer.details.give, offer.details.ask);
        self.can_trade_between_players(accepting, seat, &give, &ask)?;
        self.execute_trade(seat, Some(accepting), &give, &ask)
    }

    pub fn set_special_build(&mut self, seat: SeatIndex, active: bool) {
        self.player_mut(seat).special_build = active;
        self.journal.write(JournalRecord::SpecialBuild { seat, active });
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
            false,
            7,
            1,
        );
        g.init_phase = false;
        g.dice_rolled = true;
        g
    }

    #[test]
    fn bank_trade_requires_matching_ratio() {
        let mut g = ready_state();
        g.player_mut(0).hand.add(CardType::Wood, 4);
        let mut give = [0i32; 9];
        give[card_index(CardType::Wood)] = 4;
        let mut ask = [0i32; 9];
        ask[card_index(CardType::Ore)] = 1;
        g.trade_with_bank(0, &give, &ask).unwrap();
        assert_eq!(g.player(0).hand.count(CardType::Wood), 0);
        assert_eq!(g.player(0).hand.count(CardType::Ore), 1);
    }

    #[test]
    fn create_offer_requires_give_and_ask() {
        let mut g = ready_state();
        let give = [0i32; 9];
        let ask = [0i32; 9];
        assert!(g.create_offer(0, give, ask).is_err());
    }
}
