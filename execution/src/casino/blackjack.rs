//! Blackjack against a dealer who draws to 17.
//!
//! One 52-card deck is shuffled once per round and dealt from the top.
//! Cards are `0..52`: suit = card / 13, rank = card % 13 + 1 (1 = ace,
//! 11..=13 = face cards worth ten).
//!
//! Payouts on the total stake: natural blackjack 2.5x, both naturals push
//! at 1x, win or dealer bust 2x, push 1x, anything else 0.

use super::{
    shuffle, Action, CasinoGame, GameError, GameResult, GameView, RandomSource, Rules, Settlement,
};
use wager_types::casino::{BlackjackSettlement, Multiplier, Outcome, MAX_HAND_SIZE};

const DECK_SIZE: u8 = 52;

/// Dealer draws while below this total.
const DEALER_STANDS_AT: u8 = 17;

/// Blackjack game stages
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    PlayerTurn,
    Complete(BlackjackSettlement),
}

/// Calculate the value of a blackjack hand.
pub fn hand_value(cards: &[u8]) -> (u8, bool) {
    let mut value: u16 = 0;
    let mut aces: u8 = 0;

    for &card in cards {
        let rank = (card % 13) + 1; // 1=Ace, 2-10, 11=J, 12=Q, 13=K
        if rank == 1 {
            aces += 1;
            value += 11;
        } else if rank >= 10 {
            value += 10;
        } else {
            value += rank as u16;
        }
    }

    while value > 21 && aces > 0 {
        value -= 10;
        aces -= 1;
    }

    let is_soft = aces > 0 && value <= 21;
    (value.min(255) as u8, is_soft)
}

/// Check if hand is a blackjack (21 with 2 cards).
pub fn is_blackjack(cards: &[u8]) -> bool {
    cards.len() == 2 && hand_value(cards).0 == 21
}

/// Multiplier paid for a terminal settlement.
pub fn multiplier_for(settlement: BlackjackSettlement) -> Multiplier {
    match settlement {
        BlackjackSettlement::Blackjack => Multiplier::from_hundredths(250),
        BlackjackSettlement::Win | BlackjackSettlement::DealerBust => Multiplier::from_whole(2),
        BlackjackSettlement::Push => Multiplier::ONE,
        BlackjackSettlement::Lose
        | BlackjackSettlement::Bust
        | BlackjackSettlement::DealerBlackjack => Multiplier::ZERO,
    }
}

/// Compare finished hands once the dealer has played.
fn compare(player: &[u8], dealer: &[u8]) -> BlackjackSettlement {
    let (p_val, _) = hand_value(player);
    let (d_val, _) = hand_value(dealer);
    if p_val > 21 {
        BlackjackSettlement::Bust
    } else if d_val > 21 {
        BlackjackSettlement::DealerBust
    } else if p_val > d_val {
        BlackjackSettlement::Win
    } else if p_val == d_val {
        BlackjackSettlement::Push
    } else {
        BlackjackSettlement::Lose
    }
}

#[derive(Clone, Debug)]
pub struct Blackjack {
    /// Undealt cards; the next card is at the end.
    deck: Vec<u8>,
    player: Vec<u8>,
    dealer: Vec<u8>,
    doubled: bool,
    stage: Stage,
}

impl Blackjack {
    /// Deal from a prepared deck (next card last), alternating player and
    /// dealer.
    pub fn deal(mut deck: Vec<u8>) -> Result<(Self, GameResult), GameError> {
        let mut player = Vec::with_capacity(MAX_HAND_SIZE);
        let mut dealer = Vec::with_capacity(MAX_HAND_SIZE);
        for _ in 0..2 {
            player.push(deck_pop(&mut deck)?);
            dealer.push(deck_pop(&mut deck)?);
        }
        let mut game = Self {
            deck,
            player,
            dealer,
            doubled: false,
            stage: Stage::PlayerTurn,
        };

        let settlement = match (is_blackjack(&game.player), is_blackjack(&game.dealer)) {
            (true, true) => Some(BlackjackSettlement::Push),
            (true, false) => Some(BlackjackSettlement::Blackjack),
            (false, true) => Some(BlackjackSettlement::DealerBlackjack),
            (false, false) => None,
        };
        let result = match settlement {
            Some(settlement) => game.finish(settlement),
            None => GameResult::Continue,
        };
        Ok((game, result))
    }

    /// Resume a hand already in progress; `deck` holds the undealt cards.
    pub fn from_hands(player: Vec<u8>, dealer: Vec<u8>, deck: Vec<u8>) -> Self {
        Self {
            deck,
            player,
            dealer,
            doubled: false,
            stage: Stage::PlayerTurn,
        }
    }

    pub fn player(&self) -> &[u8] {
        &self.player
    }

    pub fn dealer(&self) -> &[u8] {
        &self.dealer
    }

    fn draw(&mut self) -> Result<u8, GameError> {
        deck_pop(&mut self.deck)
    }

    fn finish(&mut self, settlement: BlackjackSettlement) -> GameResult {
        self.stage = Stage::Complete(settlement);
        GameResult::Complete(Settlement::new(
            multiplier_for(settlement),
            Outcome::Blackjack {
                player: self.player.clone(),
                dealer: self.dealer.clone(),
                doubled: self.doubled,
                settlement,
            },
        ))
    }

    /// Dealer draws while below 17, then hands are compared.
    fn dealer_play(&mut self) -> Result<GameResult, GameError> {
        while hand_value(&self.dealer).0 < DEALER_STANDS_AT {
            if self.dealer.len() >= MAX_HAND_SIZE {
                return Err(GameError::InvalidState);
            }
            let card = self.draw()?;
            self.dealer.push(card);
        }
        let settlement = compare(&self.player, &self.dealer);
        Ok(self.finish(settlement))
    }

    fn hit(&mut self) -> Result<GameResult, GameError> {
        if self.player.len() >= MAX_HAND_SIZE {
            return Err(GameError::InvalidState);
        }
        let card = self.draw()?;
        self.player.push(card);

        let (val, _) = hand_value(&self.player);
        if val > 21 {
            Ok(self.finish(BlackjackSettlement::Bust))
        } else if val == 21 {
            self.dealer_play()
        } else {
            Ok(GameResult::Continue)
        }
    }
}

fn deck_pop(deck: &mut Vec<u8>) -> Result<u8, GameError> {
    deck.pop().ok_or(GameError::DeckExhausted)
}

impl CasinoGame for Blackjack {
    type Params = ();

    fn validate(_params: &(), _stake: u64, _rules: &Rules) -> Result<(), GameError> {
        Ok(())
    }

    fn init(
        _params: (),
        _stake: u64,
        _rules: &Rules,
        rng: &mut impl RandomSource,
    ) -> Result<(Self, GameResult), GameError> {
        let mut deck: Vec<u8> = (0..DECK_SIZE).collect();
        shuffle(rng, &mut deck);
        Self::deal(deck)
    }

    fn process_move(
        &mut self,
        action: Action,
        _rules: &Rules,
        _rng: &mut impl RandomSource,
    ) -> Result<GameResult, GameError> {
        if self.stage != Stage::PlayerTurn {
            return Err(GameError::InvalidMove);
        }

        match action {
            Action::Hit => self.hit(),
            Action::Stand => self.dealer_play(),
            Action::Double => {
                if self.player.len() != 2 {
                    return Err(GameError::InvalidMove);
                }
                self.doubled = true;
                let card = self.draw()?;
                self.player.push(card);
                if hand_value(&self.player).0 > 21 {
                    return Ok(self.finish(BlackjackSettlement::Bust));
                }
                self.dealer_play()
            }
            _ => Err(GameError::InvalidMove),
        }
    }

    /// Doubling matches the original stake.
    fn extra_stake(&self, action: Action, stake: u64) -> u64 {
        if action == Action::Double && self.stage == Stage::PlayerTurn && self.player.len() == 2 {
            stake
        } else {
            0
        }
    }

    fn view(&self) -> GameView {
        let (dealer, settlement) = match self.stage {
            // The hole card stays hidden during the player's turn.
            Stage::PlayerTurn => (self.dealer[..1].to_vec(), None),
            Stage::Complete(settlement) => (self.dealer.clone(), Some(settlement)),
        };
        GameView::Blackjack {
            player: self.player.clone(),
            player_total: hand_value(&self.player).0,
            dealer,
            doubled: self.doubled,
            settlement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casino::GameRng;
    use crate::mocks::{create_test_seed, FixedRandom};

    // Card ids by rank (spades): rank = card % 13 + 1.
    const ACE: u8 = 0;
    const FIVE: u8 = 4;
    const SIX: u8 = 5;
    const SEVEN: u8 = 6;
    const NINE: u8 = 8;
    const TEN: u8 = 9;
    const KING: u8 = 12;
    // Same ranks in hearts.
    const TEN_H: u8 = 22;
    const SEVEN_H: u8 = 19;

    /// Deck that deals `cards` in order.
    fn stacked(cards: &[u8]) -> Vec<u8> {
        cards.iter().rev().copied().collect()
    }

    fn act(game: &mut Blackjack, action: Action) -> Result<GameResult, GameError> {
        let mut rng = FixedRandom::from_units(&[0.0]);
        game.process_move(action, &Rules::default(), &mut rng)
    }

    fn settled(result: GameResult) -> Settlement {
        match result {
            GameResult::Complete(settlement) => settlement,
            GameResult::Continue => panic!("hand should be settled"),
        }
    }

    fn settlement_of(settlement: &Settlement) -> BlackjackSettlement {
        match settlement.outcome {
            Outcome::Blackjack { settlement, .. } => settlement,
            ref other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_hand_value() {
        assert_eq!(hand_value(&[ACE, KING]), (21, true));
        assert_eq!(hand_value(&[ACE, ACE, NINE]), (21, true));
        assert_eq!(hand_value(&[TEN, SIX, ACE]), (17, false));
        assert_eq!(hand_value(&[TEN, KING, FIVE]), (25, false));
        assert!(is_blackjack(&[ACE, TEN]));
        assert!(!is_blackjack(&[SEVEN, SEVEN_H, SEVEN]));
    }

    #[test]
    fn test_natural_pays_two_and_a_half() {
        let (_, result) = Blackjack::deal(stacked(&[ACE, NINE, KING, SEVEN])).unwrap();
        let settlement = settled(result);
        assert_eq!(settlement_of(&settlement), BlackjackSettlement::Blackjack);
        assert_eq!(settlement.multiplier.apply(100), 250);
    }

    #[test]
    fn test_both_naturals_push() {
        let (_, result) = Blackjack::deal(stacked(&[ACE, ACE + 13, KING, TEN])).unwrap();
        let settlement = settled(result);
        assert_eq!(settlement_of(&settlement), BlackjackSettlement::Push);
        assert_eq!(settlement.multiplier, Multiplier::ONE);
    }

    #[test]
    fn test_dealer_natural() {
        let (_, result) = Blackjack::deal(stacked(&[TEN, ACE, NINE, KING])).unwrap();
        let settlement = settled(result);
        assert_eq!(
            settlement_of(&settlement),
            BlackjackSettlement::DealerBlackjack
        );
        assert_eq!(settlement.multiplier, Multiplier::ZERO);
    }

    #[test]
    fn test_stand_dealer_draws_to_seventeen() {
        // Player 10+9, dealer 10+6; the dealer draws a 5 and stands on 21.
        let (mut game, result) =
            Blackjack::deal(stacked(&[TEN, TEN_H, NINE, SIX, FIVE])).unwrap();
        assert_eq!(result, GameResult::Continue);
        let settlement = settled(act(&mut game, Action::Stand).unwrap());
        assert_eq!(game.dealer(), &[TEN_H, SIX, FIVE]);
        assert_eq!(settlement_of(&settlement), BlackjackSettlement::Lose);
        assert_eq!(settlement.multiplier, Multiplier::ZERO);
    }

    #[test]
    fn test_dealer_bust_pays_double() {
        let (mut game, _) = Blackjack::deal(stacked(&[TEN, TEN_H, NINE, SIX, KING])).unwrap();
        let settlement = settled(act(&mut game, Action::Stand).unwrap());
        assert_eq!(settlement_of(&settlement), BlackjackSettlement::DealerBust);
        assert_eq!(settlement.multiplier.apply(100), 200);
    }

    #[test]
    fn test_dealer_determinism_from_seed() {
        let seed = create_test_seed();
        let player = vec![TEN, NINE];
        let dealer = vec![TEN_H, SIX];
        let used: Vec<u8> = player.iter().chain(dealer.iter()).copied().collect();

        let play = |session: u64| {
            let mut rng = GameRng::new(&seed, session, 0);
            let mut deck: Vec<u8> = (0..DECK_SIZE).filter(|c| !used.contains(c)).collect();
            shuffle(&mut rng, &mut deck);
            let mut game = Blackjack::from_hands(player.clone(), dealer.clone(), deck);
            let settlement = settled(act(&mut game, Action::Stand).unwrap());
            (game.dealer().to_vec(), settlement)
        };

        for session in 0..20 {
            let (first_dealer, first) = play(session);
            let (second_dealer, second) = play(session);
            assert_eq!(first_dealer, second_dealer);
            assert_eq!(first, second);
            assert_eq!(&first_dealer[..2], &[TEN_H, SIX]);
            assert!(first_dealer.len() >= 3);
            assert!(hand_value(&first_dealer).0 >= DEALER_STANDS_AT);
        }
    }

    #[test]
    fn test_hit_to_twenty_one_stands() {
        let (mut game, _) =
            Blackjack::deal(stacked(&[TEN, TEN_H, FIVE, SEVEN, SIX, KING])).unwrap();
        // Player 10+5 draws a 6 for 21; dealer 10+7 stands.
        let settlement = settled(act(&mut game, Action::Hit).unwrap());
        assert_eq!(settlement_of(&settlement), BlackjackSettlement::Win);
        assert_eq!(game.dealer(), &[TEN_H, SEVEN]);
    }

    #[test]
    fn test_hit_bust() {
        let (mut game, _) = Blackjack::deal(stacked(&[TEN, TEN_H, SIX, SEVEN, KING])).unwrap();
        let settlement = settled(act(&mut game, Action::Hit).unwrap());
        assert_eq!(settlement_of(&settlement), BlackjackSettlement::Bust);
        assert_eq!(settlement.multiplier, Multiplier::ZERO);
        // Settled hands ignore further actions.
        assert_eq!(act(&mut game, Action::Hit), Err(GameError::InvalidMove));
    }

    #[test]
    fn test_double() {
        let (mut game, _) =
            Blackjack::deal(stacked(&[FIVE, TEN_H, SIX, SEVEN, KING])).unwrap();
        assert_eq!(game.extra_stake(Action::Double, 40), 40);
        assert_eq!(game.extra_stake(Action::Hit, 40), 0);
        let settlement = settled(act(&mut game, Action::Double).unwrap());
        match settlement.outcome {
            Outcome::Blackjack {
                doubled,
                settlement: result,
                ref player,
                ..
            } => {
                assert!(doubled);
                assert_eq!(player, &vec![FIVE, SIX, KING]);
                assert_eq!(result, BlackjackSettlement::Win);
            }
            ref other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(settlement.multiplier.apply(80), 160);
    }

    #[test]
    fn test_double_only_on_two_cards() {
        let (mut game, _) =
            Blackjack::deal(stacked(&[FIVE, TEN_H, SIX, SEVEN, FIVE + 13, KING])).unwrap();
        assert_eq!(act(&mut game, Action::Hit), Ok(GameResult::Continue));
        assert_eq!(game.extra_stake(Action::Double, 40), 0);
        assert_eq!(act(&mut game, Action::Double), Err(GameError::InvalidMove));
    }

    #[test]
    fn test_view_hides_hole_card() {
        let (mut game, _) = Blackjack::deal(stacked(&[TEN, TEN_H, NINE, SIX, FIVE])).unwrap();
        match game.view() {
            GameView::Blackjack {
                dealer, settlement, ..
            } => {
                assert_eq!(dealer, vec![TEN_H]);
                assert_eq!(settlement, None);
            }
            other => panic!("unexpected view {other:?}"),
        }
        act(&mut game, Action::Stand).unwrap();
        match game.view() {
            GameView::Blackjack { dealer, .. } => assert_eq!(dealer.len(), 3),
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn test_init_uses_full_deck() {
        let seed = create_test_seed();
        let mut rng = GameRng::new(&seed, 5, 0);
        let (game, _) = Blackjack::init((), 10, &Rules::default(), &mut rng).unwrap();
        assert_eq!(game.deck.len() + game.player.len() + game.dealer.len(), 52);
    }
}
