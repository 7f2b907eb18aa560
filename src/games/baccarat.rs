//! Baccarat: one shuffled deck, fixed deal order and the tableau draw rules.
//!
//! Deal order is player, banker, player, banker, then the optional third
//! cards (player first). Card values: Ace = 1, 2-9 face value, 10/J/Q/K = 0.

use crate::errors::{FairResult, FairnessError};
use crate::rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cards in a single deck
pub const DECK_SIZE: usize = 52;
/// One random value per Fisher-Yates swap
pub const BACCARAT_FLOATS: usize = DECK_SIZE - 1;
/// Most cards a round can consume
const MAX_CARDS_DEALT: usize = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

const SUITS: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Card {
    /// 1 (Ace) through 13 (King)
    pub rank: u8,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: u8, suit: Suit) -> FairResult<Self> {
        if !(1..=13).contains(&rank) {
            return Err(FairnessError::invalid_bet(format!("card rank {} out of range", rank)));
        }
        Ok(Self { rank, suit })
    }

    /// Baccarat point value
    pub fn value(&self) -> u8 {
        match self.rank {
            1..=9 => self.rank,
            _ => 0,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rank = match self.rank {
            1 => "A".to_string(),
            11 => "J".to_string(),
            12 => "Q".to_string(),
            13 => "K".to_string(),
            n => n.to_string(),
        };
        let suit = match self.suit {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        };
        write!(f, "{}{}", rank, suit)
    }
}

/// Unshuffled deck, suit-major, Ace to King
pub fn fresh_deck() -> Vec<Card> {
    SUITS
        .iter()
        .flat_map(|&suit| (1..=13).map(move |rank| Card { rank, suit }))
        .collect()
}

/// Hand score: sum of values mod 10
pub fn score(cards: &[Card]) -> u8 {
    cards.iter().map(|c| c.value() as u32).sum::<u32>() as u8 % 10
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BaccaratSide {
    Player,
    Banker,
    Tie,
}

impl fmt::Display for BaccaratSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaccaratSide::Player => write!(f, "player"),
            BaccaratSide::Banker => write!(f, "banker"),
            BaccaratSide::Tie => write!(f, "tie"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaccaratParams {
    pub side: BaccaratSide,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaccaratResult {
    pub player_cards: Vec<Card>,
    pub banker_cards: Vec<Card>,
    pub player_score: u8,
    pub banker_score: u8,
    /// Either side had 8 or 9 on two cards
    pub natural: bool,
    pub winner: BaccaratSide,
    pub side: BaccaratSide,
    pub won: bool,
}

/// Player draws on 0-5, stands on 6-7
pub fn player_draws(player_score: u8) -> bool {
    player_score <= 5
}

/// Banker tableau. `player_third` is the value of the player's third card, if
/// one was drawn.
pub fn banker_draws(banker_score: u8, player_third: Option<u8>) -> bool {
    let Some(v) = player_third else {
        return banker_score <= 5;
    };

    match banker_score {
        0..=2 => true,
        3 => v != 8,
        4 => (2..=7).contains(&v),
        5 => (4..=7).contains(&v),
        6 => (6..=7).contains(&v),
        _ => false,
    }
}

/// Play one round from the top of `deck`
pub fn play_baccarat(deck: &[Card], side: BaccaratSide) -> FairResult<BaccaratResult> {
    if deck.len() < MAX_CARDS_DEALT {
        return Err(FairnessError::invalid_bet(format!(
            "baccarat needs at least {} cards, got {}",
            MAX_CARDS_DEALT,
            deck.len()
        )));
    }

    let mut shoe = deck.iter().copied();
    let mut draw = || shoe.next().ok_or_else(|| FairnessError::invalid_bet("deck exhausted"));

    let mut player = Vec::with_capacity(3);
    let mut banker = Vec::with_capacity(3);
    player.push(draw()?);
    banker.push(draw()?);
    player.push(draw()?);
    banker.push(draw()?);

    let player_two = score(&player);
    let banker_two = score(&banker);

    // Naturals end the round before any tableau rule applies
    let natural = player_two >= 8 || banker_two >= 8;
    if !natural {
        let mut player_third = None;
        if player_draws(player_two) {
            let card = draw()?;
            player_third = Some(card.value());
            player.push(card);
        }
        if banker_draws(banker_two, player_third) {
            banker.push(draw()?);
        }
    }

    let player_score = score(&player);
    let banker_score = score(&banker);
    let winner = match player_score.cmp(&banker_score) {
        std::cmp::Ordering::Greater => BaccaratSide::Player,
        std::cmp::Ordering::Less => BaccaratSide::Banker,
        std::cmp::Ordering::Equal => BaccaratSide::Tie,
    };

    Ok(BaccaratResult {
        player_cards: player,
        banker_cards: banker,
        player_score,
        banker_score,
        natural,
        winner,
        side,
        won: winner == side,
    })
}

/// Shuffle a fresh deck with `floats` and play it
pub fn resolve(floats: &[f64], params: &BaccaratParams) -> FairResult<BaccaratResult> {
    let mut deck = fresh_deck();
    rng::shuffle(&mut deck, floats)?;
    play_baccarat(&deck, params.side)
}
