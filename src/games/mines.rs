//! Minesweeper: committed mine layout plus a reveal state machine.
//!
//! The layout is fixed by the random stream when the round starts. Reveals
//! are synchronous calls; the round moves `Idle -> Playing -> {Won, Lost,
//! CashedOut}` and loops on `Playing` for every safe tile.

use crate::config::MinesConfig;
use crate::errors::{FairResult, FairnessError};
use crate::games::payout;
use crate::rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub x: u32,
    pub y: u32,
}

impl Coord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    Idle,
    Playing,
    Won,
    Lost,
    CashedOut,
}

impl RoundState {
    pub fn is_finished(&self) -> bool {
        matches!(self, RoundState::Won | RoundState::Lost | RoundState::CashedOut)
    }
}

/// Board size and mine count
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MinesSetup {
    pub width: u32,
    pub height: u32,
    pub mines: u32,
}

impl MinesSetup {
    pub fn cells(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn safe_tiles(&self) -> usize {
        self.cells() - self.mines as usize
    }

    pub fn validate(&self, config: &MinesConfig) -> FairResult<()> {
        let max = config.max_board_side;
        if self.width == 0 || self.height == 0 || self.width > max || self.height > max {
            return Err(FairnessError::invalid_bet(format!(
                "board sides must be between 1 and {}",
                max
            )));
        }
        if self.cells() < 2 {
            return Err(FairnessError::invalid_bet("board needs at least two cells"));
        }
        if self.mines == 0 || self.mines as usize >= self.cells() {
            return Err(FairnessError::invalid_bet(format!(
                "mine count must be between 1 and {}",
                self.cells() - 1
            )));
        }
        Ok(())
    }
}

/// One-shot parameters: the setup plus the ordered tiles the player opened
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MinesParams {
    pub width: u32,
    pub height: u32,
    pub mines: u32,
    pub picks: Vec<Coord>,
}

impl MinesParams {
    pub fn setup(&self) -> MinesSetup {
        MinesSetup {
            width: self.width,
            height: self.height,
            mines: self.mines,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MinesResult {
    pub width: u32,
    pub height: u32,
    /// Mines in the order they were drawn
    pub mines: Vec<Coord>,
    /// Tiles opened, in order
    pub revealed: Vec<Coord>,
    pub state: RoundState,
    /// Multiplier reached by the last safe reveal
    pub multiplier: f64,
}

/// Mine positions for one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MineLayout {
    setup: MinesSetup,
    mines: Vec<Coord>,
    is_mine: Vec<bool>,
}

impl MineLayout {
    /// Draw `setup.mines` cells without replacement, one float per mine
    pub fn generate(setup: MinesSetup, floats: &[f64]) -> FairResult<Self> {
        if floats.len() != setup.mines as usize {
            return Err(FairnessError::invalid_bet(format!(
                "layout needs {} random values, got {}",
                setup.mines,
                floats.len()
            )));
        }

        let picks = rng::pick_without_replacement(setup.cells(), floats)?;
        let mut is_mine = vec![false; setup.cells()];
        let mines: Vec<Coord> = picks
            .into_iter()
            .map(|cell| {
                is_mine[cell] = true;
                Coord::new(cell as u32 % setup.width, cell as u32 / setup.width)
            })
            .collect();

        Ok(Self { setup, mines, is_mine })
    }

    pub fn setup(&self) -> MinesSetup {
        self.setup
    }

    pub fn mines(&self) -> &[Coord] {
        &self.mines
    }

    fn index(&self, coord: Coord) -> FairResult<usize> {
        if coord.x >= self.setup.width || coord.y >= self.setup.height {
            return Err(FairnessError::invalid_bet(format!("tile {} is off the board", coord)));
        }
        Ok((coord.y * self.setup.width + coord.x) as usize)
    }

    pub fn is_mine(&self, coord: Coord) -> FairResult<bool> {
        Ok(self.is_mine[self.index(coord)?])
    }
}

/// What a single reveal did
#[derive(Debug, Clone, PartialEq)]
pub enum Reveal {
    /// Safe tile, round continues
    Safe { cleared: usize, multiplier: f64 },
    /// Hit a mine; the whole layout is disclosed
    Mine { mines: Vec<Coord> },
    /// Last safe tile opened, round won
    BoardCleared { multiplier: f64 },
}

/// Reveal state machine over a committed layout
#[derive(Debug, Clone)]
pub struct MinesRound {
    layout: MineLayout,
    range_factor: f64,
    state: RoundState,
    revealed: Vec<Coord>,
    opened: Vec<bool>,
}

impl MinesRound {
    pub fn new(layout: MineLayout, range_factor: f64) -> Self {
        let cells = layout.setup().cells();
        Self {
            layout,
            range_factor,
            state: RoundState::Idle,
            revealed: Vec::new(),
            opened: vec![false; cells],
        }
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn layout(&self) -> &MineLayout {
        &self.layout
    }

    pub fn revealed(&self) -> &[Coord] {
        &self.revealed
    }

    /// Safe tiles opened so far
    pub fn cleared(&self) -> usize {
        match self.state {
            RoundState::Lost => self.revealed.len() - 1,
            _ => self.revealed.len(),
        }
    }

    pub fn multiplier(&self) -> f64 {
        payout::mines_multiplier(self.cleared(), self.layout.setup().safe_tiles(), self.range_factor)
    }

    pub fn start(&mut self) -> FairResult<()> {
        if self.state != RoundState::Idle {
            return Err(FairnessError::invalid_bet("round already started"));
        }
        self.state = RoundState::Playing;
        Ok(())
    }

    pub fn reveal(&mut self, coord: Coord) -> FairResult<Reveal> {
        if self.state != RoundState::Playing {
            return Err(FairnessError::invalid_bet(format!(
                "cannot reveal while round is {:?}",
                self.state
            )));
        }

        let index = self.layout.index(coord)?;
        if self.opened[index] {
            return Err(FairnessError::invalid_bet(format!("tile {} already revealed", coord)));
        }
        self.opened[index] = true;
        self.revealed.push(coord);

        if self.layout.is_mine[index] {
            self.state = RoundState::Lost;
            return Ok(Reveal::Mine {
                mines: self.layout.mines.clone(),
            });
        }

        let multiplier = self.multiplier();
        if self.cleared() == self.layout.setup().safe_tiles() {
            self.state = RoundState::Won;
            return Ok(Reveal::BoardCleared { multiplier });
        }

        Ok(Reveal::Safe {
            cleared: self.cleared(),
            multiplier,
        })
    }

    /// Lock in the current multiplier
    pub fn cash_out(&mut self) -> FairResult<f64> {
        if self.state != RoundState::Playing {
            return Err(FairnessError::invalid_bet(format!(
                "cannot cash out while round is {:?}",
                self.state
            )));
        }
        if self.cleared() == 0 {
            return Err(FairnessError::invalid_bet("reveal at least one tile before cashing out"));
        }
        self.state = RoundState::CashedOut;
        Ok(self.multiplier())
    }

    pub fn result(&self) -> MinesResult {
        let setup = self.layout.setup();
        MinesResult {
            width: setup.width,
            height: setup.height,
            mines: self.layout.mines.clone(),
            revealed: self.revealed.clone(),
            state: self.state,
            multiplier: self.multiplier(),
        }
    }
}

/// Replay `params.picks` against the layout drawn from `floats`.
///
/// Stops on a mine or a cleared board; otherwise cashes out after the last pick.
pub fn resolve(floats: &[f64], params: &MinesParams, config: &MinesConfig) -> FairResult<MinesResult> {
    let setup = params.setup();
    setup.validate(config)?;
    if params.picks.is_empty() {
        return Err(FairnessError::invalid_bet("at least one tile must be revealed"));
    }

    let mut round = MinesRound::new(MineLayout::generate(setup, floats)?, config.range_factor);
    round.start()?;

    for (i, &pick) in params.picks.iter().enumerate() {
        if round.state().is_finished() {
            return Err(FairnessError::invalid_bet(format!(
                "pick {} at {} comes after the round ended",
                i + 1,
                pick
            )));
        }
        round.reveal(pick)?;
    }

    if round.state() == RoundState::Playing {
        round.cash_out()?;
    }
    Ok(round.result())
}
