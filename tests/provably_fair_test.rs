//! End-to-end properties of the outcome engine: determinism, commitments,
//! nonce ordering, game rules at their edges and verification.

use fairplay::config::EngineConfig;
use fairplay::games::baccarat::{self, BaccaratParams, BaccaratSide, Card, Suit};
use fairplay::games::dice::{self, DiceDirection, DiceParams};
use fairplay::games::limbo::LimboParams;
use fairplay::games::mines::{Coord, MineLayout, MinesParams, MinesSetup, RoundState};
use fairplay::games::{BetParams, BetRequest, GameResult, PayoutCalculator};
use fairplay::seed::{hash_server_seed, SeedSession, ServerSeed};
use fairplay::{next_floats, FairnessEngine, FairnessError, VerificationRecord};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

const SERVER_SEED: [u8; 32] = [0x11; 32];

fn engine() -> FairnessEngine {
    FairnessEngine::new(EngineConfig::default()).unwrap()
}

fn seeded_session(engine: &FairnessEngine, client_seed: &str) -> uuid::Uuid {
    let seed = ServerSeed::from_bytes(SERVER_SEED.to_vec()).unwrap();
    engine
        .open_session(SeedSession::with_seeds(seed, client_seed).unwrap())
        .session_id
}

fn sample_bets() -> Vec<BetRequest> {
    vec![
        BetRequest::new(
            1.0,
            BetParams::Dice(DiceParams {
                target: 49.5,
                direction: DiceDirection::Over,
            }),
        ),
        BetRequest::new(2.0, BetParams::Limbo(LimboParams { target: 1.5 })),
        BetRequest::new(5.0, BetParams::Baccarat(BaccaratParams { side: BaccaratSide::Banker })),
        BetRequest::new(
            1.0,
            BetParams::Mines(MinesParams {
                width: 4,
                height: 4,
                mines: 2,
                picks: vec![Coord::new(1, 1), Coord::new(2, 2)],
            }),
        ),
    ]
}

fn card(rank: u8) -> Card {
    Card::new(rank, Suit::Hearts).unwrap()
}

#[test]
fn same_seeds_give_same_outcomes() {
    let first = engine();
    let second = engine();
    let a = seeded_session(&first, "player-seed");
    let b = seeded_session(&second, "player-seed");

    for (nonce, bet) in sample_bets().iter().enumerate() {
        let left = first.resolve(a, nonce as u64, bet).unwrap();
        let right = second.resolve(b, nonce as u64, bet).unwrap();
        assert_eq!(left.outcome, right.outcome);
    }
}

#[test]
fn different_client_seeds_diverge() {
    let a = next_floats(&SERVER_SEED, "alice", 0, 8).unwrap();
    let b = next_floats(&SERVER_SEED, "bob", 0, 8).unwrap();
    assert_ne!(a, b);
}

#[test]
fn revealed_seed_hashes_to_commitment() {
    let engine = engine();
    let session = engine.create_session(None).unwrap();
    engine
        .resolve(session.session_id, 0, &sample_bets()[0])
        .unwrap();

    let rotation = engine.rotate_seeds(session.session_id, Some("fresh".to_string())).unwrap();
    let revealed = hex::decode(&rotation.revealed_server_seed).unwrap();

    assert_eq!(hash_server_seed(&revealed), session.hashed_server_seed);
    assert_eq!(rotation.previous.hashed_server_seed, session.hashed_server_seed);
    assert_eq!(rotation.next.client_seed, "fresh");
    assert_eq!(rotation.next.nonce, 0);
}

#[test]
fn nonces_are_strictly_sequential() {
    let engine = engine();
    let id = seeded_session(&engine, "player-seed");
    let bet = &sample_bets()[1];

    for expected in 0..5u64 {
        let receipt = engine.resolve(id, expected, bet).unwrap();
        assert_eq!(receipt.outcome.nonce, expected);
        assert_eq!(receipt.new_nonce, expected + 1);
    }

    // Replay and skip-ahead are both rejected without moving the counter
    for stale in [0u64, 4, 6, 100] {
        assert!(matches!(
            engine.resolve(id, stale, bet),
            Err(FairnessError::NonceReuse { expected: 5, .. })
        ));
    }
    assert_eq!(engine.session(id).unwrap().nonce, 5);
}

#[test]
fn rejected_bet_leaves_nonce() {
    let engine = engine();
    let id = seeded_session(&engine, "player-seed");
    let bad = BetRequest::new(1.0, BetParams::Limbo(LimboParams { target: 1.0 }));

    assert!(matches!(engine.resolve(id, 0, &bad), Err(FairnessError::InvalidBetParameters(_))));
    assert_eq!(engine.session(id).unwrap().nonce, 0);
    assert!(engine.resolve(id, 0, &sample_bets()[1]).is_ok());
}

#[test]
fn dice_boundary_at_fifty_under() {
    let config = EngineConfig::default();
    let params = DiceParams {
        target: 50.0,
        direction: DiceDirection::Under,
    };

    let win = dice::resolve(0.49995, &params, &config.dice).unwrap();
    assert_eq!(win.roll, 49.99);
    assert!(win.won);

    let loss = dice::resolve(0.50005, &params, &config.dice).unwrap();
    assert_eq!(loss.roll, 50.0);
    assert!(!loss.won);

    let calc = PayoutCalculator::new(&config);
    assert_eq!(calc.payout_multiplier(&GameResult::Dice(win)), 1.98);
    assert_eq!(calc.payout_multiplier(&GameResult::Dice(loss)), 0.0);
}

#[test]
fn baccarat_player_natural_pays_double() {
    // Deal order P, B, P, B: player A+8, banker 2+3
    let deck = vec![card(1), card(2), card(8), card(3), card(9), card(9)];
    let result = baccarat::play_baccarat(&deck, BaccaratSide::Player).unwrap();

    assert!(result.natural);
    assert_eq!(result.player_cards.len(), 2);
    assert_eq!(result.banker_cards.len(), 2);
    assert_eq!(result.winner, BaccaratSide::Player);

    let calc = PayoutCalculator::new(&EngineConfig::default());
    let multiplier = calc.payout_multiplier(&GameResult::Baccarat(result));
    assert_eq!(multiplier, 2.0);
    assert_eq!(calc.payout(10.0, multiplier), 20.0);
}

#[test]
fn baccarat_banker_four_depends_on_player_third() {
    // Player 2+3 = 5 draws; banker 1+3 = 4
    let draws = baccarat::play_baccarat(
        &[card(2), card(1), card(3), card(3), card(7), card(6)],
        BaccaratSide::Banker,
    )
    .unwrap();
    assert_eq!(draws.player_cards.len(), 3);
    assert_eq!(draws.banker_cards.len(), 3);

    let stands = baccarat::play_baccarat(
        &[card(2), card(1), card(3), card(3), card(8), card(6)],
        BaccaratSide::Banker,
    )
    .unwrap();
    assert_eq!(stands.player_cards.len(), 3);
    assert_eq!(stands.banker_cards.len(), 2);
    assert_eq!(stands.banker_score, 4);
}

#[test]
fn mine_layouts_are_unique_and_on_board() {
    let setup = MinesSetup {
        width: 5,
        height: 5,
        mines: 24,
    };

    for nonce in 0..50 {
        let floats = next_floats(&SERVER_SEED, "player-seed", nonce, setup.mines as usize).unwrap();
        let layout = MineLayout::generate(setup, &floats).unwrap();

        let unique: HashSet<Coord> = layout.mines().iter().copied().collect();
        assert_eq!(unique.len(), 24);
        assert!(layout.mines().iter().all(|c| c.x < 5 && c.y < 5));
    }
}

#[test]
fn interactive_mines_round_loses_on_mine() {
    let engine = engine();
    let id = seeded_session(&engine, "player-seed");
    let setup = MinesSetup {
        width: 3,
        height: 3,
        mines: 1,
    };

    let floats = next_floats(&SERVER_SEED, "player-seed", 0, 1).unwrap();
    let mine = MineLayout::generate(setup, &floats).unwrap().mines()[0];

    let mut game = engine.start_mines_round(id, 0, 1.0, setup).unwrap();
    game.reveal(mine).unwrap();
    assert_eq!(game.state(), RoundState::Lost);
    assert!(game.reveal(Coord::new((mine.x + 1) % 3, mine.y)).is_err());

    let outcome = game.finish().unwrap();
    assert_eq!(outcome.payout_multiplier, 0.0);
    assert_eq!(outcome.payout, 0.0);
}

#[test]
fn rotation_waits_for_open_mines_round() {
    let engine = engine();
    let id = seeded_session(&engine, "player-seed");
    let setup = MinesSetup {
        width: 5,
        height: 5,
        mines: 24,
    };

    let mut game = engine.start_mines_round(id, 0, 1.0, setup).unwrap();

    // The seed stays secret while the single safe tile is still hidden
    assert!(matches!(
        engine.rotate_seeds(id, None),
        Err(FairnessError::RoundInProgress { open: 1, .. })
    ));
    assert_eq!(engine.session(id).unwrap().nonce, 1);
    assert_eq!(engine.metrics().rotations, 0);

    let floats = next_floats(&SERVER_SEED, "player-seed", 0, 24).unwrap();
    let layout = MineLayout::generate(setup, &floats).unwrap();
    game.reveal(layout.mines()[0]).unwrap();
    assert_eq!(game.state(), RoundState::Lost);
    assert_eq!(engine.open_rounds(id).unwrap(), 0);

    let outcome = game.finish().unwrap();
    assert_eq!(outcome.payout, 0.0);

    let rotation = engine.rotate_seeds(id, None).unwrap();
    assert_eq!(rotation.revealed_server_seed, hex::encode(SERVER_SEED));
    assert_eq!(rotation.previous.nonce, 1);
}

#[test]
fn abandoned_mines_round_is_forfeited() {
    let engine = engine();
    let id = seeded_session(&engine, "player-seed");
    let setup = MinesSetup {
        width: 4,
        height: 4,
        mines: 2,
    };

    let game = engine.start_mines_round(id, 0, 1.0, setup).unwrap();
    assert!(engine.rotate_seeds(id, None).is_err());
    drop(game);

    let metrics = engine.metrics();
    assert_eq!(metrics.abandoned_rounds, 1);
    assert_eq!(metrics.total_bets, 0);

    // The nonce stays spent
    assert!(matches!(
        engine.start_mines_round(id, 0, 1.0, setup),
        Err(FairnessError::NonceReuse { expected: 1, actual: 0 })
    ));
    assert!(engine.rotate_seeds(id, None).is_ok());
}

#[test]
fn verifier_accepts_every_game_after_json_round_trip() {
    let engine = engine();
    let id = seeded_session(&engine, "player-seed");

    let mut records = Vec::new();
    for (nonce, bet) in sample_bets().into_iter().enumerate() {
        let receipt = engine.resolve(id, nonce as u64, &bet).unwrap();
        records.push((bet, receipt.outcome));
    }
    let rotation = engine.rotate_seeds(id, None).unwrap();

    for (bet, outcome) in records {
        let record = VerificationRecord {
            server_seed: rotation.revealed_server_seed.clone(),
            client_seed: outcome.client_seed.clone(),
            nonce: outcome.nonce,
            bet,
            claimed: outcome,
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: VerificationRecord = serde_json::from_str(&json).unwrap();

        let report = engine.verify(&parsed);
        assert!(report.matches, "{:?}", report.failure);
        assert!(report.ensure_match().is_ok());
    }
}

#[test]
fn single_byte_seed_change_fails_verification() {
    let engine = engine();
    let id = seeded_session(&engine, "player-seed");
    let bet = sample_bets()[2].clone();
    let outcome = engine.resolve(id, 0, &bet).unwrap().outcome;

    for position in [0usize, 15, 31] {
        let mut tampered = SERVER_SEED;
        tampered[position] = tampered[position].wrapping_add(1);

        let report = engine.verify(&VerificationRecord {
            server_seed: hex::encode(tampered),
            client_seed: "player-seed".to_string(),
            nonce: 0,
            bet: bet.clone(),
            claimed: outcome.clone(),
        });
        assert!(!report.matches);
        assert!(matches!(report.ensure_match(), Err(FairnessError::SeedTampered { .. })));
    }

    let metrics = engine.metrics();
    assert_eq!(metrics.verifications, 3);
    assert_eq!(metrics.verification_failures, 3);
}

#[test]
fn concurrent_bets_on_one_session_are_serialized() {
    const THREADS: usize = 8;
    const BETS_PER_THREAD: usize = 25;

    let engine = Arc::new(engine());
    let id = seeded_session(&engine, "player-seed");

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let bet = BetRequest::new(1.0, BetParams::Limbo(LimboParams { target: 2.0 }));
                let mut nonces = Vec::with_capacity(BETS_PER_THREAD);
                while nonces.len() < BETS_PER_THREAD {
                    let current = engine.session(id).unwrap().nonce;
                    match engine.resolve(id, current, &bet) {
                        Ok(receipt) => nonces.push(receipt.outcome.nonce),
                        Err(FairnessError::NonceReuse { .. }) => continue,
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                }
                nonces
            })
        })
        .collect();

    let mut all: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();

    let total = (THREADS * BETS_PER_THREAD) as u64;
    assert_eq!(all, (0..total).collect::<Vec<u64>>());
    assert_eq!(engine.session(id).unwrap().nonce, total);
    assert_eq!(engine.metrics().total_bets, total);
}
