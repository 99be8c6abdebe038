/// Game lifecycle: start, players, pause, resume, rounds.
pub mod game_service;
/// Ledger health probe.
pub mod health_service;
/// Round audit list and past games.
pub mod history_service;
/// Score submission flow.
pub mod score_service;
/// Reversal of the last throw of a round.
pub mod undo_service;
