//! UCI command handler and main loop.
//!
//! "go" runs the search on a worker thread so the loop stays
//! responsive to "stop" and "quit"; the worker prints the final info
//! line and "bestmove". Any command that touches engine state first
//! cancels and joins an in-flight search.

use super::parser::{parse_command, UciCommand};
use super::{parse_move, SearchParams, UciError, ENGINE_AUTHOR, ENGINE_NAME};
use crate::engine::Engine;
use crate::search::{StopFlag, TimeControl};
use crate::types::{Board, MoveGen};
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::warn;

const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// 24 hours, the stand-in clock for "go infinite".
const INFINITE_TIME_US: i64 = 24 * 60 * 60 * 1_000_000;

pub struct UciHandler {
    board: Board,
    engine: Arc<Mutex<Engine>>,
    stop: Arc<StopFlag>,
    think_thread: Option<JoinHandle<()>>,
    /// Hash resizes are queued and applied between searches.
    pending_hash_mb: Option<usize>,
    threads: usize,
    syzygy_path: Option<String>,
    show_wdl: bool,
    quit: bool,
}

impl UciHandler {
    pub fn new() -> Self {
        let engine = Engine::new();
        let stop = engine.stop_handle();
        Self {
            board: Board::default(),
            engine: Arc::new(Mutex::new(engine)),
            stop,
            think_thread: None,
            pending_hash_mb: None,
            threads: 1,
            syzygy_path: None,
            show_wdl: false,
            quit: false,
        }
    }

    /// Run the blocking protocol loop until "quit" or EOF.
    pub fn run(&mut self) -> Result<(), UciError> {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            self.handle_input(line);
            if self.quit {
                break;
            }
        }
        self.stop_and_join();
        Ok(())
    }

    /// Handle one command line.
    pub fn handle_input(&mut self, input: &str) {
        match parse_command(input) {
            UciCommand::Uci => self.cmd_uci(),
            UciCommand::IsReady => send("readyok"),
            UciCommand::UciNewGame => self.cmd_ucinewgame(),
            UciCommand::Position { fen, moves } => self.cmd_position(fen.as_deref(), &moves),
            UciCommand::Go(params) => self.cmd_go(params),
            UciCommand::Stop => self.stop_and_join(),
            UciCommand::Quit => self.quit = true,
            UciCommand::SetOption { name, value } => {
                self.cmd_setoption(&name, value.as_deref())
            }
            UciCommand::Unknown(cmd) => warn!(cmd = %cmd, "unknown UCI command"),
        }
    }

    fn cmd_uci(&self) {
        send(&format!("id name {}", ENGINE_NAME));
        send(&format!("id author {}", ENGINE_AUTHOR));
        send("option name Hash type spin default 16 min 1 max 2048");
        send("option name Threads type spin default 1 min 1 max 256");
        send("option name Move Overhead type spin default 5 min 0 max 10000");
        send("option name SyzygyPath type string default");
        send("option name UCI_ShowWDL type check default false");
        send("uciok");
    }

    fn cmd_ucinewgame(&mut self) {
        self.stop_and_join();
        self.board = Board::default();
        self.locked_engine().new_game();
    }

    fn cmd_position(&mut self, fen: Option<&str>, moves: &[String]) {
        self.stop_and_join();

        match fen {
            None => {
                self.board = Board::default();
                self.locked_engine().reset_book();
            }
            Some(fen) => match Board::from_str(fen) {
                Ok(board) => self.board = board,
                Err(err) => {
                    warn!(fen, %err, "unparseable FEN, keeping previous position");
                    send(&format!("info string invalid fen: {}", fen));
                    return;
                }
            },
        }

        for token in moves {
            match parse_move(&self.board, token) {
                Some(m) => {
                    self.board = self.board.make_move_new(m);
                    self.locked_engine().add_book_move(m);
                }
                None => {
                    warn!(token = %token, "illegal move in position command");
                    send(&format!("info string illegal/unknown move in position: {}", token));
                    break;
                }
            }
        }
    }

    fn cmd_go(&mut self, params: SearchParams) {
        self.stop_and_join();

        let stm = self.board.side_to_move();
        let mut tc = TimeControl::default();
        let mut has_time = false;

        if let Some(ms) = params.wtime {
            tc.wtime_us = ms * 1000;
            has_time = true;
        }
        if let Some(ms) = params.btime {
            tc.btime_us = ms * 1000;
            has_time = true;
        }
        tc.winc_us = params.winc.unwrap_or(0) * 1000;
        tc.binc_us = params.binc.unwrap_or(0) * 1000;
        tc.movestogo = params.movestogo.unwrap_or(0);

        let pending_hash = self.pending_hash_mb.take();
        {
            let mut engine = self.locked_engine();

            if let Some(mb) = pending_hash {
                engine.set_hash_size(mb);
            }
            engine.set_max_depth(params.depth.unwrap_or(64));

            if let Some(ms) = params.movetime {
                set_side_time(&mut tc, stm, ms * 1000);
                tc.movestogo = 1;
                has_time = true;
                engine.set_overhead_us(0);
            } else if !has_time && !params.infinite {
                set_side_time(&mut tc, stm, 100_000);
                tc.movestogo = 1;
            }

            if params.infinite {
                set_side_time(&mut tc, stm, INFINITE_TIME_US);
                tc.movestogo = 1;
            }
        }

        let engine = Arc::clone(&self.engine);
        let board = self.board;
        self.think_thread = Some(std::thread::spawn(move || {
            let stats = {
                let mut engine = engine.lock().expect("engine mutex poisoned");
                engine.think(&board, &tc)
            };

            let pv: Vec<String> = stats.pv.iter().map(|m| m.to_string()).collect();
            send(&format!(
                "info depth {} seldepth {} score {} nodes {} nps {} time {} pv {}",
                stats.depth,
                stats.q_depth_reached,
                stats.score,
                stats.nodes,
                stats.nps(),
                stats.time_ms(),
                pv.join(" ")
            ));

            // A null selected move means the very first iteration was cut
            // short; any legal move is better than none.
            let best = stats
                .selected_move
                .or_else(|| MoveGen::new_legal(&board).next());
            match best {
                Some(m) => send(&format!("bestmove {}", m)),
                None => send("bestmove 0000"),
            }
        }));
    }

    fn cmd_setoption(&mut self, name: &str, value: Option<&str>) {
        match name {
            "Hash" => {
                if let Some(mb) = value.and_then(|v| v.parse::<usize>().ok()) {
                    self.pending_hash_mb = Some(mb.clamp(1, 2048));
                }
            }
            "Threads" => {
                if let Some(n) = value.and_then(|v| v.parse::<usize>().ok()) {
                    self.threads = n.clamp(1, 256);
                }
            }
            "Move Overhead" => {
                if let Some(ms) = value.and_then(|v| v.parse::<i64>().ok()) {
                    self.locked_engine().set_overhead_us(ms.clamp(0, 10_000) * 1000);
                }
            }
            "SyzygyPath" => {
                self.syzygy_path = value.map(str::to_string);
            }
            "UCI_ShowWDL" => {
                self.show_wdl = value == Some("true");
            }
            _ => warn!(name, "unknown option"),
        }
    }

    /// Cancel any in-flight search and wait for its bestmove output.
    fn stop_and_join(&mut self) {
        if let Some(handle) = self.think_thread.take() {
            self.stop.set();
            if handle.join().is_err() {
                warn!("search thread panicked");
            }
        }
    }

    fn locked_engine(&self) -> std::sync::MutexGuard<'_, Engine> {
        self.engine.lock().expect("engine mutex poisoned")
    }
}

impl Default for UciHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn set_side_time(tc: &mut TimeControl, stm: chess::Color, us: i64) {
    match stm {
        chess::Color::White => tc.wtime_us = us,
        chess::Color::Black => tc.btime_us = us,
    }
}

fn send(msg: &str) {
    println!("{}", msg);
    io::stdout().flush().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_startpos_replays_moves() {
        let mut handler = UciHandler::new();
        handler.handle_input("position startpos moves e2e4 e7e5 g1f3");

        let expected = {
            let b = Board::default();
            let b = b.make_move_new(parse_move(&b, "e2e4").unwrap());
            let b = b.make_move_new(parse_move(&b, "e7e5").unwrap());
            b.make_move_new(parse_move(&b, "g1f3").unwrap())
        };
        assert_eq!(handler.board.get_hash(), expected.get_hash());
    }

    #[test]
    fn position_fen_rebuilds_board() {
        let mut handler = UciHandler::new();
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        handler.handle_input(&format!("position fen {}", fen));
        assert_eq!(handler.board, Board::from_str(fen).unwrap());
    }

    #[test]
    fn bad_fen_keeps_previous_position() {
        let mut handler = UciHandler::new();
        handler.handle_input("position startpos moves e2e4");
        let before = handler.board;

        handler.handle_input("position fen not a real fen at all 0");
        assert_eq!(handler.board, before);
    }

    #[test]
    fn illegal_move_stops_replay_and_keeps_prefix() {
        let mut handler = UciHandler::new();
        handler.handle_input("position startpos moves e2e4 e2e4 e7e5");

        let expected = {
            let b = Board::default();
            b.make_move_new(parse_move(&b, "e2e4").unwrap())
        };
        assert_eq!(handler.board.get_hash(), expected.get_hash());
    }

    #[test]
    fn setoption_clamps_values() {
        let mut handler = UciHandler::new();
        handler.handle_input("setoption name Hash value 99999");
        assert_eq!(handler.pending_hash_mb, Some(2048));

        handler.handle_input("setoption name Threads value 0");
        assert_eq!(handler.threads, 1);

        handler.handle_input("setoption name UCI_ShowWDL value true");
        assert!(handler.show_wdl);
    }

    #[test]
    fn quit_sets_flag() {
        let mut handler = UciHandler::new();
        handler.handle_input("quit");
        assert!(handler.quit);
    }
}
