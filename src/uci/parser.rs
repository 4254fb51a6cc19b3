//! UCI command parser.

use super::SearchParams;

/// A parsed UCI command.
#[derive(Debug, Clone)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    /// "position startpos|fen <6 fields> [moves ...]"
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    Go(SearchParams),
    Stop,
    Quit,
    SetOption {
        name: String,
        value: Option<String>,
    },
    Unknown(String),
}

/// Parse one input line into a command.
pub fn parse_command(input: &str) -> UciCommand {
    let input = input.trim();
    let mut parts = input.split_whitespace();

    match parts.next() {
        Some("uci") => UciCommand::Uci,
        Some("isready") => UciCommand::IsReady,
        Some("ucinewgame") => UciCommand::UciNewGame,
        Some("position") => parse_position(&mut parts),
        Some("go") => parse_go(&mut parts),
        Some("stop") => UciCommand::Stop,
        Some("quit") => UciCommand::Quit,
        Some("setoption") => parse_setoption(&mut parts),
        _ => UciCommand::Unknown(input.to_string()),
    }
}

fn parse_position<'a>(parts: &mut impl Iterator<Item = &'a str>) -> UciCommand {
    let mut fen = None;
    let mut moves = Vec::new();
    let mut parsing_moves = false;

    while let Some(token) = parts.next() {
        match token {
            "startpos" => fen = None,
            "fen" => {
                let mut fields = Vec::new();
                for _ in 0..6 {
                    match parts.next() {
                        Some("moves") => {
                            parsing_moves = true;
                            break;
                        }
                        Some(field) => fields.push(field),
                        None => break,
                    }
                }
                if !fields.is_empty() {
                    fen = Some(fields.join(" "));
                }
            }
            "moves" => parsing_moves = true,
            _ if parsing_moves => moves.push(token.to_string()),
            _ => {}
        }
    }

    UciCommand::Position { fen, moves }
}

fn parse_go<'a>(parts: &mut impl Iterator<Item = &'a str>) -> UciCommand {
    let mut params = SearchParams::default();

    let tokens: Vec<&str> = parts.collect();
    let mut i = 0;
    while i < tokens.len() {
        let mut next_value = |i: &mut usize| -> Option<&str> {
            if *i + 1 < tokens.len() {
                *i += 1;
                Some(tokens[*i])
            } else {
                None
            }
        };

        match tokens[i] {
            "infinite" => params.infinite = true,
            "ponder" => params.ponder = true,
            "wtime" => params.wtime = next_value(&mut i).and_then(|v| v.parse().ok()),
            "btime" => params.btime = next_value(&mut i).and_then(|v| v.parse().ok()),
            "winc" => params.winc = next_value(&mut i).and_then(|v| v.parse().ok()),
            "binc" => params.binc = next_value(&mut i).and_then(|v| v.parse().ok()),
            "movestogo" => params.movestogo = next_value(&mut i).and_then(|v| v.parse().ok()),
            "depth" => params.depth = next_value(&mut i).and_then(|v| v.parse().ok()),
            "movetime" => params.movetime = next_value(&mut i).and_then(|v| v.parse().ok()),
            _ => {}
        }
        i += 1;
    }

    UciCommand::Go(params)
}

fn parse_setoption<'a>(parts: &mut impl Iterator<Item = &'a str>) -> UciCommand {
    let mut name = String::new();
    let mut value: Option<String> = None;

    enum Mode {
        None,
        Name,
        Value,
    }
    let mut mode = Mode::None;

    for token in parts {
        match token {
            "name" => mode = Mode::Name,
            "value" => mode = Mode::Value,
            _ => match mode {
                Mode::Name => {
                    if !name.is_empty() {
                        name.push(' ');
                    }
                    name.push_str(token);
                }
                Mode::Value => {
                    let v = value.get_or_insert_with(String::new);
                    if !v.is_empty() {
                        v.push(' ');
                    }
                    v.push_str(token);
                }
                Mode::None => {}
            },
        }
    }

    UciCommand::SetOption { name, value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_commands() {
        assert!(matches!(parse_command("uci"), UciCommand::Uci));
        assert!(matches!(parse_command("isready"), UciCommand::IsReady));
        assert!(matches!(parse_command("ucinewgame"), UciCommand::UciNewGame));
        assert!(matches!(parse_command("stop"), UciCommand::Stop));
        assert!(matches!(parse_command("quit"), UciCommand::Quit));
        assert!(matches!(parse_command("bogus"), UciCommand::Unknown(_)));
    }

    #[test]
    fn parses_position_startpos_with_moves() {
        let cmd = parse_command("position startpos moves e2e4 e7e5");
        match cmd {
            UciCommand::Position { fen, moves } => {
                assert!(fen.is_none());
                assert_eq!(moves, vec!["e2e4", "e7e5"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_position_fen() {
        let cmd = parse_command(
            "position fen r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3 moves f1c4",
        );
        match cmd {
            UciCommand::Position { fen, moves } => {
                assert_eq!(
                    fen.as_deref(),
                    Some("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3")
                );
                assert_eq!(moves, vec!["f1c4"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_go_clock_parameters() {
        let cmd = parse_command("go wtime 30000 btime 29000 winc 500 binc 500 movestogo 12");
        match cmd {
            UciCommand::Go(p) => {
                assert_eq!(p.wtime, Some(30000));
                assert_eq!(p.btime, Some(29000));
                assert_eq!(p.winc, Some(500));
                assert_eq!(p.binc, Some(500));
                assert_eq!(p.movestogo, Some(12));
                assert!(!p.infinite);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_go_depth_movetime_infinite() {
        match parse_command("go depth 6") {
            UciCommand::Go(p) => assert_eq!(p.depth, Some(6)),
            other => panic!("unexpected command {:?}", other),
        }
        match parse_command("go movetime 250") {
            UciCommand::Go(p) => assert_eq!(p.movetime, Some(250)),
            other => panic!("unexpected command {:?}", other),
        }
        match parse_command("go infinite") {
            UciCommand::Go(p) => assert!(p.infinite),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_setoption_with_spaced_name() {
        let cmd = parse_command("setoption name Move Overhead value 30");
        match cmd {
            UciCommand::SetOption { name, value } => {
                assert_eq!(name, "Move Overhead");
                assert_eq!(value.as_deref(), Some("30"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
