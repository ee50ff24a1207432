use analysis::{Classification, HintKind, LineBook, NoBook, Severity};
use chess::{Game, PieceColor, Position};
use coach::{query, review_game, ReviewError};
use engine::scripted::{spawn_scripted, Script, ScriptedResult};
use engine::EngineSession;
use std::time::Duration;

fn moves(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

/// FEN after playing `line` from the initial position.
fn fen_after(line: &str) -> String {
    let mut game = Game::new();
    for mv in line.split_whitespace() {
        game.make_move_uci(mv).unwrap();
    }
    game.to_fen()
}

fn opening_script() -> Script {
    Script::new()
        .position(&fen_after(""), ScriptedResult::new("e2e4", 30))
        .position(&fen_after("e2e4"), ScriptedResult::new("e7e5", -30))
        .position(&fen_after("e2e4 e7e5"), ScriptedResult::new("g1f3", 35))
        .position(&fen_after("e2e4 e7e5 a2a3"), ScriptedResult::new("d7d5", 150))
        .jitter(11)
}

#[tokio::test]
async fn test_review_classifies_each_ply() {
    let (handle, _log) = spawn_scripted(opening_script());
    let session = EngineSession::new(handle);

    let review = review_game(&session, None, &moves("e2e4 e7e5 a2a3"), 8, &NoBook)
        .await
        .unwrap();

    let classes: Vec<_> = review
        .plies
        .iter()
        .map(|p| p.record.classification())
        .collect();
    assert_eq!(
        classes,
        vec![
            Some(Classification::Best),
            Some(Classification::Best),
            Some(Classification::Mistake)
        ]
    );

    let third = &review.plies[2];
    assert_eq!(third.ply, 3);
    assert_eq!(third.record.san, "a3");
    assert_eq!(third.record.mover, PieceColor::White);
    assert_eq!(third.record.eval_before, Some(0.35));
    assert_eq!(third.record.eval_after, Some(1.5));
    assert_eq!(third.best_move.as_deref(), Some("g1f3"));
    assert_eq!(third.best_san.as_deref(), Some("Nf3"));
    assert_eq!(third.explanation, "Mistake. Consider Nf3 instead.");
    assert_eq!(third.severity, Severity::Major);

    assert_eq!(review.count(PieceColor::Black, Classification::Best), 1);
    assert!(review.black.accuracy > review.white.accuracy);
    assert_eq!(review.records().len(), 3);
}

#[tokio::test]
async fn test_book_moves_bypass_evaluation() {
    let (handle, _log) = spawn_scripted(opening_script());
    let session = EngineSession::new(handle);
    let book = LineBook::new().with_line("King's Pawn", "e2e4 e7e5 g1f3");

    let review = review_game(&session, None, &moves("e2e4 e7e5 a2a3"), 8, &book)
        .await
        .unwrap();

    assert_eq!(review.plies[0].record.classification(), Some(Classification::Book));
    assert_eq!(review.plies[1].record.classification(), Some(Classification::Book));
    assert_eq!(review.plies[2].record.classification(), Some(Classification::Mistake));
    assert_eq!(review.plies[0].explanation, "Book move, known theory.");
}

#[tokio::test]
async fn test_mating_move_is_scored_by_the_rules() {
    let script = Script::new().fallback(ScriptedResult::new("d8h4", 0));
    let (handle, _log) = spawn_scripted(script);
    let session = EngineSession::new(handle);

    let review = review_game(&session, None, &moves("f2f3 e7e5 g2g4 d8h4"), 6, &NoBook)
        .await
        .unwrap();

    let mate = &review.plies[3];
    assert_eq!(mate.record.san, "Qh4#");
    assert_eq!(mate.record.eval_after, Some(-100.0));
    assert_eq!(mate.record.classification(), Some(Classification::Great));
}

#[tokio::test]
async fn test_illegal_move_is_rejected() {
    let (handle, _log) = spawn_scripted(opening_script());
    let session = EngineSession::new(handle);

    let err = review_game(&session, None, &moves("e2e4 e2e4"), 4, &NoBook)
        .await
        .unwrap_err();
    match err {
        ReviewError::IllegalMove { ply, uci } => {
            assert_eq!(ply, 2);
            assert_eq!(uci, "e2e4");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = review_game(&session, Some("not a fen"), &moves("e2e4"), 4, &NoBook)
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::InvalidStart(_)));
}

#[tokio::test]
async fn test_review_without_engine_degrades_to_level_evaluations() {
    let session = EngineSession::unavailable();
    let review = review_game(&session, None, &moves("e2e4 e7e5"), 8, &NoBook)
        .await
        .unwrap();

    for ply in &review.plies {
        assert_eq!(ply.record.loss(), Some(0.0));
        assert_eq!(ply.record.classification(), Some(Classification::Good));
        assert_eq!(ply.best_move, None);
    }
    // Named move falls back to the move played.
    assert_eq!(review.plies[0].explanation, "Good move.");
}

#[tokio::test]
async fn test_hint_levels_from_a_live_search() {
    let fen = fen_after("e2e4 e7e5");
    let (handle, _log) = spawn_scripted(Script::new().position(&fen, ScriptedResult::new("g1f3", 40)));
    let session = EngineSession::new(handle);
    let position = Position::from_fen(&fen).unwrap();

    let hint = query::hint(&session, &position, 3, 6).await.unwrap();
    assert_eq!(hint.kind, HintKind::BestMove);
    assert_eq!(hint.text, "Best move: Nf3 (eval: +0.4)");

    let hint = query::hint(&session, &position, 1, 6).await.unwrap();
    assert_eq!(hint.squares.as_slice(), ["f3"]);
}

#[tokio::test]
async fn test_stream_analysis_ends_with_the_result() {
    let fen = fen_after("e2e4");
    let (handle, _log) = spawn_scripted(opening_script());
    let session = EngineSession::new(handle);
    let position = Position::from_fen(&fen).unwrap();

    let mut seen = 0;
    let last = query::stream_analysis(&session, &position, 10, |_| seen += 1)
        .await
        .unwrap();
    assert!(seen >= 1);
    assert_eq!(last.best_move.as_deref(), Some("e7e5"));
    assert_eq!(last.evaluation, Some(-0.3));
}

#[tokio::test]
async fn test_stream_analysis_twice_on_one_session() {
    let (handle, _log) = spawn_scripted(opening_script());
    let session = EngineSession::new(handle);

    let first = Position::from_fen(&fen_after("e2e4")).unwrap();
    let last = query::stream_analysis(&session, &first, 8, |_| {})
        .await
        .unwrap();
    assert_eq!(last.best_move.as_deref(), Some("e7e5"));

    // The session now holds a finished result for another position.
    let second = Position::from_fen(&fen_after("e2e4 e7e5")).unwrap();
    let mut moves_seen = Vec::new();
    let last = query::stream_analysis(&session, &second, 8, |snapshot| {
        moves_seen.extend(snapshot.best_line().and_then(|l| l.first_move()).map(str::to_string));
    })
    .await
    .unwrap();
    assert_eq!(last.best_move.as_deref(), Some("g1f3"));
    assert_eq!(last.evaluation, Some(0.35));
    assert!(moves_seen.iter().all(|mv| mv == "g1f3"), "{:?}", moves_seen);
}

#[tokio::test]
async fn test_stream_analysis_finishes_without_a_legal_move() {
    let mated = "R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1";
    let (handle, _log) = spawn_scripted(Script::new().position(mated, ScriptedResult::no_move()));
    let session = EngineSession::new(handle);
    let position = Position::from_fen(mated).unwrap();

    let last = tokio::time::timeout(
        Duration::from_secs(5),
        query::stream_analysis(&session, &position, 6, |_| {}),
    )
    .await
    .expect("analysis of a mated position must finish")
    .unwrap();
    assert_eq!(last.best_move, None);
    assert!(!last.searching);
}

#[tokio::test]
async fn test_superseded_stream_analysis_resolves_to_none() {
    let (handle, _log) = spawn_scripted(opening_script());
    let session = EngineSession::new(handle);
    let position = Position::from_fen(&fen_after("e2e4")).unwrap();

    let other = session.clone();
    let last = query::stream_analysis(&session, &position, 30, |_| other.stop()).await;
    assert!(last.is_none());
}

#[tokio::test]
async fn test_stream_analysis_on_dead_engine() {
    let session = EngineSession::unavailable();
    let position = Position::default();
    assert!(query::stream_analysis(&session, &position, 4, |_| {})
        .await
        .is_none());
}
