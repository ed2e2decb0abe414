//! Integration tests for the chat flow
//!
//! text → SafetyFilter → (crisis card | gateway → extractor) → store

mod common;

use common::ScriptedGateway;
use mindspace::core::{run_exchange, run_retry, ChatSession, GeminiGateway};
use mindspace::config::GatewayConfig;
use mindspace::error::{ChatError, GatewayError, SessionError};
use mindspace::types::{MoodBand, Speaker};
use mindspace::GREETING;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_normal_exchange_appends_reply() {
    let gateway = ScriptedGateway::ok(&["Sounds like a long day. [[SCORE: 0.1]]"]);
    let mut session = ChatSession::new(true);

    let exchange = run_exchange(&mut session, &gateway, "FYP is killing my sleep").await.unwrap();

    assert!(!exchange.crisis);
    assert_eq!(exchange.reply.as_deref(), Some("Sounds like a long day."));
    assert_eq!(exchange.band, Some(MoodBand::Neutral));
    assert_eq!(session.turns().len(), 3);
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test]
async fn test_crisis_never_reaches_gateway() {
    let gateway = ScriptedGateway::ok(&["should not be used"]);
    let mut session = ChatSession::new(true);

    let exchange = run_exchange(&mut session, &gateway, "I just want to die").await.unwrap();

    assert!(exchange.crisis);
    assert_eq!(gateway.calls(), 0);
    assert!(session.turns().last().unwrap().is_crisis_card);
}

#[tokio::test]
async fn test_crisis_turns_hidden_from_next_context() {
    let gateway = ScriptedGateway::ok(&["I'm here with you."]);
    let mut session = ChatSession::new(true);

    run_exchange(&mut session, &gateway, "everything is hopeless").await.unwrap();
    run_exchange(&mut session, &gateway, "thanks for listening").await.unwrap();

    // Gateway receives the full store; the request it builds drops the card
    let seen = gateway.seen();
    assert_eq!(seen.len(), 1);
    let config = GatewayConfig::new(Some("k".into())).unwrap().with_scoring(false);
    let request = GeminiGateway::new(config).unwrap().build_request(&seen[0]);
    let texts: Vec<_> = request.contents[2..]
        .iter()
        .map(|c| c.parts[0].text.as_str())
        .collect();
    assert_eq!(texts, vec![GREETING, "everything is hopeless", "thanks for listening"]);
}

#[tokio::test]
async fn test_sentiment_escalation() {
    let gateway = ScriptedGateway::ok(&["I hear you. [[SCORE: -0.95]]"]);
    let mut session = ChatSession::new(true);

    let exchange = run_exchange(&mut session, &gateway, "nothing matters lately").await.unwrap();

    assert!(exchange.escalated);
    assert_eq!(exchange.score, Some(-0.95));
    assert_eq!(exchange.turns_appended, 3);
    let turns = session.turns();
    assert_eq!(turns[turns.len() - 2].text, "I hear you.");
    assert!(turns[turns.len() - 1].is_crisis_card);
}

#[tokio::test]
async fn test_mood_carries_forward_without_tag() {
    let gateway = ScriptedGateway::ok(&["Great! [[SCORE: 0.7]]", "Good to hear!"]);
    let mut session = ChatSession::new(true);

    run_exchange(&mut session, &gateway, "aced my midterm").await.unwrap();
    let exchange = run_exchange(&mut session, &gateway, "yeah").await.unwrap();

    assert_eq!(exchange.reply.as_deref(), Some("Good to hear!"));
    assert_eq!(exchange.score, None);
    assert_eq!(session.mood().history(), &[0.0, 0.7, 0.7]);
}

#[tokio::test]
async fn test_score_clamped_in_store() {
    let gateway = ScriptedGateway::ok(&["Wow [[SCORE: 5]]", "Oh [[SCORE: -5]]"]);
    let mut session = ChatSession::new(true);

    run_exchange(&mut session, &gateway, "one").await.unwrap();
    assert_eq!(session.mood().current(), 1.0);
    let exchange = run_exchange(&mut session, &gateway, "two").await.unwrap();
    assert_eq!(session.mood().current(), -1.0);
    assert!(exchange.escalated);
}

#[tokio::test]
async fn test_rejection_leaves_user_turn_last() {
    let gateway = ScriptedGateway::new(vec![Err(GatewayError::RemoteRejected {
        status: 400,
        body: "{\"error\":\"bad key\"}".into(),
    })]);
    let mut session = ChatSession::new(true);

    let err = run_exchange(&mut session, &gateway, "hello?").await.unwrap_err();

    match err {
        ChatError::Gateway(GatewayError::RemoteRejected { status, body }) => {
            assert_eq!(status, 400);
            assert_eq!(body, "{\"error\":\"bad key\"}");
        }
        other => panic!("unexpected error {:?}", other),
    }
    let last = session.turns().last().unwrap();
    assert_eq!(last.speaker, Speaker::User);
    assert_eq!(session.turns().len(), 2);
}

#[tokio::test]
async fn test_retry_recovers_after_failure() {
    let gateway = ScriptedGateway::new(vec![
        Err(GatewayError::Transport {
            message: "timed out".into(),
        }),
        Ok("Sorry, I'm back. [[SCORE: 0.3]]".into()),
    ]);
    let mut session = ChatSession::new(true);

    assert!(run_exchange(&mut session, &gateway, "you there?").await.is_err());
    let exchange = run_retry(&mut session, &gateway).await.unwrap();

    assert_eq!(exchange.turns_appended, 1);
    assert_eq!(session.turns().len(), 3);
    assert_eq!(session.mood().history(), &[0.0, 0.3]);
    // Both calls saw the same unanswered user turn last
    let seen = gateway.seen();
    assert_eq!(seen[0].last().unwrap().text, "you there?");
    assert_eq!(seen[1].last().unwrap().text, "you there?");
}

#[tokio::test]
async fn test_retry_without_failure_is_rejected() {
    let gateway = ScriptedGateway::ok(&[]);
    let mut session = ChatSession::new(true);
    let err = run_retry(&mut session, &gateway).await.unwrap_err();
    assert!(matches!(err, ChatError::Session(SessionError::NothingToRetry)));
}

#[tokio::test]
async fn test_reset_after_conversation() {
    let gateway = ScriptedGateway::ok(&["Hi [[SCORE: 0.4]]"]);
    let mut session = ChatSession::new(true);
    run_exchange(&mut session, &gateway, "hello").await.unwrap();
    run_exchange(&mut session, &gateway, "跳楼").await.unwrap();

    session.reset();

    assert_eq!(session.turns().len(), 1);
    assert_eq!(session.turns()[0].text, GREETING);
    assert_eq!(session.mood().history(), &[0.0]);
}
