use super::common::*;
use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::workflows::chat::client::FALLBACK_REPLY;
use crate::workflows::chat::conversation::{ChatRole, ChatTurn, GREETING};
use crate::workflows::chat::lead::{LeadGateError, LeadTransition};
use crate::workflows::chat::session::ChatSessionError;

#[tokio::test]
async fn toronto_question_appends_user_then_model() {
    let completion = Arc::new(ScriptedCompletion::answering(TORONTO_ANSWER));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut session = session(completion.clone(), notifier);
    session.submit_lead("a@b.ca", "4161234567").expect("unlocks");

    assert_eq!(session.messages().len(), 1);
    assert!(!session.is_loading());

    let pending = session.begin_exchange(TORONTO_QUESTION).expect("accepted");
    assert!(session.is_loading());
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.messages()[1].role, ChatRole::User);
    assert_eq!(pending.history, vec![ChatTurn::model(GREETING)]);

    let exchange = session.complete_exchange(pending, TORONTO_ANSWER.to_string());
    assert!(!session.is_loading());

    let roles: Vec<_> = session.messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![ChatRole::Model, ChatRole::User, ChatRole::Model]);
    assert_eq!(exchange.user.text, TORONTO_QUESTION);
    assert_eq!(exchange.reply.text, TORONTO_ANSWER);
    assert!(exchange.user.timestamp <= exchange.reply.timestamp);
}

#[tokio::test]
async fn send_passes_history_prior_to_the_new_message() {
    let completion = Arc::new(ScriptedCompletion::answering(TORONTO_ANSWER));
    let mut session = session(completion.clone(), Arc::new(RecordingNotifier::default()));
    session.submit_lead("a@b.ca", "4161234567").expect("unlocks");

    session.send(TORONTO_QUESTION).await.expect("first send");
    session.send("And in Ottawa?").await.expect("second send");

    let calls = completion.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, vec![ChatTurn::model(GREETING)]);
    assert_eq!(calls[0].1, TORONTO_QUESTION);
    assert_eq!(
        calls[1].0,
        vec![
            ChatTurn::model(GREETING),
            ChatTurn::user(TORONTO_QUESTION),
            ChatTurn::model(TORONTO_ANSWER),
        ]
    );
    assert_eq!(calls[1].1, "And in Ottawa?");
    assert_eq!(session.messages().len(), 5);
}

#[tokio::test]
async fn locked_session_refuses_messages() {
    let completion = Arc::new(ScriptedCompletion::answering(TORONTO_ANSWER));
    let mut session = session(completion.clone(), Arc::new(RecordingNotifier::default()));

    let err = session.send(TORONTO_QUESTION).await.expect_err("locked");

    assert_eq!(err, ChatSessionError::Locked);
    assert_eq!(session.messages().len(), 1);
    assert!(completion.calls().is_empty());
}

#[tokio::test]
async fn blank_messages_are_ignored() {
    let completion = Arc::new(ScriptedCompletion::answering(TORONTO_ANSWER));
    let mut session = session(completion.clone(), Arc::new(RecordingNotifier::default()));
    session.submit_lead("a@b.ca", "4161234567").expect("unlocks");

    for text in ["", "   ", "\n\t"] {
        assert_eq!(
            session.send(text).await.expect_err("blank"),
            ChatSessionError::EmptyMessage
        );
    }
    assert_eq!(session.messages().len(), 1);
    assert!(completion.calls().is_empty());
}

#[test]
fn second_message_while_pending_is_rejected() {
    let completion = Arc::new(ScriptedCompletion::answering(TORONTO_ANSWER));
    let mut session = session(completion, Arc::new(RecordingNotifier::default()));
    session.submit_lead("a@b.ca", "4161234567").expect("unlocks");

    let _pending = session.begin_exchange(TORONTO_QUESTION).expect("first");
    let err = session.begin_exchange("hello?").expect_err("pending");

    assert_eq!(err, ChatSessionError::ReplyPending);
    assert_eq!(session.messages().len(), 2);
}

#[test]
fn lead_is_announced_once_and_only_when_complete() {
    let notifier = Arc::new(RecordingNotifier::default());
    let completion = Arc::new(ScriptedCompletion::answering(TORONTO_ANSWER));
    let mut session = session(completion, notifier.clone());

    let err = session.submit_lead("a@b.ca", "").expect_err("phone missing");
    assert_eq!(
        err,
        ChatSessionError::Lead(LeadGateError::Incomplete {
            missing: vec!["phone"]
        })
    );
    assert!(!session.is_unlocked());
    assert!(notifier.leads().is_empty());

    let first = session.submit_lead("a@b.ca", "4161234567").expect("unlocks");
    assert!(matches!(first, LeadTransition::Unlocked(_)));
    let second = session.submit_lead("z@y.ca", "5550000000").expect("already open");
    assert_eq!(second, LeadTransition::AlreadyUnlocked);

    let leads = notifier.leads();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].email, "a@b.ca");
    assert_eq!(session.lead().map(|lead| lead.phone.as_str()), Some("4161234567"));
}

#[tokio::test]
async fn completion_failure_yields_one_fallback_and_chat_continues() {
    let completion = Arc::new(ScriptedCompletion::failing());
    let mut session = session(completion.clone(), Arc::new(RecordingNotifier::default()));
    session.submit_lead("a@b.ca", "4161234567").expect("unlocks");

    let exchange = session.send(TORONTO_QUESTION).await.expect("send still succeeds");
    assert_eq!(exchange.reply.text, FALLBACK_REPLY);
    assert!(!session.is_loading());

    session.send("Try again?").await.expect("conversation continues");
    assert_eq!(session.messages().len(), 5);
    assert_eq!(completion.calls().len(), 2);
}

#[tokio::test]
async fn registry_exposes_loading_window_and_refuses_overlap() {
    let completion = Arc::new(GatedCompletion::default());
    let registry = Arc::new(registry(completion.clone()));
    let view = registry.create();
    assert_eq!(view.id, "chat-000001");
    registry
        .submit_lead(&view.id, "a@b.ca", "4161234567")
        .await
        .expect("unlocks");

    let background = {
        let registry = Arc::clone(&registry);
        let id = view.id.clone();
        tokio::spawn(async move { registry.send(&id, TORONTO_QUESTION).await })
    };
    completion.entered.notified().await;

    let during = registry.view(&view.id).await.expect("view");
    assert!(during.loading);
    assert_eq!(during.messages.len(), 2);
    assert_eq!(
        registry.send(&view.id, "hello?").await.expect_err("pending"),
        ChatSessionError::ReplyPending
    );

    completion.release.notify_one();
    let exchange = background
        .await
        .expect("task joins")
        .expect("send completes");
    assert_eq!(exchange.reply.text, TORONTO_ANSWER);

    let after = registry.view(&view.id).await.expect("view");
    assert!(!after.loading);
    assert_eq!(after.messages.len(), 3);
}

#[tokio::test]
async fn registry_ids_are_sequential_and_unknown_ids_fail() {
    let registry = registry(Arc::new(ScriptedCompletion::answering(TORONTO_ANSWER)));
    assert_eq!(registry.create().id, "chat-000001");
    assert_eq!(registry.create().id, "chat-000002");
    assert_eq!(registry.len(), 2);

    let err = registry.view("chat-999999").await.expect_err("unknown");
    assert_eq!(err, ChatSessionError::UnknownSession("chat-999999".to_string()));
}

#[tokio::test]
async fn abandoned_send_still_records_exactly_one_reply() {
    let completion = Arc::new(GatedCompletion::default());
    let registry = registry(completion.clone());
    let id = registry.create().id;
    registry
        .submit_lead(&id, "a@b.ca", "4161234567")
        .await
        .expect("unlocks");

    // The caller goes away while the model is still answering.
    tokio::select! {
        _ = registry.send(&id, TORONTO_QUESTION) => panic!("reply should still be held"),
        _ = completion.entered.notified() => {}
    }
    completion.release.notify_one();

    let mut settled = registry.view(&id).await.expect("view");
    for _ in 0..1_000 {
        if !settled.loading {
            break;
        }
        tokio::task::yield_now().await;
        settled = registry.view(&id).await.expect("view");
    }
    assert!(!settled.loading);
    let roles: Vec<ChatRole> = settled.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![ChatRole::Model, ChatRole::User, ChatRole::Model]);
    assert_eq!(settled.messages[2].text, TORONTO_ANSWER);

    completion.release.notify_one();
    let next = registry
        .send(&id, "And in Ottawa?")
        .await
        .expect("session accepts the next message");
    assert_eq!(next.reply.text, TORONTO_ANSWER);
    assert_eq!(registry.view(&id).await.expect("view").messages.len(), 5);
}

#[tokio::test]
async fn idle_sessions_are_evicted_after_the_timeout() {
    let registry = registry(Arc::new(ScriptedCompletion::answering(TORONTO_ANSWER)))
        .with_idle_timeout(Duration::minutes(30));
    let opened = registry.create();
    let now = Utc::now();

    assert_eq!(registry.evict_idle(now + Duration::minutes(20)), 0);
    assert_eq!(registry.len(), 1);

    assert_eq!(registry.evict_idle(now + Duration::minutes(31)), 1);
    assert!(registry.is_empty());
    assert_eq!(
        registry.view(&opened.id).await.expect_err("evicted"),
        ChatSessionError::UnknownSession(opened.id.clone())
    );
}

#[tokio::test]
async fn opening_a_session_sweeps_stale_ones() {
    let registry = registry(Arc::new(ScriptedCompletion::answering(TORONTO_ANSWER)))
        .with_idle_timeout(Duration::zero());
    let first = registry.create();
    let second = registry.create();

    assert_eq!(registry.len(), 1);
    assert!(registry.view(&first.id).await.is_err());
    assert!(registry.view(&second.id).await.is_ok());
}

#[tokio::test]
async fn closed_sessions_cannot_be_reused() {
    let registry = registry(Arc::new(ScriptedCompletion::answering(TORONTO_ANSWER)));
    let id = registry.create().id;

    registry.close(&id).expect("closes");
    assert!(registry.is_empty());
    assert_eq!(
        registry.close(&id).expect_err("already closed"),
        ChatSessionError::UnknownSession(id.clone())
    );
    assert!(registry.send(&id, TORONTO_QUESTION).await.is_err());
}
