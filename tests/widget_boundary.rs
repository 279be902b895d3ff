mod support;

use openlaw_intake::prompts;
use openlaw_intake::{
    Config, IntakeError, IntakeWidget, LifecycleState, ReopenPolicy, SessionManager, TurnRole,
    TurnStatus, WidgetSignal,
};
use std::time::Duration;
use support::{next_call, scripted, TIMEOUT};

fn widget(policy: ReopenPolicy) -> (IntakeWidget, tokio::sync::mpsc::UnboundedReceiver<support::PendingCall>) {
    let (assistant, calls) = scripted();
    let manager = SessionManager::with_timeout(assistant, TIMEOUT);
    (IntakeWidget::from_manager(manager, policy), calls)
}

fn open(text: &str) -> WidgetSignal {
    WidgetSignal::OpenWidget {
        starter_text: text.to_string(),
    }
}

#[tokio::test]
async fn test_closed_widget_view() {
    let (widget, _calls) = widget(ReopenPolicy::Replace);
    let view = widget.view();
    assert!(!view.is_open);
    assert!(view.turns.is_empty());
    assert_eq!(view.lifecycle_state, None);
    assert!(!view.accepts_submission);
}

#[tokio::test]
async fn test_suggestion_chip_opens_with_starter() {
    let (mut widget, mut calls) = widget(ReopenPolicy::Replace);

    widget.handle(open(prompts::SUGGESTIONS[2])).unwrap();
    let view = widget.view();
    assert!(view.is_open);
    assert_eq!(view.turns[0].text, "Draft a contract or agreement");
    assert!(!view.accepts_submission);

    let call = next_call(&mut calls).await;
    assert_eq!(call.request.text, "Draft a contract or agreement");
}

#[tokio::test]
async fn test_replace_policy_discards_previous_conversation() {
    let (mut widget, mut calls) = widget(ReopenPolicy::Replace);

    widget.handle(open("Need a lawyer to defend me")).unwrap();
    let mut first = next_call(&mut calls).await;

    widget.handle(open("Received a letter from OpenLaw")).unwrap();
    first.abandoned().await;
    assert!(!first.succeed("stale reply"));

    let view = widget.view();
    assert_eq!(view.turns.len(), 2);
    assert_eq!(view.turns[0].text, "Received a letter from OpenLaw");

    next_call(&mut calls).await.succeed("What's your reference number?");
    widget.resolve_next().await.unwrap();
    let view = widget.view();
    assert_eq!(view.turns[1].text, "What's your reference number?");
    assert_eq!(view.lifecycle_state, Some(LifecycleState::Idle));
}

#[tokio::test]
async fn test_append_policy_continues_conversation() {
    let (mut widget, mut calls) = widget(ReopenPolicy::Append);

    widget.handle(open("Need a lawyer")).unwrap();
    assert_eq!(
        widget.handle(open("In Texas")),
        Err(IntakeError::RequestInFlight)
    );

    next_call(&mut calls).await.succeed("Where are you located?");
    widget.resolve_next().await.unwrap();

    widget.handle(open("In Texas")).unwrap();
    widget.handle(open("   ")).unwrap();

    let roles: Vec<TurnRole> = widget.view().turns.iter().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![
            TurnRole::User,
            TurnRole::Assistant,
            TurnRole::User,
            TurnRole::Assistant
        ]
    );
}

#[tokio::test]
async fn test_submit_text_and_close_signals() {
    let (mut widget, mut calls) = widget(ReopenPolicy::Replace);

    assert_eq!(
        widget.handle(WidgetSignal::SubmitText {
            text: "hello".to_string()
        }),
        Err(IntakeError::SessionNotOpen)
    );

    widget.handle(open("")).unwrap();
    assert!(widget.view().accepts_submission);
    assert_eq!(
        widget.handle(WidgetSignal::SubmitText {
            text: "  ".to_string()
        }),
        Err(IntakeError::EmptyInput)
    );

    widget
        .handle(WidgetSignal::SubmitText {
            text: "Is a verbal agreement binding?".to_string(),
        })
        .unwrap();
    let _call = next_call(&mut calls).await;

    widget.handle(WidgetSignal::CloseWidget).unwrap();
    widget.handle(WidgetSignal::CloseWidget).unwrap();
    assert!(!widget.is_open());
    assert!(widget.view().turns.is_empty());
}

#[tokio::test]
async fn test_view_reflects_reply_only_after_poll() {
    let (mut widget, mut calls) = widget(ReopenPolicy::Replace);
    widget.handle(open("Need a lawyer")).unwrap();
    assert!(next_call(&mut calls).await.succeed("Where are you located?"));
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    let view = widget.view();
    assert_eq!(view.turns[1].status, TurnStatus::Pending);
    assert_eq!(view.lifecycle_state, Some(LifecycleState::AwaitingResponse));

    assert_eq!(widget.poll().unwrap(), 1);
    let view = widget.view();
    assert_eq!(view.turns[1].text, "Where are you located?");
    assert!(view.accepts_submission);
}

#[tokio::test]
async fn test_stop_marks_reply_failed() {
    let (mut widget, mut calls) = widget(ReopenPolicy::Replace);
    widget.handle(open("Need a lawyer")).unwrap();
    let _call = next_call(&mut calls).await;

    assert!(widget.stop().unwrap());
    let view = widget.view();
    assert_eq!(view.turns[1].status, TurnStatus::Failed);
    assert_eq!(view.turns[1].text, prompts::CANCELLED_REASON);
    assert!(view.accepts_submission);
}

#[tokio::test]
async fn test_dropping_widget_cancels_request() {
    let (mut widget, mut calls) = widget(ReopenPolicy::Replace);
    widget.handle(open("Need a lawyer")).unwrap();
    let mut call = next_call(&mut calls).await;

    drop(widget);
    tokio::time::timeout(Duration::from_secs(5), call.abandoned())
        .await
        .expect("request should be abandoned once the widget is gone");
}

#[tokio::test]
async fn test_widget_from_config_uses_reopen_policy() {
    let (assistant, _calls) = scripted();
    let config = Config {
        reopen_policy: ReopenPolicy::Append,
        ..Config::default()
    };
    let widget = IntakeWidget::new(assistant, &config);
    assert_eq!(widget.reopen_policy(), ReopenPolicy::Append);
}
