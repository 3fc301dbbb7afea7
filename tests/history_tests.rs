mod common;

use common::{FakePlatform, listed_user, looked_up_user, message, threaded};
use slack_relay::core::models::{ChatMessage, Message};
use slack_relay::history::{TimeWindow, aggregate};

const CHANNEL: &str = "C123";

fn window() -> TimeWindow {
    TimeWindow::ending_at(1_700_003_600, 1.0)
}

fn texts(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.text.as_str()).collect()
}

#[tokio::test]
async fn test_failed_history_fetch_yields_empty_transcript() {
    let platform = FakePlatform::default();

    let transcript = aggregate(&platform, CHANNEL, window()).await;

    assert!(transcript.threads.is_empty());
    assert!(transcript.earliest.is_none());
    assert!(transcript.latest.is_none());
    assert_eq!(
        serde_json::to_value(&transcript).unwrap(),
        serde_json::json!({"threads": [], "earliest": null, "latest": null})
    );
}

#[tokio::test]
async fn test_history_is_requested_for_the_computed_window() {
    let platform = FakePlatform::with_history(Vec::new());

    aggregate(&platform, CHANNEL, window()).await;

    let windows = platform.windows.lock().unwrap().clone();
    assert_eq!(
        windows,
        vec![TimeWindow {
            oldest: 1_700_000_000,
            latest: 1_700_003_600
        }]
    );
}

#[tokio::test]
async fn test_bounds_come_from_first_and_last_history_message() {
    // Slack returns newest first.
    let platform = FakePlatform::with_history(vec![
        message(Some("U1"), "1700000060.000200", "newest"),
        message(Some("U1"), "1700000030.000100", "middle"),
        message(Some("U1"), "1700000000.000300", "oldest"),
    ])
    .thread("1700000060.000200", vec![message(Some("U1"), "1700000060.000200", "newest")])
    .thread("1700000030.000100", vec![message(Some("U1"), "1700000030.000100", "middle")])
    .thread("1700000000.000300", vec![message(Some("U1"), "1700000000.000300", "oldest")]);

    let transcript = aggregate(&platform, CHANNEL, window()).await;

    assert_eq!(transcript.latest.as_deref(), Some("2023-11-14T22:14:20"));
    assert_eq!(transcript.earliest.as_deref(), Some("2023-11-14T22:13:20"));
    assert_eq!(transcript.threads.len(), 3);
    assert_eq!(texts(&transcript.threads[0].messages), vec!["newest"]);
}

#[tokio::test]
async fn test_bounds_ignore_thread_replies() {
    let platform = FakePlatform::with_history(vec![message(
        Some("U1"),
        "1700000000.000100",
        "root",
    )])
    .thread(
        "1700000000.000100",
        vec![
            message(Some("U1"), "1700000000.000100", "root"),
            threaded(Some("U2"), "1700009999.000100", "1700000000.000100", "late reply"),
        ],
    );

    let transcript = aggregate(&platform, CHANNEL, window()).await;

    assert_eq!(transcript.latest, transcript.earliest);
    assert_eq!(transcript.latest.as_deref(), Some("2023-11-14T22:13:20"));
    assert_eq!(
        texts(&transcript.threads[0].messages),
        vec!["root", "late reply"]
    );
}

#[tokio::test]
async fn test_replies_are_appended_without_duplicating_the_root() {
    let root = message(Some("U1"), "100.000001", "question");
    let platform = FakePlatform::with_history(vec![root.clone()])
        .thread(
            "100.000001",
            vec![
                root,
                threaded(Some("U2"), "101.000001", "100.000001", "answer one"),
                threaded(Some("U1"), "102.000001", "100.000001", "answer two"),
            ],
        )
        .members(vec![listed_user("U1", "Ada"), listed_user("U2", "Grace")]);

    let transcript = aggregate(&platform, CHANNEL, window()).await;

    assert_eq!(transcript.threads.len(), 1);
    let thread = &transcript.threads[0].messages;
    assert_eq!(texts(thread), vec!["question", "answer one", "answer two"]);
    let users: Vec<&str> = thread.iter().map(|m| m.user.as_str()).collect();
    assert_eq!(users, vec!["Ada", "Grace", "Ada"]);
    assert_eq!(thread[1].timestamp, "1970-01-01T00:01:41");
}

#[tokio::test]
async fn test_thread_broadcasts_never_appear() {
    let broadcast = ChatMessage {
        subtype: Some("thread_broadcast".to_string()),
        ..threaded(Some("U2"), "300.000001", "100.000001", "also sent to channel")
    };
    let platform = FakePlatform::with_history(vec![
        broadcast,
        message(Some("U1"), "100.000001", "root"),
    ])
    .thread(
        "100.000001",
        vec![
            message(Some("U1"), "100.000001", "root"),
            threaded(Some("U2"), "300.000001", "100.000001", "also sent to channel"),
        ],
    );

    let transcript = aggregate(&platform, CHANNEL, window()).await;

    // The broadcast copy is dropped; the reply itself arrives via the thread.
    assert_eq!(transcript.threads.len(), 1);
    assert_eq!(
        texts(&transcript.threads[0].messages),
        vec!["root", "also sent to channel"]
    );
    // Bounds still use the raw history, broadcast included.
    assert_eq!(transcript.latest.as_deref(), Some("1970-01-01T00:05:00"));
}

#[tokio::test]
async fn test_authorless_messages_are_dropped_everywhere() {
    let platform = FakePlatform::with_history(vec![
        message(None, "200.000001", "bot root"),
        message(Some("U1"), "100.000001", "human root"),
    ])
    .thread(
        "200.000001",
        vec![
            message(None, "200.000001", "bot root"),
            threaded(Some("U1"), "201.000001", "200.000001", "reply to bot"),
        ],
    )
    .thread(
        "100.000001",
        vec![
            message(Some("U1"), "100.000001", "human root"),
            threaded(None, "101.000001", "100.000001", "system reply"),
        ],
    );

    let transcript = aggregate(&platform, CHANNEL, window()).await;

    assert_eq!(transcript.threads.len(), 2);
    assert_eq!(texts(&transcript.threads[0].messages), vec!["reply to bot"]);
    assert_eq!(texts(&transcript.threads[1].messages), vec!["human root"]);
}

#[tokio::test]
async fn test_thread_of_only_authorless_messages_is_empty() {
    let platform = FakePlatform::with_history(vec![message(None, "100.000001", "joined")]);

    let transcript = aggregate(&platform, CHANNEL, window()).await;

    assert_eq!(transcript.threads.len(), 1);
    assert!(transcript.threads[0].messages.is_empty());
    assert!(transcript.latest.is_some());
}

#[tokio::test]
async fn test_failed_reply_fetch_keeps_root_level_members() {
    let platform = FakePlatform::with_history(vec![
        threaded(Some("U1"), "150.000001", "100.000001", "reply seen in channel"),
        message(Some("U1"), "120.000001", "standalone"),
    ]);

    let transcript = aggregate(&platform, CHANNEL, window()).await;

    assert_eq!(transcript.threads.len(), 2);
    assert_eq!(
        texts(&transcript.threads[0].messages),
        vec!["reply seen in channel"]
    );
    let mut requested = platform.reply_requests.lock().unwrap().clone();
    requested.sort();
    assert_eq!(requested, vec!["100.000001", "120.000001"]);
}

#[tokio::test]
async fn test_mentions_resolve_through_listing_and_fallback_lookup() {
    let platform = FakePlatform::with_history(vec![message(
        Some("U1"),
        "100.000001",
        "<@U2> meet <@U3>; cc <@U4>",
    )])
    .thread(
        "100.000001",
        vec![message(Some("U1"), "100.000001", "<@U2> meet <@U3>; cc <@U4>")],
    )
    .members(vec![
        listed_user("U1", "Ada"),
        listed_user("U2", "Grace"),
        listed_user("U9", "Not Mentioned"),
    ])
    .lookup(looked_up_user("U3", "Margaret"));

    let transcript = aggregate(&platform, CHANNEL, window()).await;

    let rendered = &transcript.threads[0].messages[0];
    assert_eq!(rendered.user, "Ada");
    assert_eq!(rendered.text, "Grace meet Margaret; cc <@U4>");
    // Only ids missing from the listing are looked up individually.
    assert_eq!(platform.user_requests(), vec!["U3", "U4"]);
}

#[tokio::test]
async fn test_failed_user_listing_leaves_everyone_unknown() {
    let mut platform = FakePlatform::with_history(vec![message(
        Some("U1"),
        "100.000001",
        "hi <@U2>",
    )])
    .thread("100.000001", vec![message(Some("U1"), "100.000001", "hi <@U2>")])
    .lookup(looked_up_user("U1", "Ada"));
    platform.members = None;

    let transcript = aggregate(&platform, CHANNEL, window()).await;

    let rendered = &transcript.threads[0].messages[0];
    assert_eq!(rendered.user, "Unknown");
    assert_eq!(rendered.text, "hi <@U2>");
    assert!(platform.user_requests().is_empty());
}

#[tokio::test]
async fn test_thread_order_follows_first_appearance() {
    let platform = FakePlatform::with_history(vec![
        message(Some("U1"), "300.000001", "c"),
        threaded(Some("U1"), "250.000001", "100.000001", "b-reply"),
        message(Some("U1"), "200.000001", "b"),
        message(Some("U1"), "100.000001", "a-root"),
    ]);

    let transcript = aggregate(&platform, CHANNEL, window()).await;

    let firsts: Vec<&str> = transcript
        .threads
        .iter()
        .map(|t| t.messages[0].text.as_str())
        .collect();
    assert_eq!(firsts, vec!["c", "b-reply", "b"]);
    assert_eq!(
        texts(&transcript.threads[1].messages),
        vec!["b-reply", "a-root"]
    );
}
