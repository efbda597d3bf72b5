use async_trait::async_trait;
use contoso_core::audio::{
    AudioConfig, AudioError, BackgroundAudio, BackgroundAudioConfig, CuePlayback, CuePlayer,
};
use contoso_core::config::SearchConfig;
use contoso_core::search::{SearchClient, SearchError, SearchRequest, SearchResponse};
use contoso_core::session::{parse_tool_calls_from_chat, ToolCallRequest, ToolTurn};
use contoso_core::tools::native::WebSearchTool;
use contoso_core::tools::{ToolError, ToolRegistry};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counts how many cues are currently audible
#[derive(Default)]
struct CountingPlayer {
    started: AtomicUsize,
    active: Arc<AtomicUsize>,
}

impl CuePlayer for CountingPlayer {
    fn play(&self, _path: &Path, _volume: f32) -> Result<CuePlayback, AudioError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);
        let active = Arc::clone(&self.active);
        Ok(CuePlayback::new(move || {
            active.fetch_sub(1, Ordering::SeqCst);
        }))
    }
}

/// Provider that reports whether the thinking cue is audible while it runs
struct ObservingSearch {
    active: Arc<AtomicUsize>,
    heard_cue: AtomicUsize,
}

#[async_trait]
impl SearchClient for ObservingSearch {
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if self.active.load(Ordering::SeqCst) > 0 {
            self.heard_cue.fetch_add(1, Ordering::SeqCst);
        }
        if request.query == "fail" {
            return Err(SearchError::Unauthorized("invalid api key".into()));
        }
        Ok(SearchResponse::new(json!({ "query": request.query, "results": [] })))
    }
}

fn setup() -> (ToolTurn, Arc<CountingPlayer>, Arc<ObservingSearch>) {
    let player = Arc::new(CountingPlayer::default());
    let search = Arc::new(ObservingSearch {
        active: Arc::clone(&player.active),
        heard_cue: AtomicUsize::new(0),
    });
    let cfg = SearchConfig {
        base_url: "http://localhost".into(),
        api_key: Some("k".into()),
        delay: None,
        user_agent: "test".into(),
    };
    let registry = ToolRegistry::new();
    registry.register(Arc::new(WebSearchTool::new(search.clone(), &cfg)));

    let audio = Arc::new(BackgroundAudio::new(
        player.clone(),
        BackgroundAudioConfig {
            thinking_sounds: vec![AudioConfig::file("sound/ringtone.mp3", 0.7)],
            ambient_sound: None,
            assets_dir: PathBuf::from("sound"),
        },
    ));
    (
        ToolTurn::new(registry).with_background_audio(audio),
        player,
        search,
    )
}

#[tokio::test(start_paused = true)]
async fn cue_plays_for_the_lifetime_of_the_turn() {
    let (turn, player, search) = setup();

    let outcomes = turn
        .run(vec![ToolCallRequest::new(
            "search_web",
            json!({"query": "current weather in Bangkok"}),
        )])
        .await;

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_ok());
    assert_eq!(search.heard_cue.load(Ordering::SeqCst), 1);
    assert_eq!(player.started.load(Ordering::SeqCst), 1);
    assert_eq!(player.active.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn no_calls_no_cue() {
    let (turn, player, _search) = setup();
    assert!(turn.run(vec![]).await.is_empty());
    assert_eq!(player.started.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn outcomes_keep_call_order_and_ids() {
    let (turn, player, _search) = setup();

    let calls = vec![
        ToolCallRequest {
            id: Some("call_a".into()),
            name: "search_web".into(),
            arguments: json!({"query": "alpha"}),
        },
        ToolCallRequest {
            id: Some("call_b".into()),
            name: "search_web".into(),
            arguments: json!({"query": "fail"}),
        },
        ToolCallRequest {
            id: Some("call_c".into()),
            name: "lookup_weather".into(),
            arguments: json!({"location": "Bangkok"}),
        },
    ];
    let outcomes = turn.run(calls).await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].call_id.as_deref(), Some("call_a"));
    assert_eq!(outcomes[0].result.as_ref().unwrap()["query"], "alpha");

    assert!(matches!(
        outcomes[1].result,
        Err(ToolError::Search(SearchError::Unauthorized(_)))
    ));
    assert!(matches!(outcomes[2].result, Err(ToolError::NotFound(_))));

    // One cue for the whole turn, stopped afterwards
    assert_eq!(player.started.load(Ordering::SeqCst), 1);
    assert_eq!(player.active.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_search_is_reported_not_replaced() {
    let (turn, _player, _search) = setup();
    let mut outcomes = turn
        .run(vec![ToolCallRequest {
            id: Some("call_1".into()),
            name: "search_web".into(),
            arguments: json!({"query": "fail"}),
        }])
        .await;

    let msg = outcomes.remove(0).to_tool_message();
    assert_eq!(msg["role"], "tool");
    assert_eq!(msg["tool_call_id"], "call_1");
    assert_eq!(
        msg["content"],
        "error: Search API rejected the credential: invalid api key"
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_the_turn_stops_the_cue() {
    let (turn, player, _search) = setup();
    let calls = vec![ToolCallRequest::new("search_web", json!({"query": "slow"}))];

    let res = tokio::time::timeout(Duration::from_millis(10), turn.run(calls)).await;
    assert!(res.is_err());
    assert_eq!(player.started.load(Ordering::SeqCst), 1);
    assert_eq!(player.active.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn turn_without_background_audio_still_runs() {
    let search = Arc::new(ObservingSearch {
        active: Arc::new(AtomicUsize::new(0)),
        heard_cue: AtomicUsize::new(0),
    });
    let cfg = SearchConfig {
        base_url: "http://localhost".into(),
        api_key: Some("k".into()),
        delay: None,
        user_agent: "test".into(),
    };
    let registry = ToolRegistry::new();
    registry.register(Arc::new(WebSearchTool::new(search, &cfg)));

    let outcomes = ToolTurn::new(registry)
        .run(vec![ToolCallRequest::new("search_web", json!({"query": "x"}))])
        .await;
    assert!(outcomes[0].is_ok());
}

#[test]
fn parse_chat_tool_calls() {
    let chat = json!({
        "choices": [
            {"message": {"tool_calls": [
                {"id":"tool_1","function": {"name":"search_web","arguments":"{\"query\":\"latest exchange rate USD to THB\"}"}},
                {"id":"tool_2","function": {"name":"search_web","arguments":{"query":"bangkok"}}}
            ]}}
        ]
    });
    let calls = parse_tool_calls_from_chat(&chat);
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].id.as_deref(), Some("tool_1"));
    assert_eq!(calls[0].arguments["query"], "latest exchange rate USD to THB");
    assert_eq!(calls[1].arguments["query"], "bangkok");
}

#[test]
fn parse_chat_malformed_arguments_and_missing_names() {
    let chat = json!({
        "choices": [
            {"message": {"tool_calls": [
                {"id":"tool_1","function": {"name":"search_web","arguments":"not valid json"}},
                {"id":"tool_2","function": {"arguments":"{}"}}
            ]}}
        ]
    });
    let calls = parse_tool_calls_from_chat(&chat);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].arguments, json!({}));
}

#[test]
fn parse_chat_plain_text_has_no_calls() {
    let chat = json!({"choices": [{"message": {"content": "Hello there"}}]});
    assert!(parse_tool_calls_from_chat(&chat).is_empty());
}
