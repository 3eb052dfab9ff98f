//! Event normalization
//!
//! The hosted session delivers response events in three wire shapes:
//! typed top-level fields (snake_case), a nested server-content sub-object
//! (snake_case), or a raw camelCase JSON mapping. This module is the single
//! adapter that probes all of them; everything after it sees only
//! [`LiveEvent`] values.
//!
//! Probing is defensive throughout: a missing or oddly-typed field is a
//! no-op for that category, never an error. One raw message may yield any
//! number of normalized events.

use serde_json::Value;

use maxwell_core::{audio, Speaker};

use crate::event::LiveEvent;

/// Normalize one raw server message into zero or more events
pub fn normalize(raw: &Value) -> Vec<LiveEvent> {
    let mut events = Vec::new();

    // Audio payload (typed shape): base64 PCM16.
    if let Some(data) = raw.get("data").and_then(Value::as_str) {
        match audio::decode_audio(data) {
            Ok(pcm) if !pcm.is_empty() => events.push(LiveEvent::AudioChunk(pcm)),
            Ok(_) => {}
            Err(e) => tracing::warn!("Dropping undecodable audio payload: {}", e),
        }
    }

    let is_final = raw.get("is_final").and_then(Value::as_bool).unwrap_or(false);

    // Recognized user speech (typed shape).
    if let Some(recognized) = non_empty_str(raw.get("recognized_speech")) {
        if is_final {
            events.push(LiveEvent::FinalUserText(recognized.to_string()));
        } else {
            events.push(LiveEvent::PartialUserText(recognized.to_string()));
        }
    }

    // Model text fragment (typed shape).
    if let Some(text) = non_empty_str(raw.get("text")) {
        if is_final {
            events.push(LiveEvent::FinalAssistantText(text.to_string()));
        } else {
            events.push(LiveEvent::PartialAssistantText(text.to_string()));
        }
    }

    // Nested server content, in either casing.
    if let Some(content) = get2(raw, "server_content", "serverContent") {
        normalize_server_content(content, &mut events);
    }

    events
}

/// Normalize the nested server-content sub-object
fn normalize_server_content(content: &Value, events: &mut Vec<LiveEvent>) {
    // Model turn: text fragments inside parts.
    if let Some(model_turn) = get2(content, "model_turn", "modelTurn") {
        if let Some(parts) = model_turn.get("parts").and_then(Value::as_array) {
            for part in parts {
                if let Some(text) = non_empty_str(part.get("text")) {
                    events.push(LiveEvent::PartialAssistantText(text.to_string()));
                }
            }
        }
    }

    if is_set(get2(content, "turn_complete", "turnComplete")) {
        events.push(LiveEvent::TurnComplete(Speaker::Assistant));
    }

    // Input transcription: incremental user speech, finalized by activity_end.
    if let Some(transcription) = get2(content, "input_transcription", "inputTranscription") {
        if let Some(text) = non_empty_str(transcription.get("text")) {
            events.push(LiveEvent::PartialUserText(text.to_string()));
        }
    }

    if is_set(get2(content, "activity_end", "activityEnd")) {
        events.push(LiveEvent::TurnComplete(Speaker::User));
    }
}

/// Fetch a field by its snake_case or camelCase name
fn get2<'a>(value: &'a Value, snake: &str, camel: &str) -> Option<&'a Value> {
    value.get(snake).or_else(|| value.get(camel))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Truthiness for flag fields: an explicit `true`, or a marker object
fn is_set(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Object(_)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maxwell_core::audio::encode_audio;
    use serde_json::json;

    #[test]
    fn test_typed_audio_payload() {
        let pcm = vec![1i16, -2, 3];
        let raw = json!({ "data": encode_audio(&pcm) });

        let events = normalize(&raw);
        assert_eq!(events, vec![LiveEvent::AudioChunk(pcm)]);
    }

    #[test]
    fn test_typed_recognized_speech_partial_and_final() {
        let partial = normalize(&json!({ "recognized_speech": "hello" }));
        assert_eq!(partial, vec![LiveEvent::PartialUserText("hello".into())]);

        let fin = normalize(&json!({ "recognized_speech": "world", "is_final": true }));
        assert_eq!(fin, vec![LiveEvent::FinalUserText("world".into())]);
    }

    #[test]
    fn test_typed_model_text() {
        let partial = normalize(&json!({ "text": "Thinking about" }));
        assert_eq!(
            partial,
            vec![LiveEvent::PartialAssistantText("Thinking about".into())]
        );

        let fin = normalize(&json!({ "text": " that.", "is_final": true }));
        assert_eq!(fin, vec![LiveEvent::FinalAssistantText(" that.".into())]);
    }

    #[test]
    fn test_nested_snake_case_server_content() {
        let raw = json!({
            "server_content": {
                "model_turn": { "parts": [ { "text": "Good morning" }, { "text": "!" } ] },
                "turn_complete": true,
            }
        });

        let events = normalize(&raw);
        assert_eq!(
            events,
            vec![
                LiveEvent::PartialAssistantText("Good morning".into()),
                LiveEvent::PartialAssistantText("!".into()),
                LiveEvent::TurnComplete(Speaker::Assistant),
            ]
        );
    }

    #[test]
    fn test_raw_camel_case_mapping_is_equivalent() {
        let snake = json!({
            "server_content": {
                "model_turn": { "parts": [ { "text": "Hello" } ] },
                "input_transcription": { "text": "hi there" },
                "activity_end": true,
            }
        });
        let camel = json!({
            "serverContent": {
                "modelTurn": { "parts": [ { "text": "Hello" } ] },
                "inputTranscription": { "text": "hi there" },
                "activityEnd": true,
            }
        });

        assert_eq!(normalize(&snake), normalize(&camel));
        assert_eq!(
            normalize(&camel),
            vec![
                LiveEvent::PartialAssistantText("Hello".into()),
                LiveEvent::PartialUserText("hi there".into()),
                LiveEvent::TurnComplete(Speaker::User),
            ]
        );
    }

    #[test]
    fn test_activity_end_as_marker_object() {
        let raw = json!({ "serverContent": { "activityEnd": {} } });
        assert_eq!(normalize(&raw), vec![LiveEvent::TurnComplete(Speaker::User)]);
    }

    #[test]
    fn test_missing_fields_are_no_ops() {
        assert!(normalize(&json!({})).is_empty());
        assert!(normalize(&json!({ "unrelated": 1 })).is_empty());
        // Wrong types are tolerated, not errors.
        assert!(normalize(&json!({ "text": 42, "recognized_speech": null })).is_empty());
        assert!(normalize(&json!({ "server_content": { "turn_complete": false } })).is_empty());
    }

    #[test]
    fn test_empty_fragments_are_dropped() {
        assert!(normalize(&json!({ "text": "" })).is_empty());
        assert!(normalize(&json!({ "data": "" })).is_empty());
    }

    #[test]
    fn test_one_message_many_events() {
        let pcm = vec![7i16; 4];
        let raw = json!({
            "data": encode_audio(&pcm),
            "serverContent": {
                "modelTurn": { "parts": [ { "text": "And one more thing" } ] },
                "turnComplete": true,
            }
        });

        let events = normalize(&raw);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], LiveEvent::AudioChunk(pcm));
        assert_eq!(events[2], LiveEvent::TurnComplete(Speaker::Assistant));
    }
}
