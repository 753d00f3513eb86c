//! Effects returned by handlers, and normalization of raw handler output.

use serde::{Deserialize, Serialize};

/// Instructions a plugin can send back to the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EffectType {
    /// Write a line to the plugin log.
    Log,
    /// Show a banner on the patient chart.
    AddBannerAlert,
    /// Remove a previously added banner.
    RemoveBannerAlert,
    /// Create or refresh a protocol (care gap) card.
    AddOrUpdateProtocolCard,
    /// Create a task.
    CreateTask,
    /// Update a task.
    UpdateTask,
    /// Create a note.
    CreateNote,
    /// Response to a simple API request.
    SimpleApiResponse,
    /// Any effect name not listed above.
    Other(String),
}

impl EffectType {
    /// Returns the wire name of this effect type.
    pub fn name(&self) -> &str {
        match self {
            Self::Log => "LOG",
            Self::AddBannerAlert => "ADD_BANNER_ALERT",
            Self::RemoveBannerAlert => "REMOVE_BANNER_ALERT",
            Self::AddOrUpdateProtocolCard => "ADD_OR_UPDATE_PROTOCOL_CARD",
            Self::CreateTask => "CREATE_TASK",
            Self::UpdateTask => "UPDATE_TASK",
            Self::CreateNote => "CREATE_NOTE",
            Self::SimpleApiResponse => "SIMPLE_API_RESPONSE",
            Self::Other(name) => name,
        }
    }
}

impl std::fmt::Display for EffectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for EffectType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "LOG" => Self::Log,
            "ADD_BANNER_ALERT" => Self::AddBannerAlert,
            "REMOVE_BANNER_ALERT" => Self::RemoveBannerAlert,
            "ADD_OR_UPDATE_PROTOCOL_CARD" => Self::AddOrUpdateProtocolCard,
            "CREATE_TASK" => Self::CreateTask,
            "UPDATE_TASK" => Self::UpdateTask,
            "CREATE_NOTE" => Self::CreateNote,
            "SIMPLE_API_RESPONSE" => Self::SimpleApiResponse,
            _ => Self::Other(name),
        }
    }
}

impl From<EffectType> for String {
    fn from(effect_type: EffectType) -> Self {
        effect_type.name().to_string()
    }
}

/// An outbound instruction from a plugin to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// What the host should do.
    #[serde(rename = "type")]
    pub effect_type: EffectType,
    /// Serialized payload, interpreted by the host according to `effect_type`.
    pub payload: String,
}

impl Effect {
    /// Creates an effect with a raw string payload.
    pub fn new(effect_type: EffectType, payload: impl Into<String>) -> Self {
        Self {
            effect_type,
            payload: payload.into(),
        }
    }

    /// Creates a `LOG` effect.
    pub fn log(message: impl Into<String>) -> Self {
        Self::new(EffectType::Log, message)
    }

    /// Creates an effect whose payload is the JSON encoding of `data`.
    pub fn json<T: Serialize>(effect_type: EffectType, data: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(effect_type, serde_json::to_string(data)?))
    }
}

/// One entry of a list returned by a handler.
///
/// Handlers may hand back lists that mix effects with other values; only
/// the effects survive normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputItem {
    /// A real effect.
    Effect(Effect),
    /// Anything else; discarded.
    Other(serde_json::Value),
}

impl From<Effect> for OutputItem {
    fn from(effect: Effect) -> Self {
        Self::Effect(effect)
    }
}

impl From<serde_json::Value> for OutputItem {
    fn from(value: serde_json::Value) -> Self {
        Self::Other(value)
    }
}

/// Raw value returned from a handler's compute call.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum HandlerOutput {
    /// Nothing to do.
    #[default]
    Empty,
    /// Exactly one effect.
    Single(Effect),
    /// A list of items, possibly containing non-effects.
    Many(Vec<OutputItem>),
}

impl HandlerOutput {
    /// Flattens the output into the list of effects sent to the host.
    ///
    /// Non-effect items are dropped silently.
    pub fn into_effects(self) -> Vec<Effect> {
        match self {
            Self::Empty => Vec::new(),
            Self::Single(effect) => vec![effect],
            Self::Many(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    OutputItem::Effect(effect) => Some(effect),
                    OutputItem::Other(_) => None,
                })
                .collect(),
        }
    }

    /// Number of items, effect or not.
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Many(items) => items.len(),
        }
    }

    /// Whether the output carries no items at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<()> for HandlerOutput {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl From<Effect> for HandlerOutput {
    fn from(effect: Effect) -> Self {
        Self::Single(effect)
    }
}

impl From<Option<Effect>> for HandlerOutput {
    fn from(effect: Option<Effect>) -> Self {
        effect.map_or(Self::Empty, Self::Single)
    }
}

impl From<Vec<Effect>> for HandlerOutput {
    fn from(effects: Vec<Effect>) -> Self {
        Self::Many(effects.into_iter().map(OutputItem::Effect).collect())
    }
}

impl From<Vec<OutputItem>> for HandlerOutput {
    fn from(items: Vec<OutputItem>) -> Self {
        Self::Many(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_effect_becomes_one_element() {
        let effects = HandlerOutput::from(Effect::log("Hello, world!")).into_effects();
        assert_eq!(effects, vec![Effect::log("Hello, world!")]);
    }

    #[test]
    fn test_list_is_kept_in_order() {
        let list = vec![Effect::log("first"), Effect::log("second")];
        let effects = HandlerOutput::from(list.clone()).into_effects();
        assert_eq!(effects, list);
    }

    #[test]
    fn test_mixed_list_drops_non_effects() {
        let output = HandlerOutput::from(vec![
            OutputItem::from(Effect::log("kept")),
            OutputItem::from(serde_json::json!({"not": "an effect"})),
            OutputItem::from(serde_json::Value::Null),
            OutputItem::from(Effect::new(EffectType::CreateTask, "{}")),
        ]);
        assert_eq!(output.len(), 4);

        let effects = output.into_effects();
        assert_eq!(
            effects,
            vec![
                Effect::log("kept"),
                Effect::new(EffectType::CreateTask, "{}"),
            ]
        );
    }

    #[test]
    fn test_empty_and_none_yield_nothing() {
        assert!(HandlerOutput::from(()).into_effects().is_empty());
        assert!(HandlerOutput::from(None::<Effect>).into_effects().is_empty());
        assert!(HandlerOutput::Many(Vec::new()).into_effects().is_empty());
    }

    #[test]
    fn test_effect_wire_shape() {
        let json = serde_json::to_value(Effect::log("Hello, world!")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "LOG", "payload": "Hello, world!"}));
    }
}
