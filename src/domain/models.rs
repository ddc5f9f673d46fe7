use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded NEAR block as handed to indexer functions.
///
/// Individual actions and events that do not have the expected shape are
/// kept aside in `malformed` instead of failing the block; only a broken
/// header or non-array `actions`/`events` make the block itself invalid.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub header: BlockHeader,
    pub actions: Vec<Action>,
    pub events: Vec<Event>,
    pub malformed: Vec<MalformedItem>,
}

#[derive(Deserialize)]
struct RawBlock {
    header: BlockHeader,
    #[serde(default)]
    actions: Vec<Value>,
    #[serde(default)]
    events: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Action,
    Event,
}

/// An action or event that could not be read into its typed form.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedItem {
    pub kind: ItemKind,
    pub index: usize,
    /// `receiverId` of a malformed action, when it is readable.
    pub receiver_id: Option<String>,
    pub reason: String,
}

impl MalformedItem {
    pub fn location(&self) -> String {
        match self.kind {
            ItemKind::Action => format!("action {}", self.index),
            ItemKind::Event => format!("event {}", self.index),
        }
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        RawBlock::deserialize(deserializer).map(Block::from_raw)
    }
}

impl Block {
    fn from_raw(raw: RawBlock) -> Self {
        let mut malformed = Vec::new();

        let actions = raw
            .actions
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                let receiver_id = value.get("receiverId").and_then(Value::as_str).map(str::to_string);
                serde_json::from_value::<Action>(value)
                    .map_err(|e| malformed.push(MalformedItem { kind: ItemKind::Action, index, receiver_id, reason: e.to_string() }))
                    .ok()
            })
            .collect();

        let events = raw
            .events
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                serde_json::from_value::<Event>(value)
                    .map_err(|e| malformed.push(MalformedItem { kind: ItemKind::Event, index, receiver_id: None, reason: e.to_string() }))
                    .ok()
            })
            .collect();

        Self { header: raw.header, actions, events, malformed }
    }

    pub fn new(header: BlockHeader, actions: Vec<Action>, events: Vec<Event>) -> Self {
        Self { header, actions, events, malformed: Vec::new() }
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn malformed(&self) -> &[MalformedItem] {
        &self.malformed
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub height: u64,
    #[serde(default)]
    pub hash: Option<String>,
    /// Nanoseconds since the unix epoch, as a decimal string.
    #[serde(default)]
    pub timestamp_nanosec: Option<String>,
}

impl BlockHeader {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let nanos: i64 = self.timestamp_nanosec.as_deref()?.parse().ok()?;
        Some(DateTime::from_timestamp_nanos(nanos))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionStatus {
    #[default]
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub signer_id: String,
    pub receiver_id: String,
    pub receipt_id: String,
    #[serde(default)]
    pub status: ActionStatus,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

/// Operation kinds carried by an action receipt.
///
/// On the wire each operation is an object keyed by its kind
/// (`{"FunctionCall": {...}}`) or a bare kind name for payload-less ones
/// (`"CreateAccount"`). Kinds this crate does not know about are kept as
/// `Unknown`, and shapes it cannot read as `Malformed`; neither fails the block.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateAccount,
    DeployContract(Value),
    FunctionCall(FunctionCallOperation),
    Transfer(Value),
    Stake(Value),
    AddKey(Value),
    DeleteKey(Value),
    DeleteAccount(Value),
    Delegate(Value),
    Unknown(String),
    Malformed(String),
}

impl Operation {
    fn from_tagged(kind: String, payload: Value) -> Self {
        match kind.as_str() {
            "CreateAccount" => Operation::CreateAccount,
            "DeployContract" => Operation::DeployContract(payload),
            "FunctionCall" => match FunctionCallOperation::from_payload(&payload) {
                Ok(call) => Operation::FunctionCall(call),
                Err(reason) => Operation::Malformed(reason),
            },
            "Transfer" => Operation::Transfer(payload),
            "Stake" => Operation::Stake(payload),
            "AddKey" => Operation::AddKey(payload),
            "DeleteKey" => Operation::DeleteKey(payload),
            "DeleteAccount" => Operation::DeleteAccount(payload),
            "Delegate" => Operation::Delegate(payload),
            _ => Operation::Unknown(kind),
        }
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(kind) => Operation::from_tagged(kind, Value::Null),
            Value::Object(map) if map.len() == 1 => match map.into_iter().next() {
                Some((kind, payload)) => Operation::from_tagged(kind, payload),
                None => Operation::Malformed("empty operation".to_string()),
            },
            other => Operation::Malformed(format!("unexpected operation shape: {other}")),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionCallOperation {
    pub method_name: Option<String>,
    /// Base64 encoded JSON arguments.
    pub args: Option<String>,
    pub gas: Option<Value>,
    pub deposit: Option<Value>,
}

impl FunctionCallOperation {
    /// Reads `methodName` and `args` as optional strings; `gas` and `deposit`
    /// are carried through untyped since extraction never reads them.
    fn from_payload(payload: &Value) -> Result<Self, String> {
        let Value::Object(map) = payload else {
            return Err(format!("FunctionCall payload is not an object: {payload}"));
        };

        let text = |key: &str| match map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(format!("FunctionCall.{key}: expected a string, got {other}")),
        };

        Ok(Self {
            method_name: text("methodName")?,
            args: text("args")?,
            gas: map.get("gas").cloned(),
            deposit: map.get("deposit").cloned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub related_receipt_id: Option<String>,
    #[serde(default)]
    pub raw_event: RawEvent,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RawEvent {
    /// The standard event payload as a JSON string.
    #[serde(default)]
    pub standard: Option<String>,
}

/// Decoded `EVENT_JSON` payload of a NEP-297 standard event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StandardEvent {
    pub standard: String,
    pub version: String,
    pub event: EventKind,
    pub data: Vec<EventData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    FtMint,
    FtBurn,
    FtTransfer,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::FtMint => "ft_mint",
            EventKind::FtBurn => "ft_burn",
            EventKind::FtTransfer => "ft_transfer",
            EventKind::Other(name) => name,
        }
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ft_mint" => EventKind::FtMint,
            "ft_burn" => EventKind::FtBurn,
            "ft_transfer" => EventKind::FtTransfer,
            _ => EventKind::Other(value),
        }
    }
}

impl From<EventKind> for String {
    fn from(value: EventKind) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventData {
    /// Token amount as a decimal string; may exceed any fixed-width integer.
    pub amount: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub old_owner_id: Option<String>,
    #[serde(default)]
    pub new_owner_id: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
}

pub const DEFAULT_QUERY_API_CONTRACT: &str = "dev-queryapi.test.near";
