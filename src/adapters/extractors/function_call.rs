use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;

use crate::{
    application::{BlockExtractor, ExtractError, Extraction},
    domain::{Action, Block, CandidateRecord, FunctionCallRecord, ItemKind, Operation},
};

/// Written in place of `function_name` / `account_id` when the call args lack them.
pub const MISSING_ARG: &str = "no";

/// Selects function calls made against one contract account.
pub struct FunctionCallExtractor {
    target_contract: String,
}

impl FunctionCallExtractor {
    pub fn new(target_contract: impl Into<String>) -> Self {
        Self { target_contract: target_contract.into() }
    }

    /// All records for one action, or the first failure among its calls.
    fn extract_action(&self, action: &Action, block_height: u64) -> Result<Vec<CandidateRecord>, ExtractError> {
        let mut records = Vec::new();

        for op in &action.operations {
            let call = match op {
                Operation::FunctionCall(call) => call,
                Operation::Malformed(reason) => {
                    return Err(ExtractError::FieldShape {
                        location: format!("receipt {}", action.receipt_id),
                        reason: reason.clone(),
                    })
                }
                _ => continue,
            };

            let args = decode_args(call.args.as_deref()).map_err(|reason| ExtractError::Decode {
                location: format!("receipt {}", action.receipt_id),
                reason,
            })?;

            let Some(method_name) = call.method_name.clone() else { continue };

            records.push(CandidateRecord::FunctionCall(FunctionCallRecord {
                account_id: arg_or_missing(&args, "account_id"),
                function_name: arg_or_missing(&args, "function_name"),
                method_name,
                signer_id: action.signer_id.clone(),
                block_height,
            }));
        }

        Ok(records)
    }
}

impl BlockExtractor for FunctionCallExtractor {
    fn name(&self) -> &str {
        "FunctionCallExtractor"
    }

    fn extract(&self, block: &Block) -> Extraction {
        let mut extraction = Extraction::default();

        // Unreadable actions count against this contract unless they name another receiver.
        for item in block.malformed().iter().filter(|item| item.kind == ItemKind::Action) {
            if item.receiver_id.as_deref().is_some_and(|r| r != self.target_contract) {
                continue;
            }
            let err = ExtractError::FieldShape { location: item.location(), reason: item.reason.clone() };
            tracing::warn!(block_height = block.height(), error = %err, "Skipping action");
            extraction.skipped.push(err);
        }

        for action in block.actions().iter().filter(|a| a.receiver_id == self.target_contract) {
            match self.extract_action(action, block.height()) {
                Ok(records) => extraction.records.extend(records),
                Err(err) => {
                    tracing::warn!(block_height = block.height(), signer = %action.signer_id, error = %err, "Skipping action");
                    extraction.skipped.push(err);
                }
            }
        }

        extraction
    }
}

/// Base64 -> UTF-8 -> JSON.
fn decode_args(args: Option<&str>) -> Result<Value, String> {
    let encoded = args.ok_or_else(|| "missing args".to_string())?;
    let bytes = STANDARD.decode(encoded).map_err(|e| format!("invalid base64: {e}"))?;
    let text = String::from_utf8(bytes).map_err(|e| format!("invalid utf-8: {e}"))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid json: {e}"))
}

/// The argument rendered as text, or [`MISSING_ARG`] when it is absent or falsy.
fn arg_or_missing(args: &Value, key: &str) -> String {
    match args.get(key) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => MISSING_ARG.to_string(),
        Some(Value::String(s)) if s.is_empty() => MISSING_ARG.to_string(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => MISSING_ARG.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActionStatus, BlockHeader, FunctionCallOperation};

    const CONTRACT: &str = "dev-queryapi.test.near";

    fn call(method: Option<&str>, args: &str) -> Operation {
        Operation::FunctionCall(FunctionCallOperation {
            method_name: method.map(str::to_string),
            args: Some(args.to_string()),
            gas: Some(Value::from(30_000_000_000_000u64)),
            deposit: Some(Value::from("0")),
        })
    }

    fn encode(json: &str) -> String {
        STANDARD.encode(json)
    }

    fn action(receipt: &str, receiver: &str, operations: Vec<Operation>) -> Action {
        Action {
            signer_id: "alice.test.near".to_string(),
            receiver_id: receiver.to_string(),
            receipt_id: receipt.to_string(),
            status: ActionStatus::Success,
            operations,
        }
    }

    fn block(actions: Vec<Action>) -> Block {
        Block::new(BlockHeader { height: 100, hash: None, timestamp_nanosec: None }, actions, vec![])
    }

    #[test]
    fn test_extracts_register_call() {
        let args = encode(r#"{"function_name":"test_indexer","account_id":"bob.test.near","code":"..."}"#);
        let block = block(vec![action("r1", CONTRACT, vec![call(Some("register_indexer_function"), &args)])]);

        let extraction = FunctionCallExtractor::new(CONTRACT).extract(&block);

        assert!(extraction.skipped.is_empty());
        assert_eq!(
            extraction.records,
            vec![CandidateRecord::FunctionCall(FunctionCallRecord {
                account_id: "bob.test.near".to_string(),
                function_name: "test_indexer".to_string(),
                method_name: "register_indexer_function".to_string(),
                signer_id: "alice.test.near".to_string(),
                block_height: 100,
            })]
        );
    }

    #[test]
    fn test_missing_args_fall_back_to_no() {
        let block = block(vec![action("r1", CONTRACT, vec![call(Some("add_user"), &encode(r#"{"account_id":""}"#))])]);

        let records = FunctionCallExtractor::new(CONTRACT).extract(&block).records;

        match &records[0] {
            CandidateRecord::FunctionCall(r) => {
                assert_eq!(r.function_name, MISSING_ARG);
                assert_eq!(r.account_id, MISSING_ARG);
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn test_receiver_match_is_exact() {
        let args = encode("{}");
        let block = block(vec![
            action("r1", "sub.dev-queryapi.test.near", vec![call(Some("add_user"), &args)]),
            action("r2", "dev-queryapi.test", vec![call(Some("add_user"), &args)]),
            action("r3", "DEV-QUERYAPI.TEST.NEAR", vec![call(Some("add_user"), &args)]),
        ]);

        let extraction = FunctionCallExtractor::new(CONTRACT).extract(&block);
        assert!(extraction.records.is_empty());
        assert!(extraction.skipped.is_empty());
    }

    #[test]
    fn test_bad_args_drop_only_that_action() {
        let good = encode(r#"{"account_id":"carol.near"}"#);
        let block = block(vec![
            action("bad-b64", CONTRACT, vec![call(Some("add_user"), "%%%not base64")]),
            action("bad-json", CONTRACT, vec![call(Some("add_user"), &good), call(Some("add_user"), &encode("{oops"))]),
            action("good", CONTRACT, vec![call(Some("add_user"), &good)]),
        ]);

        let extraction = FunctionCallExtractor::new(CONTRACT).extract(&block);

        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.skipped.len(), 2);
        assert!(matches!(&extraction.skipped[0], ExtractError::Decode { location, .. } if location == "receipt bad-b64"));
        assert!(matches!(&extraction.skipped[1], ExtractError::Decode { reason, .. } if reason.starts_with("invalid json")));
    }

    #[test]
    fn test_ignores_other_operations_and_unnamed_calls() {
        let block = block(vec![action(
            "r1",
            CONTRACT,
            vec![
                Operation::CreateAccount,
                Operation::Transfer(serde_json::json!({"deposit": "1"})),
                call(None, &encode("{}")),
                call(Some("add_user"), &encode("{}")),
            ],
        )]);

        let records = FunctionCallExtractor::new(CONTRACT).extract(&block).records;
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_non_string_args_are_rendered() {
        let args = encode(r#"{"function_name": 12, "account_id": null}"#);
        let block = block(vec![action("r1", CONTRACT, vec![call(Some("m"), &args)])]);

        match &FunctionCallExtractor::new(CONTRACT).extract(&block).records[0] {
            CandidateRecord::FunctionCall(r) => {
                assert_eq!(r.function_name, "12");
                assert_eq!(r.account_id, MISSING_ARG);
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn test_malformed_operation_drops_only_its_action() {
        let block: Block = serde_json::from_value(serde_json::json!({
            "header": {"height": 100},
            "actions": [
                {"signerId": "alice.test.near", "receiverId": CONTRACT, "receiptId": "r1", "operations": [42]},
                {"signerId": "alice.test.near", "receiverId": CONTRACT, "receiptId": "r2", "operations": [
                    {"FunctionCall": {"methodName": "add_user", "args": encode(r#"{"account_id":"bob.near"}"#), "gas": 1, "deposit": 0}}
                ]}
            ]
        }))
        .unwrap();

        let extraction = FunctionCallExtractor::new(CONTRACT).extract(&block);

        assert_eq!(extraction.records.len(), 1);
        match &extraction.records[0] {
            CandidateRecord::FunctionCall(r) => assert_eq!(r.account_id, "bob.near"),
            other => panic!("unexpected record {other:?}"),
        }
        assert_eq!(extraction.skipped.len(), 1);
        assert!(matches!(&extraction.skipped[0], ExtractError::FieldShape { location, .. } if location == "receipt r1"));
    }

    #[test]
    fn test_numeric_deposit_still_yields_a_record() {
        let block: Block = serde_json::from_value(serde_json::json!({
            "header": {"height": 100},
            "actions": [{"signerId": "alice.test.near", "receiverId": CONTRACT, "receiptId": "r1", "operations": [
                {"FunctionCall": {"methodName": "add_user", "args": encode("{}"), "gas": "300000000000000", "deposit": 0}}
            ]}]
        }))
        .unwrap();

        let extraction = FunctionCallExtractor::new(CONTRACT).extract(&block);
        assert_eq!(extraction.records.len(), 1);
        assert!(extraction.skipped.is_empty());
    }

    #[test]
    fn test_unreadable_actions_are_reported_for_this_contract_only() {
        let block: Block = serde_json::from_value(serde_json::json!({
            "header": {"height": 100},
            "actions": [
                {"receiverId": CONTRACT, "receiptId": "r1", "operations": []},
                {"receiverId": "other.near", "receiptId": "r2", "operations": []},
                "not an action"
            ]
        }))
        .unwrap();

        let extraction = FunctionCallExtractor::new(CONTRACT).extract(&block);

        assert!(extraction.records.is_empty());
        let locations: Vec<String> = extraction
            .skipped
            .iter()
            .map(|e| match e {
                ExtractError::FieldShape { location, .. } => location.clone(),
                other => panic!("unexpected error {other:?}"),
            })
            .collect();
        assert_eq!(locations, vec!["action 0", "action 2"]);
    }
}
