//! # Data Contract Create Transition
//!
//! Registers a data contract. Carries the creation entropy so validators can
//! re-derive the contract id.

use super::data_contract::DataContract;
use super::integral;
use super::state_transition::{
    insert_signature_fields, parse_signature_fields, StateTransitionLike, StateTransitionType,
};
use crate::errors::DppError;
use serde_json::{json, Map, Value};
use shared_types::Identifier;

/// A data contract create transition.
#[derive(Debug, Clone, PartialEq)]
pub struct DataContractCreateTransition {
    protocol_version: u32,
    data_contract: DataContract,
    entropy: String,
    signature_public_key_id: Option<u32>,
    signature: Option<Vec<u8>>,
}

impl DataContractCreateTransition {
    /// Unsigned transition for a freshly created contract.
    pub fn new(protocol_version: u32, data_contract: DataContract) -> Result<Self, DppError> {
        let entropy = data_contract
            .entropy()
            .ok_or(DppError::MissingEntropy)?
            .to_string();
        Ok(Self {
            protocol_version,
            data_contract,
            entropy,
            signature_public_key_id: None,
            signature: None,
        })
    }

    /// Contract being registered.
    pub fn data_contract(&self) -> &DataContract {
        &self.data_contract
    }

    /// Creation entropy.
    pub fn entropy(&self) -> &str {
        &self.entropy
    }

    /// Parses the object form. Performs no validation.
    pub fn from_object(raw: &Value) -> Result<Self, DppError> {
        let object = raw
            .as_object()
            .ok_or_else(|| DppError::MalformedObject("transition is not an object".into()))?;

        let protocol_version = object
            .get("protocolVersion")
            .and_then(integral::as_u32)
            .ok_or_else(|| DppError::MalformedObject("invalid protocolVersion".into()))?;
        let entropy = object
            .get("entropy")
            .and_then(Value::as_str)
            .ok_or(DppError::MissingEntropy)?
            .to_string();
        let mut data_contract = DataContract::from_object(
            object
                .get("dataContract")
                .ok_or_else(|| DppError::MalformedObject("missing dataContract".into()))?,
        )?;
        data_contract.set_entropy(Some(entropy.clone()));
        let (signature_public_key_id, signature) = parse_signature_fields(object)?;

        Ok(Self {
            protocol_version,
            data_contract,
            entropy,
            signature_public_key_id,
            signature,
        })
    }
}

impl StateTransitionLike for DataContractCreateTransition {
    fn transition_type(&self) -> StateTransitionType {
        StateTransitionType::DataContractCreate
    }

    fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    fn owner_id(&self) -> Identifier {
        self.data_contract.owner_id()
    }

    fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    fn signature_public_key_id(&self) -> Option<u32> {
        self.signature_public_key_id
    }

    fn set_signature(&mut self, public_key_id: u32, signature: Vec<u8>) {
        self.signature_public_key_id = Some(public_key_id);
        self.signature = Some(signature);
    }

    fn to_object(&self, skip_signature: bool) -> Value {
        let mut object = Map::new();
        object.insert("protocolVersion".into(), json!(self.protocol_version));
        object.insert("type".into(), json!(self.transition_type().code()));
        object.insert("dataContract".into(), self.data_contract.to_object());
        object.insert("entropy".into(), json!(self.entropy));
        insert_signature_fields(
            &mut object,
            skip_signature,
            self.signature_public_key_id,
            self.signature.as_deref(),
        );
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entropy;

    fn contract() -> DataContract {
        let documents = json!({
            "note": {
                "type": "object",
                "properties": { "title": { "type": "string" } },
                "additionalProperties": false
            }
        });
        DataContract::new(
            0,
            Identifier::new([3u8; 32]),
            documents.as_object().cloned().unwrap(),
            entropy::generate(),
        )
        .unwrap()
    }

    #[test]
    fn test_requires_entropy() {
        let mut contract = contract();
        contract.set_entropy(None);

        assert_eq!(
            DataContractCreateTransition::new(0, contract),
            Err(DppError::MissingEntropy)
        );
    }

    #[test]
    fn test_object_roundtrip_restores_entropy() {
        let contract = contract();
        let transition = DataContractCreateTransition::new(0, contract.clone()).unwrap();
        let raw = transition.to_object(false);

        assert_eq!(raw["type"], 0);
        assert_eq!(raw["entropy"], contract.entropy().unwrap());

        let restored = DataContractCreateTransition::from_object(&raw).unwrap();
        assert_eq!(restored, transition);
        assert_eq!(restored.data_contract().entropy(), contract.entropy());
        assert_eq!(restored.owner_id(), contract.owner_id());
    }
}
