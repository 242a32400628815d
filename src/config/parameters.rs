use crate::domain::model::Literal;
use crate::utils::error::{DeployError, Result};
use crate::utils::validation::validate_address;
use std::collections::BTreeMap;
use std::path::Path;

/// 模組參數，格式為 `{ "Module": { "name": value } }`
///
/// 地址需寫成 `{ "address": "0x…" }`，一般字串一律視為 string。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    values: BTreeMap<String, BTreeMap<String, Literal>>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: BTreeMap<String, BTreeMap<String, serde_json::Value>> =
            serde_json::from_str(content)?;

        let mut parameters = Self::new();
        for (module, entries) in raw {
            for (name, value) in entries {
                let literal = literal_from_json(&format!("{}.{}", module, name), value)?;
                parameters.set(module.clone(), name, literal);
            }
        }
        Ok(parameters)
    }

    pub fn set(&mut self, module: impl Into<String>, name: impl Into<String>, value: Literal) {
        self.values
            .entry(module.into())
            .or_default()
            .insert(name.into(), value);
    }

    pub fn get(&self, module: &str, name: &str) -> Option<&Literal> {
        self.values.get(module).and_then(|m| m.get(name))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn literal_from_json(field: &str, value: serde_json::Value) -> Result<Literal> {
    match value {
        serde_json::Value::Bool(b) => Ok(Literal::Bool(b)),
        serde_json::Value::String(s) => Ok(Literal::String(s)),
        serde_json::Value::Object(map) if map.len() == 1 && map.contains_key("address") => {
            match map.get("address") {
                Some(serde_json::Value::String(address)) => {
                    validate_address(field, address)?;
                    Ok(Literal::Address(address.clone()))
                }
                other => Err(DeployError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: other.map(|v| v.to_string()).unwrap_or_default(),
                    reason: "Address must be a string".to_string(),
                }),
            }
        }
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(|v| Literal::Number(v as i128))
            .or_else(|| n.as_u64().map(|v| Literal::Number(v as i128)))
            .ok_or_else(|| DeployError::InvalidConfigValueError {
                field: field.to_string(),
                value: n.to_string(),
                reason: "Only integer parameters are supported".to_string(),
            }),
        other => Err(DeployError::InvalidConfigValueError {
            field: field.to_string(),
            value: other.to_string(),
            reason: "Parameters must be numbers, strings, booleans or addresses".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameters() {
        let parameters = Parameters::from_json_str(
            r#"{
                "NFTmarketPlaceModule": {
                    "listingFee": 250,
                    "feeRecipient": { "address": "0x64BA35F47326A8F356888440eB6159863b5B66d6" },
                    "salt": "0x64BA35F47326A8F356888440eB6159863b5B66d6",
                    "paused": false,
                    "label": "market"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(
            parameters.get("NFTmarketPlaceModule", "listingFee"),
            Some(&Literal::Number(250))
        );
        assert_eq!(
            parameters.get("NFTmarketPlaceModule", "feeRecipient"),
            Some(&Literal::Address(
                "0x64BA35F47326A8F356888440eB6159863b5B66d6".to_string()
            ))
        );
        assert_eq!(
            parameters.get("NFTmarketPlaceModule", "salt"),
            Some(&Literal::String(
                "0x64BA35F47326A8F356888440eB6159863b5B66d6".to_string()
            ))
        );
        assert_eq!(
            parameters.get("NFTmarketPlaceModule", "paused"),
            Some(&Literal::Bool(false))
        );
        assert_eq!(
            parameters.get("NFTmarketPlaceModule", "label"),
            Some(&Literal::String("market".to_string()))
        );
        assert!(parameters.get("Other", "listingFee").is_none());
    }

    #[test]
    fn test_reject_unsupported_values() {
        assert!(Parameters::from_json_str(r#"{"M": {"x": [1, 2]}}"#).is_err());
        assert!(Parameters::from_json_str(r#"{"M": {"x": 1.5}}"#).is_err());
        assert!(Parameters::from_json_str(r#"{"M": {"x": {"address": "20"}}}"#).is_err());
        assert!(Parameters::from_json_str(r#"{"M": {"x": {"address": 20}}}"#).is_err());
        assert!(Parameters::from_json_str(r#"{"M": {"x": {"owner": "0x1"}}}"#).is_err());
    }
}
