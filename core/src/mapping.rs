use crate::{read_text, FlexwerError, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Normalized-form to dialectal-form correspondence, plus its inverse index.
///
/// Built once from a JSON object (`{"haben": ["hän", "häi"], ...}`) and never mutated afterwards.
/// A dialectal form may map back to several normalized forms; all of them are kept.
#[derive(Debug, Clone, Default)]
pub struct NormMapping {
    norm_to_dialect: HashMap<String, HashSet<String>>,
    dialect_to_norm: HashMap<String, HashSet<String>>,
}

impl NormMapping {
    /// Read and validate a mapping file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = read_text(path)?;
        let mapping = Self::from_json_str(&text).map_err(|e| match e {
            FlexwerError::MalformedMapping(reason) => {
                FlexwerError::MalformedMapping(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })?;
        log::info!(
            "loaded mapping {}: {} normalized forms, {} dialectal forms",
            path.display(),
            mapping.norm_to_dialect.len(),
            mapping.dialect_to_norm.len()
        );
        let ambiguous = mapping.ambiguous_dialect_forms();
        if ambiguous > 0 {
            log::debug!(
                "{} dialectal forms have multiple corresponding normalized forms",
                ambiguous
            );
        }
        Ok(mapping)
    }

    /// Parse a mapping from JSON text. The top level must be an object of string to array of string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let parsed: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| FlexwerError::MalformedMapping(format!("invalid JSON: {e}")))?;

        let obj = parsed.as_object().ok_or_else(|| {
            FlexwerError::MalformedMapping("top level must be an object".to_string())
        })?;

        let mut entries = Vec::with_capacity(obj.len());
        for (norm, forms) in obj {
            let forms = forms.as_array().ok_or_else(|| {
                FlexwerError::MalformedMapping(format!("value for '{norm}' must be an array"))
            })?;
            let mut dialect = Vec::with_capacity(forms.len());
            for (index, form) in forms.iter().enumerate() {
                let form = form.as_str().ok_or_else(|| {
                    FlexwerError::MalformedMapping(format!(
                        "entry {index} for '{norm}' must be a string"
                    ))
                })?;
                dialect.push(form.to_string());
            }
            entries.push((norm.clone(), dialect));
        }

        Ok(Self::from_entries(entries))
    }

    /// Build from already-typed entries, deriving the inverse index.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: Into<String>,
    {
        let mut norm_to_dialect: HashMap<String, HashSet<String>> = HashMap::new();
        let mut dialect_to_norm: HashMap<String, HashSet<String>> = HashMap::new();
        for (norm, forms) in entries {
            let norm = norm.into();
            let slot = norm_to_dialect.entry(norm.clone()).or_default();
            for form in forms {
                let form = form.into();
                dialect_to_norm
                    .entry(form.clone())
                    .or_default()
                    .insert(norm.clone());
                slot.insert(form);
            }
        }
        Self {
            norm_to_dialect,
            dialect_to_norm,
        }
    }

    pub fn dialect_forms(&self, norm: &str) -> Option<&HashSet<String>> {
        self.norm_to_dialect.get(norm)
    }

    pub fn norm_forms(&self, dialect: &str) -> Option<&HashSet<String>> {
        self.dialect_to_norm.get(dialect)
    }

    pub fn len(&self) -> usize {
        self.norm_to_dialect.len()
    }

    pub fn is_empty(&self) -> bool {
        self.norm_to_dialect.is_empty()
    }

    /// Number of dialectal forms that map back to more than one normalized form.
    pub fn ambiguous_dialect_forms(&self) -> usize {
        self.dialect_to_norm.values().filter(|v| v.len() > 1).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_index() {
        let m = NormMapping::from_json_str(
            r#"{"haben": ["hän", "häi", "hän"], "hatten": ["händ", "hän"]}"#,
        )
        .unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.dialect_forms("haben").unwrap().len(), 2);
        let back = m.norm_forms("hän").unwrap();
        assert!(back.contains("haben"));
        assert!(back.contains("hatten"));
        assert_eq!(m.norm_forms("händ").unwrap().len(), 1);
        assert!(m.norm_forms("haben").is_none());
        assert_eq!(m.ambiguous_dialect_forms(), 1);
    }

    #[test]
    fn test_empty_array_kept() {
        let m = NormMapping::from_json_str(r#"{"x": []}"#).unwrap();
        assert!(m.dialect_forms("x").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_object() {
        let err = NormMapping::from_json_str(r#"["a", "b"]"#).unwrap_err();
        assert!(matches!(err, FlexwerError::MalformedMapping(_)));
    }

    #[test]
    fn test_rejects_non_array_value() {
        let err = NormMapping::from_json_str(r#"{"haben": "hän"}"#).unwrap_err();
        match err {
            FlexwerError::MalformedMapping(msg) => assert!(msg.contains("haben")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_rejects_non_string_entry() {
        let err = NormMapping::from_json_str(r#"{"haben": ["hän", 3]}"#).unwrap_err();
        match err {
            FlexwerError::MalformedMapping(msg) => assert!(msg.contains("entry 1")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_rejects_invalid_json() {
        let err = NormMapping::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, FlexwerError::MalformedMapping(_)));
    }
}
