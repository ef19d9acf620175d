use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The parts of an event row the wizards feed into prompts.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct EventContext {
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub audience_profile: Option<String>,
    #[serde(default)]
    pub program_notes: Option<String>,
}

/// An entry in the activity library ("bento").
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Bento {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub purpose_category: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub hopa_profiles: Vec<String>,
    #[serde(default)]
    pub eng_level: Option<f32>,
    #[serde(default)]
    pub nfi_index: Option<f32>,
    #[serde(default)]
    pub effects: Option<Value>,
}

impl Bento {
    /// One-line summary used when listing candidates in a prompt.
    pub fn prompt_line(&self) -> String {
        let mut line = format!("- [{}] {}", self.id, self.name);
        let mut traits = Vec::new();
        if let Some(category) = &self.purpose_category {
            traits.push(category.clone());
        }
        if !self.hopa_profiles.is_empty() {
            traits.push(format!("HOPA: {}", self.hopa_profiles.join(", ")));
        }
        if let Some(eng) = self.eng_level {
            traits.push(format!("ENG: {eng}"));
        }
        if let Some(nfi) = self.nfi_index {
            traits.push(format!("NFI: {nfi}"));
        }
        if !traits.is_empty() {
            line.push_str(&format!(" ({})", traits.join(", ")));
        }
        if let Some(description) = &self.short_description {
            line.push_str(&format!(" – {description}"));
        }
        line
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Tip {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Option<Value>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bento_accepts_numeric_ids_and_null_profiles() {
        let bento: Bento = serde_json::from_value(json!({
            "id": 42,
            "name": "Walk and talk",
            "hopa_profiles": null
        }))
        .unwrap();
        assert_eq!(bento.id, "42");
        assert!(bento.hopa_profiles.is_empty());
    }

    #[test]
    fn prompt_line_lists_traits() {
        let bento = Bento {
            id: "b1".to_string(),
            name: "Tyst reflektion".to_string(),
            short_description: Some("Fem minuter eftertanke".to_string()),
            purpose_category: Some("reflektion".to_string()),
            hopa_profiles: vec!["Analytiker".to_string()],
            eng_level: Some(2.0),
            nfi_index: Some(5.0),
            effects: None,
        };
        assert_eq!(
            bento.prompt_line(),
            "- [b1] Tyst reflektion (reflektion, HOPA: Analytiker, ENG: 2, NFI: 5) – Fem minuter eftertanke"
        );
    }
}
