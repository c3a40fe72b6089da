use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Attrs, Fragment, Mark, Node, ReplaceError, Schema};
use crate::lists::{ListAttrs, ListKind};

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("Failed to parse document JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown node type '{0}'")]
    UnknownNodeType(String),
    #[error("unknown mark type '{0}'")]
    UnknownMarkType(String),
    #[error("text node without text")]
    MissingText,
    #[error("empty text nodes are not allowed")]
    EmptyText,
    #[error(transparent)]
    InvalidContent(#[from] ReplaceError),
}

/// Serialized form of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeJson {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<NodeJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<MarkJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkJson {
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
}

impl Node {
    pub fn to_json(&self) -> NodeJson {
        NodeJson {
            node_type: self.node_type().name().to_string(),
            attrs: self.attrs().clone(),
            content: self.content().iter().map(Node::to_json).collect(),
            text: self.text().map(str::to_string),
            marks: self
                .marks()
                .iter()
                .map(|mark| MarkJson {
                    mark_type: mark.mark_type().name().to_string(),
                    attrs: mark.attrs().clone(),
                })
                .collect(),
        }
    }

    pub fn to_json_string(&self) -> Result<String, JsonError> {
        Ok(serde_json::to_string_pretty(&self.to_json())?)
    }
}

impl Schema {
    /// Build a node from its JSON form, checking every node's content.
    pub fn node_from_json(&self, json: &NodeJson) -> Result<Node, JsonError> {
        let marks = json
            .marks
            .iter()
            .map(|mark| self.mark_from_json(mark))
            .collect::<Result<Vec<_>, _>>()?;
        let marks = marks.iter().fold(Vec::new(), |set, mark| mark.add_to_set(&set));

        let node_type = self
            .node_type(&json.node_type)
            .ok_or_else(|| JsonError::UnknownNodeType(json.node_type.clone()))?;

        if node_type.is_text() {
            let text = json.text.clone().ok_or(JsonError::MissingText)?;
            if text.is_empty() {
                return Err(JsonError::EmptyText);
            }
            return Ok(self.text(text, marks));
        }

        let children = json
            .content
            .iter()
            .map(|child| self.node_from_json(child))
            .collect::<Result<Vec<_>, _>>()?;
        let attrs = match ListKind::of_node_type(&node_type) {
            Some(kind) => ListAttrs::from_attrs(kind, &json.attrs).to_attrs(),
            None => json.attrs.clone(),
        };
        Ok(node_type.create_checked(Some(&attrs), Fragment::from_nodes(children), marks)?)
    }

    pub fn node_from_json_str(&self, source: &str) -> Result<Node, JsonError> {
        let json: NodeJson = serde_json::from_str(source)?;
        self.node_from_json(&json)
    }

    fn mark_from_json(&self, json: &MarkJson) -> Result<Mark, JsonError> {
        let mark_type = self
            .mark_type(&json.mark_type)
            .ok_or_else(|| JsonError::UnknownMarkType(json.mark_type.clone()))?;
        Ok(mark_type.create(Some(&json.attrs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{doc, li, ol, p, schema};

    #[test]
    fn test_json_roundtrip_keeps_the_tree() {
        let schema = schema();
        let original = doc(&[ol(&[li(&[p(&["one"])]), li(&[p(&["two"])])]), p(&["after"])]);

        let json = original.to_json_string().unwrap();
        let restored = schema.node_from_json_str(&json).unwrap();

        assert_eq!(restored, original);
    }

    #[test]
    fn test_list_attrs_are_corrected_on_load() {
        let schema = schema();
        let source = r#"{"type": "doc", "content": [{
            "type": "bullet_list",
            "attrs": {"order": -3, "style": "upper-roman"},
            "content": [{"type": "list_item", "content": [{"type": "paragraph"}]}]
        }]}"#;

        let loaded = schema.node_from_json_str(source).unwrap();

        let list = loaded.child(0);
        assert_eq!(list.attrs().get("order").and_then(|value| value.as_int()), Some(1));
        assert_eq!(list.attrs().get("style").and_then(|value| value.as_str()), Some("disc"));
        assert!(!loaded.to_json_string().unwrap().contains("upper-roman"));
    }

    #[test]
    fn test_invalid_content_is_rejected() {
        let schema = schema();
        let source = r#"{"type": "doc", "content": [{"type": "ordered_list"}]}"#;

        let result = schema.node_from_json_str(source);

        assert!(matches!(result, Err(JsonError::InvalidContent(_))));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let schema = schema();
        let source = r#"{"type": "doc", "content": [{"type": "table"}]}"#;

        let result = schema.node_from_json_str(source);

        assert!(matches!(result, Err(JsonError::UnknownNodeType(name)) if name == "table"));
    }

    #[test]
    fn test_missing_attrs_take_defaults() {
        let schema = schema();
        let source = r#"{"type": "ordered_list", "content": [
            {"type": "list_item", "content": [{"type": "paragraph"}]}
        ]}"#;

        let list = schema.node_from_json_str(source).unwrap();

        assert_eq!(list.attr("order").and_then(|v| v.as_int()), Some(1));
        assert_eq!(list.attr("style").and_then(|v| v.as_str()), Some("decimal"));
    }
}
