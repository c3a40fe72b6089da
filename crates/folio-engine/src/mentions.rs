//! # Mentions and Tags
//!
//! `@name` mentions and `#tag` tags are inline atoms. Typing a trigger
//! character opens a suggestion list; picking an entry replaces the typed
//! trigger with the node.
//!
//! ## Key Invariants
//!
//! - Mention and tag nodes are leaves of size 1; their text (`@name`, `#tag`)
//!   lives only in the rendered output
//! - Only mentions have suggestions; tags are typed freely

use std::fmt;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dom::{DomElement, DomNode, DomOutput, serialize_html};
use crate::model::{AttrValue, Attrs, Fragment, Node, NodeSpec, Schema, SchemaBuilder, SchemaError};
use crate::state::{EditorState, TextSelection, Transaction};

pub const MENTION: &str = "mention";
pub const TAG: &str = "tag";

const MENTION_CLASS: &str = "prosemirror-mention-node";
const TAG_CLASS: &str = "prosemirror-tag-node";

/// Identifier of a mentionable member. Directories hand out both numeric and
/// string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberId {
    Number(i64),
    Text(String),
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberId::Number(id) => write!(f, "{id}"),
            MemberId::Text(id) => f.write_str(id),
        }
    }
}

/// Someone who can be mentioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionMember {
    /// Shown after the `@` in the suggestion list and in the document.
    pub name: String,
    pub id: MemberId,
    pub email: String,
}

impl MentionMember {
    pub fn new(name: impl Into<String>, id: MemberId, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id,
            email: email.into(),
        }
    }

    pub fn to_attrs(&self) -> Attrs {
        crate::attrs! {
            "id" => self.id.to_string(),
            "name" => self.name.as_str(),
            "email" => self.email.as_str(),
        }
    }
}

/// What a trigger character asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Mention,
    Tag,
}

impl SuggestionKind {
    pub fn trigger(self) -> char {
        match self {
            SuggestionKind::Mention => '@',
            SuggestionKind::Tag => '#',
        }
    }

    fn from_trigger(c: char) -> Option<Self> {
        match c {
            '@' => Some(SuggestionKind::Mention),
            '#' => Some(SuggestionKind::Tag),
            _ => None,
        }
    }
}

/// A trigger being typed: the kind, the query after the trigger character,
/// and the document range `from..to` covering both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub kind: SuggestionKind,
    pub query: String,
    pub from: usize,
    pub to: usize,
}

/// The trigger directly before an empty selection inside a textblock.
pub fn find_trigger(state: &EditorState) -> Option<Trigger> {
    let selection = state.selection();
    if !selection.is_empty() {
        return None;
    }
    let pos = state.doc().resolve(selection.head).ok()?;
    let parent = pos.parent();
    if !parent.is_textblock() {
        return None;
    }
    let before = parent.text_between(0, pos.parent_offset(), None, Some("\u{fffc}"));
    static TRIGGER_REGEX: OnceLock<Regex> = OnceLock::new();
    let trigger_regex = TRIGGER_REGEX.get_or_init(|| {
        Regex::new(r"(?:^|\s)([@#])([^\s@#]*)$").expect("Invalid trigger regex")
    });
    let captures = trigger_regex.captures(&before)?;
    let trigger = captures.get(1)?;
    let query = captures.get(2)?.as_str();
    let kind = SuggestionKind::from_trigger(trigger.as_str().chars().next()?)?;

    let typed = before[trigger.start()..].chars().count();
    Some(Trigger {
        kind,
        query: query.to_string(),
        from: selection.head - typed,
        to: selection.head,
    })
}

/// Answers suggestion queries from a fixed member list.
#[derive(Debug, Clone, Default)]
pub struct MentionSuggester {
    members: Vec<MentionMember>,
}

impl MentionSuggester {
    pub fn new(members: Vec<MentionMember>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[MentionMember] {
        &self.members
    }

    /// Members whose name contains `query`, ignoring case, in list order.
    /// Tags have no suggestions.
    pub fn suggest(&self, kind: SuggestionKind, query: &str) -> Vec<&MentionMember> {
        if kind != SuggestionKind::Mention {
            return Vec::new();
        }
        let query = query.to_lowercase();
        self.members
            .iter()
            .filter(|member| member.name.to_lowercase().contains(&query))
            .collect()
    }
}

/// HTML for the suggestion popup.
pub fn suggestions_html(members: &[&MentionMember]) -> String {
    let list = members.iter().fold(
        DomElement::new("div").with_attr("class", "suggestion-item-list"),
        |list, member| {
            list.with_child(DomNode::Element(
                DomElement::new("div")
                    .with_attr("class", "suggestion-item")
                    .with_text(member.name.clone()),
            ))
        },
    );
    serialize_html(&[DomNode::Element(list)])
}

/// Replace `trigger` with a mention of `member` followed by a space.
pub fn insert_mention(
    state: &EditorState,
    trigger: &Trigger,
    member: &MentionMember,
) -> Option<Transaction> {
    if trigger.kind != SuggestionKind::Mention {
        return None;
    }
    let node = state.schema().node(MENTION, Some(&member.to_attrs()), Vec::new()).ok()?;
    debug!("Inserting mention of {} ({})", member.name, member.id);
    replace_trigger(state, trigger, node)
}

/// Replace `trigger` with a tag node followed by a space.
pub fn insert_tag(state: &EditorState, trigger: &Trigger, tag: &str) -> Option<Transaction> {
    if trigger.kind != SuggestionKind::Tag || tag.is_empty() {
        return None;
    }
    let node = state
        .schema()
        .node(TAG, Some(&crate::attrs! { "tag" => tag }), Vec::new())
        .ok()?;
    replace_trigger(state, trigger, node)
}

fn replace_trigger(state: &EditorState, trigger: &Trigger, node: Node) -> Option<Transaction> {
    let mut tr = Transaction::new(state);
    let space = state.schema().text(" ", Vec::new());
    tr.replace_with(trigger.from, trigger.to, Fragment::from_nodes(vec![node, space]))
        .ok()?;
    tr.set_selection(TextSelection::cursor(trigger.from + 2));
    Some(tr)
}

fn str_attr<'a>(node: &'a Node, name: &str) -> &'a str {
    node.attr(name).and_then(AttrValue::as_str).unwrap_or_default()
}

fn mention_to_dom(node: &Node) -> DomOutput {
    let name = str_attr(node, "name");
    DomOutput::new("span")
        .attr("class", MENTION_CLASS)
        .attr("data-mention-id", str_attr(node, "id"))
        .attr("data-mention-name", name)
        .attr("data-mention-email", str_attr(node, "email"))
        .text(format!("@{name}"))
}

fn parse_mention(element: &DomElement) -> Option<Attrs> {
    if element.attr("class") != Some(MENTION_CLASS) {
        return None;
    }
    Some(crate::attrs! {
        "id" => element.attr("data-mention-id").unwrap_or_default(),
        "name" => element.attr("data-mention-name").unwrap_or_default(),
        "email" => element.attr("data-mention-email").unwrap_or_default(),
    })
}

fn tag_to_dom(node: &Node) -> DomOutput {
    let tag = str_attr(node, "tag");
    DomOutput::new("span")
        .attr("class", TAG_CLASS)
        .attr("data-tag", tag)
        .text(format!("#{tag}"))
}

fn parse_tag(element: &DomElement) -> Option<Attrs> {
    if element.attr("class") != Some(TAG_CLASS) {
        return None;
    }
    Some(crate::attrs! { "tag" => element.attr("data-tag")? })
}

fn mention_text(node: &Node) -> String {
    format!("@{}", str_attr(node, "name"))
}

fn tag_text(node: &Node) -> String {
    format!("#{}", str_attr(node, "tag"))
}

/// Add the inline `mention` and `tag` atoms to a schema.
pub fn add_mention_nodes(builder: SchemaBuilder) -> SchemaBuilder {
    builder
        .node(
            MENTION,
            NodeSpec::new()
                .group("inline")
                .inline()
                .atom()
                .required_attr("id")
                .required_attr("name")
                .required_attr("email")
                .to_dom(mention_to_dom)
                .parse("span", Some(parse_mention))
                .leaf_text(mention_text),
        )
        .node(
            TAG,
            NodeSpec::new()
                .group("inline")
                .inline()
                .atom()
                .required_attr("tag")
                .to_dom(tag_to_dom)
                .parse("span", Some(parse_tag))
                .leaf_text(tag_text),
        )
}

pub fn mention(schema: &Schema, member: &MentionMember) -> Result<Node, SchemaError> {
    schema.node(MENTION, Some(&member.to_attrs()), Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{document_to_html, parse_document};
    use crate::test_support::{doc, p, schema};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn members() -> Vec<MentionMember> {
        vec![
            MentionMember::new("Jorge Lu", MemberId::Number(107), "jlu@example.com"),
            MentionMember::new("Juan Pérez", MemberId::Number(108), "jperez@example.com"),
        ]
    }

    fn names(found: &[&MentionMember]) -> Vec<String> {
        found.iter().map(|member| member.name.clone()).collect()
    }

    #[rstest]
    #[case("", &["Jorge Lu", "Juan Pérez"])]
    #[case("ju", &["Juan Pérez"])]
    #[case("PÉR", &["Juan Pérez"])]
    #[case("zz", &[])]
    fn test_suggest_filters_by_name(#[case] query: &str, #[case] expected: &[&str]) {
        let suggester = MentionSuggester::new(members());
        assert_eq!(names(&suggester.suggest(SuggestionKind::Mention, query)), expected);
    }

    #[test]
    fn test_tags_have_no_suggestions() {
        let suggester = MentionSuggester::new(members());
        assert!(suggester.suggest(SuggestionKind::Tag, "").is_empty());
    }

    #[test]
    fn test_suggestions_html_escapes_names() {
        let member =
            MentionMember::new("<Ann & Bob>", MemberId::Text("x".into()), "ab@example.com");
        assert_eq!(
            suggestions_html(&[&member]),
            r#"<div class="suggestion-item-list"><div class="suggestion-item">&lt;Ann &amp; Bob&gt;</div></div>"#
        );
    }

    #[rstest]
    #[case("hi @jo", Some((SuggestionKind::Mention, "jo", 4)))]
    #[case("@", Some((SuggestionKind::Mention, "", 1)))]
    #[case("see #rust", Some((SuggestionKind::Tag, "rust", 5)))]
    #[case("mail a@b", None)]
    #[case("plain", None)]
    fn test_find_trigger(
        #[case] text: &str,
        #[case] expected: Option<(SuggestionKind, &str, usize)>,
    ) {
        let document = doc(&[p(&[text])]);
        let end = 1 + text.chars().count();
        let state = EditorState::new(schema(), document, Some(TextSelection::cursor(end)));

        let found = find_trigger(&state).map(|t| (t.kind, t.query.clone(), t.from, t.to));

        assert_eq!(
            found,
            expected.map(|(kind, query, from)| (kind, query.to_string(), from, end))
        );
    }

    #[test]
    fn test_insert_mention_replaces_trigger() {
        let schema = schema();
        let state = EditorState::new(
            schema.clone(),
            doc(&[p(&["hi @jo"])]),
            Some(TextSelection::cursor(7)),
        );
        let trigger = find_trigger(&state).unwrap();
        let member = &members()[0];

        let tr = insert_mention(&state, &trigger, member).unwrap();
        let next = state.apply(&tr);

        let paragraph = next.doc().child(0);
        assert_eq!(paragraph.child_count(), 3);
        assert_eq!(paragraph.child(1), &mention(&schema, member).unwrap());
        assert_eq!(paragraph.child(2).text(), Some(" "));
        assert_eq!(next.selection(), TextSelection::cursor(6));
        assert_eq!(
            document_to_html(next.doc()),
            r#"<p>hi <span class="prosemirror-mention-node" data-mention-id="107" data-mention-name="Jorge Lu" data-mention-email="jlu@example.com">@Jorge Lu</span> </p>"#
        );
    }

    #[test]
    fn test_tag_survives_html_round_trip() {
        let schema = schema();
        let state = EditorState::new(
            schema.clone(),
            doc(&[p(&["#ru"])]),
            Some(TextSelection::cursor(4)),
        );
        let trigger = find_trigger(&state).unwrap();
        let next = state.apply(&insert_tag(&state, &trigger, "rust").unwrap());

        let dom = crate::dom::fragment_to_dom(next.doc().content());
        let parsed = parse_document(&schema, &dom).unwrap();

        assert_eq!(&parsed, next.doc());
        assert_eq!(next.doc().text_content(), "#rust ");
    }
}
