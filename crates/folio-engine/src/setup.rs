//! # Editor Setup
//!
//! The document schema and an [`Editor`] wiring state, keymap, input rules,
//! menu and mention suggestions together.
//!
//! ## Schema
//!
//! Basic blocks (paragraph, blockquote, horizontal rule, heading, code block),
//! inline hard breaks, mentions and tags, both list types and the marks.
//! Paragraph is the first block type, so loose inline content and new list
//! items default to paragraphs.

use log::{debug, info};
use thiserror::Error;

use crate::commands::{EditorAction, WrapInList};
use crate::dom::{DomElement, DomOutput};
use crate::input_rules::InputRules;
use crate::keymap::{KeyPress, Keymap, KeymapError, Platform};
use crate::lists::{DEFAULT_ITEM_CONTENT, ListAttrs, ListKind, ListStyle, add_list_nodes};
use crate::marks::add_marks;
use crate::mentions::{
    MentionMember, MentionSuggester, add_mention_nodes, find_trigger, insert_mention,
    suggestions_html,
};
use crate::menu::{ItemView, Menu};
use crate::model::{
    AttrValue, Attrs, Node, NodeSpec, ReplaceError, Schema, SchemaBuilder, SchemaError,
};
use crate::state::{EditorState, TextSelection, Transaction};
use crate::transform::StepError;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),
    #[error("invalid key binding: {0}")]
    Keymap(#[from] KeymapError),
    #[error("invalid input rule: {0}")]
    InputRule(#[from] regex::Error),
    #[error("document does not fit the schema: {0}")]
    Document(#[from] ReplaceError),
    #[error("edit failed: {0}")]
    Edit(#[from] StepError),
    #[error("document was built from another schema")]
    ForeignSchema,
}

fn paragraph_to_dom(_node: &Node) -> DomOutput {
    DomOutput::new("p")
}

fn blockquote_to_dom(_node: &Node) -> DomOutput {
    DomOutput::new("blockquote")
}

fn horizontal_rule_to_dom(_node: &Node) -> DomOutput {
    DomOutput::new("hr").empty()
}

fn heading_to_dom(node: &Node) -> DomOutput {
    let level = node.attr("level").and_then(AttrValue::as_int).unwrap_or(1).clamp(1, 6);
    DomOutput::new(format!("h{level}"))
}

fn parse_heading(element: &DomElement) -> Option<Attrs> {
    let level: i64 = element.tag.strip_prefix(['h', 'H'])?.parse().ok()?;
    (1..=6).contains(&level).then(|| crate::attrs! { "level" => level })
}

fn code_block_to_dom(_node: &Node) -> DomOutput {
    DomOutput::new("pre")
}

fn hard_break_to_dom(_node: &Node) -> DomOutput {
    DomOutput::new("br").empty()
}

fn hard_break_text(_node: &Node) -> String {
    "\n".to_string()
}

/// Node types every folio document has, before lists and mentions.
pub fn add_basic_nodes(builder: SchemaBuilder) -> SchemaBuilder {
    let heading = ["h1", "h2", "h3", "h4", "h5", "h6"]
        .into_iter()
        .fold(NodeSpec::new(), |spec, tag| spec.parse(tag, Some(parse_heading)));
    builder
        .node("doc", NodeSpec::new().content("block+"))
        .node(
            "paragraph",
            NodeSpec::new()
                .content("inline*")
                .group("block")
                .to_dom(paragraph_to_dom)
                .parse("p", None),
        )
        .node(
            "blockquote",
            NodeSpec::new()
                .content("block+")
                .group("block")
                .to_dom(blockquote_to_dom)
                .parse("blockquote", None),
        )
        .node(
            "horizontal_rule",
            NodeSpec::new()
                .group("block")
                .to_dom(horizontal_rule_to_dom)
                .parse("hr", None),
        )
        .node(
            "heading",
            heading
                .content("inline*")
                .group("block")
                .attr("level", 1i64)
                .to_dom(heading_to_dom),
        )
        .node(
            "code_block",
            NodeSpec::new()
                .content("text*")
                .group("block")
                .code()
                .to_dom(code_block_to_dom)
                .parse("pre", None),
        )
        .node("text", NodeSpec::new().group("inline"))
        .node(
            "hard_break",
            NodeSpec::new()
                .group("inline")
                .inline()
                .to_dom(hard_break_to_dom)
                .parse("br", None)
                .leaf_text(hard_break_text),
        )
}

/// The full schema with list items holding `item_content`.
pub fn build_schema(item_content: &str) -> Result<Schema, SchemaError> {
    let builder = add_mention_nodes(add_basic_nodes(SchemaBuilder::new()));
    add_marks(add_list_nodes(builder, item_content, Some("block"))).build()
}

pub fn folio_schema() -> Result<Schema, SchemaError> {
    build_schema(DEFAULT_ITEM_CONTENT)
}

/// How an [`Editor`] is configured.
#[derive(Debug, Clone)]
pub struct EditorOptions {
    pub platform: Platform,
    pub list_item_content: String,
    pub default_ordered_style: ListStyle,
    pub default_bullet_style: ListStyle,
    pub mentions: Vec<MentionMember>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            platform: Platform::current(),
            list_item_content: DEFAULT_ITEM_CONTENT.to_string(),
            default_ordered_style: ListKind::Ordered.default_style(),
            default_bullet_style: ListKind::Bullet.default_style(),
            mentions: Vec::new(),
        }
    }
}

impl EditorOptions {
    pub fn default_style(&self, kind: ListKind) -> ListStyle {
        match kind {
            ListKind::Ordered => self.default_ordered_style,
            ListKind::Bullet => self.default_bullet_style,
        }
    }
}

/// An editor instance: the current state and everything that turns user
/// input into transactions.
#[derive(Debug, Clone)]
pub struct Editor {
    options: EditorOptions,
    state: EditorState,
    keymap: Keymap,
    input_rules: InputRules,
    menu: Menu,
    suggester: MentionSuggester,
}

impl Editor {
    /// An editor over a document holding one empty paragraph.
    pub fn new(options: EditorOptions) -> Result<Self, SetupError> {
        let schema = build_schema(&options.list_item_content)?;
        let doc = schema.node("doc", None, vec![schema.node("paragraph", None, Vec::new())?])?;

        let mut keymap = Keymap::with_defaults(options.platform, &schema)?;
        for (key, kind) in [
            ("Shift-Ctrl-8", ListKind::Bullet),
            ("Shift-Ctrl-9", ListKind::Ordered),
        ] {
            if let Some(command) = wrap_command(&schema, &options, kind) {
                keymap.bind(key, EditorAction::WrapInList(command))?;
            }
        }
        let input_rules = InputRules::for_schema(&schema, &options)?;
        let menu = Menu::for_schema(&schema);
        let suggester = MentionSuggester::new(options.mentions.clone());
        info!(
            "Editor ready: {} mention member(s), platform {:?}",
            suggester.members().len(),
            options.platform
        );

        Ok(Self {
            state: EditorState::new(schema, doc, None),
            options,
            keymap,
            input_rules,
            menu,
            suggester,
        })
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn schema(&self) -> &Schema {
        self.state.schema()
    }

    pub fn doc(&self) -> &Node {
        self.state.doc()
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Replace the document, dropping selection and history. `doc` must be
    /// built from this editor's schema.
    pub fn set_document(&mut self, doc: Node) -> Result<(), SetupError> {
        if doc.node_type().schema() != *self.schema() {
            return Err(SetupError::ForeignSchema);
        }
        doc.check()?;
        self.state = EditorState::new(self.schema().clone(), doc, None);
        Ok(())
    }

    pub fn dispatch(&mut self, tr: Transaction) {
        self.state = self.state.apply(&tr);
    }

    pub fn set_selection(&mut self, selection: TextSelection) {
        self.state = self.state.clone().with_selection(selection);
    }

    /// Run `action` against the current state and apply it. Returns whether it applied.
    pub fn run(&mut self, action: &EditorAction) -> bool {
        match action.run(&self.state) {
            Some(next) => {
                self.state = next;
                true
            }
            None => false,
        }
    }

    /// Wrap the selection in a list of `kind` using the configured default style.
    pub fn wrap_in_list(&mut self, kind: ListKind) -> bool {
        match wrap_command(self.schema(), &self.options, kind) {
            Some(command) => self.run(&EditorAction::WrapInList(command)),
            None => false,
        }
    }

    pub fn handle_key(&mut self, key: &KeyPress) -> bool {
        let mut next = None;
        let state = &self.state;
        let handled = self
            .keymap
            .handle(state, key, Some(&mut |tr: Transaction| next = Some(state.apply(&tr))));
        if let Some(next) = next {
            self.state = next;
        }
        handled
    }

    /// Type `text` over the selection, letting input rules rewrite it.
    pub fn type_text(&mut self, text: &str) -> Result<(), SetupError> {
        let selection = self.state.selection();
        let tr = match self
            .input_rules
            .handle_text_input(&self.state, selection.from(), selection.to(), text)
        {
            Some(tr) => tr,
            None => {
                let mut tr = Transaction::new(&self.state);
                tr.insert_text(text, selection.from(), selection.to())?;
                tr
            }
        };
        self.dispatch(tr);
        Ok(())
    }

    /// Suggestion popup HTML for a trigger before the cursor, if any.
    pub fn suggestions(&self) -> Option<String> {
        let trigger = find_trigger(&self.state)?;
        let members = self.suggester.suggest(trigger.kind, &trigger.query);
        (!members.is_empty()).then(|| suggestions_html(&members))
    }

    /// Replace the trigger before the cursor with the `index`th suggestion.
    pub fn select_suggestion(&mut self, index: usize) -> bool {
        let Some(trigger) = find_trigger(&self.state) else {
            return false;
        };
        let members = self.suggester.suggest(trigger.kind, &trigger.query);
        let Some(member) = members.get(index) else {
            return false;
        };
        let Some(tr) = insert_mention(&self.state, &trigger, member) else {
            return false;
        };
        self.dispatch(tr);
        true
    }

    pub fn menu_view(&self) -> Vec<ItemView> {
        self.menu.view(&self.state)
    }
}

fn wrap_command(schema: &Schema, options: &EditorOptions, kind: ListKind) -> Option<WrapInList> {
    let list_type = schema.node_type(kind.node_name())?;
    let attrs = ListAttrs::new(kind, 1, options.default_style(kind));
    debug!("{} wraps with style {}", kind.node_name(), attrs.style);
    Some(WrapInList::new(list_type, Some(attrs.to_attrs())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::document_to_html;
    use crate::mentions::MemberId;
    use pretty_assertions::assert_eq;

    fn options() -> EditorOptions {
        EditorOptions {
            platform: Platform::Other,
            mentions: vec![MentionMember::new(
                "Jorge Lu",
                MemberId::Number(107),
                "jlu@example.com",
            )],
            ..EditorOptions::default()
        }
    }

    #[test]
    fn test_schema_builds_with_paragraph_as_default_block() {
        let schema = folio_schema().unwrap();
        let doc_type = schema.node_type("doc").unwrap();
        let default = doc_type.content_match().default_type().unwrap();
        assert_eq!(default.name(), "paragraph");
    }

    #[test]
    fn test_custom_item_content() {
        let schema = build_schema("paragraph").unwrap();
        let item = schema.node_type("list_item").unwrap();
        let paragraph = schema.node("paragraph", None, Vec::new()).unwrap();
        let two_paragraphs = crate::model::Fragment::from_nodes(vec![paragraph.clone(), paragraph]);
        assert!(!item.valid_content(&two_paragraphs));
    }

    #[test]
    fn test_typing_list_shortcut_then_text() {
        let mut editor = Editor::new(options()).unwrap();
        editor.type_text("1").unwrap();
        editor.type_text(".").unwrap();
        editor.type_text(" ").unwrap();
        editor.type_text("first").unwrap();

        assert_eq!(document_to_html(editor.doc()), "<ol><li><p>first</p></li></ol>");
    }

    #[test]
    fn test_configured_default_style_is_used() {
        let mut editor = Editor::new(EditorOptions {
            default_bullet_style: ListStyle::Square,
            ..options()
        })
        .unwrap();
        editor.type_text("a").unwrap();

        assert!(editor.handle_key(&KeyPress::new("8").shift().ctrl()));
        assert_eq!(
            document_to_html(editor.doc()),
            r#"<ul type="square"><li><p>a</p></li></ul>"#
        );
    }

    #[test]
    fn test_typed_bullet_uses_configured_style() {
        let mut editor = Editor::new(EditorOptions {
            default_bullet_style: ListStyle::Square,
            ..options()
        })
        .unwrap();
        editor.type_text("-").unwrap();
        editor.type_text(" ").unwrap();
        editor.type_text("b").unwrap();

        assert_eq!(
            document_to_html(editor.doc()),
            r#"<ul type="square"><li><p>b</p></li></ul>"#
        );
    }

    #[test]
    fn test_mention_suggestions_and_selection() {
        let mut editor = Editor::new(options()).unwrap();
        editor.type_text("@jo").unwrap();

        let expected =
            r#"<div class="suggestion-item-list"><div class="suggestion-item">Jorge Lu</div></div>"#;
        assert_eq!(editor.suggestions().as_deref(), Some(expected));
        assert!(editor.select_suggestion(0));
        assert_eq!(editor.doc().text_content(), "@Jorge Lu ");
    }

    #[test]
    fn test_set_document_rejects_foreign_schema() {
        let mut editor = Editor::new(options()).unwrap();
        let other = folio_schema().unwrap();
        let paragraph = other.node("paragraph", None, Vec::new()).unwrap();
        let doc = other.node("doc", None, vec![paragraph]).unwrap();
        assert!(matches!(editor.set_document(doc), Err(SetupError::ForeignSchema)));

        let own = editor.schema().clone();
        let paragraph = own
            .node("paragraph", None, vec![own.text("x", Vec::new())])
            .unwrap();
        let doc = own.node("doc", None, vec![paragraph]).unwrap();
        editor.set_document(doc).unwrap();
        assert_eq!(editor.state().selection(), TextSelection::cursor(1));
    }

    #[test]
    fn test_undo_restores_after_wrap() {
        let mut editor = Editor::new(options()).unwrap();
        editor.type_text("a").unwrap();
        let before = editor.doc().clone();

        assert!(editor.wrap_in_list(ListKind::Ordered));
        assert!(editor.handle_key(&KeyPress::new("z").ctrl()));
        assert_eq!(editor.doc(), &before);
    }
}
