//! # Input Rules
//!
//! Patterns matched against the text before the cursor as the user types.
//! A match rewrites what was typed: typographic replacements (quotes,
//! ellipsis, em dash) or turning `1. ` and `- ` at the start of a paragraph
//! into a list.
//!
//! Rules never fire inside code textblocks.

use log::debug;
use regex::{Captures, Regex};

use crate::lists::{ListAttrs, ListKind, ListStyle};
use crate::model::{Node, NodeType, Schema};
use crate::setup::EditorOptions;
use crate::state::{EditorState, Transaction};
use crate::transform::{Transform, can_join, find_wrapping};

/// How far back, in characters, rules look for a match.
const MAX_MATCH: usize = 500;

/// What a matching rule does with the matched text.
#[derive(Debug, Clone)]
pub enum RuleAction {
    /// Replace the match with the text. When the pattern has a capture group
    /// only the group is replaced.
    Replace(String),
    /// Turn the textblock into a list of this type and style, joining a
    /// directly preceding list that continues into it.
    WrapInList(NodeType, ListStyle),
}

#[derive(Debug, Clone)]
pub struct InputRule {
    pattern: Regex,
    action: RuleAction,
}

impl InputRule {
    /// `pattern` must end in `$`; it is matched against the text before the
    /// cursor including the text being typed.
    pub fn new(pattern: &str, action: RuleAction) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            action,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn apply(
        &self,
        state: &EditorState,
        captures: &Captures<'_>,
        start: usize,
        end: usize,
    ) -> Option<Transaction> {
        match &self.action {
            RuleAction::Replace(replacement) => {
                replace_text(state, captures, replacement, start, end)
            }
            RuleAction::WrapInList(list_type, style) => {
                wrap_in_list(state, captures, list_type, *style, start, end)
            }
        }
    }
}

fn replace_text(
    state: &EditorState,
    captures: &Captures<'_>,
    replacement: &str,
    mut start: usize,
    end: usize,
) -> Option<Transaction> {
    let whole = captures.get(0)?;
    let mut insert = replacement.to_string();
    if let Some(group) = captures.get(1) {
        // Keep the matched text around the group; it may lie partly in what is being typed.
        let matched = whole.as_str();
        let group_start = matched[..group.start() - whole.start()].chars().count();
        let group_len = group.as_str().chars().count();
        insert.extend(matched.chars().skip(group_start + group_len));
        start += group_start;
        if start > end {
            let cut_off = start - end;
            let kept: String = matched.chars().skip(group_start - cut_off).take(cut_off).collect();
            insert = kept + &insert;
            start = end;
        }
    }
    let mut tr = Transaction::new(state);
    tr.insert_text(&insert, start, end).ok()?;
    Some(tr)
}

fn wrap_in_list(
    state: &EditorState,
    captures: &Captures<'_>,
    list_type: &NodeType,
    style: ListStyle,
    start: usize,
    end: usize,
) -> Option<Transaction> {
    let kind = ListKind::of_node_type(list_type)?;
    let number = match kind {
        ListKind::Ordered => Some(captures.get(1)?.as_str().parse::<u32>().ok()?),
        ListKind::Bullet => None,
    };
    let attrs = ListAttrs::new(kind, number.unwrap_or(1), style).to_attrs();

    let mut tr = Transaction::new(state);
    tr.delete(start, end).ok()?;
    let resolved = tr.doc().resolve(start).ok()?;
    let range = resolved.block_range(&resolved)?;
    let wrappers = find_wrapping(&range, list_type, Some(&attrs), &range)?;
    tr.wrap(range.start(), range.end(), &wrappers).ok()?;

    if let Some(before) = join_candidate(&tr, start, list_type)
        && continues_into(&before, kind, number)
    {
        debug!("Joining new {} with the list before it", list_type.name());
        tr.join(start - 1, 1).ok()?;
    }
    Some(tr)
}

/// The list directly before the new one, when the two can be joined.
fn join_candidate(tr: &Transform, start: usize, list_type: &NodeType) -> Option<Node> {
    let pos = start.checked_sub(1)?;
    let before = tr.doc().resolve(pos).ok()?.node_before()?;
    (before.node_type() == list_type && can_join(tr.doc(), pos)).then_some(before)
}

/// Bullet lists always continue. An ordered list continues only when the
/// typed number is the one its next item would show.
fn continues_into(before: &Node, kind: ListKind, number: Option<u32>) -> bool {
    match (kind, number) {
        (ListKind::Ordered, Some(number)) => ListAttrs::of_node(before)
            .is_some_and(|attrs| attrs.item_number(before.child_count()) == number),
        _ => true,
    }
}

/// An ordered set of rules; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct InputRules {
    rules: Vec<InputRule>,
}

impl InputRules {
    pub fn new(rules: Vec<InputRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[InputRule] {
        &self.rules
    }

    /// Typographic rules plus list rules for whichever list types `schema`
    /// has. New lists take the default styles from `options`.
    pub fn for_schema(schema: &Schema, options: &EditorOptions) -> Result<Self, regex::Error> {
        let mut rules = typography_rules()?;
        if let Some(ordered) = schema.node_type(ListKind::Ordered.node_name()) {
            let action = RuleAction::WrapInList(ordered, options.default_style(ListKind::Ordered));
            rules.push(InputRule::new(r"^(\d+)\.\s$", action)?);
        }
        if let Some(bullet) = schema.node_type(ListKind::Bullet.node_name()) {
            let action = RuleAction::WrapInList(bullet, options.default_style(ListKind::Bullet));
            rules.push(InputRule::new(r"^\s*([-+*])\s$", action)?);
        }
        Ok(Self::new(rules))
    }

    /// Run the rules for `text` about to replace `from..to`. Returns the
    /// transaction of the first rule that fires, which then stands in for
    /// the plain insertion.
    pub fn handle_text_input(
        &self,
        state: &EditorState,
        from: usize,
        to: usize,
        text: &str,
    ) -> Option<Transaction> {
        let resolved = state.doc().resolve(from).ok()?;
        let parent = resolved.parent();
        if !parent.is_textblock() || parent.node_type().spec().code {
            return None;
        }
        let offset = resolved.parent_offset();
        let before =
            parent.text_between(offset.saturating_sub(MAX_MATCH), offset, None, Some("\u{fffc}"));
        let text_before = before + text;
        let typed = text.chars().count();

        self.rules.iter().find_map(|rule| {
            let captures = rule.pattern.captures(&text_before)?;
            let matched = captures.get(0)?.as_str().chars().count();
            let start = from.checked_sub(matched.checked_sub(typed)?)?;
            let tr = rule.apply(state, &captures, start, to)?;
            debug!("Input rule {} fired", rule.pattern());
            Some(tr)
        })
    }
}

/// Smart quotes, `...` to an ellipsis and `--` to an em dash.
pub fn typography_rules() -> Result<Vec<InputRule>, regex::Error> {
    let opens = r#"(?:^|[\s{\[(<'"\x{2018}\x{201C}])"#;
    Ok(vec![
        InputRule::new(&format!(r#"{opens}(")$"#), RuleAction::Replace("\u{201C}".into()))?,
        InputRule::new(r#""$"#, RuleAction::Replace("\u{201D}".into()))?,
        InputRule::new(&format!(r"{opens}(')$"), RuleAction::Replace("\u{2018}".into()))?,
        InputRule::new(r"'$", RuleAction::Replace("\u{2019}".into()))?,
        InputRule::new(r"\.\.\.$", RuleAction::Replace("\u{2026}".into()))?,
        InputRule::new(r"--$", RuleAction::Replace("\u{2014}".into()))?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TextSelection;
    use crate::test_support::{doc, li, ol, p, schema};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn rules() -> InputRules {
        InputRules::for_schema(&schema(), &EditorOptions::default()).unwrap()
    }

    /// Type `text` at the end of the last textblock of `document`.
    fn type_at_end(document: Node, text: &str) -> Option<EditorState> {
        let end = document.content_size() - 1;
        let state = EditorState::new(schema(), document, Some(TextSelection::cursor(end)));
        let tr = rules().handle_text_input(&state, end, end, text)?;
        Some(state.apply(&tr))
    }

    #[rstest]
    #[case("wait..", ".", "wait\u{2026}")]
    #[case("a-", "-", "a\u{2014}")]
    #[case("say ", "\"", "say \u{201C}")]
    #[case("end", "\"", "end\u{201D}")]
    #[case("it", "'", "it\u{2019}")]
    #[case("", "'", "\u{2018}")]
    fn test_typography(#[case] before: &str, #[case] typed: &str, #[case] expected: &str) {
        let next = type_at_end(doc(&[p(&[before])]), typed).unwrap();
        assert_eq!(next.doc(), &doc(&[p(&[expected])]));
    }

    #[test]
    fn test_plain_text_triggers_nothing() {
        assert!(type_at_end(doc(&[p(&["abc"])]), "d").is_none());
    }

    #[test]
    fn test_number_dot_space_starts_ordered_list() {
        let next = type_at_end(doc(&[p(&["3."])]), " ").unwrap();

        let list = next.doc().child(0);
        assert_eq!(list.node_type().name(), "ordered_list");
        assert_eq!(ListAttrs::of_node(list).map(|attrs| attrs.order), Some(3));
        assert_eq!(list.child(0), &li(&[p(&[])]));
    }

    #[test]
    fn test_dash_space_starts_bullet_list() {
        let next = type_at_end(doc(&[p(&["-"])]), " ").unwrap();
        assert_eq!(next.doc().child(0).node_type().name(), "bullet_list");
    }

    #[rstest]
    #[case("7.", "ordered_list", ListStyle::UpperAlpha)]
    #[case("*", "bullet_list", ListStyle::Circle)]
    fn test_list_start_uses_configured_style(
        #[case] before: &str,
        #[case] list_name: &str,
        #[case] expected: ListStyle,
    ) {
        let options = EditorOptions {
            default_ordered_style: ListStyle::UpperAlpha,
            default_bullet_style: ListStyle::Circle,
            ..EditorOptions::default()
        };
        let rules = InputRules::for_schema(&schema(), &options).unwrap();
        let document = doc(&[p(&[before])]);
        let end = document.content_size() - 1;
        let state = EditorState::new(schema(), document, Some(TextSelection::cursor(end)));

        let next = state.apply(&rules.handle_text_input(&state, end, end, " ").unwrap());

        let list = next.doc().child(0);
        assert_eq!(list.node_type().name(), list_name);
        assert_eq!(ListAttrs::of_node(list).map(|attrs| attrs.style), Some(expected));
    }

    #[test]
    fn test_next_number_joins_preceding_list() {
        let next = type_at_end(doc(&[ol(&[li(&[p(&["a"])])]), p(&["2."])]), " ").unwrap();
        assert_eq!(next.doc(), &doc(&[ol(&[li(&[p(&["a"])]), li(&[p(&[])])])]));
    }

    #[test]
    fn test_other_number_starts_separate_list() {
        let next = type_at_end(doc(&[ol(&[li(&[p(&["a"])])]), p(&["5."])]), " ").unwrap();
        assert_eq!(next.doc().child_count(), 2);
        assert_eq!(ListAttrs::of_node(next.doc().child(1)).map(|attrs| attrs.order), Some(5));
    }

    #[test]
    fn test_rules_skip_code_blocks() {
        let schema = schema();
        let code = schema.node("code_block", None, vec![schema.text("a..", Vec::new())]).unwrap();
        assert!(type_at_end(doc(&[code]), ".").is_none());
    }
}
