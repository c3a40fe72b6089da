//! # List Attribute Model
//!
//! Ordered and bullet list nodes carry a start number (`order`) and a
//! numbering or bullet style. Both map onto the `start` and `type`
//! attributes of the `<ol>` / `<ul>` element.
//!
//! ## Key Invariants
//!
//! - `order` is at least 1
//! - A list's style always belongs to its kind; a foreign or unknown style
//!   falls back to the kind's default
//! - Export omits `start` when it is 1 and `type` when the style is the default
//! - Import never fails: malformed values are corrected and logged

use std::fmt;
use std::str::FromStr;

use log::warn;

use crate::dom::{DomElement, DomOutput};
use crate::model::{AttrValue, Attrs, Node, NodeSpec, NodeType, SchemaBuilder};

pub const ORDERED_LIST: &str = "ordered_list";
pub const BULLET_LIST: &str = "bullet_list";
pub const LIST_ITEM: &str = "list_item";

/// Content of a list item unless configured otherwise.
pub const DEFAULT_ITEM_CONTENT: &str = "paragraph block*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Ordered,
    Bullet,
}

impl ListKind {
    pub fn node_name(self) -> &'static str {
        match self {
            ListKind::Ordered => ORDERED_LIST,
            ListKind::Bullet => BULLET_LIST,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ListKind::Ordered => "ol",
            ListKind::Bullet => "ul",
        }
    }

    pub fn default_style(self) -> ListStyle {
        match self {
            ListKind::Ordered => ListStyle::Decimal,
            ListKind::Bullet => ListStyle::Disc,
        }
    }

    pub fn styles(self) -> &'static [ListStyle] {
        match self {
            ListKind::Ordered => &[
                ListStyle::Decimal,
                ListStyle::LowerRoman,
                ListStyle::UpperRoman,
                ListStyle::LowerAlpha,
                ListStyle::UpperAlpha,
            ],
            ListKind::Bullet => &[ListStyle::Disc, ListStyle::Circle, ListStyle::Square],
        }
    }

    pub fn of_node_type(node_type: &NodeType) -> Option<ListKind> {
        match node_type.name() {
            ORDERED_LIST => Some(ListKind::Ordered),
            BULLET_LIST => Some(ListKind::Bullet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListStyle {
    Decimal,
    LowerRoman,
    UpperRoman,
    LowerAlpha,
    UpperAlpha,
    Disc,
    Circle,
    Square,
}

impl ListStyle {
    const ALL: [ListStyle; 8] = [
        ListStyle::Decimal,
        ListStyle::LowerRoman,
        ListStyle::UpperRoman,
        ListStyle::LowerAlpha,
        ListStyle::UpperAlpha,
        ListStyle::Disc,
        ListStyle::Circle,
        ListStyle::Square,
    ];

    pub fn kind(self) -> ListKind {
        match self {
            ListStyle::Disc | ListStyle::Circle | ListStyle::Square => ListKind::Bullet,
            _ => ListKind::Ordered,
        }
    }

    /// CSS `list-style-type` keyword, also the attribute value stored on the node.
    pub fn keyword(self) -> &'static str {
        match self {
            ListStyle::Decimal => "decimal",
            ListStyle::LowerRoman => "lower-roman",
            ListStyle::UpperRoman => "upper-roman",
            ListStyle::LowerAlpha => "lower-alpha",
            ListStyle::UpperAlpha => "upper-alpha",
            ListStyle::Disc => "disc",
            ListStyle::Circle => "circle",
            ListStyle::Square => "square",
        }
    }

    /// Value of the HTML `type` attribute.
    pub fn code(self) -> &'static str {
        match self {
            ListStyle::Decimal => "1",
            ListStyle::LowerRoman => "i",
            ListStyle::UpperRoman => "I",
            ListStyle::LowerAlpha => "a",
            ListStyle::UpperAlpha => "A",
            ListStyle::Disc => "disc",
            ListStyle::Circle => "circle",
            ListStyle::Square => "square",
        }
    }

    pub fn from_code(code: &str) -> Option<ListStyle> {
        Self::ALL.into_iter().find(|style| style.code() == code)
    }

    pub fn from_keyword(keyword: &str) -> Option<ListStyle> {
        Self::ALL.into_iter().find(|style| style.keyword() == keyword)
    }

    /// Codes are case-sensitive (`i` and `I` differ) and are tried first.
    pub fn parse(value: &str) -> Option<ListStyle> {
        let value = value.trim();
        Self::from_code(value).or_else(|| Self::from_keyword(&value.to_ascii_lowercase()))
    }

    /// Display label of the item at 1-based `number`.
    pub fn marker(self, number: u32) -> String {
        match self {
            ListStyle::Decimal => format!("{number}."),
            ListStyle::LowerRoman => format!("{}.", to_roman(number).to_lowercase()),
            ListStyle::UpperRoman => format!("{}.", to_roman(number)),
            ListStyle::LowerAlpha => format!("{}.", to_alpha(number)),
            ListStyle::UpperAlpha => format!("{}.", to_alpha(number).to_uppercase()),
            ListStyle::Disc => "•".to_string(),
            ListStyle::Circle => "◦".to_string(),
            ListStyle::Square => "▪".to_string(),
        }
    }
}

impl fmt::Display for ListStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown list style '{0}'")]
pub struct UnknownListStyle(pub String);

impl FromStr for ListStyle {
    type Err = UnknownListStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListStyle::parse(s).ok_or_else(|| UnknownListStyle(s.to_string()))
    }
}

fn to_roman(mut number: u32) -> String {
    const NUMERALS: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while number >= value {
            out.push_str(numeral);
            number -= value;
        }
    }
    out
}

fn to_alpha(mut number: u32) -> String {
    let mut out = Vec::new();
    while number > 0 {
        number -= 1;
        out.push(char::from(b'a' + (number % 26) as u8));
        number /= 26;
    }
    out.iter().rev().collect()
}

/// Attributes of a list node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListAttrs {
    pub order: u32,
    pub style: ListStyle,
}

impl ListAttrs {
    /// Attributes for a list of `kind`, correcting `order` and a foreign `style`.
    pub fn new(kind: ListKind, order: u32, style: ListStyle) -> Self {
        let style = if style.kind() == kind {
            style
        } else {
            kind.default_style()
        };
        Self {
            order: order.max(1),
            style,
        }
    }

    pub fn default_for(kind: ListKind) -> Self {
        Self::new(kind, 1, kind.default_style())
    }

    pub fn to_attrs(self) -> Attrs {
        crate::attrs! {
            "order" => self.order,
            "style" => self.style.keyword(),
        }
    }

    /// Read node attributes, falling back to defaults for anything unusable.
    pub fn from_attrs(kind: ListKind, attrs: &Attrs) -> Self {
        let order = attrs
            .get("order")
            .and_then(AttrValue::as_int)
            .and_then(|order| u32::try_from(order).ok())
            .unwrap_or(1);
        let style = attrs
            .get("style")
            .and_then(AttrValue::as_str)
            .and_then(ListStyle::parse)
            .unwrap_or(kind.default_style());
        Self::new(kind, order, style)
    }

    pub fn of_node(node: &Node) -> Option<Self> {
        let kind = ListKind::of_node_type(node.node_type())?;
        Some(Self::from_attrs(kind, node.attrs()))
    }

    /// Displayed number of the item at `index`: the list's start plus the
    /// items before it.
    pub fn item_number(self, index: usize) -> u32 {
        self.order.saturating_add(u32::try_from(index).unwrap_or(u32::MAX))
    }

    pub fn to_dom(self, kind: ListKind) -> DomOutput {
        let mut output = DomOutput::new(kind.tag());
        if self.order != 1 {
            output = output.attr("start", self.order.to_string());
        }
        if self.style != kind.default_style() {
            output = output.attr("type", self.style.code());
        }
        output
    }

    pub fn from_dom(kind: ListKind, element: &DomElement) -> Self {
        let order = match element.attr("start") {
            None => 1,
            Some(start) => match start.trim().parse::<i64>() {
                Ok(order) if order >= 1 => u32::try_from(order).unwrap_or(u32::MAX),
                Ok(order) => {
                    warn!("List start {order} below 1, using 1");
                    1
                }
                Err(_) => {
                    warn!("Ignoring non-numeric list start '{start}'");
                    1
                }
            },
        };
        let style = match element.attr("type") {
            None => kind.default_style(),
            Some(code) => match ListStyle::parse(code) {
                Some(style) if style.kind() == kind => style,
                _ => {
                    warn!("Ignoring list type '{code}' on <{}>", kind.tag());
                    kind.default_style()
                }
            },
        };
        Self::new(kind, order, style)
    }
}

fn ordered_list_to_dom(node: &Node) -> DomOutput {
    ListAttrs::from_attrs(ListKind::Ordered, node.attrs()).to_dom(ListKind::Ordered)
}

fn bullet_list_to_dom(node: &Node) -> DomOutput {
    ListAttrs::from_attrs(ListKind::Bullet, node.attrs()).to_dom(ListKind::Bullet)
}

fn parse_ordered_list(element: &DomElement) -> Option<Attrs> {
    Some(ListAttrs::from_dom(ListKind::Ordered, element).to_attrs())
}

fn parse_bullet_list(element: &DomElement) -> Option<Attrs> {
    Some(ListAttrs::from_dom(ListKind::Bullet, element).to_attrs())
}

fn list_item_to_dom(_node: &Node) -> DomOutput {
    DomOutput::new("li")
}

fn list_spec(kind: ListKind, group: Option<&str>) -> NodeSpec {
    let defaults = ListAttrs::default_for(kind);
    let spec = NodeSpec::new()
        .content(format!("{LIST_ITEM}+"))
        .attr("order", defaults.order)
        .attr("style", defaults.style.keyword());
    let spec = match kind {
        ListKind::Ordered => spec
            .to_dom(ordered_list_to_dom)
            .parse("ol", Some(parse_ordered_list)),
        ListKind::Bullet => spec.to_dom(bullet_list_to_dom).parse("ul", Some(parse_bullet_list)),
    };
    match group {
        Some(group) => spec.group(group),
        None => spec,
    }
}

/// Add `ordered_list`, `bullet_list` and `list_item` to a schema. The lists
/// join `list_group` when given; items hold `item_content`.
pub fn add_list_nodes(
    builder: SchemaBuilder,
    item_content: &str,
    list_group: Option<&str>,
) -> SchemaBuilder {
    builder
        .node(ORDERED_LIST, list_spec(ListKind::Ordered, list_group))
        .node(BULLET_LIST, list_spec(ListKind::Bullet, list_group))
        .node(
            LIST_ITEM,
            NodeSpec::new()
                .content(item_content)
                .to_dom(list_item_to_dom)
                .parse("li", None),
        )
}
