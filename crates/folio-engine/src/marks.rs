//! Inline marks: emphasis plus the font size and font family styling spans.

use std::fmt;

use crate::dom::{DomElement, DomOutput};
use crate::model::{AttrValue, Attrs, Mark, MarkSpec, Schema, SchemaBuilder, SchemaError};

pub const STRONG: &str = "strong";
pub const EM: &str = "em";
pub const FONT_SIZE: &str = "font_size";
pub const FONT_FAMILY: &str = "font_family";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFamily {
    Arial,
    TimesNewRoman,
    CourierNew,
}

impl FontFamily {
    pub const ALL: [FontFamily; 3] = [
        FontFamily::Arial,
        FontFamily::TimesNewRoman,
        FontFamily::CourierNew,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FontFamily::Arial => "Arial",
            FontFamily::TimesNewRoman => "Times New Roman",
            FontFamily::CourierNew => "Courier New",
        }
    }

    /// The CSS `font-family` stack rendered for this family.
    pub fn css_stack(self) -> &'static str {
        match self {
            FontFamily::Arial => "Arial, Helvetica, sans-serif",
            FontFamily::TimesNewRoman => "\"Times New Roman\", Times, serif",
            FontFamily::CourierNew => "\"Courier New\", \"Lucida Console\", monospace",
        }
    }

    /// Match a family name or a whole CSS stack by its first family.
    pub fn parse(value: &str) -> Option<FontFamily> {
        let first = value.split(',').next()?.trim().trim_matches(|c| c == '"' || c == '\'');
        Self::ALL
            .into_iter()
            .find(|family| family.name().eq_ignore_ascii_case(first))
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn strong_to_dom(_mark: &Mark) -> DomOutput {
    DomOutput::new("strong")
}

fn em_to_dom(_mark: &Mark) -> DomOutput {
    DomOutput::new("em")
}

fn font_size_to_dom(mark: &Mark) -> DomOutput {
    let size = mark.attr("size").and_then(AttrValue::as_int).unwrap_or_default();
    DomOutput::new("span").attr("style", format!("font-size: {size}px;"))
}

fn parse_font_size(element: &DomElement) -> Option<Attrs> {
    let value = element.style_property("font-size")?;
    let size: i64 = value.strip_suffix("px")?.trim().parse().ok()?;
    (size > 0).then(|| crate::attrs! { "size" => size })
}

fn font_family_to_dom(mark: &Mark) -> DomOutput {
    let stack = mark
        .attr("family")
        .and_then(AttrValue::as_str)
        .and_then(FontFamily::parse)
        .map_or("inherit", FontFamily::css_stack);
    DomOutput::new("span").attr("style", format!("font-family: {stack};"))
}

fn parse_font_family(element: &DomElement) -> Option<Attrs> {
    let family = FontFamily::parse(&element.style_property("font-family")?)?;
    Some(crate::attrs! { "family" => family.name() })
}

/// Add `strong`, `em`, `font_size` and `font_family` to a schema.
pub fn add_marks(builder: SchemaBuilder) -> SchemaBuilder {
    builder
        .mark(
            STRONG,
            MarkSpec::new()
                .to_dom(strong_to_dom)
                .parse("strong", None)
                .parse("b", None),
        )
        .mark(EM, MarkSpec::new().to_dom(em_to_dom).parse("em", None).parse("i", None))
        .mark(
            FONT_SIZE,
            MarkSpec::new()
                .required_attr("size")
                .to_dom(font_size_to_dom)
                .parse("span", Some(parse_font_size)),
        )
        .mark(
            FONT_FAMILY,
            MarkSpec::new()
                .required_attr("family")
                .to_dom(font_family_to_dom)
                .parse("span", Some(parse_font_family)),
        )
}

pub fn font_size(schema: &Schema, px: u32) -> Result<Mark, SchemaError> {
    schema.mark(FONT_SIZE, Some(&crate::attrs! { "size" => px }))
}

pub fn font_family(schema: &Schema, family: FontFamily) -> Result<Mark, SchemaError> {
    schema.mark(FONT_FAMILY, Some(&crate::attrs! { "family" => family.name() }))
}
