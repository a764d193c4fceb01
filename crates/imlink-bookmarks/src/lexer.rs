//! Tag-soup tokenizer for bookmark documents, using nom.
//!
//! Browser exports are HTML, not XML: `<DT>` and `<p>` are never closed,
//! attribute values may be unquoted, and names are upper case. The lexer
//! only splits the input into start tags, end tags and text; the tree
//! builder in [`crate::parser`] supplies the implied structure.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{map, opt},
    multi::many0,
    sequence::{delimited, preceded},
    IResult,
};

/// A lexical token. Element and attribute names are upper-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    End {
        name: String,
    },
    Text(&'a str),
}

impl<'a> Token<'a> {
    pub(crate) fn is_start(&self, element: &str) -> bool {
        matches!(self, Token::Start { name, .. } if name == element)
    }

    pub(crate) fn is_end(&self, element: &str) -> bool {
        matches!(self, Token::End { name } if name == element)
    }

    /// Attribute value of a start tag, entity-decoded.
    pub(crate) fn attr(&self, key: &str) -> Option<String> {
        match self {
            Token::Start { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| decode_entities(v)),
            _ => None,
        }
    }
}

/// Split a document into tokens. Comments and `<!...>` declarations are
/// dropped; a `<` that doesn't open a tag is kept as text.
pub(crate) fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() {
        if let Ok((rest, text)) = text(remaining) {
            tokens.push(Token::Text(text));
            remaining = rest;
            continue;
        }

        if let Ok((rest, _)) = alt((comment, declaration))(remaining) {
            remaining = rest;
        } else if let Ok((rest, token)) = alt((end_tag, start_tag))(remaining) {
            tokens.push(token);
            remaining = rest;
        } else {
            // Stray '<'
            tokens.push(Token::Text(&remaining[..1]));
            remaining = &remaining[1..];
        }
    }

    tokens
}

fn text(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != '<')(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    delimited(tag("<!--"), take_until("-->"), tag("-->"))(input)
}

fn declaration(input: &str) -> IResult<&str, &str> {
    delimited(tag("<!"), take_until(">"), char('>'))(input)
}

fn element_name(input: &str) -> IResult<&str, String> {
    map(take_while1(|c: char| c.is_ascii_alphanumeric()), |s: &str| {
        s.to_ascii_uppercase()
    })(input)
}

fn end_tag(input: &str) -> IResult<&str, Token<'_>> {
    let (rest, _) = tag("</")(input)?;
    let (rest, name) = element_name(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char('>')(rest)?;
    Ok((rest, Token::End { name }))
}

fn start_tag(input: &str) -> IResult<&str, Token<'_>> {
    let (rest, _) = char('<')(input)?;
    let (rest, name) = element_name(rest)?;
    let (rest, attrs) = many0(attribute)(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = opt(char('/'))(rest)?;
    let (rest, _) = char('>')(rest)?;
    Ok((rest, Token::Start { name, attrs }))
}

/// ` NAME`, ` NAME=value`, ` NAME="value"` or ` NAME='value'`
fn attribute(input: &str) -> IResult<&str, (String, String)> {
    let (rest, _) = multispace1(input)?;
    let (rest, key) =
        take_while1(|c: char| !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\''))(
            rest,
        )?;
    let (rest, value) = opt(preceded(
        delimited(multispace0, char('='), multispace0),
        attribute_value,
    ))(rest)?;
    Ok((
        rest,
        (key.to_ascii_uppercase(), value.unwrap_or_default().to_string()),
    ))
}

fn attribute_value(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_until("\""), char('"')),
        delimited(char('\''), take_until("'"), char('\'')),
        take_while1(|c: char| !c.is_whitespace() && c != '>'),
    ))(input)
}

/// Decode the character references browsers emit in exports.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        match after.find(';').filter(|end| *end <= 10) {
            Some(end) => match decode_reference(&after[..end]) {
                Some(c) => {
                    out.push(c);
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = after;
                }
            },
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}
