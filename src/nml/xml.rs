//! Minimal XML parser for DDS and NML documents.
//!
//! This is a purpose-built subset parser, not a general XML library: it
//! handles declarations, comments, DOCTYPE, attributes, CDATA, character
//! entities, and namespace prefixes (which are stripped to the local
//! name). That covers every document shape the DDS serves.

use std::collections::HashMap;

use super::NmlError;

/// A parsed XML element with prefix-stripped names.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub name: String,
    pub attributes: HashMap<String, String>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Child elements with the given local name, in document order.
    pub fn children_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Element> + 'a {
        let name = name.to_owned();
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn first_child(&self, name: &str) -> Option<&Element> {
        self.children_named(name).next()
    }

    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }
}

/// Parse a complete document and return its root element.
pub fn parse(input: &str) -> Result<Element, NmlError> {
    let mut parser = Parser::new(input);
    parser.skip_misc()?;
    let root = parser.parse_element()?;
    parser.skip_misc()?;
    if parser.current_char.is_some() {
        return Err(parser.error("trailing content after document root"));
    }
    Ok(root)
}

struct Parser {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
}

impl Parser {
    fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();
        Self {
            input: chars,
            position: 0,
            current_char,
        }
    }

    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    fn error(&self, message: &str) -> NmlError {
        NmlError::Xml {
            offset: self.position,
            message: message.to_string(),
        }
    }

    fn starts_with(&self, pattern: &str) -> bool {
        pattern
            .chars()
            .enumerate()
            .all(|(i, ch)| self.input.get(self.position + i) == Some(&ch))
    }

    fn skip(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip everything allowed around elements: whitespace, the XML
    /// declaration, processing instructions, comments, and DOCTYPE.
    fn skip_misc(&mut self) -> Result<(), NmlError> {
        loop {
            self.skip_whitespace();
            if self.starts_with("<?") {
                self.skip_until(">")?;
            } else if self.starts_with("<!--") {
                self.skip_until("-->")?;
            } else if self.starts_with("<!DOCTYPE") {
                self.skip_until(">")?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_until(&mut self, terminator: &str) -> Result<(), NmlError> {
        while self.current_char.is_some() {
            if self.starts_with(terminator) {
                self.skip(terminator.chars().count());
                return Ok(());
            }
            self.advance();
        }
        Err(self.error("unterminated markup"))
    }

    fn read_name(&mut self) -> Result<String, NmlError> {
        let mut name = String::new();
        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || matches!(ch, ':' | '_' | '-' | '.') {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.error("expected a name"));
        }
        Ok(name)
    }

    fn read_entity(&mut self) -> Result<char, NmlError> {
        self.advance(); // skip '&'
        let mut entity = String::new();
        while let Some(ch) = self.current_char {
            if ch == ';' {
                self.advance();
                return match entity.as_str() {
                    "amp" => Ok('&'),
                    "lt" => Ok('<'),
                    "gt" => Ok('>'),
                    "quot" => Ok('"'),
                    "apos" => Ok('\''),
                    numeric if numeric.starts_with('#') => {
                        let code = if let Some(hex) = numeric.strip_prefix("#x") {
                            u32::from_str_radix(hex, 16)
                        } else {
                            numeric[1..].parse::<u32>()
                        };
                        code.ok()
                            .and_then(char::from_u32)
                            .ok_or_else(|| self.error("invalid character reference"))
                    }
                    _ => Err(self.error("unknown entity reference")),
                };
            }
            if entity.len() > 8 {
                break;
            }
            entity.push(ch);
            self.advance();
        }
        Err(self.error("unterminated entity reference"))
    }

    fn read_attribute_value(&mut self) -> Result<String, NmlError> {
        let quote = match self.current_char {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected a quoted attribute value")),
        };
        self.advance();

        let mut value = String::new();
        while let Some(ch) = self.current_char {
            if ch == quote {
                self.advance();
                return Ok(value);
            }
            if ch == '&' {
                value.push(self.read_entity()?);
            } else {
                value.push(ch);
                self.advance();
            }
        }
        Err(self.error("unterminated attribute value"))
    }

    fn parse_element(&mut self) -> Result<Element, NmlError> {
        if self.current_char != Some('<') {
            return Err(self.error("expected an element"));
        }
        self.advance();

        let qualified = self.read_name()?;
        let mut element = Element {
            name: local_name(&qualified).to_string(),
            ..Element::default()
        };

        // Attributes up to '>' or '/>'.
        loop {
            self.skip_whitespace();
            match self.current_char {
                Some('>') => {
                    self.advance();
                    break;
                }
                Some('/') => {
                    self.advance();
                    if self.current_char != Some('>') {
                        return Err(self.error("malformed empty-element tag"));
                    }
                    self.advance();
                    return Ok(element);
                }
                Some(_) => {
                    let name = self.read_name()?;
                    self.skip_whitespace();
                    if self.current_char != Some('=') {
                        return Err(self.error("expected '=' after attribute name"));
                    }
                    self.advance();
                    self.skip_whitespace();
                    let value = self.read_attribute_value()?;
                    // xmlns declarations are namespace plumbing, not data.
                    if qualified_is_xmlns(&name) {
                        continue;
                    }
                    element
                        .attributes
                        .insert(local_name(&name).to_string(), value);
                }
                None => return Err(self.error("unterminated start tag")),
            }
        }

        // Content up to the matching close tag.
        loop {
            match self.current_char {
                None => return Err(self.error("unterminated element content")),
                Some('<') => {
                    if self.starts_with("</") {
                        self.skip(2);
                        let close = self.read_name()?;
                        if local_name(&close) != element.name {
                            return Err(self.error("mismatched closing tag"));
                        }
                        self.skip_whitespace();
                        if self.current_char != Some('>') {
                            return Err(self.error("malformed closing tag"));
                        }
                        self.advance();
                        return Ok(element);
                    } else if self.starts_with("<!--") {
                        self.skip_until("-->")?;
                    } else if self.starts_with("<![CDATA[") {
                        self.skip("<![CDATA[".len());
                        while let Some(ch) = self.current_char {
                            if self.starts_with("]]>") {
                                break;
                            }
                            element.text.push(ch);
                            self.advance();
                        }
                        self.skip_until("]]>")?;
                    } else if self.starts_with("<?") {
                        self.skip_until(">")?;
                    } else {
                        element.children.push(self.parse_element()?);
                    }
                }
                Some('&') => element.text.push(self.read_entity()?),
                Some(ch) => {
                    element.text.push(ch);
                    self.advance();
                }
            }
        }
    }
}

fn local_name(qualified: &str) -> &str {
    match qualified.split_once(':') {
        Some((_, local)) => local,
        None => qualified,
    }
}

fn qualified_is_xmlns(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_element() {
        let root = parse(r#"<a key="v"><b/><b>text</b></a>"#).unwrap();
        assert_eq!(root.name, "a");
        assert_eq!(root.attribute("key"), Some("v"));
        assert_eq!(root.children_named("b").count(), 2);
        assert_eq!(root.children[1].trimmed_text(), "text");
    }

    #[test]
    fn test_parse_strips_namespace_prefixes() {
        let doc = r#"<nml:Topology xmlns:nml="http://schemas.ogf.org/nml/2013/05/base#"
                       id="urn:ogf:network:example.net:2013:topology">
                       <nml:BidirectionalPort id="p1"/>
                     </nml:Topology>"#;
        let root = parse(doc).unwrap();
        assert_eq!(root.name, "Topology");
        assert!(root.attributes.get("id").is_some());
        assert!(root.first_child("BidirectionalPort").is_some());
    }

    #[test]
    fn test_parse_declaration_comments_and_entities() {
        let doc = "<?xml version=\"1.0\"?>\n<!-- header -->\n<a>x &amp; y &#65;</a>";
        let root = parse(doc).unwrap();
        assert_eq!(root.trimmed_text(), "x & y A");
    }

    #[test]
    fn test_parse_cdata() {
        let root = parse("<a><![CDATA[<raw & text>]]></a>").unwrap();
        assert_eq!(root.trimmed_text(), "<raw & text>");
    }

    #[test]
    fn test_parse_rejects_mismatched_close() {
        assert!(parse("<a><b></a></b>").is_err());
        assert!(parse("<a>").is_err());
    }
}
