//! The selector subset the storefront queries with: type, `*`, `#id`,
//! `.class`, `[attr]` and `[attr="value"]` compounds, joined by descendant
//! or `>` combinators, in comma-separated groups.

use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
}

impl SelectorStep {
    /// The id of a bare `#id` step, which can be answered from the id index.
    pub(crate) fn id_only(&self) -> Option<&str> {
        let bare = !self.universal && self.tag.is_none() && self.classes.is_empty();
        if bare && self.attrs.is_empty() {
            self.id.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    /// How this step relates to the step on its left; `None` for the first.
    pub(crate) combinator: Option<SelectorCombinator>,
}

pub(crate) fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let mut cursor = SelectorCursor::new(selector);
    let chain = cursor.chain()?;
    cursor.finish()?;
    Ok(chain)
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    let mut cursor = SelectorCursor::new(selector);
    let mut groups = vec![cursor.chain()?];
    while cursor.eat(b',') {
        groups.push(cursor.chain()?);
    }
    cursor.finish()?;
    Ok(groups)
}

struct SelectorCursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> SelectorCursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn unsupported(&self) -> Error {
        Error::UnsupportedSelector(self.src.to_string())
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        let hit = self.peek() == Some(byte);
        if hit {
            self.pos += 1;
        }
        hit
    }

    /// Returns whether any whitespace was consumed.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn take_while(&mut self, accept: impl Fn(u8) -> bool) -> Option<&'a str> {
        let src = self.src;
        let start = self.pos;
        while self.peek().is_some_and(&accept) {
            self.pos += 1;
        }
        (self.pos > start).then(|| &src[start..self.pos])
    }

    fn ident(&mut self) -> Option<String> {
        self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
            .map(str::to_string)
    }

    fn finish(&mut self) -> Result<()> {
        self.skip_ws();
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.unsupported()),
        }
    }

    fn chain(&mut self) -> Result<Vec<SelectorPart>> {
        self.skip_ws();
        let mut parts = vec![SelectorPart {
            step: self.step()?,
            combinator: None,
        }];
        loop {
            let spaced = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(b',') => break,
                Some(b'>') => {
                    self.pos += 1;
                    self.skip_ws();
                    SelectorCombinator::Child
                }
                Some(_) if spaced => SelectorCombinator::Descendant,
                Some(_) => return Err(self.unsupported()),
            };
            parts.push(SelectorPart {
                step: self.step()?,
                combinator: Some(combinator),
            });
        }
        Ok(parts)
    }

    fn step(&mut self) -> Result<SelectorStep> {
        let start = self.pos;
        let mut step = SelectorStep::default();
        if self.eat(b'*') {
            step.universal = true;
        } else if let Some(tag) = self.ident() {
            step.tag = Some(tag.to_ascii_lowercase());
        }

        loop {
            if self.eat(b'#') {
                let id = self.ident().ok_or_else(|| self.unsupported())?;
                if step.id.replace(id).is_some() {
                    return Err(self.unsupported());
                }
            } else if self.eat(b'.') {
                let class_name = self.ident().ok_or_else(|| self.unsupported())?;
                step.classes.push(class_name);
            } else if self.eat(b'[') {
                let condition = self.attr_condition()?;
                step.attrs.push(condition);
            } else {
                break;
            }
        }

        if self.pos == start {
            return Err(self.unsupported());
        }
        Ok(step)
    }

    /// Parses the inside of `[...]`; the opening bracket is already consumed.
    fn attr_condition(&mut self) -> Result<SelectorAttrCondition> {
        self.skip_ws();
        let key = self
            .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':'))
            .ok_or_else(|| self.unsupported())?
            .to_ascii_lowercase();
        self.skip_ws();
        if self.eat(b']') {
            return Ok(SelectorAttrCondition::Exists { key });
        }
        if !self.eat(b'=') {
            return Err(self.unsupported());
        }
        self.skip_ws();
        let value = self.attr_value()?;
        self.skip_ws();
        if !self.eat(b']') {
            return Err(self.unsupported());
        }
        Ok(SelectorAttrCondition::Eq { key, value })
    }

    fn attr_value(&mut self) -> Result<String> {
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let start = self.pos;
                let len = self.src[start..]
                    .find(quote as char)
                    .ok_or_else(|| self.unsupported())?;
                self.pos = start + len + 1;
                Ok(self.src[start..start + len].to_string())
            }
            _ => self
                .take_while(|b| !b.is_ascii_whitespace() && b != b']')
                .map(str::to_string)
                .ok_or_else(|| self.unsupported()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_step_with_attribute_condition() -> Result<()> {
        let chain = parse_selector_chain(r#"input.form-control[name="quantity"][required]"#)?;
        assert_eq!(chain.len(), 1);
        let step = &chain[0].step;
        assert_eq!(step.tag.as_deref(), Some("input"));
        assert_eq!(step.classes, vec!["form-control".to_string()]);
        assert_eq!(
            step.attrs,
            vec![
                SelectorAttrCondition::Eq {
                    key: "name".into(),
                    value: "quantity".into(),
                },
                SelectorAttrCondition::Exists {
                    key: "required".into(),
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn parses_combinators_between_steps() -> Result<()> {
        let chain = parse_selector_chain(".product-card-container>.card  .product-title")?;
        let combinators = chain.iter().map(|part| part.combinator).collect::<Vec<_>>();
        assert_eq!(
            combinators,
            vec![
                None,
                Some(SelectorCombinator::Child),
                Some(SelectorCombinator::Descendant),
            ]
        );
        Ok(())
    }

    #[test]
    fn quoted_attribute_values_may_contain_spaces_and_commas() -> Result<()> {
        let groups = parse_selector_groups(r#"[title="a, b > c"], #x"#)?;
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups[0][0].step.attrs,
            vec![SelectorAttrCondition::Eq {
                key: "title".into(),
                value: "a, b > c".into(),
            }]
        );
        assert_eq!(groups[1][0].step.id_only(), Some("x"));
        Ok(())
    }

    #[test]
    fn rejects_malformed_selectors() {
        for selector in ["", "> a", "a >", "a[", "#", "div..x", "[name=\"x]", "a,,b", "a,"] {
            assert!(
                parse_selector_groups(selector).is_err(),
                "expected {selector:?} to be rejected"
            );
        }
    }

    #[test]
    fn sibling_combinators_and_substring_operators_are_unsupported() {
        for selector in ["h5 + p", "h5 ~ p", "a[href^=\"/cart\"]", "[class~=card]", "a:hover"] {
            assert!(
                matches!(
                    parse_selector_groups(selector),
                    Err(Error::UnsupportedSelector(_))
                ),
                "expected {selector:?} to be unsupported"
            );
        }
    }
}
