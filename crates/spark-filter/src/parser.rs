//! LDAP 风格过滤文本的递归下降解析器。
//!
//! 语法（`\` 转义其后任意字符）：
//!
//! ```text
//! filter     := '(' ( '&' filter+ | '|' filter+ | '!' filter | criteria ) ')'
//! criteria   := attribute operator value
//! operator   := '=' | '~=' | '<=' | '>=' | '<' | '>'
//! ```
//!
//! 顶层允许省略括号的单个条件（`name=value`），解析结果等价于 `(name=value)`。

use crate::error::{FilterError, FilterErrorKind};
use crate::filter::{Comparator, Criteria, Filter};

/// 解析过滤文本。
///
/// # 契约说明（What）
/// - 空文本或仅含空白时返回 `Ok(None)`，表示“不附加过滤条件”；
/// - 成功时返回规范化后的谓词树（同类组合扁平化、单操作数组合展开），
///   因此书写上等价的表达式得到相同的规范化文本；
/// - 失败时返回携带字节偏移的 [`FilterError`]。
///
/// # 示例（Examples）
/// ```rust
/// use spark_filter::{Properties, PropertyValue, parse};
///
/// let filter = parse("(&(color=red)(size>=10))").unwrap().unwrap();
/// let props: Properties = [("color", PropertyValue::from("red")), ("size", 12.into())]
///     .into_iter()
///     .collect();
/// assert!(filter.matches(&props));
/// assert_eq!(filter.to_string(), "(&(color=red)(size>=10))");
/// assert!(parse("   ").unwrap().is_none());
/// ```
pub fn parse(text: &str) -> crate::Result<Option<Filter>> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let mut parser = Parser::new(text);
    parser.skip_whitespace();
    let filter = if parser.peek() == Some('(') {
        parser.parse_filter()?
    } else {
        Filter::Criteria(parser.parse_criteria(false)?)
    };
    parser.skip_whitespace();
    if parser.peek().is_some() {
        return Err(parser.error(FilterErrorKind::TrailingInput));
    }
    Ok(Some(filter.normalize()))
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    index: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            index: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).map(|(_, ch)| *ch)
    }

    fn position(&self) -> usize {
        self.chars
            .get(self.index)
            .map_or(self.source.len(), |(offset, _)| *offset)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.index += 1;
        Some(ch)
    }

    fn error(&self, kind: FilterErrorKind) -> FilterError {
        FilterError::new(kind, self.position(), self.source)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.index += 1;
        }
    }

    fn expect(&mut self, expected: char, kind: FilterErrorKind) -> crate::Result<()> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.index += 1;
                Ok(())
            }
            Some(_) => Err(self.error(kind)),
            None => Err(self.error(FilterErrorKind::UnexpectedEnd)),
        }
    }

    fn parse_filter(&mut self) -> crate::Result<Filter> {
        self.expect('(', FilterErrorKind::MissingOpenParen)?;
        self.skip_whitespace();

        let filter = match self.peek() {
            Some('&') => {
                self.bump();
                Filter::And(self.parse_operands()?)
            }
            Some('|') => {
                self.bump();
                Filter::Or(self.parse_operands()?)
            }
            Some('!') => {
                self.bump();
                let arity_position = self.position();
                let mut operands = self.parse_operands()?;
                if operands.len() != 1 {
                    return Err(FilterError::new(
                        FilterErrorKind::NegationArity,
                        arity_position,
                        self.source,
                    ));
                }
                match operands.pop() {
                    Some(operand) => Filter::negate(operand),
                    None => return Err(self.error(FilterErrorKind::NegationArity)),
                }
            }
            Some(_) => Filter::Criteria(self.parse_criteria(true)?),
            None => return Err(self.error(FilterErrorKind::UnexpectedEnd)),
        };

        self.skip_whitespace();
        self.expect(')', FilterErrorKind::MissingCloseParen)?;
        Ok(filter)
    }

    fn parse_operands(&mut self) -> crate::Result<Vec<Filter>> {
        let start = self.position();
        let mut operands = Vec::new();
        self.skip_whitespace();
        while self.peek() == Some('(') {
            operands.push(self.parse_filter()?);
            self.skip_whitespace();
        }
        if operands.is_empty() {
            return Err(FilterError::new(
                FilterErrorKind::EmptyComposite,
                start,
                self.source,
            ));
        }
        Ok(operands)
    }

    /// `enclosed` 为真时条件以 `)` 结束（右括号留给调用方消费），否则一直读到文本末尾。
    fn parse_criteria(&mut self, enclosed: bool) -> crate::Result<Criteria> {
        let name_start = self.position();
        let mut name = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error(FilterErrorKind::UnexpectedEnd)),
                Some('=' | '<' | '>' | '~') => break,
                Some('(' | ')') => return Err(self.error(FilterErrorKind::UnknownOperator)),
                Some('\\') => name.push(self.escaped()?),
                Some(ch) => {
                    self.index += 1;
                    name.push(ch);
                }
            }
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(FilterError::new(
                FilterErrorKind::EmptyAttribute,
                name_start,
                self.source,
            ));
        }

        let comparator = self.parse_comparator()?;

        let mut segments = vec![String::new()];
        loop {
            match self.peek() {
                None if enclosed => return Err(self.error(FilterErrorKind::UnexpectedEnd)),
                None => break,
                Some(')') if enclosed => break,
                Some('(' | ')') => return Err(self.error(FilterErrorKind::MissingCloseParen)),
                Some('*') => {
                    self.index += 1;
                    segments.push(String::new());
                }
                Some('\\') => {
                    let ch = self.escaped()?;
                    if let Some(segment) = segments.last_mut() {
                        segment.push(ch);
                    }
                }
                Some(ch) => {
                    self.index += 1;
                    if let Some(segment) = segments.last_mut() {
                        segment.push(ch);
                    }
                }
            }
        }
        if !enclosed {
            if let Some(segment) = segments.last_mut() {
                let trimmed = segment.trim_end().len();
                segment.truncate(trimmed);
            }
        }

        if comparator == Comparator::Equal {
            Ok(Criteria::pattern(name, segments))
        } else {
            Ok(Criteria::new(name, comparator, segments.join("*")))
        }
    }

    fn parse_comparator(&mut self) -> crate::Result<Comparator> {
        let comparator = match self.bump() {
            Some('=') => Comparator::Equal,
            Some('~') => {
                if self.peek() != Some('=') {
                    return Err(self.error(FilterErrorKind::UnknownOperator));
                }
                self.index += 1;
                Comparator::Approximate
            }
            Some('<') => self.with_optional_equal(Comparator::LessOrEqual, Comparator::Less),
            Some('>') => self.with_optional_equal(Comparator::GreaterOrEqual, Comparator::Greater),
            _ => return Err(self.error(FilterErrorKind::UnknownOperator)),
        };
        Ok(comparator)
    }

    fn with_optional_equal(&mut self, inclusive: Comparator, strict: Comparator) -> Comparator {
        if self.peek() == Some('=') {
            self.index += 1;
            inclusive
        } else {
            strict
        }
    }

    fn escaped(&mut self) -> crate::Result<char> {
        self.index += 1;
        match self.bump() {
            Some(ch) => Ok(ch),
            None => Err(self.error(FilterErrorKind::DanglingEscape)),
        }
    }
}
