//! 过滤谓词树、比较语义与组合代数。
//!
//! # 教案级说明
//! - **意图 (Why)**：依赖声明需要把“类型标签等值测试”与“用户可选过滤条件”合取为一个谓词，
//!   该模块提供树形表示与 [`combine`] 代数，保证组合结果的规范化文本稳定可比较；
//! - **契约 (What)**：
//!   - `Display` 输出规范化文本，特殊字符 `\ ( ) *` 以反斜杠转义，可被 [`crate::parse`] 还原为相等的树；
//!   - 属性缺失的条件一律不命中（只有外层 `!` 才会把它翻转为命中）；
//! - **设计 (How)**：`And`/`Or` 持有操作数向量，`Not` 以 `Box` 持有唯一操作数，元数由类型保证；
//! - **权衡 (Trade-offs)**：不做布尔化简（例如去重、德摩根展开），只做同类组合的扁平化，
//!   以保证规范化文本与声明者书写的结构一一对应，便于排障。

use std::cmp::Ordering;
use std::fmt;

use crate::value::{Properties, PropertyValue};

/// 组合运算符。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    pub const fn symbol(self) -> char {
        match self {
            Self::And => '&',
            Self::Or => '|',
        }
    }
}

/// 条件比较运算符。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// `=`，值中未转义的 `*` 表示通配。
    Equal,
    /// `~=`，忽略大小写与空白的近似相等。
    Approximate,
    /// `<=`
    LessOrEqual,
    /// `<`
    Less,
    /// `>=`
    GreaterOrEqual,
    /// `>`
    Greater,
}

impl Comparator {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::Approximate => "~=",
            Self::LessOrEqual => "<=",
            Self::Less => "<",
            Self::GreaterOrEqual => ">=",
            Self::Greater => ">",
        }
    }

    /// `ordering` 为“属性值相对字面量”的比较结果。
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Equal | Self::Approximate => ordering == Ordering::Equal,
            Self::LessOrEqual => ordering != Ordering::Greater,
            Self::Less => ordering == Ordering::Less,
            Self::GreaterOrEqual => ordering != Ordering::Less,
            Self::Greater => ordering == Ordering::Greater,
        }
    }
}

/// 条件右侧的字面量。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CriteriaValue {
    /// 已去除转义的精确文本。
    Exact(String),
    /// 以未转义 `*` 切分的通配片段，至少两段；全部为空即存在性测试 `(name=*)`。
    Pattern(Vec<String>),
}

impl CriteriaValue {
    fn is_presence(&self) -> bool {
        matches!(self, Self::Pattern(segments) if segments.iter().all(String::is_empty))
    }
}

/// 单个属性条件，例如 `(version>=2)`。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Criteria {
    name: String,
    comparator: Comparator,
    value: CriteriaValue,
}

/// 属性名两端的空白不属于名称，解析器同样会去除。
fn attribute_name(name: impl Into<String>) -> String {
    let name = name.into();
    let trimmed = name.trim();
    if trimmed.len() == name.len() {
        name
    } else {
        trimmed.to_owned()
    }
}

impl Criteria {
    /// 以精确字面量构造条件，`value` 中的 `*` 不具通配含义；`name` 两端空白被去除。
    pub fn new(name: impl Into<String>, comparator: Comparator, value: impl Into<String>) -> Self {
        Self {
            name: attribute_name(name),
            comparator,
            value: CriteriaValue::Exact(value.into()),
        }
    }

    /// 通配条件；`segments` 少于两段时退化为精确匹配。
    pub fn pattern(name: impl Into<String>, segments: Vec<String>) -> Self {
        let value = if segments.len() < 2 {
            CriteriaValue::Exact(segments.into_iter().next().unwrap_or_default())
        } else {
            CriteriaValue::Pattern(segments)
        };
        Self {
            name: attribute_name(name),
            comparator: Comparator::Equal,
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    pub fn value(&self) -> &CriteriaValue {
        &self.value
    }

    /// 以属性表求值。
    pub fn matches(&self, properties: &Properties) -> bool {
        match properties.get(&self.name) {
            None => false,
            Some(_) if self.value.is_presence() => true,
            Some(value) => self.matches_value(value),
        }
    }

    fn matches_value(&self, value: &PropertyValue) -> bool {
        match (value, &self.value) {
            (PropertyValue::List(items), _) => items.iter().any(|item| self.matches_value(item)),
            (PropertyValue::Map(_), _) => false,
            (_, CriteriaValue::Pattern(segments)) => value
                .to_text()
                .is_some_and(|text| wildcard_matches(segments, &text)),
            (PropertyValue::Text(text), CriteriaValue::Exact(literal)) => {
                if self.comparator == Comparator::Approximate {
                    normalize_approximate(text) == normalize_approximate(literal)
                } else {
                    self.comparator.accepts(text.as_str().cmp(literal.as_str()))
                }
            }
            (PropertyValue::Integer(number), CriteriaValue::Exact(literal)) => {
                let literal = literal.trim();
                if let Ok(parsed) = literal.parse::<i64>() {
                    self.comparator.accepts(number.cmp(&parsed))
                } else {
                    compare_float(*number as f64, literal, self.comparator)
                }
            }
            (PropertyValue::Float(number), CriteriaValue::Exact(literal)) => {
                compare_float(*number, literal.trim(), self.comparator)
            }
            (PropertyValue::Boolean(flag), CriteriaValue::Exact(literal)) => {
                matches!(self.comparator, Comparator::Equal | Comparator::Approximate)
                    && parse_bool(literal).is_some_and(|parsed| parsed == *flag)
            }
        }
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_escaped(f, &self.name, NAME_SPECIALS)?;
        f.write_str(self.comparator.as_str())?;
        // 紧随运算符的 `=` 会被读作 `<=`/`>=` 的一部分，需要转义。
        let leading = match &self.value {
            CriteriaValue::Exact(literal) => literal.as_str(),
            CriteriaValue::Pattern(segments) => segments.first().map_or("", String::as_str),
        };
        if leading.starts_with('=') {
            f.write_str("\\")?;
        }
        match &self.value {
            CriteriaValue::Exact(literal) => write_escaped(f, literal, VALUE_SPECIALS)?,
            CriteriaValue::Pattern(segments) => {
                for (index, segment) in segments.iter().enumerate() {
                    if index > 0 {
                        f.write_str("*")?;
                    }
                    write_escaped(f, segment, VALUE_SPECIALS)?;
                }
            }
        }
        f.write_str(")")
    }
}

/// 过滤谓词树。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Filter {
    Criteria(Criteria),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    /// 构造等值条件 `(name=value)`，`value` 按字面量处理。
    pub fn equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Criteria(Criteria::new(name, Comparator::Equal, value))
    }

    pub fn criteria(
        name: impl Into<String>,
        comparator: Comparator,
        value: impl Into<String>,
    ) -> Self {
        Self::Criteria(Criteria::new(name, comparator, value))
    }

    pub fn negate(operand: Filter) -> Self {
        Self::Not(Box::new(operand))
    }

    /// 对属性表求值；空组合 `(&)` 视为真、`(|)` 视为假，与集合语义一致。
    pub fn matches(&self, properties: &Properties) -> bool {
        match self {
            Self::Criteria(criteria) => criteria.matches(properties),
            Self::And(operands) => operands.iter().all(|operand| operand.matches(properties)),
            Self::Or(operands) => operands.iter().any(|operand| operand.matches(properties)),
            Self::Not(operand) => !operand.matches(properties),
        }
    }

    /// 扁平化同类嵌套组合，并展开只有一个操作数的组合。
    pub fn normalize(self) -> Self {
        match self {
            Self::And(operands) => Self::normalize_composite(Operator::And, operands),
            Self::Or(operands) => Self::normalize_composite(Operator::Or, operands),
            Self::Not(operand) => Self::Not(Box::new(operand.normalize())),
            criteria @ Self::Criteria(_) => criteria,
        }
    }

    fn normalize_composite(operator: Operator, operands: Vec<Filter>) -> Self {
        let mut flattened = Vec::with_capacity(operands.len());
        for operand in operands {
            match (operator, operand.normalize()) {
                (Operator::And, Self::And(nested)) | (Operator::Or, Self::Or(nested)) => {
                    flattened.extend(nested)
                }
                (_, other) => flattened.push(other),
            }
        }
        if flattened.len() == 1 {
            if let Some(single) = flattened.pop() {
                return single;
            }
        }
        match operator {
            Operator::And => Self::And(flattened),
            Operator::Or => Self::Or(flattened),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (symbol, operands) = match self {
            Self::Criteria(criteria) => return write!(f, "{criteria}"),
            Self::Not(operand) => return write!(f, "(!{operand})"),
            Self::And(operands) => (Operator::And.symbol(), operands),
            Self::Or(operands) => (Operator::Or.symbol(), operands),
        };
        write!(f, "({symbol}")?;
        for operand in operands {
            write!(f, "{operand}")?;
        }
        f.write_str(")")
    }
}

/// 以 `operator` 组合若干可选谓词。
///
/// # 教案级说明
/// - **契约 (What)**：
///   - `None` 条目被丢弃；
///   - 剩余恰好一个时原样返回（不包裹组合节点）；
///   - 一个不剩时返回 `None`，表示“无过滤条件”；
///   - 其余情况返回规范化后的组合节点，同类嵌套被扁平化。
/// - **用途 (Why)**：依赖声明以 `combine([类型标签, 用户过滤], And)` 生成完整谓词，
///   无论用户是否提供过滤条件，调用方都无需分支处理。
pub fn combine<I>(filters: I, operator: Operator) -> Option<Filter>
where
    I: IntoIterator<Item = Option<Filter>>,
{
    let mut operands: Vec<Filter> = filters.into_iter().flatten().collect();
    match operands.len() {
        0 => None,
        1 => operands.pop(),
        _ => Some(Filter::normalize_composite(operator, operands)),
    }
}

const NAME_SPECIALS: &[char] = &['\\', '(', ')', '*', '=', '<', '>', '~'];
const VALUE_SPECIALS: &[char] = &['\\', '(', ')', '*'];

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str, specials: &[char]) -> fmt::Result {
    for ch in text.chars() {
        if specials.contains(&ch) {
            f.write_str("\\")?;
        }
        write!(f, "{ch}")?;
    }
    Ok(())
}

fn wildcard_matches(segments: &[String], text: &str) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return false;
    };
    let Some((last, middle)) = rest.split_last() else {
        return text == first;
    };
    if !text.starts_with(first.as_str()) {
        return false;
    }
    let mut cursor = first.len();
    for segment in middle.iter().filter(|segment| !segment.is_empty()) {
        match text[cursor..].find(segment.as_str()) {
            Some(offset) => cursor += offset + segment.len(),
            None => return false,
        }
    }
    text[cursor..].ends_with(last.as_str())
}

fn normalize_approximate(text: &str) -> String {
    text.chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn compare_float(number: f64, literal: &str, comparator: Comparator) -> bool {
    literal
        .parse::<f64>()
        .ok()
        .and_then(|parsed| number.partial_cmp(&parsed))
        .is_some_and(|ordering| comparator.accepts(ordering))
}

fn parse_bool(literal: &str) -> Option<bool> {
    let literal = literal.trim();
    if literal.eq_ignore_ascii_case("true") {
        Some(true)
    } else if literal.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> Properties {
        let mut props = Properties::new();
        props.insert("objectClass", vec!["svc.Foo", "svc.Audit"]);
        props.insert("version", 3);
        props.insert("ratio", 0.75);
        props.insert("color", "Dark Red");
        props.insert("enabled", true);
        props
    }

    #[test]
    fn list_values_match_any_element() {
        assert!(Filter::equals("objectClass", "svc.Audit").matches(&props()));
        assert!(!Filter::equals("objectClass", "svc.Bar").matches(&props()));
    }

    #[test]
    fn numeric_comparisons_use_number_semantics() {
        let props = props();
        assert!(Filter::criteria("version", Comparator::GreaterOrEqual, "2").matches(&props));
        assert!(Filter::criteria("version", Comparator::Less, "10").matches(&props));
        assert!(!Filter::criteria("version", Comparator::Greater, "3").matches(&props));
        assert!(Filter::criteria("version", Comparator::LessOrEqual, "3.5").matches(&props));
        assert!(Filter::criteria("ratio", Comparator::Greater, "0.5").matches(&props));
        assert!(!Filter::criteria("version", Comparator::Equal, "three").matches(&props));
    }

    #[test]
    fn approximate_ignores_case_and_whitespace() {
        assert!(Filter::criteria("color", Comparator::Approximate, "darkred").matches(&props()));
        assert!(!Filter::equals("color", "darkred").matches(&props()));
    }

    #[test]
    fn booleans_only_support_equality() {
        let props = props();
        assert!(Filter::equals("enabled", "TRUE").matches(&props));
        assert!(!Filter::criteria("enabled", Comparator::GreaterOrEqual, "true").matches(&props));
    }

    #[test]
    fn wildcard_and_presence() {
        let props = props();
        let prefix = Filter::Criteria(Criteria::pattern(
            "color",
            vec!["Dark".to_owned(), String::new()],
        ));
        assert!(prefix.matches(&props));

        let presence = Filter::Criteria(Criteria::pattern("ratio", vec![String::new(); 2]));
        assert!(presence.matches(&props));
        let absent = Filter::Criteria(Criteria::pattern("missing", vec![String::new(); 2]));
        assert!(!absent.matches(&props));

        let inner = Filter::Criteria(Criteria::pattern(
            "objectClass",
            vec!["svc.".to_owned(), "ud".to_owned(), String::new()],
        ));
        assert!(inner.matches(&props));
    }

    #[test]
    fn missing_attribute_never_matches_except_negated() {
        let missing = Filter::equals("absent", "x");
        assert!(!missing.matches(&props()));
        assert!(Filter::negate(missing).matches(&props()));
    }

    #[test]
    fn combine_drops_absent_and_unwraps_single() {
        assert_eq!(combine([None, None], Operator::And), None);

        let only = Filter::equals("a", "1");
        assert_eq!(combine([None, Some(only.clone())], Operator::And), Some(only));

        let nested = Filter::And(vec![Filter::equals("b", "2"), Filter::equals("c", "3")]);
        let combined = combine([Some(Filter::equals("a", "1")), Some(nested)], Operator::And)
            .expect("两个操作数应产生组合节点");
        assert_eq!(combined.to_string(), "(&(a=1)(b=2)(c=3))");
    }

    #[test]
    fn constructed_names_are_trimmed_like_parsed_ones() {
        let built = Filter::criteria(" version ", Comparator::GreaterOrEqual, "2");
        assert_eq!(built.to_string(), "(version>=2)");
        assert_eq!(crate::parse(&built.to_string()), Ok(Some(built)));

        let pattern = Criteria::pattern("\tcolor ", vec!["Dark".to_owned(), String::new()]);
        assert_eq!(pattern.name(), "color");
    }

    #[test]
    fn display_escapes_special_characters() {
        let filter = Filter::equals("path", "a(b)*c\\d");
        assert_eq!(filter.to_string(), "(path=a\\(b\\)\\*c\\\\d)");
    }
}
