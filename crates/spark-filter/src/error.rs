//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 过滤表达式通常来自声明式元数据或运维配置，解析失败需要精确到字节偏移，方便定位拼写问题；
//! - 上层（依赖声明）以 `#[from]` 原样透传本错误，因此错误本身必须自描述。

use thiserror::Error;

/// 解析失败的具体原因。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FilterErrorKind {
    /// 表达式在结构完整之前结束。
    UnexpectedEnd,
    /// 期望 `(`，却遇到了其它字符。
    MissingOpenParen,
    /// 期望 `)`，却遇到了其它字符。
    MissingCloseParen,
    /// 条件缺少属性名，例如 `(=value)`。
    EmptyAttribute,
    /// 条件缺少比较运算符或运算符无法识别，例如 `(name~value)`。
    UnknownOperator,
    /// `&` / `|` 组合下没有任何子表达式。
    EmptyComposite,
    /// `!` 必须恰好包含一个子表达式。
    NegationArity,
    /// 完整表达式之后仍有非空白内容。
    TrailingInput,
    /// 转义符 `\` 位于文本末尾。
    DanglingEscape,
}

impl FilterErrorKind {
    /// 稳定的机读描述。
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnexpectedEnd => "unexpected end of filter",
            Self::MissingOpenParen => "expected '('",
            Self::MissingCloseParen => "expected ')'",
            Self::EmptyAttribute => "empty attribute name",
            Self::UnknownOperator => "unknown comparison operator",
            Self::EmptyComposite => "composite filter without operands",
            Self::NegationArity => "negation requires exactly one operand",
            Self::TrailingInput => "unexpected trailing input",
            Self::DanglingEscape => "dangling escape character",
        }
    }
}

/// 过滤表达式解析错误。
///
/// # 教案式说明
/// - **契约 (What)**：`position` 为出错字符在原始文本中的字节偏移；`filter` 保存完整原文，
///   日志中无需再额外携带输入；
/// - **风险 (Trade-offs)**：原文按值复制，超长表达式会带来一次额外分配，解析失败属于冷路径，可以接受。
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid filter `{filter}` at offset {position}: {}", .kind.as_str())]
pub struct FilterError {
    kind: FilterErrorKind,
    position: usize,
    filter: String,
}

impl FilterError {
    pub fn new(kind: FilterErrorKind, position: usize, filter: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            filter: filter.into(),
        }
    }

    pub fn kind(&self) -> FilterErrorKind {
        self.kind
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// 稳定错误码，遵循 `<域>.<语义>` 约定。
    pub const fn code(&self) -> &'static str {
        "filter.syntax"
    }
}
