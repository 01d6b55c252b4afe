//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 依赖声明与上下文构造均发生在组件激活之前，失败必须同步、精确地报告给生命周期管理器，
//!   由其决定是否放弃激活；本模块不做任何重试。
//!
//! ## 设计要求（What）
//! - 所有错误派生 `thiserror::Error`，满足 `Send + Sync + 'static`；
//! - 每个变体提供 `<域>.<语义>` 形式的稳定错误码（[`ComponentError::code`]），便于日志聚合；
//! - 过滤语法错误以 `#[from]` 原样透传，保留字节偏移等诊断信息。

use spark_filter::FilterError;
use thiserror::Error;

/// 组件核心错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：区分“输入不可用”的几类原因，调用方据此修正声明而不是盲目重试；
/// - **契约 (What)**：任何返回该错误的操作都不会留下部分更新的状态；
/// - **风险 (Trade-offs)**：`reason` 使用 `String` 保存上下文，错误属于冷路径，分配成本可忽略。
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ComponentError {
    /// 依赖规格缺失、为空或不是文本。
    #[error("invalid requirement specification: {reason}")]
    InvalidSpecification { reason: String },

    /// 过滤条件的取值类型无法被过滤引擎解释。
    #[error("invalid filter type `{found}`: expected text or a parsed filter")]
    InvalidFilterType { found: &'static str },

    /// 过滤文本解析失败。
    #[error(transparent)]
    InvalidFilterSyntax(#[from] FilterError),

    /// 上下文构造参数形态错误。
    #[error("invalid argument `{argument}`: {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },
}

impl ComponentError {
    pub(crate) fn invalid_specification(reason: impl Into<String>) -> Self {
        Self::InvalidSpecification {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// 稳定错误码。
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidSpecification { .. } => "component.requirement.specification",
            Self::InvalidFilterType { .. } => "component.requirement.filter_type",
            Self::InvalidFilterSyntax(_) => "component.requirement.filter_syntax",
            Self::InvalidArgument { .. } => "component.context.argument",
        }
    }
}

/// [`ContextSettings`](crate::ContextSettings) 加载错误。
#[derive(Debug, Error)]
pub enum SettingsError {
    /// TOML 文档无法解析，或包含未知字段。
    #[error("malformed context settings: {0}")]
    Malformed(#[from] toml::de::Error),

    /// 保留键被配置为空字符串。
    #[error("context setting `{key}` must not be empty")]
    EmptyKey { key: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_filter::parse;

    #[test]
    fn filter_syntax_errors_pass_through_unchanged() {
        let syntax = parse("(a=1").expect_err("缺少右括号应当失败");
        let err = ComponentError::from(syntax.clone());
        assert_eq!(err.code(), "component.requirement.filter_syntax");
        assert_eq!(err.to_string(), syntax.to_string());
        assert_eq!(err, ComponentError::InvalidFilterSyntax(syntax));
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            ComponentError::invalid_specification("empty").code(),
            "component.requirement.specification"
        );
        assert_eq!(
            ComponentError::InvalidFilterType { found: "integer" }.to_string(),
            "invalid filter type `integer`: expected text or a parsed filter"
        );
        assert_eq!(
            ComponentError::invalid_argument("name", "empty").to_string(),
            "invalid argument `name`: empty"
        );
    }
}
