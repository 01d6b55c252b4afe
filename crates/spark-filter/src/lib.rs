//! # spark-filter
//!
//! ## 定位与职责（Why）
//! - 为组件框架提供“服务属性表 + 过滤谓词”这一最小契约：依赖声明通过过滤表达式描述目标服务，
//!   注册表在运行时以属性表对其求值；
//! - 核心 crate `spark-component` 只依赖本 crate 暴露的 [`parse`]、[`combine`]、[`Filter::matches`]
//!   与规范化文本（`Display`），不关心表达式内部的树形结构。
//!
//! ## 模块结构（How）
//! - `value`：属性值枚举 [`PropertyValue`] 与有序属性表 [`Properties`]；
//! - `filter`：过滤谓词树、比较运算与组合代数；
//! - `parser`：LDAP 风格文本（如 `(&(color=red)(size>=10))`）到谓词树的递归下降解析；
//! - `error`：解析失败的结构化错误。
//!
//! ## 契约（What）
//! - 相同输入构造出的谓词拥有相同的规范化文本，规范化文本可再次解析为相等的谓词；
//! - 空文本或仅含空白的文本解析为“无过滤条件”（`None`），而非错误；
//! - 所有求值均为同步、无副作用操作，可被任意线程并发调用。

#![deny(unsafe_code)]

pub mod error;
pub mod filter;
pub mod parser;
pub mod value;

pub use error::{FilterError, FilterErrorKind};
pub use filter::{Comparator, Criteria, CriteriaValue, Filter, Operator, combine};
pub use parser::parse;
pub use value::{Properties, PropertyValue};

/// `spark-filter` 统一的结果别名。
pub type Result<T, E = FilterError> = core::result::Result<T, E>;
