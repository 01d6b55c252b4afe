//! 依赖声明（Requirement）。
//!
//! # 教案级说明
//! - **意图 (Why)**：组件以依赖声明描述“需要哪种能力、需要几个、缺席是否可容忍”，注册表据此挑选服务；
//!   声明必须总是测试服务的类型标签，否则一个宽松的用户过滤条件就可能把无关服务绑定进来；
//! - **契约 (What)**：
//!   - 完整谓词恒为 `combine([(类型标签键=规格), 用户过滤], And)`，每次设置过滤条件时整体重算；
//!   - 原始过滤文本逐字保存，用于展示与复制，与内部谓词表示无关；
//!   - 两个声明值相等当且仅当规格、`aggregate`、`optional` 与完整谓词文本均相等；
//! - **设计 (How)**：派生状态（原文、用户谓词、完整谓词、完整文本）先在局部计算完成，再一次性写回，
//!   失败时声明保持原状，外部不可能观察到原文与谓词不一致的中间态；
//! - **权衡 (Trade-offs)**：缓存完整谓词文本，使相等与哈希无需重复渲染；代价是每个声明多一份字符串。

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;

use spark_filter::{Filter, Operator, Properties, PropertyValue, combine};
use tracing::{debug, warn};

use crate::error::ComponentError;
use crate::settings::ContextSettings;

/// 过滤条件的输入形态。
///
/// - `None`：不附加用户过滤条件；
/// - `Text`：LDAP 风格文本，空文本等价于 `None`；
/// - `Filter`：已构造好的谓词，原始文本取其规范化文本。
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FilterInput {
    #[default]
    None,
    Text(String),
    Filter(Filter),
}

impl From<&str> for FilterInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for FilterInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Filter> for FilterInput {
    fn from(filter: Filter) -> Self {
        Self::Filter(filter)
    }
}

impl<T> From<Option<T>> for FilterInput
where
    T: Into<FilterInput>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

impl TryFrom<&PropertyValue> for FilterInput {
    type Error = ComponentError;

    /// 动态来源（例如属性表中的 `filter` 项）只接受文本。
    fn try_from(value: &PropertyValue) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(text) => Ok(Self::Text(text.to_owned())),
            None => Err(ComponentError::InvalidFilterType {
                found: value.kind(),
            }),
        }
    }
}

/// 单个依赖声明。
#[derive(Clone, Debug)]
pub struct Requirement {
    specification: String,
    aggregate: bool,
    optional: bool,
    type_tag_key: String,
    original_filter: String,
    filter: Option<Filter>,
    full_filter: Filter,
    full_text: String,
}

/// `set_filter` 一次性写回的派生状态。
struct DerivedFilter {
    original: String,
    filter: Option<Filter>,
    full_filter: Filter,
    full_text: String,
}

impl DerivedFilter {
    fn compute(
        type_tag_key: &str,
        specification: &str,
        input: FilterInput,
    ) -> crate::Result<Self> {
        let (original, filter) = match input {
            FilterInput::None => (String::new(), None),
            FilterInput::Text(text) => {
                let parsed = spark_filter::parse(&text)?;
                (text, parsed)
            }
            FilterInput::Filter(filter) => (filter.to_string(), Some(filter)),
        };

        let type_tag = Filter::equals(type_tag_key, specification);
        let full_filter =
            combine([Some(type_tag.clone()), filter.clone()], Operator::And).unwrap_or(type_tag);
        let full_text = full_filter.to_string();

        Ok(Self {
            original,
            filter,
            full_filter,
            full_text,
        })
    }
}

impl Requirement {
    /// 以缺省类型标签键（`objectClass`）构造依赖声明。
    ///
    /// # 契约说明（What）
    /// - `specification` 为空或仅含空白时返回 [`ComponentError::InvalidSpecification`]；
    /// - 过滤条件的失败语义同 [`set_filter`](Self::set_filter)。
    ///
    /// ```rust
    /// use spark_component::{Properties, PropertyValue, Requirement};
    ///
    /// let requirement = Requirement::new("svc.Foo", false, true, "(version>=2)").unwrap();
    /// let mut props = Properties::new();
    /// props.insert("objectClass", "svc.Foo");
    /// props.insert("version", 3);
    /// assert!(requirement.matches(&props));
    ///
    /// props.insert("objectClass", "svc.Bar");
    /// assert!(!requirement.matches(&props));
    /// ```
    pub fn new(
        specification: impl Into<String>,
        aggregate: bool,
        optional: bool,
        filter: impl Into<FilterInput>,
    ) -> crate::Result<Self> {
        Self::build(
            ContextSettings::default().type_tag_key,
            specification.into(),
            aggregate,
            optional,
            filter.into(),
        )
    }

    /// 使用 `settings` 中的类型标签键构造依赖声明。
    pub fn with_settings(
        settings: &ContextSettings,
        specification: impl Into<String>,
        aggregate: bool,
        optional: bool,
        filter: impl Into<FilterInput>,
    ) -> crate::Result<Self> {
        Self::build(
            settings.type_tag_key.clone(),
            specification.into(),
            aggregate,
            optional,
            filter.into(),
        )
    }

    fn build(
        type_tag_key: String,
        specification: String,
        aggregate: bool,
        optional: bool,
        filter: FilterInput,
    ) -> crate::Result<Self> {
        if specification.trim().is_empty() {
            return Err(ComponentError::invalid_specification(
                "a requirement specification must be a non-empty name",
            ));
        }
        let derived = DerivedFilter::compute(&type_tag_key, &specification, filter)?;
        Ok(Self {
            specification,
            aggregate,
            optional,
            type_tag_key,
            original_filter: derived.original,
            filter: derived.filter,
            full_filter: derived.full_filter,
            full_text: derived.full_text,
        })
    }

    /// 从属性表形式还原依赖声明。
    ///
    /// - `specification`：必填文本，否则 [`ComponentError::InvalidSpecification`]；
    /// - `aggregate` / `optional`：可选布尔，缺省为 `false`，类型不符时 [`ComponentError::InvalidArgument`]；
    /// - `filter`：可选文本，类型不符时 [`ComponentError::InvalidFilterType`]；
    /// - `type_tag_key`：可选非空文本，缺省为 `objectClass`，否则 [`ComponentError::InvalidArgument`]。
    pub fn from_properties(properties: &Properties) -> crate::Result<Self> {
        let specification = match properties.get("specification") {
            Some(PropertyValue::Text(text)) => text.clone(),
            Some(other) => {
                return Err(ComponentError::invalid_specification(format!(
                    "a requirement specification must be text, got {}",
                    other.kind()
                )));
            }
            None => {
                return Err(ComponentError::invalid_specification(
                    "no specification given",
                ));
            }
        };
        let aggregate = flag(properties, "aggregate")?;
        let optional = flag(properties, "optional")?;
        let filter = match properties.get("filter") {
            Some(value) => FilterInput::try_from(value)?,
            None => FilterInput::None,
        };
        let type_tag_key = match properties.get("type_tag_key") {
            None => ContextSettings::default().type_tag_key,
            Some(PropertyValue::Text(key)) if !key.trim().is_empty() => key.clone(),
            Some(other) => {
                return Err(ComponentError::invalid_argument(
                    "type_tag_key",
                    format!("expected a non-empty text key, got {other}"),
                ));
            }
        };
        Self::build(
            type_tag_key,
            specification,
            aggregate,
            optional,
            filter,
        )
    }

    /// 导出为属性表形式；无过滤条件时省略 `filter` 项，类型标签键总是写出。
    pub fn to_properties(&self) -> Properties {
        let mut properties = Properties::new();
        properties.insert("specification", self.specification.as_str());
        properties.insert("type_tag_key", self.type_tag_key.as_str());
        properties.insert("aggregate", self.aggregate);
        properties.insert("optional", self.optional);
        if !self.original_filter.is_empty() {
            properties.insert("filter", self.original_filter.as_str());
        }
        properties
    }

    /// 替换用户过滤条件并重算完整谓词。
    ///
    /// # 契约说明（What）
    /// - 接受 `None`、空文本、LDAP 文本或已构造的 [`Filter`]；
    /// - 文本解析失败时返回 [`ComponentError::InvalidFilterSyntax`]，声明保持调用前的状态；
    /// - 成功后原始文本与完整谓词同时更新。
    pub fn set_filter(&mut self, filter: impl Into<FilterInput>) -> crate::Result<()> {
        let derived =
            DerivedFilter::compute(&self.type_tag_key, &self.specification, filter.into())?;
        debug!(
            specification = %self.specification,
            filter = %derived.full_text,
            "requirement filter updated"
        );
        self.original_filter = derived.original;
        self.filter = derived.filter;
        self.full_filter = derived.full_filter;
        self.full_text = derived.full_text;
        Ok(())
    }

    /// 以动态取值设置过滤条件；非文本取值返回 [`ComponentError::InvalidFilterType`]。
    pub fn set_filter_value(&mut self, value: Option<&PropertyValue>) -> crate::Result<()> {
        let input = match value {
            Some(value) => FilterInput::try_from(value)?,
            None => FilterInput::None,
        };
        self.set_filter(input)
    }

    /// 服务属性是否满足本声明；空属性表恒不满足。
    pub fn matches(&self, properties: &Properties) -> bool {
        !properties.is_empty() && self.full_filter.matches(properties)
    }

    /// 以规格、标志位与**原始过滤文本**重新构造声明。
    ///
    /// 与结构化的 `clone` 不同，副本的谓词由原文重新解析得到，因此副本与原声明逻辑相等、互不共享。
    pub fn copy(&self) -> Self {
        Self::build(
            self.type_tag_key.clone(),
            self.specification.clone(),
            self.aggregate,
            self.optional,
            FilterInput::Text(self.original_filter.clone()),
        )
        .unwrap_or_else(|err| {
            warn!(
                specification = %self.specification,
                error = %err,
                "original filter no longer parses, copying requirement structurally"
            );
            self.clone()
        })
    }

    pub fn specification(&self) -> &str {
        &self.specification
    }

    pub fn is_aggregate(&self) -> bool {
        self.aggregate
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// 调用方提供的原始过滤文本；未提供时为空字符串。
    pub fn original_filter(&self) -> &str {
        &self.original_filter
    }

    /// 解析后的用户过滤条件，不含类型标签测试。
    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// 合取了类型标签测试的完整谓词。
    pub fn full_filter(&self) -> &Filter {
        &self.full_filter
    }

    /// 类型标签键。
    pub fn type_tag_key(&self) -> &str {
        &self.type_tag_key
    }
}

fn flag(properties: &Properties, key: &'static str) -> crate::Result<bool> {
    match properties.get(key) {
        None => Ok(false),
        Some(PropertyValue::Boolean(value)) => Ok(*value),
        Some(other) => Err(ComponentError::invalid_argument(
            key,
            format!("expected a boolean, got {}", other.kind()),
        )),
    }
}

impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        if ptr::eq(self, other) {
            return true;
        }
        self.aggregate == other.aggregate
            && self.optional == other.optional
            && self.specification == other.specification
            && self.full_text == other.full_text
    }
}

impl Eq for Requirement {}

impl Hash for Requirement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.specification.hash(state);
        self.aggregate.hash(state);
        self.optional.hash(state);
        self.full_text.hash(state);
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Requirement({}, aggregate={}, optional={}, filter={})",
            self.specification, self.aggregate, self.optional, self.full_text
        )
    }
}
