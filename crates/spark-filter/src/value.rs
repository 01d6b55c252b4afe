use std::borrow::Cow;
use std::collections::{BTreeMap, btree_map};
use std::fmt;

use serde::{Deserialize, Serialize};

/// 服务或组件属性的取值。
///
/// ### 设计目标（Why）
/// - 服务属性来自注册方、工厂默认值与实例覆盖三类来源，取值形态各异；以强类型枚举承载，
///   过滤谓词在比较时即可按类型选择数值、布尔或文本语义，避免全部退化为字符串比较。
///
/// ### 逻辑解析（How）
/// - 标量：布尔、整数、浮点、文本；
/// - `List`：多值属性，例如服务同时声明的多个规格名，过滤求值时“任一元素命中即命中”；
/// - `Map`：嵌套结构，常见于处理器配置，过滤求值时不参与比较。
///
/// ### 契约定义（What）
/// - 序列化采用 `untagged` 形态，JSON 对象可以直接反序列化为 [`Properties`]；
/// - JSON `null` 不是合法属性值，反序列化时报错。
///
/// ### 设计取舍（Trade-offs）
/// - 包含 `f64`，因此只实现 `PartialEq`；需要哈希语义的调用方应改用规范化后的文本。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    /// 返回取值种类的稳定名称，用于错误信息与日志字段。
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// 若为文本则返回字符串切片。
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            Self::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// 标量的文本形态；容器类型返回 `None`。
    ///
    /// 通配匹配与近似匹配都作用于该文本形态，因此整数 `42` 可以被 `(port=4*)` 命中。
    pub fn to_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Boolean(value) => Some(Cow::Borrowed(if *value { "true" } else { "false" })),
            Self::Integer(value) => Some(Cow::Owned(value.to_string())),
            Self::Float(value) => Some(Cow::Owned(value.to_string())),
            Self::Text(text) => Some(Cow::Borrowed(text.as_str())),
            Self::List(_) | Self::Map(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(values) => {
                f.write_str("[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            scalar => match scalar.to_text() {
                Some(text) => f.write_str(&text),
                None => Ok(()),
            },
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T> From<Vec<T>> for PropertyValue
where
    T: Into<PropertyValue>,
{
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, PropertyValue>> for PropertyValue {
    fn from(entries: BTreeMap<String, PropertyValue>) -> Self {
        Self::Map(entries)
    }
}

/// 有序的属性表：属性名到 [`PropertyValue`] 的映射。
///
/// # 教案级说明
/// - **意图 (Why)**：服务属性、工厂默认属性与实例最终属性共用同一表示，过滤求值与属性合并无需转换；
/// - **契约 (What)**：键区分大小写；[`overlay`](Self::overlay) 以“后写覆盖先写”合并两张表，
///   且只读借用来源表，不会修改调用方数据；
/// - **设计 (How)**：内部为 `BTreeMap`，迭代顺序稳定，日志与测试断言可直接比较；
/// - **权衡 (Trade-offs)**：查找为 `O(log n)`，属性表通常只有十余项，稳定顺序的收益更大。
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, PropertyValue>);

impl Properties {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// 插入或覆盖属性，返回被覆盖的旧值。
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<PropertyValue>
    where
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, PropertyValue> {
        self.0.iter()
    }

    pub fn keys(&self) -> btree_map::Keys<'_, String, PropertyValue> {
        self.0.keys()
    }

    /// 将 `other` 的全部条目克隆后覆盖到当前表。
    pub fn overlay(&mut self, other: &Properties) {
        for (key, value) in other.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// 从 JSON 对象构造属性表。
    ///
    /// - **契约 (What)**：输入必须是 JSON 对象，且不含 `null`；否则返回 `serde_json::Error`。
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// 导出为 JSON 对象，供诊断输出使用。
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<PropertyValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<K, V> Extend<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<PropertyValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.0.insert(key.into(), value.into());
        }
    }
}

impl IntoIterator for Properties {
    type Item = (String, PropertyValue);
    type IntoIter = btree_map::IntoIter<String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a String, &'a PropertyValue);
    type IntoIter = btree_map::Iter<'a, String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
