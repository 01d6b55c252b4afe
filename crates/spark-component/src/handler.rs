//! # 处理器配置存储
//!
//! ## 核心意图（Why）
//! - 每个工厂为其声明的处理器（依赖注入、服务提供、属性注入等）保存一份配置；
//! - 同一工厂的多个实例可能被并发创建，并同时首次读取同一处理器的配置，
//!   “读取-检查-插入”必须原子完成，否则会出现重复写入缺省值或丢失更新。
//!
//! ## 行为契约（What）
//! - [`HandlerStore::get`]：纯查询，从不修改存储；
//! - [`HandlerStore::get_or_insert`]：缺失时插入调用方给出的缺省值并返回，已存在时原样返回旧值；
//!   首个插入者获胜，后续不同的缺省值全部被忽略；
//! - [`HandlerStore::set`]：无条件覆盖；
//! - 标识以 `Arc<str>` 为键，克隆条目时共享字符串。
//!
//! ## 风险提示（Trade-offs）
//! - `DashMap` 的 entry 守卫会在持有期间阻塞同分片的写操作；本模块只在返回克隆值之前短暂持有，
//!   不向调用方暴露守卫；
//! - 返回值为配置的克隆，配置体积较大时复制有成本，换来调用方无需关心锁的生命周期。

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use spark_filter::PropertyValue;
use tracing::debug;

use crate::requirement::Requirement;

/// 单个处理器的配置。
#[derive(Clone, Debug, PartialEq)]
pub enum HandlerConfig {
    /// 通用配置值。
    Value(PropertyValue),
    /// 依赖注入处理器的配置：字段名到依赖声明。
    Requirements(BTreeMap<String, Requirement>),
}

impl HandlerConfig {
    /// 深复制：依赖声明经 [`Requirement::copy`] 由原始过滤文本重新构造。
    pub fn deep_copy(&self) -> Self {
        match self {
            Self::Value(value) => Self::Value(value.clone()),
            Self::Requirements(requirements) => Self::Requirements(
                requirements
                    .iter()
                    .map(|(field, requirement)| (field.clone(), requirement.copy()))
                    .collect(),
            ),
        }
    }

    pub fn as_value(&self) -> Option<&PropertyValue> {
        match self {
            Self::Value(value) => Some(value),
            Self::Requirements(_) => None,
        }
    }

    pub fn as_requirements(&self) -> Option<&BTreeMap<String, Requirement>> {
        match self {
            Self::Requirements(requirements) => Some(requirements),
            Self::Value(_) => None,
        }
    }
}

impl From<PropertyValue> for HandlerConfig {
    fn from(value: PropertyValue) -> Self {
        Self::Value(value)
    }
}

impl From<BTreeMap<String, Requirement>> for HandlerConfig {
    fn from(requirements: BTreeMap<String, Requirement>) -> Self {
        Self::Requirements(requirements)
    }
}

/// 并发安全的处理器配置存储。
///
/// 条目取值为 `Option<HandlerConfig>`：以 `None` 为缺省值首次读取时，
/// 该标识同样被登记为“已存在且无配置”，之后的读取不会再插入。
#[derive(Debug, Default)]
pub struct HandlerStore {
    entries: DashMap<Arc<str>, Option<HandlerConfig>>,
}

impl HandlerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前登记的处理器标识，顺序不作保证。
    pub fn ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.key().as_ref().to_owned())
            .collect()
    }

    /// 纯查询：标识不存在或登记为无配置时返回 `None`。
    pub fn get(&self, id: &str) -> Option<HandlerConfig> {
        self.entries.get(id).and_then(|entry| entry.value().clone())
    }

    /// 标识是否已登记（包括登记为无配置的情况）。
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// 首次读取即插入。
    ///
    /// # 教案式注释
    /// - **意图 (Why)**：处理器在首次访问时惰性初始化配置，多个实例并发首访时只能有一个缺省值生效；
    /// - **契约 (What)**：
    ///   - 标识缺失：插入 `default` 并返回其克隆；
    ///   - 标识存在：忽略 `default`，返回已有配置的克隆，存储不变；
    /// - **实现 (How)**：借助 `DashMap::entry` 持有分片写锁完成检查与插入，两步之间不存在竞争窗口。
    pub fn get_or_insert(&self, id: &str, default: Option<HandlerConfig>) -> Option<HandlerConfig> {
        if let Some(entry) = self.entries.get(id) {
            return entry.value().clone();
        }
        match self.entries.entry(Arc::from(id)) {
            Entry::Occupied(occupied) => occupied.get().clone(),
            Entry::Vacant(vacant) => {
                debug!(
                    handler = id,
                    configured = default.is_some(),
                    "handler configuration initialized on first access"
                );
                vacant.insert(default.clone());
                default
            }
        }
    }

    /// 无条件覆盖。
    pub fn set(&self, id: &str, configuration: Option<HandlerConfig>) {
        self.entries.insert(Arc::from(id), configuration);
    }

    /// 逐条深复制，得到互不共享的新存储。
    pub fn deep_copy(&self) -> Self {
        let entries = DashMap::with_capacity(self.entries.len());
        for entry in self.entries.iter() {
            entries.insert(
                Arc::clone(entry.key()),
                entry.value().as_ref().map(HandlerConfig::deep_copy),
            );
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
