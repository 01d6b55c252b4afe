//! 工厂上下文。
//!
//! # 教案级说明
//! - **意图 (Why)**：工厂（类级）元数据由声明处理机制一次性填充，之后被该工厂的所有实例以 `Arc` 共享只读；
//! - **契约 (What)**：
//!   - 回调表、缺省属性与字段绑定只能通过 `&mut self` 修改，一旦被 `Arc` 共享即不可变；
//!   - 唯一在共享后仍可变的结构是处理器配置存储（首次读取即插入）与一次性绑定的 Bundle 上下文，
//!     二者均通过内部同步保证并发安全；
//!   - 相等与哈希**仅按名称**；
//! - **权衡 (Trade-offs)**：名称相等服务于注册表去重，但两个同名却配置不同的工厂会被视为相等，
//!   这与 [`Requirement`](crate::Requirement) 的严格值相等刻意不同。

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use spark_filter::{Properties, PropertyValue};
use tracing::debug;

use crate::error::{ComponentError, SettingsError};
use crate::handler::{HandlerConfig, HandlerStore};
use crate::lifecycle::{BundleContext, CallbackRef, LifecycleEvent};
use crate::settings::ContextSettings;

/// 单个组件工厂的类级上下文。
pub struct FactoryContext {
    name: String,
    settings: ContextSettings,
    callbacks: HashMap<LifecycleEvent, CallbackRef>,
    field_callbacks: HashMap<String, HashMap<LifecycleEvent, CallbackRef>>,
    default_properties: Properties,
    property_fields: BTreeMap<String, String>,
    handlers: HandlerStore,
    bundle_context: OnceLock<Arc<dyn BundleContext>>,
    completed: bool,
}

impl FactoryContext {
    /// 以工厂名创建空上下文；空名称返回 [`ComponentError::InvalidArgument`]。
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ComponentError::invalid_argument(
                "name",
                "a factory name must not be empty",
            ));
        }
        Ok(Self {
            name,
            settings: ContextSettings::default(),
            callbacks: HashMap::new(),
            field_callbacks: HashMap::new(),
            default_properties: Properties::new(),
            property_fields: BTreeMap::new(),
            handlers: HandlerStore::new(),
            bundle_context: OnceLock::new(),
            completed: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &ContextSettings {
        &self.settings
    }

    /// 替换保留键配置；保留键为空时返回 [`SettingsError::EmptyKey`]，原配置保持不变。
    pub fn set_settings(&mut self, settings: ContextSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// 为生命周期事件登记回调，同一事件只保留最后一次登记。
    pub fn set_callback(&mut self, event: LifecycleEvent, callback: impl Into<CallbackRef>) {
        self.callbacks.insert(event, callback.into());
    }

    pub fn callback(&self, event: LifecycleEvent) -> Option<&CallbackRef> {
        self.callbacks.get(&event)
    }

    pub fn callbacks(&self) -> &HashMap<LifecycleEvent, CallbackRef> {
        &self.callbacks
    }

    /// 为某个注入字段的事件登记回调。
    pub fn set_field_callback(
        &mut self,
        field: impl Into<String>,
        event: LifecycleEvent,
        callback: impl Into<CallbackRef>,
    ) {
        self.field_callbacks
            .entry(field.into())
            .or_default()
            .insert(event, callback.into());
    }

    pub fn field_callback(&self, field: &str, event: LifecycleEvent) -> Option<&CallbackRef> {
        self.field_callbacks
            .get(field)
            .and_then(|callbacks| callbacks.get(&event))
    }

    pub fn field_callbacks(&self) -> &HashMap<String, HashMap<LifecycleEvent, CallbackRef>> {
        &self.field_callbacks
    }

    /// 登记缺省属性。
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.default_properties.insert(name, value);
    }

    pub fn default_properties(&self) -> &Properties {
        &self.default_properties
    }

    /// 将字段绑定到属性名。
    pub fn set_property_field(&mut self, field: impl Into<String>, property: impl Into<String>) {
        self.property_fields.insert(field.into(), property.into());
    }

    pub fn property_field(&self, field: &str) -> Option<&str> {
        self.property_fields.get(field).map(String::as_str)
    }

    pub fn property_fields(&self) -> &BTreeMap<String, String> {
        &self.property_fields
    }

    /// 声明处理完成，此后方可创建实例上下文。
    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// 当前登记的处理器标识，顺序不作保证。
    pub fn handler_ids(&self) -> Vec<String> {
        self.handlers.ids()
    }

    /// 纯查询，不会插入。
    pub fn handler(&self, id: &str) -> Option<HandlerConfig> {
        self.handlers.get(id)
    }

    /// 标识是否已登记，包括登记为无配置的情况。
    pub fn has_handler(&self, id: &str) -> bool {
        self.handlers.contains(id)
    }

    /// 首次读取即插入，语义见 [`HandlerStore::get_or_insert`]。
    pub fn handler_or_insert(
        &self,
        id: &str,
        default: Option<HandlerConfig>,
    ) -> Option<HandlerConfig> {
        self.handlers.get_or_insert(id, default)
    }

    /// 无条件覆盖处理器配置。
    pub fn set_handler(&self, id: &str, configuration: Option<HandlerConfig>) {
        self.handlers.set(id, configuration);
    }

    /// 绑定 Bundle 上下文，首个写入者获胜。
    ///
    /// 返回本次调用是否生效；重复绑定被忽略并记录 `debug` 日志。
    pub fn set_bundle_context(&self, context: Arc<dyn BundleContext>) -> bool {
        let bundle_id = context.bundle_id();
        match self.bundle_context.set(context) {
            Ok(()) => {
                debug!(factory = %self.name, bundle_id, "bundle context bound");
                true
            }
            Err(_) => {
                debug!(
                    factory = %self.name,
                    bundle_id,
                    "bundle context already bound, ignoring"
                );
                false
            }
        }
    }

    pub fn bundle_context(&self) -> Option<&Arc<dyn BundleContext>> {
        self.bundle_context.get()
    }

    /// 逐字段深复制。
    ///
    /// 映射逐一克隆，依赖声明由原始过滤文本重新构造，处理器存储互不共享；
    /// Bundle 上下文是外部对象，副本与原上下文共享同一引用；完成标志保持不变。
    pub fn copy(&self) -> Self {
        let bundle_context = match self.bundle_context.get() {
            Some(context) => OnceLock::from(Arc::clone(context)),
            None => OnceLock::new(),
        };
        Self {
            name: self.name.clone(),
            settings: self.settings.clone(),
            callbacks: self.callbacks.clone(),
            field_callbacks: self.field_callbacks.clone(),
            default_properties: self.default_properties.clone(),
            property_fields: self.property_fields.clone(),
            handlers: self.handlers.deep_copy(),
            bundle_context,
            completed: self.completed,
        }
    }
}

impl Clone for FactoryContext {
    fn clone(&self) -> Self {
        self.copy()
    }
}

impl fmt::Debug for FactoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryContext")
            .field("name", &self.name)
            .field("completed", &self.completed)
            .field("handlers", &self.handlers.len())
            .field("bundle_context", &self.bundle_context.get())
            .finish_non_exhaustive()
    }
}

impl PartialEq for FactoryContext {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for FactoryContext {}

impl Hash for FactoryContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
