//! 组件实例上下文。
//!
//! # 教案级说明
//! - **意图 (Why)**：实例观察到的属性由三层合并而来：工厂缺省值、创建者传入的覆盖值、以及实例名；
//!   实例名是注册表识别实例的依据，任何调用方输入都不得遮蔽它；
//! - **契约 (What)**：
//!   - 合并顺序固定为“缺省值 → 调用方属性 → 实例名”，实例名最后写入；
//!   - 调用方属性以不可变借用传入，构造后与上下文互不关联；
//!   - 构造后的属性表只以 `&Properties` 暴露，之后不再变化；
//! - **权衡 (Trade-offs)**：构造时一次性复制全部属性，实例上下文的读取因此无需任何同步。

use std::sync::Arc;

use spark_filter::{Properties, PropertyValue};
use tracing::debug;

use crate::error::ComponentError;
use crate::factory::FactoryContext;
use crate::handler::HandlerConfig;
use crate::lifecycle::{BundleContext, CallbackRef, LifecycleEvent};

/// 单个运行中组件实例的上下文。
#[derive(Clone, Debug)]
pub struct ComponentContext {
    factory_context: Arc<FactoryContext>,
    name: String,
    properties: Properties,
}

impl ComponentContext {
    /// 基于已完成的工厂上下文创建实例上下文。
    ///
    /// # 契约说明（What）
    /// - 工厂尚未 [`mark_completed`](FactoryContext::mark_completed) 或实例名为空时返回
    ///   [`ComponentError::InvalidArgument`]；
    /// - 实例名写入设置中的实例名键，覆盖调用方同名输入。
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use spark_component::{ComponentContext, FactoryContext, Properties};
    ///
    /// let mut factory = FactoryContext::new("Foo").unwrap();
    /// factory.set_property("level", 1);
    /// factory.mark_completed();
    ///
    /// let mut overrides = Properties::new();
    /// overrides.insert("level", 2);
    /// overrides.insert("instance.name", "spoofed");
    ///
    /// let ctx = ComponentContext::new(Arc::new(factory), "inst1", &overrides).unwrap();
    /// assert_eq!(ctx.property("level").and_then(|v| v.as_i64()), Some(2));
    /// assert_eq!(ctx.property("instance.name").and_then(|v| v.as_str()), Some("inst1"));
    /// assert_eq!(overrides.get("instance.name").and_then(|v| v.as_str()), Some("spoofed"));
    /// ```
    pub fn new(
        factory_context: Arc<FactoryContext>,
        name: impl Into<String>,
        properties: &Properties,
    ) -> crate::Result<Self> {
        if !factory_context.is_completed() {
            return Err(ComponentError::invalid_argument(
                "factory_context",
                format!(
                    "factory `{}` has not completed its manipulation",
                    factory_context.name()
                ),
            ));
        }
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ComponentError::invalid_argument(
                "name",
                "an instance name must not be empty",
            ));
        }

        let instance_key = factory_context.settings().instance_name_key.as_str();
        let mut resolved = factory_context.default_properties().clone();
        resolved.overlay(properties);
        let previous = resolved.insert(instance_key, name.as_str());
        if let Some(shadowed) = previous.filter(|value| value.as_str() != Some(name.as_str())) {
            debug!(
                factory = %factory_context.name(),
                instance = %name,
                key = instance_key,
                shadowed = %shadowed,
                "instance name property overridden"
            );
        }
        debug!(
            factory = %factory_context.name(),
            instance = %name,
            properties = resolved.len(),
            "component context created"
        );

        Ok(Self {
            factory_context,
            name,
            properties: resolved,
        })
    }

    pub fn bundle_context(&self) -> Option<&Arc<dyn BundleContext>> {
        self.factory_context.bundle_context()
    }

    pub fn callback(&self, event: LifecycleEvent) -> Option<&CallbackRef> {
        self.factory_context.callback(event)
    }

    pub fn field_callback(&self, field: &str, event: LifecycleEvent) -> Option<&CallbackRef> {
        self.factory_context.field_callback(field, event)
    }

    pub fn factory_name(&self) -> &str {
        self.factory_context.name()
    }

    /// 处理器配置。
    ///
    /// 与工厂上下文的纯查询不同，这里沿用首次读取即插入的语义：未登记的标识会在共享的工厂上下文中
    /// 登记为无配置。
    pub fn handler(&self, id: &str) -> Option<HandlerConfig> {
        self.factory_context.handler_or_insert(id, None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn factory_context(&self) -> &Arc<FactoryContext> {
        &self.factory_context
    }
}
