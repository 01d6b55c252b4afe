//! # spark-component
//!
//! ## 定位与职责（Why）
//! - 动态组件框架在运行时注册、发现并重新绑定服务实例；本 crate 承载其中两项基础契约：
//!   1. 单个依赖如何声明，并转化为可对服务属性表求值的谓词（[`Requirement`]）；
//!   2. 工厂级（类级）声明式元数据如何与实例级覆盖合并，得到组件实例观察到的配置视图
//!      （[`FactoryContext`] 与 [`ComponentContext`]）。
//! - 注册表、状态机与注解处理均在本 crate 之外，它们只消费这里的产物。
//!
//! ## 模块结构（How）
//! - `requirement`：依赖声明值类型，强制合取“类型标签等值测试”与用户过滤条件；
//! - `factory`：工厂上下文，实例间共享、以读为主，处理器配置存储支持首次读取即插入；
//! - `component`：实例上下文，构造时一次性解析属性并保证实例名属性不可被遮蔽；
//! - `handler`：处理器配置值与并发安全的配置存储；
//! - `lifecycle`：生命周期事件、回调引用与外部 Bundle 上下文契约；
//! - `settings`：保留属性键的配置，可从 TOML 加载；
//! - `constants`：保留键与知名处理器标识的默认值；
//! - `error`：统一错误域。
//!
//! ## 相等性策略（Trade-offs）
//! - [`Requirement`] 采用**严格值相等**（规格、标志位与完整谓词文本）；
//! - [`FactoryContext`] 采用**仅按名称的弱相等**，服务于上游注册表的去重；
//! - 两种策略刻意不同，调用方不可假设“处处深比较”。

#![deny(unsafe_code)]

pub mod component;
pub mod constants;
pub mod error;
pub mod factory;
pub mod handler;
pub mod lifecycle;
pub mod requirement;
pub mod settings;

pub use component::ComponentContext;
pub use error::{ComponentError, SettingsError};
pub use factory::FactoryContext;
pub use handler::{HandlerConfig, HandlerStore};
pub use lifecycle::{BundleContext, CallbackRef, LifecycleEvent};
pub use requirement::{FilterInput, Requirement};
pub use settings::ContextSettings;

pub use spark_filter::{Filter, Properties, PropertyValue};

/// `spark-component` 统一的结果别名。
pub type Result<T, E = ComponentError> = core::result::Result<T, E>;
